//! Queue length line chart
//!
//! Samples are `"M|L"` strings where `M` is minutes after midnight and `L` the
//! queue length at that moment. The chart maps them onto a fixed SVG canvas
//! with a time axis niced to half hours and a length axis rounded up to a
//! multiple of five.

use neuvontajono_core::utils::{format_clock, parse_sample};
use serde::Serialize;
use tracing::debug;

/// Space reserved around the plot area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Margin {
    /// Top margin in pixels
    pub top: u32,
    /// Right margin in pixels
    pub right: u32,
    /// Bottom margin in pixels
    pub bottom: u32,
    /// Left margin in pixels
    pub left: u32,
}

/// Size of the chart canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChartGeometry {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Margins around the plot area
    pub margin: Margin,
}

impl Default for ChartGeometry {
    fn default() -> Self {
        Self {
            width: 400,
            height: 200,
            margin: Margin {
                top: 10,
                right: 25,
                bottom: 20,
                left: 25,
            },
        }
    }
}

impl ChartGeometry {
    /// Width of the plot area
    #[must_use]
    pub const fn inner_width(&self) -> u32 {
        self.width
            .saturating_sub(self.margin.left)
            .saturating_sub(self.margin.right)
    }

    /// Height of the plot area
    #[must_use]
    pub const fn inner_height(&self) -> u32 {
        self.height
            .saturating_sub(self.margin.top)
            .saturating_sub(self.margin.bottom)
    }
}

/// One decoded sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChartPoint {
    /// Minutes after midnight
    pub minutes: u16,
    /// Queue length
    pub length: u32,
}

impl ChartPoint {
    /// Decode a `"M|L"` sample
    #[must_use]
    pub fn parse(sample: &str) -> Option<Self> {
        parse_sample(sample).map(|(minutes, length)| Self { minutes, length })
    }

    /// Sample time as `H:MM`
    #[must_use]
    pub fn clock(&self) -> String {
        format_clock(self.minutes)
    }
}

/// Decode samples in order, skipping malformed ones
#[must_use]
pub fn parse_points(samples: &[String]) -> Vec<ChartPoint> {
    samples
        .iter()
        .filter_map(|sample| {
            let point = ChartPoint::parse(sample);
            if point.is_none() {
                debug!(sample = %sample, "Skipping malformed queue sample");
            }
            point
        })
        .collect()
}

/// Top of the length axis: the largest length rounded up to a multiple of five, at least five
#[must_use]
pub const fn nice_y_max(max_length: u32) -> u32 {
    let rounded = max_length + (5 - max_length % 5) % 5;
    if rounded < 5 { 5 } else { rounded }
}

/// Step between length axis ticks
#[must_use]
pub const fn y_tick_increment(max_y: u32) -> u32 {
    if max_y > 10 {
        5
    } else if max_y > 5 {
        2
    } else {
        1
    }
}

/// Length axis tick values from zero to `max_y`
#[must_use]
pub fn y_ticks(max_y: u32) -> Vec<u32> {
    let step = y_tick_increment(max_y) as usize;
    (0..=max_y).step_by(step).collect()
}

/// Time axis extent rounded outwards to half hours
#[must_use]
pub const fn nice_time_domain(first: u16, last: u16) -> (u16, u16) {
    let start = first / 30 * 30;
    let end = last.div_ceil(30) * 30;
    (start, end)
}

/// Time axis tick and gridline spacing, chosen from the length of the time span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Granularity {
    /// Span under three hours: labels every 30 minutes, gridlines every 10
    HalfHour,
    /// Span of three to six hours: labels every hour, gridlines every 30 minutes
    Hour,
    /// Span of six hours or more: labels every two hours, gridlines every hour
    TwoHours,
}

impl Granularity {
    /// Granularity for a time span given in minutes
    #[must_use]
    pub const fn for_span(span_minutes: u16) -> Self {
        if span_minutes >= 6 * 60 {
            Self::TwoHours
        } else if span_minutes >= 3 * 60 {
            Self::Hour
        } else {
            Self::HalfHour
        }
    }

    /// Minutes between labelled ticks
    #[must_use]
    pub const fn tick_step(self) -> u16 {
        match self {
            Self::HalfHour => 30,
            Self::Hour => 60,
            Self::TwoHours => 120,
        }
    }

    /// Minutes between vertical gridlines
    #[must_use]
    pub const fn grid_step(self) -> u16 {
        match self {
            Self::HalfHour => 10,
            Self::Hour => 30,
            Self::TwoHours => 60,
        }
    }
}

/// A labelled tick on an axis
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AxisTick {
    /// Offset inside the plot area in pixels
    pub position: i32,
    /// Tick label
    pub label: String,
}

/// Hover target drawn on each sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointMarker {
    /// Horizontal offset inside the plot area
    pub x: i32,
    /// Vertical offset inside the plot area
    pub y: i32,
    /// `H:MM` time and queue length
    pub title: String,
}

/// Fully laid out chart, ready for the SVG template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineChart {
    /// Canvas size
    pub geometry: ChartGeometry,
    /// Points in input order
    pub points: Vec<ChartPoint>,
    /// Niced time domain in minutes after midnight
    pub x_domain: (u16, u16),
    /// Top of the length axis
    pub max_y: u32,
    /// Time axis spacing
    pub granularity: Granularity,
    /// Labelled time ticks
    pub x_ticks: Vec<AxisTick>,
    /// Vertical gridline offsets
    pub x_grid: Vec<i32>,
    /// Labelled length ticks, also used for horizontal gridlines
    pub y_ticks: Vec<AxisTick>,
    /// SVG path data of the line
    pub path: String,
    /// One marker per point, in input order
    pub markers: Vec<PointMarker>,
}

impl LineChart {
    /// Lay out a chart from raw samples
    ///
    /// Returns `None` when no sample can be decoded.
    #[must_use]
    pub fn from_samples(samples: &[String], geometry: ChartGeometry) -> Option<Self> {
        Self::compute(parse_points(samples), geometry)
    }

    /// Lay out a chart from decoded points
    ///
    /// Returns `None` for an empty point list.
    #[must_use]
    pub fn compute(points: Vec<ChartPoint>, geometry: ChartGeometry) -> Option<Self> {
        let first = points.iter().map(|p| p.minutes).min()?;
        let last = points.iter().map(|p| p.minutes).max()?;
        let max_length = points.iter().map(|p| p.length).max()?;

        let x_domain = nice_time_domain(first, last);
        let max_y = nice_y_max(max_length);
        let granularity = Granularity::for_span(x_domain.1 - x_domain.0);

        let mut chart = Self {
            geometry,
            points,
            x_domain,
            max_y,
            granularity,
            x_ticks: Vec::new(),
            x_grid: Vec::new(),
            y_ticks: Vec::new(),
            path: String::new(),
            markers: Vec::new(),
        };

        chart.x_ticks = chart
            .minutes_every(granularity.tick_step())
            .map(|m| AxisTick {
                position: chart.scale_x(m),
                label: axis_label(m),
            })
            .collect();
        chart.x_grid = chart
            .minutes_every(granularity.grid_step())
            .map(|m| chart.scale_x(m))
            .collect();
        chart.y_ticks = y_ticks(max_y)
            .into_iter()
            .map(|value| AxisTick {
                position: chart.scale_y(value),
                label: value.to_string(),
            })
            .collect();
        chart.path = chart.line_path();
        chart.markers = chart
            .points
            .iter()
            .map(|point| PointMarker {
                x: chart.scale_x(point.minutes),
                y: chart.scale_y(point.length),
                title: format!("{}: {}", point.clock(), point.length),
            })
            .collect();

        Some(chart)
    }

    /// Pixel offset of a time inside the plot area
    #[must_use]
    pub fn scale_x(&self, minutes: u16) -> i32 {
        let width = f64::from(self.geometry.inner_width());
        let (start, end) = self.x_domain;
        let ratio = if end == start {
            0.5
        } else {
            f64::from(minutes.saturating_sub(start)) / f64::from(end - start)
        };
        round_px(ratio * width)
    }

    /// Pixel offset of a queue length inside the plot area
    #[must_use]
    pub fn scale_y(&self, length: u32) -> i32 {
        let height = f64::from(self.geometry.inner_height());
        round_px(height - f64::from(length) / f64::from(self.max_y) * height)
    }

    /// `translate(...)` of the plot area
    #[must_use]
    pub fn plot_transform(&self) -> String {
        format!(
            "translate({},{})",
            self.geometry.margin.left, self.geometry.margin.top
        )
    }

    /// `translate(...)` of the time axis
    #[must_use]
    pub fn x_axis_transform(&self) -> String {
        format!("translate(0,{})", self.geometry.inner_height())
    }

    fn minutes_every(&self, step: u16) -> impl Iterator<Item = u16> {
        let (start, end) = self.x_domain;
        (start..=end).filter(move |m| m % step == 0)
    }

    fn line_path(&self) -> String {
        let mut path = String::new();
        for (i, point) in self.points.iter().enumerate() {
            let command = if i == 0 { 'M' } else { 'L' };
            path.push_str(&format!(
                "{command}{},{}",
                self.scale_x(point.minutes),
                self.scale_y(point.length)
            ));
        }
        path
    }
}

/// Time axis label, `HH:MM`
#[must_use]
pub fn axis_label(minutes: u16) -> String {
    format!("{:02}:{:02}", (minutes / 60) % 24, minutes % 60)
}

#[allow(clippy::cast_possible_truncation)]
fn round_px(value: f64) -> i32 {
    value.round() as i32
}
