//! Hover tooltip holding the queue length graph

use askama::Template;

use crate::{
    chart::{ChartGeometry, LineChart},
    error::ViewResult,
};

/// Cursor position in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPosition {
    /// Horizontal page offset
    pub page_x: i32,
    /// Vertical page offset
    pub page_y: i32,
}

/// Tooltip placement and chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tooltip {
    /// CSS `left`
    pub left: String,
    /// CSS `top`
    pub top: String,
    /// Chart to draw
    pub chart: LineChart,
}

/// Whether the tooltip is visible
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TooltipState {
    /// Nothing is drawn
    #[default]
    Hidden,
    /// Graph drawn next to the cursor
    Shown(Tooltip),
}

impl TooltipState {
    /// State after hovering a cell with `samples`
    ///
    /// Missing, empty or undecodable samples keep the tooltip hidden.
    #[must_use]
    pub fn show(samples: Option<&[String]>, cursor: CursorPosition) -> Self {
        samples
            .and_then(|samples| LineChart::from_samples(samples, ChartGeometry::default()))
            .map_or(Self::Hidden, |chart| {
                Self::Shown(Tooltip {
                    left: format!("{}px", cursor.page_x + 30),
                    top: format!("{}px", cursor.page_y - 100),
                    chart,
                })
            })
    }

    /// Whether the tooltip is visible
    #[must_use]
    pub const fn is_shown(&self) -> bool {
        matches!(self, Self::Shown(_))
    }

    /// Render the tooltip markup, `None` while hidden
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render.
    pub fn render(&self, title: &str) -> ViewResult<Option<String>> {
        match self {
            Self::Hidden => Ok(None),
            Self::Shown(tooltip) => {
                let template = TooltipTemplate {
                    title,
                    tooltip,
                    chart: &tooltip.chart,
                };
                Ok(Some(template.render()?))
            }
        }
    }
}

#[derive(Template)]
#[template(path = "tooltip.html")]
struct TooltipTemplate<'a> {
    title: &'a str,
    tooltip: &'a Tooltip,
    chart: &'a LineChart,
}
