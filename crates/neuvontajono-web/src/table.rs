//! Colour-coded statistics table

use neuvontajono_core::statistics::StatisticsViewModel;
use serde::Serialize;

/// Highlight colour of a data cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CellColor {
    /// Below the yellow limit
    Green,
    /// At or above the yellow limit
    Yellow,
    /// At or above the red limit
    Red,
}

impl CellColor {
    /// Parse a colour token; unknown tokens mean no colour
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "green" => Some(Self::Green),
            "yellow" => Some(Self::Yellow),
            "red" => Some(Self::Red),
            _ => None,
        }
    }

    /// Colour for a participant count
    #[must_use]
    pub const fn for_count(count: i64, yellow_limit: i64, red_limit: i64) -> Self {
        if count >= red_limit {
            Self::Red
        } else if count >= yellow_limit {
            Self::Yellow
        } else {
            Self::Green
        }
    }

    /// Token stored in the view model
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }

    /// CSS class of the table cell
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Green => "statistics-green",
            Self::Yellow => "statistics-yellow",
            Self::Red => "statistics-red",
        }
    }
}

/// A table cell ready for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCell {
    /// Row index in the statistics table
    pub row: usize,
    /// Column index in the statistics table
    pub col: usize,
    /// Text shown in the cell
    pub text: String,
    /// CSS class, if any
    pub class: Option<&'static str>,
    /// Hovering shows the queue graph
    pub hoverable: bool,
    /// Samples for the queue graph, JSON encoded
    pub samples_json: Option<String>,
}

/// Whether a position holds a heading or label rather than data
#[must_use]
pub const fn is_header(row: usize, col: usize) -> bool {
    row == 0 || col == 0
}

/// Lay out the table for the selected dataset
#[must_use]
pub fn build_rows(model: &StatisticsViewModel, dataset: usize) -> Vec<Vec<TableCell>> {
    model
        .stats
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .map(|(col, cell)| {
                    let header = is_header(row, col);
                    let class = if header {
                        None
                    } else {
                        model
                            .colors
                            .get(row)
                            .and_then(|colors| colors.get(col))
                            .and_then(Option::as_deref)
                            .and_then(CellColor::parse)
                            .map(CellColor::css_class)
                    };
                    let samples_json = if header {
                        None
                    } else {
                        cell.samples()
                            .and_then(|samples| serde_json::to_string(samples).ok())
                    };

                    TableCell {
                        row,
                        col,
                        text: cell.display(dataset).to_string(),
                        class,
                        hoverable: !header,
                        samples_json,
                    }
                })
                .collect()
        })
        .collect()
}
