//! Error types for the statistics view

use thiserror::Error;

/// Result type alias for view operations
pub type ViewResult<T> = Result<T, ViewError>;

/// Errors raised while driving or rendering the statistics view
#[derive(Error, Debug)]
pub enum ViewError {
    /// Template rendering failed
    #[error("Failed to render template: {0}")]
    Render(#[from] askama::Error),

    /// Dataset selector value was not `"index|name"` or pointed past the datasets
    #[error("Invalid dataset selection: {value}")]
    InvalidDataset {
        /// Submitted option value
        value: String,
    },

    /// Table coordinates outside the statistics table
    #[error("No table cell at row {row}, column {col}")]
    NoSuchCell {
        /// Row index
        row: usize,
        /// Column index
        col: usize,
    },

    /// View model could not be encoded
    #[error("Failed to encode view model: {0}")]
    Encode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_messages() {
        let err = ViewError::InvalidDataset {
            value: "x|y".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid dataset selection: x|y");

        let err = ViewError::NoSuchCell { row: 3, col: 9 };
        assert_eq!(err.to_string(), "No table cell at row 3, column 9");
    }
}
