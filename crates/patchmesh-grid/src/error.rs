//! Error types for control grids.

use thiserror::Error;

/// Errors reported when validating a control grid.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    /// A control point has a NaN or infinite position or texture coordinate.
    #[error("control point at row {row}, column {column} is not finite")]
    NonFinite {
        /// Grid row of the offending point.
        row: usize,
        /// Grid column of the offending point.
        column: usize,
    },
}

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;
