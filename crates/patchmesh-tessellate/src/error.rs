//! Error types for tessellation.

use patchmesh_grid::GridError;
use thiserror::Error;

/// Reasons a patch produced no mesh.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TessellateError {
    /// The control grid contains unusable data.
    #[error("invalid control grid: {0}")]
    InvalidGrid(#[from] GridError),

    /// Invalid tessellation settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// The flattened vertex array would exceed the size limit.
    #[error("vertex array {width}x{height} exceeds the {max} entry limit", max = crate::MAX_VERTEX_ARRAY)]
    VertexArrayTooLarge {
        /// Flattened array width.
        width: usize,
        /// Flattened array height.
        height: usize,
    },
}

/// Result type for tessellation operations.
pub type Result<T> = std::result::Result<T, TessellateError>;
