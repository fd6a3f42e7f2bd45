#![warn(missing_docs)]

//! Tessellation of bi-quadratic Bezier patches into triangle strips.
//!
//! A rebuild runs in three stages:
//! 1. Curve trees are built for every column and row of sub-patches,
//!    bisecting the control curves until none bends more than the
//!    curvature threshold (or a fixed sample count is used instead).
//! 2. The flattened vertex array is filled sub-patch by sub-patch, with
//!    normals and tangent frames averaged along shared edges.
//! 3. Strip indices are laid over the array.
//!
//! # Example
//!
//! ```
//! use patchmesh_grid::{ControlGrid, ControlPoint};
//! use patchmesh_tessellate::{tessellate, TessellationSettings};
//!
//! let grid = ControlGrid::from_fn(3, 3, |r, c| ControlPoint::at(c as f64, r as f64, 0.0));
//! let result = tessellate(&grid, &TessellationSettings::default());
//! assert_eq!(result.vertices().len(), result.array_width() * result.array_height());
//! ```

pub mod curve;
pub mod degenerate;
pub mod error;
pub mod mesh;
pub mod strips;

mod adaptive;
mod fixed;
mod vertex_array;

pub use curve::{AxisLayout, BezierCurve, CurveNode, MAX_SUBDIVISION_DEPTH};
pub use degenerate::{Corner, EdgeFlags, EdgeTangents};
pub use error::{Result, TessellateError};
pub use mesh::{TessellatedVertex, TessellationResult, TriangleMesh};
pub use strips::StripLayout;

use patchmesh_grid::{ControlGrid, MatrixMajor};
use serde::{Deserialize, Serialize};
use vertex_array::{build_vertex_array, Sampling};

/// Largest number of entries a flattened vertex array may hold.
pub const MAX_VERTEX_ARRAY: usize = 1_048_576;

/// Tessellation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TessellationSettings {
    /// Curves whose chord length times turning angle (in half turns)
    /// exceeds this value are split.
    pub curvature_threshold: f64,
    /// Use a fixed number of samples per sub-patch instead of curve trees.
    pub fixed_subdivisions: bool,
    /// Samples per sub-patch along u when `fixed_subdivisions` is set.
    pub subdivisions_x: usize,
    /// Samples per sub-patch along v when `fixed_subdivisions` is set.
    pub subdivisions_y: usize,
}

impl Default for TessellationSettings {
    fn default() -> Self {
        Self {
            curvature_threshold: 4.0,
            fixed_subdivisions: false,
            subdivisions_x: 4,
            subdivisions_y: 4,
        }
    }
}

impl TessellationSettings {
    /// Fixed subdivision with `x × y` samples per sub-patch.
    pub fn fixed(x: usize, y: usize) -> Self {
        Self {
            fixed_subdivisions: true,
            subdivisions_x: x,
            subdivisions_y: y,
            ..Default::default()
        }
    }

    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !self.curvature_threshold.is_finite() || self.curvature_threshold < 0.0 {
            return Err(TessellateError::InvalidSettings(
                "curvature_threshold must be finite and non-negative".into(),
            ));
        }
        if self.fixed_subdivisions && (self.subdivisions_x == 0 || self.subdivisions_y == 0) {
            return Err(TessellateError::InvalidSettings(
                "fixed subdivisions must be at least 1".into(),
            ));
        }
        if self.fixed_subdivisions
            && (self.subdivisions_x > MAX_VERTEX_ARRAY || self.subdivisions_y > MAX_VERTEX_ARRAY)
        {
            return Err(TessellateError::InvalidSettings(format!(
                "fixed subdivisions must be at most {MAX_VERTEX_ARRAY}"
            )));
        }
        Ok(())
    }

    fn sampling(&self) -> Sampling {
        if self.fixed_subdivisions {
            Sampling::Fixed(self.subdivisions_x, self.subdivisions_y)
        } else {
            Sampling::Adaptive
        }
    }
}

/// Tessellate `grid`, or return an empty result if it cannot be.
///
/// The reason for an empty result is logged as a warning; use
/// [`try_tessellate`] to handle it.
pub fn tessellate(grid: &ControlGrid, settings: &TessellationSettings) -> TessellationResult {
    match try_tessellate(grid, settings) {
        Ok(result) => result,
        Err(err) => {
            log::warn!("patch {}x{} not tessellated: {}", grid.width(), grid.height(), err);
            TessellationResult::default()
        }
    }
}

/// Tessellate `grid`.
///
/// The result is a pure function of the grid and settings; rebuilding
/// twice yields identical arrays.
pub fn try_tessellate(grid: &ControlGrid, settings: &TessellationSettings) -> Result<TessellationResult> {
    settings.validate()?;
    grid.validate()?;

    let sampling = settings.sampling();
    let layout_u = match sampling {
        Sampling::Fixed(nx, _) => AxisLayout::fixed(grid, MatrixMajor::Row, nx),
        Sampling::Adaptive => AxisLayout::adaptive(grid, MatrixMajor::Row, settings.curvature_threshold, 1),
    };
    let width = layout_u.length;
    let layout_v = match sampling {
        Sampling::Fixed(_, ny) => AxisLayout::fixed(grid, MatrixMajor::Column, ny),
        Sampling::Adaptive => {
            AxisLayout::adaptive(grid, MatrixMajor::Column, settings.curvature_threshold, width)
        }
    };
    let height = layout_v.length;

    if width.saturating_mul(height) > MAX_VERTEX_ARRAY {
        return Err(TessellateError::VertexArrayTooLarge { width, height });
    }

    let vertices = build_vertex_array(grid, &layout_u, &layout_v, sampling);
    let strips = StripLayout::new(width, height);

    log::debug!(
        "tessellated {}x{} patch into {}x{} vertices, {} strips of {}",
        grid.width(),
        grid.height(),
        width,
        height,
        strips.num_strips,
        strips.strip_len
    );

    Ok(TessellationResult {
        vertices,
        indices: strips.indices,
        num_strips: strips.num_strips,
        strip_len: strips.strip_len,
        array_width: width,
        array_height: height,
        sub_patch_widths: layout_u.extents,
        sub_patch_heights: layout_v.extents,
        curve_trees_u: layout_u.trees,
        curve_trees_v: layout_v.trees,
    })
}
