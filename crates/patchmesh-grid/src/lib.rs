#![warn(missing_docs)]

//! Control grids for bi-quadratic Bezier patches.
//!
//! A patch is described by a row-major grid of [`ControlPoint`]s whose width
//! and height are both odd. Every 3×3 window starting on an even row and
//! column is one quadratic Bezier sub-patch; neighbouring sub-patches share
//! their boundary row or column of control points.
//!
//! ```text
//!   col: 0   1   2   3   4
//! row 0  o---+---o---+---o
//!        |       |       |
//! row 1  +   +   +   +   +     o  on-surface corner
//!        |       |       |     +  off-surface control point
//! row 2  o---+---o---+---o
//! ```
//!
//! The grid is the only authoritative state of a patch. Everything derived
//! from it (curve trees, vertex arrays, bounds) must be rebuilt after it
//! changes.

pub mod error;
pub mod prefab;

pub use error::{GridError, Result};
pub use prefab::{Axis, Prefab};

use patchmesh_math::{lerp_point, lerp_vec2, mid_point, mid_vec2, Aabb, Point3, Transform, Vec2};
use serde::{Deserialize, Serialize};

/// One control point: a position and a texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    /// Position in space.
    pub position: Point3,
    /// Texture coordinate `(s, t)`.
    pub texcoord: Vec2,
}

impl ControlPoint {
    /// Create a control point.
    pub fn new(position: Point3, texcoord: Vec2) -> Self {
        Self { position, texcoord }
    }

    /// Control point at `position` with a zero texture coordinate.
    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z), Vec2::zeros())
    }

    /// True if every component is finite.
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|c| c.is_finite()) && self.texcoord.iter().all(|c| c.is_finite())
    }

    /// Componentwise midpoint of position and texture coordinate.
    pub fn mid(&self, other: &ControlPoint) -> ControlPoint {
        ControlPoint {
            position: mid_point(&self.position, &other.position),
            texcoord: mid_vec2(&self.texcoord, &other.texcoord),
        }
    }

    /// Linear interpolation towards `other`.
    pub fn lerp(&self, other: &ControlPoint, t: f64) -> ControlPoint {
        ControlPoint {
            position: lerp_point(&self.position, &other.position, t),
            texcoord: lerp_vec2(&self.texcoord, &other.texcoord, t),
        }
    }
}

impl Default for ControlPoint {
    fn default() -> Self {
        Self::new(Point3::origin(), Vec2::zeros())
    }
}

/// Traversal direction through the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixMajor {
    /// Along a row, i.e. across columns (the `u` / x direction).
    Row,
    /// Along a column, i.e. across rows (the `v` / y direction).
    Column,
}

/// Allowed grid dimensions, enforced by grid constructors and editors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLimits {
    /// Smallest allowed width.
    pub min_width: usize,
    /// Largest allowed width.
    pub max_width: usize,
    /// Smallest allowed height.
    pub min_height: usize,
    /// Largest allowed height.
    pub max_height: usize,
}

impl Default for GridLimits {
    fn default() -> Self {
        Self {
            min_width: 3,
            max_width: 31,
            min_height: 3,
            max_height: 31,
        }
    }
}

impl GridLimits {
    /// True if `width × height` is odd in both directions and within bounds.
    pub fn allows(&self, width: usize, height: usize) -> bool {
        width % 2 == 1
            && height % 2 == 1
            && (self.min_width..=self.max_width).contains(&width)
            && (self.min_height..=self.max_height).contains(&height)
    }

    /// Assert that `width × height` is allowed.
    ///
    /// # Panics
    /// Panics with a description of the violated bound. Requesting a grid
    /// outside the limits is a caller error, not bad input data.
    pub fn check(&self, width: usize, height: usize) {
        assert!(
            width % 2 == 1 && height % 2 == 1,
            "patch dimensions must be odd, got {width}x{height}"
        );
        assert!(
            (self.min_width..=self.max_width).contains(&width),
            "patch width {width} outside {}..={}",
            self.min_width,
            self.max_width
        );
        assert!(
            (self.min_height..=self.max_height).contains(&height),
            "patch height {height} outside {}..={}",
            self.min_height,
            self.max_height
        );
    }
}

/// Row-major grid of control points with odd dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlGrid {
    width: usize,
    height: usize,
    points: Vec<ControlPoint>,
}

impl ControlGrid {
    /// Create a grid from row-major control points.
    ///
    /// # Panics
    /// Panics if a dimension is even or below 3, or if the number of points
    /// does not equal `width * height`.
    pub fn new(width: usize, height: usize, points: Vec<ControlPoint>) -> Self {
        assert_dims(width, height);
        assert!(
            points.len() == width * height,
            "grid {width}x{height} needs {} control points, got {}",
            width * height,
            points.len()
        );
        Self {
            width,
            height,
            points,
        }
    }

    /// Create a grid by evaluating `f(row, column)` for every control point.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> ControlPoint) -> Self {
        assert_dims(width, height);
        let mut points = Vec::with_capacity(width * height);
        for row in 0..height {
            for column in 0..width {
                points.push(f(row, column));
            }
        }
        Self {
            width,
            height,
            points,
        }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// All control points, row-major.
    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// Mutable access to all control points, row-major.
    pub fn points_mut(&mut self) -> &mut [ControlPoint] {
        &mut self.points
    }

    /// Control point at `(row, column)`.
    pub fn get(&self, row: usize, column: usize) -> &ControlPoint {
        &self.points[self.offset(row, column)]
    }

    /// Mutable control point at `(row, column)`.
    pub fn get_mut(&mut self, row: usize, column: usize) -> &mut ControlPoint {
        let i = self.offset(row, column);
        &mut self.points[i]
    }

    /// Replace the control point at `(row, column)`.
    pub fn set(&mut self, row: usize, column: usize, point: ControlPoint) {
        *self.get_mut(row, column) = point;
    }

    /// Number of sub-patches along a direction.
    pub fn sub_patch_count(&self, major: MatrixMajor) -> usize {
        match major {
            MatrixMajor::Row => (self.width - 1) / 2,
            MatrixMajor::Column => (self.height - 1) / 2,
        }
    }

    /// The 3×3 control window of sub-patch `(column, row)`, indexed `[row][column]`.
    pub fn sub_matrix(&self, sub_column: usize, sub_row: usize) -> [[ControlPoint; 3]; 3] {
        let r0 = sub_row * 2;
        let c0 = sub_column * 2;
        std::array::from_fn(|r| std::array::from_fn(|c| *self.get(r0 + r, c0 + c)))
    }

    /// Check every control point for non-finite components.
    pub fn validate(&self) -> Result<()> {
        match self.points.iter().position(|p| !p.is_finite()) {
            Some(i) => Err(GridError::NonFinite {
                row: i / self.width,
                column: i % self.width,
            }),
            None => Ok(()),
        }
    }

    /// True if the grid can be tessellated.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Bounding box of the control point positions.
    pub fn bounds(&self) -> Aabb {
        let mut bb = Aabb::empty();
        for p in &self.points {
            bb.extend(&p.position);
        }
        bb
    }

    /// Move every control point by `transform`. Texture coordinates are kept.
    pub fn transform(&mut self, transform: &Transform) {
        for p in &mut self.points {
            p.position = transform.apply_point(&p.position);
        }
    }

    /// Change the dimensions, keeping points whose `(row, column)` survives.
    ///
    /// Even dimensions are rounded down to the next odd value, as grid
    /// editors do when a user drags a size handle.
    ///
    /// # Panics
    /// Panics if the rounded dimensions fall outside `limits`.
    pub fn resize(&mut self, width: usize, height: usize, limits: &GridLimits) {
        let width = if width % 2 == 0 { width.saturating_sub(1) } else { width };
        let height = if height % 2 == 0 { height.saturating_sub(1) } else { height };
        limits.check(width, height);

        let old = std::mem::take(&mut self.points);
        let old_width = self.width;
        let old_height = self.height;
        self.points = (0..width * height)
            .map(|i| {
                let (row, column) = (i / width, i % width);
                if row < old_height && column < old_width {
                    old[row * old_width + column]
                } else {
                    ControlPoint::default()
                }
            })
            .collect();
        self.width = width;
        self.height = height;
    }

    fn offset(&self, row: usize, column: usize) -> usize {
        assert!(
            row < self.height && column < self.width,
            "control point ({row}, {column}) outside {}x{} grid",
            self.width,
            self.height
        );
        row * self.width + column
    }
}

fn assert_dims(width: usize, height: usize) {
    assert!(
        width >= 3 && height >= 3 && width % 2 == 1 && height % 2 == 1,
        "patch dimensions must be odd and at least 3, got {width}x{height}"
    );
}
