#![warn(missing_docs)]

//! Bi-quadratic Bezier patches with a lazily rebuilt render mesh.
//!
//! Provides the [`Patch`] type, which owns a control grid and the
//! tessellation derived from it. Every edit marks the cached tessellation
//! stale; the next read rebuilds it in full.
//!
//! # Example
//!
//! ```
//! use patchmesh::{Axis, Patch, Prefab};
//! use patchmesh::math::{Aabb, Point3};
//!
//! let bounds = Aabb::from_min_max(Point3::new(-64.0, -64.0, 0.0), Point3::new(64.0, 64.0, 128.0));
//! let mut patch = Patch::from_prefab(Prefab::Cylinder, &bounds, Axis::Z, 9, 3);
//! assert!(patch.is_valid());
//! assert!(patch.to_mesh().num_triangles() > 0);
//! ```

pub use patchmesh_grid as grid;
pub use patchmesh_math as math;
pub use patchmesh_tessellate as tessellate;

pub use patchmesh_grid::{Axis, ControlGrid, ControlPoint, GridLimits, Prefab};
pub use patchmesh_tessellate::{TessellationResult, TessellationSettings, TriangleMesh};

use patchmesh_math::{Aabb, Transform};

/// Derived data, valid until the next edit.
#[derive(Debug, Clone)]
struct Cache {
    result: TessellationResult,
    bounds: Aabb,
}

/// A bi-quadratic Bezier patch.
///
/// The control grid is the only authoritative state; the tessellation and
/// bounds are rebuilt on demand.
#[derive(Debug, Clone)]
pub struct Patch {
    grid: ControlGrid,
    settings: TessellationSettings,
    limits: GridLimits,
    cache: Option<Cache>,
}

impl Patch {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Wrap `grid` with default settings and limits.
    ///
    /// # Panics
    /// Panics if the grid dimensions are outside the default [`GridLimits`].
    pub fn new(grid: ControlGrid) -> Self {
        Self::with_limits(grid, GridLimits::default())
    }

    /// Wrap `grid`, checking it against `limits`.
    ///
    /// # Panics
    /// Panics if the grid dimensions are outside `limits`.
    pub fn with_limits(grid: ControlGrid, limits: GridLimits) -> Self {
        limits.check(grid.width(), grid.height());
        Self {
            grid,
            settings: TessellationSettings::default(),
            limits,
            cache: None,
        }
    }

    /// Build a prefab shape inside `bounds`. See [`ControlGrid::prefab`].
    pub fn from_prefab(kind: Prefab, bounds: &Aabb, axis: Axis, width: usize, height: usize) -> Self {
        let limits = GridLimits::default();
        let grid = ControlGrid::prefab(kind, bounds, axis, width, height, &limits);
        Self::with_limits(grid, limits)
    }

    /// Replace the tessellation settings.
    pub fn with_settings(mut self, settings: TessellationSettings) -> Self {
        self.set_settings(settings);
        self
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Edit the control grid in place.
    ///
    /// # Panics
    /// Panics if the edit leaves the grid outside the patch limits.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut ControlGrid) -> R) -> R {
        let out = f(&mut self.grid);
        self.limits.check(self.grid.width(), self.grid.height());
        self.invalidate();
        out
    }

    /// Replace one control point.
    pub fn set_control(&mut self, row: usize, column: usize, point: ControlPoint) {
        self.grid.set(row, column, point);
        self.invalidate();
    }

    /// Change the grid dimensions. See [`ControlGrid::resize`].
    pub fn resize(&mut self, width: usize, height: usize) {
        self.grid.resize(width, height, &self.limits);
        self.invalidate();
    }

    /// Move every control point by `transform`.
    pub fn transform(&mut self, transform: &Transform) {
        self.grid.transform(transform);
        self.invalidate();
    }

    /// Replace the tessellation settings.
    pub fn set_settings(&mut self, settings: TessellationSettings) {
        if settings != self.settings {
            self.settings = settings;
            self.invalidate();
        }
    }

    fn invalidate(&mut self) {
        self.cache = None;
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The control grid.
    pub fn grid(&self) -> &ControlGrid {
        &self.grid
    }

    /// Current tessellation settings.
    pub fn settings(&self) -> &TessellationSettings {
        &self.settings
    }

    /// Dimension limits enforced on edits.
    pub fn limits(&self) -> &GridLimits {
        &self.limits
    }

    /// True if the control grid can be tessellated.
    pub fn is_valid(&self) -> bool {
        self.grid.is_valid()
    }

    /// True if the next read will rebuild the tessellation.
    pub fn is_stale(&self) -> bool {
        self.cache.is_none()
    }

    /// The tessellation of the current grid, rebuilt if stale.
    pub fn tessellation(&mut self) -> &TessellationResult {
        &self.cached().result
    }

    /// Bounds of the tessellated surface. Empty if the patch is invalid.
    pub fn bounds(&mut self) -> Aabb {
        self.cached().bounds
    }

    /// Triangle-list form of the tessellation.
    pub fn to_mesh(&mut self) -> TriangleMesh {
        self.tessellation().to_triangle_mesh()
    }

    fn cached(&mut self) -> &Cache {
        let (grid, settings) = (&self.grid, &self.settings);
        self.cache.get_or_insert_with(|| Cache::build(grid, settings))
    }
}

impl Cache {
    fn build(grid: &ControlGrid, settings: &TessellationSettings) -> Self {
        let result = patchmesh_tessellate::tessellate(grid, settings);
        let mut bounds = Aabb::empty();
        for v in result.vertices() {
            bounds.extend(&v.position);
        }
        log::debug!(
            "rebuilt {}x{} patch: {} vertices",
            grid.width(),
            grid.height(),
            result.vertices().len()
        );
        Self { result, bounds }
    }
}

impl From<ControlGrid> for Patch {
    fn from(grid: ControlGrid) -> Self {
        Self::new(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchmesh_math::{Point3, Vec2};

    fn flat() -> Patch {
        Patch::new(ControlGrid::from_fn(3, 3, |r, c| ControlPoint::at(c as f64, r as f64, 0.0)))
    }

    #[test]
    fn test_rebuild_on_first_read() {
        let mut patch = flat();
        assert!(patch.is_stale());
        assert_eq!(patch.tessellation().vertices().len(), 4);
        assert!(!patch.is_stale());
    }

    #[test]
    fn test_edits_invalidate() {
        let mut patch = flat();
        patch.tessellation();
        patch.set_control(1, 1, ControlPoint::new(Point3::new(1.0, 1.0, 5.0), Vec2::zeros()));
        assert!(patch.is_stale());
        patch.tessellation();
        patch.transform(&Transform::translation(0.0, 0.0, 1.0));
        assert!(patch.is_stale());
        patch.tessellation();
        patch.edit(|grid| grid.get_mut(0, 0).position.z = 2.0);
        assert!(patch.is_stale());
    }

    #[test]
    fn test_same_settings_keep_cache() {
        let mut patch = flat();
        patch.tessellation();
        patch.set_settings(TessellationSettings::default());
        assert!(!patch.is_stale());
        patch.set_settings(TessellationSettings::fixed(2, 2));
        assert!(patch.is_stale());
        assert_eq!(patch.tessellation().array_width(), 3);
    }

    #[test]
    fn test_bounds_follow_transform() {
        let mut patch = flat();
        let bb = patch.bounds();
        assert_eq!(bb.min(), Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bb.max(), Point3::new(2.0, 2.0, 0.0));
        patch.transform(&Transform::translation(10.0, 0.0, 0.0));
        assert_eq!(patch.bounds().min(), Point3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_invalid_grid_has_empty_mesh() {
        let mut patch = flat();
        patch.edit(|grid| grid.get_mut(2, 2).position.x = f64::INFINITY);
        assert!(!patch.is_valid());
        assert!(patch.tessellation().is_empty());
        assert!(patch.bounds().is_empty());
        assert_eq!(patch.to_mesh().num_triangles(), 0);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_too_large_grid_rejected() {
        Patch::new(ControlGrid::from_fn(33, 3, |r, c| ControlPoint::at(c as f64, r as f64, 0.0)));
    }
}
