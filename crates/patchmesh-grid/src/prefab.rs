//! Prefab control grids: planes, cylinders, cones, spheres and caps.
//!
//! Every prefab is built to fill an axis-aligned box. The `axis` picks which
//! world axis the shape's height runs along. Texture coordinates are
//! grid-parametric (`s = column / (width - 1)`, `t = row / (height - 1)`);
//! projecting real texture coordinates is left to the caller.

use std::f64::consts::PI;

use patchmesh_math::{Aabb, Point3, Vec2};

use crate::{ControlGrid, ControlPoint, GridLimits};

/// World axis a prefab is oriented along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The X axis.
    X,
    /// The Y axis.
    Y,
    /// The Z axis.
    Z,
}

/// Prefab shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prefab {
    /// Flat grid of the requested size on the top face of the box.
    Plane,
    /// 9×3 cylinder with square corners, seam at column 0.
    SquareCylinder,
    /// 9×3 cylinder approximating a circle with 4 quadratic arcs.
    Cylinder,
    /// 9×3 cone; the last row collapses to the apex.
    Cone,
    /// 9×5 sphere; first and last rows collapse to the poles.
    Sphere,
    /// 3×3 quarter bevel.
    Bevel,
    /// 5×3 half-cylinder end cap.
    EndCap,
    /// Cylinder of the requested size with exact circular arcs.
    ExactCylinder,
    /// Cone of the requested size with exact circular arcs.
    ExactCone,
    /// Sphere of the requested size with exact circular arcs.
    ExactSphere,
}

/// Box corner indices `(x, y)` around a cylinder cross-section; `0` = min,
/// `1` = center, `2` = max.
const CYLINDER_RING: [(usize, usize); 8] = [
    (0, 0),
    (1, 0),
    (2, 0),
    (2, 1),
    (2, 2),
    (1, 2),
    (0, 2),
    (0, 1),
];

const BEVEL_RING: [(usize, usize); 3] = [(0, 0), (2, 0), (2, 2)];

const END_CAP_RING: [(usize, usize); 5] = [(2, 0), (2, 2), (1, 2), (0, 2), (0, 0)];

/// Maps local `(x, y, z)` slots, with `z` the height axis, to world components.
#[derive(Debug, Clone, Copy)]
struct Frame {
    x: usize,
    y: usize,
    z: usize,
}

impl Frame {
    fn prefab(axis: Axis) -> Self {
        match axis {
            Axis::Z => Self { x: 0, y: 1, z: 2 },
            Axis::Y => Self { x: 2, y: 0, z: 1 },
            Axis::X => Self { x: 1, y: 2, z: 0 },
        }
    }

    fn plane(axis: Axis) -> Self {
        match axis {
            Axis::Z => Self { x: 0, y: 1, z: 2 },
            Axis::Y => Self { x: 0, y: 2, z: 1 },
            Axis::X => Self { x: 1, y: 2, z: 0 },
        }
    }

    fn point(&self, x: f64, y: f64, z: f64) -> Point3 {
        let mut p = Point3::origin();
        p[self.x] = x;
        p[self.y] = y;
        p[self.z] = z;
        p
    }
}

impl ControlGrid {
    /// Build a prefab shape filling `bounds`.
    ///
    /// `width` and `height` are only used by [`Prefab::Plane`] and the exact
    /// shapes; the other prefabs have fixed dimensions.
    ///
    /// # Panics
    /// Panics if the requested dimensions are outside `limits`, or if an exact
    /// sphere is requested with fewer than 5 rows.
    pub fn prefab(
        kind: Prefab,
        bounds: &Aabb,
        axis: Axis,
        width: usize,
        height: usize,
        limits: &GridLimits,
    ) -> Self {
        let levels = [bounds.min(), bounds.origin, bounds.max()];
        let frame = Frame::prefab(axis);

        let mut grid = match kind {
            Prefab::Plane => {
                limits.check(width, height);
                plane(bounds, Frame::plane(axis), width, height)
            }
            Prefab::SquareCylinder | Prefab::Cylinder | Prefab::Cone => {
                let square = kind == Prefab::SquareCylinder;
                let mut grid = ring_grid(&levels, frame, 9, 3, &CYLINDER_RING, !square);
                let seam_rows = if kind == Prefab::Cone { 2 } else { 3 };
                close_seam(&mut grid, square, 0..seam_rows);
                if kind == Prefab::Cone {
                    let apex = frame.point(levels[1][frame.x], levels[1][frame.y], levels[2][frame.z]);
                    fill_row(&mut grid, 2, apex);
                }
                grid
            }
            Prefab::Sphere => {
                let ring = ring_grid(&levels, frame, 9, 3, &CYLINDER_RING, true);
                let mut grid = ControlGrid::from_fn(9, 5, |row, column| {
                    if (1..4).contains(&row) {
                        *ring.get(row - 1, column)
                    } else {
                        ControlPoint::default()
                    }
                });
                close_seam(&mut grid, false, 1..4);
                let bottom = frame.point(levels[1][frame.x], levels[1][frame.y], levels[0][frame.z]);
                let top = frame.point(levels[1][frame.x], levels[1][frame.y], levels[2][frame.z]);
                fill_row(&mut grid, 0, bottom);
                fill_row(&mut grid, 4, top);
                grid
            }
            Prefab::Bevel => ring_grid(&levels, frame, 3, 3, &BEVEL_RING, false),
            Prefab::EndCap => ring_grid(&levels, frame, 5, 3, &END_CAP_RING, false),
            Prefab::ExactCylinder | Prefab::ExactCone => {
                limits.check(width, height);
                exact_cylinder(bounds, frame, width, height, kind == Prefab::ExactCone)
            }
            Prefab::ExactSphere => {
                limits.check(width, height);
                assert!(height >= 5, "exact sphere needs at least 5 rows, got {height}");
                exact_sphere(bounds, frame, width, height)
            }
        };

        assign_parametric_texcoords(&mut grid);
        grid
    }
}

fn plane(bounds: &Aabb, frame: Frame, width: usize, height: usize) -> ControlGrid {
    let min = bounds.min();
    let max = bounds.max();
    let step_x = (max[frame.x] - min[frame.x]).abs() / (width - 1) as f64;
    let step_y = (max[frame.y] - min[frame.y]).abs() / (height - 1) as f64;
    ControlGrid::from_fn(width, height, |row, column| {
        let p = frame.point(
            min[frame.x] + column as f64 * step_x,
            min[frame.y] + row as f64 * step_y,
            max[frame.z],
        );
        ControlPoint::new(p, Vec2::zeros())
    })
}

/// Stack a cross-section ring at the three height levels. With
/// `skip_first_column` the ring starts at column 1 and column 0 is left for
/// the seam.
fn ring_grid(
    levels: &[Point3; 3],
    frame: Frame,
    width: usize,
    height: usize,
    ring: &[(usize, usize)],
    skip_first_column: bool,
) -> ControlGrid {
    let skip = usize::from(skip_first_column);
    ControlGrid::from_fn(width, height, |row, column| {
        let slot = column.checked_sub(skip).and_then(|i| ring.get(i));
        match slot {
            Some(&(ix, iy)) => ControlPoint::new(
                frame.point(levels[ix][frame.x], levels[iy][frame.y], levels[row][frame.z]),
                Vec2::zeros(),
            ),
            None => ControlPoint::default(),
        }
    })
}

/// Close a cylinder seam on the given rows. Square cylinders copy the first
/// column onto the last; round ones copy the last onto the first.
fn close_seam(grid: &mut ControlGrid, square: bool, rows: std::ops::Range<usize>) {
    let last = grid.width() - 1;
    for row in rows {
        if square {
            let p = *grid.get(row, 0);
            grid.set(row, last, p);
        } else {
            let p = *grid.get(row, last);
            grid.set(row, 0, p);
        }
    }
}

fn fill_row(grid: &mut ControlGrid, row: usize, position: Point3) {
    for column in 0..grid.width() {
        grid.get_mut(row, column).position = position;
    }
}

fn exact_cylinder(bounds: &Aabb, frame: Frame, width: usize, height: usize, cone: bool) -> ControlGrid {
    let center = bounds.origin;
    let min = bounds.min();
    let max = bounds.max();
    let segments = ((width - 1) / 2) as f64;
    let stretch = 1.0 / (PI / segments).cos();

    ControlGrid::from_fn(width, height, |row, column| {
        let angle = PI * column as f64 / segments;
        let scale = if column % 2 == 1 { stretch } else { 1.0 };
        let v = row as f64 / (height - 1) as f64;
        let taper = if cone { 1.0 - v } else { 1.0 };
        let p = frame.point(
            center[frame.x] + taper * (max[frame.x] - center[frame.x]) * angle.cos() * scale,
            center[frame.y] + taper * (max[frame.y] - center[frame.y]) * angle.sin() * scale,
            min[frame.z] + (max[frame.z] - min[frame.z]) * v,
        );
        ControlPoint::new(p, Vec2::zeros())
    })
}

fn exact_sphere(bounds: &Aabb, frame: Frame, width: usize, height: usize) -> ControlGrid {
    let center = bounds.origin;
    let max = bounds.max();
    let yaw_segments = ((width - 1) / 2) as f64;
    let pitch_segments = ((height - 1) / 2) as f64;
    let yaw_stretch = 1.0 / (PI / yaw_segments).cos();
    let pitch_stretch = 1.0 / (PI / (2.0 * pitch_segments)).cos();

    ControlGrid::from_fn(width, height, |row, column| {
        let yaw = PI * column as f64 / yaw_segments;
        let pitch = PI * row as f64 / (2.0 * pitch_segments);
        let f = if column % 2 == 1 { yaw_stretch } else { 1.0 };
        let g = if row % 2 == 1 { pitch_stretch } else { 1.0 };
        let p = frame.point(
            center[frame.x] + (max[frame.x] - center[frame.x]) * pitch.sin() * g * yaw.cos() * f,
            center[frame.y] + (max[frame.y] - center[frame.y]) * pitch.sin() * g * yaw.sin() * f,
            center[frame.z] + (max[frame.z] - center[frame.z]) * -pitch.cos() * g,
        );
        ControlPoint::new(p, Vec2::zeros())
    })
}

fn assign_parametric_texcoords(grid: &mut ControlGrid) {
    let (width, height) = (grid.width(), grid.height());
    for row in 0..height {
        for column in 0..width {
            grid.get_mut(row, column).texcoord = Vec2::new(
                column as f64 / (width - 1) as f64,
                row as f64 / (height - 1) as f64,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> Aabb {
        Aabb::from_min_max(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0))
    }

    fn build(kind: Prefab) -> ControlGrid {
        ControlGrid::prefab(kind, &unit_box(), Axis::Z, 5, 5, &GridLimits::default())
    }

    #[test]
    fn test_plane_spans_top_face() {
        let grid = build(Prefab::Plane);
        assert_eq!((grid.width(), grid.height()), (5, 5));
        assert_relative_eq!(grid.get(0, 0).position, Point3::new(-1.0, -1.0, 1.0));
        assert_relative_eq!(grid.get(4, 4).position, Point3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(grid.get(2, 1).position, Point3::new(-0.5, 0.0, 1.0));
        assert_relative_eq!(grid.get(4, 4).texcoord, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_cylinder_seam_is_closed() {
        let grid = build(Prefab::Cylinder);
        assert_eq!((grid.width(), grid.height()), (9, 3));
        for row in 0..3 {
            assert_eq!(grid.get(row, 0).position, grid.get(row, 8).position);
            assert_relative_eq!(grid.get(row, 1).position.z, [-1.0, 0.0, 1.0][row]);
        }
        // first ring point is the min corner
        assert_relative_eq!(grid.get(0, 1).position, Point3::new(-1.0, -1.0, -1.0));
    }

    #[test]
    fn test_square_cylinder_starts_at_column_zero() {
        let grid = build(Prefab::SquareCylinder);
        assert_relative_eq!(grid.get(0, 0).position, Point3::new(-1.0, -1.0, -1.0));
        assert_eq!(grid.get(1, 8).position, grid.get(1, 0).position);
    }

    #[test]
    fn test_cone_apex_row_collapses() {
        let grid = build(Prefab::Cone);
        for column in 0..9 {
            assert_relative_eq!(grid.get(2, column).position, Point3::new(0.0, 0.0, 1.0));
        }
        assert_eq!(grid.get(0, 0).position, grid.get(0, 8).position);
    }

    #[test]
    fn test_sphere_poles() {
        let grid = build(Prefab::Sphere);
        assert_eq!((grid.width(), grid.height()), (9, 5));
        for column in 0..9 {
            assert_relative_eq!(grid.get(0, column).position, Point3::new(0.0, 0.0, -1.0));
            assert_relative_eq!(grid.get(4, column).position, Point3::new(0.0, 0.0, 1.0));
        }
        assert_eq!(grid.get(2, 0).position, grid.get(2, 8).position);
    }

    #[test]
    fn test_end_cap_and_bevel_dimensions() {
        let cap = build(Prefab::EndCap);
        assert_eq!((cap.width(), cap.height()), (5, 3));
        assert_relative_eq!(cap.get(0, 2).position, Point3::new(0.0, 1.0, -1.0));
        let bevel = build(Prefab::Bevel);
        assert_eq!((bevel.width(), bevel.height()), (3, 3));
        assert_relative_eq!(bevel.get(2, 1).position, Point3::new(1.0, -1.0, 1.0));
    }

    #[test]
    fn test_exact_cylinder_corners_on_circle() {
        let grid = ControlGrid::prefab(
            Prefab::ExactCylinder,
            &unit_box(),
            Axis::Z,
            9,
            3,
            &GridLimits::default(),
        );
        for column in (0..9).step_by(2) {
            let p = grid.get(0, column).position;
            assert_relative_eq!((p.x * p.x + p.y * p.y).sqrt(), 1.0, epsilon = 1e-12);
        }
        assert_relative_eq!(grid.get(2, 0).position.z, 1.0);
    }

    #[test]
    fn test_exact_cone_tapers_to_apex() {
        let grid = ControlGrid::prefab(Prefab::ExactCone, &unit_box(), Axis::Z, 9, 5, &GridLimits::default());
        for column in 0..9 {
            let p = grid.get(4, column).position;
            assert_relative_eq!(p, Point3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_exact_sphere_poles() {
        let grid = ControlGrid::prefab(Prefab::ExactSphere, &unit_box(), Axis::Z, 9, 5, &GridLimits::default());
        assert_relative_eq!(grid.get(0, 3).position, Point3::new(0.0, 0.0, -1.0), epsilon = 1e-12);
        assert_relative_eq!(grid.get(4, 3).position, Point3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(grid.get(2, 0).position, Point3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_axis_x_orients_height() {
        let grid = ControlGrid::prefab(Prefab::Cone, &unit_box(), Axis::X, 3, 3, &GridLimits::default());
        assert_relative_eq!(grid.get(2, 4).position, Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_plane_outside_limits_panics() {
        let _ = ControlGrid::prefab(Prefab::Plane, &unit_box(), Axis::Z, 41, 3, &GridLimits::default());
    }
}
