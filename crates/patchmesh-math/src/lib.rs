#![warn(missing_docs)]

//! Math types for bi-quadratic Bezier patch tessellation.
//!
//! Thin wrappers around nalgebra providing the handful of domain types the
//! patch pipeline needs: points and vectors, affine transforms for moving
//! control grids, bounding boxes, and the small vector helpers shared by the
//! tessellators (midpoints, safe normalisation, texture-space tangent solve).

use nalgebra::{Matrix4, Vector2, Vector3, Vector4};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A 2D vector, used for texture coordinates and their deltas.
pub type Vec2 = Vector2<f64>;

/// A 4x4 affine transformation matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        Self { matrix: m }
    }

    /// Non-uniform scale by `(sx, sy, sz)`.
    pub fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 0)] = sx;
        m[(1, 1)] = sy;
        m[(2, 2)] = sz;
        Self { matrix: m }
    }

    /// Rotation about the Z axis by `angle` radians.
    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        m[(0, 0)] = c;
        m[(0, 1)] = -s;
        m[(1, 0)] = s;
        m[(1, 1)] = c;
        Self { matrix: m }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }
}

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance.
    pub linear: f64,
}

impl Tolerance {
    /// Default tolerance used when checking generated mesh data.
    pub const DEFAULT: Self = Self { linear: 1e-6 };

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }

    /// Check if a vector has unit length.
    pub fn is_unit(&self, v: &Vec3) -> bool {
        self.is_zero(v.norm() - 1.0)
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Axis-aligned bounding box stored as center + half extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Box center.
    pub origin: Point3,
    /// Half size along each axis. Negative when the box is empty.
    pub extents: Vec3,
}

impl Aabb {
    /// An empty box that any point will extend.
    pub fn empty() -> Self {
        Self {
            origin: Point3::origin(),
            extents: Vec3::new(-1.0, -1.0, -1.0),
        }
    }

    /// Box spanning two corners.
    pub fn from_min_max(min: Point3, max: Point3) -> Self {
        Self {
            origin: nalgebra::center(&min, &max),
            extents: (max - min) * 0.5,
        }
    }

    /// True if no point has been added.
    pub fn is_empty(&self) -> bool {
        self.extents.x < 0.0 || self.extents.y < 0.0 || self.extents.z < 0.0
    }

    /// Minimum corner.
    pub fn min(&self) -> Point3 {
        self.origin - self.extents
    }

    /// Maximum corner.
    pub fn max(&self) -> Point3 {
        self.origin + self.extents
    }

    /// Grow the box to contain `p`. Non-finite points are ignored.
    pub fn extend(&mut self, p: &Point3) {
        if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
            return;
        }
        if self.is_empty() {
            self.origin = *p;
            self.extents = Vec3::zeros();
            return;
        }
        let min = self.min().inf(p);
        let max = self.max().sup(p);
        *self = Self::from_min_max(min, max);
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

/// Midpoint of two points.
pub fn mid_point(a: &Point3, b: &Point3) -> Point3 {
    Point3::from((a.coords + b.coords) * 0.5)
}

/// Midpoint of two 2D vectors.
pub fn mid_vec2(a: &Vec2, b: &Vec2) -> Vec2 {
    (a + b) * 0.5
}

/// Linear interpolation between two points: `a` at `t = 0`, `b` at `t = 1`.
pub fn lerp_point(a: &Point3, b: &Point3, t: f64) -> Point3 {
    Point3::from(a.coords * (1.0 - t) + b.coords * t)
}

/// Linear interpolation between two 2D vectors.
pub fn lerp_vec2(a: &Vec2, b: &Vec2, t: f64) -> Vec2 {
    a * (1.0 - t) + b * t
}

/// Normalise `v`, leaving the zero vector untouched.
pub fn normalize_or_zero(v: &Vec3) -> Vec3 {
    let len = v.norm();
    if len == 0.0 || !len.is_finite() {
        Vec3::zeros()
    } else {
        v / len
    }
}

/// Texture-space tangent and bitangent of a triangle.
///
/// Solves, per spatial component, the plane through the three
/// `(position[k], s, t)` samples for the rate of change of that component
/// along `s` and along `t`. Components whose plane is vertical in texture
/// space are left at zero. The results are not normalised.
pub fn triangle_tangents(
    a: (&Point3, &Vec2),
    b: (&Point3, &Vec2),
    c: (&Point3, &Vec2),
) -> (Vec3, Vec3) {
    let mut s = Vec3::zeros();
    let mut t = Vec3::zeros();
    for k in 0..3 {
        let pa = Vec3::new(a.0[k], a.1.x, a.1.y);
        let pb = Vec3::new(b.0[k], b.1.x, b.1.y);
        let pc = Vec3::new(c.0[k], c.1.x, c.1.y);
        let cross = (pb - pa).cross(&(pc - pa));
        if cross.x.abs() > 1e-6 {
            s[k] = -cross.y / cross.x;
            t[k] = -cross.z / cross.x;
        }
    }
    (s, t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_translation() {
        let t = Transform::translation(10.0, 20.0, 30.0);
        let result = t.apply_point(&Point3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(result, Point3::new(11.0, 22.0, 33.0));
    }

    #[test]
    fn test_rotation_z_90() {
        let t = Transform::rotation_z(PI / 2.0);
        let result = t.apply_point(&Point3::new(1.0, 0.0, 0.0));
        assert!(result.x.abs() < 1e-12);
        assert!((result.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_aabb_extend() {
        let mut bb = Aabb::empty();
        assert!(bb.is_empty());
        bb.extend(&Point3::new(1.0, 2.0, 3.0));
        assert!(!bb.is_empty());
        assert_eq!(bb.extents, Vec3::zeros());
        bb.extend(&Point3::new(-1.0, 0.0, 5.0));
        assert_relative_eq!(bb.min(), Point3::new(-1.0, 0.0, 3.0));
        assert_relative_eq!(bb.max(), Point3::new(1.0, 2.0, 5.0));
        bb.extend(&Point3::new(f64::NAN, 100.0, 0.0));
        assert_relative_eq!(bb.max(), Point3::new(1.0, 2.0, 5.0));
    }

    #[test]
    fn test_normalize_or_zero() {
        assert_eq!(normalize_or_zero(&Vec3::zeros()), Vec3::zeros());
        let n = normalize_or_zero(&Vec3::new(0.0, 3.0, 4.0));
        assert!(Tolerance::DEFAULT.is_unit(&n));
        assert_relative_eq!(n, Vec3::new(0.0, 0.6, 0.8));
    }

    #[test]
    fn test_lerp_endpoints_are_exact() {
        let a = Point3::new(0.1, 0.2, 0.3);
        let b = Point3::new(7.0, -3.0, 0.7);
        assert_eq!(lerp_point(&a, &b, 0.0), a);
        assert_eq!(lerp_point(&a, &b, 1.0), b);
        assert_eq!(mid_point(&a, &b), lerp_point(&a, &b, 0.5));
    }

    #[test]
    fn test_triangle_tangents_axis_aligned() {
        // s follows +x, t follows +y
        let (s, t) = triangle_tangents(
            (&Point3::new(0.0, 0.0, 0.0), &Vec2::new(0.0, 0.0)),
            (&Point3::new(2.0, 0.0, 0.0), &Vec2::new(1.0, 0.0)),
            (&Point3::new(0.0, 2.0, 0.0), &Vec2::new(0.0, 1.0)),
        );
        assert_relative_eq!(normalize_or_zero(&s), Vec3::x());
        assert_relative_eq!(normalize_or_zero(&t), Vec3::y());
    }

    #[test]
    fn test_triangle_tangents_degenerate_texcoords() {
        let (s, t) = triangle_tangents(
            (&Point3::new(0.0, 0.0, 0.0), &Vec2::zeros()),
            (&Point3::new(1.0, 0.0, 0.0), &Vec2::zeros()),
            (&Point3::new(0.0, 1.0, 0.0), &Vec2::zeros()),
        );
        assert_eq!(s, Vec3::zeros());
        assert_eq!(t, Vec3::zeros());
    }
}
