//! Curvature-adaptive curve trees.
//!
//! For every column of sub-patches (and, symmetrically, every row) the
//! quadratic curves crossing it are collected into a list and bisected
//! together until none of them bends more than the curvature threshold. The
//! resulting binary tree fixes how many samples the column gets and which
//! slot of the flattened vertex array each sample lives in.

use std::f64::consts::PI;

use patchmesh_grid::{ControlGrid, MatrixMajor};
use patchmesh_math::{mid_point, Point3, Vec3};

/// Deepest level a curve tree may reach. A node at this depth is a leaf.
pub const MAX_SUBDIVISION_DEPTH: usize = 16;

/// A quadratic Bezier curve given by its three control positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BezierCurve {
    /// First end point.
    pub left: Point3,
    /// Off-curve control point.
    pub mid: Point3,
    /// Second end point.
    pub right: Point3,
}

impl BezierCurve {
    /// Create a curve.
    pub fn new(left: Point3, mid: Point3, right: Point3) -> Self {
        Self { left, mid, right }
    }

    /// Whether the curve bends enough to be worth splitting.
    ///
    /// The measure is the chord length times the turning angle between the
    /// two control legs, as a fraction of a half turn. Straight, collapsed
    /// and zero-length curves are never curved.
    pub fn is_curved(&self, threshold: f64) -> bool {
        let chord = self.right - self.left;
        let v1 = self.mid - self.left;
        let v2 = self.right - self.mid;

        if v1 == Vec3::zeros() || v2 == Vec3::zeros() || chord == v1 {
            return false;
        }

        let v1 = v1.normalize();
        let v2 = v2.normalize();
        if v1 == v2 {
            return false;
        }

        let width = chord.norm();
        if width == 0.0 {
            return false;
        }
        let chord = chord / width;
        if v1 == chord && v2 == chord {
            return false;
        }

        let angle = v1.dot(&v2).clamp(-1.0, 1.0).acos() / PI;
        width * angle > threshold
    }

    /// Split at `t = ½` by De Casteljau, returning the left and right halves.
    pub fn bisect(&self) -> (BezierCurve, BezierCurve) {
        let left_mid = mid_point(&self.left, &self.mid);
        let right_mid = mid_point(&self.mid, &self.right);
        let split = mid_point(&left_mid, &right_mid);
        (
            BezierCurve::new(self.left, left_mid, split),
            BezierCurve::new(split, right_mid, self.right),
        )
    }
}

/// Node of a curve tree.
///
/// Leaves stand for spans that need no further samples and own no array
/// slot. A split node owns the slot of the sample at its parameter midpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum CurveNode {
    /// No further subdivision.
    Leaf,
    /// Subdivided span.
    Split {
        /// Offset of the midpoint sample in the flattened vertex array,
        /// already multiplied by the axis stride.
        index: usize,
        /// First half.
        left: Box<CurveNode>,
        /// Second half.
        right: Box<CurveNode>,
    },
}

/// Borrowed view of a [`CurveNode::Split`].
#[derive(Debug, Clone, Copy)]
pub struct Split<'a> {
    /// Array offset of the midpoint sample.
    pub index: usize,
    /// First half.
    pub left: &'a CurveNode,
    /// Second half.
    pub right: &'a CurveNode,
}

impl CurveNode {
    /// Build the tree for a list of curves that are tessellated together.
    ///
    /// If any curve is curved, every curve is bisected and both halves are
    /// built recursively, so all curves crossing a sub-patch column share one
    /// set of samples. Slots are left at zero; see [`CurveNode::assign_slots`].
    pub fn build(curves: &[BezierCurve], threshold: f64) -> Self {
        Self::build_at(curves, threshold, 0)
    }

    fn build_at(curves: &[BezierCurve], threshold: f64, depth: usize) -> Self {
        if depth == MAX_SUBDIVISION_DEPTH || !curves.iter().any(|c| c.is_curved(threshold)) {
            return CurveNode::Leaf;
        }

        let (left, right): (Vec<_>, Vec<_>) = curves.iter().map(BezierCurve::bisect).unzip();
        CurveNode::Split {
            index: 0,
            left: Box::new(Self::build_at(&left, threshold, depth + 1)),
            right: Box::new(Self::build_at(&right, threshold, depth + 1)),
        }
    }

    /// Number the split nodes in order, starting at `counter`.
    ///
    /// Each split node receives `counter * stride` and advances the counter.
    /// Returns the counter after the last node.
    pub fn assign_slots(&mut self, counter: usize, stride: usize) -> usize {
        match self {
            CurveNode::Leaf => counter,
            CurveNode::Split { index, left, right } => {
                let counter = left.assign_slots(counter, stride);
                *index = counter * stride;
                right.assign_slots(counter + 1, stride)
            }
        }
    }

    /// True for a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, CurveNode::Leaf)
    }

    /// Array offset of a split node's sample.
    pub fn index(&self) -> Option<usize> {
        self.as_split().map(|s| s.index)
    }

    /// View a split node.
    pub fn as_split(&self) -> Option<Split<'_>> {
        match self {
            CurveNode::Leaf => None,
            CurveNode::Split { index, left, right } => Some(Split {
                index: *index,
                left,
                right,
            }),
        }
    }

    /// Number of split nodes, i.e. samples added between the end points.
    pub fn internal_nodes(&self) -> usize {
        match self {
            CurveNode::Leaf => 0,
            CurveNode::Split { left, right, .. } => 1 + left.internal_nodes() + right.internal_nodes(),
        }
    }

    /// Height of the tree; a lone leaf has depth 0.
    pub fn depth(&self) -> usize {
        match self {
            CurveNode::Leaf => 0,
            CurveNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// Curves crossing one column (`MatrixMajor::Row`) or one row
/// (`MatrixMajor::Column`) of sub-patches.
///
/// Each control line on a sub-patch boundary contributes its own curve; each
/// pair of boundary lines also contributes the iso-curve halfway between
/// them, `mid(mid(P[r], P[r+2]), P[r+1])` per control point.
pub fn crossing_curves(grid: &ControlGrid, major: MatrixMajor, sub_patch: usize) -> Vec<BezierCurve> {
    let base = sub_patch * 2;
    let (cross_len, at): (usize, Box<dyn Fn(usize, usize) -> Point3 + '_>) = match major {
        MatrixMajor::Row => (
            grid.height(),
            Box::new(move |line, k| grid.get(line, base + k).position),
        ),
        MatrixMajor::Column => (
            grid.width(),
            Box::new(move |line, k| grid.get(base + k, line).position),
        ),
    };
    let curve_on = |line: usize| BezierCurve::new(at(line, 0), at(line, 1), at(line, 2));

    let mut curves = Vec::with_capacity(cross_len);
    for line in (0..cross_len).step_by(2) {
        let near = curve_on(line);
        curves.push(near);
        if line + 2 >= cross_len {
            break;
        }
        let inner = curve_on(line + 1);
        let far = curve_on(line + 2);
        curves.push(BezierCurve::new(
            mid_point(&mid_point(&near.left, &far.left), &inner.left),
            mid_point(&mid_point(&near.mid, &far.mid), &inner.mid),
            mid_point(&mid_point(&near.right, &far.right), &inner.right),
        ));
    }
    curves
}

/// Curve trees and sample counts for one axis of a patch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisLayout {
    /// One tree per sub-patch along the axis; empty for fixed subdivision.
    pub trees: Vec<CurveNode>,
    /// Array entries spanned by each sub-patch.
    pub extents: Vec<usize>,
    /// Total flattened length along the axis.
    pub length: usize,
}

impl AxisLayout {
    /// Build adaptive trees for every sub-patch along `major`.
    ///
    /// `stride` is 1 for the u axis and the flattened array width for the
    /// v axis, so the u axis has to be laid out first.
    pub fn adaptive(grid: &ControlGrid, major: MatrixMajor, threshold: f64, stride: usize) -> Self {
        let count = grid.sub_patch_count(major);
        let mut layout = AxisLayout {
            trees: Vec::with_capacity(count),
            extents: Vec::with_capacity(count),
            length: 1,
        };
        for sub_patch in 0..count {
            let mut tree = CurveNode::build(&crossing_curves(grid, major, sub_patch), threshold);
            let end = tree.assign_slots(layout.length, stride);
            let extent = end - (layout.length - 1);
            layout.length += extent;
            layout.extents.push(extent);
            layout.trees.push(tree);
        }
        layout
    }

    /// Evenly spaced samples, `subdivisions` array entries per sub-patch.
    ///
    /// The length saturates at `usize::MAX`, so oversized requests reach the
    /// vertex array limit instead of overflowing.
    pub fn fixed(grid: &ControlGrid, major: MatrixMajor, subdivisions: usize) -> Self {
        let count = grid.sub_patch_count(major);
        AxisLayout {
            trees: Vec::new(),
            extents: vec![subdivisions; count],
            length: count.saturating_mul(subdivisions).saturating_add(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchmesh_grid::ControlPoint;

    fn curve(l: [f64; 3], m: [f64; 3], r: [f64; 3]) -> BezierCurve {
        BezierCurve::new(Point3::from(l), Point3::from(m), Point3::from(r))
    }

    #[test]
    fn test_straight_curve_not_curved() {
        let c = curve([0.0, 0.0, 0.0], [5.0, 0.0, 0.0], [10.0, 0.0, 0.0]);
        assert!(!c.is_curved(4.0));
        assert!(!c.is_curved(0.0));
    }

    #[test]
    fn test_collapsed_curves_not_curved() {
        let p = [1.0, 2.0, 3.0];
        assert!(!curve(p, p, p).is_curved(0.0));
        assert!(!curve(p, p, [4.0, 2.0, 3.0]).is_curved(0.0));
        assert!(!curve([4.0, 2.0, 3.0], p, p).is_curved(0.0));
    }

    #[test]
    fn test_right_angle_curve() {
        // chord length 100 * sqrt(2), turning angle 1/2
        let c = curve([0.0, 0.0, 0.0], [100.0, 0.0, 0.0], [100.0, 100.0, 0.0]);
        assert!(c.is_curved(4.0));
        assert!(c.is_curved(70.0));
        assert!(!c.is_curved(71.0));
    }

    #[test]
    fn test_hairpin_curve_is_curved() {
        // control legs point in opposite directions; acos input hits -1
        let c = curve([0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [5.0, 0.0, 0.0]);
        assert!(c.is_curved(4.0));
    }

    #[test]
    fn test_bisect_matches_de_casteljau() {
        let c = curve([0.0, 0.0, 0.0], [2.0, 4.0, 0.0], [4.0, 0.0, 0.0]);
        let (l, r) = c.bisect();
        assert_eq!(l.left, c.left);
        assert_eq!(l.mid, Point3::new(1.0, 2.0, 0.0));
        assert_eq!(l.right, Point3::new(2.0, 2.0, 0.0));
        assert_eq!(r.left, l.right);
        assert_eq!(r.mid, Point3::new(3.0, 2.0, 0.0));
        assert_eq!(r.right, c.right);
    }

    #[test]
    fn test_flat_list_builds_leaf() {
        let flat = vec![curve([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]); 3];
        let tree = CurveNode::build(&flat, 4.0);
        assert!(tree.is_leaf());
        assert_eq!(tree.index(), None);
    }

    #[test]
    fn test_one_curved_curve_splits_all() {
        let curves = [
            curve([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]),
            curve([0.0, 0.0, 0.0], [100.0, 0.0, 0.0], [100.0, 100.0, 0.0]),
        ];
        let tree = CurveNode::build(&curves, 4.0);
        assert!(!tree.is_leaf());
        assert!(tree.depth() >= 2);
    }

    #[test]
    fn test_depth_is_capped() {
        let huge = curve([0.0, 0.0, 0.0], [1e12, 0.0, 0.0], [1e12, 1e12, 0.0]);
        let tree = CurveNode::build(&[huge], 4.0);
        assert_eq!(tree.depth(), MAX_SUBDIVISION_DEPTH);
        assert_eq!(tree.internal_nodes(), (1 << MAX_SUBDIVISION_DEPTH) - 1);
    }

    #[test]
    fn test_slots_are_in_order() {
        let mut tree = CurveNode::Split {
            index: 0,
            left: Box::new(CurveNode::Split {
                index: 0,
                left: Box::new(CurveNode::Leaf),
                right: Box::new(CurveNode::Leaf),
            }),
            right: Box::new(CurveNode::Leaf),
        };
        let end = tree.assign_slots(5, 10);
        assert_eq!(end, 7);
        let root = tree.as_split().unwrap();
        assert_eq!(root.index, 60);
        assert_eq!(root.left.index(), Some(50));
        assert_eq!(root.right.index(), None);
    }

    #[test]
    fn test_crossing_curves_include_interpolated() {
        let grid = ControlGrid::from_fn(3, 3, |r, c| ControlPoint::at(c as f64, r as f64, (r * c) as f64));
        let rows = crossing_curves(&grid, MatrixMajor::Row, 0);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].mid, Point3::new(1.0, 0.0, 0.0));
        assert_eq!(rows[1].left, Point3::new(0.0, 1.0, 0.0));
        assert_eq!(rows[1].mid, Point3::new(1.0, 1.0, 1.0));
        assert_eq!(rows[2].right, Point3::new(2.0, 2.0, 4.0));

        let columns = crossing_curves(&grid, MatrixMajor::Column, 0);
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[2].left, Point3::new(2.0, 0.0, 0.0));
        assert_eq!(columns[2].right, Point3::new(2.0, 2.0, 4.0));
    }

    #[test]
    fn test_adaptive_layout_extents() {
        let grid = ControlGrid::from_fn(5, 3, |r, c| ControlPoint::at(c as f64, r as f64, 0.0));
        let layout = AxisLayout::adaptive(&grid, MatrixMajor::Row, 4.0, 1);
        assert_eq!(layout.extents, vec![1, 1]);
        assert_eq!(layout.length, 3);
        assert!(layout.trees.iter().all(CurveNode::is_leaf));
    }

    #[test]
    fn test_fixed_layout_extents() {
        let grid = ControlGrid::from_fn(5, 7, |r, c| ControlPoint::at(c as f64, r as f64, 0.0));
        let layout = AxisLayout::fixed(&grid, MatrixMajor::Column, 4);
        assert_eq!(layout.extents, vec![4, 4, 4]);
        assert_eq!(layout.length, 13);
        assert!(layout.trees.is_empty());
    }

    #[test]
    fn test_fixed_layout_length_saturates() {
        let grid = ControlGrid::from_fn(5, 3, |r, c| ControlPoint::at(c as f64, r as f64, 0.0));
        let layout = AxisLayout::fixed(&grid, MatrixMajor::Row, usize::MAX / 2 + 1);
        assert_eq!(layout.extents.len(), 2);
        assert_eq!(layout.length, usize::MAX);
    }
}
