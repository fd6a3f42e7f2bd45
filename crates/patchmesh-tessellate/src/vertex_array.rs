//! Fill the flattened vertex array, one sub-patch at a time.
//!
//! For each sub-patch the on-surface corners and the control points the
//! recursion needs are written into their reserved slots, the corner frames
//! are accumulated from the control-polygon edges, and then either the
//! adaptive recursion or the fixed sampler fills the interior.

use patchmesh_grid::ControlGrid;
use patchmesh_math::{normalize_or_zero, triangle_tangents, Point3, Vec2};

use crate::adaptive::{subdivide, Span};
use crate::curve::AxisLayout;
use crate::degenerate::{Corner, EdgeFlags, EdgeTangents};
use crate::fixed::{self, SharedEdges};
use crate::mesh::TessellatedVertex;

/// How the interior of each sub-patch is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Sampling {
    /// Walk the curve trees.
    Adaptive,
    /// Evenly spaced samples, `(nx, ny)` per sub-patch.
    Fixed(usize, usize),
}

/// Add the corner frame spanned by tangent slots `u_slot` and `v_slot`.
fn accumulate_corner(vertex: &mut TessellatedVertex, u: &EdgeTangents, v: &EdgeTangents, u_slot: usize, v_slot: usize) {
    let du = u.position[u_slot];
    let dv = v.position[v_slot];
    vertex.normal += normalize_or_zero(&du.cross(&dv));

    let (s, t) = triangle_tangents(
        (&Point3::origin(), &Vec2::zeros()),
        (&Point3::from(du), &u.texcoord[u_slot]),
        (&Point3::from(dv), &v.texcoord[v_slot]),
    );
    vertex.tangent += normalize_or_zero(&s);
    vertex.bitangent += normalize_or_zero(&t);
}

fn normalize_frame(vertex: &mut TessellatedVertex) {
    vertex.normal = normalize_or_zero(&vertex.normal);
    vertex.tangent = normalize_or_zero(&vertex.tangent);
    vertex.bitangent = normalize_or_zero(&vertex.bitangent);
}

/// Build the `layout_u.length × layout_v.length` vertex array for `grid`.
pub(crate) fn build_vertex_array(
    grid: &ControlGrid,
    layout_u: &AxisLayout,
    layout_v: &AxisLayout,
    sampling: Sampling,
) -> Vec<TessellatedVertex> {
    let width = layout_u.length;
    let mut vertices = vec![TessellatedVertex::default(); width * layout_v.length];

    let columns = layout_u.extents.len();
    let rows = layout_v.extents.len();

    let mut start_y = 0;
    for (sub_row, &extent_y) in layout_v.extents.iter().enumerate() {
        let end_y = start_y + extent_y * width;
        let tree_v = layout_v.trees.get(sub_row);
        let mid_y = tree_v.and_then(|t| t.index());

        let mut start_x = 0;
        for (sub_column, &extent_x) in layout_u.extents.iter().enumerate() {
            let end_x = start_x + extent_x;
            let tree_u = layout_u.trees.get(sub_column);
            let mid_x = tree_u.and_then(|t| t.index());

            let window = grid.sub_matrix(sub_column, sub_row);
            let first_column = sub_column == 0;
            let first_row = sub_row == 0;
            let last_column = sub_column + 1 == columns;
            let last_row = sub_row + 1 == rows;

            // corners; a corner's frame is cleared by the first sub-patch to touch it
            let corner_slots = [
                (Corner::C00, start_x + start_y, window[0][0], first_column && first_row),
                (Corner::C10, end_x + start_y, window[0][2], first_row),
                (Corner::C01, start_x + end_y, window[2][0], first_column),
                (Corner::C11, end_x + end_y, window[2][2], true),
            ];
            for (_, slot, point, first_touch) in &corner_slots {
                let v = &mut vertices[*slot];
                if *first_touch {
                    v.clear_frame();
                }
                v.assign(point);
            }

            if sampling == Sampling::Adaptive {
                if let Some(mid_x) = mid_x {
                    vertices[mid_x + start_y].assign(&window[0][1]);
                    vertices[mid_x + end_y].assign(&window[2][1]);
                }
                if let Some(mid_y) = mid_y {
                    vertices[start_x + mid_y].assign(&window[1][0]);
                    vertices[end_x + mid_y].assign(&window[1][2]);
                    if let Some(mid_x) = mid_x {
                        vertices[mid_x + mid_y].assign(&window[1][1]);
                    }
                }
            }

            let mut flags_u = EdgeFlags::along_rows(&window);
            let mut flags_v = EdgeFlags::along_columns(&window);
            let mut tangents_u = EdgeTangents::along_rows(&window, flags_u);
            let mut tangents_v = EdgeTangents::along_columns(&window, flags_v);
            tangents_u.borrow_degenerate(flags_u);
            tangents_v.borrow_degenerate(flags_v);

            for (corner, slot, _, _) in &corner_slots {
                let (u_slot, v_slot) = corner.default_pair();
                let du = tangents_u.position[u_slot];
                let dv = tangents_v.position[v_slot];
                let (u_slot, v_slot) = corner.tangent_pair(flags_u, du.dot(&dv), du.norm() * dv.norm());
                accumulate_corner(&mut vertices[*slot], &tangents_u, &tangents_v, u_slot, v_slot);
            }

            // corners no later sub-patch will add to
            if !(first_column && first_row) {
                normalize_frame(&mut vertices[start_x + start_y]);
            }
            if last_column {
                normalize_frame(&mut vertices[end_x + start_y]);
            }
            if last_row {
                normalize_frame(&mut vertices[start_x + end_y]);
            }
            if last_column && last_row {
                normalize_frame(&mut vertices[end_x + end_y]);
            }

            if !first_row {
                flags_u |= EdgeFlags::AVERAGE;
            }
            if !first_column {
                flags_v |= EdgeFlags::AVERAGE;
            }
            flags_u |= EdgeFlags::SPLIT;
            flags_v |= EdgeFlags::SPLIT;

            match sampling {
                Sampling::Fixed(nx, ny) => fixed::tessellate_sub_patch(
                    &mut vertices,
                    start_x + start_y,
                    width,
                    &window,
                    (nx, ny),
                    SharedEdges {
                        start_column: !first_column,
                        start_row: !first_row,
                    },
                ),
                Sampling::Adaptive => {
                    if let (Some(tree_u), Some(tree_v)) = (tree_u, tree_v) {
                        let middle_row = [window[1][0], window[1][1], window[1][2]];
                        let middle_column = [window[0][1], window[1][1], window[2][1]];
                        if let Some(bx) = tree_u.as_split() {
                            let span = Span { start_x, start_y, end_x, end_y };
                            subdivide(&mut vertices, bx, tree_v, span, flags_u, flags_v, middle_row, false);
                        } else if let Some(by) = tree_v.as_split() {
                            let span = Span {
                                start_x: start_y,
                                start_y: start_x,
                                end_x: end_y,
                                end_y: end_x,
                            };
                            subdivide(&mut vertices, by, tree_u, span, flags_v, flags_u, middle_column, true);
                        }
                    }
                }
            }

            start_x = end_x;
        }
        start_y = end_y;
    }

    vertices
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use patchmesh_grid::{ControlPoint, MatrixMajor};
    use patchmesh_math::Vec3;

    fn flat(width: usize, height: usize) -> ControlGrid {
        ControlGrid::from_fn(width, height, |r, c| {
            ControlPoint::new(Point3::new(c as f64, r as f64, 0.0), Vec2::new(c as f64, r as f64))
        })
    }

    #[test]
    fn test_flat_grid_corner_frames() {
        let grid = flat(5, 5);
        let u = AxisLayout::adaptive(&grid, MatrixMajor::Row, 4.0, 1);
        let v = AxisLayout::adaptive(&grid, MatrixMajor::Column, 4.0, u.length);
        let vertices = build_vertex_array(&grid, &u, &v, Sampling::Adaptive);
        assert_eq!(vertices.len(), 9);
        for (i, vertex) in vertices.iter().enumerate() {
            let (x, y) = (i % 3, i / 3);
            assert_eq!(vertex.position, Point3::new(2.0 * x as f64, 2.0 * y as f64, 0.0));
            assert_relative_eq!(vertex.normal, Vec3::z());
            assert_relative_eq!(vertex.tangent, Vec3::x());
            assert_relative_eq!(vertex.bitangent, Vec3::y());
        }
    }

    #[test]
    fn test_start_column_end_corner_detects_aligned_pair() {
        // the last row leaves the corner along the first column, so the
        // default pair is parallel; the first row is much longer than both
        let rows = [
            [(0.0, 0.0), (10.0, 0.0), (30.0, 0.0)],
            [(0.0, 1.0), (1.0, 1.0), (2.0, 1.0)],
            [(0.0, 2.0), (0.0, 3.0), (1.0, 3.0)],
        ];
        let grid = ControlGrid::from_fn(3, 3, |r, c| {
            let (x, y) = rows[r][c];
            ControlPoint::new(Point3::new(x, y, 0.0), Vec2::new(c as f64, r as f64))
        });
        let u = AxisLayout::fixed(&grid, MatrixMajor::Row, 1);
        let v = AxisLayout::fixed(&grid, MatrixMajor::Column, 1);
        let vertices = build_vertex_array(&grid, &u, &v, Sampling::Fixed(1, 1));
        assert_eq!(vertices.len(), 4);

        let corner = &vertices[2];
        assert_eq!(corner.position, Point3::new(0.0, 2.0, 0.0));
        // the middle row replaces the parallel u tangent
        assert_relative_eq!(corner.normal, Vec3::z());
    }
}
