//! Fixed-subdivision tessellation.
//!
//! Every sub-patch gets the same `nx × ny` grid of samples, evaluated
//! directly from its 3×3 control window. Corners are written by the vertex
//! array builder and are skipped here.

use patchmesh_grid::ControlPoint;
use patchmesh_math::{normalize_or_zero, triangle_tangents};

use crate::mesh::TessellatedVertex;

/// Quadratic Bezier at `t` by repeated lerp. Returns the point and the two
/// first-level intermediates, whose difference is the curve's direction.
fn evaluate(a: &ControlPoint, b: &ControlPoint, c: &ControlPoint, t: f64) -> (ControlPoint, ControlPoint, ControlPoint) {
    let left = a.lerp(b, t);
    let right = b.lerp(c, t);
    (left.lerp(&right, t), left, right)
}

/// Which shared edges of a sub-patch already hold a neighbour's samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct SharedEdges {
    /// The start column was written by the sub-patch to the left.
    pub start_column: bool,
    /// The start row was written by the sub-patch above.
    pub start_row: bool,
}

/// Sample one sub-patch into `vertices`.
///
/// `origin` is the array slot of the sub-patch's first corner and
/// `row_stride` the flattened array width.
pub(crate) fn tessellate_sub_patch(
    vertices: &mut [TessellatedVertex],
    origin: usize,
    row_stride: usize,
    window: &[[ControlPoint; 3]; 3],
    subdivisions: (usize, usize),
    shared: SharedEdges,
) {
    let (nx, ny) = subdivisions;
    let step_u = 1.0 / nx as f64;
    let step_v = 1.0 / ny as f64;

    for i in 0..=nx {
        let t_u = if i == nx { 1.0 } else { i as f64 * step_u };
        let along_u: [ControlPoint; 3] =
            std::array::from_fn(|r| evaluate(&window[r][0], &window[r][1], &window[r][2], t_u).0);

        for j in 0..=ny {
            if (i == 0 || i == nx) && (j == 0 || j == ny) {
                continue;
            }
            let t_v = if j == ny { 1.0 } else { j as f64 * step_v };
            let along_v: [ControlPoint; 3] =
                std::array::from_fn(|c| evaluate(&window[0][c], &window[1][c], &window[2][c], t_v).0);

            let (_, left, right) = evaluate(&along_u[0], &along_u[1], &along_u[2], t_v);
            let (point, up, down) = evaluate(&along_v[0], &along_v[1], &along_v[2], t_u);

            let normal = (right.position - left.position).cross(&(up.position - down.position));
            let third = if i != 0 { &up } else { &down };
            let (s, t) = triangle_tangents(
                (&left.position, &left.texcoord),
                (&right.position, &right.texcoord),
                (&third.position, &third.texcoord),
            );
            let normal = normalize_or_zero(&normal);
            let tangent = normalize_or_zero(&s);
            let bitangent = normalize_or_zero(&t);

            let v = &mut vertices[origin + i + j * row_stride];
            v.assign(&point);
            if (i == 0 && shared.start_column) || (j == 0 && shared.start_row) {
                v.normal = normalize_or_zero(&(v.normal + normal));
                v.tangent = normalize_or_zero(&(v.tangent + tangent));
                v.bitangent = normalize_or_zero(&(v.bitangent + bitangent));
            } else {
                v.normal = normal;
                v.tangent = tangent;
                v.bitangent = bitangent;
            }
        }
    }
}
