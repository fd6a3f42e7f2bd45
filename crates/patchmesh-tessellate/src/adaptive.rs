//! Recursive sub-patch tessellation driven by the curve trees.
//!
//! The recursion alternates between the two axes. Each step bisects the
//! start line, the end line and the middle line of the current span along
//! one axis, writes the new on-surface samples and half control points into
//! the slots the curve trees reserved, computes the frames of the two edge
//! samples it created, and descends into both halves.

use patchmesh_grid::ControlPoint;
use patchmesh_math::{normalize_or_zero, triangle_tangents, Vec3};

use crate::curve::{CurveNode, Split};
use crate::degenerate::EdgeFlags;
use crate::mesh::TessellatedVertex;

/// Array offsets bounding a span. `x` is the axis being split; offsets along
/// `y` are already multiplied by the row stride when `y` is the v axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub start_x: usize,
    pub start_y: usize,
    pub end_x: usize,
    pub end_y: usize,
}

/// Split `start, mid, end` at `t = ½`: returns the two new half control
/// points and the on-curve midpoint.
fn bisect(start: &ControlPoint, mid: &ControlPoint, end: &ControlPoint) -> (ControlPoint, ControlPoint, ControlPoint) {
    let left = start.mid(mid);
    let right = mid.mid(end);
    let on_curve = left.mid(&right);
    (left, on_curve, right)
}

struct EdgeFrame {
    normal: Vec3,
    tangent: Vec3,
    bitangent: Vec3,
}

/// Frame of an edge sample from a u-direction chord `a → c` and the
/// v-direction tangent, with `b` the middle-line sample.
fn edge_frame(
    a: &ControlPoint,
    b: &ControlPoint,
    c: &ControlPoint,
    tangent_v: Vec3,
    transpose: bool,
) -> EdgeFrame {
    let tangent_u = c.position - a.position;
    let normal = if transpose {
        tangent_v.cross(&tangent_u)
    } else {
        tangent_u.cross(&tangent_v)
    };
    let (s, t) = triangle_tangents(
        (&a.position, &a.texcoord),
        (&b.position, &b.texcoord),
        (&c.position, &c.texcoord),
    );
    EdgeFrame {
        normal: normalize_or_zero(&normal),
        tangent: normalize_or_zero(&s),
        bitangent: normalize_or_zero(&t),
    }
}

/// Pick the chord of the first line, in `order`, that has not collapsed.
fn first_open_line(
    flags: EdgeFlags,
    lines: &[(ControlPoint, ControlPoint); 3],
    order: [usize; 3],
) -> (ControlPoint, ControlPoint) {
    const LINE_EDGES: [EdgeFlags; 3] = [
        EdgeFlags::EDGE_0A.union(EdgeFlags::EDGE_0B),
        EdgeFlags::EDGE_1A.union(EdgeFlags::EDGE_1B),
        EdgeFlags::EDGE_2A.union(EdgeFlags::EDGE_2B),
    ];
    let line = order[..2]
        .iter()
        .copied()
        .find(|&l| !flags.contains(LINE_EDGES[l]))
        .unwrap_or(order[2]);
    lines[line]
}

/// Tessellate the span split by `bx`, crossed by `by`.
///
/// `middle` holds the start, control and end points of the line halfway
/// across the span. `flags_x` describe degenerate edges along `bx`'s axis,
/// `flags_y` along the other; `transpose` is set when `bx` runs along v, so
/// normals keep facing the same way.
#[allow(clippy::too_many_arguments)]
pub(crate) fn subdivide(
    vertices: &mut [TessellatedVertex],
    bx: Split<'_>,
    by: &CurveNode,
    span: Span,
    flags_x: EdgeFlags,
    flags_y: EdgeFlags,
    middle: [ControlPoint; 3],
    transpose: bool,
) {
    let by_index = by.index();
    let left_index = bx.left.index();
    let right_index = bx.right.index();

    // start line
    let top_mid = bx.index + span.start_y;
    let (v00, top, v01) = bisect(
        &vertices[span.start_x + span.start_y].control(),
        &vertices[top_mid].control(),
        &vertices[span.end_x + span.start_y].control(),
    );
    vertices[top_mid].assign(&top);

    // end line
    let bottom_mid = bx.index + span.end_y;
    let (v20, bottom, v21) = bisect(
        &vertices[span.start_x + span.end_y].control(),
        &vertices[bottom_mid].control(),
        &vertices[span.end_x + span.end_y].control(),
    );
    vertices[bottom_mid].assign(&bottom);

    // middle line
    let (v10, centre, v11) = bisect(&middle[0], &middle[1], &middle[2]);
    if let Some(by_index) = by_index {
        vertices[bx.index + by_index].assign(&centre);
    }

    if let Some(left) = left_index {
        vertices[left + span.start_y].assign(&v00);
        vertices[left + span.end_y].assign(&v20);
        if let Some(by_index) = by_index {
            vertices[left + by_index].assign(&v10);
        }
    }
    if let Some(right) = right_index {
        vertices[right + span.start_y].assign(&v01);
        vertices[right + span.end_y].assign(&v21);
        if let Some(by_index) = by_index {
            vertices[right + by_index].assign(&v11);
        }
    }

    let lines = [(v00, v01), (v10, v11), (v20, v21)];

    if flags_x.contains(EdgeFlags::SPLIT) {
        let (a, c) = first_open_line(flags_x, &lines, [0, 1, 2]);
        let start_collapsed =
            flags_y.contains(EdgeFlags::EDGE_0A | EdgeFlags::EDGE_1A | EdgeFlags::EDGE_2A);
        let tangent_v = if start_collapsed {
            vertices[bottom_mid].position - centre.position
        } else {
            centre.position - vertices[top_mid].position
        };
        let frame = edge_frame(&a, &centre, &c, tangent_v, transpose);

        let v = &mut vertices[top_mid];
        if flags_x.contains(EdgeFlags::AVERAGE) {
            v.normal = normalize_or_zero(&(v.normal + frame.normal));
            v.tangent = normalize_or_zero(&(v.tangent + frame.tangent));
            v.bitangent = normalize_or_zero(&(v.bitangent + frame.bitangent));
        } else {
            v.normal = frame.normal;
            v.tangent = frame.tangent;
            v.bitangent = frame.bitangent;
        }
    }

    {
        let (a, c) = first_open_line(flags_x, &lines, [2, 1, 0]);
        let end_collapsed =
            flags_y.contains(EdgeFlags::EDGE_0B | EdgeFlags::EDGE_1B | EdgeFlags::EDGE_2B);
        let tangent_v = if end_collapsed {
            centre.position - vertices[top_mid].position
        } else {
            vertices[bottom_mid].position - centre.position
        };
        let frame = edge_frame(&a, &centre, &c, tangent_v, transpose);

        let v = &mut vertices[bottom_mid];
        v.normal = frame.normal;
        v.tangent = frame.tangent;
        v.bitangent = frame.bitangent;
    }

    let mut new_x = EdgeFlags::empty();
    for line in [
        EdgeFlags::EDGE_0A | EdgeFlags::EDGE_0B,
        EdgeFlags::EDGE_1A | EdgeFlags::EDGE_1B,
        EdgeFlags::EDGE_2A | EdgeFlags::EDGE_2B,
    ] {
        if flags_x.contains(line) {
            new_x |= line;
        }
    }
    new_x |= flags_x & (EdgeFlags::SPLIT | EdgeFlags::AVERAGE);

    let mut new_y = EdgeFlags::empty();
    for side in [
        EdgeFlags::EDGE_0A | EdgeFlags::EDGE_1A | EdgeFlags::EDGE_2A,
        EdgeFlags::EDGE_0B | EdgeFlags::EDGE_1B | EdgeFlags::EDGE_2B,
    ] {
        if flags_y.contains(side) {
            new_y |= side;
        }
    }

    match by.as_split() {
        Some(by_split) => {
            // First half: transpose into the start half of bx.
            let mut first_y = new_y;
            if flags_y.contains(EdgeFlags::EDGE_0A | EdgeFlags::EDGE_0B) {
                first_y |= EdgeFlags::EDGE_0A | EdgeFlags::EDGE_0B;
            }
            first_y |= flags_y & (EdgeFlags::SPLIT | EdgeFlags::AVERAGE);

            let shared = bx.index + by_split.index;
            let saved = vertices[shared].control();
            subdivide(
                vertices,
                by_split,
                bx.left,
                Span {
                    start_x: span.start_y,
                    start_y: span.start_x,
                    end_x: span.end_y,
                    end_y: bx.index,
                },
                first_y,
                new_x,
                [v00, v10, v20],
                !transpose,
            );
            vertices[shared].assign(&saved);

            // Second half: the shared line's start sample is already done.
            let mut second_y = new_y;
            if flags_y.contains(EdgeFlags::EDGE_2A | EdgeFlags::EDGE_2B) {
                second_y |= EdgeFlags::EDGE_2A | EdgeFlags::EDGE_2B;
            }
            subdivide(
                vertices,
                by_split,
                bx.right,
                Span {
                    start_x: span.start_y,
                    start_y: bx.index,
                    end_x: span.end_y,
                    end_y: span.end_x,
                },
                second_y,
                new_x,
                [v01, v11, v21],
                !transpose,
            );
        }
        None => {
            if let Some(left) = bx.left.as_split() {
                subdivide(
                    vertices,
                    left,
                    by,
                    Span {
                        end_x: bx.index,
                        ..span
                    },
                    new_x,
                    new_y,
                    [middle[0], v10, centre],
                    transpose,
                );
            }
            if let Some(right) = bx.right.as_split() {
                subdivide(
                    vertices,
                    right,
                    by,
                    Span {
                        start_x: bx.index,
                        ..span
                    },
                    new_x,
                    new_y,
                    [centre, v11, middle[2]],
                    transpose,
                );
            }
        }
    }
}
