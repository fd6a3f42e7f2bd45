//! Degenerate edge detection and the tangent tables that route around it.
//!
//! A sub-patch window has three control lines along each axis. Every line is
//! made of two edges, `a` (control points 0-1) and `b` (1-2). An edge whose
//! end points coincide exactly is degenerate: it has no direction, so its
//! tangent is borrowed from the nearest usable parallel edge.

use patchmesh_grid::ControlPoint;
use patchmesh_math::{Vec2, Vec3};

bitflags::bitflags! {
    /// Degenerate-edge bits plus the two recursion control bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EdgeFlags: u8 {
        /// Line 0, first edge.
        const EDGE_0A = 0x01;
        /// Line 1, first edge.
        const EDGE_1A = 0x02;
        /// Line 2, first edge.
        const EDGE_2A = 0x04;
        /// Line 0, second edge.
        const EDGE_0B = 0x08;
        /// Line 1, second edge.
        const EDGE_1B = 0x10;
        /// Line 2, second edge.
        const EDGE_2B = 0x20;
        /// The start edge sample has to be computed.
        const SPLIT = 0x40;
        /// The start edge sample is shared and must be summed, not overwritten.
        const AVERAGE = 0x80;
        /// All six edge bits.
        const ALL_EDGES = 0x3f;
    }
}

impl EdgeFlags {
    /// Edge bit for each tangent slot `0a, 0b, 1a, 1b, 2a, 2b`.
    pub const SLOTS: [Self; 6] = [
        Self::EDGE_0A,
        Self::EDGE_0B,
        Self::EDGE_1A,
        Self::EDGE_1B,
        Self::EDGE_2A,
        Self::EDGE_2B,
    ];

    /// True if the edge behind tangent `slot` is degenerate.
    pub fn slot_degenerate(self, slot: usize) -> bool {
        self.contains(Self::SLOTS[slot])
    }

    /// Detect degenerate edges along rows of `window` (the u direction).
    pub fn along_rows(window: &[[ControlPoint; 3]; 3]) -> Self {
        Self::detect(|line, k| window[line][k])
    }

    /// Detect degenerate edges along columns of `window` (the v direction).
    pub fn along_columns(window: &[[ControlPoint; 3]; 3]) -> Self {
        Self::detect(|line, k| window[k][line])
    }

    fn detect(at: impl Fn(usize, usize) -> ControlPoint) -> Self {
        let mut flags = Self::empty();
        for line in 0..3 {
            if at(line, 0).position == at(line, 1).position {
                flags |= Self::SLOTS[line * 2];
            }
            if at(line, 1).position == at(line, 2).position {
                flags |= Self::SLOTS[line * 2 + 1];
            }
        }
        flags
    }
}

/// Preference order for refilling a degenerate boundary slot:
/// `(slot, candidates, fallback)`. Applied in this order, in place.
const BORROW_TABLE: [(usize, [usize; 4], usize); 4] = [
    (0, [1, 2, 3, 4], 5),
    (1, [0, 3, 2, 5], 4),
    (4, [5, 2, 3, 0], 1),
    (5, [4, 3, 2, 1], 0),
];

/// The six edge tangents of a window along one axis, with texture deltas.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EdgeTangents {
    /// Spatial tangent per slot.
    pub position: [Vec3; 6],
    /// Texture-space delta per slot.
    pub texcoord: [Vec2; 6],
}

impl EdgeTangents {
    /// Tangents along rows of `window`; degenerate edges stay zero.
    pub fn along_rows(window: &[[ControlPoint; 3]; 3], flags: EdgeFlags) -> Self {
        Self::collect(|line, k| window[line][k], flags)
    }

    /// Tangents along columns of `window`; degenerate edges stay zero.
    pub fn along_columns(window: &[[ControlPoint; 3]; 3], flags: EdgeFlags) -> Self {
        Self::collect(|line, k| window[k][line], flags)
    }

    fn collect(at: impl Fn(usize, usize) -> ControlPoint, flags: EdgeFlags) -> Self {
        let mut tangents = Self::default();
        for slot in 0..6 {
            if flags.slot_degenerate(slot) {
                continue;
            }
            let (line, half) = (slot / 2, slot % 2);
            let from = at(line, half);
            let to = at(line, half + 1);
            tangents.position[slot] = to.position - from.position;
            tangents.texcoord[slot] = to.texcoord - from.texcoord;
        }
        tangents
    }

    /// Give each degenerate boundary edge the tangent of the closest usable
    /// parallel edge.
    pub fn borrow_degenerate(&mut self, flags: EdgeFlags) {
        for (slot, source) in borrow_sources(flags) {
            self.position[slot] = self.position[source];
            self.texcoord[slot] = self.texcoord[source];
        }
    }
}

/// `(slot, source)` copies performed by [`EdgeTangents::borrow_degenerate`],
/// in application order.
pub fn borrow_sources(flags: EdgeFlags) -> impl Iterator<Item = (usize, usize)> {
    BORROW_TABLE
        .iter()
        .filter(move |(slot, _, _)| flags.slot_degenerate(*slot))
        .map(move |(slot, candidates, fallback)| {
            let source = candidates
                .iter()
                .copied()
                .find(|&c| !flags.slot_degenerate(c))
                .unwrap_or(*fallback);
            (*slot, source)
        })
}

/// Corner of a sub-patch, named by its `(u, v)` end: `0` = start, `1` = end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    /// Start of both axes.
    C00,
    /// End of u, start of v.
    C10,
    /// Start of u, end of v.
    C01,
    /// End of both axes.
    C11,
}

impl Corner {
    /// All corners in processing order.
    pub const ALL: [Corner; 4] = [Corner::C00, Corner::C10, Corner::C01, Corner::C11];

    /// Tangent slots `(u, v)` that meet at this corner.
    pub fn default_pair(self) -> (usize, usize) {
        match self {
            Corner::C00 => (0, 0),
            Corner::C10 => (1, 4),
            Corner::C01 => (4, 1),
            Corner::C11 => (5, 5),
        }
    }

    /// Slots to build the corner frame from.
    ///
    /// `dot` and `length` describe the default pair (`u·v` and `|u||v|`).
    /// When the pair is parallel or anti-parallel it spans no plane and a
    /// replacement pair is chosen from the u-axis degenerate flags.
    pub fn tangent_pair(self, flags_u: EdgeFlags, dot: f64, length: f64) -> (usize, usize) {
        const EPSILON: f64 = 0.001;
        let opposed = (dot + length).abs() < EPSILON;
        let aligned = (dot - length).abs() < EPSILON;
        let set = |edge| flags_u.contains(edge);

        match self {
            Corner::C00 if opposed => {
                if !set(EdgeFlags::EDGE_1A) {
                    (2, 0)
                } else if !set(EdgeFlags::EDGE_0B) {
                    (0, 1)
                } else {
                    (1, 0)
                }
            }
            Corner::C00 if aligned => {
                if set(EdgeFlags::EDGE_0B) {
                    (0, 1)
                } else {
                    (1, 0)
                }
            }
            Corner::C01 if aligned => {
                if !set(EdgeFlags::EDGE_1A) {
                    (2, 1)
                } else if !set(EdgeFlags::EDGE_2B) {
                    (4, 0)
                } else {
                    (5, 1)
                }
            }
            Corner::C01 if opposed => {
                if set(EdgeFlags::EDGE_2B) {
                    (4, 0)
                } else {
                    (5, 1)
                }
            }
            Corner::C10 if aligned => {
                if !set(EdgeFlags::EDGE_1B) {
                    (3, 4)
                } else if !set(EdgeFlags::EDGE_0A) {
                    (1, 5)
                } else {
                    (0, 4)
                }
            }
            Corner::C10 if opposed => {
                if set(EdgeFlags::EDGE_0A) {
                    (1, 5)
                } else {
                    (0, 4)
                }
            }
            Corner::C11 if opposed => {
                if !set(EdgeFlags::EDGE_1B) {
                    (3, 5)
                } else if !set(EdgeFlags::EDGE_2A) {
                    (5, 4)
                } else {
                    (4, 5)
                }
            }
            Corner::C11 if aligned => {
                if set(EdgeFlags::EDGE_2A) {
                    (5, 4)
                } else {
                    (4, 5)
                }
            }
            _ => self.default_pair(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(f: impl Fn(usize, usize) -> [f64; 3]) -> [[ControlPoint; 3]; 3] {
        std::array::from_fn(|r| {
            std::array::from_fn(|c| {
                let [x, y, z] = f(r, c);
                ControlPoint::at(x, y, z)
            })
        })
    }

    /// Distinct, non-zero tangent per slot, zero where the slot is degenerate.
    fn tagged(flags: EdgeFlags) -> EdgeTangents {
        let mut t = EdgeTangents::default();
        for slot in 0..6 {
            if !flags.slot_degenerate(slot) {
                t.position[slot] = Vec3::new(slot as f64 + 1.0, 0.0, 0.0);
                t.texcoord[slot] = Vec2::new(0.0, slot as f64 + 1.0);
            }
        }
        t
    }

    #[test]
    fn test_flat_window_has_no_degenerate_edges() {
        let w = window(|r, c| [c as f64, r as f64, 0.0]);
        assert_eq!(EdgeFlags::along_rows(&w), EdgeFlags::empty());
        assert_eq!(EdgeFlags::along_columns(&w), EdgeFlags::empty());
    }

    #[test]
    fn test_collapsed_row_sets_both_row_edges() {
        // row 0 collapses to a pole
        let w = window(|r, c| if r == 0 { [0.0, 0.0, 1.0] } else { [c as f64, r as f64, 0.0] });
        let rows = EdgeFlags::along_rows(&w);
        assert_eq!(rows, EdgeFlags::EDGE_0A | EdgeFlags::EDGE_0B);
        let columns = EdgeFlags::along_columns(&w);
        assert_eq!(columns, EdgeFlags::empty());
    }

    #[test]
    fn test_collapsed_column_maps_to_column_bits() {
        let w = window(|r, c| if c == 2 { [2.0, 0.0, 0.0] } else { [c as f64, r as f64, 0.0] });
        assert_eq!(
            EdgeFlags::along_columns(&w),
            EdgeFlags::EDGE_2A | EdgeFlags::EDGE_2B
        );
        assert_eq!(EdgeFlags::along_rows(&w), EdgeFlags::empty());
    }

    #[test]
    fn test_tangents_follow_axis() {
        let w = window(|r, c| [2.0 * c as f64, 3.0 * r as f64, 0.0]);
        let u = EdgeTangents::along_rows(&w, EdgeFlags::empty());
        let v = EdgeTangents::along_columns(&w, EdgeFlags::empty());
        for slot in 0..6 {
            assert_eq!(u.position[slot], Vec3::new(2.0, 0.0, 0.0));
            assert_eq!(v.position[slot], Vec3::new(0.0, 3.0, 0.0));
        }
    }

    #[test]
    fn test_borrow_prefers_same_line() {
        let flags = EdgeFlags::EDGE_0A;
        let mut t = tagged(flags);
        t.borrow_degenerate(flags);
        assert_eq!(t.position[0], t.position[1]);

        let flags = EdgeFlags::EDGE_0A | EdgeFlags::EDGE_0B;
        let mut t = tagged(flags);
        t.borrow_degenerate(flags);
        // 0a takes 1a, 0b takes 1b
        assert_eq!(t.position[0].x, 3.0);
        assert_eq!(t.position[1].x, 4.0);
    }

    #[test]
    fn test_borrow_all_flag_combinations() {
        for bits in 0..64u8 {
            let flags = EdgeFlags::from_bits_retain(bits);
            let original = tagged(flags);
            let mut t = original;
            t.borrow_degenerate(flags);

            for slot in [0, 1, 4, 5] {
                if flags == EdgeFlags::ALL_EDGES {
                    assert_eq!(t.position[slot], Vec3::zeros(), "flags {bits:#04x}");
                    continue;
                }
                let value = t.position[slot];
                assert_ne!(value, Vec3::zeros(), "slot {slot} flags {bits:#04x}");
                // every value is some usable edge's own tangent
                let source = (0..6)
                    .find(|&s| !flags.slot_degenerate(s) && original.position[s] == value)
                    .unwrap_or_else(|| panic!("slot {slot} flags {bits:#04x} has no source"));
                assert_eq!(t.texcoord[slot], original.texcoord[source]);
            }
            for slot in [2, 3] {
                assert_eq!(t.position[slot], original.position[slot]);
            }
        }
    }

    #[test]
    fn test_borrow_sources_skip_usable_slots() {
        assert_eq!(borrow_sources(EdgeFlags::empty()).count(), 0);
        let sources: Vec<_> = borrow_sources(EdgeFlags::EDGE_2A | EdgeFlags::EDGE_2B).collect();
        assert_eq!(sources, vec![(4, 2), (5, 3)]);
    }

    #[test]
    fn test_corner_pair_unchanged_when_spanning() {
        for corner in Corner::ALL {
            assert_eq!(corner.tangent_pair(EdgeFlags::empty(), 0.0, 1.0), corner.default_pair());
        }
    }

    #[test]
    fn test_corner_pair_fallbacks() {
        let none = EdgeFlags::empty();
        let row1 = EdgeFlags::EDGE_1A | EdgeFlags::EDGE_1B;
        assert_eq!(Corner::C00.tangent_pair(none, -1.0, 1.0), (2, 0));
        assert_eq!(Corner::C00.tangent_pair(row1, -1.0, 1.0), (0, 1));
        assert_eq!(Corner::C00.tangent_pair(none, 1.0, 1.0), (1, 0));
        assert_eq!(Corner::C01.tangent_pair(none, 1.0, 1.0), (2, 1));
        assert_eq!(Corner::C01.tangent_pair(none, -1.0, 1.0), (5, 1));
        assert_eq!(Corner::C10.tangent_pair(row1, 1.0, 1.0), (1, 5));
        assert_eq!(Corner::C10.tangent_pair(EdgeFlags::EDGE_0A, -1.0, 1.0), (1, 5));
        assert_eq!(Corner::C11.tangent_pair(row1 | EdgeFlags::EDGE_2A, -1.0, 1.0), (4, 5));
        assert_eq!(Corner::C11.tangent_pair(EdgeFlags::EDGE_2A, 1.0, 1.0), (5, 4));
    }

    #[test]
    fn test_zero_tangents_take_first_checked_branch() {
        // dot = length = 0 is both aligned and opposed
        assert_eq!(Corner::C00.tangent_pair(EdgeFlags::empty(), 0.0, 0.0), (2, 0));
        assert_eq!(Corner::C01.tangent_pair(EdgeFlags::empty(), 0.0, 0.0), (2, 1));
        assert_eq!(Corner::C10.tangent_pair(EdgeFlags::empty(), 0.0, 0.0), (3, 4));
        assert_eq!(Corner::C11.tangent_pair(EdgeFlags::empty(), 0.0, 0.0), (3, 5));
    }
}
