//! Tessellation output: the flattened vertex array and its strip indices.

use patchmesh_grid::{ControlPoint, MatrixMajor};
use patchmesh_math::{Point3, Vec2, Vec3};

use crate::curve::CurveNode;

/// One sample of the tessellated surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TessellatedVertex {
    /// Position on the surface.
    pub position: Point3,
    /// Interpolated texture coordinate.
    pub texcoord: Vec2,
    /// Unit surface normal, or zero where the surface has no defined normal.
    pub normal: Vec3,
    /// Unit texture-space tangent (direction of increasing `s`).
    pub tangent: Vec3,
    /// Unit texture-space bitangent (direction of increasing `t`).
    pub bitangent: Vec3,
}

impl TessellatedVertex {
    /// Position and texture coordinate as a control point.
    pub fn control(&self) -> ControlPoint {
        ControlPoint::new(self.position, self.texcoord)
    }

    /// Overwrite position and texture coordinate.
    pub fn assign(&mut self, point: &ControlPoint) {
        self.position = point.position;
        self.texcoord = point.texcoord;
    }

    /// Zero the normal and tangent basis.
    pub fn clear_frame(&mut self) {
        self.normal = Vec3::zeros();
        self.tangent = Vec3::zeros();
        self.bitangent = Vec3::zeros();
    }
}

impl Default for TessellatedVertex {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            texcoord: Vec2::zeros(),
            normal: Vec3::zeros(),
            tangent: Vec3::zeros(),
            bitangent: Vec3::zeros(),
        }
    }
}

/// Output triangle mesh for consumers that do not draw strips.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Flat array of vertex positions: `[x0, y0, z0, x1, y1, z1, ...]` (f32).
    pub vertices: Vec<f32>,
    /// Flat array of triangle indices: `[i0, i1, i2, ...]` (u32).
    pub indices: Vec<u32>,
    /// Flat array of vertex normals: `[nx0, ny0, nz0, ...]` (f32). Same length as vertices.
    pub normals: Vec<f32>,
}

impl TriangleMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Merge another mesh into this one.
    pub fn merge(&mut self, other: &TriangleMesh) {
        let offset = self.num_vertices() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.normals.extend_from_slice(&other.normals);
        self.indices.extend(other.indices.iter().map(|&i| i + offset));
    }
}

/// Everything produced by one rebuild of a patch.
///
/// The vertex array is `array_width × array_height`, row-major. Corner
/// samples of neighbouring sub-patches are shared, so the array is one
/// seamless grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TessellationResult {
    pub(crate) vertices: Vec<TessellatedVertex>,
    pub(crate) indices: Vec<u32>,
    pub(crate) num_strips: usize,
    pub(crate) strip_len: usize,
    pub(crate) array_width: usize,
    pub(crate) array_height: usize,
    pub(crate) sub_patch_widths: Vec<usize>,
    pub(crate) sub_patch_heights: Vec<usize>,
    pub(crate) curve_trees_u: Vec<CurveNode>,
    pub(crate) curve_trees_v: Vec<CurveNode>,
}

impl TessellationResult {
    /// True if nothing was tessellated.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// The flattened vertex array, row-major.
    pub fn vertices(&self) -> &[TessellatedVertex] {
        &self.vertices
    }

    /// Vertex at array column `x`, row `y`.
    pub fn vertex(&self, x: usize, y: usize) -> &TessellatedVertex {
        &self.vertices[y * self.array_width + x]
    }

    /// Strip indices, `num_strips` runs of `strip_len` entries each.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of triangle strips.
    pub fn num_strips(&self) -> usize {
        self.num_strips
    }

    /// Indices per strip.
    pub fn strip_len(&self) -> usize {
        self.strip_len
    }

    /// Flattened array width (samples along u).
    pub fn array_width(&self) -> usize {
        self.array_width
    }

    /// Flattened array height (samples along v).
    pub fn array_height(&self) -> usize {
        self.array_height
    }

    /// Array entries spanned by each sub-patch column.
    pub fn sub_patch_widths(&self) -> &[usize] {
        &self.sub_patch_widths
    }

    /// Array entries spanned by each sub-patch row.
    pub fn sub_patch_heights(&self) -> &[usize] {
        &self.sub_patch_heights
    }

    /// Curve trees along an axis. Empty for fixed subdivision.
    pub fn curve_trees(&self, major: MatrixMajor) -> &[CurveNode] {
        match major {
            MatrixMajor::Row => &self.curve_trees_u,
            MatrixMajor::Column => &self.curve_trees_v,
        }
    }

    /// Iterate over the strips.
    pub fn strips(&self) -> impl Iterator<Item = &[u32]> {
        self.indices.chunks_exact(self.strip_len.max(1))
    }

    /// Flat `[x, y, z, ...]` positions for upload.
    pub fn positions(&self) -> Vec<f32> {
        self.flatten3(|v| v.position.coords)
    }

    /// Flat `[s, t, ...]` texture coordinates for upload.
    pub fn texcoords(&self) -> Vec<f32> {
        self.vertices
            .iter()
            .flat_map(|v| [v.texcoord.x as f32, v.texcoord.y as f32])
            .collect()
    }

    /// Flat normals for upload.
    pub fn normals(&self) -> Vec<f32> {
        self.flatten3(|v| v.normal)
    }

    /// Flat tangents for upload.
    pub fn tangents(&self) -> Vec<f32> {
        self.flatten3(|v| v.tangent)
    }

    /// Flat bitangents for upload.
    pub fn bitangents(&self) -> Vec<f32> {
        self.flatten3(|v| v.bitangent)
    }

    fn flatten3(&self, f: impl Fn(&TessellatedVertex) -> Vec3) -> Vec<f32> {
        self.vertices
            .iter()
            .flat_map(|v| {
                let c = f(v);
                [c.x as f32, c.y as f32, c.z as f32]
            })
            .collect()
    }

    /// Expand the strips into a triangle list.
    ///
    /// Odd triangles of each strip are flipped so every triangle keeps the
    /// strip's winding. Triangles with two coincident corners (collapsed
    /// rows or columns) are dropped.
    pub fn triangle_indices(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.num_strips * self.strip_len.saturating_sub(2) * 3);
        for strip in self.strips() {
            for (k, w) in strip.windows(3).enumerate() {
                let tri = if k % 2 == 0 { [w[0], w[1], w[2]] } else { [w[1], w[0], w[2]] };
                let p = tri.map(|i| self.vertices[i as usize].position);
                if p[0] == p[1] || p[1] == p[2] || p[0] == p[2] {
                    continue;
                }
                out.extend_from_slice(&tri);
            }
        }
        out
    }

    /// Convert to an indexed triangle mesh.
    pub fn to_triangle_mesh(&self) -> TriangleMesh {
        TriangleMesh {
            vertices: self.positions(),
            indices: self.triangle_indices(),
            normals: self.normals(),
        }
    }
}

impl From<&TessellationResult> for TriangleMesh {
    fn from(result: &TessellationResult) -> Self {
        result.to_triangle_mesh()
    }
}
