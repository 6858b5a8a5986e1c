//! Triangle mesh representation produced by the importers.

use lumen_math::Vec3;

use crate::material::Material;

/// A triangle mesh with a single material.
///
/// This is the importer output consumed by the renderer's scene builder. It
/// is intentionally decoupled from the renderer's flattened scene buffers so
/// other file formats can feed the same pipeline.
#[derive(Clone, Debug)]
pub struct TriangleMesh {
    /// Mesh name (from the OBJ group or material name)
    pub name: String,

    /// Vertex positions in world space
    pub positions: Vec<Vec3>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Material shared by every triangle of this mesh
    pub material: Material,
}

impl TriangleMesh {
    /// Create a new mesh from positions, indices and a material.
    pub fn new(
        name: impl Into<String>,
        positions: Vec<Vec3>,
        indices: Vec<u32>,
        material: Material,
    ) -> Self {
        Self {
            name: name.into(),
            positions,
            indices,
            material,
        }
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}
