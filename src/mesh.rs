use crate::{
    error::{IsoFieldError, Result},
    types::{Value, Vector},
};

/// A non-indexed triangle mesh with flat (per-face) normals.
///
/// Every three consecutive entries of `vertices` form one triangle, in
/// emission order; `indices` is the matching sequential triangle list
/// (`0,1,2 / 3,4,5 / ...`) for consumers that want an index buffer. Vertices
/// shared by adjacent cells are duplicated rather than merged.
///
/// Invariants: `vertices.len() % 3 == 0`, `normals.len() == vertices.len()`,
/// and the three normals of a triangle are identical.
#[derive(Clone, Debug, Default)]
pub struct IsoMesh {
    /// Flat list of vertex positions.
    pub vertices: Vec<[Value; 3]>,
    /// One normal per vertex; all three vertices of a triangle share the
    /// face normal.
    pub normals: Vec<[Value; 3]>,
    /// Sequential triangle indices into `vertices`.
    pub indices: Vec<u32>,
}

impl IsoMesh {
    /// Builds a mesh from a triangle soup, deriving flat normals and
    /// sequential indices.
    ///
    /// Returns [`IsoFieldError::RaggedVertexBuffer`] if the vertex count is
    /// not a multiple of 3.
    pub fn from_vertices(vertices: Vec<[Value; 3]>) -> Result<Self> {
        if vertices.len() % 3 != 0 {
            return Err(IsoFieldError::RaggedVertexBuffer(vertices.len()));
        }
        Ok(Self::from_triangle_soup(vertices))
    }

    /// Builds a mesh from vertices whose count is already known to be a
    /// multiple of 3 (extraction emits whole triangles).
    pub(crate) fn from_triangle_soup(vertices: Vec<[Value; 3]>) -> Self {
        debug_assert_eq!(vertices.len() % 3, 0);

        let mut normals = Vec::with_capacity(vertices.len());
        for tri in vertices.chunks_exact(3) {
            let n = face_normal(tri[0], tri[1], tri[2]);
            normals.push(n);
            normals.push(n);
            normals.push(n);
        }

        let indices = (0..vertices.len() as u32).collect();

        Self {
            vertices,
            normals,
            indices,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Checks the structural invariants; used by the PLY reader on data that
    /// did not come out of extraction.
    pub fn validate(&self) -> Result<()> {
        if self.vertices.len() % 3 != 0 {
            return Err(IsoFieldError::RaggedVertexBuffer(self.vertices.len()));
        }
        if self.normals.len() != self.vertices.len() {
            return Err(IsoFieldError::NormalCountMismatch {
                vertices: self.vertices.len(),
                normals: self.normals.len(),
            });
        }
        Ok(())
    }
}

/// Unit face normal of the triangle `(a, b, c)`: `(b − a) × (c − a)`,
/// normalised.
///
/// Zero-area triangles (coincident edge points can produce them) get the
/// zero vector instead of a NaN direction.
pub fn face_normal(a: [Value; 3], b: [Value; 3], c: [Value; 3]) -> [Value; 3] {
    let edge1 = Vector::new(b[0] - a[0], b[1] - a[1], b[2] - a[2]);
    let edge2 = Vector::new(c[0] - a[0], c[1] - a[1], c[2] - a[2]);

    let cross = edge1.cross(&edge2);
    let len = cross.norm();
    if len == 0.0 {
        [0.0, 0.0, 0.0]
    } else {
        let n = cross / len;
        [n.x, n.y, n.z]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_normals_repeat_per_triangle() {
        let mesh = IsoMesh::from_vertices(vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
        ])
        .unwrap();

        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.normals.len(), mesh.vertices.len());
        assert_eq!(mesh.normals[0], [0.0, 0.0, 1.0]);
        assert_eq!(mesh.normals[1], mesh.normals[0]);
        assert_eq!(mesh.normals[2], mesh.normals[0]);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn winding_flips_the_normal() {
        let n = face_normal([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]);
        assert_eq!(n, [0.0, 0.0, -1.0]);
    }

    #[test]
    fn degenerate_triangle_gets_zero_normal() {
        let p = [0.5, 0.5, 0.5];
        let n = face_normal(p, p, p);
        assert_eq!(n, [0.0, 0.0, 0.0]);
        assert!(n.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn ragged_soup_is_rejected() {
        let err = IsoMesh::from_vertices(vec![[0.0; 3]; 4]).unwrap_err();
        assert!(matches!(err, IsoFieldError::RaggedVertexBuffer(4)));
    }
}
