//! Geometry ingestion.
//!
//! Upstream callers hand geometry to the engine in one of two shapes:
//! already-indexed vertex/index arrays, or a flat soup of triangles with no
//! shared vertices. Both are resolved into a [`TriMesh`] exactly once at
//! ingestion, so no downstream code branches on the input shape.

use crate::{TriMesh, Triangle, Vertex};
use nalgebra::Point3;

/// A source of triangle geometry, resolved once into a [`TriMesh`].
///
/// Faces that reference out-of-range vertices or repeat an index are invalid
/// and dropped during resolution; `resolve` reports how many were dropped.
///
/// # Example
///
/// ```
/// use meshforge_types::{GeometrySource, MeshTopology, Point3};
///
/// let source = GeometrySource::Indexed {
///     positions: vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(1.0, 0.0, 0.0),
///         Point3::new(0.0, 1.0, 0.0),
///     ],
///     indices: vec![[0, 1, 2], [0, 1, 9]], // second face is invalid
/// };
///
/// let (mesh, dropped) = source.resolve();
/// assert_eq!(mesh.face_count(), 1);
/// assert_eq!(dropped, 1);
/// ```
#[derive(Debug, Clone)]
pub enum GeometrySource {
    /// Indexed geometry: a dense position array plus index triples.
    Indexed {
        /// One entry per vertex.
        positions: Vec<Point3<f64>>,
        /// Triangles as index triples into `positions`.
        indices: Vec<[u32; 3]>,
    },
    /// Non-indexed geometry: standalone triangles with no shared vertices.
    Soup {
        /// The triangles, three fresh vertices each.
        triangles: Vec<Triangle>,
    },
}

impl GeometrySource {
    /// Resolve this source into a mesh, dropping invalid faces.
    ///
    /// Returns the mesh and the number of faces dropped (out-of-range or
    /// repeated indices).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    // Truncation: mesh indices are u32, larger soups are unsupported by design
    pub fn resolve(self) -> (TriMesh, usize) {
        match self {
            Self::Indexed { positions, indices } => {
                let vertex_count = positions.len() as u32;
                let mut mesh = TriMesh::with_capacity(positions.len(), indices.len());
                mesh.vertices = positions.into_iter().map(Vertex::new).collect();

                let mut dropped = 0;
                for [i0, i1, i2] in indices {
                    let in_range = i0 < vertex_count && i1 < vertex_count && i2 < vertex_count;
                    let distinct = i0 != i1 && i1 != i2 && i0 != i2;
                    if in_range && distinct {
                        mesh.faces.push([i0, i1, i2]);
                    } else {
                        dropped += 1;
                    }
                }
                (mesh, dropped)
            }
            Self::Soup { triangles } => {
                let mut mesh = TriMesh::with_capacity(triangles.len() * 3, triangles.len());
                for tri in triangles {
                    let base = mesh.vertices.len() as u32;
                    mesh.vertices.push(Vertex::new(tri.v0));
                    mesh.vertices.push(Vertex::new(tri.v1));
                    mesh.vertices.push(Vertex::new(tri.v2));
                    mesh.faces.push([base, base + 1, base + 2]);
                }
                (mesh, 0)
            }
        }
    }
}
