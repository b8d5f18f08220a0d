//! Indexed triangle soup.

use crate::{Aabb, MeshBounds, MeshTopology, Triangle, Vertex};
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An indexed triangle soup.
///
/// This is the primary mesh type for meshforge. Vertices and faces are
/// stored separately, with faces referencing vertices by index. Repair and
/// sweep stages take a mesh by reference and return a new one, so a mesh is
/// a plain value with no retained adjacency state; adjacency tables are
/// recomputed on demand by the repair crate.
///
/// # Memory Layout
///
/// - `vertices`: `Vec<Vertex>` - Vertex positions and attributes
/// - `faces`: `Vec<[u32; 3]>` - Triangle faces as vertex indices
/// - `labels`: `Option<Vec<u32>>` - Optional per-face provenance ids,
///   same length as `faces` when present
///
/// # Winding Order
///
/// Faces use **counter-clockwise (CCW) winding** when viewed from outside,
/// so normals point outward by the right-hand rule.
///
/// # Example
///
/// ```
/// use meshforge_types::{TriMesh, Vertex, MeshTopology};
///
/// let mut mesh = TriMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
///
/// assert_eq!(mesh.vertex_count(), 3);
/// assert_eq!(mesh.face_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TriMesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,

    /// Triangle faces as indices into the vertex array.
    /// Each face is `[v0, v1, v2]` with counter-clockwise winding.
    pub faces: Vec<[u32; 3]>,

    /// Optional per-face provenance labels (e.g. source face id).
    /// When present, `labels.len() == faces.len()`.
    pub labels: Option<Vec<u32>>,
}

impl TriMesh {
    /// Create a new empty mesh.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            labels: None,
        }
    }

    /// Create a mesh with pre-allocated capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
            labels: None,
        }
    }

    /// Create a mesh from vertices and faces.
    #[inline]
    #[must_use]
    pub const fn from_parts(vertices: Vec<Vertex>, faces: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            faces,
            labels: None,
        }
    }

    /// Create a mesh from raw coordinate and index data.
    ///
    /// Returns an empty mesh if `positions.len()` or `indices.len()` is not
    /// divisible by 3.
    ///
    /// # Example
    ///
    /// ```
    /// use meshforge_types::{TriMesh, MeshTopology};
    ///
    /// let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    /// let indices = [0, 1, 2];
    ///
    /// let mesh = TriMesh::from_raw(&positions, &indices);
    /// assert_eq!(mesh.vertex_count(), 3);
    /// assert_eq!(mesh.face_count(), 1);
    /// ```
    #[must_use]
    pub fn from_raw(positions: &[f64], indices: &[u32]) -> Self {
        if positions.len() % 3 != 0 || indices.len() % 3 != 0 {
            return Self::new();
        }

        let vertices = positions
            .chunks_exact(3)
            .map(|c| Vertex::from_coords(c[0], c[1], c[2]))
            .collect();

        let faces = indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();

        Self {
            vertices,
            faces,
            labels: None,
        }
    }

    /// Get the label of a face, if a label channel is present.
    #[inline]
    #[must_use]
    pub fn label(&self, face_index: usize) -> Option<u32> {
        self.labels.as_ref().and_then(|l| l.get(face_index).copied())
    }

    /// Translate the mesh by the given vector.
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for vertex in &mut self.vertices {
            vertex.position += offset;
        }
    }

    /// Compute the signed volume of the mesh.
    ///
    /// Uses the divergence theorem: the signed volume is the sum of signed
    /// tetrahedra volumes formed by each face and the origin.
    ///
    /// # Returns
    ///
    /// - Positive value: normals point outward (correct orientation)
    /// - Negative value: normals point inward (inside-out mesh)
    /// - Near-zero: mesh is not closed or has inconsistent winding
    ///
    /// # Note
    ///
    /// The result is only meaningful as a volume for a closed mesh. For
    /// multi-shell inputs the shells are summed as one unit.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        let mut volume = 0.0;

        for &[i0, i1, i2] in &self.faces {
            let v0 = &self.vertices[i0 as usize].position;
            let v1 = &self.vertices[i1 as usize].position;
            let v2 = &self.vertices[i2 as usize].position;

            // Signed volume of tetrahedron with origin = (v0 . (v1 x v2)) / 6
            let cross = Vector3::new(
                v1.y.mul_add(v2.z, -(v1.z * v2.y)),
                v1.z.mul_add(v2.x, -(v1.x * v2.z)),
                v1.x.mul_add(v2.y, -(v1.y * v2.x)),
            );
            volume += v0.z.mul_add(cross.z, v0.x.mul_add(cross.x, v0.y * cross.y));
        }

        volume / 6.0
    }

    /// Compute the absolute volume of the mesh.
    #[inline]
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    /// Check if the mesh appears to be inside-out (negative signed volume).
    #[inline]
    #[must_use]
    pub fn is_inside_out(&self) -> bool {
        self.signed_volume() < 0.0
    }

    /// Compute the total surface area of the mesh.
    #[must_use]
    pub fn surface_area(&self) -> f64 {
        self.triangles().map(|tri| tri.area()).sum()
    }

    /// Flip all faces by reversing winding order.
    ///
    /// Vertex normals, if present, are negated to match.
    pub fn flip_faces(&mut self) {
        for face in &mut self.faces {
            face.swap(1, 2);
        }
        for vertex in &mut self.vertices {
            if let Some(ref mut normal) = vertex.attributes.normal {
                *normal = -*normal;
            }
        }
    }

    /// Recompute per-vertex normals as the area-weighted average of
    /// adjacent face normals.
    ///
    /// Faces with zero area contribute nothing. Vertices with no adjacent
    /// faces keep `normal: None`.
    pub fn recompute_normals(&mut self) {
        let mut accum = vec![Vector3::zeros(); self.vertices.len()];

        for &[i0, i1, i2] in &self.faces {
            let v0 = self.vertices[i0 as usize].position;
            let v1 = self.vertices[i1 as usize].position;
            let v2 = self.vertices[i2 as usize].position;

            // Cross product magnitude is twice the area, so this is
            // area weighting for free.
            let n = (v1 - v0).cross(&(v2 - v0));
            accum[i0 as usize] += n;
            accum[i1 as usize] += n;
            accum[i2 as usize] += n;
        }

        for (vertex, n) in self.vertices.iter_mut().zip(accum) {
            vertex.attributes.normal = n.try_normalize(f64::EPSILON);
        }
    }

    /// Merge another mesh into this one.
    ///
    /// The other mesh's vertices and faces are appended, with face indices
    /// adjusted. If either mesh carries labels, the merged mesh carries
    /// labels, with `0` filled in for faces that had none.
    #[allow(clippy::cast_possible_truncation)]
    // Truncation: mesh indices are u32, so vertex counts > 4B are unsupported by design
    pub fn merge(&mut self, other: &Self) {
        let vertex_offset = self.vertices.len() as u32;
        let own_faces = self.faces.len();

        self.vertices.extend(other.vertices.iter().cloned());

        for face in &other.faces {
            self.faces.push([
                face[0] + vertex_offset,
                face[1] + vertex_offset,
                face[2] + vertex_offset,
            ]);
        }

        if self.labels.is_some() || other.labels.is_some() {
            let mut labels = self.labels.take().unwrap_or_else(|| vec![0; own_faces]);
            match &other.labels {
                Some(l) => labels.extend_from_slice(l),
                None => labels.resize(self.faces.len(), 0),
            }
            self.labels = Some(labels);
        }
    }
}

impl MeshTopology for TriMesh {
    #[inline]
    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn vertex(&self, index: usize) -> Option<&Vertex> {
        self.vertices.get(index)
    }

    fn face(&self, index: usize) -> Option<[u32; 3]> {
        self.faces.get(index).copied()
    }

    fn triangle(&self, face_index: usize) -> Option<Triangle> {
        self.faces.get(face_index).map(|&[i0, i1, i2]| Triangle {
            v0: self.vertices[i0 as usize].position,
            v1: self.vertices[i1 as usize].position,
            v2: self.vertices[i2 as usize].position,
        })
    }

    fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.iter()
    }

    fn faces(&self) -> impl Iterator<Item = [u32; 3]> {
        self.faces.iter().copied()
    }

    fn triangles(&self) -> impl Iterator<Item = Triangle> {
        self.faces.iter().map(|&[i0, i1, i2]| Triangle {
            v0: self.vertices[i0 as usize].position,
            v1: self.vertices[i1 as usize].position,
            v2: self.vertices[i2 as usize].position,
        })
    }
}

impl MeshBounds for TriMesh {
    fn bounds(&self) -> Aabb {
        if self.vertices.is_empty() {
            return Aabb::empty();
        }

        let positions = self.vertices.iter().map(|v| &v.position);
        Aabb::from_points(positions)
    }
}

/// Helper function to create a unit cube mesh.
///
/// Creates a cube from (0,0,0) to (1,1,1) with outward-facing normals.
///
/// # Example
///
/// ```
/// use meshforge_types::{unit_cube, MeshTopology};
///
/// let cube = unit_cube();
/// assert_eq!(cube.vertex_count(), 8);
/// assert_eq!(cube.face_count(), 12);
/// ```
#[must_use]
pub fn unit_cube() -> TriMesh {
    let mut mesh = TriMesh::with_capacity(8, 12);

    mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0)); // 0
    mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0)); // 1
    mesh.vertices.push(Vertex::from_coords(1.0, 1.0, 0.0)); // 2
    mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0)); // 3
    mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 1.0)); // 4
    mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 1.0)); // 5
    mesh.vertices.push(Vertex::from_coords(1.0, 1.0, 1.0)); // 6
    mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 1.0)); // 7

    // 12 triangles (2 per face), CCW winding when viewed from outside

    // Bottom face (z=0) - normal points -Z
    mesh.faces.push([0, 2, 1]);
    mesh.faces.push([0, 3, 2]);

    // Top face (z=1) - normal points +Z
    mesh.faces.push([4, 5, 6]);
    mesh.faces.push([4, 6, 7]);

    // Front face (y=0) - normal points -Y
    mesh.faces.push([0, 1, 5]);
    mesh.faces.push([0, 5, 4]);

    // Back face (y=1) - normal points +Y
    mesh.faces.push([3, 7, 6]);
    mesh.faces.push([3, 6, 2]);

    // Left face (x=0) - normal points -X
    mesh.faces.push([0, 4, 7]);
    mesh.faces.push([0, 7, 3]);

    // Right face (x=1) - normal points +X
    mesh.faces.push([1, 2, 6]);
    mesh.faces.push([1, 6, 5]);

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_is_empty() {
        let mesh = TriMesh::new();
        assert!(mesh.is_empty());

        let mut mesh2 = TriMesh::new();
        mesh2.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        assert!(mesh2.is_empty()); // no faces

        mesh2.faces.push([0, 0, 0]);
        assert!(!mesh2.is_empty());
    }

    #[test]
    fn unit_cube_volume() {
        let cube = unit_cube();
        let vol = cube.signed_volume();
        assert!(
            (vol - 1.0).abs() < 1e-10,
            "unit cube volume should be 1.0, got {vol}"
        );
    }

    #[test]
    fn unit_cube_surface_area() {
        let cube = unit_cube();
        let area = cube.surface_area();
        assert!((area - 6.0).abs() < 1e-10);
    }

    #[test]
    fn flipped_cube_inside_out() {
        let mut cube = unit_cube();
        cube.flip_faces();
        assert!(cube.is_inside_out());
    }

    #[test]
    fn recompute_normals_flat_square() {
        let mut mesh = TriMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 1.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
        mesh.faces.push([0, 1, 2]);
        mesh.faces.push([0, 2, 3]);

        mesh.recompute_normals();

        for v in &mesh.vertices {
            let n = v.normal();
            assert!(n.is_some());
            if let Some(n) = n {
                assert!((n.z - 1.0).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn mesh_merge_offsets_indices() {
        let mut mesh1 = TriMesh::new();
        mesh1.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh1.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        mesh1.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
        mesh1.faces.push([0, 1, 2]);

        let mut mesh2 = TriMesh::new();
        mesh2.vertices.push(Vertex::from_coords(2.0, 0.0, 0.0));
        mesh2.vertices.push(Vertex::from_coords(3.0, 0.0, 0.0));
        mesh2.vertices.push(Vertex::from_coords(2.0, 1.0, 0.0));
        mesh2.faces.push([0, 1, 2]);

        mesh1.merge(&mesh2);
        assert_eq!(mesh1.vertex_count(), 6);
        assert_eq!(mesh1.face_count(), 2);
        assert_eq!(mesh1.faces[1], [3, 4, 5]);
        assert!(mesh1.labels.is_none());
    }

    #[test]
    fn mesh_merge_fills_missing_labels() {
        let mut mesh1 = unit_cube();
        let mut mesh2 = unit_cube();
        mesh2.labels = Some(vec![7; 12]);

        mesh1.merge(&mesh2);
        let labels = mesh1.labels.as_ref();
        assert!(labels.is_some());
        if let Some(labels) = labels {
            assert_eq!(labels.len(), 24);
            assert_eq!(labels[0], 0);
            assert_eq!(labels[12], 7);
        }
    }

    #[test]
    fn mesh_translate() {
        let mut mesh = TriMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.translate(Vector3::new(1.0, 2.0, 3.0));
        let pos = mesh.vertices[0].position;
        assert!((pos.z - 3.0).abs() < f64::EPSILON);
    }
}
