//! Duplicate-face removal.

use hashbrown::HashSet;
use meshforge_types::TriMesh;
use nalgebra::Point3;
use tracing::debug;

/// Remove duplicate (overlapping) faces.
///
/// Each face is keyed by its three vertex positions, quantized by
/// `position_epsilon` and sorted lexicographically, so two faces count as
/// duplicates regardless of vertex order or winding. The first face seen
/// per key is kept; later ones are discarded. Returns the deduplicated
/// mesh and the number of faces removed.
#[must_use]
pub fn remove_overlaps(mesh: &TriMesh, position_epsilon: f64) -> (TriMesh, usize) {
    if mesh.faces.is_empty() || position_epsilon <= 0.0 || !position_epsilon.is_finite() {
        return (mesh.clone(), 0);
    }

    let mut seen: HashSet<[(i64, i64, i64); 3]> = HashSet::with_capacity(mesh.faces.len());
    let mut result = TriMesh::with_capacity(mesh.vertices.len(), mesh.faces.len());
    result.vertices = mesh.vertices.clone();
    let mut labels = mesh.labels.as_ref().map(|_| Vec::new());
    let mut removed = 0;

    for (face_idx, face) in mesh.faces.iter().enumerate() {
        let mut key = face.map(|v| quantize(&mesh.vertices[v as usize].position, position_epsilon));
        key.sort_unstable();

        if seen.insert(key) {
            result.faces.push(*face);
            if let (Some(labels), Some(src)) = (labels.as_mut(), mesh.labels.as_ref()) {
                labels.push(src[face_idx]);
            }
        } else {
            removed += 1;
        }
    }

    if removed > 0 {
        debug!(removed, "overlap removal");
    }

    result.labels = labels;
    (result, removed)
}

#[inline]
#[allow(clippy::cast_possible_truncation)]
// Truncation: coordinates / epsilon are assumed to fit i64 grid cells
fn quantize(pos: &Point3<f64>, epsilon: f64) -> (i64, i64, i64) {
    (
        (pos.x / epsilon).round() as i64,
        (pos.y / epsilon).round() as i64,
        (pos.z / epsilon).round() as i64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshforge_types::{MeshTopology, Vertex};

    fn mesh_with_duplicate() -> TriMesh {
        let mut mesh = TriMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
        // Same positions duplicated as separate vertices.
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
        mesh.faces.push([0, 1, 2]);
        mesh.faces.push([3, 4, 5]);
        mesh
    }

    #[test]
    fn removes_position_duplicates() {
        let mesh = mesh_with_duplicate();
        let (deduped, removed) = remove_overlaps(&mesh, 1e-6);
        assert_eq!(removed, 1);
        assert_eq!(deduped.face_count(), 1);
    }

    #[test]
    fn winding_does_not_defeat_dedup() {
        let mut mesh = mesh_with_duplicate();
        mesh.faces[1] = [5, 4, 3]; // reversed winding, same positions
        let (_, removed) = remove_overlaps(&mesh, 1e-6);
        assert_eq!(removed, 1);
    }

    #[test]
    fn keeps_first_face_and_label() {
        let mut mesh = mesh_with_duplicate();
        mesh.labels = Some(vec![7, 9]);
        let (deduped, _) = remove_overlaps(&mesh, 1e-6);
        assert_eq!(deduped.labels, Some(vec![7]));
    }

    #[test]
    fn distinct_faces_survive() {
        let mut mesh = TriMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 1.0, 0.0));
        mesh.faces.push([0, 1, 2]);
        mesh.faces.push([1, 3, 2]);

        let (deduped, removed) = remove_overlaps(&mesh, 1e-6);
        assert_eq!(removed, 0);
        assert_eq!(deduped.face_count(), 2);
    }
}
