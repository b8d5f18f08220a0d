//! Winding and orientation normalization.
//!
//! Two correctly oriented triangles always traverse a shared edge in
//! opposite directions. This pass makes that hold everywhere by breadth-
//! first propagation from an arbitrary seed per connected component, then
//! flips the whole mesh if its signed volume comes out negative so normals
//! point outward.
//!
//! The global sign decision is a single pass over the whole mesh, so a
//! multi-shell input (several disjoint closed components) is oriented as
//! one unit.

use std::collections::VecDeque;

use meshforge_types::TriMesh;
use tracing::debug;

use crate::EdgeUseTable;

/// Make triangle winding consistent and outward-facing.
///
/// Returns the reoriented mesh and the number of faces whose orientation
/// changed relative to the input. The seed face of each component keeps its
/// winding during propagation; edges with more than two uses are excluded
/// from propagation since their pairing is ambiguous.
#[must_use]
pub fn normalize_winding(mesh: &TriMesh) -> (TriMesh, usize) {
    if mesh.faces.is_empty() {
        return (mesh.clone(), 0);
    }

    let table = EdgeUseTable::build(&mesh.faces);

    // Face adjacency across manifold edges, with each side's traversal
    // direction.
    let mut adjacent: Vec<Vec<(usize, bool, bool)>> = vec![Vec::new(); mesh.faces.len()];
    for (_, uses) in table.edges() {
        if let [a, b] = uses {
            adjacent[a.face].push((b.face, a.forward, b.forward));
            adjacent[b.face].push((a.face, b.forward, a.forward));
        }
    }

    let mut visited = vec![false; mesh.faces.len()];
    let mut flip = vec![false; mesh.faces.len()];
    let mut queue = VecDeque::new();

    for seed in 0..mesh.faces.len() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        queue.push_back(seed);

        while let Some(face) = queue.pop_front() {
            for &(neighbor, my_dir, their_dir) in &adjacent[face] {
                if visited[neighbor] {
                    continue;
                }
                visited[neighbor] = true;
                // The neighbor must traverse the shared edge opposite to our
                // effective direction; flip it when it would not.
                let my_effective = my_dir != flip[face];
                flip[neighbor] = their_dir == my_effective;
                queue.push_back(neighbor);
            }
        }
    }

    let mut result = mesh.clone();
    for (face, flip) in result.faces.iter_mut().zip(&flip) {
        if *flip {
            face.swap(1, 2);
        }
    }

    // Outward orientation: a closed mesh wound outward has positive signed
    // volume.
    let global_flip = result.signed_volume() < 0.0;
    if global_flip {
        result.flip_faces();
    }

    let flipped = flip
        .iter()
        .filter(|&&local| local != global_flip)
        .count();

    if flipped > 0 {
        debug!(flipped, global_flip, "winding normalization");
        result.recompute_normals();
    }

    (result, flipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshforge_types::{unit_cube, MeshTopology};

    /// Every manifold shared edge must be traversed in opposite directions
    /// by its two faces.
    fn windings_consistent(faces: &[[u32; 3]]) -> bool {
        let table = EdgeUseTable::build(faces);
        let consistent = table.edges().all(|(_, uses)| match uses {
            [a, b] => a.forward != b.forward,
            _ => true,
        });
        consistent
    }

    #[test]
    fn already_consistent_cube_untouched() {
        let cube = unit_cube();
        let (normalized, flipped) = normalize_winding(&cube);
        assert_eq!(flipped, 0);
        assert_eq!(normalized.faces, cube.faces);
    }

    #[test]
    fn repairs_single_flipped_face() {
        let mut cube = unit_cube();
        cube.faces[4].swap(1, 2);
        assert!(!windings_consistent(&cube.faces));

        let (normalized, flipped) = normalize_winding(&cube);
        assert_eq!(flipped, 1);
        assert!(windings_consistent(&normalized.faces));
        assert!(normalized.signed_volume() > 0.0);
    }

    #[test]
    fn inside_out_cube_flipped_globally() {
        let mut cube = unit_cube();
        cube.flip_faces();
        assert!(cube.signed_volume() < 0.0);

        let (normalized, flipped) = normalize_winding(&cube);
        assert_eq!(flipped, cube.face_count());
        assert!(windings_consistent(&normalized.faces));
        assert!((normalized.signed_volume() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mixed_windings_all_resolved() {
        let mut cube = unit_cube();
        for (i, face) in cube.faces.iter_mut().enumerate() {
            if i % 3 == 0 {
                face.swap(0, 2);
            }
        }

        let (normalized, _) = normalize_winding(&cube);
        assert!(windings_consistent(&normalized.faces));
        assert!((normalized.signed_volume() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn open_surface_gets_consistent_winding() {
        // Two triangles over a square, second one flipped.
        let mut mesh = meshforge_types::TriMesh::new();
        mesh.vertices
            .push(meshforge_types::Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices
            .push(meshforge_types::Vertex::from_coords(1.0, 0.0, 0.0));
        mesh.vertices
            .push(meshforge_types::Vertex::from_coords(1.0, 1.0, 0.0));
        mesh.vertices
            .push(meshforge_types::Vertex::from_coords(0.0, 1.0, 0.0));
        mesh.faces.push([0, 1, 2]);
        mesh.faces.push([0, 3, 2]); // same traversal of edge (0,2) as face 0

        let (normalized, flipped) = normalize_winding(&mesh);
        assert!(windings_consistent(&normalized.faces));
        assert!(flipped <= 2);
    }

    #[test]
    fn empty_mesh() {
        let (normalized, flipped) = normalize_winding(&meshforge_types::TriMesh::new());
        assert!(normalized.is_empty());
        assert_eq!(flipped, 0);
    }
}
