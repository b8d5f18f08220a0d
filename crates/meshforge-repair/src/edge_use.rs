//! Edge-use analysis.
//!
//! Builds the undirected edge-to-face table used by almost every other
//! repair stage. Each face registers its three edges under a canonical
//! `(min, max)` vertex-pair key, recording which directed order the face
//! traversed the edge. The table is purely descriptive and immutable once
//! built.

use hashbrown::HashMap;

/// One face's use of an undirected edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeUse {
    /// Index of the face that uses the edge.
    pub face: usize,
    /// `true` if the face traverses the edge in ascending index order
    /// (from the smaller vertex index to the larger).
    pub forward: bool,
}

/// Edge-use table for a mesh.
///
/// For a closed manifold mesh every edge has exactly two uses, and two
/// correctly wound neighbors always traverse their shared edge in opposite
/// directions. Edges with one use are boundary edges; edges with more than
/// two uses are non-manifold and are reported, never silently resolved.
///
/// # Example
///
/// ```
/// use meshforge_repair::EdgeUseTable;
///
/// let faces = vec![[0, 1, 2], [1, 3, 2]];
/// let table = EdgeUseTable::build(&faces);
///
/// assert_eq!(table.boundary_edge_count(), 4);
/// assert!(table.is_manifold());
/// assert!(!table.is_watertight());
/// ```
#[derive(Debug, Clone)]
pub struct EdgeUseTable {
    uses: HashMap<(u32, u32), Vec<EdgeUse>>,
}

impl EdgeUseTable {
    /// Build the table from a list of faces.
    #[must_use]
    pub fn build(faces: &[[u32; 3]]) -> Self {
        let mut uses: HashMap<(u32, u32), Vec<EdgeUse>> = HashMap::new();

        for (face, &[a, b, c]) in faces.iter().enumerate() {
            for (v0, v1) in [(a, b), (b, c), (c, a)] {
                let key = canonical_edge(v0, v1);
                uses.entry(key).or_default().push(EdgeUse {
                    face,
                    forward: v0 < v1,
                });
            }
        }

        Self { uses }
    }

    /// Get the uses of an edge, in either vertex order.
    ///
    /// Returns `None` if the edge does not exist in the mesh.
    #[must_use]
    pub fn uses_for(&self, v0: u32, v1: u32) -> Option<&[EdgeUse]> {
        self.uses.get(&canonical_edge(v0, v1)).map(Vec::as_slice)
    }

    /// Iterate over all edges with their uses, keyed `(min, max)`.
    pub fn edges(&self) -> impl Iterator<Item = ((u32, u32), &[EdgeUse])> {
        self.uses.iter().map(|(&edge, uses)| (edge, uses.as_slice()))
    }

    /// Iterate over all boundary edges (exactly one use).
    ///
    /// Boundary edges indicate open holes in the surface.
    pub fn boundary_edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.uses
            .iter()
            .filter(|(_, uses)| uses.len() == 1)
            .map(|(&edge, _)| edge)
    }

    /// Count the boundary edges.
    #[must_use]
    pub fn boundary_edge_count(&self) -> usize {
        self.uses.values().filter(|uses| uses.len() == 1).count()
    }

    /// Iterate over all non-manifold edges (more than two uses).
    pub fn non_manifold_edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.uses
            .iter()
            .filter(|(_, uses)| uses.len() > 2)
            .map(|(&edge, _)| edge)
    }

    /// Count the non-manifold edges.
    #[must_use]
    pub fn non_manifold_edge_count(&self) -> usize {
        self.uses.values().filter(|uses| uses.len() > 2).count()
    }

    /// Check if every edge has at most two uses.
    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.uses.values().all(|uses| uses.len() <= 2)
    }

    /// Check if every edge has at least two uses (no open holes).
    #[must_use]
    pub fn is_watertight(&self) -> bool {
        self.uses.values().all(|uses| uses.len() >= 2)
    }

    /// Check if every edge has exactly two uses.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.uses.values().all(|uses| uses.len() == 2)
    }

    /// Get the total number of unique undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.uses.len()
    }
}

/// Canonicalize an edge so the smaller vertex index comes first.
#[inline]
fn canonical_edge(v0: u32, v1: u32) -> (u32, u32) {
    if v0 < v1 {
        (v0, v1)
    } else {
        (v1, v0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangles_sharing_edge() -> Vec<[u32; 3]> {
        // Consistently wound: the shared edge (1,2) is traversed 1->2 by the
        // first face and 2->1 by the second.
        vec![[0, 1, 2], [1, 3, 2]]
    }

    #[test]
    fn build_single_triangle() {
        let table = EdgeUseTable::build(&[[0, 1, 2]]);
        assert_eq!(table.edge_count(), 3);
        assert_eq!(table.boundary_edge_count(), 3);
        assert!(!table.is_watertight());
    }

    #[test]
    fn shared_edge_has_two_uses() {
        let table = EdgeUseTable::build(&two_triangles_sharing_edge());
        let uses = table.uses_for(1, 2);
        assert!(uses.is_some());
        assert_eq!(uses.map(<[EdgeUse]>::len), Some(2));
    }

    #[test]
    fn direction_flags_opposite_for_consistent_winding() {
        let table = EdgeUseTable::build(&two_triangles_sharing_edge());
        let uses = table.uses_for(1, 2).unwrap();
        // Face 0 traverses 1->2 (forward), face 1 traverses 2->1 (backward).
        assert_ne!(uses[0].forward, uses[1].forward);
    }

    #[test]
    fn direction_flags_equal_for_flipped_neighbor() {
        // Second face reversed: both faces now traverse (1,2) as 1->2.
        let table = EdgeUseTable::build(&[[0, 1, 2], [1, 2, 3]]);
        let uses = table.uses_for(1, 2).unwrap();
        assert_eq!(uses[0].forward, uses[1].forward);
    }

    #[test]
    fn edge_lookup_is_direction_agnostic() {
        let table = EdgeUseTable::build(&[[0, 1, 2]]);
        assert_eq!(table.uses_for(0, 1), table.uses_for(1, 0));
    }

    #[test]
    fn non_manifold_detection() {
        // Three faces share edge (0, 1).
        let table = EdgeUseTable::build(&[[0, 1, 2], [0, 1, 3], [0, 1, 4]]);
        assert_eq!(table.non_manifold_edge_count(), 1);
        assert!(!table.is_manifold());
    }

    #[test]
    fn closed_tetrahedron() {
        let faces = [[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        let table = EdgeUseTable::build(&faces);
        assert!(table.is_closed());
        assert!(table.is_manifold());
        assert!(table.is_watertight());
        assert_eq!(table.edge_count(), 6);
    }

    #[test]
    fn nonexistent_edge() {
        let table = EdgeUseTable::build(&[[0, 1, 2]]);
        assert!(table.uses_for(0, 5).is_none());
    }
}
