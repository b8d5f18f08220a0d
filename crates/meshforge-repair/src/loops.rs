//! Boundary loop extraction.
//!
//! Traces the boundary edges of an open surface into closed polylines.
//! Shared by hole filling (which triangulates the loops) and by sweep
//! construction (which extrudes them into side walls).

use hashbrown::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::EdgeUseTable;

/// A closed loop of boundary vertices.
///
/// Loops carry ordered vertex indices only. Hole classification (signed
/// area against a fitted plane) is computed by callers that need it, since
/// it depends on the plane the caller is working in.
#[derive(Debug, Clone)]
pub struct BoundaryLoop {
    /// Ordered list of vertex indices forming the loop. The last vertex
    /// connects back to the first.
    pub vertices: Vec<u32>,
}

impl BoundaryLoop {
    /// Number of edges (and vertices) in the loop.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.vertices.len()
    }

    /// Check if this loop has enough vertices to bound a surface.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.vertices.len() >= 3
    }
}

/// Extract all closed boundary loops from an edge-use table.
///
/// Collects the boundary edges (exactly one use), builds a vertex adjacency
/// among their endpoints, and walks from each unvisited boundary vertex,
/// always taking an unvisited incident boundary edge that is not the one
/// just traversed. The walk is bounded by the total boundary edge count, so
/// malformed boundaries (dangling chains, vertices with odd incidence)
/// terminate with a warning instead of looping forever.
///
/// Loops with fewer than 3 vertices are discarded.
#[must_use]
pub fn extract_boundary_loops(table: &EdgeUseTable) -> Vec<BoundaryLoop> {
    let boundary_edges: Vec<(u32, u32)> = table.boundary_edges().collect();
    if boundary_edges.is_empty() {
        return Vec::new();
    }

    let mut neighbors: HashMap<u32, Vec<u32>> = HashMap::new();
    for &(a, b) in &boundary_edges {
        neighbors.entry(a).or_default().push(b);
        neighbors.entry(b).or_default().push(a);
    }

    let mut visited: HashSet<u32> = HashSet::new();
    let mut loops = Vec::new();
    // Each loop walk visits at most every boundary edge once.
    let budget = boundary_edges.len() + 1;

    for &(start, _) in &boundary_edges {
        if visited.contains(&start) {
            continue;
        }

        let mut loop_vertices = Vec::new();
        let mut current = start;
        let mut prev: Option<u32> = None;
        let mut closed = false;

        for _ in 0..budget {
            visited.insert(current);
            loop_vertices.push(current);

            let incident = neighbors.get(&current).map(Vec::as_slice).unwrap_or(&[]);
            let next = incident
                .iter()
                .find(|&&n| Some(n) != prev && !visited.contains(&n))
                .or_else(|| {
                    incident
                        .iter()
                        .find(|&&n| n == start && loop_vertices.len() > 2)
                });

            match next {
                Some(&n) if n == start => {
                    closed = true;
                    break;
                }
                Some(&n) => {
                    prev = Some(current);
                    current = n;
                }
                None => break,
            }
        }

        if !closed {
            warn!(start, "boundary loop is not closed, discarding");
            continue;
        }

        if loop_vertices.len() >= 3 {
            loops.push(BoundaryLoop {
                vertices: loop_vertices,
            });
        }
    }

    debug!(
        count = loops.len(),
        sizes = ?loops.iter().map(BoundaryLoop::edge_count).collect::<Vec<_>>(),
        "extracted boundary loops"
    );

    loops
}
