//! Mesh validation and health reporting.

use hashbrown::HashSet;
use meshforge_types::{MeshTopology, TriMesh};

use crate::error::{RepairError, RepairResult};
use crate::EdgeUseTable;

/// Area threshold below which a face counts as degenerate.
const DEGENERATE_AREA: f64 = 1e-12;

/// Report of mesh validation results.
#[derive(Debug, Clone, Default)]
pub struct MeshReport {
    /// Total number of vertices.
    pub vertex_count: usize,
    /// Total number of faces.
    pub face_count: usize,
    /// Total number of unique undirected edges.
    pub edge_count: usize,

    /// Number of boundary edges (exactly one use).
    pub boundary_edge_count: usize,
    /// Number of non-manifold edges (more than two uses).
    pub non_manifold_edge_count: usize,
    /// Number of faces with near-zero area.
    pub degenerate_face_count: usize,
    /// Number of faces repeating an earlier face's vertex set.
    pub duplicate_face_count: usize,

    /// Whether every edge has at least two uses.
    pub is_watertight: bool,
    /// Whether every edge has at most two uses.
    pub is_manifold: bool,
    /// Whether the mesh encloses negative signed volume.
    pub is_inside_out: bool,
}

impl MeshReport {
    /// Check if the mesh is a closed, outward-facing manifold.
    #[must_use]
    pub fn is_sound(&self) -> bool {
        self.is_watertight && self.is_manifold && !self.is_inside_out
    }

    /// Check if the mesh has any issues.
    #[must_use]
    pub fn has_issues(&self) -> bool {
        self.issue_count() > 0
    }

    /// Total number of issues found.
    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.boundary_edge_count
            + self.non_manifold_edge_count
            + self.degenerate_face_count
            + self.duplicate_face_count
    }
}

impl std::fmt::Display for MeshReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "mesh: {} vertices, {} faces, {} edges",
            self.vertex_count, self.face_count, self.edge_count
        )?;
        writeln!(
            f,
            "  watertight: {}, manifold: {}, inside-out: {}",
            self.is_watertight, self.is_manifold, self.is_inside_out
        )?;
        if self.has_issues() {
            writeln!(
                f,
                "  issues: {} boundary, {} non-manifold, {} degenerate, {} duplicate",
                self.boundary_edge_count,
                self.non_manifold_edge_count,
                self.degenerate_face_count,
                self.duplicate_face_count
            )?;
        }
        Ok(())
    }
}

/// Validate a mesh and report its topological and geometric health.
///
/// # Example
///
/// ```
/// use meshforge_repair::validate;
///
/// let report = validate(&meshforge_types::unit_cube());
/// assert!(report.is_sound());
/// assert_eq!(report.edge_count, 18);
/// ```
#[must_use]
pub fn validate(mesh: &TriMesh) -> MeshReport {
    let table = EdgeUseTable::build(&mesh.faces);

    MeshReport {
        vertex_count: mesh.vertex_count(),
        face_count: mesh.face_count(),
        edge_count: table.edge_count(),
        boundary_edge_count: table.boundary_edge_count(),
        non_manifold_edge_count: table.non_manifold_edge_count(),
        degenerate_face_count: count_degenerate_faces(mesh),
        duplicate_face_count: count_duplicate_faces(&mesh.faces),
        is_watertight: table.is_watertight(),
        is_manifold: table.is_manifold(),
        is_inside_out: mesh.is_inside_out(),
    }
}

/// Check the structural preconditions every repair stage relies on.
///
/// # Errors
///
/// Returns [`RepairError::EmptyMesh`] for a mesh with no faces,
/// [`RepairError::InvalidIndex`] for a face index past the vertex array,
/// and [`RepairError::LabelMismatch`] when the label channel length does
/// not match the face count.
pub fn check_integrity(mesh: &TriMesh) -> RepairResult<()> {
    if mesh.faces.is_empty() {
        return Err(RepairError::EmptyMesh);
    }

    let vertex_count = mesh.vertex_count();
    for face in &mesh.faces {
        for &index in face {
            if index as usize >= vertex_count {
                return Err(RepairError::InvalidIndex {
                    index,
                    vertex_count,
                });
            }
        }
    }

    if let Some(labels) = &mesh.labels {
        if labels.len() != mesh.faces.len() {
            return Err(RepairError::LabelMismatch {
                labels: labels.len(),
                faces: mesh.faces.len(),
            });
        }
    }

    Ok(())
}

fn count_degenerate_faces(mesh: &TriMesh) -> usize {
    mesh.faces
        .iter()
        .filter(|&&[a, b, c]| {
            let v0 = mesh.vertices[a as usize].position;
            let v1 = mesh.vertices[b as usize].position;
            let v2 = mesh.vertices[c as usize].position;
            (v1 - v0).cross(&(v2 - v0)).norm() * 0.5 < DEGENERATE_AREA
        })
        .count()
}

fn count_duplicate_faces(faces: &[[u32; 3]]) -> usize {
    let mut seen: HashSet<[u32; 3]> = HashSet::with_capacity(faces.len());
    let mut duplicates = 0;

    for face in faces {
        let mut key = *face;
        key.sort_unstable();
        if !seen.insert(key) {
            duplicates += 1;
        }
    }

    duplicates
}
