//! Error types for mesh repair operations.

use thiserror::Error;

/// Result type for repair operations.
pub type RepairResult<T> = Result<T, RepairError>;

/// Errors that can occur during mesh repair.
///
/// Geometric degeneracies (zero-area faces, duplicates, collinear loop
/// points) are never errors; they are filtered with a diagnostic count.
/// Errors are reserved for inputs the pipeline cannot meaningfully process.
#[derive(Debug, Error)]
pub enum RepairError {
    /// Mesh is empty (no vertices or faces).
    #[error("mesh is empty")]
    EmptyMesh,

    /// Mesh has invalid indices.
    #[error("invalid vertex index {index} (mesh has {vertex_count} vertices)")]
    InvalidIndex {
        /// The invalid index.
        index: u32,
        /// Total number of vertices in the mesh.
        vertex_count: usize,
    },

    /// Label channel length does not match the face count.
    #[error("label channel has {labels} entries for {faces} faces")]
    LabelMismatch {
        /// Number of label entries.
        labels: usize,
        /// Number of faces.
        faces: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        assert_eq!(RepairError::EmptyMesh.to_string(), "mesh is empty");
        assert_eq!(
            RepairError::InvalidIndex {
                index: 9,
                vertex_count: 3
            }
            .to_string(),
            "invalid vertex index 9 (mesh has 3 vertices)"
        );
        assert_eq!(
            RepairError::LabelMismatch { labels: 2, faces: 4 }.to_string(),
            "label channel has 2 entries for 4 faces"
        );
    }
}
