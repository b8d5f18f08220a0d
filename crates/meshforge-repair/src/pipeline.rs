//! The full repair pipeline.
//!
//! Stages run in a fixed order: weld, T-junction resolution, overlap
//! removal, then hole filling and winding normalization twice each,
//! interleaved. Filling one hole can change the boundary-edge set relevant
//! to others, and freshly patched faces may need reorienting; empirically
//! two rounds suffice, which is a pragmatic rather than provably-sufficient
//! choice.

use meshforge_types::{MeshBounds, TriMesh};
use tracing::info;

use crate::diagnostics::{DiagEvent, DiagnosticsSink, NullSink};
use crate::error::RepairResult;
use crate::holes::fill_holes;
use crate::overlap::remove_overlaps;
use crate::tjunction::resolve_t_junctions;
use crate::validate::check_integrity;
use crate::weld::weld;
use crate::winding::normalize_winding;
use crate::EdgeUseTable;

/// Tuning parameters for the repair pipeline.
///
/// The defaults suit meshes with coordinates in the unit-to-meter range.
/// A `grid_cell_size` of zero derives the T-junction search cell from the
/// mesh's bounding box.
#[derive(Debug, Clone, Copy)]
pub struct RepairParams {
    /// Vertex weld tolerance, in world units.
    pub weld_epsilon: f64,
    /// Maximum perpendicular distance for a T-junction insertion.
    pub line_tolerance: f64,
    /// Spatial-hash cell size for T-junction candidate search; `0.0` derives
    /// it from the bounding box.
    pub grid_cell_size: f64,
    /// Position quantization for duplicate-face detection.
    pub overlap_epsilon: f64,
    /// Boundary loops with more edges than this are not filled.
    pub max_hole_edges: usize,
}

impl Default for RepairParams {
    fn default() -> Self {
        Self {
            weld_epsilon: 1e-5,
            line_tolerance: 1e-5,
            grid_cell_size: 0.0,
            overlap_epsilon: 1e-6,
            max_hole_edges: 100,
        }
    }
}

impl RepairParams {
    /// Set the vertex weld tolerance.
    #[must_use]
    pub fn with_weld_epsilon(mut self, epsilon: f64) -> Self {
        self.weld_epsilon = epsilon;
        self
    }

    /// Set the T-junction line tolerance.
    #[must_use]
    pub fn with_line_tolerance(mut self, tolerance: f64) -> Self {
        self.line_tolerance = tolerance;
        self
    }

    /// Set the T-junction spatial-hash cell size.
    #[must_use]
    pub fn with_grid_cell_size(mut self, size: f64) -> Self {
        self.grid_cell_size = size;
        self
    }

    /// Set the duplicate-face position quantization.
    #[must_use]
    pub fn with_overlap_epsilon(mut self, epsilon: f64) -> Self {
        self.overlap_epsilon = epsilon;
        self
    }

    /// Set the maximum fillable hole size, in edges.
    #[must_use]
    pub fn with_max_hole_edges(mut self, edges: usize) -> Self {
        self.max_hole_edges = edges;
        self
    }
}

/// Counters describing what a full repair run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairSummary {
    /// Vertices merged by welding.
    pub vertices_welded: usize,
    /// Degenerate faces dropped by welding.
    pub faces_dropped: usize,
    /// T-junction insertion points applied.
    pub splits_applied: usize,
    /// Duplicate faces removed.
    pub overlaps_removed: usize,
    /// Boundary loops filled, over both rounds.
    pub holes_filled: usize,
    /// Faces reoriented, over both rounds.
    pub faces_flipped: usize,
    /// Non-manifold edges remaining in the output. Reported, not resolved.
    pub non_manifold_edges: usize,
}

impl RepairSummary {
    /// Check if any stage changed the mesh.
    #[must_use]
    pub fn had_changes(&self) -> bool {
        self.vertices_welded > 0
            || self.faces_dropped > 0
            || self.splits_applied > 0
            || self.overlaps_removed > 0
            || self.holes_filled > 0
            || self.faces_flipped > 0
    }
}

/// Run the full repair pipeline with default diagnostics.
///
/// See [`repair_with_diagnostics`] for the stage order and error behavior.
///
/// # Errors
///
/// Returns an error if the input fails [`check_integrity`].
pub fn repair(mesh: &TriMesh, params: &RepairParams) -> RepairResult<(TriMesh, RepairSummary)> {
    repair_with_diagnostics(mesh, params, &mut NullSink)
}

/// Run the full repair pipeline, reporting structured events to `sink`.
///
/// Geometric degeneracies are filtered with counts, never errors. Edges
/// used by more than two faces are counted in the summary and reported via
/// the sink; resolving them is ambiguous without more context, so they are
/// left in place.
///
/// # Errors
///
/// Returns an error if the input fails [`check_integrity`]: an empty mesh,
/// an out-of-range face index, or a label channel of the wrong length.
pub fn repair_with_diagnostics(
    mesh: &TriMesh,
    params: &RepairParams,
    sink: &mut dyn DiagnosticsSink,
) -> RepairResult<(TriMesh, RepairSummary)> {
    check_integrity(mesh)?;

    let mut summary = RepairSummary::default();

    let (mut current, weld_stats) = weld(mesh, params.weld_epsilon);
    summary.vertices_welded = weld_stats.vertices_merged;
    summary.faces_dropped = weld_stats.faces_dropped;
    if weld_stats.vertices_merged > 0 {
        sink.report(DiagEvent::VerticesWelded {
            count: weld_stats.vertices_merged,
        });
    }
    if weld_stats.faces_dropped > 0 {
        sink.report(DiagEvent::FacesDropped {
            count: weld_stats.faces_dropped,
        });
    }

    let cell = effective_cell_size(&current, params);
    let (resolved, splits) = resolve_t_junctions(&current, params.line_tolerance, cell);
    current = resolved;
    summary.splits_applied = splits;
    if splits > 0 {
        sink.report(DiagEvent::SplitsApplied { count: splits });
    }

    let (deduped, removed) = remove_overlaps(&current, params.overlap_epsilon);
    current = deduped;
    summary.overlaps_removed = removed;
    if removed > 0 {
        sink.report(DiagEvent::OverlapsRemoved { count: removed });
    }

    for _ in 0..2 {
        let (patched, filled) = fill_holes(&current, params.max_hole_edges);
        current = patched;
        summary.holes_filled += filled;
        if filled > 0 {
            sink.report(DiagEvent::HolesFilled { count: filled });
        }

        let (oriented, flipped) = normalize_winding(&current);
        current = oriented;
        summary.faces_flipped += flipped;
        if flipped > 0 {
            sink.report(DiagEvent::FacesFlipped { count: flipped });
        }
    }

    let table = EdgeUseTable::build(&current.faces);
    summary.non_manifold_edges = table.non_manifold_edge_count();
    if summary.non_manifold_edges > 0 {
        sink.report(DiagEvent::NonManifoldEdges {
            count: summary.non_manifold_edges,
        });
    }

    info!(
        welded = summary.vertices_welded,
        splits = summary.splits_applied,
        overlaps = summary.overlaps_removed,
        holes = summary.holes_filled,
        flipped = summary.faces_flipped,
        non_manifold = summary.non_manifold_edges,
        "repair complete"
    );

    Ok((current, summary))
}

/// T-junction cell size: explicit if set, otherwise a fraction of the
/// bounding box's largest extent, floored to the line tolerance.
fn effective_cell_size(mesh: &TriMesh, params: &RepairParams) -> f64 {
    if params.grid_cell_size > 0.0 {
        return params.grid_cell_size;
    }
    let extent = mesh.bounds().max_extent();
    (extent / 32.0).max(params.line_tolerance)
}
