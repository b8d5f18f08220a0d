//! Topological repair for triangle meshes.
//!
//! This crate turns an arbitrary triangle soup into a topologically clean,
//! watertight mesh suitable for solid-modeling operations. It provides:
//!
//! - Edge-use analysis (boundary / non-manifold edge detection)
//! - Vertex welding (quantization-based merging)
//! - T-junction resolution (crack closing via edge subdivision)
//! - Duplicate-triangle removal
//! - Boundary loop extraction
//! - Hole filling (Newell plane fit + ear clipping)
//! - Winding/orientation normalization (BFS + global outward flip)
//! - A composed repair pipeline over all of the above
//! - Mesh validation and health reporting
//!
//! Every stage takes a mesh by reference and returns a new mesh, so stages
//! compose freely and are independently testable. Tables (edge use, loops)
//! are recomputed on demand and never persisted across stages.
//!
//! # Example
//!
//! ```
//! use meshforge_types::unit_cube;
//! use meshforge_repair::{repair, validate, RepairParams};
//!
//! let cube = unit_cube();
//! let (fixed, summary) = repair(&cube, &RepairParams::default()).unwrap();
//!
//! let report = validate(&fixed);
//! assert!(report.is_watertight);
//! assert!(!summary.had_changes());
//! ```

// Safety: deny unwrap/expect in library code. Tests may use them.
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod diagnostics;
mod edge_use;
mod error;
pub mod holes;
mod loops;
mod overlap;
mod pipeline;
mod tjunction;
mod validate;
mod weld;
mod winding;

pub use diagnostics::{CollectingSink, DiagEvent, DiagnosticsSink, NullSink};
pub use edge_use::{EdgeUse, EdgeUseTable};
pub use error::{RepairError, RepairResult};
pub use holes::{fill_holes, triangulate_polygon};
pub use loops::{extract_boundary_loops, BoundaryLoop};
pub use overlap::remove_overlaps;
pub use pipeline::{repair, repair_with_diagnostics, RepairParams, RepairSummary};
pub use tjunction::resolve_t_junctions;
pub use validate::{validate, MeshReport};
pub use weld::{weld, WeldStats};
pub use winding::normalize_winding;
