//! Extruded and swept solid construction.
//!
//! Both entry points share one construction scheme: every profile ring
//! point has fixed local (u, v) coordinates, and every path sample (or path
//! endpoint, for a plain extrusion) has a frame that places those
//! coordinates in world space. Caps and side walls index into the same
//! placed vertices, so the raw mesh is watertight by construction up to
//! floating error, and finalization only has to weld hairline seams.

use hashbrown::HashSet;
use meshforge_repair::diagnostics::{DiagEvent, DiagnosticsSink, NullSink};
use meshforge_repair::{triangulate_polygon, weld, EdgeUseTable};
use meshforge_types::{MeshBounds, TriMesh, Vertex};
use nalgebra::{Point3, Vector3};
use tracing::{debug, info, warn};

use crate::error::{SweepError, SweepResult};
use crate::frame::propagate_frames;
use crate::path::{normalize_aligned_path, normalize_translate_path};
use crate::profile::Profile;

/// Finalization retry budget and the hard cap on the escalated epsilon.
const MAX_FINALIZE_ATTEMPTS: usize = 3;
const MAX_WELD_EPSILON: f64 = 5e-4;

/// Extrude a profile along a fixed offset vector.
///
/// Produces a closed solid: a start cap wound away from the offset, an end
/// cap at the far side, and one side-wall quad (two triangles) per
/// boundary edge. The result is welded and manifold-checked before return;
/// see [`sweep_along`] for the retry behavior on failure.
///
/// # Errors
///
/// Returns [`SweepError::ZeroOffset`] for a zero-length offset.
///
/// # Example
///
/// ```
/// use meshforge_sweep::{extrude, Profile};
/// use nalgebra::{Point3, Vector3};
///
/// let square = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let profile = Profile::new(square, vec![]).unwrap();
/// let solid = extrude(&profile, Vector3::new(0.0, 0.0, 2.0)).unwrap();
///
/// assert_eq!(solid.vertices.len(), 8);
/// assert_eq!(solid.faces.len(), 12);
/// ```
pub fn extrude(profile: &Profile, offset: Vector3<f64>) -> SweepResult<TriMesh> {
    extrude_with_diagnostics(profile, offset, &mut NullSink)
}

/// [`extrude`] with a caller-supplied diagnostics sink.
///
/// # Errors
///
/// Same as [`extrude`].
pub fn extrude_with_diagnostics(
    profile: &Profile,
    offset: Vector3<f64>,
    sink: &mut dyn DiagnosticsSink,
) -> SweepResult<TriMesh> {
    if offset.norm_squared() <= f64::EPSILON {
        return Err(SweepError::ZeroOffset);
    }

    let (u, v) = profile.basis();
    let anchor = profile.anchor();
    let uvs = flat_uvs(profile);

    // Bottom ring block, then top ring block.
    let mut mesh = TriMesh::with_capacity(uvs.len() * 2, uvs.len() * 4);
    for &(pu, pv) in &uvs {
        mesh.vertices
            .push(Vertex::new(anchor + u * pu + v * pv));
    }
    for i in 0..uvs.len() {
        let bottom = mesh.vertices[i].position;
        mesh.vertices.push(Vertex::new(bottom + offset));
    }

    // Caps face along the offset; flip everything if the profile normal
    // opposes it.
    let along = offset.dot(&profile.normal()) >= 0.0;
    #[allow(clippy::cast_possible_truncation)]
    let top_base = uvs.len() as u32;

    emit_caps(&mut mesh, profile, 0, top_base, along);
    emit_walls(
        &mut mesh,
        profile,
        &[(0, top_base)],
        along,
    );

    debug!(
        vertices = mesh.vertices.len(),
        faces = mesh.faces.len(),
        "extrusion constructed"
    );
    Ok(finalize(mesh, sink))
}

/// Extrude a profile along a translation path.
///
/// The path is reduced to its endpoints' net offset: duplicates and
/// exactly collinear interior points are dropped, and the remaining
/// polyline must describe a straight translation.
///
/// # Errors
///
/// Returns [`SweepError::TooFewPathPoints`] if fewer than two distinct
/// points remain, and [`SweepError::ZeroOffset`] for a closed path.
pub fn extrude_along(profile: &Profile, path: &[Point3<f64>]) -> SweepResult<TriMesh> {
    let normalized = normalize_translate_path(path);
    if normalized.len() < 2 {
        return Err(SweepError::TooFewPathPoints {
            min: 2,
            actual: normalized.len(),
        });
    }
    let offset = normalized[normalized.len() - 1] - normalized[0];
    extrude(profile, offset)
}

/// Sweep a profile along a path polyline, one frame per path sample.
///
/// The path is normalized first (deduplicated, subdivided, corners eased;
/// see [`normalize_aligned_path`]), then frames are propagated along it
/// with the profile's own basis as the twist reference. Every ring point
/// is placed at `frame.origin + u*frame.x + v*frame.y`, walls connect
/// consecutive frames, and caps close the first and last ring.
///
/// Finalization welds with an epsilon derived from the bounding-box
/// diagonal and checks for a closed, consistently wound surface; on
/// failure the epsilon is doubled and the weld retried, a bounded number
/// of times. If the retries are exhausted the best-effort mesh is
/// returned with a logged warning - partial results remain useful for
/// inspection.
///
/// # Errors
///
/// Returns [`SweepError::TooFewPathPoints`] if fewer than two distinct
/// path points remain after normalization.
pub fn sweep_along(profile: &Profile, path: &[Point3<f64>]) -> SweepResult<TriMesh> {
    sweep_along_with_diagnostics(profile, path, &mut NullSink)
}

/// [`sweep_along`] with a caller-supplied diagnostics sink.
///
/// # Errors
///
/// Same as [`sweep_along`].
pub fn sweep_along_with_diagnostics(
    profile: &Profile,
    path: &[Point3<f64>],
    sink: &mut dyn DiagnosticsSink,
) -> SweepResult<TriMesh> {
    let normalized = normalize_aligned_path(path);
    if normalized.len() < 2 {
        return Err(SweepError::TooFewPathPoints {
            min: 2,
            actual: normalized.len(),
        });
    }

    let mut profile = profile.clone();
    profile.anchor_to(&normalized[0]);

    let (u, _) = profile.basis();
    let frames = propagate_frames(&normalized, &u);
    let uvs = flat_uvs(&profile);

    let mut mesh = TriMesh::with_capacity(frames.len() * uvs.len(), frames.len() * uvs.len() * 2);
    for frame in &frames {
        for &(pu, pv) in &uvs {
            mesh.vertices.push(Vertex::new(frame.place(pu, pv)));
        }
    }

    // Cap and wall orientation depends on whether the profile normal runs
    // with or against the initial tangent.
    let along = frames[0].z.dot(&profile.normal()) >= 0.0;

    #[allow(clippy::cast_possible_truncation)]
    let ring_stride = uvs.len() as u32;
    #[allow(clippy::cast_possible_truncation)]
    let last_base = ((frames.len() - 1) * uvs.len()) as u32;

    emit_caps(&mut mesh, &profile, 0, last_base, along);

    let bases: Vec<(u32, u32)> = (0..frames.len() - 1)
        .map(|k| {
            #[allow(clippy::cast_possible_truncation)]
            let base = (k as u32) * ring_stride;
            (base, base + ring_stride)
        })
        .collect();
    emit_walls(&mut mesh, &profile, &bases, along);

    debug!(
        samples = frames.len(),
        vertices = mesh.vertices.len(),
        faces = mesh.faces.len(),
        "sweep constructed"
    );
    Ok(finalize(mesh, sink))
}

/// Local coordinates of all ring points, flattened outer-first.
fn flat_uvs(profile: &Profile) -> Vec<(f64, f64)> {
    profile.ring_uvs().into_iter().flatten().collect()
}

/// Emit start and end caps over the ring blocks at the given vertex bases.
///
/// The cap triangulation indexes original ring points (bridge duplicates
/// map back to their source points), so cap triangles share vertices with
/// the side walls.
fn emit_caps(mesh: &mut TriMesh, profile: &Profile, start_base: u32, end_base: u32, along: bool) {
    let (polygon, index_map) = profile.cap_polygon();
    let triangles = triangulate_polygon(&polygon);

    for &[a, b, c] in &triangles {
        #[allow(clippy::cast_possible_truncation)]
        let flat = [
            index_map[a as usize] as u32,
            index_map[b as usize] as u32,
            index_map[c as usize] as u32,
        ];

        // The polygon is counterclockwise in (u, v), so following its order
        // yields triangles facing the profile normal. The end cap faces the
        // sweep direction, the start cap faces away from it.
        let (end, start) = if along {
            (
                [end_base + flat[0], end_base + flat[1], end_base + flat[2]],
                [start_base + flat[0], start_base + flat[2], start_base + flat[1]],
            )
        } else {
            (
                [end_base + flat[0], end_base + flat[2], end_base + flat[1]],
                [start_base + flat[0], start_base + flat[1], start_base + flat[2]],
            )
        };
        mesh.faces.push(start);
        mesh.faces.push(end);
    }
}

/// Emit side walls for every ring boundary segment and every consecutive
/// pair of ring blocks.
///
/// `bases` holds (lower, upper) vertex-base pairs, one per wall band. A
/// canonical (low, high) key deduplicates boundary segments so each
/// undirected segment contributes exactly one ribbon.
fn emit_walls(mesh: &mut TriMesh, profile: &Profile, bases: &[(u32, u32)], along: bool) {
    let mut seen: HashSet<(u32, u32)> = HashSet::new();
    let mut flat_offset = 0u32;

    for ring in profile.rings() {
        #[allow(clippy::cast_possible_truncation)]
        let len = ring.len() as u32;
        for i in 0..len {
            let a = flat_offset + i;
            let b = flat_offset + (i + 1) % len;

            let key = if a < b { (a, b) } else { (b, a) };
            if !seen.insert(key) {
                continue;
            }

            for &(lower, upper) in bases {
                let quad = [lower + a, lower + b, upper + b, upper + a];
                let (t0, t1) = split_quad(mesh, quad);
                if along {
                    mesh.faces.push(t0);
                    mesh.faces.push(t1);
                } else {
                    mesh.faces.push([t0[0], t0[2], t0[1]]);
                    mesh.faces.push([t1[0], t1[2], t1[1]]);
                }
            }
        }
        flat_offset += len;
    }
}

/// Split a quad along whichever diagonal gives the larger combined
/// triangle area, which avoids near-zero slivers on twisted panels.
fn split_quad(mesh: &TriMesh, quad: [u32; 4]) -> ([u32; 3], [u32; 3]) {
    let p = |i: u32| mesh.vertices[i as usize].position;
    let area = |a: Point3<f64>, b: Point3<f64>, c: Point3<f64>| (b - a).cross(&(c - a)).norm();

    let [a, b, c, d] = quad;
    let ac = area(p(a), p(b), p(c)) + area(p(a), p(c), p(d));
    let bd = area(p(a), p(b), p(d)) + area(p(b), p(c), p(d));

    if ac >= bd {
        ([a, b, c], [a, c, d])
    } else {
        ([a, b, d], [b, c, d])
    }
}

/// Weld the constructed mesh and verify it closed up; escalate the weld
/// epsilon on failure, bounded, and fall back to the best effort.
fn finalize(mesh: TriMesh, sink: &mut dyn DiagnosticsSink) -> TriMesh {
    let diagonal = mesh.bounds().diagonal();
    let mut epsilon = (diagonal * 1e-6).clamp(1e-7, 1e-4);
    let mut best = None;

    for attempt in 1..=MAX_FINALIZE_ATTEMPTS {
        let (welded, stats) = weld(&mesh, epsilon);
        if is_closed_and_consistent(&welded) {
            info!(
                attempt,
                epsilon,
                merged = stats.vertices_merged,
                "sweep finalized as closed manifold"
            );
            return welded;
        }

        best = Some(welded);
        if attempt < MAX_FINALIZE_ATTEMPTS {
            sink.report(DiagEvent::RetryEscalated { attempt });
            epsilon = (epsilon * 2.0).min(MAX_WELD_EPSILON);
        }
    }

    warn!(
        epsilon,
        "sweep finalization exhausted retries; returning best-effort mesh"
    );
    best.unwrap_or(mesh)
}

/// Closed and consistently wound: every edge has exactly two uses, in
/// opposite directions.
fn is_closed_and_consistent(mesh: &TriMesh) -> bool {
    let table = EdgeUseTable::build(&mesh.faces);
    table.is_closed()
        && table
            .edges()
            .all(|(_, uses)| matches!(uses, [a, b] if a.forward != b.forward))
}
