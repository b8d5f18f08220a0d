//! Sweep path normalization.
//!
//! Raw paths arrive from interactive input and often carry duplicate
//! points, redundant collinear samples, long straight runs, and sharp
//! corners. Frame propagation is only stable over small, evenly sized
//! steps, so path-aligned sweeps resample before framing. Plain translate
//! sweeps keep the path minimal instead: duplicates and exactly collinear
//! interior points are dropped and nothing is subdivided.

use meshforge_types::Aabb;
use nalgebra::Point3;
use tracing::debug;

/// Maximum turn per step, in radians (about 10 degrees). Corners turning
/// more than this get easing samples on both sides.
const MAX_TURN: f64 = 0.175;

/// Fraction of the path's bounding diagonal used as the resample target
/// length.
const TARGET_FRACTION: f64 = 0.01;

/// Normalize a path for a plain translate sweep.
///
/// Drops near-duplicate consecutive points and exactly collinear interior
/// points. No subdivision: a straight two-point path stays two points, so
/// the swept walls are single quads.
#[must_use]
pub fn normalize_translate_path(points: &[Point3<f64>]) -> Vec<Point3<f64>> {
    let deduped = drop_duplicates(points);
    drop_collinear(&deduped)
}

/// Normalize a path for a path-aligned sweep.
///
/// Drops near-duplicate points, subdivides long segments to a target
/// length derived from the path's bounding diagonal, and inserts easing
/// samples around corners that turn more than [`MAX_TURN`], so no single
/// step rotates the frame far enough to destabilize it.
#[must_use]
pub fn normalize_aligned_path(points: &[Point3<f64>]) -> Vec<Point3<f64>> {
    let deduped = drop_duplicates(points);
    if deduped.len() < 2 {
        return deduped;
    }

    let diagonal = Aabb::from_points(deduped.iter()).diagonal();
    let target = diagonal * TARGET_FRACTION;
    if target <= 0.0 {
        return deduped;
    }

    let eased = ease_corners(&deduped, target);
    let resampled = subdivide(&eased, target);

    debug!(
        input = points.len(),
        output = resampled.len(),
        target,
        "normalized sweep path"
    );
    resampled
}

/// Remove consecutive points closer than a hair above coincident.
fn drop_duplicates(points: &[Point3<f64>]) -> Vec<Point3<f64>> {
    let mut out: Vec<Point3<f64>> = Vec::with_capacity(points.len());
    for &p in points {
        if out
            .last()
            .is_none_or(|last| (p - last).norm_squared() > 1e-18)
        {
            out.push(p);
        }
    }
    out
}

/// Remove interior points that are exactly collinear with their neighbors.
fn drop_collinear(points: &[Point3<f64>]) -> Vec<Point3<f64>> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut out = vec![points[0]];
    for i in 1..points.len() - 1 {
        let a = points[i] - out[out.len() - 1];
        let b = points[i + 1] - points[i];
        if a.cross(&b).norm_squared() > 0.0 {
            out.push(points[i]);
        }
    }
    out.push(points[points.len() - 1]);
    out
}

/// Insert easing samples on both sides of corners sharper than [`MAX_TURN`].
fn ease_corners(points: &[Point3<f64>], target: f64) -> Vec<Point3<f64>> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut out = vec![points[0]];
    for i in 1..points.len() - 1 {
        let incoming = points[i] - points[i - 1];
        let outgoing = points[i + 1] - points[i];
        let turn = incoming.angle(&outgoing);

        if turn > MAX_TURN {
            // One sample shortly before and after the corner. The offset is
            // capped at a quarter of each adjacent segment so easing never
            // crosses a neighboring corner.
            let before = (target * 0.5).min(incoming.norm() * 0.25);
            let after = (target * 0.5).min(outgoing.norm() * 0.25);
            if let Some(dir) = incoming.try_normalize(f64::EPSILON) {
                out.push(points[i] - dir * before);
            }
            out.push(points[i]);
            if let Some(dir) = outgoing.try_normalize(f64::EPSILON) {
                out.push(points[i] + dir * after);
            }
        } else {
            out.push(points[i]);
        }
    }
    out.push(points[points.len() - 1]);
    out
}

/// Split every segment longer than `target` into equal pieces.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
// Truncation: piece counts are small positive integers by construction
fn subdivide(points: &[Point3<f64>], target: f64) -> Vec<Point3<f64>> {
    let mut out = Vec::with_capacity(points.len());
    for pair in points.windows(2) {
        let [a, b] = pair else { continue };
        out.push(*a);

        let length = (b - a).norm();
        if length > target {
            let pieces = (length / target).ceil() as usize;
            for k in 1..pieces {
                let t = k as f64 / pieces as f64;
                out.push(a + (b - a) * t);
            }
        }
    }
    if let Some(last) = points.last() {
        out.push(*last);
    }
    out
}
