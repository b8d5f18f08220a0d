//! Frame propagation along sweep paths.
//!
//! Each path sample gets an orthonormal frame whose Z axis is the local
//! tangent. The in-plane X axis comes from projecting one persistent
//! reference direction onto the tangent-orthogonal plane at every sample,
//! rather than from incremental transport alone; combined with a sign rule
//! that favors continuity, this keeps the axis from flipping across
//! inflection points on paths that bend back on themselves.

use nalgebra::{Point3, Vector3};

/// An orthonormal frame at one path sample.
///
/// `x`, `y`, `z` are mutually orthogonal unit vectors with `x x y = z`;
/// `z` is the path tangent. Profile points with local coordinates (u, v)
/// are placed at `origin + u*x + v*y`.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    /// The path sample this frame is attached to.
    pub origin: Point3<f64>,
    /// In-plane axis carrying the profile's u direction.
    pub x: Vector3<f64>,
    /// In-plane axis carrying the profile's v direction.
    pub y: Vector3<f64>,
    /// Path tangent.
    pub z: Vector3<f64>,
}

impl Frame {
    /// Rotate the in-plane axes around the tangent.
    #[must_use]
    pub fn rotated_around_tangent(&self, angle: f64) -> Self {
        let (sin_a, cos_a) = angle.sin_cos();
        Self {
            origin: self.origin,
            x: self.x * cos_a + self.y * sin_a,
            y: self.y * cos_a - self.x * sin_a,
            z: self.z,
        }
    }

    /// Place a local (u, v) coordinate in world space.
    #[must_use]
    pub fn place(&self, u: f64, v: f64) -> Point3<f64> {
        self.origin + self.x * u + self.y * v
    }
}

/// Compute one frame per path sample.
///
/// The tangent at a sample is the normalized average of its adjacent
/// segment directions (one-sided at the ends). The X axis is `reference`
/// projected onto each tangent-orthogonal plane; where the projection
/// degenerates (tangent parallel to the reference) the previous frame's X
/// is projected instead. The sign of X is chosen to agree with both the
/// previous frame and the reference, weighted toward the previous frame.
///
/// After propagation every frame is rotated by the fixed angle that aligns
/// frame 0's X exactly with the reference's projection at the first sample,
/// so the profile's own basis maps onto frame 0 without residual twist.
///
/// Paths with fewer than 2 samples produce no frames.
#[must_use]
pub fn propagate_frames(path: &[Point3<f64>], reference: &Vector3<f64>) -> Vec<Frame> {
    if path.len() < 2 {
        return Vec::new();
    }

    let mut frames: Vec<Frame> = Vec::with_capacity(path.len());

    for (i, &origin) in path.iter().enumerate() {
        let tangent = tangent_at(path, i)
            .or_else(|| frames.last().map(|f| f.z))
            .unwrap_or_else(Vector3::z);

        let mut x = project_onto_plane(reference, &tangent)
            .or_else(|| {
                frames
                    .last()
                    .and_then(|f| project_onto_plane(&f.x, &tangent))
            })
            .unwrap_or_else(|| fallback_perpendicular(&tangent));

        // Continuity: previous frame dominates, the reference breaks ties
        // so long straight runs cannot drift away from the profile basis.
        let score = frames.last().map_or(0.0, |f| x.dot(&f.x)) + 0.5 * x.dot(reference);
        if score < 0.0 {
            x = -x;
        }

        let y = tangent.cross(&x);
        frames.push(Frame {
            origin,
            x,
            y,
            z: tangent,
        });
    }

    // Bias rotation: align frame 0 with the reference exactly.
    if let Some(target) = project_onto_plane(reference, &frames[0].z) {
        let first = frames[0];
        let angle = first
            .y
            .dot(&target)
            .atan2(first.x.dot(&target));
        if angle.abs() > f64::EPSILON {
            for frame in &mut frames {
                *frame = frame.rotated_around_tangent(angle);
            }
        }
    }

    frames
}

/// Tangent at sample `i`: normalized average of adjacent directions.
fn tangent_at(path: &[Point3<f64>], i: usize) -> Option<Vector3<f64>> {
    let incoming = (i > 0).then(|| path[i] - path[i - 1]);
    let outgoing = (i + 1 < path.len()).then(|| path[i + 1] - path[i]);

    let combined = match (incoming, outgoing) {
        (Some(a), Some(b)) => {
            a.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros)
                + b.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros)
        }
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };

    combined.try_normalize(f64::EPSILON)
}

/// Project `v` onto the plane orthogonal to unit `n`; `None` if the
/// projection degenerates.
fn project_onto_plane(v: &Vector3<f64>, n: &Vector3<f64>) -> Option<Vector3<f64>> {
    (v - n * v.dot(n)).try_normalize(1e-9)
}

/// Any unit vector perpendicular to `v`.
fn fallback_perpendicular(v: &Vector3<f64>) -> Vector3<f64> {
    let axis = if v.x.abs() <= v.y.abs() && v.x.abs() <= v.z.abs() {
        Vector3::x()
    } else if v.y.abs() <= v.z.abs() {
        Vector3::y()
    } else {
        Vector3::z()
    };
    v.cross(&axis)
        .try_normalize(f64::EPSILON)
        .unwrap_or_else(Vector3::y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_orthonormal(frame: &Frame) {
        assert_relative_eq!(frame.x.norm(), 1.0, epsilon = 1e-10);
        assert_relative_eq!(frame.y.norm(), 1.0, epsilon = 1e-10);
        assert_relative_eq!(frame.z.norm(), 1.0, epsilon = 1e-10);
        assert_relative_eq!(frame.x.dot(&frame.y), 0.0, epsilon = 1e-10);
        assert_relative_eq!(frame.x.dot(&frame.z), 0.0, epsilon = 1e-10);
        assert_relative_eq!(frame.y.dot(&frame.z), 0.0, epsilon = 1e-10);
        assert_relative_eq!((frame.x.cross(&frame.y) - frame.z).norm(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn straight_path_keeps_reference_axis() {
        let path = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 2.0),
        ];
        let frames = propagate_frames(&path, &Vector3::x());

        assert_eq!(frames.len(), 3);
        for frame in &frames {
            assert_orthonormal(frame);
            assert_relative_eq!((frame.x - Vector3::x()).norm(), 0.0, epsilon = 1e-10);
            assert_relative_eq!((frame.z - Vector3::z()).norm(), 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn first_frame_aligns_with_reference() {
        let path = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.5, 2.0),
        ];
        let frames = propagate_frames(&path, &Vector3::x());

        // The bias rotation pins frame 0's x to the reference projection.
        assert_relative_eq!(frames[0].x.dot(&Vector3::x()), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn frames_stay_continuous_through_a_kink() {
        // Straight run along +Z, then a sharp turn toward +Y.
        let mut path: Vec<Point3<f64>> = (0..8)
            .map(|i| Point3::new(0.0, 0.0, f64::from(i) * 0.5))
            .collect();
        for i in 1..6 {
            path.push(Point3::new(0.0, f64::from(i) * 0.5, 3.5 + f64::from(i) * 0.25));
        }

        let frames = propagate_frames(&path, &Vector3::x());
        assert_eq!(frames.len(), path.len());

        for frame in &frames {
            assert_orthonormal(frame);
        }
        // No axis flip anywhere along the path.
        for pair in frames.windows(2) {
            assert!(pair[0].x.dot(&pair[1].x) > 0.5);
        }
    }

    #[test]
    fn reference_parallel_to_tangent_falls_back() {
        // Tangent +Z with reference also +Z: projection degenerates, the
        // frame must still be orthonormal.
        let path = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 1.0)];
        let frames = propagate_frames(&path, &Vector3::z());

        assert_eq!(frames.len(), 2);
        for frame in &frames {
            assert_orthonormal(frame);
        }
    }

    #[test]
    fn placement_uses_in_plane_axes() {
        let path = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 2.0)];
        let frames = propagate_frames(&path, &Vector3::x());

        let placed = frames[0].place(1.0, 2.0);
        assert_relative_eq!(
            (placed - Point3::new(1.0, 2.0, 0.0)).norm(),
            0.0,
            epsilon = 1e-10
        );
    }

    #[test]
    fn short_path_produces_no_frames() {
        assert!(propagate_frames(&[Point3::origin()], &Vector3::x()).is_empty());
        assert!(propagate_frames(&[], &Vector3::x()).is_empty());
    }

    #[test]
    fn rotation_preserves_orthonormality() {
        let path = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 1.0)];
        let frames = propagate_frames(&path, &Vector3::x());
        let rotated = frames[0].rotated_around_tangent(1.0);
        assert_orthonormal(&rotated);
    }
}
