//! Sweep profiles.
//!
//! A profile is one outer boundary ring plus zero or more hole rings, all
//! in world space. On construction the profile fits a plane (Newell), picks
//! an in-plane basis, and fixes every ring point's local (u, v) coordinates
//! relative to an anchor point. Those local coordinates are the single
//! source of truth for vertex placement during sweeping: caps and side
//! walls reconstruct the same 3-D point from the same (u, v), which is what
//! makes the final solid weldable into a closed surface.

use meshforge_repair::holes::{newell_normal, plane_basis, signed_area_doubled};
use nalgebra::{Point3, Vector3};

use crate::error::{SweepError, SweepResult};

/// A planar profile: outer ring plus hole rings.
///
/// Ring windings are canonicalized on construction: the outer ring runs
/// counterclockwise in the profile's (u, v) basis and holes run clockwise,
/// so downstream triangulation and wall emission never have to branch on
/// the caller's input order.
#[derive(Debug, Clone)]
pub struct Profile {
    rings: Vec<Vec<Point3<f64>>>,
    uv_rings: Option<Vec<Vec<(f64, f64)>>>,
    normal: Vector3<f64>,
    u: Vector3<f64>,
    v: Vector3<f64>,
    anchor: Point3<f64>,
}

impl Profile {
    /// Build a profile from an outer ring and optional hole rings.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::TooFewRingPoints`] if any ring has fewer than
    /// 3 points, and [`SweepError::DegenerateProfile`] if the outer ring's
    /// points do not span a plane.
    pub fn new(outer: Vec<Point3<f64>>, holes: Vec<Vec<Point3<f64>>>) -> SweepResult<Self> {
        if outer.len() < 3 {
            return Err(SweepError::TooFewRingPoints {
                min: 3,
                actual: outer.len(),
            });
        }
        for hole in &holes {
            if hole.len() < 3 {
                return Err(SweepError::TooFewRingPoints {
                    min: 3,
                    actual: hole.len(),
                });
            }
        }

        let normal = newell_normal(&outer).ok_or(SweepError::DegenerateProfile)?;
        let (u, v) = plane_basis(&normal);
        let anchor = outer[0];

        let mut profile = Self {
            rings: std::iter::once(outer).chain(holes).collect(),
            uv_rings: None,
            normal,
            u,
            v,
            anchor,
        };
        profile.canonicalize_windings();
        Ok(profile)
    }

    /// Supply a precomputed 2-D parameterization for cap triangulation.
    ///
    /// One (u, v) ring per geometry ring, same lengths and order. Vertex
    /// placement still uses the profile's own basis; the supplied rings
    /// only replace the projected coordinates handed to the triangulator,
    /// for profiles whose own projection is poorly conditioned.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::TooFewRingPoints`] if the ring counts or
    /// lengths do not match the geometry.
    pub fn with_uv_rings(mut self, uv_rings: Vec<Vec<(f64, f64)>>) -> SweepResult<Self> {
        if uv_rings.len() != self.rings.len() {
            return Err(SweepError::TooFewRingPoints {
                min: self.rings.len(),
                actual: uv_rings.len(),
            });
        }
        for (ring, uvs) in self.rings.iter().zip(&uv_rings) {
            if ring.len() != uvs.len() {
                return Err(SweepError::TooFewRingPoints {
                    min: ring.len(),
                    actual: uvs.len(),
                });
            }
        }
        self.uv_rings = Some(uv_rings);
        Ok(self)
    }

    /// The fitted plane normal.
    #[must_use]
    pub fn normal(&self) -> Vector3<f64> {
        self.normal
    }

    /// The in-plane basis `(u, v)`; `u x v` equals the normal.
    #[must_use]
    pub fn basis(&self) -> (Vector3<f64>, Vector3<f64>) {
        (self.u, self.v)
    }

    /// The anchor all local coordinates are measured from.
    #[must_use]
    pub fn anchor(&self) -> Point3<f64> {
        self.anchor
    }

    /// All rings, outer first.
    #[must_use]
    pub fn rings(&self) -> &[Vec<Point3<f64>>] {
        &self.rings
    }

    /// Total point count across all rings.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.rings.iter().map(Vec::len).sum()
    }

    /// Re-anchor to the outer-ring point nearest `target`.
    ///
    /// Called by the sweep builder with the path start, so local
    /// coordinates stay small and the frame bias has a stable reference.
    pub fn anchor_to(&mut self, target: &Point3<f64>) {
        let nearest = self.rings[0]
            .iter()
            .min_by(|a, b| {
                let da = (*a - target).norm_squared();
                let db = (*b - target).norm_squared();
                da.total_cmp(&db)
            })
            .copied();
        if let Some(p) = nearest {
            self.anchor = p;
        }
    }

    /// Local (u, v) of a world point.
    #[must_use]
    pub fn local_uv(&self, p: &Point3<f64>) -> (f64, f64) {
        let d = p - self.anchor;
        (d.dot(&self.u), d.dot(&self.v))
    }

    /// Local coordinates of every ring point, outer ring first.
    #[must_use]
    pub fn ring_uvs(&self) -> Vec<Vec<(f64, f64)>> {
        self.rings
            .iter()
            .map(|ring| ring.iter().map(|p| self.local_uv(p)).collect())
            .collect()
    }

    /// Build the single polygon handed to the cap triangulator.
    ///
    /// Holes are bridged into the outer ring by splicing each hole at the
    /// closest outer/hole vertex pair, yielding a weakly-simple polygon.
    /// Returns the polygon's (u, v) points paired with a map from polygon
    /// index to flat ring-point index (outer points first, then each hole
    /// in order), since bridge vertices appear twice.
    #[must_use]
    pub fn cap_polygon(&self) -> (Vec<(f64, f64)>, Vec<usize>) {
        let uv_rings = match &self.uv_rings {
            Some(rings) => rings.clone(),
            None => self.ring_uvs(),
        };

        // Flat indices per ring.
        let mut offsets = Vec::with_capacity(self.rings.len());
        let mut offset = 0;
        for ring in &self.rings {
            offsets.push(offset);
            offset += ring.len();
        }

        let mut polygon: Vec<((f64, f64), usize)> = uv_rings[0]
            .iter()
            .enumerate()
            .map(|(i, &uv)| (uv, i))
            .collect();

        for (ring_idx, hole) in uv_rings.iter().enumerate().skip(1) {
            let base = offsets[ring_idx];

            // Closest pair between the current polygon and this hole.
            let mut best = (0usize, 0usize, f64::INFINITY);
            for (pi, &(puv, _)) in polygon.iter().enumerate() {
                for (hi, &huv) in hole.iter().enumerate() {
                    let d = (puv.0 - huv.0).powi(2) + (puv.1 - huv.1).powi(2);
                    if d < best.2 {
                        best = (pi, hi, d);
                    }
                }
            }
            let (pi, hi, _) = best;

            // Splice: ... P[pi], H[hi], H[hi+1], ..., H[hi-1], H[hi], P[pi], ...
            let mut bridged = Vec::with_capacity(polygon.len() + hole.len() + 2);
            bridged.extend_from_slice(&polygon[..=pi]);
            for k in 0..=hole.len() {
                let idx = (hi + k) % hole.len();
                bridged.push((hole[idx], base + idx));
            }
            bridged.extend_from_slice(&polygon[pi..]);
            polygon = bridged;
        }

        polygon.into_iter().unzip()
    }

    /// Make the outer ring counterclockwise and holes clockwise in (u, v).
    fn canonicalize_windings(&mut self) {
        let uvs = self.ring_uvs();
        for (ring_idx, ring_uv) in uvs.iter().enumerate() {
            let area = signed_area_doubled(ring_uv);
            let want_ccw = ring_idx == 0;
            if (area < 0.0) == want_ccw {
                self.rings[ring_idx].reverse();
            }
        }
    }
}
