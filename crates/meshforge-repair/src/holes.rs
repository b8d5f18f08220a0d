//! Hole filling.
//!
//! Detects boundary loops and patches each one with triangles. The loop's
//! plane is fit with Newell's method (area-weighted, tolerant of mild
//! non-planarity), points are projected into an in-plane basis, and the
//! resulting polygon is triangulated by constrained ear clipping with a fan
//! fallback so triangulation always terminates.
//!
//! Filling one hole can change which edges are boundary edges for others,
//! so the repair pipeline runs this stage more than once, interleaved with
//! winding normalization.

use meshforge_types::{TriMesh, Vector3};
use tracing::{debug, warn};

use crate::loops::extract_boundary_loops;
use crate::EdgeUseTable;

/// Tolerance for treating a 2-D cross product as collinear.
const COLLINEAR_EPS: f64 = 1e-12;

/// Fill boundary loops with patch triangles.
///
/// Loops with more than `max_hole_edges` edges are left open with a
/// warning; large openings are usually intentional (an open shell) rather
/// than cracks. Returns the patched mesh and the number of loops filled.
/// Patch faces are appended after the original faces; if the mesh carries
/// labels, patch faces get label 0. Loops that cannot be traced (see
/// [`extract_boundary_loops`]) are skipped.
#[must_use]
pub fn fill_holes(mesh: &TriMesh, max_hole_edges: usize) -> (TriMesh, usize) {
    let table = EdgeUseTable::build(&mesh.faces);
    let loops = extract_boundary_loops(&table);

    let mut result = mesh.clone();
    let mut filled = 0;

    for boundary in &loops {
        if !boundary.is_valid() {
            continue;
        }
        if boundary.edge_count() > max_hole_edges {
            warn!(
                edges = boundary.edge_count(),
                max = max_hole_edges,
                "skipping oversized boundary loop"
            );
            continue;
        }

        let points: Vec<_> = boundary
            .vertices
            .iter()
            .map(|&v| mesh.vertices[v as usize].position)
            .collect();

        let Some(normal) = newell_normal(&points) else {
            warn!(
                edges = boundary.edge_count(),
                "degenerate boundary loop, skipping fill"
            );
            continue;
        };
        let (u, v) = plane_basis(&normal);
        let projected: Vec<(f64, f64)> = points
            .iter()
            .map(|p| (p.coords.dot(&u), p.coords.dot(&v)))
            .collect();

        let patch = triangulate_polygon(&projected);
        if patch.is_empty() {
            continue;
        }

        for [a, b, c] in patch {
            result.faces.push([
                boundary.vertices[a as usize],
                boundary.vertices[b as usize],
                boundary.vertices[c as usize],
            ]);
            if let Some(labels) = result.labels.as_mut() {
                labels.push(0);
            }
        }
        filled += 1;
    }

    if filled > 0 {
        debug!(filled, "hole fill pass");
    }

    (result, filled)
}

/// Triangulate a closed 2-D polygon by constrained ear clipping.
///
/// Returned triangles are index triples into `points`, wound the same way
/// the polygon is. At each step the first vertex forming a valid ear (a
/// convex corner whose triangle strictly contains no other remaining
/// vertex) is clipped. Exactly collinear vertices are dropped without
/// emitting a triangle. If no valid ear exists the remainder is fan
/// triangulated from its first vertex, which always terminates; a warning
/// is logged since the output may self-overlap for such polygons.
///
/// Polygons with fewer than 3 points produce no triangles.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
// Truncation: polygon sizes are bounded by mesh vertex counts, which are u32
pub fn triangulate_polygon(points: &[(f64, f64)]) -> Vec<[u32; 3]> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }

    // Polygon orientation decides which cross-product sign means convex.
    let ccw = signed_area_doubled(points) >= 0.0;

    let mut remaining: Vec<u32> = (0..n).map(|i| i as u32).collect();
    let mut triangles = Vec::with_capacity(n - 2);

    'clip: while remaining.len() > 3 {
        for i in 0..remaining.len() {
            let prev = remaining[(i + remaining.len() - 1) % remaining.len()];
            let curr = remaining[i];
            let next = remaining[(i + 1) % remaining.len()];

            let cross = cross2(
                points[prev as usize],
                points[curr as usize],
                points[next as usize],
            );

            // Collinear corner: drop the vertex, no triangle to emit.
            if cross.abs() < COLLINEAR_EPS {
                remaining.remove(i);
                continue 'clip;
            }

            let convex = if ccw { cross > 0.0 } else { cross < 0.0 };
            if !convex {
                continue;
            }

            let blocked = remaining.iter().any(|&other| {
                other != prev
                    && other != curr
                    && other != next
                    && strictly_inside(
                        points[other as usize],
                        points[prev as usize],
                        points[curr as usize],
                        points[next as usize],
                    )
            });
            if blocked {
                continue;
            }

            triangles.push([prev, curr, next]);
            remaining.remove(i);
            continue 'clip;
        }

        // No ear found: fan out the rest.
        warn!(
            remaining = remaining.len(),
            "ear clipping stalled, falling back to fan triangulation"
        );
        for i in 1..remaining.len() - 1 {
            triangles.push([remaining[0], remaining[i], remaining[i + 1]]);
        }
        return triangles;
    }

    if remaining.len() == 3 {
        triangles.push([remaining[0], remaining[1], remaining[2]]);
    }

    triangles
}

/// Twice the signed area of a closed 2-D polygon. Positive when the
/// vertices run counterclockwise.
#[must_use]
pub fn signed_area_doubled(points: &[(f64, f64)]) -> f64 {
    let n = points.len();
    let mut area = 0.0;
    for i in 0..n {
        let (x0, y0) = points[i];
        let (x1, y1) = points[(i + 1) % n];
        area += x0 * y1 - x1 * y0;
    }
    area
}

/// Fit a plane normal to a point loop with Newell's method.
///
/// Returns `None` if the loop is degenerate (all points collinear or
/// coincident).
#[must_use]
pub fn newell_normal(points: &[nalgebra::Point3<f64>]) -> Option<Vector3<f64>> {
    let n = points.len();
    if n < 3 {
        return None;
    }

    let mut normal = Vector3::zeros();
    for i in 0..n {
        let p0 = points[i];
        let p1 = points[(i + 1) % n];
        normal.x += (p0.y - p1.y) * (p0.z + p1.z);
        normal.y += (p0.z - p1.z) * (p0.x + p1.x);
        normal.z += (p0.x - p1.x) * (p0.y + p1.y);
    }

    normal.try_normalize(f64::EPSILON)
}

/// Build an orthonormal in-plane basis `(u, v)` for a unit normal.
#[must_use]
pub fn plane_basis(normal: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    // Pick the world axis least aligned with the normal.
    let axis = if normal.x.abs() <= normal.y.abs() && normal.x.abs() <= normal.z.abs() {
        Vector3::x()
    } else if normal.y.abs() <= normal.z.abs() {
        Vector3::y()
    } else {
        Vector3::z()
    };

    let u = axis.cross(normal).normalize();
    let v = normal.cross(&u);
    (u, v)
}

/// 2-D cross product of `(b - a)` and `(c - b)`.
#[inline]
fn cross2(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    (b.0 - a.0) * (c.1 - b.1) - (b.1 - a.1) * (c.0 - b.0)
}

/// Strict point-in-triangle test; points on an edge do not count.
///
/// Boundary points are excluded so that weakly-simple polygons (bridged
/// hole loops, where a vertex can lie exactly on another edge) still find
/// ears.
fn strictly_inside(p: (f64, f64), a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> bool {
    let d1 = cross2(a, b, p);
    let d2 = cross2(b, c, p);
    let d3 = cross2(c, a, p);
    (d1 > 0.0 && d2 > 0.0 && d3 > 0.0) || (d1 < 0.0 && d2 < 0.0 && d3 < 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshforge_types::{MeshTopology, TriMesh, Vertex};

    fn open_box() -> TriMesh {
        // A unit cube missing its top face.
        let mut mesh = TriMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 1.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 1.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 1.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 1.0, 1.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 1.0));
        mesh.faces.extend([
            [0, 2, 1],
            [0, 3, 2],
            [0, 1, 5],
            [0, 5, 4],
            [1, 2, 6],
            [1, 6, 5],
            [2, 3, 7],
            [2, 7, 6],
            [3, 0, 4],
            [3, 4, 7],
        ]);
        mesh
    }

    #[test]
    fn fills_open_box() {
        let mesh = open_box();
        let (filled, count) = fill_holes(&mesh, 100);

        assert_eq!(count, 1);
        assert_eq!(filled.face_count(), mesh.face_count() + 2);

        let table = EdgeUseTable::build(&filled.faces);
        assert!(table.is_watertight());
    }

    #[test]
    fn closed_mesh_untouched() {
        let mesh = meshforge_types::unit_cube();
        let (filled, count) = fill_holes(&mesh, 100);
        assert_eq!(count, 0);
        assert_eq!(filled.face_count(), mesh.face_count());
    }

    #[test]
    fn oversized_loop_left_open() {
        let mesh = open_box();
        let (filled, count) = fill_holes(&mesh, 3);
        assert_eq!(count, 0);
        assert_eq!(filled.face_count(), mesh.face_count());
    }

    #[test]
    fn patch_faces_get_zero_label() {
        let mut mesh = open_box();
        mesh.labels = Some(vec![5; mesh.face_count()]);

        let (filled, _) = fill_holes(&mesh, 100);
        let labels = filled.labels.as_deref().unwrap_or(&[]);
        assert_eq!(labels.len(), filled.face_count());
        assert_eq!(labels.last(), Some(&0));
    }

    #[test]
    fn triangulate_square() {
        let square = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let triangles = triangulate_polygon(&square);
        assert_eq!(triangles.len(), 2);

        let area: f64 = triangles
            .iter()
            .map(|&[a, b, c]| {
                cross2(square[a as usize], square[b as usize], square[c as usize]).abs() / 2.0
            })
            .sum();
        assert!((area - 1.0).abs() < 1e-12);
    }

    #[test]
    fn triangulate_concave_l_shape() {
        let l_shape = [
            (0.0, 0.0),
            (2.0, 0.0),
            (2.0, 1.0),
            (1.0, 1.0),
            (1.0, 2.0),
            (0.0, 2.0),
        ];
        let triangles = triangulate_polygon(&l_shape);
        assert_eq!(triangles.len(), 4);

        let area: f64 = triangles
            .iter()
            .map(|&[a, b, c]| {
                cross2(
                    l_shape[a as usize],
                    l_shape[b as usize],
                    l_shape[c as usize],
                )
                .abs()
                    / 2.0
            })
            .sum();
        assert!((area - 3.0).abs() < 1e-12);
    }

    #[test]
    fn triangulate_clockwise_polygon() {
        let cw_square = [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)];
        let triangles = triangulate_polygon(&cw_square);
        assert_eq!(triangles.len(), 2);
        // Emitted winding follows the polygon: negative signed area.
        for [a, b, c] in triangles {
            assert!(
                cross2(
                    cw_square[a as usize],
                    cw_square[b as usize],
                    cw_square[c as usize]
                ) < 0.0
            );
        }
    }

    #[test]
    fn collinear_vertex_dropped() {
        // A square with a redundant midpoint on the bottom edge.
        let polygon = [
            (0.0, 0.0),
            (0.5, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 1.0),
        ];
        let triangles = triangulate_polygon(&polygon);
        // The collinear point is filtered, leaving a plain square.
        assert_eq!(triangles.len(), 2);
    }

    #[test]
    fn self_intersecting_polygon_falls_back_to_fan() {
        // Figure-eight outline: a clockwise unit square and a
        // counterclockwise one bridged along y = 0. Net signed area is
        // zero, so orientation detection treats the clockwise half as all
        // reflex and no ear is ever found there.
        let polygon = [
            (0.0, 0.0),
            (0.0, 1.0),
            (1.0, 1.0),
            (1.0, 0.0),
            (2.0, 0.0),
            (3.0, 0.0),
            (3.0, 1.0),
            (2.0, 1.0),
            (2.0, 0.0),
        ];
        let triangles = triangulate_polygon(&polygon);

        // Three ears from the counterclockwise half (two bridge vertices
        // drop as collinear), then a fan over the leftover square.
        assert_eq!(triangles.len(), 5);
        assert_eq!(triangles[3..], [[0, 1, 7], [0, 7, 8]]);
        for [a, b, c] in &triangles {
            assert!(a != b && b != c && a != c);
        }
    }

    #[test]
    fn degenerate_polygon_yields_nothing() {
        assert!(triangulate_polygon(&[(0.0, 0.0), (1.0, 0.0)]).is_empty());
    }

    #[test]
    fn newell_matches_planar_square() {
        let points = [
            nalgebra::Point3::new(0.0, 0.0, 2.0),
            nalgebra::Point3::new(1.0, 0.0, 2.0),
            nalgebra::Point3::new(1.0, 1.0, 2.0),
            nalgebra::Point3::new(0.0, 1.0, 2.0),
        ];
        let normal = newell_normal(&points);
        assert!(normal.is_some());
        if let Some(n) = normal {
            assert!((n - Vector3::z()).norm() < 1e-12);
        }
    }

    #[test]
    fn newell_rejects_collinear_points() {
        let points = [
            nalgebra::Point3::new(0.0, 0.0, 0.0),
            nalgebra::Point3::new(1.0, 0.0, 0.0),
            nalgebra::Point3::new(2.0, 0.0, 0.0),
        ];
        assert!(newell_normal(&points).is_none());
    }

    #[test]
    fn plane_basis_is_orthonormal() {
        let n = Vector3::new(1.0, 2.0, 3.0).normalize();
        let (u, v) = plane_basis(&n);
        assert!((u.norm() - 1.0).abs() < 1e-12);
        assert!((v.norm() - 1.0).abs() < 1e-12);
        assert!(u.dot(&v).abs() < 1e-12);
        assert!(u.dot(&n).abs() < 1e-12);
        assert!(v.dot(&n).abs() < 1e-12);
    }
}
