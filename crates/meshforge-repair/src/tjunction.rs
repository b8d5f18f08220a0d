//! T-junction resolution.
//!
//! A T-junction is a crack where one triangle's edge passes near, but does
//! not connect to, a vertex of an adjacent triangle. Such cracks survive
//! welding because the stray vertex has no counterpart to merge with; the
//! fix is to subdivide the edge at the vertex so both sides share it.
//!
//! Candidate vertices are found with a uniform spatial hash, walking only
//! the grid cells each edge's segment actually passes through, so the
//! search cost stays bounded for long edges.

use hashbrown::HashMap;
use meshforge_types::TriMesh;
use nalgebra::{Point3, Vector3};
use tracing::debug;

/// Slack on the projection parameter: insertion points must lie strictly
/// inside the open interval (0, 1) by at least this much.
const T_SLACK: f64 = 1e-6;

/// Close T-junction cracks by subdividing edges at near-lying vertices.
///
/// For every unique undirected edge, vertices within `line_tolerance` of the
/// open segment are collected (via a spatial hash with cells of
/// `grid_cell_size`) and inserted as subdivision points, provided they also
/// lie within tolerance of at least one plane of a face incident to that
/// edge - this rejects spurious insertions from unrelated nearby geometry.
/// Affected faces are re-triangulated as a fan over their subdivided
/// boundary polygon.
///
/// The output surface is exactly the input surface, only subdivided; no
/// area is added or removed. Returns the new mesh and the number of
/// insertion points applied. Running the resolver again on its own output
/// applies zero further insertions.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
// Truncation: mesh indices are u32, larger meshes are unsupported by design
pub fn resolve_t_junctions(
    mesh: &TriMesh,
    line_tolerance: f64,
    grid_cell_size: f64,
) -> (TriMesh, usize) {
    if mesh.faces.is_empty() || line_tolerance <= 0.0 || grid_cell_size <= 0.0 {
        return (mesh.clone(), 0);
    }

    // Per-face planes (unit normal + offset) for the coplanarity check.
    let planes: Vec<Option<(Vector3<f64>, f64)>> = mesh
        .faces
        .iter()
        .map(|&[a, b, c]| {
            let v0 = mesh.vertices[a as usize].position;
            let v1 = mesh.vertices[b as usize].position;
            let v2 = mesh.vertices[c as usize].position;
            (v1 - v0)
                .cross(&(v2 - v0))
                .try_normalize(f64::EPSILON)
                .map(|n| (n, -n.dot(&v0.coords)))
        })
        .collect();

    // Uniform spatial hash over all vertices.
    let mut grid: HashMap<(i64, i64, i64), Vec<u32>> = HashMap::new();
    for (idx, vertex) in mesh.vertices.iter().enumerate() {
        grid.entry(cell_of(&vertex.position, grid_cell_size))
            .or_default()
            .push(idx as u32);
    }

    // Accepted insertion points per canonical edge, as (t, vertex) with t
    // measured from the smaller-indexed endpoint.
    let table = crate::EdgeUseTable::build(&mesh.faces);
    let mut insertions: HashMap<(u32, u32), Vec<(f64, u32)>> = HashMap::new();
    let mut split_count = 0;

    for ((ea, eb), uses) in table.edges() {
        let pa = mesh.vertices[ea as usize].position;
        let pb = mesh.vertices[eb as usize].position;
        let dir = pb - pa;
        let len_sq = dir.norm_squared();
        if len_sq < f64::EPSILON {
            continue;
        }

        let mut accepted: Vec<(f64, u32)> = Vec::new();

        for cell in cells_along_segment(&pa, &pb, grid_cell_size) {
            let Some(candidates) = grid.get(&cell) else {
                continue;
            };
            for &candidate in candidates {
                if candidate == ea || candidate == eb {
                    continue;
                }

                let p = mesh.vertices[candidate as usize].position;
                let t = (p - pa).dot(&dir) / len_sq;
                if t <= T_SLACK || t >= 1.0 - T_SLACK {
                    continue;
                }

                let perp = (p - pa) - dir * t;
                if perp.norm() > line_tolerance {
                    continue;
                }

                // Must be coplanar with at least one face incident to this
                // edge, otherwise unrelated geometry passing close by would
                // trigger bogus subdivisions.
                let coplanar = uses.iter().any(|u| {
                    planes[u.face]
                        .is_some_and(|(n, d)| (n.dot(&p.coords) + d).abs() <= line_tolerance)
                });
                if !coplanar {
                    continue;
                }

                if !accepted.iter().any(|&(_, v)| v == candidate) {
                    accepted.push((t, candidate));
                }
            }
        }

        if !accepted.is_empty() {
            accepted.sort_by(|a, b| a.0.total_cmp(&b.0));
            split_count += accepted.len();
            insertions.insert((ea, eb), accepted);
        }
    }

    if insertions.is_empty() {
        return (mesh.clone(), 0);
    }

    // Re-triangulate every face that received insertions on any edge: build
    // the ordered boundary polygon and fan from the first original corner.
    let mut result = TriMesh::with_capacity(mesh.vertices.len(), mesh.faces.len());
    result.vertices = mesh.vertices.clone();
    let mut labels = mesh.labels.as_ref().map(|_| Vec::new());

    for (face_idx, &[a, b, c]) in mesh.faces.iter().enumerate() {
        let mut polygon: Vec<u32> = Vec::with_capacity(3);
        for (v0, v1) in [(a, b), (b, c), (c, a)] {
            polygon.push(v0);
            append_edge_points(&insertions, v0, v1, &mut polygon);
        }

        let label = mesh.labels.as_ref().map(|l| l[face_idx]);
        for i in 1..polygon.len() - 1 {
            result.faces.push([polygon[0], polygon[i], polygon[i + 1]]);
            if let (Some(labels), Some(label)) = (labels.as_mut(), label) {
                labels.push(label);
            }
        }
    }

    result.labels = labels;
    debug!(splits = split_count, "t-junction resolution");
    (result, split_count)
}

/// Append the insertion points of directed edge `v0 -> v1` in traversal
/// order.
fn append_edge_points(
    insertions: &HashMap<(u32, u32), Vec<(f64, u32)>>,
    v0: u32,
    v1: u32,
    polygon: &mut Vec<u32>,
) {
    let key = if v0 < v1 { (v0, v1) } else { (v1, v0) };
    let Some(points) = insertions.get(&key) else {
        return;
    };
    if v0 < v1 {
        polygon.extend(points.iter().map(|&(_, v)| v));
    } else {
        polygon.extend(points.iter().rev().map(|&(_, v)| v));
    }
}

/// Grid cell containing a position.
#[inline]
#[allow(clippy::cast_possible_truncation)]
// Truncation: coordinates / cell size are assumed to fit i64 grid cells
fn cell_of(pos: &Point3<f64>, cell_size: f64) -> (i64, i64, i64) {
    (
        (pos.x / cell_size).floor() as i64,
        (pos.y / cell_size).floor() as i64,
        (pos.z / cell_size).floor() as i64,
    )
}

/// Walk the grid cells a segment passes through (3-D DDA).
///
/// Visits each intersected cell exactly once, from the cell containing `a`
/// to the cell containing `b`. Step count is bounded by the Manhattan cell
/// distance, so long edges never degenerate into a full-grid scan.
fn cells_along_segment(a: &Point3<f64>, b: &Point3<f64>, cell_size: f64) -> Vec<(i64, i64, i64)> {
    let start = cell_of(a, cell_size);
    let end = cell_of(b, cell_size);

    let budget = ((end.0 - start.0).abs() + (end.1 - start.1).abs() + (end.2 - start.2).abs())
        as usize
        + 1;
    let mut cells = Vec::with_capacity(budget);
    cells.push(start);

    let dir = b - a;
    let step = (
        i64::from(dir.x > 0.0) - i64::from(dir.x < 0.0),
        i64::from(dir.y > 0.0) - i64::from(dir.y < 0.0),
        i64::from(dir.z > 0.0) - i64::from(dir.z < 0.0),
    );

    // Parametric distance to the first boundary crossing and per-cell
    // increment, per axis.
    let axis_setup = |p: f64, d: f64, cell: i64, s: i64| -> (f64, f64) {
        if s == 0 {
            return (f64::INFINITY, f64::INFINITY);
        }
        let boundary = if s > 0 {
            (cell + 1) as f64 * cell_size
        } else {
            cell as f64 * cell_size
        };
        ((boundary - p) / d, (cell_size / d).abs())
    };

    let (mut t_max_x, t_delta_x) = axis_setup(a.x, dir.x, start.0, step.0);
    let (mut t_max_y, t_delta_y) = axis_setup(a.y, dir.y, start.1, step.1);
    let (mut t_max_z, t_delta_z) = axis_setup(a.z, dir.z, start.2, step.2);

    let mut current = start;
    while current != end && cells.len() <= budget {
        if t_max_x <= t_max_y && t_max_x <= t_max_z {
            current.0 += step.0;
            t_max_x += t_delta_x;
        } else if t_max_y <= t_max_z {
            current.1 += step.1;
            t_max_y += t_delta_y;
        } else {
            current.2 += step.2;
            t_max_z += t_delta_z;
        }
        cells.push(current);
    }

    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshforge_types::{MeshTopology, Vertex};

    /// A rectangle [0,2]x[0,1] above y=0 as two triangles, and two abutting
    /// unit squares below, whose corner vertex at (1,0,0) sits in the middle
    /// of the rectangle's bottom edge - the classic T-junction.
    fn t_junction_mesh() -> TriMesh {
        let mut mesh = TriMesh::new();
        // Rectangle above.
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0)); // 0
        mesh.vertices.push(Vertex::from_coords(2.0, 0.0, 0.0)); // 1
        mesh.vertices.push(Vertex::from_coords(2.0, 1.0, 0.0)); // 2
        mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0)); // 3
        mesh.faces.push([0, 1, 2]);
        mesh.faces.push([0, 2, 3]);
        // Two squares below, split at x=1.
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0)); // 4 - the T vertex
        mesh.vertices.push(Vertex::from_coords(0.0, -1.0, 0.0)); // 5
        mesh.vertices.push(Vertex::from_coords(1.0, -1.0, 0.0)); // 6
        mesh.vertices.push(Vertex::from_coords(2.0, -1.0, 0.0)); // 7
        mesh.faces.push([0, 5, 6]);
        mesh.faces.push([0, 6, 4]);
        mesh.faces.push([4, 6, 7]);
        mesh.faces.push([4, 7, 1]);
        mesh
    }

    #[test]
    fn resolves_classic_t_junction() {
        let mesh = t_junction_mesh();
        let (resolved, splits) = resolve_t_junctions(&mesh, 1e-6, 0.5);

        assert_eq!(splits, 1);
        // The bottom edge of the rectangle belongs to one triangle, which
        // becomes two after subdivision.
        assert_eq!(resolved.face_count(), mesh.face_count() + 1);

        // Edge (0, 4) is now shared by both sides.
        let table = crate::EdgeUseTable::build(&resolved.faces);
        assert_eq!(table.uses_for(0, 4).map(<[crate::EdgeUse]>::len), Some(2));
    }

    #[test]
    fn resolver_is_idempotent() {
        let mesh = t_junction_mesh();
        let (once, _) = resolve_t_junctions(&mesh, 1e-6, 0.5);
        let (_, splits) = resolve_t_junctions(&once, 1e-6, 0.5);
        assert_eq!(splits, 0);
    }

    #[test]
    fn preserves_surface_area() {
        let mesh = t_junction_mesh();
        let (resolved, _) = resolve_t_junctions(&mesh, 1e-6, 0.5);
        assert!((resolved.surface_area() - mesh.surface_area()).abs() < 1e-10);
    }

    #[test]
    fn rejects_off_plane_vertices() {
        // A vertex hovering above the edge, within line tolerance in XY but
        // on no incident face plane.
        let mut mesh = TriMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(2.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 1.0, 0.0));
        mesh.faces.push([0, 1, 2]);
        // Stray vertex near the bottom edge but offset in Z beyond tolerance.
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.5));
        mesh.faces.push([3, 3, 3]); // keep it referenced; degenerate, ignored

        let (_, splits) = resolve_t_junctions(&mesh, 1e-2, 0.5);
        assert_eq!(splits, 0);
    }

    #[test]
    fn rejects_endpoint_parameters() {
        // A vertex coincident with an endpoint must not be inserted.
        let mut mesh = TriMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0)); // dup of 0
        mesh.faces.push([0, 1, 2]);
        mesh.faces.push([3, 1, 2]);

        let (_, splits) = resolve_t_junctions(&mesh, 1e-3, 0.5);
        assert_eq!(splits, 0);
    }

    #[test]
    fn labels_inherited_by_children() {
        let mut mesh = t_junction_mesh();
        mesh.labels = Some(vec![1, 1, 2, 2, 3, 3]);

        let (resolved, _) = resolve_t_junctions(&mesh, 1e-6, 0.5);
        let labels = resolved.labels.as_ref();
        assert!(labels.is_some());
        if let Some(labels) = labels {
            assert_eq!(labels.len(), resolved.face_count());
            // The subdivided rectangle face keeps its provenance label.
            assert_eq!(labels.iter().filter(|&&l| l == 1).count(), 3);
        }
    }

    #[test]
    fn dda_walks_diagonal() {
        let cells = cells_along_segment(
            &Point3::new(0.1, 0.1, 0.0),
            &Point3::new(2.9, 2.9, 0.0),
            1.0,
        );
        assert_eq!(cells.first(), Some(&(0, 0, 0)));
        assert_eq!(cells.last(), Some(&(2, 2, 0)));
        // Never more than the Manhattan cell distance + 1.
        assert!(cells.len() <= 5);
    }

    #[test]
    fn dda_single_cell() {
        let cells = cells_along_segment(
            &Point3::new(0.1, 0.1, 0.1),
            &Point3::new(0.2, 0.2, 0.2),
            1.0,
        );
        assert_eq!(cells, vec![(0, 0, 0)]);
    }
}
