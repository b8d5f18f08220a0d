//! Quantization-based vertex welding.

use hashbrown::HashMap;
use meshforge_types::{TriMesh, Vertex};
use nalgebra::{Point3, Vector3};
use tracing::debug;

/// Faces whose post-merge area falls below this are dropped as degenerate.
const MIN_FACE_AREA: f64 = 1e-12;

/// Counters describing what a weld pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeldStats {
    /// Number of vertices merged away.
    pub vertices_merged: usize,
    /// Number of faces dropped because they became degenerate.
    pub faces_dropped: usize,
}

/// Weld vertices by quantizing positions to a grid of `epsilon`.
///
/// Each coordinate is rounded to the nearest multiple of `epsilon`; vertices
/// sharing a quantized key are merged into one vertex at the **average** of
/// the group's positions (not a representative pick, which would bias the
/// result toward insertion order). Vertex `uv` attributes are averaged the
/// same way, over the group members that carry one. Faces are remapped
/// through the merge; faces that end up with a repeated index or near-zero
/// area are dropped. Per-vertex normals are recomputed on the result.
///
/// Welding an already-welded mesh with the same epsilon changes nothing.
///
/// A non-positive or non-finite `epsilon` disables welding and returns a
/// plain copy.
///
/// # Example
///
/// ```
/// use meshforge_types::{TriMesh, Vertex, MeshTopology};
/// use meshforge_repair::weld;
///
/// let mut mesh = TriMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0001, 0.0, 0.0)); // near vertex 1
/// mesh.faces.push([0, 1, 2]);
/// mesh.faces.push([0, 3, 2]);
///
/// let (welded, stats) = weld(&mesh, 0.001);
/// assert_eq!(stats.vertices_merged, 1);
/// assert_eq!(welded.vertex_count(), 3);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation)]
// Truncation: mesh indices are u32, larger meshes are unsupported by design
pub fn weld(mesh: &TriMesh, epsilon: f64) -> (TriMesh, WeldStats) {
    if mesh.vertices.is_empty() || epsilon <= 0.0 || !epsilon.is_finite() {
        return (mesh.clone(), WeldStats::default());
    }

    // Group vertices by quantized position, in first-seen order.
    let mut groups: HashMap<(i64, i64, i64), u32> = HashMap::new();
    let mut group_of = Vec::with_capacity(mesh.vertices.len());
    let mut sums: Vec<(Vector3<f64>, usize)> = Vec::new();
    let mut uv_sums: Vec<((f64, f64), usize)> = Vec::new();

    for vertex in &mesh.vertices {
        let key = quantize(&vertex.position, epsilon);
        let group = *groups.entry(key).or_insert_with(|| {
            sums.push((Vector3::zeros(), 0));
            uv_sums.push(((0.0, 0.0), 0));
            (sums.len() - 1) as u32
        });
        let (sum, count) = &mut sums[group as usize];
        *sum += vertex.position.coords;
        *count += 1;
        if let Some((u, v)) = vertex.uv() {
            let (uv, uv_count) = &mut uv_sums[group as usize];
            uv.0 += u;
            uv.1 += v;
            *uv_count += 1;
        }
        group_of.push(group);
    }

    let merged_positions: Vec<Point3<f64>> = sums
        .iter()
        .map(|&(sum, count)| Point3::from(sum / count as f64))
        .collect();
    let merged_uvs: Vec<Option<(f64, f64)>> = uv_sums
        .iter()
        .map(|&((u, v), count)| (count > 0).then(|| (u / count as f64, v / count as f64)))
        .collect();

    // Remap faces through the merge, dropping degenerates.
    let mut faces = Vec::with_capacity(mesh.faces.len());
    let mut labels = mesh.labels.as_ref().map(|_| Vec::with_capacity(mesh.faces.len()));
    let mut faces_dropped = 0;

    for (face_idx, &[a, b, c]) in mesh.faces.iter().enumerate() {
        let f = [
            group_of[a as usize],
            group_of[b as usize],
            group_of[c as usize],
        ];
        if f[0] == f[1] || f[1] == f[2] || f[0] == f[2] {
            faces_dropped += 1;
            continue;
        }

        let v0 = merged_positions[f[0] as usize];
        let v1 = merged_positions[f[1] as usize];
        let v2 = merged_positions[f[2] as usize];
        let area = (v1 - v0).cross(&(v2 - v0)).norm() * 0.5;
        if area < MIN_FACE_AREA {
            faces_dropped += 1;
            continue;
        }

        faces.push(f);
        if let (Some(labels), Some(src)) = (labels.as_mut(), mesh.labels.as_ref()) {
            labels.push(src[face_idx]);
        }
    }

    // Compact away merged vertices no surviving face references.
    let mut remap = vec![u32::MAX; merged_positions.len()];
    let mut vertices = Vec::new();
    for face in &mut faces {
        for index in face {
            if remap[*index as usize] == u32::MAX {
                remap[*index as usize] = vertices.len() as u32;
                let mut vertex = Vertex::new(merged_positions[*index as usize]);
                vertex.attributes.uv = merged_uvs[*index as usize];
                vertices.push(vertex);
            }
            *index = remap[*index as usize];
        }
    }

    let stats = WeldStats {
        vertices_merged: mesh.vertices.len() - merged_positions.len(),
        faces_dropped,
    };

    if stats != WeldStats::default() {
        debug!(
            merged = stats.vertices_merged,
            dropped = stats.faces_dropped,
            "weld pass"
        );
    }

    let mut welded = TriMesh {
        vertices,
        faces,
        labels,
    };
    welded.recompute_normals();

    (welded, stats)
}

/// Quantize a position by rounding each coordinate to the nearest multiple
/// of `epsilon`.
#[inline]
#[allow(clippy::cast_possible_truncation)]
// Truncation: coordinates / epsilon are assumed to fit i64 grid cells
fn quantize(pos: &Point3<f64>, epsilon: f64) -> (i64, i64, i64) {
    (
        (pos.x / epsilon).round() as i64,
        (pos.y / epsilon).round() as i64,
        (pos.z / epsilon).round() as i64,
    )
}
