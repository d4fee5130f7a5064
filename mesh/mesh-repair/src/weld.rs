//! Vertex welding and index cleanup for indexed meshes.

#![allow(clippy::cast_possible_truncation)] // u32 vertex indices

use hashbrown::{HashMap, HashSet};
use mesh_types::{IndexedMesh, MeshBuffers, MeshTopology, Vertex};
use nalgebra::Point3;

use crate::graph::{PositionKey, precision_scale, quantize};

/// Weld exchange buffers into an [`IndexedMesh`].
///
/// Slots whose positions agree at `precision` decimal places become one
/// vertex at the position of the first such slot. Triangles that collapse
/// onto fewer than three distinct vertices are dropped. Works for soups and
/// for indexed buffers with duplicated slots alike.
///
/// # Example
///
/// ```
/// use mesh_repair::weld_buffers;
/// use mesh_types::MeshBuffers;
///
/// let soup = MeshBuffers::soup(vec![
///     0.0, 0.0, 0.0,  1.0, 0.0, 0.0,  1.0, 1.0, 0.0,
///     0.0, 0.0, 0.0,  1.0, 1.0, 0.0,  0.0, 1.0, 0.0,
/// ]);
/// let mesh = weld_buffers(&soup, 6);
///
/// assert_eq!(mesh.vertices.len(), 4);
/// assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);
/// ```
#[must_use]
pub fn weld_buffers(mesh: &MeshBuffers, precision: u32) -> IndexedMesh {
    let scale = precision_scale(precision);
    let mut keys: HashMap<PositionKey, u32> = HashMap::with_capacity(mesh.vertex_count() / 2);
    let mut vertices = Vec::new();
    let mut remap = Vec::with_capacity(mesh.vertex_count());

    for slot in 0..mesh.vertex_count() {
        let position = mesh.position(slot);
        let id = *keys.entry(quantize(&position, scale)).or_insert_with(|| {
            vertices.push(Vertex::new(position));
            (vertices.len() - 1) as u32
        });
        remap.push(id);
    }

    let faces = (0..mesh.face_count())
        .map(|face| mesh.corners(face).map(|s| remap[s as usize]))
        .filter(|&[a, b, c]| a != b && b != c && a != c)
        .collect();

    IndexedMesh::from_parts(vertices, faces)
}

/// Weld vertices closer than `epsilon` to each other.
///
/// Uses a spatial hash with cells of `2 * epsilon` and checks the 3x3x3
/// neighborhood of each vertex. Merged vertices take the lowest index among
/// them; faces that collapse are removed. Vertices are not compacted; call
/// [`remove_unreferenced_vertices`] afterwards.
///
/// Returns the number of vertices merged away.
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, Vertex};
/// use mesh_repair::weld_vertices;
///
/// let mut mesh = IndexedMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 1e-9));
/// mesh.faces.push([0, 1, 2]);
/// mesh.faces.push([3, 2, 0]);
///
/// assert_eq!(weld_vertices(&mut mesh, 1e-6), 1);
/// assert_eq!(mesh.faces[1], [1, 2, 0]);
/// ```
pub fn weld_vertices(mesh: &mut IndexedMesh, epsilon: f64) -> usize {
    if mesh.vertices.is_empty() || epsilon <= 0.0 {
        return 0;
    }

    let cell_size = epsilon * 2.0;
    let mut spatial_hash: HashMap<(i64, i64, i64), Vec<u32>> = HashMap::new();
    for (idx, vertex) in mesh.vertices.iter().enumerate() {
        let cell = pos_to_cell(&vertex.position, cell_size);
        spatial_hash.entry(cell).or_default().push(idx as u32);
    }

    let mut remap: Vec<u32> = (0..mesh.vertices.len() as u32).collect();
    let mut merged = 0;

    for (idx, vertex) in mesh.vertices.iter().enumerate() {
        let idx = idx as u32;
        if remap[idx as usize] != idx {
            continue;
        }

        let (cx, cy, cz) = pos_to_cell(&vertex.position, cell_size);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(candidates) = spatial_hash.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &other in candidates {
                        if other <= idx || remap[other as usize] != other {
                            continue;
                        }
                        let dist = (vertex.position - mesh.vertices[other as usize].position).norm();
                        if dist < epsilon {
                            remap[other as usize] = idx;
                            merged += 1;
                        }
                    }
                }
            }
        }
    }

    if merged == 0 {
        return 0;
    }

    for face in &mut mesh.faces {
        *face = face.map(|v| remap[v as usize]);
    }
    mesh.faces
        .retain(|&[a, b, c]| a != b && b != c && a != c);

    merged
}

#[inline]
fn pos_to_cell(pos: &Point3<f64>, cell_size: f64) -> (i64, i64, i64) {
    (
        (pos.x / cell_size).floor() as i64,
        (pos.y / cell_size).floor() as i64,
        (pos.z / cell_size).floor() as i64,
    )
}

/// Drop vertices no face references, keeping the rest in order.
///
/// Returns the number of vertices removed.
pub fn remove_unreferenced_vertices(mesh: &mut IndexedMesh) -> usize {
    let original = mesh.vertices.len();
    let mut used = vec![false; original];
    for face in &mesh.faces {
        for &v in face {
            used[v as usize] = true;
        }
    }
    if used.iter().all(|&u| u) {
        return 0;
    }

    let mut remap = vec![u32::MAX; original];
    let mut vertices = Vec::with_capacity(original);
    for (idx, vertex) in mesh.vertices.drain(..).enumerate() {
        if used[idx] {
            remap[idx] = vertices.len() as u32;
            vertices.push(vertex);
        }
    }
    for face in &mut mesh.faces {
        *face = face.map(|v| remap[v as usize]);
    }
    mesh.vertices = vertices;

    original - mesh.vertices.len()
}

/// Remove faces that repeat another face's vertices, in either winding.
///
/// Returns the number of faces removed.
pub fn remove_duplicate_faces(mesh: &mut IndexedMesh) -> usize {
    let original = mesh.faces.len();
    let mut seen: HashSet<[u32; 3]> = HashSet::with_capacity(original);
    mesh.faces.retain(|face| {
        let mut key = *face;
        key.sort_unstable();
        seen.insert(key)
    });
    original - mesh.faces.len()
}

/// Remove faces below the degenerate threshold (squared cross length).
///
/// Returns the number of faces removed.
pub fn remove_degenerate_faces(mesh: &mut IndexedMesh, epsilon: f64) -> usize {
    let original = mesh.faces.len();
    let vertices = &mesh.vertices;
    mesh.faces.retain(|&[a, b, c]| {
        let e1 = vertices[b as usize].position - vertices[a as usize].position;
        let e2 = vertices[c as usize].position - vertices[a as usize].position;
        e1.cross(&e2).norm_squared() >= epsilon
    });
    original - mesh.faces.len()
}
