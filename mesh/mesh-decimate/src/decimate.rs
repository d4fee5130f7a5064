//! Core mesh decimation algorithm.
//!
//! Implements edge collapse with quadric error metrics (QEM). Candidates live
//! in a min-heap; each vertex carries a stamp that is bumped whenever its
//! position or quadric changes, so stale heap entries are skipped on pop.

// Mesh indices and counts don't overflow in practice
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hashbrown::{HashMap, HashSet};
use mesh_repair::MeshAdjacency;
use mesh_types::{IndexedMesh, MeshTopology, Point3, Triangle, Vector3};
use tracing::{debug, info};

use crate::params::DecimateParams;
use crate::quadric::Quadric;
use crate::result::DecimationResult;

/// An edge collapse candidate in the priority queue.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    cost: f64,
    /// Surviving vertex.
    keep: u32,
    /// Vertex merged into `keep`.
    remove: u32,
    /// Vertex stamps at the time the candidate was priced.
    stamps: (u32, u32),
    target: Point3<f64>,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behavior; vertex ids break ties.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| (other.keep, other.remove).cmp(&(self.keep, self.remove)))
    }
}

/// Why a popped candidate was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Link,
    Flip,
    Error,
}

/// Decimate a mesh using edge collapse with quadric error metrics.
///
/// The input is never modified. Surviving faces keep their relative order
/// and only referenced vertices are emitted.
///
/// # Example
///
/// ```
/// use mesh_types::unit_cube;
/// use mesh_decimate::{decimate_mesh, DecimateParams};
///
/// let cube = unit_cube();
/// let result = decimate_mesh(&cube, &DecimateParams::with_target_ratio(0.5));
/// assert!(result.final_triangles <= 12);
/// ```
#[must_use]
pub fn decimate_mesh(mesh: &IndexedMesh, params: &DecimateParams) -> DecimationResult {
    let original_triangles = mesh.faces.len();
    let target = params
        .target_triangles
        .unwrap_or_else(|| ((original_triangles as f64) * params.target_ratio).ceil() as usize);

    if original_triangles == 0 || original_triangles <= target {
        return DecimationResult {
            mesh: mesh.clone(),
            original_triangles,
            final_triangles: original_triangles,
            collapses_performed: 0,
            collapses_rejected: 0,
        };
    }

    info!(
        original = original_triangles,
        target = target,
        "Starting mesh decimation"
    );

    let mut collapser = Collapser::new(mesh, params);
    let mut heap = collapser.initial_queue();
    let mut performed = 0usize;
    let mut rejected = [0usize; 3];

    while collapser.active_faces > target {
        let Some(candidate) = heap.pop() else {
            break;
        };
        if !collapser.is_current(&candidate) {
            continue;
        }
        match collapser.check(&candidate) {
            Ok(()) => {
                collapser.collapse(&candidate, &mut heap);
                performed += 1;
            }
            Err(reason) => rejected[reason as usize] += 1,
        }
    }

    debug!(
        link = rejected[Rejection::Link as usize],
        flip = rejected[Rejection::Flip as usize],
        error = rejected[Rejection::Error as usize],
        "Collapse rejections"
    );

    let final_mesh = collapser.into_mesh(mesh);
    let final_triangles = final_mesh.faces.len();

    info!(
        final_triangles = final_triangles,
        collapses = performed,
        "Decimation complete"
    );

    DecimationResult {
        mesh: final_mesh,
        original_triangles,
        final_triangles,
        collapses_performed: performed,
        collapses_rejected: rejected.iter().sum(),
    }
}

// ============================================================================
// Collapse state
// ============================================================================

struct Collapser<'p> {
    params: &'p DecimateParams,
    positions: Vec<Point3<f64>>,
    quadrics: Vec<Quadric>,
    stamps: Vec<u32>,
    vertex_alive: Vec<bool>,
    on_boundary: Vec<bool>,
    faces: Vec<[u32; 3]>,
    face_alive: Vec<bool>,
    /// Faces around each vertex. May hold dead faces; filter on read.
    vertex_faces: Vec<Vec<u32>>,
    boundary_edges: HashSet<(u32, u32)>,
    sharp_edges: HashSet<(u32, u32)>,
    active_faces: usize,
}

impl<'p> Collapser<'p> {
    fn new(mesh: &IndexedMesh, params: &'p DecimateParams) -> Self {
        let n = mesh.vertices.len();
        let positions: Vec<Point3<f64>> = mesh.vertices.iter().map(|v| v.position).collect();

        let mut quadrics = vec![Quadric::default(); n];
        let mut vertex_faces = vec![Vec::new(); n];
        for (f, face) in mesh.faces.iter().enumerate() {
            let [a, b, c] = face.map(|v| positions[v as usize]);
            let q = Quadric::from_triangle(&a, &b, &c);
            for &v in face {
                if let Some(q) = q {
                    quadrics[v as usize] += q;
                }
                vertex_faces[v as usize].push(f as u32);
            }
        }

        let adjacency = MeshAdjacency::build(mesh.faces.iter().copied());
        let boundary_edges: HashSet<(u32, u32)> = adjacency.boundary_edges().collect();
        let mut on_boundary = vec![false; n];
        for &(a, b) in &boundary_edges {
            on_boundary[a as usize] = true;
            on_boundary[b as usize] = true;
        }

        let sharp_edges = if params.preserve_sharp_features {
            find_sharp_edges(mesh, params.sharp_angle_threshold)
        } else {
            HashSet::new()
        };

        Self {
            params,
            positions,
            quadrics,
            stamps: vec![0; n],
            vertex_alive: vec![true; n],
            on_boundary,
            faces: mesh.faces.clone(),
            face_alive: vec![true; mesh.faces.len()],
            vertex_faces,
            boundary_edges,
            sharp_edges,
            active_faces: mesh.faces.len(),
        }
    }

    fn initial_queue(&self) -> BinaryHeap<Candidate> {
        let mut seen = HashSet::new();
        let mut heap = BinaryHeap::new();
        for face in &self.faces {
            for i in 0..3 {
                let edge = normalize_edge(face[i], face[(i + 1) % 3]);
                if seen.insert(edge) {
                    heap.extend(self.price(edge.0, edge.1));
                }
            }
        }
        heap
    }

    /// Price collapsing the edge `(a, b)`, or `None` when it is locked.
    fn price(&self, a: u32, b: u32) -> Option<Candidate> {
        let edge = normalize_edge(a, b);
        if self.params.preserve_sharp_features && self.sharp_edges.contains(&edge) {
            return None;
        }

        let (ba, bb) = (self.on_boundary[a as usize], self.on_boundary[b as usize]);
        let combined = self.quadrics[a as usize] + self.quadrics[b as usize];
        let (pa, pb) = (self.positions[a as usize], self.positions[b as usize]);

        let (keep, remove, target) = if self.params.preserve_boundary && (ba || bb) {
            // Boundary vertices stay put; interior chords between two
            // boundary vertices would pinch the outline.
            if (ba && bb) || self.boundary_edges.contains(&edge) {
                return None;
            }
            if ba { (a, b, pa) } else { (b, a, pb) }
        } else {
            let target = combined
                .optimal_point()
                .unwrap_or_else(|| best_of(&combined, &[pa, pb, nalgebra::center(&pa, &pb)]));
            (a, b, target)
        };

        let mut cost = combined.evaluate(&target).max(0.0);
        if !self.params.preserve_boundary && (ba || bb) {
            cost *= self.params.boundary_penalty;
        }

        Some(Candidate {
            cost,
            keep,
            remove,
            stamps: (self.stamps[keep as usize], self.stamps[remove as usize]),
            target,
        })
    }

    fn is_current(&self, c: &Candidate) -> bool {
        let (k, r) = (c.keep as usize, c.remove as usize);
        self.vertex_alive[k]
            && self.vertex_alive[r]
            && self.stamps[k] == c.stamps.0
            && self.stamps[r] == c.stamps.1
    }

    fn live_faces(&self, v: u32) -> impl Iterator<Item = u32> + '_ {
        self.vertex_faces[v as usize]
            .iter()
            .copied()
            .filter(|&f| self.face_alive[f as usize])
    }

    fn neighbors(&self, v: u32) -> Vec<u32> {
        let mut out: Vec<u32> = self
            .live_faces(v)
            .flat_map(|f| self.faces[f as usize])
            .filter(|&u| u != v)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    fn check(&self, c: &Candidate) -> Result<(), Rejection> {
        if let Some(max_error) = self.params.max_error {
            let error = (self.quadrics[c.keep as usize] + self.quadrics[c.remove as usize])
                .evaluate(&c.target);
            if error > max_error {
                return Err(Rejection::Error);
            }
        }

        // Link condition: at most the two wing vertices are shared.
        let keep_ring = self.neighbors(c.keep);
        let shared = self
            .neighbors(c.remove)
            .iter()
            .filter(|v| keep_ring.binary_search(v).is_ok())
            .count();
        if shared > 2 {
            return Err(Rejection::Link);
        }

        if self.params.prevent_normal_flips && self.flips_any(c) {
            return Err(Rejection::Flip);
        }
        Ok(())
    }

    /// Whether moving both endpoints to the target turns a surviving face
    /// over or flattens it.
    fn flips_any(&self, c: &Candidate) -> bool {
        [c.keep, c.remove].iter().any(|&moved| {
            self.live_faces(moved).any(|f| {
                let face = self.faces[f as usize];
                if face.contains(&c.keep) && face.contains(&c.remove) {
                    return false;
                }
                let old = triangle_at(face, |v| self.positions[v as usize]);
                let new = triangle_at(face, |v| {
                    if v == moved {
                        c.target
                    } else {
                        self.positions[v as usize]
                    }
                });
                match (old.normal(), new.normal()) {
                    (Some(o), Some(n)) => o.dot(&n) < 0.0,
                    (Some(_), None) => true,
                    (None, _) => false,
                }
            })
        })
    }

    fn collapse(&mut self, c: &Candidate, heap: &mut BinaryHeap<Candidate>) {
        let (keep, remove) = (c.keep, c.remove);

        if self.params.preserve_sharp_features {
            for n in self.neighbors(remove) {
                if self.sharp_edges.remove(&normalize_edge(remove, n)) && n != keep {
                    self.sharp_edges.insert(normalize_edge(keep, n));
                }
            }
        }

        let moved = std::mem::take(&mut self.vertex_faces[remove as usize]);
        for f in moved {
            let fi = f as usize;
            if !self.face_alive[fi] {
                continue;
            }
            if self.faces[fi].contains(&keep) {
                self.face_alive[fi] = false;
                self.active_faces -= 1;
            } else {
                for v in &mut self.faces[fi] {
                    if *v == remove {
                        *v = keep;
                    }
                }
                self.vertex_faces[keep as usize].push(f);
            }
        }
        let alive = &self.face_alive;
        self.vertex_faces[keep as usize].retain(|&f| alive[f as usize]);

        let q = self.quadrics[remove as usize];
        self.quadrics[keep as usize] += q;
        self.positions[keep as usize] = c.target;
        self.on_boundary[keep as usize] |= self.on_boundary[remove as usize];
        self.vertex_alive[remove as usize] = false;
        self.stamps[keep as usize] += 1;
        self.stamps[remove as usize] += 1;

        for n in self.neighbors(keep) {
            heap.extend(self.price(keep, n));
        }
    }

    fn into_mesh(self, source: &IndexedMesh) -> IndexedMesh {
        let mut remap: HashMap<u32, u32> = HashMap::new();
        let mut out = IndexedMesh::with_capacity(source.vertices.len(), self.active_faces);

        for (face, _) in self
            .faces
            .iter()
            .zip(&self.face_alive)
            .filter(|(_, alive)| **alive)
        {
            let mapped = face.map(|v| {
                *remap.entry(v).or_insert_with(|| {
                    let mut vertex = source.vertices[v as usize].clone();
                    vertex.position = self.positions[v as usize];
                    vertex.normal = None;
                    out.vertices.push(vertex);
                    (out.vertices.len() - 1) as u32
                })
            });
            out.faces.push(mapped);
        }

        debug!(
            vertices = out.vertices.len(),
            faces = out.faces.len(),
            "Built final decimated mesh"
        );
        out
    }
}

// ============================================================================
// Internal helper functions
// ============================================================================

const fn normalize_edge(v1: u32, v2: u32) -> (u32, u32) {
    if v1 < v2 { (v1, v2) } else { (v2, v1) }
}

fn triangle_at(face: [u32; 3], at: impl Fn(u32) -> Point3<f64>) -> Triangle {
    Triangle::new(at(face[0]), at(face[1]), at(face[2]))
}

fn best_of(q: &Quadric, points: &[Point3<f64>]) -> Point3<f64> {
    points
        .iter()
        .copied()
        .min_by(|a, b| q.evaluate(a).total_cmp(&q.evaluate(b)))
        .unwrap_or_else(Point3::origin)
}

fn find_sharp_edges(mesh: &IndexedMesh, threshold: f64) -> HashSet<(u32, u32)> {
    let mut edge_faces: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
    for (f, face) in mesh.faces.iter().enumerate() {
        for i in 0..3 {
            edge_faces
                .entry(normalize_edge(face[i], face[(i + 1) % 3]))
                .or_default()
                .push(f);
        }
    }

    let normals: Vec<Option<Vector3<f64>>> = mesh.triangles().map(|t| t.normal()).collect();
    edge_faces
        .into_iter()
        .filter_map(|(edge, faces)| match faces.as_slice() {
            &[f1, f2] => {
                let (n1, n2) = (normals[f1]?, normals[f2]?);
                (n1.dot(&n2).clamp(-1.0, 1.0).acos() > threshold).then_some(edge)
            }
            _ => None,
        })
        .collect()
}
