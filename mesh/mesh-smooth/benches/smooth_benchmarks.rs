//! Benchmarks for mesh-smooth operations.
//!
//! Run with: cargo bench -p mesh-smooth
//!
//! To compare against baseline:
//! 1. First run: cargo bench -p mesh-smooth -- --save-baseline main
//! 2. After changes: cargo bench -p mesh-smooth -- --baseline main

#![allow(missing_docs, clippy::cast_possible_truncation, clippy::cast_precision_loss)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use mesh_smooth::{NeighborWeighting, SmoothParams, smooth};
use mesh_types::MeshBuffers;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// =============================================================================
// Test Mesh Generation
// =============================================================================

/// `n x n` heightmap with terraced heights and a little horizontal noise.
fn terrain(n: u32) -> MeshBuffers {
    let mut rng = StdRng::seed_from_u64(7);
    let mut positions = Vec::with_capacity((n * n * 3) as usize);
    for j in 0..n {
        for i in 0..n {
            let (x, z) = (i as f32, j as f32);
            let height = ((x * 0.15).sin() + (z * 0.1).cos() + 2.0).floor();
            positions.extend_from_slice(&[
                x + rng.gen_range(-0.1f32..0.1),
                height,
                z + rng.gen_range(-0.1f32..0.1),
            ]);
        }
    }

    let mut indices = Vec::with_capacity(((n - 1) * (n - 1) * 6) as usize);
    for j in 0..n - 1 {
        for i in 0..n - 1 {
            let a = j * n + i;
            let (b, c, d) = (a + 1, a + n, a + n + 1);
            indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }
    MeshBuffers::indexed(positions, indices)
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_surface(c: &mut Criterion) {
    let mut group = c.benchmark_group("Surface");

    for n in [32, 128] {
        let mesh = terrain(n);
        group.throughput(Throughput::Elements(u64::from(n * n)));

        let taubin = SmoothParams::taubin(3);
        group.bench_with_input(BenchmarkId::new("taubin", n), &mesh, |b, mesh| {
            b.iter(|| smooth(black_box(mesh), &taubin));
        });

        let cotangent = SmoothParams::taubin(3).with_weighting(NeighborWeighting::Cotangent);
        group.bench_with_input(BenchmarkId::new("cotangent", n), &mesh, |b, mesh| {
            b.iter(|| smooth(black_box(mesh), &cotangent));
        });

        let blended = SmoothParams::taubin(3).with_strength(0.5);
        group.bench_with_input(BenchmarkId::new("blended", n), &mesh, |b, mesh| {
            b.iter(|| smooth(black_box(mesh), &blended));
        });
    }

    group.finish();
}

fn bench_height_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("HeightModes");

    for n in [32, 128] {
        let mesh = terrain(n);
        group.throughput(Throughput::Elements(u64::from(n * n)));

        let heightmap = SmoothParams::heightmap();
        group.bench_with_input(BenchmarkId::new("heightmap", n), &mesh, |b, mesh| {
            b.iter(|| smooth(black_box(mesh), &heightmap));
        });

        let contour = SmoothParams::contour();
        group.bench_with_input(BenchmarkId::new("contour", n), &mesh, |b, mesh| {
            b.iter(|| smooth(black_box(mesh), &contour));
        });
    }

    group.finish();
}

// =============================================================================
// Criterion Setup
// =============================================================================

criterion_group!(benches, bench_surface, bench_height_modes);
criterion_main!(benches);
