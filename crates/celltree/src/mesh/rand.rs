//! Deterministic mesh generators for tests and benchmarks.
//!
//! Model
//! - Structured grids of unit cells covering `[0, nx] × [0, ny]`: quads,
//!   their triangulated variant, and a jittered version that displaces the
//!   interior vertices while keeping faces simple. Determinism comes from a
//!   caller-supplied seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::FaceTable;
use crate::geometry::Point;

fn grid_vertices(nx: usize, ny: usize) -> Vec<Point> {
    let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            vertices.push(Point::new(i as f64, j as f64));
        }
    }
    vertices
}

/// `nx × ny` grid of unit squares, faces in row-major order, CCW winding.
pub fn quad_grid(nx: usize, ny: usize) -> (FaceTable, Vec<Point>) {
    let stride = nx + 1;
    let mut rows = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let v0 = j * stride + i;
            rows.push(vec![v0, v0 + 1, v0 + 1 + stride, v0 + stride]);
        }
    }
    (FaceTable::from_rows(&rows), grid_vertices(nx, ny))
}

/// The same grid with every quad split into two CCW triangles.
pub fn triangle_grid(nx: usize, ny: usize) -> (FaceTable, Vec<Point>) {
    let stride = nx + 1;
    let mut rows = Vec::with_capacity(2 * nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let v0 = j * stride + i;
            rows.push(vec![v0, v0 + 1, v0 + 1 + stride]);
            rows.push(vec![v0, v0 + 1 + stride, v0 + stride]);
        }
    }
    (FaceTable::from_rows(&rows), grid_vertices(nx, ny))
}

/// Quad grid with interior vertices displaced by up to `amplitude` in each
/// coordinate.
///
/// The amplitude is clamped below 0.5 so cells stay simple and
/// non-overlapping; boundary vertices are pinned so the covered domain is
/// unchanged.
pub fn jittered_quad_grid(
    nx: usize,
    ny: usize,
    amplitude: f64,
    seed: u64,
) -> (FaceTable, Vec<Point>) {
    let (faces, mut vertices) = quad_grid(nx, ny);
    let amplitude = amplitude.clamp(0.0, 0.49);
    let mut rng = StdRng::seed_from_u64(seed);
    for j in 1..ny {
        for i in 1..nx {
            let v = &mut vertices[j * (nx + 1) + i];
            v.x += (rng.gen::<f64>() * 2.0 - 1.0) * amplitude;
            v.y += (rng.gen::<f64>() * 2.0 - 1.0) * amplitude;
        }
    }
    (faces, vertices)
}
