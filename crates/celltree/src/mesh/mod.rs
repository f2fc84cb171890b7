//! Fill-value–padded face tables and mesh-level preprocessing.
//!
//! Purpose
//! - Store ragged polygons in a rectangular integer table (rows padded with
//!   [`FILL_VALUE`]), the layout the tree indexes into at query time.
//! - Mesh-wide passes that run before construction: per-face bounding
//!   boxes and the winding repair that makes every face counter-clockwise.
//!   Both parallelize over faces.

pub mod rand;

use rayon::prelude::*;

use crate::geometry::{cross_product, Box2, Point};

/// Padding sentinel marking "no more vertices" in a face row.
pub const FILL_VALUE: i32 = -1;

/// Number of leading vertices of `face` before the first fill entry.
///
/// A minimal polygon is a triangle, so the scan starts at index 3.
#[inline]
pub fn polygon_length(face: &[i32]) -> usize {
    let n = face.len();
    for i in 3..n {
        if face[i] == FILL_VALUE {
            return i;
        }
    }
    n
}

/// Rectangular face-vertex table of shape `(n_faces, max_verts)`.
///
/// Row `i` lists the vertex indices of face `i` in winding order, padded to
/// the widest polygon with [`FILL_VALUE`].
#[derive(Clone, Debug)]
pub struct FaceTable {
    indices: Vec<i32>,
    max_verts: usize,
}

impl FaceTable {
    /// Build from ragged per-face vertex lists, padding rows to the widest.
    pub fn from_rows(rows: &[Vec<usize>]) -> Self {
        let max_verts = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut indices = vec![FILL_VALUE; rows.len() * max_verts];
        for (row, out) in rows.iter().zip(indices.chunks_mut(max_verts.max(1))) {
            for (slot, &vertex) in out.iter_mut().zip(row) {
                *slot = vertex as i32;
            }
        }
        Self { indices, max_verts }
    }

    /// Wrap an existing rectangular row-major array.
    pub fn from_flat(indices: Vec<i32>, max_verts: usize) -> Self {
        assert!(
            max_verts > 0 && indices.len() % max_verts == 0,
            "flat face array must be rectangular"
        );
        Self { indices, max_verts }
    }

    /// Number of faces.
    #[inline]
    pub fn len(&self) -> usize {
        if self.max_verts == 0 {
            0
        } else {
            self.indices.len() / self.max_verts
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row width (the widest polygon's vertex count).
    #[inline]
    pub fn max_verts(&self) -> usize {
        self.max_verts
    }

    /// Full padded row of face `index`.
    #[inline]
    pub fn face(&self, index: usize) -> &[i32] {
        &self.indices[index * self.max_verts..(index + 1) * self.max_verts]
    }

    fn par_rows(&self) -> impl IndexedParallelIterator<Item = &[i32]> {
        self.indices.par_chunks(self.max_verts)
    }

    fn par_rows_mut(&mut self) -> impl IndexedParallelIterator<Item = &mut [i32]> {
        self.indices.par_chunks_mut(self.max_verts)
    }
}

/// Axis-aligned box of a single face, scanning its non-fill vertices.
pub fn bounding_box(face: &[i32], vertices: &[Point]) -> Box2 {
    let first = vertices[face[0] as usize];
    let mut bb = Box2::new(first.x, first.x, first.y, first.y);
    for &index in &face[1..] {
        if index == FILL_VALUE {
            break;
        }
        bb.include(vertices[index as usize]);
    }
    bb
}

/// Per-face bounding boxes for the whole table, in parallel.
pub fn build_bboxes(faces: &FaceTable, vertices: &[Point]) -> Vec<Box2> {
    faces
        .par_rows()
        .map(|face| bounding_box(face, vertices))
        .collect()
}

/// Repair face winding in place so every face is counter-clockwise.
///
/// Walks each face's corners computing successive cross products; colinear
/// corners are skipped, the first negative product reverses the face's
/// vertex slice, and the first positive one accepts it. Idempotent.
pub fn counter_clockwise(faces: &mut FaceTable, vertices: &[Point]) {
    faces.par_rows_mut().for_each(|face| {
        let length = polygon_length(face);
        let mut a = vertices[face[length - 2] as usize];
        let mut b = vertices[face[length - 1] as usize];
        for i in 0..length {
            let c = vertices[face[i] as usize];
            let u = b - a;
            let v = c - a;
            let product = cross_product(u, v);
            if product == 0.0 {
                a = b;
                b = c;
            } else if product < 0.0 {
                face[..length].reverse();
            } else {
                break;
            }
        }
    });
}

/// Vertex-mean centroid of a face.
///
/// Lies inside any convex face; good enough as an interior probe for the
/// mildly deformed cells the generators produce.
pub fn face_centroid(face: &[i32], vertices: &[Point]) -> Point {
    let length = polygon_length(face);
    let mut x = 0.0;
    let mut y = 0.0;
    for &index in &face[..length] {
        let v = vertices[index as usize];
        x += v.x;
        y += v.y;
    }
    Point::new(x / length as f64, y / length as f64)
}
