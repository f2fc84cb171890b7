//! Point, box, and edge locators plus the two-pass batch drivers.
//!
//! Every locator walks the node array with an explicit stack, prunes
//! subtrees against the loose split planes, and runs the exact geometric
//! test only on leaf candidates. The batch drivers parallelize over
//! queries: a count pass sizes the output, a serial prefix materializes
//! per-query slices, and the fill pass writes each query's hits into its
//! own slice with no synchronization.

use log::debug;
use rayon::prelude::*;

use crate::geometry::{
    cohen_sutherland_line_box_clip, cross_product, cyrus_beck_line_polygon_clip, Box2, Point,
};
use crate::mesh::polygon_length;

use super::data::CellTree;
use super::stack::TraversalStack;

impl CellTree {
    /// Face containing `point`, if any.
    ///
    /// Returns the first containing face the traversal reaches; with
    /// non-overlapping faces (a mesh invariant) that face is unique. A
    /// point exactly on a face edge is degenerate: the answer is
    /// deterministic but unspecified, and may be a miss.
    pub fn locate_point(&self, point: Point) -> Option<usize> {
        let mut stack = TraversalStack::with_root();
        while let Some(node_index) = stack.pop() {
            let node = &self.nodes[node_index];

            if node.is_leaf() {
                let ptr = node.ptr as usize;
                for &face in &self.bb_indices[ptr..ptr + node.size as usize] {
                    if self.point_in_face(face, point) {
                        return Some(face);
                    }
                }
                continue;
            }

            let dim = usize::from(node.dim);
            let coord = point[dim];
            let left = coord <= node.lmax;
            let right = coord >= node.rmin;
            let child = node.child as usize;
            if left && right {
                // Both sides straddle the point; explore the side it sits
                // deeper inside of first (pushed last, popped first).
                if node.lmax - coord < coord - node.rmin {
                    stack.push(child);
                    stack.push(child + 1);
                } else {
                    stack.push(child + 1);
                    stack.push(child);
                }
            } else if left {
                stack.push(child);
            } else if right {
                stack.push(child + 1);
            }
        }
        None
    }

    /// Like [`CellTree::locate_point`], but also accepting points within
    /// `tolerance` of a face edge (twice-area test). Opt-in: the plain
    /// query keeps the exact odd-parity semantics.
    pub fn locate_point_with_tolerance(&self, point: Point, tolerance: f64) -> Option<usize> {
        let mut stack = TraversalStack::with_root();
        while let Some(node_index) = stack.pop() {
            let node = &self.nodes[node_index];

            if node.is_leaf() {
                let ptr = node.ptr as usize;
                for &face in &self.bb_indices[ptr..ptr + node.size as usize] {
                    if self.point_in_face_or_on_edge(face, point, tolerance) {
                        return Some(face);
                    }
                }
                continue;
            }

            // Descent widened by the tolerance so near-edge points reach
            // the leaves whose faces they may be on.
            let dim = usize::from(node.dim);
            let coord = point[dim];
            let left = coord <= node.lmax + tolerance;
            let right = coord >= node.rmin - tolerance;
            let child = node.child as usize;
            if left && right {
                if node.lmax - coord < coord - node.rmin {
                    stack.push(child);
                    stack.push(child + 1);
                } else {
                    stack.push(child + 1);
                    stack.push(child);
                }
            } else if left {
                stack.push(child);
            } else if right {
                stack.push(child + 1);
            }
        }
        None
    }

    /// Count (and optionally collect) faces whose bounding box overlaps
    /// `query`.
    ///
    /// With `out` set, face indices are written from slot 0; the caller
    /// provides a slice at least as long as the count. Box edges are
    /// half-open, so faces merely sharing an edge with the query do not
    /// turn up.
    pub fn locate_box(&self, query: &Box2, mut out: Option<&mut [usize]>) -> usize {
        if !query.intersects(&self.bbox) {
            return 0;
        }
        let mut stack = TraversalStack::with_root();
        let mut count = 0;
        while let Some(node_index) = stack.pop() {
            let node = &self.nodes[node_index];

            if node.is_leaf() {
                let ptr = node.ptr as usize;
                for &face in &self.bb_indices[ptr..ptr + node.size as usize] {
                    if query.intersects(&self.bb_coords[face]) {
                        if let Some(out) = out.as_deref_mut() {
                            out[count] = face;
                        }
                        count += 1;
                    }
                }
                continue;
            }

            // A side is a candidate when the query's extent reaches its
            // loose span: anything at or below lmax can touch left faces,
            // anything at or above rmin can touch right faces.
            let dim = usize::from(node.dim);
            let left = query.lower(dim) <= node.lmax;
            let right = query.upper(dim) >= node.rmin;
            let child = node.child as usize;
            if left && right {
                stack.push(child);
                stack.push(child + 1);
            } else if left {
                stack.push(child);
            } else if right {
                stack.push(child + 1);
            }
        }
        count
    }

    /// Count (and optionally collect) faces crossed by the segment
    /// `a → b`.
    ///
    /// Each hit pairs a face index with the parametric interval
    /// `(t0, t1)` of the segment inside the face; the third column of the
    /// interval row is reserved for caller-computed lengths and written as
    /// zero. Candidates pass three gates: a root-box Cohen–Sutherland
    /// prune, a per-face bounding-box Cohen–Sutherland prune, and the
    /// exact Cyrus–Beck clip. Zero-length segments behave like point
    /// probes and report `t0 == t1 == 0` (see
    /// [`cyrus_beck_line_polygon_clip`]).
    pub fn locate_edge(
        &self,
        a: Point,
        b: Point,
        mut out: Option<(&mut [usize], &mut [[f64; 3]])>,
    ) -> usize {
        // Cheap whole-mesh reject.
        if cohen_sutherland_line_box_clip(a, b, &self.bbox).is_none() {
            return 0;
        }
        let mut stack = TraversalStack::with_root();
        let mut count = 0;
        while let Some(node_index) = stack.pop() {
            let node = &self.nodes[node_index];

            if node.is_leaf() {
                let ptr = node.ptr as usize;
                for &face_index in &self.bb_indices[ptr..ptr + node.size as usize] {
                    if cohen_sutherland_line_box_clip(a, b, &self.bb_coords[face_index]).is_none()
                    {
                        continue;
                    }
                    let face = self.faces.face(face_index);
                    let length = polygon_length(face);
                    if let Some((t0, t1)) =
                        cyrus_beck_line_polygon_clip(a, b, &self.vertices, &face[..length])
                    {
                        if let Some((indices, intersections)) = out.as_mut() {
                            indices[count] = face_index;
                            intersections[count] = [t0, t1, 0.0];
                        }
                        count += 1;
                    }
                }
                continue;
            }

            // A side is a candidate when the segment's extent in the split
            // dimension reaches its loose span; direction does not matter,
            // so the test uses the segment's coordinate interval.
            let dim = usize::from(node.dim);
            let (lo, hi) = if a[dim] <= b[dim] {
                (a[dim], b[dim])
            } else {
                (b[dim], a[dim])
            };
            let left = lo <= node.lmax;
            let right = hi >= node.rmin;
            let child = node.child as usize;
            if left && right {
                stack.push(child);
                stack.push(child + 1);
            } else if left {
                stack.push(child);
            } else if right {
                stack.push(child + 1);
            }
        }
        count
    }

    /// Locate a batch of points in parallel.
    ///
    /// Misses are encoded as `-1`, matching the flat-array result contract
    /// of the batch interface.
    pub fn locate_points(&self, points: &[Point]) -> Vec<i64> {
        points
            .par_iter()
            .map(|&p| self.locate_point(p).map_or(-1, |face| face as i64))
            .collect()
    }

    /// Locate a batch of query boxes.
    ///
    /// Two passes: a parallel count pass sizes the output exactly, a
    /// serial prefix pass reserves one slice per query, and a parallel
    /// fill pass writes every query's hits into its own slice. Returns
    /// `(ii, jj)` where `ii[k]` is the query index and `jj[k]` the face
    /// index, ordered by query.
    pub fn locate_boxes(&self, boxes: &[Box2]) -> (Vec<usize>, Vec<usize>) {
        let counts: Vec<usize> = boxes
            .par_iter()
            .map(|query| self.locate_box(query, None))
            .collect();
        let total: usize = counts.iter().sum();

        let mut ii = vec![0usize; total];
        let mut jj = vec![0usize; total];
        let mut tasks = Vec::with_capacity(boxes.len());
        {
            let mut ii_rest = ii.as_mut_slice();
            let mut jj_rest = jj.as_mut_slice();
            for (i, &count) in counts.iter().enumerate() {
                let (ii_slot, rest) = std::mem::take(&mut ii_rest).split_at_mut(count);
                ii_rest = rest;
                let (jj_slot, rest) = std::mem::take(&mut jj_rest).split_at_mut(count);
                jj_rest = rest;
                tasks.push((i, ii_slot, jj_slot));
            }
        }
        tasks.into_par_iter().for_each(|(i, ii_slot, jj_slot)| {
            ii_slot.fill(i);
            let expected = jj_slot.len();
            let written = self.locate_box(&boxes[i], Some(jj_slot));
            debug_assert_eq!(written, expected);
        });

        debug!("located {} boxes: {} hits", boxes.len(), total);
        (ii, jj)
    }

    /// Locate a batch of segments.
    ///
    /// Same two-pass shape as [`CellTree::locate_boxes`]. Returns
    /// `(ii, jj, t)`: hit row `k` pairs query `ii[k]` with face `jj[k]`,
    /// and `t[k]` holds the parametric interval `(t0, t1)` plus a zeroed
    /// reserved column.
    pub fn locate_edges(
        &self,
        edges: &[[Point; 2]],
    ) -> (Vec<usize>, Vec<usize>, Vec<[f64; 3]>) {
        let counts: Vec<usize> = edges
            .par_iter()
            .map(|edge| self.locate_edge(edge[0], edge[1], None))
            .collect();
        let total: usize = counts.iter().sum();

        let mut ii = vec![0usize; total];
        let mut jj = vec![0usize; total];
        let mut t = vec![[0.0_f64; 3]; total];
        let mut tasks = Vec::with_capacity(edges.len());
        {
            let mut ii_rest = ii.as_mut_slice();
            let mut jj_rest = jj.as_mut_slice();
            let mut t_rest = t.as_mut_slice();
            for (i, &count) in counts.iter().enumerate() {
                let (ii_slot, rest) = std::mem::take(&mut ii_rest).split_at_mut(count);
                ii_rest = rest;
                let (jj_slot, rest) = std::mem::take(&mut jj_rest).split_at_mut(count);
                jj_rest = rest;
                let (t_slot, rest) = std::mem::take(&mut t_rest).split_at_mut(count);
                t_rest = rest;
                tasks.push((i, ii_slot, jj_slot, t_slot));
            }
        }
        tasks
            .into_par_iter()
            .for_each(|(i, ii_slot, jj_slot, t_slot)| {
                ii_slot.fill(i);
                let expected = jj_slot.len();
                let written = self.locate_edge(edges[i][0], edges[i][1], Some((jj_slot, t_slot)));
                debug_assert_eq!(written, expected);
            });

        debug!("located {} edges: {} hits", edges.len(), total);
        (ii, jj, t)
    }

    /// Odd-parity crossing test against face `face_index`, reading the
    /// ring through the face table. Condition order matters: the y-range
    /// test guards the division against zero on horizontal edges.
    fn point_in_face(&self, face_index: usize, p: Point) -> bool {
        let face = self.faces.face(face_index);
        let length = polygon_length(face);
        let mut v0 = self.vertices[face[length - 1] as usize];
        let mut c = false;
        for &index in &face[..length] {
            let v1 = self.vertices[index as usize];
            if (v0.y > p.y) != (v1.y > p.y)
                && p.x < (v1.x - v0.x) * (p.y - v0.y) / (v1.y - v0.y) + v0.x
            {
                c = !c;
            }
            v0 = v1;
        }
        c
    }

    /// Tolerant twin of [`CellTree::point_in_face`]: additionally accepts
    /// points within `tolerance` of an edge (twice-area plus projection
    /// parameter), with the same parity fallback.
    fn point_in_face_or_on_edge(&self, face_index: usize, p: Point, tolerance: f64) -> bool {
        let face = self.faces.face(face_index);
        let length = polygon_length(face);
        let mut v0 = self.vertices[face[length - 1] as usize];
        let mut u = v0 - p;
        let mut c = false;
        for &index in &face[..length] {
            let v1 = self.vertices[index as usize];
            let v = v1 - p;

            if cross_product(u, v).abs() < tolerance {
                let w = v1 - v0;
                let t = if w.x != 0.0 {
                    Some((p.x - v0.x) / w.x)
                } else if w.y != 0.0 {
                    Some((p.y - v0.y) / w.y)
                } else {
                    None
                };
                if let Some(t) = t {
                    if (0.0..=1.0).contains(&t) {
                        return true;
                    }
                }
            }

            if (v0.y > p.y) != (v1.y > p.y)
                && p.x < (v1.x - v0.x) * (p.y - v0.y) / (v1.y - v0.y) + v0.x
            {
                c = !c;
            }

            v0 = v1;
            u = v;
        }
        c
    }
}
