//! Top-down construction of the node and permutation arrays.
//!
//! Split selection is bucketed: faces are binned by bounding-box center
//! along each dimension, every bucket boundary is a candidate plane, and
//! the candidate minimizing count-times-loose-span wins across both
//! dimensions. Faces straddling a plane stay with the side their center
//! falls on, which is what makes the `lmax`/`rmin` planes loose.

use log::debug;

use crate::geometry::{Box2, Point};
use crate::mesh::{self, FaceTable};

use super::data::{validate_mesh, CellTree, Node, TreeError};
use super::stack::STACK_CAPACITY;

/// Construction parameters.
#[derive(Clone, Copy, Debug)]
pub struct BuildCfg {
    /// Ranges of at most this many faces stop splitting and become leaves.
    pub cells_per_leaf: usize,
    /// Number of center bins per dimension when scanning candidate planes.
    pub n_buckets: usize,
}

impl Default for BuildCfg {
    fn default() -> Self {
        Self {
            cells_per_leaf: 2,
            n_buckets: 4,
        }
    }
}

/// Chosen split of a face range.
struct Split {
    dim: usize,
    /// Bucket boundary index: buckets `0..cut` go left.
    cut: usize,
    cmin: f64,
    width: f64,
    lmax: f64,
    rmin: f64,
}

impl CellTree {
    /// Build a tree over `faces`/`vertices`.
    ///
    /// Validates the mesh, computes the per-face boxes and the root box,
    /// then splits ranges of the permutation array top-down with an
    /// explicit work stack. Ranges at the depth limit become leaves so the
    /// query stack can never overflow on built trees.
    pub fn build(
        faces: FaceTable,
        vertices: Vec<Point>,
        cfg: &BuildCfg,
    ) -> Result<Self, TreeError> {
        validate_mesh(&faces, &vertices)?;
        let n_faces = faces.len();
        let cells_per_leaf = cfg.cells_per_leaf.max(1);
        let n_buckets = cfg.n_buckets.max(2);
        let max_depth = STACK_CAPACITY - 1;

        let bb_coords = mesh::build_bboxes(&faces, &vertices);
        let bbox = bb_coords
            .iter()
            .fold(Box2::empty(), |acc, bb| acc.union(bb));
        let mut bb_indices: Vec<usize> = (0..n_faces).collect();

        let mut nodes = vec![Node::leaf(0, n_faces)];
        // (node, range start, range end, depth); children are refined when
        // their work item pops.
        let mut work = vec![(0usize, 0usize, n_faces, 0usize)];
        while let Some((node_index, start, end, depth)) = work.pop() {
            let size = end - start;
            if size <= cells_per_leaf || depth >= max_depth {
                nodes[node_index] = Node::leaf(start, size);
                continue;
            }
            let range = &mut bb_indices[start..end];
            match choose_split(range, &bb_coords, n_buckets) {
                Some(split) => {
                    let n_left = partition(range, &bb_coords, &split, n_buckets);
                    let mid = start + n_left;
                    let child = nodes.len();
                    nodes[node_index] = Node::interior(child, split.lmax, split.rmin, split.dim);
                    nodes.push(Node::leaf(start, n_left));
                    nodes.push(Node::leaf(mid, end - mid));
                    work.push((child, start, mid, depth + 1));
                    work.push((child + 1, mid, end, depth + 1));
                }
                // Every center coincides in both dimensions: keep the
                // range as one (oversized) leaf.
                None => nodes[node_index] = Node::leaf(start, size),
            }
        }

        debug!("built cell tree: {} faces, {} nodes", n_faces, nodes.len());
        Ok(Self {
            nodes,
            faces,
            vertices,
            bb_coords,
            bb_indices,
            bbox,
        })
    }
}

#[inline]
fn bucket_of(center: f64, cmin: f64, width: f64, n_buckets: usize) -> usize {
    (((center - cmin) / width) as usize).min(n_buckets - 1)
}

/// Scan both dimensions' bucket boundaries for the cheapest split.
///
/// Returns `None` when every face center coincides in both dimensions, the
/// one configuration with no usable plane.
fn choose_split(range: &[usize], bb_coords: &[Box2], n_buckets: usize) -> Option<Split> {
    let mut best: Option<(f64, Split)> = None;

    for dim in 0..2 {
        // Center and support extents of the range in this dimension.
        let mut cmin = f64::INFINITY;
        let mut cmax = f64::NEG_INFINITY;
        let mut dmin = f64::INFINITY;
        let mut dmax = f64::NEG_INFINITY;
        for &face in range {
            let bb = &bb_coords[face];
            let center = bb.center(dim);
            cmin = cmin.min(center);
            cmax = cmax.max(center);
            dmin = dmin.min(bb.lower(dim));
            dmax = dmax.max(bb.upper(dim));
        }
        if !(cmax > cmin) {
            continue;
        }
        let width = (cmax - cmin) / n_buckets as f64;

        // Per-bucket aggregates: face count, loosest upper and lower bound.
        let mut counts = vec![0usize; n_buckets];
        let mut upper = vec![f64::NEG_INFINITY; n_buckets];
        let mut lower = vec![f64::INFINITY; n_buckets];
        for &face in range {
            let bb = &bb_coords[face];
            let bucket = bucket_of(bb.center(dim), cmin, width, n_buckets);
            counts[bucket] += 1;
            upper[bucket] = upper[bucket].max(bb.upper(dim));
            lower[bucket] = lower[bucket].min(bb.lower(dim));
        }
        let mut suffix_lower = lower.clone();
        for k in (0..n_buckets - 1).rev() {
            suffix_lower[k] = suffix_lower[k].min(suffix_lower[k + 1]);
        }

        // Sweep candidate planes between buckets `cut - 1` and `cut`.
        let mut n_left = 0usize;
        let mut lmax = f64::NEG_INFINITY;
        for cut in 1..n_buckets {
            n_left += counts[cut - 1];
            lmax = lmax.max(upper[cut - 1]);
            let n_right = range.len() - n_left;
            if n_left == 0 || n_right == 0 {
                continue;
            }
            let rmin = suffix_lower[cut];
            let cost = n_left as f64 * (lmax - dmin) + n_right as f64 * (dmax - rmin);
            if best.as_ref().map_or(true, |(c, _)| cost < *c) {
                best = Some((
                    cost,
                    Split {
                        dim,
                        cut,
                        cmin,
                        width,
                        lmax,
                        rmin,
                    },
                ));
            }
        }
    }
    best.map(|(_, split)| split)
}

/// Partition `range` in place so faces binned left of the cut come first.
///
/// Partitioning by bucket index rather than by plane coordinate keeps the
/// face assignment bit-identical to the aggregates `choose_split` computed.
fn partition(range: &mut [usize], bb_coords: &[Box2], split: &Split, n_buckets: usize) -> usize {
    let mut left = 0;
    let mut right = range.len();
    while left < right {
        let bucket = bucket_of(
            bb_coords[range[left]].center(split.dim),
            split.cmin,
            split.width,
            n_buckets,
        );
        if bucket < split.cut {
            left += 1;
        } else {
            right -= 1;
            range.swap(left, right);
        }
    }
    left
}
