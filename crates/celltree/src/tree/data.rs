//! The immutable tree descriptor and its boundary-contract validation.

use thiserror::Error;

use crate::geometry::{Box2, Point};
use crate::mesh::{polygon_length, FaceTable, FILL_VALUE};

/// Flat tree node record.
///
/// Leaves are tagged by `child == -1` and use `ptr`/`size` to address their
/// slice of the permutation array. Interior nodes keep the loose split
/// planes `lmax`/`rmin` in dimension `dim` (false = x, true = y); the left
/// child sits at `child`, the right at `child + 1`. The planes may overlap
/// (`rmin <= lmax`) when faces straddle the split.
#[derive(Clone, Copy, Debug)]
pub struct Node {
    pub child: i32,
    pub lmax: f64,
    pub rmin: f64,
    pub ptr: u32,
    pub size: u32,
    pub dim: bool,
}

impl Node {
    /// Leaf owning `size` permutation slots starting at `ptr`.
    #[inline]
    pub fn leaf(ptr: usize, size: usize) -> Self {
        Self {
            child: -1,
            lmax: f64::NAN,
            rmin: f64::NAN,
            ptr: ptr as u32,
            size: size as u32,
            dim: false,
        }
    }

    /// Interior node splitting dimension `dim` at the loose planes.
    #[inline]
    pub fn interior(child: usize, lmax: f64, rmin: f64, dim: usize) -> Self {
        Self {
            child: child as i32,
            lmax,
            rmin,
            ptr: 0,
            size: 0,
            dim: dim == 1,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.child == -1
    }
}

/// Rejected input arrays. Raised at build time only; queries cannot fail.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("mesh has no faces")]
    EmptyMesh,
    #[error("face {face} has fewer than 3 vertices")]
    FaceTooShort { face: usize },
    #[error("face {face} refers to vertex {index}, but only {n_vertices} vertices exist")]
    VertexOutOfRange {
        face: usize,
        index: i32,
        n_vertices: usize,
    },
    #[error("vertex {index} has a non-finite coordinate")]
    NonFiniteVertex { index: usize },
    #[error("{name} has length {got}, expected {expected}")]
    ShapeMismatch {
        name: &'static str,
        got: usize,
        expected: usize,
    },
    #[error("permutation array is not a permutation of the face indices")]
    InvalidPermutation,
    #[error("node {index} is malformed")]
    MalformedNode { index: usize },
}

/// Immutable query descriptor: the node array plus the mesh arrays it
/// indexes into, grouped for read-only sharing across query threads.
///
/// All arrays are fixed at construction; queries borrow `&self` and never
/// allocate or mutate.
#[derive(Clone, Debug)]
pub struct CellTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) faces: FaceTable,
    pub(crate) vertices: Vec<Point>,
    pub(crate) bb_coords: Vec<Box2>,
    pub(crate) bb_indices: Vec<usize>,
    pub(crate) bbox: Box2,
}

impl CellTree {
    /// Assemble a tree from externally built arrays.
    ///
    /// This is the boundary contract for callers running their own
    /// construction: the node array (root at index 0, children allocated
    /// after their parent), the permutation array whose leaf slices
    /// partition `[0, n_faces)`, the per-face boxes, the mesh arrays, and
    /// the root box. Every consistency rule is checked here so queries can
    /// index without further validation.
    pub fn from_parts(
        nodes: Vec<Node>,
        bb_indices: Vec<usize>,
        bb_coords: Vec<Box2>,
        faces: FaceTable,
        vertices: Vec<Point>,
        bbox: Box2,
    ) -> Result<Self, TreeError> {
        validate_mesh(&faces, &vertices)?;
        let n_faces = faces.len();
        if bb_coords.len() != n_faces {
            return Err(TreeError::ShapeMismatch {
                name: "bb_coords",
                got: bb_coords.len(),
                expected: n_faces,
            });
        }
        if bb_indices.len() != n_faces {
            return Err(TreeError::ShapeMismatch {
                name: "bb_indices",
                got: bb_indices.len(),
                expected: n_faces,
            });
        }
        validate_nodes(&nodes, &bb_indices, n_faces)?;
        Ok(Self {
            nodes,
            faces,
            vertices,
            bb_coords,
            bb_indices,
            bbox,
        })
    }

    /// Build a tree over a mesh with the default configuration.
    pub fn new(faces: FaceTable, vertices: Vec<Point>) -> Result<Self, TreeError> {
        Self::build(faces, vertices, &super::build::BuildCfg::default())
    }

    #[inline]
    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn faces(&self) -> &FaceTable {
        &self.faces
    }

    #[inline]
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Per-face bounding boxes, indexed by face.
    #[inline]
    pub fn bb_coords(&self) -> &[Box2] {
        &self.bb_coords
    }

    /// Permutation of face indices, sliced per leaf by `ptr`/`size`.
    #[inline]
    pub fn bb_indices(&self) -> &[usize] {
        &self.bb_indices
    }

    /// Root bounding box of the whole mesh.
    #[inline]
    pub fn bbox(&self) -> &Box2 {
        &self.bbox
    }
}

/// Mesh-side input checks shared by `build` and `from_parts`.
pub(super) fn validate_mesh(faces: &FaceTable, vertices: &[Point]) -> Result<(), TreeError> {
    if faces.is_empty() {
        return Err(TreeError::EmptyMesh);
    }
    for (index, v) in vertices.iter().enumerate() {
        if !(v.x.is_finite() && v.y.is_finite()) {
            return Err(TreeError::NonFiniteVertex { index });
        }
    }
    for f in 0..faces.len() {
        let face = faces.face(f);
        if face.len() < 3 || face[..3].contains(&FILL_VALUE) {
            return Err(TreeError::FaceTooShort { face: f });
        }
        let length = polygon_length(face);
        for &index in &face[..length] {
            if index < 0 || index as usize >= vertices.len() {
                return Err(TreeError::VertexOutOfRange {
                    face: f,
                    index,
                    n_vertices: vertices.len(),
                });
            }
        }
    }
    Ok(())
}

/// Node-array checks: leaf slices must partition the permutation array and
/// child links must point forward into the array (which also rules out
/// cycles).
fn validate_nodes(nodes: &[Node], bb_indices: &[usize], n_faces: usize) -> Result<(), TreeError> {
    if nodes.is_empty() {
        return Err(TreeError::MalformedNode { index: 0 });
    }
    let mut seen = vec![false; n_faces];
    for (index, node) in nodes.iter().enumerate() {
        if node.is_leaf() {
            let ptr = node.ptr as usize;
            let size = node.size as usize;
            if ptr + size > bb_indices.len() {
                return Err(TreeError::MalformedNode { index });
            }
            for &face in &bb_indices[ptr..ptr + size] {
                if face >= n_faces || seen[face] {
                    return Err(TreeError::InvalidPermutation);
                }
                seen[face] = true;
            }
        } else {
            if node.child < 0 {
                return Err(TreeError::MalformedNode { index });
            }
            let child = node.child as usize;
            if child <= index || child + 1 >= nodes.len() {
                return Err(TreeError::MalformedNode { index });
            }
            if !(node.lmax.is_finite() && node.rmin.is_finite()) {
                return Err(TreeError::MalformedNode { index });
            }
        }
    }
    if !seen.iter().all(|&s| s) {
        return Err(TreeError::InvalidPermutation);
    }
    Ok(())
}
