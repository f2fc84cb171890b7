//! Cell tree: spatial queries on 2D unstructured meshes.
//!
//! A cell tree is a bounding-volume hierarchy over the faces of a polygonal
//! mesh, with loose per-node split planes (`lmax`/`rmin`) that tolerate faces
//! straddling a split. The tree is built once from a face/vertex table and
//! then answers batch queries: which face contains a point, which faces'
//! bounding boxes overlap a query box, which faces does a line segment cross
//! (and over which parametric sub-interval).

pub mod geometry;
pub mod mesh;
pub mod tree;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use geometry::{Box2, Point, Vector};
pub use tree::{BuildCfg, CellTree, Node, TreeError};

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::geometry::{Box2, Point, Vector};
    pub use crate::mesh::{FaceTable, FILL_VALUE};
    pub use crate::tree::{BuildCfg, CellTree, Node, TreeError};
}
