//! Planar primitives shared by the mesh layer and the tree queries.
//!
//! Purpose
//! - Coordinate types (`Point`, `Vector`, `Box2`) plus the exact hit
//!   predicates evaluated at tree leaves: the odd-parity point-in-polygon
//!   test and the line clippers (Cohen–Sutherland and Liang–Barsky against
//!   boxes, Cyrus–Beck against convex faces).
//!
//! Numerical policy
//! - Predicates are branch-exact rather than tolerance-based; the one
//!   conditional order that matters (the crossing test) is documented at
//!   `point_in_polygon`. The on-edge variant is the only tolerance user.

mod clip;
mod primitives;
mod types;

pub use clip::{
    cohen_sutherland_line_box_clip, cyrus_beck_line_polygon_clip, liang_barsky_line_box_clip,
};
pub use primitives::{
    cross_product, point_in_polygon, point_in_polygon_or_on_edge, polygon_area,
};
pub use types::{Box2, Point, Vector};
