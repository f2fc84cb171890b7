//! Coordinate types: points, displacement vectors, axis-aligned boxes.

use nalgebra::{Point2, Vector2};

/// Planar point.
pub type Point = Point2<f64>;

/// Planar displacement.
pub type Vector = Vector2<f64>;

/// Axis-aligned box in `(xmin, xmax, ymin, ymax)` field order.
///
/// Dimensions are indexed 0 for x and 1 for y, matching the split dimension
/// stored in tree nodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Box2 {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl Box2 {
    #[inline]
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Self {
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
        }
    }

    /// Inverted box used as a fold seed for unions.
    #[inline]
    pub fn empty() -> Self {
        Self {
            xmin: f64::INFINITY,
            xmax: f64::NEG_INFINITY,
            ymin: f64::INFINITY,
            ymax: f64::NEG_INFINITY,
        }
    }

    /// Lower bound in dimension `dim`.
    #[inline]
    pub fn lower(&self, dim: usize) -> f64 {
        if dim == 0 {
            self.xmin
        } else {
            self.ymin
        }
    }

    /// Upper bound in dimension `dim`.
    #[inline]
    pub fn upper(&self, dim: usize) -> f64 {
        if dim == 0 {
            self.xmax
        } else {
            self.ymax
        }
    }

    /// Center coordinate in dimension `dim`.
    #[inline]
    pub fn center(&self, dim: usize) -> f64 {
        0.5 * (self.lower(dim) + self.upper(dim))
    }

    /// Overlap test with half-open edges: boxes that merely share an edge
    /// do not intersect, so faces tiling a mesh never double-count.
    #[inline]
    pub fn intersects(&self, other: &Box2) -> bool {
        self.xmin < other.xmax
            && other.xmin < self.xmax
            && self.ymin < other.ymax
            && other.ymin < self.ymax
    }

    /// Smallest box covering both operands.
    #[inline]
    pub fn union(&self, other: &Box2) -> Box2 {
        Box2 {
            xmin: self.xmin.min(other.xmin),
            xmax: self.xmax.max(other.xmax),
            ymin: self.ymin.min(other.ymin),
            ymax: self.ymax.max(other.ymax),
        }
    }

    /// Grow in place to cover `p`.
    #[inline]
    pub fn include(&mut self, p: Point) {
        self.xmin = self.xmin.min(p.x);
        self.xmax = self.xmax.max(p.x);
        self.ymin = self.ymin.min(p.y);
        self.ymax = self.ymax.max(p.y);
    }
}
