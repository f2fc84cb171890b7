//! Polygon predicates over vertex rings.
//!
//! The tree queries carry index-based twins of these tests (reading vertices
//! through the face table instead of a contiguous ring); both must keep the
//! same branch structure so that degenerate inputs behave identically.

use super::types::{Point, Vector};

/// 2D cross product `u.x * v.y - u.y * v.x`.
#[inline]
pub fn cross_product(u: Vector, v: Vector) -> f64 {
    u.x * v.y - u.y * v.x
}

/// Area of a polygon via triangle-fan summation from the first vertex.
pub fn polygon_area(ring: &[Point]) -> f64 {
    let a = ring[0];
    let mut u = ring[1] - a;
    let mut area = 0.0;
    for &c in &ring[2..] {
        let v = c - a;
        area += cross_product(u, v).abs();
        u = v;
    }
    0.5 * area
}

/// Franklin's odd-parity crossing test.
///
/// A horizontal ray runs from `p` towards +x; each crossed edge toggles the
/// inside flag. The two conditions must stay in this order: the y-range test
/// guards the division in the x comparison against a zero denominator on
/// horizontal edges. A point exactly on an edge is degenerate; the answer is
/// deterministic but unspecified.
pub fn point_in_polygon(p: Point, ring: &[Point]) -> bool {
    let mut v0 = ring[ring.len() - 1];
    let mut c = false;
    for &v1 in ring {
        if (v0.y > p.y) != (v1.y > p.y)
            && p.x < (v1.x - v0.x) * (p.y - v0.y) / (v1.y - v0.y) + v0.x
        {
            c = !c;
        }
        v0 = v1;
    }
    c
}

/// Odd-parity test that additionally accepts points within `tolerance` of an
/// edge (measured as twice the triangle area spanned with the edge).
///
/// The projection parameter uses whichever edge coordinate is non-degenerate;
/// zero-length edges are skipped.
pub fn point_in_polygon_or_on_edge(p: Point, ring: &[Point], tolerance: f64) -> bool {
    let mut v0 = ring[ring.len() - 1];
    let mut u = v0 - p;
    let mut c = false;
    for &v1 in ring {
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
