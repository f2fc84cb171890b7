//! Line clippers.
//!
//! Cohen–Sutherland and Liang–Barsky clip a segment against a box; the
//! former is the production prune, the latter serves as its test oracle.
//! Cyrus–Beck clips a segment against a convex face and yields the
//! parametric entry/exit interval the edge locator reports.

use super::types::{Box2, Point, Vector};

const INSIDE: u8 = 0b0000;
const LEFT: u8 = 0b0001;
const RIGHT: u8 = 0b0010;
const LOWER: u8 = 0b0100;
const UPPER: u8 = 0b1000;

/// Region code of `p` relative to the clip box.
#[inline]
fn clip_code(p: Point, clip: &Box2) -> u8 {
    let mut code = INSIDE;

    if p.x < clip.xmin {
        code |= LEFT;
    } else if p.x > clip.xmax {
        code |= RIGHT;
    }

    if p.y < clip.ymin {
        code |= LOWER;
    } else if p.y > clip.ymax {
        code |= UPPER;
    }
    code
}

/// Cohen–Sutherland segment/box clip.
///
/// Iteratively trims whichever endpoint still lies outside, testing its
/// region code in the fixed order UPPER, LOWER, RIGHT, LEFT, until the
/// segment is trivially accepted (both codes zero) or trivially rejected
/// (codes share a bit). Returns the clipped endpoints, or `None` on a miss.
pub fn cohen_sutherland_line_box_clip(a: Point, b: Point, clip: &Box2) -> Option<(Point, Point)> {
    let mut a = a;
    let mut b = b;
    let mut k1 = clip_code(a, clip);
    let mut k2 = clip_code(b, clip);

    while k1 | k2 != INSIDE {
        if k1 & k2 != INSIDE {
            return None;
        }

        // Trim the first endpoint that is still outside.
        let out = if k1 != INSIDE { k1 } else { k2 };
        let (x, y) = if out & UPPER != 0 {
            (
                a.x + (b.x - a.x) * (clip.ymax - a.y) / (b.y - a.y),
                clip.ymax,
            )
        } else if out & LOWER != 0 {
            (
                a.x + (b.x - a.x) * (clip.ymin - a.y) / (b.y - a.y),
                clip.ymin,
            )
        } else if out & RIGHT != 0 {
            (
                clip.xmax,
                a.y + (b.y - a.y) * (clip.xmax - a.x) / (b.x - a.x),
            )
        } else {
            (
                clip.xmin,
                a.y + (b.y - a.y) * (clip.xmin - a.x) / (b.x - a.x),
            )
        };

        if out == k1 {
            a = Point::new(x, y);
            k1 = clip_code(a, clip);
        } else {
            b = Point::new(x, y);
            k2 = clip_code(b, clip);
        }
    }
    Some((a, b))
}

/// Liang–Barsky parametric segment/box clip.
///
/// Returns the parameters `(t0, t1)` of the clipped sub-segment along
/// `a → b`, or `None` on a miss. Accept/reject decisions agree with
/// [`cohen_sutherland_line_box_clip`]; the property tests hold the two
/// against each other.
pub fn liang_barsky_line_box_clip(a: Point, b: Point, clip: &Box2) -> Option<(f64, f64)> {
    let d = b - a;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    let checks = [
        (-d.x, a.x - clip.xmin),
        (d.x, clip.xmax - a.x),
        (-d.y, a.y - clip.ymin),
        (d.y, clip.ymax - a.y),
    ];
    for (p, q) in checks {
        if p == 0.0 {
            // Parallel to this clip edge: fully inside or fully outside.
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                if r > t0 {
                    t0 = r;
                }
            } else {
                if r < t0 {
                    return None;
                }
                if r < t1 {
                    t1 = r;
                }
            }
        }
    }
    Some((t0, t1))
}

/// Cyrus–Beck clip of the directed segment `a → b` against a convex CCW
/// face, read through the trimmed vertex index slice `face`.
///
/// Returns the parametric entry/exit `(t0, t1)` within `[0, 1]` of the
/// sub-segment inside the face, or `None` when the intersection is empty.
/// A zero-length segment degrades to a point-membership test against the
/// convex face and reports `t0 == t1 == 0`. Non-convex faces are the
/// caller's responsibility; the interval is then meaningless.
pub fn cyrus_beck_line_polygon_clip(
    a: Point,
    b: Point,
    vertices: &[Point],
    face: &[i32],
) -> Option<(f64, f64)> {
    let d = b - a;
    let mut v0 = vertices[face[face.len() - 1] as usize];

    if d.x == 0.0 && d.y == 0.0 {
        for &index in face {
            let v1 = vertices[index as usize];
            let edge = v1 - v0;
            // Outward normal of a CCW edge is the edge rotated 90 degrees
            // clockwise.
            let n = Vector::new(edge.y, -edge.x);
            if n.dot(&(a - v0)) > 0.0 {
                return None;
            }
            v0 = v1;
        }
        return Some((0.0, 0.0));
    }

    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    for &index in face {
        let v1 = vertices[index as usize];
        let edge = v1 - v0;
        let n = Vector::new(edge.y, -edge.x);
        let den = n.dot(&d);
        let num = n.dot(&(a - v0));

        if den == 0.0 {
            // Parallel to this edge: the whole segment is on one side of
            // its half-plane.
            if num > 0.0 {
                return None;
            }
        } else {
            let t = -num / den;
            if den < 0.0 {
                // Entering the half-plane.
                if t > t0 {
                    t0 = t;
                }
            } else {
                // Leaving the half-plane.
                if t < t1 {
                    t1 = t;
                }
            }
            if t0 > t1 {
                return None;
            }
        }
        v0 = v1;
    }
    Some((t0, t1))
}
