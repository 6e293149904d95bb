// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D polygon predicates and earcutr triangulation.
//!
//! Planar 3D polygons are projected into their own plane and tested here.

use nalgebra::{Point2, Point3, Vector3};

use crate::error::{Error, Result};

/// Newell's method: the un-normalized normal whose length is twice the area.
pub fn newell_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let n = points.len();
    let mut normal = Vector3::zeros();
    for i in 0..n {
        let cur = &points[i];
        let next = &points[(i + 1) % n];
        normal.x += (cur.y - next.y) * (cur.z + next.z);
        normal.y += (cur.z - next.z) * (cur.x + next.x);
        normal.z += (cur.x - next.x) * (cur.y + next.y);
    }
    normal
}

/// Signed shoelace area (positive when counterclockwise).
pub fn signed_area(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

/// Area-weighted centroid; falls back to the vertex average for slivers.
pub fn centroid(points: &[Point2<f64>]) -> Point2<f64> {
    let area = signed_area(points);
    let n = points.len();
    if area.abs() < 1e-12 {
        let sum = points.iter().fold(Point2::origin().coords, |acc, p| acc + p.coords);
        return Point2::from(sum / n.max(1) as f64);
    }
    let (mut cx, mut cy) = (0.0, 0.0);
    for i in 0..n {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        let cross = a.x * b.y - b.x * a.y;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }
    Point2::new(cx / (6.0 * area), cy / (6.0 * area))
}

/// Distance from a point to a segment.
pub fn distance_to_segment(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < 1e-24 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Smallest distance from a point to any edge of a closed loop.
pub fn distance_to_loop(p: &Point2<f64>, points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| distance_to_segment(p, &points[i], &points[(i + 1) % n]))
        .fold(f64::INFINITY, f64::min)
}

/// Even-odd ray casting test.
pub fn point_in_polygon(p: &Point2<f64>, points: &[Point2<f64>]) -> bool {
    let n = points.len();
    let mut inside = false;
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let (pi, pj) = (&points[i], &points[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x = (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Inside the loop or on its boundary within `tolerance`.
pub fn contains_point(p: &Point2<f64>, points: &[Point2<f64>], tolerance: f64) -> bool {
    point_in_polygon(p, points) || distance_to_loop(p, points) <= tolerance
}

/// Inside the loop and farther than `tolerance` from its boundary.
pub fn strictly_contains_point(p: &Point2<f64>, points: &[Point2<f64>], tolerance: f64) -> bool {
    point_in_polygon(p, points) && distance_to_loop(p, points) > tolerance
}

fn orient(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// True when the two segments cross at a single interior point.
///
/// Touching endpoints and collinear overlaps within `eps` do not count.
pub fn segments_cross(
    a: &Point2<f64>,
    b: &Point2<f64>,
    c: &Point2<f64>,
    d: &Point2<f64>,
    eps: f64,
) -> bool {
    let d1 = orient(c, d, a);
    let d2 = orient(c, d, b);
    let d3 = orient(a, b, c);
    let d4 = orient(a, b, d);
    ((d1 > eps && d2 < -eps) || (d1 < -eps && d2 > eps))
        && ((d3 > eps && d4 < -eps) || (d3 < -eps && d4 > eps))
}

/// True when any two non-adjacent edges of the loops cross.
pub fn loops_self_intersect(loops: &[Vec<Point2<f64>>], eps: f64) -> bool {
    let mut edges: Vec<(usize, usize, Point2<f64>, Point2<f64>)> = Vec::new();
    for (li, pts) in loops.iter().enumerate() {
        let n = pts.len();
        for i in 0..n {
            edges.push((li, i, pts[i], pts[(i + 1) % n]));
        }
    }
    for (i, e1) in edges.iter().enumerate() {
        for e2 in edges.iter().skip(i + 1) {
            if e1.0 == e2.0 {
                let n = loops[e1.0].len();
                let adjacent = (e1.1 + 1) % n == e2.1 || (e2.1 + 1) % n == e1.1;
                if adjacent {
                    continue;
                }
            }
            if segments_cross(&e1.2, &e1.3, &e2.2, &e2.3, eps) {
                return true;
            }
        }
    }
    false
}

/// Check if a polygon is convex (all cross products have same sign)
#[inline]
fn is_convex(points: &[Point2<f64>]) -> bool {
    if points.len() < 3 {
        return false;
    }

    let n = points.len();
    let mut sign = 0i8;

    for i in 0..n {
        let cross = orient(&points[i], &points[(i + 1) % n], &points[(i + 2) % n]);
        if cross.abs() > 1e-10 {
            let current_sign = if cross > 0.0 { 1i8 } else { -1i8 };
            if sign == 0 {
                sign = current_sign;
            } else if sign != current_sign {
                return false;
            }
        }
    }

    true
}

/// Triangulates a polygon with holes.
///
/// Returns triangle indices into the combined vertex array (outer + all holes).
pub fn triangulate(outer: &[Point2<f64>], holes: &[Vec<Point2<f64>>]) -> Result<Vec<usize>> {
    let n = outer.len();
    if n < 3 {
        return Err(Error::TriangulationError(
            "Need at least 3 points in outer boundary".to_string(),
        ));
    }

    let valid_holes: Vec<&Vec<Point2<f64>>> = holes.iter().filter(|h| h.len() >= 3).collect();

    // FAST PATH: convex polygon without holes - fan triangulation
    if valid_holes.is_empty() && is_convex(outer) {
        let mut indices = Vec::with_capacity((n - 2) * 3);
        for i in 1..n - 1 {
            indices.extend_from_slice(&[0, i, i + 1]);
        }
        return Ok(indices);
    }

    let total_points = n + valid_holes.iter().map(|h| h.len()).sum::<usize>();
    let mut vertices = Vec::with_capacity(total_points * 2);
    for p in outer {
        vertices.push(p.x);
        vertices.push(p.y);
    }

    let mut hole_indices = Vec::with_capacity(valid_holes.len());
    for hole in valid_holes {
        hole_indices.push(vertices.len() / 2);
        for p in hole {
            vertices.push(p.x);
            vertices.push(p.y);
        }
    }

    earcutr::earcut(&vertices, &hole_indices, 2)
        .map_err(|e| Error::TriangulationError(format!("{:?}", e)))
}
