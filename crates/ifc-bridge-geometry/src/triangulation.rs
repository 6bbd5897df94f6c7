// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon triangulation and planar projection
//!
//! Wrapper around earcutr for 2D polygon triangulation.

use crate::curve::Frame;
use crate::error::{Error, Result};
use nalgebra::{Point2, Point3, Vector3};

/// Shoelace area; positive for counter-clockwise rings
pub fn signed_area(ring: &[Point2<f64>]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = &ring[i];
        let b = &ring[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

/// Even-odd point-in-polygon test
pub fn point_in_ring(p: &Point2<f64>, ring: &[Point2<f64>]) -> bool {
    let n = ring.len();
    let mut inside = false;
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let (a, b) = (&ring[i], &ring[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[inline]
fn is_convex(ring: &[Point2<f64>]) -> bool {
    let n = ring.len();
    let mut sign = 0i8;
    for i in 0..n {
        let (p0, p1, p2) = (&ring[i], &ring[(i + 1) % n], &ring[(i + 2) % n]);
        let cross = (p1.x - p0.x) * (p2.y - p1.y) - (p1.y - p0.y) * (p2.x - p1.x);
        if cross.abs() > 1e-12 {
            let s = if cross > 0.0 { 1 } else { -1 };
            if sign == 0 {
                sign = s;
            } else if sign != s {
                return false;
            }
        }
    }
    true
}

/// Triangulate a ring with holes
///
/// Indices address the outer ring followed by each hole in order. Holes
/// with fewer than three points are ignored and do not take index space.
pub fn triangulate_with_holes(
    outer: &[Point2<f64>],
    holes: &[Vec<Point2<f64>>],
) -> Result<Vec<usize>> {
    if outer.len() < 3 {
        return Err(Error::triangulation("Need at least 3 points in outer boundary"));
    }
    let holes: Vec<&Vec<Point2<f64>>> = holes.iter().filter(|h| h.len() >= 3).collect();

    // Convex rings without holes fan out
    if holes.is_empty() && is_convex(outer) {
        return Ok((1..outer.len() - 1).flat_map(|i| [0, i, i + 1]).collect());
    }

    let total = outer.len() + holes.iter().map(|h| h.len()).sum::<usize>();
    let mut vertices = Vec::with_capacity(total * 2);
    vertices.extend(outer.iter().flat_map(|p| [p.x, p.y]));
    let mut hole_indices = Vec::with_capacity(holes.len());
    for hole in holes {
        hole_indices.push(vertices.len() / 2);
        vertices.extend(hole.iter().flat_map(|p| [p.x, p.y]));
    }

    earcutr::earcut(&vertices, &hole_indices, 2)
        .map_err(|e| Error::triangulation(format!("{:?}", e)))
}

/// Unit normal by Newell's method; `None` for rings without area
pub fn newell_normal(points: &[Point3<f64>]) -> Option<Vector3<f64>> {
    let n = points.len();
    if n < 3 {
        return None;
    }
    let mut normal = Vector3::<f64>::zeros();
    for i in 0..n {
        let current = &points[i];
        let next = &points[(i + 1) % n];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    let len = normal.norm();
    (len > 1e-14).then(|| normal / len)
}

/// Right-handed in-plane axes for a plane normal
///
/// The X axis is taken from the world axis least aligned with the normal,
/// so that `x × y == normal`.
pub fn plane_basis(origin: Point3<f64>, normal: &Vector3<f64>) -> Frame {
    let (ax, ay, az) = (normal.x.abs(), normal.y.abs(), normal.z.abs());
    let reference = if az >= ax && az >= ay {
        Vector3::x()
    } else if ay >= ax {
        Vector3::z()
    } else {
        Vector3::y()
    };
    let y_axis = normal.cross(&reference).normalize();
    let x_axis = y_axis.cross(normal).normalize();
    Frame::new(origin, x_axis, y_axis)
}

/// Project points into the coordinates of a frame
pub fn project_onto(points: &[Point3<f64>], frame: &Frame) -> Vec<Point2<f64>> {
    points
        .iter()
        .map(|p| {
            let (u, v) = frame.to_local(p);
            Point2::new(u, v)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> Vec<Point2<f64>> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn test_triangulate_square() {
        assert_eq!(triangulate_with_holes(&square(), &[]).unwrap().len(), 6);
        assert_relative_eq!(signed_area(&square()), 1.0);
    }

    #[test]
    fn test_triangulate_with_hole() {
        let outer: Vec<_> = square().iter().map(|p| Point2::new(p.x * 4.0, p.y * 4.0)).collect();
        let mut hole: Vec<_> = square().iter().map(|p| Point2::new(p.x + 1.5, p.y + 1.5)).collect();
        hole.reverse();
        let indices = triangulate_with_holes(&outer, &[hole]).unwrap();
        assert_eq!(indices.len(), 8 * 3);
    }

    #[test]
    fn test_point_in_ring() {
        assert!(point_in_ring(&Point2::new(0.5, 0.5), &square()));
        assert!(!point_in_ring(&Point2::new(1.5, 0.5), &square()));
    }

    #[test]
    fn test_plane_basis_is_right_handed() {
        for normal in [Vector3::z(), -Vector3::x(), Vector3::new(1.0, 1.0, 0.0).normalize()] {
            let frame = plane_basis(Point3::origin(), &normal);
            assert_relative_eq!((frame.normal() - normal).norm(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_newell_normal_follows_winding() {
        let ccw = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.5, 0.5, 0.0),
        ];
        assert_relative_eq!(newell_normal(&ccw).unwrap().z, 1.0, epsilon = 1e-12);
        let line = [Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)];
        assert!(newell_normal(&line).is_none());
    }
}
