// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Offset curves
//!
//! A positive distance moves the curve to the left of its traversal
//! direction, seen from the tip of `normal`.

use crate::curve::{CurveSegment, ParametricCurve};
use crate::curve_loop::CurveLoop;
use crate::error::{Error, Result};
use nalgebra::{Point3, Vector3};

fn left_of(tangent: &Vector3<f64>, normal: &Vector3<f64>) -> Result<Vector3<f64>> {
    let side = normal.cross(tangent);
    let len = side.norm();
    if len <= f64::EPSILON {
        return Err(Error::degenerate("offset direction is parallel to the curve"));
    }
    Ok(side / len)
}

/// Offset a single segment
pub fn offset_segment(
    segment: &CurveSegment,
    distance: f64,
    normal: &Vector3<f64>,
) -> Result<CurveSegment> {
    match segment {
        CurveSegment::Line { start, end } => {
            let shift = left_of(&(end - start), normal)? * distance;
            Ok(CurveSegment::line(start + shift, end + shift))
        }
        CurveSegment::Arc(arc) => {
            if !arc.is_circular() {
                return Err(Error::unsupported("offset of an elliptical arc"));
            }
            // Counter-clockwise about `normal` means the left side is the centre
            let inward = arc.traversal_normal().dot(normal) > 0.0;
            let radius = if inward {
                arc.radius_x - distance
            } else {
                arc.radius_x + distance
            };
            if radius <= f64::EPSILON {
                return Err(Error::degenerate("offset collapses arc radius"));
            }
            let mut shifted = *arc;
            shifted.radius_x = radius;
            shifted.radius_y = radius;
            Ok(CurveSegment::Arc(shifted))
        }
    }
}

/// Offset an unbounded curve
pub fn offset_parametric(
    curve: &ParametricCurve,
    distance: f64,
    normal: &Vector3<f64>,
) -> Result<ParametricCurve> {
    match curve {
        ParametricCurve::Line { origin, direction } => Ok(ParametricCurve::Line {
            origin: origin + left_of(direction, normal)? * distance,
            direction: *direction,
        }),
        ParametricCurve::Circle { frame, radius } => {
            let inward = frame.normal().dot(normal) > 0.0;
            let radius = if inward {
                radius - distance
            } else {
                radius + distance
            };
            if radius <= f64::EPSILON {
                return Err(Error::degenerate("offset collapses circle radius"));
            }
            Ok(ParametricCurve::Circle {
                frame: *frame,
                radius,
            })
        }
        ParametricCurve::Ellipse { .. } => Err(Error::unsupported("offset of an ellipse")),
    }
}

/// Closest point of two infinite lines, `None` if parallel
fn line_intersection(
    p1: &Point3<f64>,
    d1: &Vector3<f64>,
    p2: &Point3<f64>,
    d2: &Vector3<f64>,
) -> Option<Point3<f64>> {
    let w = p1 - p2;
    let a = d1.dot(d1);
    let b = d1.dot(d2);
    let c = d2.dot(d2);
    let denom = a * c - b * b;
    if denom.abs() <= 1e-12 * a * c {
        return None;
    }
    let s = (b * d2.dot(&w) - c * d1.dot(&w)) / denom;
    Some(p1 + d1 * s)
}

/// Reconnect `next` to the end of `joined`
fn reconnect(joined: &mut Vec<CurveSegment>, next: CurveSegment, tolerance: f64) {
    let Some(prev) = joined.last_mut() else {
        joined.push(next);
        return;
    };
    let prev_end = prev.end_point();
    let gap = (prev_end - next.start_point()).norm();
    if gap <= tolerance {
        joined.push(next);
        return;
    }
    if let (
        CurveSegment::Line { start: ps, end: pe },
        CurveSegment::Line { start: ns, end: ne },
    ) = (&mut *prev, &next)
    {
        if let Some(corner) = line_intersection(ps, &(*pe - *ps), ns, &(ne - ns)) {
            *pe = corner;
            joined.push(CurveSegment::line(corner, *ne));
            return;
        }
    }
    joined.push(CurveSegment::line(prev_end, next.start_point()));
    joined.push(next);
}

/// Offset every segment of a loop and reconnect the pieces
///
/// Adjacent lines meet at their intersection; other joints are bridged
/// by a straight segment.
pub fn offset_loop(
    curve_loop: &CurveLoop,
    distance: f64,
    normal: &Vector3<f64>,
    tolerance: f64,
) -> Result<CurveLoop> {
    let closed = curve_loop.is_closed(tolerance);
    let mut joined: Vec<CurveSegment> = Vec::with_capacity(curve_loop.len());
    for segment in curve_loop.segments() {
        reconnect(&mut joined, offset_segment(segment, distance, normal)?, tolerance);
    }

    if closed && joined.len() > 1 {
        let first = joined.remove(0);
        reconnect(&mut joined, first, tolerance);
        // The first segment now sits at the tail; rotate it back to the front
        if let Some(last) = joined.pop() {
            joined.insert(0, last);
        }
    }
    Ok(CurveLoop::from_segments_unchecked(joined))
}
