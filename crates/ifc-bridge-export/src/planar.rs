// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Curve loops flattened onto a projection plane
//!
//! Lines and circular arcs whose axis is parallel to the projection
//! direction keep their form; any other conic is sampled into lines.

use crate::error::{ExportError, Result};
use ifc_bridge_geometry::{signed_area, CurveLoop, CurveSegment, Frame, Point2, Vector2};
use std::f64::consts::TAU;

/// Below this deviation an arc axis counts as parallel to the plane normal
const AXIS_EPSILON: f64 = 1e-9;

#[inline]
fn cross(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Circular arc in plane coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arc2 {
    pub center: Point2<f64>,
    pub radius: f64,
    pub start: Point2<f64>,
    pub end: Point2<f64>,
    /// Signed sweep in radians, positive counter-clockwise
    pub sweep: f64,
}

impl Arc2 {
    fn start_angle(&self) -> f64 {
        let d = self.start - self.center;
        d.y.atan2(d.x)
    }

    pub fn point_at(&self, t: f64) -> Point2<f64> {
        let a = self.start_angle() + t;
        self.center + Vector2::new(a.cos(), a.sin()) * self.radius
    }

    pub fn mid_point(&self) -> Point2<f64> {
        self.point_at(self.sweep / 2.0)
    }

    pub fn is_full(&self) -> bool {
        self.sweep.abs() >= TAU - 1e-9
    }

    pub fn reversed(&self) -> Self {
        Self {
            start: self.end,
            end: self.start,
            sweep: -self.sweep,
            ..*self
        }
    }

    /// The arc cut in two equal halves
    pub fn halves(&self) -> (Self, Self) {
        let mid = self.mid_point();
        let half = self.sweep / 2.0;
        (
            Self {
                end: mid,
                sweep: half,
                ..*self
            },
            Self {
                start: mid,
                sweep: half,
                ..*self
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment2 {
    Line { start: Point2<f64>, end: Point2<f64> },
    Arc(Arc2),
}

impl Segment2 {
    pub fn is_line(&self) -> bool {
        matches!(self, Segment2::Line { .. })
    }

    pub fn start(&self) -> Point2<f64> {
        match self {
            Segment2::Line { start, .. } => *start,
            Segment2::Arc(arc) => arc.start,
        }
    }

    pub fn end(&self) -> Point2<f64> {
        match self {
            Segment2::Line { end, .. } => *end,
            Segment2::Arc(arc) => arc.end,
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            Segment2::Line { start, end } => Segment2::Line {
                start: *end,
                end: *start,
            },
            Segment2::Arc(arc) => Segment2::Arc(arc.reversed()),
        }
    }

    /// Points from the start, excluding the end point
    fn sample_into(&self, segments_per_revolution: usize, out: &mut Vec<Point2<f64>>) {
        match self {
            Segment2::Line { start, .. } => out.push(*start),
            Segment2::Arc(arc) => {
                let n = ((arc.sweep.abs() / TAU * segments_per_revolution as f64).ceil() as usize).max(2);
                let step = arc.sweep / n as f64;
                out.extend((0..n).map(|i| arc.point_at(step * i as f64)));
            }
        }
    }
}

/// Closed loop of plane segments
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlanarLoop {
    segments: Vec<Segment2>,
}

impl PlanarLoop {
    pub fn new(segments: Vec<Segment2>) -> Self {
        Self { segments }
    }

    /// Closed polygon through `points`
    pub fn polygon(points: &[Point2<f64>]) -> Self {
        let n = points.len();
        Self::new(
            (0..n)
                .map(|i| Segment2::Line {
                    start: points[i],
                    end: points[(i + 1) % n],
                })
                .collect(),
        )
    }

    /// Flatten a closed 3D loop onto `plane`
    pub fn project(
        curve_loop: &CurveLoop,
        plane: &Frame,
        segments_per_revolution: usize,
        tolerance: f64,
    ) -> Result<Self> {
        if curve_loop.is_empty() {
            return Err(ExportError::EmptyLoop);
        }
        if let Some(gap) = curve_loop.closure_gap().filter(|gap| *gap > tolerance) {
            return Err(ExportError::OpenLoop { gap });
        }
        let normal = plane.normal();
        let local = |p: &ifc_bridge_geometry::Point3<f64>| {
            let (u, v) = plane.to_local(p);
            Point2::new(u, v)
        };

        let mut segments = Vec::with_capacity(curve_loop.len());
        for segment in curve_loop.segments() {
            match segment {
                CurveSegment::Line { start, end } => segments.push(Segment2::Line {
                    start: local(start),
                    end: local(end),
                }),
                CurveSegment::Arc(arc) => {
                    let alignment = arc.traversal_normal().dot(&normal);
                    if arc.is_circular() && alignment.abs() > 1.0 - AXIS_EPSILON {
                        let sweep = arc.sweep() * alignment.signum();
                        segments.push(Segment2::Arc(Arc2 {
                            center: local(&arc.center()),
                            radius: arc.radius_x,
                            start: local(&arc.start_point()),
                            end: local(&arc.end_point()),
                            sweep,
                        }));
                    } else {
                        let points = arc.sample(segments_per_revolution);
                        segments.extend(points.windows(2).map(|w| Segment2::Line {
                            start: local(&w[0]),
                            end: local(&w[1]),
                        }));
                    }
                }
            }
        }
        Ok(Self::new(segments))
    }

    pub fn segments(&self) -> &[Segment2] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_all_lines(&self) -> bool {
        self.segments.iter().all(Segment2::is_line)
    }

    /// Start points of the segments, for loops made of lines only
    pub fn corners(&self) -> Option<Vec<Point2<f64>>> {
        self.is_all_lines()
            .then(|| self.segments.iter().map(Segment2::start).collect())
    }

    /// Vertex ring with arcs sampled
    pub fn points(&self, segments_per_revolution: usize) -> Vec<Point2<f64>> {
        let mut out = Vec::new();
        for segment in &self.segments {
            segment.sample_into(segments_per_revolution, &mut out);
        }
        out
    }

    /// Positive for counter-clockwise loops
    pub fn signed_area(&self) -> f64 {
        if let [Segment2::Arc(arc)] = self.segments.as_slice() {
            return arc.sweep.signum() * std::f64::consts::PI * arc.radius * arc.radius;
        }
        signed_area(&self.points(64))
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.segments.iter().rev().map(Segment2::reversed).collect())
    }

    /// The loop turned counter-clockwise (`ccw`) or clockwise
    pub fn with_winding(self, ccw: bool) -> Self {
        if (self.signed_area() > 0.0) == ccw {
            self
        } else {
            self.reversed()
        }
    }

    /// Drop zero-length lines and merge consecutive collinear ones
    pub fn merge_collinear(&self, tolerance: f64) -> Self {
        let mut out: Vec<Segment2> = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            if let Segment2::Line { start, end } = segment {
                if (end - start).norm() <= tolerance {
                    continue;
                }
                if let Some(Segment2::Line { start: s, end: e }) = out.last_mut() {
                    if continues_line(s, e, end, tolerance) {
                        *e = *end;
                        continue;
                    }
                }
            }
            out.push(segment.clone());
        }
        // Seam between the last and first segments
        while out.len() > 2 {
            let (Some(Segment2::Line { start: s, end: e }), Some(Segment2::Line { end: first_end, .. })) =
                (out.last().cloned(), out.first().cloned())
            else {
                break;
            };
            if !continues_line(&s, &e, &first_end, tolerance) {
                break;
            }
            out.pop();
            out[0] = Segment2::Line { start: s, end: first_end };
        }
        Self::new(out)
    }
}

/// Whether `next` lies on the ray from `start` through `end`, beyond `end`
fn continues_line(start: &Point2<f64>, end: &Point2<f64>, next: &Point2<f64>, tolerance: f64) -> bool {
    let d = end - start;
    let Some(u) = d.try_normalize(f64::EPSILON) else {
        return false;
    };
    let n = next - end;
    cross(&u, &n).abs() <= tolerance && u.dot(&n) > 0.0
}

/// Intersection of the infinite lines through two segments
pub(crate) fn line_intersection(a: &Segment2, b: &Segment2) -> Option<Point2<f64>> {
    let (p, d1) = (a.start(), a.end() - a.start());
    let (q, d2) = (b.start(), b.end() - b.start());
    let denom = cross(&d1, &d2);
    if denom.abs() <= f64::EPSILON * d1.norm() * d2.norm() {
        return None;
    }
    let t = cross(&(q - p), &d2) / denom;
    Some(p + d1 * t)
}

pub(crate) fn turn(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    cross(&(b - a), &(c - b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ifc_bridge_geometry::{ConicArc, Point3, Tolerance, Vector3};

    fn square() -> PlanarLoop {
        PlanarLoop::polygon(&[
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ])
    }

    #[test]
    fn test_winding_normalization() {
        let ccw = square();
        assert!(ccw.signed_area() > 0.0);
        let cw = ccw.reversed();
        assert_relative_eq!(cw.signed_area(), -4.0, epsilon = 1e-12);
        assert!(cw.clone().with_winding(true).signed_area() > 0.0);
        assert_eq!(cw.clone().with_winding(false), cw);
    }

    #[test]
    fn test_merge_collinear_across_seam() {
        // Start in the middle of the bottom edge, with a split right edge
        let l = PlanarLoop::polygon(&[
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(2.0, 2.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
            Point2::new(0.0, 0.0),
        ]);
        let merged = l.merge_collinear(1e-9);
        assert_eq!(merged.len(), 4);
        assert_relative_eq!(merged.signed_area(), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_project_keeps_parallel_arcs() {
        let plane = Frame::new(Point3::new(0.0, 0.0, 5.0), Vector3::x(), Vector3::y());
        let frame = Frame::new(Point3::new(1.0, 1.0, 5.0), Vector3::x(), Vector3::y());
        let circle = CurveLoop::from_segments_unchecked(vec![CurveSegment::Arc(
            ConicArc::circular(frame, 2.0, 0.0, TAU),
        )]);
        let projected = PlanarLoop::project(&circle, &plane, 24, 1e-9).unwrap();
        let [Segment2::Arc(arc)] = projected.segments() else {
            panic!("expected a single arc");
        };
        assert_relative_eq!(arc.center.x, 1.0, epsilon = 1e-12);
        assert!(arc.is_full());

        // Seen from below the circle runs clockwise
        let below = Frame::new(Point3::origin(), Vector3::x(), -Vector3::y());
        let projected = PlanarLoop::project(&circle, &below, 24, 1e-9).unwrap();
        assert!(projected.signed_area() < 0.0);
    }

    #[test]
    fn test_project_samples_tilted_arcs() {
        let tilted = Frame::new(Point3::origin(), Vector3::x(), Vector3::z());
        let mut curve_loop = CurveLoop::new();
        let arc = ConicArc::circular(tilted, 1.0, 0.0, std::f64::consts::PI);
        curve_loop.append(CurveSegment::Arc(arc), 1e-9).unwrap();
        curve_loop
            .close(&Tolerance::new(1e-9))
            .unwrap();
        let projected = PlanarLoop::project(&curve_loop, &Frame::world(), 8, 1e-9).unwrap();
        assert!(projected.is_all_lines());
    }

    #[test]
    fn test_open_loop_is_rejected() {
        let open = CurveLoop::from_segments_unchecked(vec![CurveSegment::line(
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
        )]);
        let err = PlanarLoop::project(&open, &Frame::world(), 24, 1e-6).unwrap_err();
        assert!(matches!(err, ExportError::OpenLoop { .. }));
    }
}
