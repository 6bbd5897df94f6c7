// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Contiguous chains of curve segments
//!
//! Two assembly modes exist. [`CurveLoop::append`] accepts segments in any
//! orientation and may flip the accumulated chain to make them meet.
//! [`CurveLoop::push_healed`] assumes the segments arrive in order and
//! repairs small gaps by regenerating a straight neighbour.

use crate::curve::CurveSegment;
use crate::error::{Error, Result};
use crate::tolerance::Tolerance;
use nalgebra::{Matrix4, Point3};

/// How a segment was attached by [`CurveLoop::append`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joint {
    /// The loop was empty
    First,
    /// Attached as given
    Forward,
    /// Attached after reversing the segment
    Reversed,
    /// Attached after flipping the accumulated loop
    LoopFlipped,
}

/// What [`CurveLoop::push_healed`] had to do at a joint
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Repair {
    /// Endpoints already matched within the vertex tolerance
    None,
    /// A line was regenerated across a gap of the given size
    LineRegenerated { gap: f64 },
}

/// Ordered, contiguous sequence of curve segments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurveLoop {
    segments: Vec<CurveSegment>,
}

#[inline]
fn distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (a - b).norm()
}

impl CurveLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap segments without checking contiguity
    pub fn from_segments_unchecked(segments: Vec<CurveSegment>) -> Self {
        Self { segments }
    }

    /// Loop through a sequence of points
    ///
    /// Consecutive points closer than the vertex tolerance are merged.
    pub fn polyline(points: &[Point3<f64>], tolerance: &Tolerance) -> Result<Self> {
        let mut segments = Vec::with_capacity(points.len());
        let mut last: Option<Point3<f64>> = None;
        for p in points {
            match last {
                Some(prev) if distance(&prev, p) <= tolerance.vertex => {}
                Some(prev) => {
                    segments.push(CurveSegment::line(prev, *p));
                    last = Some(*p);
                }
                None => last = Some(*p),
            }
        }
        if segments.is_empty() {
            return Err(Error::degenerate("polyline has fewer than two distinct points"));
        }
        Ok(Self { segments })
    }

    /// Assemble ordered segments, repairing gaps as [`push_healed`](Self::push_healed) does
    pub fn heal(
        segments: impl IntoIterator<Item = CurveSegment>,
        tolerance: &Tolerance,
    ) -> Result<(Self, Vec<Repair>)> {
        let mut curve_loop = Self::new();
        let mut repairs = Vec::new();
        for segment in segments {
            let repair = curve_loop.push_healed(segment, tolerance)?;
            if repair != Repair::None {
                repairs.push(repair);
            }
        }
        Ok((curve_loop, repairs))
    }

    pub fn segments(&self) -> &[CurveSegment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<CurveSegment> {
        self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn start_point(&self) -> Option<Point3<f64>> {
        self.segments.first().map(CurveSegment::start_point)
    }

    pub fn end_point(&self) -> Option<Point3<f64>> {
        self.segments.last().map(CurveSegment::end_point)
    }

    /// Distance between the end of the last segment and the start of the first
    pub fn closure_gap(&self) -> Option<f64> {
        Some(distance(&self.end_point()?, &self.start_point()?))
    }

    pub fn is_closed(&self, tolerance: f64) -> bool {
        self.closure_gap().is_some_and(|gap| gap <= tolerance)
    }

    /// Reverse traversal direction in place
    pub fn flip(&mut self) {
        self.segments.reverse();
        for segment in &mut self.segments {
            *segment = segment.reversed();
        }
    }

    pub fn flipped(&self) -> Self {
        let mut copy = self.clone();
        copy.flip();
        copy
    }

    /// Attach a segment of unknown orientation
    ///
    /// Tries the segment as given, then reversed, then flips the whole
    /// accumulated loop and tries both orientations at its other end.
    pub fn append(&mut self, segment: CurveSegment, tolerance: f64) -> Result<Joint> {
        let (Some(end), Some(start)) = (self.end_point(), self.start_point()) else {
            self.segments.push(segment);
            return Ok(Joint::First);
        };
        let seg_start = segment.start_point();
        let seg_end = segment.end_point();

        if distance(&end, &seg_start) <= tolerance {
            self.segments.push(segment);
            return Ok(Joint::Forward);
        }
        if distance(&end, &seg_end) <= tolerance {
            self.segments.push(segment.reversed());
            return Ok(Joint::Reversed);
        }
        if distance(&start, &seg_start) <= tolerance {
            self.flip();
            self.segments.push(segment);
            return Ok(Joint::LoopFlipped);
        }
        if distance(&start, &seg_end) <= tolerance {
            self.flip();
            self.segments.push(segment.reversed());
            return Ok(Joint::LoopFlipped);
        }

        let gap = [
            distance(&end, &seg_start),
            distance(&end, &seg_end),
            distance(&start, &seg_start),
            distance(&start, &seg_end),
        ]
        .into_iter()
        .fold(f64::INFINITY, f64::min);
        Err(Error::Discontinuous { gap })
    }

    /// Attach an in-order segment, repairing a small gap if a line borders it
    ///
    /// Gaps within the vertex tolerance are snapped when a line borders
    /// the joint. Gaps within the loose tolerance are closed by
    /// regenerating one bordering line. Arc-to-arc gaps beyond the vertex
    /// tolerance are never repaired.
    pub fn push_healed(&mut self, segment: CurveSegment, tolerance: &Tolerance) -> Result<Repair> {
        let Some(prev_end) = self.end_point() else {
            self.segments.push(segment);
            return Ok(Repair::None);
        };
        let gap = distance(&prev_end, &segment.start_point());

        if gap <= tolerance.vertex {
            let joined = self.join_lines(prev_end, segment, tolerance.vertex);
            if let Some(segment) = joined {
                self.segments.push(segment);
            }
            return Ok(Repair::None);
        }

        let next_is_line = segment.is_line();
        let prev_is_line = self.segments.last().is_some_and(CurveSegment::is_line);
        if gap > tolerance.loose() || !(next_is_line || prev_is_line) {
            return Err(Error::Discontinuous { gap });
        }

        if let Some(segment) = self.join_lines(prev_end, segment, tolerance.vertex) {
            self.segments.push(segment);
        }
        Ok(Repair::LineRegenerated { gap })
    }

    /// Move the shared endpoint onto one line; returns the segment to push
    ///
    /// A regenerated line that collapses below the tolerance is dropped.
    fn join_lines(
        &mut self,
        prev_end: Point3<f64>,
        segment: CurveSegment,
        tolerance: f64,
    ) -> Option<CurveSegment> {
        match segment {
            CurveSegment::Line { end, .. } => {
                if distance(&prev_end, &end) <= tolerance {
                    return None;
                }
                Some(CurveSegment::line(prev_end, end))
            }
            arc @ CurveSegment::Arc(_) => {
                let target = arc.start_point();
                if let Some(CurveSegment::Line { start, end }) = self.segments.last_mut() {
                    *end = target;
                    if distance(start, end) <= tolerance {
                        self.segments.pop();
                    }
                }
                Some(arc)
            }
        }
    }

    /// Close the loop, repairing the final joint like an in-order append
    ///
    /// A gap beyond the loose tolerance is bridged by a new line.
    pub fn close(&mut self, tolerance: &Tolerance) -> Result<Repair> {
        let (Some(start), Some(end)) = (self.start_point(), self.end_point()) else {
            return Err(Error::degenerate("cannot close an empty loop"));
        };
        let gap = distance(&start, &end);
        if gap <= tolerance.vertex {
            return Ok(Repair::None);
        }
        let last_is_line = self.segments.last().is_some_and(CurveSegment::is_line);
        let first_is_line = self.segments.first().is_some_and(CurveSegment::is_line);
        if gap <= tolerance.loose() && self.segments.len() > 1 {
            if last_is_line {
                if let Some(CurveSegment::Line { end, .. }) = self.segments.last_mut() {
                    *end = start;
                }
                return Ok(Repair::LineRegenerated { gap });
            }
            if first_is_line {
                if let Some(CurveSegment::Line { start, .. }) = self.segments.first_mut() {
                    *start = end;
                }
                return Ok(Repair::LineRegenerated { gap });
            }
        }
        self.segments.push(CurveSegment::line(end, start));
        Ok(Repair::LineRegenerated { gap })
    }

    pub fn length(&self) -> f64 {
        self.segments.iter().map(CurveSegment::length).sum()
    }

    /// Vertices along the loop without repeated joint points
    ///
    /// For a closed loop the final point (equal to the first) is omitted.
    pub fn tessellate(&self, segments_per_revolution: usize, tolerance: f64) -> Vec<Point3<f64>> {
        let mut points: Vec<Point3<f64>> = Vec::new();
        for segment in &self.segments {
            for p in segment.sample(segments_per_revolution) {
                if points
                    .last()
                    .is_some_and(|last| distance(last, &p) <= tolerance)
                {
                    continue;
                }
                points.push(p);
            }
        }
        if points.len() > 1 && distance(&points[0], &points[points.len() - 1]) <= tolerance {
            points.pop();
        }
        points
    }

    pub fn transformed(&self, m: &Matrix4<f64>) -> Self {
        Self {
            segments: self.segments.iter().map(|s| s.transformed(m)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{ConicArc, Frame};
    use std::f64::consts::{FRAC_PI_2, PI};

    const TIGHT: f64 = 1e-4;

    fn p(x: f64, y: f64) -> Point3<f64> {
        Point3::new(x, y, 0.0)
    }

    fn square_edges() -> Vec<CurveSegment> {
        vec![
            CurveSegment::line(p(0.0, 0.0), p(1.0, 0.0)),
            CurveSegment::line(p(1.0, 0.0), p(1.0, 1.0)),
            CurveSegment::line(p(1.0, 1.0), p(0.0, 1.0)),
            CurveSegment::line(p(0.0, 1.0), p(0.0, 0.0)),
        ]
    }

    #[test]
    fn test_append_closes_for_every_orientation_mix() {
        for mask in 0u32..16 {
            let mut curve_loop = CurveLoop::new();
            for (i, edge) in square_edges().into_iter().enumerate() {
                let edge = if mask & (1 << i) != 0 {
                    edge.reversed()
                } else {
                    edge
                };
                curve_loop.append(edge, TIGHT).unwrap();
            }
            assert!(curve_loop.is_closed(TIGHT), "orientation mask {mask}");
            assert_eq!(curve_loop.len(), 4);
        }
    }

    #[test]
    fn test_append_flips_loop_when_needed() {
        let mut curve_loop = CurveLoop::new();
        curve_loop
            .append(CurveSegment::line(p(1.0, 0.0), p(0.0, 0.0)), TIGHT)
            .unwrap();
        let joint = curve_loop
            .append(CurveSegment::line(p(1.0, 0.0), p(1.0, 1.0)), TIGHT)
            .unwrap();
        assert_eq!(joint, Joint::LoopFlipped);
        assert_eq!(curve_loop.start_point(), Some(p(0.0, 0.0)));
        assert_eq!(curve_loop.end_point(), Some(p(1.0, 1.0)));
    }

    #[test]
    fn test_append_rejects_disjoint_segment() {
        let mut curve_loop = CurveLoop::new();
        curve_loop
            .append(CurveSegment::line(p(0.0, 0.0), p(1.0, 0.0)), TIGHT)
            .unwrap();
        let err = curve_loop
            .append(CurveSegment::line(p(5.0, 5.0), p(6.0, 5.0)), TIGHT)
            .unwrap_err();
        assert!(matches!(err, Error::Discontinuous { .. }));
    }

    fn open_pair(gap: f64) -> (CurveSegment, CurveSegment) {
        (
            CurveSegment::line(p(0.0, 0.0), p(1.0, 0.0)),
            CurveSegment::line(p(1.0 + gap, 0.0), p(1.0 + gap, 1.0)),
        )
    }

    #[test]
    fn test_line_gap_within_loose_tolerance_is_repaired() {
        let tolerance = Tolerance::new(TIGHT);
        let (a, b) = open_pair(4.0 * TIGHT);
        let (curve_loop, repairs) = CurveLoop::heal([a, b], &tolerance).unwrap();
        assert_eq!(repairs.len(), 1);
        assert!(matches!(repairs[0], Repair::LineRegenerated { .. }));
        let segs = curve_loop.segments();
        assert_eq!(segs[0].end_point(), segs[1].start_point());
    }

    #[test]
    fn test_gap_beyond_loose_tolerance_fails() {
        let tolerance = Tolerance::new(TIGHT);
        let (a, b) = open_pair(6.0 * TIGHT);
        assert!(CurveLoop::heal([a, b], &tolerance).is_err());
    }

    #[test]
    fn test_raised_repair_factor_covers_wider_line_gaps_only() {
        let tolerance = Tolerance::new(TIGHT).with_repair_factor(8.0);
        let (a, b) = open_pair(6.0 * TIGHT);
        assert!(CurveLoop::heal([a, b], &tolerance).is_ok());

        let gap = 6.0 * TIGHT;
        let first = CurveSegment::Arc(ConicArc::circular(Frame::world(), 1.0, 0.0, FRAC_PI_2));
        let second = CurveSegment::Arc(ConicArc::circular(
            Frame::at_origin(p(0.0, 2.0 + gap)),
            1.0,
            1.5 * PI,
            2.0 * PI,
        ));
        let err = CurveLoop::heal([first, second], &tolerance).unwrap_err();
        assert!(matches!(err, Error::Discontinuous { .. }));
    }

    #[test]
    fn test_tight_gap_is_snapped_silently() {
        let tolerance = Tolerance::new(TIGHT);
        let (a, b) = open_pair(0.5 * TIGHT);
        let (_, repairs) = CurveLoop::heal([a, b], &tolerance).unwrap();
        assert!(repairs.is_empty());
    }

    #[test]
    fn test_close_and_tessellate() {
        let tolerance = Tolerance::new(TIGHT);
        let points = [p(0.0, 0.0), p(2.0, 0.0), p(2.0, 0.0), p(2.0, 1.0)];
        let mut curve_loop = CurveLoop::polyline(&points, &tolerance).unwrap();
        assert_eq!(curve_loop.len(), 2);
        curve_loop.close(&tolerance).unwrap();
        assert!(curve_loop.is_closed(TIGHT));
        assert_eq!(curve_loop.tessellate(24, TIGHT).len(), 3);
    }

    #[test]
    fn test_flip_reverses_traversal() {
        let mut curve_loop = CurveLoop::from_segments_unchecked(square_edges());
        curve_loop.flip();
        assert_eq!(curve_loop.start_point(), Some(p(0.0, 0.0)));
        assert_eq!(curve_loop.segments()[0].end_point(), p(0.0, 1.0));
    }
}
