// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parametric curves and the bounded segments cut from them
//!
//! Conic parameters are angles in radians. Line parameters are measured in
//! multiples of the line's direction vector, which keeps its magnitude.

use crate::error::{Error, Result};
use crate::tolerance::ANGLE_EPSILON;
use nalgebra::{Matrix4, Point3, Vector3};
use std::f64::consts::TAU;

/// Wrap an angle into `[0, 2π)`
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

#[inline]
fn unit_or(v: Vector3<f64>, fallback: Vector3<f64>) -> Vector3<f64> {
    let len = v.norm();
    if len > f64::EPSILON {
        v / len
    } else {
        fallback
    }
}

/// Origin and in-plane axes of a conic
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub origin: Point3<f64>,
    pub x_axis: Vector3<f64>,
    pub y_axis: Vector3<f64>,
}

impl Frame {
    pub fn new(origin: Point3<f64>, x_axis: Vector3<f64>, y_axis: Vector3<f64>) -> Self {
        Self {
            origin,
            x_axis,
            y_axis,
        }
    }

    /// World XY frame
    pub fn world() -> Self {
        Self::new(Point3::origin(), Vector3::x(), Vector3::y())
    }

    /// World-aligned frame at `origin`
    pub fn at_origin(origin: Point3<f64>) -> Self {
        Self::new(origin, Vector3::x(), Vector3::y())
    }

    /// Frame spanned by the X and Y columns of a placement matrix
    pub fn from_matrix(m: &Matrix4<f64>) -> Self {
        let origin = m.transform_point(&Point3::origin());
        let x_axis = unit_or(m.transform_vector(&Vector3::x()), Vector3::x());
        let y_axis = unit_or(m.transform_vector(&Vector3::y()), Vector3::y());
        Self::new(origin, x_axis, y_axis)
    }

    /// Plane normal (`x × y`)
    pub fn normal(&self) -> Vector3<f64> {
        self.x_axis.cross(&self.y_axis)
    }

    /// Point at local coordinates
    #[inline]
    pub fn at(&self, u: f64, v: f64) -> Point3<f64> {
        self.origin + self.x_axis * u + self.y_axis * v
    }

    /// Local coordinates of a point projected onto the frame plane
    #[inline]
    pub fn to_local(&self, p: &Point3<f64>) -> (f64, f64) {
        let d = p - self.origin;
        (d.dot(&self.x_axis), d.dot(&self.y_axis))
    }
}

/// Unbounded analytic curve
#[derive(Debug, Clone, PartialEq)]
pub enum ParametricCurve {
    Line {
        origin: Point3<f64>,
        direction: Vector3<f64>,
    },
    Circle {
        frame: Frame,
        radius: f64,
    },
    Ellipse {
        frame: Frame,
        semi_axis1: f64,
        semi_axis2: f64,
    },
}

impl ParametricCurve {
    /// Closed curves repeat every 2π
    pub fn is_cyclic(&self) -> bool {
        !matches!(self, ParametricCurve::Line { .. })
    }

    pub fn point_at(&self, t: f64) -> Point3<f64> {
        match self {
            ParametricCurve::Line { origin, direction } => origin + direction * t,
            ParametricCurve::Circle { frame, radius } => {
                frame.at(radius * t.cos(), radius * t.sin())
            }
            ParametricCurve::Ellipse {
                frame,
                semi_axis1,
                semi_axis2,
            } => frame.at(semi_axis1 * t.cos(), semi_axis2 * t.sin()),
        }
    }

    /// Parameter of a point on the curve
    ///
    /// Returns `None` when the point lies farther than `tolerance` from
    /// the curve.
    pub fn parameter_of(&self, p: &Point3<f64>, tolerance: f64) -> Option<f64> {
        let t = match self {
            ParametricCurve::Line { origin, direction } => {
                let len2 = direction.norm_squared();
                if len2 < f64::EPSILON {
                    return None;
                }
                (p - origin).dot(direction) / len2
            }
            ParametricCurve::Circle { frame, .. } => {
                let (u, v) = frame.to_local(p);
                normalize_angle(v.atan2(u))
            }
            ParametricCurve::Ellipse {
                frame,
                semi_axis1,
                semi_axis2,
            } => {
                if *semi_axis1 <= 0.0 || *semi_axis2 <= 0.0 {
                    return None;
                }
                let (u, v) = frame.to_local(p);
                normalize_angle((v / semi_axis2).atan2(u / semi_axis1))
            }
        };
        ((self.point_at(t) - p).norm() <= tolerance).then_some(t)
    }

    /// Bounded portion traversed from `start` to `end`
    ///
    /// Conics sweep counter-clockwise from `start`; an empty sweep is a
    /// full revolution.
    pub fn segment(&self, start: f64, end: f64) -> Result<CurveSegment> {
        match self {
            ParametricCurve::Line { .. } => {
                let a = self.point_at(start);
                let b = self.point_at(end);
                if (b - a).norm() <= f64::EPSILON {
                    return Err(Error::degenerate("zero-length line segment"));
                }
                Ok(CurveSegment::Line { start: a, end: b })
            }
            ParametricCurve::Circle { frame, radius } => {
                if *radius <= 0.0 {
                    return Err(Error::degenerate("circle with non-positive radius"));
                }
                Ok(CurveSegment::Arc(ConicArc::new(
                    *frame, *radius, *radius, start, end,
                )))
            }
            ParametricCurve::Ellipse {
                frame,
                semi_axis1,
                semi_axis2,
            } => {
                if *semi_axis1 <= 0.0 || *semi_axis2 <= 0.0 {
                    return Err(Error::degenerate("ellipse with non-positive semi axis"));
                }
                Ok(CurveSegment::Arc(ConicArc::new(
                    *frame,
                    *semi_axis1,
                    *semi_axis2,
                    start,
                    end,
                )))
            }
        }
    }

    /// The whole closed curve as a single segment
    pub fn full_segment(&self) -> Result<CurveSegment> {
        if !self.is_cyclic() {
            return Err(Error::unsupported("an unbounded line has no full segment"));
        }
        self.segment(0.0, TAU)
    }

    pub fn transformed(&self, m: &Matrix4<f64>) -> Self {
        match self {
            ParametricCurve::Line { origin, direction } => ParametricCurve::Line {
                origin: m.transform_point(origin),
                direction: m.transform_vector(direction),
            },
            ParametricCurve::Circle { frame, radius } => {
                let (frame, rx, ry) = transform_conic(frame, *radius, *radius, m);
                if is_circular(rx, ry) {
                    ParametricCurve::Circle { frame, radius: rx }
                } else {
                    ParametricCurve::Ellipse {
                        frame,
                        semi_axis1: rx,
                        semi_axis2: ry,
                    }
                }
            }
            ParametricCurve::Ellipse {
                frame,
                semi_axis1,
                semi_axis2,
            } => {
                let (frame, rx, ry) = transform_conic(frame, *semi_axis1, *semi_axis2, m);
                ParametricCurve::Ellipse {
                    frame,
                    semi_axis1: rx,
                    semi_axis2: ry,
                }
            }
        }
    }
}

#[inline]
fn is_circular(rx: f64, ry: f64) -> bool {
    (rx - ry).abs() <= 1e-9 * rx.abs().max(ry.abs()).max(1.0)
}

fn transform_conic(frame: &Frame, rx: f64, ry: f64, m: &Matrix4<f64>) -> (Frame, f64, f64) {
    let origin = m.transform_point(&frame.origin);
    let x = m.transform_vector(&(frame.x_axis * rx));
    let y = m.transform_vector(&(frame.y_axis * ry));
    let (rx, ry) = (x.norm(), y.norm());
    let frame = Frame::new(
        origin,
        unit_or(x, frame.x_axis),
        unit_or(y, frame.y_axis),
    );
    (frame, rx, ry)
}

/// Bounded elliptical or circular arc
///
/// `start_angle < end_angle` always holds; the sweep is counter-clockwise
/// about the frame normal unless `reversed` is set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConicArc {
    pub frame: Frame,
    pub radius_x: f64,
    pub radius_y: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub reversed: bool,
}

impl ConicArc {
    pub fn new(frame: Frame, radius_x: f64, radius_y: f64, start: f64, end: f64) -> Self {
        let start_angle = normalize_angle(start);
        let mut sweep = (end - start).rem_euclid(TAU);
        if sweep < ANGLE_EPSILON || sweep >= TAU {
            sweep = TAU;
        }
        Self {
            frame,
            radius_x,
            radius_y,
            start_angle,
            end_angle: start_angle + sweep,
            reversed: false,
        }
    }

    pub fn circular(frame: Frame, radius: f64, start: f64, end: f64) -> Self {
        Self::new(frame, radius, radius, start, end)
    }

    /// Circular arc from `start` through `mid` to `end`
    pub fn through_points(start: Point3<f64>, mid: Point3<f64>, end: Point3<f64>) -> Result<Self> {
        let u = mid - start;
        let v = end - start;
        let w = u.cross(&v);
        let w2 = w.norm_squared();
        if w2 <= f64::EPSILON * u.norm_squared().max(v.norm_squared()).max(1.0) {
            return Err(Error::degenerate("three point arc through collinear points"));
        }
        let center = start + (v.cross(&w) * u.norm_squared() + w.cross(&u) * v.norm_squared()) / (2.0 * w2);
        let radius = (start - center).norm();
        let x_axis = (start - center) / radius;
        let normal = w / w2.sqrt();
        let frame = Frame::new(center, x_axis, normal.cross(&x_axis));
        let (ex, ey) = frame.to_local(&end);
        Ok(Self::circular(frame, radius, 0.0, ey.atan2(ex)))
    }

    pub fn sweep(&self) -> f64 {
        self.end_angle - self.start_angle
    }

    pub fn is_circular(&self) -> bool {
        is_circular(self.radius_x, self.radius_y)
    }

    pub fn is_full(&self) -> bool {
        self.sweep() >= TAU - ANGLE_EPSILON
    }

    pub fn center(&self) -> Point3<f64> {
        self.frame.origin
    }

    /// Normal about which the traversal turns counter-clockwise
    pub fn traversal_normal(&self) -> Vector3<f64> {
        let n = self.frame.normal();
        if self.reversed {
            -n
        } else {
            n
        }
    }

    #[inline]
    pub fn point_at_angle(&self, angle: f64) -> Point3<f64> {
        self.frame
            .at(self.radius_x * angle.cos(), self.radius_y * angle.sin())
    }

    fn derivative_at(&self, angle: f64) -> Vector3<f64> {
        self.frame.x_axis * (-self.radius_x * angle.sin())
            + self.frame.y_axis * (self.radius_y * angle.cos())
    }

    pub fn start_point(&self) -> Point3<f64> {
        if self.reversed {
            self.point_at_angle(self.end_angle)
        } else {
            self.point_at_angle(self.start_angle)
        }
    }

    pub fn end_point(&self) -> Point3<f64> {
        if self.reversed {
            self.point_at_angle(self.start_angle)
        } else {
            self.point_at_angle(self.end_angle)
        }
    }

    /// Unit tangent at the start, in traversal direction
    pub fn start_tangent(&self) -> Vector3<f64> {
        if self.reversed {
            -self.derivative_at(self.end_angle).normalize()
        } else {
            self.derivative_at(self.start_angle).normalize()
        }
    }

    /// Unit tangent at the end, in traversal direction
    pub fn end_tangent(&self) -> Vector3<f64> {
        if self.reversed {
            -self.derivative_at(self.start_angle).normalize()
        } else {
            self.derivative_at(self.end_angle).normalize()
        }
    }

    pub fn reversed(&self) -> Self {
        Self {
            reversed: !self.reversed,
            ..*self
        }
    }

    /// Points in traversal order, both endpoints included
    pub fn sample(&self, segments_per_revolution: usize) -> Vec<Point3<f64>> {
        let fraction = self.sweep() / TAU;
        let n = ((fraction * segments_per_revolution as f64).ceil() as usize).max(2);
        let step = self.sweep() / n as f64;
        let mut points: Vec<Point3<f64>> = (0..=n)
            .map(|i| self.point_at_angle(self.start_angle + step * i as f64))
            .collect();
        if self.reversed {
            points.reverse();
        }
        points
    }

    pub fn length(&self) -> f64 {
        if self.is_circular() {
            return self.radius_x * self.sweep();
        }
        self.sample(256)
            .windows(2)
            .map(|w| (w[1] - w[0]).norm())
            .sum()
    }

    pub fn transformed(&self, m: &Matrix4<f64>) -> Self {
        let (frame, radius_x, radius_y) =
            transform_conic(&self.frame, self.radius_x, self.radius_y, m);
        Self {
            frame,
            radius_x,
            radius_y,
            ..*self
        }
    }
}

/// Bounded piece of a curve loop
#[derive(Debug, Clone, PartialEq)]
pub enum CurveSegment {
    Line {
        start: Point3<f64>,
        end: Point3<f64>,
    },
    Arc(ConicArc),
}

impl CurveSegment {
    pub fn line(start: Point3<f64>, end: Point3<f64>) -> Self {
        CurveSegment::Line { start, end }
    }

    pub fn is_line(&self) -> bool {
        matches!(self, CurveSegment::Line { .. })
    }

    pub fn start_point(&self) -> Point3<f64> {
        match self {
            CurveSegment::Line { start, .. } => *start,
            CurveSegment::Arc(arc) => arc.start_point(),
        }
    }

    pub fn end_point(&self) -> Point3<f64> {
        match self {
            CurveSegment::Line { end, .. } => *end,
            CurveSegment::Arc(arc) => arc.end_point(),
        }
    }

    pub fn start_tangent(&self) -> Vector3<f64> {
        match self {
            CurveSegment::Line { start, end } => unit_or(end - start, Vector3::x()),
            CurveSegment::Arc(arc) => arc.start_tangent(),
        }
    }

    pub fn end_tangent(&self) -> Vector3<f64> {
        match self {
            CurveSegment::Line { start, end } => unit_or(end - start, Vector3::x()),
            CurveSegment::Arc(arc) => arc.end_tangent(),
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            CurveSegment::Line { start, end } => CurveSegment::Line {
                start: *end,
                end: *start,
            },
            CurveSegment::Arc(arc) => CurveSegment::Arc(arc.reversed()),
        }
    }

    pub fn length(&self) -> f64 {
        match self {
            CurveSegment::Line { start, end } => (end - start).norm(),
            CurveSegment::Arc(arc) => arc.length(),
        }
    }

    /// Points in traversal order, both endpoints included
    pub fn sample(&self, segments_per_revolution: usize) -> Vec<Point3<f64>> {
        match self {
            CurveSegment::Line { start, end } => vec![*start, *end],
            CurveSegment::Arc(arc) => arc.sample(segments_per_revolution),
        }
    }

    pub fn transformed(&self, m: &Matrix4<f64>) -> Self {
        match self {
            CurveSegment::Line { start, end } => CurveSegment::Line {
                start: m.transform_point(start),
                end: m.transform_point(end),
            },
            CurveSegment::Arc(arc) => CurveSegment::Arc(arc.transformed(m)),
        }
    }
}

/// Geometry carried by a curve entity: one analytic curve or one loop
#[derive(Debug, Clone, PartialEq)]
pub enum CurveGeometry {
    Parametric(ParametricCurve),
    Loop(crate::curve_loop::CurveLoop),
}

impl CurveGeometry {
    pub fn as_parametric(&self) -> Option<&ParametricCurve> {
        match self {
            CurveGeometry::Parametric(c) => Some(c),
            CurveGeometry::Loop(_) => None,
        }
    }

    pub fn as_loop(&self) -> Option<&crate::curve_loop::CurveLoop> {
        match self {
            CurveGeometry::Loop(l) => Some(l),
            CurveGeometry::Parametric(_) => None,
        }
    }

    pub fn transformed(&self, m: &Matrix4<f64>) -> Self {
        match self {
            CurveGeometry::Parametric(c) => CurveGeometry::Parametric(c.transformed(m)),
            CurveGeometry::Loop(l) => CurveGeometry::Loop(l.transformed(m)),
        }
    }
}
