// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Profile definitions: closed outer loop plus optional void loops
//!
//! Parametric shapes are built centred on the origin of the XY plane the
//! way IFC profile definitions place them; the caller applies the profile
//! position afterwards.

use crate::curve::{ConicArc, CurveSegment, Frame};
use crate::curve_loop::CurveLoop;
use crate::error::{Error, Result};
use crate::triangulation::{newell_normal, plane_basis, project_onto, signed_area};
use nalgebra::{Matrix4, Point2, Point3, Vector3};

/// Profile area with voids
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub outer: CurveLoop,
    pub inners: Vec<CurveLoop>,
}

impl Profile {
    pub fn new(outer: CurveLoop) -> Self {
        Self {
            outer,
            inners: Vec::new(),
        }
    }

    pub fn with_inner(mut self, inner: CurveLoop) -> Self {
        self.inners.push(inner);
        self
    }

    pub fn add_inner(&mut self, inner: CurveLoop) {
        self.inners.push(inner);
    }

    pub fn transformed(&self, m: &Matrix4<f64>) -> Self {
        Self {
            outer: self.outer.transformed(m),
            inners: self.inners.iter().map(|l| l.transformed(m)).collect(),
        }
    }

    /// Plane of the outer loop: origin and unit normal
    pub fn plane(&self, segments_per_revolution: usize, tolerance: f64) -> Result<(Point3<f64>, Vector3<f64>)> {
        let points = self.outer.tessellate(segments_per_revolution, tolerance);
        if points.len() < 3 {
            return Err(Error::profile("outer loop has fewer than 3 vertices"));
        }
        let normal = newell_normal(&points)
            .ok_or_else(|| Error::degenerate("outer loop encloses no area"))?;
        Ok((points[0], normal))
    }

    /// Flatten to polygons in the plane of the outer loop
    ///
    /// The outer ring comes out counter-clockwise and holes clockwise
    /// about the returned frame normal.
    pub fn to_polygon(&self, segments_per_revolution: usize, tolerance: f64) -> Result<(Profile2D, Frame)> {
        let outer3 = self.outer.tessellate(segments_per_revolution, tolerance);
        if outer3.len() < 3 {
            return Err(Error::profile("outer loop has fewer than 3 vertices"));
        }
        let normal = newell_normal(&outer3)
            .ok_or_else(|| Error::degenerate("outer loop encloses no area"))?;
        let frame = plane_basis(outer3[0], &normal);

        let mut polygon = Profile2D::new(project_onto(&outer3, &frame));
        for inner in &self.inners {
            let ring = project_onto(&inner.tessellate(segments_per_revolution, tolerance), &frame);
            if ring.len() >= 3 {
                polygon.add_hole(ring);
            }
        }
        polygon.normalize_winding();
        Ok((polygon, frame))
    }

    /// Axis-aligned rectangle
    pub fn rectangle(x_dim: f64, y_dim: f64) -> Result<Self> {
        positive(&[x_dim, y_dim], "rectangle")?;
        let (hx, hy) = (x_dim / 2.0, y_dim / 2.0);
        Ok(Self::new(filleted_loop(
            &[Point2::new(-hx, -hy), Point2::new(hx, -hy), Point2::new(hx, hy), Point2::new(-hx, hy)],
            &[0.0; 4],
        )?))
    }

    /// Rectangle with four equal corner arcs
    pub fn rounded_rectangle(x_dim: f64, y_dim: f64, radius: f64) -> Result<Self> {
        positive(&[x_dim, y_dim], "rounded rectangle")?;
        if radius * 2.0 > x_dim.min(y_dim) {
            return Err(Error::profile("rounding radius exceeds half the rectangle"));
        }
        let (hx, hy) = (x_dim / 2.0, y_dim / 2.0);
        Ok(Self::new(filleted_loop(
            &[Point2::new(-hx, -hy), Point2::new(hx, -hy), Point2::new(hx, hy), Point2::new(-hx, hy)],
            &[radius; 4],
        )?))
    }

    /// Rectangular tube
    pub fn hollow_rectangle(
        x_dim: f64,
        y_dim: f64,
        wall: f64,
        inner_radius: f64,
        outer_radius: f64,
    ) -> Result<Self> {
        positive(&[x_dim, y_dim, wall], "hollow rectangle")?;
        let (ix, iy) = (x_dim - 2.0 * wall, y_dim - 2.0 * wall);
        if ix <= 0.0 || iy <= 0.0 {
            return Err(Error::profile("hollow rectangle wall consumes the interior"));
        }
        let mut profile = if outer_radius > 0.0 {
            Self::rounded_rectangle(x_dim, y_dim, outer_radius)?
        } else {
            Self::rectangle(x_dim, y_dim)?
        };
        let inner = if inner_radius > 0.0 {
            Self::rounded_rectangle(ix, iy, inner_radius)?
        } else {
            Self::rectangle(ix, iy)?
        };
        profile.add_inner(inner.outer.flipped());
        Ok(profile)
    }

    pub fn circle(radius: f64) -> Result<Self> {
        positive(&[radius], "circle")?;
        Ok(Self::new(full_conic(radius, radius)))
    }

    /// Annulus; `wall` is measured inward from `radius`
    pub fn hollow_circle(radius: f64, wall: f64) -> Result<Self> {
        positive(&[radius, wall], "hollow circle")?;
        let inner = radius - wall;
        if inner <= 0.0 {
            return Err(Error::profile("hollow circle inner radius is not positive"));
        }
        Ok(Self::new(full_conic(radius, radius)).with_inner(full_conic(inner, inner).flipped()))
    }

    pub fn ellipse(semi_axis1: f64, semi_axis2: f64) -> Result<Self> {
        positive(&[semi_axis1, semi_axis2], "ellipse")?;
        Ok(Self::new(full_conic(semi_axis1, semi_axis2)))
    }

    /// Symmetric I section; the optional fillet rounds the four web corners
    pub fn i_shape(
        width: f64,
        depth: f64,
        web: f64,
        flange: f64,
        fillet: Option<f64>,
    ) -> Result<Self> {
        positive(&[width, depth, web, flange], "I-shape")?;
        if web >= width || 2.0 * flange >= depth {
            return Err(Error::profile("I-shape web or flanges exceed the outline"));
        }
        let (hw, hd, ht) = (width / 2.0, depth / 2.0, web / 2.0);
        let r = fillet.unwrap_or(0.0);
        let corners = [
            Point2::new(-hw, -hd),
            Point2::new(hw, -hd),
            Point2::new(hw, -hd + flange),
            Point2::new(ht, -hd + flange),
            Point2::new(ht, hd - flange),
            Point2::new(hw, hd - flange),
            Point2::new(hw, hd),
            Point2::new(-hw, hd),
            Point2::new(-hw, hd - flange),
            Point2::new(-ht, hd - flange),
            Point2::new(-ht, -hd + flange),
            Point2::new(-hw, -hd + flange),
        ];
        let radii = [0.0, 0.0, 0.0, r, r, 0.0, 0.0, 0.0, 0.0, r, r, 0.0];
        Ok(Self::new(filleted_loop(&corners, &radii)?))
    }

    /// L angle with its heel at the lower left
    pub fn l_shape(depth: f64, width: f64, thickness: f64, fillet: Option<f64>) -> Result<Self> {
        positive(&[depth, width, thickness], "L-shape")?;
        if thickness >= depth.min(width) {
            return Err(Error::profile("L-shape thickness exceeds a leg"));
        }
        let (hw, hd) = (width / 2.0, depth / 2.0);
        let r = fillet.unwrap_or(0.0);
        let corners = [
            Point2::new(-hw, -hd),
            Point2::new(hw, -hd),
            Point2::new(hw, -hd + thickness),
            Point2::new(-hw + thickness, -hd + thickness),
            Point2::new(-hw + thickness, hd),
            Point2::new(-hw, hd),
        ];
        Ok(Self::new(filleted_loop(&corners, &[0.0, 0.0, 0.0, r, 0.0, 0.0])?))
    }

    /// T section with the flange at the top
    pub fn t_shape(
        depth: f64,
        flange_width: f64,
        web: f64,
        flange: f64,
        fillet: Option<f64>,
    ) -> Result<Self> {
        positive(&[depth, flange_width, web, flange], "T-shape")?;
        if web >= flange_width || flange >= depth {
            return Err(Error::profile("T-shape web or flange exceeds the outline"));
        }
        let (hw, hd, ht) = (flange_width / 2.0, depth / 2.0, web / 2.0);
        let r = fillet.unwrap_or(0.0);
        let corners = [
            Point2::new(-ht, -hd),
            Point2::new(ht, -hd),
            Point2::new(ht, hd - flange),
            Point2::new(hw, hd - flange),
            Point2::new(hw, hd),
            Point2::new(-hw, hd),
            Point2::new(-hw, hd - flange),
            Point2::new(-ht, hd - flange),
        ];
        Ok(Self::new(filleted_loop(
            &corners,
            &[0.0, 0.0, r, 0.0, 0.0, 0.0, 0.0, r],
        )?))
    }

    /// U channel opening towards +X
    pub fn u_shape(
        depth: f64,
        flange_width: f64,
        web: f64,
        flange: f64,
        fillet: Option<f64>,
    ) -> Result<Self> {
        positive(&[depth, flange_width, web, flange], "U-shape")?;
        if web >= flange_width || 2.0 * flange >= depth {
            return Err(Error::profile("U-shape web or flanges exceed the outline"));
        }
        let (hw, hd) = (flange_width / 2.0, depth / 2.0);
        let r = fillet.unwrap_or(0.0);
        let corners = [
            Point2::new(-hw, -hd),
            Point2::new(hw, -hd),
            Point2::new(hw, -hd + flange),
            Point2::new(-hw + web, -hd + flange),
            Point2::new(-hw + web, hd - flange),
            Point2::new(hw, hd - flange),
            Point2::new(hw, hd),
            Point2::new(-hw, hd),
        ];
        Ok(Self::new(filleted_loop(
            &corners,
            &[0.0, 0.0, 0.0, r, r, 0.0, 0.0, 0.0],
        )?))
    }

    /// Cold-formed C channel with lips of length `girth`
    pub fn c_shape(depth: f64, width: f64, wall: f64, girth: f64) -> Result<Self> {
        positive(&[depth, width, wall, girth], "C-shape")?;
        if 2.0 * wall >= width.min(depth) || girth <= wall || 2.0 * girth >= depth {
            return Err(Error::profile("C-shape wall or girth exceeds the outline"));
        }
        let (hw, hd) = (width / 2.0, depth / 2.0);
        let corners = [
            Point2::new(-hw, -hd),
            Point2::new(hw, -hd),
            Point2::new(hw, -hd + girth),
            Point2::new(hw - wall, -hd + girth),
            Point2::new(hw - wall, -hd + wall),
            Point2::new(-hw + wall, -hd + wall),
            Point2::new(-hw + wall, hd - wall),
            Point2::new(hw - wall, hd - wall),
            Point2::new(hw - wall, hd - girth),
            Point2::new(hw, hd - girth),
            Point2::new(hw, hd),
            Point2::new(-hw, hd),
        ];
        Ok(Self::new(filleted_loop(&corners, &[0.0; 12])?))
    }
}

fn positive(values: &[f64], shape: &str) -> Result<()> {
    if values.iter().all(|v| v.is_finite() && *v > 0.0) {
        Ok(())
    } else {
        Err(Error::profile(format!("{shape} dimensions must be positive")))
    }
}

fn full_conic(rx: f64, ry: f64) -> CurveLoop {
    let arc = ConicArc::new(Frame::world(), rx, ry, 0.0, std::f64::consts::TAU);
    CurveLoop::from_segments_unchecked(vec![CurveSegment::Arc(arc)])
}

#[inline]
fn lift(p: Point2<f64>) -> Point3<f64> {
    Point3::new(p.x, p.y, 0.0)
}

/// Closed polygon in the XY plane with tangent arcs at selected corners
///
/// `radii[i]` rounds corner `i`; zero keeps it sharp. Convex corners get
/// counter-clockwise arcs and concave corners clockwise ones. The loop
/// starts with the edge leaving corner 0 and ends with the arc at corner 0,
/// if it has one.
pub fn filleted_loop(corners: &[Point2<f64>], radii: &[f64]) -> Result<CurveLoop> {
    let n = corners.len();
    if n < 3 || radii.len() != n {
        return Err(Error::profile("filleted loop needs 3+ corners and one radius each"));
    }

    // (tangent-in point, tangent-out point, arc)
    let mut joints: Vec<(Point2<f64>, Point2<f64>, Option<ConicArc>)> = Vec::with_capacity(n);
    for i in 0..n {
        let prev = corners[(i + n - 1) % n];
        let here = corners[i];
        let next = corners[(i + 1) % n];
        let r = radii[i];
        if r <= 0.0 {
            joints.push((here, here, None));
            continue;
        }

        let d_in = (here - prev).normalize();
        let d_out = (next - here).normalize();
        let cross = d_in.x * d_out.y - d_in.y * d_out.x;
        let turn = cross.atan2(d_in.dot(&d_out));
        if turn.abs() <= 1e-9 {
            joints.push((here, here, None));
            continue;
        }
        let setback = r * (turn.abs() / 2.0).tan();
        let a = here - d_in * setback;
        let b = here + d_out * setback;
        let left = nalgebra::Vector2::new(-d_in.y, d_in.x);
        let center = if turn > 0.0 { a + left * r } else { a - left * r };
        let angle_a = (a.y - center.y).atan2(a.x - center.x);
        let angle_b = (b.y - center.y).atan2(b.x - center.x);
        let frame = Frame::at_origin(lift(center));
        let arc = if turn > 0.0 {
            ConicArc::circular(frame, r, angle_a, angle_b)
        } else {
            ConicArc::circular(frame, r, angle_b, angle_a).reversed()
        };
        joints.push((a, b, Some(arc)));
    }

    let mut segments = Vec::with_capacity(2 * n);
    for i in 0..n {
        let j = (i + 1) % n;
        let from = joints[i].1;
        let to = joints[j].0;
        if (to - from).norm() > f64::EPSILON {
            segments.push(CurveSegment::line(lift(from), lift(to)));
        }
        if let Some(arc) = joints[j].2 {
            segments.push(CurveSegment::Arc(arc));
        }
    }
    Ok(CurveLoop::from_segments_unchecked(segments))
}

/// 2D polygon with optional holes
#[derive(Debug, Clone, PartialEq)]
pub struct Profile2D {
    /// Outer boundary (counter-clockwise)
    pub outer: Vec<Point2<f64>>,
    /// Holes (clockwise)
    pub holes: Vec<Vec<Point2<f64>>>,
}

impl Profile2D {
    pub fn new(outer: Vec<Point2<f64>>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    pub fn add_hole(&mut self, hole: Vec<Point2<f64>>) {
        self.holes.push(hole);
    }

    /// Force the outer ring counter-clockwise and the holes clockwise
    pub fn normalize_winding(&mut self) {
        if signed_area(&self.outer) < 0.0 {
            self.outer.reverse();
        }
        for hole in &mut self.holes {
            if signed_area(hole) > 0.0 {
                hole.reverse();
            }
        }
    }

    /// Net enclosed area
    pub fn area(&self) -> f64 {
        signed_area(&self.outer).abs() - self.holes.iter().map(|h| signed_area(h).abs()).sum::<f64>()
    }

    /// Triangle indices into outer ring followed by all holes
    pub fn triangulate(&self) -> Result<Vec<usize>> {
        crate::triangulation::triangulate_with_holes(&self.outer, &self.holes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TOL: f64 = 1e-9;

    #[test]
    fn test_rectangle_profile() {
        let profile = Profile::rectangle(10.0, 5.0).unwrap();
        assert_eq!(profile.outer.len(), 4);
        assert!(profile.outer.is_closed(TOL));
        let (poly, _) = profile.to_polygon(24, TOL).unwrap();
        assert_relative_eq!(poly.area(), 50.0, epsilon = 1e-9);
        assert_eq!(poly.triangulate().unwrap().len(), 6);
    }

    #[test]
    fn test_hollow_circle_has_clockwise_void() {
        let profile = Profile::hollow_circle(2.0, 0.5).unwrap();
        assert_eq!(profile.inners.len(), 1);
        let (poly, _) = profile.to_polygon(64, TOL).unwrap();
        assert!(signed_area(&poly.outer) > 0.0);
        assert!(signed_area(&poly.holes[0]) < 0.0);
    }

    #[test]
    fn test_i_shape_with_fillets() {
        let profile = Profile::i_shape(0.2, 0.4, 0.01, 0.02, Some(0.015)).unwrap();
        let segments = profile.outer.segments();
        assert_eq!(segments.len(), 16);
        assert_eq!(segments.iter().filter(|s| !s.is_line()).count(), 4);
        assert!(profile.outer.is_closed(1e-9));
        for pair in segments.windows(2) {
            assert_relative_eq!((pair[0].end_point() - pair[1].start_point()).norm(), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_i_shape_without_fillets() {
        let profile = Profile::i_shape(0.2, 0.4, 0.01, 0.02, None).unwrap();
        assert_eq!(profile.outer.len(), 12);
        assert_eq!(profile.outer.start_point(), Some(Point3::new(-0.1, -0.2, 0.0)));
    }

    #[test]
    fn test_rounded_corner_at_start_keeps_contiguity() {
        let profile = Profile::rounded_rectangle(4.0, 2.0, 0.5).unwrap();
        assert_eq!(profile.outer.len(), 8);
        assert!(profile.outer.is_closed(1e-9));
        let (poly, _) = profile.to_polygon(256, 1e-9).unwrap();
        let expected = 8.0 - (4.0 - std::f64::consts::PI) * 0.25;
        assert_relative_eq!(poly.area(), expected, epsilon = 1e-3);
    }

    #[test]
    fn test_invalid_dimensions_rejected() {
        assert!(Profile::rectangle(0.0, 1.0).is_err());
        assert!(Profile::hollow_circle(1.0, 1.5).is_err());
        assert!(Profile::i_shape(0.2, 0.4, 0.3, 0.02, None).is_err());
    }
}
