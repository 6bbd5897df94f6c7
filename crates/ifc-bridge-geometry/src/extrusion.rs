// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Swept-area primitives: linear extrusion, revolution and sweep along a path

use crate::curve::Frame;
use crate::curve_loop::CurveLoop;
use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::profile::{Profile, Profile2D};
use crate::triangulation::{newell_normal, plane_basis};
use nalgebra::{Matrix4, Point2, Point3, Rotation3, Unit, Vector3};
use std::f64::consts::TAU;

/// Below this |cos| an extrusion direction counts as lying in the profile plane
pub const SLANT_EPSILON: f64 = 1e-9;

/// Cosine between the profile plane normal and the extrusion direction
///
/// Fails when the direction lies in the profile plane.
pub fn slant_factor(plane_normal: &Vector3<f64>, direction: &Vector3<f64>) -> Result<f64> {
    let d = direction
        .try_normalize(f64::EPSILON)
        .ok_or_else(|| Error::degenerate("zero extrusion direction"))?;
    let n = plane_normal
        .try_normalize(f64::EPSILON)
        .ok_or_else(|| Error::degenerate("profile plane has no normal"))?;
    let slant = n.dot(&d);
    if slant.abs() < SLANT_EPSILON {
        return Err(Error::degenerate("extrusion direction lies in the profile plane"));
    }
    Ok(slant)
}

/// Add a planar cap whose triangles face `outward`
fn add_cap(
    mesh: &mut Mesh,
    outer: &[Point3<f64>],
    holes: &[Vec<Point3<f64>>],
    outward: &Vector3<f64>,
) -> Result<()> {
    let Some(normal) = newell_normal(outer) else {
        return Ok(());
    };
    if normal.dot(outward) >= 0.0 {
        mesh.add_polygon(outer, holes)?;
    } else {
        let outer: Vec<_> = outer.iter().rev().copied().collect();
        let holes: Vec<Vec<_>> = holes
            .iter()
            .map(|h| h.iter().rev().copied().collect())
            .collect();
        mesh.add_polygon(&outer, &holes)?;
    }
    Ok(())
}

fn rings_3d(polygon: &Profile2D, frame: &Frame) -> Vec<Vec<Point3<f64>>> {
    std::iter::once(&polygon.outer)
        .chain(polygon.holes.iter())
        .map(|ring| ring.iter().map(|p| frame.at(p.x, p.y)).collect())
        .collect()
}

/// Side quads between two copies of the same rings
///
/// With `forward` set, quads face outward when `next` lies on the positive
/// normal side of counter-clockwise outer rings.
fn add_sides(mesh: &mut Mesh, this: &[Vec<Point3<f64>>], next: &[Vec<Point3<f64>>], forward: bool) {
    for (a, b) in this.iter().zip(next) {
        let n = a.len();
        for i in 0..n {
            let j = (i + 1) % n;
            if forward {
                mesh.add_quad(&a[i], &a[j], &b[j], &b[i]);
            } else {
                mesh.add_quad(&a[i], &b[i], &b[j], &a[j]);
            }
        }
    }
}

/// Profile extruded along a direction
#[derive(Debug, Clone, PartialEq)]
pub struct Extrusion {
    pub profile: Profile,
    /// Unit direction
    pub direction: Vector3<f64>,
    pub depth: f64,
}

impl Extrusion {
    /// Validate and build; fails for non-positive depth or in-plane direction
    pub fn new(
        profile: Profile,
        direction: Vector3<f64>,
        depth: f64,
        segments_per_revolution: usize,
        tolerance: f64,
    ) -> Result<Self> {
        if !(depth.is_finite() && depth > 0.0) {
            return Err(Error::degenerate("extrusion depth must be positive"));
        }
        let (_, normal) = profile.plane(segments_per_revolution, tolerance)?;
        slant_factor(&normal, &direction)?;
        Ok(Self {
            profile,
            direction: direction.normalize(),
            depth,
        })
    }

    pub fn vector(&self) -> Vector3<f64> {
        self.direction * self.depth
    }

    pub fn transformed(&self, m: &Matrix4<f64>) -> Self {
        let v = m.transform_vector(&self.vector());
        let depth = v.norm();
        Self {
            profile: self.profile.transformed(m),
            direction: v.try_normalize(f64::EPSILON).unwrap_or(self.direction),
            depth,
        }
    }

    pub fn to_mesh(&self, segments_per_revolution: usize, tolerance: f64) -> Result<Mesh> {
        let (polygon, frame) = self.profile.to_polygon(segments_per_revolution, tolerance)?;
        let slant = slant_factor(&frame.normal(), &self.direction)?;
        let v = self.vector();

        let bottom = rings_3d(&polygon, &frame);
        let top: Vec<Vec<Point3<f64>>> = bottom
            .iter()
            .map(|ring| ring.iter().map(|p| p + v).collect())
            .collect();

        let mut mesh = Mesh::new();
        add_cap(&mut mesh, &bottom[0], &bottom[1..], &-v)?;
        add_cap(&mut mesh, &top[0], &top[1..], &v)?;
        add_sides(&mut mesh, &bottom, &top, slant > 0.0);
        Ok(mesh)
    }
}

/// Extrude an open profile curve into a strip of side faces
pub fn extrude_open(
    curve: &CurveLoop,
    vector: &Vector3<f64>,
    segments_per_revolution: usize,
    tolerance: f64,
) -> Result<Mesh> {
    let points = curve.tessellate(segments_per_revolution, tolerance);
    if points.len() < 2 {
        return Err(Error::degenerate("open profile has no extent"));
    }
    let mut mesh = Mesh::new();
    for pair in points.windows(2) {
        mesh.add_quad(&pair[0], &pair[1], &(pair[1] + vector), &(pair[0] + vector));
    }
    if mesh.is_empty() {
        return Err(Error::degenerate("extrusion direction is parallel to the open profile"));
    }
    Ok(mesh)
}

/// Profile revolved about an axis
#[derive(Debug, Clone, PartialEq)]
pub struct Revolution {
    pub profile: Profile,
    pub axis_origin: Point3<f64>,
    /// Unit axis direction; rotation is counter-clockwise about it
    pub axis: Vector3<f64>,
    /// Radians, up to a full turn
    pub angle: f64,
}

impl Revolution {
    pub fn new(profile: Profile, axis_origin: Point3<f64>, axis: Vector3<f64>, angle: f64) -> Result<Self> {
        let axis = axis
            .try_normalize(f64::EPSILON)
            .ok_or_else(|| Error::degenerate("revolution axis has zero length"))?;
        if !(angle.is_finite() && angle.abs() > 1e-9) {
            return Err(Error::degenerate("revolution angle is zero"));
        }
        // A negative angle turns the other way round the flipped axis
        let (axis, angle) = if angle < 0.0 { (-axis, -angle) } else { (axis, angle) };
        Ok(Self {
            profile,
            axis_origin,
            axis,
            angle: angle.min(TAU),
        })
    }

    pub fn is_full(&self) -> bool {
        self.angle >= TAU - 1e-9
    }

    pub fn transformed(&self, m: &Matrix4<f64>) -> Self {
        let axis = m.transform_vector(&self.axis);
        let mirrored = m.fixed_view::<3, 3>(0, 0).into_owned().determinant() < 0.0;
        Self {
            profile: self.profile.transformed(m),
            axis_origin: m.transform_point(&self.axis_origin),
            axis: axis.try_normalize(f64::EPSILON).map_or(self.axis, |a| if mirrored { -a } else { a }),
            angle: self.angle,
        }
    }

    pub fn to_mesh(&self, segments_per_revolution: usize, tolerance: f64) -> Result<Mesh> {
        let (polygon, frame) = self.profile.to_polygon(segments_per_revolution, tolerance)?;
        let base = rings_3d(&polygon, &frame);
        let axis = Unit::new_normalize(self.axis);

        let centroid = base[0]
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords)
            / base[0].len() as f64;
        let tangent = self.axis.cross(&(Point3::from(centroid) - self.axis_origin));
        let sense = tangent.dot(&frame.normal());
        if sense.abs() <= tolerance * tolerance {
            return Err(Error::degenerate("revolved profile does not turn about the axis"));
        }

        let steps = ((self.angle / TAU * segments_per_revolution as f64).ceil() as usize).max(3);
        let rotate = |ring: &Vec<Point3<f64>>, theta: f64| -> Vec<Point3<f64>> {
            let r = Rotation3::from_axis_angle(&axis, theta);
            ring.iter()
                .map(|p| self.axis_origin + r * (p - self.axis_origin))
                .collect()
        };

        let mut mesh = Mesh::new();
        let mut previous = base.clone();
        for k in 1..=steps {
            let theta = self.angle * k as f64 / steps as f64;
            let current: Vec<Vec<Point3<f64>>> = base.iter().map(|r| rotate(r, theta)).collect();
            add_sides(&mut mesh, &previous, &current, sense > 0.0);
            previous = current;
        }

        if !self.is_full() {
            add_cap(&mut mesh, &base[0], &base[1..], &-tangent)?;
            let end_tangent = Rotation3::from_axis_angle(&axis, self.angle) * tangent;
            add_cap(&mut mesh, &previous[0], &previous[1..], &end_tangent)?;
        }
        Ok(mesh)
    }
}

/// Profile swept along a directrix, kept perpendicular to it
#[derive(Debug, Clone, PartialEq)]
pub struct Sweep {
    /// Profile in its local XY plane
    pub profile: Profile,
    pub directrix: CurveLoop,
    /// Keeps the profile Y axis towards this direction when set
    pub up: Option<Vector3<f64>>,
}

impl Sweep {
    pub fn transformed(&self, m: &Matrix4<f64>) -> Self {
        Self {
            profile: self.profile.clone(),
            directrix: self.directrix.transformed(m),
            up: self.up.map(|u| m.transform_vector(&u)),
        }
    }

    pub fn to_mesh(&self, segments_per_revolution: usize, tolerance: f64) -> Result<Mesh> {
        let flat = |l: &CurveLoop| -> Vec<Point2<f64>> {
            l.tessellate(segments_per_revolution, tolerance)
                .iter()
                .map(|p| Point2::new(p.x, p.y))
                .collect()
        };
        let mut polygon = Profile2D::new(flat(&self.profile.outer));
        for inner in &self.profile.inners {
            polygon.add_hole(flat(inner));
        }
        if polygon.outer.len() < 3 {
            return Err(Error::profile("swept profile has fewer than 3 vertices"));
        }
        polygon.normalize_winding();

        let closed = self.directrix.is_closed(tolerance);
        let mut path = self.directrix.tessellate(segments_per_revolution, tolerance);
        if closed && !path.is_empty() {
            path.push(path[0]);
        }
        if path.len() < 2 {
            return Err(Error::degenerate("sweep directrix has no extent"));
        }

        let frames = path_frames(&path, self.up.as_ref(), closed)?;
        let sections: Vec<Vec<Vec<Point3<f64>>>> = frames.iter().map(|f| rings_3d(&polygon, f)).collect();

        let mut mesh = Mesh::new();
        for pair in sections.windows(2) {
            add_sides(&mut mesh, &pair[0], &pair[1], true);
        }
        if !closed {
            let (first, last) = (&frames[0], &frames[frames.len() - 1]);
            add_cap(&mut mesh, &sections[0][0], &sections[0][1..], &-first.normal())?;
            let end = &sections[sections.len() - 1];
            add_cap(&mut mesh, &end[0], &end[1..], &last.normal())?;
        }
        Ok(mesh)
    }
}

/// Profile frames along a polyline path; each frame normal is the path tangent
fn path_frames(path: &[Point3<f64>], up: Option<&Vector3<f64>>, closed: bool) -> Result<Vec<Frame>> {
    let n = path.len();
    let tangent_at = |i: usize| -> Option<Vector3<f64>> {
        let (a, b) = if i == 0 {
            if closed {
                (path[n - 2], path[1])
            } else {
                (path[0], path[1])
            }
        } else if i == n - 1 {
            if closed {
                (path[n - 2], path[1])
            } else {
                (path[n - 2], path[n - 1])
            }
        } else {
            (path[i - 1], path[i + 1])
        };
        (b - a).try_normalize(f64::EPSILON)
    };

    let mut frames = Vec::with_capacity(n);
    let mut y_prev: Option<Vector3<f64>> = None;
    for (i, origin) in path.iter().enumerate() {
        let t = tangent_at(i).ok_or_else(|| Error::degenerate("sweep path folds back on itself"))?;
        let reference = up.copied().or(y_prev);
        let y = reference
            .and_then(|r| (r - t * r.dot(&t)).try_normalize(1e-9))
            .unwrap_or_else(|| plane_basis(*origin, &t).y_axis);
        let x = y.cross(&t);
        frames.push(Frame::new(*origin, x, y));
        y_prev = Some(y);
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    const TOL: f64 = 1e-9;

    #[test]
    fn test_extruded_box_volume() {
        let solid = Extrusion::new(Profile::rectangle(2.0, 1.0).unwrap(), Vector3::z(), 3.0, 24, TOL).unwrap();
        let mesh = solid.to_mesh(24, TOL).unwrap();
        assert_eq!(mesh.triangle_count(), 12);
        assert_relative_eq!(mesh.volume(), 6.0, epsilon = 1e-4);
    }

    #[test]
    fn test_slanted_extrusion_volume() {
        let dir = Vector3::new(1.0, 0.0, 1.0);
        let solid = Extrusion::new(Profile::rectangle(1.0, 1.0).unwrap(), dir, 2.0, 24, TOL).unwrap();
        let mesh = solid.to_mesh(24, TOL).unwrap();
        assert_relative_eq!(mesh.volume(), 2.0 / 2f64.sqrt(), epsilon = 1e-4);
    }

    #[test]
    fn test_in_plane_direction_is_degenerate() {
        let err = Extrusion::new(Profile::rectangle(1.0, 1.0).unwrap(), Vector3::x(), 1.0, 24, TOL).unwrap_err();
        assert!(matches!(err, Error::Degenerate(_)));
        assert!(slant_factor(&Vector3::z(), &Vector3::new(1.0, 1.0, 0.0)).is_err());
    }

    #[test]
    fn test_downward_extrusion_is_outward_facing() {
        let solid = Extrusion::new(Profile::rectangle(1.0, 1.0).unwrap(), -Vector3::z(), 1.0, 24, TOL).unwrap();
        assert_relative_eq!(solid.to_mesh(24, TOL).unwrap().volume(), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_half_revolution_of_square() {
        // Unit square at x in [1, 2] in the XZ plane, turned half way round Z
        let square = Profile::rectangle(1.0, 1.0)
            .unwrap()
            .transformed(&(Matrix4::new_translation(&Vector3::new(1.5, 0.0, 0.5))
                * Matrix4::new_rotation(Vector3::x() * (PI / 2.0))));
        let solid = Revolution::new(square, Point3::origin(), Vector3::z(), PI).unwrap();
        let mesh = solid.to_mesh(256, TOL).unwrap();
        // Half an annulus 1..2 of height 1
        assert_relative_eq!(mesh.volume(), PI * (4.0 - 1.0) / 2.0, epsilon = 1e-2);
    }

    #[test]
    fn test_sweep_straight_path_matches_extrusion() {
        let path = CurveLoop::polyline(
            &[Point3::origin(), Point3::new(0.0, 0.0, 2.0)],
            &crate::tolerance::Tolerance::default(),
        )
        .unwrap();
        let sweep = Sweep {
            profile: Profile::rectangle(1.0, 1.0).unwrap(),
            directrix: path,
            up: None,
        };
        assert_relative_eq!(sweep.to_mesh(24, TOL).unwrap().volume(), 2.0, epsilon = 1e-4);
    }
}
