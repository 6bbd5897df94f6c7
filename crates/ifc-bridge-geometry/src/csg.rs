// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CSG primitives in their local placement
//!
//! Blocks and pyramids start at the local origin and extend along +X, +Y
//! and +Z. Cylinders, cones and spheres are centred on the local Z axis.

use crate::curve::{ConicArc, CurveSegment, Frame};
use crate::curve_loop::CurveLoop;
use crate::error::{Error, Result};
use crate::extrusion::{Extrusion, Revolution};
use crate::profile::Profile;
use crate::shell::{Face, Shell};
use crate::solid::Solid;
use nalgebra::{Matrix4, Point3, Vector3};
use std::f64::consts::{FRAC_PI_2, TAU};

fn positive(values: &[f64], what: &str) -> Result<()> {
    if values.iter().all(|v| v.is_finite() && *v > 0.0) {
        Ok(())
    } else {
        Err(Error::degenerate(format!("{what} dimensions must be positive")))
    }
}

pub fn block(x: f64, y: f64, z: f64) -> Result<Solid> {
    positive(&[x, y, z], "block")?;
    let profile = Profile::rectangle(x, y)?
        .transformed(&Matrix4::new_translation(&Vector3::new(x / 2.0, y / 2.0, 0.0)));
    Ok(Solid::Extrusion(Extrusion {
        profile,
        direction: Vector3::z(),
        depth: z,
    }))
}

pub fn cylinder(radius: f64, height: f64) -> Result<Solid> {
    positive(&[radius, height], "cylinder")?;
    Ok(Solid::Extrusion(Extrusion {
        profile: Profile::circle(radius)?,
        direction: Vector3::z(),
        depth: height,
    }))
}

pub fn cone(bottom_radius: f64, height: f64) -> Result<Solid> {
    positive(&[bottom_radius, height], "cone")?;
    let outline = CurveLoop::from_segments_unchecked(vec![
        CurveSegment::line(Point3::origin(), Point3::new(bottom_radius, 0.0, 0.0)),
        CurveSegment::line(Point3::new(bottom_radius, 0.0, 0.0), Point3::new(0.0, 0.0, height)),
        CurveSegment::line(Point3::new(0.0, 0.0, height), Point3::origin()),
    ]);
    Ok(Solid::Revolution(Revolution::new(
        Profile::new(outline),
        Point3::origin(),
        Vector3::z(),
        TAU,
    )?))
}

pub fn sphere(radius: f64) -> Result<Solid> {
    positive(&[radius], "sphere")?;
    let meridian = ConicArc::circular(
        Frame::new(Point3::origin(), Vector3::x(), Vector3::z()),
        radius,
        -FRAC_PI_2,
        FRAC_PI_2,
    );
    let outline = CurveLoop::from_segments_unchecked(vec![
        CurveSegment::Arc(meridian),
        CurveSegment::line(Point3::new(0.0, 0.0, radius), Point3::new(0.0, 0.0, -radius)),
    ]);
    Ok(Solid::Revolution(Revolution::new(
        Profile::new(outline),
        Point3::origin(),
        Vector3::z(),
        TAU,
    )?))
}

pub fn rectangular_pyramid(x: f64, y: f64, height: f64) -> Result<Solid> {
    positive(&[x, y, height], "pyramid")?;
    let base = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(x, 0.0, 0.0),
        Point3::new(x, y, 0.0),
        Point3::new(0.0, y, 0.0),
    ];
    let apex = Point3::new(x / 2.0, y / 2.0, height);
    let mut faces = vec![Face {
        outer: base.iter().rev().copied().collect(),
        inners: Vec::new(),
    }];
    for i in 0..4 {
        faces.push(Face {
            outer: vec![base[i], base[(i + 1) % 4], apex],
            inners: Vec::new(),
        });
    }
    Ok(Solid::Brep(Shell {
        faces,
        closed: true,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn volume(solid: &Solid, segments: usize) -> f64 {
        solid.to_mesh(segments, 1e-9).unwrap().volume()
    }

    #[test]
    fn test_block_volume_and_bounds() {
        let solid = block(1.0, 2.0, 3.0).unwrap();
        assert_relative_eq!(volume(&solid, 24), 6.0, epsilon = 1e-4);
        let (min, max) = solid.to_mesh(24, 1e-9).unwrap().bounds().unwrap();
        assert_relative_eq!(min.x, 0.0);
        assert_relative_eq!(max.y, 2.0);
    }

    #[test]
    fn test_pyramid_volume() {
        assert_relative_eq!(volume(&rectangular_pyramid(2.0, 3.0, 4.0).unwrap(), 24), 8.0, epsilon = 1e-4);
    }

    #[test]
    fn test_round_primitives_approach_analytic_volume() {
        assert_relative_eq!(volume(&cylinder(1.0, 2.0).unwrap(), 512), 2.0 * PI, epsilon = 1e-3);
        assert_relative_eq!(volume(&cone(1.0, 3.0).unwrap(), 512), PI, epsilon = 1e-2);
        assert_relative_eq!(volume(&sphere(1.0).unwrap(), 512), 4.0 * PI / 3.0, epsilon = 1e-2);
    }

    #[test]
    fn test_rejects_non_positive_sizes() {
        assert!(block(0.0, 1.0, 1.0).is_err());
        assert!(sphere(-1.0).is_err());
    }
}
