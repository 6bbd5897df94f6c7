// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extrusions prepared for writing

use crate::error::Result;
use crate::planar::PlanarLoop;
use crate::recognize::{ProfileRecognizer, RecognizedProfile};
use ifc_bridge_geometry::{slant_factor, CurveLoop, Extrusion, Frame, Point3, Vector3};
use log::debug;

/// An extrusion with its profile recognized on the base plane
#[derive(Debug, Clone, PartialEq)]
pub struct ExportExtrusion {
    /// Base plane; its normal points to the extrusion side
    pub position: Frame,
    pub profile: RecognizedProfile,
    /// Unit direction in `position` coordinates
    pub direction: Vector3<f64>,
    pub depth: f64,
}

pub struct ExtrusionBuilder {
    tolerance: f64,
    segments_per_revolution: usize,
}

impl Default for ExtrusionBuilder {
    fn default() -> Self {
        Self::new(1e-6)
    }
}

impl ExtrusionBuilder {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            segments_per_revolution: 24,
        }
    }

    pub fn with_segments(mut self, segments_per_revolution: usize) -> Self {
        self.segments_per_revolution = segments_per_revolution;
        self
    }

    /// Project the profile loops onto their plane and recognize the shape
    ///
    /// The plane normal is turned towards the extrusion direction, so outer
    /// loops come out counter-clockwise seen against the direction.
    pub fn build(&self, extrusion: &Extrusion) -> Result<ExportExtrusion> {
        let (origin, normal) = extrusion
            .profile
            .plane(self.segments_per_revolution, self.tolerance)?;
        let normal = if normal.dot(&extrusion.direction) < 0.0 {
            -normal
        } else {
            normal
        };
        slant_factor(&normal, &extrusion.direction)?;
        let plane = base_plane(origin, &normal);

        let project = |l: &CurveLoop| {
            PlanarLoop::project(l, &plane, self.segments_per_revolution, self.tolerance)
        };
        let outer = project(&extrusion.profile.outer)?;
        let voids = extrusion
            .profile
            .inners
            .iter()
            .map(project)
            .collect::<Result<Vec<_>>>()?;
        let profile = ProfileRecognizer::new(self.tolerance).recognize(&outer, &voids);

        let d = extrusion.direction;
        let direction = Vector3::new(d.dot(&plane.x_axis), d.dot(&plane.y_axis), d.dot(&normal));
        debug!(
            "extrusion of a {} profile, depth {}, slant {:.6}",
            profile.kind(),
            extrusion.depth,
            direction.z
        );
        Ok(ExportExtrusion {
            position: plane,
            profile,
            direction,
            depth: extrusion.depth,
        })
    }
}

/// Frame on the plane with its X axis as close to world X as possible
fn base_plane(origin: Point3<f64>, normal: &Vector3<f64>) -> Frame {
    let x_axis = [Vector3::x(), Vector3::y()]
        .into_iter()
        .find_map(|axis| (axis - normal * normal.dot(&axis)).try_normalize(1e-6))
        .unwrap_or_else(Vector3::x);
    Frame::new(origin, x_axis, normal.cross(&x_axis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ifc_bridge_geometry::{Matrix4, Profile};

    #[test]
    fn test_rectangle_extrusion() {
        let profile = Profile::rectangle(4.0, 2.0).unwrap();
        let extrusion = Extrusion::new(profile, Vector3::z(), 3.0, 24, 1e-9).unwrap();
        let export = ExtrusionBuilder::default().build(&extrusion).unwrap();
        let RecognizedProfile::Rectangle { position, x_dim, y_dim } = export.profile else {
            panic!("expected a rectangle");
        };
        assert_relative_eq!(x_dim, 4.0, epsilon = 1e-9);
        assert_relative_eq!(y_dim, 2.0, epsilon = 1e-9);
        // The rectangle centre in world space is the origin
        let center = export.position.at(position.location.x, position.location.y);
        assert_relative_eq!(center.coords.norm(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(export.direction.z, 1.0, epsilon = 1e-12);
        assert_relative_eq!(export.depth, 3.0);
    }

    #[test]
    fn test_downward_extrusion_flips_the_plane() {
        let profile = Profile::circle(1.0).unwrap();
        let extrusion = Extrusion::new(profile, -Vector3::z(), 2.0, 24, 1e-9).unwrap();
        let export = ExtrusionBuilder::default().build(&extrusion).unwrap();
        assert_relative_eq!(export.position.normal().z, -1.0, epsilon = 1e-12);
        assert_relative_eq!(export.direction.z, 1.0, epsilon = 1e-12);
        assert_eq!(export.profile.kind(), "circle");
    }

    #[test]
    fn test_vertical_profile_plane() {
        // Rectangle standing in the XZ plane, extruded at a slant
        let rotate = Matrix4::new_rotation(Vector3::x() * std::f64::consts::FRAC_PI_2);
        let profile = Profile::rectangle(1.0, 0.5).unwrap().transformed(&rotate);
        let direction = Vector3::new(0.0, 1.0, 1.0).normalize();
        let extrusion = Extrusion::new(profile, direction, 1.0, 24, 1e-9).unwrap();
        let export = ExtrusionBuilder::default().build(&extrusion).unwrap();
        assert_eq!(export.profile.kind(), "rectangle");
        assert_relative_eq!(export.position.x_axis.x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(export.direction.z, std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-9);
    }
}
