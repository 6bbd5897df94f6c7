// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC-Bridge Geometry
//!
//! Curve and solid reconstruction for IFC geometry, independent of how
//! entities are stored or resolved.
//!
//! ## Overview
//!
//! - **Curves**: lines, circles and ellipses ([`ParametricCurve`]), bounded
//!   segments ([`CurveSegment`]) and contiguous [`CurveLoop`]s with
//!   orientation-tolerant assembly and gap repair
//! - **Trimming and offsets**: [`trim_curve`] resolves parameter or point
//!   bounds, [`offset_loop`] shifts loops sideways
//! - **Profiles**: arbitrary and parametric profile areas with voids
//! - **Solids**: extrusions, revolutions, sweeps, B-rep shells with mesh
//!   salvage, CSG primitives
//! - **Meshes**: triangulation via earcutr
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ifc_bridge_geometry::{Extrusion, Profile, Vector3};
//!
//! let profile = Profile::rectangle(2.0, 1.0)?;
//! let solid = Extrusion::new(profile, Vector3::z(), 3.0, 24, 1e-6)?;
//! let mesh = solid.to_mesh(24, 1e-6)?;
//!
//! println!("Generated {} triangles", mesh.triangle_count());
//! ```

pub mod csg;
pub mod curve;
pub mod curve_loop;
pub mod error;
pub mod extrusion;
pub mod mesh;
pub mod offset;
pub mod profile;
pub mod shell;
pub mod solid;
pub mod tolerance;
pub mod transform;
pub mod triangulation;
pub mod trim;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point2, Point3, Vector2, Vector3};

pub use curve::{normalize_angle, ConicArc, CurveGeometry, CurveSegment, Frame, ParametricCurve};
pub use curve_loop::{CurveLoop, Joint, Repair};
pub use error::{Error, Result};
pub use extrusion::{extrude_open, slant_factor, Extrusion, Revolution, Sweep};
pub use mesh::Mesh;
pub use offset::{offset_loop, offset_parametric, offset_segment};
pub use profile::{filleted_loop, Profile, Profile2D};
pub use shell::{Face, FaceSetOutcome, FaceSetScope, Shell};
pub use solid::Solid;
pub use tolerance::{Tolerance, ANGLE_EPSILON};
pub use transform::{
    axis2_placement_2d, axis2_placement_3d, frame_matrix, is_mirroring,
    transformation_operator_2d, transformation_operator_3d, OperatorScale,
};
pub use trim::{resolve_bound, trim_curve, TrimBound, TrimPreference, TrimResult, TrimmedCurve};
pub use triangulation::{
    newell_normal, plane_basis, point_in_ring, project_onto, signed_area, triangulate_with_holes,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_extrusion() {
        let profile = Profile::rectangle(10.0, 5.0).unwrap();
        let solid = Extrusion::new(profile, Vector3::z(), 20.0, 24, 1e-9).unwrap();
        let mesh = Solid::Extrusion(solid).to_mesh(24, 1e-9).unwrap();

        assert!(mesh.vertex_count() > 0);
        assert!(mesh.triangle_count() > 0);
    }

    #[test]
    fn test_transformed_solid_moves_mesh() {
        let solid = csg::block(1.0, 1.0, 1.0).unwrap();
        let moved = solid.transformed(&Matrix4::new_translation(&Vector3::new(10.0, 0.0, 0.0)));
        let (min, _) = moved.to_mesh(24, 1e-9).unwrap().bounds().unwrap();
        assert!((min.x - 10.0).abs() < 1e-5);
    }
}
