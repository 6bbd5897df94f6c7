// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Swept-area and swept-disk solids

use super::GeometrySet;
use crate::entity::placement::{direction_3d, point_3d};
use crate::entity::ProfileArea;
use crate::error::{ImportError, Result};
use crate::session::ImportSession;
use ifc_bridge_geometry::{
    extrude_open, CurveGeometry, CurveLoop, Extrusion, Matrix4, Profile, Revolution, Solid,
    Sweep, Vector3,
};
use ifc_bridge_model::{DecodedEntity, IfcType};
use log::debug;

/// Swept area and the matrix placing the solid's local system
fn swept_area(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<(ProfileArea, Matrix4<f64>)> {
    let area_id = record
        .ref_attr("SweptArea")
        .ok_or_else(|| ImportError::null(record.id, "SweptArea"))?;
    let area = session
        .profile(Some(area_id))
        .ok_or_else(|| ImportError::invalid(record.id, "SweptArea", "unresolved profile"))?;
    let position = session.optional_placement(record.ref_attr("Position"));
    Ok((area, position))
}

fn closed_areas(record: &DecodedEntity, area: ProfileArea) -> Result<Vec<Profile>> {
    match area {
        ProfileArea::Areas(areas) => Ok(areas),
        ProfileArea::Open(_) => Err(ImportError::invalid(
            record.id,
            "SweptArea",
            "open profiles cannot be swept into a solid here",
        )),
    }
}

pub(super) fn extruded(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<GeometrySet> {
    let (area, position) = swept_area(session, record)?;
    let direction_id = record
        .ref_attr("ExtrudedDirection")
        .ok_or_else(|| ImportError::null(record.id, "ExtrudedDirection"))?;
    let direction = position.transform_vector(&direction_3d(session, direction_id)?.normalize());
    let depth = record
        .float_attr("Depth")
        .map(|d| session.length(d))
        .ok_or_else(|| ImportError::null(record.id, "Depth"))?;

    let segments = session.segments();
    let tolerance = session.tolerance().vertex;
    let mut set = GeometrySet::default();
    match area {
        ProfileArea::Areas(areas) => {
            for profile in areas {
                let extrusion = Extrusion::new(
                    profile.transformed(&position),
                    direction,
                    depth,
                    segments,
                    tolerance,
                )?;
                set.solids.push(Solid::Extrusion(extrusion));
            }
        }
        ProfileArea::Open(curve) => {
            debug!("{}: extruding an open profile into a surface", record.id);
            let mesh = extrude_open(&curve.transformed(&position), &(direction * depth), segments, tolerance)?;
            set.solids.push(Solid::Mesh(mesh));
        }
    }
    Ok(set)
}

pub(super) fn revolved(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<GeometrySet> {
    let (area, position) = swept_area(session, record)?;
    let axis_record = session.record_attr(record, "Axis")?;
    let location = axis_record
        .ref_attr("Location")
        .ok_or_else(|| ImportError::null(axis_record.id, "Location"))?;
    let axis_origin = point_3d(session, location)?;
    let axis = match axis_record.ref_attr("Axis") {
        Some(id) => direction_3d(session, id)?,
        None => Vector3::z(),
    };
    let angle = record
        .float_attr("Angle")
        .map(|a| session.angle(a))
        .ok_or_else(|| ImportError::null(record.id, "Angle"))?;

    let mut set = GeometrySet::default();
    for profile in closed_areas(record, area)? {
        let revolution = Revolution::new(
            profile.transformed(&position),
            position.transform_point(&axis_origin),
            position.transform_vector(&axis),
            angle,
        )?;
        set.solids.push(Solid::Revolution(revolution));
    }
    Ok(set)
}

/// Directrix of a sweep as a bounded loop
///
/// Parametric directrices are cut at StartParam/EndParam, closed conics
/// default to the full curve.
fn directrix(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<CurveLoop> {
    let id = record
        .ref_attr("Directrix")
        .ok_or_else(|| ImportError::null(record.id, "Directrix"))?;
    let curve = session
        .curve(Some(id))
        .ok_or_else(|| ImportError::invalid(record.id, "Directrix", "unresolved curve"))?;
    match curve {
        CurveGeometry::Loop(curve) => Ok(curve),
        CurveGeometry::Parametric(basis) => {
            let param = |v: f64| if basis.is_cyclic() { session.angle(v) } else { v };
            let segment = match (record.float_attr("StartParam"), record.float_attr("EndParam")) {
                (Some(start), Some(end)) => basis.segment(param(start), param(end))?,
                _ => basis.full_segment()?,
            };
            Ok(CurveLoop::from_segments_unchecked(vec![segment]))
        }
    }
}

pub(super) fn surface_curve(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<GeometrySet> {
    let (area, position) = swept_area(session, record)?;
    let path = directrix(session, record)?.transformed(&position);

    let surface = session.record_attr(record, "ReferenceSurface")?;
    let up = if surface.ifc_type == IfcType::IfcPlane {
        let plane = session.optional_placement(surface.ref_attr("Position"));
        Some(position.transform_vector(&plane.transform_vector(&Vector3::z())))
    } else {
        session.warn(
            record.id,
            format!(
                "reference surface {} is not a plane, sweeping without it",
                surface.ifc_type.class_name()
            ),
        );
        None
    };

    let mut set = GeometrySet::default();
    for profile in closed_areas(record, area)? {
        set.solids.push(Solid::Sweep(Sweep {
            profile,
            directrix: path.clone(),
            up,
        }));
    }
    Ok(set)
}

pub(super) fn disk(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<GeometrySet> {
    let radius = record
        .float_attr("Radius")
        .map(|r| session.length(r))
        .ok_or_else(|| ImportError::null(record.id, "Radius"))?;
    let inner = record
        .float_attr("InnerRadius")
        .map(|r| session.length(r))
        .filter(|r| *r > 0.0);
    let profile = match inner {
        Some(inner) => Profile::hollow_circle(radius, radius - inner)?,
        None => Profile::circle(radius)?,
    };
    let path = directrix(session, record)?;
    Ok(GeometrySet::from_solid(Solid::Sweep(Sweep {
        profile,
        directrix: path,
        up: None,
    })))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::store;
    use crate::options::ImportOptions;
    use crate::session::ImportSession;
    use approx::assert_relative_eq;
    use ifc_bridge_geometry::Solid;
    use ifc_bridge_model::EntityId;
    use std::f64::consts::PI;

    const SQUARE: &str = "#2=IFCCARTESIANPOINT((0.,0.));
#3=IFCAXIS2PLACEMENT2D(#2,$);
#4=IFCRECTANGLEPROFILEDEF(.AREA.,$,#3,2.,2.);
#5=IFCCARTESIANPOINT((0.,0.,0.));
#6=IFCAXIS2PLACEMENT3D(#5,$,$);";

    #[test]
    fn test_extrusion_volume() {
        let store = store(&format!(
            "{SQUARE}
#7=IFCDIRECTION((0.,0.,1.));
#8=IFCEXTRUDEDAREASOLID(#4,#6,#7,3.);"
        ));
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let set = session.item_geometry(Some(EntityId(8))).unwrap();
        assert!(matches!(set.solids[0], Solid::Extrusion(_)));
        let volume = set.solids[0].to_mesh(24, 1e-9).unwrap().volume();
        assert_relative_eq!(volume, 12.0, epsilon = 1e-4);
    }

    #[test]
    fn test_in_plane_extrusion_is_fatal_for_the_item() {
        let store = store(&format!(
            "{SQUARE}
#7=IFCDIRECTION((1.,0.,0.));
#8=IFCEXTRUDEDAREASOLID(#4,#6,#7,3.);"
        ));
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        assert!(session.item_geometry(Some(EntityId(8))).is_none());
        assert!(session
            .diagnostics()
            .for_entity(EntityId(8))
            .any(|d| d.fatal_for_entity && d.message.contains("profile plane")));
    }

    #[test]
    fn test_half_revolution() {
        let store = store(
            "#2=IFCCARTESIANPOINT((3.,0.));
#3=IFCAXIS2PLACEMENT2D(#2,$);
#4=IFCRECTANGLEPROFILEDEF(.AREA.,$,#3,2.,2.);
#5=IFCCARTESIANPOINT((0.,0.,0.));
#6=IFCDIRECTION((0.,1.,0.));
#7=IFCAXIS1PLACEMENT(#5,#6);
#8=IFCREVOLVEDAREASOLID(#4,$,#7,3.141592653589793);",
        );
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let set = session.item_geometry(Some(EntityId(8))).unwrap();
        let Solid::Revolution(revolution) = &set.solids[0] else {
            panic!("expected a revolution");
        };
        assert_relative_eq!(revolution.angle, PI, epsilon = 1e-12);
    }

    #[test]
    fn test_swept_disk_along_polyline() {
        let store = store(
            "#2=IFCCARTESIANPOINT((0.,0.,0.));
#3=IFCCARTESIANPOINT((0.,0.,10.));
#4=IFCPOLYLINE((#2,#3));
#5=IFCSWEPTDISKSOLID(#4,0.5,0.25,$,$);",
        );
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let set = session.item_geometry(Some(EntityId(5))).unwrap();
        let Solid::Sweep(sweep) = &set.solids[0] else {
            panic!("expected a sweep");
        };
        assert_eq!(sweep.profile.inners.len(), 1);
        let (min, max) = set.solids[0].to_mesh(24, 1e-9).unwrap().bounds().unwrap();
        assert_relative_eq!(max.z - min.z, 10.0, epsilon = 1e-5);
    }

    #[test]
    fn test_surface_curve_sweep_uses_plane_normal() {
        let store = store(&format!(
            "{SQUARE}
#7=IFCPLANE(#6);
#8=IFCCARTESIANPOINT((10.,0.,0.));
#9=IFCPOLYLINE((#5,#8));
#10=IFCSURFACECURVESWEPTAREASOLID(#4,#6,#9,$,$,#7);"
        ));
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let set = session.item_geometry(Some(EntityId(10))).unwrap();
        let Solid::Sweep(sweep) = &set.solids[0] else {
            panic!("expected a sweep");
        };
        let up = sweep.up.unwrap();
        assert_relative_eq!(up.z, 1.0, epsilon = 1e-12);
    }
}
