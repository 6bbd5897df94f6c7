// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Profile definitions, built in the profile's local XY plane

use super::ProfileArea;
use crate::error::{ImportError, Result};
use crate::session::ImportSession;
use ifc_bridge_geometry::{
    offset_loop, CurveGeometry, CurveLoop, CurveSegment, Error as GeometryError, Profile, Repair,
    Vector3,
};
use ifc_bridge_model::{DecodedEntity, EntityId, IfcType};

pub(crate) fn build(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<ProfileArea> {
    use IfcType::*;
    match record.ifc_type {
        IfcArbitraryClosedProfileDef | IfcArbitraryProfileDefWithVoids => {
            let outer_id = record
                .ref_attr("OuterCurve")
                .ok_or_else(|| ImportError::null(record.id, "OuterCurve"))?;
            let mut profile = Profile::new(closed_loop(session, record.id, outer_id)?);
            for inner_id in record.refs_attr("InnerCurves") {
                match closed_loop(session, record.id, inner_id) {
                    Ok(inner) => profile.add_inner(inner),
                    Err(err) => session.warn(record.id, format!("void {inner_id} ignored: {err}")),
                }
            }
            Ok(ProfileArea::Areas(vec![profile]))
        }
        IfcArbitraryOpenProfileDef => {
            let curve = open_curve(session, record)?;
            Ok(ProfileArea::Open(curve))
        }
        IfcCenterLineProfileDef => {
            let curve = open_curve(session, record)?;
            let thickness = length(session, record, "Thickness")?;
            Ok(ProfileArea::Areas(vec![thickened(session, &curve, thickness)?]))
        }
        IfcDerivedProfileDef => {
            let parent = session
                .profile(record.ref_attr("ParentProfile"))
                .ok_or_else(|| ImportError::invalid(record.id, "ParentProfile", "unresolved profile"))?;
            let operator = session
                .placement(record.ref_attr("Operator"))
                .ok_or_else(|| ImportError::invalid(record.id, "Operator", "unresolved operator"))?;
            Ok(parent.transformed(&operator))
        }
        IfcCompositeProfileDef => {
            let mut areas = Vec::new();
            for id in record.refs_attr("Profiles") {
                match session.profile(Some(id)) {
                    Some(ProfileArea::Areas(parts)) => areas.extend(parts),
                    Some(ProfileArea::Open(_)) => {
                        return Err(ImportError::invalid(record.id, "Profiles", format!("{id} is open")))
                    }
                    None => session.warn(record.id, format!("part {id} ignored")),
                }
            }
            if areas.is_empty() {
                return Err(GeometryError::profile("composite profile has no usable parts").into());
            }
            Ok(ProfileArea::Areas(areas))
        }
        _ if record.ifc_type.is_subtype_of(&IfcParameterizedProfileDef) => {
            let profile = parameterized(session, record)?;
            let position = session.optional_placement(record.ref_attr("Position"));
            Ok(ProfileArea::Areas(vec![profile.transformed(&position)]))
        }
        _ => Err(ImportError::UnhandledSubtype {
            entity: record.id,
            ifc_type: record.ifc_type.class_name().to_string(),
            expected: "profile",
        }),
    }
}

fn length(session: &ImportSession<'_>, record: &DecodedEntity, attribute: &str) -> Result<f64> {
    record
        .float_attr(attribute)
        .map(|v| session.length(v))
        .ok_or_else(|| ImportError::invalid(record.id, attribute, "not a number"))
}

fn optional_length(session: &ImportSession<'_>, record: &DecodedEntity, attribute: &str) -> Option<f64> {
    record
        .float_attr(attribute)
        .map(|v| session.length(v))
        .filter(|v| *v > 0.0)
}

fn parameterized(session: &ImportSession<'_>, record: &DecodedEntity) -> Result<Profile> {
    use IfcType::*;
    let len = |attribute: &str| length(session, record, attribute);
    let opt = |attribute: &str| optional_length(session, record, attribute);
    let profile = match record.ifc_type {
        IfcRectangleProfileDef => Profile::rectangle(len("XDim")?, len("YDim")?),
        IfcRoundedRectangleProfileDef => {
            Profile::rounded_rectangle(len("XDim")?, len("YDim")?, len("RoundingRadius")?)
        }
        IfcRectangleHollowProfileDef => Profile::hollow_rectangle(
            len("XDim")?,
            len("YDim")?,
            len("WallThickness")?,
            opt("InnerFilletRadius").unwrap_or(0.0),
            opt("OuterFilletRadius").unwrap_or(0.0),
        ),
        IfcCircleProfileDef => Profile::circle(len("Radius")?),
        IfcCircleHollowProfileDef => Profile::hollow_circle(len("Radius")?, len("WallThickness")?),
        IfcEllipseProfileDef => Profile::ellipse(len("SemiAxis1")?, len("SemiAxis2")?),
        IfcIShapeProfileDef => Profile::i_shape(
            len("OverallWidth")?,
            len("OverallDepth")?,
            len("WebThickness")?,
            len("FlangeThickness")?,
            opt("FilletRadius"),
        ),
        IfcLShapeProfileDef => {
            let depth = len("Depth")?;
            Profile::l_shape(
                depth,
                opt("Width").unwrap_or(depth),
                len("Thickness")?,
                opt("FilletRadius"),
            )
        }
        IfcTShapeProfileDef => Profile::t_shape(
            len("Depth")?,
            len("FlangeWidth")?,
            len("WebThickness")?,
            len("FlangeThickness")?,
            opt("FilletRadius"),
        ),
        IfcUShapeProfileDef => Profile::u_shape(
            len("Depth")?,
            len("FlangeWidth")?,
            len("WebThickness")?,
            len("FlangeThickness")?,
            opt("FilletRadius"),
        ),
        IfcCShapeProfileDef => Profile::c_shape(
            len("Depth")?,
            len("Width")?,
            len("WallThickness")?,
            len("Girth")?,
        ),
        _ => {
            return Err(ImportError::UnhandledSubtype {
                entity: record.id,
                ifc_type: record.ifc_type.class_name().to_string(),
                expected: "parameterized profile",
            })
        }
    };
    Ok(profile?)
}

/// Closed loop of a profile boundary; small closure gaps are repaired
fn closed_loop(session: &mut ImportSession<'_>, owner: EntityId, curve_id: EntityId) -> Result<CurveLoop> {
    let curve = session
        .curve(Some(curve_id))
        .ok_or_else(|| ImportError::invalid(owner, "OuterCurve", format!("curve {curve_id} unresolved")))?;
    let mut curve_loop = match curve {
        CurveGeometry::Loop(curve_loop) => curve_loop,
        CurveGeometry::Parametric(curve) if curve.is_cyclic() => {
            CurveLoop::from_segments_unchecked(vec![curve.full_segment()?])
        }
        CurveGeometry::Parametric(_) => {
            return Err(GeometryError::profile("an unbounded line cannot bound a profile").into())
        }
    };
    if let Repair::LineRegenerated { gap } = curve_loop.close(&session.tolerance())? {
        session.warn(owner, format!("profile boundary {curve_id} closed across a gap of {gap:.6}"));
    }
    Ok(curve_loop)
}

fn open_curve(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<CurveLoop> {
    match session.curve(record.ref_attr("Curve")) {
        Some(CurveGeometry::Loop(curve_loop)) => Ok(curve_loop),
        Some(CurveGeometry::Parametric(curve)) if curve.is_cyclic() => {
            Ok(CurveLoop::from_segments_unchecked(vec![curve.full_segment()?]))
        }
        Some(CurveGeometry::Parametric(_)) => {
            Err(GeometryError::profile("open profile curve is unbounded").into())
        }
        None => Err(ImportError::invalid(record.id, "Curve", "unresolved curve")),
    }
}

/// Area swept by a center line of the given thickness
fn thickened(session: &ImportSession<'_>, center: &CurveLoop, thickness: f64) -> Result<Profile> {
    let tolerance = session.tolerance();
    let half = thickness / 2.0;
    let left = offset_loop(center, half, &Vector3::z(), tolerance.vertex)?;
    let right = offset_loop(center, -half, &Vector3::z(), tolerance.vertex)?.flipped();
    let (Some(left_end), Some(right_start), Some(right_end), Some(left_start)) = (
        left.end_point(),
        right.start_point(),
        right.end_point(),
        left.start_point(),
    ) else {
        return Err(GeometryError::profile("center line has no extent").into());
    };
    let mut segments = left.into_segments();
    segments.push(CurveSegment::line(left_end, right_start));
    segments.extend(right.into_segments());
    segments.push(CurveSegment::line(right_end, left_start));
    let (outline, _) = CurveLoop::heal(segments, &tolerance)?;
    Ok(Profile::new(outline))
}

#[cfg(test)]
mod tests {
    use crate::entity::ProfileArea;
    use crate::options::ImportOptions;
    use crate::session::ImportSession;
    use approx::assert_relative_eq;
    use ifc_bridge_model::EntityId;
    use ifc_bridge_parser::StepStore;

    fn store(data: &str) -> StepStore {
        StepStore::parse(format!(
            "ISO-10303-21;\nHEADER;\nFILE_SCHEMA(('IFC2X3'));\nENDSEC;\nDATA;\n#1=IFCUNITASSIGNMENT(());\n{data}\nENDSEC;\nEND-ISO-10303-21;\n"
        ))
        .unwrap()
    }

    fn area(profile: &ProfileArea) -> f64 {
        match profile {
            ProfileArea::Areas(parts) => parts
                .iter()
                .map(|p| p.to_polygon(64, 1e-9).unwrap().0.area())
                .sum(),
            ProfileArea::Open(_) => 0.0,
        }
    }

    #[test]
    fn test_positioned_rectangle() {
        let store = store(
            "#2=IFCCARTESIANPOINT((5.,0.));
#3=IFCAXIS2PLACEMENT2D(#2,$);
#4=IFCRECTANGLEPROFILEDEF(.AREA.,$,#3,2.,1.);",
        );
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let profile = session.profile(Some(EntityId(4))).unwrap();
        assert_relative_eq!(area(&profile), 2.0, epsilon = 1e-9);
        let ProfileArea::Areas(parts) = profile else {
            panic!("closed profile expected")
        };
        let start = parts[0].outer.start_point().unwrap();
        assert!(start.x >= 4.0 && start.x <= 6.0);
    }

    #[test]
    fn test_arbitrary_profile_with_gap_is_closed() {
        let store = store(
            "#2=IFCCARTESIANPOINT((0.,0.));
#3=IFCCARTESIANPOINT((4.,0.));
#4=IFCCARTESIANPOINT((4.,3.));
#5=IFCCARTESIANPOINT((0.,3.));
#6=IFCCARTESIANPOINT((0.,0.0002));
#7=IFCPOLYLINE((#2,#3,#4,#5,#6));
#8=IFCARBITRARYCLOSEDPROFILEDEF(.AREA.,$,#7);",
        );
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let profile = session.profile(Some(EntityId(8))).unwrap();
        let ProfileArea::Areas(parts) = &profile else {
            panic!("closed profile expected")
        };
        assert!(parts[0].outer.is_closed(1e-9));
        assert_relative_eq!(area(&profile), 12.0, epsilon = 1e-3);
    }

    #[test]
    fn test_center_line_profile_area() {
        let store = store(
            "#2=IFCCARTESIANPOINT((0.,0.));
#3=IFCCARTESIANPOINT((10.,0.));
#4=IFCPOLYLINE((#2,#3));
#5=IFCCENTERLINEPROFILEDEF(.AREA.,$,#4,0.5);",
        );
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let profile = session.profile(Some(EntityId(5))).unwrap();
        assert_relative_eq!(area(&profile), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_composite_of_derived_profiles() {
        let store = store(
            "#2=IFCCIRCLEPROFILEDEF(.AREA.,$,$,1.);
#3=IFCCARTESIANPOINT((5.,0.));
#4=IFCCARTESIANTRANSFORMATIONOPERATOR2D($,$,#3,1.);
#5=IFCDERIVEDPROFILEDEF(.AREA.,$,#2,#4,$);
#6=IFCCOMPOSITEPROFILEDEF(.AREA.,$,(#2,#5),$);",
        );
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let ProfileArea::Areas(parts) = session.profile(Some(EntityId(6))).unwrap() else {
            panic!("closed profile expected")
        };
        assert_eq!(parts.len(), 2);
        let (_, frame) = parts[1].to_polygon(64, 1e-9).unwrap();
        assert!((frame.origin.x - 5.0).abs() < 1.0 + 1e-9);
    }

    #[test]
    fn test_i_shape_with_invalid_dimensions_fails() {
        let store = store("#2=IFCISHAPEPROFILEDEF(.AREA.,$,$,0.2,0.3,0.25,0.02,$);");
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        assert!(session.profile(Some(EntityId(2))).is_none());
        assert!(session.diagnostics().for_entity(EntityId(2)).any(|d| d.fatal_for_entity));
    }
}
