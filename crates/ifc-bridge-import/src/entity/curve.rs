// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Curve entities
//!
//! A curve is either one unbounded [`ParametricCurve`] (lines, circles,
//! ellipses and trims that span a whole revolution) or a [`CurveLoop`].

use super::placement::{direction_3d, point_3d};
use crate::error::{ImportError, Result};
use crate::session::ImportSession;
use ifc_bridge_geometry::{
    offset_loop, offset_parametric, trim_curve, ConicArc, CurveGeometry, CurveLoop, CurveSegment,
    Frame, ParametricCurve, Point3, Repair, TrimBound, TrimPreference, TrimmedCurve,
    Vector3,
};
use ifc_bridge_model::{AttributeValue, DecodedEntity, EntityId, IfcType};

pub(crate) fn build(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<CurveGeometry> {
    use IfcType::*;
    match record.ifc_type {
        IfcLine => line(session, record),
        IfcCircle => {
            let frame = conic_frame(session, record)?;
            let radius = positive_length(session, record, "Radius")?;
            Ok(CurveGeometry::Parametric(ParametricCurve::Circle { frame, radius }))
        }
        IfcEllipse => {
            let frame = conic_frame(session, record)?;
            let semi_axis1 = positive_length(session, record, "SemiAxis1")?;
            let semi_axis2 = positive_length(session, record, "SemiAxis2")?;
            Ok(CurveGeometry::Parametric(ParametricCurve::Ellipse {
                frame,
                semi_axis1,
                semi_axis2,
            }))
        }
        IfcPolyline => {
            let points = record
                .refs_attr("Points")
                .into_iter()
                .map(|id| point_3d(session, id))
                .collect::<Result<Vec<_>>>()?;
            Ok(CurveGeometry::Loop(CurveLoop::polyline(&points, &session.tolerance())?))
        }
        IfcIndexedPolyCurve => indexed_poly_curve(session, record),
        IfcTrimmedCurve => trimmed(session, record),
        IfcCompositeCurve => composite(session, record),
        IfcOffsetCurve2D => offset(session, record, Vector3::z()),
        IfcOffsetCurve3D => {
            let normal_id = record
                .ref_attr("RefDirection")
                .ok_or_else(|| ImportError::null(record.id, "RefDirection"))?;
            let normal = direction_3d(session, normal_id)?.normalize();
            offset(session, record, normal)
        }
        _ => Err(ImportError::UnhandledSubtype {
            entity: record.id,
            ifc_type: record.ifc_type.class_name().to_string(),
            expected: "curve",
        }),
    }
}

fn positive_length(session: &ImportSession<'_>, record: &DecodedEntity, attribute: &str) -> Result<f64> {
    let value = record
        .float_attr(attribute)
        .ok_or_else(|| ImportError::invalid(record.id, attribute, "not a number"))?;
    if value <= 0.0 {
        return Err(ImportError::invalid(record.id, attribute, format!("{value} is not positive")));
    }
    Ok(session.length(value))
}

fn conic_frame(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<Frame> {
    let position = record
        .ref_attr("Position")
        .ok_or_else(|| ImportError::null(record.id, "Position"))?;
    let matrix = session
        .placement(Some(position))
        .ok_or_else(|| ImportError::invalid(record.id, "Position", "unresolved placement"))?;
    Ok(Frame::from_matrix(&matrix))
}

fn line(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<CurveGeometry> {
    let point_id = record
        .ref_attr("Pnt")
        .ok_or_else(|| ImportError::null(record.id, "Pnt"))?;
    let origin = point_3d(session, point_id)?;
    let vector = session.record_attr(record, "Dir")?;
    let orientation = vector
        .ref_attr("Orientation")
        .ok_or_else(|| ImportError::null(vector.id, "Orientation"))?;
    let direction = direction_3d(session, orientation)?.normalize();
    let magnitude = vector
        .float_attr("Magnitude")
        .ok_or_else(|| ImportError::invalid(vector.id, "Magnitude", "not a number"))?;
    Ok(CurveGeometry::Parametric(ParametricCurve::Line {
        origin,
        direction: direction * session.length(magnitude),
    }))
}

fn report_repairs(session: &mut ImportSession<'_>, id: EntityId, repairs: &[Repair]) {
    for repair in repairs {
        if let Repair::LineRegenerated { gap } = repair {
            session.warn(id, format!("gap of {gap:.6} repaired by regenerating a line"));
        }
    }
}

/// Point list of an IfcIndexedPolyCurve
fn point_list(session: &ImportSession<'_>, id: EntityId) -> Result<Vec<Point3<f64>>> {
    let record = session.record(id)?;
    let rows = record
        .list_attr("CoordList")
        .ok_or_else(|| ImportError::invalid(id, "CoordList", "not a list"))?;
    rows.iter()
        .map(|row| {
            let c = row
                .as_float_list()
                .filter(|c| c.len() == 2 || c.len() == 3)
                .ok_or_else(|| ImportError::invalid(id, "CoordList", "malformed coordinates"))?;
            let z = c.get(2).copied().unwrap_or(0.0);
            Ok(Point3::new(
                session.length(c[0]),
                session.length(c[1]),
                session.length(z),
            ))
        })
        .collect()
}

/// 1-based indices of an index segment, whether wrapped or inline
fn segment_indices(value: &AttributeValue) -> Option<Vec<usize>> {
    let AttributeValue::TypedValue(_, args) = value else {
        return None;
    };
    let items = match args.as_slice() {
        [AttributeValue::List(items)] => items.as_slice(),
        items => items,
    };
    items
        .iter()
        .map(|v| v.as_integer().and_then(|i| usize::try_from(i).ok()))
        .collect()
}

fn indexed_poly_curve(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<CurveGeometry> {
    let points_id = record
        .ref_attr("Points")
        .ok_or_else(|| ImportError::null(record.id, "Points"))?;
    let points = point_list(session, points_id)?;
    let tolerance = session.tolerance();

    let Some(segments) = record.list_attr("Segments") else {
        return Ok(CurveGeometry::Loop(CurveLoop::polyline(&points, &tolerance)?));
    };
    let at = |i: usize| -> Result<Point3<f64>> {
        i.checked_sub(1)
            .and_then(|i| points.get(i).copied())
            .ok_or_else(|| ImportError::invalid(record.id, "Segments", format!("index {i} out of range")))
    };

    let mut pieces = Vec::new();
    for segment in segments {
        let indices = segment_indices(segment)
            .ok_or_else(|| ImportError::invalid(record.id, "Segments", "malformed segment index"))?;
        match segment.type_tag() {
            Some("IFCLINEINDEX") => {
                for pair in indices.windows(2) {
                    let (a, b) = (at(pair[0])?, at(pair[1])?);
                    if (b - a).norm() > tolerance.vertex {
                        pieces.push(CurveSegment::line(a, b));
                    }
                }
            }
            Some("IFCARCINDEX") if indices.len() == 3 => {
                let arc = ConicArc::through_points(at(indices[0])?, at(indices[1])?, at(indices[2])?)?;
                pieces.push(CurveSegment::Arc(arc));
            }
            other => {
                return Err(ImportError::invalid(
                    record.id,
                    "Segments",
                    format!("unsupported segment {}", other.unwrap_or("?")),
                ))
            }
        }
    }
    let (curve_loop, repairs) = CurveLoop::heal(pieces, &tolerance)?;
    report_repairs(session, record.id, &repairs);
    if curve_loop.is_empty() {
        return Err(ifc_bridge_geometry::Error::degenerate("indexed poly curve has no segments").into());
    }
    Ok(CurveGeometry::Loop(curve_loop))
}

fn trim_bound(
    session: &ImportSession<'_>,
    record: &DecodedEntity,
    attribute: &str,
    angular: bool,
) -> Result<TrimBound> {
    let values = record
        .list_attr(attribute)
        .ok_or_else(|| ImportError::invalid(record.id, attribute, "not a list"))?;
    let mut bound = TrimBound::default();
    for value in values {
        match value {
            AttributeValue::EntityRef(id) => bound.point = Some(point_3d(session, *id)?),
            AttributeValue::TypedValue(..) | AttributeValue::Float(_) | AttributeValue::Integer(_) => {
                if let Some(t) = value.as_float() {
                    bound.parameter = Some(if angular { session.angle(t) } else { t });
                }
            }
            _ => {}
        }
    }
    if bound.parameter.is_none() && bound.point.is_none() {
        return Err(ImportError::invalid(record.id, attribute, "empty trim select"));
    }
    Ok(bound)
}

fn trimmed(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<CurveGeometry> {
    let basis_id = record
        .ref_attr("BasisCurve")
        .ok_or_else(|| ImportError::null(record.id, "BasisCurve"))?;
    let basis = match session.curve(Some(basis_id)) {
        Some(CurveGeometry::Parametric(curve)) => curve,
        Some(CurveGeometry::Loop(_)) => {
            return Err(ifc_bridge_geometry::Error::unsupported("trimming a bounded basis curve").into())
        }
        None => return Err(ImportError::invalid(record.id, "BasisCurve", "unresolved curve")),
    };
    let angular = basis.is_cyclic();
    let trim1 = trim_bound(session, record, "Trim1", angular)?;
    let trim2 = trim_bound(session, record, "Trim2", angular)?;
    let sense = record.bool_attr("SenseAgreement").unwrap_or(true);
    let preference = match record.enum_attr("MasterRepresentation") {
        Some(m) if m.eq_ignore_ascii_case("CARTESIAN") => TrimPreference::Cartesian,
        _ => TrimPreference::Parameter,
    };

    let result = trim_curve(&basis, &trim1, &trim2, sense, preference, session.tolerance().loose())?;
    for warning in result.warnings {
        session.warn(record.id, warning);
    }
    Ok(match result.curve {
        TrimmedCurve::Bounded(segment) => {
            CurveGeometry::Loop(CurveLoop::from_segments_unchecked(vec![segment]))
        }
        TrimmedCurve::Unbounded(curve) => CurveGeometry::Parametric(curve),
    })
}

/// Segments of any curve that can take part in a loop
fn bounded_segments(curve: CurveGeometry, id: EntityId) -> Result<Vec<CurveSegment>> {
    match curve {
        CurveGeometry::Loop(curve_loop) => Ok(curve_loop.into_segments()),
        CurveGeometry::Parametric(curve) if curve.is_cyclic() => Ok(vec![curve.full_segment()?]),
        CurveGeometry::Parametric(_) => Err(ImportError::invalid(
            id,
            "ParentCurve",
            "an unbounded line cannot be part of a loop",
        )),
    }
}

fn composite(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<CurveGeometry> {
    let tolerance = session.tolerance();
    let mut curve_loop = CurveLoop::new();
    for segment_id in record.refs_attr("Segments") {
        let segment = session.record(segment_id)?;
        let parent_id = segment
            .ref_attr("ParentCurve")
            .ok_or_else(|| ImportError::null(segment_id, "ParentCurve"))?;
        let parent = session
            .curve(Some(parent_id))
            .ok_or_else(|| ImportError::invalid(segment_id, "ParentCurve", "unresolved curve"))?;
        let mut pieces = bounded_segments(parent, parent_id)?;
        if segment.bool_attr("SameSense") == Some(false) {
            pieces.reverse();
            pieces.iter_mut().for_each(|p| *p = p.reversed());
        }
        for piece in pieces {
            curve_loop.append(piece, tolerance.vertex)?;
        }
    }
    if curve_loop.is_empty() {
        return Err(ifc_bridge_geometry::Error::degenerate("composite curve has no segments").into());
    }
    Ok(CurveGeometry::Loop(curve_loop))
}

fn offset(session: &mut ImportSession<'_>, record: &DecodedEntity, normal: Vector3<f64>) -> Result<CurveGeometry> {
    let basis_id = record
        .ref_attr("BasisCurve")
        .ok_or_else(|| ImportError::null(record.id, "BasisCurve"))?;
    let distance = record
        .float_attr("Distance")
        .ok_or_else(|| ImportError::invalid(record.id, "Distance", "not a number"))?;
    let distance = session.length(distance);
    let basis = session
        .curve(Some(basis_id))
        .ok_or_else(|| ImportError::invalid(record.id, "BasisCurve", "unresolved curve"))?;
    Ok(match basis {
        CurveGeometry::Loop(curve_loop) => CurveGeometry::Loop(offset_loop(
            &curve_loop,
            distance,
            &normal,
            session.tolerance().vertex,
        )?),
        CurveGeometry::Parametric(curve) => {
            CurveGeometry::Parametric(offset_parametric(&curve, distance, &normal)?)
        }
    })
}

#[cfg(test)]
mod tests {
    use crate::options::ImportOptions;
    use crate::session::ImportSession;
    use approx::assert_relative_eq;
    use ifc_bridge_geometry::{CurveGeometry, CurveSegment, ParametricCurve, Point3};
    use ifc_bridge_model::EntityId;
    use ifc_bridge_parser::StepStore;

    fn store(data: &str) -> StepStore {
        StepStore::parse(format!(
            "ISO-10303-21;\nHEADER;\nFILE_SCHEMA(('IFC4'));\nENDSEC;\nDATA;\n{data}\nENDSEC;\nEND-ISO-10303-21;\n"
        ))
        .unwrap()
    }

    const MM: &str = "#1=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#2=IFCUNITASSIGNMENT((#1));
#3=IFCCARTESIANPOINT((0.,0.));
#4=IFCAXIS2PLACEMENT2D(#3,$);";

    #[test]
    fn test_circle_radius_in_host_units() {
        let store = store(&format!("{MM}\n#5=IFCCIRCLE(#4,5.);"));
        let options = ImportOptions::default().with_internal_units_per_metre(1000.0);
        let mut session = ImportSession::new(&store, options).unwrap();
        match session.curve(Some(EntityId(5))) {
            Some(CurveGeometry::Parametric(ParametricCurve::Circle { radius, .. })) => {
                assert_relative_eq!(radius, 5.0 * 0.001 * 1000.0)
            }
            other => panic!("expected a circle, got {other:?}"),
        }
    }

    #[test]
    fn test_trimmed_circle_by_parameter() {
        let store = store(&format!(
            "{MM}
#5=IFCCIRCLE(#4,1000.);
#6=IFCTRIMMEDCURVE(#5,(IFCPARAMETERVALUE(0.)),(IFCPARAMETERVALUE(1.5707963267948966)),.T.,.PARAMETER.);"
        ));
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let curve = session.curve(Some(EntityId(6))).unwrap();
        let segment = &curve.as_loop().unwrap().segments()[0];
        assert_relative_eq!(segment.start_point(), Point3::new(1.0, 0.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(segment.end_point(), Point3::new(0.0, 1.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn test_trimmed_line_inverted_bounds_swap_with_warning() {
        let store = store(
            "#1=IFCUNITASSIGNMENT(());
#2=IFCCARTESIANPOINT((0.,0.,0.));
#3=IFCDIRECTION((1.,0.,0.));
#4=IFCVECTOR(#3,1.);
#5=IFCLINE(#2,#4);
#6=IFCTRIMMEDCURVE(#5,(IFCPARAMETERVALUE(4.)),(IFCPARAMETERVALUE(1.)),.T.,.PARAMETER.);",
        );
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let curve = session.curve(Some(EntityId(6))).unwrap();
        let segment = &curve.as_loop().unwrap().segments()[0];
        assert_relative_eq!(segment.start_point(), Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(segment.end_point(), Point3::new(4.0, 0.0, 0.0));
        assert!(session
            .diagnostics()
            .for_entity(EntityId(6))
            .any(|d| d.message.contains("swapped")));
    }

    #[test]
    fn test_composite_with_reversed_segment_closes() {
        let store = store(
            "#1=IFCUNITASSIGNMENT(());
#2=IFCCARTESIANPOINT((0.,0.));
#3=IFCCARTESIANPOINT((2.,0.));
#4=IFCCARTESIANPOINT((2.,2.));
#5=IFCCARTESIANPOINT((0.,2.));
#6=IFCPOLYLINE((#2,#3,#4));
#7=IFCPOLYLINE((#2,#5,#4));
#8=IFCCOMPOSITECURVESEGMENT(.CONTINUOUS.,.T.,#6);
#9=IFCCOMPOSITECURVESEGMENT(.CONTINUOUS.,.T.,#7);
#10=IFCCOMPOSITECURVE((#8,#9),.F.);",
        );
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let curve = session.curve(Some(EntityId(10))).unwrap();
        let curve_loop = curve.as_loop().unwrap();
        assert_eq!(curve_loop.len(), 4);
        assert!(curve_loop.is_closed(1e-9));
    }

    #[test]
    fn test_discontinuous_composite_is_fatal() {
        let store = store(
            "#1=IFCUNITASSIGNMENT(());
#2=IFCCARTESIANPOINT((0.,0.));
#3=IFCCARTESIANPOINT((1.,0.));
#4=IFCCARTESIANPOINT((5.,5.));
#5=IFCCARTESIANPOINT((6.,5.));
#6=IFCPOLYLINE((#2,#3));
#7=IFCPOLYLINE((#4,#5));
#8=IFCCOMPOSITECURVESEGMENT(.CONTINUOUS.,.T.,#6);
#9=IFCCOMPOSITECURVESEGMENT(.CONTINUOUS.,.T.,#7);
#10=IFCCOMPOSITECURVE((#8,#9),.F.);",
        );
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        assert!(session.curve(Some(EntityId(10))).is_none());
        assert!(session
            .diagnostics()
            .for_entity(EntityId(10))
            .any(|d| d.fatal_for_entity));
    }

    #[test]
    fn test_indexed_poly_curve_with_arc() {
        let store = store(
            "#1=IFCUNITASSIGNMENT(());
#2=IFCCARTESIANPOINTLIST2D(((0.,0.),(2.,0.),(3.,1.),(2.,2.),(0.,2.)));
#3=IFCINDEXEDPOLYCURVE(#2,(IFCLINEINDEX((1,2)),IFCARCINDEX((2,3,4)),IFCLINEINDEX((4,5,1))),.F.);",
        );
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let curve = session.curve(Some(EntityId(3))).unwrap();
        let segments = curve.as_loop().unwrap().segments();
        assert_eq!(segments.len(), 4);
        assert!(matches!(segments[1], CurveSegment::Arc(_)));
        assert_relative_eq!(segments[1].end_point(), Point3::new(2.0, 2.0, 0.0), epsilon = 1e-9);
        assert!(curve.as_loop().unwrap().is_closed(1e-9));
    }

    #[test]
    fn test_polyline_gap_is_healed_with_warning() {
        // Second polyline starts 0.3 mm away from the first one's end
        let store = store(
            "#1=IFCUNITASSIGNMENT(());
#2=IFCCARTESIANPOINTLIST2D(((0.,0.),(1.,0.),(1.0003,0.),(1.0003,1.)));
#3=IFCINDEXEDPOLYCURVE(#2,(IFCLINEINDEX((1,2)),IFCLINEINDEX((3,4))),.F.);",
        );
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let curve = session.curve(Some(EntityId(3))).unwrap();
        let segments = curve.as_loop().unwrap().segments();
        assert_eq!(segments.len(), 2);
        assert_relative_eq!(segments[1].start_point(), segments[0].end_point());
        assert!(session
            .diagnostics()
            .for_entity(EntityId(3))
            .any(|d| d.message.contains("repaired")));
    }
}
