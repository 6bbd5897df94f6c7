// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Manifold B-reps and the face reading shared with surface models

use super::GeometrySet;
use crate::entity::placement::point_3d;
use crate::entity::{EntityClass, EntityKind};
use crate::error::{ImportError, Result};
use crate::session::ImportSession;
use ifc_bridge_geometry::{CurveGeometry, FaceSetScope, Point3, Solid};
use ifc_bridge_model::{DecodedEntity, EntityId, IfcType};
use log::debug;

/// Warning text for a face set that lost faces
pub fn face_set_warning(realized: usize, declared: usize) -> String {
    format!("{realized} of {declared} valid faces, salvaged as a mesh")
}

pub(super) fn build(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<GeometrySet> {
    let outer = session.record_attr(record, "Outer")?;
    let mut voids = Vec::new();
    if record.ifc_type == IfcType::IfcFacetedBrepWithVoids {
        for id in record.refs_attr("Voids") {
            voids.push(session.record(id)?);
        }
    }

    let declared = outer.refs_attr("CfsFaces").len()
        + voids.iter().map(|v| v.refs_attr("CfsFaces").len()).sum::<usize>();
    let mut scope = FaceSetScope::begin(declared, true, session.tolerance().vertex);
    add_shell_faces(session, &mut scope, &outer, false);
    for void in &voids {
        add_shell_faces(session, &mut scope, void, true);
    }
    let solid = finish_scope(session, record.id, scope)?;
    Ok(GeometrySet::from_solid(solid))
}

/// Close a face set, warning when faces were lost
pub(super) fn finish_scope(session: &mut ImportSession<'_>, id: EntityId, scope: FaceSetScope) -> Result<Solid> {
    let outcome = scope.finish()?;
    if !outcome.is_complete() {
        for reason in &outcome.rejected {
            debug!("{id}: {reason}");
        }
        session.warn(id, face_set_warning(outcome.realized, outcome.declared));
    }
    Ok(outcome.solid)
}

/// Add the faces of a connected face set; `reverse` turns them inside out
pub(super) fn add_shell_faces(
    session: &mut ImportSession<'_>,
    scope: &mut FaceSetScope,
    shell: &DecodedEntity,
    reverse: bool,
) {
    for face_id in shell.refs_attr("CfsFaces") {
        add_face(session, scope, face_id, reverse);
    }
}

pub(super) fn add_face(
    session: &mut ImportSession<'_>,
    scope: &mut FaceSetScope,
    face_id: EntityId,
    reverse: bool,
) {
    match face_rings(session, face_id) {
        Ok((mut outer, mut inners)) => {
            if reverse {
                outer.reverse();
                inners.iter_mut().for_each(|ring| ring.reverse());
            }
            scope.add_face(outer, inners);
        }
        Err(err) => scope.reject(format!("face {face_id}: {err}")),
    }
}

/// Outer ring and inner rings of a face, honoring bound orientation
fn face_rings(
    session: &mut ImportSession<'_>,
    face_id: EntityId,
) -> Result<(Vec<Point3<f64>>, Vec<Vec<Point3<f64>>>)> {
    let face = session.record(face_id)?;
    let mut outer = None;
    let mut rings = Vec::new();
    for bound_id in face.refs_attr("Bounds") {
        let bound = session.record(bound_id)?;
        let loop_record = session.record_attr(&bound, "Bound")?;
        let mut ring = loop_points(session, &loop_record)?;
        if bound.bool_attr("Orientation") == Some(false) {
            ring.reverse();
        }
        if bound.ifc_type == IfcType::IfcFaceOuterBound && outer.is_none() {
            outer = Some(ring);
        } else {
            rings.push(ring);
        }
    }
    let outer = match outer {
        Some(ring) => ring,
        None if !rings.is_empty() => rings.remove(0),
        None => return Err(ImportError::invalid(face_id, "Bounds", "face has no bounds")),
    };
    Ok((outer, rings))
}

fn loop_points(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<Vec<Point3<f64>>> {
    match record.ifc_type {
        IfcType::IfcPolyLoop => record
            .refs_attr("Polygon")
            .into_iter()
            .map(|id| point_3d(session, id))
            .collect(),
        IfcType::IfcEdgeLoop => {
            let mut points = Vec::new();
            for id in record.refs_attr("EdgeList") {
                let oriented = session.record(id)?;
                let mut edge = edge_points(session, &oriented)?;
                if oriented.ifc_type == IfcType::IfcOrientedEdge
                    && oriented.bool_attr("Orientation") == Some(false)
                {
                    edge.reverse();
                }
                // The next edge starts at this one's end vertex
                edge.pop();
                points.extend(edge);
            }
            Ok(points)
        }
        _ => Err(ImportError::UnhandledSubtype {
            entity: record.id,
            ifc_type: record.ifc_type.class_name().to_string(),
            expected: "face loop",
        }),
    }
}

fn vertex(session: &ImportSession<'_>, edge: &DecodedEntity, attribute: &str) -> Result<Point3<f64>> {
    let vertex = session.record_attr(edge, attribute)?;
    let point = vertex
        .ref_attr("VertexGeometry")
        .ok_or_else(|| ImportError::null(vertex.id, "VertexGeometry"))?;
    point_3d(session, point)
}

/// Points along an edge from its start to its end vertex
fn edge_points(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<Vec<Point3<f64>>> {
    let edge = if record.ifc_type == IfcType::IfcOrientedEdge {
        session.record_attr(record, "EdgeElement")?
    } else {
        session.record(record.id)?
    };
    let start = vertex(session, &edge, "EdgeStart")?;
    let end = vertex(session, &edge, "EdgeEnd")?;
    if edge.ifc_type != IfcType::IfcEdgeCurve {
        return Ok(vec![start, end]);
    }

    let Some(geometry_id) = edge.ref_attr("EdgeGeometry") else {
        return Ok(vec![start, end]);
    };
    let geometry = session.record(geometry_id)?;
    if EntityKind::classify(&geometry.ifc_type, EntityClass::Curve).is_none() {
        debug!(
            "{}: {} edge geometry approximated by its chord",
            edge.id,
            geometry.ifc_type.class_name()
        );
        return Ok(vec![start, end]);
    }
    let Some(curve) = session.curve(Some(geometry_id)) else {
        return Ok(vec![start, end]);
    };
    let same_sense = edge.bool_attr("SameSense") != Some(false);
    let tolerance = session.tolerance().loose();
    let interior = match curve {
        CurveGeometry::Parametric(basis) if basis.is_cyclic() => {
            match (basis.parameter_of(&start, tolerance), basis.parameter_of(&end, tolerance)) {
                (Some(t1), Some(t2)) => {
                    let segment = if same_sense {
                        basis.segment(t1, t2)?
                    } else {
                        basis.segment(t2, t1)?.reversed()
                    };
                    segment.sample(session.segments())
                }
                _ => Vec::new(),
            }
        }
        CurveGeometry::Loop(curve) => {
            let mut points = curve.tessellate(session.segments(), tolerance);
            if !same_sense {
                points.reverse();
            }
            points
        }
        CurveGeometry::Parametric(_) => Vec::new(),
    };
    let mut points = vec![start];
    points.extend(interior);
    points.push(end);
    Ok(points)
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Unit cube as a faceted brep #41; the sixth face #35 is degenerate
    /// when `broken` is set
    pub fn cube(broken: bool) -> String {
        let left = if broken { "#5,#2,#5" } else { "#5,#2,#6,#9" };
        format!(
            "#2=IFCCARTESIANPOINT((0.,0.,0.));
#3=IFCCARTESIANPOINT((1.,0.,0.));
#4=IFCCARTESIANPOINT((1.,1.,0.));
#5=IFCCARTESIANPOINT((0.,1.,0.));
#6=IFCCARTESIANPOINT((0.,0.,1.));
#7=IFCCARTESIANPOINT((1.,0.,1.));
#8=IFCCARTESIANPOINT((1.,1.,1.));
#9=IFCCARTESIANPOINT((0.,1.,1.));
#10=IFCPOLYLOOP((#2,#5,#4,#3));
#11=IFCPOLYLOOP((#6,#7,#8,#9));
#12=IFCPOLYLOOP((#2,#3,#7,#6));
#13=IFCPOLYLOOP((#3,#4,#8,#7));
#14=IFCPOLYLOOP((#4,#5,#9,#8));
#15=IFCPOLYLOOP(({left}));
#20=IFCFACEOUTERBOUND(#10,.T.);
#21=IFCFACEOUTERBOUND(#11,.T.);
#22=IFCFACEOUTERBOUND(#12,.T.);
#23=IFCFACEOUTERBOUND(#13,.T.);
#24=IFCFACEOUTERBOUND(#14,.T.);
#25=IFCFACEOUTERBOUND(#15,.T.);
#30=IFCFACE((#20));
#31=IFCFACE((#21));
#32=IFCFACE((#22));
#33=IFCFACE((#23));
#34=IFCFACE((#24));
#35=IFCFACE((#25));
#40=IFCCLOSEDSHELL((#30,#31,#32,#33,#34,#35));
#41=IFCFACETEDBREP(#40);"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::store;
    use super::fixtures::cube;
    use crate::options::ImportOptions;
    use crate::session::ImportSession;
    use approx::assert_relative_eq;
    use ifc_bridge_geometry::Solid;
    use ifc_bridge_model::EntityId;

    #[test]
    fn test_complete_cube_is_brep() {
        let store = store(&cube(false));
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let set = session.item_geometry(Some(EntityId(41))).unwrap();
        assert!(matches!(set.solids[0], Solid::Brep(_)));
        let volume = set.solids[0].to_mesh(24, 1e-9).unwrap().volume();
        assert_relative_eq!(volume, 1.0, epsilon = 1e-5);
        assert_eq!(session.diagnostics().for_entity(EntityId(41)).count(), 0);
    }

    #[test]
    fn test_missing_face_is_salvaged_with_warning() {
        let store = store(&cube(true));
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let set = session.item_geometry(Some(EntityId(41))).unwrap();
        assert!(matches!(set.solids[0], Solid::Mesh(_)));
        let warning = session
            .diagnostics()
            .for_entity(EntityId(41))
            .find(|d| !d.fatal_for_entity)
            .unwrap();
        assert!(warning.message.contains("5 of 6 valid faces"));
    }

    #[test]
    fn test_reversed_bound_orientation() {
        let data = cube(false).replace("#20=IFCFACEOUTERBOUND(#10,.T.)", "#20=IFCFACEOUTERBOUND(#10,.F.)");
        let data = data.replace("#10=IFCPOLYLOOP((#2,#5,#4,#3))", "#10=IFCPOLYLOOP((#3,#4,#5,#2))");
        let store = store(&data);
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let set = session.item_geometry(Some(EntityId(41))).unwrap();
        let volume = set.solids[0].to_mesh(24, 1e-9).unwrap().volume();
        assert_relative_eq!(volume, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_edge_loop_with_arc_edge() {
        // Half disc: a diameter edge and a semicircular edge curve
        let store = store(
            "#2=IFCCARTESIANPOINT((-1.,0.,0.));
#3=IFCCARTESIANPOINT((1.,0.,0.));
#4=IFCVERTEXPOINT(#2);
#5=IFCVERTEXPOINT(#3);
#6=IFCCARTESIANPOINT((0.,0.,0.));
#7=IFCAXIS2PLACEMENT3D(#6,$,$);
#8=IFCCIRCLE(#7,1.);
#9=IFCEDGECURVE(#4,#5,$,.T.);
#10=IFCEDGECURVE(#5,#4,#8,.T.);
#11=IFCORIENTEDEDGE(*,*,#9,.T.);
#12=IFCORIENTEDEDGE(*,*,#10,.T.);
#13=IFCEDGELOOP((#11,#12));
#14=IFCFACEOUTERBOUND(#13,.T.);
#15=IFCFACE((#14));
#16=IFCOPENSHELL((#15));
#17=IFCSHELLBASEDSURFACEMODEL((#16));",
        );
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let set = session.item_geometry(Some(EntityId(17))).unwrap();
        let Solid::Brep(shell) = &set.solids[0] else {
            panic!("expected a brep");
        };
        assert!(shell.faces[0].outer.len() > 4);
        assert!(shell.faces[0].outer.iter().all(|p| p.y >= -1e-9));
    }
}
