// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Points, directions, placements and transformation operators

use crate::error::{ImportError, Result};
use crate::session::ImportSession;
use ifc_bridge_geometry::{
    axis2_placement_2d, axis2_placement_3d, transformation_operator_2d,
    transformation_operator_3d, Matrix4, OperatorScale, Point2, Point3, Vector2, Vector3,
};
use ifc_bridge_model::{DecodedEntity, EntityId, IfcType};

fn coordinates(record: &DecodedEntity, attribute: &str) -> Result<Vec<f64>> {
    let values = record
        .attribute(attribute)
        .and_then(|v| v.as_float_list())
        .ok_or_else(|| ImportError::invalid(record.id, attribute, "not a list of numbers"))?;
    if values.is_empty() || values.len() > 3 {
        return Err(ImportError::invalid(
            record.id,
            attribute,
            format!("{} coordinates", values.len()),
        ));
    }
    Ok(values)
}

/// Cartesian point in host units; 2D points get z = 0
pub(crate) fn point_3d(session: &ImportSession<'_>, id: EntityId) -> Result<Point3<f64>> {
    let record = session.record(id)?;
    if record.ifc_type != IfcType::IfcCartesianPoint {
        return Err(ImportError::UnhandledSubtype {
            entity: id,
            ifc_type: record.ifc_type.class_name().to_string(),
            expected: "cartesian point",
        });
    }
    let c = coordinates(&record, "Coordinates")?;
    let at = |i: usize| c.get(i).copied().unwrap_or(0.0);
    Ok(Point3::new(
        session.length(at(0)),
        session.length(at(1)),
        session.length(at(2)),
    ))
}

pub(crate) fn point_2d(session: &ImportSession<'_>, id: EntityId) -> Result<Point2<f64>> {
    let p = point_3d(session, id)?;
    Ok(Point2::new(p.x, p.y))
}

/// Direction ratios, not normalized
pub(crate) fn direction_3d(session: &ImportSession<'_>, id: EntityId) -> Result<Vector3<f64>> {
    let record = session.record(id)?;
    let c = coordinates(&record, "DirectionRatios")?;
    let at = |i: usize| c.get(i).copied().unwrap_or(0.0);
    let v = Vector3::new(at(0), at(1), at(2));
    if v.norm() < 1e-12 {
        return Err(ImportError::invalid(id, "DirectionRatios", "zero direction"));
    }
    Ok(v)
}

pub(crate) fn direction_2d(session: &ImportSession<'_>, id: EntityId) -> Result<Vector2<f64>> {
    let v = direction_3d(session, id)?;
    Ok(Vector2::new(v.x, v.y))
}

fn optional<T>(
    id: Option<EntityId>,
    read: impl FnOnce(EntityId) -> Result<T>,
) -> Result<Option<T>> {
    id.map(read).transpose()
}

fn location(session: &ImportSession<'_>, record: &DecodedEntity) -> Result<Point3<f64>> {
    let id = record
        .ref_attr("Location")
        .ok_or_else(|| ImportError::null(record.id, "Location"))?;
    point_3d(session, id)
}

/// Matrix of a placement or transformation operator record
pub(crate) fn build(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<Matrix4<f64>> {
    use IfcType::*;
    match record.ifc_type {
        IfcAxis2Placement3D => {
            let origin = location(session, record)?;
            let axis = optional(record.ref_attr("Axis"), |id| direction_3d(session, id))?;
            let reference = optional(record.ref_attr("RefDirection"), |id| direction_3d(session, id))?;
            Ok(axis2_placement_3d(origin, axis, reference))
        }
        IfcAxis2Placement2D => {
            let origin = location(session, record)?;
            let reference = optional(record.ref_attr("RefDirection"), |id| direction_2d(session, id))?;
            Ok(axis2_placement_2d(Point2::new(origin.x, origin.y), reference))
        }
        IfcAxis1Placement => {
            let origin = location(session, record)?;
            let axis = optional(record.ref_attr("Axis"), |id| direction_3d(session, id))?;
            Ok(axis2_placement_3d(origin, axis, None))
        }
        IfcLocalPlacement => {
            let relative_id = record
                .ref_attr("RelativePlacement")
                .ok_or_else(|| ImportError::null(record.id, "RelativePlacement"))?;
            let relative = session
                .placement(Some(relative_id))
                .ok_or_else(|| ImportError::invalid(record.id, "RelativePlacement", "unresolved"))?;
            let Some(parent_id) = record.ref_attr("PlacementRelTo") else {
                return Ok(relative);
            };
            match session.placement(Some(parent_id)) {
                Some(parent) => Ok(parent * relative),
                None => {
                    session.warn(
                        record.id,
                        format!("relative placement {parent_id} unavailable, placing at the origin"),
                    );
                    Ok(relative)
                }
            }
        }
        IfcCartesianTransformationOperator2D | IfcCartesianTransformationOperator2DnonUniform => {
            let origin = point_2d(session, required(record, "LocalOrigin")?)?;
            let axis1 = optional(record.ref_attr("Axis1"), |id| direction_2d(session, id))?;
            let axis2 = optional(record.ref_attr("Axis2"), |id| direction_2d(session, id))?;
            Ok(transformation_operator_2d(origin, axis1, axis2, operator_scale(record)))
        }
        IfcCartesianTransformationOperator3D | IfcCartesianTransformationOperator3DnonUniform => {
            let origin = point_3d(session, required(record, "LocalOrigin")?)?;
            let axis1 = optional(record.ref_attr("Axis1"), |id| direction_3d(session, id))?;
            let axis2 = optional(record.ref_attr("Axis2"), |id| direction_3d(session, id))?;
            let axis3 = optional(record.ref_attr("Axis3"), |id| direction_3d(session, id))?;
            Ok(transformation_operator_3d(origin, axis1, axis2, axis3, operator_scale(record)))
        }
        _ => Err(ImportError::UnhandledSubtype {
            entity: record.id,
            ifc_type: record.ifc_type.class_name().to_string(),
            expected: "placement",
        }),
    }
}

fn required(record: &DecodedEntity, attribute: &str) -> Result<EntityId> {
    record
        .ref_attr(attribute)
        .ok_or_else(|| ImportError::null(record.id, attribute))
}

fn operator_scale(record: &DecodedEntity) -> OperatorScale {
    let scale = record.float_attr("Scale");
    match record.ifc_type {
        IfcType::IfcCartesianTransformationOperator2DnonUniform
        | IfcType::IfcCartesianTransformationOperator3DnonUniform => OperatorScale::non_uniform(
            scale,
            record.float_attr("Scale2"),
            record.float_attr("Scale3"),
        ),
        _ => OperatorScale::uniform(scale),
    }
}
