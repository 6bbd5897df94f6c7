// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CSG primitives, boolean results and CSG solids
//!
//! Booleans are not evaluated. A difference keeps the first operand and
//! carries the second as voids, a union concatenates both operands.

use super::GeometrySet;
use crate::error::{ImportError, Result};
use crate::session::ImportSession;
use ifc_bridge_geometry::csg;
use ifc_bridge_model::{DecodedEntity, IfcType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BooleanOperator {
    Union,
    Intersection,
    Difference,
}

impl BooleanOperator {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "UNION" => Some(BooleanOperator::Union),
            "INTERSECTION" => Some(BooleanOperator::Intersection),
            "DIFFERENCE" => Some(BooleanOperator::Difference),
            _ => None,
        }
    }
}

pub(super) fn primitive(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<GeometrySet> {
    let position = session.optional_placement(record.ref_attr("Position"));
    let dim = |attribute: &str| -> Result<f64> {
        record
            .float_attr(attribute)
            .map(|v| session.length(v))
            .ok_or_else(|| ImportError::null(record.id, attribute))
    };
    let solid = match record.ifc_type {
        IfcType::IfcBlock => csg::block(dim("XLength")?, dim("YLength")?, dim("ZLength")?)?,
        IfcType::IfcRightCircularCylinder => csg::cylinder(dim("Radius")?, dim("Height")?)?,
        IfcType::IfcRightCircularCone => csg::cone(dim("BottomRadius")?, dim("Height")?)?,
        IfcType::IfcSphere => csg::sphere(dim("Radius")?)?,
        IfcType::IfcRectangularPyramid => {
            csg::rectangular_pyramid(dim("XLength")?, dim("YLength")?, dim("Height")?)?
        }
        _ => {
            return Err(ImportError::UnhandledSubtype {
                entity: record.id,
                ifc_type: record.ifc_type.class_name().to_string(),
                expected: "CSG primitive",
            })
        }
    };
    Ok(GeometrySet::from_solid(solid.transformed(&position)))
}

pub(super) fn boolean(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<GeometrySet> {
    let operator = record
        .enum_attr("Operator")
        .and_then(BooleanOperator::parse)
        .ok_or_else(|| ImportError::invalid(record.id, "Operator", "unknown boolean operator"))?;
    let first_id = record
        .ref_attr("FirstOperand")
        .ok_or_else(|| ImportError::null(record.id, "FirstOperand"))?;
    let mut result = session
        .item_geometry(Some(first_id))
        .ok_or_else(|| ImportError::invalid(record.id, "FirstOperand", "first operand has no geometry"))?;

    let second = session.record_attr(record, "SecondOperand")?;
    if second.ifc_type.is_subtype_of(&IfcType::IfcHalfSpaceSolid) {
        session.warn(record.id, "half-space clipping is not applied, keeping the first operand");
        return Ok(result);
    }
    if operator == BooleanOperator::Intersection {
        session.warn(record.id, "intersection is not evaluated, keeping the first operand");
        return Ok(result);
    }
    let Some(other) = session.item_geometry(Some(second.id)) else {
        session.warn(record.id, format!("second operand {} ignored", second.id));
        return Ok(result);
    };
    match operator {
        BooleanOperator::Difference => result.voids.extend(other.solids),
        _ => result.extend(other),
    }
    Ok(result)
}

pub(super) fn csg_solid(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<GeometrySet> {
    let root = record
        .ref_attr("TreeRootExpression")
        .ok_or_else(|| ImportError::null(record.id, "TreeRootExpression"))?;
    session
        .item_geometry(Some(root))
        .ok_or_else(|| ImportError::invalid(record.id, "TreeRootExpression", "unresolved expression"))
}
