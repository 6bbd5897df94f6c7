// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Product shapes, shape representations and representation maps

use super::placement::point_3d;
use super::{BoundingBox, EntityClass, RepresentationFields, RepresentationMapFields};
use crate::cache::EntityHandle;
use crate::error::{ImportError, Result};
use crate::items::GeometrySet;
use crate::session::ImportSession;
use ifc_bridge_geometry::{csg, Matrix4, Vector3};
use ifc_bridge_model::{DecodedEntity, EntityId, IfcType};

/// Identifier of bounding box representations
pub const BOX_IDENTIFIER: &str = "Box";

pub(crate) fn build_product_shape(
    session: &mut ImportSession<'_>,
    record: &DecodedEntity,
) -> Result<Vec<EntityHandle>> {
    let handles = record
        .refs_attr("Representations")
        .into_iter()
        .filter_map(|id| session.process(Some(id), EntityClass::Representation))
        .collect();
    Ok(handles)
}

pub(crate) fn build_representation(
    session: &mut ImportSession<'_>,
    record: &DecodedEntity,
) -> Result<RepresentationFields> {
    let identifier = record.string_attr("RepresentationIdentifier").map(str::to_string);
    let representation_type = record.string_attr("RepresentationType").map(str::to_string);
    let item_ids = record.refs_attr("Items");

    let is_box = identifier.as_deref() == Some(BOX_IDENTIFIER)
        || representation_type.as_deref() == Some("BoundingBox");
    let mut bounding_box = None;
    if is_box {
        for &id in &item_ids {
            let item = session.record(id)?;
            if item.ifc_type == IfcType::IfcBoundingBox {
                bounding_box = Some(read_bounding_box(session, &item)?);
                break;
            }
        }
    }

    let mut items = Vec::with_capacity(item_ids.len());
    for &id in &item_ids {
        if let Some(handle) = session.process_item(Some(id)) {
            items.push(handle);
        }
    }

    let layer = session
        .relations()
        .layer_of(record.id)
        .or_else(|| item_ids.iter().find_map(|&id| session.relations().layer_of(id)))
        .map(str::to_string);

    Ok(RepresentationFields {
        context: record.ref_attr("ContextOfItems"),
        identifier,
        representation_type,
        items,
        bounding_box,
        layer,
    })
}

pub(crate) fn read_bounding_box(session: &ImportSession<'_>, record: &DecodedEntity) -> Result<BoundingBox> {
    let corner_id = record
        .ref_attr("Corner")
        .ok_or_else(|| ImportError::null(record.id, "Corner"))?;
    let dim = |attribute: &str| -> Result<f64> {
        record
            .float_attr(attribute)
            .map(|v| session.length(v))
            .filter(|v| *v > 0.0)
            .ok_or_else(|| ImportError::invalid(record.id, attribute, "not a positive length"))
    };
    Ok(BoundingBox {
        corner: point_3d(session, corner_id)?,
        size: Vector3::new(dim("XDim")?, dim("YDim")?, dim("ZDim")?),
    })
}

pub(crate) fn build_map(
    session: &mut ImportSession<'_>,
    record: &DecodedEntity,
) -> Result<RepresentationMapFields> {
    let origin_id = required(record, "MappingOrigin")?;
    let origin = session
        .placement(Some(origin_id))
        .ok_or_else(|| ImportError::invalid(record.id, "MappingOrigin", "unresolved placement"))?;
    let representation_id = required(record, "MappedRepresentation")?;
    let representation = session
        .process(Some(representation_id), EntityClass::Representation)
        .ok_or_else(|| {
            ImportError::invalid(record.id, "MappedRepresentation", "unresolved representation")
        })?;
    Ok(RepresentationMapFields {
        origin,
        representation,
    })
}

/// World geometry of a product, computed once and kept until cleaned
///
/// Body representations contribute their items. A product without body
/// solids falls back to its "Box" representation when it has one.
pub fn product_geometry(session: &mut ImportSession<'_>, handle: EntityHandle) -> GeometrySet {
    let entity = session.entity(handle);
    let Some(product) = &entity.product else {
        return GeometrySet::default();
    };
    if let Some(geometry) = &product.geometry {
        return geometry.clone();
    }
    let Some(shape) = product.shape else {
        return GeometrySet::default();
    };
    let placement = product.placement;
    let representations = session.entity(shape).product_shape.clone().unwrap_or_default();

    let mut set = GeometrySet::default();
    let mut bounding_box = None;
    for rep in representations {
        let Some(fields) = &session.entity(rep).representation else {
            continue;
        };
        let is_body = fields
            .identifier
            .as_deref()
            .map_or(true, |id| session.options().is_body_identifier(id));
        if is_body {
            for &item in &fields.items {
                if let Some(geometry) = session.geometry_of(item) {
                    set.extend(geometry);
                }
            }
        } else if bounding_box.is_none() {
            bounding_box = fields.bounding_box;
        }
    }
    if set.solids.is_empty() {
        if let Some(bbox) = bounding_box {
            match csg::block(bbox.size.x, bbox.size.y, bbox.size.z) {
                Ok(block) => {
                    let at = Matrix4::new_translation(&bbox.corner.coords);
                    set.solids.push(block.transformed(&at));
                }
                Err(err) => {
                    let id = session.entity(handle).id;
                    session.warn(id, format!("bounding box fallback failed: {err}"));
                }
            }
        }
    }

    let set = set.transformed(&placement);
    if let Some(product) = session.entity_mut(handle).product.as_mut() {
        product.geometry = Some(set.clone());
    }
    set
}

fn required(record: &DecodedEntity, attribute: &str) -> Result<EntityId> {
    record
        .ref_attr(attribute)
        .ok_or_else(|| ImportError::null(record.id, attribute))
}
