// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Object definitions: projects, spatial structure, elements, groups, types

use super::{
    DefinitionFields, EntityKind, GroupFields, MaterialFields, ProductFields, RootFields,
    SpatialFields,
};
use crate::cache::EntityHandle;
use crate::entity::EntityClass;
use crate::error::{ImportError, Processed, Result, SkipReason};
use crate::session::ImportSession;
use ifc_bridge_geometry::Matrix4;
use ifc_bridge_model::{DecodedEntity, IfcType};
use log::trace;

/// Fill an object definition level by level, supertype attributes first
pub(crate) fn populate(
    session: &mut ImportSession<'_>,
    handle: EntityHandle,
    record: &DecodedEntity,
) -> Processed<()> {
    let kind = session.entity(handle).kind;
    let shape_type = record.ifc_type.class_name().to_string();
    if session.options().is_excluded(&shape_type)
        || (kind == EntityKind::Opening && !session.options().import_openings)
    {
        return Processed::Skipped(SkipReason::DoNotImport { shape_type });
    }

    let root = read_root(session, record);
    session.entity_mut(handle).root = Some(root);

    let definition = read_definition(session, handle, record, shape_type);
    session.entity_mut(handle).definition = Some(definition);

    if kind.is_product() {
        let product = read_product(session, record);
        session.entity_mut(handle).product = Some(product);
    }
    if kind.is_spatial() || kind == EntityKind::Project {
        let spatial = SpatialFields {
            long_name: record.string_attr("LongName").map(str::to_string),
            elevation: record.float_attr("Elevation").map(|e| session.length(e)),
        };
        session.entity_mut(handle).spatial = Some(spatial);
    }
    if kind == EntityKind::Group {
        session.entity_mut(handle).group = Some(GroupFields::default());
    }
    trace!("{}: {} ready", record.id, kind.name());
    Processed::Ready(())
}

fn read_root(session: &mut ImportSession<'_>, record: &DecodedEntity) -> RootFields {
    let global_id = record.string_attr("GlobalId").unwrap_or_default().to_string();
    let app_guid = session.register_global_id(record.id, &global_id);
    RootFields {
        global_id,
        app_guid,
        name: record.string_attr("Name").map(str::to_string),
        description: record.string_attr("Description").map(str::to_string),
        owner_history: record.ref_attr("OwnerHistory"),
    }
}

fn read_definition(
    session: &mut ImportSession<'_>,
    handle: EntityHandle,
    record: &DecodedEntity,
    shape_type: String,
) -> DefinitionFields {
    let id = record.id;
    let children = session.relations().children_of(id);

    let mut groups = Vec::new();
    for group_id in session.relations().groups_of(id).to_vec() {
        let Some(group) = session.process_object(group_id) else {
            continue;
        };
        let entity = session.entity_mut(group);
        if entity.kind != EntityKind::Group {
            continue;
        }
        let fields = entity.group.get_or_insert_with(GroupFields::default);
        if !fields.members.contains(&handle) {
            fields.members.push(handle);
        }
        groups.push(group);
    }

    let mut materials = Vec::new();
    for material_id in session.relations().materials_of(id).to_vec() {
        let Some(material) = session.process(Some(material_id), EntityClass::Material) else {
            continue;
        };
        if let Some(fields) = &session.entity(material).material {
            materials.extend(fields.names.iter().cloned());
        }
    }

    DefinitionFields {
        children,
        groups,
        materials,
        shape_type,
        created: None,
        valid_for_creation: true,
    }
}

fn read_product(session: &mut ImportSession<'_>, record: &DecodedEntity) -> ProductFields {
    let placement = match record.ref_attr("ObjectPlacement") {
        Some(placement_id) => session.placement(Some(placement_id)).unwrap_or_else(|| {
            session.warn(
                record.id,
                format!("placement {placement_id} unavailable, using identity"),
            );
            Matrix4::identity()
        }),
        None => Matrix4::identity(),
    };
    let shape = match record.ref_attr("Representation") {
        Some(shape_id) => session.process(Some(shape_id), EntityClass::ProductShape),
        None => None,
    };
    ProductFields {
        object_type: record.string_attr("ObjectType").map(str::to_string),
        placement,
        shape,
        tag: record.string_attr("Tag").map(str::to_string),
        openings: session.relations().openings_of(record.id).to_vec(),
        type_object: session.relations().type_of(record.id),
        geometry: None,
    }
}

fn merge(into: &mut MaterialFields, session: &mut ImportSession<'_>, id: Option<ifc_bridge_model::EntityId>) {
    if let Some(handle) = session.process(id, EntityClass::Material) {
        if let Some(fields) = &session.entity(handle).material {
            into.names.extend(fields.names.iter().cloned());
            into.layer_thicknesses.extend(fields.layer_thicknesses.iter().copied());
        }
    }
}

/// Material names (and layer thicknesses) of a material definition
pub(crate) fn build_material(
    session: &mut ImportSession<'_>,
    record: &DecodedEntity,
) -> Result<MaterialFields> {
    let mut fields = MaterialFields::default();
    match record.ifc_type {
        IfcType::IfcMaterial => {
            let name = record
                .string_attr("Name")
                .ok_or_else(|| ImportError::null(record.id, "Name"))?;
            fields.names.push(name.to_string());
        }
        IfcType::IfcMaterialList => {
            for material in record.refs_attr("Materials") {
                merge(&mut fields, session, Some(material));
            }
        }
        IfcType::IfcMaterialLayer => {
            merge(&mut fields, session, record.ref_attr("Material"));
            fields.layer_thicknesses.clear();
            let thickness = record
                .float_attr("LayerThickness")
                .ok_or_else(|| ImportError::invalid(record.id, "LayerThickness", "not a number"))?;
            fields.layer_thicknesses.push(session.length(thickness));
        }
        IfcType::IfcMaterialLayerSet => {
            for layer in record.refs_attr("MaterialLayers") {
                merge(&mut fields, session, Some(layer));
            }
        }
        IfcType::IfcMaterialLayerSetUsage => {
            merge(&mut fields, session, record.ref_attr("ForLayerSet"));
        }
        _ => {
            return Err(ImportError::UnhandledSubtype {
                entity: record.id,
                ifc_type: record.ifc_type.class_name().to_string(),
                expected: "material",
            })
        }
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use crate::options::ImportOptions;
    use crate::session::ImportSession;
    use approx::assert_relative_eq;
    use ifc_bridge_model::EntityId;
    use ifc_bridge_parser::StepStore;

    fn store(data: &str) -> StepStore {
        StepStore::parse(format!(
            "ISO-10303-21;\nHEADER;\nFILE_SCHEMA(('IFC2X3'));\nENDSEC;\nDATA;\n{data}\nENDSEC;\nEND-ISO-10303-21;\n"
        ))
        .unwrap()
    }

    const BUILDING: &str = "#1=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#2=IFCUNITASSIGNMENT((#1));
#3=IFCPROJECT('2O2Fr$t4X7Zf8NOew3FLOH',$,'P',$,$,$,$,$,#2);
#10=IFCCARTESIANPOINT((0.,0.,0.));
#11=IFCCARTESIANPOINT((1000.,2000.,0.));
#12=IFCAXIS2PLACEMENT3D(#10,$,$);
#13=IFCAXIS2PLACEMENT3D(#11,$,$);
#14=IFCLOCALPLACEMENT($,#12);
#15=IFCLOCALPLACEMENT(#14,#13);
#20=IFCBUILDINGSTOREY('1O2Fr$t4X7Zf8NOew3FLOH',$,'Level 1',$,$,#14,$,'Ground',.ELEMENT.,3000.);
#21=IFCWALL('3O2Fr$t4X7Zf8NOew3FLOH',$,'Wall',$,$,#15,$,'W-1');
#22=IFCRELCONTAINEDINSPATIALSTRUCTURE('0e',$,$,$,(#21),#20);
#23=IFCRELAGGREGATES('0f',$,$,$,#3,(#20));
#30=IFCMATERIAL('Concrete');
#31=IFCMATERIALLAYER(#30,200.,$);
#32=IFCMATERIALLAYERSET((#31),'Wall 200');
#33=IFCMATERIALLAYERSETUSAGE(#32,.AXIS2.,.POSITIVE.,0.);
#34=IFCRELASSOCIATESMATERIAL('0g',$,$,$,(#21),#33);
#40=IFCZONE('0h',$,'Zone A',$,$);
#41=IFCRELASSIGNSTOGROUP('0i',$,$,$,(#21),$,#40);";

    #[test]
    fn test_object_levels() {
        let store = store(BUILDING);
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let wall = session.process_object(EntityId(21)).unwrap();
        let entity = session.entity(wall).clone();

        assert_eq!(entity.name(), Some("Wall"));
        let definition = entity.definition.as_ref().unwrap();
        assert_eq!(definition.shape_type, "IfcWall");
        assert_eq!(definition.materials, vec!["Concrete".to_string()]);
        assert!(definition.valid_for_creation);

        let product = entity.product.as_ref().unwrap();
        assert_eq!(product.tag.as_deref(), Some("W-1"));
        // 1000 mm, 2000 mm in metres
        assert_relative_eq!(product.placement[(0, 3)], 1.0);
        assert_relative_eq!(product.placement[(1, 3)], 2.0);

        let zone = definition.groups[0];
        assert_eq!(session.entity(zone).group.as_ref().unwrap().members, vec![wall]);
    }

    #[test]
    fn test_spatial_children_and_elevation() {
        let store = store(BUILDING);
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let storey = session.process_object(EntityId(20)).unwrap();
        let entity = session.entity(storey);
        assert_eq!(entity.definition.as_ref().unwrap().children, vec![EntityId(21)]);
        let spatial = entity.spatial.as_ref().unwrap();
        assert_relative_eq!(spatial.elevation.unwrap(), 3.0);
        assert_eq!(spatial.long_name.as_deref(), Some("Ground"));
        // Children are only referenced by id, not processed
        assert!(session.cache().lookup(EntityId(21)).is_none());
    }

    #[test]
    fn test_layer_thickness_in_host_units() {
        let store = store(BUILDING);
        let options = ImportOptions::default().with_internal_units_per_metre(1000.0);
        let mut session = ImportSession::new(&store, options).unwrap();
        let usage = session
            .process(Some(EntityId(33)), crate::entity::EntityClass::Material)
            .unwrap();
        let material = session.entity(usage).material.clone().unwrap();
        assert_eq!(material.names, vec!["Concrete".to_string()]);
        assert_relative_eq!(material.layer_thicknesses[0], 200.0);
    }

    #[test]
    fn test_excluded_type_is_skipped_silently() {
        let store = store(BUILDING);
        let options = ImportOptions::default().excluding("IfcWall");
        let mut session = ImportSession::new(&store, options).unwrap();
        let before = session.diagnostics().len();
        assert!(session.process_object(EntityId(21)).is_none());
        assert!(session.process_outcome(EntityId(21)).is_skipped());
        assert_eq!(session.diagnostics().len(), before);
    }
}
