// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inverse relationship index
//!
//! Objects do not point at the relationships that mention them, so the
//! objectified relationship records are scanned once per session and
//! indexed by the object they describe.

use ifc_bridge_model::{DecodedEntity, EntityId, EntityResolver, IfcType};
use log::debug;
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub struct RelationIndex {
    /// Whole -> parts (aggregation and nesting)
    decomposed_by: FxHashMap<EntityId, Vec<EntityId>>,
    /// Part -> whole
    decomposes: FxHashMap<EntityId, EntityId>,
    /// Spatial structure -> contained elements
    contains: FxHashMap<EntityId, Vec<EntityId>>,
    /// Element -> spatial structure
    contained_in: FxHashMap<EntityId, EntityId>,
    /// Object -> groups it is assigned to
    groups_of: FxHashMap<EntityId, Vec<EntityId>>,
    /// Group -> assigned objects
    group_members: FxHashMap<EntityId, Vec<EntityId>>,
    /// Element -> openings voiding it
    openings: FxHashMap<EntityId, Vec<EntityId>>,
    /// Opening -> voided element
    voided: FxHashMap<EntityId, EntityId>,
    /// Element -> opening it fills
    fills: FxHashMap<EntityId, EntityId>,
    /// Object -> material definitions
    materials: FxHashMap<EntityId, Vec<EntityId>>,
    /// Object -> type object
    type_of: FxHashMap<EntityId, EntityId>,
    /// Representation or item -> first presentation layer name
    layers: FxHashMap<EntityId, String>,
}

fn each_record<'a>(
    resolver: &'a dyn EntityResolver,
    ifc_type: IfcType,
) -> impl Iterator<Item = std::sync::Arc<DecodedEntity>> + 'a {
    resolver
        .ids_by_type(&ifc_type)
        .into_iter()
        .filter_map(move |id| resolver.get(id))
}

impl RelationIndex {
    pub fn build(resolver: &dyn EntityResolver) -> Self {
        let mut index = Self::default();

        for ty in [IfcType::IfcRelAggregates, IfcType::IfcRelNests] {
            for rel in each_record(resolver, ty) {
                let Some(whole) = rel.ref_attr("RelatingObject") else {
                    continue;
                };
                for part in rel.refs_attr("RelatedObjects") {
                    index.decomposed_by.entry(whole).or_default().push(part);
                    index.decomposes.insert(part, whole);
                }
            }
        }

        for rel in each_record(resolver, IfcType::IfcRelContainedInSpatialStructure) {
            let Some(structure) = rel.ref_attr("RelatingStructure") else {
                continue;
            };
            for element in rel.refs_attr("RelatedElements") {
                index.contains.entry(structure).or_default().push(element);
                // An element is contained in at most one structure
                index.contained_in.entry(element).or_insert(structure);
            }
        }

        for rel in each_record(resolver, IfcType::IfcRelAssignsToGroup) {
            let Some(group) = rel.ref_attr("RelatingGroup") else {
                continue;
            };
            for member in rel.refs_attr("RelatedObjects") {
                index.groups_of.entry(member).or_default().push(group);
                index.group_members.entry(group).or_default().push(member);
            }
        }

        for rel in each_record(resolver, IfcType::IfcRelVoidsElement) {
            if let (Some(host), Some(opening)) = (
                rel.ref_attr("RelatingBuildingElement"),
                rel.ref_attr("RelatedOpeningElement"),
            ) {
                index.openings.entry(host).or_default().push(opening);
                index.voided.insert(opening, host);
            }
        }

        for rel in each_record(resolver, IfcType::IfcRelFillsElement) {
            if let (Some(opening), Some(element)) = (
                rel.ref_attr("RelatingOpeningElement"),
                rel.ref_attr("RelatedBuildingElement"),
            ) {
                index.fills.insert(element, opening);
            }
        }

        for rel in each_record(resolver, IfcType::IfcRelAssociatesMaterial) {
            let Some(material) = rel.ref_attr("RelatingMaterial") else {
                continue;
            };
            for object in rel.refs_attr("RelatedObjects") {
                index.materials.entry(object).or_default().push(material);
            }
        }

        for rel in each_record(resolver, IfcType::IfcRelDefinesByType) {
            let Some(type_object) = rel.ref_attr("RelatingType") else {
                continue;
            };
            for object in rel.refs_attr("RelatedObjects") {
                index.type_of.insert(object, type_object);
            }
        }

        for layer in each_record(resolver, IfcType::IfcPresentationLayerAssignment) {
            let Some(name) = layer.string_attr("Name") else {
                continue;
            };
            for item in layer.refs_attr("AssignedItems") {
                index.layers.entry(item).or_insert_with(|| name.to_string());
            }
        }

        debug!(
            "relation index: {} decompositions, {} containments, {} openings",
            index.decomposed_by.len(),
            index.contains.len(),
            index.voided.len()
        );
        index
    }

    pub fn parts_of(&self, whole: EntityId) -> &[EntityId] {
        self.decomposed_by.get(&whole).map_or(&[], Vec::as_slice)
    }

    pub fn whole_of(&self, part: EntityId) -> Option<EntityId> {
        self.decomposes.get(&part).copied()
    }

    pub fn contained_elements(&self, structure: EntityId) -> &[EntityId] {
        self.contains.get(&structure).map_or(&[], Vec::as_slice)
    }

    pub fn container_of(&self, element: EntityId) -> Option<EntityId> {
        self.contained_in.get(&element).copied()
    }

    /// Parent in the decomposition or containment tree
    pub fn parent_of(&self, object: EntityId) -> Option<EntityId> {
        self.whole_of(object).or_else(|| self.container_of(object))
    }

    /// Decomposition parts followed by contained elements
    pub fn children_of(&self, object: EntityId) -> Vec<EntityId> {
        let mut children = self.parts_of(object).to_vec();
        for &element in self.contained_elements(object) {
            if !children.contains(&element) {
                children.push(element);
            }
        }
        children
    }

    pub fn groups_of(&self, object: EntityId) -> &[EntityId] {
        self.groups_of.get(&object).map_or(&[], Vec::as_slice)
    }

    pub fn group_members(&self, group: EntityId) -> &[EntityId] {
        self.group_members.get(&group).map_or(&[], Vec::as_slice)
    }

    pub fn openings_of(&self, element: EntityId) -> &[EntityId] {
        self.openings.get(&element).map_or(&[], Vec::as_slice)
    }

    pub fn host_of(&self, opening: EntityId) -> Option<EntityId> {
        self.voided.get(&opening).copied()
    }

    pub fn filled_opening(&self, element: EntityId) -> Option<EntityId> {
        self.fills.get(&element).copied()
    }

    pub fn materials_of(&self, object: EntityId) -> &[EntityId] {
        self.materials.get(&object).map_or(&[], Vec::as_slice)
    }

    pub fn type_of(&self, object: EntityId) -> Option<EntityId> {
        self.type_of.get(&object).copied()
    }

    pub fn layer_of(&self, item: EntityId) -> Option<&str> {
        self.layers.get(&item).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_bridge_parser::StepStore;

    #[test]
    fn test_inverse_relations() {
        let store = StepStore::parse(
            "ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCBUILDINGSTOREY('0a',$,'L1',$,$,$,$,$,.ELEMENT.,0.);
#2=IFCWALL('0b',$,'W',$,$,$,$,$);
#3=IFCOPENINGELEMENT('0c',$,$,$,$,$,$,$);
#4=IFCDOOR('0d',$,$,$,$,$,$,$,$,$);
#5=IFCRELCONTAINEDINSPATIALSTRUCTURE('0e',$,$,$,(#2,#4),#1);
#6=IFCRELVOIDSELEMENT('0f',$,$,$,#2,#3);
#7=IFCRELFILLSELEMENT('0g',$,$,$,#3,#4);
#8=IFCPRESENTATIONLAYERASSIGNMENT('A-WALL',$,(#9),$);
#9=IFCSHAPEREPRESENTATION($,'Body','SweptSolid',());
ENDSEC;
END-ISO-10303-21;
",
        )
        .unwrap();
        let index = RelationIndex::build(&store);

        assert_eq!(index.contained_elements(EntityId(1)), &[EntityId(2), EntityId(4)]);
        assert_eq!(index.parent_of(EntityId(4)), Some(EntityId(1)));
        assert_eq!(index.openings_of(EntityId(2)), &[EntityId(3)]);
        assert_eq!(index.host_of(EntityId(3)), Some(EntityId(2)));
        assert_eq!(index.filled_opening(EntityId(4)), Some(EntityId(3)));
        assert_eq!(index.layer_of(EntityId(9)), Some("A-WALL"));
        assert!(index.children_of(EntityId(2)).is_empty());
    }
}
