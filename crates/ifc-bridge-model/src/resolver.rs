// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity resolution trait for looking up attribute records

use crate::{AttributeValue, DecodedEntity, EntityId, IfcType};
use std::sync::Arc;

/// Random access to decoded attribute records keyed by STEP id
///
/// This is the only view the importer has of the input file. Implementations
/// should provide O(1) lookup by entity ID.
///
/// # Example
///
/// ```ignore
/// use ifc_bridge_model::{EntityResolver, EntityId, IfcType};
///
/// fn walls(resolver: &dyn EntityResolver) -> usize {
///     resolver.ids_of_subtype(&IfcType::IfcWall).len()
/// }
/// ```
pub trait EntityResolver {
    /// Get entity by ID
    fn get(&self, id: EntityId) -> Option<Arc<DecodedEntity>>;

    /// Resolve an entity reference from an attribute value
    fn resolve_ref(&self, attr: &AttributeValue) -> Option<Arc<DecodedEntity>> {
        match attr {
            AttributeValue::EntityRef(id) => self.get(*id),
            _ => None,
        }
    }

    /// Resolve a list of entity references, skipping anything unresolvable
    fn resolve_ref_list(&self, attr: &AttributeValue) -> Vec<Arc<DecodedEntity>> {
        match attr {
            AttributeValue::List(items) => items
                .iter()
                .filter_map(|item| self.resolve_ref(item))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// IDs of all entities with exactly this type
    fn ids_by_type(&self, ifc_type: &IfcType) -> Vec<EntityId>;

    /// Every type that occurs in the file
    fn types_present(&self) -> Vec<IfcType>;

    /// IDs of all entities whose type is `ifc_type` or one of its
    /// subtypes, in ascending id order
    fn ids_of_subtype(&self, ifc_type: &IfcType) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .types_present()
            .iter()
            .filter(|ty| ty.is_subtype_of(ifc_type))
            .flat_map(|ty| self.ids_by_type(ty))
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Whether the record `id` is an instance of `ifc_type` or a subtype
    fn is_subtype_of(&self, id: EntityId, ifc_type: &IfcType) -> bool {
        self.get(id)
            .map(|entity| entity.ifc_type.is_subtype_of(ifc_type))
            .unwrap_or(false)
    }

    /// Get all entity IDs in the model
    fn all_ids(&self) -> Vec<EntityId>;

    /// Get total entity count
    fn entity_count(&self) -> usize {
        self.all_ids().len()
    }
}

/// Extension methods for EntityResolver
pub trait EntityResolverExt: EntityResolver {
    /// Get entity or return error
    fn get_or_err(&self, id: EntityId) -> crate::Result<Arc<DecodedEntity>> {
        self.get(id).ok_or(crate::ParseError::EntityNotFound(id))
    }

    /// Follow a named reference attribute of `entity` or return error
    fn resolve_attr_or_err(
        &self,
        entity: &DecodedEntity,
        name: &str,
    ) -> crate::Result<Arc<DecodedEntity>> {
        let attr = entity.require(name)?;
        self.resolve_ref(attr)
            .ok_or_else(|| crate::ParseError::InvalidReference {
                entity: entity.id,
                attribute: name.to_string(),
            })
    }
}

// Blanket implementation for all EntityResolver types
impl<T: EntityResolver + ?Sized> EntityResolverExt for T {}
