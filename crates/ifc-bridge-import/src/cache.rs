// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identity cache: one arena slot per STEP id
//!
//! A slot is registered before the entity's attributes are read, so a
//! reentrant lookup of the same id during construction finds the reserved
//! slot instead of recursing.

use crate::entity::Entity;
use ifc_bridge_model::EntityId;
use rustc_hash::FxHashMap;

/// Index of an entity slot; equal handles denote the same entity
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct EntityHandle(usize);

impl EntityHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct EntityCache {
    slots: Vec<Entity>,
    index: FxHashMap<EntityId, EntityHandle>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lookup only
    #[inline]
    pub fn resolve(&self, id: EntityId) -> Option<EntityHandle> {
        self.index.get(&id).copied()
    }

    /// Insert if absent
    ///
    /// A second registration of the same id keeps the first slot and
    /// returns its handle.
    pub fn register(&mut self, entity: Entity) -> EntityHandle {
        if let Some(existing) = self.index.get(&entity.id) {
            log::debug!("{} registered twice, keeping the first slot", entity.id);
            return *existing;
        }
        let handle = EntityHandle(self.slots.len());
        self.index.insert(entity.id, handle);
        self.slots.push(entity);
        handle
    }

    #[inline]
    pub fn get(&self, handle: EntityHandle) -> &Entity {
        &self.slots[handle.0]
    }

    #[inline]
    pub fn get_mut(&mut self, handle: EntityHandle) -> &mut Entity {
        &mut self.slots[handle.0]
    }

    pub fn lookup(&self, id: EntityId) -> Option<&Entity> {
        self.resolve(id).map(|h| self.get(h))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityHandle, &Entity)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, entity)| (EntityHandle(i), entity))
    }

    /// Forget every entity, e.g. before the next file
    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityKind, SlotState};
    use ifc_bridge_model::IfcType;

    #[test]
    fn test_register_is_insert_if_absent() {
        let mut cache = EntityCache::new();
        let a = cache.register(Entity::reserve(EntityId(5), IfcType::IfcCircle, EntityKind::Curve));
        let b = cache.register(Entity::reserve(EntityId(5), IfcType::IfcLine, EntityKind::Curve));
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(a).ifc_type, IfcType::IfcCircle);
        assert_eq!(cache.get(a).state, SlotState::UnderConstruction);
        assert_eq!(cache.resolve(EntityId(5)), Some(a));
        assert_eq!(cache.resolve(EntityId(6)), None);
    }

    #[test]
    fn test_clear_resets_session_state() {
        let mut cache = EntityCache::new();
        cache.register(Entity::reserve(EntityId(1), IfcType::IfcWall, EntityKind::Element));
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.lookup(EntityId(1)).is_none());
    }
}
