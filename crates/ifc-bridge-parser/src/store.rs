// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory record store implementing [`EntityResolver`]

use crate::header::parse_header;
use crate::scanner::{build_index, EntityIndex};
use crate::tokenizer::parse_entity_at;
use ifc_bridge_model::{
    DecodedEntity, EntityId, EntityResolver, FileHeader, IfcType, ParseError, Result,
};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::path::Path;
use std::sync::Arc;

/// Owns the file text and decodes records on first access
///
/// Single-threaded: decoded records are memoized behind a `RefCell`.
pub struct StepStore {
    content: String,
    header: FileHeader,
    index: EntityIndex,
    type_index: FxHashMap<IfcType, Vec<EntityId>>,
    cache: RefCell<FxHashMap<u32, Arc<DecodedEntity>>>,
}

impl StepStore {
    /// Index an exchange file held in memory
    pub fn parse(content: impl Into<String>) -> Result<Self> {
        let content = content.into();
        if !content.trim_start().starts_with("ISO-10303-21") {
            return Err(ParseError::format("missing ISO-10303-21 signature"));
        }
        let header = parse_header(&content)?;

        let (index, types) = build_index(&content);
        let mut type_index: FxHashMap<IfcType, Vec<EntityId>> = FxHashMap::default();
        for (id, type_name) in types {
            type_index
                .entry(IfcType::parse(type_name))
                .or_default()
                .push(EntityId(id));
        }

        Ok(Self {
            content,
            header,
            index,
            type_index,
            cache: RefCell::new(FxHashMap::default()),
        })
    }

    /// Read and index a file from disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(content)
    }

    /// Header information
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Decode a record, reporting why it could not be read
    pub fn decode(&self, id: EntityId) -> Result<Arc<DecodedEntity>> {
        if let Some(cached) = self.cache.borrow().get(&id.0) {
            return Ok(Arc::clone(cached));
        }

        let (start, end) = self
            .index
            .get(&id.0)
            .copied()
            .ok_or(ParseError::EntityNotFound(id))?;
        let entity = parse_entity_at(&self.content, start, end)
            .map_err(|msg| ParseError::entity_parse(id, msg))?;
        let arc = Arc::new(entity);
        self.cache.borrow_mut().insert(id.0, Arc::clone(&arc));
        Ok(arc)
    }

    /// Number of records decoded so far
    pub fn decoded_count(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl EntityResolver for StepStore {
    fn get(&self, id: EntityId) -> Option<Arc<DecodedEntity>> {
        self.decode(id).ok()
    }

    fn ids_by_type(&self, ifc_type: &IfcType) -> Vec<EntityId> {
        self.type_index.get(ifc_type).cloned().unwrap_or_default()
    }

    fn types_present(&self) -> Vec<IfcType> {
        self.type_index.keys().cloned().collect()
    }

    fn all_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.index.keys().map(|&id| EntityId(id)).collect();
        ids.sort_unstable();
        ids
    }

    fn entity_count(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_bridge_model::EntityResolverExt;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCWALL('2O2Fr$t4X7Zf8NOew3FLOH',$,'Wall',$,$,#2,$,$);
#2=IFCLOCALPLACEMENT($,#3);
#3=IFCAXIS2PLACEMENT3D(#4,$,$);
#4=IFCCARTESIANPOINT((0.,0.,0.));
#5=IFCWALLSTANDARDCASE('1O2Fr$t4X7Zf8NOew3FLOH',$,'Wall 2',$,$,$,$,$);
#6=IFCSLAB('3O2Fr$t4X7Zf8NOew3FLOH',$,'Slab',$,$,$,$,$);
#7=IFCBROKEN(;
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_decode_is_cached() {
        let store = StepStore::parse(TEST_IFC).unwrap();
        let first = store.get(EntityId(1)).unwrap();
        let second = store.get(EntityId(1)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.decoded_count(), 1);
        assert_eq!(first.string_attr("Name"), Some("Wall"));
    }

    #[test]
    fn test_subtype_queries() {
        let store = StepStore::parse(TEST_IFC).unwrap();
        assert_eq!(store.ids_by_type(&IfcType::IfcWall), vec![EntityId(1)]);
        assert_eq!(
            store.ids_of_subtype(&IfcType::IfcWall),
            vec![EntityId(1), EntityId(5)]
        );
        assert_eq!(store.ids_of_subtype(&IfcType::IfcBuildingElement).len(), 3);
        assert!(store.is_subtype_of(EntityId(5), &IfcType::IfcElement));
        assert!(!store.is_subtype_of(EntityId(4), &IfcType::IfcElement));
    }

    #[test]
    fn test_errors() {
        let store = StepStore::parse(TEST_IFC).unwrap();
        assert!(matches!(
            store.decode(EntityId(99)),
            Err(ParseError::EntityNotFound(_))
        ));
        assert!(matches!(
            store.decode(EntityId(7)),
            Err(ParseError::EntityParse(_, _))
        ));
        assert!(store.get_or_err(EntityId(99)).is_err());

        let wall = store.get(EntityId(1)).unwrap();
        let placement = store.resolve_attr_or_err(&wall, "ObjectPlacement").unwrap();
        assert_eq!(placement.ifc_type, IfcType::IfcLocalPlacement);
        assert!(store.resolve_attr_or_err(&wall, "Representation").is_err());
    }

    #[test]
    fn test_rejects_non_step_input() {
        assert!(StepStore::parse("hello").is_err());
    }
}
