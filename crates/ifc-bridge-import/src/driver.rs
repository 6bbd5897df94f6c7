// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Materialization driver
//!
//! Turns processed object definitions into host elements. Every object
//! definition moves from not created to created, or to permanently
//! invalid when creation fails; it is never created twice. Children are
//! created before their parent so containers can reference them.

use crate::cache::EntityHandle;
use crate::category::category_for;
use crate::entity::representation::product_geometry;
use crate::entity::EntityKind;
use crate::error::{ImportError, Processed, Result};
use crate::session::ImportSession;
use crate::sink::{
    ElementHandle, ElementSink, SinkError, IFC_DESCRIPTION, IFC_EXPORT_AS, IFC_GUID, IFC_MATERIAL,
    IFC_NAME, IFC_TAG,
};
use ifc_bridge_model::{EntityId, IfcType};
use log::{debug, info};
use rustc_hash::FxHashSet;
use serde::Serialize;

/// Elevation of storeys and other spatial elements, in host units
pub const IFC_ELEVATION: &str = "IfcElevation";

/// Counts of one driver run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub failed: usize,
    /// Intentionally excluded object definitions
    pub skipped: usize,
}

pub struct MaterializationDriver<'a, 'r> {
    session: &'a mut ImportSession<'r>,
    sink: &'a mut dyn ElementSink,
    summary: ImportSummary,
    skipped: FxHashSet<EntityId>,
    failed: FxHashSet<EntityId>,
    /// Entities whose creation is on the call stack
    in_progress: FxHashSet<EntityId>,
}

impl<'a, 'r> MaterializationDriver<'a, 'r> {
    pub fn new(session: &'a mut ImportSession<'r>, sink: &'a mut dyn ElementSink) -> Self {
        Self {
            session,
            sink,
            summary: ImportSummary::default(),
            skipped: FxHashSet::default(),
            failed: FxHashSet::default(),
            in_progress: FxHashSet::default(),
        }
    }

    pub fn session(&self) -> &ImportSession<'r> {
        self.session
    }

    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            skipped: self.skipped.len(),
            failed: self.failed.len(),
            ..self.summary
        }
    }

    /// Create everything reachable in the file
    ///
    /// Projects come first with their whole decomposition, then products
    /// that hang off no spatial structure, then groups.
    pub fn run(&mut self) -> ImportSummary {
        let resolver = self.session.resolver();
        for project in resolver.ids_by_type(&IfcType::IfcProject) {
            self.create(project);
        }

        let relations = self.session.relations();
        let orphans: Vec<EntityId> = resolver
            .ids_of_subtype(&IfcType::IfcProduct)
            .into_iter()
            .filter(|&id| relations.parent_of(id).is_none() && relations.host_of(id).is_none())
            .collect();
        debug!("{} products outside the spatial structure", orphans.len());
        for id in orphans {
            self.create(id);
        }

        for group in resolver.ids_of_subtype(&IfcType::IfcGroup) {
            self.create(group);
        }

        let summary = self.summary();
        info!(
            "import finished: {} created, {} failed, {} skipped",
            summary.created, summary.failed, summary.skipped
        );
        summary
    }

    /// Create the element for an object definition, at most once
    ///
    /// Returns the existing element when it was created before, `None`
    /// when the entity is skipped, failed earlier or fails now.
    pub fn create(&mut self, id: EntityId) -> Option<ElementHandle> {
        let defer_clean = self.session.relations().host_of(id).is_some();
        self.create_with(id, defer_clean)
    }

    fn create_with(&mut self, id: EntityId, defer_clean: bool) -> Option<ElementHandle> {
        let handle = match self.session.process_outcome(id) {
            Processed::Ready(handle) => handle,
            Processed::Skipped(reason) => {
                if self.skipped.insert(id) {
                    debug!("{id} not created: {reason}");
                }
                return None;
            }
            Processed::Failed(_) => return None,
        };
        let entity = self.session.entity(handle);
        if let Some(element) = entity.created() {
            return Some(element);
        }
        if !entity.definition.as_ref().is_some_and(|d| d.valid_for_creation) {
            return None;
        }
        if !self.in_progress.insert(id) {
            let message = format!("{id} is its own ancestor, creation cut short");
            self.session.warn(id, message);
            return None;
        }

        let result = self.create_new(handle, id, defer_clean);
        self.in_progress.remove(&id);
        match result {
            Ok(element) => Some(element),
            Err(err) => {
                if let Some(definition) = self.session.entity_mut(handle).definition.as_mut() {
                    definition.valid_for_creation = false;
                }
                self.session.log().fatal(id, err.to_string());
                self.failed.insert(id);
                None
            }
        }
    }

    fn create_new(&mut self, handle: EntityHandle, id: EntityId, defer_clean: bool) -> Result<ElementHandle> {
        let entity = self.session.entity(handle);
        let kind = entity.kind;
        let child_ids = entity
            .definition
            .as_ref()
            .map(|d| d.children.clone())
            .unwrap_or_default();
        let opening_ids = entity
            .product
            .as_ref()
            .map(|p| p.openings.clone())
            .unwrap_or_default();

        let mut children: Vec<ElementHandle> = child_ids
            .into_iter()
            .filter_map(|child| self.create(child))
            .collect();
        if kind == EntityKind::Group {
            let members: Vec<EntityId> = self.session.relations().group_members(id).to_vec();
            for member in members {
                if let Some(element) = self.create(member) {
                    if !children.contains(&element) {
                        children.push(element);
                    }
                }
            }
        }

        let mut shape = product_geometry(self.session, handle);
        for opening in opening_ids {
            let Some(element) = self.create_with(opening, true) else {
                continue;
            };
            children.push(element);
            if let Some(opening_handle) = self.session.cache().resolve(opening) {
                shape.voids.extend(product_geometry(self.session, opening_handle).solids);
                self.finish_clean(opening_handle);
            }
        }

        let element = self.instantiate(handle, id)?;
        if !shape.is_empty() {
            if let Err(err) = self.sink.set_shape(element, &shape) {
                self.session.warn(id, format!("shape not attached: {err}"));
            }
        }
        if !children.is_empty() {
            if let Err(err) = self.sink.set_sub_elements(element, &children) {
                self.session.warn(id, format!("sub-elements not attached: {err}"));
            }
        }
        if !defer_clean {
            self.finish_clean(handle);
        }
        Ok(element)
    }

    /// Create the host element and write its parameters
    fn instantiate(&mut self, handle: EntityHandle, id: EntityId) -> Result<ElementHandle> {
        let entity = self.session.entity(handle);
        let category = category_for(&entity.ifc_type, self.session.options());
        let root = entity
            .root
            .clone()
            .ok_or_else(|| ImportError::invalid(id, "GlobalId", "object definition without root attributes"))?;
        let element = self
            .sink
            .create_element(&category, root.app_guid, &root.global_id)
            .map_err(|err| ImportError::CreationFailure {
                entity: id,
                message: err.to_string(),
            })?;

        let entity = self.session.entity_mut(handle);
        if let Some(definition) = entity.definition.as_mut() {
            definition.created = Some(element);
        }
        self.summary.created += 1;
        debug!("{id} created as {category} element {}", element.0);

        let entity = self.session.entity(handle);
        let definition = entity.definition.as_ref();
        let mut strings: Vec<(&str, String)> = Vec::new();
        if let Some(name) = &root.name {
            strings.push((IFC_NAME, name.clone()));
        }
        if let Some(description) = &root.description {
            strings.push((IFC_DESCRIPTION, description.clone()));
        }
        if let Some(tag) = entity.product.as_ref().and_then(|p| p.tag.clone()) {
            strings.push((IFC_TAG, tag));
        }
        if let Some(materials) = definition.filter(|d| !d.materials.is_empty()) {
            strings.push((IFC_MATERIAL, materials.materials.join("; ")));
        }
        if let Some(definition) = definition {
            strings.push((IFC_EXPORT_AS, definition.shape_type.clone()));
        }
        let elevation = entity.spatial.as_ref().and_then(|s| s.elevation);

        let mut errors: Vec<SinkError> = Vec::new();
        for (name, value) in &strings {
            if let Err(err) = self.sink.set_string_parameter(element, name, value) {
                errors.push(err);
            }
        }
        if let Err(err) = self.sink.set_guid_parameter(element, IFC_GUID, root.app_guid) {
            errors.push(err);
        }
        if let Some(elevation) = elevation {
            if let Err(err) = self.sink.set_double_parameter(element, IFC_ELEVATION, elevation) {
                errors.push(err);
            }
        }
        for err in errors {
            self.session.warn(id, format!("parameter not set: {err}"));
        }
        Ok(element)
    }

    fn finish_clean(&mut self, handle: EntityHandle) {
        if self.session.options().clean_after_creation {
            self.session.entity_mut(handle).clean();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ImportOptions;
    use crate::sink::{MemorySink, ParameterValue};
    use ifc_bridge_parser::StepStore;

    const HOUSE: &str = "ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCPROJECT('3vB2YO$MX4xv5uCqZZG05x',$,'House',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT(());
#3=IFCBUILDING('1vB2YO$MX4xv5uCqZZG05x',$,'B1',$,$,$,$,$,.ELEMENT.,$,$,$);
#4=IFCBUILDINGSTOREY('2vB2YO$MX4xv5uCqZZG05x',$,'Level 1',$,$,$,$,$,.ELEMENT.,3.);
#5=IFCRELAGGREGATES('0vB2YO$MX4xv5uCqZZG05a',$,$,$,#1,(#3));
#6=IFCRELAGGREGATES('0vB2YO$MX4xv5uCqZZG05b',$,$,$,#3,(#4));
#7=IFCWALL('0vB2YO$MX4xv5uCqZZG05c',$,'W1','Outer wall',$,$,$,'T-7');
#8=IFCRELCONTAINEDINSPATIALSTRUCTURE('0vB2YO$MX4xv5uCqZZG05d',$,$,$,(#7),#4);
#9=IFCMATERIAL('Brick');
#10=IFCRELASSOCIATESMATERIAL('0vB2YO$MX4xv5uCqZZG05e',$,$,$,(#7),#9);
ENDSEC;
END-ISO-10303-21;
";

    #[test]
    fn test_children_are_created_before_parents() {
        let store = StepStore::parse(HOUSE).unwrap();
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let mut sink = MemorySink::new();
        let summary = MaterializationDriver::new(&mut session, &mut sink).run();
        assert_eq!(summary.created, 4);
        assert_eq!(summary.failed, 0);

        let order: Vec<&str> = sink.elements().iter().map(|e| e.category.as_str()).collect();
        assert_eq!(order, ["Walls", "Levels", "Generic Models", "Generic Models"]);
        let project = sink.by_global_id("3vB2YO$MX4xv5uCqZZG05x").unwrap();
        assert_eq!(project.children.len(), 1);
    }

    #[test]
    fn test_parameters_use_the_fixed_names() {
        let store = StepStore::parse(HOUSE).unwrap();
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let mut sink = MemorySink::new();
        MaterializationDriver::new(&mut session, &mut sink).run();

        let wall = sink.by_global_id("0vB2YO$MX4xv5uCqZZG05c").unwrap();
        let text = |name: &str| wall.parameter(name).and_then(ParameterValue::as_str);
        assert_eq!(text("IfcName"), Some("W1"));
        assert_eq!(text("IfcDescription"), Some("Outer wall"));
        assert_eq!(text("IfcTag"), Some("T-7"));
        assert_eq!(text("IfcMaterial"), Some("Brick"));
        assert_eq!(text("IfcExportAs"), Some("IfcWall"));
        assert!(matches!(wall.parameter("IfcGUID"), Some(ParameterValue::Guid(_))));

        let storey = sink.by_global_id("2vB2YO$MX4xv5uCqZZG05x").unwrap();
        assert_eq!(storey.parameter(IFC_ELEVATION), Some(&ParameterValue::Double(3.0)));
    }

    #[test]
    fn test_failed_creation_is_permanent() {
        let store = StepStore::parse(HOUSE).unwrap();
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let mut sink = MemorySink::new().refuse("0vB2YO$MX4xv5uCqZZG05c");
        let mut driver = MaterializationDriver::new(&mut session, &mut sink);
        assert!(driver.create(EntityId(7)).is_none());
        assert!(driver.create(EntityId(7)).is_none());
        let summary = driver.run();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.created, 3);
        assert!(session
            .diagnostics()
            .for_entity(EntityId(7))
            .any(|d| d.fatal_for_entity && d.message.contains("Creation of #7 failed")));
        assert_eq!(sink.attempts(), 4);
    }

    #[test]
    fn test_excluded_types_are_skipped_silently() {
        let store = StepStore::parse(HOUSE).unwrap();
        let options = ImportOptions::default().excluding("IfcWall");
        let mut session = ImportSession::new(&store, options).unwrap();
        let before = session.diagnostics().len();
        let mut sink = MemorySink::new();
        let summary = MaterializationDriver::new(&mut session, &mut sink).run();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.created, 3);
        assert_eq!(session.diagnostics().len(), before);
    }
}
