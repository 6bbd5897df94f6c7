// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State of one file import
//!
//! [`ImportSession`] owns everything scoped to the current file: the
//! identity cache, unit table, relation index, options and diagnostics.
//! It is created for one file and dropped afterwards.

use crate::cache::{EntityCache, EntityHandle};
use crate::diagnostics::{DiagnosticLog, DiagnosticsSink};
use crate::entity::{self, Entity, EntityClass, EntityKind, ProfileArea, SlotState};
use crate::error::{ImportError, Processed, Result};
use crate::items::GeometrySet;
use crate::options::ImportOptions;
use crate::relations::RelationIndex;
use crate::units::{self, ProjectUnits, Unit, UnitType};
use ifc_bridge_geometry::{CurveGeometry, Matrix4, Tolerance};
use ifc_bridge_model::{DecodedEntity, EntityId, EntityResolver, GlobalId};
use log::debug;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use uuid::Uuid;

pub struct ImportSession<'r> {
    resolver: &'r dyn EntityResolver,
    options: ImportOptions,
    tolerance: Tolerance,
    cache: EntityCache,
    units: ProjectUnits,
    relations: RelationIndex,
    log: DiagnosticLog,
    global_ids: FxHashMap<String, EntityId>,
    /// Entities whose attributes are being read, innermost last
    stack: Vec<EntityId>,
}

impl<'r> ImportSession<'r> {
    /// Start a session; resolves the relation index and the project units
    pub fn new(resolver: &'r dyn EntityResolver, options: ImportOptions) -> Result<Self> {
        Self::with_log(resolver, options, DiagnosticLog::new())
    }

    /// Start a session that also forwards diagnostics to `sink`
    pub fn with_diagnostics_sink(
        resolver: &'r dyn EntityResolver,
        options: ImportOptions,
        sink: Box<dyn DiagnosticsSink>,
    ) -> Result<Self> {
        Self::with_log(resolver, options, DiagnosticLog::with_sink(sink))
    }

    fn with_log(
        resolver: &'r dyn EntityResolver,
        options: ImportOptions,
        log: DiagnosticLog,
    ) -> Result<Self> {
        options.validate()?;
        let mut session = Self {
            resolver,
            tolerance: options.tolerance(),
            units: ProjectUnits::new(options.internal_units_per_metre),
            relations: RelationIndex::build(resolver),
            options,
            cache: EntityCache::new(),
            log,
            global_ids: FxHashMap::default(),
            stack: Vec::new(),
        };
        session.units = units::resolve_project_units(&mut session);
        debug!(
            "import session: {} records, length scale {}",
            resolver.entity_count(),
            session.units.length_scale()
        );
        Ok(session)
    }

    pub fn resolver(&self) -> &'r dyn EntityResolver {
        self.resolver
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    pub fn units(&self) -> &ProjectUnits {
        &self.units
    }

    pub fn relations(&self) -> &RelationIndex {
        &self.relations
    }

    pub fn diagnostics(&self) -> &DiagnosticLog {
        &self.log
    }

    pub(crate) fn log(&mut self) -> &mut DiagnosticLog {
        &mut self.log
    }

    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    pub fn entity(&self, handle: EntityHandle) -> &Entity {
        self.cache.get(handle)
    }

    pub(crate) fn entity_mut(&mut self, handle: EntityHandle) -> &mut Entity {
        self.cache.get_mut(handle)
    }

    /// Innermost entity under construction
    pub(crate) fn current(&self) -> Option<EntityId> {
        self.stack.last().copied()
    }

    pub(crate) fn warn(&mut self, entity: EntityId, message: impl Into<String>) {
        self.log.warning(Some(entity), message);
    }

    /// Length in file units to host units
    pub fn length(&self, value: f64) -> f64 {
        value * self.units.length_scale()
    }

    /// Plane angle in file units to radians
    pub fn angle(&self, value: f64) -> f64 {
        value * self.units.angle_scale()
    }

    pub fn convert(&self, unit_type: &UnitType, value: f64) -> f64 {
        self.units.convert(unit_type, value)
    }

    pub(crate) fn segments(&self) -> usize {
        self.options.circle_segments
    }

    /// Raw record
    pub fn record(&self, id: EntityId) -> Result<Arc<DecodedEntity>> {
        self.resolver.get(id).ok_or(ImportError::MissingEntity(id))
    }

    /// Record referenced by a required attribute
    pub fn record_attr(&self, record: &DecodedEntity, attribute: &str) -> Result<Arc<DecodedEntity>> {
        let id = record
            .ref_attr(attribute)
            .ok_or_else(|| ImportError::null(record.id, attribute))?;
        self.record(id)
    }

    /// Resolve a reference to a cached entity of `class`
    ///
    /// Null handles, missing records, unhandled subtypes and failed
    /// construction are logged and yield `None`. A reentrant request for
    /// an entity still under construction returns its reserved slot.
    pub fn process(&mut self, id: Option<EntityId>, class: EntityClass) -> Option<EntityHandle> {
        let Some(id) = id else {
            let referrer = self.current();
            self.log
                .error(referrer, format!("null reference to a {}", class.name()));
            return None;
        };
        if let Some(handle) = self.cache.resolve(id) {
            return self.downcast(handle, class);
        }

        let Some(record) = self.resolver.get(id) else {
            let referrer = self.current();
            self.log.error(
                referrer.or(Some(id)),
                ImportError::MissingEntity(id).to_string(),
            );
            return None;
        };
        let Some(kind) = EntityKind::classify(&record.ifc_type, class) else {
            self.log.error(
                Some(id),
                ImportError::UnhandledSubtype {
                    entity: id,
                    ifc_type: record.ifc_type.class_name().to_string(),
                    expected: class.name(),
                }
                .to_string(),
            );
            return None;
        };

        let handle = self
            .cache
            .register(Entity::reserve(id, record.ifc_type.clone(), kind));
        self.stack.push(id);
        let outcome = entity::populate(self, handle, &record);
        self.stack.pop();
        self.finish(handle, outcome)
    }

    fn downcast(&mut self, handle: EntityHandle, class: EntityClass) -> Option<EntityHandle> {
        let entity = self.cache.get(handle);
        if !entity.kind.is_a(class) {
            let err = ImportError::TypeMismatch {
                entity: entity.id,
                found: entity.kind.name(),
                expected: class.name(),
            };
            let referrer = self.current();
            self.log.error(referrer, err.to_string());
            return None;
        }
        match entity.state {
            SlotState::Ready => Some(handle),
            SlotState::UnderConstruction => {
                debug!("{} requested while under construction", entity.id);
                Some(handle)
            }
            SlotState::Skipped | SlotState::Failed => None,
        }
    }

    /// Record the outcome in the slot; errors become diagnostics here
    fn finish(&mut self, handle: EntityHandle, outcome: Processed<()>) -> Option<EntityHandle> {
        let id = self.cache.get(handle).id;
        match outcome {
            Processed::Ready(()) => {
                self.cache.get_mut(handle).state = SlotState::Ready;
                Some(handle)
            }
            Processed::Skipped(reason) => {
                debug!("{id} skipped: {reason}");
                self.cache.get_mut(handle).state = SlotState::Skipped;
                None
            }
            Processed::Failed(err) => {
                self.log.fatal(id, err.to_string());
                self.cache.get_mut(handle).state = SlotState::Failed;
                None
            }
        }
    }

    /// Processing outcome of an object definition, for callers that need
    /// to tell skips from failures
    pub fn process_outcome(&mut self, id: EntityId) -> Processed<EntityHandle> {
        let handle = self.process(Some(id), EntityClass::ObjectDefinition);
        match (handle, self.cache.lookup(id)) {
            (Some(handle), _) => Processed::Ready(handle),
            (None, Some(entity)) if entity.state == SlotState::Skipped => {
                Processed::Skipped(crate::error::SkipReason::DoNotImport {
                    shape_type: entity.ifc_type.class_name().to_string(),
                })
            }
            (None, Some(entity)) if entity.state == SlotState::Failed => {
                Processed::Failed(ImportError::PreviouslyFailed(id))
            }
            (None, _) => Processed::Failed(ImportError::MissingEntity(id)),
        }
    }

    pub fn process_object(&mut self, id: EntityId) -> Option<EntityHandle> {
        self.process(Some(id), EntityClass::ObjectDefinition)
    }

    pub fn process_curve(&mut self, id: Option<EntityId>) -> Option<EntityHandle> {
        self.process(id, EntityClass::Curve)
    }

    pub fn process_unit(&mut self, id: Option<EntityId>) -> Option<EntityHandle> {
        self.process(id, EntityClass::Unit)
    }

    pub fn process_item(&mut self, id: Option<EntityId>) -> Option<EntityHandle> {
        self.process(id, EntityClass::Item)
    }

    /// Absolute matrix of a placement or transformation operator
    pub fn placement(&mut self, id: Option<EntityId>) -> Option<Matrix4<f64>> {
        let handle = self.process(id, EntityClass::Placement)?;
        self.entity(handle).placement
    }

    /// Like [`placement`](Self::placement), identity when the attribute is unset
    pub fn optional_placement(&mut self, id: Option<EntityId>) -> Matrix4<f64> {
        match id {
            Some(_) => self.placement(id).unwrap_or_else(Matrix4::identity),
            None => Matrix4::identity(),
        }
    }

    pub fn curve(&mut self, id: Option<EntityId>) -> Option<CurveGeometry> {
        let handle = self.process_curve(id)?;
        self.entity(handle).curve.clone()
    }

    pub fn profile(&mut self, id: Option<EntityId>) -> Option<ProfileArea> {
        let handle = self.process(id, EntityClass::Profile)?;
        self.entity(handle).profile.clone()
    }

    pub fn unit(&mut self, id: Option<EntityId>) -> Option<Unit> {
        let handle = self.process_unit(id)?;
        self.entity(handle).unit.clone()
    }

    /// Local geometry of a representation item
    pub fn item_geometry(&mut self, id: Option<EntityId>) -> Option<GeometrySet> {
        let handle = self.process_item(id)?;
        self.geometry_of(handle)
    }

    /// Local geometry of an already processed item
    pub fn geometry_of(&self, handle: EntityHandle) -> Option<GeometrySet> {
        let entity = self.entity(handle);
        match entity.kind {
            EntityKind::Curve => entity.curve.clone().map(GeometrySet::from_curve),
            _ => entity.item.clone(),
        }
    }

    /// Check a global id and derive the application GUID from it
    ///
    /// Unreadable ids fall back to a GUID built from the STEP id; duplicates
    /// are reported but kept.
    pub(crate) fn register_global_id(&mut self, entity: EntityId, global_id: &str) -> Uuid {
        if let Some(first) = self.global_ids.get(global_id) {
            if *first != entity {
                let message = format!("duplicate global id {global_id}, first used by {first}");
                self.warn(entity, message);
            }
        } else {
            self.global_ids.insert(global_id.to_string(), entity);
        }
        match GlobalId::parse(global_id) {
            Ok(id) => id.uuid(),
            Err(err) => {
                self.warn(entity, format!("invalid global id {global_id:?}: {err}"));
                Uuid::from_u128(u128::from(entity.0))
            }
        }
    }
}

impl std::fmt::Debug for ImportSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportSession")
            .field("entities", &self.cache.len())
            .field("diagnostics", &self.log.len())
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_bridge_parser::StepStore;

    fn store(data: &str) -> StepStore {
        StepStore::parse(format!(
            "ISO-10303-21;\nHEADER;\nFILE_SCHEMA(('IFC2X3'));\nENDSEC;\nDATA;\n{data}\nENDSEC;\nEND-ISO-10303-21;\n"
        ))
        .unwrap()
    }

    #[test]
    fn test_null_and_missing_references_are_logged() {
        let store = store("#1=IFCUNITASSIGNMENT(());");
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let before = session.diagnostics().len();
        assert!(session.process_curve(None).is_none());
        assert!(session.process_curve(Some(EntityId(99))).is_none());
        assert_eq!(session.diagnostics().len(), before + 2);
        assert!(session.diagnostics().entries().iter().all(|d| !d.fatal_for_entity));
    }

    #[test]
    fn test_unhandled_subtype_degrades() {
        let store = store(
            "#1=IFCUNITASSIGNMENT(());
#2=IFCCARTESIANPOINT((0.,0.));
#3=IFCBSPLINECURVEWITHKNOTS(2,(#2,#2,#2),.UNSPECIFIED.,.F.,.F.,(3,3),(0.,1.),.UNSPECIFIED.);
#4=IFCFANCYCURVE(#2);",
        );
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        assert!(session.process_curve(Some(EntityId(3))).is_none());
        assert!(session.process_curve(Some(EntityId(4))).is_none());
        assert!(session
            .diagnostics()
            .for_entity(EntityId(3))
            .any(|d| d.message.contains("unhandled subtype")));
        assert!(session.cache().is_empty());
    }

    #[test]
    fn test_cache_type_mismatch_yields_none() {
        let store = store(
            "#1=IFCUNITASSIGNMENT(());
#2=IFCCARTESIANPOINT((0.,0.,0.));
#3=IFCAXIS2PLACEMENT3D(#2,$,$);",
        );
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        assert!(session.placement(Some(EntityId(3))).is_some());
        assert!(session.process_curve(Some(EntityId(3))).is_none());
        assert_eq!(session.cache().len(), 1);
    }

    #[test]
    fn test_global_ids() {
        let store = store("#1=IFCUNITASSIGNMENT(());");
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let before = session.diagnostics().len();
        let a = session.register_global_id(EntityId(1), "2O2Fr$t4X7Zf8NOew3FLOH");
        let b = session.register_global_id(EntityId(2), "2O2Fr$t4X7Zf8NOew3FLOH");
        assert_eq!(a, b);
        let c = session.register_global_id(EntityId(3), "not-a-guid");
        assert_eq!(c, Uuid::from_u128(3));
        assert_eq!(session.diagnostics().len(), before + 2);
    }
}
