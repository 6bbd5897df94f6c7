// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC-Bridge Import
//!
//! Materializes a graph of IFC records into host elements.
//!
//! ## Overview
//!
//! - **Session**: [`ImportSession`] scopes the identity cache, units,
//!   relation index and diagnostics to one file
//! - **Entity graph**: every referenced record becomes one cached
//!   [`Entity`], reserved before its attributes are read so reference
//!   cycles resolve to the same slot
//! - **Geometry**: placements, curves, profiles and representation items
//!   are rebuilt with `ifc-bridge-geometry`
//! - **Materialization**: [`MaterializationDriver`] creates elements
//!   through an [`ElementSink`], children first, each at most once
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ifc_bridge_import::{ImportOptions, ImportSession, MaterializationDriver, MemorySink};
//! use ifc_bridge_parser::StepStore;
//!
//! let store = StepStore::parse(content)?;
//! let mut session = ImportSession::new(&store, ImportOptions::default())?;
//! let mut sink = MemorySink::new();
//! let summary = MaterializationDriver::new(&mut session, &mut sink).run();
//!
//! println!("{} elements, {} diagnostics", summary.created, session.diagnostics().len());
//! ```

pub mod cache;
pub mod category;
pub mod diagnostics;
pub mod driver;
pub mod entity;
pub mod error;
pub mod items;
pub mod options;
pub mod relations;
pub mod session;
pub mod sink;
pub mod units;

pub use cache::{EntityCache, EntityHandle};
pub use category::{category_for, GENERIC_MODELS};
pub use diagnostics::{Diagnostic, DiagnosticLog, DiagnosticsSink, Severity};
pub use driver::{ImportSummary, MaterializationDriver};
pub use entity::representation::product_geometry;
pub use entity::{Entity, EntityClass, EntityKind, ProfileArea, SlotState};
pub use error::{ImportError, Processed, Result, SkipReason};
pub use items::GeometrySet;
pub use options::ImportOptions;
pub use relations::RelationIndex;
pub use session::ImportSession;
pub use sink::{CreatedElement, ElementHandle, ElementSink, MemorySink, ParameterValue, SinkError};
pub use units::{ProjectUnits, Unit, UnitType};
