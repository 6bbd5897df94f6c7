// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC-Bridge Parser
//!
//! Turns ISO-10303-21 exchange files into randomly accessible attribute
//! records. The file is scanned once with memchr to index entity byte ranges;
//! records are tokenized with nom only when first requested, then cached.
//!
//! ```rust,ignore
//! use ifc_bridge_model::{EntityId, EntityResolver};
//! use ifc_bridge_parser::StepStore;
//!
//! let store = StepStore::parse(content)?;
//! println!("schema {}", store.header().schema_version);
//! let circle = store.get(EntityId(10));
//! ```

pub mod header;
pub mod scanner;
pub mod store;
pub mod tokenizer;

pub use header::parse_header;
pub use scanner::{build_index, EntityIndex, EntityScanner, ScannedEntity};
pub use store::StepStore;
pub use tokenizer::{parse_entity, parse_entity_at, parse_value, Token};
