// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-Bridge Model - shared types for reading IFC attribute records
//!
//! This crate defines the vocabulary every other ifc-bridge crate speaks:
//!
//! - [`EntityId`] - the stable STEP id used as identity key
//! - [`IfcType`] - the closed set of entity types the importer understands
//! - [`AttributeValue`] / [`DecodedEntity`] - typed attribute records
//! - [`EntityResolver`] - random access to records, implemented by a parser backend
//!
//! The schema module carries the supertype tree and the attribute names declared
//! at each level, so records can be read by name instead of by position.
//!
//! # Example
//!
//! ```ignore
//! use ifc_bridge_model::{EntityResolver, EntityId, IfcType};
//!
//! fn radius(resolver: &dyn EntityResolver, id: EntityId) -> Option<f64> {
//!     let circle = resolver.get(id)?;
//!     if !circle.ifc_type.is_subtype_of(&IfcType::IfcCircle) {
//!         return None;
//!     }
//!     circle.float_attr("Radius")
//! }
//! ```

pub mod error;
pub mod guid;
pub mod resolver;
pub mod schema;
pub mod types;

pub use error::*;
pub use guid::{GlobalId, GuidError};
pub use resolver::*;
pub use types::*;
