// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for reading attribute records

use crate::EntityId;
use thiserror::Error;

/// Result type alias for record access
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors raised while reading or decoding STEP records
#[derive(Error, Debug)]
pub enum ParseError {
    /// The file is not an ISO-10303-21 exchange structure
    #[error("Invalid STEP format: {0}")]
    InvalidFormat(String),

    /// The HEADER section could not be read
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// A DATA record could not be decoded
    #[error("Failed to parse entity {0}: {1}")]
    EntityParse(EntityId, String),

    /// Entity not present in the file
    #[error("Entity {0} not found")]
    EntityNotFound(EntityId),

    /// Attribute does not hold a reference
    #[error("Invalid entity reference at {entity}: attribute {attribute}")]
    InvalidReference { entity: EntityId, attribute: String },

    /// Attribute not declared for the entity type
    #[error("Entity {entity} of type {ifc_type} has no attribute {attribute}")]
    UnknownAttribute {
        entity: EntityId,
        ifc_type: String,
        attribute: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// Create a new format error
    pub fn format(msg: impl Into<String>) -> Self {
        ParseError::InvalidFormat(msg.into())
    }

    /// Create a new entity parse error
    pub fn entity_parse(id: EntityId, msg: impl Into<String>) -> Self {
        ParseError::EntityParse(id, msg.into())
    }
}
