// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types and the processing outcome of one entity

use ifc_bridge_model::{EntityId, ParseError};
use thiserror::Error;

/// Result type alias for import operations
pub type Result<T> = std::result::Result<T, ImportError>;

/// Everything that can stop one entity or geometry item from being imported
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImportError {
    /// A required reference is null or unset
    #[error("{entity}: required attribute {attribute} is null")]
    NullReference { entity: EntityId, attribute: String },

    /// A reference points at a record that does not exist
    #[error("Entity {0} not found")]
    MissingEntity(EntityId),

    /// The record is of a type this importer does not handle here
    #[error("{entity}: unhandled subtype {ifc_type} for {expected}")]
    UnhandledSubtype {
        entity: EntityId,
        ifc_type: String,
        expected: &'static str,
    },

    /// Geometry could not be built
    #[error(transparent)]
    Degenerate(#[from] ifc_bridge_geometry::Error),

    /// The element sink refused to create an element
    #[error("Creation of {entity} failed: {message}")]
    CreationFailure { entity: EntityId, message: String },

    /// A cached entity is not of the requested kind
    #[error("{entity} is a {found}, not a {expected}")]
    TypeMismatch {
        entity: EntityId,
        found: &'static str,
        expected: &'static str,
    },

    /// An attribute holds a value of the wrong shape
    #[error("{entity}: invalid attribute {attribute}: {message}")]
    InvalidAttribute {
        entity: EntityId,
        attribute: String,
        message: String,
    },

    /// Creation already failed earlier in this session
    #[error("{0} was marked invalid by an earlier failure")]
    PreviouslyFailed(EntityId),

    /// Options could not be read
    #[error("Invalid import options: {0}")]
    Config(String),
}

impl ImportError {
    pub fn null(entity: EntityId, attribute: impl Into<String>) -> Self {
        ImportError::NullReference {
            entity,
            attribute: attribute.into(),
        }
    }

    pub fn invalid(entity: EntityId, attribute: impl Into<String>, message: impl Into<String>) -> Self {
        ImportError::InvalidAttribute {
            entity,
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    /// Whether this error originates in geometry reconstruction
    pub fn is_geometric(&self) -> bool {
        matches!(self, ImportError::Degenerate(_))
    }
}

impl From<ParseError> for ImportError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::EntityNotFound(id) => ImportError::MissingEntity(id),
            ParseError::InvalidReference { entity, attribute } => {
                ImportError::NullReference { entity, attribute }
            }
            ParseError::UnknownAttribute {
                entity, attribute, ..
            } => ImportError::invalid(entity, attribute, "not declared for this type"),
            other => ImportError::Config(other.to_string()),
        }
    }
}

/// Why an entity was intentionally left out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The entity's shape type is excluded by the options
    DoNotImport { shape_type: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::DoNotImport { shape_type } => {
                write!(f, "{shape_type} is excluded from import")
            }
        }
    }
}

/// Outcome of processing one entity
///
/// Skips are expected control flow and carry no diagnostic; failures do.
#[derive(Debug, Clone, PartialEq)]
pub enum Processed<T> {
    Ready(T),
    Skipped(SkipReason),
    Failed(ImportError),
}

impl<T> Processed<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Processed::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Processed::Ready(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Processed::Skipped(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Processed<U> {
        match self {
            Processed::Ready(value) => Processed::Ready(f(value)),
            Processed::Skipped(reason) => Processed::Skipped(reason),
            Processed::Failed(err) => Processed::Failed(err),
        }
    }
}

impl<T> From<Result<T>> for Processed<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Processed::Ready(value),
            Err(err) => Processed::Failed(err),
        }
    }
}
