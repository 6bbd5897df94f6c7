// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Structured record of everything that went wrong during an import
//!
//! Every recoverable anomaly becomes a [`Diagnostic`]. The session log keeps
//! them in order, mirrors each one to the `log` facade, and optionally
//! forwards it to an external [`DiagnosticsSink`].

use ifc_bridge_model::EntityId;
use log::{error, warn};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// One logged anomaly
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Entity the message is about; `None` for file-level messages
    pub entity: Option<EntityId>,
    pub severity: Severity,
    pub message: String,
    /// The entity contributes nothing to the import
    pub fatal_for_entity: bool,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.entity {
            Some(id) => write!(f, "{} {}: {}", self.severity, id, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Receiver for diagnostics, typically the host's import log
pub trait DiagnosticsSink {
    fn report(&mut self, diagnostic: &Diagnostic);
}

/// Ordered diagnostics of one session
#[derive(Default)]
pub struct DiagnosticLog {
    entries: Vec<Diagnostic>,
    forward: Option<Box<dyn DiagnosticsSink>>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also hand every entry to `sink`
    pub fn with_sink(sink: Box<dyn DiagnosticsSink>) -> Self {
        Self {
            entries: Vec::new(),
            forward: Some(sink),
        }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => warn!("{diagnostic}"),
            Severity::Error => error!("{diagnostic}"),
        }
        if let Some(sink) = self.forward.as_mut() {
            sink.report(&diagnostic);
        }
        self.entries.push(diagnostic);
    }

    pub fn warning(&mut self, entity: Option<EntityId>, message: impl Into<String>) {
        self.push(Diagnostic {
            entity,
            severity: Severity::Warning,
            message: message.into(),
            fatal_for_entity: false,
        });
    }

    /// Error that does not stop the entity from being imported
    pub fn error(&mut self, entity: Option<EntityId>, message: impl Into<String>) {
        self.push(Diagnostic {
            entity,
            severity: Severity::Error,
            message: message.into(),
            fatal_for_entity: false,
        });
    }

    /// Error after which the entity contributes nothing
    pub fn fatal(&mut self, entity: EntityId, message: impl Into<String>) {
        self.push(Diagnostic {
            entity: Some(entity),
            severity: Severity::Error,
            message: message.into(),
            fatal_for_entity: true,
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn for_entity(&self, id: EntityId) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.entity == Some(id))
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries.iter().filter(|d| d.severity == severity).count()
    }

    /// Serialize all entries, e.g. for an import report file
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.entries)
    }
}

impl fmt::Debug for DiagnosticLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticLog")
            .field("entries", &self.entries)
            .field("forwarding", &self.forward.is_some())
            .finish()
    }
}
