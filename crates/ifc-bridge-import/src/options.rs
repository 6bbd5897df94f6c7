// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Import configuration

use crate::error::{ImportError, Result};
use ifc_bridge_geometry::Tolerance;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Options for one import session
///
/// Every field has a default, so a JSON document only needs to name what it
/// changes:
///
/// ```ignore
/// let options = ImportOptions::from_json(r#"{ "internal_units_per_metre": 1000.0 }"#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Host length units in one metre (1000 for a millimetre host)
    pub internal_units_per_metre: f64,
    /// Distance in metres below which two vertices are the same
    pub vertex_tolerance: f64,
    /// Loose gap-repair tolerance as a multiple of the vertex tolerance
    pub gap_repair_factor: f64,
    /// Tessellation density for full circles
    pub circle_segments: usize,
    /// Shape types (IFC class names) that are not imported
    pub excluded_entity_types: Vec<String>,
    /// Representation identifiers that carry body geometry
    pub body_identifiers: Vec<String>,
    /// Host category per IFC class name, overriding the built-in mapping
    pub category_overrides: BTreeMap<String, String>,
    pub import_openings: bool,
    /// Drop heavy fields of an entity once its element exists
    pub clean_after_creation: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            internal_units_per_metre: 1.0,
            vertex_tolerance: 1e-4,
            gap_repair_factor: 5.0,
            circle_segments: 24,
            excluded_entity_types: Vec::new(),
            body_identifiers: ["Body", "Facetation", "Mesh", "Profile"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            category_overrides: BTreeMap::new(),
            import_openings: true,
            clean_after_creation: true,
        }
    }
}

impl ImportOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self =
            serde_json::from_str(json).map_err(|e| ImportError::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.internal_units_per_metre.is_finite() && self.internal_units_per_metre > 0.0) {
            return Err(ImportError::Config(
                "internal_units_per_metre must be positive".to_string(),
            ));
        }
        if !(self.vertex_tolerance.is_finite() && self.vertex_tolerance > 0.0) {
            return Err(ImportError::Config("vertex_tolerance must be positive".to_string()));
        }
        if self.gap_repair_factor < 1.0 {
            return Err(ImportError::Config(
                "gap_repair_factor must be at least 1".to_string(),
            ));
        }
        if self.circle_segments < 3 {
            return Err(ImportError::Config("circle_segments must be at least 3".to_string()));
        }
        Ok(())
    }

    pub fn with_internal_units_per_metre(mut self, units: f64) -> Self {
        self.internal_units_per_metre = units;
        self
    }

    pub fn with_vertex_tolerance(mut self, metres: f64) -> Self {
        self.vertex_tolerance = metres;
        self
    }

    pub fn with_gap_repair_factor(mut self, factor: f64) -> Self {
        self.gap_repair_factor = factor;
        self
    }

    pub fn with_circle_segments(mut self, segments: usize) -> Self {
        self.circle_segments = segments;
        self
    }

    pub fn excluding(mut self, class_name: impl Into<String>) -> Self {
        self.excluded_entity_types.push(class_name.into());
        self
    }

    pub fn with_category_override(
        mut self,
        class_name: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        self.category_overrides.insert(class_name.into(), category.into());
        self
    }

    pub fn with_openings(mut self, import_openings: bool) -> Self {
        self.import_openings = import_openings;
        self
    }

    pub fn with_clean_after_creation(mut self, clean: bool) -> Self {
        self.clean_after_creation = clean;
        self
    }

    pub fn is_excluded(&self, shape_type: &str) -> bool {
        self.excluded_entity_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(shape_type))
    }

    pub fn is_body_identifier(&self, identifier: &str) -> bool {
        self.body_identifiers
            .iter()
            .any(|t| t.eq_ignore_ascii_case(identifier))
    }

    /// Tolerance in host units
    pub fn tolerance(&self) -> Tolerance {
        Tolerance::new(self.vertex_tolerance * self.internal_units_per_metre)
            .with_repair_factor(self.gap_repair_factor)
    }
}
