// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host element creation interface
//!
//! The driver talks to the host application only through [`ElementSink`].
//! [`MemorySink`] keeps everything in memory and is what tests and
//! command line tools use.

use crate::items::GeometrySet;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// Parameter names written on every created element
pub const IFC_NAME: &str = "IfcName";
pub const IFC_DESCRIPTION: &str = "IfcDescription";
pub const IFC_TAG: &str = "IfcTag";
pub const IFC_MATERIAL: &str = "IfcMaterial";
pub const IFC_GUID: &str = "IfcGUID";
pub const IFC_EXPORT_AS: &str = "IfcExportAs";

/// Host-side id of a created element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementHandle(pub u64);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SinkError {
    #[error("host refused element: {0}")]
    Rejected(String),
    #[error("unknown element {0:?}")]
    UnknownElement(ElementHandle),
    #[error("shape not accepted: {0}")]
    Shape(String),
}

/// Receives elements, parameters and shapes from the importer
pub trait ElementSink {
    /// Create an empty element in `category`
    ///
    /// `app_guid` is stable per global id, so re-importing the same file
    /// addresses the same host element.
    fn create_element(
        &mut self,
        category: &str,
        app_guid: Uuid,
        global_id: &str,
    ) -> Result<ElementHandle, SinkError>;

    fn set_string_parameter(
        &mut self,
        element: ElementHandle,
        name: &str,
        value: &str,
    ) -> Result<(), SinkError>;

    fn set_guid_parameter(&mut self, element: ElementHandle, name: &str, value: Uuid) -> Result<(), SinkError>;

    fn set_double_parameter(&mut self, element: ElementHandle, name: &str, value: f64) -> Result<(), SinkError>;

    /// Attach world-space geometry
    fn set_shape(&mut self, element: ElementHandle, shape: &GeometrySet) -> Result<(), SinkError>;

    /// Record the created children of an element
    fn set_sub_elements(&mut self, element: ElementHandle, children: &[ElementHandle]) -> Result<(), SinkError>;
}

/// Parameter value stored by [`MemorySink`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParameterValue {
    String(String),
    Guid(Uuid),
    Double(f64),
}

impl ParameterValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// One element created in a [`MemorySink`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedElement {
    pub handle: ElementHandle,
    pub category: String,
    pub app_guid: Uuid,
    pub global_id: String,
    pub parameters: BTreeMap<String, ParameterValue>,
    pub solids: usize,
    pub voids: usize,
    pub curves: usize,
    pub children: Vec<ElementHandle>,
    #[serde(skip)]
    pub shape: Option<GeometrySet>,
}

impl CreatedElement {
    pub fn parameter(&self, name: &str) -> Option<&ParameterValue> {
        self.parameters.get(name)
    }
}

#[derive(Debug, Default)]
pub struct MemorySink {
    elements: Vec<CreatedElement>,
    refuse: FxHashSet<String>,
    attempts: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to create the element with this global id
    pub fn refuse(mut self, global_id: impl Into<String>) -> Self {
        self.refuse.insert(global_id.into());
        self
    }

    pub fn elements(&self) -> &[CreatedElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Creation requests, including refused ones
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn get(&self, handle: ElementHandle) -> Option<&CreatedElement> {
        self.elements.get(handle.0 as usize)
    }

    pub fn by_global_id(&self, global_id: &str) -> Option<&CreatedElement> {
        self.elements.iter().find(|e| e.global_id == global_id)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.elements)
    }

    fn element_mut(&mut self, handle: ElementHandle) -> Result<&mut CreatedElement, SinkError> {
        self.elements
            .get_mut(handle.0 as usize)
            .ok_or(SinkError::UnknownElement(handle))
    }

    fn set(&mut self, handle: ElementHandle, name: &str, value: ParameterValue) -> Result<(), SinkError> {
        self.element_mut(handle)?
            .parameters
            .insert(name.to_string(), value);
        Ok(())
    }
}

impl ElementSink for MemorySink {
    fn create_element(
        &mut self,
        category: &str,
        app_guid: Uuid,
        global_id: &str,
    ) -> Result<ElementHandle, SinkError> {
        self.attempts += 1;
        if self.refuse.contains(global_id) {
            return Err(SinkError::Rejected(format!("{category} {global_id}")));
        }
        let handle = ElementHandle(self.elements.len() as u64);
        self.elements.push(CreatedElement {
            handle,
            category: category.to_string(),
            app_guid,
            global_id: global_id.to_string(),
            parameters: BTreeMap::new(),
            solids: 0,
            voids: 0,
            curves: 0,
            children: Vec::new(),
            shape: None,
        });
        Ok(handle)
    }

    fn set_string_parameter(&mut self, element: ElementHandle, name: &str, value: &str) -> Result<(), SinkError> {
        self.set(element, name, ParameterValue::String(value.to_string()))
    }

    fn set_guid_parameter(&mut self, element: ElementHandle, name: &str, value: Uuid) -> Result<(), SinkError> {
        self.set(element, name, ParameterValue::Guid(value))
    }

    fn set_double_parameter(&mut self, element: ElementHandle, name: &str, value: f64) -> Result<(), SinkError> {
        self.set(element, name, ParameterValue::Double(value))
    }

    fn set_shape(&mut self, element: ElementHandle, shape: &GeometrySet) -> Result<(), SinkError> {
        let created = self.element_mut(element)?;
        created.solids = shape.solids.len();
        created.voids = shape.voids.len();
        created.curves = shape.curves.len();
        created.shape = Some(shape.clone());
        Ok(())
    }

    fn set_sub_elements(&mut self, element: ElementHandle, children: &[ElementHandle]) -> Result<(), SinkError> {
        self.element_mut(element)?.children = children.to_vec();
        Ok(())
    }
}
