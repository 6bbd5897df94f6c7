// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC-Bridge Export
//!
//! Writes extruded solids back to IFC with parametric profiles where the
//! outline allows it.
//!
//! ## Overview
//!
//! - **Planar loops**: profile boundaries flattened onto the extrusion base
//!   plane, arcs kept when their axis follows the extrusion
//! - **Recognition**: [`ProfileRecognizer`] tries rectangle, circle or
//!   annulus and I-shape before falling back to an arbitrary profile
//! - **Writing**: [`StepWriter`] emits the IFC4 entities for an
//!   [`ExportExtrusion`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ifc_bridge_export::{ExtrusionBuilder, StepWriter};
//! use ifc_bridge_geometry::{Extrusion, Profile, Vector3};
//!
//! let extrusion = Extrusion::new(Profile::rectangle(0.4, 0.2)?, Vector3::z(), 3.0, 24, 1e-9)?;
//! let export = ExtrusionBuilder::default().build(&extrusion)?;
//!
//! let mut writer = StepWriter::new();
//! let solid = writer.extrusion(&export)?;
//! let shape = writer.body(&[solid])?;
//! writer.proxy(&global_id, "Column", Some(shape))?;
//! std::fs::write("column.ifc", writer.finish())?;
//! ```

pub mod error;
pub mod extrusion;
pub mod planar;
pub mod recognize;
pub mod writer;

pub use error::{ExportError, Result};
pub use extrusion::{ExportExtrusion, ExtrusionBuilder};
pub use planar::{Arc2, PlanarLoop, Segment2};
pub use recognize::{Placement2, ProfileRecognizer, RecognizedProfile};
pub use writer::{step_string, StepWriter, SCHEMA};
