// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Geometry(#[from] ifc_bridge_geometry::Error),

    #[error("Curve loop has no segments")]
    EmptyLoop,

    #[error("Curve loop is open (gap {gap})")]
    OpenLoop { gap: f64 },

    #[error("Cannot write non-finite value {0}")]
    NonFinite(f64),
}
