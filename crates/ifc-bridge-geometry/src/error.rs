// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for geometry reconstruction

use thiserror::Error;

/// Geometry processing result type
pub type Result<T> = std::result::Result<T, Error>;

/// Geometry processing errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Zero-length, zero-area or in-plane input
    #[error("Degenerate geometry: {0}")]
    Degenerate(String),

    /// Consecutive segments cannot be joined within tolerance
    #[error("Curve segments are not contiguous (gap {gap:.6})")]
    Discontinuous { gap: f64 },

    /// A trim bound could not be resolved by parameter or by point
    #[error("Trim error: {0}")]
    Trim(String),

    /// Profile construction error
    #[error("Profile error: {0}")]
    Profile(String),

    /// Triangulation error
    #[error("Triangulation error: {0}")]
    Triangulation(String),

    /// Operation not available for this curve or surface kind
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl Error {
    /// Create a degeneracy error
    pub fn degenerate(msg: impl Into<String>) -> Self {
        Error::Degenerate(msg.into())
    }

    /// Create a trim error
    pub fn trim(msg: impl Into<String>) -> Self {
        Error::Trim(msg.into())
    }

    /// Create a profile error
    pub fn profile(msg: impl Into<String>) -> Self {
        Error::Profile(msg.into())
    }

    /// Create a triangulation error
    pub fn triangulation(msg: impl Into<String>) -> Self {
        Error::Triangulation(msg.into())
    }

    /// Create an unsupported-operation error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::Unsupported(msg.into())
    }
}
