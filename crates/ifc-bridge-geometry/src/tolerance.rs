// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Distance tolerances used by loop assembly and validation

/// Angular epsilon (radians) for span and parallelism checks
pub const ANGLE_EPSILON: f64 = 1e-9;

/// Tight and loose distance tolerances, in model length units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Endpoints closer than this are the same vertex
    pub vertex: f64,
    /// Loose tolerance is `vertex * repair_factor`
    pub repair_factor: f64,
}

impl Tolerance {
    /// Factor between the tight and the loose (line repair) tolerance
    pub const DEFAULT_REPAIR_FACTOR: f64 = 5.0;

    /// Tolerance with the default repair factor
    pub fn new(vertex: f64) -> Self {
        Self {
            vertex,
            repair_factor: Self::DEFAULT_REPAIR_FACTOR,
        }
    }

    /// Override the repair factor
    pub fn with_repair_factor(mut self, factor: f64) -> Self {
        self.repair_factor = factor;
        self
    }

    /// Gap up to which a joint may be repaired by regenerating a line
    #[inline]
    pub fn loose(&self) -> f64 {
        self.vertex * self.repair_factor
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::new(1e-4)
    }
}
