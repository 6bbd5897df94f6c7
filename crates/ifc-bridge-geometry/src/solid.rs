// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solid geometry produced by representation items

use crate::error::Result;
use crate::extrusion::{Extrusion, Revolution, Sweep};
use crate::mesh::Mesh;
use crate::shell::Shell;
use nalgebra::Matrix4;

/// One reconstructed solid or surface body
#[derive(Debug, Clone, PartialEq)]
pub enum Solid {
    Extrusion(Extrusion),
    Revolution(Revolution),
    Sweep(Sweep),
    /// Face set whose every declared face was valid
    Brep(Shell),
    /// Tessellated fallback or explicit triangle data
    Mesh(Mesh),
}

impl Solid {
    /// Short name for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Solid::Extrusion(_) => "extrusion",
            Solid::Revolution(_) => "revolution",
            Solid::Sweep(_) => "sweep",
            Solid::Brep(_) => "brep",
            Solid::Mesh(_) => "mesh",
        }
    }

    pub fn to_mesh(&self, segments_per_revolution: usize, tolerance: f64) -> Result<Mesh> {
        match self {
            Solid::Extrusion(e) => e.to_mesh(segments_per_revolution, tolerance),
            Solid::Revolution(r) => r.to_mesh(segments_per_revolution, tolerance),
            Solid::Sweep(s) => s.to_mesh(segments_per_revolution, tolerance),
            Solid::Brep(shell) => shell.to_mesh(),
            Solid::Mesh(mesh) => Ok(mesh.clone()),
        }
    }

    pub fn transformed(&self, m: &Matrix4<f64>) -> Self {
        match self {
            Solid::Extrusion(e) => Solid::Extrusion(e.transformed(m)),
            Solid::Revolution(r) => Solid::Revolution(r.transformed(m)),
            Solid::Sweep(s) => Solid::Sweep(s.transformed(m)),
            Solid::Brep(shell) => Solid::Brep(shell.transformed(m)),
            Solid::Mesh(mesh) => {
                let mut mesh = mesh.clone();
                mesh.transform(m);
                Solid::Mesh(mesh)
            }
        }
    }
}
