// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary representation shells and face-set assembly
//!
//! Faces are collected into a [`FaceSetScope`]. When every declared face
//! is valid the scope yields a [`Shell`]; otherwise it salvages the valid
//! faces into a mesh and reports how many were realized.

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::solid::Solid;
use crate::triangulation::newell_normal;
use nalgebra::{Matrix4, Point3};

/// Planar face with optional inner bounds
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub outer: Vec<Point3<f64>>,
    pub inners: Vec<Vec<Point3<f64>>>,
}

impl Face {
    pub fn transformed(&self, m: &Matrix4<f64>) -> Self {
        let map = |ring: &Vec<Point3<f64>>| -> Vec<Point3<f64>> {
            ring.iter().map(|p| m.transform_point(p)).collect()
        };
        Self {
            outer: map(&self.outer),
            inners: self.inners.iter().map(map).collect(),
        }
    }
}

/// Set of faces, open or closed
#[derive(Debug, Clone, PartialEq)]
pub struct Shell {
    pub faces: Vec<Face>,
    pub closed: bool,
}

impl Shell {
    pub fn to_mesh(&self) -> Result<Mesh> {
        let mut mesh = Mesh::new();
        for face in &self.faces {
            mesh.add_polygon(&face.outer, &face.inners)?;
        }
        Ok(mesh)
    }

    /// Tessellate the faces that can be triangulated and skip the rest
    ///
    /// Returns the mesh with the number of faces that contributed to it.
    pub fn salvage_mesh(&self) -> (Mesh, usize) {
        let mut mesh = Mesh::new();
        let mut meshed = 0;
        for face in &self.faces {
            if let Ok(true) = mesh.add_polygon(&face.outer, &face.inners) {
                meshed += 1;
            }
        }
        (mesh, meshed)
    }

    pub fn transformed(&self, m: &Matrix4<f64>) -> Self {
        let mut faces: Vec<Face> = self.faces.iter().map(|f| f.transformed(m)).collect();
        if m.fixed_view::<3, 3>(0, 0).into_owned().determinant() < 0.0 {
            for face in &mut faces {
                face.outer.reverse();
                for inner in &mut face.inners {
                    inner.reverse();
                }
            }
        }
        Self {
            faces,
            closed: self.closed,
        }
    }
}

/// Drop repeated consecutive vertices, including a repeated closing vertex
fn clean_ring(ring: Vec<Point3<f64>>, tolerance: f64) -> Vec<Point3<f64>> {
    let mut out: Vec<Point3<f64>> = Vec::with_capacity(ring.len());
    for p in ring {
        if out.last().is_some_and(|q| (q - p).norm() <= tolerance) {
            continue;
        }
        out.push(p);
    }
    while out.len() > 1 && (out[0] - out[out.len() - 1]).norm() <= tolerance {
        out.pop();
    }
    out
}

/// Result of closing a face-set scope
#[derive(Debug, Clone, PartialEq)]
pub struct FaceSetOutcome {
    pub solid: Solid,
    pub realized: usize,
    pub declared: usize,
    /// Reasons faces were rejected, in order
    pub rejected: Vec<String>,
}

impl FaceSetOutcome {
    /// All declared faces made it into the result
    pub fn is_complete(&self) -> bool {
        self.realized == self.declared
    }
}

/// Collects the faces of one shell
#[derive(Debug)]
pub struct FaceSetScope {
    declared: usize,
    closed: bool,
    tolerance: f64,
    faces: Vec<Face>,
    rejected: Vec<String>,
}

impl FaceSetScope {
    pub fn begin(declared: usize, closed: bool, tolerance: f64) -> Self {
        Self {
            declared,
            closed,
            tolerance,
            faces: Vec::with_capacity(declared),
            rejected: Vec::new(),
        }
    }

    /// Validate and add a face; returns whether it was accepted
    pub fn add_face(&mut self, outer: Vec<Point3<f64>>, inners: Vec<Vec<Point3<f64>>>) -> bool {
        let outer = clean_ring(outer, self.tolerance);
        if outer.len() < 3 {
            self.rejected.push(format!("face {} has fewer than 3 distinct vertices", self.seen()));
            return false;
        }
        if newell_normal(&outer).is_none() {
            self.rejected.push(format!("face {} encloses no area", self.seen()));
            return false;
        }
        let inners = inners
            .into_iter()
            .map(|ring| clean_ring(ring, self.tolerance))
            .filter(|ring| ring.len() >= 3)
            .collect();
        self.faces.push(Face { outer, inners });
        true
    }

    /// Record a face that could not be read at all
    pub fn reject(&mut self, reason: impl Into<String>) {
        self.rejected.push(reason.into());
    }

    fn seen(&self) -> usize {
        self.faces.len() + self.rejected.len()
    }

    pub fn realized(&self) -> usize {
        self.faces.len()
    }

    /// Close the scope
    ///
    /// A complete face set becomes a B-rep; an incomplete one is
    /// tessellated into a mesh from the faces that survived. No valid
    /// faces at all is an error.
    pub fn finish(self) -> Result<FaceSetOutcome> {
        if self.faces.is_empty() {
            return Err(Error::degenerate(format!(
                "none of {} declared faces is valid",
                self.declared
            )));
        }
        let mut rejected = self.rejected;
        let shell = Shell {
            faces: self.faces,
            closed: self.closed,
        };
        if shell.faces.len() == self.declared {
            return Ok(FaceSetOutcome {
                realized: shell.faces.len(),
                solid: Solid::Brep(shell),
                declared: self.declared,
                rejected,
            });
        }
        let (mesh, realized) = shell.salvage_mesh();
        if realized == 0 {
            return Err(Error::degenerate(format!(
                "none of {} declared faces could be tessellated",
                self.declared
            )));
        }
        let failed = shell.faces.len() - realized;
        if failed > 0 {
            rejected.push(format!("{failed} faces could not be tessellated"));
        }
        Ok(FaceSetOutcome {
            solid: Solid::Mesh(mesh),
            realized,
            declared: self.declared,
            rejected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(z: f64) -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, z),
            Point3::new(1.0, 0.0, z),
            Point3::new(1.0, 1.0, z),
            Point3::new(0.0, 1.0, z),
        ]
    }

    #[test]
    fn test_complete_face_set_is_brep() {
        let mut scope = FaceSetScope::begin(2, false, 1e-9);
        assert!(scope.add_face(quad(0.0), vec![]));
        assert!(scope.add_face(quad(1.0), vec![]));
        let outcome = scope.finish().unwrap();
        assert!(outcome.is_complete());
        assert!(matches!(outcome.solid, Solid::Brep(_)));
    }

    #[test]
    fn test_incomplete_face_set_is_salvaged() {
        let mut scope = FaceSetScope::begin(6, true, 1e-9);
        for z in 0..5 {
            assert!(scope.add_face(quad(z as f64), vec![]));
        }
        let collinear = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        assert!(!scope.add_face(collinear, vec![]));
        let outcome = scope.finish().unwrap();
        assert_eq!((outcome.realized, outcome.declared), (5, 6));
        assert_eq!(outcome.rejected.len(), 1);
        match outcome.solid {
            Solid::Mesh(mesh) => assert_eq!(mesh.triangle_count(), 10),
            other => panic!("expected mesh, got {other:?}"),
        }
    }

    #[test]
    fn test_repeated_closing_vertex_is_dropped() {
        let mut ring = quad(0.0);
        ring.push(ring[0]);
        let mut scope = FaceSetScope::begin(1, false, 1e-9);
        assert!(scope.add_face(ring, vec![]));
        let outcome = scope.finish().unwrap();
        let Solid::Brep(shell) = outcome.solid else {
            panic!("expected brep");
        };
        assert_eq!(shell.faces[0].outer.len(), 4);
    }

    #[test]
    fn test_salvage_skips_faces_that_do_not_tessellate() {
        let bad = Face {
            outer: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(f64::NAN, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
            ],
            inners: vec![],
        };
        let shell = Shell {
            faces: vec![
                Face { outer: quad(0.0), inners: vec![] },
                bad,
                Face { outer: quad(1.0), inners: vec![] },
            ],
            closed: false,
        };
        let (mesh, meshed) = shell.salvage_mesh();
        assert_eq!(meshed, 2);
        assert_eq!(mesh.triangle_count(), 4);
    }

    #[test]
    fn test_no_valid_faces_fails() {
        let mut scope = FaceSetScope::begin(1, true, 1e-9);
        scope.reject("unreadable bound");
        assert!(scope.finish().is_err());
    }
}
