// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Indexed triangle mesh

use crate::error::Result;
use crate::triangulation::{newell_normal, plane_basis, project_onto, triangulate_with_holes};
use nalgebra::{Matrix4, Point3, Vector3};

/// Flat-shaded triangle mesh with per-vertex normals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Vertex normals (nx, ny, nz)
    pub normals: Vec<f32>,
    /// Triangle indices
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn add_vertex(&mut self, p: &Point3<f64>, n: &Vector3<f64>) -> u32 {
        let index = self.vertex_count() as u32;
        self.positions.extend([p.x as f32, p.y as f32, p.z as f32]);
        self.normals.extend([n.x as f32, n.y as f32, n.z as f32]);
        index
    }

    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend([a, b, c]);
    }

    /// Flat quad `a b c d`, wound counter-clockwise about its normal
    pub fn add_quad(&mut self, a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, d: &Point3<f64>) {
        let Some(normal) = newell_normal(&[*a, *b, *c, *d]) else {
            return;
        };
        let i = self.add_vertex(a, &normal);
        self.add_vertex(b, &normal);
        self.add_vertex(c, &normal);
        self.add_vertex(d, &normal);
        self.add_triangle(i, i + 1, i + 2);
        self.add_triangle(i, i + 2, i + 3);
    }

    /// Planar polygon with holes, facing along the outer ring's normal
    ///
    /// Rings without area are skipped and reported as `Ok(false)`.
    pub fn add_polygon(&mut self, outer: &[Point3<f64>], holes: &[Vec<Point3<f64>>]) -> Result<bool> {
        let Some(normal) = newell_normal(outer) else {
            return Ok(false);
        };
        let frame = plane_basis(outer[0], &normal);
        let outer2 = project_onto(outer, &frame);
        let holes: Vec<&Vec<Point3<f64>>> = holes.iter().filter(|h| h.len() >= 3).collect();
        let holes2: Vec<_> = holes.iter().map(|h| project_onto(h, &frame)).collect();
        let local = triangulate_with_holes(&outer2, &holes2)?;

        let flat: Vec<_> = outer2.iter().chain(holes2.iter().flatten()).collect();
        let base = self.vertex_count() as u32;
        for p in outer.iter().chain(holes.iter().flat_map(|h| h.iter())) {
            self.add_vertex(p, &normal);
        }
        for tri in local.chunks_exact(3) {
            let (a, b, c) = (flat[tri[0]], flat[tri[1]], flat[tri[2]]);
            let ccw = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x) >= 0.0;
            let (i, j, k) = (base + tri[0] as u32, base + tri[1] as u32, base + tri[2] as u32);
            if ccw {
                self.add_triangle(i, j, k);
            } else {
                self.add_triangle(i, k, j);
            }
        }
        Ok(true)
    }

    /// Append another mesh
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.vertex_count() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.indices.extend(other.indices.iter().map(|i| i + offset));
    }

    /// Transform positions and normals in place
    ///
    /// Mirroring transforms flip the triangle winding so faces keep
    /// pointing outward.
    pub fn transform(&mut self, m: &Matrix4<f64>) {
        let linear = m.fixed_view::<3, 3>(0, 0).into_owned();
        let normal_matrix = linear.try_inverse().map(|inv| inv.transpose());
        for chunk in self.positions.chunks_exact_mut(3) {
            let p = m.transform_point(&Point3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64));
            chunk[0] = p.x as f32;
            chunk[1] = p.y as f32;
            chunk[2] = p.z as f32;
        }
        if let Some(nm) = normal_matrix {
            for chunk in self.normals.chunks_exact_mut(3) {
                let n = nm * Vector3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64);
                let n = n.try_normalize(f64::EPSILON).unwrap_or(n);
                chunk[0] = n.x as f32;
                chunk[1] = n.y as f32;
                chunk[2] = n.z as f32;
            }
        }
        if linear.determinant() < 0.0 {
            for tri in self.indices.chunks_exact_mut(3) {
                tri.swap(1, 2);
            }
        }
    }

    /// Axis-aligned bounds, `None` when empty
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let mut chunks = self.positions.chunks_exact(3);
        let first = chunks.next()?;
        let mut min = Point3::new(first[0] as f64, first[1] as f64, first[2] as f64);
        let mut max = min;
        for c in chunks {
            for axis in 0..3 {
                min[axis] = min[axis].min(c[axis] as f64);
                max[axis] = max[axis].max(c[axis] as f64);
            }
        }
        Some((min, max))
    }

    /// Enclosed volume by the divergence theorem; meaningful for closed meshes
    pub fn volume(&self) -> f64 {
        let p = |i: u32| {
            let i = i as usize * 3;
            Vector3::new(
                self.positions[i] as f64,
                self.positions[i + 1] as f64,
                self.positions[i + 2] as f64,
            )
        };
        self.indices
            .chunks_exact(3)
            .map(|t| p(t[0]).dot(&p(t[1]).cross(&p(t[2]))) / 6.0)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_polygon_with_hole() {
        let outer = vec![
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(4.0, 0.0, 1.0),
            Point3::new(4.0, 4.0, 1.0),
            Point3::new(0.0, 4.0, 1.0),
        ];
        let hole = vec![
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(1.0, 2.0, 1.0),
            Point3::new(2.0, 2.0, 1.0),
            Point3::new(2.0, 1.0, 1.0),
        ];
        let mut mesh = Mesh::new();
        assert!(mesh.add_polygon(&outer, &[hole]).unwrap());
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 8);
        assert_relative_eq!(mesh.normals[2], 1.0);
    }

    #[test]
    fn test_merge_offsets_indices() {
        let mut a = Mesh::new();
        a.add_quad(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(1.0, 1.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
        );
        let b = a.clone();
        a.merge(&b);
        assert_eq!(a.vertex_count(), 8);
        assert_eq!(a.indices[6], 4);
    }

    #[test]
    fn test_transform_translates_and_keeps_normals() {
        let mut mesh = Mesh::new();
        mesh.add_quad(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(1.0, 1.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
        );
        mesh.transform(&Matrix4::new_translation(&Vector3::new(0.0, 0.0, 5.0)));
        let (min, max) = mesh.bounds().unwrap();
        assert_relative_eq!(min.z, 5.0);
        assert_relative_eq!(max.x, 1.0);
        assert_relative_eq!(mesh.normals[2], 1.0);
    }
}
