// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Profile recognition
//!
//! Matches flattened loops against parametric profile shapes in priority
//! order: rectangle, circle or annulus, I-shape. Loops that match none of
//! them become an arbitrary profile. Matchers never fail; a mismatch is
//! `None` and the next matcher runs.

use crate::planar::{line_intersection, turn, PlanarLoop, Segment2};
use ifc_bridge_geometry::{Point2, Vector2};
use log::debug;
use std::f64::consts::TAU;

/// Location and X axis of a profile in plane coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement2 {
    pub location: Point2<f64>,
    pub ref_direction: Vector2<f64>,
}

impl Placement2 {
    pub fn at(location: Point2<f64>) -> Self {
        Self {
            location,
            ref_direction: Vector2::x(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecognizedProfile {
    Rectangle {
        position: Placement2,
        x_dim: f64,
        y_dim: f64,
    },
    Circle {
        position: Placement2,
        radius: f64,
    },
    HollowCircle {
        position: Placement2,
        radius: f64,
        wall: f64,
    },
    IShape {
        position: Placement2,
        overall_width: f64,
        overall_depth: f64,
        web_thickness: f64,
        flange_thickness: f64,
        fillet_radius: Option<f64>,
    },
    /// Outer loop counter-clockwise, voids clockwise
    Arbitrary {
        outer: PlanarLoop,
        voids: Vec<PlanarLoop>,
    },
}

impl RecognizedProfile {
    pub fn kind(&self) -> &'static str {
        match self {
            RecognizedProfile::Rectangle { .. } => "rectangle",
            RecognizedProfile::Circle { .. } => "circle",
            RecognizedProfile::HollowCircle { .. } => "hollow circle",
            RecognizedProfile::IShape { .. } => "I-shape",
            RecognizedProfile::Arbitrary { .. } => "arbitrary",
        }
    }

    pub fn position(&self) -> Option<&Placement2> {
        match self {
            RecognizedProfile::Rectangle { position, .. }
            | RecognizedProfile::Circle { position, .. }
            | RecognizedProfile::HollowCircle { position, .. }
            | RecognizedProfile::IShape { position, .. } => Some(position),
            RecognizedProfile::Arbitrary { .. } => None,
        }
    }
}

/// Turn directions of an I-shape outline, counter-clockwise from the
/// lower left corner: `true` for convex corners
const I_SHAPE_TURNS: [bool; 12] = [
    true, true, true, false, false, true, true, true, true, false, false, true,
];

/// Corners of an I-shape outline that may carry a web fillet
const I_SHAPE_FILLETS: [usize; 4] = [3, 4, 9, 10];

/// Prefer the axis pointing most along +X, then +Y
fn canonical_axis(candidates: impl IntoIterator<Item = Vector2<f64>>) -> Option<Vector2<f64>> {
    candidates.into_iter().fold(None, |best: Option<Vector2<f64>>, u| match best {
        Some(b) if b.x > u.x + 1e-9 || ((b.x - u.x).abs() <= 1e-9 && b.y >= u.y) => Some(b),
        _ => Some(u),
    })
}

fn centroid(points: &[Point2<f64>]) -> Point2<f64> {
    let sum = points
        .iter()
        .fold(Vector2::zeros(), |acc, p| acc + p.coords);
    Point2::from(sum / points.len() as f64)
}

pub struct ProfileRecognizer {
    tolerance: f64,
}

impl Default for ProfileRecognizer {
    fn default() -> Self {
        Self::new(1e-6)
    }
}

impl ProfileRecognizer {
    /// `tolerance` is a length in plane units
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Classify an outer loop and its voids
    ///
    /// Windings are normalized first: the outer loop counter-clockwise and
    /// the voids clockwise about the plane normal.
    pub fn recognize(&self, outer: &PlanarLoop, voids: &[PlanarLoop]) -> RecognizedProfile {
        let outer = outer.merge_collinear(self.tolerance).with_winding(true);
        let voids: Vec<PlanarLoop> = voids
            .iter()
            .map(|v| v.merge_collinear(self.tolerance).with_winding(false))
            .collect();

        let recognized = self
            .rectangle(&outer, &voids)
            .or_else(|| self.circle(&outer, &voids))
            .or_else(|| self.i_shape(&outer, &voids))
            .unwrap_or(RecognizedProfile::Arbitrary { outer, voids });
        debug!("profile recognized as {}", recognized.kind());
        recognized
    }

    fn close(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.tolerance
    }

    /// Four lines with right angles at every corner
    pub fn rectangle(&self, outer: &PlanarLoop, voids: &[PlanarLoop]) -> Option<RecognizedProfile> {
        if !voids.is_empty() {
            return None;
        }
        let corners = outer.corners().filter(|c| c.len() == 4)?;
        let edges: Vec<Vector2<f64>> = (0..4).map(|i| corners[(i + 1) % 4] - corners[i]).collect();
        for i in 0..4 {
            let u = edges[i].try_normalize(self.tolerance)?;
            let next = &edges[(i + 1) % 4];
            if u.dot(next).abs() > self.tolerance || next.norm() <= self.tolerance {
                return None;
            }
        }
        // Four right angles with a gap-free closure leave opposite edges equal
        let u0 = edges[0].normalize();
        let u1 = edges[1].normalize();
        let x_axis = canonical_axis([u0, -u0, u1, -u1])?;
        let (x_dim, y_dim) = if u0.dot(&x_axis).abs() > u1.dot(&x_axis).abs() {
            (edges[0].norm(), edges[1].norm())
        } else {
            (edges[1].norm(), edges[0].norm())
        };
        Some(RecognizedProfile::Rectangle {
            position: Placement2 {
                location: centroid(&corners),
                ref_direction: x_axis,
            },
            x_dim,
            y_dim,
        })
    }

    /// Center and radius of a loop made of arcs of one circle, closing a full turn
    fn full_circle(&self, l: &PlanarLoop) -> Option<(Point2<f64>, f64)> {
        let mut arcs = l.segments().iter().map(|s| match s {
            Segment2::Arc(arc) => Some(arc),
            Segment2::Line { .. } => None,
        });
        let first = arcs.next()??;
        let mut sweep = first.sweep;
        for arc in arcs {
            let arc = arc?;
            if (arc.center - first.center).norm() > self.tolerance || !self.close(arc.radius, first.radius) {
                return None;
            }
            sweep += arc.sweep;
        }
        ((sweep.abs() - TAU).abs() <= 1e-6).then_some((first.center, first.radius))
    }

    /// One full circle, or two concentric ones
    pub fn circle(&self, outer: &PlanarLoop, voids: &[PlanarLoop]) -> Option<RecognizedProfile> {
        if voids.len() > 1 {
            return None;
        }
        let (center, radius) = self.full_circle(outer)?;
        let Some(void) = voids.first() else {
            return Some(RecognizedProfile::Circle {
                position: Placement2::at(center),
                radius,
            });
        };
        let (inner_center, inner_radius) = self.full_circle(void)?;
        if (inner_center - center).norm() > self.tolerance || inner_radius >= radius - self.tolerance {
            return None;
        }
        Some(RecognizedProfile::HollowCircle {
            position: Placement2::at(center),
            radius,
            wall: radius - inner_radius,
        })
    }

    /// Sharp corners of an outline, with the fillet radius where an arc
    /// rounds a corner
    fn sharpen(&self, l: &PlanarLoop) -> Option<Vec<(Point2<f64>, Option<f64>)>> {
        let segments = l.segments();
        let n = segments.len();
        let first = segments.iter().position(Segment2::is_line)?;
        let ordered: Vec<&Segment2> = (0..n).map(|i| &segments[(first + i) % n]).collect();
        let mut previous_line = *ordered.iter().rev().find(|s| s.is_line())?;
        let mut previous = ordered[n - 1];

        let mut corners = Vec::with_capacity(n);
        for &segment in &ordered {
            match (segment, previous) {
                (Segment2::Line { start, .. }, Segment2::Line { .. }) => {
                    corners.push((*start, None));
                    previous_line = segment;
                }
                (Segment2::Line { .. }, Segment2::Arc(arc)) => {
                    corners.push((line_intersection(previous_line, segment)?, Some(arc.radius)));
                    previous_line = segment;
                }
                (Segment2::Arc(_), Segment2::Arc(_)) => return None,
                (Segment2::Arc(_), Segment2::Line { .. }) => {}
            }
            previous = segment;
        }
        Some(corners)
    }

    /// Symmetric I section, 12 lines or 16 segments with four web fillets
    pub fn i_shape(&self, outer: &PlanarLoop, voids: &[PlanarLoop]) -> Option<RecognizedProfile> {
        if !voids.is_empty() || !matches!(outer.len(), 12 | 16) {
            return None;
        }
        let corners = self.sharpen(outer).filter(|c| c.len() == 12)?;
        let n = corners.len();
        let at = |i: usize| corners[i % n].0;

        let mut convex = [false; 12];
        for (i, flag) in convex.iter_mut().enumerate() {
            let (a, b, c) = (at(i + n - 1), at(i), at(i + 1));
            let incoming = (b - a).try_normalize(self.tolerance)?;
            if incoming.dot(&(c - b)).abs() > self.tolerance {
                return None;
            }
            *flag = turn(&a, &b, &c) > 0.0;
        }

        // The outline is symmetric under a half turn, so two starts match
        let mut best: Option<(Vector2<f64>, RecognizedProfile)> = None;
        for start in 0..n {
            if (0..n).any(|i| convex[(start + i) % n] != I_SHAPE_TURNS[i]) {
                continue;
            }
            let Some(profile) = self.i_shape_from(&corners, start) else {
                continue;
            };
            let axis = profile.position().map(|p| p.ref_direction)?;
            let better = match &best {
                Some((b, _)) => canonical_axis([*b, axis]) == Some(axis) && *b != axis,
                None => true,
            };
            if better {
                best = Some((axis, profile));
            }
        }
        best.map(|(_, profile)| profile)
    }

    fn i_shape_from(&self, corners: &[(Point2<f64>, Option<f64>)], start: usize) -> Option<RecognizedProfile> {
        let n = corners.len();
        let c = |i: usize| corners[(start + i) % n];
        let len = |i: usize| (c(i + 1).0 - c(i).0).norm();

        let width = len(0);
        let flange = len(1);
        let overhang = len(2);
        let web_height = len(3);
        let symmetric = self.close(len(6), width)
            && [5, 7, 11].iter().all(|&i| self.close(len(i), flange))
            && [4, 8, 10].iter().all(|&i| self.close(len(i), overhang))
            && self.close(len(9), web_height);
        if !symmetric {
            return None;
        }
        let web = width - 2.0 * overhang;
        if web <= self.tolerance {
            return None;
        }

        let fillet_radius = match c(I_SHAPE_FILLETS[0]).1 {
            None => {
                if corners.iter().any(|(_, r)| r.is_some()) {
                    return None;
                }
                None
            }
            Some(r) => {
                let congruent = I_SHAPE_FILLETS
                    .iter()
                    .all(|&i| c(i).1.is_some_and(|ri| self.close(ri, r)));
                let fillets = corners.iter().filter(|(_, r)| r.is_some()).count();
                if !congruent || fillets != I_SHAPE_FILLETS.len() {
                    return None;
                }
                Some(r)
            }
        };

        let points: Vec<Point2<f64>> = corners.iter().map(|(p, _)| *p).collect();
        Some(RecognizedProfile::IShape {
            position: Placement2 {
                location: centroid(&points),
                ref_direction: (c(1).0 - c(0).0).normalize(),
            },
            overall_width: width,
            overall_depth: web_height + 2.0 * flange,
            web_thickness: web,
            flange_thickness: flange,
            fillet_radius,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planar::Arc2;
    use approx::assert_relative_eq;
    use ifc_bridge_geometry::{Frame, Profile};

    fn rectangle_corners() -> Vec<Point2<f64>> {
        vec![
            Point2::new(1.0, 1.0),
            Point2::new(5.0, 1.0),
            Point2::new(5.0, 3.0),
            Point2::new(1.0, 3.0),
        ]
    }

    fn flatten(profile: &Profile) -> (PlanarLoop, Vec<PlanarLoop>) {
        let outer = PlanarLoop::project(&profile.outer, &Frame::world(), 24, 1e-9).unwrap();
        let voids = profile
            .inners
            .iter()
            .map(|l| PlanarLoop::project(l, &Frame::world(), 24, 1e-9).unwrap())
            .collect();
        (outer, voids)
    }

    #[test]
    fn test_rectangle_any_start_and_winding() {
        let recognizer = ProfileRecognizer::default();
        let base = rectangle_corners();
        for start in 0..4 {
            for reversed in [false, true] {
                let mut corners: Vec<_> = (0..4).map(|i| base[(start + i) % 4]).collect();
                if reversed {
                    corners.reverse();
                }
                let profile = recognizer.recognize(&PlanarLoop::polygon(&corners), &[]);
                let RecognizedProfile::Rectangle { position, x_dim, y_dim } = profile else {
                    panic!("start {start} reversed {reversed}: {}", profile.kind());
                };
                assert_relative_eq!(x_dim, 4.0, epsilon = 1e-12);
                assert_relative_eq!(y_dim, 2.0, epsilon = 1e-12);
                assert_relative_eq!(position.location.x, 3.0, epsilon = 1e-12);
                assert_relative_eq!(position.location.y, 2.0, epsilon = 1e-12);
                assert_relative_eq!(position.ref_direction.x, 1.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_rectangle_with_split_edge() {
        let mut corners = rectangle_corners();
        corners.insert(1, Point2::new(3.0, 1.0));
        let profile = ProfileRecognizer::default().recognize(&PlanarLoop::polygon(&corners), &[]);
        assert_eq!(profile.kind(), "rectangle");
    }

    #[test]
    fn test_skewed_quad_is_arbitrary() {
        let corners = [
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(5.0, 2.0),
            Point2::new(1.0, 2.0),
        ];
        let profile = ProfileRecognizer::default().recognize(&PlanarLoop::polygon(&corners), &[]);
        let RecognizedProfile::Arbitrary { outer, voids } = profile else {
            panic!("parallelogram recognized as {}", profile.kind());
        };
        assert!(voids.is_empty());
        assert!(outer.signed_area() > 0.0);
    }

    #[test]
    fn test_rotated_rectangle() {
        let (c, s) = (30f64.to_radians().cos(), 30f64.to_radians().sin());
        let corners: Vec<_> = rectangle_corners()
            .into_iter()
            .map(|p| Point2::new(c * p.x - s * p.y, s * p.x + c * p.y))
            .collect();
        let profile = ProfileRecognizer::default().recognize(&PlanarLoop::polygon(&corners), &[]);
        let RecognizedProfile::Rectangle { position, x_dim, .. } = profile else {
            panic!("expected a rectangle");
        };
        assert_relative_eq!(x_dim, 4.0, epsilon = 1e-9);
        assert_relative_eq!(position.ref_direction.x, c, epsilon = 1e-9);
    }

    #[test]
    fn test_circle_and_annulus() {
        let recognizer = ProfileRecognizer::default();
        let (outer, voids) = flatten(&Profile::circle(0.5).unwrap());
        assert!(matches!(
            recognizer.recognize(&outer, &voids),
            RecognizedProfile::Circle { radius, .. } if (radius - 0.5).abs() < 1e-12
        ));

        let (outer, voids) = flatten(&Profile::hollow_circle(0.5, 0.1).unwrap());
        let RecognizedProfile::HollowCircle { radius, wall, .. } = recognizer.recognize(&outer, &voids) else {
            panic!("expected an annulus");
        };
        assert_relative_eq!(radius, 0.5, epsilon = 1e-12);
        assert_relative_eq!(wall, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_circle_from_two_halves() {
        let center = Point2::new(2.0, -1.0);
        let whole = Arc2 {
            center,
            radius: 1.5,
            start: Point2::new(3.5, -1.0),
            end: Point2::new(3.5, -1.0),
            sweep: -TAU,
        };
        let (a, b) = whole.halves();
        let l = PlanarLoop::new(vec![Segment2::Arc(a), Segment2::Arc(b)]);
        let profile = ProfileRecognizer::default().recognize(&l, &[]);
        let RecognizedProfile::Circle { position, radius } = profile else {
            panic!("expected a circle");
        };
        assert_relative_eq!(radius, 1.5, epsilon = 1e-12);
        assert_relative_eq!(position.location.x, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_eccentric_annulus_is_arbitrary() {
        let outer = Profile::circle(1.0).unwrap();
        let inner = Profile::circle(0.2).unwrap().transformed(
            &nalgebra::Matrix4::new_translation(&nalgebra::Vector3::new(0.5, 0.0, 0.0)),
        );
        let (outer, _) = flatten(&outer);
        let (void, _) = flatten(&inner);
        let profile = ProfileRecognizer::default().recognize(&outer, &[void]);
        let RecognizedProfile::Arbitrary { voids, .. } = profile else {
            panic!("expected an arbitrary profile");
        };
        assert!(voids[0].signed_area() < 0.0);
    }

    #[test]
    fn test_i_shape_sharp_and_filleted() {
        let recognizer = ProfileRecognizer::default();
        for fillet in [None, Some(0.012)] {
            let (outer, voids) = flatten(&Profile::i_shape(0.2, 0.4, 0.01, 0.02, fillet).unwrap());
            let RecognizedProfile::IShape {
                position,
                overall_width,
                overall_depth,
                web_thickness,
                flange_thickness,
                fillet_radius,
            } = recognizer.recognize(&outer.reversed(), &voids)
            else {
                panic!("fillet {fillet:?} not recognized");
            };
            assert_relative_eq!(overall_width, 0.2, epsilon = 1e-9);
            assert_relative_eq!(overall_depth, 0.4, epsilon = 1e-9);
            assert_relative_eq!(web_thickness, 0.01, epsilon = 1e-9);
            assert_relative_eq!(flange_thickness, 0.02, epsilon = 1e-9);
            assert_eq!(fillet_radius.is_some(), fillet.is_some());
            assert_relative_eq!(position.location.x, 0.0, epsilon = 1e-9);
            assert_relative_eq!(position.ref_direction.x, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_asymmetric_i_is_arbitrary() {
        // Top flange thicker than the bottom one
        let corners = [
            (-0.1, -0.2),
            (0.1, -0.2),
            (0.1, -0.18),
            (0.005, -0.18),
            (0.005, 0.15),
            (0.1, 0.15),
            (0.1, 0.2),
            (-0.1, 0.2),
            (-0.1, 0.15),
            (-0.005, 0.15),
            (-0.005, -0.18),
            (-0.1, -0.18),
        ]
        .map(|(x, y)| Point2::new(x, y));
        let profile = ProfileRecognizer::default().recognize(&PlanarLoop::polygon(&corners), &[]);
        assert_eq!(profile.kind(), "arbitrary");
    }
}
