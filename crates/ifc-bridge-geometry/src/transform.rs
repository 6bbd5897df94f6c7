// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Placement and transformation-operator matrices

use crate::triangulation::plane_basis;
use nalgebra::{Matrix4, Point2, Point3, Vector2, Vector3};

/// Matrix with the given axes as columns and `origin` as translation
pub fn frame_matrix(
    x: &Vector3<f64>,
    y: &Vector3<f64>,
    z: &Vector3<f64>,
    origin: &Point3<f64>,
) -> Matrix4<f64> {
    Matrix4::new(
        x.x, y.x, z.x, origin.x, x.y, y.y, z.y, origin.y, x.z, y.z, z.z, origin.z, 0.0, 0.0, 0.0,
        1.0,
    )
}

/// Orthonormal X axis from a reference direction, perpendicular to `z`
fn orthogonal_x(z: &Vector3<f64>, reference: Option<&Vector3<f64>>) -> Vector3<f64> {
    let reference = reference.copied().unwrap_or_else(Vector3::x);
    (reference - z * reference.dot(z))
        .try_normalize(1e-12)
        .unwrap_or_else(|| plane_basis(Point3::origin(), z).x_axis)
}

/// IfcAxis2Placement3D; Z defaults to +Z and X to +X
pub fn axis2_placement_3d(
    location: Point3<f64>,
    axis: Option<Vector3<f64>>,
    ref_direction: Option<Vector3<f64>>,
) -> Matrix4<f64> {
    let z = axis
        .and_then(|a| a.try_normalize(1e-12))
        .unwrap_or_else(Vector3::z);
    let x = orthogonal_x(&z, ref_direction.as_ref());
    let y = z.cross(&x);
    frame_matrix(&x, &y, &z, &location)
}

/// IfcAxis2Placement2D lifted into the XY plane
pub fn axis2_placement_2d(location: Point2<f64>, ref_direction: Option<Vector2<f64>>) -> Matrix4<f64> {
    let x = ref_direction
        .and_then(|d| d.try_normalize(1e-12))
        .unwrap_or_else(Vector2::x);
    frame_matrix(
        &Vector3::new(x.x, x.y, 0.0),
        &Vector3::new(-x.y, x.x, 0.0),
        &Vector3::z(),
        &Point3::new(location.x, location.y, 0.0),
    )
}

/// Scale factors of a Cartesian transformation operator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatorScale {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl OperatorScale {
    /// Uniform scale; a missing scale means 1
    pub fn uniform(scale: Option<f64>) -> Self {
        let s = scale.unwrap_or(1.0);
        Self { x: s, y: s, z: s }
    }

    /// Non-uniform scale; missing Y and Z factors follow X
    pub fn non_uniform(scale: Option<f64>, scale2: Option<f64>, scale3: Option<f64>) -> Self {
        let s = scale.unwrap_or(1.0);
        Self {
            x: s,
            y: scale2.unwrap_or(s),
            z: scale3.unwrap_or(s),
        }
    }
}

/// IfcCartesianTransformationOperator3D (uniform or not)
///
/// Axis3 fixes Z first; Axis1 gives X, orthogonalised against it. When only
/// Axis1 and Axis2 are given, Z is their cross product.
pub fn transformation_operator_3d(
    origin: Point3<f64>,
    axis1: Option<Vector3<f64>>,
    axis2: Option<Vector3<f64>>,
    axis3: Option<Vector3<f64>>,
    scale: OperatorScale,
) -> Matrix4<f64> {
    let z = axis3
        .and_then(|a| a.try_normalize(1e-12))
        .or_else(|| {
            let x = axis1.unwrap_or_else(Vector3::x);
            axis2.and_then(|y| x.cross(&y).try_normalize(1e-12))
        })
        .unwrap_or_else(Vector3::z);
    let x = orthogonal_x(&z, axis1.as_ref());
    let y = z.cross(&x);
    frame_matrix(&(x * scale.x), &(y * scale.y), &(z * scale.z), &origin)
}

/// IfcCartesianTransformationOperator2D (uniform or not)
pub fn transformation_operator_2d(
    origin: Point2<f64>,
    axis1: Option<Vector2<f64>>,
    axis2: Option<Vector2<f64>>,
    scale: OperatorScale,
) -> Matrix4<f64> {
    let x = axis1
        .and_then(|d| d.try_normalize(1e-12))
        .unwrap_or_else(Vector2::x);
    let mut y = Vector2::new(-x.y, x.x);
    // A declared Y axis on the other side mirrors the operator
    if axis2.is_some_and(|a| a.dot(&y) < 0.0) {
        y = -y;
    }
    frame_matrix(
        &Vector3::new(x.x * scale.x, x.y * scale.x, 0.0),
        &Vector3::new(y.x * scale.y, y.y * scale.y, 0.0),
        &Vector3::z(),
        &Point3::new(origin.x, origin.y, 0.0),
    )
}

/// True when the transform flips handedness
pub fn is_mirroring(m: &Matrix4<f64>) -> bool {
    m.fixed_view::<3, 3>(0, 0).into_owned().determinant() < 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_placement_is_translation() {
        let m = axis2_placement_3d(Point3::new(1.0, 2.0, 3.0), None, None);
        assert_eq!(m, Matrix4::new_translation(&Vector3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_skewed_ref_direction_is_orthogonalised() {
        let m = axis2_placement_3d(
            Point3::origin(),
            Some(Vector3::new(0.0, 0.0, 2.0)),
            Some(Vector3::new(1.0, 0.0, 1.0)),
        );
        let x = m.transform_vector(&Vector3::x());
        assert_relative_eq!(x, Vector3::x(), epsilon = 1e-12);

        // Parallel reference falls back to some perpendicular axis
        let m = axis2_placement_3d(Point3::origin(), Some(Vector3::z()), Some(Vector3::z()));
        assert_relative_eq!(m.transform_vector(&Vector3::x()).dot(&Vector3::z()), 0.0);
    }

    #[test]
    fn test_placement_2d_rotates() {
        let m = axis2_placement_2d(Point2::new(1.0, 0.0), Some(Vector2::new(0.0, 1.0)));
        let p = m.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(1.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_non_uniform_operator_scales_axes() {
        let m = transformation_operator_3d(
            Point3::origin(),
            None,
            None,
            None,
            OperatorScale::non_uniform(Some(2.0), Some(3.0), None),
        );
        let p = m.transform_point(&Point3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(p, Point3::new(2.0, 3.0, 2.0));
        assert!(!is_mirroring(&m));
    }

    #[test]
    fn test_mirrored_2d_operator() {
        let m = transformation_operator_2d(
            Point2::origin(),
            Some(Vector2::x()),
            Some(-Vector2::y()),
            OperatorScale::uniform(None),
        );
        assert!(is_mirroring(&m));
    }
}
