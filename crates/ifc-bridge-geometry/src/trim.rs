// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Trimming parametric curves to bounded segments

use crate::curve::{CurveSegment, ParametricCurve};
use crate::error::{Error, Result};
use crate::tolerance::ANGLE_EPSILON;
use nalgebra::Point3;
use std::f64::consts::TAU;

/// Which representation of a trim bound the file prefers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrimPreference {
    #[default]
    Parameter,
    Cartesian,
}

impl TrimPreference {
    pub fn opposite(self) -> Self {
        match self {
            TrimPreference::Parameter => TrimPreference::Cartesian,
            TrimPreference::Cartesian => TrimPreference::Parameter,
        }
    }
}

/// One trim bound; either or both forms may be present
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrimBound {
    pub parameter: Option<f64>,
    pub point: Option<Point3<f64>>,
}

impl TrimBound {
    pub fn parameter(t: f64) -> Self {
        Self {
            parameter: Some(t),
            point: None,
        }
    }

    pub fn point(p: Point3<f64>) -> Self {
        Self {
            parameter: None,
            point: Some(p),
        }
    }
}

/// Outcome of trimming
#[derive(Debug, Clone, PartialEq)]
pub enum TrimmedCurve {
    Bounded(CurveSegment),
    /// The bounds spanned more than a full revolution
    Unbounded(ParametricCurve),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrimResult {
    pub curve: TrimmedCurve,
    pub warnings: Vec<String>,
}

fn resolve_with(
    basis: &ParametricCurve,
    bound: &TrimBound,
    preference: TrimPreference,
    tolerance: f64,
) -> Option<f64> {
    match preference {
        TrimPreference::Parameter => bound.parameter,
        TrimPreference::Cartesian => bound
            .point
            .and_then(|p| basis.parameter_of(&p, tolerance)),
    }
}

/// Resolve a bound to a parameter, preferred form first
pub fn resolve_bound(
    basis: &ParametricCurve,
    bound: &TrimBound,
    preference: TrimPreference,
    tolerance: f64,
) -> Result<f64> {
    resolve_with(basis, bound, preference, tolerance)
        .or_else(|| resolve_with(basis, bound, preference.opposite(), tolerance))
        .ok_or_else(|| Error::trim("bound is neither a usable parameter nor a point on the curve"))
}

/// Trim `basis` between two bounds
///
/// For cyclic curves the arc runs counter-clockwise from `trim1` to
/// `trim2` when `sense_agreement` holds and clockwise otherwise. Line
/// bounds given against the sense flag are swapped with a warning.
pub fn trim_curve(
    basis: &ParametricCurve,
    trim1: &TrimBound,
    trim2: &TrimBound,
    sense_agreement: bool,
    preference: TrimPreference,
    tolerance: f64,
) -> Result<TrimResult> {
    let mut t1 = resolve_bound(basis, trim1, preference, tolerance)?;
    let mut t2 = resolve_bound(basis, trim2, preference, tolerance)?;
    let mut warnings = Vec::new();

    if basis.is_cyclic() {
        if (t2 - t1).abs() > TAU + ANGLE_EPSILON {
            warnings.push(format!(
                "trim span {:.6} exceeds a full revolution, curve left unbounded",
                (t2 - t1).abs()
            ));
            return Ok(TrimResult {
                curve: TrimmedCurve::Unbounded(basis.clone()),
                warnings,
            });
        }
        let segment = if sense_agreement {
            basis.segment(t1, t2)?
        } else {
            basis.segment(t2, t1)?.reversed()
        };
        return Ok(TrimResult {
            curve: TrimmedCurve::Bounded(segment),
            warnings,
        });
    }

    if (sense_agreement && t1 > t2) || (!sense_agreement && t1 < t2) {
        warnings.push(format!(
            "trim parameters {t1} and {t2} disagree with sense flag, swapped"
        ));
        std::mem::swap(&mut t1, &mut t2);
    }
    let segment = basis
        .segment(t1, t2)
        .map_err(|_| Error::degenerate("trimmed line has zero length"))?;
    Ok(TrimResult {
        curve: TrimmedCurve::Bounded(segment),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Frame;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn circle() -> ParametricCurve {
        ParametricCurve::Circle {
            frame: Frame::world(),
            radius: 2.0,
        }
    }

    fn bounded(result: TrimResult) -> CurveSegment {
        match result.curve {
            TrimmedCurve::Bounded(seg) => seg,
            TrimmedCurve::Unbounded(_) => panic!("expected bounded curve"),
        }
    }

    #[test]
    fn test_point_bounds_resolve_when_parameters_missing() {
        let t1 = TrimBound::point(Point3::new(2.0, 0.0, 0.0));
        let t2 = TrimBound::point(Point3::new(0.0, 2.0, 0.0));
        let seg = bounded(
            trim_curve(&circle(), &t1, &t2, true, TrimPreference::Parameter, 1e-6).unwrap(),
        );
        assert_relative_eq!(seg.length(), PI, epsilon = 1e-9);
    }

    #[test]
    fn test_unresolvable_bound_fails() {
        let t1 = TrimBound::point(Point3::new(5.0, 0.0, 0.0));
        let t2 = TrimBound::parameter(1.0);
        assert!(trim_curve(&circle(), &t1, &t2, true, TrimPreference::Cartesian, 1e-6).is_err());
    }

    #[test]
    fn test_against_sense_arc_runs_clockwise() {
        let seg = bounded(
            trim_curve(
                &circle(),
                &TrimBound::parameter(0.0),
                &TrimBound::parameter(FRAC_PI_2),
                false,
                TrimPreference::Parameter,
                1e-6,
            )
            .unwrap(),
        );
        // Clockwise from 0 to π/2 covers three quarters
        assert_relative_eq!(seg.length(), 3.0 * PI, epsilon = 1e-9);
        assert_relative_eq!(seg.start_point().x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(seg.end_point().y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_span_beyond_full_turn_is_unbounded() {
        let result = trim_curve(
            &circle(),
            &TrimBound::parameter(0.0),
            &TrimBound::parameter(3.0 * PI),
            true,
            TrimPreference::Parameter,
            1e-6,
        )
        .unwrap();
        assert!(matches!(result.curve, TrimmedCurve::Unbounded(_)));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_inverted_line_bounds_are_swapped() {
        let line = ParametricCurve::Line {
            origin: Point3::origin(),
            direction: Vector3::x(),
        };
        let result = trim_curve(
            &line,
            &TrimBound::parameter(4.0),
            &TrimBound::parameter(1.0),
            true,
            TrimPreference::Parameter,
            1e-6,
        )
        .unwrap();
        assert_eq!(result.warnings.len(), 1);
        let seg = bounded(result);
        assert_relative_eq!(seg.start_point().x, 1.0);
        assert_relative_eq!(seg.end_point().x, 4.0);
    }

    #[test]
    fn test_zero_length_line_is_degenerate() {
        let line = ParametricCurve::Line {
            origin: Point3::origin(),
            direction: Vector3::x(),
        };
        let err = trim_curve(
            &line,
            &TrimBound::parameter(2.0),
            &TrimBound::parameter(2.0),
            true,
            TrimPreference::Parameter,
            1e-6,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Degenerate(_)));
    }
}
