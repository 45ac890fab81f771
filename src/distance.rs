use crate::angle::Angle;
use crate::error::{Error, Result};
use uom::si::f64::Length;
use uom::si::length::meter;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The physical meaning of a measured [`Distance`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DistanceKind {
    /// Slope (slant) distance along the line of sight.
    #[cfg_attr(feature = "serde", serde(rename = "SD"))]
    Slope,
    /// Distance projected onto the horizontal plane.
    #[cfg_attr(feature = "serde", serde(rename = "HD"))]
    Horizontal,
    /// Height difference along the plumb line.
    #[cfg_attr(feature = "serde", serde(rename = "VD"))]
    Vertical,
}

/// A measured length together with its [`DistanceKind`].
///
/// Conversions between kinds need the zenith angle of the line of sight, measured from straight
/// up: a horizontal line of sight has a zenith angle of 90°.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Distance {
    length: Length,
    kind: DistanceKind,
}

impl Distance {
    /// Constructs a distance of `meters` of the given kind.
    #[must_use]
    pub fn new(meters: f64, kind: DistanceKind) -> Self {
        Self {
            length: Length::new::<meter>(meters),
            kind,
        }
    }

    /// Constructs a horizontal distance.
    #[must_use]
    pub fn horizontal(meters: f64) -> Self {
        Self::new(meters, DistanceKind::Horizontal)
    }

    /// Constructs a slope distance.
    #[must_use]
    pub fn slope(meters: f64) -> Self {
        Self::new(meters, DistanceKind::Slope)
    }

    #[must_use]
    pub fn kind(&self) -> DistanceKind {
        self.kind
    }

    #[must_use]
    pub fn length(&self) -> Length {
        self.length
    }

    /// The distance in meters.
    #[must_use]
    pub fn meters(&self) -> f64 {
        self.length.get::<meter>()
    }

    /// Converts this distance into `kind` using the zenith angle of the line of sight.
    ///
    /// Converting into the same kind returns the distance unchanged. Conversions that would
    /// divide by zero (eg, a horizontal distance measured along a vertical line of sight) fail
    /// with [`Error::DegenerateGeometry`].
    pub fn to_kind(&self, kind: DistanceKind, zenith: Angle) -> Result<Distance> {
        let d = self.meters();
        let v = zenith.radians();
        if self.kind == kind {
            return Ok(*self);
        }
        let converted = match (self.kind, kind) {
            (DistanceKind::Slope, DistanceKind::Horizontal) => d * v.sin(),
            (DistanceKind::Slope, DistanceKind::Vertical) => d * v.cos(),
            (DistanceKind::Horizontal, DistanceKind::Slope) => divide(d, v.sin())?,
            (DistanceKind::Horizontal, DistanceKind::Vertical) => divide(d, v.tan())?,
            (DistanceKind::Vertical, DistanceKind::Slope) => divide(d, v.cos())?,
            (DistanceKind::Vertical, DistanceKind::Horizontal) => {
                if v.cos().abs() < f64::EPSILON {
                    return Err(degenerate(self.kind, kind));
                }
                d * v.tan()
            }
            (DistanceKind::Slope, DistanceKind::Slope)
            | (DistanceKind::Horizontal, DistanceKind::Horizontal)
            | (DistanceKind::Vertical, DistanceKind::Vertical) => d,
        };
        if !converted.is_finite() {
            return Err(degenerate(self.kind, kind));
        }
        Ok(Distance::new(converted, kind))
    }
}

fn divide(d: f64, by: f64) -> Result<f64> {
    if by.abs() < f64::EPSILON {
        Err(Error::DegenerateGeometry(
            "distance conversion along a degenerate zenith angle".to_owned(),
        ))
    } else {
        Ok(d / by)
    }
}

fn degenerate(from: DistanceKind, to: DistanceKind) -> Error {
    Error::DegenerateGeometry(format!(
        "cannot convert {from:?} distance into {to:?} distance at this zenith angle"
    ))
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for Distance {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        // sub-millimeter
        0.000_01
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.kind == other.kind && self.meters().abs_diff_eq(&other.meters(), epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for Distance {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.kind == other.kind
            && self
                .meters()
                .relative_eq(&other.meters(), epsilon, max_relative)
    }
}

#[cfg(test)]
mod tests {
    use super::{Distance, DistanceKind};
    use crate::angle::{Angle, AngleUnit};
    use crate::error::Error;
    use approx::{assert_relative_eq, assert_relative_ne};
    use rstest::rstest;

    fn d(degrees: f64) -> Angle {
        Angle::new(degrees, AngleUnit::Degree)
    }

    #[rstest]
    #[case(DistanceKind::Slope, 20., DistanceKind::Horizontal, 45., 14.142_135_623_730_951)]
    #[case(DistanceKind::Slope, 20., DistanceKind::Vertical, 45., 14.142_135_623_730_951)]
    #[case(DistanceKind::Slope, 20., DistanceKind::Vertical, 120., -10.)]
    #[case(DistanceKind::Horizontal, 10., DistanceKind::Slope, 30., 20.)]
    #[case(DistanceKind::Horizontal, 10., DistanceKind::Vertical, 45., 10.)]
    #[case(DistanceKind::Vertical, 10., DistanceKind::Slope, 60., 20.)]
    #[case(DistanceKind::Vertical, 10., DistanceKind::Horizontal, 45., 10.)]
    #[case(DistanceKind::Horizontal, 123.42, DistanceKind::Horizontal, 0., 123.42)]
    fn converts_between_kinds(
        #[case] from: DistanceKind,
        #[case] value: f64,
        #[case] to: DistanceKind,
        #[case] zenith: f64,
        #[case] expected: f64,
    ) {
        let converted = Distance::new(value, from).to_kind(to, d(zenith)).unwrap();
        assert_eq!(converted.kind(), to);
        assert_relative_eq!(converted.meters(), expected, epsilon = 1e-9);
    }

    #[rstest]
    #[case(DistanceKind::Horizontal, DistanceKind::Slope, 0.)]
    #[case(DistanceKind::Horizontal, DistanceKind::Vertical, 0.)]
    #[case(DistanceKind::Vertical, DistanceKind::Slope, 90.)]
    #[case(DistanceKind::Vertical, DistanceKind::Horizontal, 90.)]
    fn rejects_division_by_zero(
        #[case] from: DistanceKind,
        #[case] to: DistanceKind,
        #[case] zenith: f64,
    ) {
        assert!(matches!(
            Distance::new(10., from).to_kind(to, d(zenith)),
            Err(Error::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn horizontal_line_of_sight_has_no_height() {
        let vd = Distance::slope(50.)
            .to_kind(DistanceKind::Vertical, d(90.))
            .unwrap();
        assert_relative_eq!(vd.meters(), 0., epsilon = 1e-12);
    }

    #[test]
    fn compares_kind_as_well_as_length() {
        assert_relative_eq!(Distance::horizontal(1.), Distance::horizontal(1. + 1e-12));
        assert_relative_ne!(Distance::horizontal(1.), Distance::slope(1.));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_kind_abbreviation() {
        insta::assert_snapshot!(
            serde_yaml::to_string(&Distance::horizontal(12.5)).unwrap(),
            @r"
        length: 12.5
        kind: HD
        "
        );
    }
}
