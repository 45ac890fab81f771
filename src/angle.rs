use crate::error::{Error, Result};
use crate::util;
use std::fmt::{self, Display, Formatter};
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;
use uom::si::angle::{degree, gon, mil, radian, second};

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of arc seconds in one radian (ρ″).
pub const RHO_SECONDS: f64 = 180. * 3600. / std::f64::consts::PI;

/// Number of arc seconds in half a turn.
pub const HALF_TURN_SECONDS: f64 = 648_000.;

/// Numeric representations an [`Angle`] can be constructed from and converted to.
///
/// Degrees-minutes-seconds is a textual representation and goes through [`Angle::from_dms`] and
/// [`Angle::to_dms`] instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AngleUnit {
    Radian,
    Degree,
    /// Centesimal degrees, 400 to a full turn.
    Gon,
    /// Arc seconds.
    Second,
    /// NATO mils, 6400 to a full turn.
    Mil,
    /// `dddmm.mmmm` as used by NMEA sentences.
    Nmea,
    /// Packed sexagesimal degrees, `ddd.mmss`.
    PackedDegree,
}

/// The angle units calculation reports can be rendered in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DisplayUnit {
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "DMS"))]
    Dms,
    #[cfg_attr(feature = "serde", serde(rename = "DEG"))]
    Degree,
    #[cfg_attr(feature = "serde", serde(rename = "GON"))]
    Gon,
    #[cfg_attr(feature = "serde", serde(rename = "RAD"))]
    Radian,
}

impl DisplayUnit {
    /// Expresses a small angular quantity (a residual or a correction) in the unit surveyors
    /// read for this display unit: arc seconds for DMS and degrees, centesimal seconds (cc) for
    /// gon and plain radians for radians.
    #[must_use]
    pub fn small_angle(self, radians: f64) -> f64 {
        match self {
            DisplayUnit::Dms | DisplayUnit::Degree => radians * RHO_SECONDS,
            DisplayUnit::Gon => uom::si::f64::Angle::new::<radian>(radians).get::<gon>() * 10_000.,
            DisplayUnit::Radian => radians,
        }
    }
}

/// A horizontal or vertical angle.
///
/// The value is kept in radians and always lies in [0°, 360°). Arithmetic between angles wraps
/// back into that range, and approximate comparisons (with the `approx` feature) treat values
/// just below 360° as close to values just above 0°.
///
/// ```rust
/// use surveyor::{Angle, AngleUnit};
///
/// let angle = Angle::from_dms("359-59-59").unwrap();
/// assert_eq!(Angle::new(angle.get(AngleUnit::Gon), AngleUnit::Gon).to_dms(), "359-59-59");
/// assert_eq!((angle + Angle::from_dms("0-00-02").unwrap()).to_dms(), "0-00-01");
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Angle {
    angle: uom::si::f64::Angle,
}

impl Angle {
    /// Constructs an angle from `value` expressed in `unit`.
    #[must_use]
    pub fn new(value: f64, unit: AngleUnit) -> Self {
        let radians = match unit {
            AngleUnit::Radian => value,
            AngleUnit::Degree => uom::si::f64::Angle::new::<degree>(value).get::<radian>(),
            AngleUnit::Gon => uom::si::f64::Angle::new::<gon>(value).get::<radian>(),
            AngleUnit::Second => uom::si::f64::Angle::new::<second>(value).get::<radian>(),
            AngleUnit::Mil => uom::si::f64::Angle::new::<mil>(value).get::<radian>(),
            AngleUnit::Nmea => {
                let sign = value.signum();
                let value = value.abs();
                let degrees = (value / 100.).trunc();
                let minutes = value - degrees * 100.;
                (sign * (degrees + minutes / 60.)).to_radians()
            }
            AngleUnit::PackedDegree => {
                let sign = value.signum();
                let value = value.abs();
                let degrees = value.trunc();
                let rest = (value - degrees) * 100.;
                // 90.3 is stored as 90.2999..., which must still read as 30 minutes
                let minutes = (rest + 1e-8).trunc();
                let seconds = (rest - minutes) * 100.;
                (sign * (degrees + minutes / 60. + seconds / 3600.)).to_radians()
            }
        };
        Self::from_radians(radians)
    }

    /// Constructs an angle from radians.
    #[must_use]
    pub fn from_radians(radians: f64) -> Self {
        Self {
            angle: uom::si::f64::Angle::new::<radian>(util::into_bounds(radians)),
        }
    }

    /// Parses a degrees-minutes-seconds string such as `"116-25-30"`, `"16-20"` or
    /// `"88-41-35.8669"`. A leading `-` negates the whole angle before it is wrapped.
    pub fn from_dms(dms: &str) -> Result<Self> {
        let text = dms.trim();
        let (negative, text) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let parts: Vec<&str> = text.split('-').collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(Error::InvalidAngle(dms.to_owned()));
        }
        let mut degrees = 0.;
        for (part, divisor) in parts.iter().zip([1., 60., 3600.]) {
            let value: f64 = part
                .trim()
                .parse()
                .map_err(|_| Error::InvalidAngle(dms.to_owned()))?;
            if !value.is_finite() {
                return Err(Error::InvalidAngle(dms.to_owned()));
            }
            degrees += value / divisor;
        }
        if negative {
            degrees = -degrees;
        }
        Ok(Self::new(degrees, AngleUnit::Degree))
    }

    /// Returns the angle expressed in `unit`.
    #[must_use]
    pub fn get(&self, unit: AngleUnit) -> f64 {
        match unit {
            AngleUnit::Radian => self.radians(),
            AngleUnit::Degree => self.quantity().get::<degree>(),
            AngleUnit::Gon => self.quantity().get::<gon>(),
            AngleUnit::Second => self.quantity().get::<second>(),
            AngleUnit::Mil => self.quantity().get::<mil>(),
            AngleUnit::Nmea => {
                let degrees = self.get(AngleUnit::Degree);
                let whole = degrees.trunc();
                whole * 100. + (degrees - whole) * 60.
            }
            AngleUnit::PackedDegree => {
                let degrees = self.get(AngleUnit::Degree);
                let whole = degrees.trunc();
                let minutes = (degrees - whole) * 60.;
                let whole_minutes = minutes.trunc();
                let seconds = (minutes - whole_minutes) * 60.;
                whole + whole_minutes / 100. + seconds / 10_000.
            }
        }
    }

    /// Returns the angle in radians, in [0, 2π).
    #[must_use]
    pub fn radians(&self) -> f64 {
        // NOTE: uom may store the value differently-normalized, so normalize on output as well.
        util::into_bounds(self.angle.get::<radian>())
    }

    /// Returns the angle as a [`uom`] quantity.
    #[must_use]
    pub fn quantity(&self) -> uom::si::f64::Angle {
        uom::si::f64::Angle::new::<radian>(self.radians())
    }

    /// Returns the angle in [-180°, 180°), in radians.
    #[must_use]
    pub fn signed_radians(&self) -> f64 {
        util::to_signed_range(self.radians())
    }

    /// Formats the angle as `d-mm-ss`, rounded to the nearest whole second.
    #[must_use]
    pub fn to_dms(&self) -> String {
        let mut total = self.get(AngleUnit::Second).round() as u64;
        if total >= 360 * 3600 {
            total -= 360 * 3600;
        }
        format!(
            "{}-{:02}-{:02}",
            total / 3600,
            (total % 3600) / 60,
            total % 60
        )
    }

    /// Formats the angle for a report column in the given display unit.
    #[must_use]
    pub fn format(&self, unit: DisplayUnit) -> String {
        match unit {
            DisplayUnit::Dms => self.to_dms(),
            DisplayUnit::Degree => format!("{:.5}", self.get(AngleUnit::Degree)),
            DisplayUnit::Gon => format!("{:.4}", self.get(AngleUnit::Gon)),
            DisplayUnit::Radian => format!("{:.6}", self.radians()),
        }
    }
}

impl Default for Angle {
    fn default() -> Self {
        Self::from_radians(0.)
    }
}

impl From<uom::si::f64::Angle> for Angle {
    fn from(angle: uom::si::f64::Angle) -> Self {
        Self::from_radians(angle.get::<radian>())
    }
}

impl From<Angle> for uom::si::f64::Angle {
    fn from(angle: Angle) -> Self {
        angle.quantity()
    }
}

impl FromStr for Angle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_dms(s)
    }
}

impl Display for Angle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dms())
    }
}

impl Add for Angle {
    type Output = Angle;

    fn add(self, rhs: Self) -> Self::Output {
        Angle::from_radians(self.radians() + rhs.radians())
    }
}

impl Sub for Angle {
    type Output = Angle;

    fn sub(self, rhs: Self) -> Self::Output {
        Angle::from_radians(self.radians() - rhs.radians())
    }
}

impl Neg for Angle {
    type Output = Angle;

    fn neg(self) -> Self::Output {
        Angle::from_radians(-self.radians())
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for Angle {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        // this is very accurate in radians
        0.000_000_001
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        util::to_signed_range(self.radians() - other.radians()).abs() <= epsilon
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for Angle {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        let min = f64::min(self.radians(), other.radians());
        let max = f64::max(self.radians(), other.radians());

        f64::relative_eq(&min, &max, epsilon, max_relative)
            || f64::relative_eq(
                &(min + std::f64::consts::TAU),
                &max,
                epsilon,
                max_relative,
            )
    }
}
