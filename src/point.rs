use crate::error::{Error, Result};
use crate::Point2;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A surveyed point.
///
/// Planar coordinates are easting (`e`) and northing (`n`) in meters. Either may be unknown until
/// a calculation resolves the point, in which case the calculation returns a _new_ `Point` with
/// the resolved coordinates rather than modifying its input.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Point {
    pub id: String,
    pub e: Option<f64>,
    pub n: Option<f64>,
    /// Elevation.
    pub z: Option<f64>,
    /// Classification code.
    pub pc: Option<String>,
    /// Type tag (eg, `"station"` or `"control"`).
    pub pt: Option<String>,
}

impl Point {
    /// Constructs a point with known planar coordinates.
    #[must_use]
    pub fn new(id: impl Into<String>, e: f64, n: f64) -> Self {
        Self {
            id: id.into(),
            e: Some(e),
            n: Some(n),
            ..Default::default()
        }
    }

    /// Constructs a point whose coordinates are yet to be determined.
    #[must_use]
    pub fn unknown(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_z(mut self, z: f64) -> Self {
        self.z = Some(z);
        self
    }

    #[must_use]
    pub fn with_code(mut self, pc: impl Into<String>) -> Self {
        self.pc = Some(pc.into());
        self
    }

    #[must_use]
    pub fn with_type(mut self, pt: impl Into<String>) -> Self {
        self.pt = Some(pt.into());
        self
    }

    /// Returns `true` if both planar coordinates are known.
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.e.is_some() && self.n.is_some()
    }

    /// Returns a copy of this point moved to (`e`, `n`), keeping everything else.
    #[must_use]
    pub fn moved_to(&self, e: f64, n: f64) -> Self {
        Self {
            e: Some(e),
            n: Some(n),
            ..self.clone()
        }
    }

    /// Planar position as (easting, northing), failing if either is unknown.
    pub(crate) fn position(&self) -> Result<Point2> {
        match (self.e, self.n) {
            (Some(e), Some(n)) => Ok(Point2::new(e, n)),
            _ => Err(Error::MissingCoordinates(self.id.clone())),
        }
    }
}

#[cfg(any(test, feature = "approx"))]
fn option_abs_diff_eq(a: Option<f64>, b: Option<f64>, epsilon: f64) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.abs_diff_eq(&b, epsilon),
        (None, None) => true,
        _ => false,
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for Point {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        // a tenth of a millimeter
        0.000_1
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.id == other.id
            && option_abs_diff_eq(self.e, other.e, epsilon)
            && option_abs_diff_eq(self.n, other.n, epsilon)
            && option_abs_diff_eq(self.z, other.z, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for Point {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        let close = |a: Option<f64>, b: Option<f64>| match (a, b) {
            (Some(a), Some(b)) => a.relative_eq(&b, epsilon, max_relative),
            (None, None) => true,
            _ => false,
        };
        self.id == other.id
            && close(self.e, other.e)
            && close(self.n, other.n)
            && close(self.z, other.z)
    }
}
