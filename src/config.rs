use crate::angle::DisplayUnit;
use crate::geometry::PARALLEL_TOLERANCE;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Settings shared by all calculations.
///
/// None of these change the mathematics of a calculation except for the two tolerances, which
/// decide when a geometric configuration is treated as having no (or a spurious) solution.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Unit angles are rendered in for the result log and display rows.
    pub display_unit: DisplayUnit,
    /// A resection candidate closer than this to the middle control point (in both easting and
    /// northing) is taken to be that control point and discarded.
    pub resection_tolerance: f64,
    /// Rays whose direction determinant is below this are parallel.
    pub parallel_tolerance: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display_unit: DisplayUnit::Dms,
            resection_tolerance: 0.1,
            parallel_tolerance: PARALLEL_TOLERANCE,
        }
    }
}
