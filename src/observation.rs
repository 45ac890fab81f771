use crate::angle::Angle;
use crate::distance::{Distance, DistanceKind};
use crate::error::{Error, Result};
use crate::point::Point;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A polar observation taken by a total station.
///
/// Every measured quantity is optional since field books routinely hold partial observations (eg,
/// a direction without a distance). The record either describes an observed target, or, with
/// [`PolarObservation::station`] set, the setup of the instrument itself. In the latter case `hz`
/// holds the orientation of the station once known and `ih` holds the instrument height.
///
/// ```rust
/// use surveyor::{Angle, Distance, PolarObservation};
///
/// let obs = PolarObservation::new("112")
///     .with_hz(Angle::from_dms("69-16-28").unwrap())
///     .with_distance(Distance::horizontal(253.25));
/// assert_eq!(obs.horizontal_distance().unwrap().meters(), 253.25);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PolarObservation {
    /// Id of the observed point, or of the station for a setup record.
    pub point_id: String,
    /// Set on station setup records.
    pub station: Option<String>,
    /// Horizontal direction.
    pub hz: Option<Angle>,
    /// Zenith angle.
    pub v: Option<Angle>,
    pub d: Option<Distance>,
    /// Instrument height.
    pub ih: Option<f64>,
    /// Target (prism) height.
    pub th: Option<f64>,
    pub pc: Option<String>,
}

impl PolarObservation {
    /// Constructs an observation of `point_id` with no measured quantities.
    #[must_use]
    pub fn new(point_id: impl Into<String>) -> Self {
        Self {
            point_id: point_id.into(),
            ..Default::default()
        }
    }

    /// Constructs the setup record of a station.
    #[must_use]
    pub fn setup(station_id: impl Into<String>) -> Self {
        let id = station_id.into();
        Self {
            station: Some("station".to_owned()),
            point_id: id,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_hz(mut self, hz: Angle) -> Self {
        self.hz = Some(hz);
        self
    }

    #[must_use]
    pub fn with_v(mut self, v: Angle) -> Self {
        self.v = Some(v);
        self
    }

    #[must_use]
    pub fn with_distance(mut self, d: Distance) -> Self {
        self.d = Some(d);
        self
    }

    #[must_use]
    pub fn with_instrument_height(mut self, ih: f64) -> Self {
        self.ih = Some(ih);
        self
    }

    #[must_use]
    pub fn with_target_height(mut self, th: f64) -> Self {
        self.th = Some(th);
        self
    }

    #[must_use]
    pub fn with_code(mut self, pc: impl Into<String>) -> Self {
        self.pc = Some(pc.into());
        self
    }

    /// Returns `true` for station setup records.
    #[must_use]
    pub fn is_station(&self) -> bool {
        self.station.is_some()
    }

    /// Horizontal distance to the target.
    ///
    /// Horizontal distances are returned as is; slope distances need the zenith angle. Returns
    /// `None` if there is no distance, or if it cannot be reduced to the horizontal.
    #[must_use]
    pub fn horizontal_distance(&self) -> Option<Distance> {
        let d = self.d?;
        match d.kind() {
            DistanceKind::Horizontal => Some(d),
            _ => d.to_kind(DistanceKind::Horizontal, self.v?).ok(),
        }
    }

    /// Height difference between the instrument and the target along the line of sight.
    #[must_use]
    pub fn vertical_distance(&self) -> Option<Distance> {
        let d = self.d?;
        match d.kind() {
            DistanceKind::Vertical => Some(d),
            _ => d.to_kind(DistanceKind::Vertical, self.v?).ok(),
        }
    }

    pub(crate) fn require_hz(&self) -> Result<Angle> {
        self.hz
            .ok_or_else(|| Error::missing(&self.point_id, "horizontal angle"))
    }

    pub(crate) fn require_horizontal_distance(&self) -> Result<Distance> {
        self.horizontal_distance()
            .ok_or_else(|| Error::missing(&self.point_id, "horizontal distance"))
    }

    pub(crate) fn code_or_dash(&self) -> &str {
        self.pc.as_deref().unwrap_or("-")
    }
}

/// A survey station: its point, and the setup record observed on it.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Station {
    pub p: Point,
    pub o: PolarObservation,
}

impl Station {
    #[must_use]
    pub fn new(p: Point, o: PolarObservation) -> Self {
        Self { p, o }
    }

    /// Constructs a station at `p` with a bare setup record.
    #[must_use]
    pub fn at(p: Point) -> Self {
        let o = PolarObservation::setup(p.id.clone());
        Self { p, o }
    }

    /// The resolved orientation of the station, if any.
    #[must_use]
    pub fn orientation(&self) -> Option<Angle> {
        self.o.hz
    }

    /// Stores a resolved orientation angle on the station.
    pub fn set_orientation(&mut self, orientation: Angle) {
        self.o.hz = Some(orientation);
    }

    #[must_use]
    pub fn with_orientation(mut self, orientation: Angle) -> Self {
        self.set_orientation(orientation);
        self
    }

    pub(crate) fn require_orientation(&self) -> Result<Angle> {
        self.o
            .hz
            .ok_or_else(|| Error::missing(&self.p.id, "station orientation"))
    }
}
