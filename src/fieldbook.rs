//! A read-only view over raw field records.
//!
//! Instrument formats are not parsed here. A parser only needs to implement [`FieldRecords`] to
//! feed a [`Fieldbook`], which groups the records by station setup so that calculations can be
//! fed from it.

use crate::observation::{PolarObservation, Station};
use crate::point::Point;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One line of a field book.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FieldRecord {
    /// A station setup; observations that follow belong to it.
    Station(PolarObservation),
    Observation(PolarObservation),
    /// A point with known coordinates.
    Coordinate(Point),
}

impl From<PolarObservation> for FieldRecord {
    fn from(observation: PolarObservation) -> Self {
        if observation.is_station() {
            FieldRecord::Station(observation)
        } else {
            FieldRecord::Observation(observation)
        }
    }
}

impl From<Point> for FieldRecord {
    fn from(point: Point) -> Self {
        FieldRecord::Coordinate(point)
    }
}

/// Anything that produces a sequence of raw field records.
pub trait FieldRecords {
    fn field_records(&self) -> impl Iterator<Item = FieldRecord> + '_;
}

impl FieldRecords for [FieldRecord] {
    fn field_records(&self) -> impl Iterator<Item = FieldRecord> + '_ {
        self.iter().cloned()
    }
}

impl FieldRecords for Vec<FieldRecord> {
    fn field_records(&self) -> impl Iterator<Item = FieldRecord> + '_ {
        self.as_slice().field_records()
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Setup {
    station: PolarObservation,
    observations: Vec<PolarObservation>,
}

/// Field records grouped by station setup, plus the known coordinates.
///
/// ```rust
/// use surveyor::{Angle, FieldRecord, Fieldbook, Point, PolarObservation};
///
/// let records = vec![
///     FieldRecord::from(Point::new("5241", 646414.44, 211712.77)),
///     FieldRecord::from(PolarObservation::setup("5247")),
///     FieldRecord::from(PolarObservation::new("5241").with_hz(Angle::from_dms("245-23-41").unwrap())),
///     FieldRecord::from(PolarObservation::new("111").with_hz(Angle::from_dms("241-26-57").unwrap())),
/// ];
/// let book = Fieldbook::from_records(&records);
/// assert_eq!(book.observations("5247").len(), 2);
/// // only 5241 has known coordinates
/// assert_eq!(book.orientation_references("5247").len(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fieldbook {
    coordinates: Vec<Point>,
    setups: Vec<Setup>,
}

impl Fieldbook {
    /// Groups `records` under their preceding station setup.
    ///
    /// A later coordinate record of the same point replaces the earlier one. Observations before
    /// the first station setup are dropped.
    pub fn from_records<R: FieldRecords + ?Sized>(records: &R) -> Self {
        let mut book = Self::default();
        let mut dropped = 0;
        for record in records.field_records() {
            match record {
                FieldRecord::Coordinate(point) => {
                    match book.coordinates.iter_mut().find(|p| p.id == point.id) {
                        Some(known) => *known = point,
                        None => book.coordinates.push(point),
                    }
                }
                FieldRecord::Station(station) => book.setups.push(Setup {
                    station,
                    observations: Vec::new(),
                }),
                FieldRecord::Observation(observation) => match book.setups.last_mut() {
                    Some(setup) => setup.observations.push(observation),
                    None => dropped += 1,
                },
            }
        }
        if dropped > 0 {
            tracing::warn!(dropped, "observations before the first station setup ignored");
        }
        tracing::debug!(
            points = book.coordinates.len(),
            stations = book.setups.len(),
            "read field book"
        );
        book
    }

    /// All points with known coordinates.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.coordinates
    }

    #[must_use]
    pub fn point(&self, id: &str) -> Option<&Point> {
        self.coordinates.iter().find(|p| p.id == id)
    }

    fn setup(&self, station_id: &str) -> Option<&Setup> {
        self.setups.iter().find(|s| s.station.point_id == station_id)
    }

    /// The first setup on `station_id` as a [`Station`], located at its known coordinates if any.
    #[must_use]
    pub fn station(&self, station_id: &str) -> Option<Station> {
        let setup = self.setup(station_id)?;
        let p = self
            .point(station_id)
            .cloned()
            .unwrap_or_else(|| Point::unknown(station_id));
        Some(Station::new(p, setup.station.clone()))
    }

    /// Observations taken from the first setup on `station_id`.
    #[must_use]
    pub fn observations(&self, station_id: &str) -> &[PolarObservation] {
        self.setup(station_id)
            .map_or(&[], |setup| setup.observations.as_slice())
    }

    #[must_use]
    pub fn observation(&self, station_id: &str, target_id: &str) -> Option<&PolarObservation> {
        self.observations(station_id)
            .iter()
            .find(|o| o.point_id == target_id)
    }

    /// Directions from `station_id` to points with known coordinates, paired with those points.
    #[must_use]
    pub fn orientation_references(&self, station_id: &str) -> Vec<(Point, PolarObservation)> {
        self.observations(station_id)
            .iter()
            .filter(|o| o.hz.is_some())
            .filter_map(|o| {
                let target = self.point(&o.point_id).filter(|p| p.is_known())?;
                Some((target.clone(), o.clone()))
            })
            .collect()
    }
}
