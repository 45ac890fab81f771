//! This library provides the calculations of everyday land surveying for people who would rather
//! stake out a site than re-derive a resection.
//!
//! Everything works on planar grid coordinates (easting, northing and, where relevant, elevation)
//! and on [`PolarObservation`]s as recorded by a total station: a horizontal direction, a zenith
//! angle and a distance, any of which may be missing. Angles are carried as [`Angle`]s so that
//! degrees, gon and radians are never mixed up, and are normalized to [0°, 360°).
//!
//! The calculations live on [`Calculation`], which carries the [`Config`] they run with:
//!
//! - [orientation](Calculation::orientation) of a station from directions to known points,
//! - [polar points](Calculation::polar_point) from an oriented station,
//! - [intersection](Calculation::intersection) of directions from two oriented stations,
//! - [resection](Calculation::resection) of a station from directions to three known points,
//! - [traverse adjustment](Calculation::traverse) (see [`traverse`]).
//!
//! Fitting coordinate [transformations](transformation) between two systems from common points
//! is independent of any station.
//!
//! Next to their typed result, calculations narrate what they computed into a [`ResultLog`] owned
//! by the caller, formatted for the configured [`DisplayUnit`]. The same lines are emitted as
//! `tracing` events.
//!
//! # Examples
//!
//! Orient a station on three known points and locate a new point from it:
//!
//! ```
//! use surveyor::{Angle, Calculation, Config, Distance, Point, PolarObservation, ResultLog, Station};
//!
//! let calculation = Calculation::new(Config::default());
//! let mut log = ResultLog::new();
//!
//! let direction = |target: &str, dms: &str| {
//!     PolarObservation::new(target).with_hz(Angle::from_dms(dms).unwrap())
//! };
//! let references = [
//!     (Point::new("5241", 646414.44, 211712.77), direction("5241", "245-23-41")),
//!     (Point::new("5245", 646938.71, 212635.92), direction("5245", "141-56-11")),
//!     (Point::new("5246", 646380.61, 212793.97), direction("5246", "67-47-14")),
//! ];
//! let station = Station::at(Point::new("5247", 646381.14, 212476.49));
//! let orientation = calculation.orientation(&station, &references, &mut log)?;
//! assert_eq!(orientation.angle.to_dms(), "292-06-34");
//!
//! let station = station.with_orientation(orientation.angle);
//! let shot = direction("111", "241-26-57").with_distance(Distance::horizontal(123.42));
//! let new_point = calculation.polar_point(&station, &shot, &mut log)?.point;
//! assert!((new_point.e.unwrap() - 646394.986).abs() < 1e-3);
//! assert!((new_point.n.unwrap() - 212353.849).abs() < 1e-3);
//!
//! assert_eq!(log.lines()[0], "Orientation - 5247");
//! # Ok::<(), surveyor::Error>(())
//! ```

mod angle;
mod calculation;
mod config;
mod distance;
mod error;
mod fieldbook;
mod geometry;
mod log;
mod observation;
mod point;
mod solver;
mod util;

pub mod transformation;
pub mod traverse;

pub(crate) type Point2 = nalgebra::Point2<f64>;
pub(crate) type Vector2 = nalgebra::Vector2<f64>;

pub use angle::{Angle, AngleUnit, DisplayUnit};
pub use calculation::{
    Calculation, Intersection, Orientation, OrientationResidual, PolarPoint, Resection,
};
pub use config::Config;
pub use distance::{Distance, DistanceKind};
pub use error::{Error, Result};
pub use fieldbook::{FieldRecord, FieldRecords, Fieldbook};
pub use geometry::{bearing, distance2d, distance3d, intersect_lines, Circle, PARALLEL_TOLERANCE};
pub use log::ResultLog;
pub use observation::{PolarObservation, Station};
pub use point::Point;
pub use solver::gauss_jordan;
