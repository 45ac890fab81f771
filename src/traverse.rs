//! Traverse adjustment.
//!
//! A traverse is a chain of stations where each station observes the previous and the next one.
//! Depending on which of its endpoints have known coordinates and a known orientation, a
//! traverse is one of:
//!
//! - **open** (free): known start point and start orientation, unknown end point;
//! - **closed with start orientation**: both endpoints known, orientation only at the start;
//! - **closed with both orientations**: both endpoints known and oriented;
//! - **inserted**: both endpoints known, neither oriented.
//!
//! The angular misclosure is only available (and distributed evenly over the angles) when both
//! ends are oriented, even if the end point itself has no coordinates. The linear misclosure is
//! distributed in proportion to leg length (compass rule) whenever the end point is known.

use crate::angle::{Angle, DisplayUnit};
use crate::calculation::{small_angle, Calculation, COLUMN};
use crate::error::{Error, Result};
use crate::geometry::{bearing_between, direction};
use crate::log::ResultLog;
use crate::observation::{PolarObservation, Station};
use crate::point::Point;
use crate::{util, Point2, Vector2};
use std::f64::consts::PI;
use std::fmt::{self, Display, Formatter};

/// One station of a traverse with its observations along the chain.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TraverseStation {
    pub station: Station,
    /// Observation of the previous station; unused at the first station.
    pub prev: Option<PolarObservation>,
    /// Observation of the next station; unused at the last station.
    pub next: Option<PolarObservation>,
}

impl TraverseStation {
    #[must_use]
    pub fn new(station: Station) -> Self {
        Self {
            station,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_prev(mut self, prev: PolarObservation) -> Self {
        self.prev = Some(prev);
        self
    }

    #[must_use]
    pub fn with_next(mut self, next: PolarObservation) -> Self {
        self.next = Some(next);
        self
    }

    fn id(&self) -> &str {
        &self.station.p.id
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TraverseKind {
    Open,
    ClosedStartOrientation,
    ClosedBothOrientations,
    Inserted,
}

impl Display for TraverseKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TraverseKind::Open => "open traverse",
            TraverseKind::ClosedStartOrientation => "closed traverse, oriented at start",
            TraverseKind::ClosedBothOrientations => "closed traverse, oriented at both ends",
            TraverseKind::Inserted => "inserted traverse",
        })
    }
}

/// The full result of a traverse adjustment.
///
/// All vectors are indexed by station. Quantities of a leg are stored at the station the leg
/// _ends_ in, so index 0 holds no leg.
#[derive(Clone, Debug, PartialEq)]
pub struct TraverseAdjustment {
    pub kind: TraverseKind,
    /// Turning angle at each station, where determined.
    pub angles: Vec<Option<Angle>>,
    /// Correction applied to each angle, in radians.
    pub angle_corrections: Vec<f64>,
    /// Horizontal length of each leg.
    pub distances: Vec<Option<f64>>,
    /// Both measurements of each leg that was measured from either end, forward first.
    pub measured_distances: Vec<Option<(f64, f64)>>,
    /// Adjusted bearing of each leg.
    pub bearings: Vec<Option<Angle>>,
    /// Unadjusted coordinate increments (dE, dN) of each leg.
    pub increments: Vec<(f64, f64)>,
    /// Compass rule corrections (vE, vN) of each leg.
    pub corrections: Vec<(f64, f64)>,
    /// `(n - 1) * 180° - Σ angles`, in radians within ±180°.
    pub angular_misclosure: Option<f64>,
    /// Difference (dE, dN) between the known end point and the unadjusted chain.
    pub linear_misclosure: Option<(f64, f64)>,
    /// Every station of the traverse with its adjusted coordinates.
    pub points: Vec<Point>,
    /// Non-fatal remarks (eg, a missing end point turning the traverse into an open one).
    pub warnings: Vec<String>,
}

impl TraverseAdjustment {
    /// Returns `true` if the end point was computed rather than known.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.kind == TraverseKind::Open
    }

    /// Total horizontal length of the traverse.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.distances.iter().flatten().sum()
    }

    /// Length of the linear misclosure vector.
    #[must_use]
    pub fn linear_error(&self) -> Option<f64> {
        self.linear_misclosure.map(|(dde, ddn)| dde.hypot(ddn))
    }

    /// The points the traverse resolved: the intermediate stations, and the end station of an
    /// open traverse.
    #[must_use]
    pub fn resolved_points(&self) -> &[Point] {
        let last = if self.is_free() {
            self.points.len()
        } else {
            self.points.len() - 1
        };
        &self.points[1..last]
    }

    /// Writes the station-by-station report.
    pub fn report(&self, unit: DisplayUnit, log: &mut ResultLog) {
        let n = self.points.len();
        log.write(format!(
            "Traverse - {} - {} ({})",
            self.points[0].id,
            self.points[n - 1].id,
            self.kind
        ));
        log.write_row(
            COLUMN,
            &["Point num", "Angle", "Corr", "Bearing", "Distance", "dE", "dN", "vE", "vN", "E", "N"],
        );
        let dash = || "-".to_owned();
        for i in 0..n {
            let point = &self.points[i];
            let (de, dn) = self.increments[i];
            let (ve, vn) = self.corrections[i];
            let leg = i > 0;
            let row = vec![
                point.id.clone(),
                self.angles[i].map_or_else(dash, |a| a.format(unit)),
                if self.angular_misclosure.is_some() {
                    small_angle(unit, self.angle_corrections[i])
                } else {
                    dash()
                },
                self.bearings[i].map_or_else(dash, |b| b.format(unit)),
                self.distances[i].map_or_else(dash, |d| format!("{d:.3}")),
                if leg { format!("{de:.3}") } else { dash() },
                if leg { format!("{dn:.3}") } else { dash() },
                if leg && !self.is_free() { format!("{ve:.3}") } else { dash() },
                if leg && !self.is_free() { format!("{vn:.3}") } else { dash() },
                point.e.map_or_else(dash, |e| format!("{e:.3}")),
                point.n.map_or_else(dash, |n| format!("{n:.3}")),
            ];
            log.write_row(COLUMN, &row);
        }
        log.blank();

        let (sum_de, sum_dn) = self
            .increments
            .iter()
            .fold((0., 0.), |(se, sn), (de, dn)| (se + de, sn + dn));
        log.write(format!(
            "Length {:.3} Sum dE {sum_de:.3} Sum dN {sum_dn:.3}",
            self.length()
        ));
        if let Some(dbeta) = self.angular_misclosure {
            log.write(format!("Angular misclosure {}", small_angle(unit, dbeta)));
        }
        if let (Some((dde, ddn)), Some(error)) = (self.linear_misclosure, self.linear_error()) {
            log.write(format!(
                "Linear misclosure dE {dde:.3} dN {ddn:.3} ({error:.3})"
            ));
        }
        log.blank();
    }
}

impl Calculation {
    /// Adjusts a traverse and returns every intermediate quantity.
    ///
    /// `force_free` ignores the coordinates and orientation of the end station, as needed when
    /// the traverse ends in a node shared with other traverses.
    ///
    /// Fails with one of the traverse precondition errors (see
    /// [`Error::is_traverse_precondition`]) when the traverse cannot be computed.
    pub fn adjust_traverse(
        &self,
        stations: &[TraverseStation],
        force_free: bool,
    ) -> Result<TraverseAdjustment> {
        self.adjust(stations, force_free, &mut Vec::new())
    }

    /// Adjusts a traverse, collecting warnings into `warnings` as they arise so that they
    /// survive a failure further on.
    fn adjust(
        &self,
        stations: &[TraverseStation],
        force_free: bool,
        warnings: &mut Vec<String>,
    ) -> Result<TraverseAdjustment> {
        let n = stations.len();
        if n < 3 {
            return Err(Error::TraverseTooShort);
        }
        let start = stations[0]
            .station
            .p
            .position()
            .map_err(|_| Error::TraverseNoStartCoordinates)?;

        let end = if force_free {
            None
        } else if let Ok(end) = stations[n - 1].station.p.position() {
            Some(end)
        } else {
            warnings.push("No coordinates for end point -> Free traverse.".to_owned());
            None
        };
        let free = end.is_none();

        let mut angles: Vec<Option<Angle>> = vec![None; n];
        let mut distances: Vec<Option<f64>> = vec![None; n];
        let mut measured_distances = vec![None; n];
        for (i, ts) in stations.iter().enumerate() {
            let prev_hz = ts.prev.as_ref().and_then(|o| o.hz);
            let next_hz = ts.next.as_ref().and_then(|o| o.hz);
            let orientation = ts.station.orientation();
            if i == 0 {
                if orientation.is_none() {
                    if free {
                        return Err(Error::TraverseUnconstrained);
                    }
                    warnings.push("No orientation on start point - inserted traverse.".to_owned());
                }
                angles[0] = orientation.zip(next_hz).map(|(o, hz)| o + hz);
            } else if i == n - 1 {
                if orientation.is_none() {
                    warnings.push("No orientation on end point.".to_owned());
                }
                angles[i] = match (orientation, angles[0], prev_hz) {
                    (Some(o), Some(_), Some(hz)) if !force_free => Some(-(o + hz)),
                    _ => None,
                };
            } else {
                let (Some(prev_hz), Some(next_hz)) = (prev_hz, next_hz) else {
                    return Err(Error::TraverseNoAngle(ts.id().to_owned()));
                };
                angles[i] = Some(next_hz - prev_hz);
            }

            if i > 0 {
                let back = ts
                    .prev
                    .as_ref()
                    .and_then(PolarObservation::horizontal_distance)
                    .map(|d| d.meters());
                match (distances[i], back) {
                    (Some(forward), Some(back)) => {
                        measured_distances[i] = Some((forward, back));
                        distances[i] = Some((forward + back) / 2.);
                    }
                    (None, Some(back)) => distances[i] = Some(back),
                    (Some(_), None) => {}
                    (None, None) => {
                        return Err(Error::TraverseNoDistance(
                            stations[i - 1].id().to_owned(),
                            ts.id().to_owned(),
                        ));
                    }
                }
            }
            if i + 1 < n {
                if let Some(forward) = ts.next.as_ref().and_then(PolarObservation::horizontal_distance) {
                    distances[i + 1] = Some(forward.meters());
                }
            }
        }
        if free && angles[0].is_none() {
            return Err(Error::TraverseUnconstrained);
        }

        let kind = match (free, angles[0].is_some(), angles[n - 1].is_some()) {
            (true, _, _) => TraverseKind::Open,
            (false, false, _) => TraverseKind::Inserted,
            (false, true, true) => TraverseKind::ClosedBothOrientations,
            (false, true, false) => TraverseKind::ClosedStartOrientation,
        };

        // an open traverse ending on an oriented station still closes in angle
        let angular_misclosure = (angles[0].is_some() && angles[n - 1].is_some()).then(|| {
            let sum: f64 = angles.iter().flatten().map(Angle::radians).sum();
            util::to_signed_range((n - 1) as f64 * PI - sum)
        });
        let angle_corrections = vec![angular_misclosure.unwrap_or(0.) / n as f64; n];

        let t: Vec<f64> = distances.iter().map(|d| d.unwrap_or(0.)).collect();
        let turn = |k: usize| angles[k].map_or(0., |a| a.radians()) + angle_corrections[k] - PI;
        let mut delta = vec![0.; n];
        let mut increments = vec![(0., 0.); n];
        for i in 1..n {
            let d = if i > 1 {
                delta[i - 1] + turn(i - 1)
            } else if let Some(first) = angles[0] {
                first.radians() + angle_corrections[0]
            } else {
                // inserted traverse: orient a provisional chain onto the known endpoints
                let end = end.ok_or(Error::TraverseUnconstrained)?;
                let mut d = 0.;
                let mut chain = Vector2::zeros();
                for k in 1..n {
                    chain += direction(Angle::from_radians(d)) * t[k];
                    if k < n - 1 {
                        d += angles[k].map_or(0., |a| a.radians()) - PI;
                    }
                }
                bearing_between(end, start).radians()
                    - bearing_between(Point2::from(chain), Point2::origin()).radians()
            };
            delta[i] = util::into_bounds(d);
            let (sin, cos) = delta[i].sin_cos();
            increments[i] = (t[i] * sin, t[i] * cos);
        }

        let (sum_de, sum_dn) = increments
            .iter()
            .fold((0., 0.), |(se, sn), (de, dn)| (se + de, sn + dn));
        let length: f64 = t.iter().sum();
        let linear_misclosure = end.map(|end| (end.x - start.x - sum_de, end.y - start.y - sum_dn));
        let (dde, ddn) = linear_misclosure.unwrap_or((0., 0.));
        let corrections: Vec<(f64, f64)> = if length > 0. {
            t.iter()
                .map(|t| (t * dde / length, t * ddn / length))
                .collect()
        } else {
            vec![(0., 0.); n]
        };

        let mut points = Vec::with_capacity(n);
        let mut position = start;
        for (i, ts) in stations.iter().enumerate() {
            if i > 0 {
                position.x += increments[i].0 + corrections[i].0;
                position.y += increments[i].1 + corrections[i].1;
            }
            points.push(ts.station.p.moved_to(position.x, position.y));
        }

        for warning in warnings.iter() {
            tracing::warn!(start = stations[0].id(), "{warning}");
        }
        tracing::debug!(
            start = stations[0].id(),
            end = stations[n - 1].id(),
            %kind,
            angular_misclosure = angular_misclosure.unwrap_or(0.),
            linear_error = dde.hypot(ddn),
            "adjusted traverse"
        );

        Ok(TraverseAdjustment {
            kind,
            angles,
            angle_corrections,
            distances,
            measured_distances,
            bearings: delta
                .iter()
                .enumerate()
                .map(|(i, &d)| (i > 0).then(|| Angle::from_radians(d)))
                .collect(),
            increments,
            corrections,
            angular_misclosure,
            linear_misclosure,
            points,
            warnings: std::mem::take(warnings),
        })
    }

    /// Adjusts a traverse, narrating the computation into `log`.
    ///
    /// Returns the resolved points (see [`TraverseAdjustment::resolved_points`]), or `None` if
    /// the traverse cannot be computed, in which case the reason is logged as an `Error:` line.
    /// Remarks that do not prevent the computation are logged as `Warning:` lines.
    pub fn traverse(
        &self,
        stations: &[TraverseStation],
        force_free: bool,
        log: &mut ResultLog,
    ) -> Option<Vec<Point>> {
        let mut warnings = Vec::new();
        match self.adjust(stations, force_free, &mut warnings) {
            Ok(adjustment) => {
                for warning in &adjustment.warnings {
                    log.write(format!("Warning: {warning}"));
                }
                adjustment.report(self.display_unit(), log);
                Some(adjustment.resolved_points().to_vec())
            }
            Err(error) => {
                tracing::warn!(%error, "traverse cannot be computed");
                for warning in &warnings {
                    log.write(format!("Warning: {warning}"));
                }
                log.write(format!("Error: {error}"));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TraverseKind, TraverseStation};
    use crate::angle::Angle;
    use crate::calculation::Calculation;
    use crate::config::Config;
    use crate::distance::Distance;
    use crate::error::Error;
    use crate::log::ResultLog;
    use crate::observation::{PolarObservation, Station};
    use crate::point::Point;
    use approx::assert_relative_eq;

    fn dms(text: &str) -> Angle {
        Angle::from_dms(text).unwrap()
    }

    fn calc() -> Calculation {
        Calculation::new(Config::default())
    }

    fn obs(target: &str, hz: &str) -> PolarObservation {
        PolarObservation::new(target).with_hz(dms(hz))
    }

    fn leg(target: &str, hz: &str, distance: f64) -> PolarObservation {
        obs(target, hz).with_distance(Distance::horizontal(distance))
    }

    fn slope_leg(target: &str, hz: &str, v: &str, distance: f64) -> PolarObservation {
        obs(target, hz)
            .with_v(dms(v))
            .with_distance(Distance::slope(distance))
    }

    fn oriented(p: Point, references: &[(Point, PolarObservation)]) -> Station {
        let station = Station::at(p);
        let orientation = calc()
            .orientation(&station, references, &mut ResultLog::new())
            .unwrap();
        station.with_orientation(orientation.angle)
    }

    fn unknown(id: &str) -> Station {
        Station::at(Point::unknown(id))
    }

    fn assert_points(actual: &[Point], expected: &[(&str, f64, f64)]) {
        assert_eq!(actual.len(), expected.len());
        for (point, &(id, e, n)) in actual.iter().zip(expected) {
            assert_relative_eq!(*point, Point::new(id, e, n), epsilon = 1e-4);
        }
    }

    fn open_traverse() -> Vec<TraverseStation> {
        let start = oriented(
            Point::new("5247", 646381.14, 212476.49),
            &[
                (Point::new("5241", 646414.44, 211712.77), obs("5241", "245-23-41")),
                (Point::new("5245", 646938.71, 212635.92), obs("5245", "141-56-11")),
                (Point::new("5246", 646380.61, 212793.97), obs("5246", "67-47-14")),
            ],
        );
        assert_eq!(start.orientation().unwrap().to_dms(), "292-06-34");
        vec![
            TraverseStation::new(start).with_next(leg("111", "241-26-57", 123.42)),
            TraverseStation::new(unknown("111"))
                .with_prev(obs("5247", "225-39-00"))
                .with_next(leg("112", "92-38-43", 142.81)),
            TraverseStation::new(unknown("112"))
                .with_prev(obs("111", "227-16-34"))
                .with_next(leg("113", "69-16-28", 253.25)),
            TraverseStation::new(unknown("113"))
                .with_prev(obs("112", "102-56-44"))
                .with_next(leg("114", "205-46-21", 214.53)),
            TraverseStation::new(unknown("114"))
                .with_prev(obs("113", "104-23-11"))
                .with_next(leg("115", "305-54-29", 234.23)),
            TraverseStation::new(unknown("115")),
        ]
    }

    #[test]
    fn open_traverse_is_free() {
        let mut log = ResultLog::new();
        let points = calc().traverse(&open_traverse(), false, &mut log).unwrap();
        assert_points(
            &points,
            &[
                ("111", 646394.9860, 212353.8491),
                ("112", 646302.1362, 212245.3429),
                ("113", 646077.3941, 212128.6100),
                ("114", 646131.5459, 211921.0270),
                ("115", 646103.4028, 211688.4938),
            ],
        );
        assert_eq!(log.lines()[0], "Warning: No coordinates for end point -> Free traverse.");
        assert_eq!(log.lines()[1], "Warning: No orientation on end point.");
        assert_eq!(log.lines()[2], "Traverse - 5247 - 115 (open traverse)");
        assert!(!log.lines().iter().any(|l| l.starts_with("Linear misclosure")));
    }

    fn closed_traverse() -> Vec<TraverseStation> {
        let p1017 = Point::new("1017", 600264.30, 149325.79);
        let k = oriented(
            Point::new("K", 599767.21, 148946.70),
            &[
                (p1017.clone(), obs("1017", "61-28-18")),
                (Point::new("1016", 600136.60, 148588.85), obs("1016", "142-53-28")),
                (Point::new("1015", 598642.17, 148436.26), obs("1015", "254-23-32")),
            ],
        );
        let v = oriented(
            Point::new("V", 599733.75, 149831.76),
            &[
                (Point::new("1018", 598258.90, 149496.78), obs("1018", "346-24-11")),
                (Point::new("1019", 600092.33, 150676.80), obs("1019", "112-12-06")),
                (p1017, obs("1017", "222-50-58")),
            ],
        );
        assert_eq!(k.orientation().unwrap().to_dms(), "351-12-05");
        assert_eq!(v.orientation().unwrap().to_dms(), "270-47-46");
        vec![
            TraverseStation::new(k).with_next(leg("1", "17-14-18", 139.82)),
            TraverseStation::new(unknown("1"))
                .with_prev(leg("K", "79-28-20", 139.85))
                .with_next(leg("2", "236-13-46", 269.32)),
            TraverseStation::new(unknown("2"))
                .with_prev(leg("1", "217-58-34", 269.36))
                .with_next(leg("3", "82-18-45", 169.40)),
            TraverseStation::new(unknown("3"))
                .with_prev(leg("2", "262-18-44", 169.45))
                .with_next(leg("V", "41-18-10", 345.90)),
            TraverseStation::new(v).with_prev(leg("3", "257-44-08", 345.94)),
        ]
    }

    #[test]
    fn closed_traverse_with_both_orientations() {
        let adjustment = calc().adjust_traverse(&closed_traverse(), false).unwrap();
        assert_eq!(adjustment.kind, TraverseKind::ClosedBothOrientations);
        assert_points(
            adjustment.resolved_points(),
            &[
                ("1", 599787.7486, 149085.0079),
                ("2", 599718.9691, 149345.3886),
                ("3", 599802.5094, 149492.7786),
            ],
        );
        assert_relative_eq!(adjustment.linear_error().unwrap(), 0.11072, epsilon = 1e-5);
        assert_eq!(adjustment.measured_distances[1], Some((139.82, 139.85)));
        assert_relative_eq!(adjustment.distances[1].unwrap(), 139.835, epsilon = 1e-9);

        // angle corrections close the angular misclosure exactly
        let dbeta = adjustment.angular_misclosure.unwrap();
        assert_relative_eq!(adjustment.angle_corrections.iter().sum::<f64>(), dbeta, epsilon = 1e-15);

        // increment columns hold the unadjusted increments, corrections are listed separately
        let mut log = ResultLog::new();
        adjustment.report(crate::angle::DisplayUnit::Dms, &mut log);
        let row: Vec<&str> = log.lines()[3].split_whitespace().collect();
        assert_eq!(row[0], "1");
        assert_eq!(row[5], format!("{:.3}", adjustment.increments[1].0));
        assert_eq!(row[6], format!("{:.3}", adjustment.increments[1].1));
        assert_eq!(row[7], format!("{:.3}", adjustment.corrections[1].0));

        // the adjusted chain ends exactly on the known end point
        let end = adjustment.points.last().unwrap();
        assert_relative_eq!(end.e.unwrap(), 599733.75, epsilon = 1e-6);
        assert_relative_eq!(end.n.unwrap(), 149831.76, epsilon = 1e-6);
    }

    fn slope_traverse(end_known: bool, start_oriented: bool) -> Vec<TraverseStation> {
        let a5 = Point::new("A5", 646333.5695, 276616.4171);
        let start = if start_oriented {
            let start = oriented(
                a5,
                &[(Point::new("A4", 646284.6886, 276659.2165), obs("A4", "311-12-21"))],
            );
            assert_eq!(start.orientation().unwrap().to_dms(), "359-59-57");
            start
        } else {
            Station::at(a5)
        };
        let end = if end_known {
            Station::at(Point::new("A11", 646502.8710, 276361.2386))
        } else {
            unknown("A11")
        };
        vec![
            TraverseStation::new(start).with_next(slope_leg("A6", "136-36-49", "100-13-22", 58.405)),
            TraverseStation::new(unknown("A6"))
                .with_prev(slope_leg("A5", "316-36-49", "79-56-53", 58.378))
                .with_next(slope_leg("A7", "136-43-52", "101-55-08", 43.917)),
            TraverseStation::new(unknown("A7"))
                .with_prev(slope_leg("A6", "316-43-52", "78-21-53", 43.878))
                .with_next(slope_leg("A8", "141-48-30", "102-29-18", 48.459)),
            TraverseStation::new(unknown("A8"))
                .with_prev(slope_leg("A7", "321-48-30", "77-49-44", 48.401))
                .with_next(slope_leg("A9", "153-25-18", "100-01-16", 47.098)),
            TraverseStation::new(unknown("A9"))
                .with_prev(slope_leg("A8", "333-25-18", "80-17-11", 47.040))
                .with_next(slope_leg("A10", "153-59-32", "97-46-19", 58.077)),
            TraverseStation::new(unknown("A10"))
                .with_prev(slope_leg("A9", "333-59-32", "82-27-53", 58.045))
                .with_next(slope_leg("A11", "154-05-41", "97-06-32", 58.188)),
            TraverseStation::new(end).with_prev(slope_leg("A10", "334-05-41", "83-09-29", 58.151)),
        ]
    }

    #[test]
    fn closed_traverse_with_start_orientation() {
        let adjustment = calc()
            .adjust_traverse(&slope_traverse(true, true), false)
            .unwrap();
        assert_eq!(adjustment.kind, TraverseKind::ClosedStartOrientation);
        assert_eq!(adjustment.angular_misclosure, None);
        assert_points(
            adjustment.resolved_points(),
            &[
                ("A6", 646373.0353, 276574.6808),
                ("A7", 646402.4768, 276543.4174),
                ("A8", 646431.7153, 276506.2621),
                ("A9", 646452.4490, 276464.8193),
                ("A10", 646477.6637, 276413.1392),
            ],
        );
        assert_relative_eq!(adjustment.linear_error().unwrap(), 0.21763, epsilon = 1e-5);
    }

    #[test]
    fn loop_traverse_without_end_coordinates() {
        let mut log = ResultLog::new();
        let points = calc()
            .traverse(&slope_traverse(false, true), false, &mut log)
            .unwrap();
        assert_points(
            &points,
            &[
                ("A6", 646373.0539, 276574.6449),
                ("A7", 646402.5093, 276543.3546),
                ("A8", 646431.7631, 276506.1698),
                ("A9", 646452.5118, 276464.6981),
                ("A10", 646477.7451, 276412.9820),
                ("A11", 646502.9712, 276361.0454),
            ],
        );
    }

    #[test]
    fn forced_free_traverse_ignores_end_point() {
        let forced = calc()
            .adjust_traverse(&slope_traverse(true, true), true)
            .unwrap();
        let open = calc()
            .adjust_traverse(&slope_traverse(false, true), false)
            .unwrap();
        assert_eq!(forced.kind, TraverseKind::Open);
        assert!(forced.warnings.iter().all(|w| !w.contains("Free traverse")));
        for (a, b) in forced.points.iter().zip(&open.points) {
            assert_relative_eq!(a.e.unwrap(), b.e.unwrap(), epsilon = 1e-9);
            assert_relative_eq!(a.n.unwrap(), b.n.unwrap(), epsilon = 1e-9);
        }
    }

    #[test]
    fn inserted_traverse() {
        let mut log = ResultLog::new();
        let adjustment = calc()
            .adjust_traverse(&slope_traverse(true, false), false)
            .unwrap();
        assert_eq!(adjustment.kind, TraverseKind::Inserted);
        assert_points(
            adjustment.resolved_points(),
            &[
                ("A6", 646373.0349, 276574.6814),
                ("A7", 646402.4761, 276543.4184),
                ("A8", 646431.7144, 276506.2634),
                ("A9", 646452.4483, 276464.8203),
                ("A10", 646477.6633, 276413.1397),
            ],
        );
        assert_relative_eq!(adjustment.linear_error().unwrap(), 0.21637, epsilon = 1e-5);
        assert_eq!(
            adjustment.warnings,
            vec![
                "No orientation on start point - inserted traverse.".to_owned(),
                "No orientation on end point.".to_owned(),
            ]
        );

        adjustment.report(crate::angle::DisplayUnit::Dms, &mut log);
        assert_eq!(log.lines()[0], "Traverse - A5 - A11 (inserted traverse)");
        // header, column titles and one row per station
        assert!(log.lines()[9].is_empty());
        assert!(log.lines()[11].starts_with("Linear misclosure"));
    }

    #[test]
    fn warnings_precede_fatal_error() {
        let stations = [
            TraverseStation::new(Station::at(Point::new("A", 0., 0.)))
                .with_next(leg("B", "90-00-00", 100.)),
            TraverseStation::new(unknown("B"))
                .with_prev(obs("A", "270-00-00"))
                .with_next(leg("C", "0-00-00", 50.)),
            TraverseStation::new(unknown("C")).with_prev(obs("B", "180-00-00")),
        ];
        let mut log = ResultLog::new();
        assert_eq!(calc().traverse(&stations, false, &mut log), None);
        insta::assert_snapshot!(log.to_string(), @r"
        Warning: No coordinates for end point -> Free traverse.
        Error: No orientation on start point and no coordinates on end point!
        ");
    }

    #[test]
    fn free_traverse_needs_start_orientation() {
        let stations = slope_traverse(false, false);
        assert_eq!(
            calc().adjust_traverse(&stations, false),
            Err(Error::TraverseUnconstrained)
        );
    }

    #[test]
    fn too_short() {
        let stations = &open_traverse()[..2];
        let mut log = ResultLog::new();
        assert_eq!(calc().traverse(stations, false, &mut log), None);
        insta::assert_snapshot!(log.to_string(), @"Error: At least 3 points must be added to traverse line!");
    }

    #[test]
    fn start_point_needs_coordinates() {
        let mut stations = open_traverse();
        stations[0].station.p.e = None;
        let error = calc().adjust_traverse(&stations, false).unwrap_err();
        assert_eq!(error, Error::TraverseNoStartCoordinates);
        assert!(error.is_traverse_precondition());
    }

    #[test]
    fn missing_angle_at_interior_station() {
        let mut stations = open_traverse();
        stations[2].prev = None;
        let mut log = ResultLog::new();
        assert_eq!(calc().traverse(&stations, false, &mut log), None);
        insta::assert_snapshot!(log.to_string(), @"Error: No angle at point 112!");
    }

    #[test]
    fn missing_distance() {
        let mut stations = open_traverse();
        stations[1].next = Some(obs("112", "92-38-43"));
        let mut log = ResultLog::new();
        assert_eq!(calc().traverse(&stations, false, &mut log), None);
        insta::assert_snapshot!(log.to_string(), @"Error: No distance between points 111 and 112!");
    }

    #[test]
    fn distance_measured_backwards_only() {
        let mut stations = open_traverse();
        stations[1].next = Some(obs("112", "92-38-43"));
        stations[2].prev = Some(leg("111", "227-16-34", 142.81));
        let points = calc()
            .adjust_traverse(&stations, false)
            .unwrap();
        assert_relative_eq!(points.points[2].e.unwrap(), 646302.1362, epsilon = 1e-4);
        assert_eq!(points.measured_distances[2], None);
    }
}
