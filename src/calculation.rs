use crate::angle::{Angle, DisplayUnit, HALF_TURN_SECONDS, RHO_SECONDS};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::geometry::{self, Circle};
use crate::log::ResultLog;
use crate::observation::{PolarObservation, Station};
use crate::point::Point;

/// Width of a result log column.
pub(crate) const COLUMN: usize = 12;

/// Entry point to the surveying calculations.
///
/// A `Calculation` only carries its [`Config`]; it holds no other state, so a single instance
/// can serve any number of (concurrent) calculations as long as each is handed its own
/// [`ResultLog`].
///
/// ```rust
/// use surveyor::{Angle, Calculation, Config, Point, PolarObservation, ResultLog, Station};
///
/// let calc = Calculation::new(Config::default());
/// let mut log = ResultLog::new();
/// let station = Station::at(Point::new("5247", 5693.45, 328.81));
/// let refs = [
///     (Point::new("1", 6002.13, 1001.13), "268-14-13"),
///     (Point::new("2", 5511.25, -253.16), "80-57-34"),
///     (Point::new("3", 5033.45, -396.15), "105-53-19"),
/// ]
/// .map(|(p, hz)| {
///     let obs = PolarObservation::new(p.id.clone()).with_hz(Angle::from_dms(hz).unwrap());
///     (p, obs)
/// });
/// let orientation = calc.orientation(&station, &refs, &mut log).unwrap();
/// assert_eq!(orientation.angle.to_dms(), "116-25-30");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Calculation {
    config: Config,
}

/// Averaged orientation of a station and how well each reference direction agrees with it.
#[derive(Clone, Debug, PartialEq)]
pub struct Orientation {
    pub angle: Angle,
    pub residuals: Vec<OrientationResidual>,
}

/// One reference direction of an [`Orientation`].
#[derive(Clone, Debug, PartialEq)]
pub struct OrientationResidual {
    pub point_id: String,
    pub pc: Option<String>,
    /// The measured direction.
    pub hz: Angle,
    /// Grid bearing from the station to the reference.
    pub bearing: Angle,
    /// Orientation implied by this reference alone (`bearing - hz`).
    pub correction: Angle,
    pub distance: f64,
    /// Deviation of `correction` from the averaged orientation, in arc seconds within ±180°.
    pub angular_error: f64,
    /// `angular_error` as a lateral offset at the reference, in meters.
    pub linear_error: f64,
}

/// A point located by a single polar observation.
#[derive(Clone, Debug, PartialEq)]
pub struct PolarPoint {
    pub point: Point,
    pub bearing: Angle,
    pub horizontal_distance: f64,
}

/// A point located by two intersecting directions.
#[derive(Clone, Debug, PartialEq)]
pub struct Intersection {
    pub point: Point,
    pub bearing1: Angle,
    pub bearing2: Angle,
}

/// A station located by directions to three control points.
#[derive(Clone, Debug, PartialEq)]
pub struct Resection {
    pub point: Point,
    /// Angle between the directions to the first and second control point.
    pub alpha: Angle,
    /// Angle between the directions to the second and third control point.
    pub beta: Angle,
    /// Display rows: the three control points followed by the resolved station.
    pub rows: Vec<Vec<String>>,
}

impl OrientationResidual {
    /// Display row: id, code, direction, bearing, orientation, distance, angular and linear error.
    #[must_use]
    pub fn row(&self, unit: DisplayUnit) -> Vec<String> {
        vec![
            self.point_id.clone(),
            self.pc.clone().unwrap_or_else(|| "-".to_owned()),
            self.hz.format(unit),
            self.bearing.format(unit),
            self.correction.format(unit),
            format!("{:.3}", self.distance),
            small_angle(unit, self.angular_error / RHO_SECONDS),
            format!("{:.3}", self.linear_error),
        ]
    }
}

impl PolarPoint {
    /// Display row: id, code, easting, northing, elevation, bearing and horizontal distance.
    #[must_use]
    pub fn row(&self, unit: DisplayUnit) -> Vec<String> {
        let mut row = coordinate_row(&self.point);
        row.push(
            self.point
                .z
                .map_or_else(|| "-".to_owned(), |z| format!("{z:.3}")),
        );
        row.push(self.bearing.format(unit));
        row.push(format!("{:.3}", self.horizontal_distance));
        row
    }
}

impl Intersection {
    /// Display row: id, code, easting, northing and both bearings.
    #[must_use]
    pub fn row(&self, unit: DisplayUnit) -> Vec<String> {
        let mut row = coordinate_row(&self.point);
        row.push(self.bearing1.format(unit));
        row.push(self.bearing2.format(unit));
        row
    }
}

fn coordinate_row(p: &Point) -> Vec<String> {
    let coordinate = |c: Option<f64>| c.map_or_else(|| "-".to_owned(), |c| format!("{c:.3}"));
    vec![
        p.id.clone(),
        p.pc.clone().unwrap_or_else(|| "-".to_owned()),
        coordinate(p.e),
        coordinate(p.n),
    ]
}

/// Formats a small angle given in radians for a result log cell.
pub(crate) fn small_angle(unit: DisplayUnit, radians: f64) -> String {
    let value = unit.small_angle(radians);
    match unit {
        DisplayUnit::Radian => format!("{value:.6}"),
        DisplayUnit::Dms | DisplayUnit::Degree | DisplayUnit::Gon => format!("{value:.1}"),
    }
}

impl Calculation {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn display_unit(&self) -> DisplayUnit {
        self.config.display_unit
    }

    /// Computes the orientation of `station` from directions to known points.
    ///
    /// Every reference implies an orientation `bearing - hz`. These are averaged as unit vectors
    /// weighted by the distance to the reference, which is robust against the wrap-around at 0°
    /// and favours the longer (more precise) sights.
    ///
    /// Fails with [`Error::DegenerateGeometry`] when there are no references or all of them
    /// coincide with the station.
    pub fn orientation(
        &self,
        station: &Station,
        references: &[(Point, PolarObservation)],
        log: &mut ResultLog,
    ) -> Result<Orientation> {
        if references.is_empty() {
            return Err(Error::DegenerateGeometry(format!(
                "no reference directions for the orientation of {}",
                station.p.id
            )));
        }
        let position = station.p.position()?;

        let mut sum_sin = 0.;
        let mut sum_cos = 0.;
        let mut sum_distance = 0.;
        let mut partial = Vec::with_capacity(references.len());
        for (point, obs) in references {
            let target = point.position()?;
            let hz = obs.require_hz()?;
            let bearing = geometry::bearing_between(position, target);
            let correction = bearing - hz;
            let distance = nalgebra::distance(&position, &target);
            let (sin, cos) = correction.radians().sin_cos();
            sum_sin += sin * distance;
            sum_cos += cos * distance;
            sum_distance += distance;
            partial.push((point, obs, hz, bearing, correction, distance));
        }
        if sum_distance == 0. {
            return Err(Error::DegenerateGeometry(format!(
                "total distance to the references of {} is 0",
                station.p.id
            )));
        }
        let angle = Angle::from_radians(sum_sin.atan2(sum_cos));

        let residuals: Vec<_> = partial
            .into_iter()
            .map(|(point, obs, hz, bearing, correction, distance)| {
                let mut error = (correction.radians() - angle.radians()) * RHO_SECONDS;
                if error > HALF_TURN_SECONDS {
                    error -= 2. * HALF_TURN_SECONDS;
                }
                if error < -HALF_TURN_SECONDS {
                    error += 2. * HALF_TURN_SECONDS;
                }
                OrientationResidual {
                    point_id: point.id.clone(),
                    pc: obs.pc.clone(),
                    hz,
                    bearing,
                    correction,
                    distance,
                    angular_error: error,
                    linear_error: error / RHO_SECONDS * distance,
                }
            })
            .collect();

        tracing::debug!(
            station = %station.p.id,
            references = residuals.len(),
            orientation = %angle,
            "computed orientation"
        );

        let unit = self.display_unit();
        log.write(format!("Orientation - {}", station.p.id));
        log.write_row(
            COLUMN,
            &["Point num", "Code", "Direction", "Bearing", "Orient ang", "Distance", "e", "E(m)"],
        );
        for residual in &residuals {
            log.write_row(COLUMN, &residual.row(unit));
        }
        log.write(format!("Average orientation angle {}", angle.format(unit)));
        log.blank();

        Ok(Orientation { angle, residuals })
    }

    /// Computes the point observed from an oriented station.
    ///
    /// The elevation is only computed when the station has an elevation and an instrument
    /// height, and the observation has a zenith angle its distance can be reduced with.
    pub fn polar_point(
        &self,
        station: &Station,
        obs: &PolarObservation,
        log: &mut ResultLog,
    ) -> Result<PolarPoint> {
        let orientation = station.require_orientation()?;
        let hz = obs.require_hz()?;
        let horizontal_distance = obs.require_horizontal_distance()?.meters();
        let position = station.p.position()?;

        let bearing = orientation + hz;
        let target = position + geometry::direction(bearing) * horizontal_distance;
        let z = match (station.p.z, station.o.ih, obs.vertical_distance()) {
            (Some(z), Some(ih), Some(vd)) => Some(z + ih + vd.meters() - obs.th.unwrap_or(0.)),
            _ => None,
        };

        let point = Point {
            id: obs.point_id.clone(),
            e: Some(target.x),
            n: Some(target.y),
            z,
            pc: obs.pc.clone(),
            pt: None,
        };
        tracing::debug!(station = %station.p.id, point = %point.id, e = target.x, n = target.y, "computed polar point");

        let result = PolarPoint {
            point,
            bearing,
            horizontal_distance,
        };
        log.write(format!("Radial Survey - {}", station.p.id));
        log.write_row(
            COLUMN,
            &["Point num", "Code", "E", "N", "Z", "Bearing", "H.Distance"],
        );
        log.write_row(COLUMN, &result.row(self.display_unit()));
        log.blank();
        Ok(result)
    }

    /// Intersects the directions observed from two oriented stations.
    ///
    /// Returns `Ok(None)` when the observations are of different points or when the two
    /// directions are parallel (which includes observing each other). Missing orientations,
    /// directions or station coordinates are errors.
    pub fn intersection(
        &self,
        s1: &Station,
        obs1: &PolarObservation,
        s2: &Station,
        obs2: &PolarObservation,
        log: &mut ResultLog,
    ) -> Result<Option<Intersection>> {
        if obs1.point_id != obs2.point_id {
            tracing::debug!(
                first = %obs1.point_id,
                second = %obs2.point_id,
                "observations of different points do not intersect"
            );
            return Ok(None);
        }
        let bearing1 = s1.require_orientation()? + obs1.require_hz()?;
        let bearing2 = s2.require_orientation()? + obs2.require_hz()?;
        let Some(target) = geometry::intersect_rays(
            s1.p.position()?,
            bearing1,
            s2.p.position()?,
            bearing2,
            self.config.parallel_tolerance,
        ) else {
            tracing::debug!(point = %obs1.point_id, "directions are parallel");
            return Ok(None);
        };

        let point = Point {
            id: obs1.point_id.clone(),
            e: Some(target.x),
            n: Some(target.y),
            pc: obs1.pc.clone().or_else(|| obs2.pc.clone()),
            ..Default::default()
        };
        tracing::debug!(point = %point.id, e = target.x, n = target.y, "computed intersection");

        let result = Intersection {
            point,
            bearing1,
            bearing2,
        };
        log.write(format!("Intersection - {}, {}", s1.p.id, s2.p.id));
        log.write_row(
            COLUMN,
            &["Point num", "Code", "E", "N", "Bearing1", "Bearing2"],
        );
        log.write_row(COLUMN, &result.row(self.display_unit()));
        log.blank();
        Ok(Some(result))
    }

    /// Locates `station` from directions observed to three control points.
    ///
    /// The chord between the first two control points subtends the angle `alpha` at the
    /// station, the chord between the last two subtends `beta`. The station lies on both
    /// resulting circles, which also share the middle control point; the intersection that is not
    /// (within [`Config::resection_tolerance`]) the middle control point is the station.
    ///
    /// If the station lies on the circle through the three control points ("dangerous circle")
    /// the two circles coincide and the position is undetermined; this fails with
    /// [`Error::DegenerateGeometry`].
    pub fn resection(
        &self,
        station: &Station,
        controls: &[(Point, PolarObservation); 3],
        log: &mut ResultLog,
    ) -> Result<Resection> {
        let [(p1, obs1), (p2, obs2), (p3, obs3)] = controls;
        let (hz1, hz2, hz3) = (obs1.require_hz()?, obs2.require_hz()?, obs3.require_hz()?);
        let alpha = hz2 - hz1;
        let beta = hz3 - hz2;
        let (c1, c2, c3) = (p1.position()?, p2.position()?, p3.position()?);

        let circle1 = Circle::from_chord_positions(c1, c2, alpha)?;
        let circle2 = Circle::from_chord_positions(c2, c3, beta)?;
        let candidates = circle1.intersection_points(&circle2);
        let [first, second] = *candidates.as_slice() else {
            return Err(Error::DegenerateGeometry(format!(
                "resection of {} is on the dangerous circle of {}, {} and {}",
                station.p.id, p1.id, p2.id, p3.id
            )));
        };
        let tolerance = self.config.resection_tolerance;
        let near_middle =
            (c2.x - first.x).abs() < tolerance && (c2.y - first.y).abs() < tolerance;
        let position = if near_middle { second } else { first };
        let point = station.p.moved_to(position.x, position.y);
        tracing::debug!(station = %point.id, e = position.x, n = position.y, "computed resection");

        let unit = self.display_unit();
        let control_row = |p: &Point, obs: &PolarObservation, hz: Angle, angle: Option<Angle>| {
            let mut row = coordinate_row(p);
            row[0] = obs.point_id.clone();
            row[1] = obs.code_or_dash().to_owned();
            row.push(hz.format(unit));
            row.push(angle.map(|a| a.format(unit)).unwrap_or_default());
            row
        };
        let mut station_row = coordinate_row(&point);
        station_row.extend([String::new(), String::new()]);
        let rows = vec![
            control_row(p1, obs1, hz1, Some(alpha)),
            control_row(p2, obs2, hz2, Some(beta)),
            control_row(p3, obs3, hz3, None),
            station_row,
        ];

        log.write(format!("Resection - {}", station.p.id));
        log.write_row(
            COLUMN,
            &["Point num", "Code", "E", "N", "Direction", "Angle"],
        );
        for row in &rows {
            log.write_row(COLUMN, row);
        }
        log.blank();

        Ok(Resection {
            point,
            alpha,
            beta,
            rows,
        })
    }
}
