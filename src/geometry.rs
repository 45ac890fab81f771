//! Plane geometry on surveyed points: distances, bearings, line and circle intersections.
//!
//! Directions are bearings measured clockwise from grid north, so a direction `b` points along
//! (sin b, cos b) in (easting, northing).

use crate::angle::Angle;
use crate::distance::Distance;
use crate::error::{Error, Result};
use crate::point::Point;
use crate::{Point2, Vector2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Determinant below which two rays are considered parallel.
pub const PARALLEL_TOLERANCE: f64 = 1e-10;

/// Horizontal distance between two points.
pub fn distance2d(p1: &Point, p2: &Point) -> Result<Distance> {
    let a = p1.position()?;
    let b = p2.position()?;
    Ok(Distance::horizontal(nalgebra::distance(&a, &b)))
}

/// Spatial distance between two points; both need an elevation.
pub fn distance3d(p1: &Point, p2: &Point) -> Result<Distance> {
    let horizontal = distance2d(p1, p2)?.meters();
    let z1 = p1.z.ok_or_else(|| Error::MissingCoordinates(p1.id.clone()))?;
    let z2 = p2.z.ok_or_else(|| Error::MissingCoordinates(p2.id.clone()))?;
    Ok(Distance::slope(horizontal.hypot(z2 - z1)))
}

/// Bearing (whole circle azimuth) from `p1` to `p2`.
///
/// The bearing from a point to itself is defined to be 0.
pub fn bearing(p1: &Point, p2: &Point) -> Result<Angle> {
    Ok(bearing_between(p1.position()?, p2.position()?))
}

pub(crate) fn bearing_between(from: Point2, to: Point2) -> Angle {
    let delta = to - from;
    if delta.x == 0. && delta.y == 0. {
        return Angle::default();
    }
    Angle::from_radians(delta.x.atan2(delta.y))
}

pub(crate) fn direction(b: Angle) -> Vector2 {
    let (sin, cos) = b.radians().sin_cos();
    Vector2::new(sin, cos)
}

/// Intersects the line through `p1` with bearing `b1` and the line through `p2` with bearing
/// `b2`, returning the (easting, northing) of the intersection.
///
/// Parallel (including reciprocal) lines have no intersection and yield `Ok(None)`.
pub fn intersect_lines(
    p1: &Point,
    b1: Angle,
    p2: &Point,
    b2: Angle,
) -> Result<Option<(f64, f64)>> {
    let intersection = intersect_rays(p1.position()?, b1, p2.position()?, b2, PARALLEL_TOLERANCE);
    Ok(intersection.map(|p| (p.x, p.y)))
}

pub(crate) fn intersect_rays(
    p1: Point2,
    b1: Angle,
    p2: Point2,
    b2: Angle,
    tolerance: f64,
) -> Option<Point2> {
    let d1 = direction(b1);
    let d2 = direction(b2);
    let det = d1.perp(&d2);
    if det.abs() < tolerance {
        return None;
    }
    let offset = p2 - p1;
    let t = offset.perp(&d2) / det;
    Some(p1 + d1 * t)
}

/// A circle in the plane.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Circle {
    center: Point2,
    radius: f64,
}

impl Circle {
    /// Constructs a circle from its center and a positive radius.
    pub fn new(center: &Point, radius: f64) -> Result<Self> {
        if !(radius.is_finite() && radius > 0.) {
            return Err(Error::DegenerateGeometry(format!(
                "circle radius must be positive, got {radius}"
            )));
        }
        Ok(Self {
            center: center.position()?,
            radius,
        })
    }

    /// Constructs the circle passing through three points.
    ///
    /// Collinear or coincident points do not determine a circle.
    pub fn through_points(p1: &Point, p2: &Point, p3: &Point) -> Result<Self> {
        let a = p1.position()?;
        let b = p2.position()? - a;
        let c = p3.position()? - a;
        let det = 2. * b.perp(&c);
        if det.abs() <= 1e-12 * b.norm() * c.norm() {
            return Err(Error::DegenerateGeometry(format!(
                "points {}, {} and {} are collinear",
                p1.id, p2.id, p3.id
            )));
        }
        let (b2, c2) = (b.norm_squared(), c.norm_squared());
        let center = Vector2::new(c.y * b2 - b.y * c2, b.x * c2 - c.x * b2) / det;
        Ok(Self {
            center: a + center,
            radius: center.norm(),
        })
    }

    /// Constructs the circle through `p1` and `p2` on which the chord `p1`-`p2` subtends the
    /// inscribed angle `alpha`.
    ///
    /// Of the two such circles, the one whose center lies to the right of the chord when looking
    /// from `p1` to `p2` is returned (for `alpha` below 90°), which is the side an observer
    /// measuring clockwise directions from `p1` to `p2` stands on.
    pub fn from_chord(p1: &Point, p2: &Point, alpha: Angle) -> Result<Self> {
        Self::from_chord_positions(p1.position()?, p2.position()?, alpha)
    }

    pub(crate) fn from_chord_positions(p1: Point2, p2: Point2, alpha: Angle) -> Result<Self> {
        let half = nalgebra::distance(&p1, &p2) / 2.;
        if half == 0. {
            return Err(Error::DegenerateGeometry(
                "chord endpoints coincide".to_owned(),
            ));
        }
        let (sin, cos) = alpha.radians().sin_cos();
        if sin.abs() < 1e-9 {
            return Err(Error::DegenerateGeometry(format!(
                "inscribed angle {alpha} does not determine a circle"
            )));
        }
        let h = half * cos / sin;
        let quarter_turn = Angle::from_radians(std::f64::consts::FRAC_PI_2);
        let normal = direction(bearing_between(p1, p2) + quarter_turn);
        let midpoint = nalgebra::center(&p1, &p2);
        Ok(Self {
            center: midpoint + normal * h,
            radius: half / sin.abs(),
        })
    }

    /// The center as (easting, northing).
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (self.center.x, self.center.y)
    }

    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Intersects two circles.
    ///
    /// Returns either no points (separate, nested or concentric circles) or two points, which
    /// coincide for touching circles.
    #[must_use]
    pub fn intersect(&self, other: &Circle) -> Vec<(f64, f64)> {
        self.intersection_points(other)
            .into_iter()
            .map(|p| (p.x, p.y))
            .collect()
    }

    pub(crate) fn intersection_points(&self, other: &Circle) -> Vec<Point2> {
        let (r1, r2) = (self.radius, other.radius);
        let offset = other.center - self.center;
        let d = offset.norm();
        if d < 1e-9 * (r1 + r2) || d > r1 + r2 || d < (r1 - r2).abs() {
            return Vec::new();
        }
        let a = (r1 * r1 - r2 * r2 + d * d) / (2. * d);
        let h = (r1 * r1 - a * a).max(0.).sqrt();
        let unit = offset / d;
        let m = self.center + unit * a;
        vec![
            Point2::new(m.x + h * unit.y, m.y - h * unit.x),
            Point2::new(m.x - h * unit.y, m.y + h * unit.x),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::{bearing, distance2d, distance3d, intersect_lines, Circle};
    use crate::angle::{Angle, AngleUnit};
    use crate::error::Error;
    use crate::point::Point;
    use approx::assert_relative_eq;
    use quickcheck::quickcheck;
    use rstest::rstest;

    fn d(degrees: f64) -> Angle {
        Angle::new(degrees, AngleUnit::Degree)
    }

    #[test]
    fn distances_and_bearing() {
        let p1 = Point::new("1", 100., 200.).with_z(20.);
        let p2 = Point::new("2", 150., 250.).with_z(30.);
        assert_relative_eq!(distance2d(&p1, &p2).unwrap().meters(), 70.71068, epsilon = 1e-5);
        assert_relative_eq!(distance3d(&p1, &p2).unwrap().meters(), 71.41428, epsilon = 1e-5);
        assert_eq!(bearing(&p1, &p2).unwrap().to_dms(), "45-00-00");
        assert_eq!(bearing(&p2, &p1).unwrap().to_dms(), "225-00-00");
        assert_eq!(bearing(&p1, &p1).unwrap().to_dms(), "0-00-00");
    }

    #[test]
    fn distance3d_needs_elevations() {
        let p1 = Point::new("1", 100., 200.).with_z(20.);
        let p2 = Point::new("2", 150., 250.);
        assert_eq!(
            distance3d(&p1, &p2),
            Err(Error::MissingCoordinates("2".to_owned()))
        );
    }

    #[rstest]
    #[case((0., 0.), (0., 10.), 0.)]
    #[case((0., 0.), (10., 0.), 90.)]
    #[case((0., 0.), (0., -10.), 180.)]
    #[case((0., 0.), (-10., 0.), 270.)]
    #[case((5., 5.), (0., 0.), 225.)]
    fn bearing_is_clockwise_from_north(
        #[case] from: (f64, f64),
        #[case] to: (f64, f64),
        #[case] expected: f64,
    ) {
        let b = bearing(&Point::new("a", from.0, from.1), &Point::new("b", to.0, to.1)).unwrap();
        assert_relative_eq!(b, d(expected));
    }

    #[test]
    fn intersects_lines() {
        let (e, n) = intersect_lines(
            &Point::new("1", 100., 200.),
            d(25.),
            &Point::new("2", 150., 250.),
            d(310.),
        )
        .unwrap()
        .unwrap();
        assert_relative_eq!(e, 130.8201, epsilon = 1e-4);
        assert_relative_eq!(n, 266.0939, epsilon = 1e-4);
    }

    #[rstest]
    #[case(45., 225.)]
    #[case(45., 45.)]
    fn parallel_lines_do_not_intersect(#[case] b1: f64, #[case] b2: f64) {
        let intersection = intersect_lines(
            &Point::new("1", 0., 0.),
            d(b1),
            &Point::new("2", 100., 100.),
            d(b2),
        )
        .unwrap();
        assert_eq!(intersection, None);
    }

    #[test]
    fn circle_through_three_points() {
        let c = Circle::through_points(
            &Point::new("1", 0., 50.),
            &Point::new("2", 50., 100.),
            &Point::new("3", 100., 50.),
        )
        .unwrap();
        let (e, n) = c.center();
        assert_relative_eq!(e, 50., epsilon = 1e-9);
        assert_relative_eq!(n, 50., epsilon = 1e-9);
        assert_relative_eq!(c.radius(), 50., epsilon = 1e-9);
    }

    #[test]
    fn collinear_points_have_no_circle() {
        let c = Circle::through_points(
            &Point::new("1", 0., 0.),
            &Point::new("2", 1., 1.),
            &Point::new("3", 2., 2.),
        );
        assert!(matches!(c, Err(Error::DegenerateGeometry(_))));
    }

    #[test]
    fn circle_from_chord_and_inscribed_angle() {
        let c = Circle::from_chord(
            &Point::new("1", 100., 100.),
            &Point::new("2", 0., 100.),
            d(60.),
        )
        .unwrap();
        let (e, n) = c.center();
        assert_relative_eq!(e, 50., epsilon = 1e-4);
        assert_relative_eq!(n, 128.8675, epsilon = 1e-4);
        assert_relative_eq!(c.radius(), 57.7350, epsilon = 1e-4);
    }

    #[rstest]
    #[case(0.)]
    #[case(180.)]
    fn straight_inscribed_angle_is_degenerate(#[case] alpha: f64) {
        let c = Circle::from_chord(&Point::new("1", 0., 0.), &Point::new("2", 10., 0.), d(alpha));
        assert!(matches!(c, Err(Error::DegenerateGeometry(_))));
    }

    #[test]
    fn circle_needs_positive_radius() {
        assert!(Circle::new(&Point::new("c", 0., 0.), 0.).is_err());
        assert!(Circle::new(&Point::new("c", 0., 0.), f64::NAN).is_err());
        assert!(Circle::new(&Point::unknown("c"), 1.).is_err());
    }

    #[test]
    fn circles_intersect_in_two_points() {
        let c1 = Circle::new(&Point::new("1", 0., 0.), 5.).unwrap();
        let c2 = Circle::new(&Point::new("2", 8., 0.), 5.).unwrap();
        let mut points = c1.intersect(&c2);
        points.sort_by(|a, b| a.1.total_cmp(&b.1));
        assert_eq!(points.len(), 2);
        assert_relative_eq!(points[0].0, 4., epsilon = 1e-12);
        assert_relative_eq!(points[0].1, -3., epsilon = 1e-12);
        assert_relative_eq!(points[1].0, 4., epsilon = 1e-12);
        assert_relative_eq!(points[1].1, 3., epsilon = 1e-12);
    }

    #[rstest]
    #[case((20., 0.), 5.)]
    #[case((1., 0.), 1.)]
    #[case((0., 0.), 3.)]
    fn separate_nested_or_concentric_circles_do_not_intersect(
        #[case] center: (f64, f64),
        #[case] radius: f64,
    ) {
        let c1 = Circle::new(&Point::new("1", 0., 0.), 5.).unwrap();
        let c2 = Circle::new(&Point::new("2", center.0, center.1), radius).unwrap();
        assert!(c1.intersect(&c2).is_empty());
    }

    quickcheck! {
        fn reverse_bearing_differs_by_half_turn(e1: i32, n1: i32, e2: i32, n2: i32) -> bool {
            let p1 = Point::new("1", f64::from(e1), f64::from(n1));
            let p2 = Point::new("2", f64::from(e2), f64::from(n2));
            if (e1, n1) == (e2, n2) {
                return true;
            }
            let forward = bearing(&p1, &p2).unwrap();
            let reverse = bearing(&p2, &p1).unwrap();
            approx::abs_diff_eq!(forward, reverse + d(180.), epsilon = 1e-9)
        }
    }
}
