//! Planar coordinate transformations fitted to common points.
//!
//! Every model is fitted from a list of `(source, destination)` point pairs and implements
//! [`Transformation`], which maps source coordinates into the destination system.
//!
//! ```rust
//! use surveyor::{Point, transformation::{OrthogonalTransformation, Transformation}};
//!
//! let pairs = [
//!     (Point::new("1", 0., 0.), Point::new("1", 1000., 2000.)),
//!     (Point::new("2", 100., 0.), Point::new("2", 1000., 2100.)),
//! ];
//! let fit = OrthogonalTransformation::fit(&pairs).unwrap();
//! let moved = fit.apply(&Point::new("3", 0., 100.)).unwrap();
//! assert!((moved.e.unwrap() - 900.).abs() < 1e-9);
//! assert!((moved.n.unwrap() - 2000.).abs() < 1e-9);
//! ```

use crate::angle::Angle;
use crate::error::{Error, Result};
use crate::point::Point;
use crate::solver::gauss_jordan;
use crate::{Point2, Vector2};
use nalgebra::{DMatrix, DVector, Matrix3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Below this (relative to `Σe²·Σn²`) the source points of an affine fit are collinear.
const COLLINEARITY_TOLERANCE: f64 = 1e-12;

/// A fitted mapping from source to destination coordinates.
pub trait Transformation {
    /// Maps source `(e, n)` to destination `(E, N)`.
    fn transform(&self, e: f64, n: f64) -> (f64, f64);

    /// Returns `point` with its horizontal coordinates transformed.
    ///
    /// Everything except the easting and northing is kept.
    fn apply(&self, point: &Point) -> Result<Point> {
        let position = point.position()?;
        let (e, n) = self.transform(position.x, position.y);
        Ok(point.moved_to(e, n))
    }

    /// Residuals `destination - transform(source)` of the given pairs, and their RMS.
    fn residuals(&self, pairs: &[(Point, Point)]) -> Result<Residuals> {
        let residuals = pairs
            .iter()
            .map(|(source, destination)| {
                let source = source.position()?;
                let target = destination.position()?;
                let (e, n) = self.transform(source.x, source.y);
                Ok(Residual {
                    point_id: destination.id.clone(),
                    de: target.x - e,
                    dn: target.y - n,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let rms = if residuals.is_empty() {
            0.
        } else {
            (residuals.iter().map(|r| r.de * r.de + r.dn * r.dn).sum::<f64>()
                / residuals.len() as f64)
                .sqrt()
        };
        Ok(Residuals { residuals, rms })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Residual {
    pub point_id: String,
    pub de: f64,
    pub dn: f64,
}

impl Residual {
    #[must_use]
    pub fn length(&self) -> f64 {
        self.de.hypot(self.dn)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Residuals {
    pub residuals: Vec<Residual>,
    /// Root mean square of the residual lengths.
    pub rms: f64,
}

fn positions(pairs: &[(Point, Point)], required: usize) -> Result<Vec<(Point2, Point2)>> {
    if pairs.len() < required {
        return Err(Error::NotEnoughPoints {
            required,
            actual: pairs.len(),
        });
    }
    pairs
        .iter()
        .map(|(source, destination)| Ok((source.position()?, destination.position()?)))
        .collect()
}

fn centroids(pairs: &[(Point2, Point2)]) -> (Point2, Point2) {
    let count = pairs.len() as f64;
    let (source, destination) = pairs.iter().fold(
        (Vector2::zeros(), Vector2::zeros()),
        |(s, d), (source, destination)| (s + source.coords, d + destination.coords),
    );
    (Point2::from(source / count), Point2::from(destination / count))
}

/// Similarity (Helmert) transformation with four parameters:
///
/// ```text
/// E = E0 + c·e − d·n
/// N = N0 + d·e + c·n
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrthogonalTransformation {
    pub e0: f64,
    pub n0: f64,
    pub c: f64,
    pub d: f64,
}

impl OrthogonalTransformation {
    /// Least-squares fit to at least two pairs whose source points do not all coincide.
    pub fn fit(pairs: &[(Point, Point)]) -> Result<Self> {
        let pairs = positions(pairs, 2)?;
        let (source, destination) = centroids(&pairs);
        let (mut s1, mut s2, mut s3) = (0., 0., 0.);
        for (from, to) in &pairs {
            let from = from - source;
            let to = to - destination;
            s1 += from.dot(&to);
            s2 += from.perp(&to);
            s3 += from.norm_squared();
        }
        if s3 == 0. {
            return Err(Error::DegenerateGeometry(
                "all source points coincide".to_owned(),
            ));
        }
        let c = s1 / s3;
        let d = s2 / s3;
        let fit = Self {
            e0: destination.x - c * source.x + d * source.y,
            n0: destination.y - c * source.y - d * source.x,
            c,
            d,
        };
        tracing::debug!(?fit, points = pairs.len(), "fitted orthogonal transformation");
        Ok(fit)
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.c.hypot(self.d)
    }

    #[must_use]
    pub fn rotation(&self) -> Angle {
        Angle::from_radians(self.d.atan2(self.c))
    }
}

impl Transformation for OrthogonalTransformation {
    fn transform(&self, e: f64, n: f64) -> (f64, f64) {
        (
            self.e0 + self.c * e - self.d * n,
            self.n0 + self.d * e + self.c * n,
        )
    }
}

/// Rigid transformation (rotation and shift, unit scale):
///
/// ```text
/// E = E0 + cos α·e − sin α·n
/// N = N0 + sin α·e + cos α·n
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Orthogonal3Transformation {
    pub e0: f64,
    pub n0: f64,
    /// Rotation in radians.
    pub alpha: f64,
}

impl Orthogonal3Transformation {
    /// Fits the model with one linearized least-squares step from the four-parameter solution.
    pub fn fit(pairs: &[(Point, Point)]) -> Result<Self> {
        let seed = OrthogonalTransformation::fit(pairs)?;
        let alpha = seed.d.atan2(seed.c);
        let (sin, cos) = alpha.sin_cos();

        let mut normal = Matrix3::<f64>::zeros();
        let mut rhs = Vector3::<f64>::zeros();
        for (source, destination) in positions(pairs, 2)? {
            let (e, n) = (source.x, source.y);
            // partial derivatives of (E, N) by alpha
            let w1 = -e * sin - n * cos;
            let w2 = e * cos - n * sin;
            let w3 = destination.x - (seed.e0 + e * cos - n * sin);
            let w4 = destination.y - (seed.n0 + e * sin + n * cos);
            normal += Matrix3::new(1., 0., w1, 0., 1., w2, w1, w2, w1 * w1 + w2 * w2);
            rhs += Vector3::new(w3, w4, w1 * w3 + w2 * w4);
        }
        let (x, _) = gauss_jordan(
            DMatrix::from_column_slice(3, 3, normal.as_slice()),
            DVector::from_column_slice(rhs.as_slice()),
        )?;

        let fit = Self {
            e0: seed.e0 + x[0],
            n0: seed.n0 + x[1],
            alpha: alpha + x[2],
        };
        tracing::debug!(?fit, "fitted three parameter orthogonal transformation");
        Ok(fit)
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        1.
    }

    #[must_use]
    pub fn rotation(&self) -> Angle {
        Angle::from_radians(self.alpha)
    }
}

impl Transformation for Orthogonal3Transformation {
    fn transform(&self, e: f64, n: f64) -> (f64, f64) {
        let (sin, cos) = self.alpha.sin_cos();
        (self.e0 + cos * e - sin * n, self.n0 + sin * e + cos * n)
    }
}

/// Affine transformation with six parameters:
///
/// ```text
/// E = E0 + a·e + b·n
/// N = N0 + c·e + d·n
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AffineTransformation {
    pub e0: f64,
    pub n0: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl AffineTransformation {
    /// Least-squares fit to at least three pairs with non-collinear source points.
    pub fn fit(pairs: &[(Point, Point)]) -> Result<Self> {
        let pairs = positions(pairs, 3)?;
        let (source, destination) = centroids(&pairs);
        let (mut ee, mut nn, mut en) = (0., 0., 0.);
        let (mut e_e, mut n_e, mut e_n, mut n_n) = (0., 0., 0., 0.);
        for (from, to) in &pairs {
            let from = from - source;
            let to = to - destination;
            ee += from.x * from.x;
            nn += from.y * from.y;
            en += from.x * from.y;
            e_e += from.x * to.x;
            n_e += from.y * to.x;
            e_n += from.x * to.y;
            n_n += from.y * to.y;
        }
        let w = ee * nn - en * en;
        if w.abs() <= COLLINEARITY_TOLERANCE * ee * nn {
            return Err(Error::DegenerateGeometry(
                "source points are collinear".to_owned(),
            ));
        }
        let a = (e_e * nn - n_e * en) / w;
        let b = (n_e * ee - e_e * en) / w;
        let c = (e_n * nn - n_n * en) / w;
        let d = (n_n * ee - e_n * en) / w;
        let fit = Self {
            e0: destination.x - a * source.x - b * source.y,
            n0: destination.y - c * source.x - d * source.y,
            a,
            b,
            c,
            d,
        };
        tracing::debug!(?fit, points = pairs.len(), "fitted affine transformation");
        Ok(fit)
    }
}

impl Transformation for AffineTransformation {
    fn transform(&self, e: f64, n: f64) -> (f64, f64) {
        (
            self.e0 + self.a * e + self.b * n,
            self.n0 + self.c * e + self.d * n,
        )
    }
}

/// Rubber sheet transformation: a bivariate polynomial of degree 3, 4 or 5 per axis, applied to
/// coordinates reduced to the centroids of the common points.
///
/// Coefficient `i` belongs to the `i`th monomial `e^k·n^j` with `j + k ≤ degree`, ordered by
/// `j` and then by `k`: `1, e, e², e³, n, e·n, e²·n, n², e·n², n³` for degree 3.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PolynomialTransformation {
    pub degree: usize,
    pub coefficients_e: DVector<f64>,
    pub coefficients_n: DVector<f64>,
    pub source_centroid: (f64, f64),
    pub destination_centroid: (f64, f64),
}

impl PolynomialTransformation {
    /// Number of coefficients per axis for a polynomial of `degree`.
    #[must_use]
    pub fn unknowns(degree: usize) -> usize {
        (degree + 1) * (degree + 2) / 2
    }

    pub fn fit(pairs: &[(Point, Point)], degree: usize) -> Result<Self> {
        if !(3..=5).contains(&degree) {
            return Err(Error::UnsupportedDegree(degree));
        }
        let unknowns = Self::unknowns(degree);
        let pairs = positions(pairs, unknowns)?;
        let (source, destination) = centroids(&pairs);
        // reduced coordinates are divided by their RMS to keep the normal matrix near unity
        let spread = (pairs
            .iter()
            .map(|(from, _)| (from - source).norm_squared())
            .sum::<f64>()
            / (2 * pairs.len()) as f64)
            .sqrt();
        let spread = if spread > 0. { spread } else { 1. };

        let mut design = DMatrix::zeros(pairs.len(), unknowns);
        let mut observed_e = DVector::zeros(pairs.len());
        let mut observed_n = DVector::zeros(pairs.len());
        for (row, (from, to)) in pairs.iter().enumerate() {
            let from = (from - source) / spread;
            for (column, value) in monomials(degree, from.x, from.y).enumerate() {
                design[(row, column)] = value;
            }
            observed_e[row] = to.x - destination.x;
            observed_n[row] = to.y - destination.y;
        }

        let normal = design.tr_mul(&design);
        let (mut coefficients_e, _) = gauss_jordan(normal.clone(), design.tr_mul(&observed_e))?;
        let (mut coefficients_n, _) = gauss_jordan(normal, design.tr_mul(&observed_n))?;
        for (i, (k, j)) in exponents(degree).enumerate() {
            let unscale = spread.powi(k + j);
            coefficients_e[i] /= unscale;
            coefficients_n[i] /= unscale;
        }
        tracing::debug!(degree, points = pairs.len(), "fitted polynomial transformation");
        Ok(Self {
            degree,
            coefficients_e,
            coefficients_n,
            source_centroid: (source.x, source.y),
            destination_centroid: (destination.x, destination.y),
        })
    }
}

impl Transformation for PolynomialTransformation {
    fn transform(&self, e: f64, n: f64) -> (f64, f64) {
        let e = e - self.source_centroid.0;
        let n = n - self.source_centroid.1;
        let (de, dn) = monomials(self.degree, e, n)
            .zip(self.coefficients_e.iter().zip(self.coefficients_n.iter()))
            .fold((0., 0.), |(de, dn), (m, (ce, cn))| (de + ce * m, dn + cn * m));
        (
            self.destination_centroid.0 + de,
            self.destination_centroid.1 + dn,
        )
    }
}

/// Exponents `(k, j)` of the monomials `e^k·n^j`, in coefficient order.
fn exponents(degree: usize) -> impl Iterator<Item = (i32, i32)> {
    let degree = degree as i32;
    (0..=degree).flat_map(move |j| (0..=degree - j).map(move |k| (k, j)))
}

fn monomials(degree: usize, e: f64, n: f64) -> impl Iterator<Item = f64> {
    exponents(degree).map(move |(k, j)| e.powi(k) * n.powi(j))
}
