use crate::error::{Error, Result};
use nalgebra::{DMatrix, DVector};

/// Pivots smaller than this, relative to the original diagonal element of their row, are
/// treated as zero.
const PIVOT_TOLERANCE: f64 = 1e-13;

/// Solves `a * x = b` by Gauss-Jordan elimination, returning `x` and the inverse of `a`.
///
/// The elimination runs in place and does not pivot, so it relies on every diagonal element
/// staying non-zero as rows are eliminated. This holds for the symmetric positive definite normal
/// matrices the transformation fits produce. A vanishing pivot is reported as
/// [`Error::SingularSystem`] with the offending row rather than propagating infinities.
///
/// ```rust
/// use nalgebra::{dmatrix, dvector};
///
/// let (x, inverse) = surveyor::gauss_jordan(
///     dmatrix![2., 0.; 0., 4.],
///     dvector![2., 2.],
/// ).unwrap();
/// assert_eq!(x, dvector![1., 0.5]);
/// assert_eq!(inverse, dmatrix![0.5, 0.; 0., 0.25]);
/// ```
pub fn gauss_jordan(
    mut a: DMatrix<f64>,
    mut b: DVector<f64>,
) -> Result<(DVector<f64>, DMatrix<f64>)> {
    let size = b.len();
    if a.nrows() != size || a.ncols() != size {
        return Err(Error::DimensionMismatch {
            rows: a.nrows(),
            columns: a.ncols(),
            len: size,
        });
    }

    // the ratio of a reduced pivot to its original diagonal does not change when an unknown is
    // rescaled
    let references: Vec<f64> = (0..size)
        .map(|i| {
            let diagonal = a[(i, i)].abs();
            if diagonal == 0. {
                a.row(i).amax()
            } else {
                diagonal
            }
        })
        .collect();
    for i in 0..size {
        let pivot = a[(i, i)];
        if references[i] == 0. || pivot.abs() <= PIVOT_TOLERANCE * references[i] {
            return Err(Error::SingularSystem { row: i });
        }
        let q = 1. / pivot;
        for k in 0..size {
            a[(i, k)] = if k == i { q } else { q * a[(i, k)] };
        }
        b[i] *= q;
        for j in (0..size).filter(|&j| j != i) {
            let t = a[(j, i)];
            for k in 0..size {
                a[(j, k)] = if k == i {
                    -t * q
                } else {
                    a[(j, k)] - t * a[(i, k)]
                };
            }
            b[j] -= t * b[i];
        }
    }
    Ok((b, a))
}
