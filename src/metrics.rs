//! Cellwise comparison metrics for transition matrices (small + explicit).
//!
//! These helpers compare an estimated chain against a reference chain:
//!
//! - they operate on raw matrix views, so counts and probability matrices
//!   are both accepted,
//! - they surface the exact scalar computed (and what it is *not*).

use crate::{Error, Result};
use ndarray::ArrayView2;

/// Pearson chi-square statistic \(\sum_{ij} (o_{ij} - e_{ij})^2 / e_{ij}\)
/// over paired cells of two same-shape matrices.
///
/// - `observed` must be finite and nonnegative; `expected` must be finite and
///   strictly positive (it divides).
/// - This is the raw statistic, **not** a p-value; no degrees-of-freedom
///   correction is applied.
pub fn chi_square_statistic(observed: &ArrayView2<f64>, expected: &ArrayView2<f64>) -> Result<f64> {
    if observed.shape() != expected.shape() {
        return Err(Error::ShapeMismatch {
            left: (observed.nrows(), observed.ncols()),
            right: (expected.nrows(), expected.ncols()),
        });
    }
    if observed.is_empty() {
        return Err(Error::Domain("observed and expected must be non-empty"));
    }
    if observed.iter().any(|&x| x < 0.0 || !x.is_finite()) {
        return Err(Error::Domain("observed must be finite and nonnegative"));
    }
    if expected.iter().any(|&x| x <= 0.0 || !x.is_finite()) {
        return Err(Error::Domain("expected must be finite and positive"));
    }

    let mut stat = 0.0f64;
    for (o, e) in observed.iter().zip(expected.iter()) {
        let d = o - e;
        stat += d * d / e;
    }
    Ok(stat)
}

/// Maximum absolute cellwise deviation \(\max_{ij} |a_{ij} - b_{ij}|\).
///
/// The convergence signal for estimated chains: as the observation sequence
/// grows, the deviation of the estimate from its source shrinks.
pub fn max_abs_deviation(a: &ArrayView2<f64>, b: &ArrayView2<f64>) -> Result<f64> {
    if a.shape() != b.shape() {
        return Err(Error::ShapeMismatch {
            left: (a.nrows(), a.ncols()),
            right: (b.nrows(), b.ncols()),
        });
    }
    if a.is_empty() {
        return Err(Error::Domain("a and b must be non-empty"));
    }
    if a.iter().any(|x| !x.is_finite()) || b.iter().any(|x| !x.is_finite()) {
        return Err(Error::Domain("a and b must be finite"));
    }

    let mut worst = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let d = (x - y).abs();
        if d > worst {
            worst = d;
        }
    }
    Ok(worst)
}
