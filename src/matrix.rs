#![allow(non_snake_case)]

//! Dense matrix helpers.

use nalgebra as na;
use na::{DMatrix, RealField};

use crate::error::{EstimateError, EstimateResult};

/// Relative asymmetry accepted in a covariance supplied by the caller.
const SYMMETRY_TOLERANCE: f64 = 1e-12;

/// Computes the congruence `J.Cov.J'`.
///
/// The result is made exactly symmetric so it can be folded into a covariance.
pub fn congruence<N: RealField>(J: &DMatrix<N>, Cov: &DMatrix<N>) -> DMatrix<N> {
    let mut JCJt = J * Cov * J.transpose();
    symmetrize(&mut JCJt);
    JCJt
}

/// Replace M by (M + M')/2.
pub fn symmetrize<N: RealField>(M: &mut DMatrix<N>) {
    let half = N::one() / (N::one() + N::one());
    let n = M.nrows();
    for i in 0..n {
        for j in i + 1..n {
            let m = (M[(i, j)] + M[(j, i)]) * half;
            M[(i, j)] = m;
            M[(j, i)] = m;
        }
    }
}

/// Checks M is symmetric to within rounding of its largest element.
pub fn check_symmetric<N: RealField>(M: &DMatrix<N>, message: &'static str) -> EstimateResult<()> {
    let tolerance: N = na::convert(SYMMETRY_TOLERANCE);
    if (M - M.transpose()).amax() <= M.amax() * tolerance {
        Ok(())
    } else {
        Err(EstimateError::NotPSD(message))
    }
}

/// Inverse of a symmetric positive definite matrix.
pub fn inverse_pd<N: RealField>(M: &DMatrix<N>, message: &'static str) -> EstimateResult<DMatrix<N>> {
    let mut MI = M
        .clone()
        .cholesky()
        .ok_or(EstimateError::NotInvertible(message))?
        .inverse();
    symmetrize(&mut MI);
    Ok(MI)
}

/// Checks a the reciprocal condition number is >= 0 .
///
/// IEC 559 NaN values are never true
pub fn check_non_negativ<N: RealField>(rcond: N, message: &'static str) -> EstimateResult<N> {
    if rcond >= N::zero() {
        Ok(rcond)
    } else {
        Err(EstimateError::NotPSD(message))
    }
}
