//! Reciprocal condition number estimates.

use nalgebra as na;
use na::{DMatrix, RealField};

/// Estimate the reciprocal condition number of a symmetric matrix from its diagonal.
///
/// The max diagonal element is taken as the norm of the matrix and the min element as the norm of its inverse,
/// therefore rcond = min/max.
///
/// Defined to be 0 for an empty matrix, for a zero diagonal and for an infinite max.
/// Defined to be < 0 for a negative diagonal element or any NaN element.
pub fn rcond_symetric<N: RealField>(sm: &DMatrix<N>) -> N {
    let n = sm.nrows().min(sm.ncols());
    if n == 0 {
        return N::zero();
    }

    let mut mind = sm[(0, 0)];
    let mut maxd = mind;
    for i in 0..n {
        let d = sm[(i, i)];
        if d != d {
            // NaN
            return -N::one();
        }
        if d < mind {
            mind = d;
        }
        if d > maxd {
            maxd = d;
        }
    }

    if mind < N::zero() {
        // mind < 0 but does not represent a rcond
        return mind;
    }
    let rcond = mind / maxd;
    if rcond != rcond {
        // NaN, singular due to (mind == maxd) == (zero or infinity)
        N::zero()
    } else {
        rcond
    }
}
