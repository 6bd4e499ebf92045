#![allow(non_snake_case)]

//! Noise models.
//!
//! Additive noise folded into the state covariance. Noise is either already expressed in the coordinates
//! of the state block it affects ([`CorrelatedNoise`]) or coupled into them by a Jacobian ([`CoupledNoise`]).

use nalgebra as na;
use na::{DMatrix, DVector, RealField};

use crate::error::{check_shape, EstimateResult};
use crate::matrix::congruence;

/// Additive noise.
///
/// Noise represented as a the noise variance vector.
pub struct UncorrelatedNoise<N: RealField> {
    /// Noise variance
    pub q: DVector<N>,
}

/// Additive noise.
///
/// Noise represented as a the noise covariance matrix.
#[derive(Clone, Debug)]
pub struct CorrelatedNoise<N: RealField> {
    /// Noise covariance
    pub Q: DMatrix<N>,
}

/// Additive noise.
///
/// Noise represented as a noise covariance and a noise coupling matrix.
/// The noise covariance is G.Q.G'.
#[derive(Clone, Debug)]
pub struct CoupledNoise<N: RealField> {
    /// Noise covariance in its own coordinates
    pub Q: DMatrix<N>,
    /// Noise coupling
    pub G: DMatrix<N>,
}

impl<N: RealField> CorrelatedNoise<N> {
    /// Creates a CorrelatedNoise from an UncorrelatedNoise.
    pub fn from_uncorrelated(uncorrelated: &UncorrelatedNoise<N>) -> Self {
        CorrelatedNoise {
            Q: DMatrix::from_diagonal(&uncorrelated.q),
        }
    }

    /// Creates a CorrelatedNoise from an CoupledNoise.
    pub fn from_coupled(coupled: &CoupledNoise<N>) -> Self {
        CorrelatedNoise {
            Q: congruence(&coupled.G, &coupled.Q),
        }
    }
}

impl<N: RealField> CoupledNoise<N> {
    pub fn new(G: DMatrix<N>, Q: DMatrix<N>) -> EstimateResult<Self> {
        let noise = CoupledNoise { Q, G };
        noise.check_coupling("noise coupling", noise.dim())?;
        Ok(noise)
    }

    /// Dimension of the coordinates the noise is coupled into.
    pub fn dim(&self) -> usize {
        self.G.nrows()
    }

    /// Checks Q is square and G couples it into `dim` coordinates.
    pub(crate) fn check_coupling(&self, what: &'static str, dim: usize) -> EstimateResult<()> {
        let q = self.Q.nrows();
        check_shape("noise covariance", (q, q), self.Q.shape())?;
        check_shape(what, (dim, q), self.G.shape())
    }
}
