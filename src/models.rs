#![allow(non_snake_case)]

//! Bayesian estimation models for indirectly addressed states.
//!
//! State representations and innovations are modeled as structs.
//! Estimation operations on an indirectly addressed state are defined as traits. Every operation names the
//! part of the state it involves with [`IndexSet`]s and only touches the covariance blocks those sets address.

use nalgebra as na;
use na::{DMatrix, DVector, RealField};

use crate::error::{check_shape, EstimateResult};
use crate::index_set::IndexSet;
use crate::linalg::indirect::project;
use crate::matrix::inverse_pd;
use crate::noise::{CorrelatedNoise, CoupledNoise};

/// Kalman State.
///
/// Linear representation as a state vector and the state covariance (symmetric positive semi-definite) matrix.
#[derive(PartialEq, Clone, Debug)]
pub struct KalmanState<N: RealField> {
    /// State vector
    pub x: DVector<N>,
    /// State covariance matrix (symmetric positive semi-definite)
    pub X: DMatrix<N>,
}

/// Innovation of an observation.
///
/// The residual is the expected minus the measured observation. The inverse of the innovation covariance is
/// computed on demand and then kept with the innovation.
#[derive(Clone, Debug)]
pub struct Innovation<N: RealField> {
    z: DVector<N>,
    Z: DMatrix<N>,
    iZ: Option<DMatrix<N>>,
}

impl<N: RealField> Innovation<N> {
    pub fn new(z: DVector<N>, Z: DMatrix<N>) -> EstimateResult<Self> {
        check_shape("innovation covariance", (z.nrows(), z.nrows()), Z.shape())?;
        Ok(Innovation { z, Z, iZ: None })
    }

    pub fn size(&self) -> usize {
        self.z.nrows()
    }

    /// Residual, expected minus measured.
    pub fn z(&self) -> &DVector<N> {
        &self.z
    }

    /// Innovation covariance (symmetric positive definite).
    pub fn Z(&self) -> &DMatrix<N> {
        &self.Z
    }

    /// Replace the residual, keeping its size.
    pub fn set_residual(&mut self, z: DVector<N>) -> EstimateResult<()> {
        check_shape("innovation residual", (self.size(), 1), z.shape())?;
        self.z = z;
        Ok(())
    }

    /// Replace the innovation covariance, keeping its size.
    ///
    /// Any kept inverse is dropped.
    pub fn set_cov(&mut self, Z: DMatrix<N>) -> EstimateResult<()> {
        check_shape("innovation covariance", (self.size(), self.size()), Z.shape())?;
        self.Z = Z;
        self.iZ = None;
        Ok(())
    }

    /// Inverts the innovation covariance.
    ///
    /// The inverse is computed once, later calls return the kept inverse.
    pub fn invert_cov(&mut self) -> EstimateResult<&DMatrix<N>> {
        let iZ = match self.iZ.take() {
            Some(iZ) => iZ,
            None => inverse_pd(&self.Z, "innovation covariance")?,
        };
        Ok(self.iZ.get_or_insert(iZ))
    }

    /// The inverse innovation covariance if it has been computed.
    pub fn inverse_cov(&self) -> Option<&DMatrix<N>> {
        self.iZ.as_ref()
    }
}

/// Linear observation model.
///
/// Observation of the state entries `ia` represented by an observation matrix.
#[derive(Clone, Debug)]
pub struct LinearObserveModel<N: RealField> {
    /// Observation matrix
    pub Hx: DMatrix<N>,
    /// State entries observed
    pub ia: IndexSet,
}

impl<N: RealField> LinearObserveModel<N> {
    /// Innovation of the residual `s` (expected minus measured).
    ///
    /// Innovation covariance Z = Hx.X[ia,ia].Hx' + noise
    pub fn innovation(&self, X: &DMatrix<N>, s: DVector<N>, noise: &CorrelatedNoise<N>) -> EstimateResult<Innovation<N>> {
        self.ia.check_bound(X.nrows())?;
        check_shape("observation matrix", (s.nrows(), self.ia.len()), self.Hx.shape())?;
        check_shape("observation noise", (s.nrows(), s.nrows()), noise.Q.shape())?;

        let mut Z = &self.Hx * project(X, &self.ia, &self.ia) * self.Hx.transpose();
        Z += &noise.Q;
        Innovation::new(s, Z)
    }
}

/// A Kalman filter (estimator).
///
/// The linear Kalman state representation x,X is used to represent the system.
pub trait KalmanEstimator<N: RealField> {
    /// Initialise the estimator with a KalmanState.
    fn init(&mut self, state: &KalmanState<N>) -> EstimateResult<N>;

    /// The estimator's estimate of the system's KalmanState.
    fn kalman_state(&self) -> KalmanState<N>;
}

/// A predictor of part of the state.
///
/// Only the covariance of the moving part `ia_v` of the state `ia_x`, and its correlation with the rest of `ia_x`,
/// are predicted. The caller predicts the state vector entries `x[ia_v]`.
pub trait IndirectPredictor<N: RealField> {
    /// Prediction with control noise coupled into `ia_v` by the control Jacobian `noise.G`.
    ///
    /// X[v,v] = Fv.X[v,v].Fv' + G.Q.G'
    fn predict_coupled(
        &mut self,
        ia_x: &IndexSet,
        Fv: &DMatrix<N>,
        ia_v: &IndexSet,
        noise: &CoupledNoise<N>,
    ) -> EstimateResult<()>;

    /// Prediction with process noise expressed in `ia_v` coordinates.
    ///
    /// X[v,v] = Fv.X[v,v].Fv' + Q
    fn predict(
        &mut self,
        ia_x: &IndexSet,
        Fv: &DMatrix<N>,
        ia_v: &IndexSet,
        noise: &CorrelatedNoise<N>,
    ) -> EstimateResult<()>;
}

/// An initializer of new landmarks.
pub trait IndirectInitializer<N: RealField> {
    /// Initialise the covariance of the landmark `ia_l` from the state `ia_rs` it is computed from.
    ///
    /// X[l,l] = Gv.X[rs,rs].Gv' + Gy.R.Gy' (+ Gn.N.Gn')
    ///
    /// The landmark's correlation with all of `ia_x` is filled in. The optional `secondary_noise` models
    /// uncertainty the observation does not carry, such as an unobserved depth.
    fn initialize(
        &mut self,
        ia_x: &IndexSet,
        Gv: &DMatrix<N>,
        ia_rs: &IndexSet,
        ia_l: &IndexSet,
        obs_noise: &CoupledNoise<N>,
        secondary_noise: Option<&CoupledNoise<N>>,
    ) -> EstimateResult<()>;
}

/// A reparametrizer of state blocks.
pub trait IndirectReparametrizer<N: RealField> {
    /// Re-express the covariance of `ia_old` as `ia_new` through the Jacobian `Jl`.
    ///
    /// The correlation between `ia_old` and `ia_new` is not computed; the caller retires `ia_old` and
    /// writes the new parameters into `x[ia_new]`.
    fn reparametrize(
        &mut self,
        ia_x: &IndexSet,
        Jl: &DMatrix<N>,
        ia_old: &IndexSet,
        ia_new: &IndexSet,
    ) -> EstimateResult<()>;
}

/// A corrector of the state by a single innovation.
///
/// The Kalman gain is negative: x += K.z where the innovation residual z is expected minus measured.
pub trait IndirectCorrector<N: RealField> {
    /// Kalman gain for the innovation `inn`, whose Jacobian `Hrsl` relates it to the state `ia_rsl`.
    ///
    /// The returned gain is overwritten by the next correction.
    fn compute_kalman_gain(
        &mut self,
        ia_x: &IndexSet,
        inn: &mut Innovation<N>,
        Hrsl: &DMatrix<N>,
        ia_rsl: &IndexSet,
    ) -> EstimateResult<&DMatrix<N>>;

    /// Correct the state `ia_x` with the innovation.
    fn correct(
        &mut self,
        ia_x: &IndexSet,
        inn: &mut Innovation<N>,
        Hrsl: &DMatrix<N>,
        ia_rsl: &IndexSet,
    ) -> EstimateResult<()>;
}

/// A corrector that batches innovations into one joint correction.
pub trait StackedCorrector<N: RealField> {
    /// Queue an innovation for the next [`correct_all_stacked`](StackedCorrector::correct_all_stacked).
    fn stack_correction(&mut self, inn: Innovation<N>, Hrsl: DMatrix<N>, ia_rsl: IndexSet) -> EstimateResult<()>;

    /// Correct the state `ia_x` with all queued innovations jointly and empty the queue.
    ///
    /// All cross covariances are taken from the covariance before the correction, so the result does not
    /// depend on the order of the queue.
    fn correct_all_stacked(&mut self, ia_x: &IndexSet) -> EstimateResult<()>;
}
