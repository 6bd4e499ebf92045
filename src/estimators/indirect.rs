#![allow(non_snake_case)]

//! Indirect covariance state estimation.
//!
//! A discrete Bayesian estimator that uses a Kalman state representation x,X of a state that only ever grows,
//! such as a robot pose and the landmarks of a SLAM map. The capacity of the state is fixed at construction.
//!
//! Each operation involves a few parts of the state, named by [`IndexSet`]s. Covariance blocks are updated in place
//! and only the rows and columns of the parts involved are written. The cost of an operation scales with the size of
//! the parts it involves and not with the size of the state.
//!
//! [`IndexSet`]: ../../index_set/struct.IndexSet.html

use log::{trace, warn};
use nalgebra as na;
use na::{DMatrix, DVector, RealField};

use crate::error::{check_shape, EstimateError, EstimateResult};
use crate::estimators::stacked::CorrectionStack;
use crate::index_set::IndexSet;
use crate::linalg::indirect::{add_symmetric, add_vector, project, scatter_add};
use crate::linalg::rcond;
use crate::matrix::{check_non_negativ, check_symmetric, congruence, symmetrize};
use crate::models::{
    IndirectCorrector, IndirectInitializer, IndirectPredictor, IndirectReparametrizer, Innovation, KalmanEstimator,
    KalmanState,
};
use crate::noise::{CorrelatedNoise, CoupledNoise};

/// Indirect Kalman state.
///
/// The state vector x and its covariance X with a fixed capacity. The parts of the state not in use are managed by
/// the caller and are not touched by the estimator.
#[derive(Clone, Debug)]
pub struct IndirectKalmanState<N: RealField> {
    pub(crate) x: DVector<N>,
    pub(crate) X: DMatrix<N>,
    pub(crate) stack: CorrectionStack<N>,
    // Scratch of the last correction, overwritten by every correction
    pub(crate) PJt: DMatrix<N>,
    pub(crate) K: DMatrix<N>,
}

impl<N: RealField> IndirectKalmanState<N> {
    /// A zero state of capacity `size`.
    pub fn new_zero(size: usize) -> IndirectKalmanState<N> {
        IndirectKalmanState {
            x: DVector::zeros(size),
            X: DMatrix::zeros(size, size),
            stack: CorrectionStack::new(),
            PJt: DMatrix::zeros(0, 0),
            K: DMatrix::zeros(0, 0),
        }
    }

    pub fn size(&self) -> usize {
        self.x.nrows()
    }

    pub fn x(&self) -> &DVector<N> {
        &self.x
    }

    /// The state vector, for the caller to predict or reparametrize its entries.
    pub fn x_mut(&mut self) -> &mut DVector<N> {
        &mut self.x
    }

    pub fn X(&self) -> &DMatrix<N> {
        &self.X
    }

    /// Checks `ia` is a subset of `ia_x` and `ia_x` addresses this state.
    fn check_within(&self, ia_x: &IndexSet, ia: &IndexSet, what: &'static str) -> EstimateResult<()> {
        ia_x.check_bound(self.size())?;
        if ia.is_subset_of(ia_x) {
            Ok(())
        } else {
            Err(EstimateError::NotSubset(what))
        }
    }
}

impl<N: RealField> KalmanEstimator<N> for IndirectKalmanState<N> {
    fn init(&mut self, state: &KalmanState<N>) -> EstimateResult<N> {
        let size = self.size();
        check_shape("state vector", (size, 1), state.x.shape())?;
        check_shape("state covariance", (size, size), state.X.shape())?;
        check_symmetric(&state.X, "X not symmetric")?;
        let rcond = rcond::rcond_symetric(&state.X);
        check_non_negativ(rcond, "X not PSD")?;

        self.x.copy_from(&state.x);
        self.X.copy_from(&state.X);
        symmetrize(&mut self.X);
        self.stack.clear();
        Ok(rcond)
    }

    fn kalman_state(&self) -> KalmanState<N> {
        KalmanState {
            x: self.x.clone(),
            X: self.X.clone(),
        }
    }
}

impl<N: RealField> IndirectPredictor<N> for IndirectKalmanState<N> {
    fn predict_coupled(
        &mut self,
        ia_x: &IndexSet,
        Fv: &DMatrix<N>,
        ia_v: &IndexSet,
        noise: &CoupledNoise<N>,
    ) -> EstimateResult<()> {
        trace!("predict coupled: v {} of x {}", ia_v.len(), ia_x.len());
        self.check_within(ia_x, ia_v, "moving state")?;
        noise.check_coupling("control Jacobian", ia_v.len())?;

        let ia_invariant = ia_x.complement(ia_v);
        // X[v,v] = Fv.X[v,v].Fv' + Fu.U.Fu'
        let Q = congruence(&noise.G, &noise.Q);
        scatter_add(&mut self.X, &ia_invariant, Fv, ia_v, ia_v, Some(&Q))
    }

    fn predict(
        &mut self,
        ia_x: &IndexSet,
        Fv: &DMatrix<N>,
        ia_v: &IndexSet,
        noise: &CorrelatedNoise<N>,
    ) -> EstimateResult<()> {
        trace!("predict: v {} of x {}", ia_v.len(), ia_x.len());
        self.check_within(ia_x, ia_v, "moving state")?;

        let ia_invariant = ia_x.complement(ia_v);
        scatter_add(&mut self.X, &ia_invariant, Fv, ia_v, ia_v, Some(&noise.Q))
    }
}

impl<N: RealField> IndirectInitializer<N> for IndirectKalmanState<N> {
    fn initialize(
        &mut self,
        ia_x: &IndexSet,
        Gv: &DMatrix<N>,
        ia_rs: &IndexSet,
        ia_l: &IndexSet,
        obs_noise: &CoupledNoise<N>,
        secondary_noise: Option<&CoupledNoise<N>>,
    ) -> EstimateResult<()> {
        trace!("initialize: l {} from rs {} of x {}", ia_l.len(), ia_rs.len(), ia_x.len());
        self.check_within(ia_x, ia_l, "landmark")?;
        self.check_within(ia_x, ia_rs, "landmark source")?;
        if !ia_rs.is_disjoint(ia_l) {
            return Err(EstimateError::Overlapping("landmark and its source"));
        }
        obs_noise.check_coupling("observation Jacobian", ia_l.len())?;

        let ia_invariant = ia_x.complement(ia_l);
        // Gy.R.Gy' + Gn.N.Gn'
        let mut noise = congruence(&obs_noise.G, &obs_noise.Q);
        if let Some(secondary) = secondary_noise {
            secondary.check_coupling("secondary noise Jacobian", ia_l.len())?;
            noise += congruence(&secondary.G, &secondary.Q);
        }
        scatter_add(&mut self.X, &ia_invariant, Gv, ia_rs, ia_l, Some(&noise))
    }
}

impl<N: RealField> IndirectReparametrizer<N> for IndirectKalmanState<N> {
    fn reparametrize(
        &mut self,
        ia_x: &IndexSet,
        Jl: &DMatrix<N>,
        ia_old: &IndexSet,
        ia_new: &IndexSet,
    ) -> EstimateResult<()> {
        trace!("reparametrize: {} to {} of x {}", ia_old.len(), ia_new.len(), ia_x.len());
        self.check_within(ia_x, ia_old, "old parametrization")?;
        self.check_within(ia_x, ia_new, "new parametrization")?;

        let ia_invariant = ia_x.complement(&ia_old.union(ia_new));
        scatter_add(&mut self.X, &ia_invariant, Jl, ia_old, ia_new, None)
    }
}

impl<N: RealField> IndirectCorrector<N> for IndirectKalmanState<N> {
    fn compute_kalman_gain(
        &mut self,
        ia_x: &IndexSet,
        inn: &mut Innovation<N>,
        Hrsl: &DMatrix<N>,
        ia_rsl: &IndexSet,
    ) -> EstimateResult<&DMatrix<N>> {
        ia_x.check_bound(self.size())?;
        ia_rsl.check_bound(self.size())?;
        check_shape("innovation Jacobian", (inn.size(), ia_rsl.len()), Hrsl.shape())?;

        let PJt = project(&self.X, ia_x, ia_rsl) * Hrsl.transpose();
        let iZ = inn.invert_cov().map_err(|e| {
            warn!("correction skipped: {}", e);
            e
        })?;
        // Negative gain K = -X.H'.inv(Z)
        self.K = -(&PJt * iZ);
        self.PJt = PJt;
        Ok(&self.K)
    }

    fn correct(
        &mut self,
        ia_x: &IndexSet,
        inn: &mut Innovation<N>,
        Hrsl: &DMatrix<N>,
        ia_rsl: &IndexSet,
    ) -> EstimateResult<()> {
        trace!("correct: innovation {} on rsl {} of x {}", inn.size(), ia_rsl.len(), ia_x.len());
        self.compute_kalman_gain(ia_x, inn, Hrsl, ia_rsl)?;
        self.apply_gain(ia_x, inn.z());
        Ok(())
    }
}

impl<N: RealField> IndirectKalmanState<N> {
    /// State update with the gain and cross covariance of the last correction.
    ///
    /// x[ia_x] += K.z, X[ia_x,ia_x] += K.PJt'
    pub(crate) fn apply_gain(&mut self, ia_x: &IndexSet, z: &DVector<N>) {
        let dx = &self.K * z;
        add_vector(&mut self.x, ia_x, &dx);

        let mut dX = &self.K * self.PJt.transpose();
        symmetrize(&mut dX);
        add_symmetric(&mut self.X, ia_x, &dX);
    }
}
