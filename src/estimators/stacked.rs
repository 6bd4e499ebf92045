#![allow(non_snake_case)]

//! Stacked correction.
//!
//! Innovations observed at the same time are queued and then corrected jointly. The joint innovation covariance
//! includes the correlation between the queued innovations through the state they depend on, so a joint correction
//! is exact where a sequence of single corrections would use stale innovations.

use log::{debug, trace, warn};
use nalgebra as na;
use na::{DMatrix, DVector, RealField};

use crate::error::{check_shape, EstimateResult};
use crate::estimators::indirect::IndirectKalmanState;
use crate::index_set::IndexSet;
use crate::linalg::indirect::project;
use crate::matrix::inverse_pd;
use crate::models::{Innovation, StackedCorrector};

/// A queued correction: the innovation, its Jacobian and the state it depends on.
#[derive(Clone, Debug)]
pub struct StackedCorrection<N: RealField> {
    pub inn: Innovation<N>,
    pub Hrsl: DMatrix<N>,
    pub ia_rsl: IndexSet,
}

/// Queue of corrections in the order they were stacked.
#[derive(Clone, Debug)]
pub struct CorrectionStack<N: RealField> {
    pub(crate) stack: Vec<StackedCorrection<N>>,
    /// Total size of the queued innovations
    pub(crate) inn_size: usize,
}

impl<N: RealField> CorrectionStack<N> {
    pub fn new() -> Self {
        CorrectionStack {
            stack: Vec::new(),
            inn_size: 0,
        }
    }

    pub fn clear(&mut self) {
        self.stack.clear();
        self.inn_size = 0;
    }
}

impl<N: RealField> Default for CorrectionStack<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: RealField> IndirectKalmanState<N> {
    /// Number of queued corrections.
    pub fn stack_len(&self) -> usize {
        self.stack.stack.len()
    }

    /// Total size of the queued innovations.
    pub fn stacked_size(&self) -> usize {
        self.stack.inn_size
    }

    /// Drop all queued corrections.
    pub fn clear_stack(&mut self) {
        self.stack.clear();
    }
}

impl<N: RealField> StackedCorrector<N> for IndirectKalmanState<N> {
    fn stack_correction(&mut self, inn: Innovation<N>, Hrsl: DMatrix<N>, ia_rsl: IndexSet) -> EstimateResult<()> {
        ia_rsl.check_bound(self.size())?;
        check_shape("innovation Jacobian", (inn.size(), ia_rsl.len()), Hrsl.shape())?;
        trace!("stack correction: innovation {} on rsl {}", inn.size(), ia_rsl.len());

        self.stack.inn_size += inn.size();
        self.stack.stack.push(StackedCorrection { inn, Hrsl, ia_rsl });
        Ok(())
    }

    fn correct_all_stacked(&mut self, ia_x: &IndexSet) -> EstimateResult<()> {
        ia_x.check_bound(self.size())?;
        if self.stack.stack.is_empty() {
            return Ok(());
        }
        let inn_size = self.stack.inn_size;
        debug!("correct all stacked: {} corrections, innovation {}", self.stack.stack.len(), inn_size);

        let mut PJt = DMatrix::<N>::zeros(ia_x.len(), inn_size);
        let mut z = DVector::<N>::zeros(inn_size);
        let mut Z = DMatrix::<N>::zeros(inn_size, inn_size);

        // Everything from the same X before any correction
        let corrections = &self.stack.stack;
        let mut col1 = 0;
        for (i, c1) in corrections.iter().enumerate() {
            let n1 = c1.inn.size();
            PJt.columns_mut(col1, n1)
                .copy_from(&(project(&self.X, ia_x, &c1.ia_rsl) * c1.Hrsl.transpose()));
            z.rows_mut(col1, n1).copy_from(&c1.inn.z());
            Z.slice_mut((col1, col1), (n1, n1)).copy_from(&c1.inn.Z());

            // Off diagonal blocks H1.X[rsl1,rsl2].H2'
            let mut col2 = col1 + n1;
            for c2 in &corrections[i + 1..] {
                let n2 = c2.inn.size();
                let Z12 = &c1.Hrsl * project(&self.X, &c1.ia_rsl, &c2.ia_rsl) * c2.Hrsl.transpose();
                Z.slice_mut((col2, col1), (n2, n1)).copy_from(&Z12.transpose());
                Z.slice_mut((col1, col2), (n1, n2)).copy_from(&Z12);
                col2 += n2;
            }
            col1 += n1;
        }

        let iZ = inverse_pd(&Z, "stacked innovation covariance").map_err(|e| {
            warn!("stacked correction skipped: {}", e);
            e
        })?;
        self.K = -(&PJt * iZ);
        self.PJt = PJt;
        self.apply_gain(ia_x, &z);

        self.stack.clear();
        Ok(())
    }
}
