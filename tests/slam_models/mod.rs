//! Models and dense reference computations shared by the estimator tests.

#![allow(non_snake_case)]
#![allow(dead_code)]

use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use indirect_ekf::models::KalmanState;
use indirect_ekf::{IndexSet, IndirectKalmanState};
use indirect_ekf::models::KalmanEstimator;

pub const EPS: f64 = 1e-10;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn rng() -> StdRng {
    SeedableRng::seed_from_u64(1u64)
}

pub fn random_matrix(rng: &mut StdRng, rows: usize, cols: usize) -> DMatrix<f64> {
    DMatrix::from_fn(rows, cols, |_, _| rng.gen_range(-1.0..1.0))
}

pub fn random_vector(rng: &mut StdRng, n: usize) -> DVector<f64> {
    DVector::from_fn(n, |_, _| rng.gen_range(-1.0..1.0))
}

/// A well conditioned SPD matrix.
pub fn random_spd(rng: &mut StdRng, n: usize) -> DMatrix<f64> {
    let A = random_matrix(rng, n, n);
    let mut S = &A * A.transpose() + DMatrix::identity(n, n) * 0.5;
    // exact symmetry
    for i in 0..n {
        for j in 0..i {
            S[(i, j)] = S[(j, i)];
        }
    }
    S
}

/// A filter with a random state and covariance in its first `active` entries, the rest zero.
pub fn random_filter(rng: &mut StdRng, size: usize, active: usize) -> IndirectKalmanState<f64> {
    let mut x = DVector::<f64>::zeros(size);
    let mut X = DMatrix::<f64>::zeros(size, size);
    x.rows_mut(0, active).copy_from(&random_vector(rng, active));
    X.slice_mut((0, 0), (active, active)).copy_from(&random_spd(rng, active));
    let mut filter = IndirectKalmanState::new_zero(size);
    filter.init(&KalmanState { x, X }).unwrap();
    filter
}

/// Embeds `block` of rows `ia_row` and columns `ia_col` into a zero matrix.
pub fn embed(rows: usize, cols: usize, ia_row: &IndexSet, ia_col: &IndexSet, block: &DMatrix<f64>) -> DMatrix<f64> {
    let mut M = DMatrix::<f64>::zeros(rows, cols);
    for (r, &i) in ia_row.iter().enumerate() {
        for (c, &j) in ia_col.iter().enumerate() {
            M[(i, j)] = block[(r, c)];
        }
    }
    M
}

pub fn is_symmetric(M: &DMatrix<f64>) -> bool {
    (M - M.transpose()).amax() <= EPS
}
