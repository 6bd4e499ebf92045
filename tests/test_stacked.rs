//! Test stacked correction.
//!
//! A joint correction of stacked innovations is compared with single corrections, with permutations of the stack
//! and with a dense joint Kalman update.

#![allow(non_snake_case)]

use approx::assert_relative_eq;
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;

use indirect_ekf::models::{
    IndirectCorrector, Innovation, KalmanEstimator, KalmanState, LinearObserveModel, StackedCorrector,
};
use indirect_ekf::noise::CorrelatedNoise;
use indirect_ekf::{EstimateError, IndexSet, IndirectKalmanState};
use slam_models::*;

mod slam_models;

struct Observation {
    model: LinearObserveModel<f64>,
    noise: CorrelatedNoise<f64>,
    s: DVector<f64>,
}

impl Observation {
    fn random(rng: &mut StdRng, z_size: usize, ia: IndexSet) -> Observation {
        Observation {
            model: LinearObserveModel {
                Hx: random_matrix(rng, z_size, ia.len()),
                ia,
            },
            noise: CorrelatedNoise {
                Q: random_spd(rng, z_size),
            },
            s: random_vector(rng, z_size),
        }
    }

    fn stack_on(&self, filter: &mut IndirectKalmanState<f64>) {
        let inn = self.model.innovation(filter.X(), self.s.clone(), &self.noise).unwrap();
        filter
            .stack_correction(inn, self.model.Hx.clone(), self.model.ia.clone())
            .unwrap();
    }

    fn correct(&self, filter: &mut IndirectKalmanState<f64>, ia_x: &IndexSet) {
        let mut inn = self.model.innovation(filter.X(), self.s.clone(), &self.noise).unwrap();
        filter.correct(ia_x, &mut inn, &self.model.Hx, &self.model.ia).unwrap();
    }
}

fn correlated_observations(rng: &mut StdRng) -> Vec<Observation> {
    vec![
        Observation::random(rng, 2, IndexSet::new(vec![0, 1, 2]).unwrap()),
        Observation::random(rng, 2, IndexSet::new(vec![2, 3, 4]).unwrap()),
        Observation::random(rng, 1, IndexSet::new(vec![1, 5]).unwrap()),
    ]
}

#[test]
fn test_independent_stack_matches_single() {
    init_logging();
    let mut rng = rng();
    let n = 4;
    // Two uncorrelated blocks
    let mut X = DMatrix::<f64>::zeros(n, n);
    X.slice_mut((0, 0), (2, 2)).copy_from(&random_spd(&mut rng, 2));
    X.slice_mut((2, 2), (2, 2)).copy_from(&random_spd(&mut rng, 2));
    let mut filter = IndirectKalmanState::new_zero(n);
    filter.init(&KalmanState { x: random_vector(&mut rng, n), X }).unwrap();

    let ia_x = IndexSet::range(0, n);
    let a = Observation::random(&mut rng, 1, IndexSet::range(0, 2));
    let b = Observation::random(&mut rng, 2, IndexSet::range(2, 4));

    let mut stacked = filter.clone();
    a.stack_on(&mut stacked);
    b.stack_on(&mut stacked);
    assert_eq!(stacked.stack_len(), 2);
    assert_eq!(stacked.stacked_size(), 3);
    stacked.correct_all_stacked(&ia_x).unwrap();
    assert_eq!(stacked.stack_len(), 0);
    assert_eq!(stacked.stacked_size(), 0);

    let mut ab = filter.clone();
    a.correct(&mut ab, &ia_x);
    b.correct(&mut ab, &ia_x);
    let mut ba = filter.clone();
    b.correct(&mut ba, &ia_x);
    a.correct(&mut ba, &ia_x);

    for single in &[ab, ba] {
        assert_relative_eq!(*stacked.x(), *single.x(), epsilon = EPS);
        assert_relative_eq!(*stacked.X(), *single.X(), epsilon = EPS);
    }
}

#[test]
fn test_stack_order_independent() {
    let mut rng = rng();
    let n = 7;
    let filter = random_filter(&mut rng, n, n);
    let ia_x = IndexSet::range(0, n);
    let obs = correlated_observations(&mut rng);

    let mut forward = filter.clone();
    for o in &obs {
        o.stack_on(&mut forward);
    }
    forward.correct_all_stacked(&ia_x).unwrap();

    let mut backward = filter.clone();
    for o in obs.iter().rev() {
        o.stack_on(&mut backward);
    }
    backward.correct_all_stacked(&ia_x).unwrap();

    let mut rotated = filter.clone();
    for i in &[1usize, 2, 0] {
        obs[*i].stack_on(&mut rotated);
    }
    rotated.correct_all_stacked(&ia_x).unwrap();

    for other in &[backward, rotated] {
        assert_relative_eq!(*forward.x(), *other.x(), epsilon = EPS);
        assert_relative_eq!(*forward.X(), *other.X(), epsilon = EPS);
    }
    assert!(is_symmetric(forward.X()));
    assert!(forward.X().trace() < filter.X().trace());
}

#[test]
fn test_stack_matches_dense_joint_update() {
    let mut rng = rng();
    let n = 7;
    let mut filter = random_filter(&mut rng, n, n);
    let KalmanState { x: x0, X: X0 } = filter.kalman_state();
    let ia_x = IndexSet::range(0, n);
    let obs = correlated_observations(&mut rng);
    for o in &obs {
        o.stack_on(&mut filter);
    }
    filter.correct_all_stacked(&ia_x).unwrap();

    // Joint observation model and block diagonal noise
    let m: usize = obs.iter().map(|o| o.s.nrows()).sum();
    let mut H = DMatrix::<f64>::zeros(m, n);
    let mut R = DMatrix::<f64>::zeros(m, m);
    let mut s = DVector::<f64>::zeros(m);
    let mut row = 0;
    for o in &obs {
        let k = o.s.nrows();
        H += embed(m, n, &IndexSet::range(row, row + k), &o.model.ia, &o.model.Hx);
        R.slice_mut((row, row), (k, k)).copy_from(&o.noise.Q);
        s.rows_mut(row, k).copy_from(&o.s);
        row += k;
    }
    let S = &H * &X0 * H.transpose() + R;
    let W = &X0 * H.transpose() * S.clone().try_inverse().unwrap();

    assert_relative_eq!(*filter.x(), &x0 - &W * &s, epsilon = EPS);
    assert_relative_eq!(*filter.X(), &X0 - &W * &S * W.transpose(), epsilon = EPS);
}

#[test]
fn test_single_stack_matches_correct() {
    let mut rng = rng();
    let filter = random_filter(&mut rng, 6, 6);
    let ia_x = IndexSet::range(0, 6);
    let o = Observation::random(&mut rng, 2, IndexSet::new(vec![1, 3, 4]).unwrap());

    let mut stacked = filter.clone();
    o.stack_on(&mut stacked);
    stacked.correct_all_stacked(&ia_x).unwrap();

    let mut single = filter.clone();
    o.correct(&mut single, &ia_x);

    assert_relative_eq!(*stacked.x(), *single.x(), epsilon = EPS);
    assert_relative_eq!(*stacked.X(), *single.X(), epsilon = EPS);
}

#[test]
fn test_empty_stack() {
    let mut rng = rng();
    let mut filter = random_filter(&mut rng, 4, 4);
    let before = filter.kalman_state();
    filter.correct_all_stacked(&IndexSet::range(0, 4)).unwrap();
    assert_eq!(filter.kalman_state(), before);
}

#[test]
fn test_stack_rejects_bad_jacobian() {
    let mut rng = rng();
    let mut filter = random_filter(&mut rng, 4, 4);
    let o = Observation::random(&mut rng, 2, IndexSet::range(0, 2));
    let inn = o.model.innovation(filter.X(), o.s.clone(), &o.noise).unwrap();

    let result = filter.stack_correction(inn.clone(), DMatrix::zeros(2, 3), IndexSet::range(0, 2));
    assert!(matches!(result, Err(EstimateError::DimensionMismatch { .. })));
    let result = filter.stack_correction(inn, o.model.Hx.clone(), IndexSet::range(3, 5));
    assert_eq!(result, Err(EstimateError::IndexOutOfRange { index: 4, size: 4 }));
    assert_eq!(filter.stack_len(), 0);
}

#[test]
fn test_stack_not_invertible() {
    init_logging();
    let mut rng = rng();
    let mut filter = random_filter(&mut rng, 4, 4);
    let before = filter.kalman_state();

    // A negative innovation covariance
    let inn = Innovation::new(DVector::from_element(1, 1.0), DMatrix::from_element(1, 1, -1.0)).unwrap();
    filter
        .stack_correction(inn, DMatrix::zeros(1, 2), IndexSet::range(0, 2))
        .unwrap();
    let result = filter.correct_all_stacked(&IndexSet::range(0, 4));

    assert_eq!(result, Err(EstimateError::NotInvertible("stacked innovation covariance")));
    assert_eq!(filter.kalman_state(), before);
    // The stack is kept for the caller to drop
    assert_eq!(filter.stack_len(), 1);
    filter.clear_stack();
    assert_eq!(filter.stacked_size(), 0);
}
