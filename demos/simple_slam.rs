//! Operation of the indirect estimator in a simple 2D SLAM example.
//!
//! A robot pose x,y,θ moves with velocity and turn rate controls and observes point landmarks by range and bearing.
//! Landmarks are added to the state as they are first seen. Later observations of all landmarks are stacked and
//! corrected jointly.

#![allow(non_snake_case)]

use nalgebra::{DMatrix, DVector, Matrix2, Vector2};

use indirect_ekf::models::{
    IndirectInitializer, IndirectPredictor, KalmanEstimator, KalmanState, LinearObserveModel, StackedCorrector,
};
use indirect_ekf::noise::{CorrelatedNoise, CoupledNoise};
use indirect_ekf::{EstimateResult, IndexSet, IndirectKalmanState};

const POSE: usize = 3;
const MAX_LANDMARKS: usize = 4;
const DT: f64 = 1.0;
// Control noise, velocity and turn rate
const V_NOISE: f64 = 0.05;
const W_NOISE: f64 = 0.01;
// Observation noise, range and bearing
const R_NOISE: f64 = 0.1;
const B_NOISE: f64 = 0.01;

fn sqr(x: f64) -> f64 {
    x * x
}

fn wrap_angle(a: f64) -> f64 {
    let a = (a + std::f64::consts::PI) % (2. * std::f64::consts::PI);
    if a < 0. {
        a + std::f64::consts::PI
    } else {
        a - std::f64::consts::PI
    }
}

fn landmark_set(k: usize) -> IndexSet {
    IndexSet::range(POSE + 2 * k, POSE + 2 * k + 2)
}

fn observation_noise() -> DMatrix<f64> {
    DMatrix::from_diagonal(&DVector::from_vec(vec![sqr(R_NOISE), sqr(B_NOISE)]))
}

/// Range and bearing of landmark `l` from pose `p`.
fn range_bearing(p: &DVector<f64>, l: &Vector2<f64>) -> Vector2<f64> {
    let (dx, dy) = (l[0] - p[0], l[1] - p[1]);
    Vector2::new((sqr(dx) + sqr(dy)).sqrt(), wrap_angle(dy.atan2(dx) - p[2]))
}

struct Slam {
    filter: IndirectKalmanState<f64>,
    landmarks: usize,
}

impl Slam {
    fn ia_x(&self) -> IndexSet {
        IndexSet::range(0, POSE + 2 * self.landmarks)
    }

    fn predict(&mut self, v: f64, w: f64) -> EstimateResult<()> {
        let x = self.filter.x().clone();
        let (s, c) = x[2].sin_cos();
        let Fv = DMatrix::from_row_slice(3, 3, &[
            1., 0., -v * s * DT,
            0., 1., v * c * DT,
            0., 0., 1.,
        ]);
        let control = CoupledNoise::new(
            DMatrix::from_row_slice(3, 2, &[c * DT, 0., s * DT, 0., 0., DT]),
            DMatrix::from_diagonal(&DVector::from_vec(vec![sqr(V_NOISE), sqr(W_NOISE)])),
        )?;
        let ia_x = self.ia_x();
        self.filter.predict_coupled(&ia_x, &Fv, &IndexSet::range(0, POSE), &control)?;

        let pose = self.filter.x_mut();
        pose[0] += v * c * DT;
        pose[1] += v * s * DT;
        pose[2] = wrap_angle(pose[2] + w * DT);
        Ok(())
    }

    fn add_landmark(&mut self, z: &Vector2<f64>) -> EstimateResult<()> {
        let ia_l = landmark_set(self.landmarks);
        self.landmarks += 1;
        let x = self.filter.x().clone();
        let (r, a) = (z[0], x[2] + z[1]);
        let (s, c) = a.sin_cos();

        let Gv = DMatrix::from_row_slice(2, 3, &[1., 0., -r * s, 0., 1., r * c]);
        let Gy = DMatrix::from_row_slice(2, 2, &[c, -r * s, s, r * c]);
        let obs_noise = CoupledNoise::new(Gy, observation_noise())?;
        let ia_x = self.ia_x();
        self.filter
            .initialize(&ia_x, &Gv, &IndexSet::range(0, POSE), &ia_l, &obs_noise, None)?;

        let l = self.filter.x_mut();
        l[ia_l.as_slice()[0]] = x[0] + r * c;
        l[ia_l.as_slice()[1]] = x[1] + r * s;
        Ok(())
    }

    fn stack_observation(&mut self, k: usize, z: &Vector2<f64>) -> EstimateResult<()> {
        let ia_l = landmark_set(k);
        let x = self.filter.x();
        let l = Vector2::new(x[ia_l.as_slice()[0]], x[ia_l.as_slice()[1]]);
        let (dx, dy) = (l[0] - x[0], l[1] - x[1]);
        let q = sqr(dx) + sqr(dy);
        let r = q.sqrt();

        // Jacobian with respect to the pose and the landmark
        let H = DMatrix::from_row_slice(2, 5, &[
            -dx / r, -dy / r, 0., dx / r, dy / r,
            dy / q, -dx / q, -1., -dy / q, dx / q,
        ]);
        let model = LinearObserveModel {
            Hx: H,
            ia: IndexSet::range(0, POSE).union(&ia_l),
        };
        let expected = range_bearing(x, &l);
        let s = DVector::from_vec(vec![expected[0] - z[0], wrap_angle(expected[1] - z[1])]);
        let noise = CorrelatedNoise { Q: observation_noise() };
        let inn = model.innovation(self.filter.X(), s, &noise)?;
        self.filter.stack_correction(inn, model.Hx, model.ia)
    }
}

fn main() -> EstimateResult<()> {
    env_logger::init();

    let truth = [Vector2::new(4., 1.), Vector2::new(3., -2.), Vector2::new(6., 3.)];
    let size = POSE + 2 * MAX_LANDMARKS;
    let mut slam = Slam {
        filter: IndirectKalmanState::new_zero(size),
        landmarks: 0,
    };
    let mut X = DMatrix::<f64>::zeros(size, size);
    X[(0, 0)] = 0.01;
    X[(1, 1)] = 0.01;
    X[(2, 2)] = 0.001;
    slam.filter.init(&KalmanState { x: DVector::zeros(size), X })?;

    // Robot truth moves along the estimate, observations are exact
    for (step, &(v, w)) in [(1.0, 0.1), (1.0, 0.1), (0.5, -0.2)].iter().enumerate() {
        slam.predict(v, w)?;
        let pose = slam.filter.x().rows(0, POSE).clone_owned();

        for (k, l) in truth.iter().enumerate() {
            let z = range_bearing(&pose, l);
            if k < slam.landmarks {
                slam.stack_observation(k, &z)?;
            } else {
                slam.add_landmark(&z)?;
            }
        }
        let ia_x = slam.ia_x();
        slam.filter.correct_all_stacked(&ia_x)?;

        let X = slam.filter.X();
        let pose_var = Matrix2::new(X[(0, 0)], X[(0, 1)], X[(1, 0)], X[(1, 1)]);
        println!(
            "Step {} x{:.3} position variance trace {:.5}",
            step,
            slam.filter.x().rows(0, ia_x.len()).transpose(),
            pose_var.trace()
        );
    }
    Ok(())
}
