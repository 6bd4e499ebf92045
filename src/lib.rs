//!
//! Indirect EKF, the estimation core of an EKF SLAM system.
//! Copyright (c) 2020 Michael Stevens
//!
//! An Extended Kalman Filter keeps a single state vector and covariance matrix over a robot pose and an open set of landmarks.
//! Every step of the filter involves only a small part of that state: one sensor, one or a few landmarks, one noise source.
//! The operations of this library name those parts with index sets and update the covariance blocks they address in place,
//! without touching the rest of the covariance matrix.
//!
//! Prediction, landmark initialisation, landmark reparametrisation and correction are defined as traits in [`models`] and
//! implemented by the [`IndirectKalmanState`] estimator. Several simultaneous observations can be stacked and corrected jointly,
//! independently of the order they were stacked in.
//!
//! Linearisation of observation models is left to the caller, which supplies innovations with their Jacobians.
//!
//! # Licensing
//!
//! Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction,
//! including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software,
//! and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
//!
//! The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
//!
//! THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
//! FITNESS FOR A PARTICULAR PURPOSE AND NON INFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY,
//! WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
//!
//! [`IndirectKalmanState`]: estimators/indirect/struct.IndirectKalmanState.html

pub mod error;
pub mod index_set;
pub mod models;
pub mod noise;
pub mod estimators;
pub mod linalg;
pub mod matrix;

pub use error::{EstimateError, EstimateResult};
pub use estimators::indirect::IndirectKalmanState;
pub use index_set::IndexSet;
