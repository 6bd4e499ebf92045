//! Indirectly addressed state estimators.

pub mod indirect;
pub mod stacked;
