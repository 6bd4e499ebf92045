//! Linear algebra for indirectly addressed states.
//!
//! [`indirect`] gathers and scatters blocks of a state addressed by index sets.
//! [`rcond`] estimates reciprocal condition numbers.

pub mod indirect;
pub mod rcond;
