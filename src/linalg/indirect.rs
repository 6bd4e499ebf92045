#![allow(non_snake_case)]

//! Indirect access to a state vector and covariance matrix.
//!
//! Blocks are addressed by [`IndexSet`]s. `project` gathers a block into a dense matrix,
//! the `add`/`assign` functions scatter a dense block back. No function here touches an entry
//! of the state that is not addressed by its index sets.

use nalgebra as na;
use na::{DMatrix, DVector, RealField};

use crate::error::{check_shape, EstimateError, EstimateResult};
use crate::index_set::IndexSet;
use crate::matrix::{congruence, symmetrize};

/// Gathers `x[ia]`.
pub fn project_vector<N: RealField>(x: &DVector<N>, ia: &IndexSet) -> DVector<N> {
    DVector::from_iterator(ia.len(), ia.iter().map(|&i| x[i]))
}

/// Gathers `M[ia_row, ia_col]`.
pub fn project<N: RealField>(M: &DMatrix<N>, ia_row: &IndexSet, ia_col: &IndexSet) -> DMatrix<N> {
    let (rows, cols) = (ia_row.as_slice(), ia_col.as_slice());
    DMatrix::from_fn(rows.len(), cols.len(), |r, c| M[(rows[r], cols[c])])
}

/// `x[ia] += v`
pub fn add_vector<N: RealField>(x: &mut DVector<N>, ia: &IndexSet, v: &DVector<N>) {
    for (k, &i) in ia.iter().enumerate() {
        x[i] += v[k];
    }
}

/// `M[ia_row, ia_col] = block`
pub fn assign<N: RealField>(M: &mut DMatrix<N>, ia_row: &IndexSet, ia_col: &IndexSet, block: &DMatrix<N>) {
    for (c, &j) in ia_col.iter().enumerate() {
        for (r, &i) in ia_row.iter().enumerate() {
            M[(i, j)] = block[(r, c)];
        }
    }
}

/// `M[ia_row, ia_col] = block` and `M[ia_col, ia_row] = block'`
pub fn assign_symmetric<N: RealField>(M: &mut DMatrix<N>, ia_row: &IndexSet, ia_col: &IndexSet, block: &DMatrix<N>) {
    for (c, &j) in ia_col.iter().enumerate() {
        for (r, &i) in ia_row.iter().enumerate() {
            let b = block[(r, c)];
            M[(i, j)] = b;
            M[(j, i)] = b;
        }
    }
}

/// `M[ia, ia] += block`, block must be symmetric.
pub fn add_symmetric<N: RealField>(M: &mut DMatrix<N>, ia: &IndexSet, block: &DMatrix<N>) {
    for (c, &j) in ia.iter().enumerate() {
        for (r, &i) in ia.iter().enumerate() {
            M[(i, j)] += block[(r, c)];
        }
    }
}

/// Propagates a covariance block through a Jacobian and scatters the result into `P`.
///
/// With `J` relating `ia_in` to `ia_out`:
///
/// P[out, inv] = J.P[in, inv]  (and the symmetric P[inv, out])
///
/// P[out, out] = J.P[in, in].J' + noise
///
/// Both blocks are computed before `P` is written, so `ia_in` may equal `ia_out`.
/// Entries addressed only by `ia_invariant` are read but never written, every entry outside
/// `ia_invariant` and `ia_out` is left untouched.
///
/// `ia_out` must be disjoint from `ia_invariant`.
pub fn scatter_add<N: RealField>(
    P: &mut DMatrix<N>,
    ia_invariant: &IndexSet,
    J: &DMatrix<N>,
    ia_in: &IndexSet,
    ia_out: &IndexSet,
    noise: Option<&DMatrix<N>>,
) -> EstimateResult<()> {
    let size = P.nrows();
    ia_invariant.check_bound(size)?;
    ia_in.check_bound(size)?;
    ia_out.check_bound(size)?;
    if !ia_out.is_disjoint(ia_invariant) {
        return Err(EstimateError::Overlapping("updated and invariant indices"));
    }
    check_shape("Jacobian", (ia_out.len(), ia_in.len()), J.shape())?;
    if let Some(Q) = noise {
        check_shape("noise covariance", (ia_out.len(), ia_out.len()), Q.shape())?;
    }

    let cross = J * project(P, ia_in, ia_invariant);
    let mut var = congruence(J, &project(P, ia_in, ia_in));
    if let Some(Q) = noise {
        var += Q;
        symmetrize(&mut var);
    }

    assign_symmetric(P, ia_out, ia_invariant, &cross);
    assign(P, ia_out, ia_out, &var);
    Ok(())
}
