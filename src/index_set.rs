//! Index sets.
//!
//! An [`IndexSet`] selects entries of the state vector and rows/columns of the state covariance.
//! Indices are unique and strictly increasing. All set operations preserve that ordering, so
//! combining sets is a linear merge.

use std::fmt;
use std::ops::Range;

use crate::error::{EstimateError, EstimateResult};

/// Ordered set of unique state indices.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct IndexSet {
    indices: Vec<usize>,
}

impl IndexSet {
    /// Creates an index set, the indices must be strictly increasing.
    pub fn new(indices: Vec<usize>) -> EstimateResult<IndexSet> {
        for (position, pair) in indices.windows(2).enumerate() {
            if pair[0] >= pair[1] {
                return Err(EstimateError::NotIncreasing { position: position + 1 });
            }
        }
        Ok(IndexSet { indices })
    }

    /// The contiguous set `start..end`.
    pub fn range(start: usize, end: usize) -> IndexSet {
        IndexSet {
            indices: (start..end).collect(),
        }
    }

    pub fn empty() -> IndexSet {
        IndexSet { indices: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }

    pub fn iter(&self) -> std::slice::Iter<'_, usize> {
        self.indices.iter()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    /// Indices of `self` that are not in `subset`.
    pub fn complement(&self, subset: &IndexSet) -> IndexSet {
        let mut indices = Vec::with_capacity(self.len().saturating_sub(subset.len()));
        let mut other = subset.indices.iter().peekable();
        for &i in &self.indices {
            while other.peek().map_or(false, |&&s| s < i) {
                other.next();
            }
            if other.peek() != Some(&&i) {
                indices.push(i);
            }
        }
        IndexSet { indices }
    }

    pub fn union(&self, other: &IndexSet) -> IndexSet {
        let (a, b) = (&self.indices, &other.indices);
        let mut indices = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            if a[i] < b[j] {
                indices.push(a[i]);
                i += 1;
            } else if b[j] < a[i] {
                indices.push(b[j]);
                j += 1;
            } else {
                indices.push(a[i]);
                i += 1;
                j += 1;
            }
        }
        indices.extend_from_slice(&a[i..]);
        indices.extend_from_slice(&b[j..]);
        IndexSet { indices }
    }

    pub fn intersection(&self, other: &IndexSet) -> IndexSet {
        let (a, b) = (&self.indices, &other.indices);
        let mut indices = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            if a[i] < b[j] {
                i += 1;
            } else if b[j] < a[i] {
                j += 1;
            } else {
                indices.push(a[i]);
                i += 1;
                j += 1;
            }
        }
        IndexSet { indices }
    }

    pub fn is_disjoint(&self, other: &IndexSet) -> bool {
        self.intersection(other).is_empty()
    }

    pub fn is_subset_of(&self, other: &IndexSet) -> bool {
        self.intersection(other).len() == self.len()
    }

    /// Checks every index addresses a state of `size`.
    pub fn check_bound(&self, size: usize) -> EstimateResult<()> {
        match self.indices.last() {
            Some(&index) if index >= size => Err(EstimateError::IndexOutOfRange { index, size }),
            _ => Ok(()),
        }
    }
}

impl From<Range<usize>> for IndexSet {
    fn from(r: Range<usize>) -> Self {
        IndexSet::range(r.start, r.end)
    }
}

impl<'a> IntoIterator for &'a IndexSet {
    type Item = &'a usize;
    type IntoIter = std::slice::Iter<'a, usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.indices.iter()
    }
}

impl fmt::Debug for IndexSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.indices.iter()).finish()
    }
}
