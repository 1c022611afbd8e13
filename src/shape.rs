use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered, non-negative-integer dimension list.
///
/// A lightweight domain-specific wrapper rather than an `ndarray` dimension type: this
/// crate only ever reasons about shapes, never about the data they describe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape(Vec<usize>);

impl Shape {
    pub fn new(dims: impl Into<Vec<usize>>) -> Self {
        Self(dims.into())
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Total element count: the product of all dims (1 for a rank-0 scalar).
    pub fn numel(&self) -> usize {
        self.0.iter().product()
    }

    /// Returns a new shape with dims reordered by `perm`.
    ///
    /// `perm` must be a permutation of `0..rank()`; see [`is_permutation`].
    pub fn permuted(&self, perm: &[usize]) -> Shape {
        debug_assert!(is_permutation(perm, self.rank()));
        Shape(perm.iter().map(|&i| self.0[i]).collect())
    }

    /// Returns a copy of this shape with its last two dims swapped.
    ///
    /// Requires `rank() >= 2`.
    pub fn swap_last_two(&self) -> Shape {
        let mut dims = self.0.clone();
        let n = dims.len();
        dims.swap(n - 1, n - 2);
        Shape(dims)
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self(dims)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

/// True iff `perm` is a bijection on `0..rank`.
pub fn is_permutation(perm: &[usize], rank: usize) -> bool {
    if perm.len() != rank {
        return false;
    }
    let mut seen = vec![false; rank];
    for &p in perm {
        if p >= rank || seen[p] {
            return false;
        }
        seen[p] = true;
    }
    true
}

/// True iff `perm` is the identity permutation `[0, 1, .., rank-1]`.
pub fn is_identity(perm: &[usize]) -> bool {
    perm.iter().enumerate().all(|(i, &p)| i == p)
}

/// True iff `perm` swaps only the last two axes and leaves every other axis in place.
pub fn is_last_two_swap(perm: &[usize]) -> bool {
    let rank = perm.len();
    if rank < 2 {
        return false;
    }
    perm[rank - 2] == rank - 1
        && perm[rank - 1] == rank - 2
        && perm[..rank - 2].iter().enumerate().all(|(i, &p)| i == p)
}

/// Composes two permutations as `apply first, then second`: `compose(p2, p1)[i] = p2[p1[i]]`.
///
/// Used by rewrite rule R1 to check that two chained Transposes cancel out.
pub fn compose(second: &[usize], first: &[usize]) -> Vec<usize> {
    debug_assert_eq!(second.len(), first.len());
    first.iter().map(|&i| second[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permute_reorders_dims() {
        let s = Shape::new(vec![2, 3, 4]);
        assert_eq!(s.permuted(&[0, 2, 1]).as_slice(), &[2, 4, 3]);
    }

    #[test]
    fn identity_detection() {
        assert!(is_identity(&[0, 1, 2]));
        assert!(!is_identity(&[1, 0, 2]));
    }

    #[test]
    fn last_two_swap_detection() {
        assert!(is_last_two_swap(&[0, 2, 1]));
        assert!(!is_last_two_swap(&[1, 0, 2]));
        assert!(is_last_two_swap(&[1, 0]));
        // identity must not be mistaken for a last-two swap
        assert!(!is_last_two_swap(&[0, 1]));
    }

    #[test]
    fn compose_of_inverse_permutations_is_identity() {
        let perm = vec![0, 2, 1];
        let composed = compose(&perm, &perm);
        assert!(is_identity(&composed));
    }

    #[test]
    fn non_permutation_rejected() {
        assert!(!is_permutation(&[0, 0, 2], 3));
        assert!(!is_permutation(&[0, 1], 3));
    }
}
