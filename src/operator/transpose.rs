use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};
use crate::shape::{self, Shape};

/// Attributes of a `Transpose` operator: a permutation of `0..rank`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransposeAttrs {
    pub perm: Vec<usize>,
}

impl TransposeAttrs {
    pub fn new(perm: Vec<usize>) -> Self {
        Self { perm }
    }

    pub fn is_identity(&self) -> bool {
        shape::is_identity(&self.perm)
    }

    /// True iff this transpose only swaps the last two axes — the shape R2's
    /// fusion-into-MatMul rule looks for.
    pub fn is_last_two_swap(&self) -> bool {
        shape::is_last_two_swap(&self.perm)
    }
}

/// Output shape = input shape permuted by `perm`. `perm` must be a permutation of
/// `0..rank(input)`.
pub fn infer_shape(input: &Shape, attrs: &TransposeAttrs) -> GraphResult<Shape> {
    if !shape::is_permutation(&attrs.perm, input.rank()) {
        return Err(GraphError::InvalidPermutation {
            perm: attrs.perm.clone(),
            rank: input.rank(),
        });
    }
    Ok(input.permuted(&attrs.perm))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permutes_dims() {
        let input = Shape::new(vec![2, 3, 4]);
        let attrs = TransposeAttrs::new(vec![0, 2, 1]);
        let out = infer_shape(&input, &attrs).unwrap();
        assert_eq!(out.as_slice(), &[2, 4, 3]);
    }

    #[test]
    fn rejects_non_permutation() {
        let input = Shape::new(vec![2, 3, 4]);
        let attrs = TransposeAttrs::new(vec![0, 0, 1]);
        assert!(infer_shape(&input, &attrs).is_err());
    }

    #[test]
    fn identity_is_not_a_last_two_swap() {
        let attrs = TransposeAttrs::new(vec![0, 1, 2]);
        assert!(attrs.is_identity());
        assert!(!attrs.is_last_two_swap());
    }
}
