use thiserror::Error;

use crate::shape::Shape;
use crate::types::{Fuid, Guid};

/// The single error surface for every fallible operation in this crate.
///
/// [`Graph::check_valid`](crate::graph::Graph::check_valid) treats a broken invariant as
/// a programming error and panics rather than returning this type; `StructuralViolation`
/// itself is still reachable as an ordinary `Result` from the handful of internal
/// bookkeeping guards (e.g. removing a tensor that still has a source or targets) that
/// run ahead of `check_valid` and can fail before anything panics.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("structural invariant violated: {0}")]
    StructuralViolation(String),

    #[error("topo_sort found a cycle; graph operator order was left unchanged")]
    Cycle,

    #[error("shape mismatch at operator {op} ({op_kind}): expected {expected}, found {found}")]
    ShapeMismatch {
        op: Guid,
        op_kind: &'static str,
        expected: Shape,
        found: Shape,
    },

    #[error("operator {op} requires rank >= {min_rank}, found rank {found_rank}")]
    RankTooLow {
        op: &'static str,
        min_rank: usize,
        found_rank: usize,
    },

    #[error("unsupported cast kind: {0:?}")]
    UnsupportedCast(crate::operator::cast::CastKind),

    #[error("invalid permutation {perm:?} for rank {rank}")]
    InvalidPermutation { perm: Vec<usize>, rank: usize },

    #[error("allocator exhausted: requested {requested} bytes, {available} available")]
    AllocatorExhausted { requested: usize, available: usize },

    #[error("tensor {0} not found in graph")]
    UnknownTensor(Fuid),

    #[error("operator {0} not found in graph")]
    UnknownOperator(Guid),
}

pub type GraphResult<T> = Result<T, GraphError>;
