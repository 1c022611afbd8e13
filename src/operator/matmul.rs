use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};
use crate::shape::Shape;
use crate::types::Guid;

/// Attributes of a `MatMul` operator.
///
/// `trans_a`/`trans_b` mirror the ONNX Gemm-style convention: when set, the
/// corresponding operand's last two dims are swapped before multiplying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatMulAttrs {
    pub trans_a: bool,
    pub trans_b: bool,
}

/// `MatMul(A, B, transA, transB)`: requires `rank(A) == rank(B) >= 2` and, after
/// accounting for the trans flags, `A'.last == B'.second_to_last`.
///
/// Output shape is `A'` in every dim but the last, which is taken from `B'`.
/// Batch-dim broadcasting is out of scope.
pub fn infer_shape(guid: Guid, a: &Shape, b: &Shape, attrs: MatMulAttrs) -> GraphResult<Shape> {
    let rank = a.rank();
    if rank < 2 {
        return Err(GraphError::RankTooLow {
            op: "MatMul",
            min_rank: 2,
            found_rank: rank,
        });
    }
    if b.rank() != rank {
        return Err(GraphError::ShapeMismatch {
            op: guid,
            op_kind: "MatMul",
            expected: a.clone(),
            found: b.clone(),
        });
    }

    let a_eff = if attrs.trans_a { a.swap_last_two() } else { a.clone() };
    let b_eff = if attrs.trans_b { b.swap_last_two() } else { b.clone() };

    let a_inner = a_eff.as_slice()[rank - 1];
    let b_inner = b_eff.as_slice()[rank - 2];
    if a_inner != b_inner {
        return Err(GraphError::ShapeMismatch {
            op: guid,
            op_kind: "MatMul",
            expected: a_eff.clone(),
            found: b_eff.clone(),
        });
    }

    let mut out = a_eff.as_slice().to_vec();
    *out.last_mut().unwrap() = *b_eff.as_slice().last().unwrap();
    Ok(Shape::new(out))
}
