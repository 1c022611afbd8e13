//! Per-operator shape (re-)inference, run after construction or after a rewrite pass
//! has changed operand wiring.

use crate::error::GraphResult;
use crate::operator::{matmul, transpose, unary, clip, cast, OpKind};

use super::Graph;

impl Graph {
    /// Walks operators in their current order and recomputes each one's output shape
    /// from its current input shapes, updating the output tensor in place when it
    /// differs. Does not touch dtype except where an operator's rule depends on it.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn shape_infer(&mut self) -> GraphResult<()> {
        let order = self.op_order().to_vec();
        for guid in order {
            let op = self.operator(guid)?;
            let kind = op.kind().clone();
            let inputs = op.inputs().to_vec();
            let outputs = op.outputs().to_vec();

            let new_shape = match &kind {
                OpKind::MatMul(attrs) => {
                    let a = self.tensor(inputs[0])?.shape().clone();
                    let b = self.tensor(inputs[1])?.shape().clone();
                    matmul::infer_shape(guid, &a, &b, *attrs)?
                }
                OpKind::Transpose(attrs) => {
                    let input = self.tensor(inputs[0])?.shape().clone();
                    transpose::infer_shape(&input, attrs)?
                }
                OpKind::Unary(_) => {
                    let input = self.tensor(inputs[0])?.shape().clone();
                    unary::infer_shape(&input)
                }
                OpKind::Clip(_) => {
                    let input = self.tensor(inputs[0])?.shape().clone();
                    clip::infer_shape(&input)
                }
                OpKind::Cast(_) => {
                    let input = self.tensor(inputs[0])?.shape().clone();
                    cast::infer_shape(&input)
                }
            };

            let out = outputs[0];
            if self.tensor(out)?.shape() != &new_shape {
                tracing::trace!(op = %guid, out = %out, shape = %new_shape, "shape updated");
                self.tensor_mut(out)?.set_shape(new_shape);
            }
        }
        Ok(())
    }
}
