//! The rewrite pass: redundant inverse-Transpose elimination (R1) and
//! Transpose-into-MatMul fusion (R2).

use crate::error::{GraphError, GraphResult};
use crate::operator::OpKind;
use crate::shape;
use crate::types::Guid;

use super::Graph;

impl Graph {
    /// Runs the rewrite pass to a fixpoint: repeatedly scans operators in topological
    /// order applying R1/R2 until a full pass makes no change.
    ///
    /// Precondition: the graph must be (or become, via an internal `topo_sort`) sorted;
    /// `GraphError::Cycle` is returned otherwise.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn optimize(&mut self) -> GraphResult<()> {
        if !self.topo_sort() {
            return Err(GraphError::Cycle);
        }

        loop {
            let mut changed = false;
            let order = self.op_order().to_vec();
            for guid in order {
                let kind = match self.operator(guid) {
                    Ok(op) => op.kind().clone(),
                    Err(_) => continue,
                };
                let rewrote = match kind {
                    OpKind::Transpose(_) => self.try_fuse_transpose_pair(guid)?,
                    OpKind::MatMul(_) => self.try_fuse_transpose_into_matmul(guid)?,
                    _ => false,
                };
                if rewrote {
                    changed = true;
                    break;
                }
            }
            if !changed {
                break;
            }
        }

        self.sorted = false;
        if !self.topo_sort() {
            return Err(GraphError::Cycle);
        }
        Ok(())
    }

    /// R1: if `guid` is a Transpose whose single output is consumed by exactly one
    /// operator, itself a Transpose, and the two permutations cancel, removes both
    /// operators and their intermediate tensors, rewiring the second Transpose's
    /// consumers directly onto the first Transpose's input.
    fn try_fuse_transpose_pair(&mut self, guid: Guid) -> GraphResult<bool> {
        let op = self.operator(guid)?;
        let attrs1 = match op.kind() {
            OpKind::Transpose(attrs) => attrs.clone(),
            _ => return Ok(false),
        };
        let t0 = op.inputs()[0];
        let t1 = op.outputs()[0];

        let t1_tensor = self.tensor(t1)?;
        if t1_tensor.targets().len() != 1 {
            return Ok(false);
        }
        let second_guid = *t1_tensor.targets().iter().next().unwrap();

        let second_op = self.operator(second_guid)?;
        let attrs2 = match second_op.kind() {
            OpKind::Transpose(attrs) => attrs.clone(),
            _ => return Ok(false),
        };
        if second_op.inputs()[0] != t1 {
            return Ok(false);
        }
        let t3 = second_op.outputs()[0];

        let composed = shape::compose(&attrs2.perm, &attrs1.perm);
        if !shape::is_identity(&composed) {
            return Ok(false);
        }

        let consumers: Vec<Guid> = self.tensor(t3)?.targets().iter().copied().collect();
        for c in consumers {
            self.replace_input(c, t3, t0)?;
            self.tensor_mut(t3)?.remove_target(c);
            self.tensor_mut(t0)?.add_target(c);
            self.operator_mut(c)?.remove_pred(second_guid);
            self.operator_mut(second_guid)?.remove_succ(c);
            if let Some(source) = self.tensor(t0)?.source() {
                self.operator_mut(source)?.add_succ(c);
                self.operator_mut(c)?.add_pred(source);
            }
        }

        self.tensor_mut(t0)?.remove_target(guid);
        self.tensor_mut(t1)?.remove_target(second_guid);
        self.tensor_mut(t1)?.set_source(None);
        self.tensor_mut(t3)?.set_source(None);

        self.remove_operator(guid)?;
        self.remove_operator(second_guid)?;
        self.remove_tensor(t1)?;
        self.remove_tensor(t3)?;

        tracing::debug!(first = %guid, second = %second_guid, "R1: eliminated redundant transpose pair");
        Ok(true)
    }

    /// R2: for each of `guid`'s two MatMul operands independently, if its producer is a
    /// Transpose that only swaps the last two axes, toggles the matching trans flag and
    /// splices the Transpose's input directly into the MatMul, dropping the Transpose
    /// operator and its now-orphan output tensor.
    fn try_fuse_transpose_into_matmul(&mut self, guid: Guid) -> GraphResult<bool> {
        let op = self.operator(guid)?;
        let mut attrs = match op.kind() {
            OpKind::MatMul(attrs) => *attrs,
            _ => return Ok(false),
        };
        let inputs = op.inputs().to_vec();
        let mut changed = false;

        for slot in 0..2 {
            let t_out = inputs[slot];
            let producer = match self.tensor(t_out)?.source() {
                Some(p) => p,
                None => continue,
            };
            let producer_op = self.operator(producer)?;
            let t_attrs = match producer_op.kind() {
                OpKind::Transpose(attrs) => attrs.clone(),
                _ => continue,
            };
            if !t_attrs.is_last_two_swap() {
                continue;
            }
            let t_in = producer_op.inputs()[0];

            if slot == 0 {
                attrs.trans_a = !attrs.trans_a;
            } else {
                attrs.trans_b = !attrs.trans_b;
            }

            self.tensor_mut(t_in)?.add_target(guid);
            self.tensor_mut(t_out)?.set_source(None);
            self.tensor_mut(t_out)?.remove_target(guid);
            self.replace_input(guid, t_out, t_in)?;
            self.operator_mut(guid)?.remove_pred(producer);
            self.operator_mut(producer)?.remove_succ(guid);
            if let Some(source) = self.tensor(t_in)?.source() {
                self.operator_mut(source)?.add_succ(guid);
                self.operator_mut(guid)?.add_pred(source);
            }

            self.remove_operator(producer)?;
            self.remove_tensor(t_out)?;
            changed = true;
            tracing::debug!(matmul = %guid, slot, transpose = %producer, "R2: fused transpose into matmul operand");
        }

        if changed {
            self.operator_mut(guid)?.set_kind(OpKind::MatMul(attrs));
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use crate::dtype::DataType;
    use crate::graph::Graph;
    use crate::operator::{MatMulAttrs, OpKind, TransposeAttrs};
    use crate::shape::Shape;

    #[test]
    fn r1_eliminates_inverse_transpose_pair() {
        let mut g = Graph::new();
        let x = g.add_tensor(Shape::new(vec![2, 3, 4]), DataType::Float32);
        let t1 = g.add_transpose(x, TransposeAttrs::new(vec![0, 2, 1])).unwrap();
        let t1_out = g.operator(t1).unwrap().outputs()[0];
        let t2 = g
            .add_transpose(t1_out, TransposeAttrs::new(vec![0, 2, 1]))
            .unwrap();
        let t2_out = g.operator(t2).unwrap().outputs()[0];
        let relu = g
            .add_unary(t2_out, crate::operator::UnaryKind::Relu)
            .unwrap();

        g.optimize().unwrap();

        assert!(g.operator(t1).is_err());
        assert!(g.operator(t2).is_err());
        let relu_op = g.operator(relu).unwrap();
        assert_eq!(relu_op.inputs()[0], x);
        assert!(g.tensor(x).unwrap().targets().contains(&relu));
        assert!(g.check_valid());
    }

    #[test]
    fn r1_does_not_fire_when_intermediate_has_two_consumers() {
        let mut g = Graph::new();
        let x = g.add_tensor(Shape::new(vec![2, 3]), DataType::Float32);
        let t1 = g.add_transpose(x, TransposeAttrs::new(vec![1, 0])).unwrap();
        let t1_out = g.operator(t1).unwrap().outputs()[0];
        let _t2 = g
            .add_transpose(t1_out, TransposeAttrs::new(vec![1, 0]))
            .unwrap();
        let _extra = g.add_unary(t1_out, crate::operator::UnaryKind::Relu).unwrap();

        g.optimize().unwrap();
        assert!(g.operator(t1).is_ok());
        assert!(g.check_valid());
    }

    #[test]
    fn r2_fuses_last_two_swap_transpose_into_matmul_operand_a() {
        let mut g = Graph::new();
        let x = g.add_tensor(Shape::new(vec![4, 3]), DataType::Float32);
        let y = g.add_tensor(Shape::new(vec![4, 5]), DataType::Float32);
        let t = g.add_transpose(x, TransposeAttrs::new(vec![1, 0])).unwrap();
        let t_out = g.operator(t).unwrap().outputs()[0];
        let mm = g
            .add_matmul(t_out, y, MatMulAttrs { trans_a: false, trans_b: false })
            .unwrap();

        g.optimize().unwrap();

        assert!(g.operator(t).is_err());
        let op = g.operator(mm).unwrap();
        assert_eq!(op.inputs()[0], x);
        match op.kind() {
            OpKind::MatMul(attrs) => assert!(attrs.trans_a),
            _ => panic!("expected matmul"),
        }
        assert!(g.check_valid());
    }

    #[test]
    fn r2_preserves_pre_existing_trans_b() {
        let mut g = Graph::new();
        let x = g.add_tensor(Shape::new(vec![4, 3]), DataType::Float32);
        let y = g.add_tensor(Shape::new(vec![5, 4]), DataType::Float32);
        let t = g.add_transpose(y, TransposeAttrs::new(vec![1, 0])).unwrap();
        let t_out = g.operator(t).unwrap().outputs()[0];
        let mm = g
            .add_matmul(x, t_out, MatMulAttrs { trans_a: false, trans_b: true })
            .unwrap();

        g.optimize().unwrap();

        let op = g.operator(mm).unwrap();
        assert_eq!(op.inputs()[1], y);
        match op.kind() {
            OpKind::MatMul(attrs) => assert!(!attrs.trans_b),
            _ => panic!("expected matmul"),
        }
    }

    #[test]
    fn non_last_two_swap_transpose_does_not_fuse() {
        let mut g = Graph::new();
        let x = g.add_tensor(Shape::new(vec![2, 3, 4]), DataType::Float32);
        let y = g.add_tensor(Shape::new(vec![2, 4, 5]), DataType::Float32);
        let t = g
            .add_transpose(x, TransposeAttrs::new(vec![1, 0, 2]))
            .unwrap();
        let t_out = g.operator(t).unwrap().outputs()[0];
        // t_out has shape [3,2,4]; mismatched for matmul with y [2,4,5], so build a
        // compatible pair instead: just confirm the transpose survives optimize.
        let _ = g.add_unary(t_out, crate::operator::UnaryKind::Relu).unwrap();
        let _ = y;

        g.optimize().unwrap();
        assert!(g.operator(t).is_ok());
    }

    #[test]
    fn optimize_is_idempotent() {
        let mut g = Graph::new();
        let x = g.add_tensor(Shape::new(vec![2, 3, 4]), DataType::Float32);
        let t1 = g.add_transpose(x, TransposeAttrs::new(vec![0, 2, 1])).unwrap();
        let t1_out = g.operator(t1).unwrap().outputs()[0];
        let t2 = g
            .add_transpose(t1_out, TransposeAttrs::new(vec![0, 2, 1]))
            .unwrap();
        let t2_out = g.operator(t2).unwrap().outputs()[0];
        let _ = g.add_unary(t2_out, crate::operator::UnaryKind::Relu).unwrap();

        g.optimize().unwrap();
        let first_pass = g.to_string();
        g.optimize().unwrap();
        assert_eq!(g.to_string(), first_pass);
    }
}
