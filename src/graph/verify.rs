//! Structural invariant checking (§3 / §8 universal invariants).
//!
//! `check_valid` is the one place this crate panics: it polices the graph's own
//! bookkeeping (the code in this module, not caller-supplied data), so a violation
//! here means a bug in `add_operator_and_connect`/`remove_operator`/rewrite, not bad
//! input. Every other fallible operation returns `Result` instead.

use std::collections::HashSet;

use super::Graph;

impl Graph {
    /// Asserts every invariant in §3 holds; panics with a descriptive message if not.
    /// Returns `true` on success (it never returns `false` — a violation panics instead).
    pub fn check_valid(&self) -> bool {
        let mut seen_fuids = HashSet::new();
        for tensor in self.tensors() {
            assert!(
                seen_fuids.insert(tensor.fuid()),
                "duplicate Fuid {}",
                tensor.fuid()
            );

            if let Some(source) = tensor.source() {
                let producer = self
                    .operator(source)
                    .unwrap_or_else(|_| panic!("tensor {} has dangling source {}", tensor.fuid(), source));
                assert!(
                    producer.outputs().contains(&tensor.fuid()),
                    "tensor {} claims source {} but is not in its outputs",
                    tensor.fuid(),
                    source
                );
            }

            for &consumer in tensor.targets() {
                let op = self
                    .operator(consumer)
                    .unwrap_or_else(|_| panic!("tensor {} has dangling target {}", tensor.fuid(), consumer));
                assert!(
                    op.inputs().contains(&tensor.fuid()),
                    "tensor {} claims target {} but is not in its inputs",
                    tensor.fuid(),
                    consumer
                );
            }

            assert!(
                tensor.source().is_some() || !tensor.targets().is_empty(),
                "tensor {} has neither a source nor any targets",
                tensor.fuid()
            );
        }

        let mut seen_guids = HashSet::new();
        for op in self.operators() {
            assert!(
                seen_guids.insert(op.guid()),
                "duplicate Guid {}",
                op.guid()
            );

            for &input in op.inputs() {
                assert!(
                    self.tensor(input).is_ok(),
                    "operator {} references unknown input tensor {}",
                    op.guid(),
                    input
                );
            }
            for &output in op.outputs() {
                assert!(
                    self.tensor(output).is_ok(),
                    "operator {} references unknown output tensor {}",
                    op.guid(),
                    output
                );
            }

            for &pred in op.preds() {
                let pred_op = self
                    .operator(pred)
                    .unwrap_or_else(|_| panic!("operator {} has dangling predecessor {}", op.guid(), pred));
                assert!(
                    pred_op.succs().contains(&op.guid()),
                    "predecessor/successor asymmetry between {} and {}",
                    pred,
                    op.guid()
                );
            }
            for &succ in op.succs() {
                let succ_op = self
                    .operator(succ)
                    .unwrap_or_else(|_| panic!("operator {} has dangling successor {}", op.guid(), succ));
                assert!(
                    succ_op.preds().contains(&op.guid()),
                    "predecessor/successor asymmetry between {} and {}",
                    op.guid(),
                    succ
                );
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use crate::dtype::DataType;
    use crate::graph::Graph;
    use crate::operator::UnaryKind;
    use crate::shape::Shape;

    #[test]
    fn freshly_built_graph_is_valid() {
        let mut g = Graph::new();
        let x = g.add_tensor(Shape::new(vec![2, 2]), DataType::Float32);
        let _ = g.add_unary(x, UnaryKind::Relu).unwrap();
        assert!(g.check_valid());
    }

    #[test]
    #[should_panic(expected = "dangling source")]
    fn dangling_source_panics() {
        let mut g = Graph::new();
        let x = g.add_tensor(Shape::new(vec![2, 2]), DataType::Float32);
        g.tensor_mut(x).unwrap().set_source(Some(crate::types::Guid::for_tests(999)));
        g.check_valid();
    }
}
