//! The `Graph`: owns every tensor and operator, and exposes the lifecycle operations
//! (construction, topological sort, shape inference, rewrite, memory planning,
//! validity checking, diagnostic rendering) that act on them.
//!
//! Tensors and operators live in graph-owned slot arenas (`Vec<Option<T>>`) addressed
//! directly by their `Fuid`/`Guid` — removal clears a slot to `None` rather than
//! shifting indices, so ids stay stable for the graph's lifetime.

mod dsl;
mod memory;
mod rewrite;
mod shape_infer;
mod topo;
mod verify;

pub use dsl::GraphBuilder;

use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::arena::BumpAllocator;
use crate::dtype::DataType;
use crate::error::{GraphError, GraphResult};
use crate::operator::{cast, clip, matmul, transpose, unary};
use crate::operator::{CastKind, ClipAttrs, MatMulAttrs, OpKind, Operator, TransposeAttrs, UnaryKind};
use crate::shape::Shape;
use crate::tensor::Tensor;
use crate::types::{Fuid, Guid, IdAllocator};

/// A bipartite DAG of tensors and operators, plus the arena they plan storage into.
///
/// Not `Sync`: mutating a `Graph` from more than one thread without external
/// synchronization is undefined, matching the single-owner model described for this
/// crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    tensors: Vec<Option<Tensor>>,
    operators: Vec<Option<Operator>>,
    op_order: Vec<Guid>,
    ids: IdAllocator,
    arena: BumpAllocator,
    sorted: bool,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self {
            tensors: Vec::new(),
            operators: Vec::new(),
            op_order: Vec::new(),
            ids: IdAllocator::default(),
            arena: BumpAllocator::new(),
            sorted: true,
        }
    }

    /// A graph whose arena fails once `capacity` bytes have been requested.
    pub fn with_arena_capacity(capacity: usize) -> Self {
        Self {
            arena: BumpAllocator::with_capacity(capacity),
            ..Self::new()
        }
    }

    // -- tensor/operator accessors -----------------------------------------------

    pub fn tensor(&self, id: Fuid) -> GraphResult<&Tensor> {
        self.tensors
            .get(id.get())
            .and_then(|slot| slot.as_ref())
            .ok_or(GraphError::UnknownTensor(id))
    }

    pub(crate) fn tensor_mut(&mut self, id: Fuid) -> GraphResult<&mut Tensor> {
        self.tensors
            .get_mut(id.get())
            .and_then(|slot| slot.as_mut())
            .ok_or(GraphError::UnknownTensor(id))
    }

    pub fn operator(&self, id: Guid) -> GraphResult<&Operator> {
        self.operators
            .get(id.get())
            .and_then(|slot| slot.as_ref())
            .ok_or(GraphError::UnknownOperator(id))
    }

    pub(crate) fn operator_mut(&mut self, id: Guid) -> GraphResult<&mut Operator> {
        self.operators
            .get_mut(id.get())
            .and_then(|slot| slot.as_mut())
            .ok_or(GraphError::UnknownOperator(id))
    }

    /// Operators in their current order — topological once `topo_sort` has run.
    pub fn op_order(&self) -> &[Guid] {
        &self.op_order
    }

    /// Every tensor currently live in the graph, in creation order.
    pub fn tensors(&self) -> impl Iterator<Item = &Tensor> {
        self.tensors.iter().filter_map(|slot| slot.as_ref())
    }

    /// Every operator currently live in the graph, in creation order (not necessarily
    /// topological — see [`Graph::op_order`]).
    pub fn operators(&self) -> impl Iterator<Item = &Operator> {
        self.operators.iter().filter_map(|slot| slot.as_ref())
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn arena_info(&self) -> crate::arena::ArenaInfo {
        use crate::arena::ArenaAllocator;
        self.arena.info()
    }

    // -- construction --------------------------------------------------------------

    /// Creates a new, unconnected tensor (a graph input or constant until an operator
    /// claims it as an output).
    pub fn add_tensor(&mut self, shape: Shape, dtype: DataType) -> Fuid {
        let fuid = self.ids.next_fuid();
        let tensor = Tensor::new(fuid, shape, dtype);
        debug_assert_eq!(fuid.get(), self.tensors.len());
        self.tensors.push(Some(tensor));
        fuid
    }

    /// Registers an already-constructed `Tensor` into this graph, re-parenting it under
    /// a fresh `Fuid` from this graph's own allocator (any id it carried before is
    /// discarded). For a tensor built fresh from a shape and dtype, prefer
    /// [`Graph::add_tensor`]; this is for a `Tensor` value assembled elsewhere in the
    /// crate — e.g. cloned from another tensor's shape/dtype by a rewrite rule — that
    /// still needs to be owned and connectivity-tracked by this graph.
    pub fn add_existing_tensor(&mut self, mut tensor: Tensor) -> Fuid {
        let fuid = self.ids.next_fuid();
        tensor.set_fuid(fuid);
        debug_assert_eq!(fuid.get(), self.tensors.len());
        self.tensors.push(Some(tensor));
        fuid
    }

    /// Appends `op` to the operator list and wires its connectivity, per §4.1:
    /// - each input tensor gains `op` as a target, and if it already has a source, a
    ///   predecessor/successor edge is added between that source and `op`;
    /// - each output tensor has its source set to `op`, and an edge is added from `op`
    ///   to each of that tensor's existing targets.
    ///
    /// Clears the sorted flag.
    fn add_operator_and_connect(&mut self, op: Operator) -> GraphResult<Guid> {
        let guid = op.guid();
        let inputs = op.inputs().to_vec();
        let outputs = op.outputs().to_vec();

        debug_assert_eq!(guid.get(), self.operators.len());
        self.operators.push(Some(op));
        self.op_order.push(guid);

        for input in &inputs {
            let source = self.tensor(*input)?.source();
            self.tensor_mut(*input)?.add_target(guid);
            if let Some(source) = source {
                self.operator_mut(source)?.add_succ(guid);
                self.operator_mut(guid)?.add_pred(source);
            }
        }

        for output in &outputs {
            let existing_targets: IndexSet<Guid> = self.tensor(*output)?.targets().clone();
            self.tensor_mut(*output)?.set_source(Some(guid));
            for target in existing_targets {
                self.operator_mut(guid)?.add_succ(target);
                self.operator_mut(target)?.add_pred(guid);
            }
        }

        self.sorted = false;
        tracing::debug!(op = %guid, kind = self.operator(guid)?.kind().name(), "operator connected");
        Ok(guid)
    }

    /// Detaches `op` from every neighbour's predecessor/successor set and removes it
    /// from the operator list. Does not touch tensor source/target sets — callers
    /// performing rewrites update those themselves before calling this.
    pub(crate) fn remove_operator(&mut self, op: Guid) -> GraphResult<()> {
        let preds: Vec<Guid> = self.operator(op)?.preds().iter().copied().collect();
        let succs: Vec<Guid> = self.operator(op)?.succs().iter().copied().collect();
        for pred in preds {
            if let Ok(pred_op) = self.operator_mut(pred) {
                pred_op.remove_succ(op);
            }
        }
        for succ in succs {
            if let Ok(succ_op) = self.operator_mut(succ) {
                succ_op.remove_pred(op);
            }
        }
        self.operators[op.get()] = None;
        self.op_order.retain(|&g| g != op);
        self.sorted = false;
        Ok(())
    }

    /// Removes `t` from the tensor list. `t` must have no producer and no consumers.
    pub(crate) fn remove_tensor(&mut self, t: Fuid) -> GraphResult<()> {
        let tensor = self.tensor(t)?;
        if !tensor.is_orphan() {
            return Err(GraphError::StructuralViolation(format!(
                "remove_tensor({t}) called while it still has a source or targets"
            )));
        }
        self.tensors[t.get()] = None;
        Ok(())
    }

    /// Substitutes `old` with `new` in `op`'s input list, preserving order. The
    /// operator's predecessor set and both tensors' target sets are the caller's
    /// responsibility.
    pub(crate) fn replace_input(&mut self, op: Guid, old: Fuid, new: Fuid) -> GraphResult<()> {
        let operator = self.operator_mut(op)?;
        let pos = operator
            .inputs()
            .iter()
            .position(|&i| i == old)
            .ok_or_else(|| {
                GraphError::StructuralViolation(format!("{op} has no input {old} to replace"))
            })?;
        operator.replace_input(pos, new);
        self.sorted = false;
        Ok(())
    }

    // -- operator factories ---------------------------------------------------------

    pub fn add_matmul(&mut self, a: Fuid, b: Fuid, attrs: MatMulAttrs) -> GraphResult<Guid> {
        let guid = self.ids.next_guid();
        let a_shape = self.tensor(a)?.shape().clone();
        let b_shape = self.tensor(b)?.shape().clone();
        let out_shape = matmul::infer_shape(guid, &a_shape, &b_shape, attrs)?;
        let dtype = self.tensor(a)?.dtype();
        let out = self.add_tensor(out_shape, dtype);
        let op = Operator::new(guid, OpKind::MatMul(attrs), vec![a, b], vec![out]);
        let guid = self.add_operator_and_connect(op)?;
        self.check_valid();
        Ok(guid)
    }

    pub fn add_transpose(&mut self, input: Fuid, attrs: TransposeAttrs) -> GraphResult<Guid> {
        let guid = self.ids.next_guid();
        let in_shape = self.tensor(input)?.shape().clone();
        let out_shape = transpose::infer_shape(&in_shape, &attrs)?;
        let dtype = self.tensor(input)?.dtype();
        let out = self.add_tensor(out_shape, dtype);
        let op = Operator::new(guid, OpKind::Transpose(attrs), vec![input], vec![out]);
        let guid = self.add_operator_and_connect(op)?;
        self.check_valid();
        Ok(guid)
    }

    pub fn add_unary(&mut self, input: Fuid, kind: UnaryKind) -> GraphResult<Guid> {
        let guid = self.ids.next_guid();
        let in_shape = self.tensor(input)?.shape().clone();
        let out_shape = unary::infer_shape(&in_shape);
        let dtype = self.tensor(input)?.dtype();
        let out = self.add_tensor(out_shape, dtype);
        let op = Operator::new(guid, OpKind::Unary(kind), vec![input], vec![out]);
        let guid = self.add_operator_and_connect(op)?;
        self.check_valid();
        Ok(guid)
    }

    pub fn add_clip(&mut self, input: Fuid, attrs: ClipAttrs) -> GraphResult<Guid> {
        let guid = self.ids.next_guid();
        let in_shape = self.tensor(input)?.shape().clone();
        let out_shape = clip::infer_shape(&in_shape);
        let dtype = self.tensor(input)?.dtype();
        let out = self.add_tensor(out_shape, dtype);
        let op = Operator::new(guid, OpKind::Clip(attrs), vec![input], vec![out]);
        let guid = self.add_operator_and_connect(op)?;
        self.check_valid();
        Ok(guid)
    }

    pub fn add_cast(&mut self, input: Fuid, kind: CastKind) -> GraphResult<Guid> {
        let guid = self.ids.next_guid();
        let in_shape = self.tensor(input)?.shape().clone();
        let in_dtype = self.tensor(input)?.dtype();
        if in_dtype != kind.input_dtype() {
            return Err(GraphError::UnsupportedCast(kind));
        }
        let out_shape = cast::infer_shape(&in_shape);
        let out = self.add_tensor(out_shape, kind.output_dtype());
        let op = Operator::new(guid, OpKind::Cast(kind), vec![input], vec![out]);
        let guid = self.add_operator_and_connect(op)?;
        self.check_valid();
        Ok(guid)
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "graph {{")?;
        for tensor in self.tensors() {
            let source = tensor
                .source()
                .map(|g| g.to_string())
                .unwrap_or_else(|| "-".to_string());
            let targets: Vec<String> = tensor.targets().iter().map(|g| g.to_string()).collect();
            writeln!(
                f,
                "  tensor {} : {}{} source={} targets=[{}]",
                tensor.fuid(),
                tensor.dtype(),
                tensor.shape(),
                source,
                targets.join(",")
            )?;
        }
        for &guid in &self.op_order {
            let Ok(op) = self.operator(guid) else { continue };
            let preds: Vec<String> = op.preds().iter().map(|g| g.to_string()).collect();
            let succs: Vec<String> = op.succs().iter().map(|g| g.to_string()).collect();
            let inputs: Vec<String> = op.inputs().iter().map(|t| t.to_string()).collect();
            let outputs: Vec<String> = op.outputs().iter().map(|t| t.to_string()).collect();
            writeln!(
                f,
                "  op {} : {} inputs=[{}] outputs=[{}] preds=[{}] succs=[{}]",
                guid,
                op.kind().name(),
                inputs.join(","),
                outputs.join(","),
                preds.join(","),
                succs.join(",")
            )?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_operator_and_connect_wires_producer_and_consumer() {
        let mut g = Graph::new();
        let x = g.add_tensor(Shape::new(vec![2, 2]), DataType::Float32);
        let relu = g.add_unary(x, UnaryKind::Relu).unwrap();
        let relu_out = g.operator(relu).unwrap().outputs()[0];
        let sigmoid = g.add_unary(relu_out, UnaryKind::Sigmoid).unwrap();

        assert!(g.tensor(x).unwrap().targets().contains(&relu));
        assert!(g.operator(relu).unwrap().preds().is_empty());
        assert!(g.operator(relu).unwrap().succs().contains(&sigmoid));
        assert!(g.operator(sigmoid).unwrap().preds().contains(&relu));
        assert!(g.check_valid());
    }

    #[test]
    fn display_includes_every_tensor_and_operator() {
        let mut g = Graph::new();
        let x = g.add_tensor(Shape::new(vec![2, 2]), DataType::Float32);
        let relu = g.add_unary(x, UnaryKind::Relu).unwrap();
        let rendered = g.to_string();
        assert!(rendered.contains(&x.to_string()));
        assert!(rendered.contains(&relu.to_string()));
    }

    #[test]
    fn unknown_tensor_is_an_error_not_a_panic() {
        let g = Graph::new();
        assert!(matches!(
            g.tensor(Fuid::for_tests(42)),
            Err(GraphError::UnknownTensor(_))
        ));
    }

    #[test]
    fn add_existing_tensor_reassigns_a_fresh_fuid() {
        let mut g = Graph::new();
        let first = g.add_tensor(Shape::new(vec![2, 2]), DataType::Float32);

        // Built elsewhere with a placeholder id; the graph must overwrite it rather
        // than trust whatever id the caller happened to stamp on it.
        let standalone = Tensor::new(Fuid(0), Shape::new(vec![3]), DataType::Int32);
        let second = g.add_existing_tensor(standalone);

        assert_ne!(first, second);
        assert_eq!(g.tensor(second).unwrap().fuid(), second);
        assert_eq!(g.tensor(second).unwrap().dims(), &[3]);
        assert!(g.tensor(second).unwrap().is_orphan());
    }
}
