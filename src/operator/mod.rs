//! Operator kinds and the shared `Operator` node type.
//!
//! Each kind's attributes and shape-inference rule live in their own submodule
//! (`matmul`, `transpose`, `unary`, `clip`, `cast`); this module ties them together
//! behind one closed, serializable tag so a `Graph` can store operators in a single
//! homogeneous slot arena instead of a `Vec<Box<dyn Operation>>`.

pub mod cast;
pub mod clip;
pub mod matmul;
pub mod transpose;
pub mod unary;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::types::{Fuid, Guid};

pub use cast::CastKind;
pub use clip::ClipAttrs;
pub use matmul::MatMulAttrs;
pub use transpose::TransposeAttrs;
pub use unary::UnaryKind;

/// The closed set of operator kinds this graph IR understands, each carrying its own
/// attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OpKind {
    MatMul(MatMulAttrs),
    Transpose(TransposeAttrs),
    Unary(UnaryKind),
    Clip(ClipAttrs),
    Cast(CastKind),
}

impl OpKind {
    pub fn name(&self) -> &'static str {
        match self {
            OpKind::MatMul(_) => "MatMul",
            OpKind::Transpose(_) => "Transpose",
            OpKind::Unary(kind) => kind.name(),
            OpKind::Clip(_) => "Clip",
            OpKind::Cast(_) => "Cast",
        }
    }
}

/// A node in the graph's operator half: an `OpKind`, its ordered operands, and its
/// connectivity to neighboring operators.
///
/// `inputs`/`outputs` are ordered (position is semantically meaningful — e.g. MatMul's
/// first input is `A`, second is `B`). `preds`/`succs` are unordered sets of the
/// operators that produce this operator's inputs / consume its outputs, maintained
/// symmetrically by the owning `Graph` so traversal never has to scan the whole graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operator {
    guid: Guid,
    kind: OpKind,
    inputs: Vec<Fuid>,
    outputs: Vec<Fuid>,
    preds: IndexSet<Guid>,
    succs: IndexSet<Guid>,
}

impl Operator {
    pub(crate) fn new(guid: Guid, kind: OpKind, inputs: Vec<Fuid>, outputs: Vec<Fuid>) -> Self {
        Self {
            guid,
            kind,
            inputs,
            outputs,
            preds: IndexSet::new(),
            succs: IndexSet::new(),
        }
    }

    pub fn guid(&self) -> Guid {
        self.guid
    }

    pub fn kind(&self) -> &OpKind {
        &self.kind
    }

    pub fn inputs(&self) -> &[Fuid] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Fuid] {
        &self.outputs
    }

    pub fn preds(&self) -> &IndexSet<Guid> {
        &self.preds
    }

    pub fn succs(&self) -> &IndexSet<Guid> {
        &self.succs
    }

    pub(crate) fn set_kind(&mut self, kind: OpKind) {
        self.kind = kind;
    }

    pub(crate) fn set_outputs(&mut self, outputs: Vec<Fuid>) {
        self.outputs = outputs;
    }

    /// Replaces the input at `pos` in place, leaving every other input and the
    /// connectivity sets untouched — the caller is responsible for updating
    /// `preds`/`succs` and the old/new tensors' `source`/`targets`.
    pub(crate) fn replace_input(&mut self, pos: usize, new_input: Fuid) {
        self.inputs[pos] = new_input;
    }

    pub(crate) fn add_pred(&mut self, op: Guid) {
        self.preds.insert(op);
    }

    pub(crate) fn remove_pred(&mut self, op: Guid) {
        self.preds.shift_remove(&op);
    }

    pub(crate) fn add_succ(&mut self, op: Guid) {
        self.succs.insert(op);
    }

    pub(crate) fn remove_succ(&mut self, op: Guid) {
        self.succs.shift_remove(&op);
    }
}
