//! A thin ergonomic wrapper over `&mut Graph`: one short method per factory so call
//! sites read as a small DSL. Sugar only — every method forwards directly to a `Graph`
//! factory, and callers may always use the `Graph` factories instead.

use crate::dtype::DataType;
use crate::error::GraphResult;
use crate::operator::{CastKind, ClipAttrs, MatMulAttrs, TransposeAttrs, UnaryKind};
use crate::shape::Shape;
use crate::types::{Fuid, Guid};

use super::Graph;

pub struct GraphBuilder<'a> {
    graph: &'a mut Graph,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(graph: &'a mut Graph) -> Self {
        Self { graph }
    }

    /// Borrows the underlying graph, for call sites that need a read-only accessor
    /// (e.g. fetching an operator's output `Fuid`) between builder calls.
    pub fn graph(&self) -> &Graph {
        self.graph
    }

    pub fn input(&mut self, shape: Shape, dtype: DataType) -> Fuid {
        self.graph.add_tensor(shape, dtype)
    }

    pub fn matmul(&mut self, a: Fuid, b: Fuid, attrs: MatMulAttrs) -> GraphResult<Guid> {
        self.graph.add_matmul(a, b, attrs)
    }

    pub fn transpose(&mut self, input: Fuid, perm: Vec<usize>) -> GraphResult<Guid> {
        self.graph.add_transpose(input, TransposeAttrs::new(perm))
    }

    pub fn relu(&mut self, input: Fuid) -> GraphResult<Guid> {
        self.graph.add_unary(input, UnaryKind::Relu)
    }

    pub fn sigmoid(&mut self, input: Fuid) -> GraphResult<Guid> {
        self.graph.add_unary(input, UnaryKind::Sigmoid)
    }

    pub fn unary(&mut self, input: Fuid, kind: UnaryKind) -> GraphResult<Guid> {
        self.graph.add_unary(input, kind)
    }

    pub fn clip(&mut self, input: Fuid, min: Option<f32>, max: Option<f32>) -> GraphResult<Guid> {
        self.graph.add_clip(input, ClipAttrs { min, max })
    }

    pub fn cast(&mut self, input: Fuid, kind: CastKind) -> GraphResult<Guid> {
        self.graph.add_cast(input, kind)
    }
}
