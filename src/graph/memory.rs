//! Memory planning: assigns every tensor an offset within the graph's arena.

use crate::arena::ArenaAllocator;
use crate::error::{GraphError, GraphResult};
use crate::tensor::StorageBinding;

use super::Graph;

impl Graph {
    /// Precondition: `topo_sort` must have succeeded.
    ///
    /// Requests a byte offset from the arena for every tensor, in creation order, then
    /// binds each tensor a `StorageBinding` of `(base_ptr, offset, bytes)`. Does not
    /// account for tensor lifetimes — every live tensor gets its own disjoint region for
    /// the lifetime of the graph, per the bump-allocator default (see `DESIGN.md`).
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn data_malloc(&mut self) -> GraphResult<()> {
        if !self.sorted {
            return Err(GraphError::Cycle);
        }

        let fuids: Vec<_> = self.tensors().map(|t| t.fuid()).collect();
        for fuid in fuids {
            let bytes = self.tensor(fuid)?.bytes();
            let offset = self.arena.alloc(bytes)?;
            let base = self.arena.base_ptr();
            self.tensor_mut(fuid)?.bind_storage(StorageBinding { base, offset, bytes });
        }

        tracing::debug!(info = ?self.arena.info(), "memory planning complete");
        Ok(())
    }

    /// Re-resolves every tensor's storage binding's base pointer to the graph's current
    /// arena. Called after deserializing a planned graph, since the base pointer is
    /// process-local and is not carried across the serde boundary.
    pub fn rebind_storage(&mut self) {
        let base = self.arena.base_ptr();
        for tensor in self.tensors.iter_mut().flatten() {
            tensor.rebind_base(base);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::dtype::DataType;
    use crate::error::GraphError;
    use crate::graph::Graph;
    use crate::operator::UnaryKind;
    use crate::shape::Shape;

    #[test]
    fn planning_binds_non_overlapping_storage() {
        let mut g = Graph::new();
        let x = g.add_tensor(Shape::new(vec![4]), DataType::Float32);
        let op = g.add_unary(x, UnaryKind::Relu).unwrap();
        let out = g.operator(op).unwrap().outputs()[0];

        assert!(g.topo_sort());
        g.data_malloc().unwrap();

        let x_binding = g.tensor(x).unwrap().storage().unwrap();
        let out_binding = g.tensor(out).unwrap().storage().unwrap();
        assert_eq!(x_binding.bytes, 16);
        assert_eq!(out_binding.offset, x_binding.offset + x_binding.bytes);
    }

    #[test]
    fn planning_before_sort_is_a_cycle_error() {
        let mut g = Graph::new();
        let x = g.add_tensor(Shape::new(vec![4]), DataType::Float32);
        let _ = g.add_unary(x, UnaryKind::Relu).unwrap();
        // never sorted: add_operator_and_connect clears the flag on every mutation
        assert!(!g.is_sorted());
        assert!(matches!(g.data_malloc(), Err(GraphError::Cycle)));
    }

    #[test]
    fn allocator_exhaustion_propagates() {
        let mut g = Graph::with_arena_capacity(4);
        let x = g.add_tensor(Shape::new(vec![4]), DataType::Float32);
        let _ = g.add_unary(x, UnaryKind::Relu).unwrap();
        assert!(g.topo_sort());
        assert!(matches!(g.data_malloc(), Err(GraphError::AllocatorExhausted { .. })));
    }
}
