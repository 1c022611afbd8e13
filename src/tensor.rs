use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::arena::ArenaPtr;
use crate::dtype::DataType;
use crate::shape::Shape;
use crate::types::{Fuid, Guid};

/// Where a tensor's bytes live once [`Graph::data_malloc`](crate::graph::Graph::data_malloc)
/// has run.
///
/// `base` is re-resolved from the graph's arena after deserialization rather than
/// serialized directly, since it is a process-local handle (see [`ArenaPtr`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageBinding {
    #[serde(skip)]
    pub base: ArenaPtr,
    pub offset: usize,
    pub bytes: usize,
}

/// An n-dimensional array value in the graph: a shape, an element type, and its
/// connectivity to producing/consuming operators.
///
/// A `Tensor` never owns numeric data; it is metadata plus, once planned, a
/// [`StorageBinding`] into an arena a backend owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tensor {
    fuid: Fuid,
    shape: Shape,
    dtype: DataType,
    source: Option<Guid>,
    targets: IndexSet<Guid>,
    storage: Option<StorageBinding>,
}

impl Tensor {
    pub(crate) fn new(fuid: Fuid, shape: Shape, dtype: DataType) -> Self {
        Self {
            fuid,
            shape,
            dtype,
            source: None,
            targets: IndexSet::new(),
            storage: None,
        }
    }

    pub fn fuid(&self) -> Fuid {
        self.fuid
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.as_slice()
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    /// Size in bytes: `numel(shape) * width(dtype)`.
    pub fn bytes(&self) -> usize {
        self.shape.numel() * self.dtype.width()
    }

    pub fn source(&self) -> Option<Guid> {
        self.source
    }

    pub fn targets(&self) -> &IndexSet<Guid> {
        &self.targets
    }

    pub fn storage(&self) -> Option<&StorageBinding> {
        self.storage.as_ref()
    }

    pub fn is_orphan(&self) -> bool {
        self.source.is_none() && self.targets.is_empty()
    }

    /// Reassigns this tensor's `Fuid`, used by
    /// [`Graph::add_existing_tensor`](crate::graph::Graph::add_existing_tensor) to
    /// re-parent an externally-built `Tensor` under an id from the registering graph's
    /// own allocator, discarding whatever id it carried before.
    pub(crate) fn set_fuid(&mut self, fuid: Fuid) {
        self.fuid = fuid;
    }

    pub(crate) fn set_shape(&mut self, shape: Shape) {
        self.shape = shape;
    }

    pub(crate) fn set_dtype(&mut self, dtype: DataType) {
        self.dtype = dtype;
    }

    pub(crate) fn set_source(&mut self, source: Option<Guid>) {
        self.source = source;
    }

    pub(crate) fn add_target(&mut self, op: Guid) {
        self.targets.insert(op);
    }

    pub(crate) fn remove_target(&mut self, op: Guid) {
        self.targets.shift_remove(&op);
    }

    pub(crate) fn bind_storage(&mut self, binding: StorageBinding) {
        self.storage = Some(binding);
    }

    pub(crate) fn rebind_base(&mut self, base: ArenaPtr) {
        if let Some(binding) = &mut self.storage {
            binding.base = base;
        }
    }
}
