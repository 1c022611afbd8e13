use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{GraphError, GraphResult};

/// An opaque handle to the start of an arena's backing storage.
///
/// Deliberately not a real pointer: a backend may plan CPU memory, a CUDA device
/// allocation, or anything else behind this handle. The core only ever adds byte
/// offsets to it; dereferencing is an external collaborator's job.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArenaPtr(pub usize);

/// Diagnostic snapshot of an allocator's state, surfaced through `tracing` and
/// [`ArenaAllocator::info`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaInfo {
    pub allocated_bytes: usize,
    pub live_allocations: usize,
    pub capacity_bytes: Option<usize>,
}

/// The allocator interface `Graph::data_malloc` plans against.
///
/// This crate does not constrain the packing policy beyond: every returned offset is
/// valid, offsets for still-live tensors never overlap, and `base_ptr()` returns a handle
/// into a region at least as large as the sum of live bytes. [`BumpAllocator`] is the
/// simplest conforming implementation.
pub trait ArenaAllocator: fmt::Debug {
    /// Reserve `bytes` contiguous bytes, returning their offset from `base_ptr()`.
    fn alloc(&mut self, bytes: usize) -> GraphResult<usize>;

    /// The single base handle every offset returned by `alloc` is relative to.
    fn base_ptr(&self) -> ArenaPtr;

    fn info(&self) -> ArenaInfo;
}

/// A monotonically-increasing bump allocator: never reuses an offset, never frees.
///
/// The simplest conforming planning strategy. A lifetime-aware allocator that recycles
/// offsets once a tensor's last consumer has run is a valid alternate implementation of
/// the same trait (see `DESIGN.md`); this crate ships the bump variant only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BumpAllocator {
    base: ArenaPtr,
    watermark: usize,
    capacity: Option<usize>,
}

impl BumpAllocator {
    /// An allocator with no capacity limit.
    pub fn new() -> Self {
        Self {
            base: ArenaPtr(0),
            watermark: 0,
            capacity: None,
        }
    }

    /// An allocator that fails once `capacity` bytes have been requested.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            base: ArenaPtr(0),
            watermark: 0,
            capacity: Some(capacity),
        }
    }
}

impl Default for BumpAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl ArenaAllocator for BumpAllocator {
    fn alloc(&mut self, bytes: usize) -> GraphResult<usize> {
        if let Some(cap) = self.capacity {
            if self.watermark + bytes > cap {
                return Err(GraphError::AllocatorExhausted {
                    requested: bytes,
                    available: cap.saturating_sub(self.watermark),
                });
            }
        }
        let offset = self.watermark;
        self.watermark += bytes;
        tracing::trace!(offset, bytes, "arena: bump allocation");
        Ok(offset)
    }

    fn base_ptr(&self) -> ArenaPtr {
        self.base
    }

    fn info(&self) -> ArenaInfo {
        ArenaInfo {
            allocated_bytes: self.watermark,
            live_allocations: 0,
            capacity_bytes: self.capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_monotonic_and_non_overlapping() {
        let mut arena = BumpAllocator::new();
        let a = arena.alloc(16).unwrap();
        let b = arena.alloc(32).unwrap();
        let c = arena.alloc(8).unwrap();
        assert_eq!(a, 0);
        assert_eq!(b, 16);
        assert_eq!(c, 48);
    }

    #[test]
    fn exhaustion_is_reported() {
        let mut arena = BumpAllocator::with_capacity(10);
        arena.alloc(4).unwrap();
        let err = arena.alloc(8).unwrap_err();
        assert!(matches!(err, GraphError::AllocatorExhausted { .. }));
    }
}
