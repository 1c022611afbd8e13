use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for a [`Tensor`](crate::tensor::Tensor), monotonic and never reused
/// within a [`Graph`](crate::graph::Graph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fuid(pub(crate) usize);

impl Fuid {
    pub fn get(self) -> usize {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn for_tests(id: usize) -> Self {
        Fuid(id)
    }
}

impl fmt::Display for Fuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Stable identifier for an [`Operator`](crate::operator::Operator), monotonic and never
/// reused within a [`Graph`](crate::graph::Graph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Guid(pub(crate) usize);

impl Guid {
    pub fn get(self) -> usize {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn for_tests(id: usize) -> Self {
        Guid(id)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic counters handed out by a [`Graph`](crate::graph::Graph) to its tensors and
/// operators. Kept separate from the graph's storage vectors so rewrites that remove
/// entries never reuse an id.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub(crate) struct IdAllocator {
    next_fuid: usize,
    next_guid: usize,
}

impl IdAllocator {
    pub(crate) fn next_fuid(&mut self) -> Fuid {
        let id = Fuid(self.next_fuid);
        self.next_fuid += 1;
        id
    }

    pub(crate) fn next_guid(&mut self) -> Guid {
        let id = Guid(self.next_guid);
        self.next_guid += 1;
        id
    }
}
