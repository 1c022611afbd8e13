//! Graph IR core for a neural-network inference runtime: tensors, operators,
//! shape/dtype inference, rewrite passes, and memory planning.

pub mod arena;
pub mod dtype;
pub mod error;
pub mod graph;
pub mod operator;
pub mod shape;
pub mod tensor;
pub mod types;

pub use dtype::DataType;
pub use error::{GraphError, GraphResult};
pub use graph::{Graph, GraphBuilder};
pub use operator::{OpKind, Operator};
pub use shape::Shape;
pub use tensor::Tensor;
pub use types::{Fuid, Guid};
