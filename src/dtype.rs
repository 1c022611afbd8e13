use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type of a [`Tensor`](crate::tensor::Tensor).
///
/// Each variant carries a fixed byte width, used to compute a tensor's
/// size in bytes from its shape (`bytes = numel * width`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Float32,
    Float16,
    BFloat16,
    Int64,
    Int32,
    Int16,
    Int8,
    UInt8,
    UInt32,
}

impl DataType {
    /// Width of one element, in bytes.
    pub fn width(self) -> usize {
        match self {
            DataType::Float32 => 4,
            DataType::Float16 => 2,
            DataType::BFloat16 => 2,
            DataType::Int64 => 8,
            DataType::Int32 => 4,
            DataType::Int16 => 2,
            DataType::Int8 => 1,
            DataType::UInt8 => 1,
            DataType::UInt32 => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DataType::Float32 => "f32",
            DataType::Float16 => "f16",
            DataType::BFloat16 => "bf16",
            DataType::Int64 => "i64",
            DataType::Int32 => "i32",
            DataType::Int16 => "i16",
            DataType::Int8 => "i8",
            DataType::UInt8 => "u8",
            DataType::UInt32 => "u32",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
