use serde::{Deserialize, Serialize};

use crate::dtype::DataType;
use crate::shape::Shape;

/// The closed set of dtype conversions a `Cast` operator may perform.
///
/// Named `From2To`, matching the enumeration this crate's cast table is grounded on.
/// Every variant maps to exactly one `(input, output)` dtype pair via [`CastKind::input_dtype`]
/// and [`CastKind::output_dtype`] — there is no generic "any dtype to any dtype" path, so an
/// unlisted conversion is rejected at graph-construction time rather than silently coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CastKind {
    Float2Float16,
    Float2Int64,
    Float2Int32,
    Float2Int16,
    Float2Int8,
    Float2UInt8,
    Float2UInt32,
    Float2BFloat16,
    Float162Float,
    Int322Float,
    Int322Int64,
    Int322Int8,
    Int322Int16,
    Int322UInt32,
    Int642Float,
    Int642Int32,
    Int642UInt32,
    Int642UInt8,
    Int162Float,
    Int82Float,
    Int82Int32,
    UInt82Float,
    UInt82Int32,
    UInt322Float,
    UInt322Int64,
    BFloat162Float,
}

impl CastKind {
    pub fn input_dtype(self) -> DataType {
        use CastKind::*;
        match self {
            Float2Float16 | Float2Int64 | Float2Int32 | Float2Int16 | Float2Int8
            | Float2UInt8 | Float2UInt32 | Float2BFloat16 => DataType::Float32,
            Float162Float => DataType::Float16,
            Int322Float | Int322Int64 | Int322Int8 | Int322Int16 | Int322UInt32 => {
                DataType::Int32
            }
            Int642Float | Int642Int32 | Int642UInt32 | Int642UInt8 => DataType::Int64,
            Int162Float => DataType::Int16,
            Int82Float | Int82Int32 => DataType::Int8,
            UInt82Float | UInt82Int32 => DataType::UInt8,
            UInt322Float | UInt322Int64 => DataType::UInt32,
            BFloat162Float => DataType::BFloat16,
        }
    }

    pub fn output_dtype(self) -> DataType {
        use CastKind::*;
        match self {
            Float2Float16 => DataType::Float16,
            Float2Int64 => DataType::Int64,
            Float2Int32 => DataType::Int32,
            Float2Int16 => DataType::Int16,
            Float2Int8 => DataType::Int8,
            Float2UInt8 => DataType::UInt8,
            Float2UInt32 => DataType::UInt32,
            Float2BFloat16 => DataType::BFloat16,
            Float162Float => DataType::Float32,
            Int322Float => DataType::Float32,
            Int322Int64 => DataType::Int64,
            Int322Int8 => DataType::Int8,
            Int322Int16 => DataType::Int16,
            Int322UInt32 => DataType::UInt32,
            Int642Float => DataType::Float32,
            Int642Int32 => DataType::Int32,
            Int642UInt32 => DataType::UInt32,
            Int642UInt8 => DataType::UInt8,
            Int162Float => DataType::Float32,
            Int82Float => DataType::Float32,
            Int82Int32 => DataType::Int32,
            UInt82Float => DataType::Float32,
            UInt82Int32 => DataType::Int32,
            UInt322Float => DataType::Float32,
            UInt322Int64 => DataType::Int64,
            BFloat162Float => DataType::Float32,
        }
    }

    /// Looks up the unique `CastKind` for an `(input, output)` dtype pair, if the
    /// conversion is supported.
    pub fn lookup(input: DataType, output: DataType) -> Option<CastKind> {
        ALL.iter()
            .copied()
            .find(|k| k.input_dtype() == input && k.output_dtype() == output)
    }
}

const ALL: &[CastKind] = &[
    CastKind::Float2Float16,
    CastKind::Float2Int64,
    CastKind::Float2Int32,
    CastKind::Float2Int16,
    CastKind::Float2Int8,
    CastKind::Float2UInt8,
    CastKind::Float2UInt32,
    CastKind::Float2BFloat16,
    CastKind::Float162Float,
    CastKind::Int322Float,
    CastKind::Int322Int64,
    CastKind::Int322Int8,
    CastKind::Int322Int16,
    CastKind::Int322UInt32,
    CastKind::Int642Float,
    CastKind::Int642Int32,
    CastKind::Int642UInt32,
    CastKind::Int642UInt8,
    CastKind::Int162Float,
    CastKind::Int82Float,
    CastKind::Int82Int32,
    CastKind::UInt82Float,
    CastKind::UInt82Int32,
    CastKind::UInt322Float,
    CastKind::UInt322Int64,
    CastKind::BFloat162Float,
];

/// Cast never changes shape, only dtype.
pub fn infer_shape(input: &Shape) -> Shape {
    input.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dtype_pairs_round_trip_through_lookup() {
        for &kind in ALL {
            let found = CastKind::lookup(kind.input_dtype(), kind.output_dtype());
            assert_eq!(found, Some(kind));
        }
    }

    #[test]
    fn unsupported_pair_is_not_found() {
        assert_eq!(CastKind::lookup(DataType::Int8, DataType::BFloat16), None);
    }

    #[test]
    fn shape_passes_through() {
        let input = Shape::new(vec![5]);
        assert_eq!(infer_shape(&input), input);
    }
}
