use serde::{Deserialize, Serialize};

use crate::shape::Shape;

/// Element-wise unary operator kinds. All share the same shape rule
/// (output shape = input shape); they differ only in the numeric kernel a backend
/// would dispatch to, which is out of scope for this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryKind {
    Relu,
    Sigmoid,
    Tanh,
    Sqrt,
    Neg,
    Exp,
    Abs,
}

impl UnaryKind {
    pub fn name(self) -> &'static str {
        match self {
            UnaryKind::Relu => "Relu",
            UnaryKind::Sigmoid => "Sigmoid",
            UnaryKind::Tanh => "Tanh",
            UnaryKind::Sqrt => "Sqrt",
            UnaryKind::Neg => "Neg",
            UnaryKind::Exp => "Exp",
            UnaryKind::Abs => "Abs",
        }
    }
}

/// Element-wise: output shape = input shape, unconditionally.
pub fn infer_shape(input: &Shape) -> Shape {
    input.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_passes_through() {
        let input = Shape::new(vec![2, 3]);
        assert_eq!(infer_shape(&input), input);
    }
}
