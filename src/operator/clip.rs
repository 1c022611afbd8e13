use serde::{Deserialize, Serialize};

use crate::shape::Shape;

/// Attributes of a `Clip` operator: clamps elements into `[min, max]`, either bound
/// optional.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipAttrs {
    pub min: Option<f32>,
    pub max: Option<f32>,
}

/// Clip only clamps values, never the shape: output shape = input shape.
///
/// Clamping a dimension value with the clip bounds, as if shape were data, would be
/// nonsensical; the shape always passes through unchanged.
pub fn infer_shape(input: &Shape) -> Shape {
    input.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_is_unaffected_by_clip_bounds() {
        let input = Shape::new(vec![2, 3, 4]);
        let out = infer_shape(&input);
        assert_eq!(out, input);
    }
}
