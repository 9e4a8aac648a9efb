//! Default linear quantizer.

use burn::tensor::{Tensor, backend::Backend};

use super::{QuantRange, Quantizer, signed_bounds};
use crate::errors::LayerError;

/// Splits the range into `2^bit_width` equally spaced bins and returns the
/// signed bin index of every element.
///
/// `q = clamp(round((x - min) / step), 0, 2^bw - 1) - 2^(bw - 1)` with
/// `step = (max - min) / 2^bw`. With a symmetric range `0.0` maps to `0`,
/// which the ReLU layer relies on.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearQuantizer;

impl LinearQuantizer {
    pub fn new() -> Self {
        Self
    }
}

impl Quantizer for LinearQuantizer {
    fn quantize<B: Backend, const D: usize>(
        &self,
        value: Tensor<B, D>,
        range: QuantRange,
        bit_width: u32,
    ) -> Result<Tensor<B, D>, LayerError> {
        let (q_min, q_max) = signed_bounds(bit_width)?;
        let levels = (q_max - q_min + 1) as f32;
        let step = range.span() / levels;
        if !(step.is_finite() && step > 0.0) {
            return Err(LayerError::Quantize {
                message: format!(
                    "range [{}, {}] yields step {} at {} bits",
                    range.min, range.max, step, bit_width
                ),
            });
        }

        let bins = ((value - range.min) / step).round() + q_min as f32;
        Ok(bins.clamp(q_min as f32, q_max as f32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn quantize_vec(values: &[f32], range: QuantRange, bit_width: u32) -> Vec<f32> {
        let device = <TestBackend as Backend>::Device::default();
        let input = Tensor::<TestBackend, 1>::from_floats(values, &device);
        LinearQuantizer
            .quantize(input, range, bit_width)
            .unwrap()
            .to_data()
            .to_vec()
            .unwrap()
    }

    #[test]
    fn test_symmetric_8bit() {
        let range = QuantRange::symmetric(1.0).unwrap();
        let result = quantize_vec(&[-1.0, -0.5, 0.0, 0.5, 0.1], range, 8);
        // step = 2 / 256
        assert_eq!(result, vec![-128.0, -64.0, 0.0, 64.0, 13.0]);
    }

    #[test]
    fn test_values_outside_range_are_clipped() {
        let range = QuantRange::symmetric(1.0).unwrap();
        let result = quantize_vec(&[-3.0, 1.0, 2.0], range, 8);
        assert_eq!(result, vec![-128.0, 127.0, 127.0]);
    }

    #[test]
    fn test_asymmetric_zero_is_not_zero() {
        // [0, 6]: zero sits at the bottom of the grid
        let range = QuantRange::new(0.0, 6.0).unwrap();
        let result = quantize_vec(&[0.0], range, 8);
        assert_eq!(result, vec![-128.0]);
    }

    #[test]
    fn test_low_bit_width() {
        let range = QuantRange::symmetric(1.0).unwrap();
        let result = quantize_vec(&[-1.0, 0.0, 0.6, 5.0], range, 4);
        // step = 2 / 16; 0.6 -> 1.6 / 0.125 = 12.8 -> 13 - 8
        assert_eq!(result, vec![-8.0, 0.0, 5.0, 7.0]);
    }

    #[test]
    fn test_invalid_bit_width() {
        let device = <TestBackend as Backend>::Device::default();
        let input = Tensor::<TestBackend, 1>::from_floats([0.0], &device);
        let range = QuantRange::symmetric(1.0).unwrap();
        let result = LinearQuantizer.quantize(input, range, 0);
        assert!(matches!(result, Err(LayerError::InvalidBitWidth { .. })));
    }
}
