//! Linear fixed-point quantization.
//!
//! Layers do not quantize themselves: they hand their floating point tensors
//! to a [`Quantizer`] passed in by the caller. [`LinearQuantizer`] is the
//! default scheme used by the hardware generator, and tests can substitute
//! their own implementation.

mod linear;
mod state;

pub use linear::LinearQuantizer;
pub use state::Quantization;

use burn::tensor::{Tensor, backend::Backend};
use serde::{Deserialize, Serialize};

use crate::errors::LayerError;

/// Bit width used by the generated hardware.
pub const DEFAULT_BIT_WIDTH: u32 = 8;

/// Largest supported bit width.
pub const MAX_BIT_WIDTH: u32 = 16;

/// Checks that a bit width is usable for quantization.
pub fn validate_bit_width(bit_width: u32) -> Result<u32, LayerError> {
    if bit_width == 0 || bit_width > MAX_BIT_WIDTH {
        return Err(LayerError::InvalidBitWidth {
            bit_width,
            max: MAX_BIT_WIDTH,
        });
    }
    Ok(bit_width)
}

/// Smallest and largest signed integers representable in `bit_width` bits.
pub fn signed_bounds(bit_width: u32) -> Result<(i32, i32), LayerError> {
    let half = 1i32 << (validate_bit_width(bit_width)? - 1);
    Ok((-half, half - 1))
}

/// A floating point interval mapped onto the quantized integer grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantRange {
    pub min: f32,
    pub max: f32,
}

impl QuantRange {
    /// Creates a range, rejecting empty or non-finite intervals.
    pub fn new(min: f32, max: f32) -> Result<Self, LayerError> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(LayerError::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Creates the range `[-magnitude, magnitude]`.
    pub fn symmetric(magnitude: f32) -> Result<Self, LayerError> {
        Self::new(-magnitude, magnitude)
    }

    /// Width of the interval.
    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    pub fn is_symmetric(&self) -> bool {
        self.min == -self.max
    }
}

/// Maps floating point tensors to their fixed-point representation.
///
/// The returned tensor keeps the float element type but holds integer values
/// inside the signed range of `bit_width`.
pub trait Quantizer {
    fn quantize<B: Backend, const D: usize>(
        &self,
        value: Tensor<B, D>,
        range: QuantRange,
        bit_width: u32,
    ) -> Result<Tensor<B, D>, LayerError>;
}
