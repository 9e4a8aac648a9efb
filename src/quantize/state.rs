//! Quantized/unquantized layer state.

use crate::errors::LayerError;

/// Quantized state of a layer.
///
/// Every layer starts `Unquantized`; `quantize()` moves it to `Quantized`.
/// There is no transition back, but quantizing again replaces the payload.
#[derive(Debug, Clone)]
pub enum Quantization<T> {
    Unquantized,
    Quantized(T),
}

impl<T> Default for Quantization<T> {
    fn default() -> Self {
        Quantization::Unquantized
    }
}

impl<T> Quantization<T> {
    pub fn is_quantized(&self) -> bool {
        matches!(self, Quantization::Quantized(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Quantization::Quantized(value) => Some(value),
            Quantization::Unquantized => None,
        }
    }

    /// Returns the payload or a `NotQuantized` error naming the layer.
    pub fn require(&self, layer: &str) -> Result<&T, LayerError> {
        self.get().ok_or_else(|| LayerError::NotQuantized {
            name: layer.to_string(),
        })
    }
}
