//! Layer-related error types.

use thiserror::Error;

use super::ExportError;

/// Errors that can occur while building, quantizing or exporting a layer.
#[derive(Debug, Error)]
pub enum LayerError {
    #[error("Layer `{name}` must have a positive size")]
    InvalidSize { name: String },

    #[error("Invalid quantization range [{min}, {max}]")]
    InvalidRange { min: f32, max: f32 },

    #[error("Invalid bit width {bit_width}: expected 1..={max}")]
    InvalidBitWidth { bit_width: u32, max: u32 },

    #[error("Layer `{name}` has no input quantization range")]
    MissingInputRange { name: String },

    #[error("Layer `{name}` is not quantized")]
    NotQuantized { name: String },

    #[error("Layer `{name}` parameters have not been saved")]
    ParametersNotSaved { name: String },

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Layer `{name}` quantizes zero to {zero}, rectifying at 0 would be wrong")]
    NonZeroQuantizedZero { name: String, zero: i32 },

    #[error("Quantization error: {message}")]
    Quantize { message: String },

    #[error("Tensor data error: {message}")]
    Data { message: String },

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LayerError {
    pub(crate) fn data(err: impl std::fmt::Debug) -> Self {
        LayerError::Data {
            message: format!("{err:?}"),
        }
    }
}
