//! # hwlayers
//!
//! Neural network layers that can be trained in floating point, quantized to
//! fixed point, and exported as synthesizable Verilog.
//!
//! Each layer goes through the same lifecycle:
//!
//! 1. **Float**: `forward` runs on a Burn backend while the network trains.
//! 2. **Quantize**: `quantize` maps the layer's constants onto a signed
//!    integer grid using an injected [`quantize::Quantizer`].
//! 3. **Export**: `export` renders the quantized layer as module
//!    instantiations for the hardware library (`bias`, `requantize_9bit`,
//!    `relu`).
//!
//! Export never quantizes implicitly; calling it on an unquantized layer
//! returns [`LayerError::NotQuantized`].
//!
//! Layers are Burn modules: the float biases are a [`burn::module::Param`]
//! that any Burn optimizer can train on an autodiff backend, while the
//! quantization state rides along as non-recorded module state.
//!
//! ## Example
//!
//! ```
//! use hwlayers::prelude::*;
//! use burn::backend::NdArray;
//!
//! type Backend = NdArray;
//!
//! let device = <Backend as burn::tensor::backend::Backend>::Device::default();
//!
//! let mut bias: BiasLayer<Backend> = BiasConfig::new("conv1", 2)
//!     .init(&device)
//!     .expect("Failed to build layer");
//!
//! bias.set_input_range(1.0).unwrap();
//! bias.quantize(&LinearQuantizer, 8).unwrap();
//! bias.set_rescale_factor(1.0);
//! bias.save_parameters().unwrap();
//!
//! let verilog = bias.export("bias1", "conv1_out", "bias1_out").unwrap();
//! assert!(verilog.contains("assign conv1_bias = { 8'd13, 8'd13};"));
//! ```

pub mod errors;
pub mod export;
pub mod hdl;
pub mod layers;
pub mod quantize;

// Re-exports for convenience
pub use errors::{ExportError, LayerError};
pub use layers::{BiasLayer, Layer, LayerKind, ReluLayer};
pub use quantize::{LinearQuantizer, QuantRange, Quantizer};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::errors::{ExportError, LayerError};
    pub use crate::export::export_parameters;
    pub use crate::layers::{
        BiasConfig, BiasLayer, Layer, LayerKind, LayerParameters, ReluConfig, ReluLayer,
    };
    pub use crate::quantize::{LinearQuantizer, QuantRange, Quantization, Quantizer};
}
