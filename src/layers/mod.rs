//! Hardware-exportable network layers.
//!
//! Each layer runs a floating point forward pass for training, a quantized
//! forward pass once `quantize()` has run, and renders itself as Verilog.

pub mod bias;
pub mod relu;

pub use bias::{BiasConfig, BiasLayer, BiasParameters, QuantizedBias};
pub use relu::{QuantizedZero, ReluConfig, ReluLayer, ReluParameters};

use serde::{Deserialize, Serialize};

/// Layer type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Bias,
    Relu,
}

impl LayerKind {
    /// Returns the tag used in exported parameter files.
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Bias => "bias",
            LayerKind::Relu => "relu",
        }
    }
}

/// Saved parameters of a layer, ready for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LayerParameters {
    Bias(BiasParameters),
    Relu(ReluParameters),
}

/// Read-only surface shared by all layers.
pub trait Layer {
    /// Unique layer name.
    fn name(&self) -> &str;

    fn kind(&self) -> LayerKind;

    /// Number of channels.
    fn size(&self) -> usize;

    /// Number of elements on the input port.
    fn in_port_width(&self) -> usize {
        self.size()
    }

    /// Number of elements on the output port.
    fn out_port_width(&self) -> usize {
        self.size()
    }

    fn is_quantized(&self) -> bool;

    /// Parameters captured by the layer's last `save_parameters` call.
    ///
    /// `None` until `save_parameters` runs, and again after a later
    /// `quantize` replaces the grid the snapshot was taken on.
    fn parameters(&self) -> Option<LayerParameters>;
}
