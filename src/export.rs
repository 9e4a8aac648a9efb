//! JSON export of saved layer parameters.
//!
//! Verilog only carries the quantized values; this file keeps the float
//! biases and quantization metadata alongside them so a generated design
//! can be traced back to the trained network.

use serde::{Deserialize, Serialize};

use crate::errors::LayerError;
use crate::layers::{Layer, LayerKind, LayerParameters};

/// Export entry for a single layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerExport {
    #[serde(rename = "type")]
    pub kind: LayerKind,
    pub name: String,
    pub size: usize,
    pub quantized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<LayerParameters>,
}

impl LayerExport {
    pub fn from_layer(layer: &dyn Layer) -> Self {
        Self {
            kind: layer.kind(),
            name: layer.name().to_string(),
            size: layer.size(),
            quantized: layer.is_quantized(),
            parameters: layer.parameters(),
        }
    }
}

/// Top-level parameter export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParametersExport {
    pub layers: Vec<LayerExport>,
}

/// Collects the parameters of `layers` in order.
pub fn collect_parameters(layers: &[&dyn Layer]) -> ParametersExport {
    ParametersExport {
        layers: layers.iter().map(|l| LayerExport::from_layer(*l)).collect(),
    }
}

/// Serializes the parameters of `layers` to pretty-printed JSON.
pub fn export_parameters(layers: &[&dyn Layer]) -> Result<String, LayerError> {
    let export = collect_parameters(layers);
    log::info!("Exporting parameters of {} layers", export.layers.len());
    Ok(serde_json::to_string_pretty(&export)?)
}
