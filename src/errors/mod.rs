//! Error types for layer construction, quantization and export.

mod export_error;
mod layer_error;

pub use export_error::ExportError;
pub use layer_error::LayerError;
