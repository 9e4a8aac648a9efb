//! Verilog generation errors.

use thiserror::Error;

/// Errors raised while rendering Verilog text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExportError {
    #[error("Invalid Verilog identifier: `{0}`")]
    InvalidIdentifier(String),

    #[error("Module `{module}` instantiation has no parameters")]
    EmptyParameterList { module: String },

    #[error("Module `{module}` instantiation has no ports")]
    EmptyPortList { module: String },

    #[error("Layer `{name}` has no rescale factor")]
    MissingRescaleFactor { name: String },

    #[error("Unsupported literal width: {bits} bits")]
    UnsupportedWidth { bits: u32 },

    #[error("Value {value} does not fit in {bits} bits")]
    ValueOutOfRange { value: i64, bits: u32 },
}
