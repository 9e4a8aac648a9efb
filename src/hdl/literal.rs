//! Verilog number literals and wire declarations.

use std::fmt::Display;

use crate::errors::ExportError;

/// Width of one channel in the generated datapath.
pub const WORD_BITS: u32 = 8;

/// Widest literal the generator emits.
pub const MAX_LITERAL_BITS: u32 = 32;

/// Reinterprets a signed value as its unsigned two's complement encoding in
/// `bits` bits (`-5` becomes `251` for 8 bits).
pub fn to_unsigned(value: i64, bits: u32) -> Result<u64, ExportError> {
    if bits == 0 || bits > MAX_LITERAL_BITS {
        return Err(ExportError::UnsupportedWidth { bits });
    }
    let modulus = 1i64 << bits;
    let min = -(modulus / 2);
    if value < min || value >= modulus {
        return Err(ExportError::ValueOutOfRange { value, bits });
    }
    let unsigned = if value < 0 { value + modulus } else { value };
    Ok(unsigned as u64)
}

/// Sized decimal literal, e.g. `8'd251`.
pub fn sized_decimal(bits: u32, value: u64) -> String {
    format!("{bits}'d{value}")
}

/// `wire [<words>*<count>-1:0] <name>;`
pub fn wire_declaration(word_bits: u32, count: impl Display, name: &str) -> String {
    format!("wire [{word_bits}*{count}-1:0] {name};\n")
}

/// Concatenates signed values into a constant vector assignment.
///
/// Index 0 of `values` ends up in the least significant slice, so the list is
/// written in reverse.
pub fn constant_vector(name: &str, values: &[i64]) -> Result<String, ExportError> {
    let literals = values
        .iter()
        .rev()
        .map(|&v| to_unsigned(v, WORD_BITS).map(|u| sized_decimal(WORD_BITS, u)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(format!("assign {} = {{ {}}};", name, literals.join(", ")))
}
