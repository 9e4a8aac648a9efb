//! Verilog text generation.
//!
//! Layers describe their hardware as [`Instantiation`]s plus a few wire
//! declarations; the text produced here matches what the downstream
//! synthesis flow already consumes, byte for byte.

mod instance;
mod literal;

pub use instance::{Instantiation, identifier, is_identifier};
pub use literal::{
    MAX_LITERAL_BITS, WORD_BITS, constant_vector, sized_decimal, to_unsigned, wire_declaration,
};
