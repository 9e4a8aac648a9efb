//! Module instantiation builder.

use std::fmt::Display;

use crate::errors::ExportError;

const PARAM_INDENT: &str = "    ";
const DEFAULT_PORT_INDENT: usize = 4;

/// Returns true if `name` is a simple Verilog identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Validates an identifier, returning it unchanged.
pub fn identifier(name: &str) -> Result<&str, ExportError> {
    if is_identifier(name) {
        Ok(name)
    } else {
        Err(ExportError::InvalidIdentifier(name.to_string()))
    }
}

/// A parameterised module instantiation.
///
/// Renders as
///
/// ```text
///
///   module #(
///     .NAME(value)
///   )
///   instance (
///     .port(expr)
///   );
/// ```
#[derive(Debug, Clone)]
pub struct Instantiation {
    module: String,
    instance: String,
    params: Vec<(String, String)>,
    ports: Vec<(String, String)>,
    port_indent: usize,
    trailing_param_comma: bool,
}

impl Instantiation {
    pub fn new(module: impl Into<String>, instance: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            instance: instance.into(),
            params: Vec::new(),
            ports: Vec::new(),
            port_indent: DEFAULT_PORT_INDENT,
            trailing_param_comma: false,
        }
    }

    /// Adds a `#(.NAME(value))` parameter.
    pub fn param(mut self, name: &str, value: impl Display) -> Self {
        self.params.push((name.to_string(), value.to_string()));
        self
    }

    /// Connects `port` to the expression `expr`.
    pub fn port(mut self, port: &str, expr: impl Display) -> Self {
        self.ports.push((port.to_string(), expr.to_string()));
        self
    }

    /// Connects the shared `clock` and `reset` nets.
    pub fn clocked(self) -> Self {
        self.port("clock", "clock").port("reset", "reset")
    }

    /// Number of spaces before each port connection.
    pub fn port_indent(mut self, spaces: usize) -> Self {
        self.port_indent = spaces;
        self
    }

    /// Emits a comma after the last parameter, as the legacy `relu` template did.
    pub fn trailing_param_comma(mut self, enabled: bool) -> Self {
        self.trailing_param_comma = enabled;
        self
    }

    fn validate(&self) -> Result<(), ExportError> {
        identifier(&self.module)?;
        identifier(&self.instance)?;
        if self.params.is_empty() {
            return Err(ExportError::EmptyParameterList {
                module: self.module.clone(),
            });
        }
        if self.ports.is_empty() {
            return Err(ExportError::EmptyPortList {
                module: self.module.clone(),
            });
        }
        for (name, value) in self.params.iter().chain(self.ports.iter()) {
            identifier(name)?;
            if value.trim().is_empty() {
                return Err(ExportError::InvalidIdentifier(value.clone()));
            }
        }
        Ok(())
    }

    /// Renders the instantiation text.
    pub fn render(&self) -> Result<String, ExportError> {
        self.validate()?;

        let params = self
            .params
            .iter()
            .map(|(name, value)| format!("{PARAM_INDENT}.{name}({value})"))
            .collect::<Vec<_>>()
            .join(",\n");

        let indent = " ".repeat(self.port_indent);
        let ports = self
            .ports
            .iter()
            .map(|(name, expr)| format!("{indent}.{name}({expr})"))
            .collect::<Vec<_>>()
            .join(",\n");

        let comma = if self.trailing_param_comma { "," } else { "" };

        Ok(format!(
            "\n  {} #(\n{}{}\n  )\n  {} (\n{}\n  );\n",
            self.module, params, comma, self.instance, ports
        ))
    }
}
