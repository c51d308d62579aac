//! Literal values as written in a declaration.

use core::fmt;
use cssparser::{serialize_identifier, serialize_string};

/// One literal of a declaration's comma separated value list.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Number, dimension (`12px`) or percentage (`50%`, stored as `50` with unit `%`).
    Number { value: f64, unit: Option<String> },
    /// Color literal text: `#rrggbb` or a color function such as `rgba(0, 0, 0, 0.5)`.
    Color(String),
    /// Quoted string, escapes resolved.
    String(String),
    /// Bare identifier, e.g. `red`, `true`, `bold`.
    Ident(String),
    /// `url(...)` reference, unresolved.
    Url(String),
    /// Any other function call, e.g. `font("Arial", 12)`.
    Expression { name: String, args: Vec<Value> },
}

impl Value {
    #[inline]
    pub const fn number(value: f64) -> Self {
        Self::Number { value, unit: None }
    }

    #[inline]
    pub fn dimension(value: f64, unit: &str) -> Self {
        Self::Number {
            value,
            unit: Some(unit.to_owned()),
        }
    }

    /// Short kind label used by diagnostics.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Number { .. } => "number",
            Self::Color(_) => "color",
            Self::String(_) => "string",
            Self::Ident(_) => "ident",
            Self::Url(_) => "url",
            Self::Expression { .. } => "expression",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number { value, unit } => {
                write!(formatter, "{value}")?;
                if let Some(unit) = unit {
                    formatter.write_str(unit)?;
                }
                Ok(())
            }
            Self::Color(text) => formatter.write_str(text),
            Self::String(text) => serialize_string(text, formatter),
            Self::Ident(text) => serialize_identifier(text, formatter),
            Self::Url(url) => {
                formatter.write_str("url(")?;
                serialize_string(url, formatter)?;
                formatter.write_str(")")
            }
            Self::Expression { name, args } => {
                serialize_identifier(name, formatter)?;
                formatter.write_str("(")?;
                write_list(formatter, args)?;
                formatter.write_str(")")
            }
        }
    }
}

/// Write values separated by `", "`.
pub fn write_list(formatter: &mut fmt::Formatter<'_>, values: &[Value]) -> fmt::Result {
    for (index, value) in values.iter().enumerate() {
        if index > 0 {
            formatter.write_str(", ")?;
        }
        write!(formatter, "{value}")?;
    }
    Ok(())
}
