//! Typed accessors over a [`PropertyMap`].
//!
//! Each accessor either converts the stored literal or reports why it could
//! not. There is no silent coercion between kinds: asking for a color from a
//! number is a [`LookupError::Conversion`], same as asking for a key nobody set
//! is a [`LookupError::Missing`].

use crate::property::{Layer, PropertyMap};
use crate::value::Value;
use core::fmt;
use css_color::{Rgba, parse_color};

/// Value kinds a typed accessor can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    Number,
    Boolean,
    Color,
    Font,
    Url,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Color => "color",
            Self::Font => "font",
            Self::Url => "url",
        })
    }
}

/// Soft lookup failure. Neither variant is fatal; callers fall back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LookupError {
    /// No cascade winner for `key` at this path.
    Missing { key: String },
    /// A winner exists but its literal does not convert to `expected`.
    Conversion { key: String, expected: ValueKind },
}

impl LookupError {
    pub fn key(&self) -> &str {
        match self {
            Self::Missing { key } | Self::Conversion { key, .. } => key,
        }
    }

    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { key } => write!(formatter, "property '{key}' not found"),
            Self::Conversion { key, expected } => {
                write!(formatter, "property '{key}' is not convertible to {expected}")
            }
        }
    }
}

impl std::error::Error for LookupError {}

/// Font description decoded from `font("Family", 12pt, bold)` or
/// `"Family", 12px, italic`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Font {
    pub family: String,
    /// Size in points; set for unitless and `pt` sizes.
    pub point_size: Option<f64>,
    /// Size in pixels; set for `px` sizes.
    pub pixel_size: Option<f64>,
    pub bold: bool,
    pub italic: bool,
}

/// An unresolved URL plus the layer whose source it is relative to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UrlRef {
    pub url: String,
    pub layer: Layer,
}

impl PropertyMap {
    /// All raw values of `key`, in declaration order.
    ///
    /// # Errors
    /// [`LookupError::Missing`] when no rule set `key`.
    pub fn values(&self, key: &str) -> Result<&[Value], LookupError> {
        self.get(key)
            .map(|property| property.values.as_slice())
            .ok_or_else(|| LookupError::Missing {
                key: key.to_owned(),
            })
    }

    /// # Errors
    /// Missing key, or a value that is not a string or identifier.
    pub fn string(&self, key: &str) -> Result<String, LookupError> {
        match self.single(key, ValueKind::String)? {
            Value::String(text) | Value::Ident(text) => Ok(text.clone()),
            _ => Err(conversion(key, ValueKind::String)),
        }
    }

    /// Numeric value; the unit (if any) is dropped.
    ///
    /// # Errors
    /// Missing key, or a value that is not a number.
    pub fn number(&self, key: &str) -> Result<f64, LookupError> {
        match self.single(key, ValueKind::Number)? {
            Value::Number { value, .. } => Ok(*value),
            _ => Err(conversion(key, ValueKind::Number)),
        }
    }

    /// # Errors
    /// Missing key, or a value other than the identifiers `true` / `false`.
    pub fn boolean(&self, key: &str) -> Result<bool, LookupError> {
        match self.single(key, ValueKind::Boolean)? {
            Value::Ident(word) if word.eq_ignore_ascii_case("true") => Ok(true),
            Value::Ident(word) if word.eq_ignore_ascii_case("false") => Ok(false),
            _ => Err(conversion(key, ValueKind::Boolean)),
        }
    }

    /// # Errors
    /// Missing key, or a literal csscolorparser cannot read.
    pub fn color(&self, key: &str) -> Result<Rgba, LookupError> {
        match self.single(key, ValueKind::Color)? {
            Value::Color(text) | Value::Ident(text) => {
                parse_color(text).ok_or_else(|| conversion(key, ValueKind::Color))
            }
            _ => Err(conversion(key, ValueKind::Color)),
        }
    }

    /// # Errors
    /// Missing key, or values that do not describe a font.
    pub fn font(&self, key: &str) -> Result<Font, LookupError> {
        let values = self.values(key)?;
        let parts = match values {
            [Value::Expression { name, args }] if name.eq_ignore_ascii_case("font") => {
                args.as_slice()
            }
            other => other,
        };
        decode_font(parts).ok_or_else(|| conversion(key, ValueKind::Font))
    }

    /// URL reference tagged with the layer it was declared in, so callers can
    /// resolve it against that layer's source.
    ///
    /// # Errors
    /// Missing key, or a value that is neither `url(...)` nor a string.
    pub fn url(&self, key: &str) -> Result<UrlRef, LookupError> {
        let layer = self
            .get(key)
            .map(|property| property.provenance.layer)
            .unwrap_or_default();
        match self.single(key, ValueKind::Url)? {
            Value::Url(url) | Value::String(url) => Ok(UrlRef {
                url: url.clone(),
                layer,
            }),
            _ => Err(conversion(key, ValueKind::Url)),
        }
    }

    /// The only value of `key`; multi-valued properties do not convert to scalars.
    fn single(&self, key: &str, expected: ValueKind) -> Result<&Value, LookupError> {
        match self.values(key)? {
            [value] => Ok(value),
            _ => Err(conversion(key, expected)),
        }
    }
}

fn conversion(key: &str, expected: ValueKind) -> LookupError {
    LookupError::Conversion {
        key: key.to_owned(),
        expected,
    }
}

/// Family first, then optional size, then style keywords.
fn decode_font(parts: &[Value]) -> Option<Font> {
    let (family, rest) = parts.split_first()?;
    let mut font = Font {
        family: match family {
            Value::String(name) | Value::Ident(name) => name.clone(),
            _ => return None,
        },
        ..Font::default()
    };
    for part in rest {
        match part {
            Value::Number { value, unit } => match unit.as_deref() {
                None | Some("pt") => font.point_size = Some(*value),
                Some("px") => font.pixel_size = Some(*value),
                Some(_) => return None,
            },
            Value::Ident(word) => match word.to_ascii_lowercase().as_str() {
                "bold" => font.bold = true,
                "italic" => font.italic = true,
                "normal" => {}
                _ => return None,
            },
            _ => return None,
        }
    }
    Some(font)
}
