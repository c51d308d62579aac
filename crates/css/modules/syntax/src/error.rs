use core::fmt;
use css_selectors::SelectorParseErrorKind;
use cssparser::{BasicParseErrorKind, ParseErrorKind};

/// 1-based position in the stylesheet text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl From<cssparser::SourceLocation> for SourceLocation {
    fn from(location: cssparser::SourceLocation) -> Self {
        Self {
            line: location.line.saturating_add(1),
            column: location.column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.line, self.column)
    }
}

/// Failures specific to the stylesheet grammar, carried through `cssparser`
/// as custom errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    Selector(SelectorParseErrorKind),
    /// `name: ;`
    EmptyValue,
    /// A token that is not a value literal, or a malformed color.
    InvalidValue(String),
    UnknownAtRule(String),
    UnknownFontFaceDescriptor(String),
    FontFaceWithoutUrl,
    /// End of input inside a declaration block.
    UnterminatedRule,
}

impl From<SelectorParseErrorKind> for SyntaxErrorKind {
    fn from(kind: SelectorParseErrorKind) -> Self {
        Self::Selector(kind)
    }
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selector(kind) => write!(formatter, "{kind}"),
            Self::EmptyValue => formatter.write_str("declaration has no value"),
            Self::InvalidValue(token) => write!(formatter, "invalid value {token}"),
            Self::UnknownAtRule(name) => write!(formatter, "unknown at-rule @{name}"),
            Self::UnknownFontFaceDescriptor(name) => {
                write!(formatter, "unknown @font-face descriptor '{name}'")
            }
            Self::FontFaceWithoutUrl => formatter.write_str("@font-face without url"),
            Self::UnterminatedRule => formatter.write_str("unterminated rule, expected '}'"),
        }
    }
}

/// A stylesheet that could not be parsed. The whole sheet is rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub location: SourceLocation,
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(location: SourceLocation, kind: &SyntaxErrorKind) -> Self {
        Self {
            location,
            message: kind.to_string(),
        }
    }

    pub(crate) fn from_css(error: &cssparser::ParseError<'_, SyntaxErrorKind>) -> Self {
        let message = match &error.kind {
            ParseErrorKind::Custom(kind) => kind.to_string(),
            ParseErrorKind::Basic(BasicParseErrorKind::UnexpectedToken(token)) => {
                format!("unexpected token {token:?}")
            }
            ParseErrorKind::Basic(BasicParseErrorKind::EndOfInput) => {
                "unexpected end of input".to_owned()
            }
            ParseErrorKind::Basic(BasicParseErrorKind::AtRuleInvalid(name)) => {
                format!("unknown at-rule @{name}")
            }
            ParseErrorKind::Basic(other) => format!("{other:?}"),
        };
        Self {
            location: error.location.into(),
            message,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}: {}", self.location, self.message)
    }
}

impl std::error::Error for ParseError {}
