//! Selector list parsing on top of the `cssparser` tokenizer.
//!
//! Identifiers and class names keep their case and any escapes resolved by
//! the tokenizer, so non-ASCII names round-trip unchanged.

use crate::{ClassSet, Combinator, Selector, SelectorSegment};
use core::fmt;
use cssparser::{ParseError, ParseErrorKind, Parser, ParserInput, SourceLocation, Token};

/// Reasons a selector list can be rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectorParseErrorKind {
    /// Nothing between two commas, or an empty prelude.
    EmptySelector,
    /// A `>` with no compound on one of its sides.
    DanglingCombinator,
    /// A sibling combinator or other unsupported combinator character.
    UnknownCombinator(char),
    /// `.` not followed by an identifier.
    ExpectedClassName,
    /// A type name or `*` after the compound already started.
    MisplacedTypeName(String),
    /// Any other token.
    UnexpectedToken(String),
}

impl fmt::Display for SelectorParseErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySelector => formatter.write_str("empty selector"),
            Self::DanglingCombinator => formatter.write_str("combinator without a compound selector"),
            Self::UnknownCombinator(symbol) => write!(formatter, "unknown combinator '{symbol}'"),
            Self::ExpectedClassName => formatter.write_str("expected a class name after '.'"),
            Self::MisplacedTypeName(name) => {
                write!(formatter, "type name '{name}' must start a compound selector")
            }
            Self::UnexpectedToken(token) => write!(formatter, "unexpected token {token} in selector"),
        }
    }
}

/// A selector parse failure with a 1-based source position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectorError {
    pub line: u32,
    pub column: u32,
    pub kind: SelectorParseErrorKind,
}

impl SelectorError {
    fn from_parse_error(error: &ParseError<'_, SelectorParseErrorKind>) -> Self {
        let kind = match &error.kind {
            ParseErrorKind::Custom(kind) => kind.clone(),
            ParseErrorKind::Basic(basic) => SelectorParseErrorKind::UnexpectedToken(format!("{basic:?}")),
        };
        Self {
            line: error.location.line.saturating_add(1),
            column: error.location.column,
            kind,
        }
    }
}

impl fmt::Display for SelectorError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}: {}", self.line, self.column, self.kind)
    }
}

impl std::error::Error for SelectorError {}

/// Parse a standalone selector list such as `"Window > Button.primary, Label"`.
///
/// # Errors
/// Returns the first [`SelectorError`] encountered.
pub fn parse_selectors(text: &str) -> Result<Vec<Selector>, SelectorError> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    parser
        .parse_entirely(parse_selector_list::<SelectorParseErrorKind>)
        .map_err(|error| SelectorError::from_parse_error(&error))
}

/// Parse a comma separated selector list from an in-progress `cssparser` parser.
///
/// Used by the stylesheet parser for rule preludes so locations stay relative
/// to the whole stylesheet.
///
/// # Errors
/// Returns a custom parse error wrapping [`SelectorParseErrorKind`].
pub fn parse_selector_list<'i, E>(
    input: &mut Parser<'i, '_>,
) -> Result<Vec<Selector>, ParseError<'i, E>>
where
    E: From<SelectorParseErrorKind>,
{
    input.parse_comma_separated(parse_selector)
}

/// Build a custom error at `location`.
fn custom_error<'i, E>(location: SourceLocation, kind: SelectorParseErrorKind) -> ParseError<'i, E>
where
    E: From<SelectorParseErrorKind>,
{
    ParseError {
        kind: ParseErrorKind::Custom(E::from(kind)),
        location,
    }
}

/// Parse one complex selector up to the next comma.
fn parse_selector<'i, E>(input: &mut Parser<'i, '_>) -> Result<Selector, ParseError<'i, E>>
where
    E: From<SelectorParseErrorKind>,
{
    let mut builder = SelectorBuilder::default();
    loop {
        let location = input.current_source_location();
        let Ok(token) = input.next_including_whitespace().cloned() else {
            break;
        };
        let step = match token {
            Token::WhiteSpace(_) => {
                builder.whitespace();
                Ok(())
            }
            Token::Delim('>') => builder.combinator(Combinator::Child),
            Token::Delim('*') => builder.open(None),
            Token::Ident(name) => builder.open(Some(name.as_ref().to_owned())),
            Token::Delim('.') => {
                let class_location = input.current_source_location();
                match input.next_including_whitespace() {
                    Ok(Token::Ident(name)) => {
                        builder.class(name.as_ref().to_owned());
                        Ok(())
                    }
                    _ => {
                        return Err(custom_error(
                            class_location,
                            SelectorParseErrorKind::ExpectedClassName,
                        ));
                    }
                }
            }
            Token::Delim(symbol @ ('+' | '~' | '|')) => {
                Err(SelectorParseErrorKind::UnknownCombinator(symbol))
            }
            other => Err(SelectorParseErrorKind::UnexpectedToken(format!("{other:?}"))),
        };
        step.map_err(|kind| custom_error(location, kind))?;
    }
    let location = input.current_source_location();
    builder.finish().map_err(|kind| custom_error(location, kind))
}

/// Incremental state while walking one selector's tokens.
#[derive(Default)]
struct SelectorBuilder {
    /// Completed compounds, root-ward first.
    segments: Vec<SelectorSegment>,
    /// Compound currently receiving class qualifiers.
    current: Option<SelectorSegment>,
    /// Combinator seen since the last completed compound.
    pending: Option<Combinator>,
}

impl SelectorBuilder {
    fn close(&mut self) {
        if let Some(segment) = self.current.take() {
            self.segments.push(segment);
        }
    }

    fn whitespace(&mut self) {
        self.close();
        if !self.segments.is_empty() && self.pending.is_none() {
            self.pending = Some(Combinator::Descendant);
        }
    }

    fn combinator(&mut self, combinator: Combinator) -> Result<(), SelectorParseErrorKind> {
        self.close();
        if self.segments.is_empty() || self.pending == Some(Combinator::Child) {
            return Err(SelectorParseErrorKind::DanglingCombinator);
        }
        self.pending = Some(combinator);
        Ok(())
    }

    fn open(&mut self, type_name: Option<String>) -> Result<(), SelectorParseErrorKind> {
        if self.current.is_some() {
            return Err(SelectorParseErrorKind::MisplacedTypeName(
                type_name.unwrap_or_else(|| "*".to_owned()),
            ));
        }
        self.current = Some(SelectorSegment {
            type_name,
            class_names: ClassSet::new(),
            combinator: self.pending.take().unwrap_or_default(),
        });
        Ok(())
    }

    fn class(&mut self, class_name: String) {
        if self.current.is_none() {
            self.current = Some(SelectorSegment {
                combinator: self.pending.take().unwrap_or_default(),
                ..SelectorSegment::default()
            });
        }
        if let Some(segment) = self.current.as_mut() {
            segment.class_names.insert(class_name);
        }
    }

    fn finish(mut self) -> Result<Selector, SelectorParseErrorKind> {
        self.close();
        if self.pending == Some(Combinator::Child) {
            return Err(SelectorParseErrorKind::DanglingCombinator);
        }
        if self.segments.is_empty() {
            return Err(SelectorParseErrorKind::EmptySelector);
        }
        Ok(Selector::new(self.segments))
    }
}
