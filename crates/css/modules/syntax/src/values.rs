//! Declaration value literals.

use crate::error::SyntaxErrorKind;
use css_color::{is_color_function, parse_color};
use css_values::Value;
use cssparser::{ParseError, ParseErrorKind, Parser, SourceLocation, Token};

type ValueResult<'i, T> = Result<T, ParseError<'i, SyntaxErrorKind>>;

pub(crate) fn custom<'i>(location: SourceLocation, kind: SyntaxErrorKind) -> ParseError<'i, SyntaxErrorKind> {
    ParseError {
        kind: ParseErrorKind::Custom(kind),
        location,
    }
}

/// `value ("," value)*`; each comma separated chunk holds exactly one literal.
pub(crate) fn parse_value_list<'i>(input: &mut Parser<'i, '_>) -> ValueResult<'i, Vec<Value>> {
    input.parse_comma_separated(parse_value)
}

fn parse_value<'i>(input: &mut Parser<'i, '_>) -> ValueResult<'i, Value> {
    input.skip_whitespace();
    let location = input.current_source_location();
    let start = input.position();
    let Ok(token) = input.next().cloned() else {
        return Err(custom(location, SyntaxErrorKind::EmptyValue));
    };
    match token {
        Token::Number { value, .. } => Ok(Value::number(exact_number(input.slice_from(start), value))),
        Token::Percentage { unit_value, .. } => Ok(Value::dimension(
            exact_number(input.slice_from(start), unit_value * 100.0),
            "%",
        )),
        Token::Dimension { value, unit, .. } => Ok(Value::dimension(
            exact_number(input.slice_from(start), value),
            &unit,
        )),
        Token::QuotedString(text) => Ok(Value::String(text.as_ref().to_owned())),
        Token::Ident(name) => Ok(Value::Ident(name.as_ref().to_owned())),
        Token::UnquotedUrl(url) => Ok(Value::Url(url.as_ref().to_owned())),
        Token::Hash(hex) | Token::IDHash(hex) => {
            let text = format!("#{}", hex.as_ref());
            checked_color(location, text)
        }
        Token::Function(name) if name.eq_ignore_ascii_case("url") => {
            let url = input.parse_nested_block(|block| -> ValueResult<'i, String> {
                Ok(block.expect_string()?.as_ref().to_owned())
            })?;
            Ok(Value::Url(url))
        }
        Token::Function(name) if is_color_function(&name) => {
            input.parse_nested_block(|block| -> ValueResult<'i, ()> {
                while block.next().is_ok() {}
                Ok(())
            })?;
            let text = input.slice_from(start).trim().to_owned();
            checked_color(location, text)
        }
        Token::Function(name) => {
            let args = input.parse_nested_block(parse_value_list)?;
            Ok(Value::Expression {
                name: name.as_ref().to_owned(),
                args,
            })
        }
        other => Err(custom(location, SyntaxErrorKind::InvalidValue(format!("{other:?}")))),
    }
}

/// Keep the literal text but reject anything csscolorparser cannot read.
fn checked_color<'i>(location: SourceLocation, text: String) -> ValueResult<'i, Value> {
    if parse_color(&text).is_some() {
        Ok(Value::Color(text))
    } else {
        Err(custom(location, SyntaxErrorKind::InvalidValue(text)))
    }
}

/// The number as written at the start of `source`, read as `f64` so `0.1`
/// stays `0.1` rather than a widened `f32`. Falls back to `token_value`.
fn exact_number(source: &str, token_value: f32) -> f64 {
    numeric_prefix(source)
        .and_then(|digits| digits.parse::<f64>().ok())
        .unwrap_or_else(|| f64::from(token_value))
}

/// Sign, digits and an exponent; a unit such as `em` is not an exponent.
fn numeric_prefix(source: &str) -> Option<&str> {
    let bytes = source.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    while bytes
        .get(end)
        .is_some_and(|byte| byte.is_ascii_digit() || *byte == b'.')
    {
        end += 1;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        if bytes.get(end + 1 + sign).is_some_and(u8::is_ascii_digit) {
            end += 1 + sign;
            while bytes.get(end).is_some_and(u8::is_ascii_digit) {
                end += 1;
            }
        }
    }
    source.get(..end)
}
