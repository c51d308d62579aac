//! Stylesheet parsing driven by `cssparser`'s rule and declaration parsers.
//!
//! A stylesheet is accepted or rejected as a whole: the first malformed rule,
//! declaration or at-rule aborts parsing with its source location.

use crate::error::{ParseError, SourceLocation, SyntaxErrorKind};
use crate::model::{Declaration, FontFaceDecl, Rule, StyleSheet, push_declaration};
use crate::values::{custom, parse_value_list};
use css_selectors::{Selector, parse_selector_list};
use css_values::{Layer, Value};
use cssparser::AtRuleParser as CssAtRuleParser;
use cssparser::BasicParseErrorKind;
use cssparser::CowRcStr;
use cssparser::DeclarationParser as CssDeclarationParser;
use cssparser::ParseError as CssParseError;
use cssparser::Parser;
use cssparser::ParserInput;
use cssparser::ParserState;
use cssparser::QualifiedRuleParser as CssQualifiedRuleParser;
use cssparser::RuleBodyItemParser as CssRuleBodyItemParser;
use cssparser::RuleBodyParser as CssRuleBodyParser;
use cssparser::SourcePosition;
use cssparser::StyleSheetParser;
use cssparser::Token;

type CssResult<'i, T> = Result<T, CssParseError<'i, SyntaxErrorKind>>;

/// A top-level item: either a style rule or a font face.
enum TopLevelItem {
    Rule {
        selectors: Vec<Selector>,
        declarations: Vec<Declaration>,
    },
    FontFace(FontFaceDecl),
}

/// Recognised at-rules.
enum AtRulePrelude {
    FontFace,
}

/// Parse `text` loaded from `source_id` into a Default-layer sheet.
///
/// # Errors
/// Returns the first grammar violation with its 1-based location.
pub fn parse_stylesheet(text: &str, source_id: &str) -> Result<StyleSheet, ParseError> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let mut top = TopLevelParser;
    let mut sheet = StyleSheet::empty(source_id, Layer::Default);
    let mut order = 0_u32;

    let mut items = StyleSheetParser::new(&mut parser, &mut top);
    loop {
        items.input.skip_whitespace();
        let start = items.input.position();
        let start_location = items.input.current_source_location();
        let Some(item) = items.next() else {
            break;
        };
        let item = item.map_err(|(error, _)| ParseError::from_css(&error))?;
        if !block_is_closed(items.input.slice_from(start)) {
            return Err(ParseError::new(
                SourceLocation::from(start_location),
                &SyntaxErrorKind::UnterminatedRule,
            ));
        }
        match item {
            TopLevelItem::Rule {
                selectors,
                declarations,
            } => {
                sheet.rules.push(Rule {
                    selectors,
                    declarations,
                    order,
                    layer: Layer::Default,
                });
                order = order.saturating_add(1);
            }
            TopLevelItem::FontFace(font_face) => sheet.font_faces.push(font_face),
        }
    }
    Ok(sheet)
}

/// True when the first block in `rule_text` ends in an explicit `}` rather
/// than being closed implicitly at end of input.
fn block_is_closed<'i>(rule_text: &'i str) -> bool {
    let mut input = ParserInput::new(rule_text);
    let mut parser = Parser::new(&mut input);
    loop {
        match parser.next() {
            Ok(Token::CurlyBracketBlock) => break,
            Ok(_) => {}
            Err(_) => return false,
        }
    }
    let content_end =
        parser.parse_nested_block(|block| -> Result<SourcePosition, CssParseError<'i, ()>> {
            while block.next_including_whitespace_and_comments().is_ok() {}
            Ok(block.position())
        });
    let Ok(content_end) = content_end else {
        return false;
    };
    parser.slice(content_end..parser.position()).trim() == "}"
}

/// Top-level parser producing rules and font faces.
struct TopLevelParser;

impl<'i> CssQualifiedRuleParser<'i> for TopLevelParser {
    type Prelude = Vec<Selector>;
    type QualifiedRule = TopLevelItem;
    type Error = SyntaxErrorKind;

    fn parse_prelude<'t>(&mut self, input: &mut Parser<'i, 't>) -> CssResult<'i, Self::Prelude> {
        parse_selector_list(input)
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> CssResult<'i, Self::QualifiedRule> {
        let mut declarations = Vec::new();
        let mut body = DeclarationBodyParser;
        for declaration in CssRuleBodyParser::new(input, &mut body) {
            let declaration = declaration.map_err(|(error, _)| error)?;
            push_declaration(&mut declarations, declaration);
        }
        Ok(TopLevelItem::Rule {
            selectors: prelude,
            declarations,
        })
    }
}

impl<'i> CssAtRuleParser<'i> for TopLevelParser {
    type Prelude = AtRulePrelude;
    type AtRule = TopLevelItem;
    type Error = SyntaxErrorKind;

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> CssResult<'i, Self::Prelude> {
        if name.eq_ignore_ascii_case("font-face") {
            Ok(AtRulePrelude::FontFace)
        } else {
            Err(custom(
                input.current_source_location(),
                SyntaxErrorKind::UnknownAtRule(name.as_ref().to_owned()),
            ))
        }
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> CssResult<'i, Self::AtRule> {
        let AtRulePrelude::FontFace = prelude;
        let mut url = None;
        let mut body = FontFaceBodyParser;
        for descriptor in CssRuleBodyParser::new(input, &mut body) {
            url = Some(descriptor.map_err(|(error, _)| error)?);
        }
        url.map(|url| TopLevelItem::FontFace(FontFaceDecl { url }))
            .ok_or_else(|| custom(start.source_location(), SyntaxErrorKind::FontFaceWithoutUrl))
    }
}

/// Declarations inside a style rule block. Nested rules are not allowed.
struct DeclarationBodyParser;

impl<'i> CssDeclarationParser<'i> for DeclarationBodyParser {
    type Declaration = Declaration;
    type Error = SyntaxErrorKind;

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _declaration_start: &ParserState,
    ) -> CssResult<'i, Self::Declaration> {
        let values = parse_value_list(input)?;
        Ok(Declaration {
            name: name.as_ref().to_owned(),
            values,
        })
    }
}

impl<'i> CssAtRuleParser<'i> for DeclarationBodyParser {
    type Prelude = ();
    type AtRule = Declaration;
    type Error = SyntaxErrorKind;

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> CssResult<'i, Self::Prelude> {
        Err(custom(
            input.current_source_location(),
            SyntaxErrorKind::UnknownAtRule(name.as_ref().to_owned()),
        ))
    }
}

impl<'i> CssQualifiedRuleParser<'i> for DeclarationBodyParser {
    type Prelude = ();
    type QualifiedRule = Declaration;
    type Error = SyntaxErrorKind;

    fn parse_prelude<'t>(&mut self, input: &mut Parser<'i, 't>) -> CssResult<'i, Self::Prelude> {
        Err(input.new_error(BasicParseErrorKind::QualifiedRuleInvalid))
    }
}

impl<'i> CssRuleBodyItemParser<'i, Declaration, SyntaxErrorKind> for DeclarationBodyParser {
    fn parse_declarations(&self) -> bool {
        true
    }

    fn parse_qualified(&self) -> bool {
        false
    }
}

/// `url: "..."` or `src: url(...)` inside `@font-face`.
struct FontFaceBodyParser;

impl<'i> CssDeclarationParser<'i> for FontFaceBodyParser {
    type Declaration = String;
    type Error = SyntaxErrorKind;

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        declaration_start: &ParserState,
    ) -> CssResult<'i, Self::Declaration> {
        if !(name.eq_ignore_ascii_case("url") || name.eq_ignore_ascii_case("src")) {
            return Err(custom(
                declaration_start.source_location(),
                SyntaxErrorKind::UnknownFontFaceDescriptor(name.as_ref().to_owned()),
            ));
        }
        let location = input.current_source_location();
        match parse_value_list(input)?.as_slice() {
            [Value::String(url) | Value::Url(url)] => Ok(url.clone()),
            [other] => Err(custom(
                location,
                SyntaxErrorKind::InvalidValue(other.to_string()),
            )),
            _ => Err(custom(location, SyntaxErrorKind::FontFaceWithoutUrl)),
        }
    }
}

impl<'i> CssAtRuleParser<'i> for FontFaceBodyParser {
    type Prelude = ();
    type AtRule = String;
    type Error = SyntaxErrorKind;
}

impl<'i> CssQualifiedRuleParser<'i> for FontFaceBodyParser {
    type Prelude = ();
    type QualifiedRule = String;
    type Error = SyntaxErrorKind;
}

impl<'i> CssRuleBodyItemParser<'i, String, SyntaxErrorKind> for FontFaceBodyParser {
    fn parse_declarations(&self) -> bool {
        true
    }

    fn parse_qualified(&self) -> bool {
        false
    }
}
