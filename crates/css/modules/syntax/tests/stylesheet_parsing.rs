#![cfg(test)]

use css_syntax::{ParseError, SourceLocation, parse_stylesheet};
use css_values::Value;
use std::error::Error;

#[test]
fn parses_a_realistic_sheet() -> Result<(), Box<dyn Error>> {
    let text = r#"
/* Application defaults */
@font-face { url: "fonts/Inter.ttf"; }

Window {
    background: #202020;
    font: font("Inter", 11pt);
}

Window > ToolBar Button, Dialog Button.default {
    color: rgb(240, 240, 240);
    icon: url("icons/button.svg");
    enabled: true;
    margins: 4, 4, 8, 8;
}
"#;
    let sheet = parse_stylesheet(text, "themes/dark/app.css")?;
    assert_eq!(sheet.font_faces.len(), 1);
    assert_eq!(sheet.rules.len(), 2);

    let buttons = &sheet.rules[1];
    assert_eq!(buttons.order, 1);
    assert_eq!(buttons.selectors.len(), 2);
    assert_eq!(
        buttons.selector_text(),
        "Window > ToolBar Button, Dialog Button.default"
    );
    assert_eq!(
        buttons.declaration("margins").map(|decl| decl.values.len()),
        Some(4)
    );
    assert_eq!(
        buttons.declaration("enabled").map(|decl| decl.values.clone()),
        Some(vec![Value::Ident("true".to_owned())])
    );
    Ok(())
}

#[test]
fn escapes_and_unicode_round_trip() -> Result<(), Box<dyn Error>> {
    let sheet = parse_stylesheet(
        "Étiquette.größe { text: \"Grüße \\\"Welt\\\"\"; }",
        "unicode.css",
    )?;
    let rule = &sheet.rules[0];
    assert_eq!(rule.selector_text(), "Étiquette.größe");
    assert_eq!(
        rule.declaration("text").map(|decl| decl.values.clone()),
        Some(vec![Value::String("Grüße \"Welt\"".to_owned())])
    );
    Ok(())
}

#[test]
fn missing_value_reports_position() {
    let result = parse_stylesheet("Button { color: ; }", "broken.css");
    assert_eq!(
        result.err().map(|error| error.location),
        Some(SourceLocation { line: 1, column: 17 })
    );
}

#[test]
fn unterminated_rule_points_at_rule_start() {
    let result = parse_stylesheet("A { x: 1 }\n\nB { y: 2;", "open.css");
    let error: Option<ParseError> = result.err();
    assert_eq!(
        error.as_ref().map(|error| error.location),
        Some(SourceLocation { line: 3, column: 1 })
    );
    assert!(
        error
            .map(|error| error.to_string())
            .is_some_and(|message| message.contains("unterminated"))
    );
}

#[test]
fn empty_text_is_an_empty_sheet() -> Result<(), Box<dyn Error>> {
    let sheet = parse_stylesheet("  /* nothing */  ", "empty.css")?;
    assert!(sheet.is_empty());
    Ok(())
}

#[test]
fn decimals_keep_their_written_value() -> Result<(), Box<dyn Error>> {
    let sheet = parse_stylesheet(
        "Panel { opacity: 0.1; width: 12.5%; indent: 1.1em; depth: -2.5e-1; }",
        "decimals.css",
    )?;
    let rule = &sheet.rules[0];
    let values = |name: &str| rule.declaration(name).map(|decl| decl.values.clone());
    assert_eq!(values("opacity"), Some(vec![Value::number(0.1)]));
    assert_eq!(values("width"), Some(vec![Value::dimension(12.5, "%")]));
    assert_eq!(values("indent"), Some(vec![Value::dimension(1.1, "em")]));
    assert_eq!(values("depth"), Some(vec![Value::number(-0.25)]));
    Ok(())
}
