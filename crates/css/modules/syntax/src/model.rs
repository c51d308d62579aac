//! Rule model produced by the stylesheet parser.

use core::fmt;
use css_selectors::Selector;
use css_values::{Layer, Value, write_list};

/// `name: value, value, ...`
#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    /// Property name exactly as written.
    pub name: String,
    pub values: Vec<Value>,
}

impl fmt::Display for Declaration {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}: ", self.name)?;
        write_list(formatter, &self.values)
    }
}

/// A selector list and its declaration block.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    pub selectors: Vec<Selector>,
    /// One entry per property name, in first-seen order; a repeated name
    /// replaces the earlier value in place.
    pub declarations: Vec<Declaration>,
    /// Position of the rule within its sheet's source text.
    pub order: u32,
    pub layer: Layer,
}

impl Rule {
    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations
            .iter()
            .find(|declaration| declaration.name == name)
    }

    /// Selector list rendered back to text, e.g. `Button.primary, Label`.
    pub fn selector_text(&self) -> String {
        self.selectors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Insert with last-wins semantics, keeping the first position of the name.
pub(crate) fn push_declaration(declarations: &mut Vec<Declaration>, declaration: Declaration) {
    if let Some(existing) = declarations
        .iter_mut()
        .find(|existing| existing.name == declaration.name)
    {
        *existing = declaration;
    } else {
        declarations.push(declaration);
    }
}

/// `@font-face { url: "fonts/Title.ttf"; }`; the URL is left unresolved.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FontFaceDecl {
    pub url: String,
}

/// Parser output for one layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleSheet {
    /// Identifier the text was loaded from; relative URLs resolve against it.
    pub source_id: String,
    pub layer: Layer,
    pub rules: Vec<Rule>,
    pub font_faces: Vec<FontFaceDecl>,
}

impl StyleSheet {
    /// A sheet with no rules, used in place of a layer that failed to load.
    pub fn empty(source_id: impl Into<String>, layer: Layer) -> Self {
        Self {
            source_id: source_id.into(),
            layer,
            ..Self::default()
        }
    }

    /// Re-tag the sheet and all of its rules for `layer`.
    #[must_use]
    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layer = layer;
        for rule in &mut self.rules {
            rule.layer = layer;
        }
        self
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.font_faces.is_empty()
    }
}
