//! Stylesheet text to rule model.
//!
//! Grammar: a sequence of style rules (`selector-list { name: value, ...; }`)
//! and `@font-face { url: "..." }` at-rules. Tokenization is delegated to
//! `cssparser`, so escapes and non-ASCII text in names and strings survive
//! unchanged.

mod error;
mod model;
mod parser;
mod values;

pub use error::{ParseError, SourceLocation, SyntaxErrorKind};
pub use model::{Declaration, FontFaceDecl, Rule, StyleSheet};
pub use parser::parse_stylesheet;
