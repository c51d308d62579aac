//! Match tree compilation, path matching and the two-layer cascade.
//!
//! A stylesheet is compiled once into an immutable [`MatchTree`]. Matching a
//! [`css_selectors::UiItemPath`] walks the tree right to left, collects every
//! rule with a fully matching selector and folds their declarations by
//! `(layer, specificity, order)` into a [`css_values::PropertyMap`].

#![forbid(unsafe_code)]

mod describe;
mod matcher;
mod priority;
mod tree;

pub use describe::describe_match;
pub use matcher::{LayerTrees, MatchedDeclaration, cascade_layer, match_path, resolve_properties};
pub use priority::{compare_priority, wins_over};
pub use tree::{BuildError, MatchTree, Terminal, build_match_tree};
