//! Selectors over UI item paths.
//!
//! A selector is a chain of compound selectors (optional type name plus class
//! qualifiers) joined by descendant (whitespace) or child (`>`) combinators.
//! Subjects are not live objects but materialized [`UiItemPath`]s: the ordered
//! `(type name, class set)` chain from the root ancestor down to the node.
//!
//! This crate provides:
//! - The selector and path data model
//! - Selector list parsing on top of `cssparser`
//! - Specificity calculation
//! - A reference right-to-left matcher with backtracking

use core::fmt;
use std::collections::BTreeSet;

mod matcher;
mod parser;
mod specificity;

pub use matcher::{matches_compound, matches_path};
pub use parser::{SelectorError, SelectorParseErrorKind, parse_selector_list, parse_selectors};
pub use specificity::Specificity;

/// Set of style class names. Ordered so that hashing and display are stable.
pub type ClassSet = BTreeSet<String>;

/// Relation between a compound selector and the previous (root-ward) one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Combinator {
    /// Any ancestor (whitespace).
    #[default]
    Descendant,
    /// The immediate parent (`>`).
    Child,
}

/// One compound selector inside a [`Selector`] chain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SelectorSegment {
    /// Required type name; `None` is the wildcard.
    pub type_name: Option<String>,
    /// Class names the node must carry (subset match).
    pub class_names: ClassSet,
    /// Relation to the previous segment. Ignored for the first segment.
    pub combinator: Combinator,
}

impl SelectorSegment {
    /// Segment requiring a type name and nothing else.
    #[inline]
    pub fn of_type(type_name: &str) -> Self {
        Self {
            type_name: Some(type_name.to_owned()),
            ..Self::default()
        }
    }

    /// Builder-style class qualifier.
    #[inline]
    #[must_use]
    pub fn with_class(mut self, class_name: &str) -> Self {
        self.class_names.insert(class_name.to_owned());
        self
    }

    /// Builder-style combinator assignment.
    #[inline]
    #[must_use]
    pub const fn with_combinator(mut self, combinator: Combinator) -> Self {
        self.combinator = combinator;
        self
    }

    /// True for `*` with no class qualifiers.
    #[inline]
    pub fn is_universal(&self) -> bool {
        self.type_name.is_none() && self.class_names.is_empty()
    }
}

impl fmt::Display for SelectorSegment {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.type_name {
            Some(type_name) => formatter.write_str(type_name)?,
            None if self.class_names.is_empty() => formatter.write_str("*")?,
            None => {}
        }
        for class_name in &self.class_names {
            write!(formatter, ".{class_name}")?;
        }
        Ok(())
    }
}

/// A complex selector: segments ordered root-ward first, the last one
/// matches the path's leaf.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Selector {
    pub segments: Vec<SelectorSegment>,
}

impl Selector {
    #[inline]
    pub const fn new(segments: Vec<SelectorSegment>) -> Self {
        Self { segments }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Specificity summed over all compounds.
    #[inline]
    pub fn specificity(&self) -> Specificity {
        specificity::specificity_of_selector(self)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                match segment.combinator {
                    Combinator::Child => formatter.write_str(" > ")?,
                    Combinator::Descendant => formatter.write_str(" ")?,
                }
            }
            write!(formatter, "{segment}")?;
        }
        Ok(())
    }
}

/// One node of a UI path: its type name and style classes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathSegment {
    pub type_name: String,
    pub class_names: ClassSet,
}

impl PathSegment {
    #[inline]
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_owned(),
            class_names: ClassSet::new(),
        }
    }

    /// Segment with the given classes.
    pub fn with_classes<I, S>(type_name: &str, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            type_name: type_name.to_owned(),
            class_names: classes.into_iter().map(Into::into).collect(),
        }
    }

    /// Segment whose classes come from a space separated style name, e.g. `"primary large"`.
    pub fn with_style_name(type_name: &str, style_name: &str) -> Self {
        Self::with_classes(type_name, style_name.split_whitespace())
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.type_name)?;
        for class_name in &self.class_names {
            write!(formatter, ".{class_name}")?;
        }
        Ok(())
    }
}

/// Root-to-leaf chain of [`PathSegment`]s. Equality and hashing cover the
/// whole sequence, which makes a path usable as a cache key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UiItemPath {
    segments: Vec<PathSegment>,
}

impl UiItemPath {
    #[inline]
    pub const fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    #[inline]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The target node.
    #[inline]
    pub fn leaf(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// The path minus its last segment, or `None` for empty and root-only paths.
    pub fn parent(&self) -> Option<Self> {
        let (_, ancestors) = self.segments.split_last()?;
        if ancestors.is_empty() {
            return None;
        }
        Some(Self::new(ancestors.to_vec()))
    }

    /// Builder-style append of a child segment.
    #[must_use]
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self::new(segments)
    }

    #[inline]
    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }
}

impl FromIterator<PathSegment> for UiItemPath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Display for UiItemPath {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                formatter.write_str("/")?;
            }
            write!(formatter, "{segment}")?;
        }
        Ok(())
    }
}
