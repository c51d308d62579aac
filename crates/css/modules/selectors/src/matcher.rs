//! Reference selector matching against a [`UiItemPath`].
//!
//! Walks one selector at a time; the cascade's match tree is what serves
//! lookups, and this matcher is what it is checked against.
//!
//! Right-to-left: the last compound must match the leaf, then each earlier
//! compound is related to the one after it through that one's combinator.
//! Descendant relations try every ancestor position, so a loose early match
//! never hides a later one. Failed `(compound, position)` pairs are
//! remembered, which bounds the work by compounds times path length squared.

use crate::{Combinator, PathSegment, Selector, SelectorSegment, UiItemPath};

/// Match a compound selector against a single path segment.
#[inline]
pub fn matches_compound(segment: &SelectorSegment, node: &PathSegment) -> bool {
    if let Some(type_name) = &segment.type_name
        && *type_name != node.type_name
    {
        return false;
    }
    segment.class_names.is_subset(&node.class_names)
}

/// Match a complex selector against a path whose last segment is the subject.
pub fn matches_path(selector: &Selector, path: &UiItemPath) -> bool {
    let nodes = path.segments();
    let (Some(last_index), Some(leaf_position)) = (
        selector.segments.len().checked_sub(1),
        nodes.len().checked_sub(1),
    ) else {
        return false;
    };
    PathMatcher::new(&selector.segments, nodes).matches_from(last_index, leaf_position)
}

struct PathMatcher<'a> {
    segments: &'a [SelectorSegment],
    nodes: &'a [PathSegment],
    /// Indexed by `index * nodes.len() + position`.
    failed: Vec<bool>,
}

impl<'a> PathMatcher<'a> {
    fn new(segments: &'a [SelectorSegment], nodes: &'a [PathSegment]) -> Self {
        Self {
            segments,
            nodes,
            failed: vec![false; segments.len().saturating_mul(nodes.len())],
        }
    }

    /// True if `segments[..=index]` matches with `segments[index]` anchored at `nodes[position]`.
    fn matches_from(&mut self, index: usize, position: usize) -> bool {
        let slot = index
            .saturating_mul(self.nodes.len())
            .saturating_add(position);
        if self.failed.get(slot).is_none_or(|failed| *failed) {
            return false;
        }
        let matched = self.match_uncached(index, position);
        if !matched && let Some(failed) = self.failed.get_mut(slot) {
            *failed = true;
        }
        matched
    }

    fn match_uncached(&mut self, index: usize, position: usize) -> bool {
        let (Some(segment), Some(node)) = (self.segments.get(index), self.nodes.get(position))
        else {
            return false;
        };
        if !matches_compound(segment, node) {
            return false;
        }
        let Some(next_index) = index.checked_sub(1) else {
            return true;
        };
        match segment.combinator {
            Combinator::Child => position
                .checked_sub(1)
                .is_some_and(|parent| self.matches_from(next_index, parent)),
            Combinator::Descendant => (0..position)
                .rev()
                .any(|ancestor| self.matches_from(next_index, ancestor)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_selectors;

    fn path(items: &[(&str, &str)]) -> UiItemPath {
        items
            .iter()
            .map(|(type_name, style)| PathSegment::with_style_name(type_name, style))
            .collect()
    }

    fn first(text: &str) -> Selector {
        parse_selectors(text)
            .ok()
            .and_then(|list| list.into_iter().next())
            .unwrap_or_default()
    }

    #[test]
    fn child_requires_immediate_parent() {
        let selector = first("A > B");
        assert!(matches_path(&selector, &path(&[("A", ""), ("B", "")])));
        assert!(!matches_path(&selector, &path(&[("A", ""), ("X", ""), ("B", "")])));
    }

    #[test]
    fn descendant_skips_ancestors() {
        let selector = first("A B");
        assert!(matches_path(&selector, &path(&[("A", ""), ("B", "")])));
        assert!(matches_path(&selector, &path(&[("A", ""), ("X", ""), ("B", "")])));
        assert!(!matches_path(&selector, &path(&[("B", ""), ("A", "")])));
    }

    #[test]
    fn backtracks_past_a_closer_loose_match() {
        // The nearest `A` has no `B` parent above it; the outer one is a child of `C`.
        let selector = first("C > A B");
        let target = path(&[("C", ""), ("A", ""), ("A", ""), ("B", "")]);
        assert!(matches_path(&selector, &target));
    }

    #[test]
    fn long_descendant_chains_finish() {
        let mut text = "X".to_owned();
        for _ in 0..29 {
            text.push_str(" A");
        }
        let selector = first(&text);
        assert_eq!(selector.segments.len(), 30);

        let mut items = vec![("A", ""); 40];
        assert!(!matches_path(&selector, &path(&items)));
        items.insert(0, ("X", ""));
        assert!(matches_path(&selector, &path(&items)));
    }

    #[test]
    fn classes_are_subset_matched() {
        let selector = first("Button.primary");
        assert!(matches_path(&selector, &path(&[("Button", "primary large")])));
        assert!(!matches_path(&selector, &path(&[("Button", "large")])));
        assert!(!matches_path(&selector, &path(&[("Label", "primary")])));
    }

    #[test]
    fn subject_must_be_leaf() {
        let selector = first("Window");
        assert!(!matches_path(&selector, &path(&[("Window", ""), ("Button", "")])));
        assert!(!matches_path(&selector, &UiItemPath::default()));
    }
}
