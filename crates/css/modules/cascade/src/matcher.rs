//! Path matching and the per-layer cascade fold.

use crate::priority::wins_over;
use crate::tree::{MatchTree, NodeId};
use css_selectors::{Combinator, PathSegment, Selector, Specificity, UiItemPath, matches_compound};
use css_syntax::{Declaration, Rule};
use css_values::{Layer, Property, PropertyMap, Provenance};
use std::collections::{BTreeMap, HashSet};

/// The default and override trees of one generation.
#[derive(Debug, Default)]
pub struct LayerTrees {
    pub default_tree: MatchTree,
    pub override_tree: MatchTree,
}

impl LayerTrees {
    pub fn new(default_tree: MatchTree, override_tree: MatchTree) -> Self {
        Self {
            default_tree,
            override_tree,
        }
    }

    pub fn get(&self, layer: Layer) -> &MatchTree {
        match layer {
            Layer::Default => &self.default_tree,
            Layer::Override => &self.override_tree,
        }
    }
}

/// One declaration of a rule that matched the path.
#[derive(Clone, Copy, Debug)]
pub struct MatchedDeclaration<'tree> {
    pub rule: &'tree Rule,
    pub declaration: &'tree Declaration,
    /// The most specific of the rule's selectors that matched.
    pub selector: &'tree Selector,
    pub provenance: Provenance,
}

impl MatchedDeclaration<'_> {
    pub fn to_property(&self) -> Property {
        Property::new(self.declaration.values.clone(), self.provenance)
    }
}

/// Every declaration of every rule in `tree` that matches `path`, in rule
/// order. A rule matches when at least one of its selectors does; its
/// specificity is the highest among those.
pub fn match_path<'tree>(path: &UiItemPath, tree: &'tree MatchTree) -> Vec<MatchedDeclaration<'tree>> {
    let matched = matching_rules(path, tree);
    let mut declarations = Vec::new();
    for (rule_index, best) in matched {
        let Some(rule) = tree.rules().get(rule_index) else {
            continue;
        };
        let Some(selector) = rule.selectors.get(best.selector) else {
            continue;
        };
        let provenance = Provenance {
            layer: tree.layer(),
            order: rule.order,
            specificity: best.specificity,
        };
        declarations.extend(rule.declarations.iter().map(|declaration| MatchedDeclaration {
            rule,
            declaration,
            selector,
            provenance,
        }));
    }
    declarations
}

/// Cascade winners of a single layer.
pub fn cascade_layer(path: &UiItemPath, tree: &MatchTree) -> PropertyMap {
    let mut winners: BTreeMap<&str, MatchedDeclaration<'_>> = BTreeMap::new();
    for candidate in match_path(path, tree) {
        let name = candidate.declaration.name.as_str();
        let replace = winners
            .get(name)
            .is_none_or(|incumbent| wins_over(&candidate.provenance, &incumbent.provenance));
        if replace {
            winners.insert(name, candidate);
        }
    }
    winners
        .into_iter()
        .map(|(name, winner)| (name.to_owned(), winner.to_property()))
        .collect()
}

/// Default-layer winners with every Override-layer winner laid over them.
pub fn resolve_properties(path: &UiItemPath, trees: &LayerTrees) -> PropertyMap {
    let mut properties = cascade_layer(path, &trees.default_tree);
    properties.overlay(cascade_layer(path, &trees.override_tree));
    properties
}

#[derive(Clone, Copy)]
struct RuleMatch {
    selector: usize,
    specificity: Specificity,
}

/// Matching rules by index with their best selector.
fn matching_rules(path: &UiItemPath, tree: &MatchTree) -> BTreeMap<usize, RuleMatch> {
    let mut walk = Walk {
        tree,
        nodes: path.segments(),
        visited: HashSet::new(),
        matched: BTreeMap::new(),
    };
    let (Some(leaf), Some(leaf_position)) = (path.leaf(), path.len().checked_sub(1)) else {
        return walk.matched;
    };
    for root in tree.roots_for(&leaf.type_name) {
        walk.visit(root, leaf_position);
    }
    walk.matched
}

/// Right-to-left walk over the tree. Each `(node, position)` pair is
/// expanded at most once, which bounds the walk by nodes times path length
/// while still trying every ancestor for descendant combinators.
struct Walk<'walk> {
    tree: &'walk MatchTree,
    nodes: &'walk [PathSegment],
    visited: HashSet<(NodeId, usize)>,
    matched: BTreeMap<usize, RuleMatch>,
}

impl Walk<'_> {
    fn visit(&mut self, id: NodeId, position: usize) {
        if !self.visited.insert((id, position)) {
            return;
        }
        let tree = self.tree;
        let (Some(node), Some(path_segment)) = (tree.node(id), self.nodes.get(position)) else {
            return;
        };
        if !matches_compound(&node.segment, path_segment) {
            return;
        }
        for terminal in &node.terminals {
            let candidate = RuleMatch {
                selector: terminal.selector,
                specificity: terminal.specificity,
            };
            self.matched
                .entry(terminal.rule)
                .and_modify(|best| {
                    if candidate.specificity > best.specificity {
                        *best = candidate;
                    }
                })
                .or_insert(candidate);
        }
        for &child in &node.children {
            match node.segment.combinator {
                Combinator::Child => {
                    if let Some(parent) = position.checked_sub(1) {
                        self.visit(child, parent);
                    }
                }
                Combinator::Descendant => {
                    for ancestor in (0..position).rev() {
                        self.visit(child, ancestor);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::build_match_tree;
    use css_syntax::parse_stylesheet;
    use css_values::Value;

    fn tree(text: &str) -> MatchTree {
        let sheet = parse_stylesheet(text, "test.css").unwrap_or_default();
        build_match_tree(&sheet).unwrap_or_default()
    }

    fn path(segments: &[(&str, &[&str])]) -> UiItemPath {
        segments
            .iter()
            .map(|(type_name, classes)| PathSegment::with_classes(type_name, classes.iter().copied()))
            .collect()
    }

    fn first_value(map: &PropertyMap, name: &str) -> Option<Value> {
        map.get(name).and_then(|property| property.values.first().cloned())
    }

    #[test]
    fn child_and_descendant_combinators() {
        let child = tree("A > B { hit: 1 }");
        let descendant = tree("A B { hit: 1 }");
        let direct = path(&[("A", &[]), ("B", &[])]);
        let indirect = path(&[("A", &[]), ("X", &[]), ("B", &[])]);
        assert!(cascade_layer(&direct, &child).contains("hit"));
        assert!(!cascade_layer(&indirect, &child).contains("hit"));
        assert!(cascade_layer(&direct, &descendant).contains("hit"));
        assert!(cascade_layer(&indirect, &descendant).contains("hit"));
    }

    #[test]
    fn backtracks_past_a_loose_ancestor_match() {
        // The nearest A has no C parent; the outer one does.
        let sheet = tree("C > A B { hit: 1 }");
        let nested = path(&[("C", &[]), ("A", &[]), ("A", &[]), ("B", &[])]);
        assert!(cascade_layer(&nested, &sheet).contains("hit"));
    }

    #[test]
    fn rule_specificity_is_best_matching_selector() {
        let sheet = tree("Button, Window Button.primary { color: red }\nButton.primary { color: blue }");
        let target = path(&[("Window", &[]), ("Button", &["primary"])]);
        let matches = match_path(&target, &sheet);
        assert_eq!(matches[0].provenance.specificity, Specificity(1, 2));
        assert_eq!(matches[0].selector.to_string(), "Window Button.primary");
        // (1,2) beats the later (1,1)
        let resolved = cascade_layer(&target, &sheet);
        assert_eq!(first_value(&resolved, "color"), Some(Value::Ident("red".to_owned())));
    }

    #[test]
    fn universal_and_class_only_selectors() {
        let sheet = tree("* { a: 1 }\n.flat { b: 2 }\nLabel.flat.big { c: 3 }");
        let flat_label = path(&[("Label", &["flat"])]);
        let resolved = cascade_layer(&flat_label, &sheet);
        assert!(resolved.contains("a"));
        assert!(resolved.contains("b"));
        assert!(!resolved.contains("c"));
    }

    #[test]
    fn empty_path_matches_nothing() {
        let sheet = tree("* { a: 1 }");
        assert!(match_path(&UiItemPath::default(), &sheet).is_empty());
    }
}
