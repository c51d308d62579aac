//! Match tree: every selector of a sheet registered leaf compound first.
//!
//! Each node is keyed by `(compound, combinator)`; the combinator is the
//! relation from that compound to the next node toward the root. A node whose
//! chain spells out a whole selector carries a [`Terminal`] naming the rule
//! and selector. Selectors sharing a leaf-side suffix share nodes.

use core::fmt;
use css_selectors::{Selector, SelectorSegment, Specificity};
use css_syntax::{Rule, StyleSheet};
use css_values::Layer;
use log::{debug, error};
use std::collections::HashMap;

pub(crate) type NodeId = usize;

/// A fully matched selector reachable at a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Terminal {
    /// Index into [`MatchTree::rules`].
    pub rule: usize,
    /// Index into that rule's selector list.
    pub selector: usize,
    pub specificity: Specificity,
}

#[derive(Debug)]
pub(crate) struct MatchNode {
    pub(crate) segment: SelectorSegment,
    /// Nodes for the compound one step toward the root.
    pub(crate) children: Vec<NodeId>,
    pub(crate) terminals: Vec<Terminal>,
}

/// A selector could not be registered; the whole build is abandoned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuildError {
    EmptySelector { rule: u32, selector: usize },
}

impl fmt::Display for BuildError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySelector { rule, selector } => {
                write!(formatter, "rule {rule} has an empty selector at index {selector}")
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// Compiled, read-only selector index over one layer's rules.
#[derive(Debug, Default)]
pub struct MatchTree {
    layer: Layer,
    source_id: String,
    rules: Vec<Rule>,
    pub(crate) nodes: Vec<MatchNode>,
    /// Leaf-compound nodes by required type name.
    typed_roots: HashMap<String, Vec<NodeId>>,
    /// Leaf-compound nodes with no type name.
    universal_roots: Vec<NodeId>,
}

impl MatchTree {
    /// A tree with no rules for `layer`.
    pub fn empty(layer: Layer, source_id: impl Into<String>) -> Self {
        Self {
            layer,
            source_id: source_id.into(),
            ..Self::default()
        }
    }

    /// Build, or log the failure and fall back to an empty tree.
    pub fn build_or_empty(sheet: &StyleSheet) -> Self {
        match build_match_tree(sheet) {
            Ok(tree) => tree,
            Err(build_error) => {
                error!(
                    "discarding {} stylesheet '{}': {build_error}",
                    sheet.layer.name(),
                    sheet.source_id
                );
                Self::empty(sheet.layer, sheet.source_id.clone())
            }
        }
    }

    #[inline]
    pub const fn layer(&self) -> Layer {
        self.layer
    }

    #[inline]
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    #[inline]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<&MatchNode> {
        self.nodes.get(id)
    }

    /// Leaf-compound candidates for a node of type `type_name`.
    pub(crate) fn roots_for<'tree>(&'tree self, type_name: &str) -> impl Iterator<Item = NodeId> + 'tree {
        self.typed_roots
            .get(type_name)
            .into_iter()
            .flatten()
            .chain(&self.universal_roots)
            .copied()
    }
}

/// Compile `sheet` into a new tree.
///
/// # Errors
/// [`BuildError::EmptySelector`] if any rule carries an empty selector; no
/// partial tree is returned.
pub fn build_match_tree(sheet: &StyleSheet) -> Result<MatchTree, BuildError> {
    let mut builder = TreeBuilder::default();
    for (rule_index, rule) in sheet.rules.iter().enumerate() {
        for (selector_index, selector) in rule.selectors.iter().enumerate() {
            builder
                .insert(selector, rule_index, selector_index)
                .ok_or(BuildError::EmptySelector {
                    rule: rule.order,
                    selector: selector_index,
                })?;
        }
    }
    let tree = builder.finish(sheet);
    debug!(
        "built {} match tree for '{}': {} rules, {} nodes",
        tree.layer.name(),
        tree.source_id,
        tree.rules.len(),
        tree.nodes.len()
    );
    Ok(tree)
}

#[derive(Default)]
struct TreeBuilder {
    nodes: Vec<MatchNode>,
    /// `(parent, segment)` to node; `None` parent for leaf compounds.
    index: HashMap<(Option<NodeId>, SelectorSegment), NodeId>,
    roots: Vec<NodeId>,
}

impl TreeBuilder {
    /// Register `selector`; `None` if it has no segments.
    fn insert(&mut self, selector: &Selector, rule: usize, selector_index: usize) -> Option<()> {
        let mut segments = selector.segments.iter().rev();
        let mut current = self.intern(None, segments.next()?);
        for segment in segments {
            current = self.intern(Some(current), segment);
        }
        let node = self.nodes.get_mut(current)?;
        node.terminals.push(Terminal {
            rule,
            selector: selector_index,
            specificity: selector.specificity(),
        });
        Some(())
    }

    fn intern(&mut self, parent: Option<NodeId>, segment: &SelectorSegment) -> NodeId {
        let key = (parent, segment.clone());
        if let Some(&existing) = self.index.get(&key) {
            return existing;
        }
        let id = self.nodes.len();
        self.nodes.push(MatchNode {
            segment: segment.clone(),
            children: Vec::new(),
            terminals: Vec::new(),
        });
        match parent.and_then(|parent_id| self.nodes.get_mut(parent_id)) {
            Some(parent_node) => parent_node.children.push(id),
            None => self.roots.push(id),
        }
        self.index.insert(key, id);
        id
    }

    fn finish(self, sheet: &StyleSheet) -> MatchTree {
        let mut typed_roots: HashMap<String, Vec<NodeId>> = HashMap::new();
        let mut universal_roots = Vec::new();
        for root in self.roots {
            match self
                .nodes
                .get(root)
                .and_then(|node| node.segment.type_name.clone())
            {
                Some(type_name) => typed_roots.entry(type_name).or_default().push(root),
                None => universal_roots.push(root),
            }
        }
        MatchTree {
            layer: sheet.layer,
            source_id: sheet.source_id.clone(),
            rules: sheet.rules.clone(),
            nodes: self.nodes,
            typed_roots,
            universal_roots,
        }
    }
}
