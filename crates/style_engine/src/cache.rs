//! Memoized property maps per path.
//!
//! A path whose leaf matches nothing shares its parent's map (same `Arc`);
//! otherwise its map is the leaf's own winners filled in with the parent's
//! entries. Entries are only valid for the trees they were computed from,
//! so a cache is never reused across generations.

use css_cascade::{LayerTrees, resolve_properties};
use css_selectors::UiItemPath;
use css_values::PropertyMap;
use dashmap::DashMap;
use log::trace;
use rustc_hash::FxBuildHasher;
use std::sync::Arc;

#[derive(Debug)]
pub struct PathCache {
    entries: DashMap<UiItemPath, Arc<PropertyMap>, FxBuildHasher>,
    empty: Arc<PropertyMap>,
}

impl Default for PathCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PathCache {
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_hasher(FxBuildHasher),
            empty: Arc::new(PropertyMap::new()),
        }
    }

    /// Resolved properties for `path` under `trees`.
    ///
    /// Concurrent callers may both compute the same path; the results are
    /// equal and the last insert wins.
    pub fn resolve(&self, path: &UiItemPath, trees: &LayerTrees) -> Arc<PropertyMap> {
        if path.is_empty() {
            return Arc::clone(&self.empty);
        }
        if let Some(hit) = self.entries.get(path) {
            trace!("style cache hit for {path}");
            return Arc::clone(hit.value());
        }
        trace!("style cache miss for {path}");

        let own = resolve_properties(path, trees);
        let resolved = match path.parent() {
            Some(parent) => {
                let inherited = self.resolve(&parent, trees);
                if own.is_empty() {
                    inherited
                } else {
                    let mut merged = own;
                    merged.inherit_from(&inherited);
                    Arc::new(merged)
                }
            }
            None if own.is_empty() => Arc::clone(&self.empty),
            None => Arc::new(own),
        };
        self.entries.insert(path.clone(), Arc::clone(&resolved));
        resolved
    }

    /// The shared map returned for paths without properties.
    #[inline]
    pub fn empty_map(&self) -> Arc<PropertyMap> {
        Arc::clone(&self.empty)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn contains(&self, path: &UiItemPath) -> bool {
        self.entries.contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use css_cascade::MatchTree;
    use css_selectors::PathSegment;
    use css_syntax::parse_stylesheet;
    use css_values::{Layer, Value};

    fn trees(text: &str) -> LayerTrees {
        let sheet = parse_stylesheet(text, "cache.css").unwrap_or_default();
        LayerTrees::new(
            MatchTree::build_or_empty(&sheet),
            MatchTree::empty(Layer::Override, ""),
        )
    }

    fn path(types: &[&str]) -> UiItemPath {
        types.iter().map(|type_name| PathSegment::new(type_name)).collect()
    }

    #[test]
    fn unmatched_child_shares_parent_map() {
        let trees = trees("Window { color: red; }");
        let cache = PathCache::new();
        let parent = cache.resolve(&path(&["Window"]), &trees);
        let child = cache.resolve(&path(&["Window", "Spacer"]), &trees);
        assert!(Arc::ptr_eq(&parent, &child));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn matched_child_overlays_parent() {
        let trees = trees("Window { color: red; size: 1; }\nButton { color: blue; }");
        let cache = PathCache::new();
        let button = cache.resolve(&path(&["Window", "Panel", "Button"]), &trees);
        assert_eq!(
            button.get("color").map(|property| property.values.clone()),
            Some(vec![Value::Ident("blue".to_owned())])
        );
        assert!(button.contains("size"));
        // The intermediate prefix was populated on the way.
        assert!(cache.contains(&path(&["Window", "Panel"])));
        let panel = cache.resolve(&path(&["Window", "Panel"]), &trees);
        let window = cache.resolve(&path(&["Window"]), &trees);
        assert!(Arc::ptr_eq(&panel, &window));
        assert!(!Arc::ptr_eq(&button, &window));
    }

    #[test]
    fn empty_and_unstyled_roots_share_the_empty_map() {
        let trees = trees("Window { color: red; }");
        let cache = PathCache::new();
        let empty = cache.resolve(&UiItemPath::default(), &trees);
        let unstyled = cache.resolve(&path(&["Dialog"]), &trees);
        assert!(Arc::ptr_eq(&empty, &cache.empty_map()));
        assert!(Arc::ptr_eq(&unstyled, &cache.empty_map()));
        assert!(unstyled.is_empty());
    }
}
