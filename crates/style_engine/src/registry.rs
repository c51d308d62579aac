//! Node registration: maps host node identities to their style path and
//! binding.

use crate::binding::StyleBinding;
use crate::host::EngineHost;
use crate::services::PathProvider;
use core::hash::Hash;
use css_selectors::UiItemPath;
use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

const NO_ENGINE: &str = "No style engine installed";

/// Style state tracked for one registered node.
#[derive(Clone, Debug)]
pub struct NodeStyle {
    pub path: UiItemPath,
    /// Set once the node was bound to an attached engine.
    pub binding: Option<Arc<StyleBinding>>,
}

/// Registry of styled nodes of one host.
///
/// Paths come from the [`PathProvider`]; bindings are requested from
/// whichever engine is attached to the host when first asked for.
pub struct StyleRegistry<N> {
    host: Arc<EngineHost>,
    provider: Box<dyn PathProvider<N>>,
    nodes: Mutex<HashMap<N, NodeStyle>>,
}

impl<N: Eq + Hash + Clone> StyleRegistry<N> {
    pub fn new(host: Arc<EngineHost>, provider: impl PathProvider<N> + 'static) -> Self {
        Self {
            host,
            provider: Box::new(provider),
            nodes: Mutex::new(HashMap::new()),
        }
    }

    /// Track `node` under its current path. Returns the path, or `None` if
    /// the provider does not know the node.
    pub fn register(&self, node: N) -> Option<UiItemPath> {
        let Some(path) = self.provider.path_of(&node) else {
            warn!("cannot style a node outside the hierarchy");
            return None;
        };
        debug!("register styled node at {path}");
        self.nodes.lock().insert(
            node,
            NodeStyle {
                path: path.clone(),
                binding: None,
            },
        );
        Some(path)
    }

    /// Recompute the path of `node` after its parent or class list changed.
    /// Returns `true` if the path changed; the binding is then dropped and
    /// re-requested on next access.
    pub fn refresh(&self, node: &N) -> bool {
        let Some(path) = self.provider.path_of(node) else {
            return false;
        };
        let mut nodes = self.nodes.lock();
        let Some(style) = nodes.get_mut(node) else {
            return false;
        };
        if style.path == path {
            return false;
        }
        debug!("styled node moved from {} to {path}", style.path);
        style.path = path;
        style.binding = None;
        true
    }

    pub fn unregister(&self, node: &N) -> bool {
        self.nodes.lock().remove(node).is_some()
    }

    pub fn path(&self, node: &N) -> Option<UiItemPath> {
        self.nodes.lock().get(node).map(|style| style.path.clone())
    }

    /// The binding of a registered node. Without an attached engine this is
    /// the last binding handed out, if any.
    pub fn binding(&self, node: &N) -> Option<Arc<StyleBinding>> {
        let mut nodes = self.nodes.lock();
        let style = nodes.get_mut(node)?;
        if let Some(engine) = self.host.engine() {
            style.binding = Some(engine.binding(&style.path));
        }
        style.binding.clone()
    }

    /// Human-readable match report for `node`.
    pub fn style_info(&self, node: &N) -> String {
        let Some(engine) = self.host.engine() else {
            return NO_ENGINE.to_owned();
        };
        let path = self
            .path(node)
            .or_else(|| self.provider.path_of(node))
            .unwrap_or_default();
        engine.describe_match(&path)
    }

    pub fn len(&self) -> usize {
        self.nodes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StyleEngineConfig;
    use crate::engine::StyleEngine;
    use css_selectors::PathSegment;

    #[derive(Default)]
    struct Paths {
        paths: Arc<Mutex<HashMap<u32, UiItemPath>>>,
    }

    impl PathProvider<u32> for Paths {
        fn path_of(&self, node: &u32) -> Option<UiItemPath> {
            self.paths.lock().get(node).cloned()
        }
    }

    fn button(classes: &str) -> UiItemPath {
        [
            PathSegment::new("Window"),
            PathSegment::with_style_name("Button", classes),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn binding_waits_for_an_engine() {
        let host = Arc::new(EngineHost::new());
        let provider = Paths::default();
        provider.paths.lock().insert(1, button(""));
        let registry = StyleRegistry::new(Arc::clone(&host), provider);

        assert_eq!(registry.register(1), Some(button("")));
        assert!(registry.register(2).is_none());
        assert!(registry.binding(&1).is_none());
        assert_eq!(registry.style_info(&1), NO_ENGINE);

        let engine = Arc::new(StyleEngine::new(StyleEngineConfig::default()));
        engine.reload_from_texts(Some("Button { color: red; }"), None);
        assert_eq!(host.attach(engine), Ok(()));
        assert!(registry.binding(&1).is_some_and(|binding| binding.is_set("color")));
        assert!(registry.style_info(&1).contains("color: red"));
    }

    #[test]
    fn refresh_repaths_and_rebinds() {
        let host = Arc::new(EngineHost::new());
        let engine = Arc::new(StyleEngine::new(StyleEngineConfig::default()));
        engine.reload_from_texts(None, Some("Button.primary { size: 3; }"));
        assert_eq!(host.attach(engine), Ok(()));
        let provider = Paths::default();
        let paths = Arc::clone(&provider.paths);
        paths.lock().insert(7, button(""));
        let registry = StyleRegistry::new(host, provider);
        registry.register(7);
        assert!(registry.binding(&7).is_some_and(|binding| !binding.is_valid()));

        paths.lock().insert(7, button("primary"));
        assert!(registry.refresh(&7));
        assert!(!registry.refresh(&7));
        assert!(registry.binding(&7).is_some_and(|binding| binding.is_set("size")));

        assert!(registry.unregister(&7));
        assert!(registry.is_empty());
    }
}
