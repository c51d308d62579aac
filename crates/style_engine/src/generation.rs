use crate::cache::PathCache;
use crate::revision::Revision;
use css_cascade::{LayerTrees, describe_match};
use css_selectors::UiItemPath;
use css_values::{Layer, PropertyMap};
use std::sync::Arc;

/// Source identifiers of the two layers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayerSources {
    pub default_source: Option<String>,
    pub override_source: Option<String>,
}

impl LayerSources {
    pub fn get(&self, layer: Layer) -> Option<&str> {
        match layer {
            Layer::Default => self.default_source.as_deref(),
            Layer::Override => self.override_source.as_deref(),
        }
    }

    pub(crate) fn slot(&mut self, layer: Layer) -> &mut Option<String> {
        match layer {
            Layer::Default => &mut self.default_source,
            Layer::Override => &mut self.override_source,
        }
    }
}

/// Everything one reload produced: both match trees, a cache that is only
/// ever filled from those trees, and the sources they were loaded from.
/// Installed and replaced as a unit.
#[derive(Debug, Default)]
pub struct Generation {
    pub revision: Revision,
    pub trees: LayerTrees,
    pub cache: PathCache,
    pub sources: LayerSources,
}

impl Generation {
    pub fn new(revision: Revision, trees: LayerTrees, sources: LayerSources) -> Self {
        Self {
            revision,
            trees,
            cache: PathCache::new(),
            sources,
        }
    }

    #[inline]
    pub fn resolve(&self, path: &UiItemPath) -> Arc<PropertyMap> {
        self.cache.resolve(path, &self.trees)
    }

    #[inline]
    pub fn describe(&self, path: &UiItemPath) -> String {
        describe_match(path, &self.trees)
    }
}
