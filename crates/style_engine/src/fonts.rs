//! `@font-face` registration.

use crate::events::{EngineEvent, EventBus, ExceptionKind};
use crate::services::{FontId, FontRegistry, ResourceResolver};
use css_syntax::StyleSheet;
use dashmap::DashMap;
use log::{debug, info, warn};
use rustc_hash::FxBuildHasher;

/// Locator to registered font id. Shared by every engine of a host so a
/// file is registered once per process.
#[derive(Debug)]
pub struct FontIdCache {
    ids: DashMap<String, FontId, FxBuildHasher>,
}

impl Default for FontIdCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FontIdCache {
    pub fn new() -> Self {
        Self {
            ids: DashMap::with_hasher(FxBuildHasher),
        }
    }

    pub fn get(&self, locator: &str) -> Option<FontId> {
        self.ids.get(locator).map(|entry| *entry.value())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn insert(&self, locator: String, id: FontId) {
        self.ids.insert(locator, id);
    }
}

/// Register every font face of `sheet`, resolving URLs against the sheet's
/// own source. Failures are reported as [`ExceptionKind::FontWasNotLoaded`].
pub(crate) fn register_font_faces(
    sheet: &StyleSheet,
    resolver: &dyn ResourceResolver,
    registry: &dyn FontRegistry,
    cache: &FontIdCache,
    events: &EventBus<EngineEvent>,
) {
    for font_face in &sheet.font_faces {
        let Some(locator) = resolver.resolve(&sheet.source_id, &font_face.url) else {
            warn!("could not find font file {}", font_face.url);
            events.publish(&EngineEvent::exception(
                ExceptionKind::FontWasNotLoaded,
                format!("Font url '{}' could not be resolved.", font_face.url),
            ));
            continue;
        };
        if let Some(id) = cache.get(&locator) {
            debug!("font {locator} already registered as {id:?}");
            continue;
        }
        info!("load font face {} from {locator}", font_face.url);
        match registry.register(&locator) {
            Ok(id) => cache.insert(locator, id),
            Err(error) => {
                warn!("font {locator} was not loaded: {error:#}");
                events.publish(&EngineEvent::exception(
                    ExceptionKind::FontWasNotLoaded,
                    format!("Could not load font '{locator}': {error}"),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::RelativeResolver;
    use anyhow::bail;
    use css_syntax::parse_stylesheet;
    use parking_lot::Mutex;
    use std::error::Error;
    use std::fs;

    #[derive(Default)]
    struct RecordingRegistry {
        registered: Mutex<Vec<String>>,
    }

    impl FontRegistry for RecordingRegistry {
        fn register(&self, locator: &str) -> anyhow::Result<FontId> {
            if locator.ends_with("broken.ttf") {
                bail!("not a font file");
            }
            let mut registered = self.registered.lock();
            registered.push(locator.to_owned());
            Ok(FontId(u32::try_from(registered.len())?))
        }
    }

    #[test]
    fn registers_each_locator_once() -> Result<(), Box<dyn Error>> {
        let directory = tempfile::tempdir()?;
        fs::write(directory.path().join("Title.ttf"), b"font")?;
        fs::write(directory.path().join("broken.ttf"), b"font")?;
        let source = directory.path().join("app.css");
        let sheet = parse_stylesheet(
            "@font-face { url: \"Title.ttf\"; }\n@font-face { url: \"Title.ttf\"; }\n\
             @font-face { url: \"broken.ttf\"; }\n@font-face { url: \"missing.ttf\"; }",
            &source.to_string_lossy(),
        )?;
        let registry = RecordingRegistry::default();
        let cache = FontIdCache::new();
        let events = EventBus::new();
        let mut received = events.subscribe();

        register_font_faces(&sheet, &RelativeResolver::default(), &registry, &cache, &events);

        assert_eq!(registry.registered.lock().len(), 1);
        assert_eq!(cache.len(), 1);
        let mut failures = 0;
        while let Ok(event) = received.try_recv() {
            if matches!(
                event,
                EngineEvent::Exception {
                    kind: ExceptionKind::FontWasNotLoaded,
                    ..
                }
            ) {
                failures += 1;
            }
        }
        assert_eq!(failures, 2);
        Ok(())
    }
}
