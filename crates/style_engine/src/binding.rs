//! Per-path view of the current generation handed to host nodes.

use crate::engine::EngineShared;
use crate::events::{BindingEvent, EngineEvent, EventBus, ExceptionKind};
use crate::generation::{Generation, LayerSources};
use crate::revision::Revision;
use core::fmt;
use css_selectors::UiItemPath;
use css_values::{Font, LookupError, PropertyMap, Rgba, Value};
use log::warn;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;

/// Result of [`StyleBinding::get`]: one value as text, or all of them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindingValue {
    Single(String),
    List(Vec<String>),
}

/// What one generation says about the path. URLs are resolved against
/// `sources`, so a value and its base always come from the same reload.
struct Snapshot {
    revision: Revision,
    properties: Arc<PropertyMap>,
    sources: LayerSources,
}

impl Snapshot {
    fn of(generation: &Generation, path: &UiItemPath) -> Self {
        Self {
            revision: generation.revision,
            properties: generation.resolve(path),
            sources: generation.sources.clone(),
        }
    }
}

/// Style state of one path. Created by the engine, one per distinct path,
/// and refreshed by it after every reload.
pub struct StyleBinding {
    path: UiItemPath,
    snapshot: RwLock<Snapshot>,
    engine: Weak<EngineShared>,
    events: EventBus<BindingEvent>,
}

impl StyleBinding {
    pub(crate) fn new(path: UiItemPath, engine: Weak<EngineShared>, generation: &Generation) -> Self {
        Self {
            snapshot: RwLock::new(Snapshot::of(generation, &path)),
            path,
            engine,
            events: EventBus::new(),
        }
    }

    #[inline]
    pub fn path(&self) -> &UiItemPath {
        &self.path
    }

    /// Generation the current properties were resolved from.
    pub fn revision(&self) -> Revision {
        self.snapshot.read().revision
    }

    pub fn properties(&self) -> Arc<PropertyMap> {
        Arc::clone(&self.snapshot.read().properties)
    }

    /// True when at least one property applies to this path.
    pub fn is_valid(&self) -> bool {
        !self.snapshot.read().properties.is_empty()
    }

    pub fn is_set(&self, key: &str) -> bool {
        self.snapshot.read().properties.contains(key)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BindingEvent> {
        self.events.subscribe()
    }

    /// # Errors
    /// See [`PropertyMap::values`].
    pub fn values(&self, key: &str) -> Result<Vec<Value>, LookupError> {
        self.lookup(|properties| properties.values(key).map(<[Value]>::to_vec))
    }

    /// # Errors
    /// See [`PropertyMap::string`].
    pub fn string(&self, key: &str) -> Result<String, LookupError> {
        self.lookup(|properties| properties.string(key))
    }

    /// # Errors
    /// See [`PropertyMap::number`].
    pub fn number(&self, key: &str) -> Result<f64, LookupError> {
        self.lookup(|properties| properties.number(key))
    }

    /// # Errors
    /// See [`PropertyMap::boolean`].
    pub fn boolean(&self, key: &str) -> Result<bool, LookupError> {
        self.lookup(|properties| properties.boolean(key))
    }

    /// # Errors
    /// See [`PropertyMap::color`].
    pub fn color(&self, key: &str) -> Result<Rgba, LookupError> {
        self.lookup(|properties| properties.color(key))
    }

    /// # Errors
    /// See [`PropertyMap::font`].
    pub fn font(&self, key: &str) -> Result<Font, LookupError> {
        self.lookup(|properties| properties.font(key))
    }

    /// Every value of `key` rendered as text; a single value is not wrapped
    /// in a list. `None` if the key is not set.
    pub fn get(&self, key: &str) -> Option<BindingValue> {
        let values = self.values(key).ok()?;
        let mut texts: Vec<String> = values.iter().map(value_text).collect();
        if texts.len() == 1 {
            texts.pop().map(BindingValue::Single)
        } else {
            Some(BindingValue::List(texts))
        }
    }

    /// URL of `key`, resolved against the source of the layer that supplied
    /// it in the generation this binding reads from. Falls back to the URL
    /// as written when nothing resolves.
    ///
    /// # Errors
    /// See [`PropertyMap::url`].
    pub fn url(&self, key: &str) -> Result<String, LookupError> {
        let (reference, sources) = {
            let snapshot = self.snapshot.read();
            let reference = snapshot
                .properties
                .url(key)
                .inspect_err(|error| self.report(error))?;
            (reference, snapshot.sources.clone())
        };
        let Some(engine) = self.engine.upgrade() else {
            return Ok(reference.url);
        };
        Ok(engine
            .resolve_url_in(&sources, reference.layer, &reference.url)
            .unwrap_or_else(|| {
                warn!("could not resolve url {} ({})", reference.url, self.path);
                reference.url
            }))
    }

    fn lookup<T>(
        &self,
        read: impl FnOnce(&PropertyMap) -> Result<T, LookupError>,
    ) -> Result<T, LookupError> {
        let properties = self.properties();
        read(&properties).inspect_err(|error| self.report(error))
    }

    fn report(&self, error: &LookupError) {
        match error {
            LookupError::Missing { key } => {
                warn!("property {key} not found ({})", self.path);
                if let Some(engine) = self.engine.upgrade() {
                    engine.events.publish(&EngineEvent::exception(
                        ExceptionKind::PropertyNotFound,
                        format!("Property '{key}' not found ({})", self.path),
                    ));
                }
            }
            LookupError::Conversion { .. } => warn!("{error} ({})", self.path),
        }
    }

    /// Switch to what `generation` resolves for this path.
    pub(crate) fn load(&self, generation: &Generation) {
        *self.snapshot.write() = Snapshot::of(generation, &self.path);
        self.events.publish(&BindingEvent::PropertiesChanged {
            revision: generation.revision,
        });
    }

    /// The engine is going away.
    pub(crate) fn invalidate(&self) {
        {
            let mut snapshot = self.snapshot.write();
            snapshot.properties = Arc::new(PropertyMap::new());
        }
        self.events.publish(&BindingEvent::Invalidated);
    }
}

impl fmt::Debug for StyleBinding {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("StyleBinding")
            .field("path", &self.path)
            .field("revision", &self.revision())
            .finish_non_exhaustive()
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Color(text) | Value::String(text) | Value::Ident(text) | Value::Url(text) => {
            text.clone()
        }
        other => other.to_string(),
    }
}
