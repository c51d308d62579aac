//! The style engine: owns the configured sources, reloads them into
//! generations and hands out per-path bindings.

use crate::binding::StyleBinding;
use crate::config::{ReloadFailurePolicy, StyleEngineConfig, normalize_extensions};
use crate::events::{EngineEvent, EventBus, ExceptionKind};
use crate::fonts::{FontIdCache, register_font_faces};
use crate::generation::{Generation, LayerSources};
use crate::revision::{Revision, RevisionCounter};
use crate::services::{
    FileResourceLoader, FontRegistry, RelativeResolver, ResourceError, ResourceLoader,
    ResourceResolver,
};
use core::fmt;
use css_cascade::{LayerTrees, MatchTree, build_match_tree};
use css_selectors::UiItemPath;
use css_syntax::parse_stylesheet;
use css_values::{Layer, PropertyMap};
use log::{debug, error, info, warn};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fs;
use std::mem;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Collaborators a [`StyleEngine`] loads and resolves through.
#[derive(Clone)]
pub struct EngineServices {
    pub loader: Arc<dyn ResourceLoader>,
    pub resolver: Arc<dyn ResourceResolver>,
    /// Font faces are skipped when no registry is installed.
    pub fonts: Option<Arc<dyn FontRegistry>>,
    pub font_ids: Arc<FontIdCache>,
}

impl EngineServices {
    /// File system loader and a resolver over the configured search paths.
    pub fn from_config(config: &StyleEngineConfig) -> Self {
        Self {
            loader: Arc::new(FileResourceLoader),
            resolver: Arc::new(RelativeResolver::new(config.search_paths.clone())),
            fonts: None,
            font_ids: Arc::new(FontIdCache::new()),
        }
    }

    #[must_use]
    pub fn with_loader(mut self, loader: Arc<dyn ResourceLoader>) -> Self {
        self.loader = loader;
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn ResourceResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn with_font_registry(
        mut self,
        registry: Arc<dyn FontRegistry>,
        font_ids: Arc<FontIdCache>,
    ) -> Self {
        self.fonts = Some(registry);
        self.font_ids = font_ids;
        self
    }
}

/// Outcome of loading one layer during a reload.
enum LayerLoad {
    /// No source configured for the layer.
    Unconfigured,
    Built(MatchTree),
    /// Loading, parsing or building failed; already reported.
    Failed,
}

impl LayerLoad {
    fn into_tree(self, layer: Layer, source_id: Option<&str>) -> MatchTree {
        match self {
            Self::Built(tree) => tree,
            Self::Unconfigured | Self::Failed => {
                MatchTree::empty(layer, source_id.unwrap_or_default())
            }
        }
    }
}

/// State shared between the engine handle and its bindings.
pub(crate) struct EngineShared {
    config: RwLock<StyleEngineConfig>,
    sources: RwLock<LayerSources>,
    generation: RwLock<Arc<Generation>>,
    revisions: RevisionCounter,
    services: EngineServices,
    bindings: Mutex<HashMap<UiItemPath, Arc<StyleBinding>>>,
    pub(crate) events: EventBus<EngineEvent>,
    /// Serializes reloads; readers never take it.
    reload_lock: Mutex<()>,
}

impl EngineShared {
    fn current(&self) -> Arc<Generation> {
        Arc::clone(&self.generation.read())
    }

    /// Resolve `url` against the source `sources` records for `layer`.
    pub(crate) fn resolve_url_in(
        &self,
        sources: &LayerSources,
        layer: Layer,
        url: &str,
    ) -> Option<String> {
        let base = sources.get(layer).unwrap_or_default();
        self.services.resolver.resolve(base, url)
    }

    fn load_layer(&self, layer: Layer, source_id: Option<&str>) -> LayerLoad {
        let Some(source_id) = source_id else {
            debug!("no {} stylesheet configured", layer.name());
            return LayerLoad::Unconfigured;
        };
        match self.services.loader.load(source_id) {
            Ok(text) => self.compile_layer(layer, source_id, &text),
            Err(load_error) => {
                let kind = if load_error.downcast_ref::<ResourceError>().is_some() {
                    ExceptionKind::StyleSheetNotFound
                } else {
                    ExceptionKind::LoadingStyleSheetFailed
                };
                error!("could not load {} style {source_id}: {load_error:#}", layer.name());
                self.events
                    .publish(&EngineEvent::exception(kind, format!("{load_error:#}")));
                LayerLoad::Failed
            }
        }
    }

    fn compile_layer(&self, layer: Layer, source_id: &str, text: &str) -> LayerLoad {
        let sheet = match parse_stylesheet(text, source_id) {
            Ok(sheet) => sheet.with_layer(layer),
            Err(parse_error) => {
                self.report_parse_failure(source_id, &parse_error);
                return LayerLoad::Failed;
            }
        };
        if let Some(registry) = &self.services.fonts {
            register_font_faces(
                &sheet,
                self.services.resolver.as_ref(),
                registry.as_ref(),
                &self.services.font_ids,
                &self.events,
            );
        }
        match build_match_tree(&sheet) {
            Ok(tree) => {
                debug!(
                    "built {} tree for {source_id}: {} rules, {} nodes",
                    layer.name(),
                    tree.rules().len(),
                    tree.node_count()
                );
                LayerLoad::Built(tree)
            }
            Err(build_error) => {
                self.report_parse_failure(source_id, &build_error);
                LayerLoad::Failed
            }
        }
    }

    fn report_parse_failure(&self, source_id: &str, failure: &dyn fmt::Display) {
        error!("parsing style {source_id} failed: {failure}");
        self.events.publish(&EngineEvent::exception(
            ExceptionKind::ParsingStyleSheetFailed,
            format!("{source_id}:{failure}"),
        ));
    }

    /// Swap in a generation built from `default` and `overlay`, unless the
    /// failure policy says to keep the current one.
    fn install(&self, default: LayerLoad, overlay: LayerLoad, sources: LayerSources) -> Revision {
        let configured = [&default, &overlay]
            .into_iter()
            .filter(|load| !matches!(load, LayerLoad::Unconfigured))
            .count();
        let failed = [&default, &overlay]
            .into_iter()
            .filter(|load| matches!(load, LayerLoad::Failed))
            .count();
        let policy = self.config.read().reload_failure;
        if configured > 0 && failed == configured && policy == ReloadFailurePolicy::KeepPrevious {
            let kept = self.current().revision;
            warn!("no stylesheet could be loaded, keeping revision {}", kept.get());
            return kept;
        }

        let revision = self.revisions.increment();
        let trees = LayerTrees::new(
            default.into_tree(Layer::Default, sources.get(Layer::Default)),
            overlay.into_tree(Layer::Override, sources.get(Layer::Override)),
        );
        let generation = Arc::new(Generation::new(revision, trees, sources));
        *self.generation.write() = Arc::clone(&generation);
        info!(
            "installed style revision {} ({failed} of {configured} layers failed)",
            revision.get()
        );

        // Bindings created after the swap already read from `generation`.
        let bindings: Vec<Arc<StyleBinding>> = self.bindings.lock().values().cloned().collect();
        for binding in &bindings {
            binding.load(&generation);
        }
        self.events.publish(&EngineEvent::StyleChanged { revision });
        revision
    }
}

/// Stylesheet engine for one host.
///
/// Holds the two layer sources, the current [`Generation`] and the bindings
/// handed out so far. A new engine serves an empty generation until the
/// first [`StyleEngine::reload`].
pub struct StyleEngine {
    shared: Arc<EngineShared>,
}

impl StyleEngine {
    pub fn new(config: StyleEngineConfig) -> Self {
        let services = EngineServices::from_config(&config);
        Self::with_services(config, services)
    }

    pub fn with_services(config: StyleEngineConfig, services: EngineServices) -> Self {
        let sources = sources_from(&config);
        Self {
            shared: Arc::new(EngineShared {
                config: RwLock::new(config),
                sources: RwLock::new(sources),
                generation: RwLock::new(Arc::new(Generation::default())),
                revisions: RevisionCounter::new(),
                services,
                bindings: Mutex::new(HashMap::new()),
                events: EventBus::new(),
                reload_lock: Mutex::new(()),
            }),
        }
    }

    /// Engine-level events: exceptions and generation changes.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.shared.events.subscribe()
    }

    pub fn config(&self) -> StyleEngineConfig {
        self.shared.config.read().clone()
    }

    pub(crate) fn events(&self) -> &EventBus<EngineEvent> {
        &self.shared.events
    }

    /// Source of the override layer.
    pub fn style_sheet_source(&self) -> Option<String> {
        self.shared.sources.read().override_source.clone()
    }

    /// Source of the default layer.
    pub fn default_style_sheet_source(&self) -> Option<String> {
        self.shared.sources.read().default_source.clone()
    }

    pub fn style_name(&self) -> Option<String> {
        self.shared.config.read().style_name.clone()
    }

    pub fn default_style_name(&self) -> Option<String> {
        self.shared.config.read().default_style_name.clone()
    }

    /// Set the override source directly. Reloads and returns `true` if it
    /// changed.
    pub fn set_style_sheet_source(&self, source: Option<String>) -> bool {
        self.set_source(Layer::Override, source)
    }

    /// Set the default source directly. Reloads and returns `true` if it
    /// changed.
    pub fn set_default_style_sheet_source(&self, source: Option<String>) -> bool {
        self.set_source(Layer::Default, source)
    }

    /// Change the style directory and recompute both layer sources from it.
    /// A layer whose name is not set keeps its current source.
    pub fn set_style_path(&self, path: impl Into<PathBuf>) -> bool {
        self.shared.config.write().style_path = Some(path.into());
        self.sync_layers(&[Layer::Default, Layer::Override])
    }

    /// Change the override file name. Only the override source is touched.
    pub fn set_style_name(&self, name: impl Into<String>) -> bool {
        self.shared.config.write().style_name = Some(name.into());
        self.sync_layers(&[Layer::Override])
    }

    /// Change the default file name. Only the default source is touched.
    pub fn set_default_style_name(&self, name: impl Into<String>) -> bool {
        self.shared.config.write().default_style_name = Some(name.into());
        self.sync_layers(&[Layer::Default])
    }

    /// Extensions, without the dot, that [`StyleEngine::available_styles`]
    /// lists.
    pub fn file_extensions(&self) -> Vec<String> {
        self.shared.config.read().file_extensions.clone()
    }

    pub fn set_file_extensions<I, S>(&self, extensions: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.shared.config.write().file_extensions = normalize_extensions(extensions);
    }

    /// File names in the style directory with one of the configured
    /// extensions, sorted. Empty when no directory is set or it cannot be
    /// read.
    pub fn available_styles(&self) -> Vec<String> {
        let config = self.shared.config.read().clone();
        let Some(directory) = config.style_path.as_ref() else {
            return Vec::new();
        };
        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(read_error) => {
                warn!("cannot list style directory {}: {read_error}", directory.display());
                return Vec::new();
            }
        };
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_file()))
            .map(|entry| entry.path())
            .filter(|file| config.has_style_extension(file))
            .filter_map(|file| Some(file.file_name()?.to_string_lossy().into_owned()))
            .collect();
        names.sort_unstable();
        names
    }

    fn set_source(&self, layer: Layer, source: Option<String>) -> bool {
        {
            let mut sources = self.shared.sources.write();
            let slot = sources.slot(layer);
            if *slot == source {
                return false;
            }
            *slot = source;
        }
        self.reload();
        true
    }

    /// Copy the config-derived source of each of `layers` into its slot. A
    /// layer the config yields no source for is left as it is, so a source
    /// set directly survives changes to the other layer's name.
    fn sync_layers(&self, layers: &[Layer]) -> bool {
        let computed = sources_from(&self.shared.config.read());
        let mut changed = false;
        {
            let mut sources = self.shared.sources.write();
            for &layer in layers {
                let Some(source) = computed.get(layer) else {
                    continue;
                };
                let slot = sources.slot(layer);
                if slot.as_deref() != Some(source) {
                    *slot = Some(source.to_owned());
                    changed = true;
                }
            }
        }
        if changed {
            self.reload();
        }
        changed
    }

    /// Load both configured sources and install the result.
    ///
    /// Returns the revision being served afterwards, which is the previous
    /// one when every configured layer failed under
    /// [`ReloadFailurePolicy::KeepPrevious`].
    pub fn reload(&self) -> Revision {
        let _reloading = self.shared.reload_lock.lock();
        let sources = self.shared.sources.read().clone();
        let default = self
            .shared
            .load_layer(Layer::Default, sources.get(Layer::Default));
        let overlay = self
            .shared
            .load_layer(Layer::Override, sources.get(Layer::Override));
        self.shared.install(default, overlay, sources)
    }

    /// Reload from in-memory texts instead of the loader. A layer given no
    /// text is treated as unconfigured. Texts keep the configured source of
    /// their layer as identifier, or `inline:default` / `inline:override`.
    pub fn reload_from_texts(
        &self,
        default_text: Option<&str>,
        override_text: Option<&str>,
    ) -> Revision {
        let _reloading = self.shared.reload_lock.lock();
        let configured = self.shared.sources.read().clone();
        let mut sources = LayerSources::default();
        let mut compile = |layer: Layer, text: Option<&str>| {
            let Some(text) = text else {
                return LayerLoad::Unconfigured;
            };
            let source_id = configured
                .get(layer)
                .map_or_else(|| format!("inline:{}", layer.name()), str::to_owned);
            let load = self.shared.compile_layer(layer, &source_id, text);
            *sources.slot(layer) = Some(source_id);
            load
        };
        let default = compile(Layer::Default, default_text);
        let overlay = compile(Layer::Override, override_text);
        self.shared.install(default, overlay, sources)
    }

    #[inline]
    pub fn revision(&self) -> Revision {
        self.shared.current().revision
    }

    /// The generation currently served. Holding it keeps it alive across
    /// later reloads.
    #[inline]
    pub fn generation(&self) -> Arc<Generation> {
        self.shared.current()
    }

    /// Resolved properties for `path` in the current generation.
    pub fn properties(&self, path: &UiItemPath) -> Arc<PropertyMap> {
        self.shared.current().resolve(path)
    }

    pub fn describe_match(&self, path: &UiItemPath) -> String {
        self.shared.current().describe(path)
    }

    /// The binding for `path`, created on first request.
    pub fn binding(&self, path: &UiItemPath) -> Arc<StyleBinding> {
        let mut bindings = self.shared.bindings.lock();
        if let Some(existing) = bindings.get(path) {
            return Arc::clone(existing);
        }
        let generation = self.shared.current();
        let binding = Arc::new(StyleBinding::new(
            path.clone(),
            Arc::downgrade(&self.shared),
            &generation,
        ));
        bindings.insert(path.clone(), Arc::clone(&binding));
        binding
    }

    pub fn binding_count(&self) -> usize {
        self.shared.bindings.lock().len()
    }

    /// Resolve a URL written in `layer`'s stylesheet of the current
    /// generation.
    pub fn resolve_url(&self, layer: Layer, url: &str) -> Option<String> {
        self.shared
            .resolve_url_in(&self.shared.current().sources, layer, url)
    }
}

impl fmt::Debug for StyleEngine {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("StyleEngine")
            .field("sources", &*self.shared.sources.read())
            .field("revision", &self.revision())
            .finish_non_exhaustive()
    }
}

impl Drop for StyleEngine {
    fn drop(&mut self) {
        let bindings = mem::take(&mut *self.shared.bindings.lock());
        debug!("style engine dropped, invalidating {} bindings", bindings.len());
        for binding in bindings.values() {
            binding.invalidate();
        }
    }
}

fn sources_from(config: &StyleEngineConfig) -> LayerSources {
    LayerSources {
        default_source: config.default_style_sheet_source(),
        override_source: config.style_sheet_source(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::BindingEvent;
    use anyhow::bail;
    use css_selectors::PathSegment;

    struct MemoryLoader {
        files: HashMap<String, String>,
    }

    impl ResourceLoader for MemoryLoader {
        fn load(&self, source_id: &str) -> anyhow::Result<String> {
            if source_id.ends_with(".locked") {
                bail!("permission denied");
            }
            self.files.get(source_id).cloned().ok_or_else(|| {
                ResourceError::NotFound {
                    source_id: source_id.to_owned(),
                }
                .into()
            })
        }
    }

    fn engine(files: &[(&str, &str)], config: StyleEngineConfig) -> StyleEngine {
        let loader = MemoryLoader {
            files: files
                .iter()
                .map(|(name, text)| ((*name).to_owned(), (*text).to_owned()))
                .collect(),
        };
        let services = EngineServices::from_config(&config).with_loader(Arc::new(loader));
        StyleEngine::with_services(config, services)
    }

    fn path(types: &[&str]) -> UiItemPath {
        types.iter().map(|type_name| PathSegment::new(type_name)).collect()
    }

    fn exception_kinds(events: &mut broadcast::Receiver<EngineEvent>) -> Vec<ExceptionKind> {
        let mut kinds = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let EngineEvent::Exception { kind, .. } = event {
                kinds.push(kind);
            }
        }
        kinds
    }

    #[test]
    fn new_engine_serves_the_empty_generation() {
        let engine = engine(&[], StyleEngineConfig::default());
        assert_eq!(engine.revision(), Revision::INITIAL);
        assert!(engine.properties(&path(&["Window"])).is_empty());
    }

    #[test]
    fn reload_installs_both_layers() {
        let engine = engine(
            &[("base.css", "Button { color: red; }"), ("app.css", "Button { size: 2; }")],
            StyleEngineConfig::default(),
        );
        engine.set_default_style_sheet_source(Some("base.css".to_owned()));
        engine.set_style_sheet_source(Some("app.css".to_owned()));
        let properties = engine.properties(&path(&["Button"]));
        assert!(properties.contains("color"));
        assert_eq!(properties.number("size").ok(), Some(2.0));
        assert_eq!(engine.revision().get(), 2);
    }

    #[test]
    fn unchanged_source_does_not_reload() {
        let engine = engine(&[("app.css", "A { b: c; }")], StyleEngineConfig::default());
        assert!(engine.set_style_sheet_source(Some("app.css".to_owned())));
        assert!(!engine.set_style_sheet_source(Some("app.css".to_owned())));
        assert_eq!(engine.revision().get(), 1);
    }

    #[test]
    fn failures_map_to_exception_kinds() {
        let engine = engine(&[("bad.css", "Button { color: ; }")], StyleEngineConfig::default());
        let mut events = engine.subscribe();
        engine.set_style_sheet_source(Some("missing.css".to_owned()));
        engine.set_style_sheet_source(Some("bad.css".to_owned()));
        engine.set_style_sheet_source(Some("app.locked".to_owned()));
        assert_eq!(
            exception_kinds(&mut events),
            vec![
                ExceptionKind::StyleSheetNotFound,
                ExceptionKind::ParsingStyleSheetFailed,
                ExceptionKind::LoadingStyleSheetFailed,
            ]
        );
        // Every attempt failed and the default policy keeps the empty start.
        assert_eq!(engine.revision(), Revision::INITIAL);
    }

    #[test]
    fn bindings_follow_reloads() {
        let engine = engine(&[], StyleEngineConfig::default());
        engine.reload_from_texts(None, Some("Label { text: \"one\"; }"));
        let binding = engine.binding(&path(&["Label"]));
        let mut changes = binding.subscribe();
        assert_eq!(binding.string("text").ok().as_deref(), Some("one"));

        let revision = engine.reload_from_texts(None, Some("Label { text: \"two\"; }"));
        assert_eq!(binding.string("text").ok().as_deref(), Some("two"));
        assert_eq!(
            changes.try_recv().ok(),
            Some(BindingEvent::PropertiesChanged { revision })
        );
        assert!(Arc::ptr_eq(&binding, &engine.binding(&path(&["Label"]))));
        assert_eq!(engine.binding_count(), 1);
    }

    struct JoiningResolver;

    impl ResourceResolver for JoiningResolver {
        fn resolve(&self, base_source: &str, url: &str) -> Option<String> {
            Some(format!("{base_source}|{url}"))
        }
    }

    #[test]
    fn binding_urls_resolve_against_their_snapshot() {
        let loader = MemoryLoader {
            files: HashMap::from([(
                "one/app.css".to_owned(),
                "Button { icon: url(icon.png); }".to_owned(),
            )]),
        };
        let config = StyleEngineConfig::default();
        let services = EngineServices::from_config(&config)
            .with_loader(Arc::new(loader))
            .with_resolver(Arc::new(JoiningResolver));
        let engine = StyleEngine::with_services(config, services);
        engine.set_style_sheet_source(Some("one/app.css".to_owned()));
        let binding = engine.binding(&path(&["Button"]));

        // A generation from other sources is live but bindings are not yet
        // refreshed, as during an install.
        let sources = LayerSources {
            default_source: None,
            override_source: Some("two/app.css".to_owned()),
        };
        let revision = engine.shared.revisions.increment();
        *engine.shared.generation.write() =
            Arc::new(Generation::new(revision, LayerTrees::default(), sources));

        assert_eq!(binding.url("icon").ok().as_deref(), Some("one/app.css|icon.png"));
        assert_eq!(
            engine.resolve_url(Layer::Override, "icon.png").as_deref(),
            Some("two/app.css|icon.png")
        );
    }

    #[test]
    fn style_name_changes_keep_a_directly_set_default() {
        let engine = engine(
            &[("base.css", "Label { size: 10; }"), ("/styles/app.css", "Label { color: red; }")],
            StyleEngineConfig::default(),
        );
        engine.set_default_style_sheet_source(Some("base.css".to_owned()));
        assert!(!engine.set_style_path("/styles"));
        assert!(engine.set_style_name("app.css"));
        assert_eq!(engine.default_style_sheet_source().as_deref(), Some("base.css"));
        let properties = engine.properties(&path(&["Label"]));
        assert_eq!(properties.number("size").ok(), Some(10.0));
        assert!(properties.contains("color"));
    }

    #[test]
    fn dropping_the_engine_invalidates_bindings() {
        let engine = engine(&[], StyleEngineConfig::default());
        engine.reload_from_texts(Some("Label { text: \"x\"; }"), None);
        let binding = engine.binding(&path(&["Label"]));
        let mut changes = binding.subscribe();
        drop(engine);
        assert_eq!(changes.try_recv().ok(), Some(BindingEvent::Invalidated));
        assert!(!binding.is_valid());
        assert!(binding.values("text").is_err_and(|error| error.is_missing()));
    }
}
