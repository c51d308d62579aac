#![cfg(test)]

use std::error::Error;
use std::fs;
use std::sync::Arc;
use style_engine::{
    EngineEvent, ExceptionKind, PathSegment, ReloadFailurePolicy, Revision, StyleEngine,
    StyleEngineConfig, UiItemPath,
};
use tokio::sync::broadcast::Receiver;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn path(segments: &[(&str, &str)]) -> UiItemPath {
    segments
        .iter()
        .map(|(type_name, style_name)| PathSegment::with_style_name(type_name, style_name))
        .collect()
}

fn exceptions(events: &mut Receiver<EngineEvent>) -> Vec<ExceptionKind> {
    let mut kinds = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let EngineEvent::Exception { kind, .. } = event {
            kinds.push(kind);
        }
    }
    kinds
}

#[test]
fn reload_picks_up_edited_files() -> Result<(), Box<dyn Error>> {
    init_logging();
    let directory = tempfile::tempdir()?;
    fs::write(directory.path().join("app.css"), "Window Label { text: \"before\"; }")?;
    let engine = StyleEngine::new(StyleEngineConfig::new(directory.path()).with_style_name("app.css"));
    let label = path(&[("Window", ""), ("Label", "")]);

    let first = engine.reload();
    let before = engine.generation();
    assert_eq!(engine.properties(&label).string("text")?, "before");
    assert!(before.cache.contains(&label));

    fs::write(directory.path().join("app.css"), "Window Label { text: \"after\"; }")?;
    let second = engine.reload();
    assert!(second.is_newer_than(first));
    assert_eq!(engine.properties(&label).string("text")?, "after");
    // The old generation is untouched and the new one starts cold.
    assert_eq!(before.resolve(&label).string("text")?, "before");
    assert!(!Arc::ptr_eq(&before, &engine.generation()));
    Ok(())
}

#[test]
fn style_changed_follows_each_install() -> Result<(), Box<dyn Error>> {
    init_logging();
    let engine = StyleEngine::new(StyleEngineConfig::default());
    let mut events = engine.subscribe();
    let revision = engine.reload_from_texts(Some("A { b: 1; }"), None);
    assert_eq!(events.try_recv()?, EngineEvent::StyleChanged { revision });
    Ok(())
}

#[test]
fn total_failure_keeps_previous_generation_by_default() -> Result<(), Box<dyn Error>> {
    init_logging();
    let directory = tempfile::tempdir()?;
    let sheet = directory.path().join("app.css");
    fs::write(&sheet, "Button { color: red; }")?;
    let engine = StyleEngine::new(StyleEngineConfig::new(directory.path()).with_style_name("app.css"));
    let button = path(&[("Button", "")]);
    let loaded = engine.reload();

    fs::write(&sheet, "Button { color: red;")?;
    assert_eq!(engine.reload(), loaded);
    assert_eq!(engine.properties(&button).string("color")?, "red");
    Ok(())
}

#[test]
fn total_failure_can_reset_to_empty() -> Result<(), Box<dyn Error>> {
    init_logging();
    let directory = tempfile::tempdir()?;
    let sheet = directory.path().join("app.css");
    fs::write(&sheet, "Button { color: red; }")?;
    let config = StyleEngineConfig::new(directory.path())
        .with_style_name("app.css")
        .with_reload_failure(ReloadFailurePolicy::ResetToEmpty);
    let engine = StyleEngine::new(config);
    let button = path(&[("Button", "")]);
    let loaded = engine.reload();

    fs::remove_file(&sheet)?;
    let reset = engine.reload();
    assert!(reset.is_newer_than(loaded));
    assert!(engine.properties(&button).is_empty());
    Ok(())
}

#[test]
fn partial_failure_installs_the_healthy_layer() -> Result<(), Box<dyn Error>> {
    init_logging();
    let directory = tempfile::tempdir()?;
    fs::write(directory.path().join("base.css"), "Label { size: 10; }")?;
    fs::write(directory.path().join("app.css"), "Label { size: ; }")?;
    let engine = StyleEngine::new(
        StyleEngineConfig::new(directory.path())
            .with_default_style_name("base.css")
            .with_style_name("app.css"),
    );
    let mut events = engine.subscribe();
    let revision = engine.reload();
    assert_ne!(revision, Revision::INITIAL);
    assert_eq!(engine.properties(&path(&[("Label", "")])).number("size")?, 10.0);
    assert_eq!(exceptions(&mut events), vec![ExceptionKind::ParsingStyleSheetFailed]);
    Ok(())
}

#[test]
fn missing_sheet_is_reported() -> Result<(), Box<dyn Error>> {
    init_logging();
    let directory = tempfile::tempdir()?;
    let engine = StyleEngine::new(StyleEngineConfig::new(directory.path()));
    let mut events = engine.subscribe();
    assert!(engine.set_style_name("nowhere.css"));
    assert_eq!(exceptions(&mut events), vec![ExceptionKind::StyleSheetNotFound]);
    assert_eq!(engine.revision(), Revision::INITIAL);
    Ok(())
}

#[test]
fn switching_style_name_swaps_the_override_layer() -> Result<(), Box<dyn Error>> {
    init_logging();
    let directory = tempfile::tempdir()?;
    fs::write(directory.path().join("light.css"), "Window { background: white; }")?;
    fs::write(directory.path().join("dark.css"), "Window { background: black; }")?;
    let engine = StyleEngine::new(StyleEngineConfig::new(directory.path()));
    let window = path(&[("Window", "")]);

    assert!(engine.set_style_name("light.css"));
    assert_eq!(engine.properties(&window).string("background")?, "white");
    assert!(engine.set_style_name("dark.css"));
    assert_eq!(engine.properties(&window).string("background")?, "black");
    assert!(!engine.set_style_name("dark.css"));
    assert_eq!(engine.style_name().as_deref(), Some("dark.css"));
    assert_eq!(
        engine.style_sheet_source(),
        Some(directory.path().join("dark.css").to_string_lossy().into_owned())
    );
    Ok(())
}

#[test]
fn explicit_default_source_survives_style_name_changes() -> Result<(), Box<dyn Error>> {
    init_logging();
    let shared = tempfile::tempdir()?;
    let styles = tempfile::tempdir()?;
    fs::write(shared.path().join("base.css"), "Label { size: 10; }")?;
    fs::write(styles.path().join("app.css"), "Label { color: red; }")?;
    let base = shared.path().join("base.css").to_string_lossy().into_owned();

    let engine = StyleEngine::new(StyleEngineConfig::default());
    assert!(engine.set_default_style_sheet_source(Some(base.clone())));
    engine.set_style_path(styles.path());
    assert!(engine.set_style_name("app.css"));

    assert_eq!(engine.default_style_sheet_source(), Some(base));
    let label = engine.properties(&path(&[("Label", "")]));
    assert_eq!(label.number("size")?, 10.0);
    assert_eq!(label.string("color")?, "red");
    Ok(())
}

#[test]
fn default_name_change_leaves_the_override_alone() -> Result<(), Box<dyn Error>> {
    init_logging();
    let directory = tempfile::tempdir()?;
    fs::write(directory.path().join("base.css"), "Label { size: 10; }")?;
    fs::write(directory.path().join("custom.css"), "Label { color: blue; }")?;
    let custom = directory.path().join("custom.css").to_string_lossy().into_owned();

    let engine = StyleEngine::new(StyleEngineConfig::new(directory.path()));
    assert!(engine.set_style_sheet_source(Some(custom.clone())));
    assert!(engine.set_default_style_name("base.css"));

    assert_eq!(engine.style_sheet_source(), Some(custom));
    let label = engine.properties(&path(&[("Label", "")]));
    assert_eq!(label.number("size")?, 10.0);
    assert_eq!(label.string("color")?, "blue");
    Ok(())
}

#[test]
fn available_styles_lists_matching_files() -> Result<(), Box<dyn Error>> {
    init_logging();
    let directory = tempfile::tempdir()?;
    for name in ["light.css", "Dark.CSS", "notes.txt", "retro.qss"] {
        fs::write(directory.path().join(name), "")?;
    }
    fs::create_dir(directory.path().join("nested.css"))?;

    let engine = StyleEngine::new(StyleEngineConfig::new(directory.path()));
    assert_eq!(engine.file_extensions(), vec!["css".to_owned()]);
    assert_eq!(engine.available_styles(), vec!["Dark.CSS".to_owned(), "light.css".to_owned()]);

    engine.set_file_extensions(["*.qss", ".css"]);
    assert_eq!(engine.file_extensions(), vec!["qss".to_owned(), "css".to_owned()]);
    assert_eq!(
        engine.available_styles(),
        vec!["Dark.CSS".to_owned(), "light.css".to_owned(), "retro.qss".to_owned()]
    );

    let unconfigured = StyleEngine::new(StyleEngineConfig::default());
    assert!(unconfigured.available_styles().is_empty());
    engine.set_style_path(directory.path().join("missing"));
    assert!(engine.available_styles().is_empty());
    Ok(())
}

#[test]
fn worked_examples() -> Result<(), Box<dyn Error>> {
    init_logging();
    let engine = StyleEngine::new(StyleEngineConfig::default());

    engine.reload_from_texts(
        Some("Button { color: red; } Button.primary { color: blue; }"),
        None,
    );
    assert_eq!(engine.properties(&path(&[("Button", "primary")])).string("color")?, "blue");
    assert_eq!(engine.properties(&path(&[("Button", "")])).string("color")?, "red");

    engine.reload_from_texts(Some("Label { size: 10; }"), Some("Label { size: 12; }"));
    assert_eq!(engine.properties(&path(&[("Label", "")])).number("size")?, 12.0);

    let mut events = engine.subscribe();
    engine.reload_from_texts(Some("Button { color: ; }"), None);
    assert_eq!(exceptions(&mut events), vec![ExceptionKind::ParsingStyleSheetFailed]);
    Ok(())
}

#[test]
fn describe_names_the_winning_rule() {
    init_logging();
    let engine = StyleEngine::new(StyleEngineConfig::default());
    engine.reload_from_texts(
        Some("Button { color: red; }"),
        Some("Window > Button { color: green; }"),
    );
    let report = engine.describe_match(&path(&[("Window", ""), ("Button", "")]));
    assert!(report.starts_with("Window/Button"));
    assert!(report.contains("color: green"));
    assert!(report.contains("override Window > Button"));
}
