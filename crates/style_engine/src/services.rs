//! Collaborators the engine calls but does not implement itself.

use anyhow::{Context as _, Result};
use core::fmt;
use css_selectors::UiItemPath;
use std::fs;
use std::path::{self, Path, PathBuf};
use url::Url;

/// Stylesheet text could not be obtained.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceError {
    NotFound { source_id: String },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { source_id } => write!(formatter, "style '{source_id}' not found"),
        }
    }
}

impl std::error::Error for ResourceError {}

/// Supplies raw stylesheet text for a source identifier.
pub trait ResourceLoader: Send + Sync {
    /// # Errors
    /// [`ResourceError::NotFound`] for missing sources, any other error for
    /// sources that exist but cannot be read.
    fn load(&self, source_id: &str) -> Result<String>;
}

/// Reads source identifiers as file system paths.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileResourceLoader;

impl ResourceLoader for FileResourceLoader {
    fn load(&self, source_id: &str) -> Result<String> {
        let path = Path::new(source_id);
        if !path.is_file() {
            return Err(ResourceError::NotFound {
                source_id: source_id.to_owned(),
            }
            .into());
        }
        fs::read_to_string(path).with_context(|| format!("reading stylesheet '{source_id}'"))
    }
}

/// Supplies the materialized ancestor chain of a host node.
pub trait PathProvider<N>: Send + Sync {
    /// `None` if the node is not (or no longer) part of the hierarchy.
    fn path_of(&self, node: &N) -> Option<UiItemPath>;
}

/// Identifier handed out by a [`FontRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FontId(pub u32);

/// Registers font files declared through `@font-face`.
pub trait FontRegistry: Send + Sync {
    /// # Errors
    /// The registry could not load the font at `locator`.
    fn register(&self, locator: &str) -> Result<FontId>;
}

/// Turns a URL written in a stylesheet into a locator.
pub trait ResourceResolver: Send + Sync {
    /// `None` if no candidate location exists.
    fn resolve(&self, base_source: &str, url: &str) -> Option<String>;
}

/// Resolves URLs with the `url` crate. Relative references are joined onto
/// the referring stylesheet, then onto each search path in order, and the
/// first `file` URL naming an existing file wins. URLs with any other scheme
/// are returned unchanged.
#[derive(Clone, Debug, Default)]
pub struct RelativeResolver {
    search_paths: Vec<PathBuf>,
}

impl RelativeResolver {
    pub const fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// URLs relative references are joined onto, most specific first.
    fn bases(&self, base_source: &str) -> Vec<Url> {
        let mut bases: Vec<Url> = source_url(base_source).into_iter().collect();
        bases.extend(self.search_paths.iter().filter_map(|directory| {
            let absolute = path::absolute(directory).ok()?;
            Url::from_directory_path(absolute).ok()
        }));
        bases
    }
}

impl ResourceResolver for RelativeResolver {
    fn resolve(&self, base_source: &str, url: &str) -> Option<String> {
        match Url::parse(url) {
            Ok(parsed) if parsed.scheme() == "file" => return existing_file(&parsed),
            // A single letter is a drive prefix, not a scheme.
            Ok(parsed) if parsed.scheme().len() > 1 => return Some(parsed.into()),
            _ => {}
        }
        if url.starts_with('/') {
            let root = Url::parse("file:///").ok()?;
            return existing_file(&root.join(url).ok()?);
        }
        for base in self.bases(base_source) {
            let Ok(joined) = base.join(url) else {
                continue;
            };
            if joined.scheme() != "file" {
                return Some(joined.into());
            }
            if let Some(found) = existing_file(&joined) {
                return Some(found);
            }
        }
        None
    }
}

/// `base_source` as a URL: parsed as is when it has a scheme, otherwise
/// taken as a file path.
fn source_url(base_source: &str) -> Option<Url> {
    if base_source.is_empty() {
        return None;
    }
    match Url::parse(base_source) {
        Ok(parsed) if parsed.scheme().len() > 1 => Some(parsed),
        _ => Url::from_file_path(path::absolute(base_source).ok()?).ok(),
    }
}

/// Local path of a `file` URL, if that file exists.
fn existing_file(url: &Url) -> Option<String> {
    let local = url.to_file_path().ok()?;
    local.exists().then(|| local.to_string_lossy().into_owned())
}
