//! Engine configuration.
//!
//! Sources are computed from a style directory plus a file name per layer.
//! Configuration can be loaded from environment variables or constructed
//! programmatically.

use std::env;
use std::path::{Path, PathBuf};

/// Extension listed by [`crate::StyleEngine::available_styles`] when none
/// is configured.
pub const DEFAULT_FILE_EXTENSION: &str = "css";

/// What to install when a reload fails for every configured layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReloadFailurePolicy {
    /// Keep serving the previous generation.
    #[default]
    KeepPrevious,
    /// Install an empty generation.
    ResetToEmpty,
}

impl ReloadFailurePolicy {
    /// `keep` or `reset`, case-insensitive.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "keep" => Some(Self::KeepPrevious),
            "reset" => Some(Self::ResetToEmpty),
            _ => None,
        }
    }
}

/// Runtime configuration for a [`crate::StyleEngine`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleEngineConfig {
    /// Directory holding the style files.
    pub style_path: Option<PathBuf>,
    /// File name of the override stylesheet inside `style_path`.
    pub style_name: Option<String>,
    /// File name of the default stylesheet inside `style_path`.
    pub default_style_name: Option<String>,
    pub reload_failure: ReloadFailurePolicy,
    /// Extra directories searched when resolving relative resource URLs.
    pub search_paths: Vec<PathBuf>,
    /// Lowercase extensions, without the dot, of the files in `style_path`
    /// that count as stylesheets.
    pub file_extensions: Vec<String>,
}

impl Default for StyleEngineConfig {
    fn default() -> Self {
        Self {
            style_path: None,
            style_name: None,
            default_style_name: None,
            reload_failure: ReloadFailurePolicy::default(),
            search_paths: Vec::new(),
            file_extensions: vec![DEFAULT_FILE_EXTENSION.to_owned()],
        }
    }
}

impl StyleEngineConfig {
    #[inline]
    #[must_use]
    pub fn new(style_path: impl Into<PathBuf>) -> Self {
        Self {
            style_path: Some(style_path.into()),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `STYLESHEETS_STYLE_PATH`: style directory
    /// - `STYLESHEETS_STYLE_NAME`: override stylesheet file name
    /// - `STYLESHEETS_DEFAULT_STYLE_NAME`: default stylesheet file name
    /// - `STYLESHEETS_RELOAD_FAILURE`: `keep` (default) or `reset`
    /// - `STYLESHEETS_SEARCH_PATHS`: resource search directories, separated
    ///   like `PATH`
    /// - `STYLESHEETS_FILE_EXTENSIONS`: comma separated stylesheet extensions,
    ///   `css` by default
    #[must_use]
    pub fn from_env() -> Self {
        let non_empty = |name: &str| env::var(name).ok().filter(|value| !value.trim().is_empty());
        let reload_failure = non_empty("STYLESHEETS_RELOAD_FAILURE")
            .and_then(|value| ReloadFailurePolicy::parse(&value))
            .unwrap_or_default();
        let search_paths = env::var_os("STYLESHEETS_SEARCH_PATHS")
            .map(|paths| env::split_paths(&paths).collect())
            .unwrap_or_default();
        let file_extensions = non_empty("STYLESHEETS_FILE_EXTENSIONS")
            .map(|value| normalize_extensions(value.split(',')))
            .filter(|extensions| !extensions.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_FILE_EXTENSION.to_owned()]);
        Self {
            style_path: non_empty("STYLESHEETS_STYLE_PATH").map(PathBuf::from),
            style_name: non_empty("STYLESHEETS_STYLE_NAME"),
            default_style_name: non_empty("STYLESHEETS_DEFAULT_STYLE_NAME"),
            reload_failure,
            search_paths,
            file_extensions,
        }
    }

    #[must_use]
    pub fn with_style_name(mut self, name: impl Into<String>) -> Self {
        self.style_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_default_style_name(mut self, name: impl Into<String>) -> Self {
        self.default_style_name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn with_reload_failure(mut self, policy: ReloadFailurePolicy) -> Self {
        self.reload_failure = policy;
        self
    }

    #[must_use]
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// Replace the stylesheet extensions. `*.css`, `.css` and `css` are the
    /// same extension.
    #[must_use]
    pub fn with_file_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.file_extensions = normalize_extensions(extensions);
        self
    }

    /// True when `file` ends in one of the stylesheet extensions, ignoring
    /// case.
    pub fn has_style_extension(&self, file: &Path) -> bool {
        file.extension()
            .map(|extension| extension.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|extension| self.file_extensions.contains(&extension))
    }

    /// `style_path/style_name`, if both are set.
    pub fn style_sheet_source(&self) -> Option<String> {
        self.source_for(self.style_name.as_deref())
    }

    /// `style_path/default_style_name`, if both are set.
    pub fn default_style_sheet_source(&self) -> Option<String> {
        self.source_for(self.default_style_name.as_deref())
    }

    fn source_for(&self, name: Option<&str>) -> Option<String> {
        let directory = self.style_path.as_ref()?;
        let name = name.filter(|name| !name.is_empty())?;
        Some(directory.join(name).to_string_lossy().into_owned())
    }
}

/// Strip glob and dot prefixes, lowercase, and drop blanks and repeats.
pub(crate) fn normalize_extensions<I, S>(extensions: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for extension in extensions {
        let trimmed = extension.as_ref().trim();
        let unglobbed = trimmed.strip_prefix('*').unwrap_or(trimmed);
        let bare = unglobbed.strip_prefix('.').unwrap_or(unglobbed).to_ascii_lowercase();
        if !bare.is_empty() && !normalized.contains(&bare) {
            normalized.push(bare);
        }
    }
    normalized
}
