//! Stylesheet engine for UI item hierarchies.
//!
//! A [`StyleEngine`] loads a default and an override stylesheet, compiles
//! them into match trees and serves resolved property maps per
//! [`UiItemPath`]. Hosts reach an engine through an [`EngineHost`] and track
//! their nodes in a [`StyleRegistry`].

mod binding;
mod cache;
mod config;
mod engine;
mod events;
mod fonts;
mod generation;
mod host;
mod registry;
mod revision;
mod services;

pub use binding::{BindingValue, StyleBinding};
pub use cache::PathCache;
pub use config::{ReloadFailurePolicy, StyleEngineConfig};
pub use engine::{EngineServices, StyleEngine};
pub use events::{BindingEvent, EngineEvent, EventBus, ExceptionKind};
pub use fonts::FontIdCache;
pub use generation::{Generation, LayerSources};
pub use host::{AttachError, EngineHost};
pub use registry::{NodeStyle, StyleRegistry};
pub use revision::{Revision, RevisionCounter};
pub use services::{
    FileResourceLoader, FontId, FontRegistry, PathProvider, RelativeResolver, ResourceError,
    ResourceLoader, ResourceResolver,
};

pub use css_selectors::{PathSegment, UiItemPath};
pub use css_values::{Font, Layer, LookupError, PropertyMap, Rgba, Value};
