//! Property model: literal values, cascade provenance, and the resolved
//! per-path property map with typed accessors.

mod accessors;
mod property;
mod value;

pub use accessors::{Font, LookupError, UrlRef, ValueKind};
pub use css_color::Rgba;
pub use property::{Layer, Property, PropertyMap, Provenance};
pub use value::{Value, write_list};
