//! Cascade winners and the per-path property map.

use crate::value::Value;
use css_selectors::Specificity;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Precedence tier of a stylesheet. Override always beats Default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    #[default]
    Default = 0,
    Override = 1,
}

impl Layer {
    pub const ALL: [Self; 2] = [Self::Default, Self::Override];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Override => "override",
        }
    }
}

/// Where a winning declaration came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Provenance {
    pub layer: Layer,
    /// Rule position within its layer's source text.
    pub order: u32,
    /// Highest specificity among the rule's selectors that matched.
    pub specificity: Specificity,
}

/// The cascade-winning declaration for one property name at one path.
#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    pub values: Vec<Value>,
    pub provenance: Provenance,
}

impl Property {
    #[inline]
    pub const fn new(values: Vec<Value>, provenance: Provenance) -> Self {
        Self { values, provenance }
    }
}

/// Property name to cascade winner.
///
/// Resolved maps are handed out behind `Arc` and may be shared between a
/// path and its ancestor; only the code that built a map mutates it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyMap {
    entries: HashMap<String, Property>,
}

impl PropertyMap {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.entries.get(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Insert or replace the entry for `name`.
    #[inline]
    pub fn insert(&mut self, name: String, property: Property) -> Option<Property> {
        self.entries.insert(name, property)
    }

    /// Replace every same-named entry with `other`'s.
    pub fn overlay(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    /// Copy in the entries of `ancestor` that this map does not set itself.
    pub fn inherit_from(&mut self, ancestor: &Self) {
        for (name, property) in &ancestor.entries {
            if let Entry::Vacant(slot) = self.entries.entry(name.clone()) {
                slot.insert(property.clone());
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.entries
            .iter()
            .map(|(name, property)| (name.as_str(), property))
    }

    /// Property names in sorted order, for stable diagnostics.
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl FromIterator<(String, Property)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (String, Property)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
