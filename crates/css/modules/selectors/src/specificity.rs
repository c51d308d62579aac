//! Selector specificity calculation.

use crate::{Selector, SelectorSegment};

/// Specificity pair `(classes, types)`.
///
/// Field order gives the derived `Ord` its lexicographic meaning: class
/// qualifier count outranks type name presence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Specificity(pub u16, pub u16);

impl Specificity {
    #[inline]
    pub const fn classes(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn types(self) -> u16 {
        self.1
    }
}

/// Specificity of a single compound selector.
pub fn specificity_of_segment(segment: &SelectorSegment) -> Specificity {
    let classes = u16::try_from(segment.class_names.len()).unwrap_or(u16::MAX);
    let types = u16::from(segment.type_name.is_some());
    Specificity(classes, types)
}

/// Specificity of a complex selector (sum of its compounds).
pub fn specificity_of_selector(selector: &Selector) -> Specificity {
    selector
        .segments
        .iter()
        .map(specificity_of_segment)
        .fold(Specificity::default(), |total, add| {
            Specificity(total.0.saturating_add(add.0), total.1.saturating_add(add.1))
        })
}
