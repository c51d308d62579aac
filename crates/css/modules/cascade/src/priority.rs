//! Cascade ordering between two candidate declarations.

use core::cmp::Ordering;
use css_values::{Layer, Provenance};

/// Return ordering where the greater side wins the cascade.
///
/// Layer first (Override beats Default whatever the specificity), then
/// specificity, then source order (later wins).
pub fn compare_priority(left: &Provenance, right: &Provenance) -> Ordering {
    if left.layer != right.layer {
        return layer_rank(left.layer).cmp(&layer_rank(right.layer));
    }
    if left.specificity != right.specificity {
        return left.specificity.cmp(&right.specificity);
    }
    left.order.cmp(&right.order)
}

/// Whether `candidate` replaces `incumbent`. Ties go to the candidate, which
/// is always the later declaration during a fold.
#[inline]
pub fn wins_over(candidate: &Provenance, incumbent: &Provenance) -> bool {
    compare_priority(candidate, incumbent) != Ordering::Less
}

const fn layer_rank(layer: Layer) -> u8 {
    match layer {
        Layer::Default => 0,
        Layer::Override => 1,
    }
}
