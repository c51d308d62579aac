//! Human readable cascade report for tooling.

use crate::matcher::{LayerTrees, MatchedDeclaration, match_path};
use crate::priority::compare_priority;
use core::fmt;
use css_selectors::UiItemPath;
use css_values::{Layer, write_list};
use std::collections::BTreeMap;

/// For every property resolved at `path`, the winning declaration followed
/// by each losing candidate, strongest first.
///
/// ```text
/// Window/Button.primary
///   color: blue
///     <- override Button.primary (1,1) #0
///     x  default Button (0,1) #0: red
/// ```
pub fn describe_match(path: &UiItemPath, trees: &LayerTrees) -> String {
    let mut candidates: BTreeMap<&str, Vec<MatchedDeclaration<'_>>> = BTreeMap::new();
    for layer in Layer::ALL {
        for matched in match_path(path, trees.get(layer)) {
            candidates
                .entry(matched.declaration.name.as_str())
                .or_default()
                .push(matched);
        }
    }
    for entries in candidates.values_mut() {
        entries.sort_by(|left, right| compare_priority(&right.provenance, &left.provenance));
    }
    MatchReport { path, candidates }.to_string()
}

struct MatchReport<'report, 'tree> {
    path: &'report UiItemPath,
    candidates: BTreeMap<&'tree str, Vec<MatchedDeclaration<'tree>>>,
}

impl fmt::Display for MatchReport<'_, '_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(formatter, "{}", self.path)?;
        if self.candidates.is_empty() {
            return writeln!(formatter, "  (no matching rules)");
        }
        for (name, entries) in &self.candidates {
            let Some((winner, losers)) = entries.split_first() else {
                continue;
            };
            write!(formatter, "  {name}: ")?;
            write_list(formatter, &winner.declaration.values)?;
            formatter.write_str("\n    <- ")?;
            write_origin(formatter, winner)?;
            formatter.write_str("\n")?;
            for loser in losers {
                formatter.write_str("    x  ")?;
                write_origin(formatter, loser)?;
                formatter.write_str(": ")?;
                write_list(formatter, &loser.declaration.values)?;
                formatter.write_str("\n")?;
            }
        }
        Ok(())
    }
}

fn write_origin(formatter: &mut fmt::Formatter<'_>, matched: &MatchedDeclaration<'_>) -> fmt::Result {
    let provenance = matched.provenance;
    write!(
        formatter,
        "{} {} ({},{}) #{}",
        provenance.layer.name(),
        matched.selector,
        provenance.specificity.classes(),
        provenance.specificity.types(),
        provenance.order
    )
}
