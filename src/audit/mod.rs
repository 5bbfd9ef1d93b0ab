//! Offline consistency check between the phrasing rules and a flat dictionary.
//!
//! A flat-dictionary entry collides with phrasing when its stroke decomposes
//! to a `(starter, ender)` cell that the rule tables can also synthesize: the
//! two sources then both claim strokes in that cell.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::dictionary::{FlatDictionary, is_multi_stroke};
use crate::grammar;
use crate::tables::RuleTables;

mod exclusions;
pub use exclusions::{ExclusionError, ExclusionSet};

/// Flat-dictionary entries grouped by the `(starter, ender)` cell their
/// stroke falls in.
pub type Cells = HashMap<(String, String), BTreeMap<String, String>>;

/// All flat-dictionary entries that share one reachable cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
    pub starter: String,
    pub ender: String,
    pub entries: BTreeMap<String, String>,
}

impl Collision {
    /// The cell written the way strokes are, `starter-ender`.
    pub fn cell(&self) -> String {
        format!("{}{}{}", self.starter, grammar::SEPARATOR, self.ender)
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollisionReport {
    pub collisions: Vec<Collision>,
    /// Colliding entries attributed to each starter.
    pub starter_counts: BTreeMap<String, usize>,
    /// Colliding entries attributed to each ender.
    pub ender_counts: BTreeMap<String, usize>,
    pub total: usize,
}

impl CollisionReport {
    pub fn is_clean(&self) -> bool {
        self.collisions.is_empty()
    }

    pub fn collision(&self, starter: &str, ender: &str) -> Option<&Collision> {
        self.collisions
            .iter()
            .find(|c| c.starter == starter && c.ender == ender)
    }
}

/// Groups the rule-governed part of `dictionary` by cell.
///
/// Excluded strokes, strokes the rules reserve for the main dictionary,
/// multi-stroke outlines and strokes outside the grammar are left out.
pub fn group_by_cell(
    dictionary: &FlatDictionary,
    tables: &RuleTables,
    exclusions: &ExclusionSet,
) -> Cells {
    let mut cells = Cells::new();

    for (stroke, output) in dictionary.iter() {
        if exclusions.contains(stroke) || tables.non_phrase_strokes.contains(stroke) {
            tracing::trace!(stroke, "skipping audited stroke");
            continue;
        }
        if is_multi_stroke(stroke) {
            tracing::trace!(stroke, "skipping multi-stroke outline");
            continue;
        }
        let Ok(parts) = grammar::decompose(stroke) else {
            tracing::trace!(stroke, "skipping stroke outside the grammar");
            continue;
        };

        cells
            .entry((parts.starter, parts.ender))
            .or_default()
            .insert(stroke.to_string(), output.to_string());
    }

    cells
}

/// Reports every flat-dictionary entry sitting in a cell the rule tables
/// can reach. Neither input is modified.
pub fn audit(
    dictionary: &FlatDictionary,
    tables: &RuleTables,
    exclusions: &ExclusionSet,
) -> CollisionReport {
    let mut cells = group_by_cell(dictionary, tables, exclusions);
    let mut report = CollisionReport::default();

    for (starter, ender) in tables.reachable_pairs() {
        let Some(entries) = cells.remove(&(starter.to_string(), ender.to_string())) else {
            continue;
        };
        let count = entries.len();
        tracing::debug!(starter, ender, count, "collision");

        *report.starter_counts.entry(starter.to_string()).or_default() += count;
        *report.ender_counts.entry(ender.to_string()).or_default() += count;
        report.total += count;
        report.collisions.push(Collision {
            starter: starter.to_string(),
            ender: ender.to_string(),
            entries,
        });
    }

    tracing::info!(
        cells = report.collisions.len(),
        total = report.total,
        "collision audit finished"
    );
    report
}
