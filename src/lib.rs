//! Steno phrasing: one chord produces a whole subject + modal + verb phrase.
//!
//! A stroke is split by [`grammar::decompose`] into six fields. The starter
//! picks the subject, the vowels, star and `F` pick a modal and a decorator,
//! and the ender picks the verb and its tense. [`PhraseComposer`] runs the
//! lookups over a [`RuleTables`] set and joins the pieces:
//!
//! ```
//! use phrasing::PhraseComposer;
//!
//! let composer = PhraseComposer::default();
//! assert_eq!(composer.compose("SWR-S").unwrap(), "I see");
//! assert_eq!(composer.compose("KWHRAO*BD").unwrap(), "he wouldn't be");
//! ```
//!
//! [`audit::audit`] checks a flat dictionary for entries that sit in stroke
//! cells the phrasing rules also claim.

use std::sync::LazyLock;

pub mod audit;
pub mod composer;
pub mod dictionary;
pub mod grammar;
pub mod reverse;
pub mod tables;

pub use audit::{Collision, CollisionReport, ExclusionSet, audit};
pub use composer::{Composition, LONGEST_KEY, Miss, PhraseComposer, UnknownOutline};
pub use dictionary::FlatDictionary;
pub use grammar::{NoMatch, StrokeParts, decompose};
pub use reverse::ReverseIndex;
pub use tables::{RuleTables, TableError};

static DEFAULT_COMPOSER: LazyLock<PhraseComposer> = LazyLock::new(PhraseComposer::default);
static DEFAULT_INDEX: LazyLock<ReverseIndex> =
    LazyLock::new(|| ReverseIndex::build(&DEFAULT_COMPOSER));

/// Looks an outline up against the bundled rules.
pub fn lookup(outline: &[&str]) -> Result<String, UnknownOutline> {
    DEFAULT_COMPOSER.lookup(outline)
}

/// Canonical stroke for a phrase under the bundled rules.
pub fn reverse_lookup(phrase: &str) -> Option<&'static str> {
    DEFAULT_INDEX.lookup(phrase)
}
