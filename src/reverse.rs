use std::collections::HashMap;

use crate::composer::PhraseComposer;
use crate::grammar::{self, StrokeParts};

/// Maps phrases back to the strokes that produce them.
///
/// Built by composing every stroke the rule tables can reach. Several strokes
/// may render the same phrase (a bare present and a bare past both render as
/// the subject alone), so each phrase keeps all of them, shortest first.
#[derive(Debug, Clone, Default)]
pub struct ReverseIndex {
    strokes: HashMap<String, Vec<String>>,
}

impl ReverseIndex {
    pub fn build(composer: &PhraseComposer) -> Self {
        let tables = composer.tables();
        let mut ranked: HashMap<String, Vec<(usize, String)>> = HashMap::new();

        for (starter_key, starter) in &tables.starters {
            for vowels1 in grammar::field_values(grammar::VOWELS1_KEYS) {
                for (star, vowels2, f) in grammar::right_middle_values() {
                    for ender in tables.permitted_enders(starter) {
                        let parts = StrokeParts {
                            starter: starter_key.clone(),
                            vowels1: vowels1.clone(),
                            star: star.clone(),
                            vowels2: vowels2.clone(),
                            f: f.clone(),
                            ender: ender.to_string(),
                        };
                        let stroke = parts.to_stroke();
                        if tables.non_phrase_strokes.contains(&stroke) {
                            continue;
                        }
                        let keys = parts.key_count();
                        let Ok(composition) = composer.compose_parts(parts) else {
                            continue;
                        };
                        let phrase = composition.phrase.trim();
                        if phrase.is_empty() {
                            continue;
                        }
                        ranked
                            .entry(phrase.to_string())
                            .or_default()
                            .push((keys, stroke));
                    }
                }
            }
        }

        let strokes: HashMap<String, Vec<String>> = ranked
            .into_iter()
            .map(|(phrase, mut candidates)| {
                candidates.sort();
                (phrase, candidates.into_iter().map(|(_, stroke)| stroke).collect())
            })
            .collect();

        tracing::info!(phrases = strokes.len(), "built reverse phrasing index");
        Self { strokes }
    }

    /// The canonical stroke for `phrase`: fewest keys, then alphabetical.
    ///
    /// Leading and trailing whitespace of `phrase` is ignored.
    pub fn lookup(&self, phrase: &str) -> Option<&str> {
        self.strokes(phrase).first().map(String::as_str)
    }

    /// Every stroke that renders `phrase`, canonical stroke first.
    pub fn strokes(&self, phrase: &str) -> &[String] {
        self.strokes
            .get(phrase.trim())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use proptest::prelude::*;
    use proptest::sample::select;

    use super::*;
    use crate::tables::RuleTables;

    static COMPOSER: LazyLock<PhraseComposer> = LazyLock::new(PhraseComposer::default);
    static INDEX: LazyLock<ReverseIndex> = LazyLock::new(|| ReverseIndex::build(&COMPOSER));

    #[test]
    fn finds_the_stroke_for_a_phrase() {
        assert_eq!(INDEX.lookup("I see"), Some("SWR-S"));
        assert_eq!(INDEX.lookup("he can be"), Some("KWHRAB"));
        assert_eq!(INDEX.lookup("they didn't see"), Some("TWH*SZ"));
        assert_eq!(INDEX.lookup("  I see "), Some("SWR-S"));
        assert_eq!(INDEX.lookup("I sees"), None);
    }

    #[test]
    fn ambiguous_phrases_prefer_the_shortest_stroke() {
        let strokes = INDEX.strokes("he");
        assert!(strokes.contains(&"KWHR".to_string()));
        assert!(strokes.contains(&"KWHR-D".to_string()));
        assert_eq!(INDEX.lookup("he"), Some("KWHR"));
    }

    #[test]
    fn empty_phrases_are_not_indexed() {
        assert!(INDEX.strokes("").is_empty());
        assert!(!INDEX.is_empty());
    }

    #[test]
    fn skips_non_phrase_strokes() {
        let mut tables = RuleTables::default();
        tables.non_phrase_strokes.insert("SWR-S".into());
        let index = ReverseIndex::build(&PhraseComposer::new(tables));
        assert_eq!(index.lookup("I see"), None);
    }

    fn parts() -> impl Strategy<Value = StrokeParts> {
        let tables = COMPOSER.tables();
        let starters: Vec<String> = tables.starters.keys().cloned().collect();
        let enders: Vec<String> = tables.enders.keys().cloned().collect();
        (
            select(starters),
            select(grammar::field_values(grammar::VOWELS1_KEYS)),
            select(grammar::right_middle_values()),
            select(enders),
        )
            .prop_map(|(starter, vowels1, (star, vowels2, f), ender)| StrokeParts {
                starter,
                vowels1,
                star,
                vowels2,
                f,
                ender,
            })
    }

    proptest! {
        #[test]
        fn composed_phrases_round_trip(parts in parts()) {
            let stroke = parts.to_stroke();
            let Ok(phrase) = COMPOSER.compose(&stroke) else {
                return Ok(());
            };
            prop_assert_eq!(COMPOSER.compose(&stroke), Ok(phrase.clone()));

            let phrase = phrase.trim();
            if phrase.is_empty() {
                return Ok(());
            }
            let canonical = INDEX.lookup(phrase);
            prop_assert!(canonical.is_some(), "no stroke for {:?}", phrase);
            let recomposed = COMPOSER.compose(canonical.unwrap_or_default());
            prop_assert_eq!(recomposed.map(|p| p.trim().to_string()), Ok(phrase.to_string()));
            prop_assert!(INDEX.strokes(phrase).contains(&stroke));
        }
    }
}
