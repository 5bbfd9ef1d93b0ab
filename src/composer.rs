use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::grammar::{self, StrokeParts};
use crate::tables::{RuleTables, Tense, VerbForm};

/// Number of strokes a phrasing outline spans.
pub const LONGEST_KEY: usize = 1;

/// The lookup step that failed to resolve an outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Miss {
    OutlineLength,
    Grammar,
    NonPhraseStroke,
    Starter,
    Ender,
    EnderNotPermitted,
    MiddleBase,
    Decorator,
    Conjugation,
}

impl fmt::Display for Miss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Miss::OutlineLength => "outline length",
            Miss::Grammar => "grammar",
            Miss::NonPhraseStroke => "reserved for the main dictionary",
            Miss::Starter => "starter",
            Miss::Ender => "ender",
            Miss::EnderNotPermitted => "ender not permitted for starter",
            Miss::MiddleBase => "middle base",
            Miss::Decorator => "middle decorator",
            Miss::Conjugation => "conjugation",
        };
        f.write_str(text)
    }
}

/// The outline is not one the phrasing rules claim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown outline '{outline}' ({miss})")]
pub struct UnknownOutline {
    pub outline: String,
    pub miss: Miss,
}

/// A composed phrase with the intermediate values that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Composition {
    pub phrase: String,
    pub parts: StrokeParts,
    pub tense: Tense,
    pub middle_word: String,
    pub decorator: String,
    pub verb_form: Option<VerbForm>,
}

/// Turns single strokes into phrases using a shared, read-only rule set.
#[derive(Debug, Clone, Default)]
pub struct PhraseComposer {
    tables: Arc<RuleTables>,
}

impl PhraseComposer {
    pub fn new(tables: RuleTables) -> Self {
        Self {
            tables: Arc::new(tables),
        }
    }

    pub fn with_shared(tables: Arc<RuleTables>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &RuleTables {
        &self.tables
    }

    /// Host entry point: an outline is a sequence of strokes, of which
    /// phrasing only claims single-stroke ones.
    pub fn lookup(&self, outline: &[&str]) -> Result<String, UnknownOutline> {
        if outline.len() != LONGEST_KEY {
            return Err(UnknownOutline {
                outline: outline.join(grammar::STROKE_SEPARATOR),
                miss: Miss::OutlineLength,
            });
        }
        self.compose(outline[0])
    }

    pub fn compose(&self, stroke: &str) -> Result<String, UnknownOutline> {
        self.explain(stroke).map(|c| c.phrase)
    }

    pub fn explain(&self, stroke: &str) -> Result<Composition, UnknownOutline> {
        let miss = |miss| UnknownOutline {
            outline: stroke.to_string(),
            miss,
        };

        let parts = grammar::decompose(stroke).map_err(|_| miss(Miss::Grammar))?;
        if self.tables.non_phrase_strokes.contains(stroke)
            || self.tables.non_phrase_strokes.contains(&parts.to_stroke())
        {
            return Err(miss(Miss::NonPhraseStroke));
        }
        self.compose_parts(parts).map_err(miss)
    }

    /// Composes an already decomposed stroke.
    pub fn compose_parts(&self, parts: StrokeParts) -> Result<Composition, Miss> {
        let tables = &*self.tables;

        let starter = tables.starter(&parts.starter).ok_or(Miss::Starter)?;
        let ender = tables.ender(&parts.ender).ok_or(Miss::Ender)?;
        if !starter.permits(&parts.ender) {
            return Err(Miss::EnderNotPermitted);
        }

        let base = tables.middle_base(&parts.base_key()).ok_or(Miss::MiddleBase)?;
        let modal = base
            .for_tense(ender.tense)
            .resolve(starter.form)
            .ok_or(Miss::MiddleBase)?;
        let mut updated_form = modal.form;

        // An exception replaces the decorator outright and may veto the
        // modal's verb form.
        let template = match tables.exception(&parts.middle_key()) {
            Some(exception) => {
                if !exception.allow_verb_update {
                    updated_form = None;
                }
                &exception.template
            }
            None => tables.decorator(&parts.decorator_key()).ok_or(Miss::Decorator)?,
        };

        let middle = template.render(&modal.text);
        tracing::debug!(
            stroke = %parts,
            middle_word = %modal.text,
            decorator = %template,
            "composed middle"
        );

        let verb_form = updated_form.or(starter.form);
        let ending = ender.verb.resolve(verb_form).ok_or(Miss::Conjugation)?;

        let phrase = format!("{}{}{}", starter.text, middle, ending);
        Ok(Composition {
            phrase,
            parts,
            tense: ender.tense,
            middle_word: modal.text.clone(),
            decorator: template.to_string(),
            verb_form,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{Inflected, MiddleException, Template};

    fn composer() -> PhraseComposer {
        PhraseComposer::default()
    }

    fn phrase(stroke: &str) -> String {
        composer().compose(stroke).unwrap()
    }

    #[test]
    fn bare_subject_and_verb() {
        assert_eq!(phrase("SWR-S"), "I see");
        assert_eq!(phrase("KWHR-S"), "he sees");
        assert_eq!(phrase("TWH-S"), "they see");
        assert_eq!(phrase("SWR-B"), "I am");
        assert_eq!(phrase("KPWR-B"), "you are");
        assert_eq!(phrase("KPWH-B"), "it is");
    }

    #[test]
    fn bare_past_tense_marks_nothing() {
        assert_eq!(phrase("KPWR-D"), "you");
        assert_eq!(phrase("SWR"), "I");
    }

    #[test]
    fn past_tense_verbs() {
        assert_eq!(phrase("SKWHR-SZ"), "she saw");
        assert_eq!(phrase("SWR-BD"), "I was");
        assert_eq!(phrase("TWR-BD"), "we were");
        assert_eq!(phrase("KWHR-LTD"), "he let");
    }

    #[test]
    fn modals_force_the_infinitive() {
        assert_eq!(phrase("SWRA-B"), "I can be");
        assert_eq!(phrase("KWHRAS"), "he can see");
        assert_eq!(phrase("KWHRAO-BD"), "he would be");
        assert_eq!(phrase("KWHRAOSZ"), "he would see");
        assert_eq!(phrase("TWHOT"), "they shall have");
    }

    #[test]
    fn negated_modals() {
        assert_eq!(phrase("KWHR*S"), "he doesn't see");
        assert_eq!(phrase("SWR*S"), "I don't see");
        assert_eq!(phrase("SWR*SZ"), "I didn't see");
        assert_eq!(phrase("TWRA*PB"), "we can't know");
        assert_eq!(phrase("KPWRAO*BD"), "you wouldn't be");
    }

    #[test]
    fn decorators_wrap_the_middle_word() {
        assert_eq!(phrase("SWRAFS"), "I can never see");
        assert_eq!(phrase("SWRA*FS"), "I can't even see");
        assert_eq!(phrase("SWRAEFS"), "I really can see");
        assert_eq!(phrase("SWRAUS"), "I can just see");
        assert_eq!(phrase("SWRAEUFS"), "I still can see");
        assert_eq!(phrase("KWHR*EUS"), "he doesn't still see");
    }

    #[test]
    fn exceptions_without_modal_keep_the_subject_form() {
        assert_eq!(phrase("KWHRES"), "he really sees");
        assert_eq!(phrase("KWHRFS"), "he never sees");
        assert_eq!(phrase("KWHRUS"), "he just sees");
        assert_eq!(phrase("KWHREUS"), "he still sees");
        assert_eq!(phrase("KWHREBD"), "he really was");
    }

    #[test]
    fn emphatic_exception_substitutes_and_updates_the_verb_form() {
        let c = composer().explain("KWHRUFS").unwrap();
        assert_eq!(c.decorator, "*");
        assert_eq!(c.middle_word, " does");
        assert_eq!(c.verb_form, Some(VerbForm::Infinitive));
        assert_eq!(c.phrase, "he does see");
        assert_eq!(phrase("SWRUFD"), "I did");
    }

    #[test]
    fn exception_wins_over_decorator() {
        // The decorator table alone would render "UF" as " just do".
        let tables = composer().tables().clone();
        assert_eq!(tables.decorator("UF").unwrap().render(" do"), " just do");
        assert_eq!(phrase("SWRUFS"), "I do see");

        let mut tables = tables;
        tables.middle_exceptions.insert(
            "UF".into(),
            MiddleException {
                template: Template::parse(" surely*").unwrap(),
                allow_verb_update: false,
            },
        );
        let custom = PhraseComposer::new(tables);
        assert_eq!(custom.compose("KWHRUFS").unwrap(), "he surely does sees");
    }

    #[test]
    fn conjugation_without_default_fails() {
        // `B` has no untagged entry and the starter carries no verb form.
        let mut tables = RuleTables::default();
        tables.starters.get_mut("SWR").unwrap().form = None;
        let custom = PhraseComposer::new(tables);
        assert_eq!(
            custom.compose("SWR-B"),
            Err(UnknownOutline {
                outline: "SWR-B".into(),
                miss: Miss::Conjugation
            })
        );
        assert_eq!(custom.compose("SWR-S").unwrap(), "I see");
    }

    #[test]
    fn fixed_conjugation_ignores_verb_form() {
        let tables = RuleTables::default();
        assert!(matches!(tables.ender("PL").unwrap().verb, Inflected::Fixed(_)));
        assert_eq!(phrase("KWHR-PL"), "he may");
        assert_eq!(phrase("KWHRA-PL"), "he can may");
    }

    #[test]
    fn unknown_fields_miss() {
        let c = composer();
        let miss = |stroke: &str| c.compose(stroke).unwrap_err().miss;
        assert_eq!(miss("SWR-SS"), Miss::Grammar);
        assert_eq!(miss("STK-S"), Miss::Starter);
        assert_eq!(miss("SWR-PBLGTSDZ"), Miss::Ender);
    }

    #[test]
    fn restricted_starter_rejects_other_enders() {
        let mut tables = RuleTables::default();
        tables.starters.get_mut("SWR").unwrap().enders = Some(["B".to_string()].into());
        let custom = PhraseComposer::new(tables);
        assert_eq!(custom.compose("SWR-B").unwrap(), "I am");
        assert_eq!(custom.compose("SWR-S").unwrap_err().miss, Miss::EnderNotPermitted);
    }

    #[test]
    fn missing_decorator_fails() {
        let mut tables = RuleTables::default();
        tables.middle_decorators.remove("*F");
        let custom = PhraseComposer::new(tables);
        assert_eq!(custom.compose("SWRA*FS").unwrap_err().miss, Miss::Decorator);
    }

    #[test]
    fn non_phrase_strokes_are_not_claimed() {
        let mut tables = RuleTables::default();
        tables.non_phrase_strokes.insert("TWR-T".into());
        let custom = PhraseComposer::new(tables);
        assert_eq!(custom.compose("TWR-T").unwrap_err().miss, Miss::NonPhraseStroke);
        assert_eq!(custom.compose("TWRT").unwrap_err().miss, Miss::NonPhraseStroke);
        assert_eq!(custom.compose("TWR-TD").unwrap(), "we had");
    }

    #[test]
    fn lookup_only_claims_single_strokes() {
        let c = composer();
        assert_eq!(c.lookup(&["SWR-S"]).unwrap(), "I see");
        assert_eq!(c.lookup(&["SWR-S", "KPWR-B"]).unwrap_err().miss, Miss::OutlineLength);
        assert_eq!(c.lookup(&[]).unwrap_err().miss, Miss::OutlineLength);
    }

    #[test]
    fn subjectless_starters_render_leading_space() {
        assert_eq!(phrase("STKPWHRAOS"), " will see");
        assert_eq!(phrase("STWR-S"), " see");
    }

    #[test]
    fn shared_tables_serve_concurrent_composers() {
        let tables = Arc::new(RuleTables::default());
        let handles: Vec<_> = ["SWR-S", "KWHR-S", "TWRAB"]
            .into_iter()
            .map(|stroke| {
                let composer = PhraseComposer::with_shared(Arc::clone(&tables));
                std::thread::spawn(move || composer.compose(stroke))
            })
            .collect();
        let phrases: Vec<_> = handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect();
        assert_eq!(phrases, vec!["I see", "he sees", "we can be"]);
    }

    #[test]
    fn composition_is_deterministic() {
        let c = composer();
        for stroke in ["SWR-S", "KWHRUFS", "SWR-SS", "TWHA*EUFPBGTD"] {
            assert_eq!(c.compose(stroke), c.compose(stroke));
        }
    }
}
