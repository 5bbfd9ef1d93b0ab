use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::grammar::{self, STAR};

mod loader;
pub use loader::TableError;

const DEFAULT_RULES: &str = include_str!("../../rules/phrasing.yaml");

// ----------------- Verb forms and tenses -----------------

/// Grammatical person and number threaded from the subject to the verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum VerbForm {
    #[serde(rename = "1ps")]
    FirstSingular,
    #[serde(rename = "2p")]
    Second,
    #[serde(rename = "3ps")]
    ThirdSingular,
    #[serde(rename = "1pp")]
    FirstPlural,
    #[serde(rename = "3pp")]
    ThirdPlural,
    /// Bare infinitive, imposed by a preceding modal ("can be", "did see").
    #[serde(rename = "inf")]
    Infinitive,
}

impl VerbForm {
    pub fn tag(self) -> &'static str {
        match self {
            VerbForm::FirstSingular => "1ps",
            VerbForm::Second => "2p",
            VerbForm::ThirdSingular => "3ps",
            VerbForm::FirstPlural => "1pp",
            VerbForm::ThirdPlural => "3pp",
            VerbForm::Infinitive => "inf",
        }
    }
}

impl FromStr for VerbForm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1ps" => Ok(VerbForm::FirstSingular),
            "2p" => Ok(VerbForm::Second),
            "3ps" => Ok(VerbForm::ThirdSingular),
            "1pp" => Ok(VerbForm::FirstPlural),
            "3pp" => Ok(VerbForm::ThirdPlural),
            "inf" => Ok(VerbForm::Infinitive),
            other => Err(format!("unknown verb form '{other}'")),
        }
    }
}

impl fmt::Display for VerbForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tense {
    Present,
    Past,
}

impl FromStr for Tense {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(Tense::Present),
            "past" => Ok(Tense::Past),
            other => Err(format!("unknown tense '{other}'")),
        }
    }
}

// ----------------- Form-dependent values -----------------

/// Entries keyed by verb form, with an optional untagged default.
#[derive(Debug, Clone, PartialEq)]
pub struct ByForm<T> {
    pub forms: HashMap<VerbForm, T>,
    pub default: Option<T>,
}

impl<T> ByForm<T> {
    /// The entry for `form`, falling back to the default.
    pub fn resolve(&self, form: Option<VerbForm>) -> Option<&T> {
        form.and_then(|f| self.forms.get(&f))
            .or(self.default.as_ref())
    }
}

/// A table value that either ignores the verb form or depends on it.
#[derive(Debug, Clone, PartialEq)]
pub enum Inflected<T> {
    Fixed(T),
    ByForm(ByForm<T>),
}

impl<T> Inflected<T> {
    pub fn resolve(&self, form: Option<VerbForm>) -> Option<&T> {
        match self {
            Inflected::Fixed(value) => Some(value),
            Inflected::ByForm(table) => table.resolve(form),
        }
    }
}

// ----------------- Templates -----------------

/// Decorator text with at most one slot for the middle word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub prefix: String,
    pub suffix: String,
    pub has_slot: bool,
}

impl Template {
    /// Reads `*`-marked template text. More than one slot is rejected.
    pub fn parse(text: &str) -> Option<Self> {
        match text.split_once(STAR) {
            None => Some(Template {
                prefix: text.to_string(),
                suffix: String::new(),
                has_slot: false,
            }),
            Some((_, rest)) if rest.contains(STAR) => None,
            Some((prefix, suffix)) => Some(Template {
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
                has_slot: true,
            }),
        }
    }

    /// A template without a slot drops `word` and renders only its own text.
    pub fn render(&self, word: &str) -> String {
        if self.has_slot {
            format!("{}{}{}", self.prefix, word, self.suffix)
        } else {
            self.prefix.clone()
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_slot {
            write!(f, "{}{}{}", self.prefix, STAR, self.suffix)
        } else {
            f.write_str(&self.prefix)
        }
    }
}

// ----------------- Table entries -----------------

#[derive(Debug, Clone, PartialEq)]
pub struct Starter {
    pub text: String,
    pub form: Option<VerbForm>,
    /// Enders this starter may combine with. `None` permits every ender.
    pub enders: Option<BTreeSet<String>>,
}

impl Starter {
    pub fn permits(&self, ender: &str) -> bool {
        self.enders.as_ref().is_none_or(|allowed| allowed.contains(ender))
    }
}

/// A modal word and the verb form it imposes on what follows.
#[derive(Debug, Clone, PartialEq)]
pub struct ModalWord {
    pub text: String,
    pub form: Option<VerbForm>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MiddleBase {
    pub present: Inflected<ModalWord>,
    pub past: Inflected<ModalWord>,
}

impl MiddleBase {
    pub fn for_tense(&self, tense: Tense) -> &Inflected<ModalWord> {
        match tense {
            Tense::Present => &self.present,
            Tense::Past => &self.past,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MiddleException {
    pub template: Template,
    /// Whether the middle word's verb form reaches the ender lookup.
    pub allow_verb_update: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ender {
    pub tense: Tense,
    pub verb: Inflected<String>,
}

// ----------------- Rule tables -----------------

/// The complete, immutable rule set shared by the composer and the auditor.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTables {
    pub starters: BTreeMap<String, Starter>,
    pub middle_bases: HashMap<String, MiddleBase>,
    pub middle_decorators: HashMap<String, Template>,
    pub middle_exceptions: HashMap<String, MiddleException>,
    pub enders: BTreeMap<String, Ender>,
    pub non_phrase_strokes: BTreeSet<String>,
}

impl Default for RuleTables {
    fn default() -> Self {
        Self::from_yaml(DEFAULT_RULES).unwrap_or_else(|e| panic!("bundled phrasing rules are invalid: {e}"))
    }
}

impl RuleTables {
    pub fn starter(&self, key: &str) -> Option<&Starter> {
        self.starters.get(key)
    }

    pub fn ender(&self, key: &str) -> Option<&Ender> {
        self.enders.get(key)
    }

    pub fn middle_base(&self, key: &str) -> Option<&MiddleBase> {
        self.middle_bases.get(key)
    }

    pub fn decorator(&self, key: &str) -> Option<&Template> {
        self.middle_decorators.get(key)
    }

    pub fn exception(&self, key: &str) -> Option<&MiddleException> {
        self.middle_exceptions.get(key)
    }

    /// Enders a starter may combine with, in key order.
    pub fn permitted_enders<'a>(&'a self, starter: &'a Starter) -> Vec<&'a str> {
        match &starter.enders {
            Some(allowed) => allowed.iter().map(String::as_str).collect(),
            None => self.enders.keys().map(String::as_str).collect(),
        }
    }

    /// Every `(starter, ender)` cell the rule tables can synthesize.
    pub fn reachable_pairs(&self) -> Vec<(&str, &str)> {
        self.starters
            .iter()
            .flat_map(|(key, starter)| {
                self.permitted_enders(starter)
                    .into_iter()
                    .map(move |ender| (key.as_str(), ender))
            })
            .collect()
    }

    /// Decorator and exception keys the grammar can never produce.
    pub fn unreachable_keys(&self) -> Vec<String> {
        let mut decorator_keys = BTreeSet::new();
        let mut middle_keys = BTreeSet::new();
        for vowels1 in grammar::field_values(grammar::VOWELS1_KEYS) {
            for (star, vowels2, f) in grammar::right_middle_values() {
                decorator_keys.insert(format!("{star}{vowels2}{f}"));
                middle_keys.insert(format!("{vowels1}{star}{vowels2}{f}"));
            }
        }

        let mut dead: Vec<String> = self
            .middle_decorators
            .keys()
            .filter(|k| !decorator_keys.contains(*k))
            .chain(self.middle_exceptions.keys().filter(|k| !middle_keys.contains(*k)))
            .cloned()
            .collect();
        dead.sort();
        dead
    }
}
