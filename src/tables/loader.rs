use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use thiserror::Error;
use yaml_rust2::{Yaml, YamlLoader};

use super::{
    ByForm, Ender, Inflected, MiddleBase, MiddleException, ModalWord, RuleTables, Starter,
    Template, VerbForm,
};

const DEFAULT_KEY: &str = "default";

#[derive(Debug, Error)]
pub enum TableError {
    #[error("YAML parse error: {0}")]
    YamlParseError(String),

    #[error("Empty YAML document")]
    EmptyYaml,

    #[error("Missing table '{0}'")]
    MissingTable(&'static str),

    #[error("Invalid entry '{key}' in table '{table}': {reason}")]
    InvalidEntry {
        table: &'static str,
        key: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

fn invalid(table: &'static str, key: &str, reason: impl Into<String>) -> TableError {
    TableError::InvalidEntry {
        table,
        key: key.to_string(),
        reason: reason.into(),
    }
}

impl RuleTables {
    pub fn from_file(path: &Path) -> Result<Self, TableError> {
        let content = fs::read_to_string(path)?;
        let tables = Self::from_yaml(&content)?;
        tracing::info!(
            path = %path.display(),
            starters = tables.starters.len(),
            enders = tables.enders.len(),
            "loaded phrasing rules"
        );
        Ok(tables)
    }

    pub fn from_yaml(config: &str) -> Result<Self, TableError> {
        let docs = YamlLoader::load_from_str(config)
            .map_err(|e| TableError::YamlParseError(e.to_string()))?;
        let doc = docs.first().ok_or(TableError::EmptyYaml)?;

        let mut starters = BTreeMap::new();
        for (key, value) in section(doc, "starters")? {
            starters.insert(key.to_string(), parse_starter(key, value)?);
        }

        let mut middle_bases = HashMap::new();
        for (key, value) in section(doc, "middle_bases")? {
            middle_bases.insert(key.to_string(), parse_middle_base(key, value)?);
        }

        let mut middle_decorators = HashMap::new();
        for (key, value) in section(doc, "middle_decorators")? {
            let text = value
                .as_str()
                .ok_or_else(|| invalid("middle_decorators", key, "expected a template string"))?;
            middle_decorators.insert(key.to_string(), parse_template("middle_decorators", key, text)?);
        }

        let mut middle_exceptions = HashMap::new();
        for (key, value) in section(doc, "middle_exceptions")? {
            middle_exceptions.insert(key.to_string(), parse_exception(key, value)?);
        }

        let mut enders = BTreeMap::new();
        for (key, value) in section(doc, "enders")? {
            enders.insert(key.to_string(), parse_ender(key, value)?);
        }

        let non_phrase_strokes = match &doc["non_phrase_strokes"] {
            Yaml::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| invalid("non_phrase_strokes", "", "expected a stroke string"))
                })
                .collect::<Result<BTreeSet<_>, _>>()?,
            Yaml::BadValue | Yaml::Null => BTreeSet::new(),
            _ => return Err(invalid("non_phrase_strokes", "", "expected a list")),
        };

        Ok(Self {
            starters,
            middle_bases,
            middle_decorators,
            middle_exceptions,
            enders,
            non_phrase_strokes,
        })
    }
}

/// String-keyed entries of a top-level table.
fn section<'a>(doc: &'a Yaml, name: &'static str) -> Result<Vec<(&'a str, &'a Yaml)>, TableError> {
    let hash = doc[name].as_hash().ok_or(TableError::MissingTable(name))?;
    hash.iter()
        .map(|(k, v)| {
            k.as_str()
                .map(|key| (key, v))
                .ok_or_else(|| invalid(name, &format!("{k:?}"), "keys must be strings"))
        })
        .collect()
}

/// Text of a verb-form tag. An unquoted `inf` arrives as a real number.
fn tag_text(value: &Yaml) -> Option<&str> {
    match value {
        Yaml::String(tag) | Yaml::Real(tag) => Some(tag.as_str()),
        _ => None,
    }
}

fn parse_form(table: &'static str, key: &str, value: &Yaml) -> Result<Option<VerbForm>, TableError> {
    if matches!(value, Yaml::BadValue | Yaml::Null) {
        return Ok(None);
    }
    match tag_text(value) {
        Some("") => Ok(None),
        Some(tag) => tag.parse().map(Some).map_err(|e| invalid(table, key, e)),
        None => Err(invalid(table, key, "verb form must be a tag string")),
    }
}

fn parse_template(table: &'static str, key: &str, text: &str) -> Result<Template, TableError> {
    Template::parse(text).ok_or_else(|| invalid(table, key, "a template may hold at most one '*'"))
}

fn parse_starter(key: &str, value: &Yaml) -> Result<Starter, TableError> {
    let text = value["text"]
        .as_str()
        .ok_or_else(|| invalid("starters", key, "missing 'text'"))?;
    let form = parse_form("starters", key, &value["form"])?;

    let enders = match &value["enders"] {
        Yaml::BadValue | Yaml::Null => None,
        Yaml::Array(items) => Some(
            items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| invalid("starters", key, "'enders' must list strings"))
                })
                .collect::<Result<BTreeSet<_>, _>>()?,
        ),
        _ => return Err(invalid("starters", key, "'enders' must be a list")),
    };

    Ok(Starter {
        text: text.to_string(),
        form,
        enders,
    })
}

/// Reads either a single leaf or a map of verb-form tag (or `default`) to leaf.
fn parse_inflected<T>(
    table: &'static str,
    key: &str,
    value: &Yaml,
    leaf: impl Fn(&Yaml) -> Result<T, TableError>,
) -> Result<Inflected<T>, TableError> {
    let Yaml::Hash(entries) = value else {
        return leaf(value).map(Inflected::Fixed);
    };

    let mut forms = HashMap::new();
    let mut default = None;
    for (tag, entry) in entries {
        let tag = tag_text(tag)
            .ok_or_else(|| invalid(table, key, "verb form keys must be strings"))?;
        if tag == DEFAULT_KEY {
            default = Some(leaf(entry)?);
        } else {
            let form: VerbForm = tag.parse().map_err(|e| invalid(table, key, e))?;
            forms.insert(form, leaf(entry)?);
        }
    }

    Ok(Inflected::ByForm(ByForm { forms, default }))
}

fn parse_middle_base(key: &str, value: &Yaml) -> Result<MiddleBase, TableError> {
    let modal = |entry: &Yaml| -> Result<ModalWord, TableError> {
        match entry.as_vec().map(Vec::as_slice) {
            Some([text, form]) => Ok(ModalWord {
                text: text
                    .as_str()
                    .ok_or_else(|| invalid("middle_bases", key, "modal text must be a string"))?
                    .to_string(),
                form: parse_form("middle_bases", key, form)?,
            }),
            _ => Err(invalid("middle_bases", key, "expected a [text, verb form] pair")),
        }
    };

    let bucket = |name: &str| -> Result<Inflected<ModalWord>, TableError> {
        let entry = &value[name];
        if entry.is_badvalue() {
            return Err(invalid("middle_bases", key, format!("missing '{name}' bucket")));
        }
        parse_inflected("middle_bases", key, entry, &modal)
    };

    Ok(MiddleBase {
        present: bucket("present")?,
        past: bucket("past")?,
    })
}

fn parse_exception(key: &str, value: &Yaml) -> Result<MiddleException, TableError> {
    let text = value["template"]
        .as_str()
        .ok_or_else(|| invalid("middle_exceptions", key, "missing 'template'"))?;
    let allow_verb_update = value["verb_update"]
        .as_bool()
        .ok_or_else(|| invalid("middle_exceptions", key, "missing 'verb_update'"))?;

    Ok(MiddleException {
        template: parse_template("middle_exceptions", key, text)?,
        allow_verb_update,
    })
}

fn parse_ender(key: &str, value: &Yaml) -> Result<Ender, TableError> {
    let tense = value["tense"]
        .as_str()
        .ok_or_else(|| invalid("enders", key, "missing 'tense'"))?
        .parse()
        .map_err(|e: String| invalid("enders", key, e))?;

    let verb = &value["verb"];
    if verb.is_badvalue() {
        return Err(invalid("enders", key, "missing 'verb'"));
    }
    let verb = parse_inflected("enders", key, verb, |entry| {
        entry
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| invalid("enders", key, "conjugations must be strings"))
    })?;

    Ok(Ender { tense, verb })
}
