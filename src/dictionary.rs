use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grammar::STROKE_SEPARATOR;

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A flat steno dictionary: outline text to output text, as Plover stores it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatDictionary {
    entries: BTreeMap<String, String>,
}

impl FlatDictionary {
    pub fn from_json_str(json: &str) -> Result<Self, DictionaryError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, DictionaryError> {
        let content = fs::read_to_string(path)?;
        let dictionary = Self::from_json_str(&content)?;
        tracing::info!(path = %path.display(), entries = dictionary.len(), "loaded dictionary");
        Ok(dictionary)
    }

    pub fn get(&self, outline: &str) -> Option<&str> {
        self.entries.get(outline).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FlatDictionary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Whether `outline` spans more than one stroke.
pub fn is_multi_stroke(outline: &str) -> bool {
    outline.contains(STROKE_SEPARATOR)
}
