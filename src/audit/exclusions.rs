use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use thiserror::Error;
use yaml_rust2::{Yaml, YamlLoader};

const AUDITED_STROKES: &str = include_str!("../../rules/audited.yaml");

#[derive(Debug, Error)]
pub enum ExclusionError {
    #[error("YAML parse error: {0}")]
    YamlParseError(String),

    #[error("Expected a map of stroke to reason")]
    InvalidStructure,

    #[error("Stroke '{0}' needs a reason")]
    MissingReason(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Flat-dictionary strokes retired on purpose, each with the reason and the
/// stroke that replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionSet {
    reasons: BTreeMap<String, String>,
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::from_yaml(AUDITED_STROKES).unwrap_or_else(|e| panic!("bundled audited strokes are invalid: {e}"))
    }
}

impl ExclusionSet {
    pub fn empty() -> Self {
        Self {
            reasons: BTreeMap::new(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ExclusionError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(config: &str) -> Result<Self, ExclusionError> {
        let docs = YamlLoader::load_from_str(config)
            .map_err(|e| ExclusionError::YamlParseError(e.to_string()))?;

        let mut reasons = BTreeMap::new();
        match docs.first() {
            None | Some(Yaml::Null) => {}
            Some(Yaml::Hash(entries)) => {
                for (stroke, reason) in entries {
                    let stroke = stroke.as_str().ok_or(ExclusionError::InvalidStructure)?;
                    let reason = reason
                        .as_str()
                        .filter(|r| !r.trim().is_empty())
                        .ok_or_else(|| ExclusionError::MissingReason(stroke.to_string()))?;
                    reasons.insert(stroke.to_string(), reason.to_string());
                }
            }
            Some(_) => return Err(ExclusionError::InvalidStructure),
        }

        Ok(Self { reasons })
    }

    pub fn insert(&mut self, stroke: impl Into<String>, reason: impl Into<String>) {
        self.reasons.insert(stroke.into(), reason.into());
    }

    pub fn contains(&self, stroke: &str) -> bool {
        self.reasons.contains_key(stroke)
    }

    pub fn reason(&self, stroke: &str) -> Option<&str> {
        self.reasons.get(stroke).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.reasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }
}
