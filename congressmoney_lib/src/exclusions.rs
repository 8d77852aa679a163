//! Data-quality exclusions for cohort aggregation.
//!
//! Keyed by stable legislator id. The default set is embedded at compile time
//! from `seed_data/exclusions.yml`; a run may supply its own file instead.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::legislator::LegislatorId;

#[derive(Error, Debug)]
pub enum ExclusionError {
    #[error("Failed to parse exclusions YAML: {0}")]
    YamlParse(#[from] serde_yml::Error),
    #[error("Failed to read exclusions file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Duplicate id in exclusions file: {0}")]
    DuplicateId(String),
    #[error("Exclusion for {0} needs a reason or duplicate_of")]
    MissingReason(String),
}

/// Top-level structure of an exclusions YAML file.
#[derive(Deserialize, Debug)]
pub struct ExclusionFile {
    pub exclusions: Vec<ExclusionEntry>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ExclusionEntry {
    pub id: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub duplicate_of: Option<String>,
}

/// Why one legislator is excluded.
#[derive(Debug, Clone, PartialEq)]
pub struct Exclusion {
    pub reason: String,
    pub duplicate_of: Option<LegislatorId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExclusionSet {
    entries: BTreeMap<LegislatorId, Exclusion>,
}

impl ExclusionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn parse(yaml_content: &str) -> Result<Self, ExclusionError> {
        let file: ExclusionFile = serde_yml::from_str(yaml_content)?;

        let mut entries = BTreeMap::new();
        for entry in file.exclusions {
            let id = LegislatorId::from(entry.id.trim());
            if entries.contains_key(&id) {
                return Err(ExclusionError::DuplicateId(entry.id));
            }
            let exclusion = match (entry.duplicate_of, entry.reason) {
                (Some(canonical), reason) => {
                    let canonical = LegislatorId::from(canonical.trim());
                    Exclusion {
                        reason: reason.unwrap_or_else(|| format!("duplicate of {}", canonical)),
                        duplicate_of: Some(canonical),
                    }
                }
                (None, Some(reason)) => Exclusion {
                    reason,
                    duplicate_of: None,
                },
                (None, None) => return Err(ExclusionError::MissingReason(entry.id)),
            };
            entries.insert(id, exclusion);
        }
        Ok(Self { entries })
    }

    /// The set shipped with the crate.
    pub fn embedded() -> Result<Self, ExclusionError> {
        Self::parse(include_str!("../../seed_data/exclusions.yml"))
    }

    pub fn from_file(path: &Path) -> Result<Self, ExclusionError> {
        let content = std::fs::read_to_string(path).map_err(|source| ExclusionError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn get(&self, id: &LegislatorId) -> Option<&Exclusion> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &LegislatorId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
