//! Legislators and their disclosures as the core sees them.

use std::collections::BTreeMap;
use std::fmt;

use congressmoney_api::types::Senator;
use serde::{Deserialize, Serialize};

use crate::normalize::Disclosure;

/// Stable identifier for a legislator: a lowercase `last-first` slug.
///
/// Feed names vary in spacing, punctuation, and case between filings; the
/// slug collapses those so exclusions and merges do not depend on free text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LegislatorId(String);

impl LegislatorId {
    pub fn from_name(first_name: &str, last_name: &str) -> Self {
        let mut slug = String::new();
        for part in [last_name, first_name] {
            for c in part.chars() {
                if c.is_alphanumeric() {
                    slug.extend(c.to_lowercase());
                } else if !slug.is_empty() && !slug.ends_with('-') {
                    slug.push('-');
                }
            }
            if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        while slug.ends_with('-') {
            slug.pop();
        }
        Self(slug)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LegislatorId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for LegislatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One legislator with their disclosures in feed order.
#[derive(Debug, Clone)]
pub struct Legislator {
    pub id: LegislatorId,
    pub name: String,
    pub office: Option<String>,
    pub disclosures: Vec<Disclosure>,
}

impl From<Senator> for Legislator {
    fn from(senator: Senator) -> Self {
        let id = LegislatorId::from_name(&senator.first_name, &senator.last_name);
        let name = senator.full_name();
        Self {
            id,
            name,
            office: senator.office,
            disclosures: senator
                .transactions
                .into_iter()
                .map(Disclosure::from_raw)
                .collect(),
        }
    }
}

/// Converts feed records into legislators, merging records that share an id.
///
/// The first record's name and office win; later records' disclosures are
/// appended in feed order. Output is sorted by id.
pub fn legislators_from_senators(senators: Vec<Senator>) -> Vec<Legislator> {
    let mut merged: BTreeMap<LegislatorId, Legislator> = BTreeMap::new();
    for senator in senators {
        let legislator = Legislator::from(senator);
        match merged.get_mut(&legislator.id) {
            Some(existing) => {
                tracing::debug!(
                    "Merging duplicate feed record for {} ({})",
                    legislator.name,
                    legislator.id
                );
                existing.disclosures.extend(legislator.disclosures);
                if existing.office.is_none() {
                    existing.office = legislator.office;
                }
            }
            None => {
                merged.insert(legislator.id.clone(), legislator);
            }
        }
    }
    merged.into_values().collect()
}
