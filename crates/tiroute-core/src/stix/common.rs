//! Properties shared by STIX objects and the helpers used by every variant.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::validation::rules;
use crate::validation::sanitize::{sanitize_in_place, sanitize_list, sanitize_opt};

static STIX_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([a-z0-9][a-z0-9-]*)--[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
    )
    .expect("stix id regex")
});

static VOCABULARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]*$").expect("vocabulary regex"));

/// `<type>--<uuid>` with any type.
pub fn is_stix_id(value: &str) -> bool {
    STIX_ID.is_match(value)
}

/// `<type>--<uuid>` where `<type>` is one of `types`.
pub fn is_ref_to(value: &str, types: &[&str]) -> bool {
    STIX_ID
        .captures(value)
        .and_then(|c| c.get(1))
        .is_some_and(|t| types.contains(&t.as_str()))
}

pub fn refs_valid(refs: &[String]) -> bool {
    refs.iter().all(|r| is_stix_id(r))
}

pub fn opt_ref_to(value: &Option<String>, types: &[&str]) -> bool {
    value.as_deref().is_none_or(|r| is_ref_to(r, types))
}

pub fn opt_ref_valid(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(is_stix_id)
}

/// Lower-case, hyphenated open-vocabulary term (e.g. `"anomalous-activity"`).
pub fn is_vocabulary(value: &str) -> bool {
    VOCABULARY.is_match(value)
}

pub fn vocabulary_valid(values: &[String]) -> bool {
    values.iter().all(|v| is_vocabulary(v))
}

pub fn has_text(value: &str) -> bool {
    !value.trim().is_empty()
}

/// `first <= last` when both are present.
pub fn ordered(first: Option<DateTime<Utc>>, last: Option<DateTime<Utc>>) -> bool {
    match (first, last) {
        (Some(first), Some(last)) => first <= last,
        _ => true,
    }
}

/// Sanitize a required text field, `None` when nothing is left.
pub fn sanitized_required(value: &mut String) -> Option<()> {
    sanitize_in_place(value);
    (!value.is_empty()).then_some(())
}

/// Hash values keyed by algorithm name. Well-known algorithms must be hex of
/// the right length; the others only need a value.
pub fn hashes_valid(hashes: &BTreeMap<String, String>) -> bool {
    hashes.iter().all(|(algo, value)| {
        let expected = match algo.as_str() {
            "MD5" => Some(32),
            "SHA-1" => Some(40),
            "SHA-256" | "SHA3-256" => Some(64),
            "SHA-512" | "SHA3-512" => Some(128),
            _ => None,
        };
        match expected {
            Some(len) => value.len() == len && rules::is_hex(value),
            None => !algo.is_empty() && has_text(value),
        }
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalReference {
    pub source_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub hashes: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

impl ExternalReference {
    fn check(&self) -> bool {
        has_text(&self.source_name)
            && self.url.as_deref().is_none_or(rules::is_url)
            && hashes_valid(&self.hashes)
    }

    fn sanitize(&mut self) {
        sanitize_in_place(&mut self.source_name);
        sanitize_opt(&mut self.description);
        sanitize_opt(&mut self.external_id);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KillChainPhase {
    pub kill_chain_name: String,
    pub phase_name: String,
}

pub fn kill_chain_valid(phases: &[KillChainPhase]) -> bool {
    phases
        .iter()
        .all(|p| has_text(&p.kill_chain_name) && has_text(&p.phase_name))
}

pub fn sanitize_kill_chain(phases: &mut [KillChainPhase]) {
    for phase in phases {
        sanitize_in_place(&mut phase.kill_chain_name);
        sanitize_in_place(&mut phase.phase_name);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GranularMarking {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marking_ref: Option<String>,
    pub selectors: Vec<String>,
}

fn markings_valid(object_marking_refs: &[String], granular: &[GranularMarking]) -> bool {
    object_marking_refs
        .iter()
        .all(|r| is_ref_to(r, &["marking-definition"]))
        && granular.iter().all(|g| {
            !g.selectors.is_empty() && opt_ref_to(&g.marking_ref, &["marking-definition"])
        })
}

/// Common properties of domain objects (SDO) and relationship objects (SRO).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonProperties {
    #[serde(rename = "type")]
    pub data_type: String,
    pub spec_version: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by_ref: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub revoked: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub external_references: Vec<ExternalReference>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub object_marking_refs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub granular_markings: Vec<GranularMarking>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Map<String, serde_json::Value>>,
}

impl CommonProperties {
    pub fn check(&self, expected_type: &str) -> bool {
        self.data_type == expected_type
            && is_ref_to(&self.id, &[expected_type])
            && has_text(&self.spec_version)
            && ordered(self.created, self.modified)
            && self.confidence.is_none_or(|c| (0..=100).contains(&c))
            && opt_ref_to(&self.created_by_ref, &["identity"])
            && self.external_references.iter().all(ExternalReference::check)
            && markings_valid(&self.object_marking_refs, &self.granular_markings)
    }

    pub fn sanitize(&mut self) {
        sanitize_list(&mut self.labels);
        sanitize_opt(&mut self.lang);
        self.external_references
            .iter_mut()
            .for_each(ExternalReference::sanitize);
    }
}

/// Common properties of cyber-observable objects (SCO).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservableCommon {
    #[serde(rename = "type")]
    pub data_type: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec_version: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub object_marking_refs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub granular_markings: Vec<GranularMarking>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub defanged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Map<String, serde_json::Value>>,
}

impl ObservableCommon {
    pub fn check(&self, expected_type: &str) -> bool {
        self.data_type == expected_type
            && is_ref_to(&self.id, &[expected_type])
            && markings_valid(&self.object_marking_refs, &self.granular_markings)
    }
}
