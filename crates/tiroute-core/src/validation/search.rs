//! Search requests - 検索パラメータのデコードと検証
//!
//! 共通の形（collection_name + 不透明な search_parameters）をまずデコードし、
//! collection_name ごとに専用の形へデコードし直します。

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use super::rules;
use super::sanitize::{sanitize_in_place, sanitize_list};
use crate::domain::{DecodeError, ValidationError};

pub const COLLECTION_STIX_OBJECT: &str = "stix object";

static DOCUMENT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]--[0-9a-f-]+$").expect("document id regex"));

static DOCUMENT_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-z-]+$").expect("document type regex"));

static COUNTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]+$").expect("country regex"));

/// Common shape of every search request.
#[derive(Debug, Deserialize)]
struct CommonSearchRequest {
    #[serde(default)]
    collection_name: String,
    #[serde(default)]
    search_parameters: Option<Box<RawValue>>,
}

/// SearchRequest is the decoded search request stored as task parameters.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub collection_name: String,
    pub search_parameters: SearchParameters,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SearchParameters {
    StixObject(StixSearchParameters),
    /// Parameters of collections without a dedicated shape, kept as sent.
    Opaque(Option<serde_json::Value>),
}

impl SearchRequest {
    /// Request without a collection name and without parameters.
    pub fn unspecified() -> Self {
        Self {
            collection_name: String::new(),
            search_parameters: SearchParameters::Opaque(None),
        }
    }

    /// Decode the request details of a "handling search requests" envelope.
    ///
    /// Only the "stix object" collection has a dedicated shape; the others are
    /// kept opaque so that the dispatcher can decide what to do with them.
    pub fn decode(details: &str) -> Result<Self, DecodeError> {
        let common: CommonSearchRequest =
            serde_json::from_str(details).map_err(DecodeError::Details)?;

        let search_parameters = match common.collection_name.as_str() {
            COLLECTION_STIX_OBJECT => {
                let raw = common.search_parameters.as_deref().map_or("{}", RawValue::get);
                let params: StixSearchParameters =
                    serde_json::from_str(raw).map_err(DecodeError::Details)?;
                SearchParameters::StixObject(params)
            }
            _ => SearchParameters::Opaque(
                common
                    .search_parameters
                    .map(|raw| serde_json::from_str(raw.get()))
                    .transpose()
                    .map_err(DecodeError::Details)?,
            ),
        };

        Ok(Self {
            collection_name: common.collection_name,
            search_parameters,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// When both bounds are set, start must precede end (Unix seconds).
    ///
    /// A bound at or before the Unix epoch counts as unset; clients send the
    /// zero time (`0001-01-01T00:00:00Z`) for an empty bound.
    pub fn is_ordered(&self) -> bool {
        match (set_bound(self.start), set_bound(self.end)) {
            (Some(start), Some(end)) => start < end,
            _ => true,
        }
    }
}

fn set_bound(bound: Option<DateTime<Utc>>) -> Option<i64> {
    bound.map(|b| b.timestamp()).filter(|&secs| secs > 0)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StixSearchParameters {
    #[serde(default)]
    pub documents_id: Vec<String>,
    #[serde(default)]
    pub documents_type: Vec<String>,
    #[serde(default)]
    pub created: TimeRange,
    #[serde(default)]
    pub modified: TimeRange,
    #[serde(default)]
    pub created_by_ref: String,
    #[serde(default)]
    pub specific_search_fields: Vec<SpecificSearchFields>,
}

/// Search fields for one STIX object type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpecificSearchFields {
    /// Declared STIX type; selects the rule applied to `search_fields.value`.
    pub object_type: String,
    #[serde(default)]
    pub search_fields: SearchFields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFields {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub first_seen: TimeRange,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub value: Vec<String>,
}

fn invalid(reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidSearchParameters(reason.into())
}

impl StixSearchParameters {
    /// Validate and sanitize in place.
    pub fn check_and_sanitize(mut self) -> Result<Self, ValidationError> {
        if let Some(id) = self.documents_id.iter().find(|v| !DOCUMENT_ID.is_match(v)) {
            return Err(invalid(format!("document id '{id}'")));
        }
        if let Some(t) = self.documents_type.iter().find(|v| !DOCUMENT_TYPE.is_match(v)) {
            return Err(invalid(format!("document type '{t}'")));
        }
        if !self.created.is_ordered() {
            return Err(invalid("created range start is not before end"));
        }
        if !self.modified.is_ordered() {
            return Err(invalid("modified range start is not before end"));
        }

        sanitize_in_place(&mut self.created_by_ref);

        self.specific_search_fields = self
            .specific_search_fields
            .into_iter()
            .map(SpecificSearchFields::check_and_sanitize)
            .collect::<Result<_, _>>()?;

        Ok(self)
    }
}

impl SpecificSearchFields {
    fn check_and_sanitize(mut self) -> Result<Self, ValidationError> {
        let fields = &mut self.search_fields;

        sanitize_in_place(&mut fields.name);
        sanitize_list(&mut fields.aliases);
        sanitize_list(&mut fields.roles);
        sanitize_in_place(&mut fields.city);

        if !fields.first_seen.is_ordered() {
            return Err(invalid("first_seen range start is not before end"));
        }
        if !fields.country.is_empty() && !COUNTRY.is_match(&fields.country) {
            return Err(invalid(format!("country '{}'", fields.country)));
        }
        if !fields.url.is_empty() && !rules::is_url(&fields.url) {
            return Err(invalid(format!("url '{}'", fields.url)));
        }
        if let Some(bad) = fields
            .value
            .iter()
            .find(|v| !value_matches_type(&self.object_type, v))
        {
            return Err(invalid(format!(
                "value '{bad}' does not fit type '{}'",
                self.object_type
            )));
        }

        Ok(self)
    }
}

/// Rule applied to free-form values according to their declared type.
/// Types without a rule accept any value.
pub fn value_matches_type(value_type: &str, value: &str) -> bool {
    match value_type {
        "domain-name" => rules::is_dns_name(value),
        "email-addr" => rules::is_email(value),
        "ipv4-addr" => rules::is_ipv4_addr(value) || rules::is_ipv4_network(value),
        "ipv6-addr" => rules::is_ipv6_addr(value),
        "url" => rules::is_url(value),
        _ => true,
    }
}
