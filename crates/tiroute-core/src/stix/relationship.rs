//! STIX Relationship Objects (SRO): relationship and sighting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{CommonProperties, is_ref_to, is_stix_id, is_vocabulary};
use super::object::StixType;
use crate::validation::sanitize::sanitize_opt;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Relationship {
    #[serde(flatten)]
    pub common: CommonProperties,
    pub relationship_type: String,
    pub description: Option<String>,
    pub source_ref: String,
    pub target_ref: String,
    pub start_time: Option<DateTime<Utc>>,
    pub stop_time: Option<DateTime<Utc>>,
}

impl StixType for Relationship {
    const TYPE: &'static str = "relationship";

    /// stop_time must be strictly later than start_time.
    fn check_type_fields(&self) -> bool {
        let window_ok = match (self.start_time, self.stop_time) {
            (Some(start), Some(stop)) => start < stop,
            _ => true,
        };
        self.common.check(Self::TYPE)
            && is_vocabulary(&self.relationship_type)
            && is_stix_id(&self.source_ref)
            && is_stix_id(&self.target_ref)
            && window_ok
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        self.common.sanitize();
        sanitize_opt(&mut self.description);
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Sighting {
    #[serde(flatten)]
    pub common: CommonProperties,
    pub description: Option<String>,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub count: Option<u32>,
    pub sighting_of_ref: String,
    pub observed_data_refs: Vec<String>,
    pub where_sighted_refs: Vec<String>,
    pub summary: bool,
}

impl StixType for Sighting {
    const TYPE: &'static str = "sighting";

    fn check_type_fields(&self) -> bool {
        let window_ok = match (self.first_seen, self.last_seen) {
            (Some(first), Some(last)) => first < last,
            _ => true,
        };
        self.common.check(Self::TYPE)
            && is_stix_id(&self.sighting_of_ref)
            && self.count.is_none_or(|c| c <= 999_999_999)
            && self
                .observed_data_refs
                .iter()
                .all(|r| is_ref_to(r, &["observed-data"]))
            && self
                .where_sighted_refs
                .iter()
                .all(|r| is_ref_to(r, &["identity", "location"]))
            && window_ok
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        self.common.sanitize();
        sanitize_opt(&mut self.description);
        Some(self)
    }
}
