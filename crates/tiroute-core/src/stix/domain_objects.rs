//! STIX Domain Objects (SDO).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{
    CommonProperties, KillChainPhase, has_text, is_ref_to, is_vocabulary, kill_chain_valid,
    opt_ref_to, ordered, refs_valid, sanitize_kill_chain, sanitized_required, vocabulary_valid,
};
use super::object::StixType;
use crate::validation::sanitize::{sanitize_list, sanitize_opt};

fn opt_vocabulary(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(is_vocabulary)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackPattern {
    #[serde(flatten)]
    pub common: CommonProperties,
    pub name: String,
    pub description: Option<String>,
    pub aliases: Vec<String>,
    pub kill_chain_phases: Vec<KillChainPhase>,
}

impl StixType for AttackPattern {
    const TYPE: &'static str = "attack-pattern";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE)
            && has_text(&self.name)
            && kill_chain_valid(&self.kill_chain_phases)
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        self.common.sanitize();
        sanitized_required(&mut self.name)?;
        sanitize_opt(&mut self.description);
        sanitize_list(&mut self.aliases);
        sanitize_kill_chain(&mut self.kill_chain_phases);
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Campaign {
    #[serde(flatten)]
    pub common: CommonProperties,
    pub name: String,
    pub description: Option<String>,
    pub aliases: Vec<String>,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub objective: Option<String>,
}

impl StixType for Campaign {
    const TYPE: &'static str = "campaign";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE)
            && has_text(&self.name)
            && ordered(self.first_seen, self.last_seen)
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        self.common.sanitize();
        sanitized_required(&mut self.name)?;
        sanitize_opt(&mut self.description);
        sanitize_list(&mut self.aliases);
        sanitize_opt(&mut self.objective);
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseOfAction {
    #[serde(flatten)]
    pub common: CommonProperties,
    pub name: String,
    pub description: Option<String>,
}

impl StixType for CourseOfAction {
    const TYPE: &'static str = "course-of-action";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE) && has_text(&self.name)
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        self.common.sanitize();
        sanitized_required(&mut self.name)?;
        sanitize_opt(&mut self.description);
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Grouping {
    #[serde(flatten)]
    pub common: CommonProperties,
    pub name: Option<String>,
    pub description: Option<String>,
    pub context: String,
    pub object_refs: Vec<String>,
}

impl StixType for Grouping {
    const TYPE: &'static str = "grouping";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE)
            && is_vocabulary(&self.context)
            && !self.object_refs.is_empty()
            && refs_valid(&self.object_refs)
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        self.common.sanitize();
        sanitize_opt(&mut self.name);
        sanitize_opt(&mut self.description);
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    #[serde(flatten)]
    pub common: CommonProperties,
    pub name: String,
    pub description: Option<String>,
    pub roles: Vec<String>,
    pub identity_class: Option<String>,
    pub sectors: Vec<String>,
    pub contact_information: Option<String>,
}

impl StixType for Identity {
    const TYPE: &'static str = "identity";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE)
            && has_text(&self.name)
            && opt_vocabulary(&self.identity_class)
            && vocabulary_valid(&self.sectors)
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        self.common.sanitize();
        sanitized_required(&mut self.name)?;
        sanitize_opt(&mut self.description);
        sanitize_list(&mut self.roles);
        sanitize_opt(&mut self.contact_information);
        Some(self)
    }
}

/// `pattern` is kept verbatim: escaping would change what it matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Indicator {
    #[serde(flatten)]
    pub common: CommonProperties,
    pub name: Option<String>,
    pub description: Option<String>,
    pub indicator_types: Vec<String>,
    pub pattern: String,
    pub pattern_type: String,
    pub pattern_version: Option<String>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub kill_chain_phases: Vec<KillChainPhase>,
}

impl StixType for Indicator {
    const TYPE: &'static str = "indicator";

    fn check_type_fields(&self) -> bool {
        let window_ok = match (self.valid_from, self.valid_until) {
            (Some(from), Some(until)) => from < until,
            (Some(_), None) => true,
            (None, _) => false,
        };
        self.common.check(Self::TYPE)
            && has_text(&self.pattern)
            && is_vocabulary(&self.pattern_type)
            && vocabulary_valid(&self.indicator_types)
            && window_ok
            && kill_chain_valid(&self.kill_chain_phases)
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        self.common.sanitize();
        sanitize_opt(&mut self.name);
        sanitize_opt(&mut self.description);
        sanitize_kill_chain(&mut self.kill_chain_phases);
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Infrastructure {
    #[serde(flatten)]
    pub common: CommonProperties,
    pub name: String,
    pub description: Option<String>,
    pub infrastructure_types: Vec<String>,
    pub aliases: Vec<String>,
    pub kill_chain_phases: Vec<KillChainPhase>,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
}

impl StixType for Infrastructure {
    const TYPE: &'static str = "infrastructure";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE)
            && has_text(&self.name)
            && vocabulary_valid(&self.infrastructure_types)
            && kill_chain_valid(&self.kill_chain_phases)
            && ordered(self.first_seen, self.last_seen)
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        self.common.sanitize();
        sanitized_required(&mut self.name)?;
        sanitize_opt(&mut self.description);
        sanitize_list(&mut self.aliases);
        sanitize_kill_chain(&mut self.kill_chain_phases);
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IntrusionSet {
    #[serde(flatten)]
    pub common: CommonProperties,
    pub name: String,
    pub description: Option<String>,
    pub aliases: Vec<String>,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub goals: Vec<String>,
    pub resource_level: Option<String>,
    pub primary_motivation: Option<String>,
    pub secondary_motivations: Vec<String>,
}

impl StixType for IntrusionSet {
    const TYPE: &'static str = "intrusion-set";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE)
            && has_text(&self.name)
            && ordered(self.first_seen, self.last_seen)
            && opt_vocabulary(&self.resource_level)
            && opt_vocabulary(&self.primary_motivation)
            && vocabulary_valid(&self.secondary_motivations)
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        self.common.sanitize();
        sanitized_required(&mut self.name)?;
        sanitize_opt(&mut self.description);
        sanitize_list(&mut self.aliases);
        sanitize_list(&mut self.goals);
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    #[serde(flatten)]
    pub common: CommonProperties,
    pub name: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub precision: Option<f64>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub administrative_area: Option<String>,
    pub city: Option<String>,
    pub street_address: Option<String>,
    pub postal_code: Option<String>,
}

impl StixType for Location {
    const TYPE: &'static str = "location";

    /// region, country or a full lat/long pair must be present.
    fn check_type_fields(&self) -> bool {
        let coordinates = match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => {
                (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
            }
            (None, None) => self.precision.is_none(),
            _ => false,
        };
        let anchored =
            self.region.is_some() || self.country.is_some() || self.latitude.is_some();
        self.common.check(Self::TYPE)
            && coordinates
            && anchored
            && self.precision.is_none_or(|p| p >= 0.0)
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        self.common.sanitize();
        sanitize_opt(&mut self.name);
        sanitize_opt(&mut self.description);
        sanitize_opt(&mut self.region);
        sanitize_opt(&mut self.country);
        sanitize_opt(&mut self.administrative_area);
        sanitize_opt(&mut self.city);
        sanitize_opt(&mut self.street_address);
        sanitize_opt(&mut self.postal_code);
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Malware {
    #[serde(flatten)]
    pub common: CommonProperties,
    pub name: String,
    pub description: Option<String>,
    pub malware_types: Vec<String>,
    pub is_family: bool,
    pub aliases: Vec<String>,
    pub kill_chain_phases: Vec<KillChainPhase>,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub operating_system_refs: Vec<String>,
    pub architecture_execution_envs: Vec<String>,
    pub implementation_languages: Vec<String>,
    pub capabilities: Vec<String>,
    pub sample_refs: Vec<String>,
}

impl StixType for Malware {
    const TYPE: &'static str = "malware";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE)
            && has_text(&self.name)
            && vocabulary_valid(&self.malware_types)
            && vocabulary_valid(&self.capabilities)
            && kill_chain_valid(&self.kill_chain_phases)
            && ordered(self.first_seen, self.last_seen)
            && self
                .operating_system_refs
                .iter()
                .all(|r| is_ref_to(r, &["software"]))
            && self
                .sample_refs
                .iter()
                .all(|r| is_ref_to(r, &["artifact", "file"]))
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        self.common.sanitize();
        sanitized_required(&mut self.name)?;
        sanitize_opt(&mut self.description);
        sanitize_list(&mut self.aliases);
        sanitize_kill_chain(&mut self.kill_chain_phases);
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MalwareAnalysis {
    #[serde(flatten)]
    pub common: CommonProperties,
    pub product: String,
    pub version: Option<String>,
    pub configuration_version: Option<String>,
    pub modules: Vec<String>,
    pub analysis_engine_version: Option<String>,
    pub analysis_definition_version: Option<String>,
    pub submitted: Option<DateTime<Utc>>,
    pub analysis_started: Option<DateTime<Utc>>,
    pub analysis_ended: Option<DateTime<Utc>>,
    pub result: Option<String>,
    pub analysis_sco_refs: Vec<String>,
    pub sample_ref: Option<String>,
}

impl StixType for MalwareAnalysis {
    const TYPE: &'static str = "malware-analysis";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE)
            && has_text(&self.product)
            && (self.result.is_some() || !self.analysis_sco_refs.is_empty())
            && opt_vocabulary(&self.result)
            && refs_valid(&self.analysis_sco_refs)
            && opt_ref_to(
                &self.sample_ref,
                &["artifact", "file", "network-traffic"],
            )
            && ordered(self.analysis_started, self.analysis_ended)
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        self.common.sanitize();
        sanitized_required(&mut self.product)?;
        sanitize_opt(&mut self.version);
        sanitize_opt(&mut self.configuration_version);
        sanitize_list(&mut self.modules);
        sanitize_opt(&mut self.analysis_engine_version);
        sanitize_opt(&mut self.analysis_definition_version);
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Note {
    #[serde(flatten)]
    pub common: CommonProperties,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub content: String,
    pub authors: Vec<String>,
    pub object_refs: Vec<String>,
}

impl StixType for Note {
    const TYPE: &'static str = "note";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE)
            && has_text(&self.content)
            && !self.object_refs.is_empty()
            && refs_valid(&self.object_refs)
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        self.common.sanitize();
        sanitized_required(&mut self.content)?;
        sanitize_opt(&mut self.abstract_text);
        sanitize_list(&mut self.authors);
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservedData {
    #[serde(flatten)]
    pub common: CommonProperties,
    pub first_observed: Option<DateTime<Utc>>,
    pub last_observed: Option<DateTime<Utc>>,
    pub number_observed: u32,
    pub object_refs: Vec<String>,
}

impl StixType for ObservedData {
    const TYPE: &'static str = "observed-data";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE)
            && self.first_observed.is_some()
            && self.last_observed.is_some()
            && ordered(self.first_observed, self.last_observed)
            && (1..=999_999_999).contains(&self.number_observed)
            && !self.object_refs.is_empty()
            && refs_valid(&self.object_refs)
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        self.common.sanitize();
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Opinion {
    #[serde(flatten)]
    pub common: CommonProperties,
    pub explanation: Option<String>,
    pub authors: Vec<String>,
    pub opinion: String,
    pub object_refs: Vec<String>,
}

impl StixType for Opinion {
    const TYPE: &'static str = "opinion";

    fn check_type_fields(&self) -> bool {
        const OPINIONS: [&str; 5] = [
            "strongly-disagree",
            "disagree",
            "neutral",
            "agree",
            "strongly-agree",
        ];
        self.common.check(Self::TYPE)
            && OPINIONS.contains(&self.opinion.as_str())
            && !self.object_refs.is_empty()
            && refs_valid(&self.object_refs)
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        self.common.sanitize();
        sanitize_opt(&mut self.explanation);
        sanitize_list(&mut self.authors);
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Report {
    #[serde(flatten)]
    pub common: CommonProperties,
    pub name: String,
    pub description: Option<String>,
    pub report_types: Vec<String>,
    pub published: Option<DateTime<Utc>>,
    pub object_refs: Vec<String>,
}

impl StixType for Report {
    const TYPE: &'static str = "report";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE)
            && has_text(&self.name)
            && self.published.is_some()
            && vocabulary_valid(&self.report_types)
            && !self.object_refs.is_empty()
            && refs_valid(&self.object_refs)
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        self.common.sanitize();
        sanitized_required(&mut self.name)?;
        sanitize_opt(&mut self.description);
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreatActor {
    #[serde(flatten)]
    pub common: CommonProperties,
    pub name: String,
    pub description: Option<String>,
    pub threat_actor_types: Vec<String>,
    pub aliases: Vec<String>,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub roles: Vec<String>,
    pub goals: Vec<String>,
    pub sophistication: Option<String>,
    pub resource_level: Option<String>,
    pub primary_motivation: Option<String>,
    pub secondary_motivations: Vec<String>,
    pub personal_motivations: Vec<String>,
}

impl StixType for ThreatActor {
    const TYPE: &'static str = "threat-actor";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE)
            && has_text(&self.name)
            && vocabulary_valid(&self.threat_actor_types)
            && vocabulary_valid(&self.roles)
            && ordered(self.first_seen, self.last_seen)
            && opt_vocabulary(&self.sophistication)
            && opt_vocabulary(&self.resource_level)
            && opt_vocabulary(&self.primary_motivation)
            && vocabulary_valid(&self.secondary_motivations)
            && vocabulary_valid(&self.personal_motivations)
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        self.common.sanitize();
        sanitized_required(&mut self.name)?;
        sanitize_opt(&mut self.description);
        sanitize_list(&mut self.aliases);
        sanitize_list(&mut self.goals);
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tool {
    #[serde(flatten)]
    pub common: CommonProperties,
    pub name: String,
    pub description: Option<String>,
    pub tool_types: Vec<String>,
    pub aliases: Vec<String>,
    pub kill_chain_phases: Vec<KillChainPhase>,
    pub tool_version: Option<String>,
}

impl StixType for Tool {
    const TYPE: &'static str = "tool";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE)
            && has_text(&self.name)
            && vocabulary_valid(&self.tool_types)
            && kill_chain_valid(&self.kill_chain_phases)
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        self.common.sanitize();
        sanitized_required(&mut self.name)?;
        sanitize_opt(&mut self.description);
        sanitize_list(&mut self.aliases);
        sanitize_kill_chain(&mut self.kill_chain_phases);
        sanitize_opt(&mut self.tool_version);
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Vulnerability {
    #[serde(flatten)]
    pub common: CommonProperties,
    pub name: String,
    pub description: Option<String>,
}

impl StixType for Vulnerability {
    const TYPE: &'static str = "vulnerability";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE) && has_text(&self.name)
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        self.common.sanitize();
        sanitized_required(&mut self.name)?;
        sanitize_opt(&mut self.description);
        Some(self)
    }
}
