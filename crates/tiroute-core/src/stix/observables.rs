//! STIX Cyber-observable Objects (SCO).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{
    ObservableCommon, has_text, hashes_valid, is_ref_to, opt_ref_to, ordered, refs_valid,
    sanitized_required,
};
use super::object::StixType;
use crate::validation::rules;
use crate::validation::sanitize::{sanitize_list, sanitize_opt};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Artifact {
    #[serde(flatten)]
    pub common: ObservableCommon,
    pub mime_type: Option<String>,
    pub payload_bin: Option<String>,
    pub url: Option<String>,
    pub hashes: BTreeMap<String, String>,
    pub encryption_algorithm: Option<String>,
    pub decryption_key: Option<String>,
}

impl StixType for Artifact {
    const TYPE: &'static str = "artifact";

    /// payload_bin and url are mutually exclusive; url needs hashes.
    fn check_type_fields(&self) -> bool {
        let content_ok = match (&self.payload_bin, &self.url) {
            (Some(_), Some(_)) => false,
            (None, Some(url)) => rules::is_url(url) && !self.hashes.is_empty(),
            _ => true,
        };
        self.common.check(Self::TYPE) && content_ok && hashes_valid(&self.hashes)
    }

    fn sanitize_struct(self) -> Option<Self> {
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutonomousSystem {
    #[serde(flatten)]
    pub common: ObservableCommon,
    pub number: u32,
    pub name: Option<String>,
    pub rir: Option<String>,
}

impl StixType for AutonomousSystem {
    const TYPE: &'static str = "autonomous-system";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE) && self.number > 0
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        sanitize_opt(&mut self.name);
        sanitize_opt(&mut self.rir);
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Directory {
    #[serde(flatten)]
    pub common: ObservableCommon,
    pub path: String,
    pub path_enc: Option<String>,
    pub ctime: Option<DateTime<Utc>>,
    pub mtime: Option<DateTime<Utc>>,
    pub atime: Option<DateTime<Utc>>,
    pub contains_refs: Vec<String>,
}

impl StixType for Directory {
    const TYPE: &'static str = "directory";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE)
            && has_text(&self.path)
            && self
                .contains_refs
                .iter()
                .all(|r| is_ref_to(r, &["file", "directory"]))
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        sanitized_required(&mut self.path)?;
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainName {
    #[serde(flatten)]
    pub common: ObservableCommon,
    pub value: String,
    pub resolves_to_refs: Vec<String>,
}

impl StixType for DomainName {
    const TYPE: &'static str = "domain-name";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE)
            && rules::is_dns_name(&self.value)
            && self
                .resolves_to_refs
                .iter()
                .all(|r| is_ref_to(r, &["ipv4-addr", "ipv6-addr", "domain-name"]))
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        sanitized_required(&mut self.value)?;
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailAddr {
    #[serde(flatten)]
    pub common: ObservableCommon,
    pub value: String,
    pub display_name: Option<String>,
    pub belongs_to_ref: Option<String>,
}

impl StixType for EmailAddr {
    const TYPE: &'static str = "email-addr";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE)
            && rules::is_email(&self.value)
            && opt_ref_to(&self.belongs_to_ref, &["user-account"])
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        sanitized_required(&mut self.value)?;
        sanitize_opt(&mut self.display_name);
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailMessage {
    #[serde(flatten)]
    pub common: ObservableCommon,
    pub is_multipart: bool,
    pub date: Option<DateTime<Utc>>,
    pub content_type: Option<String>,
    pub from_ref: Option<String>,
    pub sender_ref: Option<String>,
    pub to_refs: Vec<String>,
    pub cc_refs: Vec<String>,
    pub bcc_refs: Vec<String>,
    pub message_id: Option<String>,
    pub subject: Option<String>,
    pub received_lines: Vec<String>,
    pub additional_header_fields: BTreeMap<String, serde_json::Value>,
    pub body: Option<String>,
    pub raw_email_ref: Option<String>,
}

impl StixType for EmailMessage {
    const TYPE: &'static str = "email-message";

    fn check_type_fields(&self) -> bool {
        let addr = ["email-addr"];
        let addresses_ok = opt_ref_to(&self.from_ref, &addr)
            && opt_ref_to(&self.sender_ref, &addr)
            && [&self.to_refs, &self.cc_refs, &self.bcc_refs]
                .into_iter()
                .flatten()
                .all(|r| is_ref_to(r, &addr));
        self.common.check(Self::TYPE)
            && addresses_ok
            && opt_ref_to(&self.raw_email_ref, &["artifact"])
            && (self.is_multipart || self.body.is_some() || self.subject.is_some()
                || self.from_ref.is_some())
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        sanitize_opt(&mut self.subject);
        sanitize_opt(&mut self.body);
        sanitize_list(&mut self.received_lines);
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct File {
    #[serde(flatten)]
    pub common: ObservableCommon,
    pub hashes: BTreeMap<String, String>,
    pub size: Option<u64>,
    pub name: Option<String>,
    pub name_enc: Option<String>,
    pub magic_number_hex: Option<String>,
    pub mime_type: Option<String>,
    pub ctime: Option<DateTime<Utc>>,
    pub mtime: Option<DateTime<Utc>>,
    pub atime: Option<DateTime<Utc>>,
    pub parent_directory_ref: Option<String>,
    pub contains_refs: Vec<String>,
    pub content_ref: Option<String>,
}

impl StixType for File {
    const TYPE: &'static str = "file";

    /// hashes or name must identify the file.
    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE)
            && (!self.hashes.is_empty() || self.name.as_deref().is_some_and(has_text))
            && hashes_valid(&self.hashes)
            && self.magic_number_hex.as_deref().is_none_or(rules::is_hex)
            && opt_ref_to(&self.parent_directory_ref, &["directory"])
            && opt_ref_to(&self.content_ref, &["artifact"])
            && refs_valid(&self.contains_refs)
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        sanitize_opt(&mut self.name);
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Ipv4Addr {
    #[serde(flatten)]
    pub common: ObservableCommon,
    pub value: String,
    pub resolves_to_refs: Vec<String>,
    pub belongs_to_refs: Vec<String>,
}

impl StixType for Ipv4Addr {
    const TYPE: &'static str = "ipv4-addr";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE)
            && (rules::is_ipv4_addr(&self.value) || rules::is_ipv4_network(&self.value))
            && self
                .resolves_to_refs
                .iter()
                .all(|r| is_ref_to(r, &["mac-addr"]))
            && self
                .belongs_to_refs
                .iter()
                .all(|r| is_ref_to(r, &["autonomous-system"]))
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        sanitized_required(&mut self.value)?;
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Ipv6Addr {
    #[serde(flatten)]
    pub common: ObservableCommon,
    pub value: String,
    pub resolves_to_refs: Vec<String>,
    pub belongs_to_refs: Vec<String>,
}

impl StixType for Ipv6Addr {
    const TYPE: &'static str = "ipv6-addr";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE)
            && rules::is_ipv6_addr(&self.value)
            && self
                .resolves_to_refs
                .iter()
                .all(|r| is_ref_to(r, &["mac-addr"]))
            && self
                .belongs_to_refs
                .iter()
                .all(|r| is_ref_to(r, &["autonomous-system"]))
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        sanitized_required(&mut self.value)?;
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MacAddr {
    #[serde(flatten)]
    pub common: ObservableCommon,
    pub value: String,
}

impl StixType for MacAddr {
    const TYPE: &'static str = "mac-addr";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE) && rules::is_mac_addr(&self.value)
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        sanitized_required(&mut self.value)?;
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Mutex {
    #[serde(flatten)]
    pub common: ObservableCommon,
    pub name: String,
}

impl StixType for Mutex {
    const TYPE: &'static str = "mutex";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE) && has_text(&self.name)
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        sanitized_required(&mut self.name)?;
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkTraffic {
    #[serde(flatten)]
    pub common: ObservableCommon,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub src_ref: Option<String>,
    pub dst_ref: Option<String>,
    pub src_port: Option<u16>,
    pub dst_port: Option<u16>,
    pub protocols: Vec<String>,
    pub src_byte_count: Option<u64>,
    pub dst_byte_count: Option<u64>,
    pub src_packets: Option<u64>,
    pub dst_packets: Option<u64>,
    pub encapsulates_refs: Vec<String>,
    pub encapsulated_by_ref: Option<String>,
}

impl StixType for NetworkTraffic {
    const TYPE: &'static str = "network-traffic";

    fn check_type_fields(&self) -> bool {
        let endpoint = ["ipv4-addr", "ipv6-addr", "mac-addr", "domain-name"];
        self.common.check(Self::TYPE)
            && (self.src_ref.is_some() || self.dst_ref.is_some())
            && !self.protocols.is_empty()
            && opt_ref_to(&self.src_ref, &endpoint)
            && opt_ref_to(&self.dst_ref, &endpoint)
            && ordered(self.start, self.end)
            && !(self.is_active && self.end.is_some())
            && self
                .encapsulates_refs
                .iter()
                .all(|r| is_ref_to(r, &["network-traffic"]))
            && opt_ref_to(&self.encapsulated_by_ref, &["network-traffic"])
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        sanitize_list(&mut self.protocols);
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Process {
    #[serde(flatten)]
    pub common: ObservableCommon,
    pub is_hidden: bool,
    pub pid: Option<u32>,
    pub created_time: Option<DateTime<Utc>>,
    pub cwd: Option<String>,
    pub command_line: Option<String>,
    pub environment_variables: BTreeMap<String, String>,
    pub opened_connection_refs: Vec<String>,
    pub creator_user_ref: Option<String>,
    pub image_ref: Option<String>,
    pub parent_ref: Option<String>,
    pub child_refs: Vec<String>,
}

impl StixType for Process {
    const TYPE: &'static str = "process";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE)
            && self
                .opened_connection_refs
                .iter()
                .all(|r| is_ref_to(r, &["network-traffic"]))
            && opt_ref_to(&self.creator_user_ref, &["user-account"])
            && opt_ref_to(&self.image_ref, &["file"])
            && opt_ref_to(&self.parent_ref, &["process"])
            && self.child_refs.iter().all(|r| is_ref_to(r, &["process"]))
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        sanitize_opt(&mut self.cwd);
        sanitize_opt(&mut self.command_line);
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Software {
    #[serde(flatten)]
    pub common: ObservableCommon,
    pub name: String,
    pub cpe: Option<String>,
    pub swid: Option<String>,
    pub languages: Vec<String>,
    pub vendor: Option<String>,
    pub version: Option<String>,
}

impl StixType for Software {
    const TYPE: &'static str = "software";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE)
            && has_text(&self.name)
            && self
                .cpe
                .as_deref()
                .is_none_or(|cpe| cpe.starts_with("cpe:"))
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        sanitized_required(&mut self.name)?;
        sanitize_opt(&mut self.vendor);
        sanitize_opt(&mut self.version);
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Url {
    #[serde(flatten)]
    pub common: ObservableCommon,
    pub value: String,
}

impl StixType for Url {
    const TYPE: &'static str = "url";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE) && rules::is_url(&self.value)
    }

    /// URLs are not escaped; only blank values are dropped.
    fn sanitize_struct(mut self) -> Option<Self> {
        self.value = self.value.trim().to_string();
        (!self.value.is_empty()).then_some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserAccount {
    #[serde(flatten)]
    pub common: ObservableCommon,
    pub user_id: Option<String>,
    pub credential: Option<String>,
    pub account_login: Option<String>,
    pub account_type: Option<String>,
    pub display_name: Option<String>,
    pub is_service_account: bool,
    pub is_privileged: bool,
    pub can_escalate_privs: bool,
    pub is_disabled: bool,
    pub account_created: Option<DateTime<Utc>>,
    pub account_expires: Option<DateTime<Utc>>,
    pub credential_last_changed: Option<DateTime<Utc>>,
    pub account_first_login: Option<DateTime<Utc>>,
    pub account_last_login: Option<DateTime<Utc>>,
}

impl StixType for UserAccount {
    const TYPE: &'static str = "user-account";

    fn check_type_fields(&self) -> bool {
        self.common.check(Self::TYPE)
            && (self.user_id.is_some() || self.account_login.is_some())
            && ordered(self.account_created, self.account_expires)
            && ordered(self.account_first_login, self.account_last_login)
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        sanitize_opt(&mut self.user_id);
        sanitize_opt(&mut self.account_login);
        sanitize_opt(&mut self.display_name);
        Some(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryValue {
    pub name: String,
    pub data: Option<String>,
    pub data_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowsRegistryKey {
    #[serde(flatten)]
    pub common: ObservableCommon,
    pub key: String,
    pub values: Vec<RegistryValue>,
    pub modified_time: Option<DateTime<Utc>>,
    pub creator_user_ref: Option<String>,
    pub number_of_subkeys: Option<u32>,
}

impl StixType for WindowsRegistryKey {
    const TYPE: &'static str = "windows-registry-key";

    fn check_type_fields(&self) -> bool {
        const HIVES: [&str; 7] = [
            "HKEY_LOCAL_MACHINE",
            "HKEY_CURRENT_USER",
            "HKEY_CLASSES_ROOT",
            "HKEY_USERS",
            "HKEY_CURRENT_CONFIG",
            "HKEY_PERFORMANCE_DATA",
            "HKEY_DYN_DATA",
        ];
        let hive = self.key.split('\\').next().unwrap_or_default();
        self.common.check(Self::TYPE)
            && HIVES.contains(&hive.to_ascii_uppercase().as_str())
            && opt_ref_to(&self.creator_user_ref, &["user-account"])
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        sanitized_required(&mut self.key)?;
        for value in &mut self.values {
            sanitize_opt(&mut value.data);
        }
        Some(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct X509Certificate {
    #[serde(flatten)]
    pub common: ObservableCommon,
    pub is_self_signed: bool,
    pub hashes: BTreeMap<String, String>,
    pub version: Option<String>,
    pub serial_number: Option<String>,
    pub signature_algorithm: Option<String>,
    pub issuer: Option<String>,
    pub validity_not_before: Option<DateTime<Utc>>,
    pub validity_not_after: Option<DateTime<Utc>>,
    pub subject: Option<String>,
    pub subject_public_key_algorithm: Option<String>,
}

impl StixType for X509Certificate {
    const TYPE: &'static str = "x509-certificate";

    fn check_type_fields(&self) -> bool {
        let identified = !self.hashes.is_empty()
            || self.serial_number.is_some()
            || self.subject.is_some()
            || self.issuer.is_some();
        self.common.check(Self::TYPE)
            && identified
            && hashes_valid(&self.hashes)
            && ordered(self.validity_not_before, self.validity_not_after)
    }

    fn sanitize_struct(mut self) -> Option<Self> {
        sanitize_opt(&mut self.issuer);
        sanitize_opt(&mut self.subject);
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stix::samples;
    use rstest::rstest;
    use serde_json::json;

    fn decode<T: StixType>(value: serde_json::Value) -> T {
        serde_json::from_value(value).unwrap()
    }

    fn patched<T: StixType>(data_type: &str, patch: serde_json::Value) -> T {
        let mut value = samples::sample(data_type);
        samples::merge(&mut value, patch);
        decode(value)
    }

    #[test]
    fn every_sample_observable_is_valid() {
        assert!(decode::<Artifact>(samples::sample("artifact")).check_type_fields());
        assert!(
            decode::<AutonomousSystem>(samples::sample("autonomous-system")).check_type_fields()
        );
        assert!(decode::<Directory>(samples::sample("directory")).check_type_fields());
        assert!(decode::<DomainName>(samples::sample("domain-name")).check_type_fields());
        assert!(decode::<EmailAddr>(samples::sample("email-addr")).check_type_fields());
        assert!(decode::<EmailMessage>(samples::sample("email-message")).check_type_fields());
        assert!(decode::<File>(samples::sample("file")).check_type_fields());
        assert!(decode::<Ipv4Addr>(samples::sample("ipv4-addr")).check_type_fields());
        assert!(decode::<Ipv6Addr>(samples::sample("ipv6-addr")).check_type_fields());
        assert!(decode::<MacAddr>(samples::sample("mac-addr")).check_type_fields());
        assert!(decode::<Mutex>(samples::sample("mutex")).check_type_fields());
        assert!(decode::<NetworkTraffic>(samples::sample("network-traffic")).check_type_fields());
        assert!(decode::<Process>(samples::sample("process")).check_type_fields());
        assert!(decode::<Software>(samples::sample("software")).check_type_fields());
        assert!(decode::<Url>(samples::sample("url")).check_type_fields());
        assert!(decode::<UserAccount>(samples::sample("user-account")).check_type_fields());
        assert!(
            decode::<WindowsRegistryKey>(samples::sample("windows-registry-key"))
                .check_type_fields()
        );
        assert!(decode::<X509Certificate>(samples::sample("x509-certificate")).check_type_fields());
    }

    #[rstest]
    #[case("10.0.0.256")]
    #[case("example.com")]
    #[case("10.0.0.0/33")]
    fn invalid_ipv4_value(#[case] value: &str) {
        assert!(!patched::<Ipv4Addr>("ipv4-addr", json!({ "value": value })).check_type_fields());
    }

    #[test]
    fn ipv4_network_value_is_accepted() {
        let network = patched::<Ipv4Addr>("ipv4-addr", json!({"value": "10.0.0.0/8"}));
        assert!(network.check_type_fields());
    }

    #[rstest]
    #[case("file", json!({"hashes": {"MD5": "xyz"}}))]
    #[case("artifact", json!({"url": "https://example.com/a.bin", "hashes": {}}))]
    #[case("network-traffic", json!({"protocols": []}))]
    #[case("windows-registry-key", json!({"key": "HKEY_NOWHERE\\Software"}))]
    #[case("email-addr", json!({"value": "not-an-address"}))]
    fn broken_observables_fail(#[case] data_type: &str, #[case] patch: serde_json::Value) {
        let ok = match data_type {
            "file" => patched::<File>(data_type, patch).check_type_fields(),
            "artifact" => patched::<Artifact>(data_type, patch).check_type_fields(),
            "network-traffic" => patched::<NetworkTraffic>(data_type, patch).check_type_fields(),
            "windows-registry-key" => {
                patched::<WindowsRegistryKey>(data_type, patch).check_type_fields()
            }
            "email-addr" => patched::<EmailAddr>(data_type, patch).check_type_fields(),
            other => unreachable!("{other}"),
        };
        assert!(!ok);
    }

    #[test]
    fn blank_value_drops_observable() {
        assert!(patched::<DomainName>("domain-name", json!({"value": " "}))
            .sanitize_struct()
            .is_none());
        assert!(patched::<Url>("url", json!({"value": "\t"})).sanitize_struct().is_none());
    }

    #[test]
    fn url_is_not_escaped() {
        let url = patched::<Url>("url", json!({"value": " https://example.com/?a=1&b=2 "}))
            .sanitize_struct()
            .unwrap();
        assert_eq!(url.value, "https://example.com/?a=1&b=2");
    }
}
