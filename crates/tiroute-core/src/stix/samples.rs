//! Valid sample of every built-in STIX type, for tests.

use serde_json::{Value, json};

const UUID: &str = "8e2e2d2b-17d4-4cbf-938f-98ee46b3cd3f";

pub const ALL_TYPES: [&str; 38] = [
    "attack-pattern",
    "campaign",
    "course-of-action",
    "grouping",
    "identity",
    "indicator",
    "infrastructure",
    "intrusion-set",
    "location",
    "malware",
    "malware-analysis",
    "note",
    "observed-data",
    "opinion",
    "report",
    "threat-actor",
    "tool",
    "vulnerability",
    "relationship",
    "sighting",
    "artifact",
    "autonomous-system",
    "directory",
    "domain-name",
    "email-addr",
    "email-message",
    "file",
    "ipv4-addr",
    "ipv6-addr",
    "mac-addr",
    "mutex",
    "network-traffic",
    "process",
    "software",
    "url",
    "user-account",
    "windows-registry-key",
    "x509-certificate",
];

pub fn stix_ref(data_type: &str) -> String {
    format!("{data_type}--{UUID}")
}

fn sdo(data_type: &str, fields: Value) -> Value {
    let mut value = json!({
        "type": data_type,
        "spec_version": "2.1",
        "id": stix_ref(data_type),
        "created": "2024-01-01T00:00:00Z",
        "modified": "2024-01-02T00:00:00Z",
        "created_by_ref": stix_ref("identity"),
    });
    merge(&mut value, fields);
    value
}

fn sco(data_type: &str, fields: Value) -> Value {
    let mut value = json!({ "type": data_type, "id": stix_ref(data_type) });
    merge(&mut value, fields);
    value
}

/// Shallow merge; `null` values overwrite.
pub fn merge(target: &mut Value, patch: Value) {
    if let (Some(target), Value::Object(patch)) = (target.as_object_mut(), patch) {
        target.extend(patch);
    }
}

pub fn sample(data_type: &str) -> Value {
    let kill_chain = json!([{
        "kill_chain_name": "lockheed-martin-cyber-kill-chain",
        "phase_name": "delivery"
    }]);
    match data_type {
        "attack-pattern" => sdo(data_type, json!({
            "name": "Spear Phishing",
            "kill_chain_phases": kill_chain
        })),
        "campaign" => sdo(data_type, json!({
            "name": "Green Group Attacks",
            "first_seen": "2023-01-01T00:00:00Z",
            "last_seen": "2023-06-01T00:00:00Z"
        })),
        "course-of-action" => sdo(data_type, json!({"name": "Block port 445"})),
        "grouping" => sdo(data_type, json!({
            "context": "suspicious-activity",
            "object_refs": [stix_ref("indicator")]
        })),
        "identity" => sdo(data_type, json!({
            "name": "ACME Corp",
            "identity_class": "organization",
            "sectors": ["technology"]
        })),
        "indicator" => sdo(data_type, json!({
            "indicator_types": ["malicious-activity"],
            "pattern": "[ipv4-addr:value = '198.51.100.1']",
            "pattern_type": "stix",
            "valid_from": "2024-01-01T00:00:00Z"
        })),
        "infrastructure" => sdo(data_type, json!({
            "name": "Poison Ivy C2",
            "infrastructure_types": ["command-and-control"]
        })),
        "intrusion-set" => sdo(data_type, json!({
            "name": "Bobcat Breakin",
            "primary_motivation": "organizational-gain"
        })),
        "location" => sdo(data_type, json!({"region": "eastern-asia", "country": "jp"})),
        "malware" => sdo(data_type, json!({
            "name": "Poison Ivy",
            "malware_types": ["remote-access-trojan"],
            "is_family": true,
            "kill_chain_phases": kill_chain
        })),
        "malware-analysis" => sdo(data_type, json!({
            "product": "microsoft",
            "result": "malicious",
            "sample_ref": stix_ref("file")
        })),
        "note" => sdo(data_type, json!({
            "abstract": "Tracking",
            "content": "This note indicates the various steps taken.",
            "object_refs": [stix_ref("campaign")]
        })),
        "observed-data" => sdo(data_type, json!({
            "first_observed": "2024-01-01T00:00:00Z",
            "last_observed": "2024-01-01T01:00:00Z",
            "number_observed": 50,
            "object_refs": [stix_ref("ipv4-addr")]
        })),
        "opinion" => sdo(data_type, json!({
            "opinion": "strongly-disagree",
            "object_refs": [stix_ref("relationship")]
        })),
        "report" => sdo(data_type, json!({
            "name": "The Black Vine Cyberespionage Group",
            "report_types": ["campaign"],
            "published": "2024-01-05T00:00:00Z",
            "object_refs": [stix_ref("indicator"), stix_ref("campaign")]
        })),
        "threat-actor" => sdo(data_type, json!({
            "name": "Evil Org",
            "threat_actor_types": ["crime-syndicate"],
            "sophistication": "expert"
        })),
        "tool" => sdo(data_type, json!({"name": "VNC", "tool_types": ["remote-access"]})),
        "vulnerability" => sdo(data_type, json!({"name": "CVE-2016-1234"})),
        "relationship" => sdo(data_type, json!({
            "relationship_type": "indicates",
            "source_ref": stix_ref("indicator"),
            "target_ref": stix_ref("malware")
        })),
        "sighting" => sdo(data_type, json!({
            "sighting_of_ref": stix_ref("indicator"),
            "count": 3,
            "where_sighted_refs": [stix_ref("identity")]
        })),
        "artifact" => sco(data_type, json!({
            "mime_type": "image/jpeg",
            "payload_bin": "VBORw0KGgoAAAANSUhEUgAAADI=="
        })),
        "autonomous-system" => sco(data_type, json!({"number": 15139, "name": "Slime Industries"})),
        "directory" => sco(data_type, json!({"path": "C:\\Windows\\System32"})),
        "domain-name" => sco(data_type, json!({"value": "example.com"})),
        "email-addr" => sco(data_type, json!({
            "value": "john@example.com",
            "display_name": "John Doe"
        })),
        "email-message" => sco(data_type, json!({
            "is_multipart": false,
            "from_ref": stix_ref("email-addr"),
            "to_refs": [stix_ref("email-addr")],
            "subject": "Saw your resume!"
        })),
        "file" => sco(data_type, json!({
            "name": "foo.dll",
            "hashes": {
                "SHA-256": "fe90a7e910cb3a4739bed9180e807e93fa70c90f25a8915476f5e4bfbac681db"
            }
        })),
        "ipv4-addr" => sco(data_type, json!({"value": "198.51.100.3"})),
        "ipv6-addr" => sco(data_type, json!({"value": "2001:0db8::/96"})),
        "mac-addr" => sco(data_type, json!({"value": "d2:fb:49:24:37:18"})),
        "mutex" => sco(data_type, json!({"name": "__CLEANSWEEP__"})),
        "network-traffic" => sco(data_type, json!({
            "src_ref": stix_ref("ipv4-addr"),
            "dst_port": 80,
            "protocols": ["tcp", "http"]
        })),
        "process" => sco(data_type, json!({
            "pid": 1221,
            "command_line": "./gedit-bin --new-window"
        })),
        "software" => sco(data_type, json!({
            "name": "Word",
            "cpe": "cpe:2.3:a:microsoft:word:2000:*:*:*:*:*:*:*",
            "vendor": "Microsoft"
        })),
        "url" => sco(data_type, json!({"value": "https://example.com/research/index.html"})),
        "user-account" => sco(data_type, json!({"user_id": "1001", "account_login": "jdoe"})),
        "windows-registry-key" => sco(data_type, json!({
            "key": "HKEY_LOCAL_MACHINE\\System\\Foo\\Bar",
            "values": [{"name": "Foo", "data": "qwerty", "data_type": "REG_SZ"}]
        })),
        "x509-certificate" => sco(data_type, json!({
            "issuer": "C=ZA, ST=Western Cape, L=Cape Town, O=Thawte Consulting cc",
            "serial_number": "36:f7:d4:32:f4:ab:70:ea:d3:ce:98:6e:ea:99:93:49:32:0a:b7:06"
        })),
        other => panic!("no sample for '{other}'"),
    }
}
