//! Value rules shared by STIX object checks and search validation.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static DNS_LABELS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_][a-zA-Z0-9_-]{0,62}(\.[a-zA-Z0-9_][a-zA-Z0-9_-]{0,62})*\.?$")
        .expect("dns regex")
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email regex")
});

static MAC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9a-f]{2}:){5}[0-9a-f]{2}$").expect("mac regex"));

static HEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]+$").expect("hex regex"));

const URL_SCHEMES: &[&str] = &["http", "https", "ftp", "ftps", "ws", "wss"];

pub fn is_dns_name(value: &str) -> bool {
    if value.is_empty() || value.len() > 253 || is_ipv4_addr(value) {
        return false;
    }
    DNS_LABELS.is_match(value)
}

pub fn is_email(value: &str) -> bool {
    value.len() <= 254 && EMAIL.is_match(value)
}

pub fn is_ipv4_addr(value: &str) -> bool {
    value.parse::<Ipv4Addr>().is_ok()
}

/// IPv4 network in CIDR notation, e.g. `10.0.0.0/8`.
pub fn is_ipv4_network(value: &str) -> bool {
    let Some((addr, prefix)) = value.split_once('/') else {
        return false;
    };
    is_ipv4_addr(addr) && parse_prefix(prefix).is_some_and(|p| p <= 32)
}

/// IPv6 literal in full or compressed form, optionally with a `/prefix`.
///
/// Zone identifiers (`fe80::1%eth0`) are rejected: they are only meaningful on
/// the host that produced them.
pub fn is_ipv6_addr(value: &str) -> bool {
    if value.contains('%') {
        return false;
    }
    match value.split_once('/') {
        Some((addr, prefix)) => {
            addr.parse::<Ipv6Addr>().is_ok() && parse_prefix(prefix).is_some_and(|p| p <= 128)
        }
        None => value.parse::<Ipv6Addr>().is_ok(),
    }
}

pub fn is_mac_addr(value: &str) -> bool {
    MAC.is_match(value)
}

pub fn is_hex(value: &str) -> bool {
    HEX.is_match(value)
}

/// Absolute URL with a network scheme and a host. A value without a scheme
/// (`example.com/path`) is read as `http://`.
pub fn is_url(value: &str) -> bool {
    if value.is_empty() || value.len() > 2083 || value.contains(char::is_whitespace) {
        return false;
    }

    let parsed = match Url::parse(value) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            match Url::parse(&format!("http://{value}")) {
                Ok(url) => url,
                Err(_) => return false,
            }
        }
        Err(_) => return false,
    };

    URL_SCHEMES.contains(&parsed.scheme()) && parsed.host_str().is_some_and(|h| !h.is_empty())
}

fn parse_prefix(prefix: &str) -> Option<u8> {
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}
