use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Section はリクエストのカテゴリ（処理パスの選択に使う）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Section {
    /// "handling stix object"
    StixObject,
    /// "handling search requests"
    SearchRequests,
    /// "handling reference book"
    ReferenceBook,
    /// 空文字列
    Unspecified,
    /// 未知のラベル（そのまま保持する）
    Other(String),
}

impl Section {
    pub const STIX_OBJECT: &'static str = "handling stix object";
    pub const SEARCH_REQUESTS: &'static str = "handling search requests";
    pub const REFERENCE_BOOK: &'static str = "handling reference book";

    pub fn from_label(label: &str) -> Self {
        match label {
            Self::STIX_OBJECT => Self::StixObject,
            Self::SEARCH_REQUESTS => Self::SearchRequests,
            Self::REFERENCE_BOOK => Self::ReferenceBook,
            "" => Self::Unspecified,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::StixObject => Self::STIX_OBJECT,
            Self::SearchRequests => Self::SEARCH_REQUESTS,
            Self::ReferenceBook => Self::REFERENCE_BOOK,
            Self::Unspecified => "",
            Self::Other(label) => label,
        }
    }

    /// Human-readable name used in user notifications.
    pub fn description(&self) -> &'static str {
        match self {
            Self::StixObject => "processing of structured data",
            Self::SearchRequests => "processing of a search request",
            Self::ReferenceBook => "processing of reference information",
            Self::Unspecified | Self::Other(_) => "unknown section",
        }
    }

    /// Human-readable task type used in user notifications.
    pub fn task_type(&self) -> &'static str {
        match self {
            Self::StixObject => "adding or updating structured data",
            Self::SearchRequests => "search for structured data",
            Self::ReferenceBook => "performing actions on reference data",
            Self::Unspecified | Self::Other(_) => "unknown task type",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Section {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Section {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}
