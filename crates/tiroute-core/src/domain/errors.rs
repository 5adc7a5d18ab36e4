//! Errors - エラー型と分類
//!
//! パイプラインのエラーは 4 分類 + レジストリの NotFound:
//! - **Decode**: 壊れた JSON / 想定外の形（常に終端、常に通知）
//! - **Validation**: 形は正しいが意味的に不正
//! - **Registration**: レジストリの格納失敗
//! - **Routing**: 下流モジュールへの受け渡し失敗（そのリクエストだけが失敗）

use thiserror::Error;

use super::ids::TaskId;

/// RegistryError はタスクレジストリの操作エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("task '{0}' not found")]
    NotFound(TaskId),

    #[error("task storage fault: {0}")]
    Storage(String),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed request envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("request details are missing")]
    MissingDetails,

    #[error("malformed request details: {0}")]
    Details(#[source] serde_json::Error),

    #[error("STIX element #{index} has no 'type' field")]
    MissingStixType { index: usize },

    #[error("unsupported STIX object type '{0}'")]
    UnknownStixType(String),

    #[error("STIX object of type '{data_type}' cannot be decoded: {source}")]
    StixObject {
        data_type: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DecodeError {
    /// The declared STIX type that caused the failure, when there is one.
    pub fn stix_type(&self) -> Option<&str> {
        match self {
            Self::UnknownStixType(data_type) | Self::StixObject { data_type, .. } => {
                Some(data_type)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("STIX object of type '{data_type}' is invalid")]
    InvalidStixObject { data_type: String },

    #[error("invalid search parameters: {0}")]
    InvalidSearchParameters(String),

    #[error("invalid collection name '{0}'")]
    InvalidCollectionName(String),

    #[error("invalid reference book request: {0}")]
    InvalidReferenceBook(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("channel to '{0}' is closed")]
    Closed(String),

    #[error("handoff to '{module}' timed out after {timeout_ms} ms")]
    Timeout { module: String, timeout_ms: u64 },
}

/// DispatchError はパイプラインの終端エラー
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("task registration failed: {0}")]
    Registration(#[from] RegistryError),

    #[error("routing failed: {0}")]
    Routing(#[from] RoutingError),
}

impl DispatchError {
    /// クライアント向けの短いメッセージ
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Decode(_) => "error decoding the JSON document",
            Self::Validation(ValidationError::InvalidStixObject { .. }) => {
                "an invalid JSON document was received"
            }
            Self::Validation(ValidationError::InvalidSearchParameters(_)) => {
                "invalid search parameters"
            }
            Self::Validation(ValidationError::InvalidCollectionName(_)) => {
                "invalid collection name"
            }
            Self::Validation(ValidationError::InvalidReferenceBook(_)) => {
                "invalid reference book parameters"
            }
            Self::Registration(_) => "unable to save the request parameters in temporary storage",
            Self::Routing(_) => "the request could not be passed on for processing",
        }
    }
}
