//! Envelope - API モジュールから届くリクエストの外側
//!
//! - `ModuleRequest`: トランスポートが運ぶ生バイト列 + クライアント情報
//! - `RequestEnvelope`: 生バイト列をデコードした共通フィールド
//!
//! `request_details` は section ごとに形が違うので `RawValue` のまま保持し、
//! 各処理パスで改めてデコードします。

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use super::errors::DecodeError;
use super::section::Section;

/// ModuleRequest は API モジュールがコアに渡すメッセージ
#[derive(Debug, Clone)]
pub struct ModuleRequest {
    /// Name of the module that produced the request (stored as task generator).
    pub module_generator: String,
    pub client_id: String,
    pub client_name: String,
    /// Raw JSON document received from the client.
    pub data: Vec<u8>,
}

impl ModuleRequest {
    pub fn new(
        module_generator: impl Into<String>,
        client_id: impl Into<String>,
        client_name: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            module_generator: module_generator.into(),
            client_id: client_id.into(),
            client_name: client_name.into(),
            data: data.into(),
        }
    }
}

/// RequestEnvelope はリクエストの共通フィールド
#[derive(Debug, Deserialize, Serialize)]
pub struct RequestEnvelope {
    #[serde(default = "unspecified_section")]
    pub section: Section,
    #[serde(default)]
    pub task_id: String,
    #[serde(default)]
    pub user_name_generated_task: Option<String>,
    #[serde(default)]
    pub request_details: Option<Box<RawValue>>,
}

fn unspecified_section() -> Section {
    Section::Unspecified
}

impl RequestEnvelope {
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        serde_json::from_slice(data).map_err(DecodeError::Envelope)
    }

    /// 詳細部分の生 JSON（欠けている場合は DecodeError）
    pub fn details(&self) -> Result<&str, DecodeError> {
        self.request_details
            .as_deref()
            .map(RawValue::get)
            .ok_or(DecodeError::MissingDetails)
    }
}
