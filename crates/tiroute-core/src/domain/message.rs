//! Bus messages - モジュール間でやり取りするメッセージ
//!
//! RoutedMessage は task_id のみを運びます（payload はレジストリから引く）。

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::TaskId;
use super::section::Section;

pub const MODULE_CORE: &str = "module core application";
pub const MODULE_DATABASE: &str = "module database interaction";
pub const MODULE_API: &str = "module api request processing";

/// RoutedMessage はコアから下流モジュールへの受け渡し
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutedMessage {
    pub generator_module: String,
    pub receiver_module: String,
    pub section: Section,
    pub app_task_id: TaskId,
}

impl RoutedMessage {
    pub fn to_database(section: Section, app_task_id: TaskId) -> Self {
        Self {
            generator_module: MODULE_CORE.to_string(),
            receiver_module: MODULE_DATABASE.to_string(),
            section,
            app_task_id,
        }
    }
}

/// ModuleReport は下流モジュールがタスクの結果をコアへ返すメッセージ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleReport {
    pub generator_module: String,
    pub app_task_id: TaskId,
    /// New free-form task status, e.g. "completed".
    pub status: String,
    /// The task is finished and can be removed from the registry.
    #[serde(default)]
    pub removal_required: bool,
    /// Optional message to deliver to the originating client.
    #[serde(default)]
    pub notification: Option<ReportNotification>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportNotification {
    pub notification_type: NotificationType,
    pub final_result: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Danger,
    Warning,
    Success,
    Info,
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Danger => "danger",
            Self::Warning => "warning",
            Self::Success => "success",
            Self::Info => "info",
        };
        f.write_str(s)
    }
}

/// UserMessage はクライアントに表示する構造化テキスト
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMessage {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub section: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub task_type: String,
    pub final_result: String,
    pub message: String,
}

impl UserMessage {
    pub const TASK_REJECTED: &'static str = "task rejected";

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            final_result: Self::TASK_REJECTED.to_string(),
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn for_section(mut self, section: &Section) -> Self {
        self.section = section.description().to_string();
        self.task_type = section.task_type().to_string();
        self
    }
}

/// Notification は API モジュール経由でクライアントに届ける通知
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<Section>,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub message: UserMessage,
}

impl Notification {
    pub fn danger(client_id: impl Into<String>, message: UserMessage) -> Self {
        Self {
            client_id: client_id.into(),
            task_id: None,
            section: None,
            notification_type: NotificationType::Danger,
            message,
        }
    }

    pub fn with_task(mut self, task_id: impl Into<String>, section: Section) -> Self {
        self.task_id = Some(task_id.into());
        self.section = Some(section);
        self
    }
}
