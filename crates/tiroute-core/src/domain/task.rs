//! Task record: one entry per accepted request.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use super::section::Section;
use crate::stix::ElementStixObject;
use crate::validation::reference_book::ReferenceBookRequest;
use crate::validation::search::SearchRequest;

/// Validated payload of a task.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TaskParameters {
    StixObjects(Vec<ElementStixObject>),
    Search(SearchRequest),
    ReferenceBook(ReferenceBookRequest),
}

/// Input of `TaskStore::add_new_task`.
///
/// The registry fills in status, removal flag and timestamps itself.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub task_generator: String,
    pub client_id: String,
    pub client_name: String,
    pub client_task_id: String,
    pub user_name: Option<String>,
    pub section: Section,
    pub command: String,
    pub parameters: TaskParameters,
}

/// Metadata + parameters of a task held by the registry.
///
/// Design:
/// - The registry is the single source of truth for in-flight request state.
/// - Bus messages carry only the `TaskId`.
#[derive(Debug, Clone, Serialize)]
pub struct TaskRecord {
    pub task_generator: String,
    pub client_id: String,
    pub client_name: String,
    pub client_task_id: String,
    pub user_name: Option<String>,
    pub section: Section,
    pub command: String,
    pub parameters: TaskParameters,
    /// Free-form status ("" right after registration, then e.g. "in progress").
    pub status: String,
    pub removal_required: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl TaskRecord {
    pub fn new(task: NewTask, now: DateTime<Utc>) -> Self {
        Self {
            task_generator: task.task_generator,
            client_id: task.client_id,
            client_name: task.client_name,
            client_task_id: task.client_task_id,
            user_name: task.user_name,
            section: task.section,
            command: task.command,
            parameters: task.parameters,
            status: String::new(),
            removal_required: false,
            created_at: now,
            modified_at: now,
        }
    }

    /// Refresh the modification timestamp.
    ///
    /// The new value always differs from the previous one, even when the clock
    /// has not advanced since the last mutation.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        let floor = self.modified_at + TimeDelta::microseconds(1);
        self.modified_at = now.max(floor);
    }

    pub fn set_status(&mut self, status: impl Into<String>, now: DateTime<Utc>) {
        self.status = status.into();
        self.touch(now);
    }

    pub fn require_removal(&mut self, now: DateTime<Utc>) {
        self.removal_required = true;
        self.touch(now);
    }
}
