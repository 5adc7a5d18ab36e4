//! InMemoryTaskStore - プロセス内のタスクレジストリ
//!
//! # 実装詳細
//! - `HashMap<TaskId, TaskRecord>` が正本
//! - `HashMap<client_id, HashSet<TaskId>>` が副索引
//! - 両方を 1 つの `RwLock` に入れて、索引とレコードを同時に更新する
//!   （読み取りは並行、書き込みは直列）

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::{NewTask, RegistryError, TaskId, TaskRecord};
use crate::ports::{Clock, IdGenerator, SystemClock, TaskStore, UlidGenerator};

#[derive(Default)]
struct TaskStoreState {
    records: HashMap<TaskId, TaskRecord>,
    by_client: HashMap<String, HashSet<TaskId>>,
}

impl TaskStoreState {
    fn record_mut(&mut self, task_id: TaskId) -> Result<&mut TaskRecord, RegistryError> {
        self.records
            .get_mut(&task_id)
            .ok_or(RegistryError::NotFound(task_id))
    }
}

/// In-memory task registry shared by every request handling unit.
pub struct InMemoryTaskStore {
    state: RwLock<TaskStoreState>,
    clock: Arc<dyn Clock>,
    id_gen: Arc<dyn IdGenerator>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let id_gen = Arc::new(UlidGenerator::new(Arc::clone(&clock)));
        Self::with_parts(clock, id_gen)
    }

    pub fn with_parts(clock: Arc<dyn Clock>, id_gen: Arc<dyn IdGenerator>) -> Self {
        Self {
            state: RwLock::new(TaskStoreState::default()),
            clock,
            id_gen,
        }
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.records.is_empty()
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn add_new_task(&self, task: NewTask) -> Result<TaskId, RegistryError> {
        let task_id = self.id_gen.generate_task_id();
        let record = TaskRecord::new(task, self.clock.now());

        let mut state = self.state.write().await;
        if state.records.contains_key(&task_id) {
            return Err(RegistryError::Storage(format!(
                "generated id {task_id} collides with a stored task"
            )));
        }

        state
            .by_client
            .entry(record.client_id.clone())
            .or_default()
            .insert(task_id);
        state.records.insert(task_id, record);
        debug!(%task_id, "task registered");

        Ok(task_id)
    }

    async fn get_task_by_id(&self, task_id: TaskId) -> Result<(TaskId, TaskRecord), RegistryError> {
        let state = self.state.read().await;
        state
            .records
            .get(&task_id)
            .map(|record| (task_id, record.clone()))
            .ok_or(RegistryError::NotFound(task_id))
    }

    async fn get_tasks_by_client_id(&self, client_id: &str) -> Vec<TaskId> {
        let state = self.state.read().await;
        state
            .by_client
            .get(client_id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    async fn change_task_status(&self, task_id: TaskId, status: &str) -> Result<(), RegistryError> {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        state.record_mut(task_id)?.set_status(status, now);
        Ok(())
    }

    async fn change_removal_required_parameter(
        &self,
        task_id: TaskId,
    ) -> Result<(), RegistryError> {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        state.record_mut(task_id)?.require_removal(now);
        Ok(())
    }

    async fn change_date_task_modification(&self, task_id: TaskId) -> Result<(), RegistryError> {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        state.record_mut(task_id)?.touch(now);
        Ok(())
    }

    async fn deleting_task_by_id(&self, task_id: TaskId) {
        let mut state = self.state.write().await;
        let Some(record) = state.records.remove(&task_id) else {
            return;
        };

        if let Some(ids) = state.by_client.get_mut(&record.client_id) {
            ids.remove(&task_id);
            if ids.is_empty() {
                state.by_client.remove(&record.client_id);
            }
        }
        debug!(%task_id, "task deleted");
    }
}
