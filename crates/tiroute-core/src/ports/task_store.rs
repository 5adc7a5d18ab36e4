//! TaskStore port - 処理中リクエストの正本（source of truth）
//!
//! プロセス全体で 1 つのインスタンスを共有し、全てのリクエスト処理から
//! 同時に呼ばれます。永続化はしません（プロセスの寿命だけ有効な索引）。

use async_trait::async_trait;

use crate::domain::{NewTask, RegistryError, TaskId, TaskRecord};

/// TaskStore はタスクの登録・参照・更新・削除を提供
///
/// # 設計原則
/// - ID は登録時に生成し、削除後も再利用しない
/// - 更新操作は必ず modification timestamp を進める
/// - 明示的な削除以外でレコードが消えることはない（TTL なし）
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Register a task and return its freshly generated identifier.
    async fn add_new_task(&self, task: NewTask) -> Result<TaskId, RegistryError>;

    async fn get_task_by_id(&self, task_id: TaskId) -> Result<(TaskId, TaskRecord), RegistryError>;

    /// Every stored task of the client (order not guaranteed, empty if none).
    async fn get_tasks_by_client_id(&self, client_id: &str) -> Vec<TaskId>;

    async fn change_task_status(&self, task_id: TaskId, status: &str) -> Result<(), RegistryError>;

    /// Idempotent: sets the flag to `true`.
    async fn change_removal_required_parameter(&self, task_id: TaskId)
    -> Result<(), RegistryError>;

    async fn change_date_task_modification(&self, task_id: TaskId) -> Result<(), RegistryError>;

    /// Absent ids are a silent no-op.
    async fn deleting_task_by_id(&self, task_id: TaskId);
}
