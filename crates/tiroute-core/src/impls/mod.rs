//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryTaskStore**: プロセス内のタスクレジストリ

pub mod inmem_task_store;

pub use self::inmem_task_store::InMemoryTaskStore;
