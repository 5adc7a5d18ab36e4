//! Ports - 抽象化レイヤー
//!
//! 外部（または差し替え可能な）依存へのインターフェースを定義します。
//! - TaskStore: 処理中タスクのレジストリ
//! - Clock / IdGenerator: テストで決定的にするための抽象化

pub mod clock;
pub mod id_generator;
pub mod task_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::task_store::TaskStore;
