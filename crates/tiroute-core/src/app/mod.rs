//! App - アプリケーション層
//!
//! ports と bus を組み合わせてルーティング層を組み立てます。
//!
//! # 主要コンポーネント
//! - **CoreBuilder / Core**: 構築とワイヤリング、実行時コンテキスト
//! - **RequestDispatcher**: section ごとのデコード・検証・登録・転送
//! - **CoreLoop**: `Core::run`（リクエスト受信とモジュール報告の反映）

pub mod builder;
pub mod core_loop;
pub mod dispatcher;

pub use self::builder::{BuildError, Core, CoreBuilder};
pub use self::core_loop::{RunSummary, apply_report};
pub use self::dispatcher::{DispatchOutcome, RequestDispatcher};
