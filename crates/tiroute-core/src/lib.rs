//! tiroute-core
//!
//! Task orchestration and module routing for threat-intelligence requests.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, section, envelope, task, message, errors）
//! - **ports**: 抽象化レイヤー（TaskStore, Clock, IdGenerator）
//! - **impls**: 実装（InMemoryTaskStore）
//! - **stix**: STIX 2.1 オブジェクトの型・検証・サニタイズ・レジストリ
//! - **validation**: 検索・参照データ要求の検証、共通ルール、サニタイズ
//! - **bus**: コアとモジュールをつなぐ有界チャネル
//! - **app**: CoreBuilder, RequestDispatcher, Core::run
//! - **config**: CoreConfig（ファイル + 環境変数）

pub mod app;
pub mod bus;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod stix;
pub mod validation;
