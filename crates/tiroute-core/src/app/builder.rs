//! CoreBuilder - ルーティング層の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - expect_stix_types() で受け付けるべき STIX 型を宣言
//! - build() 時に「期待集合 ⊆ 登録済み集合」をチェック
//! - 設定値も build() 時に検証する

use std::sync::Arc;

use crate::bus::{ModuleEndpoints, RoutingBus};
use crate::config::{ConfigError, CoreConfig};
use crate::impls::InMemoryTaskStore;
use crate::ports::TaskStore;
use crate::stix::StixType;
use crate::stix::registry::{StixRegistry, StixRegistryError};

/// CoreBuilder は Core を構築
///
/// # 使用例
/// ```ignore
/// let (core, endpoints) = CoreBuilder::new(config)
///     .register_stix::<MyExtensionObject>()?
///     .expect_stix_types(&["indicator", "x-my-extension"])
///     .build()?;
/// ```
pub struct CoreBuilder {
    config: CoreConfig,
    store: Option<Arc<dyn TaskStore>>,
    stix: StixRegistry,
    expected_types: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing STIX types: {0:?}. These types were expected but not registered.")]
    MissingStixTypes(Vec<String>),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CoreBuilder {
    /// 組み込みの 38 型を登録済みの状態から始める
    pub fn new(config: CoreConfig) -> Self {
        Self {
            config,
            store: None,
            stix: StixRegistry::with_default_types(),
            expected_types: None,
        }
    }

    /// TaskStore を差し替える（デフォルトは InMemoryTaskStore）
    pub fn with_store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// STIX レジストリを丸ごと差し替える
    pub fn with_stix_registry(mut self, stix: StixRegistry) -> Self {
        self.stix = stix;
        self
    }

    pub fn register_stix<T: StixType>(mut self) -> Result<Self, StixRegistryError> {
        self.stix.register::<T>()?;
        Ok(self)
    }

    pub fn expect_stix_types(mut self, types: &[&str]) -> Self {
        self.expected_types = Some(types.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn build(self) -> Result<(Core, ModuleEndpoints), BuildError> {
        self.config.validate()?;

        if let Some(expected) = &self.expected_types {
            let missing: Vec<String> = expected
                .iter()
                .filter(|t| !self.stix.contains(t))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingStixTypes(missing));
            }
        }

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryTaskStore::new()) as Arc<dyn TaskStore>);
        let (bus, endpoints) = RoutingBus::new(self.config.channel_capacity);

        Ok((
            Core {
                config: self.config,
                store,
                stix: Arc::new(self.stix),
                bus,
            },
            endpoints,
        ))
    }
}

/// Core はルーティング層の実行時コンテキスト
///
/// レジストリ・STIX デコーダ・バスを 1 か所で所有し、`run()` に渡す。
pub struct Core {
    pub(crate) config: CoreConfig,
    pub(crate) store: Arc<dyn TaskStore>,
    pub(crate) stix: Arc<StixRegistry>,
    pub(crate) bus: RoutingBus,
}

impl Core {
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Shared handle to the task registry.
    pub fn store(&self) -> Arc<dyn TaskStore> {
        Arc::clone(&self.store)
    }

    pub fn stix_registry(&self) -> &StixRegistry {
        &self.stix
    }
}
