//! Bus - コアと各モジュールをつなぐチャネル群
//!
//! モジュールごとに一対のチャネルを持つ:
//! - input: コア → モジュール
//! - output: モジュール → コア
//!
//! 全チャネルは有界（容量は設定値、デフォルト 1）。送信は必ずタイムアウト付き。

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::warn;

use crate::config::CoreConfig;
use crate::domain::message::{MODULE_API, MODULE_DATABASE};
use crate::domain::{ModuleReport, ModuleRequest, Notification, RoutedMessage, RoutingError};

/// Core side of a module's channel pair.
#[derive(Debug)]
pub struct ChannelPair<I, O> {
    /// Messages for the module.
    pub input: mpsc::Sender<I>,
    /// Messages from the module.
    pub output: mpsc::Receiver<O>,
}

/// Module side of a channel pair.
#[derive(Debug)]
pub struct ModuleEndpoint<I, O> {
    pub input: mpsc::Receiver<I>,
    pub output: mpsc::Sender<O>,
}

pub fn channel_pair<I, O>(capacity: usize) -> (ChannelPair<I, O>, ModuleEndpoint<I, O>) {
    let (input_tx, input_rx) = mpsc::channel(capacity);
    let (output_tx, output_rx) = mpsc::channel(capacity);
    (
        ChannelPair {
            input: input_tx,
            output: output_rx,
        },
        ModuleEndpoint {
            input: input_rx,
            output: output_tx,
        },
    )
}

/// API module: notifications in, client requests out.
pub type ApiChannels = ChannelPair<Notification, ModuleRequest>;
pub type ApiEndpoint = ModuleEndpoint<Notification, ModuleRequest>;

/// Database module: routed tasks in, reports out.
pub type DatabaseChannels = ChannelPair<RoutedMessage, ModuleReport>;
pub type DatabaseEndpoint = ModuleEndpoint<RoutedMessage, ModuleReport>;

/// Core side of every module's channels.
#[derive(Debug)]
pub struct RoutingBus {
    pub api: ApiChannels,
    pub database: DatabaseChannels,
}

/// Module-side endpoints handed to the module implementations.
#[derive(Debug)]
pub struct ModuleEndpoints {
    pub api: ApiEndpoint,
    pub database: DatabaseEndpoint,
}

impl RoutingBus {
    pub fn new(capacity: usize) -> (Self, ModuleEndpoints) {
        let (api, api_endpoint) = channel_pair(capacity);
        let (database, database_endpoint) = channel_pair(capacity);
        (
            Self { api, database },
            ModuleEndpoints {
                api: api_endpoint,
                database: database_endpoint,
            },
        )
    }

    /// Split into the senders used by dispatch tasks and the receivers
    /// consumed by the core loop.
    pub fn split(
        self,
        config: &CoreConfig,
    ) -> (
        BusHandles,
        mpsc::Receiver<ModuleRequest>,
        mpsc::Receiver<ModuleReport>,
    ) {
        let handles = BusHandles {
            to_api: self.api.input,
            to_database: self.database.input,
            routing_timeout: config.routing_timeout(),
            notification_timeout: config.notification_timeout(),
        };
        (handles, self.api.output, self.database.output)
    }
}

/// Clonable outbound half of the bus.
#[derive(Debug, Clone)]
pub struct BusHandles {
    to_api: mpsc::Sender<Notification>,
    to_database: mpsc::Sender<RoutedMessage>,
    routing_timeout: Duration,
    notification_timeout: Duration,
}

impl BusHandles {
    pub async fn route_to_database(&self, message: RoutedMessage) -> Result<(), RoutingError> {
        send_with_timeout(&self.to_database, message, MODULE_DATABASE, self.routing_timeout).await
    }

    pub async fn send_notification(&self, notification: Notification) -> Result<(), RoutingError> {
        send_with_timeout(&self.to_api, notification, MODULE_API, self.notification_timeout).await
    }

    /// Best-effort delivery: a failure is logged and otherwise ignored.
    pub async fn notify(&self, notification: Notification) {
        let client_id = notification.client_id.clone();
        if let Err(e) = self.send_notification(notification).await {
            warn!(
                func = "notify",
                client_id = %client_id,
                error = %e,
                "notification was not delivered"
            );
        }
    }
}

pub async fn send_with_timeout<T>(
    sender: &mpsc::Sender<T>,
    message: T,
    module: &str,
    timeout: Duration,
) -> Result<(), RoutingError> {
    match tokio::time::timeout(timeout, sender.send(message)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(_)) => Err(RoutingError::Closed(module.to_string())),
        Err(_) => Err(RoutingError::Timeout {
            module: module.to_string(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}
