//! CoreLoop - コアのメインループ
//!
//! # フロー
//! 1. API モジュールから ModuleRequest を受信 → JoinSet 上で 1 件ずつ dispatch
//! 2. データベースモジュールから ModuleReport を受信 → レジストリへ反映、必要なら通知
//! 3. API 側の受信チャネルが閉じたら、処理中の dispatch を待ってから終了
//!
//! 待機中も ModuleReport の受信を続ける（データベース側が送信で詰まると
//! dispatch 側の転送も詰まるため）。

use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use super::builder::Core;
use super::dispatcher::{DispatchOutcome, RequestDispatcher};
use crate::bus::BusHandles;
use crate::domain::{ModuleReport, Notification, RegistryError, UserMessage};
use crate::ports::TaskStore;

/// Counters returned by `Core::run`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub forwarded: usize,
    pub rejected: usize,
    pub dropped: usize,
    pub reports: usize,
}

impl RunSummary {
    fn record(&mut self, joined: Result<DispatchOutcome, JoinError>) {
        match joined {
            Ok(DispatchOutcome::Forwarded(_)) => self.forwarded += 1,
            Ok(DispatchOutcome::Rejected(_)) => self.rejected += 1,
            Ok(DispatchOutcome::Dropped) => self.dropped += 1,
            Err(e) => {
                error!(func = "Core::run", error = %e, "dispatch task failed");
                self.rejected += 1;
            }
        }
    }
}

impl Core {
    pub async fn run(self) -> RunSummary {
        let Core {
            config,
            store,
            stix,
            bus,
        } = self;
        let (handles, mut requests, mut reports) = bus.split(&config);
        let dispatcher = RequestDispatcher::new(
            store.clone(),
            stix,
            handles.clone(),
            config.reject_invalid_reference_book,
        );

        let mut in_flight: JoinSet<DispatchOutcome> = JoinSet::new();
        let mut summary = RunSummary::default();
        let mut reports_open = true;

        info!(func = "Core::run", "core loop started");

        loop {
            tokio::select! {
                request = requests.recv() => match request {
                    Some(request) => {
                        let dispatcher = dispatcher.clone();
                        in_flight.spawn(async move { dispatcher.dispatch(request).await });
                    }
                    None => break,
                },
                report = reports.recv(), if reports_open => match report {
                    Some(report) => {
                        summary.reports += 1;
                        apply_report(store.as_ref(), &handles, report).await;
                    }
                    None => reports_open = false,
                },
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    summary.record(joined);
                }
            }
        }

        debug!(func = "Core::run", in_flight = in_flight.len(), "request channel closed, draining");

        while !in_flight.is_empty() {
            tokio::select! {
                Some(joined) = in_flight.join_next() => summary.record(joined),
                report = reports.recv(), if reports_open => match report {
                    Some(report) => {
                        summary.reports += 1;
                        apply_report(store.as_ref(), &handles, report).await;
                    }
                    None => reports_open = false,
                },
                else => break,
            }
        }

        info!(
            func = "Core::run",
            forwarded = summary.forwarded,
            rejected = summary.rejected,
            dropped = summary.dropped,
            reports = summary.reports,
            "core loop stopped"
        );
        summary
    }
}

/// Apply a report from the database module to the registry.
pub async fn apply_report(store: &dyn TaskStore, bus: &BusHandles, report: ModuleReport) {
    let task_id = report.app_task_id;
    let record = match store.get_task_by_id(task_id).await {
        Ok((_, record)) => record,
        Err(RegistryError::NotFound(_)) => {
            warn!(func = "apply_report", task_id = %task_id, "report for unknown task ignored");
            return;
        }
        Err(e) => {
            error!(func = "apply_report", task_id = %task_id, error = %e);
            return;
        }
    };

    if let Err(e) = store.change_task_status(task_id, &report.status).await {
        error!(func = "TaskStore::change_task_status", task_id = %task_id, error = %e);
    }

    if let Some(note) = report.notification {
        let message = UserMessage {
            final_result: note.final_result,
            message: note.message,
            ..UserMessage::default()
        }
        .for_section(&record.section);
        let notification = Notification {
            notification_type: note.notification_type,
            ..Notification::danger(&record.client_id, message)
        }
        .with_task(&record.client_task_id, record.section.clone());
        bus.notify(notification).await;
    }

    if report.removal_required {
        if let Err(e) = store.change_removal_required_parameter(task_id).await {
            error!(
                func = "TaskStore::change_removal_required_parameter",
                task_id = %task_id,
                error = %e
            );
        }
        store.deleting_task_by_id(task_id).await;
        debug!(func = "apply_report", task_id = %task_id, "task removed");
    }
}
