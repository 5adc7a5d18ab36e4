use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::time::sleep;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use tiroute_core::app::CoreBuilder;
use tiroute_core::bus::{ApiEndpoint, DatabaseEndpoint};
use tiroute_core::config::CoreConfig;
use tiroute_core::domain::message::{MODULE_API, MODULE_DATABASE};
use tiroute_core::domain::{
    ModuleReport, ModuleRequest, NotificationType, ReportNotification, TaskParameters,
};
use tiroute_core::ports::TaskStore;

/// Route request documents through the core and print client notifications.
#[derive(Debug, Parser)]
#[command(name = "tiroute", version)]
struct Args {
    /// TOML configuration file (TIROUTE_* environment variables override it).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Client the requests are submitted for.
    #[arg(long, default_value = "cli")]
    client_id: String,

    #[arg(long, default_value = "tiroute-cli")]
    client_name: String,

    /// Wait after the last request so that module reports can come back.
    #[arg(long, default_value_t = 200)]
    linger_ms: u64,

    /// Request envelopes, one JSON document per file.
    #[arg(required = true)]
    requests: Vec<PathBuf>,
}

fn init_logging(log_level: &str, log_format: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format {
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .context("failed to initialise json logging")?,
        "pretty" => registry
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init()
            .context("failed to initialise pretty logging")?,
        other => anyhow::bail!("unsupported log format: {other}"),
    }
    Ok(())
}

/// Stand-in for the database module: acknowledges every routed task.
async fn persistence_module(mut endpoint: DatabaseEndpoint, store: Arc<dyn TaskStore>) {
    while let Some(routed) = endpoint.input.recv().await {
        let task_id = routed.app_task_id;
        let summary = match store.get_task_by_id(task_id).await {
            Ok((_, record)) => match &record.parameters {
                TaskParameters::StixObjects(objects) => {
                    format!("{} STIX objects stored", objects.len())
                }
                TaskParameters::Search(search) => {
                    format!("search in collection '{}' accepted", search.collection_name)
                }
                TaskParameters::ReferenceBook(book) => format!(
                    "{} reference book operations applied",
                    book.rbook_parameters.len()
                ),
            },
            Err(e) => {
                warn!(func = "persistence_module", task_id = %task_id, error = %e);
                continue;
            }
        };

        let report = ModuleReport {
            generator_module: MODULE_DATABASE.to_string(),
            app_task_id: task_id,
            status: "completed".to_string(),
            removal_required: true,
            notification: Some(ReportNotification {
                notification_type: NotificationType::Success,
                final_result: "task completed".to_string(),
                message: summary,
            }),
        };
        if endpoint.output.send(report).await.is_err() {
            break;
        }
    }
}

/// Stand-in for the API module: submits the requests, prints notifications.
async fn api_module(
    endpoint: ApiEndpoint,
    requests: Vec<ModuleRequest>,
    linger: Duration,
) -> Result<()> {
    let ApiEndpoint {
        input: mut notifications,
        output,
    } = endpoint;

    let printer = tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            match serde_json::to_string(&notification) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!(func = "api_module", error = %e, "notification not printable"),
            }
        }
    });

    for request in requests {
        output
            .send(request)
            .await
            .context("core stopped accepting requests")?;
    }
    sleep(linger).await;
    drop(output);

    printer.await.context("notification printer failed")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = CoreConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    init_logging(&config.log_level, &config.log_format)?;

    let mut requests = Vec::with_capacity(args.requests.len());
    for path in &args.requests {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        requests.push(ModuleRequest::new(
            MODULE_API,
            &args.client_id,
            &args.client_name,
            data,
        ));
    }

    let (core, endpoints) = CoreBuilder::new(config).build()?;
    let store = core.store();

    let database = tokio::spawn(persistence_module(endpoints.database, store));
    let api = tokio::spawn(api_module(
        endpoints.api,
        requests,
        Duration::from_millis(args.linger_ms),
    ));

    let summary = core.run().await;
    api.await.context("api module panicked")??;
    database.await.context("database module panicked")?;

    info!(
        forwarded = summary.forwarded,
        rejected = summary.rejected,
        dropped = summary.dropped,
        "done"
    );
    Ok(())
}
