//! Thin CLI demonstrating how a collector or publisher wires the AUDITOR
//! client facade from a layered config file (§6.4 — deliberately thin,
//! out of spec scope beyond this wiring).

use std::time::Duration;

use anyhow::{Context, Result};
use auditor_client::{AuditorClientBuilder, Record, TlsPaths};
use auditor_config::{AuditorSettings, LoadedConfig};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "auditor")]
#[command(about = "AUDITOR submission client CLI", long_about = None)]
struct Cli {
    /// Layered config paths in merge order (base -> env -> site -> ...).
    #[arg(long = "config", required = true, global = true)]
    config_paths: Vec<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET /health_check
    HealthCheck,

    /// GET /records
    Get,

    /// GET /records?<query>
    Query {
        /// A query string, typically produced by `auditor_query::QueryBuilder::build()`.
        query: String,
    },

    /// POST /record (ADD), bypassing the durable queue.
    Add {
        #[arg(long)]
        record_id: String,
        #[arg(long)]
        start_time: DateTime<Utc>,
    },

    /// Enqueue an ADD for durable, retried delivery.
    AddQueue {
        #[arg(long)]
        record_id: String,
        #[arg(long)]
        start_time: DateTime<Utc>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();
    let path_refs: Vec<&str> = cli.config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = auditor_config::load_layered_yaml(&path_refs).context("loading config")?;

    let mut client = build_client(&loaded).await?;

    match cli.cmd {
        Commands::HealthCheck => {
            let ok = client.health_check().await.context("health_check failed")?;
            println!("healthy={ok}");
        }
        Commands::Get => {
            let records = client.get().await.context("get failed")?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::Query { query } => {
            let records = client.advanced_query(&query).await.context("advanced_query failed")?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::Add { record_id, start_time } => {
            let record = Record::new(record_id, start_time);
            client.add(&record).await.context("add failed")?;
            println!("added record_id={}", record.record_id());
        }
        Commands::AddQueue { record_id, start_time } => {
            let record = Record::new(record_id, start_time);
            client
                .add_record_queue(record.clone())
                .await
                .context("add_record_queue failed")?;
            println!("enqueued record_id={}", record.record_id());
        }
    }

    client.stop().await.context("stop failed")?;
    Ok(())
}

async fn build_client(loaded: &LoadedConfig) -> Result<auditor_client::AuditorClient> {
    let settings: &AuditorSettings = &loaded.settings;

    let mut builder = AuditorClientBuilder::new()
        .address(settings.host.clone(), settings.port)
        .timeout(Duration::from_secs(settings.timeout))
        .retries(settings.retries)
        .num_workers(settings.num_workers)
        .delay_before_retry(Duration::from_secs(settings.delay_before_retry))
        .db_path(settings.db_path.clone());

    if let Some(tls) = settings.tls_settings().context("invalid TLS configuration")? {
        builder = builder.tls(TlsPaths {
            ca_cert_path: tls.ca_cert_path,
            client_cert_path: tls.client_cert_path,
            client_key_path: tls.client_key_path,
        });
    }

    builder.build().await.map_err(|e| anyhow::anyhow!("starting client: {e}"))
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
