//! Terminal progress watcher for AutoClip projects.

mod render;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use aclip_client::{ApiClient, ClientConfig};
use aclip_models::{LifecycleStatus, TrackedItem};
use aclip_progress::{
    fetch_tracked_item, ProgressStore, ProgressTracker, StatusEvent, TrackerConfig, TrackerSources,
};

/// Values accepted by `--status`.
const STATUS_VALUES: [&str; 6] = [
    "pending",
    "importing",
    "downloading",
    "processing",
    "completed",
    "failed",
];

#[derive(Parser)]
#[command(name = "aclip-watch")]
#[command(about = "Watch download and processing progress of AutoClip projects")]
#[command(version)]
struct Cli {
    /// Project ids to track
    #[arg(required = true)]
    projects: Vec<String>,

    /// Initial lifecycle status of every project (fetched from the API when omitted)
    #[arg(
        long,
        value_parser = PossibleValuesParser::new(STATUS_VALUES)
            .map(|s| LifecycleStatus::from_server(&s))
    )]
    status: Option<LifecycleStatus>,

    /// Initial download progress (0-100), used together with --status
    #[arg(long, default_value_t = 0.0)]
    download_progress: f64,

    /// API base URL (overrides ACLIP_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Print one JSON object per update
    #[arg(long)]
    json: bool,

    /// Show pipeline stage, color and message while processing
    #[arg(long)]
    details: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let default_level = if verbose { "aclip=debug" } else { "aclip=info" };
    let env_filter = EnvFilter::from_default_env()
        .add_directive(default_level.parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    // Logs go to stderr so stdout stays machine readable
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Ignore the error if a provider is already installed
    let _ = rustls::crypto::ring::default_provider().install_default();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut client_config = ClientConfig::from_env();
    if let Some(url) = &cli.api_url {
        client_config = client_config.with_base_url(url.clone());
    }
    let client = ApiClient::new(client_config).context("Failed to create API client")?;
    let tracker_config = TrackerConfig::from_env();

    info!(
        api = %client.base_url(),
        projects = cli.projects.len(),
        "Starting aclip-watch"
    );

    let client = Arc::new(client);
    let sources = TrackerSources::from_client(Arc::clone(&client));
    let store = ProgressStore::new();
    let (merged_tx, mut merged_rx) = mpsc::unbounded_channel::<StatusEvent>();

    let mut trackers = Vec::with_capacity(cli.projects.len());
    let mut statuses = HashMap::new();
    for project_id in &cli.projects {
        let item = match cli.status {
            Some(status) => TrackedItem::new(project_id.clone(), status)
                .with_context(|| format!("Invalid project id {:?}", project_id))?
                .with_download_progress(cli.download_progress),
            None => match fetch_tracked_item(&*client, project_id).await {
                Ok(item) => item,
                Err(e) => {
                    warn!(
                        project_id = %project_id,
                        "Could not fetch project status, starting as pending: {}", e
                    );
                    TrackedItem::new(project_id.clone(), LifecycleStatus::Pending)
                        .with_context(|| format!("Invalid project id {:?}", project_id))?
                }
            },
        };
        let status = item.status;

        let (tracker, mut events) =
            ProgressTracker::spawn(item, sources.clone(), store.clone(), tracker_config.clone())?;

        let forward = merged_tx.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if forward.send(event).is_err() {
                    break;
                }
            }
        });

        statuses.insert(project_id.clone(), status);
        trackers.push(tracker);
    }
    // Only forwarders hold senders now; the channel closes when all trackers end
    drop(merged_tx);

    loop {
        tokio::select! {
            event = merged_rx.recv() => match event {
                Some(StatusEvent::LifecycleChanged { project_id, from, to }) => {
                    info!(project_id = %project_id, from = %from, to = %to, "Status changed");
                    statuses.insert(project_id, to);
                }
                Some(StatusEvent::Projection { project_id, projection }) => {
                    let status = statuses
                        .get(&project_id)
                        .copied()
                        .unwrap_or(LifecycleStatus::Unknown);
                    let pipeline = if cli.details { store.get(&project_id) } else { None };
                    let details = render::details(status, pipeline.as_ref());
                    if cli.json {
                        println!(
                            "{}",
                            render::json_line(&project_id, status, &projection, details.as_ref())?
                        );
                    } else {
                        println!("{}", render::text_line(&project_id, &projection));
                        if let Some(details) = &details {
                            println!("{}", render::details_line(details));
                        }
                    }
                }
                Some(StatusEvent::DownloadProgress { .. }) => {}
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    for tracker in trackers {
        tracker.stop().await;
    }

    let failed: Vec<&String> = statuses
        .iter()
        .filter(|(_, status)| **status == LifecycleStatus::Failed)
        .map(|(id, _)| id)
        .collect();
    if !failed.is_empty() {
        warn!(projects = ?failed, "Some projects failed");
        std::process::exit(1);
    }

    info!("aclip-watch finished");
    Ok(())
}
