//! `polar-migrate-upload`: uploads staged files to Polar as downloadables.
//!
//! Each file gets its own transfer engine; files upload concurrently while
//! the parts of any one file go strictly in order.

mod config;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use futures_util::future::join_all;
use polar_migrate_protocol::{FileRead, Server};
use polar_migrate_transfer::{
    FilesClient, HttpPartSink, ProgressMeter, TransferEngine, TransferError, TransferRequest,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::{ACCESS_TOKEN_ENV, UploaderConfig};

#[derive(Debug, Parser)]
#[command(name = "polar-migrate-upload", version, about)]
struct Cli {
    /// Config file (default: ~/.config/polar-migrate/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Polar environment: sandbox or production
    #[arg(long)]
    server: Option<Server>,

    /// Organization that will own the files
    #[arg(long)]
    organization: Option<String>,

    /// Part size in bytes
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Write the effective settings back to the config file
    #[arg(long)]
    save_config: bool,

    /// Files to upload
    #[arg(required_unless_present = "save_config")]
    files: Vec<PathBuf>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut UploaderConfig) {
        if let Some(server) = self.server {
            config.server = server;
        }
        if let Some(organization) = &self.organization {
            config.organization_id = organization.clone();
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            error!(failed, "some files were not uploaded");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Runs the uploads and returns how many files failed.
async fn run(cli: Cli) -> anyhow::Result<usize> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config::config_path()?,
    };
    let mut config = UploaderConfig::load_from(&config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;
    cli.apply_overrides(&mut config);

    if cli.save_config {
        config.save_to(&config_path)?;
        info!(path = %config_path.display(), "configuration saved");
    }
    if cli.files.is_empty() {
        return Ok(0);
    }

    config.apply_env_token(std::env::var(ACCESS_TOKEN_ENV).ok());
    config.validate()?;

    let timeout = config.request_timeout();
    let client = FilesClient::new(config.server, &config.access_token, timeout)
        .context("building API client")?;
    let sink = HttpPartSink::new(timeout).context("building storage client")?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling transfers");
            interrupt.cancel();
        }
    });

    info!(
        server = %config.server,
        files = cli.files.len(),
        "starting uploads"
    );

    let transfers = cli
        .files
        .iter()
        .map(|path| upload_file(&client, &sink, &config, path, cancel.child_token()));
    let results = join_all(transfers).await;

    let mut failed = 0;
    for (path, result) in cli.files.iter().zip(results) {
        match result {
            Ok(record) => println!("{}\t{}", path.display(), record.id),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "upload failed");
                failed += 1;
            }
        }
    }
    Ok(failed)
}

async fn upload_file(
    client: &FilesClient,
    sink: &HttpPartSink,
    config: &UploaderConfig,
    path: &Path,
    cancel: CancellationToken,
) -> Result<FileRead, TransferError> {
    let request = TransferRequest::open(config.organization_id.clone(), path).await?;
    let name = request.name.clone();
    let meter = ProgressMeter::new(request.size);

    let mut engine = TransferEngine::new(client, sink)
        .with_chunk_size(config.chunk_size)
        .with_cancel(cancel)
        .on_progress(move |uploaded| {
            let snapshot = meter.record(uploaded);
            info!(file = %name, "{snapshot}");
        });
    engine.run(request).await
}
