//! vidsum - video summary client
//!
//! Uploads a video to the summary service, shows progress while the service
//! works, and prints the returned summary, key frames and transcript.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vidsum_client::render::{
    download_frames, finish_status_line, render_summary, spawn_status_line,
};
use vidsum_client::{HttpSummaryService, SelectedFile, SummaryService, UploadSession};
use vidsum_common::config::{
    load_toml_config_or_default, resolve_config_path, write_toml_config, ClientConfig,
    LoggingConfig, TomlConfig, DEFAULT_SERVICE_BASE_URL,
};

/// Command-line arguments for vidsum
#[derive(Parser, Debug)]
#[command(name = "vidsum")]
#[command(about = "Video summary client")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Summary service base URL (overrides VIDSUM_SERVICE_URL and config)
    #[arg(short = 'u', long, global = true)]
    service_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a video and print its summary
    Summarize {
        /// Video file to upload
        file: PathBuf,

        /// Treat the file as dropped: refuse anything that is not video/*
        #[arg(long = "drop")]
        as_drop: bool,

        /// Download key frames into this directory
        #[arg(long)]
        frames_dir: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the summary service is up
    Health,

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let (toml_config, config_source) = load_toml_config_or_default(config_path.as_deref());

    init_tracing(&toml_config.logging)?;
    config_source.log();

    info!(
        "vidsum {} (git {}, built {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("VIDSUM_GIT_HASH"),
        env!("VIDSUM_BUILD_TIMESTAMP"),
        env!("VIDSUM_BUILD_PROFILE")
    );

    match args.command {
        Command::Summarize {
            file,
            as_drop,
            frames_dir,
            json,
        } => {
            let config = ClientConfig::resolve(args.service_url.as_deref(), &toml_config)
                .context("Invalid client configuration")?;
            summarize(&config, &file, as_drop, frames_dir.as_deref(), json).await
        }
        Command::Health => {
            let config = ClientConfig::resolve(args.service_url.as_deref(), &toml_config)
                .context("Invalid client configuration")?;
            health(&config).await
        }
        Command::Config {
            action: ConfigAction::Init { force },
        } => config_init(config_path, force),
    }
}

/// `RUST_LOG` wins over the configured level
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("vidsum={0},vidsum_client={0},vidsum_common={0}", logging.level)))
        .context("Invalid log level")?;

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(std::sync::Mutex::new(file)),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}

async fn summarize(
    config: &ClientConfig,
    path: &Path,
    as_drop: bool,
    frames_dir: Option<&Path>,
    json: bool,
) -> Result<()> {
    info!("Summary service: {}", config.service_base_url);

    let session = UploadSession::connect(config).context("Failed to create service client")?;

    let file = SelectedFile::from_path(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if !file.has_accepted_extension() {
        warn!(
            file = %file.name,
            "Extension is not one of mp4, avi, mov, mkv; the service may refuse it"
        );
    }

    if as_drop {
        if let Err(e) = session.select_dropped_file(file) {
            bail!("{}", e.user_message());
        }
    } else {
        session.select_file(file);
    }

    let renderer = spawn_status_line(session.watch());

    let outcome = session.submit().await;
    finish_status_line(renderer).await;

    let result = match outcome {
        Ok(result) => result,
        Err(e) => bail!("{}", e.user_message()),
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to encode result")?
        );
    } else {
        print!("{}", render_summary(&result));
    }

    if let Some(dir) = frames_dir {
        let service: &Arc<dyn SummaryService> = session.controller().service();
        let saved = download_frames(service.as_ref(), &result, dir)
            .await
            .with_context(|| format!("Failed to save frames into {}", dir.display()))?;
        info!(
            "Saved {} of {} key frames to {}",
            saved.len(),
            result.key_frame_ids.len(),
            dir.display()
        );
    }

    Ok(())
}

async fn health(config: &ClientConfig) -> Result<()> {
    let service = HttpSummaryService::new(config).context("Failed to create service client")?;
    let health = service
        .health()
        .await
        .with_context(|| format!("Summary service at {} is unreachable", service.base_url()))?;

    println!("status:      {}", health.status);
    println!("summarizer:  {}", health.models.summarizer);
    println!("transcriber: {}", health.models.transcriber);

    if !health.is_healthy() {
        bail!("Summary service reports status {:?}", health.status);
    }
    Ok(())
}

fn config_init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path.context("No config directory available; pass --config")?;

    if path.exists() && !force {
        bail!(
            "Config file {} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let config = TomlConfig {
        service_base_url: Some(DEFAULT_SERVICE_BASE_URL.to_string()),
        ..TomlConfig::default()
    };
    write_toml_config(&config, &path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Wrote {}", path.display());
    Ok(())
}
