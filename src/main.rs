//! # Jurnal Source Entry Point
//!
//! Command line surface: `spec`, `check`, `discover` and `read`. Protocol
//! messages go to stdout, diagnostics to stderr.

use std::fs;
use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use jurnal_source::{
    config::{AppConfig, ConfigLoader, ConnectorConfig, connection_specification},
    connectors::{JurnalSource, Registry},
    protocol::{
        Catalog, ConfiguredCatalog, ConnectionStatus, ConnectorSpecification, Message,
        MessageWriter, Status,
    },
    sync_executor::SyncExecutor,
    telemetry,
};

const DOCUMENTATION_URL: &str = "https://api-doc.jurnal.id/";

#[derive(Debug, Parser)]
#[command(name = "jurnal-source", version, about = "Extract accounting data from Jurnal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the connector configuration schema
    Spec,
    /// Verify the API key against the active company endpoint
    Check {
        #[arg(long)]
        config: PathBuf,
    },
    /// List the available streams and their schemas
    Discover {
        #[arg(long)]
        config: PathBuf,
    },
    /// Read records from the selected streams
    Read {
        #[arg(long)]
        config: PathBuf,
        /// Configured catalog; every stream is read when omitted
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!(error = %format!("{err:#}"), "Command failed");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let app_config = ConfigLoader::new()
        .load()
        .context("loading runtime configuration")?;
    telemetry::init_tracing(&app_config).context("initializing telemetry")?;

    info!(profile = %app_config.profile, api_base = %app_config.api_base, "Loaded configuration");

    let mut writer = MessageWriter::new(io::stdout());

    match cli.command {
        Command::Spec => {
            writer.emit(&Message::Spec {
                spec: ConnectorSpecification {
                    documentation_url: DOCUMENTATION_URL.to_string(),
                    connection_specification: connection_specification(),
                },
            })?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { config } => check(&app_config, &config, &mut writer).await,
        Command::Discover { config } => {
            ConnectorConfig::from_path(&config).context("loading connector config")?;
            let registry = Registry::global()?;
            writer.emit(&Message::Catalog {
                catalog: Catalog {
                    streams: registry.list_metadata(),
                },
            })?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Read { config, catalog } => {
            let source = build_source(&app_config, &config)?;
            let catalog = catalog
                .as_deref()
                .map(load_catalog)
                .transpose()?;

            let summary = SyncExecutor::new(&source)
                .run(catalog.as_ref(), &mut writer)
                .await?;

            info!(
                streams_succeeded = summary.succeeded.len(),
                streams_failed = summary.failed.len(),
                records = summary.total_records(),
                "Read finished"
            );

            Ok(if summary.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

async fn check(
    app_config: &AppConfig,
    config: &Path,
    writer: &mut MessageWriter<Stdout>,
) -> Result<ExitCode> {
    // A config that cannot be loaded is reported as a failed check.
    let outcome = match build_source(app_config, config) {
        Ok(source) => source.check_connection().await?.into(),
        Err(err) => ConnectionStatus {
            status: Status::Failed,
            message: Some(format!("{err:#}")),
        },
    };

    writer.emit(&Message::ConnectionStatus {
        connection_status: outcome,
    })?;
    Ok(ExitCode::SUCCESS)
}

fn build_source(app_config: &AppConfig, config: &Path) -> Result<JurnalSource> {
    let connector_config =
        ConnectorConfig::from_path(config).context("loading connector config")?;
    JurnalSource::new(app_config, connector_config).context("building Jurnal source")
}

fn load_catalog(path: &Path) -> Result<ConfiguredCatalog> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading catalog {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing catalog {}", path.display()))
}
