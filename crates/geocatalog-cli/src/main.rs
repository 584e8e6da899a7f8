//! Command-line interface for `GeoCatalog`, a geospatial metadata ingestion tool.
//!
//! This binary scans vector and raster files with the [`geocatalog_core`] library and
//! emits the catalog creation requests (database service, databases, schemas and
//! tables) that describe them.
//!
//! # Architecture
//!
//! The CLI is built using [`clap`] for argument parsing and [`tracing`] for structured logging.
//! It parses arguments, configures logging, resolves the connector configuration from a
//! workflow file and flags, and delegates to command handlers.
//!
//! # Available Commands
//!
//! - `ingest` - Scan a source and emit its catalog creation requests as JSON
//! - `scan` - Scan a source and summarize the tables found
//! - `info` - Display the tables and mapped column types of a single file
//! - `drivers` - List format drivers and their capabilities
//! - `test-connection` - Check that the configured source is reachable

mod display;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{Level, debug, info};
use tracing_log::LogTracer;
use tracing_subscriber::FmtSubscriber;

use geocatalog_core::catalog::CreateRequest;
use geocatalog_core::error::driver_not_found;
use geocatalog_core::{ConnectorConfig, GeoCatalogError, Source, SpatialSource};

use crate::display::{display_dataset_info, display_drivers, display_scan};

/// Service name used when neither a workflow file nor `--service` provides one.
const DEFAULT_SERVICE_NAME: &str = "spatial";

#[derive(Parser)]
#[command(
    name = "geocatalog",
    version,
    about = "Geospatial metadata ingestion in Rust",
    long_about = "GeoCatalog scans vector and raster files and publishes their schemas\n\
                  as catalog database, schema and table creation requests."
)]
/// Command-line arguments and options for the `GeoCatalog` CLI.
///
/// This struct defines the top-level CLI interface, including global flags for
/// logging verbosity and the subcommand to execute.
struct Cli {
    /// Enable verbose (INFO level) logging output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug (DEBUG level) logging output with detailed diagnostics.
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where to ingest from. Flags override the values of the workflow file.
#[derive(Args, Debug, Clone, Default)]
struct SourceArgs {
    /// Workflow JSON file with a `source` block.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory, file or URL to ingest.
    #[arg(short, long, value_name = "PATH")]
    path: Option<String>,

    /// Catalog service name.
    #[arg(short, long, value_name = "NAME")]
    service: Option<String>,

    /// Extra comma separated extensions to skip (e.g. "csv,json").
    #[arg(long, value_name = "EXTENSIONS")]
    skip: Option<String>,

    /// Treat PATH as a URL to a single remote file.
    #[arg(long)]
    remote: bool,

    /// Follow symbolic links while walking a directory.
    #[arg(long)]
    follow_links: bool,

    /// Do not descend more than DEPTH levels below the directory.
    #[arg(long, value_name = "DEPTH")]
    max_depth: Option<usize>,
}

impl SourceArgs {
    /// Resolves the connector configuration.
    fn to_config(&self) -> geocatalog_core::Result<ConnectorConfig> {
        let mut config = match &self.config {
            Some(path) => {
                debug!("Loading workflow configuration from {}", path.display());
                ConnectorConfig::from_workflow_file(path)?
            },
            None => ConnectorConfig {
                service_name: DEFAULT_SERVICE_NAME.to_string(),
                search_directory: None,
                skip: None,
                remote: false,
                source_python_class: None,
                follow_links: false,
                max_depth: None,
            },
        };

        if let Some(path) = &self.path {
            config.search_directory = Some(path.clone());
        }
        if let Some(service) = &self.service {
            config.service_name.clone_from(service);
        }
        if let Some(skip) = &self.skip {
            config.skip = Some(skip.clone());
        }
        if self.remote {
            config.remote = true;
        }
        if self.follow_links {
            config.follow_links = true;
        }
        if self.max_depth.is_some() {
            config.max_depth = self.max_depth;
        }
        Ok(config)
    }
}

/// Available subcommands for the `GeoCatalog` CLI.
#[derive(Subcommand)]
enum Commands {
    /// Scans a source and writes its catalog creation requests.
    ///
    /// Requests are written as JSON Lines (one request per line) in emission order:
    /// service, databases, schemas, tables.
    Ingest {
        #[command(flatten)]
        source: SourceArgs,

        /// Write the requests to FILE instead of standard output.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Write a pretty-printed JSON array instead of JSON Lines.
        #[arg(long)]
        pretty: bool,
    },

    /// Scans a source and prints a summary table of the tables found.
    Scan {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Displays the tables and mapped column types of a single file.
    Info {
        /// Path to the geospatial file.
        #[arg(value_name = "DATASET")]
        input: PathBuf,
    },

    /// Lists geospatial drivers and their capabilities.
    Drivers {
        /// Show only this driver.
        #[arg(value_name = "DRIVER")]
        name: Option<String>,

        /// Also list planned and unsupported drivers.
        #[arg(long)]
        all: bool,
    },

    /// Checks that the configured source is reachable.
    TestConnection {
        #[command(flatten)]
        source: SourceArgs,
    },
}

/// Entry point for the `GeoCatalog` command-line interface.
///
/// # Errors
///
/// Returns an error if the logging system cannot be initialized. Command failures are
/// reported on standard error and exit with status 1.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity flags
    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    // Bridge logs from the `log` crate to the `tracing` ecosystem.
    LogTracer::init()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    if let Err(err) = run(cli.command).await {
        report_error(&err);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Ingest {
            source,
            output,
            pretty,
        } => {
            handle_ingest(&source, output.as_deref(), pretty).await?;
        },
        Commands::Scan { source } => {
            handle_scan(&source).await?;
        },
        Commands::Info { input } => {
            info!("Displaying info for {}", input.display());
            handle_info(&input)?;
        },
        Commands::Drivers { name, all } => {
            handle_drivers(name.as_deref(), all)?;
        },
        Commands::TestConnection { source } => {
            handle_test_connection(&source).await?;
        },
    }
    Ok(())
}

/// Prints an error with its recovery suggestion, if any.
fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<GeoCatalogError>() {
        Some(e) => {
            let message = e.user_message();
            eprintln!("Error: {}", message.trim_start_matches("Error: "));
            if let Some(suggestion) = e.recovery_suggestion() {
                eprintln!("\nSuggestion: {suggestion}");
            }
        },
        None => eprintln!("Error: {err:#}"),
    }
}

async fn handle_ingest(source: &SourceArgs, output: Option<&Path>, pretty: bool) -> Result<()> {
    let config = source.to_config()?;
    info!(
        "Ingesting {} as service '{}'",
        config.search_directory.as_deref().unwrap_or_default(),
        config.service_name
    );
    let requests = geocatalog_core::operations::ingest(config).await?;

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file '{}'", path.display()))?;
            write_requests(BufWriter::new(file), &requests, pretty)?;
            info!("Wrote {} request(s) to {}", requests.len(), path.display());
        },
        None => write_requests(io::stdout().lock(), &requests, pretty)?,
    }
    Ok(())
}

/// Writes requests as JSON Lines, or as one pretty-printed array.
fn write_requests<W: Write>(mut writer: W, requests: &[CreateRequest], pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut writer, requests)?;
        writeln!(writer)?;
    } else {
        for request in requests {
            serde_json::to_writer(&mut writer, request)?;
            writeln!(writer)?;
        }
    }
    writer.flush()?;
    Ok(())
}

async fn handle_scan(source: &SourceArgs) -> Result<()> {
    let config = source.to_config()?;
    let mut spatial = SpatialSource::create(config)?;
    spatial.prepare().await?;
    if let Some(data) = spatial.data() {
        display_scan(data);
    }
    spatial.close();
    Ok(())
}

fn handle_info(input: &Path) -> Result<()> {
    let info = geocatalog_core::operations::info(input)?;
    display_dataset_info(&info);
    Ok(())
}

/// Handles the `drivers` subcommand by displaying a formatted table of drivers.
///
/// # Errors
///
/// Returns [`GeoCatalogError::Driver`] when `name` is given and no driver has that name.
fn handle_drivers(name: Option<&str>, all: bool) -> Result<()> {
    let drivers = match name {
        Some(name) => {
            let driver = geocatalog_core::drivers::find_driver(name)
                .ok_or_else(|| GeoCatalogError::from(driver_not_found(name)))?;
            vec![driver]
        },
        None if all => geocatalog_core::drivers::get_drivers(),
        None => geocatalog_core::drivers::get_available_drivers(),
    };
    display_drivers(&drivers);
    Ok(())
}

async fn handle_test_connection(source: &SourceArgs) -> Result<()> {
    let config = source.to_config()?;
    let spatial = SpatialSource::create(config)?;
    spatial.test_connection().await?;
    println!(
        "Connection successful: {}",
        spatial.config().search_directory.as_deref().unwrap_or_default()
    );
    Ok(())
}
