//! CLI glue: argument parsing, usage validation and dispatch to the core pipelines.
//!
//! All pipeline logic lives in `deposit-porter-core`; this module only wires the
//! HTTP clients to it and prints results. Results go to stdout, logs to stderr.

use crate::client::{PlatformClient, SignedUrlStore};
use crate::load_config::load_config;
use anyhow::Result;
use clap::{Parser, Subcommand};
use deposit_porter_core::export::export_deposit;
use deposit_porter_core::import::import_deposit;
use deposit_porter_core::summary::fetch_user_summary;
use deposit_porter_core::PorterError;
use std::path::PathBuf;

/// CLI for deposit-porter: move deposits into and out of the publication platform.
#[derive(Parser)]
#[clap(
    name = "deposit-porter",
    version,
    about = "Import, export and inspect scholarly deposits on a publication platform"
)]
pub struct Cli {
    /// Optional YAML config file (non-secret settings only)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import a deposit from a directory holding meta.json and its manuscript
    Import {
        /// Directory containing meta.json and the manuscript file
        directory: PathBuf,
        /// Community the deposit is created in
        community: String,
    },
    /// Export a deposit into <DOWNLOAD_DIR>/deposit_<DEPOSIT_ID>.zip
    Export {
        deposit_id: String,
        download_dir: PathBuf,
    },
    /// Print the contribution summary of a user
    Summary {
        /// ORCID iD of the user
        orcid: String,
    },
}

/// Rejects arguments that cannot work, before any config is read or request sent.
pub fn validate(command: &Commands) -> Result<(), PorterError> {
    match command {
        Commands::Import {
            directory,
            community,
        } => {
            if !directory.is_dir() {
                return Err(PorterError::Usage(format!(
                    "import directory {} does not exist",
                    directory.display()
                )));
            }
            if community.trim().is_empty() {
                return Err(PorterError::Usage("community must not be empty".into()));
            }
        }
        Commands::Export { deposit_id, .. } => {
            if deposit_id.trim().is_empty() {
                return Err(PorterError::Usage("deposit id must not be empty".into()));
            }
        }
        Commands::Summary { orcid } => {
            if orcid.trim().is_empty() {
                return Err(PorterError::Usage("orcid must not be empty".into()));
            }
        }
    }
    Ok(())
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    validate(&cli.command)?;

    let config = load_config(cli.config.as_deref())?;
    let api = PlatformClient::new(&config)?;
    let store = SignedUrlStore::new()?;

    match cli.command {
        Commands::Import {
            directory,
            community,
        } => {
            tracing::info!(command = "import", directory = %directory.display(), "Starting import");
            let report = import_deposit(&api, &store, &directory, &community).await?;
            tracing::info!(command = "import", ?report, "Import complete");
            println!("{}", report.title);
            println!("deposit id: {}", report.deposit_id);
        }
        Commands::Export {
            deposit_id,
            download_dir,
        } => {
            tracing::info!(command = "export", deposit_id = %deposit_id, "Starting export");
            let report = export_deposit(&api, &store, deposit_id.trim(), &download_dir).await?;
            tracing::info!(command = "export", ?report, "Export complete");
            println!("{}", report.archive.display());
        }
        Commands::Summary { orcid } => {
            tracing::info!(command = "summary", orcid = %orcid, "Fetching summary");
            let summary = fetch_user_summary(&api, &orcid).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
