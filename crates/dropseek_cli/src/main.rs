//! Operator entry point for a drop collection.
//!
//! # Responsibility
//! - Run the scheduled expiry sweep and report it as one JSON line.
//! - Offer read-only diagnostics against a database file.
//!
//! # Invariants
//! - Every command prints exactly one JSON document on stdout.
//! - The process exits non-zero whenever the report is an error.

use clap::{Parser, Subcommand};
use dropseek_core::clock::now_epoch_ms;
use dropseek_core::{
    core_version, default_log_level, init_logging, nearby, run_cleanup, CleanupReport, Coordinate,
    DropService, EngineConfig, SqliteDropStore,
};
use log::warn;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "dropseek")]
#[command(about = "Maintenance and diagnostics for Drop-N-Seek drop collections")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the linked core version
    Ping,

    /// Delete every drop older than 24 hours
    Sweep {
        /// SQLite database file
        #[arg(long)]
        db: PathBuf,

        /// Absolute directory for rolling log files
        #[arg(long)]
        log_dir: Option<PathBuf>,

        /// trace|debug|info|warn|error
        #[arg(long)]
        log_level: Option<String>,
    },

    /// List drops discoverable from a position
    Nearby {
        /// SQLite database file
        #[arg(long)]
        db: PathBuf,

        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Engine config JSON file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Ping => Ok(json!({ "status": "ok", "version": core_version() })),
        Command::Sweep {
            db,
            log_dir,
            log_level,
        } => sweep(db, log_dir, log_level).await,
        Command::Nearby {
            db,
            lat,
            lon,
            config,
        } => list_nearby(db, Coordinate::new(lat, lon), config).await,
    };

    match outcome {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            println!("{}", json!({ "status": "error", "message": message }));
            ExitCode::FAILURE
        }
    }
}

async fn sweep(
    db: PathBuf,
    log_dir: Option<PathBuf>,
    log_level: Option<String>,
) -> Result<serde_json::Value, String> {
    if let Some(dir) = log_dir {
        let level = log_level.as_deref().unwrap_or(default_log_level());
        // A sweep must still run when logging cannot start.
        if let Err(err) = init_logging(level, &dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let store = SqliteDropStore::open(&db).map_err(|err| format!("cannot open store: {err}"))?;
    let report = run_cleanup(&DropService::new(store), now_epoch_ms()).await;
    match &report {
        CleanupReport::Ok { .. } => serde_json::to_value(&report).map_err(|err| err.to_string()),
        CleanupReport::Error { message } => {
            warn!("event=cleanup_invoke module=cli status=error");
            Err(message.clone())
        }
    }
}

async fn list_nearby(
    db: PathBuf,
    origin: Coordinate,
    config: Option<PathBuf>,
) -> Result<serde_json::Value, String> {
    let config = match config {
        Some(path) => EngineConfig::load(path).map_err(|err| err.to_string())?,
        None => EngineConfig::default(),
    };
    if !origin.is_present() {
        return Err("latitude and longitude must be finite".to_string());
    }

    let store = SqliteDropStore::open(&db).map_err(|err| format!("cannot open store: {err}"))?;
    let drops = DropService::new(store)
        .list_drops()
        .await
        .map_err(|err| err.to_string())?;
    let entries = nearby(Some(&origin), &drops, config.discovery_radius_m);
    Ok(json!({ "status": "ok", "count": entries.len(), "drops": entries }))
}
