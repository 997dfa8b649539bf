mod render;
mod shell;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use labdiag_core::config::flag_from_env_value;
use labdiag_core::constants::{DEFAULT_DATA_DIR, DEFAULT_RESULTS_KEY};
use labdiag_core::{
    results_to_csv, CoreConfig, DiagnosisEngine, FileKeyValueStore, PrintableReport, ReportMeta,
    SessionStore, Symptom,
};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "labdiag")]
#[command(about = "LabDiag clinical intake demo")]
struct Cli {
    /// Directory holding saved results (overrides LABDIAG_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate symptoms as a guest and print the report
    Diagnose {
        /// Symptom identifiers, e.g. fever cough sore_throat
        #[arg(required = true)]
        symptoms: Vec<Symptom>,
        /// Patient age (optional)
        #[arg(long)]
        age: Option<String>,
        /// Patient gender (optional)
        #[arg(long)]
        gender: Option<String>,
    },
    /// Export saved results as CSV
    Export {
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Start an interactive session
    Shell,
}

/// Resolves core configuration once at startup.
///
/// # Environment Variables
/// - `LABDIAG_DATA_DIR`: directory for saved results (default: "labdiag_data")
/// - `LABDIAG_STORAGE_KEY`: storage key for saved results (default: "labdiag_results")
/// - `LABDIAG_SEED_DEMO`: seed the demo accounts (default: true)
fn resolve_config(data_dir: Option<PathBuf>) -> anyhow::Result<CoreConfig> {
    let data_dir = data_dir
        .or_else(|| std::env::var_os("LABDIAG_DATA_DIR").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    let results_key =
        std::env::var("LABDIAG_STORAGE_KEY").unwrap_or_else(|_| DEFAULT_RESULTS_KEY.into());
    let seed_demo = flag_from_env_value(std::env::var("LABDIAG_SEED_DEMO").ok(), true)?;

    Ok(CoreConfig::new(data_dir, results_key, seed_demo)?)
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("labdiag=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = resolve_config(cli.data_dir)?;
    tracing::debug!("data directory: {}", cfg.data_dir().display());

    match cli.command {
        Some(Commands::Diagnose {
            symptoms,
            age,
            gender,
        }) => {
            let meta = ReportMeta::from_fields(Utc::now(), age, gender);

            let report = DiagnosisEngine::new().evaluate(symptoms, meta);
            let mut stdout = io::stdout().lock();
            render::report(&mut stdout, &report)?;
            writeln!(stdout)?;
            writeln!(
                stdout,
                "{}",
                PrintableReport::new(
                    labdiag_core::constants::GUEST_NAME,
                    Utc::now(),
                    &report
                )
            )?;
        }
        Some(Commands::Export { output }) => {
            let store = SessionStore::open(&cfg, FileKeyValueStore::new(cfg.data_dir()));
            if store.saved_results().is_empty() {
                println!("No data to export");
                return Ok(());
            }

            let csv = results_to_csv(store.saved_results());
            match output {
                Some(path) => {
                    std::fs::write(&path, csv)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("CSV exported to {}", path.display());
                }
                None => println!("{csv}"),
            }
        }
        Some(Commands::Shell) => {
            let mut store = SessionStore::open(&cfg, FileKeyValueStore::new(cfg.data_dir()));
            shell::Shell::new(&mut store, io::stdout().lock()).run(io::stdin().lock())?;
        }
        None => {
            println!("Use 'labdiag --help' for commands");
        }
    }

    Ok(())
}
