mod commands;
mod logging;
mod progress;

use std::path::{Path, PathBuf};
use std::process;

use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use media_catalog_core::classify::TypeTable;
use media_catalog_core::collector;
use media_catalog_core::engine::PrimaryFillOutcome;
use media_catalog_core::enrich;
use media_catalog_core::export;
use media_catalog_core::{
    AppConfig, DatabaseConfig, EngineConfig, ExecMode, MediaCandidate, PgCatalog, ReconcileEngine,
};
use progress::CliReporter;
use tracing::{error, info, warn};

const EXPORT_FILE: &str = "media.zip";

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match media_catalog_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    let outcome = match args.command {
        Some(Commands::PrimaryFill {
            root_dir,
            pg_settings,
            parallel,
            calculate_hash,
            host,
        }) => run_primary_fill(
            &config,
            &root_dir,
            pg_settings.as_deref(),
            exec_mode(parallel),
            calculate_hash,
            host,
        ),
        Some(Commands::IncrementalFill {
            root_dir,
            source_file,
            pg_settings,
            parallel,
            calculate_hash,
            host,
        }) => run_incremental_fill(
            &config,
            root_dir.as_deref(),
            source_file.as_deref(),
            &pg_settings,
            exec_mode(parallel),
            calculate_hash,
            host,
        ),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = outcome {
        error!("Error: {}", err);
        process::exit(1);
    }
}

fn exec_mode(parallel: bool) -> ExecMode {
    if parallel {
        ExecMode::Parallel
    } else {
        ExecMode::Sequential
    }
}

fn host_identity(host: Option<String>) -> String {
    host.unwrap_or_else(|| {
        hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "localhost".to_string())
    })
}

/// Collect, enrich and optionally fingerprint everything under `root`.
fn gather_candidates(
    config: &AppConfig,
    root: &Path,
    mode: ExecMode,
    calculate_hash: bool,
    host: &str,
    reporter: &CliReporter,
) -> Result<Vec<MediaCandidate>, media_catalog_core::Error> {
    let types = TypeTable::built_in().with_overrides(config.media_types.clone());
    let collected = collector::collect_from_dir(root, mode, &types, host, reporter)?;
    let mut candidates = enrich::apply_metadata(collected.candidates, mode, reporter);
    if calculate_hash {
        candidates = enrich::compute_hashes(candidates, mode, reporter);
    }
    Ok(candidates)
}

fn run_primary_fill(
    config: &AppConfig,
    root_dir: &Path,
    pg_settings: Option<&Path>,
    mode: ExecMode,
    calculate_hash: bool,
    host: Option<String>,
) -> Result<(), media_catalog_core::Error> {
    let host = host_identity(host);
    let reporter = CliReporter::new();
    let candidates = gather_candidates(config, root_dir, mode, calculate_hash, &host, &reporter)?;

    match pg_settings {
        Some(settings_path) => {
            let mut store = open_catalog(settings_path)?;
            let outcome =
                media_catalog_core::primary_fill(&mut store, &candidates, &EngineConfig::default())?;
            match outcome {
                PrimaryFillOutcome::Filled(count) => {
                    println!();
                    info!("Primary fill: {} records", format!("{}", count).green());
                }
                PrimaryFillOutcome::CatalogNotEmpty => {
                    warn!("Catalog already has records; use incremental-fill instead");
                }
            }
        }
        None => {
            let out = PathBuf::from(EXPORT_FILE);
            export::write_media_file(&out, &candidates)?;
            println!();
            info!(
                "No database configured; exported {} entries to {}",
                format!("{}", candidates.len()).green(),
                out.display()
            );
        }
    }
    Ok(())
}

fn run_incremental_fill(
    config: &AppConfig,
    root_dir: Option<&Path>,
    source_file: Option<&Path>,
    pg_settings: &Path,
    mode: ExecMode,
    calculate_hash: bool,
    host: Option<String>,
) -> Result<(), media_catalog_core::Error> {
    let host = host_identity(host);
    let reporter = CliReporter::new();

    // clap's source group guarantees exactly one of the two is present.
    let candidates = match (root_dir, source_file) {
        (Some(root), _) => gather_candidates(config, root, mode, calculate_hash, &host, &reporter)?,
        (None, Some(file)) => export::read_media_file(file)?,
        (None, None) => unreachable!("argument group requires a source"),
    };

    let store = open_catalog(pg_settings)?;
    let mut engine = ReconcileEngine::new(store, host, EngineConfig::default());
    let counters = engine.run(candidates, &reporter)?;

    println!();
    info!(
        "Reconciled: {} inserted, {} updated, {} present here, {} on other hosts",
        format!("{}", counters.inserted).green(),
        format!("{}", counters.updated).cyan(),
        format!("{}", counters.exists_here).cyan(),
        format!("{}", counters.exists_elsewhere).yellow(),
    );
    Ok(())
}

fn open_catalog(settings_path: &Path) -> Result<PgCatalog, media_catalog_core::Error> {
    let db_config = DatabaseConfig::load(settings_path)?;
    let mut store = PgCatalog::connect(&db_config)?;
    store.ensure_schema()?;
    Ok(store)
}
