//! Logging for the SmartBank server using tracing
//!
//! Logs always go to stderr. With `log_to_file` they are also appended to
//! smartbank.log in the platform log directory (see `PathManager::logs_dir`).

use config::PathManager;
use std::fs::{self, File, OpenOptions};
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const DEFAULT_FILTER: &str = "info,smartbank_web=debug,smartbank_core=debug,llm=info";
const VERBOSE_FILTER: &str = "debug,hyper=info,hyper_util=info,reqwest=info";

// Keeps the non-blocking file writer alive for the life of the process
static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global tracing subscriber. `RUST_LOG` overrides the filter.
///
/// Call once at startup; later calls leave the first subscriber in place.
pub fn init_logging(verbose: bool, log_to_file: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER })
    });

    let log_file = if log_to_file { open_log_file() } else { None };
    let file_layer = log_file.map(|file| {
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let _ = LOG_GUARD.set(guard);
        fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
    });

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .with_target(true),
        )
        .with(file_layer);

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[smartbank] Failed to set tracing subscriber: {}", e);
        return;
    }

    match PathManager::log_file_path() {
        Some(path) if log_to_file && LOG_GUARD.get().is_some() => {
            tracing::info!("Logging initialized, writing to {:?}", path)
        }
        _ => tracing::info!("Logging initialized, writing to stderr"),
    }
}

fn open_log_file() -> Option<File> {
    let Some(path) = PathManager::log_file_path() else {
        eprintln!("[smartbank] No log path available, logging to stderr only");
        return None;
    };

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("[smartbank] Failed to create log directory {:?}: {}", parent, e);
        }
    }

    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("[smartbank] Failed to open log file {:?}: {}", path, e);
            None
        }
    }
}
