use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use desk_data::store::UserStore;

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure the `~/.userdesk/` directory hierarchy exists.
///
/// Creates the following directories if absent (including any missing parents):
/// - `~/.userdesk/`
/// - `~/.userdesk/logs/`
pub fn ensure_directories() -> anyhow::Result<()> {
    ensure_directories_in(&desk_core::settings::app_dir())
}

pub fn ensure_directories_in(app_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(app_dir)
        .with_context(|| format!("creating {}", app_dir.display()))?;
    std::fs::create_dir_all(app_dir.join("logs"))
        .with_context(|| format!("creating {}", app_dir.join("logs").display()))?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a `--log-level` name to an [`EnvFilter`] directive.
///
/// Level names are case-insensitive; anything unrecognised becomes `"info"`.
pub fn level_directive(log_level: &str) -> &'static str {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARNING" | "WARN" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "info",
    }
}

/// Initialise the global `tracing` subscriber, appending to `log_file`.
///
/// The terminal belongs to the TUI, so nothing is written to stdout or
/// stderr.
pub fn setup_logging(log_level: &str, log_file: &Path) -> anyhow::Result<()> {
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("opening log file {}", log_file.display()))?;

    let filter = EnvFilter::new(level_directive(log_level));

    let layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_thread_ids(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .context("installing tracing subscriber")?;

    Ok(())
}

// ── Store bootstrap ────────────────────────────────────────────────────────────

/// Open the database at `path` and bring its schema up to date.
pub fn open_store(path: &Path) -> anyhow::Result<UserStore> {
    let store = UserStore::open(path)?;
    let applied = store.migrate()?;
    if applied > 0 {
        tracing::info!(path = %path.display(), applied, "database migrated");
    }
    Ok(store)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
