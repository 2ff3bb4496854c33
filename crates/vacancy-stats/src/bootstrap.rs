use std::fs::OpenOptions;
use std::future::Future;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Context};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure `~/.vacancy-stats/` and `~/.vacancy-stats/logs/` exist.
pub fn ensure_directories() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    ensure_directories_in(&home)
}

/// Create the application directory hierarchy under `base` and return the
/// application directory.
pub fn ensure_directories_in(base: &Path) -> anyhow::Result<PathBuf> {
    let app_dir = base.join(".vacancy-stats");
    std::fs::create_dir_all(app_dir.join("logs"))
        .with_context(|| format!("cannot create {}", app_dir.display()))?;
    Ok(app_dir)
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a CLI level name to an [`EnvFilter`] directive.
///
/// Unknown names fall back to `"info"`.
pub fn filter_directive(log_level: &str) -> &'static str {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARNING" | "WARN" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "info",
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Events go to stderr, or to `log_file` (appended, without ANSI colours)
/// when one is given.
pub fn setup_logging(log_level: &str, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(filter_directive(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (stderr_layer, file_layer) = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file));
            (None, Some(layer))
        }
        None => {
            let layer = fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr);
            (Some(layer), None)
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("tracing subscriber already installed")?;

    Ok(())
}

// ── Interactive input ──────────────────────────────────────────────────────────

/// Print `label`, read one line from `input` and return it trimmed.
///
/// End of input yields an empty string.
pub fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, label: &str) -> anyhow::Result<String> {
    write!(output, "{label}: ")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

// ── Interruption ───────────────────────────────────────────────────────────────

/// Drive `work` to completion unless `interrupt` resolves first, in which case
/// the run fails with `interrupted` and the process exits non-zero.
pub async fn until_interrupted<T, W, I>(work: W, interrupt: I) -> anyhow::Result<T>
where
    W: Future<Output = anyhow::Result<T>>,
    I: Future,
{
    tokio::select! {
        result = work => result,
        _ = interrupt => {
            tracing::info!("Ctrl+C received; abandoning analysis");
            bail!("interrupted")
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
