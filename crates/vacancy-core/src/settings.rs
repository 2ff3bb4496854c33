use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Salary statistics for job-vacancy exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "vacancy-stats",
    about = "Salary statistics for job-vacancy exports",
    version
)]
pub struct Settings {
    /// What to do with the input
    #[arg(long, default_value = "stats", value_parser = ["stats", "vacancies", "split", "convert", "currencies"])]
    pub mode: String,

    /// Input CSV file, or a directory of per-year CSV files (prompted for if omitted)
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,

    /// Job-title substring to filter on (prompted for if omitted)
    #[arg(long, short = 'p')]
    pub profession: Option<String>,

    /// Exact area name; restricts the profession views to that city
    #[arg(long)]
    pub area: Option<String>,

    /// Listing filter as `Label: value`, e.g. `Навыки: Git, Linux`
    #[arg(long)]
    pub filter: Option<String>,

    /// Column label to sort the listing by
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort the listing in descending order
    #[arg(long)]
    pub reverse: bool,

    /// Listing rows to show: `start [end]`, 1-based, end exclusive
    #[arg(long)]
    pub range: Option<String>,

    /// Comma-separated column labels to show in the listing
    #[arg(long)]
    pub columns: Option<String>,

    /// Monthly exchange-rate CSV (built-in fixed rates if omitted)
    #[arg(long)]
    pub rates: Option<PathBuf>,

    /// Output path: JSON report (stats, vacancies, currencies), directory (split) or CSV (convert)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Show the report in an interactive terminal view
    #[arg(long)]
    pub tui: bool,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Minimum occurrences for a currency to be listed in `currencies` mode
    #[arg(long, default_value = "5000")]
    pub min_currency_count: u64,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.vacancy-stats/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profession: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rates: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

impl LastUsedParams {
    /// Default path of the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir`.
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".vacancy-stats").join("last_used.json")
    }

    /// Load persisted params; `Default` when the file is absent or unreadable.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Write params via a temp file and rename, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at `path` if it exists.
    pub fn clear_at(path: &Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments, fill gaps from the last run and persist
    /// the merged result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] with explicit arguments and
    /// config location.
    pub fn load_with_last_used_impl(args: Vec<std::ffi::OsString>, config_path: &Path) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::apply_debug(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins; clap keys args by field name.
        if !is_arg_explicitly_set(&matches, "input") && settings.input.is_none() {
            settings.input = last.input;
        }
        if !is_arg_explicitly_set(&matches, "profession") && settings.profession.is_none() {
            settings.profession = last.profession;
        }
        if !is_arg_explicitly_set(&matches, "rates") && settings.rates.is_none() {
            settings.rates = last.rates;
        }
        if !is_arg_explicitly_set(&matches, "theme") {
            if let Some(v) = last.theme {
                settings.theme = v;
            }
        }

        settings = Self::apply_debug(settings);

        let params = LastUsedParams::from(&settings);
        let _ = params.save_to(config_path);

        settings
    }

    /// Remember the values a prompt filled in, for the next run.
    pub fn remember(&self, config_path: &Path) -> Result<(), std::io::Error> {
        LastUsedParams::from(self).save_to(config_path)
    }

    fn apply_debug(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            input: s.input.clone(),
            profession: s.profession.clone(),
            rates: s.rates.clone(),
            theme: Some(s.theme.clone()),
        }
    }
}

/// `true` when `name` was supplied on the command line (not by default).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
