//! Command-line interface definitions.
//!
//! Global options (verbosity, color, config file) apply to every
//! subcommand.
//!
//! # Example
//!
//! ```bash
//! # Scan two directories
//! dupesift scan ~/Downloads ~/Documents
//!
//! # Classify .log files as "Logs" and emit JSON
//! dupesift scan ~/data --rule ext:.log:Logs --output json
//!
//! # Remove specific copies, to the trash
//! dupesift delete --trash --yes ~/Downloads/report(1).pdf
//!
//! # Show the rules that would apply
//! dupesift rules --rule 'regex:^IMG_:Camera'
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::rules::RuleDefinition;
use crate::scanner::FingerprintAlgorithm;

/// Find duplicate files and sort every copy into categories.
#[derive(Debug, Parser)]
#[command(name = "dupesift")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (TOML). Defaults to config.toml in the platform
    /// config directory, if present.
    #[arg(long, global = true, value_name = "PATH", env = "DUPESIFT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan directories for duplicate files
    Scan(ScanArgs),
    /// Delete files and report what was removed
    Delete(DeleteArgs),
    /// List classification rules
    Rules(RulesArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directories to scan. Falls back to `roots` from the config file.
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Skip files larger than this (e.g. 500KB, 100MiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub max_size: Option<u64>,

    /// Classification rule as kind:pattern:category (repeatable; appended
    /// after rules from the config file)
    ///
    /// Kinds: path (substring of full path), ext (file name suffix,
    /// case-insensitive), regex (searched in the file name).
    #[arg(long = "rule", value_name = "RULE")]
    pub rules: Vec<RuleDefinition>,

    /// Worker threads for fingerprinting (0 = all hardware threads)
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Fingerprint algorithm
    #[arg(long, value_enum)]
    pub algorithm: Option<FingerprintAlgorithm>,

    /// Glob patterns to ignore (repeatable)
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Follow symbolic links during scan
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Skip zero-length files
    #[arg(long)]
    pub skip_empty: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for the delete subcommand.
#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Files to delete
    #[arg(value_name = "FILE", required = true)]
    pub paths: Vec<PathBuf>,

    /// Move files to the system trash instead of deleting them
    #[arg(long)]
    pub trash: bool,

    /// Confirm the deletion
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the rules subcommand.
#[derive(Debug, Args)]
pub struct RulesArgs {
    /// Extra rule as kind:pattern:category (repeatable)
    #[arg(long = "rule", value_name = "RULE")]
    pub rules: Vec<RuleDefinition>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Accepts anything `bytesize` understands: plain byte counts, decimal
/// units (KB, MB, GB) and binary units (KiB, MiB, GiB).
///
/// # Examples
///
/// ```
/// use dupesift::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1 KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1MB").unwrap(), 1_000_000);
/// ```
///
/// # Errors
///
/// Returns an error if the string is not a size.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    s.parse::<bytesize::ByteSize>()
        .map(|b| b.as_u64())
        .map_err(|e| format!("Invalid size '{}': {}", s, e))
}
