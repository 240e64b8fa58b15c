//! DupeSift - duplicate file finder with classification
//!
//! Finds byte-identical files across directory trees by content
//! fingerprint, sorts every copy into a category (user rules first, then a
//! built-in taxonomy), and keeps an in-memory cache of duplicate groups that
//! stays coherent as rules are added and files are deleted.
//!
//! The library entry point is [`engine::Deduplicator`]; [`run_app`] drives it
//! from the command line.

pub mod actions;
pub mod activity;
pub mod classify;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod engine;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod rules;
pub mod scanner;
pub mod signal;

use std::io::{self, IsTerminal};
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::actions::DeleteMode;
use crate::activity::{ActivityLog, LogRecorder};
use crate::cli::{Cli, Commands, DeleteArgs, OutputFormat, RulesArgs, ScanArgs};
use crate::config::Config;
use crate::engine::Deduplicator;
use crate::error::ExitCode;
use crate::output::{write_json, JsonDeleteOutput, JsonOutput, JsonRulesOutput, TextOutput};
use crate::progress::Progress;

/// Run the command described by `cli`.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded, a rule is invalid, a
/// scan root cannot be traversed, or the scan is interrupted.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let color = !cli.no_color && io::stdout().is_terminal();
    let quiet = cli.quiet;

    match cli.command {
        Commands::Scan(args) => run_scan(config, args, color, quiet),
        Commands::Delete(args) => run_delete(config, args, color),
        Commands::Rules(args) => run_rules(config, args, color),
    }
}

fn apply_scan_overrides(config: &mut Config, args: &ScanArgs) {
    if !args.paths.is_empty() {
        config.roots = args.paths.clone();
    }
    if let Some(max) = args.max_size {
        config.max_file_size = max;
    }
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    if let Some(algorithm) = args.algorithm {
        config.algorithm = algorithm;
    }
    config.ignore_patterns.extend(args.ignore_patterns.iter().cloned());
    config.follow_symlinks |= args.follow_symlinks;
    config.skip_hidden |= args.skip_hidden;
    config.skip_empty |= args.skip_empty;
    config.rules.extend(args.rules.iter().cloned());
}

fn add_rules(engine: &Deduplicator, config: &Config) -> Result<()> {
    for definition in &config.rules {
        engine
            .add_rule(definition.clone())
            .with_context(|| format!("Rejected {}", definition))?;
    }
    Ok(())
}

fn run_scan(mut config: Config, args: ScanArgs, color: bool, quiet: bool) -> Result<ExitCode> {
    apply_scan_overrides(&mut config, &args);
    if config.roots.is_empty() {
        bail!("No directories to scan: pass one or more PATHs or set `roots` in the config file");
    }

    let handler = signal::install_handler()?;
    let mut finder_config = config.finder_config().with_shutdown_flag(handler.flag());
    if !quiet && !args.no_progress && args.output == OutputFormat::Text {
        finder_config = finder_config.with_progress_callback(Arc::new(Progress::new(false)));
    }

    let engine = Deduplicator::new(finder_config, Arc::new(LogRecorder))
        .with_delete_mode(config.delete_mode);
    add_rules(&engine, &config)?;

    let report = engine
        .scan_with_summary(&config.roots)
        .context("Scan failed")?;

    let exit_code = if report.groups.is_empty() {
        ExitCode::NoDuplicates
    } else {
        ExitCode::Success
    };

    let mut stdout = io::stdout().lock();
    match args.output {
        OutputFormat::Text => {
            TextOutput::new(color).write_groups(&report.groups, &report.summary, &mut stdout)?;
        }
        OutputFormat::Json => {
            write_json(
                &JsonOutput::new(&report.groups, &report.summary, exit_code),
                &mut stdout,
                true,
            )?;
        }
    }

    Ok(exit_code)
}

fn run_delete(config: Config, args: DeleteArgs, color: bool) -> Result<ExitCode> {
    if !args.yes {
        bail!(
            "Refusing to delete {} file(s) without --yes",
            args.paths.len()
        );
    }

    let mode = if args.trash {
        DeleteMode::Trash
    } else {
        config.delete_mode
    };
    log::debug!("Deleting {} path(s) ({})", args.paths.len(), mode);

    let engine =
        Deduplicator::new(config.finder_config(), Arc::new(LogRecorder)).with_delete_mode(mode);
    let outcome = engine.delete_paths(&args.paths);

    let exit_code = if outcome.all_succeeded() {
        ExitCode::Success
    } else {
        ExitCode::PartialDelete
    };

    let mut stdout = io::stdout().lock();
    match args.output {
        OutputFormat::Text => TextOutput::new(color).write_delete(&outcome, &mut stdout)?,
        OutputFormat::Json => write_json(
            &JsonDeleteOutput {
                outcome: &outcome,
                exit_code: exit_code.as_i32(),
            },
            &mut stdout,
            true,
        )?,
    }

    Ok(exit_code)
}

fn run_rules(mut config: Config, args: RulesArgs, color: bool) -> Result<ExitCode> {
    config.rules.extend(args.rules);

    let engine = Deduplicator::new(config.finder_config(), Arc::new(ActivityLog::new()));
    add_rules(&engine, &config)?;
    let rules = engine.list_rules();

    let mut stdout = io::stdout().lock();
    match args.output {
        OutputFormat::Text => TextOutput::new(color).write_rules(&rules, &mut stdout)?,
        OutputFormat::Json => write_json(&JsonRulesOutput { rules: &rules }, &mut stdout, true)?,
    }

    Ok(ExitCode::Success)
}
