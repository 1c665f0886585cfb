// Wed Jan 28 2026 - Alex

use super::args::{Args, Command, InitConfigArgs, LocateArgs, RunArgs};
use crate::config::{RunConfig, StagingMode};
use crate::orchestration::{PipelineOutcome, RunCoordinator, RunReport, RunSummary};
use crate::source::{DataSource, PartitionLocator};
use crate::training::{routine_by_name, CandidateRoutine};
use crate::ui::progress::ProgressManager;
use crate::utils::{format_duration, percentage, pluralize};
use anyhow::{anyhow, bail, Context};
use colored::Colorize;
use std::fs;
use std::path::Path;
use std::sync::Arc;

pub struct CommandHandler {
    quiet: bool,
}

impl CommandHandler {
    pub fn new() -> Self {
        Self { quiet: false }
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn execute(&self, args: Args) -> anyhow::Result<()> {
        self.setup_logging(&args)?;

        match args.command {
            Command::Run(run_args) => self.handle_run(run_args),
            Command::Locate(locate_args) => self.handle_locate(locate_args),
            Command::InitConfig(init_args) => self.handle_init_config(init_args),
        }
    }

    fn setup_logging(&self, args: &Args) -> anyhow::Result<()> {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            _ => log::LevelFilter::Info,
        };

        env_logger::Builder::new()
            .filter_level(level)
            .format_timestamp(None)
            .try_init()
            .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
    }

    fn load_config(path: Option<&Path>) -> anyhow::Result<RunConfig> {
        match path {
            Some(path) => RunConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display())),
            None => Ok(RunConfig::default()),
        }
    }

    fn handle_run(&self, args: RunArgs) -> anyhow::Result<()> {
        args.validate().map_err(|e| anyhow!(e))?;

        let mut config = Self::load_config(args.config.as_deref())?;
        if args.staged {
            config.staging_mode = StagingMode::Staged;
        }
        if let Some(seed) = args.seed {
            config.seed = seed;
        }
        if let Some(threads) = args.threads {
            config.worker_threads = threads;
        }

        let routines = args.routines.iter()
            .filter(|name| !name.trim().is_empty())
            .map(|name| routine_by_name(name).ok_or_else(|| anyhow!("Unknown routine: {}", name)))
            .collect::<anyhow::Result<Vec<Arc<dyn CandidateRoutine>>>>()?;

        let columns = config.schema.columns();
        let sources: Vec<DataSource> = args.sources.iter()
            .map(|path| DataSource::json_lines(path, columns.clone()))
            .collect();

        if !self.quiet {
            println!("{} Evaluating {} in {} mode with {}",
                "[*]".blue(),
                pluralize(sources.len(), "source", "sources"),
                config.staging_mode,
                pluralize(routines.len(), "routine", "routines"));
        }

        let coordinator = RunCoordinator::new(config, routines)?;
        let spinner = ProgressManager::new()
            .with_enabled(!self.quiet)
            .create_spinner("Evaluating partitions...");
        let report = coordinator.run(&sources);
        spinner.finish_and_clear();
        let report = report?;

        if !self.quiet {
            print_report(&report);
        }

        write_summary(&report.summary(), &args.output)?;
        if !self.quiet {
            println!("{} Summary written to: {}", "[+]".green(), args.output.display());
        }
        Ok(())
    }

    fn handle_locate(&self, args: LocateArgs) -> anyhow::Result<()> {
        let config = Self::load_config(args.config.as_deref())?;
        let key_column = args.key_column.unwrap_or(config.key_column);
        let locator = PartitionLocator::new(&key_column);

        for path in &args.sources {
            let source = DataSource::json_lines(path, Vec::new());
            match locator.scan(&source) {
                Ok(scan) => {
                    println!("{} {}: {}",
                        "[+]".green(),
                        source.uri(),
                        pluralize(scan.keys.len(), "partition", "partitions"));
                    for key in &scan.keys {
                        println!("    {}", key);
                    }
                    if scan.skipped_records > 0 {
                        println!("    {} without a usable '{}'",
                            pluralize(scan.skipped_records, "record", "records").yellow(),
                            key_column);
                    }
                }
                Err(e) => println!("{} {}: {}", "[!]".red(), source.uri(), e),
            }
        }
        Ok(())
    }

    fn handle_init_config(&self, args: InitConfigArgs) -> anyhow::Result<()> {
        if args.output.exists() && !args.force {
            bail!("{} already exists; pass --force to overwrite", args.output.display());
        }
        RunConfig::default().save(&args.output)?;
        if !self.quiet {
            println!("{} Config written to: {}", "[+]".green(), args.output.display());
        }
        Ok(())
    }
}

impl Default for CommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn print_report(report: &RunReport) {
    println!();
    println!("{}", "Partitions".cyan().bold());
    println!("{}", "-".repeat(40).cyan());

    for result in report.results() {
        let id = format!("{}/{}", result.source, result.key);
        match &result.outcome {
            PipelineOutcome::Ranked(ranked) => {
                let best = ranked.best();
                println!("  {} {} best={} ({:.4}, {} ranked)",
                    "[+]".green(), id, best.routine.cyan(), best.error_score, ranked.len());
            }
            PipelineOutcome::Empty(reason) => println!("  {} {} {}", "[-]".yellow(), id, reason),
            PipelineOutcome::Failed(failure) => println!("  {} {} {}", "[!]".red(), id, failure),
        }
    }

    println!();
    println!("{} {} attempted, {} with results ({:.1}%), {} empty, {} failed in {}",
        "[+]".green(),
        report.attempted(),
        report.with_results().to_string().green(),
        percentage(report.with_results(), report.attempted()),
        report.empty().to_string().yellow(),
        report.failed().to_string().red(),
        format_duration(report.duration()));

    if report.trainer_failures() > 0 {
        println!("{} {} excluded from rankings",
            "[-]".yellow(),
            pluralize(report.trainer_failures(), "trainer failure", "trainer failures"));
    }
    for failure in report.staging_failures() {
        println!("{} staging {} failed: {}", "[!]".red(), failure.source, failure.error);
    }
}

pub fn write_summary(summary: &RunSummary, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
