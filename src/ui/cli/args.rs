// Wed Jan 28 2026 - Alex

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "partition-orchestrator")]
#[command(author = "Alex")]
#[command(version = "1.0.0")]
#[command(about = "Partition-parallel batch evaluation of candidate routines", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true, default_value = "info")]
    pub log_level: String,

    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate every partition of the given JSON Lines sources.
    Run(RunArgs),
    /// List the partition keys of each source.
    Locate(LocateArgs),
    /// Write a default run configuration.
    InitConfig(InitConfigArgs),
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    #[arg(required = true)]
    pub sources: Vec<PathBuf>,

    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Stage each source into the object store before dispatch.
    #[arg(long)]
    pub staged: bool,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long)]
    pub threads: Option<usize>,

    #[arg(short, long, default_value = "run_summary.json")]
    pub output: PathBuf,

    #[arg(short, long, value_delimiter = ',', default_value = "mean,linear")]
    pub routines: Vec<String>,
}

impl RunArgs {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(missing) = self.sources.iter().find(|p| !p.exists()) {
            return Err(format!("Source does not exist: {}", missing.display()));
        }
        if let Some(config) = &self.config {
            if !config.exists() {
                return Err(format!("Config file does not exist: {}", config.display()));
            }
        }
        if self.threads == Some(0) {
            return Err("Thread count must be greater than 0".to_string());
        }
        if self.routines.iter().all(|r| r.trim().is_empty()) {
            return Err("At least one routine is required".to_string());
        }
        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct LocateArgs {
    #[arg(required = true)]
    pub sources: Vec<PathBuf>,

    #[arg(short, long)]
    pub key_column: Option<String>,

    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct InitConfigArgs {
    #[arg(short, long, default_value = "orchestrator.json")]
    pub output: PathBuf,

    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let args = Args::try_parse_from([
            "partition-orchestrator", "run", "a.jsonl", "b.jsonl", "--staged", "-r", "mean,ridge", "-l", "debug",
        ]).unwrap();
        assert_eq!(args.log_level, "debug");
        let Command::Run(run) = args.command else {
            panic!("expected run");
        };
        assert_eq!(run.sources.len(), 2);
        assert!(run.staged);
        assert_eq!(run.routines, vec!["mean", "ridge"]);
        assert_eq!(run.output, PathBuf::from("run_summary.json"));
    }

    #[test]
    fn test_run_requires_sources() {
        assert!(Args::try_parse_from(["partition-orchestrator", "run"]).is_err());
    }

    #[test]
    fn test_parse_locate_and_init() {
        let args = Args::try_parse_from(["partition-orchestrator", "locate", "a.jsonl", "-k", "store"]).unwrap();
        assert!(matches!(args.command, Command::Locate(LocateArgs { ref key_column, .. }) if key_column.as_deref() == Some("store")));

        let args = Args::try_parse_from(["partition-orchestrator", "-q", "init-config", "-o", "x.json"]).unwrap();
        assert!(args.quiet);
        assert!(matches!(args.command, Command::InitConfig(_)));
    }

    #[test]
    fn test_validate_rejects_missing_source() {
        let args = RunArgs {
            sources: vec![PathBuf::from("/no/such/source.jsonl")],
            config: None,
            staged: false,
            seed: None,
            threads: None,
            output: PathBuf::from("out.json"),
            routines: vec!["mean".to_string()],
        };
        assert!(args.validate().is_err());
    }
}
