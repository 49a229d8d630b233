//! CLI argument parsing definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use taskfarm_core::OrderingMode;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a demo farm squaring numbers on local workers
    Run(RunArgs),

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Number of tasks to submit
    #[arg(long, value_name = "N", default_value_t = 20)]
    pub tasks: usize,

    /// Number of local workers (overrides configuration)
    #[arg(long, value_name = "W")]
    pub workers: Option<usize>,

    /// Result order: completion or submission (overrides configuration)
    #[arg(long, value_name = "ORDER")]
    pub order: Option<OrderingMode>,

    /// Abort this worker mid-run to exercise recovery (example: --kill worker-0)
    #[arg(long, value_name = "WORKER")]
    pub kill: Option<String>,

    /// Delay before --kill fires
    #[arg(long, value_name = "MS", default_value_t = 30)]
    pub kill_after_ms: u64,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the default configuration as YAML
    Sample,

    /// Load and validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_arguments() {
        let cli = Cli::try_parse_from([
            "taskfarm",
            "--log-level",
            "debug",
            "run",
            "--tasks",
            "5",
            "--order",
            "submission",
            "--kill",
            "worker-1",
        ])
        .unwrap();

        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.tasks, 5);
                assert_eq!(args.workers, None);
                assert_eq!(args.order, Some(OrderingMode::SubmissionOrder));
                assert_eq!(args.kill.as_deref(), Some("worker-1"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_config_validate_requires_path() {
        assert!(Cli::try_parse_from(["taskfarm", "config", "validate"]).is_err());

        let cli = Cli::try_parse_from(["taskfarm", "config", "validate", "farm.yaml"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigCommands::Validate { .. }
            }
        ));
    }

    #[test]
    fn test_invalid_order_is_rejected() {
        assert!(Cli::try_parse_from(["taskfarm", "run", "--order", "random"]).is_err());
    }
}
