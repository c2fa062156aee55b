//! CLI module for the dispatch engine
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `serve` - Run the engine: seed callers, poll sources and sweep until stopped
//! - `replay` - Feed order and update files through an in-memory engine and print the queues
//! - `dispositions` - Show the disposition states, categories and transitions
//! - `config` - Configuration utilities (init, validate)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Write a starter config and run
//! dispatch config init
//! dispatch serve
//!
//! # Dry-run a day's orders and call outcomes
//! dispatch replay --orders orders.jsonl --updates updates.jsonl --history
//!
//! # Generate shell completions
//! dispatch completions bash > ~/.bash_completion.d/dispatch
//! ```

pub mod completions;
pub mod config;
pub mod dispositions;
pub mod output;
pub mod replay;
pub mod serve;

pub use completions::handle_completions;
pub use config::{handle_config_init, handle_config_validate};
pub use dispositions::handle_dispositions;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Order dispatch - routes storefront orders to verification callers
#[derive(Parser, Debug)]
#[command(
    name = "dispatch",
    version,
    about = "Order distribution and disposition engine"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the engine until interrupted
    Serve(ServeArgs),
    /// Replay order and disposition files through an in-memory engine
    Replay(ReplayArgs),
    /// Show disposition states and allowed transitions
    Dispositions(DispositionsArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "dispatch.toml")]
    pub config: PathBuf,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "DISPATCH_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Override the sweep interval in seconds
    #[arg(long, env = "DISPATCH_SWEEP_INTERVAL")]
    pub sweep_interval: Option<u64>,

    /// Disable the requeue sweep
    #[arg(long)]
    pub no_sweep: bool,

    /// Enable the Prometheus listener
    #[arg(long)]
    pub metrics: bool,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSON-lines file of orders to ingest
    #[arg(short, long)]
    pub orders: PathBuf,

    /// JSON-lines file of disposition updates to apply after ingestion
    #[arg(short, long)]
    pub updates: Option<PathBuf>,

    /// Path to configuration file (callers and dispositions are read from it)
    #[arg(short, long, default_value = "dispatch.toml")]
    pub config: PathBuf,

    /// Add an active caller (repeatable)
    #[arg(long = "caller", value_name = "ID")]
    pub callers: Vec<String>,

    /// Run the closing sweep this many seconds in the future
    #[arg(long, default_value = "0")]
    pub advance_seconds: u64,

    /// Include each order's call history
    #[arg(long)]
    pub history: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct DispositionsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = "dispatch.toml")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
    /// Check a configuration file without starting anything
    Validate(ConfigValidateArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "dispatch.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ConfigValidateArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "dispatch.toml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parse_serve_defaults() {
        let cli = Cli::try_parse_from(["dispatch", "serve"]).unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.config, PathBuf::from("dispatch.toml"));
                assert!(!args.no_sweep);
                assert!(!args.metrics);
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_parse_serve_with_config() {
        let cli = Cli::try_parse_from(["dispatch", "serve", "-c", "custom.toml", "--no-sweep"])
            .unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.config, PathBuf::from("custom.toml"));
                assert!(args.no_sweep);
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_parse_replay() {
        let cli = Cli::try_parse_from([
            "dispatch",
            "replay",
            "--orders",
            "orders.jsonl",
            "--caller",
            "a",
            "--caller",
            "b",
            "--advance-seconds",
            "3600",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Replay(args) => {
                assert_eq!(args.orders, PathBuf::from("orders.jsonl"));
                assert!(args.updates.is_none());
                assert_eq!(args.callers, vec!["a".to_string(), "b".to_string()]);
                assert_eq!(args.advance_seconds, 3600);
                assert!(args.json);
                assert!(!args.history);
            }
            _ => panic!("Expected Replay command"),
        }
    }

    #[test]
    fn test_cli_replay_requires_orders() {
        assert!(Cli::try_parse_from(["dispatch", "replay"]).is_err());
    }

    #[test]
    fn test_cli_parse_dispositions() {
        let cli = Cli::try_parse_from(["dispatch", "dispositions", "--json"]).unwrap();
        match cli.command {
            Commands::Dispositions(args) => assert!(args.json),
            _ => panic!("Expected Dispositions command"),
        }
    }

    #[test]
    fn test_cli_parse_config_validate() {
        let cli = Cli::try_parse_from(["dispatch", "config", "validate", "-c", "x.toml"]).unwrap();
        match cli.command {
            Commands::Config(ConfigCommands::Validate(args)) => {
                assert_eq!(args.config, PathBuf::from("x.toml"))
            }
            _ => panic!("Expected Config Validate command"),
        }
    }
}
