//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use testbed::Platform;

/// Sequential asynchronous test orchestration
#[derive(Parser, Debug)]
#[command(name = "testbed")]
#[command(version)]
#[command(about = "Run test suites through their lifecycle hooks one at a time")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the built-in smoke suites
    Run(RunArgs),

    /// List suites and their test methods
    List(ListArgs),

    /// Manage configuration files
    Config(ConfigArgs),

    /// Show environment variable help
    Env,
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Run only this suite
    #[arg(short, long)]
    pub suite: Option<String>,

    /// Run only this test method, skip the others
    #[arg(short, long)]
    pub test: Option<String>,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Batch name shown in reports
    #[arg(short, long)]
    pub batch: Option<String>,

    /// Extra setting handed to tests (key=value, repeatable)
    #[arg(long = "set", value_parser = parse_setting)]
    pub settings: Vec<(String, String)>,

    /// Request cancellation after this many milliseconds
    #[arg(long)]
    pub cancel_after_ms: Option<u64>,

    /// Log phase transitions too
    #[arg(long)]
    pub phases: bool,

    /// Resolve platform specific tests for this host (android, ios, other)
    #[arg(long)]
    pub host: Option<Platform>,
}

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Show test methods of every suite
    #[arg(short, long)]
    pub detailed: bool,

    /// Resolve platform specific tests for this host (android, ios, other)
    #[arg(long)]
    pub host: Option<Platform>,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example configuration file
    Init {
        /// Output path
        #[arg(default_value = "./testbed.yaml")]
        output: String,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file
        file: Option<String>,
    },
}

fn parse_setting(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}
