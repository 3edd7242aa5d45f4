//! testbed - sequential asynchronous test orchestration
//!
//! Launcher for the built-in smoke suites.
//!
//! ## Usage
//!
//! ```bash
//! # Run every smoke suite
//! testbed run
//!
//! # Run one suite, and only one test inside it
//! testbed run --suite SmokeOutcomes --test test_skip
//!
//! # Hand a setting to the tests
//! testbed run --set greeting=hello
//!
//! # Write an example configuration file
//! testbed config init ./testbed.yaml
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod cli;

use cli::Args;
use testbed::config::{print_env_help, ConfigFile, EnvConfig, RunConfig};
use testbed::smoke::smoke_suites;
use testbed::utils::{init_logger, LogLevel};
use testbed::{MonitorGroup, Platform, TestRunner, TracingMonitor};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        cli::Command::Run(run_args) => {
            let passed = run_tests(run_args, args.verbose).await?;
            if !passed {
                std::process::exit(1);
            }
        }
        cli::Command::List(list_args) => {
            list_suites(list_args);
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args)?;
        }
        cli::Command::Env => {
            print_env_help();
        }
    }

    Ok(())
}

/// Resolve the run configuration: file, then environment, then flags
fn resolve_config(args: &cli::RunArgs, env: &EnvConfig) -> Result<RunConfig> {
    let file = match args.config.as_ref().or(env.config_file.as_ref()) {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::load_default()?,
    };

    let mut config = file.run;
    config.apply_env(env);

    if let Some(batch) = &args.batch {
        config.batch_name = batch.clone();
    }
    if let Some(suite) = &args.suite {
        config.run_only_suite = Some(suite.clone());
    }
    if let Some(test) = &args.test {
        config.run_only_test = Some(test.clone());
    }
    for (key, value) in &args.settings {
        config.settings.insert(key.clone(), value.clone());
    }
    Ok(config)
}

async fn run_tests(args: cli::RunArgs, verbose: bool) -> Result<bool> {
    let env = EnvConfig::load();
    let config = resolve_config(&args, &env)?;

    let level = if verbose {
        LogLevel::Debug
    } else {
        config.log_level.parse().unwrap_or_default()
    };
    init_logger(level);

    let tracing_monitor = if args.phases {
        TracingMonitor::new().with_phase_changes()
    } else {
        TracingMonitor::new()
    };
    let monitor = MonitorGroup::new().with(Arc::new(tracing_monitor));

    let runner = Arc::new(TestRunner::new(config, Arc::new(monitor)));
    let suites = smoke_suites(args.host.unwrap_or_else(Platform::current));

    if let Some(delay) = args.cancel_after_ms {
        let runner = Arc::clone(&runner);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            info!("Cancelling after {}ms", delay);
            runner.cancel_running_tests_then(|| info!("Batch wound down after cancellation"));
        });
    }

    Ok(runner.run_tests(&suites).await)
}

fn list_suites(args: cli::ListArgs) {
    let suites = smoke_suites(args.host.unwrap_or_else(Platform::current));
    println!("Smoke suites:");
    println!("{:-<60}", "");
    for suite in &suites {
        println!("  {:20} - {} tests", suite.name(), suite.test_count());
        if args.detailed {
            for test in suite.tests() {
                println!("      {} ({:?})", test.name(), test.requirement());
            }
        }
    }
}

fn manage_config(args: cli::ConfigArgs) -> Result<()> {
    match args.action {
        cli::ConfigAction::Init { output, force } => {
            let path = Path::new(&output);
            if path.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {output}. Use --force to overwrite."
                );
            }

            ConfigFile::example().save(path)?;
            println!("✓ Configuration file created: {output}");
        }

        cli::ConfigAction::Show { format } => {
            let mut config = ConfigFile::load_default()?;
            config.run.apply_env(&EnvConfig::load());
            let output = if format == "json" {
                serde_json::to_string_pretty(&config)?
            } else {
                serde_yaml::to_string(&config)?
            };
            println!("{output}");
        }

        cli::ConfigAction::Validate { file } => {
            let path = file
                .or_else(|| ConfigFile::find().map(|p| p.to_string_lossy().to_string()))
                .unwrap_or_else(|| "./testbed.yaml".to_string());

            match ConfigFile::load(&path) {
                Ok(_) => println!("✓ Configuration file is valid: {path}"),
                Err(e) => {
                    println!("✗ Configuration file is invalid: {path}");
                    println!("  Error: {e:#}");
                    return Err(e);
                }
            }
        }
    }

    Ok(())
}
