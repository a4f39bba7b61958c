//! GDAO daemon: entry point for running a GDAO node.
//!
//! The node reads one JSON command per line on stdin and answers with one
//! JSON reply per line on stdout. Logs go to stderr.

mod settlement;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use gdao_node::{init_logging, reply, Command as NodeCommand, DaoEvent, DaoNode, NodeConfig};
use gdao_types::{Environment, SystemClock};

use crate::settlement::OfflineSettlement;

#[derive(Parser, Debug)]
#[command(name = "gdao-daemon", about = "GDAO token, staking and governance node")]
struct Cli {
    /// Deployment environment: "development", "testing" or "production".
    /// When a config file is provided, defaults to the file's value.
    #[arg(long, env = "GDAO_ENVIRONMENT")]
    environment: Option<Environment>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "GDAO_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "GDAO_LOG_FORMAT")]
    log_format: Option<String>,

    /// Seconds between proposal sweeps. Zero leaves resolution lazy.
    #[arg(long, env = "GDAO_SWEEP_INTERVAL")]
    sweep_interval: Option<u64>,

    /// Answer the `metrics` command with Prometheus text.
    #[arg(long, env = "GDAO_ENABLE_METRICS")]
    metrics: bool,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "GDAO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Run the node over stdin/stdout.
    Run,
    /// Print the effective configuration as TOML and exit.
    PrintConfig,
}

/// File config (or defaults) with CLI overrides applied.
fn effective_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => NodeConfig::default(),
    };
    if let Some(environment) = cli.environment {
        config.environment = environment;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    if let Some(secs) = cli.sweep_interval {
        config.sweep_interval_secs = secs;
    }
    config.enable_metrics |= cli.metrics;
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = effective_config(&cli)?;

    match cli.command {
        Command::PrintConfig => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        Command::Run => {
            init_logging(config.log_format()?, &config.log_level)?;
            if let Some(path) = &cli.config {
                tracing::info!("Loaded config from {}", path.display());
            }
            run(config).await
        }
    }
}

async fn run(config: NodeConfig) -> anyhow::Result<()> {
    if config.settle_on_chain {
        tracing::warn!(
            "settle_on_chain is set but no settlement backend is attached; \
             transfer proposals will fail to execute"
        );
    }
    tracing::info!(
        environment = config.environment.as_str(),
        sweep_interval_secs = config.sweep_interval_secs,
        metrics = config.enable_metrics,
        "starting GDAO node"
    );

    let mut node = DaoNode::new(config, Arc::new(OfflineSettlement), Arc::new(SystemClock))?;
    node.subscribe(Box::new(|event: &DaoEvent| match serde_json::to_string(event) {
        Ok(json) => tracing::info!(target: "gdao::events", %json, "event"),
        Err(e) => tracing::warn!(error = %e, "failed to encode event"),
    }));
    node.start();

    let shutdown = node.shutdown_controller();
    let mut shutdown_rx = shutdown.subscribe();
    let signals = tokio::spawn(async move { shutdown.wait_for_signal().await });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.triggered() => {
                tracing::info!("shutdown signal received, stopping node");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::info!("input closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let outcome = match NodeCommand::parse(&line) {
                    Ok(command) => node.dispatch(command).await,
                    Err(e) => Err(e),
                };
                let mut out = reply(outcome).to_string();
                out.push('\n');
                stdout.write_all(out.as_bytes()).await?;
                stdout.flush().await?;
            }
        }
    }

    node.stop().await;
    signals.abort();
    tracing::info!("GDAO daemon exited cleanly");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "gdao-daemon",
            "--environment",
            "testing",
            "--log-format",
            "json",
            "--sweep-interval",
            "5",
            "--metrics",
            "run",
        ])
        .unwrap();
        let config = effective_config(&cli).unwrap();
        assert_eq!(config.environment, Environment::Testing);
        assert_eq!(config.log_format, "json");
        assert_eq!(config.sweep_interval_secs, 5);
        assert!(config.enable_metrics);
    }

    #[test]
    fn unknown_environment_is_a_usage_error() {
        assert!(Cli::try_parse_from(["gdao-daemon", "--environment", "staging", "run"]).is_err());
    }

    #[test]
    fn invalid_log_format_fails_validation() {
        let cli =
            Cli::try_parse_from(["gdao-daemon", "--log-format", "xml", "print-config"]).unwrap();
        assert!(effective_config(&cli).is_err());
    }
}
