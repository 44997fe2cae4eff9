//! promptline: prompt fact collector.
//!
//! ```bash
//! # zsh precmd hook, rendering as batches arrive
//! promptline query --cmd-status "$?" --preexec-ts "$PREEXEC_TS" --timeout 5s
//!
//! # diagnostics go to stderr
//! PROMPTLINE_LOG=promptline=debug promptline query
//! ```

use std::io;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use promptline::{Config, Lifecycle, Outcome, QueryArgs, RuntimeError, parse_duration};

/// Asynchronous shell prompt status collector.
#[derive(Parser)]
#[command(name = "promptline")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect prompt facts and stream them to stdout
    Query(QueryCmd),
}

#[derive(Args)]
struct QueryCmd {
    /// Exit status of the previous command
    #[arg(long, default_value = "0")]
    cmd_status: String,

    /// Unix timestamp taken before the previous command ran
    #[arg(long, default_value = "0")]
    preexec_ts: String,

    /// Give up after this long (0 = never)
    #[arg(long, default_value = "0", value_parser = parse_duration)]
    timeout: Duration,

    /// Skip this many ancestors when looking for the shell
    #[arg(long, default_value_t = 0)]
    pid_parent_skip: usize,

    /// Also report the process ancestry as JSON
    #[arg(long)]
    pid_chain: bool,

    /// Delay before the first batch is written
    #[arg(long, default_value = "20ms", value_parser = parse_duration)]
    first_flush: Duration,

    /// Delay between later batches
    #[arg(long, default_value = "100ms", value_parser = parse_duration)]
    flush_interval: Duration,

    /// Deadline for every external command
    #[arg(long, default_value = "10s", value_parser = parse_duration)]
    exec_timeout: Duration,
}

impl QueryCmd {
    fn config(&self) -> Config {
        Config {
            first_flush: self.first_flush,
            flush_interval: self.flush_interval,
            timeout: self.timeout,
            exec_timeout: self.exec_timeout,
            ..Config::default()
        }
    }

    fn args(&self) -> QueryArgs {
        QueryArgs {
            cmd_status: self.cmd_status.clone(),
            preexec_ts: self.preexec_ts.clone(),
            pid_parent_skip: self.pid_parent_skip,
            pid_chain: self.pid_chain,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_env("PROMPTLINE_LOG").unwrap_or_else(|_| EnvFilter::new("off")))
        .init();

    let result = match cli.command {
        Commands::Query(cmd) => query(cmd).await,
    };

    match result {
        Ok(Outcome::Ok) => ExitCode::SUCCESS,
        Ok(outcome) => {
            tracing::debug!(outcome = outcome.as_str(), "query finished early");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("promptline: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn query(cmd: QueryCmd) -> Result<Outcome> {
    if !promptline::stdout_alive() {
        let closed = RuntimeError::Output(io::ErrorKind::BrokenPipe.into());
        return Err(closed).context("stdout is closed");
    }

    let probes = promptline::standard(&cmd.args());
    let outcome = Lifecycle::new(cmd.config())
        .run(probes, tokio::io::stdout())
        .await
        .context("query failed")?;
    Ok(outcome)
}
