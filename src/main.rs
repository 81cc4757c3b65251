//! salad-mock CLI
//!
//! Entry point for the mock Saleae Logic 2 Automation server. Loads a
//! scenario document, compiles it into a plan, and serves the automation
//! surface over TCP until interrupted.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use salad_mock::{compile, serve, MockServer, ScenarioConfig};

#[derive(Debug, Parser)]
#[command(name = "salad-mock")]
#[command(about = "Mock Saleae Logic 2 Automation server", version)]
struct Cli {
    /// Path to the scenario YAML document.
    #[arg(long)]
    config: PathBuf,

    /// Bind host.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Bind port.
    #[arg(long, default_value_t = 10431)]
    port: u16,

    /// Log level (trace|debug|info|warn|error|fatal|panic).
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match normalize_log_level(&cli.log_level) {
        Ok(level) => level,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(level);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let cfg = ScenarioConfig::load(&cli.config)?;
    let plan = compile(cfg)?;
    let server = Arc::new(MockServer::new(plan));

    let addr = format!("{}:{}", cli.host, cli.port);
    let handle = serve(server, &addr)?;
    tracing::info!(addr = %handle.local_addr(), "mock server started");

    let (stop_tx, stop_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })?;
    let _ = stop_rx.recv();

    tracing::info!("shutting down mock server");
    handle.shutdown();
    Ok(())
}

/// Accept the full level vocabulary of the real server's logger; tracing has
/// no fatal/panic levels, so both collapse into error.
fn normalize_log_level(level: &str) -> Result<&'static str, String> {
    match level.to_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" => Ok("warn"),
        "error" | "fatal" | "panic" => Ok("error"),
        other => Err(format!(
            "invalid --log-level {other:?} (trace|debug|info|warn|error|fatal|panic)"
        )),
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
