//! # panelforge: project compiler command line
//!
//! Composition root that wires the JSON adapters into the application
//! services and runs one command.
//!
//! ## Responsibilities
//! - Parse the command line and configuration (config file, env vars)
//! - Install the `tracing` subscriber
//! - Construct the file adapters for the snapshot and the document
//! - Construct application services, injecting adapters via port traits
//! - Print the resulting report as JSON on stdout
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use panelforge_adapter_json::{JsonDocumentSink, JsonSnapshotRepository};
use panelforge_app::services::{AssignmentService, CompileService, LinkService};
use panelforge_domain::id::CircuitId;

use crate::config::Config;

/// Compile home-automation projects into programming documents.
#[derive(Parser, Debug)]
#[command(name = "panelforge", version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./panelforge.toml when present)
    #[arg(long, global = true, env = "PANELFORGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a project snapshot into a document
    Compile {
        /// Project snapshot (JSON)
        snapshot: PathBuf,
        /// Where to write the document
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Link every unlinked circuit to a free module channel
    Assign {
        /// Project snapshot (JSON)
        snapshot: PathBuf,
        /// Save the new links into the snapshot
        #[arg(long)]
        write: bool,
        /// Supply voltage, overriding the configuration
        #[arg(long)]
        voltage: Option<f64>,
    },
    /// Link one circuit to a module channel
    Link {
        /// Project snapshot (JSON)
        snapshot: PathBuf,
        /// Circuit id
        circuit: i64,
        /// Module name
        module: String,
        /// 1-based channel
        channel: u16,
    },
    /// Remove the link of one circuit
    Unlink {
        /// Project snapshot (JSON)
        snapshot: PathBuf,
        /// Circuit id
        circuit: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("cannot load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    run(cli.command, &config).await
}

async fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Compile { snapshot, output } => {
            let service = CompileService::new(
                JsonSnapshotRepository::new(&snapshot),
                JsonDocumentSink::new(&output, config.output.pretty),
                config.compile_options(),
            );
            let report = service
                .compile()
                .await
                .with_context(|| format!("cannot compile {}", snapshot.display()))?;
            print_json(&report)
        }
        Command::Assign {
            snapshot,
            write,
            voltage,
        } => {
            let voltage = voltage.unwrap_or(config.electrical.nominal_voltage);
            let service = AssignmentService::new(JsonSnapshotRepository::new(&snapshot), voltage);
            let report = service
                .assign(write)
                .await
                .with_context(|| format!("cannot assign circuits of {}", snapshot.display()))?;
            print_json(&report)
        }
        Command::Link {
            snapshot,
            circuit,
            module,
            channel,
        } => {
            let service = LinkService::new(
                JsonSnapshotRepository::new(&snapshot),
                config.electrical.nominal_voltage,
            );
            let link = service
                .link(CircuitId::new(circuit), &module, channel)
                .await
                .with_context(|| format!("cannot link circuit {circuit}"))?;
            print_json(&link)
        }
        Command::Unlink { snapshot, circuit } => {
            let service = LinkService::new(
                JsonSnapshotRepository::new(&snapshot),
                config.electrical.nominal_voltage,
            );
            let previous = service
                .unlink(CircuitId::new(circuit))
                .await
                .with_context(|| format!("cannot unlink circuit {circuit}"))?;
            print_json(&previous)
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn should_have_consistent_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn should_parse_assign_with_write_flag() {
        let cli = Cli::parse_from(["panelforge", "assign", "project.json", "--write"]);
        assert!(matches!(cli.command, Command::Assign { write: true, voltage: None, .. }));
    }

    #[test]
    fn should_accept_global_config_after_subcommand() {
        let cli = Cli::parse_from([
            "panelforge",
            "compile",
            "project.json",
            "-o",
            "out.json",
            "--config",
            "custom.toml",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    }
}
