// Copyright 2026 Vitis Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vitis::cli;
use vitis::report::ReportKind;

#[derive(Parser)]
#[command(
    name = "vitis",
    about = "Vitis: resilient API over the Embrapa VitiBrasil statistics",
    version
)]
struct Cli {
    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        #[arg(long, default_value = "8080")]
        port: u16,
        /// Directory for the SQLite databases (default ~/.vitis)
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Override the upstream base address
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Fetch one report directly and print it as JSON
    Fetch {
        /// Report family to fetch
        kind: ReportKind,
        #[arg(long, default_value = "1970")]
        year: i32,
        /// 1-based sub-category selector (fan-out reports only)
        #[arg(long)]
        sub_option: Option<u8>,
        /// Directory for the SQLite databases (default ~/.vitis)
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Override the upstream base address
        #[arg(long)]
        base_url: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let directive = if verbose { "vitis=debug" } else { "vitis=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(directive.parse().unwrap()),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Serve {
            port,
            data_dir,
            base_url,
        } => cli::serve_cmd::run(port, data_dir, base_url).await,
        Commands::Fetch {
            kind,
            year,
            sub_option,
            data_dir,
            base_url,
        } => cli::fetch_cmd::run(kind, year, sub_option, data_dir, base_url).await,
    }
}
