// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! filer: command-line client for the filer broker

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod color;
mod commands;
mod exit_error;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{decode, get, watch};
use exit_error::ExitError;

#[derive(Parser)]
#[command(
    name = "filer",
    version,
    about = "Fetch files through a filer broker and follow change notifications",
    styles = color::styles()
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a file's contents through the broker
    Get(get::GetArgs),
    /// Print file-change notifications as they arrive
    Watch(watch::WatchArgs),
    /// Decode newline-delimited JSON from stdin, one compact document per line
    Decode(decode::DecodeArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    let filter = std::env::var("FILER_LOG").unwrap_or_else(|_| "warn".to_string());
    if let Err(e) = filer_daemon::telemetry::init(&filter) {
        eprintln!("filer: {}", e);
    }

    if let Err(e) = run(cli).await {
        let code = match e.downcast_ref::<ExitError>() {
            Some(exit) => {
                if !exit.message.is_empty() {
                    eprintln!("{}", exit.message);
                }
                exit.code
            }
            None => {
                eprintln!("{} {:#}", color::error("error:"), e);
                1
            }
        };
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Get(args) => get::handle(args).await,
        Commands::Watch(args) => watch::handle(args).await,
        Commands::Decode(args) => decode::handle(args).await,
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
