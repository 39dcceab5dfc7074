// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cmv: administrative and operational CLI for the meeting-video pipeline.
//!
//! Exit contract: 0 on success, 1 on invalid argument or runtime failure.
//! Commands surface both kinds as errors; `main` owns process termination.

mod commands;
mod context;

use clap::Parser;
use commands::{Cli, Command};
use tracing_subscriber::EnvFilter;

fn init_logging(command: &Command) {
    // Long-running operations log by default; admin commands stay quiet
    // unless CMV_LOG is set.
    let default_level = match command {
        Command::Worker { .. } | Command::Discover { .. } | Command::Reconcile => "info",
        _ => "warn",
    };
    let filter =
        EnvFilter::try_from_env("CMV_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not failures
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };
    init_logging(&cli.command);

    if let Err(e) = commands::run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
