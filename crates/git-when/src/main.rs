// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! git-when: query git history by date range, author, message and path
//!
//! Installed on `PATH`, the binary is also reachable as `git when`.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use git_when::config::Config;
use git_when::run::{RunError, run};
use tracing::debug;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Logs go to stderr so piped output stays clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_level().into()),
        )
        .init();

    match try_main(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if err
                .downcast_ref::<RunError>()
                .is_some_and(RunError::is_broken_pipe)
            {
                debug!("output closed early");
                return ExitCode::SUCCESS;
            }
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn try_main(config: &Config) -> anyhow::Result<()> {
    config.validate().context("invalid configuration")?;
    let mut stdout = tokio::io::stdout();
    run(config, &mut stdout).await?;
    Ok(())
}
