// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rstreams config`: resolve the configuration chain and print the snapshot.

use std::path::PathBuf;

use anyhow::Context;
use tracing::info;

use crate::bridge::Bridge;
use crate::configuration::{
    ChainProvider, ConfigurationProvider, ConfigurationSnapshot, FileProvider, SecretProvider,
};

#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// Also read this JSON file, after the environment sources.
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Also fetch this Secrets Manager secret, after every other source.
    #[arg(long)]
    pub secret: Option<String>,
    /// Print the snapshot even when required fields are missing.
    #[arg(long)]
    pub allow_incomplete: bool,
}

impl ConfigArgs {
    pub fn chain(&self) -> anyhow::Result<ChainProvider> {
        let mut chain = ChainProvider::default_chain();
        if let Some(ref path) = self.file {
            chain = chain.with(FileProvider::new(path));
        }
        if let Some(ref secret) = self.secret {
            chain = chain.with(SecretProvider::new(Bridge::from_env()?, secret));
        }
        Ok(chain)
    }
}

/// Run the `rstreams config` subcommand. Returns a process exit code.
pub async fn run(args: &ConfigArgs) -> i32 {
    match resolve(args).await.and_then(|s| super::print_json(&serde_json::to_value(s)?)) {
        Ok(()) => 0,
        Err(e) => super::report(&e),
    }
}

async fn resolve(args: &ConfigArgs) -> anyhow::Result<ConfigurationSnapshot> {
    let mut chain = args.chain()?;
    let snapshot = tokio::task::spawn_blocking(move || chain.snapshot())
        .await
        .context("configuration refresh panicked")?;

    if args.allow_incomplete {
        return Ok(snapshot);
    }
    let snapshot = snapshot.require_complete()?;
    info!(region = snapshot.region.as_deref().unwrap_or_default(), "configuration complete");
    Ok(snapshot)
}
