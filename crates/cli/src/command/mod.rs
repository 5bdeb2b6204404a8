// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI subcommands: `invoke-child`, `invoke`, `config`, `decrypt`, `encrypt`.
//!
//! Each `run` returns a process exit code. Failures carrying an
//! [`ErrorCode`] exit with that code's status; anything else exits 1.

pub mod child;
pub mod invoke;
pub mod resolve;
pub mod secret;

use crate::aws::AwsError;
use crate::bridge::BridgeError;
use crate::config::{Command, Config};
use crate::configuration::IncompleteConfiguration;
use crate::error::ErrorCode;

/// Dispatch the parsed command.
pub async fn run(config: Config) -> i32 {
    match config.command {
        Command::InvokeChild => child::run().await,
        Command::Invoke(ref args) => invoke::run(args).await,
        Command::Config(ref args) => resolve::run(args).await,
        Command::Decrypt(ref args) => secret::run_decrypt(args).await,
        Command::Encrypt(ref args) => secret::run_encrypt(args).await,
    }
}

/// The taxonomy code of the first typed error in `err`'s chain.
pub fn error_code(err: &anyhow::Error) -> Option<ErrorCode> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<BridgeError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<AwsError>() {
            Some(e.code())
        } else {
            cause.downcast_ref::<IncompleteConfiguration>().map(IncompleteConfiguration::code)
        }
    })
}

/// Print `err` to stderr and map it to an exit code.
pub fn report(err: &anyhow::Error) -> i32 {
    match error_code(err) {
        Some(code) => {
            eprintln!("error [{code}]: {err:#}");
            code.exit_code()
        }
        None => {
            eprintln!("error: {err:#}");
            1
        }
    }
}

/// Print a JSON value on stdout.
fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
