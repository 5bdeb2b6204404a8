// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;

use crate::command::invoke::InvokeArgs;
use crate::command::resolve::ConfigArgs;
use crate::command::secret::{DecryptArgs, EncryptArgs};

/// RStreams bus configuration, blocking AWS calls, and secret decryption.
#[derive(Debug, Parser)]
#[command(name = "rstreams", version, about)]
pub struct Config {
    /// Log format (json or text).
    #[arg(long, env = "RSTREAMS_LOG_FORMAT", default_value = "text", global = true)]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    #[arg(long, env = "RSTREAMS_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Bridge child: read one request line from stdin, print one result marker.
    #[command(hide = true)]
    InvokeChild,
    /// Call a service method through the bridge and print the response.
    Invoke(InvokeArgs),
    /// Resolve the bus configuration and print it.
    Config(ConfigArgs),
    /// Decrypt a base64 ciphertext with KMS.
    Decrypt(DecryptArgs),
    /// Encrypt a string with KMS and print the base64 ciphertext.
    Encrypt(EncryptArgs),
}

impl Config {
    /// Validate the configuration after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        match self.log_format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("invalid log format: {other} (expected json or text)"),
        }

        match self.command {
            Command::Invoke(ref args) => {
                args.params_json()?;
            }
            Command::Encrypt(ref args) => {
                args.encryption_context()?;
            }
            Command::InvokeChild | Command::Config(_) | Command::Decrypt(_) => {}
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
