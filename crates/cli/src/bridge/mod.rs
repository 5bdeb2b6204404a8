// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blocking invocation of asynchronous client calls through a child process.
//!
//! [`Bridge::invoke`] starts a fresh child (by default this executable's
//! `invoke-child` subcommand), hands it one [`InvocationRequest`], blocks
//! until it exits, and extracts the single result marker from its combined
//! output. Each call is fully isolated: no client or connection outlives
//! the child.

pub mod child;
pub mod client;
pub mod error;
pub mod protocol;
pub mod service;

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde_json::Value;
use tracing::debug;

pub use child::Completion;
pub use client::{ClientError, ClientFactory, ClientRegistry, ServiceClient, ServiceModule};
pub use error::{BridgeError, RemoteError};
pub use protocol::{client_module_name, InvocationOutcome, InvocationRequest};
pub use service::SyncService;

/// Subcommand that runs the child side.
pub const CHILD_SUBCOMMAND: &str = "invoke-child";

/// Overrides the program the bridge spawns.
pub const BRIDGE_BIN_ENV: &str = "RSTREAMS_BRIDGE_BIN";

/// How to start the child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bridge {
    program: PathBuf,
    args: Vec<OsString>,
}

impl Bridge {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), args: Vec::new() }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// This executable, running its `invoke-child` subcommand.
    pub fn current_exe() -> Result<Self, BridgeError> {
        let exe = std::env::current_exe().map_err(BridgeError::Spawn)?;
        Ok(Self::new(exe).arg(CHILD_SUBCOMMAND))
    }

    /// `RSTREAMS_BRIDGE_BIN invoke-child` if set, else [`Bridge::current_exe`].
    pub fn from_env() -> Result<Self, BridgeError> {
        match std::env::var_os(BRIDGE_BIN_ENV).filter(|v| !v.is_empty()) {
            Some(bin) => Ok(Self::new(bin).arg(CHILD_SUBCOMMAND)),
            None => Self::current_exe(),
        }
    }

    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    /// Call `service.method(params)` on a client built from `config`,
    /// blocking the calling thread until the child exits.
    ///
    /// The child's exit status is not consulted; only the marker matters.
    pub fn invoke(
        &self,
        service: &str,
        method: &str,
        config: &Value,
        params: &Value,
    ) -> Result<Value, BridgeError> {
        let request = InvocationRequest::new(service, method, config.clone(), params.clone());
        let line = serde_json::to_string(&request).map_err(BridgeError::Encode)?;

        debug!(%service, %method, program = %self.program.display(), "spawning bridge child");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(BridgeError::Spawn)?;

        if let Some(mut stdin) = child.stdin.take() {
            // A child that exits without reading closes the pipe early.
            if let Err(e) = writeln!(stdin, "{line}") {
                debug!(err = %e, "bridge child did not accept request");
            }
        }

        let output = child.wait_with_output().map_err(BridgeError::Spawn)?;
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        debug!(status = ?output.status, bytes = combined.len(), "bridge child exited");

        protocol::parse_output(&combined)
    }

    /// Typed handle for one service with fixed construction options.
    pub fn service(&self, name: impl Into<String>, config: Value) -> SyncService {
        SyncService::new(self.clone(), name, config)
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
