// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure classes shared by the resolver, the bridge, and the secret envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// A required configuration field is absent. Never raised by the
    /// resolver itself; reported by callers that inspect completeness.
    ConfigurationIncomplete,
    BridgeSpawnFailure,
    BridgeProtocolViolation,
    BridgeRemoteFailure,
    SecretServiceFailure,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigurationIncomplete => "CONFIGURATION_INCOMPLETE",
            Self::BridgeSpawnFailure => "BRIDGE_SPAWN_FAILURE",
            Self::BridgeProtocolViolation => "BRIDGE_PROTOCOL_VIOLATION",
            Self::BridgeRemoteFailure => "BRIDGE_REMOTE_FAILURE",
            Self::SecretServiceFailure => "SECRET_SERVICE_FAILURE",
        }
    }

    /// Process exit code used by the CLI when a command fails with this code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigurationIncomplete => 3,
            Self::BridgeSpawnFailure => 4,
            Self::BridgeProtocolViolation => 5,
            Self::BridgeRemoteFailure => 6,
            Self::SecretServiceFailure => 7,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
