// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use serde_json::{Map, Value};

use crate::error::ErrorCode;

/// Failure of a single bridge call.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The child process could not be started or waited on.
    #[error("{0}")]
    Spawn(#[source] std::io::Error),

    /// The child exited without printing a marker line.
    #[error("Invalid Response: {output}")]
    Protocol { output: String },

    /// A marker was found but its payload is not valid JSON.
    #[error("Invalid Response: {source}")]
    Malformed {
        #[source]
        source: serde_json::Error,
    },

    /// The remote call (or client loading) failed inside the child.
    #[error(transparent)]
    Remote(RemoteError),

    /// The request could not be serialized for the child.
    #[error("failed to encode invocation request: {0}")]
    Encode(#[source] serde_json::Error),
}

impl BridgeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Spawn(_) | Self::Encode(_) => ErrorCode::BridgeSpawnFailure,
            Self::Protocol { .. } | Self::Malformed { .. } => ErrorCode::BridgeProtocolViolation,
            Self::Remote(_) => ErrorCode::BridgeRemoteFailure,
        }
    }

    /// The remote error, if this failure came from the child's marker.
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            Self::Remote(e) => Some(e),
            _ => None,
        }
    }
}

/// Error reconstructed from the marker's `error` object: its message plus
/// every other property the child reported.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteError {
    pub message: String,
    pub fields: Map<String, Value>,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), fields: Map::new() }
    }

    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut fields) => {
                let message = match fields.remove("message") {
                    Some(Value::String(s)) => s,
                    Some(Value::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                };
                Self { message, fields }
            }
            Value::String(message) => Self::new(message),
            other => Self::new(other.to_string()),
        }
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Back to the wire shape, `message` included.
    pub fn to_value(&self) -> Value {
        let mut map = self.fields.clone();
        map.insert("message".to_owned(), Value::String(self.message.clone()));
        Value::Object(map)
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RemoteError {}
