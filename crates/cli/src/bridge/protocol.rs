// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire format between the bridge parent and its child process.
//!
//! The parent writes one [`InvocationRequest`] as a JSON line on the child's
//! stdin. The child answers with a single marker line on stdout:
//!
//! ```text
//! RESPONSE::{"error":<obj|null>,"response":<any|null>}::RESPONSE
//! ```
//!
//! Anything else the child prints is ignored; the first marker wins.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{BridgeError, RemoteError};

pub const MARKER_OPEN: &str = "RESPONSE::";
pub const MARKER_CLOSE: &str = "::RESPONSE";

/// Namespace prepended to the derived client module name.
pub const CLIENT_MODULE_PREFIX: &str = "@aws-sdk/client-";

const MARKER_PATTERN: &str = r"RESPONSE::(\{.*\})::RESPONSE";

/// One remote call: which client, which method, how to construct the client,
/// and the method parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub service: String,
    pub method: String,
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub params: Value,
}

impl InvocationRequest {
    pub fn new(
        service: impl Into<String>,
        method: impl Into<String>,
        config: Value,
        params: Value,
    ) -> Self {
        Self { service: service.into(), method: method.into(), config, params }
    }

    pub fn module_name(&self) -> String {
        client_module_name(&self.service)
    }
}

/// Payload carried inside the marker. Both keys are always present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvocationOutcome {
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub response: Option<Value>,
}

impl InvocationOutcome {
    pub fn success(response: Value) -> Self {
        Self { error: None, response: Some(response) }
    }

    pub fn failure(error: Value) -> Self {
        Self { error: Some(error), response: None }
    }

    /// Error outcome carrying only a `message` field.
    pub fn message(message: impl Into<String>) -> Self {
        Self::failure(serde_json::json!({ "message": message.into() }))
    }
}

/// Derive the client module for a service identifier.
///
/// Every maximal run of ASCII uppercase letters becomes `-` followed by the
/// run lowercased, then a single leading `-` is stripped:
/// `S3` -> `@aws-sdk/client-s3`, `DynamoDB` -> `@aws-sdk/client-dynamo-db`,
/// `CloudWatchLogs` -> `@aws-sdk/client-cloud-watch-logs`.
pub fn client_module_name(service: &str) -> String {
    let mut name = String::with_capacity(service.len() + 4);
    let mut in_run = false;
    for c in service.chars() {
        if c.is_ascii_uppercase() {
            if !in_run {
                name.push('-');
                in_run = true;
            }
            name.push(c.to_ascii_lowercase());
        } else {
            in_run = false;
            name.push(c);
        }
    }
    let name = name.strip_prefix('-').unwrap_or(&name);
    format!("{CLIENT_MODULE_PREFIX}{name}")
}

/// Rewrite a raw load/construct/dispatch failure into the message callers
/// pattern-match on.
pub fn classify_failure(service: &str, method: &str, raw: &str) -> String {
    if raw.contains("is not a function") {
        format!("AWS.{service}.{method} is not a function")
    } else if raw.contains("is not a constructor") || raw.contains("Cannot find module") {
        format!("AWS.{service} is not a constructor")
    } else {
        raw.to_owned()
    }
}

pub fn encode_marker(outcome: &InvocationOutcome) -> serde_json::Result<String> {
    let json = serde_json::to_string(outcome)?;
    Ok(format!("{MARKER_OPEN}{json}{MARKER_CLOSE}"))
}

/// Error marker carrying only `message`, for when `encode_marker` fails.
pub fn fallback_marker(message: &str) -> String {
    let json = serde_json::json!({ "error": { "message": message }, "response": null });
    format!("{MARKER_OPEN}{json}{MARKER_CLOSE}")
}

/// First marker payload in `output`, without the delimiters.
pub fn extract_marker(output: &str) -> Option<&str> {
    let pattern = Regex::new(MARKER_PATTERN).ok()?;
    pattern.captures(output).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Turn the child's combined output into the call result.
pub fn parse_output(output: &str) -> Result<Value, BridgeError> {
    let Some(json) = extract_marker(output) else {
        return Err(BridgeError::Protocol { output: output.to_owned() });
    };
    let outcome: InvocationOutcome =
        serde_json::from_str(json).map_err(|source| BridgeError::Malformed { source })?;
    match outcome.error {
        Some(error) if !error.is_null() => Err(BridgeError::Remote(RemoteError::from_value(error))),
        _ => Ok(outcome.response.unwrap_or(Value::Null)),
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
