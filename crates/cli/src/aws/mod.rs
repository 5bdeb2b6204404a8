// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AWS SDK clients sharing one TLS 1.3 transport.
//!
//! Used directly by the secret envelope and, through [`register_builtin`],
//! as the clients the bridge child can construct. Region and credentials
//! passed by the caller win; anything missing comes from the SDK's default
//! provider chains (environment, shared profile files, web identity, ECS,
//! instance metadata).

pub mod http;
pub mod kms;
pub mod modules;
pub mod services;

use std::sync::Arc;

use aws_config::{BehaviorVersion, SdkConfig};
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use aws_smithy_runtime_api::client::result::SdkError;
use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use aws_types::region::Region;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::bridge::client::ClientRegistry;
use crate::configuration::Credentials;
use crate::error::ErrorCode;

pub use http::{ensure_crypto, transport, TlsHttpClient};
pub use kms::{AwsKmsConnector, EncryptRequest, KeyManagement, KeyManagementConnector, KmsClient};

/// Overrides the KMS endpoint URL.
pub const KMS_ENDPOINT_ENV: &str = "AWS_KMS_ENDPOINT";

/// Overrides the Secrets Manager endpoint URL.
pub const SECRETS_MANAGER_ENDPOINT_ENV: &str = "AWS_SECRETSMANAGER_ENDPOINT";

/// Provider name stamped on credentials supplied by the caller.
const CALLER_CREDENTIALS: &str = "rstreams";

/// Client construction options, in the shape callers pass through the
/// bridge: `{ "region", "credentials": { "accessKeyId", ... }, "endpoint" }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsClientConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl AwsClientConfig {
    pub fn new(region: Option<String>, credentials: Option<Credentials>) -> Self {
        Self { region, credentials, endpoint: None }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn from_value(value: &Value) -> Result<Self, AwsError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value.clone()).map_err(|e| AwsError::Decode(e.to_string()))
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// The explicit endpoint, else the non-empty value of `var`.
    pub fn endpoint_or_env(&self, var: Option<&str>) -> Option<String> {
        self.endpoint
            .clone()
            .filter(|e| !e.is_empty())
            .or_else(|| var.and_then(|v| std::env::var(v).ok()).filter(|e| !e.is_empty()))
    }

    /// Shared SDK configuration over [`TlsHttpClient`].
    ///
    /// Fails with [`AwsError::MissingRegion`] when neither the options nor
    /// the default region chain name a region.
    pub async fn load(&self) -> Result<SdkConfig, AwsError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).http_client(TlsHttpClient::new()?);
        if let Some(region) = self.region.clone().filter(|r| !r.is_empty()) {
            loader = loader.region(Region::new(region));
        }
        if let Some(ref credentials) = self.credentials {
            loader = loader.credentials_provider(sdk_credentials(credentials));
        }

        let sdk = loader.load().await;
        if sdk.region().is_none() {
            return Err(AwsError::MissingRegion);
        }
        Ok(sdk)
    }
}

/// Static caller credentials as an SDK credentials provider.
pub fn sdk_credentials(credentials: &Credentials) -> aws_credential_types::Credentials {
    aws_credential_types::Credentials::new(
        credentials.access_key_id.clone(),
        credentials.secret_access_key.clone(),
        credentials.session_token.clone(),
        None,
        CALLER_CREDENTIALS,
    )
}

/// Failure of an AWS call. Passed to callers unmodified.
#[derive(Debug, thiserror::Error)]
pub enum AwsError {
    #[error("Missing region in config")]
    MissingRegion,
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    /// The service answered with an error.
    #[error("{message}")]
    Service { kind: String, message: String, status: u16 },
    /// The SDK failed before a service answer: credentials, dispatch, timeout.
    #[error("{0}")]
    Sdk(String),
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl AwsError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::SecretServiceFailure
    }

    /// Error object in the shape the bridge child reports.
    pub fn to_remote_value(&self) -> Value {
        match self {
            Self::Service { kind, message, status } => json!({
                "message": message,
                "name": kind,
                "code": kind,
                "$metadata": { "httpStatusCode": status },
            }),
            Self::Sdk(message) => json!({ "message": message, "name": "SdkError" }),
            Self::Transport(e) => json!({
                "message": self.to_string(),
                "name": "TransportError",
                "timeout": e.is_timeout(),
            }),
            _ => json!({ "message": self.to_string(), "name": "Error" }),
        }
    }
}

impl<E> From<SdkError<E, HttpResponse>> for AwsError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    fn from(err: SdkError<E, HttpResponse>) -> Self {
        match err {
            SdkError::ServiceError(context) => {
                let status = context.raw().status().as_u16();
                let err = context.err();
                Self::Service {
                    kind: err.code().unwrap_or("UnknownError").to_owned(),
                    message: err
                        .message()
                        .map(str::to_owned)
                        .unwrap_or_else(|| DisplayErrorContext(err).to_string()),
                    status,
                }
            }
            other => Self::Sdk(DisplayErrorContext(&other).to_string()),
        }
    }
}

/// Register the built-in bridge clients under their service identifiers.
pub fn register_builtin(registry: &mut ClientRegistry) {
    for module in modules::builtin_modules() {
        let export = module.export();
        registry.register_service(export, Arc::new(module));
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
