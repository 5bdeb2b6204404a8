// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bridge client modules backed by the AWS SDK.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use super::services::{self, Operation};
use super::{AwsClientConfig, KMS_ENDPOINT_ENV, SECRETS_MANAGER_ENDPOINT_ENV};
use crate::bridge::child::Completion;
use crate::bridge::client::{ClientError, ServiceClient, ServiceModule};

/// One service exposed to the bridge child under `export`, with the
/// methods it answers.
#[derive(Debug, Clone)]
pub struct AwsSdkModule {
    export: &'static str,
    endpoint_env: Option<&'static str>,
    operations: BTreeMap<&'static str, Operation>,
}

impl AwsSdkModule {
    pub fn new(export: &'static str) -> Self {
        Self { export, endpoint_env: None, operations: BTreeMap::new() }
    }

    /// Read an endpoint override from `var` when the caller passes none.
    pub fn endpoint_env(mut self, var: &'static str) -> Self {
        self.endpoint_env = Some(var);
        self
    }

    pub fn operation(mut self, method: &'static str, run: Operation) -> Self {
        self.operations.insert(method, run);
        self
    }

    /// Service identifier callers pass to the bridge, e.g. `KMS`.
    pub fn export(&self) -> &'static str {
        self.export
    }

    pub fn operations(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.operations.keys().copied()
    }
}

/// Modules registered by [`ClientRegistry::builtin`].
///
/// [`ClientRegistry::builtin`]: crate::bridge::client::ClientRegistry::builtin
pub fn builtin_modules() -> Vec<AwsSdkModule> {
    vec![
        AwsSdkModule::new("KMS")
            .endpoint_env(KMS_ENDPOINT_ENV)
            .operation("decrypt", services::kms_decrypt)
            .operation("encrypt", services::kms_encrypt),
        AwsSdkModule::new("SecretsManager")
            .endpoint_env(SECRETS_MANAGER_ENDPOINT_ENV)
            .operation("getSecretValue", services::get_secret_value)
            .operation("putSecretValue", services::put_secret_value),
        AwsSdkModule::new("S3").operation("listBuckets", services::list_buckets),
        AwsSdkModule::new("DynamoDB")
            .operation("getItem", services::get_item)
            .operation("putItem", services::put_item),
    ]
}

impl ServiceModule for AwsSdkModule {
    /// Only parses the options; the SDK configuration is loaded when a
    /// method is called.
    fn construct(&self, export: &str, config: &Value) -> Result<Box<dyn ServiceClient>, ClientError> {
        if export != self.export {
            return Err(ClientError::NotAConstructor(export.to_owned()));
        }
        let config = AwsClientConfig::from_value(config).map_err(|e| ClientError::Failed(e.to_string()))?;
        Ok(Box::new(AwsSdkClient { module: self.clone(), config }))
    }
}

struct AwsSdkClient {
    module: AwsSdkModule,
    config: AwsClientConfig,
}

impl ServiceClient for AwsSdkClient {
    fn call(&self, method: &str, params: Value, done: Completion) -> Result<(), ClientError> {
        let Some(&operation) = self.module.operations.get(method) else {
            return Err(ClientError::NotAFunction(method.to_owned()));
        };
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ClientError::Failed(format!("no async runtime: {e}")))?;

        let config = self.config.clone();
        let endpoint = config.endpoint_or_env(self.module.endpoint_env);
        let target = format!("{}.{method}", self.module.export);
        runtime.spawn(async move {
            let result = match config.load().await {
                Ok(sdk) => operation(&sdk, endpoint.as_deref(), params).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(response) => done.ok(response),
                Err(e) => {
                    debug!(%target, err = %e, "aws call failed");
                    done.err(e.to_remote_value())
                }
            };
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "modules_tests.rs"]
mod tests;
