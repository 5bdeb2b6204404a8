// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-service blocking handles.

use serde_json::Value;

use super::{Bridge, BridgeError};

/// A service name plus the options used to construct its client in every
/// child. Each method call is an independent bridge invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncService {
    bridge: Bridge,
    name: String,
    config: Value,
}

impl SyncService {
    pub fn new(bridge: Bridge, name: impl Into<String>, config: Value) -> Self {
        Self { bridge, name: name.into(), config }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &Value {
        &self.config
    }

    pub fn invoke(&self, method: &str, params: &Value) -> Result<Value, BridgeError> {
        self.bridge.invoke(&self.name, method, &self.config, params)
    }

    /// `SecretsManager.getSecretValue`.
    pub fn get_secret_value(&self, params: &Value) -> Result<Value, BridgeError> {
        self.invoke("getSecretValue", params)
    }

    /// `S3.listBuckets`.
    pub fn list_buckets(&self) -> Result<Value, BridgeError> {
        self.invoke("listBuckets", &Value::Null)
    }

    /// `DynamoDB.putItem`.
    pub fn put_item(&self, params: &Value) -> Result<Value, BridgeError> {
        self.invoke("putItem", params)
    }
}

impl Bridge {
    pub fn secrets_manager(&self, config: Value) -> SyncService {
        self.service("SecretsManager", config)
    }

    pub fn s3(&self, config: Value) -> SyncService {
        self.service("S3", config)
    }

    pub fn dynamo_db(&self, config: Value) -> SyncService {
        self.service("DynamoDB", config)
    }
}
