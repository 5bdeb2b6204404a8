// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration fetched from a Secrets Manager secret through the bridge.

use std::time::{Duration, SystemTime};

use anyhow::Context;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{Configuration, ConfigurationProvider, ConfigurationRecord};
use crate::aws::AwsClientConfig;
use crate::bridge::Bridge;

/// Environment variable naming the secret that holds the configuration.
pub const CONFIG_SECRET_ENV: &str = "RSTREAMS_CONFIG_SECRET";

/// How long a fetched configuration stays fresh.
pub const DEFAULT_SECRET_TTL: Duration = Duration::from_secs(3600);

/// Remote-fetch-backed provider. Each refresh is one blocking
/// `SecretsManager.getSecretValue` call whose `SecretString` is a JSON
/// configuration record.
#[derive(Debug, Clone)]
pub struct SecretProvider {
    bridge: Bridge,
    secret_id: String,
    ttl: Duration,
    client: AwsClientConfig,
    configuration: Configuration,
}

impl SecretProvider {
    pub fn new(bridge: Bridge, secret_id: impl Into<String>) -> Self {
        Self {
            bridge,
            secret_id: secret_id.into(),
            ttl: DEFAULT_SECRET_TTL,
            client: AwsClientConfig::default(),
            configuration: Configuration::new(),
        }
    }

    /// Provider for `RSTREAMS_CONFIG_SECRET`, if set.
    pub fn from_env() -> Option<Self> {
        let secret_id = std::env::var(CONFIG_SECRET_ENV).ok().filter(|v| !v.is_empty())?;
        match Bridge::from_env() {
            Ok(bridge) => Some(Self::new(bridge, secret_id)),
            Err(e) => {
                warn!(err = %e, "cannot locate bridge child, skipping secret configuration");
                None
            }
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Options for the Secrets Manager client built in the child.
    pub fn with_client(mut self, client: AwsClientConfig) -> Self {
        self.client = client;
        self
    }

    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = configuration;
        self
    }

    pub fn secret_id(&self) -> &str {
        &self.secret_id
    }

    fn client_options(&self) -> Value {
        let mut client = self.client.clone();
        if client.credentials.is_none() {
            client.credentials = self.configuration.credentials.clone();
        }
        client.to_value()
    }

    fn fetch(&self) -> anyhow::Result<ConfigurationRecord> {
        let response = self
            .bridge
            .secrets_manager(self.client_options())
            .get_secret_value(&json!({ "SecretId": self.secret_id }))?;
        let text = response
            .get("SecretString")
            .and_then(Value::as_str)
            .context("secret has no SecretString")?;
        ConfigurationRecord::from_json(text).context("SecretString is not a configuration record")
    }
}

impl ConfigurationProvider for SecretProvider {
    fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    fn configuration_mut(&mut self) -> &mut Configuration {
        &mut self.configuration
    }

    fn refresh(&mut self) {
        self.configuration.expired = false;
        match self.fetch() {
            Ok(record) => {
                self.configuration.update(record);
                // An unrepresentable expiry leaves the record fresh by time.
                if let Some(expire_time) = SystemTime::now().checked_add(self.ttl) {
                    self.configuration.expire_at(expire_time);
                }
                debug!(secret = %self.secret_id, "configuration fetched");
            }
            Err(e) => warn!(secret = %self.secret_id, err = %e, "failed to fetch configuration secret"),
        }
    }
}

#[cfg(test)]
#[path = "secret_tests.rs"]
mod tests;
