// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tracing::{info, warn};

use super::provider::{EnvProvider, FileProvider};
use super::secret::SecretProvider;
use super::{Configuration, ConfigurationProvider, ConfigurationRecord};

/// Tries each provider in order and adopts the first complete snapshot,
/// along with that provider's expiry time and credentials. The chain's own
/// credentials stay when the adopted provider carries none.
///
/// When none is complete the previous values are kept and the chain stays
/// stale, so the next `resolve` tries again.
pub struct ChainProvider {
    providers: Vec<Box<dyn ConfigurationProvider>>,
    configuration: Configuration,
}

impl ChainProvider {
    pub fn new(providers: Vec<Box<dyn ConfigurationProvider>>) -> Self {
        Self { providers, configuration: Configuration::new() }
    }

    /// Environment record, then `RSTREAMS_CONFIG_FILE`, then
    /// `RSTREAMS_CONFIG_SECRET`, skipping sources whose variable is unset.
    pub fn default_chain() -> Self {
        let mut providers: Vec<Box<dyn ConfigurationProvider>> = vec![Box::new(EnvProvider::default())];
        if let Some(file) = FileProvider::from_env() {
            providers.push(Box::new(file));
        }
        if let Some(secret) = SecretProvider::from_env() {
            providers.push(Box::new(secret));
        }
        Self::new(providers)
    }

    pub fn with(mut self, provider: impl ConfigurationProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl ConfigurationProvider for ChainProvider {
    fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    fn configuration_mut(&mut self) -> &mut Configuration {
        &mut self.configuration
    }

    fn refresh(&mut self) {
        self.configuration.expired = false;
        for (index, provider) in self.providers.iter_mut().enumerate() {
            let snapshot = provider.snapshot();
            if !snapshot.is_complete() {
                continue;
            }
            let expire_time = provider.configuration().expire_time;
            let credentials = provider.credentials();
            self.configuration.update(ConfigurationRecord::from(snapshot));
            self.configuration.expire_time = expire_time;
            if credentials.is_some() {
                self.configuration.credentials = credentials;
            }
            info!(provider = index, "configuration resolved");
            return;
        }
        warn!(
            providers = self.providers.len(),
            missing = ?self.configuration.missing_fields(),
            "no configuration source produced a complete configuration"
        );
    }
}

#[cfg(test)]
#[path = "chain_tests.rs"]
mod tests;
