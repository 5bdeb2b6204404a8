// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local configuration sources: static records, environment, and files.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{Configuration, ConfigurationProvider, ConfigurationRecord};

/// Environment variable holding an inline JSON configuration record.
pub const CONFIG_ENV: &str = "RSTREAMS_CONFIG";

/// Environment variable naming a JSON configuration file.
pub const CONFIG_FILE_ENV: &str = "RSTREAMS_CONFIG_FILE";

/// Fixed configuration. Refresh never fetches anything.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    configuration: Configuration,
}

impl StaticProvider {
    pub fn new(configuration: Configuration) -> Self {
        Self { configuration }
    }

    pub fn from_record(record: ConfigurationRecord) -> Self {
        Self::new(Configuration::from_record(record))
    }
}

impl ConfigurationProvider for StaticProvider {
    fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    fn configuration_mut(&mut self) -> &mut Configuration {
        &mut self.configuration
    }
}

/// Reads a JSON record from an environment variable on every refresh.
#[derive(Debug, Clone)]
pub struct EnvProvider {
    var: String,
    configuration: Configuration,
}

impl Default for EnvProvider {
    fn default() -> Self {
        Self::new(CONFIG_ENV)
    }
}

impl EnvProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into(), configuration: Configuration::new() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl ConfigurationProvider for EnvProvider {
    fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    fn configuration_mut(&mut self) -> &mut Configuration {
        &mut self.configuration
    }

    fn refresh(&mut self) {
        self.configuration.expired = false;
        let Ok(text) = std::env::var(&self.var) else {
            debug!(var = %self.var, "configuration variable not set");
            return;
        };
        match ConfigurationRecord::from_json(&text) {
            Ok(record) => self.configuration.update(record),
            Err(e) => warn!(var = %self.var, err = %e, "invalid configuration in environment"),
        }
    }
}

/// Reads a JSON record from a file on every refresh.
#[derive(Debug, Clone)]
pub struct FileProvider {
    path: PathBuf,
    configuration: Configuration,
}

impl FileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), configuration: Configuration::new() }
    }

    /// Provider for the file named by `RSTREAMS_CONFIG_FILE`, if set.
    pub fn from_env() -> Option<Self> {
        std::env::var_os(CONFIG_FILE_ENV).map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn load_record(path: &Path) -> anyhow::Result<ConfigurationRecord> {
    let contents = std::fs::read_to_string(path)?;
    ConfigurationRecord::from_json(&contents)
}

impl ConfigurationProvider for FileProvider {
    fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    fn configuration_mut(&mut self) -> &mut Configuration {
        &mut self.configuration
    }

    fn refresh(&mut self) {
        self.configuration.expired = false;
        match load_record(&self.path) {
            Ok(record) => self.configuration.update(record),
            Err(e) => {
                warn!(path = %self.path.display(), err = %e, "failed to load configuration file")
            }
        }
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
