// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bus resource configuration with expiry-driven refresh.
//!
//! A [`Configuration`] tracks the nine resource identifiers the event bus
//! needs, plus freshness state. Providers implementing
//! [`ConfigurationProvider`] decide where fresh values come from; callers
//! only ever read through [`ConfigurationProvider::snapshot`].
//!
//! Missing required fields are not an error here. They keep
//! [`Configuration::needs_refresh`] true until a refresh supplies them, and
//! callers that need every field check [`ConfigurationSnapshot::is_complete`].

pub mod chain;
pub mod provider;
pub mod secret;

use std::fmt;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

pub use chain::ChainProvider;
pub use provider::{EnvProvider, FileProvider, StaticProvider};
pub use secret::SecretProvider;

/// Default lookahead before `expire_time` during which the configuration is
/// already treated as expired.
pub const DEFAULT_EXPIRY_WINDOW: Duration = Duration::from_secs(15);

/// External record keys, in tracking order.
pub const FIELD_KEYS: [&str; 9] = [
    "Region",
    "LeoStream",
    "LeoCron",
    "LeoEvent",
    "LeoS3",
    "LeoKinesisStream",
    "LeoFirehoseStream",
    "LeoSettings",
    "LeoSystem",
];

/// Keys that may be absent without making the configuration invalid.
pub const OPTIONAL_KEYS: [&str; 2] = ["LeoSettings", "LeoSystem"];

/// Ingestion format accepted by [`Configuration::update`].
///
/// Either the flat resource record, or a verbose record that nests the flat
/// one under `resources` next to a foreign `s3` field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationRecord {
    #[serde(rename = "Region", default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(rename = "LeoEvent", default, skip_serializing_if = "Option::is_none")]
    pub event_table: Option<String>,
    #[serde(rename = "LeoStream", default, skip_serializing_if = "Option::is_none")]
    pub stream_table: Option<String>,
    #[serde(rename = "LeoCron", default, skip_serializing_if = "Option::is_none")]
    pub cron_table: Option<String>,
    #[serde(rename = "LeoS3", default, skip_serializing_if = "Option::is_none")]
    pub s3_bucket: Option<String>,
    #[serde(rename = "LeoKinesisStream", default, skip_serializing_if = "Option::is_none")]
    pub kinesis_stream: Option<String>,
    #[serde(rename = "LeoFirehoseStream", default, skip_serializing_if = "Option::is_none")]
    pub firehose_stream: Option<String>,
    #[serde(rename = "LeoSettings", default, skip_serializing_if = "Option::is_none")]
    pub settings_table: Option<String>,
    #[serde(rename = "LeoSystem", default, skip_serializing_if = "Option::is_none")]
    pub system_table: Option<String>,
    /// Verbose style: the flat record nested one level down.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Box<ConfigurationRecord>>,
    /// Verbose style marker. Only its truthiness matters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<serde_json::Value>,
}

impl ConfigurationRecord {
    /// Parse a record from JSON text.
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Unwrap the verbose style: when both a truthy `s3` and `resources` are
    /// present, the nested record wins and everything else is discarded.
    pub fn into_flat(self) -> ConfigurationRecord {
        let verbose = self.s3.as_ref().is_some_and(is_truthy);
        match self.resources {
            Some(inner) if verbose => *inner,
            _ => self,
        }
    }
}

impl From<ConfigurationSnapshot> for ConfigurationRecord {
    fn from(s: ConfigurationSnapshot) -> Self {
        Self {
            region: s.region,
            event_table: s.event_table,
            stream_table: s.stream_table,
            cron_table: s.cron_table,
            s3_bucket: s.s3_bucket,
            kinesis_stream: s.kinesis_stream,
            firehose_stream: s.firehose_stream,
            settings_table: s.settings_table,
            system_table: s.system_table,
            resources: None,
            s3: None,
        }
    }
}

fn is_truthy(value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Immutable copy of the nine tracked resource identifiers.
///
/// Always serializes all nine external keys, using `null` for absent values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationSnapshot {
    #[serde(rename = "Region", default)]
    pub region: Option<String>,
    #[serde(rename = "LeoStream", default)]
    pub stream_table: Option<String>,
    #[serde(rename = "LeoCron", default)]
    pub cron_table: Option<String>,
    #[serde(rename = "LeoEvent", default)]
    pub event_table: Option<String>,
    #[serde(rename = "LeoS3", default)]
    pub s3_bucket: Option<String>,
    #[serde(rename = "LeoKinesisStream", default)]
    pub kinesis_stream: Option<String>,
    #[serde(rename = "LeoFirehoseStream", default)]
    pub firehose_stream: Option<String>,
    #[serde(rename = "LeoSettings", default)]
    pub settings_table: Option<String>,
    #[serde(rename = "LeoSystem", default)]
    pub system_table: Option<String>,
}

impl ConfigurationSnapshot {
    /// Look up a field by its external key.
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            "Region" => &self.region,
            "LeoStream" => &self.stream_table,
            "LeoCron" => &self.cron_table,
            "LeoEvent" => &self.event_table,
            "LeoS3" => &self.s3_bucket,
            "LeoKinesisStream" => &self.kinesis_stream,
            "LeoFirehoseStream" => &self.firehose_stream,
            "LeoSettings" => &self.settings_table,
            "LeoSystem" => &self.system_table,
            _ => return None,
        };
        value.as_deref()
    }

    /// External keys of required fields that are currently absent.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        FIELD_KEYS
            .iter()
            .copied()
            .filter(|key| !OPTIONAL_KEYS.contains(key))
            .filter(|key| self.get(key).is_none())
            .collect()
    }

    /// True when every field except `LeoSettings` and `LeoSystem` is present.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// The snapshot itself if complete, else the list of missing keys.
    pub fn require_complete(self) -> Result<Self, IncompleteConfiguration> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(self)
        } else {
            Err(IncompleteConfiguration { missing })
        }
    }
}

/// Raised by callers that cannot proceed without every required field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("configuration incomplete, missing: {}", .missing.join(", "))]
pub struct IncompleteConfiguration {
    pub missing: Vec<&'static str>,
}

impl IncompleteConfiguration {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::ConfigurationIncomplete
    }
}

/// Static AWS credentials carried alongside the configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Mutable resolver state: the tracked fields plus freshness bookkeeping.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub resources: ConfigurationSnapshot,
    /// Absolute expiry instant. `None` never expires by time.
    pub expire_time: Option<SystemTime>,
    /// Explicit invalidation flag.
    pub expired: bool,
    pub expiry_window: Duration,
    pub credentials: Option<Credentials>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl Configuration {
    /// An empty configuration. Reports `needs_refresh() == true`.
    pub fn new() -> Self {
        Self {
            resources: ConfigurationSnapshot::default(),
            expire_time: None,
            expired: false,
            expiry_window: DEFAULT_EXPIRY_WINDOW,
            credentials: None,
        }
    }

    pub fn from_record(record: ConfigurationRecord) -> Self {
        let mut config = Self::new();
        config.update(record);
        config
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_expiry_window(mut self, window: Duration) -> Self {
        self.expiry_window = window;
        self
    }

    /// Overwrite all nine tracked fields from `record` and clear expiry state.
    ///
    /// Fields absent from the record become `None`; nothing carries over from
    /// the previous values. Credentials and the expiry window are untouched.
    pub fn update(&mut self, record: ConfigurationRecord) {
        self.expired = false;
        self.expire_time = None;

        let r = record.into_flat();
        self.resources = ConfigurationSnapshot {
            region: r.region,
            stream_table: r.stream_table,
            cron_table: r.cron_table,
            event_table: r.event_table,
            s3_bucket: r.s3_bucket,
            kinesis_stream: r.kinesis_stream,
            firehose_stream: r.firehose_stream,
            settings_table: r.settings_table,
            system_table: r.system_table,
        };
    }

    pub fn expire_at(&mut self, when: SystemTime) {
        self.expire_time = Some(when);
    }

    /// Mark the configuration stale regardless of time.
    pub fn expire(&mut self) {
        self.expired = true;
    }

    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh_at(SystemTime::now())
    }

    /// Whether a refresh is due as of `now`.
    ///
    /// Time-based expiry short-circuits; the explicit flag and field validity
    /// are only consulted when the window has not been crossed.
    pub fn needs_refresh_at(&self, now: SystemTime) -> bool {
        if let Some(expire_time) = self.expire_time {
            // A window reaching past the end of time has already been crossed.
            match now.checked_add(self.expiry_window) {
                Some(horizon) if horizon <= expire_time => {}
                _ => return true,
            }
        }
        self.expired || !self.resources.is_complete()
    }

    pub fn is_complete(&self) -> bool {
        self.resources.is_complete()
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.resources.missing_fields()
    }

    /// Copy of the nine tracked fields, without resolving.
    pub fn fields(&self) -> ConfigurationSnapshot {
        self.resources.clone()
    }
}

/// Capability interface for configuration sources.
///
/// Implementors own a [`Configuration`] and override [`refresh`] to
/// repopulate it. `refresh` must not fail: sources log and leave the
/// configuration incomplete instead.
///
/// [`refresh`]: ConfigurationProvider::refresh
pub trait ConfigurationProvider: Send {
    fn configuration(&self) -> &Configuration;

    fn configuration_mut(&mut self) -> &mut Configuration;

    /// Repopulate the configuration. The base behavior only clears `expired`.
    fn refresh(&mut self) {
        self.configuration_mut().expired = false;
    }

    fn needs_refresh(&self) -> bool {
        self.configuration().needs_refresh()
    }

    /// Refresh if stale. A fresh provider never calls `refresh`.
    fn resolve(&mut self) {
        if self.needs_refresh() {
            self.refresh();
            self.configuration_mut().expired = false;
        }
    }

    /// Resolve, then return a copy of the nine tracked fields.
    fn snapshot(&mut self) -> ConfigurationSnapshot {
        self.resolve();
        self.configuration().fields()
    }

    fn credentials(&self) -> Option<Credentials> {
        self.configuration().credentials.clone()
    }
}

impl<P: ConfigurationProvider + ?Sized> ConfigurationProvider for Box<P> {
    fn configuration(&self) -> &Configuration {
        (**self).configuration()
    }

    fn configuration_mut(&mut self) -> &mut Configuration {
        (**self).configuration_mut()
    }

    fn refresh(&mut self) {
        (**self).refresh();
    }

    fn needs_refresh(&self) -> bool {
        (**self).needs_refresh()
    }

    fn resolve(&mut self) {
        (**self).resolve();
    }

    fn snapshot(&mut self) -> ConfigurationSnapshot {
        (**self).snapshot()
    }

    fn credentials(&self) -> Option<Credentials> {
        (**self).credentials()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
