// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::{Duration, SystemTime};

use serde_json::json;

use super::*;

fn full_record() -> ConfigurationRecord {
    ConfigurationRecord {
        region: Some("us-east-1".to_owned()),
        event_table: Some("Bus-LeoEvent".to_owned()),
        stream_table: Some("Bus-LeoStream".to_owned()),
        cron_table: Some("Bus-LeoCron".to_owned()),
        s3_bucket: Some("bus-leos3".to_owned()),
        kinesis_stream: Some("Bus-LeoKinesisStream".to_owned()),
        firehose_stream: Some("Bus-LeoFirehoseStream".to_owned()),
        settings_table: Some("Bus-LeoSettings".to_owned()),
        system_table: None,
        resources: None,
        s3: None,
    }
}

/// Counts refreshes and repopulates from a fixed record.
struct CountingProvider {
    configuration: Configuration,
    record: ConfigurationRecord,
    refreshes: u32,
}

impl ConfigurationProvider for CountingProvider {
    fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    fn configuration_mut(&mut self) -> &mut Configuration {
        &mut self.configuration
    }

    fn refresh(&mut self) {
        self.refreshes += 1;
        self.configuration.update(self.record.clone());
    }
}

#[test]
fn empty_configuration_needs_refresh() {
    let config = Configuration::new();
    assert!(config.needs_refresh());
    assert_eq!(config.expiry_window, Duration::from_secs(15));
    assert_eq!(config.missing_fields().len(), 7);
}

#[test]
fn full_update_is_valid() {
    let config = Configuration::from_record(full_record());
    assert!(!config.needs_refresh());
    assert!(config.is_complete());
}

#[yare::parameterized(
    region = { "Region" },
    stream = { "LeoStream" },
    cron = { "LeoCron" },
    event = { "LeoEvent" },
    s3 = { "LeoS3" },
    kinesis = { "LeoKinesisStream" },
    firehose = { "LeoFirehoseStream" },
)]
fn missing_required_field_needs_refresh(key: &str) {
    let mut value = serde_json::to_value(full_record()).unwrap_or_default();
    if let Some(map) = value.as_object_mut() {
        map.remove(key);
    }
    let record: ConfigurationRecord = serde_json::from_value(value).unwrap_or_default();
    let config = Configuration::from_record(record);
    assert!(config.needs_refresh(), "missing {key} should need refresh");
    assert_eq!(config.missing_fields(), vec![key]);
}

#[test]
fn settings_and_system_are_optional() {
    let mut record = full_record();
    record.settings_table = None;
    record.system_table = None;
    let config = Configuration::from_record(record);
    assert!(!config.needs_refresh());
}

#[test]
fn update_overwrites_without_merging() {
    let mut config = Configuration::from_record(full_record());
    config.update(ConfigurationRecord {
        region: Some("eu-west-1".to_owned()),
        ..Default::default()
    });
    assert_eq!(config.resources.region.as_deref(), Some("eu-west-1"));
    assert_eq!(config.resources.event_table, None);
    assert_eq!(config.resources.settings_table, None);
    assert!(config.needs_refresh());
}

#[test]
fn update_clears_expiry_state() {
    let mut config = Configuration::from_record(full_record());
    config.expire();
    config.expire_at(SystemTime::now());
    assert!(config.needs_refresh());

    config.update(full_record());
    assert!(!config.expired);
    assert_eq!(config.expire_time, None);
    assert!(!config.needs_refresh());
}

#[test]
fn update_keeps_credentials() {
    let mut config =
        Configuration::from_record(full_record()).with_credentials(Credentials::new("AKID", "SECRET"));
    config.update(full_record());
    assert_eq!(config.credentials.map(|c| c.access_key_id), Some("AKID".to_owned()));
}

#[test]
fn verbose_record_is_unwrapped() -> anyhow::Result<()> {
    let verbose = json!({
        "s3": "bus-leos3",
        "region": "ignored",
        "resources": serde_json::to_value(full_record())?,
    });
    let record: ConfigurationRecord = serde_json::from_value(verbose)?;
    let config = Configuration::from_record(record);
    assert!(config.is_complete());
    assert_eq!(config.resources.s3_bucket.as_deref(), Some("bus-leos3"));
    Ok(())
}

#[test]
fn resources_without_s3_is_not_unwrapped() -> anyhow::Result<()> {
    let record: ConfigurationRecord = serde_json::from_value(json!({
        "Region": "us-west-2",
        "resources": serde_json::to_value(full_record())?,
    }))?;
    let config = Configuration::from_record(record);
    assert_eq!(config.resources.region.as_deref(), Some("us-west-2"));
    assert_eq!(config.resources.event_table, None);
    Ok(())
}

#[yare::parameterized(
    empty_string = { json!("") },
    zero = { json!(0) },
    false_flag = { json!(false) },
    null = { json!(null) },
)]
fn falsy_s3_is_not_unwrapped(s3: serde_json::Value) {
    let record = ConfigurationRecord {
        region: Some("outer".to_owned()),
        resources: Some(Box::new(full_record())),
        s3: Some(s3),
        ..Default::default()
    };
    assert_eq!(record.into_flat().region.as_deref(), Some("outer"));
}

#[test]
fn time_expiry_honours_window() {
    let now = SystemTime::now();
    let mut config = Configuration::from_record(full_record());
    config.expire_at(now + Duration::from_secs(60));

    assert!(!config.needs_refresh_at(now));
    // Inside the 15 second window before expiry.
    assert!(config.needs_refresh_at(now + Duration::from_secs(46)));
    assert!(config.needs_refresh_at(now + Duration::from_secs(120)));
}

#[test]
fn unbounded_window_counts_as_expired() {
    let now = SystemTime::now();
    let mut config = Configuration::from_record(full_record()).with_expiry_window(Duration::MAX);
    config.expire_at(now + Duration::from_secs(3600));
    assert!(config.needs_refresh_at(now));
}

#[test]
fn time_expiry_short_circuits_validity() {
    let now = SystemTime::now();
    let mut config = Configuration::new();
    config.expire_at(now + Duration::from_secs(3600));
    // Not time-expired, so validity decides.
    assert!(config.needs_refresh_at(now));

    let mut config = Configuration::from_record(full_record());
    config.expire_at(now);
    assert!(config.needs_refresh_at(now));
}

#[test]
fn explicit_expired_flag_needs_refresh() {
    let mut config = Configuration::from_record(full_record());
    config.expire();
    assert!(config.needs_refresh());
}

#[test]
fn resolve_refreshes_only_when_stale() {
    let mut provider =
        CountingProvider { configuration: Configuration::new(), record: full_record(), refreshes: 0 };

    provider.resolve();
    assert_eq!(provider.refreshes, 1);
    provider.resolve();
    provider.resolve();
    assert_eq!(provider.refreshes, 1);

    provider.configuration_mut().expire();
    provider.resolve();
    assert_eq!(provider.refreshes, 2);
    assert!(!provider.configuration().expired);
}

#[test]
fn snapshot_returns_the_nine_fields() -> anyhow::Result<()> {
    let mut provider =
        CountingProvider { configuration: Configuration::new(), record: full_record(), refreshes: 0 };
    let snapshot = provider.snapshot();
    assert_eq!(snapshot.event_table.as_deref(), Some("Bus-LeoEvent"));

    let value = serde_json::to_value(&snapshot)?;
    let keys: Vec<&String> = value.as_object().map(|m| m.keys().collect()).unwrap_or_default();
    assert_eq!(keys.len(), 9);
    for key in FIELD_KEYS {
        assert!(value.get(key).is_some(), "snapshot missing {key}");
    }
    assert_eq!(value["LeoSystem"], serde_json::Value::Null);
    Ok(())
}

#[test]
fn base_refresh_only_clears_expired() {
    let mut provider = StaticProvider::new(Configuration::new());
    provider.configuration_mut().expire();
    let snapshot = provider.snapshot();
    assert!(!provider.configuration().expired);
    assert!(!snapshot.is_complete());
    assert!(provider.needs_refresh());
}

#[test]
fn snapshot_from_record_round_trips_through_record() {
    let snapshot = Configuration::from_record(full_record()).fields();
    let again = Configuration::from_record(ConfigurationRecord::from(snapshot.clone())).fields();
    assert_eq!(snapshot, again);
}

#[test]
fn credentials_debug_is_redacted() {
    let creds = Credentials::new("AKID", "very-secret").with_session_token("tok");
    let debug = format!("{creds:?}");
    assert!(debug.contains("AKID"));
    assert!(!debug.contains("very-secret"));
    assert!(!debug.contains("tok\""));
}

#[test]
fn require_complete_lists_missing_keys() {
    let mut record = full_record();
    record.region = None;
    record.s3_bucket = None;
    let err = Configuration::from_record(record).fields().require_complete().err();
    assert_eq!(err.as_ref().map(|e| e.missing.clone()), Some(vec!["Region", "LeoS3"]));
    assert_eq!(
        err.map(|e| e.to_string()).as_deref(),
        Some("configuration incomplete, missing: Region, LeoS3")
    );
}

#[test]
fn require_complete_passes_full_snapshot() -> anyhow::Result<()> {
    let snapshot = Configuration::from_record(full_record()).fields().require_complete()?;
    assert_eq!(snapshot.settings_table.as_deref(), Some("Bus-LeoSettings"));
    Ok(())
}
