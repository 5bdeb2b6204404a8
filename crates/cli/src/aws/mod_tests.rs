// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use aws_credential_types::provider::ProvideCredentials;
use serial_test::serial;

use super::*;
use crate::test_support::{isolate_aws_env, test_credentials};

#[test]
fn client_config_from_bridge_shape() -> anyhow::Result<()> {
    let config = AwsClientConfig::from_value(&json!({
        "region": "us-east-1",
        "credentials": { "accessKeyId": "AKID", "secretAccessKey": "secret", "sessionToken": "tok" },
    }))?;
    assert_eq!(config.region.as_deref(), Some("us-east-1"));
    let credentials = config.credentials.ok_or_else(|| anyhow::anyhow!("no credentials"))?;
    assert_eq!(credentials.access_key_id, "AKID");
    assert_eq!(credentials.session_token.as_deref(), Some("tok"));
    Ok(())
}

#[test]
fn client_config_null_is_default() -> anyhow::Result<()> {
    let config = AwsClientConfig::from_value(&Value::Null)?;
    assert!(config.region.is_none());
    assert!(config.credentials.is_none());
    Ok(())
}

#[test]
fn client_config_round_trips_through_value() -> anyhow::Result<()> {
    let config = AwsClientConfig::new(Some("us-west-2".to_owned()), Some(test_credentials()))
        .with_endpoint("http://localhost:4566");
    let value = config.to_value();
    assert_eq!(value["endpoint"], "http://localhost:4566");
    assert_eq!(value["credentials"]["accessKeyId"], "AKIDEXAMPLE");
    let back = AwsClientConfig::from_value(&value)?;
    assert_eq!(back.credentials, config.credentials);
    Ok(())
}

#[test]
#[serial]
fn explicit_endpoint_beats_environment() {
    std::env::set_var("RSTREAMS_TEST_ENDPOINT", "http://from-env:1");
    let explicit = AwsClientConfig::default().with_endpoint("http://explicit:2");
    let implicit = AwsClientConfig::default();

    assert_eq!(explicit.endpoint_or_env(Some("RSTREAMS_TEST_ENDPOINT")).as_deref(), Some("http://explicit:2"));
    assert_eq!(implicit.endpoint_or_env(Some("RSTREAMS_TEST_ENDPOINT")).as_deref(), Some("http://from-env:1"));
    assert_eq!(implicit.endpoint_or_env(None), None);
    std::env::remove_var("RSTREAMS_TEST_ENDPOINT");
}

#[tokio::test]
async fn load_uses_explicit_region_and_credentials() -> anyhow::Result<()> {
    let config = AwsClientConfig::new(
        Some("ap-south-1".to_owned()),
        Some(test_credentials().with_session_token("session")),
    );
    let sdk = config.load().await?;
    assert_eq!(sdk.region().map(ToString::to_string).as_deref(), Some("ap-south-1"));

    let provider = sdk.credentials_provider().ok_or_else(|| anyhow::anyhow!("no credentials provider"))?;
    let credentials = provider.provide_credentials().await?;
    assert_eq!(credentials.access_key_id(), "AKIDEXAMPLE");
    assert_eq!(credentials.session_token(), Some("session"));
    Ok(())
}

#[tokio::test]
#[serial]
async fn load_without_region_is_reported() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    isolate_aws_env(dir.path());
    let result = AwsClientConfig::new(None, Some(test_credentials())).load().await;
    assert!(matches!(result, Err(AwsError::MissingRegion)), "got {result:?}");
    assert_eq!(AwsError::MissingRegion.to_string(), "Missing region in config");
    Ok(())
}

#[tokio::test]
#[serial]
async fn credentials_fall_back_to_shared_profile() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    isolate_aws_env(dir.path());
    std::fs::write(
        dir.path().join("credentials"),
        "[default]\naws_access_key_id = PROFILEKEY\naws_secret_access_key = profile-secret\n",
    )?;

    let sdk = AwsClientConfig::new(Some("us-east-1".to_owned()), None).load().await?;
    let provider = sdk.credentials_provider().ok_or_else(|| anyhow::anyhow!("no credentials provider"))?;
    let credentials = provider.provide_credentials().await?;
    assert_eq!(credentials.access_key_id(), "PROFILEKEY");
    assert_eq!(credentials.secret_access_key(), "profile-secret");
    Ok(())
}

#[tokio::test]
#[serial]
async fn region_falls_back_to_shared_config() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    isolate_aws_env(dir.path());
    std::fs::write(dir.path().join("config"), "[default]\nregion = eu-central-1\n")?;

    let sdk = AwsClientConfig::new(None, Some(test_credentials())).load().await?;
    assert_eq!(sdk.region().map(ToString::to_string).as_deref(), Some("eu-central-1"));
    Ok(())
}

#[test]
fn remote_value_for_service_error() {
    let err = AwsError::Service {
        kind: "KMSInvalidStateException".to_owned(),
        message: "key pending deletion".to_owned(),
        status: 400,
    };
    assert_eq!(
        err.to_remote_value(),
        json!({
            "message": "key pending deletion",
            "name": "KMSInvalidStateException",
            "code": "KMSInvalidStateException",
            "$metadata": { "httpStatusCode": 400 },
        })
    );
    assert_eq!(err.to_string(), "key pending deletion");
    assert_eq!(err.code(), ErrorCode::SecretServiceFailure);
}

#[test]
fn remote_value_for_sdk_failure() {
    let value = AwsError::Sdk("dispatch failure".to_owned()).to_remote_value();
    assert_eq!(value, json!({ "message": "dispatch failure", "name": "SdkError" }));
}

#[test]
fn sdk_credentials_keep_session_token() {
    let credentials = sdk_credentials(&test_credentials().with_session_token("tok"));
    assert_eq!(credentials.access_key_id(), "AKIDEXAMPLE");
    assert_eq!(credentials.session_token(), Some("tok"));
}
