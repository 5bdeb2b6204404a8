// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key Management Service client.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use aws_smithy_types::Blob;

use super::services::kms_client;
use super::{AwsClientConfig, AwsError, KMS_ENDPOINT_ENV};
use crate::configuration::Credentials;

pub type KmsFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AwsError>> + Send + 'a>>;

/// The two KMS operations the secret envelope needs.
pub trait KeyManagement: Send + Sync {
    /// Decrypt a raw ciphertext blob, returning the plaintext bytes.
    fn decrypt(&self, ciphertext: Vec<u8>) -> KmsFuture<'_, Vec<u8>>;

    /// Encrypt, returning the raw ciphertext blob.
    fn encrypt(&self, request: EncryptRequest) -> KmsFuture<'_, Vec<u8>>;
}

/// Builds a [`KeyManagement`] client for one call.
pub trait KeyManagementConnector: Send + Sync {
    fn connect<'a>(
        &'a self,
        region: Option<&'a str>,
        credentials: Option<&'a Credentials>,
    ) -> KmsFuture<'a, Box<dyn KeyManagement>>;
}

/// Parameters of a KMS `Encrypt` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptRequest {
    pub key_id: String,
    pub plaintext: Vec<u8>,
    pub encryption_context: BTreeMap<String, String>,
}

impl EncryptRequest {
    pub fn new(key_id: impl Into<String>, plaintext: impl Into<Vec<u8>>) -> Self {
        Self { key_id: key_id.into(), plaintext: plaintext.into(), encryption_context: BTreeMap::new() }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.encryption_context.insert(key.into(), value.into());
        self
    }
}

/// KMS over the SDK.
#[derive(Debug, Clone)]
pub struct KmsClient {
    inner: aws_sdk_kms::Client,
    endpoint: Option<String>,
}

impl KmsClient {
    /// Load the SDK configuration for `config` and build the client. The
    /// endpoint comes from `config.endpoint`, else `AWS_KMS_ENDPOINT`, else
    /// the regional default.
    pub async fn connect(config: &AwsClientConfig) -> Result<Self, AwsError> {
        let sdk = config.load().await?;
        let endpoint = config.endpoint_or_env(Some(KMS_ENDPOINT_ENV));
        Ok(Self { inner: kms_client(&sdk, endpoint.as_deref()), endpoint })
    }

    /// The endpoint override in effect, if any.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }
}

impl KeyManagement for KmsClient {
    fn decrypt(&self, ciphertext: Vec<u8>) -> KmsFuture<'_, Vec<u8>> {
        Box::pin(async move {
            let output = self.inner.decrypt().ciphertext_blob(Blob::new(ciphertext)).send().await?;
            output
                .plaintext()
                .map(|blob| blob.as_ref().to_vec())
                .ok_or_else(|| AwsError::Decode("missing Plaintext".to_owned()))
        })
    }

    fn encrypt(&self, request: EncryptRequest) -> KmsFuture<'_, Vec<u8>> {
        Box::pin(async move {
            let context = (!request.encryption_context.is_empty())
                .then(|| request.encryption_context.into_iter().collect());
            let output = self
                .inner
                .encrypt()
                .key_id(request.key_id)
                .plaintext(Blob::new(request.plaintext))
                .set_encryption_context(context)
                .send()
                .await?;
            output
                .ciphertext_blob()
                .map(|blob| blob.as_ref().to_vec())
                .ok_or_else(|| AwsError::Decode("missing CiphertextBlob".to_owned()))
        })
    }
}

/// Connects to real KMS, with an optional endpoint override.
#[derive(Debug, Clone, Default)]
pub struct AwsKmsConnector {
    pub endpoint: Option<String>,
}

impl AwsKmsConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self { endpoint: Some(endpoint.into()) }
    }
}

impl KeyManagementConnector for AwsKmsConnector {
    fn connect<'a>(
        &'a self,
        region: Option<&'a str>,
        credentials: Option<&'a Credentials>,
    ) -> KmsFuture<'a, Box<dyn KeyManagement>> {
        let mut config = AwsClientConfig::new(region.map(str::to_owned), credentials.cloned());
        config.endpoint = self.endpoint.clone();
        Box::pin(async move {
            let client: Box<dyn KeyManagement> = Box::new(KmsClient::connect(&config).await?);
            Ok(client)
        })
    }
}

#[cfg(test)]
#[path = "kms_tests.rs"]
mod tests;
