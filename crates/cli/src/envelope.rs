// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Encrypt and decrypt small bootstrap secrets with the key-management
//! service, using the region and credentials of a configuration snapshot.
//!
//! Every call connects a fresh client, so calls share no state and may run
//! concurrently. Service failures are returned as-is; nothing is retried.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use tracing::debug;

use crate::aws::{AwsError, AwsKmsConnector, EncryptRequest, KeyManagementConnector};
use crate::configuration::{ConfigurationProvider, ConfigurationSnapshot, Credentials};

/// Decodes with or without padding and tolerates non-zero trailing bits.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decode base64 ciphertext as written by hand or by other tools. ASCII
/// whitespace is skipped and padding is optional. The URL-safe `-` and `_`
/// stand for `+` and `/`.
pub fn decode_ciphertext(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let normalized: String = text
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();
    LENIENT.decode(normalized)
}

#[derive(Debug, Clone)]
pub struct SecretEnvelope<C: KeyManagementConnector = AwsKmsConnector> {
    region: Option<String>,
    credentials: Option<Credentials>,
    connector: C,
}

impl SecretEnvelope<AwsKmsConnector> {
    pub fn new(snapshot: &ConfigurationSnapshot, credentials: Option<Credentials>) -> Self {
        Self::with_connector(snapshot, credentials, AwsKmsConnector::new())
    }

    /// Resolve `provider` and take its region and credentials.
    pub fn from_provider(provider: &mut dyn ConfigurationProvider) -> Self {
        let snapshot = provider.snapshot();
        Self::new(&snapshot, provider.credentials())
    }
}

impl<C: KeyManagementConnector> SecretEnvelope<C> {
    pub fn with_connector(
        snapshot: &ConfigurationSnapshot,
        credentials: Option<Credentials>,
        connector: C,
    ) -> Self {
        Self { region: snapshot.region.clone(), credentials, connector }
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Decode base64 ciphertext (see [`decode_ciphertext`]), decrypt it, and
    /// return the plaintext as text.
    ///
    /// Bytes that are not valid UTF-8 are replaced with U+FFFD.
    pub async fn decrypt_string(&self, ciphertext: &str) -> Result<String, AwsError> {
        let blob = decode_ciphertext(ciphertext)
            .map_err(|e| AwsError::InvalidInput(format!("ciphertext is not base64: {e}")))?;
        let kms = self.connector.connect(self.region.as_deref(), self.credentials.as_ref()).await?;
        debug!(bytes = blob.len(), "decrypting secret");
        let plaintext = kms.decrypt(blob).await?;
        Ok(String::from_utf8_lossy(&plaintext).into_owned())
    }

    /// Encrypt and return the ciphertext blob as base64.
    pub async fn encrypt_string(&self, request: EncryptRequest) -> Result<String, AwsError> {
        let kms = self.connector.connect(self.region.as_deref(), self.credentials.as_ref()).await?;
        debug!(key_id = %request.key_id, "encrypting secret");
        let blob = kms.encrypt(request).await?;
        Ok(STANDARD.encode(blob))
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
