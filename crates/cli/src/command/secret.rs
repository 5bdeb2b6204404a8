// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rstreams decrypt` / `rstreams encrypt`.

use std::collections::BTreeMap;

use anyhow::Context;

use crate::aws::{AwsKmsConnector, EncryptRequest};
use crate::configuration::{ChainProvider, ConfigurationProvider};
use crate::envelope::SecretEnvelope;

#[derive(Debug, Clone, clap::Args)]
pub struct EnvelopeArgs {
    /// Region (defaults to the resolved configuration, then the AWS default chain).
    #[arg(long)]
    pub region: Option<String>,
    /// KMS endpoint URL (defaults to AWS_KMS_ENDPOINT).
    #[arg(long)]
    pub endpoint: Option<String>,
}

#[derive(Debug, clap::Args)]
pub struct DecryptArgs {
    /// Base64 ciphertext blob.
    pub ciphertext: String,
    #[command(flatten)]
    pub envelope: EnvelopeArgs,
}

#[derive(Debug, clap::Args)]
pub struct EncryptArgs {
    /// Key id, ARN, or alias.
    pub key_id: String,
    /// Plaintext to encrypt.
    pub plaintext: String,
    /// Encryption context entry as KEY=VALUE (repeatable).
    #[arg(long = "context", value_name = "KEY=VALUE")]
    pub context: Vec<String>,
    #[command(flatten)]
    pub envelope: EnvelopeArgs,
}

impl EncryptArgs {
    pub fn encryption_context(&self) -> anyhow::Result<BTreeMap<String, String>> {
        self.context
            .iter()
            .map(|entry| {
                let (key, value) = entry
                    .split_once('=')
                    .with_context(|| format!("invalid --context entry {entry:?}, expected KEY=VALUE"))?;
                Ok((key.to_owned(), value.to_owned()))
            })
            .collect()
    }

    pub fn request(&self) -> anyhow::Result<EncryptRequest> {
        let mut request = EncryptRequest::new(&self.key_id, self.plaintext.as_bytes());
        request.encryption_context = self.encryption_context()?;
        Ok(request)
    }
}

impl EnvelopeArgs {
    /// Envelope over the resolved configuration, with `--region` winning.
    /// Without configuration credentials the SDK's default chain applies.
    async fn envelope(&self) -> anyhow::Result<SecretEnvelope> {
        let (mut snapshot, credentials) = tokio::task::spawn_blocking(|| {
            let mut chain = ChainProvider::default_chain();
            let snapshot = chain.snapshot();
            (snapshot, chain.credentials())
        })
        .await
        .context("configuration refresh panicked")?;

        if self.region.is_some() {
            snapshot.region = self.region.clone();
        }
        let connector = AwsKmsConnector { endpoint: self.endpoint.clone() };
        Ok(SecretEnvelope::with_connector(&snapshot, credentials, connector))
    }
}

/// Run `rstreams decrypt`. Returns a process exit code.
pub async fn run_decrypt(args: &DecryptArgs) -> i32 {
    let result = async {
        let envelope = args.envelope.envelope().await?;
        Ok::<_, anyhow::Error>(envelope.decrypt_string(&args.ciphertext).await?)
    }
    .await;
    finish(result)
}

/// Run `rstreams encrypt`. Returns a process exit code.
pub async fn run_encrypt(args: &EncryptArgs) -> i32 {
    let result = async {
        let request = args.request()?;
        let envelope = args.envelope.envelope().await?;
        Ok::<_, anyhow::Error>(envelope.encrypt_string(request).await?)
    }
    .await;
    finish(result)
}

fn finish(result: anyhow::Result<String>) -> i32 {
    match result {
        Ok(text) => {
            println!("{text}");
            0
        }
        Err(e) => super::report(&e),
    }
}
