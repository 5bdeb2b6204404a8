// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rstreams invoke`: one blocking bridge call from the command line.

use anyhow::Context;
use serde_json::Value;

use crate::aws::AwsClientConfig;
use crate::bridge::Bridge;

#[derive(Debug, clap::Args)]
pub struct InvokeArgs {
    /// Service identifier (e.g. KMS, SecretsManager).
    pub service: String,
    /// Method name (e.g. getSecretValue).
    pub method: String,
    /// Method parameters as a JSON object.
    #[arg(long, default_value = "{}")]
    pub params: String,
    /// Region for the client (falls back to AWS_REGION).
    #[arg(long)]
    pub region: Option<String>,
    /// Endpoint URL override for the client.
    #[arg(long)]
    pub endpoint: Option<String>,
}

impl InvokeArgs {
    pub fn params_json(&self) -> anyhow::Result<Value> {
        serde_json::from_str(&self.params).context("--params is not valid JSON")
    }

    /// Client options passed to the child.
    pub fn client_config(&self) -> Value {
        AwsClientConfig { region: self.region.clone(), credentials: None, endpoint: self.endpoint.clone() }
            .to_value()
    }
}

/// Run the `rstreams invoke` subcommand. Returns a process exit code.
pub async fn run(args: &InvokeArgs) -> i32 {
    match invoke(args).await {
        Ok(response) => match super::print_json(&response) {
            Ok(()) => 0,
            Err(e) => super::report(&e),
        },
        Err(e) => super::report(&e),
    }
}

async fn invoke(args: &InvokeArgs) -> anyhow::Result<Value> {
    let params = args.params_json()?;
    let config = args.client_config();
    let bridge = Bridge::from_env()?;
    let (service, method) = (args.service.clone(), args.method.clone());

    let response = tokio::task::spawn_blocking(move || bridge.invoke(&service, &method, &config, &params))
        .await
        .context("bridge call panicked")??;
    Ok(response)
}
