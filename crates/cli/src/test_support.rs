// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: fakes, fixtures, and assertion helpers.

use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use parking_lot::Mutex;
use serde_json::Value;

use crate::aws::kms::{KeyManagement, KeyManagementConnector, KmsFuture};
use crate::aws::{AwsError, EncryptRequest};
use crate::bridge::child::Completion;
use crate::bridge::client::{ClientError, ServiceClient, ServiceModule};
use crate::bridge::Bridge;
use crate::configuration::{ConfigurationRecord, Credentials};

/// Assert that `$expr` is an `Err` whose display contains `$substr`.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}

/// A complete flat bus record.
pub fn bus_record() -> ConfigurationRecord {
    ConfigurationRecord {
        region: Some("us-east-1".to_owned()),
        event_table: Some("leo-event".to_owned()),
        stream_table: Some("leo-stream".to_owned()),
        cron_table: Some("leo-cron".to_owned()),
        s3_bucket: Some("leo-s3".to_owned()),
        kinesis_stream: Some("leo-kinesis".to_owned()),
        firehose_stream: Some("leo-firehose".to_owned()),
        settings_table: Some("leo-settings".to_owned()),
        system_table: Some("leo-system".to_owned()),
        resources: None,
        s3: None,
    }
}

/// The same record as JSON with external keys.
pub fn bus_record_json() -> Value {
    serde_json::to_value(bus_record()).unwrap_or(Value::Null)
}

pub fn test_credentials() -> Credentials {
    Credentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY")
}

/// Keep the SDK's default provider chains off the host: no ambient keys or
/// region, no shared profile files, no container or instance metadata.
/// Callers must be `#[serial]`.
pub fn isolate_aws_env(dir: &Path) {
    for var in [
        "AWS_ACCESS_KEY_ID",
        "AWS_SECRET_ACCESS_KEY",
        "AWS_SESSION_TOKEN",
        "AWS_REGION",
        "AWS_DEFAULT_REGION",
        "AWS_PROFILE",
        "AWS_WEB_IDENTITY_TOKEN_FILE",
        "AWS_CONTAINER_CREDENTIALS_RELATIVE_URI",
        "AWS_CONTAINER_CREDENTIALS_FULL_URI",
        "AWS_ENDPOINT_URL",
        "AWS_KMS_ENDPOINT",
    ] {
        std::env::remove_var(var);
    }
    std::env::set_var("AWS_CONFIG_FILE", dir.join("config"));
    std::env::set_var("AWS_SHARED_CREDENTIALS_FILE", dir.join("credentials"));
    std::env::set_var("AWS_EC2_METADATA_DISABLED", "true");
}

/// In-memory sink whose contents stay readable after being boxed.
#[derive(Debug, Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    pub fn boxed(&self) -> Box<dyn Write + Send> {
        Box::new(self.clone())
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

type CallFn = dyn Fn(&str, Value, Completion) -> Result<(), ClientError> + Send + Sync;

/// Client module backed by a closure. Constructs only `export`; anything
/// else fails the way a missing constructor would.
pub struct FnModule {
    export: String,
    call: Arc<CallFn>,
}

impl FnModule {
    pub fn new(
        export: impl Into<String>,
        call: impl Fn(&str, Value, Completion) -> Result<(), ClientError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self { export: export.into(), call: Arc::new(call) })
    }
}

impl ServiceModule for FnModule {
    fn construct(&self, export: &str, _config: &Value) -> Result<Box<dyn ServiceClient>, ClientError> {
        if export != self.export {
            return Err(ClientError::NotAConstructor(export.to_owned()));
        }
        Ok(Box::new(FnClient { call: Arc::clone(&self.call) }))
    }
}

struct FnClient {
    call: Arc<CallFn>,
}

impl ServiceClient for FnClient {
    fn call(&self, method: &str, params: Value, done: Completion) -> Result<(), ClientError> {
        (self.call)(method, params, done)
    }
}

/// Bridge whose child ignores its request and prints `line`.
pub fn echo_bridge(line: &str) -> Bridge {
    let script = format!("cat >/dev/null; printf '%s\\n' '{}'", line.replace('\'', r"'\''"));
    Bridge::new("sh").arg("-c").arg(script)
}

/// Reversible fake KMS. Ciphertext is `kms:<key>:<plaintext>`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKms {
    connects: Arc<AtomicUsize>,
    failure: Option<(String, String)>,
}

impl InMemoryKms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with a service error of `kind`.
    pub fn failing(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self { connects: Arc::default(), failure: Some((kind.into(), message.into())) }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn seal(key_id: &str, plaintext: &[u8]) -> Vec<u8> {
        let mut blob = format!("kms:{key_id}:").into_bytes();
        blob.extend_from_slice(plaintext);
        blob
    }
}

impl KeyManagementConnector for InMemoryKms {
    fn connect<'a>(
        &'a self,
        _region: Option<&'a str>,
        _credentials: Option<&'a Credentials>,
    ) -> KmsFuture<'a, Box<dyn KeyManagement>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let client: Box<dyn KeyManagement> = Box::new(InMemoryKmsClient { failure: self.failure.clone() });
        Box::pin(async move { Ok(client) })
    }
}

struct InMemoryKmsClient {
    failure: Option<(String, String)>,
}

impl InMemoryKmsClient {
    fn check(&self) -> Result<(), AwsError> {
        match self.failure {
            Some((ref kind, ref message)) => {
                Err(AwsError::Service { kind: kind.clone(), message: message.clone(), status: 400 })
            }
            None => Ok(()),
        }
    }
}

impl KeyManagement for InMemoryKmsClient {
    fn decrypt(&self, ciphertext: Vec<u8>) -> KmsFuture<'_, Vec<u8>> {
        Box::pin(async move {
            self.check()?;
            let invalid = || AwsError::Service {
                kind: "InvalidCiphertextException".to_owned(),
                message: "invalid ciphertext".to_owned(),
                status: 400,
            };
            let rest = ciphertext.strip_prefix(b"kms:").ok_or_else(invalid)?;
            let split = rest.iter().position(|b| *b == b':').ok_or_else(invalid)?;
            Ok(rest[split + 1..].to_vec())
        })
    }

    fn encrypt(&self, request: EncryptRequest) -> KmsFuture<'_, Vec<u8>> {
        Box::pin(async move {
            self.check()?;
            Ok(InMemoryKms::seal(&request.key_id, &request.plaintext))
        })
    }
}

/// One request received by [`FakeAws`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub target: String,
    pub authorization: String,
    pub security_token: Option<String>,
    pub body: Value,
}

type Responder = dyn Fn(&str, &Value) -> (StatusCode, Value) + Send + Sync;

#[derive(Clone)]
struct FakeState {
    responder: Arc<Responder>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Local HTTP stand-in for a JSON-protocol AWS service (KMS, Secrets
/// Manager, DynamoDB): requests are routed by their `X-Amz-Target`.
pub struct FakeAws {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: tokio::task::JoinHandle<()>,
}

impl FakeAws {
    /// Serve on a random port, answering each call via `responder(target, body)`.
    pub async fn start(
        responder: impl Fn(&str, &Value) -> (StatusCode, Value) + Send + Sync + 'static,
    ) -> anyhow::Result<Self> {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = FakeState { responder: Arc::new(responder), requests: Arc::clone(&requests) };
        let router = Router::new().route("/", post(fake_aws_handler)).with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        Ok(Self { addr, requests, handle })
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}

impl Drop for FakeAws {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn fake_aws_handler(
    State(state): State<FakeState>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, [(&'static str, &'static str); 1], String) {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned);
    let target = header("x-amz-target").unwrap_or_default();
    let body: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    state.requests.lock().push(RecordedRequest {
        target: target.clone(),
        authorization: header("authorization").unwrap_or_default(),
        security_token: header("x-amz-security-token"),
        body: body.clone(),
    });
    let (status, response) = (state.responder)(&target, &body);
    (status, [("content-type", "application/x-amz-json-1.1")], response.to_string())
}
