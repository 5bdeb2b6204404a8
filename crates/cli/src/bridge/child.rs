// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child side of the bridge: run one call and report it exactly once.

use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::client::{ClientError, ClientFactory};
use super::protocol::{
    classify_failure, encode_marker, fallback_marker, InvocationOutcome, InvocationRequest,
};

/// One-shot completion callback handed to [`ServiceClient::call`].
///
/// Clones share state. The first `complete` writes the marker line to the
/// sink; every later call is dropped.
///
/// [`ServiceClient::call`]: super::client::ServiceClient::call
#[derive(Clone)]
pub struct Completion {
    shared: Arc<Shared>,
    signal: mpsc::Sender<()>,
}

struct Shared {
    fired: AtomicBool,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl Completion {
    /// Create a completion writing to `sink`. The receiver yields once the
    /// completion fires, or `None` once every handle is dropped unfired.
    pub fn new(sink: Box<dyn Write + Send>) -> (Self, mpsc::Receiver<()>) {
        let (signal, rx) = mpsc::channel(1);
        let shared = Arc::new(Shared { fired: AtomicBool::new(false), sink: Mutex::new(sink) });
        (Self { shared, signal }, rx)
    }

    /// Report the outcome. Returns false if an earlier call already did.
    pub fn complete(&self, outcome: InvocationOutcome) -> bool {
        if self.shared.fired.swap(true, Ordering::AcqRel) {
            debug!("completion already reported, ignoring");
            return false;
        }

        let line = encode_marker(&outcome).unwrap_or_else(|e| fallback_marker(&e.to_string()));
        {
            let mut sink = self.shared.sink.lock();
            if let Err(e) = writeln!(sink, "{line}").and_then(|()| sink.flush()) {
                warn!(err = %e, "failed to write bridge response");
            }
        }
        let _ = self.signal.try_send(());
        true
    }

    pub fn ok(&self, response: Value) -> bool {
        self.complete(InvocationOutcome::success(response))
    }

    pub fn err(&self, error: Value) -> bool {
        self.complete(InvocationOutcome::failure(error))
    }

    pub fn is_fired(&self) -> bool {
        self.shared.fired.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion").field("fired", &self.is_fired()).finish()
    }
}

fn dispatch(
    factory: &dyn ClientFactory,
    request: &InvocationRequest,
    done: Completion,
) -> Result<(), ClientError> {
    let module = factory.load(&request.module_name())?;
    let client = module.construct(&request.service, &request.config)?;
    client.call(&request.method, request.params.clone(), done)
}

/// Execute one request against `factory`, reporting to `sink`.
///
/// Waits until the completion fires or every handle to it is dropped.
/// Returns whether a marker was written. There is no timeout: a client that
/// holds the completion forever keeps the child alive forever.
pub async fn run_child(
    factory: &dyn ClientFactory,
    request: InvocationRequest,
    sink: Box<dyn Write + Send>,
) -> bool {
    let (completion, mut signal) = Completion::new(sink);
    debug!(service = %request.service, method = %request.method, "dispatching bridge call");

    if let Err(e) = dispatch(factory, &request, completion.clone()) {
        let message = classify_failure(&request.service, &request.method, &e.to_string());
        debug!(raw = %e, %message, "bridge call failed before completion");
        completion.complete(InvocationOutcome::message(message));
    }
    drop(completion);

    signal.recv().await.is_some()
}

/// Entry point for the `invoke-child` subcommand: one request line on
/// stdin, one marker line on stdout.
pub async fn serve_stdio(factory: &dyn ClientFactory) -> anyhow::Result<bool> {
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    let sink: Box<dyn Write + Send> = Box::new(std::io::stdout());

    match serde_json::from_str::<InvocationRequest>(line.trim()) {
        Ok(request) => Ok(run_child(factory, request, sink).await),
        Err(e) => {
            let (completion, _signal) = Completion::new(sink);
            Ok(completion.complete(InvocationOutcome::message(format!(
                "invalid invocation request: {e}"
            ))))
        }
    }
}

#[cfg(test)]
#[path = "child_tests.rs"]
mod tests;
