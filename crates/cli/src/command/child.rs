// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rstreams invoke-child`: the child half of the bridge.

use tracing::debug;

use crate::bridge::child::serve_stdio;
use crate::bridge::ClientRegistry;

/// Run the child against the built-in clients. Returns a process exit code.
///
/// Exits 0 once a marker is written, error or not; the parent only reads
/// the marker. Exits 1 if nothing was reported.
pub async fn run() -> i32 {
    let registry = ClientRegistry::builtin();
    match serve_stdio(&registry).await {
        Ok(true) => 0,
        Ok(false) => {
            debug!("client dropped its completion without reporting");
            1
        }
        Err(e) => super::report(&e),
    }
}
