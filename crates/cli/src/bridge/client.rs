// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service-locator seam used by the bridge child.
//!
//! The child never resolves client code from ambient process state. It is
//! handed a [`ClientFactory`] that maps derived module names to
//! [`ServiceModule`]s, constructed once per process.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::child::Completion;
use super::protocol::client_module_name;

/// Raw failure while loading, constructing, or dispatching to a client.
///
/// The `Display` text is what [`classify_failure`] inspects.
///
/// [`classify_failure`]: super::protocol::classify_failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("Cannot find module '{0}'")]
    ModuleNotFound(String),
    #[error("module.{0} is not a constructor")]
    NotAConstructor(String),
    #[error("client.{0} is not a function")]
    NotAFunction(String),
    #[error("{0}")]
    Failed(String),
}

/// Resolves a module name such as `@aws-sdk/client-kms`.
pub trait ClientFactory: Send + Sync {
    fn load(&self, module: &str) -> Result<Arc<dyn ServiceModule>, ClientError>;
}

/// A loaded client module exporting one or more client constructors.
pub trait ServiceModule: Send + Sync {
    /// Build the client exported as `export` (the service identifier) from
    /// the caller's configuration object.
    fn construct(&self, export: &str, config: &Value) -> Result<Box<dyn ServiceClient>, ClientError>;
}

/// A constructed client.
///
/// `call` starts the named method and reports its result through `done`,
/// possibly later from another task. Only the first report reaches the
/// parent. Methods whose remote API reports more than once are not
/// supported by the bridge.
pub trait ServiceClient: Send {
    fn call(&self, method: &str, params: Value, done: Completion) -> Result<(), ClientError>;
}

/// The explicit client factory: a name-to-module table.
#[derive(Clone, Default)]
pub struct ClientRegistry {
    modules: BTreeMap<String, Arc<dyn ServiceModule>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the SDK-backed AWS clients this crate ships (KMS,
    /// SecretsManager, S3, DynamoDB).
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        crate::aws::register_builtin(&mut registry);
        registry
    }

    /// Register a module under an explicit module name.
    pub fn register(&mut self, module: impl Into<String>, client: Arc<dyn ServiceModule>) {
        self.modules.insert(module.into(), client);
    }

    /// Register a module under the name derived from `service`.
    pub fn register_service(&mut self, service: &str, client: Arc<dyn ServiceModule>) {
        self.register(client_module_name(service), client);
    }

    pub fn with_service(mut self, service: &str, client: Arc<dyn ServiceModule>) -> Self {
        self.register_service(service, client);
        self
    }

    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn contains(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }
}

impl ClientFactory for ClientRegistry {
    fn load(&self, module: &str) -> Result<Arc<dyn ServiceModule>, ClientError> {
        self.modules.get(module).cloned().ok_or_else(|| ClientError::ModuleNotFound(module.to_owned()))
    }
}

impl fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientRegistry").field("modules", &self.modules.keys()).finish()
    }
}
