//! Handler registry: `(apiVersion, kind)` → conversion logic.

use std::fmt;

use kubestate_core::{HandlerKey, ManifestDocument, RenderError, StepBody};
use rustc_hash::FxHashMap;

/// Converts one resource type into a step body.
///
/// A handler must be pure: identical documents give identical bodies,
/// arguments in the same order.
pub trait Handler: Send + Sync {
    fn key(&self) -> HandlerKey;
    fn convert(&self, doc: &ManifestDocument) -> Result<StepBody, RenderError>;
}

/// Handler backed by a plain function or closure.
pub struct FnHandler<F> {
    key: HandlerKey,
    f: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&ManifestDocument) -> Result<StepBody, RenderError> + Send + Sync,
{
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>, f: F) -> Self {
        Self { key: HandlerKey::new(api_version, kind), f }
    }
}

impl<F> Handler for FnHandler<F>
where
    F: Fn(&ManifestDocument) -> Result<StepBody, RenderError> + Send + Sync,
{
    fn key(&self) -> HandlerKey {
        self.key.clone()
    }

    fn convert(&self, doc: &ManifestDocument) -> Result<StepBody, RenderError> {
        (self.f)(doc)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("handler already registered for {0}")]
pub struct DuplicateHandler(pub HandlerKey);

/// Mutable half of the registry, used only during startup.
#[derive(Default)]
pub struct RegistryBuilder {
    handlers: FxHashMap<HandlerKey, Box<dyn Handler>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, refusing a key that is already taken.
    pub fn try_register<H: Handler + 'static>(&mut self, handler: H) -> Result<(), DuplicateHandler> {
        let key = handler.key();
        if self.handlers.contains_key(&key) {
            return Err(DuplicateHandler(key));
        }
        self.handlers.insert(key, Box::new(handler));
        Ok(())
    }

    /// Register a handler.
    ///
    /// # Panics
    ///
    /// If a handler for the same key is already registered. The handler set is
    /// fixed at build time, so a collision is a bug in that set.
    pub fn register<H: Handler + 'static>(&mut self, handler: H) -> &mut Self {
        if let Err(e) = self.try_register(handler) {
            panic!("{}", e);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Freeze into a read-only registry.
    pub fn build(self) -> Registry {
        tracing::debug!(handlers = self.handlers.len(), "handler registry frozen");
        Registry { handlers: self.handlers }
    }
}

/// Read-only dispatch table. Safe to share across threads once built.
pub struct Registry {
    handlers: FxHashMap<HandlerKey, Box<dyn Handler>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Registry holding every built-in handler.
    pub fn with_builtins() -> Self {
        let mut builder = RegistryBuilder::new();
        crate::builtins::register_builtins(&mut builder);
        builder.build()
    }

    pub fn get(&self, key: &HandlerKey) -> Option<&dyn Handler> {
        self.handlers.get(key).map(|h| h.as_ref())
    }

    pub fn lookup(&self, api_version: &str, kind: &str) -> Option<&dyn Handler> {
        self.get(&HandlerKey::new(api_version, kind))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&HandlerKey> {
        let mut keys: Vec<_> = self.handlers.keys().collect();
        keys.sort();
        keys
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("keys", &self.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(api_version: &'static str, kind: &'static str) -> impl Handler {
        FnHandler::new(api_version, kind, |_doc: &ManifestDocument| -> Result<StepBody, RenderError> {
            Ok(StepBody::new("test.noop"))
        })
    }

    #[test]
    fn lookup_finds_registered_key_only() {
        let mut b = RegistryBuilder::new();
        b.register(noop("v1", "ConfigMap")).register(noop("apps/v1", "Deployment"));
        let reg = b.build();
        assert_eq!(reg.len(), 2);
        assert!(reg.lookup("v1", "ConfigMap").is_some());
        assert!(reg.lookup("apps/v1", "Deployment").is_some());
        assert!(reg.lookup("v1", "Deployment").is_none());
        assert!(reg.lookup("v1", "configmap").is_none());
    }

    #[test]
    fn try_register_reports_duplicates() {
        let mut b = RegistryBuilder::new();
        b.try_register(noop("v1", "Secret")).unwrap();
        let err = b.try_register(noop("v1", "Secret")).unwrap_err();
        assert_eq!(err.0, HandlerKey::new("v1", "Secret"));
        assert_eq!(err.to_string(), "handler already registered for v1/Secret");
        assert_eq!(b.len(), 1);
    }

    #[test]
    #[should_panic(expected = "handler already registered for v1/Secret")]
    fn register_panics_on_duplicate() {
        let mut b = RegistryBuilder::new();
        b.register(noop("v1", "Secret"));
        b.register(noop("v1", "Secret"));
    }

    #[test]
    fn keys_are_sorted() {
        let mut b = RegistryBuilder::new();
        b.register(noop("v1", "Service")).register(noop("apps/v1", "DaemonSet"));
        let reg = b.build();
        let keys: Vec<String> = reg.keys().into_iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["apps/v1/DaemonSet", "v1/Service"]);
    }

    #[test]
    fn registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
    }
}
