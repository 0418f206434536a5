//! Hook types.
//!
//! A [`HookRegistry`] maps each of the eight [`HookName`]s to an ordered list
//! of callbacks. Callbacks run sequentially in registration order, each
//! awaited before the next starts, so a later hook observes whatever an
//! earlier hook changed in the shared [`HookPayload`].

use async_trait::async_trait;
use bson::{Bson, Document as BsonDocument};
use docwright_common::{DocwrightError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

// =====================
// HookName
// =====================

/// Closed set of extension points around CRUD operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookName {
    BeforeCreate,
    AfterCreate,
    BeforeRead,
    AfterRead,
    BeforeUpdate,
    AfterUpdate,
    BeforeDelete,
    AfterDelete,
}

impl HookName {
    /// All hook names, in declaration order
    pub const ALL: [HookName; 8] = [
        HookName::BeforeCreate,
        HookName::AfterCreate,
        HookName::BeforeRead,
        HookName::AfterRead,
        HookName::BeforeUpdate,
        HookName::AfterUpdate,
        HookName::BeforeDelete,
        HookName::AfterDelete,
    ];

    /// The identifier callers use for this hook
    pub fn as_str(&self) -> &'static str {
        match self {
            HookName::BeforeCreate => "beforeCreate",
            HookName::AfterCreate => "afterCreate",
            HookName::BeforeRead => "beforeRead",
            HookName::AfterRead => "afterRead",
            HookName::BeforeUpdate => "beforeUpdate",
            HookName::AfterUpdate => "afterUpdate",
            HookName::BeforeDelete => "beforeDelete",
            HookName::AfterDelete => "afterDelete",
        }
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookName {
    type Err = DocwrightError;

    fn from_str(s: &str) -> Result<Self> {
        HookName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| DocwrightError::InvalidHookName(s.to_string()))
    }
}

/// The before/after hooks wrapped around one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookPair {
    pub before: HookName,
    pub after: HookName,
}

impl HookPair {
    pub const CREATE: HookPair = HookPair {
        before: HookName::BeforeCreate,
        after: HookName::AfterCreate,
    };
    pub const READ: HookPair = HookPair {
        before: HookName::BeforeRead,
        after: HookName::AfterRead,
    };
    pub const UPDATE: HookPair = HookPair {
        before: HookName::BeforeUpdate,
        after: HookName::AfterUpdate,
    };
    pub const DELETE: HookPair = HookPair {
        before: HookName::BeforeDelete,
        after: HookName::AfterDelete,
    };
}

// =====================
// HookPayload
// =====================

/// Values handed to a hook.
///
/// For a before-hook these are the operation's input arguments, for an
/// after-hook the single result. Changes made here are what the next step
/// sees.
#[derive(Debug, Clone, PartialEq)]
pub struct HookPayload {
    hook: HookName,
    collection: String,
    values: Vec<Bson>,
}

impl HookPayload {
    pub fn new(hook: HookName, collection: impl Into<String>, values: Vec<Bson>) -> Self {
        Self {
            hook,
            collection: collection.into(),
            values,
        }
    }

    /// Hook currently being run
    pub fn hook(&self) -> HookName {
        self.hook
    }

    /// Name of the collection the operation targets
    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn values(&self) -> &[Bson] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut Vec<Bson> {
        &mut self.values
    }

    pub fn into_values(self) -> Vec<Bson> {
        self.values
    }

    /// Value at `index` as a document, if it is one
    pub fn document(&self, index: usize) -> Option<&BsonDocument> {
        self.values.get(index).and_then(Bson::as_document)
    }

    /// Mutable access to the value at `index` as a document, if it is one
    pub fn document_mut(&mut self, index: usize) -> Option<&mut BsonDocument> {
        self.values.get_mut(index).and_then(Bson::as_document_mut)
    }

    pub(crate) fn set_hook(&mut self, hook: HookName) {
        self.hook = hook;
    }
}

// =====================
// Hook
// =====================

/// A callback registered against a [`HookName`]
#[async_trait]
pub trait Hook: Send + Sync {
    async fn call(&self, payload: &mut HookPayload) -> Result<()>;
}

#[async_trait]
impl<F> Hook for F
where
    F: Fn(&mut HookPayload) -> Result<()> + Send + Sync,
{
    async fn call(&self, payload: &mut HookPayload) -> Result<()> {
        (self)(payload)
    }
}

/// Pins a synchronous closure to the [`Hook`] signature.
///
/// Plain `fn` items already implement [`Hook`]; closures go through this so
/// their argument and error types are inferred.
pub fn hook_fn<F>(f: F) -> F
where
    F: Fn(&mut HookPayload) -> Result<()> + Send + Sync,
{
    f
}

/// Adapter for async callbacks that take the payload by value and hand it back
pub struct AsyncHook<F> {
    f: F,
}

/// Wraps an async closure as a [`Hook`].
///
/// ```ignore
/// collection.use_hook(
///     HookName::BeforeCreate,
///     async_hook(|mut payload| async move {
///         if let Some(doc) = payload.document_mut(0) {
///             doc.insert("createdBy", "importer");
///         }
///         Ok(payload)
///     }),
/// );
/// ```
pub fn async_hook<F, Fut>(f: F) -> AsyncHook<F>
where
    F: Fn(HookPayload) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HookPayload>> + Send,
{
    AsyncHook { f }
}

#[async_trait]
impl<F, Fut> Hook for AsyncHook<F>
where
    F: Fn(HookPayload) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HookPayload>> + Send,
{
    async fn call(&self, payload: &mut HookPayload) -> Result<()> {
        let placeholder = HookPayload::new(payload.hook, payload.collection.clone(), Vec::new());
        let taken = std::mem::replace(payload, placeholder);
        *payload = (self.f)(taken).await?;
        Ok(())
    }
}

// =====================
// HookRegistry
// =====================

/// Ordered hook callbacks keyed by [`HookName`].
///
/// Append-only; insertion order is execution order.
#[derive(Default)]
pub struct HookRegistry {
    hooks: RwLock<HashMap<HookName, Vec<Arc<dyn Hook>>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook function
    pub fn register<H>(&self, name: HookName, hook: H)
    where
        H: Hook + 'static,
    {
        self.hooks.write().entry(name).or_default().push(Arc::new(hook));
    }

    /// Register a hook by its string identifier.
    ///
    /// Fails with `InvalidHookName` before storing anything if `name` is not
    /// one of the eight recognized identifiers.
    pub fn register_named<H>(&self, name: &str, hook: H) -> Result<()>
    where
        H: Hook + 'static,
    {
        let name = name.parse::<HookName>()?;
        self.register(name, hook);
        Ok(())
    }

    /// Number of hooks registered for `name`
    pub fn len(&self, name: HookName) -> usize {
        self.hooks.read().get(&name).map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.read().values().all(Vec::is_empty)
    }

    /// Run every hook registered for `name`, in order.
    ///
    /// Stops at the first failure and returns it; remaining hooks are skipped.
    pub async fn run(&self, name: HookName, payload: &mut HookPayload) -> Result<()> {
        // Clone hooks while holding the lock
        let hooks: Vec<Arc<dyn Hook>> = self
            .hooks
            .read()
            .get(&name)
            .cloned()
            .unwrap_or_default();

        payload.set_hook(name);
        if hooks.is_empty() {
            return Ok(());
        }

        for (idx, hook) in hooks.iter().enumerate() {
            debug!(hook = %name, index = idx, collection = payload.collection(), "Running hook");
            hook.call(payload).await?;
        }
        Ok(())
    }

    /// Run hooks by string identifier; unknown names fail before any hook runs
    pub async fn run_named(&self, name: &str, payload: &mut HookPayload) -> Result<()> {
        let name = name.parse::<HookName>()?;
        self.run(name, payload).await
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks = self.hooks.read();
        let mut map = f.debug_map();
        for name in HookName::ALL {
            let count = hooks.get(&name).map(Vec::len).unwrap_or(0);
            if count > 0 {
                map.entry(&name.as_str(), &count);
            }
        }
        map.finish()
    }
}
