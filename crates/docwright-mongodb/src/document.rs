//! Document handles
//!
//! A [`DocumentHandle`] wraps one record of a collection. It owns a hook
//! registry and a listener set that belong to this handle alone; the
//! collection's hooks do not run for handle mutations.

use bson::{doc, Bson, Document as BsonDocument};
use docwright_common::{DocwrightError, Result};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::collection::Binding;
use crate::driver::{id_filter, DeleteOutcome, UpdateOptions};
use crate::events::{DocumentEvent, EventSource, Listener, Listeners};
use crate::hooks::{Hook, HookName, HookPair, HookRegistry};
use crate::runner::{document_arg, optional_document_arg, run_operation};

/// One record of a collection, with its own hooks and event listeners.
///
/// Handles are single-owner: every mutation takes `&mut self`.
pub struct DocumentHandle {
    binding: Binding,
    fields: BsonDocument,
    id: Option<Bson>,
    is_new: bool,
    deleted: bool,
    hooks: HookRegistry,
    listeners: Listeners,
}

impl DocumentHandle {
    /// Handle on a record the driver returned
    pub(crate) fn from_persisted(binding: Binding, fields: BsonDocument) -> Self {
        let id = fields.get("_id").cloned();
        Self {
            binding,
            fields,
            id,
            is_new: false,
            deleted: false,
            hooks: HookRegistry::new(),
            listeners: Listeners::new(),
        }
    }

    /// Handle whose first `save` creates the record
    pub(crate) fn new_unsaved(binding: Binding, fields: BsonDocument) -> Self {
        Self {
            binding,
            fields,
            id: None,
            is_new: true,
            deleted: false,
            hooks: HookRegistry::new(),
            listeners: Listeners::new(),
        }
    }

    pub fn id(&self) -> Option<&Bson> {
        self.id.as_ref()
    }

    pub fn fields(&self) -> &BsonDocument {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Bson> {
        self.fields.get(key)
    }

    /// Set a field in memory; nothing is written until `save`
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Bson>) -> Option<Bson> {
        self.fields.insert(key, value)
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn collection_name(&self) -> &str {
        &self.binding.name
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn into_document(self) -> BsonDocument {
        self.fields
    }

    /// Deserialize the current field values into `T`
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(bson::from_document(self.fields.clone())?)
    }

    /// Register a hook on this handle only
    pub fn use_hook<H>(&self, name: HookName, hook: H)
    where
        H: Hook + 'static,
    {
        self.hooks.register(name, hook);
    }

    pub fn use_hook_named<H>(&self, name: &str, hook: H) -> Result<()>
    where
        H: Hook + 'static,
    {
        self.hooks.register_named(name, hook)
    }

    /// Listen for the record being created by [`save`](Self::save)
    pub fn on_save<F>(&mut self, listener: F)
    where
        F: Fn(&BsonDocument) + Send + Sync + 'static,
    {
        self.on(DocumentEvent::OnCreate, listener);
    }

    pub fn on_update<F>(&mut self, listener: F)
    where
        F: Fn(&BsonDocument) + Send + Sync + 'static,
    {
        self.on(DocumentEvent::OnUpdate, listener);
    }

    pub fn on_delete<F>(&mut self, listener: F)
    where
        F: Fn(&BsonDocument) + Send + Sync + 'static,
    {
        self.on(DocumentEvent::OnDelete, listener);
    }

    pub fn on<F>(&mut self, event: DocumentEvent, listener: F)
    where
        F: Fn(&BsonDocument) + Send + Sync + 'static,
    {
        self.listeners.subscribe(event, Arc::new(listener));
    }

    /// Persist the handle.
    ///
    /// A new handle is inserted through the create hooks and emits
    /// `OnCreate`. Otherwise every field but `_id` is written with `$set`
    /// through the update hooks and `OnUpdate` is emitted. On success the
    /// handle holds the record as persisted and is no longer new.
    pub async fn save(&mut self) -> Result<()> {
        self.ensure_alive("save")?;
        if self.is_new {
            self.save_new().await
        } else {
            self.save_existing().await
        }
    }

    async fn save_new(&mut self) -> Result<()> {
        let binding = self.binding.clone();
        let stored: BsonDocument = run_operation(
            "save",
            &self.hooks,
            HookPair::CREATE,
            &self.binding.name,
            vec![Bson::Document(self.fields.clone())],
            |mut args| async move { binding.insert(document_arg(&mut args, 0)?).await },
        )
        .await?;

        self.adopt(stored);
        self.is_new = false;
        self.notify(DocumentEvent::OnCreate);
        Ok(())
    }

    async fn save_existing(&mut self) -> Result<()> {
        let id = self.require_id("save")?;
        let mut set = self.fields.clone();
        set.remove("_id");
        let stored = self.run_update("save", id, doc! { "$set": set }).await?;

        self.adopt(stored);
        self.notify(DocumentEvent::OnUpdate);
        Ok(())
    }

    /// Apply a partial update by identity.
    ///
    /// Only the supplied fields change. A plain field document is applied as
    /// `$set`; operator documents are passed through. The handle adopts the
    /// record the driver returns and emits `OnUpdate`.
    ///
    /// A handle without an `_id` (never saved) fails with `InvalidState`
    /// before any hook runs; call [`save`](Self::save) first.
    pub async fn update(&mut self, partial: BsonDocument) -> Result<()> {
        self.ensure_alive("update")?;
        let id = self.require_id("update")?;
        let stored = self.run_update("update", id, partial).await?;

        self.adopt(stored);
        self.is_new = false;
        self.notify(DocumentEvent::OnUpdate);
        Ok(())
    }

    async fn run_update(
        &self,
        operation: &'static str,
        id: Bson,
        update: BsonDocument,
    ) -> Result<BsonDocument> {
        let binding = self.binding.clone();
        run_operation(
            operation,
            &self.hooks,
            HookPair::UPDATE,
            &self.binding.name,
            vec![
                Bson::Document(id_filter(&id)),
                Bson::Document(update),
                Bson::Document(UpdateOptions::default().to_document()),
            ],
            |mut args| async move {
                let filter = document_arg(&mut args, 0)?;
                let update = document_arg(&mut args, 1)?;
                let options = match optional_document_arg(&mut args, 2)? {
                    Some(doc) => UpdateOptions::from_document(&doc)?,
                    None => UpdateOptions::default(),
                };
                binding.update(filter, update, options).await?.ok_or_else(|| {
                    DocwrightError::NotFound(format!("{} with _id {}", binding.name, id))
                })
            },
        )
        .await
    }

    /// Delete the record by identity.
    ///
    /// Emits `OnDelete` with the last known field values. Afterwards every
    /// mutation on this handle fails with `InvalidState`.
    pub async fn delete(&mut self) -> Result<DeleteOutcome> {
        self.ensure_alive("delete")?;
        let id = self.require_id("delete")?;
        let binding = self.binding.clone();
        let outcome: DeleteOutcome = run_operation(
            "delete",
            &self.hooks,
            HookPair::DELETE,
            &self.binding.name,
            vec![Bson::Document(id_filter(&id))],
            |mut args| async move {
                let filter = document_arg(&mut args, 0)?;
                binding.driver.delete_one(&binding.name, filter).await
            },
        )
        .await?;

        self.deleted = true;
        self.notify(DocumentEvent::OnDelete);
        Ok(outcome)
    }

    /// Detached duplicate: same fields without `_id`, new, with empty hooks
    /// and listeners. No I/O.
    pub fn copy(&self) -> DocumentHandle {
        let mut fields = self.fields.clone();
        fields.remove("_id");
        DocumentHandle::new_unsaved(self.binding.clone(), fields)
    }

    fn ensure_alive(&self, operation: &str) -> Result<()> {
        if self.deleted {
            return Err(DocwrightError::InvalidState(format!(
                "cannot {} a deleted document of '{}'",
                operation, self.binding.name
            )));
        }
        Ok(())
    }

    fn require_id(&self, operation: &str) -> Result<Bson> {
        self.id.clone().ok_or_else(|| {
            DocwrightError::InvalidState(format!(
                "cannot {} a document of '{}' that has no _id",
                operation, self.binding.name
            ))
        })
    }

    fn adopt(&mut self, stored: BsonDocument) {
        if let Some(id) = stored.get("_id") {
            self.id = Some(id.clone());
        }
        self.fields = stored;
    }

    fn notify(&self, event: DocumentEvent) {
        debug!(event = %event, collection = %self.binding.name, "Emitting document event");
        self.listeners.emit(event, &self.fields);
    }
}

impl EventSource for DocumentHandle {
    fn subscribe(&mut self, event: DocumentEvent, listener: Listener) {
        self.listeners.subscribe(event, listener);
    }

    fn emit(&self, event: DocumentEvent, document: &BsonDocument) {
        self.listeners.emit(event, document);
    }
}

impl fmt::Debug for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentHandle")
            .field("collection", &self.binding.name)
            .field("id", &self.id)
            .field("fields", &self.fields)
            .field("is_new", &self.is_new)
            .field("deleted", &self.deleted)
            .field("hooks", &self.hooks)
            .field("listeners", &self.listeners)
            .finish()
    }
}
