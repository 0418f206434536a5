//! Collection handles: CRUD entry points wrapped by the collection's hooks.

use bson::{Bson, Document as BsonDocument};
use docwright_common::{DocwrightError, Result};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::document::DocumentHandle;
use crate::driver::{DeleteOutcome, Driver, ReadOptions, UpdateOptions};
use crate::hooks::{Hook, HookName, HookPair, HookRegistry};
use crate::runner::{document_arg, optional_document_arg, run_operation};
use crate::schema::{Schema, ValidatedCollectionName};

/// What a handle is bound to: a collection on a driver, with an optional schema
#[derive(Clone)]
pub(crate) struct Binding {
    pub(crate) name: String,
    pub(crate) driver: Arc<dyn Driver>,
    pub(crate) schema: Option<Arc<Schema>>,
}

impl Binding {
    pub(crate) async fn insert(&self, mut doc: BsonDocument) -> Result<BsonDocument> {
        if let Some(schema) = &self.schema {
            schema.prepare_insert(&mut doc)?;
        }
        self.driver.insert(&self.name, doc).await
    }

    pub(crate) async fn update(
        &self,
        filter: BsonDocument,
        update: BsonDocument,
        options: UpdateOptions,
    ) -> Result<Option<BsonDocument>> {
        if let Some(schema) = &self.schema {
            schema.validate_partial(&update)?;
        }
        self.driver
            .find_one_and_update(&self.name, filter, update, options)
            .await
    }
}

/// Handle on one named collection.
///
/// Every CRUD call runs through [`run_operation`] with this collection's
/// [`HookRegistry`]. Clones share the registry.
#[derive(Clone)]
pub struct CollectionHandle {
    binding: Binding,
    hooks: Arc<HookRegistry>,
}

impl CollectionHandle {
    pub(crate) fn new(
        name: ValidatedCollectionName,
        driver: Arc<dyn Driver>,
        schema: Option<Arc<Schema>>,
    ) -> Self {
        Self {
            binding: Binding {
                name: name.into_string(),
                driver,
                schema,
            },
            hooks: Arc::new(HookRegistry::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.binding.name
    }

    pub fn schema(&self) -> Option<&Arc<Schema>> {
        self.binding.schema.as_ref()
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Register a collection-level hook
    pub fn use_hook<H>(&self, name: HookName, hook: H)
    where
        H: Hook + 'static,
    {
        self.hooks.register(name, hook);
    }

    /// Register a collection-level hook by its string identifier
    pub fn use_hook_named<H>(&self, name: &str, hook: H) -> Result<()>
    where
        H: Hook + 'static,
    {
        self.hooks.register_named(name, hook)
    }

    /// A document that has not been persisted yet; its first `save` creates it
    pub fn new_document(&self, fields: BsonDocument) -> DocumentHandle {
        DocumentHandle::new_unsaved(self.binding.clone(), fields)
    }

    /// Insert `doc` and return a handle on the stored record
    pub async fn create(&self, doc: BsonDocument) -> Result<DocumentHandle> {
        let binding = self.binding.clone();
        let stored: BsonDocument = run_operation(
            "create",
            &self.hooks,
            HookPair::CREATE,
            self.name(),
            vec![Bson::Document(doc)],
            |mut args| async move { binding.insert(document_arg(&mut args, 0)?).await },
        )
        .await?;
        Ok(DocumentHandle::from_persisted(self.binding.clone(), stored))
    }

    /// Serialize `value` with serde and [`create`](Self::create) it
    pub async fn create_from<T>(&self, value: &T) -> Result<DocumentHandle>
    where
        T: Serialize + ?Sized,
    {
        let doc = bson::to_document(value)?;
        self.create(doc).await
    }

    /// Fetch one record by `_id`; fails with `NotFound` when absent
    pub async fn find_by_id(&self, id: impl Into<Bson>) -> Result<DocumentHandle> {
        let id = id.into();
        let binding = self.binding.clone();
        let found: BsonDocument = run_operation(
            "findById",
            &self.hooks,
            HookPair::READ,
            self.name(),
            vec![id],
            |args| async move {
                let id = args.into_iter().next().unwrap_or(Bson::Null);
                binding
                    .driver
                    .find_by_id(&binding.name, &id)
                    .await?
                    .ok_or_else(|| {
                        DocwrightError::NotFound(format!("{} with _id {}", binding.name, id))
                    })
            },
        )
        .await?;
        Ok(DocumentHandle::from_persisted(self.binding.clone(), found))
    }

    /// All records matching `filter`, in driver order
    pub async fn read(
        &self,
        filter: BsonDocument,
        projection: Option<BsonDocument>,
        options: ReadOptions,
    ) -> Result<Vec<DocumentHandle>> {
        let binding = self.binding.clone();
        let docs: Vec<BsonDocument> = run_operation(
            "read",
            &self.hooks,
            HookPair::READ,
            self.name(),
            read_args(filter, projection, &options),
            |mut args| async move {
                let (filter, projection, options) = take_read_args(&mut args)?;
                binding
                    .driver
                    .find(&binding.name, filter, projection, options)
                    .await
            },
        )
        .await?;
        Ok(docs
            .into_iter()
            .map(|doc| DocumentHandle::from_persisted(self.binding.clone(), doc))
            .collect())
    }

    /// First record matching `filter`, or `None`
    pub async fn read_one(
        &self,
        filter: BsonDocument,
        projection: Option<BsonDocument>,
        options: ReadOptions,
    ) -> Result<Option<DocumentHandle>> {
        let binding = self.binding.clone();
        let doc: Option<BsonDocument> = run_operation(
            "readOne",
            &self.hooks,
            HookPair::READ,
            self.name(),
            read_args(filter, projection, &options),
            |mut args| async move {
                let (filter, projection, options) = take_read_args(&mut args)?;
                binding
                    .driver
                    .find_one(&binding.name, filter, projection, options)
                    .await
            },
        )
        .await?;
        Ok(doc.map(|doc| DocumentHandle::from_persisted(self.binding.clone(), doc)))
    }

    /// Update the first match and return the driver's record as-is
    pub async fn update(
        &self,
        filter: BsonDocument,
        update: BsonDocument,
        options: UpdateOptions,
    ) -> Result<Option<BsonDocument>> {
        let binding = self.binding.clone();
        run_operation(
            "update",
            &self.hooks,
            HookPair::UPDATE,
            self.name(),
            vec![
                Bson::Document(filter),
                Bson::Document(update),
                Bson::Document(options.to_document()),
            ],
            |mut args| async move {
                let filter = document_arg(&mut args, 0)?;
                let update = document_arg(&mut args, 1)?;
                let options = match optional_document_arg(&mut args, 2)? {
                    Some(doc) => UpdateOptions::from_document(&doc)?,
                    None => UpdateOptions::default(),
                };
                binding.update(filter, update, options).await
            },
        )
        .await
    }

    /// Delete the first match
    pub async fn delete(&self, filter: BsonDocument) -> Result<DeleteOutcome> {
        let binding = self.binding.clone();
        run_operation(
            "delete",
            &self.hooks,
            HookPair::DELETE,
            self.name(),
            vec![Bson::Document(filter)],
            |mut args| async move {
                let filter = document_arg(&mut args, 0)?;
                binding.driver.delete_one(&binding.name, filter).await
            },
        )
        .await
    }

    /// Delete every match
    pub async fn delete_many(&self, filter: BsonDocument) -> Result<DeleteOutcome> {
        let binding = self.binding.clone();
        run_operation(
            "deleteMany",
            &self.hooks,
            HookPair::DELETE,
            self.name(),
            vec![Bson::Document(filter)],
            |mut args| async move {
                let filter = document_arg(&mut args, 0)?;
                binding.driver.delete_many(&binding.name, filter).await
            },
        )
        .await
    }
}

impl fmt::Debug for CollectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionHandle")
            .field("name", &self.binding.name)
            .field("schema", &self.binding.schema.is_some())
            .field("hooks", &self.hooks)
            .finish()
    }
}

fn read_args(
    filter: BsonDocument,
    projection: Option<BsonDocument>,
    options: &ReadOptions,
) -> Vec<Bson> {
    vec![
        Bson::Document(filter),
        projection.map(Bson::Document).unwrap_or(Bson::Null),
        Bson::Document(options.to_document()),
    ]
}

fn take_read_args(
    args: &mut [Bson],
) -> Result<(BsonDocument, Option<BsonDocument>, ReadOptions)> {
    let filter = document_arg(args, 0)?;
    let projection = optional_document_arg(args, 1)?;
    let options = match optional_document_arg(args, 2)? {
        Some(doc) => ReadOptions::from_document(&doc)?,
        None => ReadOptions::default(),
    };
    Ok((filter, projection, options))
}
