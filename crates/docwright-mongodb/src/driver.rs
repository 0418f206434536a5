//! Delegation surface to the underlying document database.
//!
//! Everything below this trait (pooling, wire protocol, query execution) is
//! owned by the driver. docwright only sequences calls into it.

use async_trait::async_trait;
use bson::{doc, Bson, Document as BsonDocument};
use docwright_common::{DocwrightError, Result};

/// Options for find / find-one calls
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadOptions {
    /// Sort specification, e.g. `{ "age": -1 }`
    pub sort: Option<BsonDocument>,
    /// Number of documents to skip
    pub skip: Option<u64>,
    /// Maximum number of documents to return
    pub limit: Option<i64>,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort(mut self, sort: BsonDocument) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Form shown to hooks: `{ sort?, skip?, limit? }`
    pub fn to_document(&self) -> BsonDocument {
        let mut doc = BsonDocument::new();
        if let Some(sort) = &self.sort {
            doc.insert("sort", sort.clone());
        }
        if let Some(skip) = self.skip {
            doc.insert("skip", skip as i64);
        }
        if let Some(limit) = self.limit {
            doc.insert("limit", limit);
        }
        doc
    }

    pub fn from_document(doc: &BsonDocument) -> Result<Self> {
        let sort = match doc.get("sort") {
            None | Some(Bson::Null) => None,
            Some(Bson::Document(sort)) => Some(sort.clone()),
            Some(other) => return Err(option_error("sort", "a document", other)),
        };
        let skip = match doc.get("skip") {
            None | Some(Bson::Null) => None,
            Some(value) => Some(
                as_i64(value)
                    .and_then(|n| u64::try_from(n).ok())
                    .ok_or_else(|| option_error("skip", "a non-negative integer", value))?,
            ),
        };
        let limit = match doc.get("limit") {
            None | Some(Bson::Null) => None,
            Some(value) => Some(
                as_i64(value).ok_or_else(|| option_error("limit", "an integer", value))?,
            ),
        };
        Ok(Self { sort, skip, limit })
    }
}

fn as_i64(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(n) => Some(*n as i64),
        Bson::Int64(n) => Some(*n),
        _ => None,
    }
}

fn option_error(name: &str, expected: &str, got: &Bson) -> DocwrightError {
    DocwrightError::Validation(format!(
        "option '{}' must be {}, got {:?}",
        name,
        expected,
        got.element_type()
    ))
}

/// Options for find-one-and-update calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Insert a new document when nothing matches
    pub upsert: bool,
    /// Return the document as it is after the update (before otherwise)
    pub return_new: bool,
}

impl UpdateOptions {
    /// Form shown to hooks: `{ upsert, returnNew }`
    pub fn to_document(&self) -> BsonDocument {
        doc! { "upsert": self.upsert, "returnNew": self.return_new }
    }

    pub fn from_document(doc: &BsonDocument) -> Result<Self> {
        let flag = |name: &str, default: bool| match doc.get(name) {
            None | Some(Bson::Null) => Ok(default),
            Some(Bson::Boolean(b)) => Ok(*b),
            Some(other) => Err(option_error(name, "a boolean", other)),
        };
        let defaults = Self::default();
        Ok(Self {
            upsert: flag("upsert", defaults.upsert)?,
            return_new: flag("returnNew", defaults.return_new)?,
        })
    }
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            upsert: false,
            return_new: true,
        }
    }
}

/// Raw result of a delete call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted_count: u64,
}

/// Filter selecting a single record by identity
pub fn id_filter(id: &Bson) -> BsonDocument {
    doc! { "_id": id.clone() }
}

/// CRUD primitives provided by a document-database client.
///
/// Implementations must be safe to share between tasks; each call is
/// independent and carries its own inputs.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Establish the underlying session
    async fn connect(&self) -> Result<()>;

    /// Tear down the underlying session
    async fn close(&self) -> Result<()>;

    /// Check that the server answers
    async fn ping(&self) -> Result<()>;

    /// Insert a document, returning it as stored (with `_id`)
    async fn insert(&self, collection: &str, document: BsonDocument) -> Result<BsonDocument>;

    async fn find_by_id(&self, collection: &str, id: &Bson) -> Result<Option<BsonDocument>>;

    async fn find(
        &self,
        collection: &str,
        filter: BsonDocument,
        projection: Option<BsonDocument>,
        options: ReadOptions,
    ) -> Result<Vec<BsonDocument>>;

    async fn find_one(
        &self,
        collection: &str,
        filter: BsonDocument,
        projection: Option<BsonDocument>,
        options: ReadOptions,
    ) -> Result<Option<BsonDocument>>;

    /// Apply `update` to the first match.
    ///
    /// A document without top-level operators is applied as `$set`.
    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: BsonDocument,
        update: BsonDocument,
        options: UpdateOptions,
    ) -> Result<Option<BsonDocument>>;

    async fn delete_one(&self, collection: &str, filter: BsonDocument) -> Result<DeleteOutcome>;

    async fn delete_many(&self, collection: &str, filter: BsonDocument) -> Result<DeleteOutcome>;
}

/// Wraps a plain field document in `$set`; operator documents pass through
pub fn normalize_update(update: BsonDocument) -> BsonDocument {
    if update.keys().any(|k| k.starts_with('$')) {
        update
    } else {
        doc! { "$set": update }
    }
}
