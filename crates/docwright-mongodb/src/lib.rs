//! Hooked CRUD wrappers over the MongoDB driver
//!
//! docwright sequences application callbacks around driver calls. It does
//! not implement storage, querying or pooling; every operation ends in a
//! call on a [`Driver`].
//!
//! # Features
//! - Connection lifecycle with implicit connect on first collection access
//! - Before/after hooks per operation kind, per collection and per document
//! - Document handles that emit `OnCreate`/`OnUpdate`/`OnDelete` events
//! - Optional schemas with defaults, required fields and type checks
//! - An in-memory driver for tests
//!
//! # Example
//!
//! ```ignore
//! use docwright_mongodb::{hook_fn, ConnectionConfig, ConnectionManager, HookName};
//! use bson::doc;
//!
//! let manager = ConnectionManager::mongodb(ConnectionConfig::from_env());
//! let users = manager.get_collection("users").await?;
//! users.use_hook(
//!     HookName::BeforeCreate,
//!     hook_fn(|payload| {
//!         if let Some(doc) = payload.document_mut(0) {
//!             doc.insert("createdBy", "signup");
//!         }
//!         Ok(())
//!     }),
//! );
//! let mut user = users.create(doc! { "name": "Ann" }).await?;
//! user.on_update(|doc| println!("updated: {doc}"));
//! user.update(doc! { "name": "Anne" }).await?;
//! ```

pub mod collection;
pub mod config;
pub mod connection;
pub mod document;
pub mod driver;
pub mod events;
pub mod hooks;
pub mod memory;
pub mod mongo;
pub mod runner;
pub mod schema;

pub use collection::CollectionHandle;
pub use config::{ConnectionConfig, PoolConfig};
pub use connection::ConnectionManager;
pub use docwright_common::{DocwrightError, Result};
pub use document::DocumentHandle;
pub use driver::{DeleteOutcome, Driver, ReadOptions, UpdateOptions};
pub use events::{DocumentEvent, EventSource, Listener, Listeners};
pub use hooks::{
    async_hook, hook_fn, AsyncHook, Hook, HookName, HookPair, HookPayload, HookRegistry,
};
pub use memory::InMemoryDriver;
pub use mongo::MongoDriver;
pub use runner::{run_operation, HookValue};
pub use schema::{FieldSpec, FieldType, ModelRef, Schema, ValidatedCollectionName};
