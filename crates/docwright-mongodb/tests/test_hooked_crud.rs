//! End-to-end behavior of hooked CRUD over the in-memory driver.

use async_trait::async_trait;
use bson::{doc, Bson, Document as BsonDocument};
use docwright_mongodb::{
    async_hook, hook_fn, ConnectionConfig, ConnectionManager, DeleteOutcome, DocumentEvent,
    DocwrightError, Driver, FieldSpec, FieldType, HookName, InMemoryDriver, ReadOptions, Result,
    Schema, UpdateOptions,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn setup() -> (Arc<InMemoryDriver>, ConnectionManager) {
    init_tracing();
    let driver = Arc::new(InMemoryDriver::new());
    let manager = ConnectionManager::new(ConnectionConfig::default(), driver.clone());
    (driver, manager)
}

fn name_of(doc: &BsonDocument) -> String {
    doc.get_str("name").unwrap_or_default().to_string()
}

#[tokio::test]
async fn test_hooks_run_in_registration_order_around_create() {
    let (driver, manager) = setup();
    let users = assert_ok!(manager.get_collection("users").await);
    let log = Arc::new(Mutex::new(Vec::new()));

    for (name, label) in [
        (HookName::BeforeCreate, "before-1"),
        (HookName::BeforeCreate, "before-2"),
        (HookName::AfterCreate, "after-1"),
    ] {
        let log = log.clone();
        users.use_hook(
            name,
            hook_fn(move |_| {
                log.lock().push(label);
                Ok(())
            }),
        );
    }

    let handle = assert_ok!(users.create(doc! { "name": "Ann" }).await);
    assert_eq!(*log.lock(), vec!["before-1", "before-2", "after-1"]);
    assert_eq!(driver.documents("users").len(), 1);
    assert_eq!(handle.collection_name(), "users");
}

#[tokio::test]
async fn test_unknown_hook_name_fails_immediately() {
    let (_driver, manager) = setup();
    let users = assert_ok!(manager.get_collection("users").await);

    let err = assert_err!(users.use_hook_named("beforeUpsert", hook_fn(|_| Ok(()))));
    assert!(matches!(err, DocwrightError::InvalidHookName(ref n) if n == "beforeUpsert"));
    assert_ok!(users.use_hook_named("afterDelete", hook_fn(|_| Ok(()))));
    assert_eq!(users.hooks().len(HookName::AfterDelete), 1);
}

#[tokio::test]
async fn test_find_by_id_fails_while_read_one_returns_none() {
    let (_driver, manager) = setup();
    let users = assert_ok!(manager.get_collection("users").await);
    let after_reads = Arc::new(Mutex::new(0));
    let count = after_reads.clone();
    users.use_hook(
        HookName::AfterRead,
        hook_fn(move |_| {
            *count.lock() += 1;
            Ok(())
        }),
    );

    let err = assert_err!(users.find_by_id(bson::oid::ObjectId::new()).await);
    assert!(err.is_not_found());
    assert_eq!(*after_reads.lock(), 0);

    let none = assert_ok!(
        users
            .read_one(doc! { "name": "ghost" }, None, ReadOptions::default())
            .await
    );
    assert!(none.is_none());
    assert_eq!(*after_reads.lock(), 1);
}

#[tokio::test]
async fn test_read_preserves_driver_order_and_projection() {
    let (_driver, manager) = setup();
    let users = assert_ok!(manager.get_collection("users").await);
    for (name, age) in [("Cy", 30), ("Ann", 20), ("Bob", 25)] {
        assert_ok!(users.create(doc! { "name": name, "age": age }).await);
    }

    let sorted = assert_ok!(
        users
            .read(
                doc! { "age": { "$gte": 21 } },
                Some(doc! { "name": 1 }),
                ReadOptions::new().sort(doc! { "age": 1 }),
            )
            .await
    );
    let names: Vec<String> = sorted.iter().map(|h| name_of(h.fields())).collect();
    assert_eq!(names, vec!["Bob", "Cy"]);
    assert!(sorted.iter().all(|h| h.get("age").is_none() && h.id().is_some()));
}

#[tokio::test]
async fn test_update_and_delete_return_raw_results() {
    let (_driver, manager) = setup();
    let users = assert_ok!(manager.get_collection("users").await);
    assert_ok!(users.create(doc! { "name": "Ann", "age": 1 }).await);
    assert_ok!(users.create(doc! { "name": "Bob", "age": 1 }).await);

    let updated = assert_ok!(
        users
            .update(
                doc! { "name": "Ann" },
                doc! { "$inc": { "age": 1 } },
                UpdateOptions::default(),
            )
            .await
    );
    assert_eq!(updated.and_then(|d| d.get("age").cloned()), Some(Bson::Int32(2)));

    let missing = assert_ok!(
        users
            .update(doc! { "name": "Zed" }, doc! { "age": 9 }, UpdateOptions::default())
            .await
    );
    assert!(missing.is_none());

    let one = assert_ok!(users.delete(doc! { "age": { "$gte": 1 } }).await);
    assert_eq!(one.deleted_count, 1);
    let rest = assert_ok!(users.delete_many(doc! {}).await);
    assert_eq!(rest.deleted_count, 1);
}

#[tokio::test]
async fn test_async_hook_can_enrich_before_insert() {
    let (driver, manager) = setup();
    let users = assert_ok!(manager.get_collection("users").await);
    users.use_hook(
        HookName::BeforeCreate,
        async_hook(|mut payload| async move {
            tokio::task::yield_now().await;
            if let Some(doc) = payload.document_mut(0) {
                doc.insert("source", "import");
            }
            Ok(payload)
        }),
    );

    assert_ok!(users.create(doc! { "name": "Ann" }).await);
    assert_eq!(driver.documents("users")[0].get_str("source").unwrap(), "import");
}

/// Delegates to [`InMemoryDriver`] and logs when each insert starts and ends
struct RecordingDriver {
    inner: InMemoryDriver,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Driver for RecordingDriver {
    async fn connect(&self) -> Result<()> {
        self.inner.connect().await
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }

    async fn ping(&self) -> Result<()> {
        self.inner.ping().await
    }

    async fn insert(&self, collection: &str, document: BsonDocument) -> Result<BsonDocument> {
        let who = name_of(&document);
        self.log.lock().push(format!("op-start:{}", who));
        let stored = self.inner.insert(collection, document).await;
        self.log.lock().push(format!("op-end:{}", who));
        stored
    }

    async fn find_by_id(&self, collection: &str, id: &Bson) -> Result<Option<BsonDocument>> {
        self.inner.find_by_id(collection, id).await
    }

    async fn find(
        &self,
        collection: &str,
        filter: BsonDocument,
        projection: Option<BsonDocument>,
        options: ReadOptions,
    ) -> Result<Vec<BsonDocument>> {
        self.inner.find(collection, filter, projection, options).await
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: BsonDocument,
        projection: Option<BsonDocument>,
        options: ReadOptions,
    ) -> Result<Option<BsonDocument>> {
        self.inner.find_one(collection, filter, projection, options).await
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: BsonDocument,
        update: BsonDocument,
        options: UpdateOptions,
    ) -> Result<Option<BsonDocument>> {
        self.inner
            .find_one_and_update(collection, filter, update, options)
            .await
    }

    async fn delete_one(&self, collection: &str, filter: BsonDocument) -> Result<DeleteOutcome> {
        self.inner.delete_one(collection, filter).await
    }

    async fn delete_many(&self, collection: &str, filter: BsonDocument) -> Result<DeleteOutcome> {
        self.inner.delete_many(collection, filter).await
    }
}

#[tokio::test]
async fn test_concurrent_creates_interleave_but_keep_per_call_ordering() {
    init_tracing();
    let log = Arc::new(Mutex::new(Vec::new()));
    let driver = Arc::new(RecordingDriver {
        inner: InMemoryDriver::new(),
        log: log.clone(),
    });
    let manager = ConnectionManager::new(ConnectionConfig::default(), driver.clone());
    let users = assert_ok!(manager.get_collection("users").await);

    for name in [HookName::BeforeCreate, HookName::AfterCreate] {
        let log = log.clone();
        users.use_hook(
            name,
            hook_fn(move |p| {
                let who = p.document(0).map(name_of).unwrap_or_default();
                log.lock().push(format!("{}:{}", name, who));
                Ok(())
            }),
        );
    }

    let (a, b) = tokio::join!(
        users.create(doc! { "name": "A" }),
        users.create(doc! { "name": "B" }),
    );
    assert_ok!(a);
    assert_ok!(b);

    let log = log.lock();
    assert_eq!(log.len(), 8);
    let at = |entry: String| {
        log.iter()
            .position(|e| *e == entry)
            .unwrap_or_else(|| panic!("missing {} in {:?}", entry, log))
    };
    for who in ["A", "B"] {
        let before = at(format!("beforeCreate:{}", who));
        let start = at(format!("op-start:{}", who));
        let end = at(format!("op-end:{}", who));
        let after = at(format!("afterCreate:{}", who));
        assert!(before < start && start < end && end < after, "{:?}", log);
    }

    // Each insert suspends, so the other call starts before either finishes
    let last_start = at("op-start:A".to_string()).max(at("op-start:B".to_string()));
    let first_end = at("op-end:A".to_string()).min(at("op-end:B".to_string()));
    assert!(last_start < first_end, "calls did not interleave: {:?}", log);

    assert_eq!(driver.inner.documents("users").len(), 2);
}

#[tokio::test]
async fn test_document_lifecycle_events_fire_once_each() {
    let (driver, manager) = setup();
    let users = assert_ok!(manager.get_collection("users").await);
    let events = Arc::new(Mutex::new(Vec::new()));

    let mut handle = users.new_document(doc! { "name": "A", "age": 1 });
    for event in [
        DocumentEvent::OnCreate,
        DocumentEvent::OnUpdate,
        DocumentEvent::OnDelete,
    ] {
        let events = events.clone();
        handle.on(event, move |doc| events.lock().push((event, name_of(doc))));
    }

    assert_ok!(handle.save().await);
    assert_ok!(handle.update(doc! { "name": "B" }).await);
    assert_eq!(handle.get("age"), Some(&Bson::Int32(1)));
    assert_ok!(handle.delete().await);

    assert_eq!(
        *events.lock(),
        vec![
            (DocumentEvent::OnCreate, "A".to_string()),
            (DocumentEvent::OnUpdate, "B".to_string()),
            (DocumentEvent::OnDelete, "B".to_string()),
        ]
    );
    assert!(driver.documents("users").is_empty());
    assert!(matches!(
        assert_err!(handle.save().await),
        DocwrightError::InvalidState(_)
    ));
}

#[tokio::test]
async fn test_collection_hooks_do_not_run_for_document_mutations() {
    let (_driver, manager) = setup();
    let users = assert_ok!(manager.get_collection("users").await);
    let collection_calls = Arc::new(Mutex::new(0));
    let c = collection_calls.clone();
    users.use_hook(
        HookName::BeforeUpdate,
        hook_fn(move |_| {
            *c.lock() += 1;
            Ok(())
        }),
    );

    let mut handle = assert_ok!(users.create(doc! { "name": "A" }).await);
    assert_ok!(handle.update(doc! { "name": "B" }).await);
    assert_eq!(*collection_calls.lock(), 0);
}

#[tokio::test]
async fn test_copy_then_save_leaves_original_record_alone() {
    let (driver, manager) = setup();
    let users = assert_ok!(manager.get_collection("users").await);
    let original = assert_ok!(users.create(doc! { "name": "A", "age": 1 }).await);

    let mut copy = original.copy();
    copy.set("age", 99);
    assert_ok!(copy.save().await);

    let reloaded = assert_ok!(users.find_by_id(original.id().cloned().unwrap()).await);
    assert_eq!(reloaded.get("age"), Some(&Bson::Int32(1)));
    assert_eq!(driver.documents("users").len(), 2);
}

#[tokio::test]
async fn test_driver_failure_is_tagged_and_skips_after_hook() {
    let (driver, manager) = setup();
    let users = assert_ok!(manager.get_collection("users").await);
    let after_calls = Arc::new(Mutex::new(0));
    let c = after_calls.clone();
    users.use_hook(
        HookName::AfterDelete,
        hook_fn(move |_| {
            *c.lock() += 1;
            Ok(())
        }),
    );

    driver.fail_next_operation(DocwrightError::Timeout("server selection".to_string()));
    let err = assert_err!(users.delete_many(doc! {}).await);
    assert_eq!(err.operation_name(), Some("deleteMany"));
    assert!(err.is_retryable());
    assert!(err.to_string().starts_with("Operation 'deleteMany' failed"));
    assert_eq!(*after_calls.lock(), 0);
}

#[tokio::test]
async fn test_connect_failure_surfaces_as_connection_error() {
    let (driver, manager) = setup();
    driver.fail_connections(true);

    let err = assert_err!(manager.get_collection("users").await);
    assert!(matches!(err, DocwrightError::Connection(_)));
    assert!(!manager.is_connected());
}

#[tokio::test]
async fn test_schema_registration_drives_defaults_and_required_fields() {
    let (driver, manager) = setup();
    assert_ok!(manager.create_collection(
        "accounts",
        Schema::new()
            .field("email", FieldSpec::new(FieldType::String).required())
            .field("plan", FieldSpec::new(FieldType::String).default_value("free")),
    ));
    let accounts = assert_ok!(manager.get_collection("accounts").await);

    // A before-hook may fill in a required field before validation
    accounts.use_hook(
        HookName::BeforeCreate,
        hook_fn(|p| {
            if let Some(doc) = p.document_mut(0) {
                if !doc.contains_key("email") {
                    doc.insert("email", "unknown@example.com");
                }
            }
            Ok(())
        }),
    );

    let handle = assert_ok!(accounts.create(doc! {}).await);
    assert_eq!(handle.get("plan"), Some(&Bson::String("free".to_string())));
    assert_eq!(driver.documents("accounts").len(), 1);

    let err = assert_err!(accounts.create(doc! { "email": 5 }).await);
    assert!(matches!(err.root_cause(), DocwrightError::Validation(_)));
}
