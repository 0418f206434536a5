//! In-process [`Driver`] keeping collections in memory.
//!
//! Supports the subset of MongoDB semantics docwright itself relies on:
//! equality and comparison filters, projection, sort/skip/limit and
//! `$set`/`$unset`/`$inc` updates. Useful for tests and prototyping.

use async_trait::async_trait;
use bson::{oid::ObjectId, Bson, Document as BsonDocument};
use docwright_common::{DocwrightError, Result};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};

use crate::driver::{normalize_update, DeleteOutcome, Driver, ReadOptions, UpdateOptions};

#[derive(Default)]
pub struct InMemoryDriver {
    collections: Mutex<HashMap<String, Vec<BsonDocument>>>,
    fail_connect: AtomicBool,
    next_failure: Mutex<Option<DocwrightError>>,
    connects: AtomicUsize,
    closes: AtomicUsize,
}

impl InMemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `connect` fail until reset
    pub fn fail_connections(&self, fail: bool) {
        self.fail_connect.store(fail, AtomicOrdering::SeqCst);
    }

    /// Make the next CRUD call fail with `error`
    pub fn fail_next_operation(&self, error: DocwrightError) {
        *self.next_failure.lock() = Some(error);
    }

    /// Number of successful `connect` calls
    pub fn connect_count(&self) -> usize {
        self.connects.load(AtomicOrdering::SeqCst)
    }

    /// Number of `close` calls
    pub fn close_count(&self) -> usize {
        self.closes.load(AtomicOrdering::SeqCst)
    }

    /// Snapshot of a collection's documents in insertion order
    pub fn documents(&self, collection: &str) -> Vec<BsonDocument> {
        self.collections
            .lock()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    async fn begin(&self) -> Result<()> {
        // Every call is a suspension point, like a network round trip
        tokio::task::yield_now().await;
        match self.next_failure.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn select(
        &self,
        collection: &str,
        filter: &BsonDocument,
        projection: Option<&BsonDocument>,
        options: &ReadOptions,
    ) -> Result<Vec<BsonDocument>> {
        let collections = self.collections.lock();
        let mut found = Vec::new();
        for doc in collections.get(collection).into_iter().flatten() {
            if matches_filter(doc, filter)? {
                found.push(doc.clone());
            }
        }
        drop(collections);

        if let Some(sort) = &options.sort {
            found.sort_by(|a, b| compare_by_sort(a, b, sort));
        }
        let skip = options.skip.unwrap_or(0) as usize;
        let limit = match options.limit {
            Some(l) if l != 0 => l.unsigned_abs() as usize,
            _ => usize::MAX,
        };

        found
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|d| match projection {
                Some(p) => project(&d, p),
                None => Ok(d),
            })
            .collect()
    }
}

#[async_trait]
impl Driver for InMemoryDriver {
    async fn connect(&self) -> Result<()> {
        tokio::task::yield_now().await;
        if self.fail_connect.load(AtomicOrdering::SeqCst) {
            return Err(DocwrightError::Connection(
                "connection refused (in-memory driver)".to_string(),
            ));
        }
        self.connects.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        tokio::task::yield_now().await;
        self.closes.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn insert(&self, collection: &str, mut document: BsonDocument) -> Result<BsonDocument> {
        self.begin().await?;
        if !document.contains_key("_id") {
            document.insert("_id", ObjectId::new());
        }
        let mut collections = self.collections.lock();
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.iter().any(|d| d.get("_id") == document.get("_id")) {
            return Err(DocwrightError::Database(format!(
                "duplicate key in '{}': _id {}",
                collection,
                document.get("_id").cloned().unwrap_or(Bson::Null)
            )));
        }
        docs.push(document.clone());
        Ok(document)
    }

    async fn find_by_id(&self, collection: &str, id: &Bson) -> Result<Option<BsonDocument>> {
        self.begin().await?;
        let collections = self.collections.lock();
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.get("_id") == Some(id)))
            .cloned())
    }

    async fn find(
        &self,
        collection: &str,
        filter: BsonDocument,
        projection: Option<BsonDocument>,
        options: ReadOptions,
    ) -> Result<Vec<BsonDocument>> {
        self.begin().await?;
        self.select(collection, &filter, projection.as_ref(), &options)
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: BsonDocument,
        projection: Option<BsonDocument>,
        options: ReadOptions,
    ) -> Result<Option<BsonDocument>> {
        self.begin().await?;
        let options = ReadOptions {
            limit: Some(1),
            ..options
        };
        Ok(self
            .select(collection, &filter, projection.as_ref(), &options)?
            .into_iter()
            .next())
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: BsonDocument,
        update: BsonDocument,
        options: UpdateOptions,
    ) -> Result<Option<BsonDocument>> {
        self.begin().await?;
        let update = normalize_update(update);
        let mut collections = self.collections.lock();
        let docs = collections.entry(collection.to_string()).or_default();

        if let Some(idx) = position(docs, &filter)? {
            let before = docs[idx].clone();
            let mut after = before.clone();
            apply_update(&mut after, &update)?;
            docs[idx] = after.clone();
            return Ok(Some(if options.return_new { after } else { before }));
        }

        if !options.upsert {
            return Ok(None);
        }

        let mut inserted: BsonDocument = filter
            .iter()
            .filter(|(k, v)| !k.starts_with('$') && !is_operator_doc(v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        apply_update(&mut inserted, &update)?;
        if !inserted.contains_key("_id") {
            inserted.insert("_id", ObjectId::new());
        }
        docs.push(inserted.clone());
        Ok(if options.return_new { Some(inserted) } else { None })
    }

    async fn delete_one(&self, collection: &str, filter: BsonDocument) -> Result<DeleteOutcome> {
        self.begin().await?;
        let mut collections = self.collections.lock();
        let deleted_count = match collections.get_mut(collection) {
            Some(docs) => match position(docs, &filter)? {
                Some(idx) => {
                    docs.remove(idx);
                    1
                }
                None => 0,
            },
            None => 0,
        };
        Ok(DeleteOutcome { deleted_count })
    }

    async fn delete_many(&self, collection: &str, filter: BsonDocument) -> Result<DeleteOutcome> {
        self.begin().await?;
        let mut collections = self.collections.lock();
        let deleted_count = match collections.get_mut(collection) {
            Some(docs) => {
                let matched = docs
                    .iter()
                    .map(|d| matches_filter(d, &filter))
                    .collect::<Result<Vec<bool>>>()?;
                let mut flags = matched.iter();
                docs.retain(|_| !flags.next().copied().unwrap_or(false));
                matched.iter().filter(|m| **m).count() as u64
            }
            None => 0,
        };
        Ok(DeleteOutcome { deleted_count })
    }
}

// =====================
// Query evaluation
// =====================

fn is_operator_doc(value: &Bson) -> bool {
    match value {
        Bson::Document(d) => !d.is_empty() && d.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

fn lookup<'a>(doc: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = current.as_document()?.get(part)?;
    }
    Some(current)
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(i) => Some(*i as f64),
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(f) => Some(*f),
        _ => None,
    }
}

fn compare_values(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_f64(a), as_f64(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => Some(x.cmp(y)),
        (Bson::Null, Bson::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn values_equal(a: &Bson, b: &Bson) -> bool {
    compare_values(a, b) == Some(Ordering::Equal) || a == b
}

fn field_equals(field: Option<&Bson>, expected: &Bson) -> bool {
    match (field, expected) {
        (None, Bson::Null) => true,
        (None, _) => false,
        (Some(Bson::Array(items)), expected) if !matches!(expected, Bson::Array(_)) => {
            items.iter().any(|item| values_equal(item, expected))
        }
        (Some(value), expected) => values_equal(value, expected),
    }
}

fn matches_operator(field: Option<&Bson>, op: &str, arg: &Bson) -> Result<bool> {
    let ordered = |want: &[Ordering]| {
        field
            .and_then(|v| compare_values(v, arg))
            .map(|o| want.contains(&o))
            .unwrap_or(false)
    };
    let matched = match op {
        "$eq" => field_equals(field, arg),
        "$ne" => !field_equals(field, arg),
        "$gt" => ordered(&[Ordering::Greater]),
        "$gte" => ordered(&[Ordering::Greater, Ordering::Equal]),
        "$lt" => ordered(&[Ordering::Less]),
        "$lte" => ordered(&[Ordering::Less, Ordering::Equal]),
        "$in" | "$nin" => {
            let options = arg
                .as_array()
                .ok_or_else(|| DocwrightError::Database(format!("{} needs an array", op)))?;
            let found = options.iter().any(|o| field_equals(field, o));
            if op == "$in" {
                found
            } else {
                !found
            }
        }
        "$exists" => field.is_some() == arg.as_bool().unwrap_or(true),
        other => return Err(unsupported_query_operator(other)),
    };
    Ok(matched)
}

fn unsupported_query_operator(op: &str) -> DocwrightError {
    DocwrightError::Database(format!("Unsupported query operator '{}'", op))
}

fn matches_filter(doc: &BsonDocument, filter: &BsonDocument) -> Result<bool> {
    for (key, cond) in filter {
        let matched = match key.as_str() {
            "$and" => {
                let mut all = true;
                for clause in clauses(cond) {
                    all &= matches_filter(doc, &clause)?;
                }
                all
            }
            "$or" | "$nor" => {
                let mut any = false;
                for clause in clauses(cond) {
                    any |= matches_filter(doc, &clause)?;
                }
                if key.as_str() == "$or" {
                    any
                } else {
                    !any
                }
            }
            op if op.starts_with('$') => return Err(unsupported_query_operator(op)),
            path => {
                let field = lookup(doc, path);
                match cond {
                    Bson::Document(ops) if is_operator_doc(cond) => {
                        let mut all = true;
                        for (op, arg) in ops {
                            all &= matches_operator(field, op, arg)?;
                        }
                        all
                    }
                    expected => field_equals(field, expected),
                }
            }
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn position(docs: &[BsonDocument], filter: &BsonDocument) -> Result<Option<usize>> {
    for (idx, doc) in docs.iter().enumerate() {
        if matches_filter(doc, filter)? {
            return Ok(Some(idx));
        }
    }
    Ok(None)
}

fn clauses(value: &Bson) -> Vec<BsonDocument> {
    match value {
        Bson::Array(items) => items
            .iter()
            .filter_map(|i| i.as_document().cloned())
            .collect(),
        _ => Vec::new(),
    }
}

fn compare_by_sort(a: &BsonDocument, b: &BsonDocument, sort: &BsonDocument) -> Ordering {
    for (key, direction) in sort {
        let ordering = match (lookup(a, key), lookup(b, key)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
        };
        let ordering = if as_f64(direction).unwrap_or(1.0) < 0.0 {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        other => as_f64(other).map(|f| f != 0.0).unwrap_or(true),
    }
}

fn project(doc: &BsonDocument, projection: &BsonDocument) -> Result<BsonDocument> {
    if projection.is_empty() {
        return Ok(doc.clone());
    }
    let include_id = projection.get("_id").map(truthy).unwrap_or(true);
    let fields: Vec<(&String, bool)> = projection
        .iter()
        .filter(|(k, _)| k.as_str() != "_id")
        .map(|(k, v)| (k, truthy(v)))
        .collect();

    let inclusive = fields.iter().any(|(_, include)| *include);
    if inclusive && fields.iter().any(|(_, include)| !*include) {
        return Err(DocwrightError::Database(
            "Projection cannot mix inclusion and exclusion".to_string(),
        ));
    }

    let mut projected = BsonDocument::new();
    if inclusive {
        if include_id {
            if let Some(id) = doc.get("_id") {
                projected.insert("_id", id.clone());
            }
        }
        for (key, _) in fields {
            if let Some(value) = doc.get(key) {
                projected.insert(key.clone(), value.clone());
            }
        }
    } else {
        projected = doc.clone();
        for (key, _) in fields {
            projected.remove(key);
        }
        if !include_id {
            projected.remove("_id");
        }
    }
    Ok(projected)
}

fn apply_update(doc: &mut BsonDocument, update: &BsonDocument) -> Result<()> {
    for (op, body) in update {
        let body = body.as_document().ok_or_else(|| {
            DocwrightError::Database(format!("Update operator '{}' requires a document", op))
        })?;
        match op.as_str() {
            "$set" => {
                for (key, value) in body {
                    if key == "_id" && doc.get("_id").is_some_and(|id| id != value) {
                        return Err(DocwrightError::Database(
                            "Cannot modify the immutable field '_id'".to_string(),
                        ));
                    }
                    doc.insert(key.clone(), value.clone());
                }
            }
            "$unset" => {
                for (key, _) in body {
                    doc.remove(key);
                }
            }
            "$inc" => {
                for (key, delta) in body {
                    let updated = increment(key, doc.get(key), delta)?;
                    doc.insert(key.clone(), updated);
                }
            }
            other => {
                return Err(DocwrightError::Database(format!(
                    "Unsupported update operator '{}'",
                    other
                )))
            }
        }
    }
    Ok(())
}

/// `$inc` arithmetic; an Int32 overflow widens to Int64, an Int64 overflow fails
fn increment(key: &str, current: Option<&Bson>, delta: &Bson) -> Result<Bson> {
    let overflow = || {
        DocwrightError::Database(format!("$inc on field '{}' overflows a 64-bit integer", key))
    };
    let updated = match (current, delta) {
        (None, d) if as_f64(d).is_some() => d.clone(),
        (Some(Bson::Int32(a)), Bson::Int32(b)) => match a.checked_add(*b) {
            Some(sum) => Bson::Int32(sum),
            None => Bson::Int64(i64::from(*a) + i64::from(*b)),
        },
        (Some(Bson::Int32(a)), Bson::Int64(b)) => {
            Bson::Int64(i64::from(*a).checked_add(*b).ok_or_else(overflow)?)
        }
        (Some(Bson::Int64(a)), Bson::Int32(b)) => {
            Bson::Int64(a.checked_add(i64::from(*b)).ok_or_else(overflow)?)
        }
        (Some(Bson::Int64(a)), Bson::Int64(b)) => {
            Bson::Int64(a.checked_add(*b).ok_or_else(overflow)?)
        }
        (current, d) => match (current.map_or(Some(0.0), as_f64), as_f64(d)) {
            (Some(a), Some(b)) => Bson::Double(a + b),
            _ => {
                return Err(DocwrightError::Database(format!(
                    "Cannot apply $inc to non-numeric field '{}'",
                    key
                )))
            }
        },
    };
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    async fn seeded() -> InMemoryDriver {
        let driver = InMemoryDriver::new();
        for (name, age) in [("Ann", 31), ("Bob", 25), ("Cid", 40)] {
            driver
                .insert("people", doc! { "name": name, "age": age, "tags": ["a"] })
                .await
                .unwrap();
        }
        driver
    }

    #[tokio::test]
    async fn test_insert_assigns_object_id() {
        let driver = InMemoryDriver::new();
        let stored = driver.insert("people", doc! { "name": "Ann" }).await.unwrap();
        assert!(stored.get_object_id("_id").is_ok());
        assert_eq!(driver.documents("people").len(), 1);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let driver = InMemoryDriver::new();
        driver.insert("people", doc! { "_id": 1 }).await.unwrap();
        let err = driver.insert("people", doc! { "_id": 1 }).await.unwrap_err();
        assert!(matches!(err, DocwrightError::Database(_)));
    }

    #[tokio::test]
    async fn test_find_with_operators_sort_skip_limit() {
        let driver = seeded().await;
        let found = driver
            .find(
                "people",
                doc! { "age": { "$gte": 30 } },
                None,
                ReadOptions::new().sort(doc! { "age": -1 }),
            )
            .await
            .unwrap();
        let names: Vec<&str> = found.iter().map(|d| d.get_str("name").unwrap()).collect();
        assert_eq!(names, vec!["Cid", "Ann"]);

        let page = driver
            .find(
                "people",
                doc! {},
                None,
                ReadOptions::new().sort(doc! { "name": 1 }).skip(1).limit(1),
            )
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].get_str("name").unwrap(), "Bob");
    }

    #[tokio::test]
    async fn test_filter_logic_and_arrays() {
        let driver = seeded().await;
        let found = driver
            .find(
                "people",
                doc! { "$or": [{ "name": "Ann" }, { "age": { "$lt": 30 } }], "tags": "a" },
                None,
                ReadOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 2);

        let none = driver
            .find(
                "people",
                doc! { "name": { "$in": ["Zed"] } },
                None,
                ReadOptions::default(),
            )
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_projection() {
        let driver = seeded().await;
        let doc = driver
            .find_one(
                "people",
                doc! { "name": "Ann" },
                Some(doc! { "name": 1, "_id": 0 }),
                ReadOptions::default(),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc, doc! { "name": "Ann" });

        let doc = driver
            .find_one(
                "people",
                doc! { "name": "Ann" },
                Some(doc! { "tags": 0 }),
                ReadOptions::default(),
            )
            .await
            .unwrap()
            .unwrap();
        assert!(!doc.contains_key("tags"));
        assert!(doc.contains_key("_id"));
    }

    #[tokio::test]
    async fn test_find_one_and_update_partial() {
        let driver = seeded().await;
        let updated = driver
            .find_one_and_update(
                "people",
                doc! { "name": "Bob" },
                doc! { "age": 26 },
                UpdateOptions::default(),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.get_i32("age").unwrap(), 26);
        assert_eq!(updated.get_str("name").unwrap(), "Bob");

        let before = driver
            .find_one_and_update(
                "people",
                doc! { "name": "Bob" },
                doc! { "$inc": { "age": 1 }, "$unset": { "tags": "" } },
                UpdateOptions {
                    return_new: false,
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(before.get_i32("age").unwrap(), 26);
        let after = driver
            .find_one("people", doc! { "name": "Bob" }, None, ReadOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.get_i32("age").unwrap(), 27);
        assert!(!after.contains_key("tags"));
    }

    #[tokio::test]
    async fn test_inc_widens_on_int32_overflow() {
        let driver = InMemoryDriver::new();
        driver
            .insert("counters", doc! { "_id": 1, "n": i32::MAX, "big": i64::MAX })
            .await
            .unwrap();

        let widened = driver
            .find_one_and_update(
                "counters",
                doc! { "_id": 1 },
                doc! { "$inc": { "n": 1 } },
                UpdateOptions::default(),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(widened.get("n"), Some(&Bson::Int64(i32::MAX as i64 + 1)));

        let err = driver
            .find_one_and_update(
                "counters",
                doc! { "_id": 1 },
                doc! { "$inc": { "big": 1 } },
                UpdateOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DocwrightError::Database(_)));
        assert_eq!(
            driver.documents("counters")[0].get("big"),
            Some(&Bson::Int64(i64::MAX))
        );
    }

    #[tokio::test]
    async fn test_unsupported_query_operator_is_rejected() {
        let driver = seeded().await;
        for filter in [
            doc! { "name": { "$regex": "^A" } },
            doc! { "tags": { "$size": 1 } },
            doc! { "$where": "true" },
            doc! { "$or": [{ "name": { "$elemMatch": {} } }] },
        ] {
            let err = driver
                .find("people", filter, None, ReadOptions::default())
                .await
                .unwrap_err();
            assert!(matches!(err, DocwrightError::Database(ref m) if m.contains("Unsupported")));
        }

        let err = driver
            .delete_many("people", doc! { "name": { "$regex": "^A" } })
            .await
            .unwrap_err();
        assert!(matches!(err, DocwrightError::Database(_)));
        assert_eq!(driver.documents("people").len(), 3);
    }

    #[tokio::test]
    async fn test_upsert_creates_from_filter() {
        let driver = InMemoryDriver::new();
        let missing = driver
            .find_one_and_update(
                "people",
                doc! { "name": "Dee" },
                doc! { "age": 50 },
                UpdateOptions::default(),
            )
            .await
            .unwrap();
        assert!(missing.is_none());

        let created = driver
            .find_one_and_update(
                "people",
                doc! { "name": "Dee" },
                doc! { "age": 50 },
                UpdateOptions {
                    upsert: true,
                    return_new: true,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(created.get_str("name").unwrap(), "Dee");
        assert_eq!(created.get_i32("age").unwrap(), 50);
        assert!(created.contains_key("_id"));
    }

    #[tokio::test]
    async fn test_delete_one_and_many() {
        let driver = seeded().await;
        let one = driver
            .delete_one("people", doc! { "tags": "a" })
            .await
            .unwrap();
        assert_eq!(one.deleted_count, 1);
        let many = driver
            .delete_many("people", doc! { "tags": "a" })
            .await
            .unwrap();
        assert_eq!(many.deleted_count, 2);
        let nothing = driver.delete_many("ghosts", doc! {}).await.unwrap();
        assert_eq!(nothing.deleted_count, 0);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let driver = InMemoryDriver::new();
        driver.fail_connections(true);
        assert!(driver.connect().await.is_err());
        driver.fail_connections(false);
        driver.connect().await.unwrap();
        assert_eq!(driver.connect_count(), 1);

        driver.fail_next_operation(DocwrightError::Timeout("slow".to_string()));
        let err = driver.insert("people", doc! {}).await.unwrap_err();
        assert!(matches!(err, DocwrightError::Timeout(_)));
        driver.insert("people", doc! {}).await.unwrap();
    }
}
