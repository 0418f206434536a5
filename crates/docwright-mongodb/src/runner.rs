//! Operation runner: before-hook → delegated call → after-hook.

use bson::{doc, Bson, Document as BsonDocument};
use docwright_common::{DocwrightError, Result};
use std::future::Future;
use tracing::{debug, Instrument};

use crate::driver::DeleteOutcome;
use crate::hooks::{HookPair, HookPayload, HookRegistry};

/// A result that can be shown to after-hooks and taken back from them
pub trait HookValue: Sized {
    fn into_bson(self) -> Bson;

    fn from_bson(value: Bson) -> Result<Self>;
}

fn mismatch(expected: &str, got: &Bson) -> DocwrightError {
    DocwrightError::Hook(format!(
        "after-hook replaced the result with {:?}, expected {}",
        got.element_type(),
        expected
    ))
}

impl HookValue for BsonDocument {
    fn into_bson(self) -> Bson {
        Bson::Document(self)
    }

    fn from_bson(value: Bson) -> Result<Self> {
        match value {
            Bson::Document(doc) => Ok(doc),
            other => Err(mismatch("a document", &other)),
        }
    }
}

impl HookValue for Option<BsonDocument> {
    fn into_bson(self) -> Bson {
        self.map(Bson::Document).unwrap_or(Bson::Null)
    }

    fn from_bson(value: Bson) -> Result<Self> {
        match value {
            Bson::Null => Ok(None),
            Bson::Document(doc) => Ok(Some(doc)),
            other => Err(mismatch("a document or null", &other)),
        }
    }
}

impl HookValue for Vec<BsonDocument> {
    fn into_bson(self) -> Bson {
        Bson::Array(self.into_iter().map(Bson::Document).collect())
    }

    fn from_bson(value: Bson) -> Result<Self> {
        match value {
            Bson::Array(items) => items.into_iter().map(BsonDocument::from_bson).collect(),
            other => Err(mismatch("an array of documents", &other)),
        }
    }
}

impl HookValue for DeleteOutcome {
    fn into_bson(self) -> Bson {
        Bson::Document(doc! { "deletedCount": self.deleted_count as i64 })
    }

    fn from_bson(value: Bson) -> Result<Self> {
        let count = match &value {
            Bson::Document(d) => match d.get("deletedCount") {
                Some(Bson::Int64(n)) => u64::try_from(*n).ok(),
                Some(Bson::Int32(n)) => u64::try_from(*n).ok(),
                _ => None,
            },
            _ => None,
        };
        count
            .map(|deleted_count| DeleteOutcome { deleted_count })
            .ok_or_else(|| mismatch("{ deletedCount: <int> }", &value))
    }
}

/// Take the argument at `index` as a document
pub(crate) fn document_arg(args: &mut [Bson], index: usize) -> Result<BsonDocument> {
    match args.get_mut(index).map(|b| std::mem::replace(b, Bson::Null)) {
        Some(Bson::Document(doc)) => Ok(doc),
        Some(other) => Err(DocwrightError::Hook(format!(
            "before-hook replaced argument {} with {:?}, expected a document",
            index,
            other.element_type()
        ))),
        None => Err(DocwrightError::Hook(format!(
            "before-hook removed argument {}",
            index
        ))),
    }
}

/// Like [`document_arg`], mapping `null` to `None`
pub(crate) fn optional_document_arg(
    args: &mut [Bson],
    index: usize,
) -> Result<Option<BsonDocument>> {
    match args.get(index) {
        None | Some(Bson::Null) => Ok(None),
        Some(_) => document_arg(args, index).map(Some),
    }
}

/// Run one operation wrapped by its hook pair.
///
/// 1. `pair.before` runs with `args`;
/// 2. `op` runs with the arguments as the before-hooks left them;
/// 3. `pair.after` runs with the result as its only value;
/// 4. the result, as the after-hooks left it, is returned.
///
/// Any failure aborts the remaining steps and is tagged with `operation`.
/// A failing after-hook does not undo a mutation the driver already made.
pub async fn run_operation<T, F, Fut>(
    operation: &'static str,
    hooks: &HookRegistry,
    pair: HookPair,
    collection: &str,
    args: Vec<Bson>,
    op: F,
) -> Result<T>
where
    T: HookValue,
    F: FnOnce(Vec<Bson>) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let span = tracing::debug_span!("operation", operation, collection);
    async move {
        let mut before = HookPayload::new(pair.before, collection, args);
        hooks.run(pair.before, &mut before).await?;

        let result = op(before.into_values()).await?;
        debug!("Delegated call completed");

        let mut after = HookPayload::new(pair.after, collection, vec![result.into_bson()]);
        hooks.run(pair.after, &mut after).await?;

        let value = after.into_values().into_iter().next().unwrap_or(Bson::Null);
        T::from_bson(value)
    }
    .instrument(span)
    .await
    .map_err(|e| e.tag(operation))
}
