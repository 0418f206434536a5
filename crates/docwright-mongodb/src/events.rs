//! Document lifecycle events

use bson::Document as BsonDocument;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Event emitted by a [`DocumentHandle`](crate::DocumentHandle) after a
/// successful mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentEvent {
    OnCreate,
    OnUpdate,
    OnDelete,
}

impl DocumentEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentEvent::OnCreate => "OnCreate",
            DocumentEvent::OnUpdate => "OnUpdate",
            DocumentEvent::OnDelete => "OnDelete",
        }
    }
}

impl fmt::Display for DocumentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listener callback; receives the record as persisted
pub type Listener = Arc<dyn Fn(&BsonDocument) + Send + Sync>;

/// Subscribe/emit capability
pub trait EventSource {
    fn subscribe(&mut self, event: DocumentEvent, listener: Listener);

    fn emit(&self, event: DocumentEvent, document: &BsonDocument);
}

/// Per-instance listener table.
///
/// Listeners run synchronously, in registration order.
#[derive(Default, Clone)]
pub struct Listeners {
    listeners: HashMap<DocumentEvent, Vec<Listener>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self, event: DocumentEvent) -> usize {
        self.listeners.get(&event).map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.values().all(Vec::is_empty)
    }
}

impl EventSource for Listeners {
    fn subscribe(&mut self, event: DocumentEvent, listener: Listener) {
        self.listeners.entry(event).or_default().push(listener);
    }

    fn emit(&self, event: DocumentEvent, document: &BsonDocument) {
        if let Some(listeners) = self.listeners.get(&event) {
            for listener in listeners {
                listener(document);
            }
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("on_create", &self.len(DocumentEvent::OnCreate))
            .field("on_update", &self.len(DocumentEvent::OnUpdate))
            .field("on_delete", &self.len(DocumentEvent::OnDelete))
            .finish()
    }
}
