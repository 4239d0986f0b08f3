//! Domain models for shop users and stored events.

use chrono::{DateTime, Utc};
use serde::Serialize;

use shoplog_core::{Email, EventId, EventRecordId, ShopDomain, SubjectId};

/// A merchant account, keyed by its shop domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShopUser {
    pub shop: ShopDomain,
    pub email: Option<Email>,
    /// Set once the first full backfill has completed.
    pub initial_migration: bool,
    pub created_at: DateTime<Utc>,
}

/// An event persisted in the local store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredEvent {
    pub id: EventRecordId,
    pub event_id: EventId,
    pub shop: ShopDomain,
    pub created_at: DateTime<Utc>,
    pub verb: String,
    pub subject_type: String,
    pub subject_id: SubjectId,
    pub path: String,
    pub message: String,
    pub description: String,
    pub author: String,
    /// The remote `arguments` value serialized as JSON text.
    pub arguments: String,
    pub body: String,
}

/// An event about to be inserted. The local key is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub event_id: EventId,
    pub shop: ShopDomain,
    pub created_at: DateTime<Utc>,
    pub verb: String,
    pub subject_type: String,
    pub subject_id: SubjectId,
    pub path: String,
    pub message: String,
    pub description: String,
    pub author: String,
    pub arguments: String,
    pub body: String,
}

impl NewEvent {
    /// Attach a local key, producing the stored form.
    #[must_use]
    pub fn into_stored(self, id: EventRecordId) -> StoredEvent {
        StoredEvent {
            id,
            event_id: self.event_id,
            shop: self.shop,
            created_at: self.created_at,
            verb: self.verb,
            subject_type: self.subject_type,
            subject_id: self.subject_id,
            path: self.path,
            message: self.message,
            description: self.description,
            author: self.author,
            arguments: self.arguments,
            body: self.body,
        }
    }
}
