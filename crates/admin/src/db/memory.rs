//! In-memory implementation of [`EventStore`].
//!
//! Mirrors the `PostgreSQL` semantics (unique `event_id`, shop scoping,
//! newest-first ordering with the local key as tie breaker) so that tests
//! and local demos behave like production.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use shoplog_core::{Email, EventId, EventRecordId, PageRequest, ShopDomain};

use super::{EventStore, RepositoryError};
use crate::models::{NewEvent, ShopUser, StoredEvent};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<ShopDomain, ShopUser>,
    events: Vec<StoredEvent>,
    next_id: i32,
}

/// Event store held in process memory.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    tables: RwLock<Tables>,
}

impl MemoryEventStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of events across all shops.
    pub async fn len(&self) -> usize {
        self.tables.read().await.events.len()
    }

    /// Whether no events are stored.
    pub async fn is_empty(&self) -> bool {
        self.tables.read().await.events.is_empty()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn find_user(&self, shop: &ShopDomain) -> Result<Option<ShopUser>, RepositoryError> {
        Ok(self.tables.read().await.users.get(shop).cloned())
    }

    async fn create_user(
        &self,
        shop: &ShopDomain,
        email: Option<&Email>,
    ) -> Result<ShopUser, RepositoryError> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .entry(shop.clone())
            .or_insert_with(|| ShopUser {
                shop: shop.clone(),
                email: email.cloned(),
                initial_migration: false,
                created_at: Utc::now(),
            });
        Ok(user.clone())
    }

    async fn mark_initial_migration(&self, shop: &ShopDomain) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(shop)
            .ok_or(RepositoryError::NotFound)?;
        user.initial_migration = true;
        Ok(())
    }

    async fn latest_event_created_at(
        &self,
        shop: &ShopDomain,
    ) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .events
            .iter()
            .filter(|e| &e.shop == shop)
            .map(|e| e.created_at)
            .max())
    }

    async fn event_exists(&self, event_id: EventId) -> Result<bool, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.events.iter().any(|e| e.event_id == event_id))
    }

    async fn insert_event(&self, event: &NewEvent) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.events.iter().any(|e| e.event_id == event.event_id) {
            return Ok(false);
        }

        tables.next_id = tables
            .next_id
            .checked_add(1)
            .ok_or_else(|| RepositoryError::Conflict("event id space exhausted".to_string()))?;
        let id = EventRecordId::new(tables.next_id);
        tables.events.push(event.clone().into_stored(id));
        Ok(true)
    }

    async fn list_events(
        &self,
        shop: &ShopDomain,
        request: PageRequest,
    ) -> Result<Vec<StoredEvent>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut events: Vec<&StoredEvent> =
            tables.events.iter().filter(|e| &e.shop == shop).collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(request.limit()).unwrap_or(usize::MAX);
        Ok(events
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_events(&self, shop: &ShopDomain) -> Result<u64, RepositoryError> {
        let tables = self.tables.read().await;
        let count = tables.events.iter().filter(|e| &e.shop == shop).count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn get_event(
        &self,
        shop: &ShopDomain,
        id: EventRecordId,
    ) -> Result<Option<StoredEvent>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .events
            .iter()
            .find(|e| e.id == id && &e.shop == shop)
            .cloned())
    }

    async fn find_by_event_id(
        &self,
        shop: &ShopDomain,
        event_id: EventId,
    ) -> Result<Option<StoredEvent>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .events
            .iter()
            .find(|e| e.event_id == event_id && &e.shop == shop)
            .cloned())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};
    use shoplog_core::SubjectId;

    use super::*;

    fn shop(name: &str) -> ShopDomain {
        ShopDomain::parse(name).unwrap()
    }

    fn event(shop: &ShopDomain, remote_id: i64, minutes: i64) -> NewEvent {
        NewEvent {
            event_id: EventId::new(remote_id),
            shop: shop.clone(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
                + Duration::minutes(minutes),
            verb: "create".to_string(),
            subject_type: "Product".to_string(),
            subject_id: SubjectId::new(1),
            path: String::new(),
            message: String::new(),
            description: String::new(),
            author: String::new(),
            arguments: "null".to_string(),
            body: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_user_is_idempotent() {
        let store = MemoryEventStore::new();
        let acme = shop("acme.myshopify.com");
        let email = Email::parse("owner@acme.test").unwrap();

        let first = store.create_user(&acme, Some(&email)).await.unwrap();
        let second = store.create_user(&acme, None).await.unwrap();
        assert_eq!(first, second);
        assert!(!first.initial_migration);

        store.mark_initial_migration(&acme).await.unwrap();
        assert!(store.find_user(&acme).await.unwrap().unwrap().initial_migration);
    }

    #[tokio::test]
    async fn test_mark_unknown_user_fails() {
        let store = MemoryEventStore::new();
        let result = store.mark_initial_migration(&shop("ghost.myshopify.com")).await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_duplicate_event_id_is_skipped() {
        let store = MemoryEventStore::new();
        let acme = shop("acme.myshopify.com");

        assert!(store.insert_event(&event(&acme, 7, 0)).await.unwrap());
        assert!(!store.insert_event(&event(&acme, 7, 5)).await.unwrap());
        assert_eq!(store.len().await, 1);
        assert!(store.event_exists(EventId::new(7)).await.unwrap());
    }

    #[tokio::test]
    async fn test_reads_are_scoped_by_shop() {
        let store = MemoryEventStore::new();
        let acme = shop("acme.myshopify.com");
        let other = shop("other.myshopify.com");
        store.insert_event(&event(&acme, 1, 0)).await.unwrap();
        store.insert_event(&event(&other, 2, 10)).await.unwrap();

        assert_eq!(store.count_events(&acme).await.unwrap(), 1);
        assert_eq!(
            store.latest_event_created_at(&acme).await.unwrap(),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
        assert!(
            store
                .find_by_event_id(&acme, EventId::new(2))
                .await
                .unwrap()
                .is_none()
        );
        let other_events = store.list_events(&other, PageRequest::default()).await.unwrap();
        let other_id = other_events.first().unwrap().id;
        assert!(
            store
                .get_event(&acme, other_id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_list_orders_newest_first_with_id_tiebreak() {
        let store = MemoryEventStore::new();
        let acme = shop("acme.myshopify.com");
        store.insert_event(&event(&acme, 1, 0)).await.unwrap();
        store.insert_event(&event(&acme, 2, 30)).await.unwrap();
        store.insert_event(&event(&acme, 3, 30)).await.unwrap();

        let page = store.list_events(&acme, PageRequest::new(1, 10)).await.unwrap();
        let ids: Vec<i64> = page.iter().map(|e| e.event_id.as_i64()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }
}
