/// In-memory repository
///
/// Stores users, events and the signup relation behind a single
/// `tokio::sync::RwLock`. Every mutation takes the write lock for its whole
/// check-and-insert, which gives the same uniqueness guarantees as the
/// database constraints: one username per user, one membership per
/// `(event, user)` pair.
///
/// Intended for tests and local demos; nothing is persisted.

use super::{
    EventRepository, RepositoryError, RepositoryResult, StorageHealth, UserRepository,
};
use crate::models::{CreateEvent, CreateUser, Event, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Store {
    users: HashMap<Uuid, User>,
    events: BTreeMap<i64, Event>,
    /// Signup rows in insertion order
    signups: Vec<(i64, Uuid)>,
    signup_index: HashSet<(i64, Uuid)>,
    next_event_id: i64,
}

impl Store {
    fn sorted_events<'a>(events: impl Iterator<Item = &'a Event>) -> Vec<Event> {
        let mut events: Vec<Event> = events.cloned().collect();
        events.sort_by(|a, b| a.meeting_time.cmp(&b.meeting_time).then(a.id.cmp(&b.id)));
        events
    }
}

/// Repository held entirely in process memory
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    store: RwLock<Store>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn create_user(&self, data: CreateUser) -> RepositoryResult<User> {
        let mut store = self.store.write().await;

        if store.users.values().any(|u| u.username == data.username) {
            return Err(RepositoryError::Conflict(
                "Username already exists".to_string(),
            ));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            is_admin: data.is_admin,
            created_at: Utc::now(),
        };
        store.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        Ok(self.store.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.values().find(|u| u.username == username).cloned())
    }

    async fn list_users(&self) -> RepositoryResult<Vec<User>> {
        let store = self.store.read().await;
        let mut users: Vec<User> = store.users.values().cloned().collect();
        users.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.username.cmp(&b.username))
        });
        Ok(users)
    }

    async fn count_users(&self) -> RepositoryResult<i64> {
        Ok(self.store.read().await.users.len() as i64)
    }
}

#[async_trait]
impl EventRepository for InMemoryRepository {
    async fn create_event(&self, data: CreateEvent) -> RepositoryResult<Event> {
        let mut store = self.store.write().await;
        store.next_event_id += 1;

        let event = Event {
            id: store.next_event_id,
            name: data.name,
            meeting_time: data.meeting_time,
            created_at: Utc::now(),
        };
        store.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn find_event_by_id(&self, id: i64) -> RepositoryResult<Option<Event>> {
        Ok(self.store.read().await.events.get(&id).cloned())
    }

    async fn list_events_after(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<Event>> {
        let store = self.store.read().await;
        Ok(Store::sorted_events(
            store.events.values().filter(|e| e.meeting_time > now),
        ))
    }

    async fn list_events_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepositoryResult<Vec<Event>> {
        let store = self.store.read().await;
        Ok(Store::sorted_events(
            store
                .events
                .values()
                .filter(|e| e.meeting_time >= from && e.meeting_time < to),
        ))
    }

    async fn add_signup(&self, event_id: i64, user_id: Uuid) -> RepositoryResult<bool> {
        let mut store = self.store.write().await;

        if !store.events.contains_key(&event_id) {
            return Err(RepositoryError::MissingReference(format!(
                "event {}",
                event_id
            )));
        }
        if !store.users.contains_key(&user_id) {
            return Err(RepositoryError::MissingReference(format!(
                "user {}",
                user_id
            )));
        }

        if !store.signup_index.insert((event_id, user_id)) {
            return Ok(false);
        }
        store.signups.push((event_id, user_id));
        Ok(true)
    }

    async fn is_signed_up(&self, event_id: i64, user_id: Uuid) -> RepositoryResult<bool> {
        Ok(self
            .store
            .read()
            .await
            .signup_index
            .contains(&(event_id, user_id)))
    }

    async fn list_events_for_user(&self, user_id: Uuid) -> RepositoryResult<Vec<Event>> {
        let store = self.store.read().await;
        Ok(Store::sorted_events(
            store
                .signups
                .iter()
                .filter(|(_, uid)| *uid == user_id)
                .filter_map(|(event_id, _)| store.events.get(event_id)),
        ))
    }

    async fn list_signed_up_users(&self, event_id: i64) -> RepositoryResult<Vec<User>> {
        let store = self.store.read().await;
        Ok(store
            .signups
            .iter()
            .filter(|(eid, _)| *eid == event_id)
            .filter_map(|(_, user_id)| store.users.get(user_id).cloned())
            .collect())
    }

    async fn count_signups(&self, event_id: i64) -> RepositoryResult<i64> {
        let store = self.store.read().await;
        Ok(store
            .signups
            .iter()
            .filter(|(eid, _)| *eid == event_id)
            .count() as i64)
    }
}

#[async_trait]
impl StorageHealth for InMemoryRepository {
    async fn ping(&self) -> RepositoryResult<()> {
        Ok(())
    }
}
