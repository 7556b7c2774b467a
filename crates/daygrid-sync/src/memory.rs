//! In-memory [`EventStore`] used by tests and demos.

use async_trait::async_trait;
use daygrid_core::{EventRecord, ShareStatus, SharedEventRecord};
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::store::{EventStore, Profile};

#[derive(Default)]
struct State {
    events: Vec<EventRecord>,
    shares: Vec<SharedEventRecord>,
    profiles: HashMap<String, Profile>,
}

/// A store backed by vectors behind a `tokio` mutex. Behaves like the real
/// thing where the service cares: `NotFound` on missing rows and a cascade
/// from event deletion to its share rows.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub async fn seed_event(&self, record: EventRecord) {
        self.state.lock().await.events.push(record);
    }

    pub async fn seed_share(&self, record: SharedEventRecord) {
        self.state.lock().await.shares.push(record);
    }

    pub async fn seed_profile(&self, profile: Profile) {
        let mut state = self.state.lock().await;
        state.profiles.insert(profile.user_id.clone(), profile);
    }

    pub async fn event_by_id(&self, event_id: &str) -> Option<EventRecord> {
        let state = self.state.lock().await;
        state.events.iter().find(|held| held.id == event_id).cloned()
    }

    pub async fn share_record(&self, share_id: &str) -> Option<SharedEventRecord> {
        let state = self.state.lock().await;
        state.shares.iter().find(|held| held.id == share_id).cloned()
    }

    pub async fn event_count(&self) -> usize {
        self.state.lock().await.events.len()
    }

    pub async fn share_count(&self) -> usize {
        self.state.lock().await.shares.len()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn events_for(&self, user_id: &str) -> Result<Vec<EventRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .events
            .iter()
            .filter(|record| record.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect())
    }

    async fn insert_event(&self, record: EventRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.events.retain(|held| held.id != record.id);
        state.events.push(record);
        Ok(())
    }

    async fn update_event(&self, record: EventRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        match state.events.iter_mut().find(|held| held.id == record.id) {
            Some(held) => {
                *held = record;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete_event(&self, event_id: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let before = state.events.len();
        state.events.retain(|held| held.id != event_id);
        if state.events.len() == before {
            return Err(StoreError::NotFound);
        }
        // Cascade: drop every share row referencing the event.
        state
            .shares
            .retain(|held| held.original_event_id.as_deref() != Some(event_id));
        Ok(())
    }

    async fn shares_received(
        &self,
        user_id: &str,
        status: ShareStatus,
    ) -> Result<Vec<SharedEventRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .shares
            .iter()
            .filter(|record| record.shared_with == user_id && record.status == status.as_wire())
            .cloned()
            .collect())
    }

    async fn shares_sent(
        &self,
        user_id: &str,
        status: ShareStatus,
    ) -> Result<Vec<SharedEventRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .shares
            .iter()
            .filter(|record| record.shared_by == user_id && record.status == status.as_wire())
            .cloned()
            .collect())
    }

    async fn share_by_id(&self, share_id: &str) -> Result<SharedEventRecord, StoreError> {
        let state = self.state.lock().await;
        state
            .shares
            .iter()
            .find(|held| held.id == share_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn insert_share(&self, record: SharedEventRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.shares.retain(|held| held.id != record.id);
        state.shares.push(record);
        Ok(())
    }

    async fn update_share(&self, record: SharedEventRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        match state.shares.iter_mut().find(|held| held.id == record.id) {
            Some(held) => {
                *held = record;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete_share(&self, share_id: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let before = state.shares.len();
        state.shares.retain(|held| held.id != share_id);
        if state.shares.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn profile(&self, user_id: &str) -> Result<Profile, StoreError> {
        let state = self.state.lock().await;
        state.profiles.get(user_id).cloned().ok_or(StoreError::NotFound)
    }
}
