//! Current entity states with change broadcasting
//!
//! The StateStore keeps the latest snapshot of every entity and publishes a
//! `StateChange` for every write or removal. It is the `StateProvider` the
//! Yandex adapter reads bound entities from.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, instrument, trace};
use ysh_core::{Attributes, EntityId, State, StateProvider};

/// Capacity of the change channel; slow subscribers see `Lagged`
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// One entity's transition from `old_state` to `new_state`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateChange {
    pub entity_id: EntityId,
    pub old_state: Option<State>,
    pub new_state: Option<State>,
}

pub struct StateStore {
    /// All entity states keyed by entity_id string
    states: DashMap<String, State>,
    changes: broadcast::Sender<StateChange>,
}

impl StateStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            states: DashMap::new(),
            changes,
        }
    }

    /// Receive every change made after this call
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.changes.subscribe()
    }

    /// Set the state of an entity and publish the change
    #[instrument(skip(self, state, attributes), fields(entity_id = %entity_id))]
    pub fn set(
        &self,
        entity_id: EntityId,
        state: impl Into<String>,
        attributes: Attributes,
    ) -> StateChange {
        let key = entity_id.to_string();
        let old_state = self.states.get(&key).map(|s| s.clone());

        let new_state = match &old_state {
            Some(existing) => existing.with_update(state, attributes),
            None => State::new(entity_id.clone(), state, attributes),
        };

        debug!(
            state = %new_state.state,
            changed = old_state.as_ref().map(|s| s.state != new_state.state).unwrap_or(true),
            "Setting entity state"
        );

        self.states.insert(key, new_state.clone());
        self.publish(StateChange {
            entity_id,
            old_state,
            new_state: Some(new_state),
        })
    }

    #[instrument(skip(self), fields(entity_id = %entity_id))]
    pub fn remove(&self, entity_id: &EntityId) -> Option<State> {
        let (_, old_state) = self.states.remove(&entity_id.to_string())?;
        trace!("Removing entity state");

        self.publish(StateChange {
            entity_id: entity_id.clone(),
            old_state: Some(old_state.clone()),
            new_state: None,
        });
        Some(old_state)
    }

    fn publish(&self, change: StateChange) -> StateChange {
        // No subscribers is not an error
        let _ = self.changes.send(change.clone());
        change
    }

    pub fn get(&self, entity_id: &str) -> Option<State> {
        self.states.get(entity_id).map(|s| s.clone())
    }

    /// All states, ordered by entity id
    pub fn all(&self) -> Vec<State> {
        let mut states: Vec<State> = self.states.iter().map(|r| r.value().clone()).collect();
        states.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateProvider for StateStore {
    fn get_state(&self, entity_id: &str) -> Option<State> {
        self.get(entity_id)
    }
}

pub type SharedStateStore = Arc<StateStore>;
