//! State change notifications for the Yandex skill callback

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, instrument, trace, warn};
use ysh_core::State;
use ysh_state_store::{StateChange, StateStore};

use crate::config::Config;
use crate::entity::YandexEntity;
use crate::schema::DeviceState;

/// Callback request body: `{ts, payload: {user_id, devices}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackPayload {
    /// Unix time in seconds
    pub ts: f64,

    pub payload: CallbackBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackBody {
    pub user_id: String,

    pub devices: Vec<DeviceState>,
}

/// Builds callback payloads from state changes
pub struct Notifier {
    config: Arc<Config>,
    states: Arc<StateStore>,
}

impl Notifier {
    pub fn new(config: Arc<Config>, states: Arc<StateStore>) -> Self {
        Self { config, states }
    }

    /// Exposed entities affected by a change of `entity_id`, keyed by id
    fn affected(&self, entity_id: &str, new_state: &State) -> BTreeMap<String, YandexEntity> {
        let mut affected = BTreeMap::new();

        let changed = YandexEntity::new(
            Arc::clone(&self.config),
            new_state.clone(),
            &*self.states,
        );
        if changed.should_expose() {
            affected.insert(entity_id.to_string(), changed);
        }

        for bound_id in self.config.entities_bound_to(entity_id) {
            if affected.contains_key(bound_id) {
                continue;
            }
            let Some(state) = self.states.get(bound_id) else {
                trace!(entity_id = bound_id, "Bound entity has no state");
                continue;
            };

            let entity = YandexEntity::new(Arc::clone(&self.config), state, &*self.states);
            if entity.should_expose() {
                affected.insert(bound_id.to_string(), entity);
            }
        }

        affected
    }

    /// Payload for one change; `None` when there is nothing to report
    #[instrument(skip_all, fields(entity_id = %change.entity_id))]
    pub fn build(&self, change: &StateChange) -> Option<CallbackPayload> {
        let notifier = self.config.notifier()?;
        let new_state = change.new_state.as_ref()?;
        if change.old_state.as_ref() == Some(new_state) {
            trace!("State did not change");
            return None;
        }

        let entity_id = change.entity_id.to_string();
        let devices: Vec<DeviceState> = self
            .affected(&entity_id, new_state)
            .values()
            .map(|entity| entity.notification_serialize(&entity_id))
            .filter(|device| !device.is_empty())
            .collect();

        if devices.is_empty() {
            return None;
        }

        debug!(devices = devices.len(), "Built state notification");
        Some(CallbackPayload {
            ts: Utc::now().timestamp_millis() as f64 / 1000.0,
            payload: CallbackBody {
                user_id: notifier.user_id.clone(),
                devices,
            },
        })
    }

    /// Forward payloads for every received change until either side closes
    pub async fn run(
        &self,
        mut changes: broadcast::Receiver<StateChange>,
        payloads: mpsc::Sender<CallbackPayload>,
    ) {
        info!("Notifier started");
        loop {
            match changes.recv().await {
                Ok(change) => {
                    let Some(payload) = self.build(&change) else {
                        continue;
                    };
                    if payloads.send(payload).await.is_err() {
                        debug!("Payload receiver closed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Notifier lagged behind state changes");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        info!("Notifier stopped");
    }
}
