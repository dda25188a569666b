//! Request handlers over the whole state store

use std::sync::Arc;

use tracing::{debug, instrument, trace};
use ysh_registries::Registries;
use ysh_state_store::StateStore;

use crate::config::Config;
use crate::entity::YandexEntity;
use crate::schema::{DeviceState, DevicesResponse};

/// Describe every exposed entity, ordered by entity id
///
/// Entities disabled in the registries, directly or through their device,
/// are left out.
#[instrument(skip_all)]
pub fn devices_list(
    config: &Arc<Config>,
    states: &StateStore,
    registries: &Registries,
    user_id: Option<String>,
) -> DevicesResponse {
    let devices: Vec<_> = states
        .all()
        .into_iter()
        .filter(|state| {
            let disabled = registries.is_disabled(&state.entity_id.to_string());
            if disabled {
                trace!(entity_id = %state.entity_id, "Skipping disabled entity");
            }
            !disabled
        })
        .map(|state| YandexEntity::new(Arc::clone(config), state, states))
        .filter(YandexEntity::should_expose)
        .filter_map(|entity| {
            entity.devices_serialize(&registries.entities, &registries.devices, &registries.areas)
        })
        .collect();

    debug!(count = devices.len(), "Listed devices");
    DevicesResponse { user_id, devices }
}

/// Current state of each requested device, in request order
#[instrument(skip(config, states))]
pub fn devices_query(
    config: &Arc<Config>,
    states: &StateStore,
    ids: &[String],
) -> Vec<DeviceState> {
    ids.iter()
        .map(|id| match states.get(id) {
            Some(state) => YandexEntity::new(Arc::clone(config), state, states).query_serialize(),
            None => {
                debug!(entity_id = %id, "Queried device not found");
                DeviceState::not_found(id.as_str())
            }
        })
        .collect()
}
