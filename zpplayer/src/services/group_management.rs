//! GroupManagement : le lecteur est toujours son propre coordinateur.

use zpupnp::services::ServiceDefinition;
use zpupnp::state_variables::VariableRegistry;

use crate::identity::ZoneIdentity;

pub fn definition(identity: &ZoneIdentity) -> ServiceDefinition {
    ServiceDefinition::new("GroupManagement").variables(
        VariableRegistry::new()
            .evented("GroupCoordinatorIsLocal", "1")
            .evented("LocalGroupUUID", format!("{}:0", identity.sonos_id())),
    )
}
