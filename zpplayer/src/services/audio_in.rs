//! # AudioIn
//!
//! Entrée ligne du lecteur. `StartTransmissionToGroup` démarre le
//! processus de diffusion et indique au coordinateur où se brancher ;
//! `StopTransmissionToGroup` l'arrête.

use std::sync::Arc;

use tracing::{error, info};
use zpupnp::actions::{Action, ActionError};
use zpupnp::services::ServiceDefinition;
use zpupnp::soap::ResultField;
use zpupnp::state_variables::VariableRegistry;

use crate::identity::ZoneIdentity;
use crate::transport::MediaTransport;

/// Groupe multicast et ports RTP annoncés au coordinateur
const MULTICAST_ENDPOINT: &str = "225.238.76.46:6982";
const RTP_PORTS: &str = "6980:6981";

pub fn transport_settings(identity: &ZoneIdentity) -> String {
    format!(
        "{},{}:{},{}",
        MULTICAST_ENDPOINT,
        identity.ip,
        RTP_PORTS,
        identity.sonos_id()
    )
}

pub fn definition(identity: &ZoneIdentity, transport: Arc<MediaTransport>) -> ServiceDefinition {
    let settings = transport_settings(identity);
    let stopper = Arc::clone(&transport);

    ServiceDefinition::new("AudioIn")
        .variables(
            VariableRegistry::new()
                .evented("AudioInputName", "SonosCast")
                .evented("Icon", "AudioComponent")
                .evented("LineInConnected", "1")
                .evented("LeftLineInLevel", "1")
                .evented("RightLineInLevel", "1"),
        )
        .action(
            Action::new("StartTransmissionToGroup", move |ctx| {
                let coordinator = ctx.text("CoordinatorID")?;
                info!("🎬 StartTransmissionToGroup from {}", coordinator);

                transport.start().map_err(|e| {
                    error!("❌ {}", e);
                    ActionError::failed(e.to_string())
                })?;
                Ok(vec![ResultField::new(
                    "CurrentTransportSettings",
                    settings.as_str(),
                )])
            })
            .with_arguments(&["CoordinatorID"]),
        )
        .action(
            Action::new("StopTransmissionToGroup", move |ctx| {
                let coordinator = ctx.text("CoordinatorID")?;
                info!("StopTransmissionToGroup from {}", coordinator);

                stopper
                    .stop()
                    .map_err(|e| ActionError::failed(e.to_string()))?;
                Ok(Vec::new())
            })
            .with_arguments(&["CoordinatorID"]),
        )
}
