//! AVTransport : état de transport figé sur `STOPPED`

use zpupnp::actions::Action;
use zpupnp::services::ServiceDefinition;
use zpupnp::soap::ResultField;
use zpupnp::state_variables::VariableRegistry;

pub const TRANSPORT_STATE: &str = "TransportState";
pub const TRANSPORT_STATUS: &str = "TransportStatus";
pub const TRANSPORT_PLAY_SPEED: &str = "TransportPlaySpeed";

pub fn definition() -> ServiceDefinition {
    ServiceDefinition::new("AVTransport")
        .path("MediaRenderer/AVTransport")
        .variables(
            VariableRegistry::new()
                .variable(TRANSPORT_STATE, "STOPPED")
                .variable(TRANSPORT_STATUS, "OK")
                .variable(TRANSPORT_PLAY_SPEED, "1"),
        )
        // InstanceID et consorts sont ignorés
        .action(Action::new("GetTransportInfo", |ctx| {
            Ok(vec![
                ResultField::new("CurrentTransportState", ctx.get(TRANSPORT_STATE)?),
                ResultField::new("CurrentTransportStatus", ctx.get(TRANSPORT_STATUS)?),
                ResultField::new("CurrentSpeed", ctx.get(TRANSPORT_PLAY_SPEED)?),
            ])
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use zpupnp::soap::SoapAction;

    #[test]
    fn test_get_transport_info() {
        let def = definition();
        assert_eq!(def.control_url(), "/MediaRenderer/AVTransport/Control");
        assert!(!def.registry().has_evented());

        let mut store = Arc::clone(def.registry()).instantiate();
        let request = SoapAction {
            name: "GetTransportInfo".into(),
            namespace: None,
            args: Vec::new(),
        };
        let (name, fields) = def.actions().dispatch(&request, &mut store).unwrap();
        assert_eq!(name, "GetTransportInfo");

        let values: Vec<_> = fields.iter().map(|f| f.value.as_str()).collect();
        assert_eq!(values, vec!["STOPPED", "OK", "1"]);
    }
}
