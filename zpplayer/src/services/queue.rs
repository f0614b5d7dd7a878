//! Queue : service sans variable ni action, présent pour les contrôleurs
//! qui l'attendent dans la description.

use zpupnp::services::ServiceDefinition;

pub fn definition() -> ServiceDefinition {
    ServiceDefinition::new("Queue")
        .path("MediaRenderer/Queue")
        .service_type("urn:schemas-sonos-com:service:Queue:1")
        .service_id("urn:sonos-com:serviceId:Queue")
}
