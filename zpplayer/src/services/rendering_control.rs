use zpupnp::services::ServiceDefinition;

pub fn definition() -> ServiceDefinition {
    ServiceDefinition::new("RenderingControl").path("MediaRenderer/RenderingControl")
}
