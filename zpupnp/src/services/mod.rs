//! # Services UPnP
//!
//! Un [`ServiceDefinition`] décrit un type de service : chemin HTTP, URN,
//! table des variables et table des actions. Un [`ServiceInstance`] en est
//! l'instance vivante : store de variables, abonnements, et routes axum
//! (`/{path}/Control`, `/{path}/Event`, SCPD).
//!
//! Toute étape synchrone (une action, ou une closure passée à
//! [`ServiceInstance::update`]) se termine par un unique envoi d'évènement
//! si au moins une variable évènementielle a été écrite.

mod errors;
mod handlers;
mod instance;
mod scpd;

use std::sync::Arc;

pub use errors::ServiceError;
pub use instance::{ControlResponse, ServiceInstance};

use crate::actions::{Action, ActionTable};
use crate::state_variables::VariableRegistry;

/// Type de service : schéma statique et table de dispatch
#[derive(Debug, Clone)]
pub struct ServiceDefinition {
    name: String,
    path: String,
    service_type: String,
    service_id: String,
    registry: Arc<VariableRegistry>,
    actions: ActionTable,
}

impl ServiceDefinition {
    /// Service `urn:schemas-upnp-org:service:{name}:1` servi sous `/{name}`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: name.clone(),
            service_type: format!("urn:schemas-upnp-org:service:{}:1", name),
            service_id: format!("urn:upnp-org:serviceId:{}", name),
            registry: Arc::new(VariableRegistry::new()),
            actions: ActionTable::new(),
            name,
        }
    }

    /// Chemin de base, sans `/` initial (ex: "MediaRenderer/AVTransport").
    pub fn path(mut self, path: &str) -> Self {
        self.path = path.trim_matches('/').to_string();
        self
    }

    pub fn service_type(mut self, urn: impl Into<String>) -> Self {
        self.service_type = urn.into();
        self
    }

    pub fn service_id(mut self, id: impl Into<String>) -> Self {
        self.service_id = id.into();
        self
    }

    pub fn variables(mut self, registry: VariableRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.actions.insert(action);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_path(&self) -> &str {
        &self.path
    }

    pub fn urn(&self) -> &str {
        &self.service_type
    }

    pub fn id(&self) -> &str {
        &self.service_id
    }

    pub fn registry(&self) -> &Arc<VariableRegistry> {
        &self.registry
    }

    pub fn actions(&self) -> &ActionTable {
        &self.actions
    }

    pub fn control_url(&self) -> String {
        format!("/{}/Control", self.path)
    }

    pub fn event_url(&self) -> String {
        format!("/{}/Event", self.path)
    }

    pub fn scpd_url(&self) -> String {
        format!("/xml/{}1.xml", self.name)
    }
}
