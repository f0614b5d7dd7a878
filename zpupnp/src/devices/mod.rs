//! # Devices UPnP
//!
//! Un [`Device`] regroupe des services et des devices embarqués. Il produit
//! la description XML (`urn:schemas-upnp-org:device-1-0`) et le router axum
//! complet : description + routes de chaque service.

mod errors;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tokio::task::JoinHandle;
use tracing::{debug, error};
use xmltree::{Element, EmitterConfig, XMLNode};

pub use errors::DeviceError;

use crate::services::ServiceInstance;
use crate::xml_utils::text_element;

/// Route de la description du device racine
pub const DESCRIPTION_PATH: &str = "/xml/device_description.xml";

#[derive(Debug, Clone)]
pub struct Device {
    device_type: String,
    udn: String,
    fields: Vec<(String, String)>,
    services: Vec<Arc<ServiceInstance>>,
    embedded: Vec<Device>,
}

impl Device {
    /// * `device_type` - ex: "urn:schemas-upnp-org:device:ZonePlayer:1"
    /// * `udn` - identifiant sans le préfixe `uuid:`
    pub fn new(device_type: impl Into<String>, udn: impl Into<String>) -> Self {
        Self {
            device_type: device_type.into(),
            udn: udn.into(),
            fields: Vec::new(),
            services: Vec::new(),
            embedded: Vec::new(),
        }
    }

    /// Champ descriptif (`friendlyName`, `modelNumber`...), émis dans l'ordre
    /// d'ajout après `deviceType`.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn service(mut self, service: Arc<ServiceInstance>) -> Self {
        self.services.push(service);
        self
    }

    pub fn embed(mut self, device: Device) -> Self {
        self.embedded.push(device);
        self
    }

    pub fn device_type(&self) -> &str {
        &self.device_type
    }

    pub fn udn(&self) -> &str {
        &self.udn
    }

    pub fn services(&self) -> &[Arc<ServiceInstance>] {
        &self.services
    }

    pub fn embedded(&self) -> &[Device] {
        &self.embedded
    }

    /// Services du device et de ses devices embarqués
    pub fn all_services(&self) -> Vec<Arc<ServiceInstance>> {
        let mut all = self.services.clone();
        for device in &self.embedded {
            all.extend(device.all_services());
        }
        all
    }

    pub fn find_service(&self, name: &str) -> Option<Arc<ServiceInstance>> {
        self.all_services().into_iter().find(|s| s.name() == name)
    }

    /// Chaque chemin de service ne doit apparaître qu'une fois.
    pub fn validate(&self) -> Result<(), DeviceError> {
        let mut seen = HashSet::new();
        for service in self.all_services() {
            let path = service.definition().base_path().to_string();
            if !seen.insert(path.clone()) {
                return Err(DeviceError::DuplicateService(path));
            }
        }
        Ok(())
    }

    /// Élément `<device>`
    pub fn to_xml_element(&self) -> Element {
        let mut elem = Element::new("device");
        elem.children
            .push(XMLNode::Element(text_element("deviceType", &self.device_type)));
        for (name, value) in &self.fields {
            elem.children
                .push(XMLNode::Element(text_element(name, value)));
        }
        elem.children.push(XMLNode::Element(text_element(
            "UDN",
            &format!("uuid:{}", self.udn),
        )));

        if !self.services.is_empty() {
            let mut list = Element::new("serviceList");
            for service in &self.services {
                let def = service.definition();
                let mut entry = Element::new("service");
                entry
                    .children
                    .push(XMLNode::Element(text_element("serviceType", def.urn())));
                entry
                    .children
                    .push(XMLNode::Element(text_element("serviceId", def.id())));
                entry.children.push(XMLNode::Element(text_element(
                    "controlURL",
                    &def.control_url(),
                )));
                entry.children.push(XMLNode::Element(text_element(
                    "eventSubURL",
                    &def.event_url(),
                )));
                entry
                    .children
                    .push(XMLNode::Element(text_element("SCPDURL", &def.scpd_url())));
                list.children.push(XMLNode::Element(entry));
            }
            elem.children.push(XMLNode::Element(list));
        }

        if !self.embedded.is_empty() {
            let mut list = Element::new("deviceList");
            for device in &self.embedded {
                list.children
                    .push(XMLNode::Element(device.to_xml_element()));
            }
            elem.children.push(XMLNode::Element(list));
        }

        elem
    }

    pub fn description_element(&self) -> Element {
        let mut root = Element::new("root");
        root.attributes.insert(
            "xmlns".to_string(),
            "urn:schemas-upnp-org:device-1-0".to_string(),
        );

        let mut spec = Element::new("specVersion");
        spec.children
            .push(XMLNode::Element(text_element("major", "1")));
        spec.children
            .push(XMLNode::Element(text_element("minor", "0")));
        root.children.push(XMLNode::Element(spec));

        root.children
            .push(XMLNode::Element(self.to_xml_element()));
        root
    }

    pub fn description_xml(&self) -> Result<String, DeviceError> {
        let config = EmitterConfig::new()
            .write_document_declaration(true)
            .perform_indent(true)
            .indent_string("  ");

        let mut buf = Vec::new();
        self.description_element()
            .write_with_config(&mut buf, config)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Router complet : description et routes de tous les services.
    pub fn router(self: &Arc<Self>) -> Router {
        let mut router = Router::new()
            .route(DESCRIPTION_PATH, get(description_handler))
            .with_state(self.clone());

        for service in self.all_services() {
            router = router.merge(service.router());
        }
        router
    }

    /// Purge périodique des abonnements expirés de tous les services.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let services = self.all_services();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed: usize = services.iter().map(|s| s.sweep_expired()).sum();
                if removed > 0 {
                    debug!("♻️ {} expired subscription(s) removed", removed);
                }
            }
        })
    }
}

async fn description_handler(State(device): State<Arc<Device>>) -> Response {
    match device.description_xml() {
        Ok(xml) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, r#"text/xml; charset="utf-8""#)],
            xml,
        )
            .into_response(),
        Err(e) => {
            error!("❌ Failed to serialize device description: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
