//! Extension UPnP pour `zpserver::Server`.
//!
//! Le serveur reste agnostique d'UPnP ; le trait [`UpnpServer`] y ajoute
//! l'enregistrement d'un device (description + routes des services).

use std::sync::Arc;

use tracing::info;
use zpserver::Server;

use crate::devices::{DESCRIPTION_PATH, Device, DeviceError};

pub trait UpnpServer {
    /// Monte la description du device et les routes de tous ses services.
    async fn register_device(&mut self, device: Arc<Device>) -> Result<(), DeviceError>;
}

impl UpnpServer for Server {
    async fn register_device(&mut self, device: Arc<Device>) -> Result<(), DeviceError> {
        device.validate()?;
        self.add_router("/", device.router()).await;

        let info = self.info();
        info!(
            "✅ Device {} described at http://{}:{}{}",
            device.udn(),
            info.base_url,
            info.http_port,
            DESCRIPTION_PATH
        );
        for service in device.all_services() {
            info!(
                "✅ Service {} at {}",
                service.name(),
                service.definition().control_url()
            );
        }
        Ok(())
    }
}
