//! Assemblage du ZonePlayer : device racine, devices embarqués et annonce
//! SSDP.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use tracing::info;
use zpconfig::Config;
use zpupnp::devices::{Device, DeviceError};
use zpupnp::events::HttpEventTransport;
use zpupnp::services::{ServiceDefinition, ServiceInstance};
use zpupnp::ssdp::SsdpAnnouncement;
use zpupnp::subscriptions::SubscriptionManager;

use crate::identity::ZoneIdentity;
use crate::services::{
    audio_in, av_transport, content_directory, device_properties, group_management, queue,
    rendering_control, zone_group_topology,
};
use crate::transport::MediaTransport;

pub const ZONE_PLAYER_TYPE: &str = "urn:schemas-upnp-org:device:ZonePlayer:1";
pub const MEDIA_SERVER_TYPE: &str = "urn:schemas-upnp-org:device:MediaServer:1";
pub const MEDIA_RENDERER_TYPE: &str = "urn:schemas-upnp-org:device:MediaRenderer:1";

const MANUFACTURER: &str = "Sonos, Inc.";
const MANUFACTURER_URL: &str = "http://www.sonos.com";
const MODEL_NUMBER: &str = "S5";
const MODEL_NAME: &str = "Sonos PLAY:5";
const DISPLAY_NAME: &str = "PLAY:5";

pub struct ZonePlayer {
    identity: ZoneIdentity,
    device: Arc<Device>,
    transport: Arc<MediaTransport>,
}

impl ZonePlayer {
    /// Construit les huit services autour d'un gestionnaire d'abonnements
    /// commun.
    pub fn new(
        identity: ZoneIdentity,
        manager: Arc<SubscriptionManager>,
        transport: Arc<MediaTransport>,
    ) -> Result<Self, DeviceError> {
        let instance = |def: ServiceDefinition| ServiceInstance::new(def, Arc::clone(&manager));

        let media_server = Device::new(MEDIA_SERVER_TYPE, format!("{}_MS", identity.sonos_id()))
            .field("friendlyName", format!("{} - {} Media Server", identity.ip, MODEL_NAME))
            .field("manufacturer", MANUFACTURER)
            .field("manufacturerURL", MANUFACTURER_URL)
            .field("modelNumber", MODEL_NUMBER)
            .field("modelName", format!("{} Media Server", MODEL_NAME))
            .service(instance(content_directory::definition(&identity)));

        let media_renderer =
            Device::new(MEDIA_RENDERER_TYPE, format!("{}_MR", identity.sonos_id()))
                .field("friendlyName", format!("{} - {} Media Renderer", identity.ip, MODEL_NAME))
                .field("manufacturer", MANUFACTURER)
                .field("manufacturerURL", MANUFACTURER_URL)
                .field("modelNumber", MODEL_NUMBER)
                .field("modelName", format!("{} Media Renderer", MODEL_NAME))
                .service(instance(rendering_control::definition()))
                .service(instance(av_transport::definition()))
                .service(instance(queue::definition()));

        let root = Device::new(ZONE_PLAYER_TYPE, identity.sonos_id())
            .field("friendlyName", format!("{} - {}", identity.ip, MODEL_NAME))
            .field("manufacturer", MANUFACTURER)
            .field("manufacturerURL", MANUFACTURER_URL)
            .field("modelNumber", MODEL_NUMBER)
            .field("modelDescription", MODEL_NAME)
            .field("modelName", MODEL_NAME)
            .field("softwareVersion", identity.firmware_version.as_str())
            .field("hardwareVersion", device_properties::HARDWARE_VERSION)
            .field("serialNum", format!("{}:3", identity.mac_hyphens()))
            .field("MACAddress", identity.mac.as_str())
            .field(
                "minCompatibleVersion",
                zone_group_topology::MIN_COMPATIBLE_VERSION,
            )
            .field(
                "legacyCompatibleVersion",
                zone_group_topology::LEGACY_COMPATIBLE_VERSION,
            )
            .field("displayVersion", identity.display_version.as_str())
            .field("extraVersion", device_properties::EXTRA_INFO)
            .field("roomName", identity.zone_name.as_str())
            .field("displayName", DISPLAY_NAME)
            .field("zoneType", "5")
            .service(instance(device_properties::definition(&identity)))
            .service(instance(group_management::definition(&identity)))
            .service(instance(zone_group_topology::definition(&identity)?))
            .service(instance(audio_in::definition(
                &identity,
                Arc::clone(&transport),
            )))
            .embed(media_server)
            .embed(media_renderer);

        root.validate()?;

        Ok(Self {
            identity,
            device: Arc::new(root),
            transport,
        })
    }

    /// Lecteur complet d'après la configuration : notifications HTTP,
    /// durées d'abonnement et processus de diffusion configurés.
    pub fn from_config(config: &Config) -> Result<Self> {
        let identity = ZoneIdentity::from_config(config)?;

        let manager = SubscriptionManager::new(
            identity.sonos_id(),
            Arc::new(HttpEventTransport::new()),
        )
        .with_max_timeout(config.get_subscription_timeout())
        .with_notify_timeout(Duration::from_millis(config.get_notify_timeout_ms()));

        let transport = Arc::new(MediaTransport::from_config(config));
        let player = Self::new(identity, Arc::new(manager), transport)?;

        info!(
            "✅ ZonePlayer {} ({}) ready, {} services",
            player.identity.zone_name,
            player.identity.sonos_id(),
            player.device.all_services().len()
        );
        Ok(player)
    }

    pub fn identity(&self) -> &ZoneIdentity {
        &self.identity
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub fn transport(&self) -> &Arc<MediaTransport> {
        &self.transport
    }

    pub fn service(&self, name: &str) -> Option<Arc<ServiceInstance>> {
        self.device.find_service(name)
    }

    /// Description, contrôle, évènements et SCPD de tous les services.
    pub fn router(&self) -> Router {
        self.device.router()
    }

    pub fn ssdp_announcement(&self) -> SsdpAnnouncement {
        SsdpAnnouncement {
            location: self.identity.location(),
            server: self.identity.server_header(),
            uuid: self.identity.sonos_id(),
            nt: ZONE_PLAYER_TYPE.to_string(),
            extra_headers: vec![
                ("X-RINCON-HOUSEHOLD".into(), self.identity.household.clone()),
                ("X-RINCON-BOOTSEQ".into(), zone_group_topology::BOOT_SEQ.into()),
                ("X-RINCON-WIFIMODE".into(), "0".into()),
                ("X-RINCON-VARIANT".into(), "0".into()),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::test_identity;

    fn player() -> ZonePlayer {
        let config = Config::from_yaml_str(
            r#"
host:
  base_url: "10.0.0.22"
device:
  mac: "4C:CC:6A:22:56:86"
  zone_name: "Bathroom"
transport:
  command: "/nonexistent/zp-stream"
"#,
        )
        .unwrap();
        ZonePlayer::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn test_assembles_eight_services() {
        let player = player();
        assert_eq!(player.identity(), &test_identity());

        let mut names: Vec<_> = player
            .device()
            .all_services()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "AVTransport",
                "AudioIn",
                "ContentDirectory",
                "DeviceProperties",
                "GroupManagement",
                "Queue",
                "RenderingControl",
                "ZoneGroupTopology",
            ]
        );

        let queue = player.service("Queue").unwrap();
        assert_eq!(
            queue.definition().urn(),
            "urn:schemas-sonos-com:service:Queue:1"
        );
        assert_eq!(player.device().embedded().len(), 2);
    }

    #[tokio::test]
    async fn test_description_lists_embedded_devices() {
        let xml = player().device().description_xml().unwrap();
        assert!(xml.contains("<UDN>uuid:RINCON_4CCC6A22568601400</UDN>"));
        assert!(xml.contains("<UDN>uuid:RINCON_4CCC6A22568601400_MR</UDN>"));
        assert!(xml.contains("<controlURL>/MediaServer/ContentDirectory/Control</controlURL>"));
        assert!(xml.contains("<roomName>Bathroom</roomName>"));
    }

    #[tokio::test]
    async fn test_ssdp_announcement() {
        let ann = player().ssdp_announcement();
        assert_eq!(
            ann.usn(),
            "uuid:RINCON_4CCC6A22568601400::urn:schemas-upnp-org:device:ZonePlayer:1"
        );
        let alive = ann.alive_message();
        assert!(alive.contains("LOCATION: http://10.0.0.22:1400/xml/device_description.xml\r\n"));
        assert!(alive.contains("X-RINCON-HOUSEHOLD: Sonos_AafT5QbaoptKSoEB7VzvHfC5Uu\r\n"));
        assert!(alive.contains("X-RINCON-BOOTSEQ: 2\r\n"));
    }
}
