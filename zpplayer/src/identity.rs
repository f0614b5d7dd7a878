//! Identité réseau du ZonePlayer émulé

use anyhow::Result;
use zpconfig::Config;

use zpupnp::devices::DESCRIPTION_PATH;

/// Modèle annoncé dans l'en-tête SERVER
const MODEL: &str = "ZPS5";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneIdentity {
    /// Adresse IP annoncée
    pub ip: String,
    pub http_port: u16,
    /// `AA:BB:CC:DD:EE:FF`
    pub mac: String,
    pub zone_name: String,
    pub icon: String,
    pub household: String,
    pub firmware_version: String,
    pub display_version: String,
}

impl ZoneIdentity {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            ip: config.get_base_url(),
            http_port: config.get_http_port(),
            mac: config.get_device_mac()?,
            zone_name: config.get_zone_name(),
            icon: config.get_room_icon(),
            household: config.get_household(),
            firmware_version: config.get_firmware_version(),
            display_version: config.get_display_version(),
        })
    }

    /// `RINCON_` + MAC sans séparateurs + `01400`
    pub fn sonos_id(&self) -> String {
        format!("RINCON_{}01400", self.mac.replace(':', "").to_uppercase())
    }

    pub fn server_header(&self) -> String {
        format!("Linux UPnP/1.0 Sonos/{} ({})", self.firmware_version, MODEL)
    }

    pub fn mac_hyphens(&self) -> String {
        self.mac.replace(':', "-")
    }

    pub fn location(&self) -> String {
        format!("http://{}:{}{}", self.ip, self.http_port, DESCRIPTION_PATH)
    }
}

#[cfg(test)]
pub(crate) fn test_identity() -> ZoneIdentity {
    ZoneIdentity {
        ip: "10.0.0.22".into(),
        http_port: 1400,
        mac: "4C:CC:6A:22:56:86".into(),
        zone_name: "Bathroom".into(),
        icon: "x-rincon-roomicon:bathroom".into(),
        household: "Sonos_AafT5QbaoptKSoEB7VzvHfC5Uu".into(),
        firmware_version: "34.16-37101".into(),
        display_version: "7.1".into(),
    }
}
