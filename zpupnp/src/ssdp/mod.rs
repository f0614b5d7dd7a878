//! # Module SSDP - annonces de présence
//!
//! Le ZonePlayer se contente d'annoncer sa présence : un `NOTIFY`
//! `ssdp:alive` multicast à intervalle fixe, et un `ssdp:byebye` à l'arrêt.
//! Les M-SEARCH ne reçoivent pas de réponse.
//!
//! - **Multicast Address**: 239.255.255.250:1900
//! - **TTL multicast**: 4 (UPnP 1.0)
//! - **Max-Age**: 1800 secondes

mod announcer;

pub use announcer::SsdpAnnouncer;

/// Adresse multicast SSDP
pub const SSDP_MULTICAST_ADDR: &str = "239.255.255.250";

/// Port SSDP
pub const SSDP_PORT: u16 = 1900;

/// Durée de validité des annonces (en secondes)
pub const MAX_AGE: u32 = 1800;

/// TTL multicast imposé par UPnP 1.0
pub const MULTICAST_TTL: u32 = 4;

/// Contenu d'une annonce NOTIFY
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsdpAnnouncement {
    /// URL de la description du device
    pub location: String,
    /// Valeur de l'en-tête SERVER
    pub server: String,
    /// Identifiant du device, sans `uuid:`
    pub uuid: String,
    /// Type de notification (ex: "urn:schemas-upnp-org:device:ZonePlayer:1")
    pub nt: String,
    /// En-têtes propriétaires ajoutés à `ssdp:alive`
    pub extra_headers: Vec<(String, String)>,
}

impl SsdpAnnouncement {
    pub fn usn(&self) -> String {
        format!("uuid:{}::{}", self.uuid, self.nt)
    }

    pub fn alive_message(&self) -> String {
        let mut msg = format!(
            "NOTIFY * HTTP/1.1\r\n\
             HOST: {}:{}\r\n\
             CACHE-CONTROL: max-age={}\r\n\
             LOCATION: {}\r\n\
             NT: {}\r\n\
             NTS: ssdp:alive\r\n\
             SERVER: {}\r\n\
             USN: {}\r\n",
            SSDP_MULTICAST_ADDR,
            SSDP_PORT,
            MAX_AGE,
            self.location,
            self.nt,
            self.server,
            self.usn()
        );
        for (name, value) in &self.extra_headers {
            msg.push_str(&format!("{}: {}\r\n", name, value));
        }
        msg.push_str("\r\n");
        msg
    }

    pub fn byebye_message(&self) -> String {
        format!(
            "NOTIFY * HTTP/1.1\r\n\
             HOST: {}:{}\r\n\
             NT: {}\r\n\
             NTS: ssdp:byebye\r\n\
             USN: {}\r\n\
             \r\n",
            SSDP_MULTICAST_ADDR,
            SSDP_PORT,
            self.nt,
            self.usn()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn announcement() -> SsdpAnnouncement {
        SsdpAnnouncement {
            location: "http://10.0.0.22:1400/xml/device_description.xml".into(),
            server: "Linux UPnP/1.0 Sonos/34.16-37101 (ZPS5)".into(),
            uuid: "RINCON_4CCC6A22568601400".into(),
            nt: "urn:schemas-upnp-org:device:ZonePlayer:1".into(),
            extra_headers: vec![
                ("X-RINCON-HOUSEHOLD".into(), "Sonos_H".into()),
                ("X-RINCON-BOOTSEQ".into(), "2".into()),
            ],
        }
    }

    #[test]
    fn test_alive_message() {
        let msg = announcement().alive_message();
        assert!(msg.starts_with("NOTIFY * HTTP/1.1\r\n"));
        assert!(msg.contains("HOST: 239.255.255.250:1900\r\n"));
        assert!(msg.contains("NTS: ssdp:alive\r\n"));
        assert!(msg.contains(
            "USN: uuid:RINCON_4CCC6A22568601400::urn:schemas-upnp-org:device:ZonePlayer:1\r\n"
        ));
        assert!(msg.contains("X-RINCON-BOOTSEQ: 2\r\n"));
        assert!(msg.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_byebye_message() {
        let msg = announcement().byebye_message();
        assert!(msg.contains("NTS: ssdp:byebye\r\n"));
        assert!(!msg.contains("LOCATION"));
        assert!(!msg.contains("X-RINCON"));
    }
}
