//! Petits utilitaires système partagés par les crates du ZonePlayer.
//!
//! - [`guess_local_ip`] / [`list_ipv4_addresses`] : adresses réseau locales
//! - [`normalize_mac`] : validation et normalisation d'adresses MAC
//! - [`find_port_owner`] : processus qui occupe déjà un port
//! - [`host_name`] / [`get_os_string`] : identité de la machine
mod ip_utils;
mod mac_utils;
mod process;

pub use ip_utils::{guess_local_ip, list_ipv4_addresses};
pub use mac_utils::{MacParseError, normalize_mac};
pub use process::{PortOwner, TransportProtocol, find_port_owner};

/// Retourne une chaîne décrivant le système d'exploitation et sa version.
///
/// # Format
/// - Linux: "Linux/6.5.0" ou "Ubuntu/22.04"
/// - macOS: "Macos/15.1"
/// - Autre: "{OS}/Unknown"
pub fn get_os_string() -> String {
    let info = os_info::get();
    let os_type = format!("{:?}", info.os_type());

    match info.version() {
        os_info::Version::Unknown => format!("{}/Unknown", os_type),
        version => format!("{}/{}", os_type, version),
    }
}

/// Nom d'hôte de la machine, `None` si le système ne le fournit pas.
pub fn host_name() -> Option<String> {
    sysinfo::System::host_name()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}
