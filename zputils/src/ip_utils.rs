use get_if_addrs::get_if_addrs;
use std::net::UdpSocket;

/// Devine l'adresse IP locale de la machine.
///
/// Ouvre un socket UDP et le "connecte" vers `8.8.8.8:80` : aucun paquet
/// n'est émis, mais le système choisit l'interface de sortie, dont on lit
/// l'adresse. Retourne `"127.0.0.1"` si une étape échoue.
pub fn guess_local_ip() -> String {
    let Ok(socket) = UdpSocket::bind("0.0.0.0:0") else {
        return "127.0.0.1".to_string();
    };

    if socket.connect("8.8.8.8:80").is_err() {
        return "127.0.0.1".to_string();
    }

    socket
        .local_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|_| "127.0.0.1".to_string())
}

/// Liste les adresses IPv4 non-loopback, sous la forme `(interface, adresse)`.
///
/// L'ordre suit celui renvoyé par le système. Une erreur d'énumération
/// donne une liste vide.
pub fn list_ipv4_addresses() -> Vec<(String, String)> {
    let Ok(interfaces) = get_if_addrs() else {
        return Vec::new();
    };

    interfaces
        .into_iter()
        .filter(|iface| iface.ip().is_ipv4() && !iface.ip().is_loopback())
        .map(|iface| {
            let ip = iface.ip().to_string();
            (iface.name, ip)
        })
        .collect()
}
