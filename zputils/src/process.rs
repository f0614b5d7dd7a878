use netstat2::{AddressFamilyFlags, ProtocolFlags, ProtocolSocketInfo, get_sockets_info};
use sysinfo::{Pid, System};

/// Processus qui détient un port local.
#[derive(Debug, Clone)]
pub struct PortOwner {
    pub pid: u32,
    pub process_name: String,
    pub user: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportProtocol {
    Tcp,
    Udp,
}

/// Cherche le processus qui occupe `port`.
///
/// Sert à produire un message utile quand le serveur HTTP ne peut pas se
/// lier à son port (1400 est souvent pris par un vrai lecteur ou une
/// instance précédente).
pub fn find_port_owner(port: u16, protocol: TransportProtocol) -> Option<PortOwner> {
    let flags = match protocol {
        TransportProtocol::Tcp => ProtocolFlags::TCP,
        TransportProtocol::Udp => ProtocolFlags::UDP,
    };

    let sockets = get_sockets_info(AddressFamilyFlags::IPV4 | AddressFamilyFlags::IPV6, flags).ok()?;

    let pid = sockets.into_iter().find_map(|socket| {
        let local_port = match socket.protocol_socket_info {
            ProtocolSocketInfo::Tcp(ref tcp) => tcp.local_port,
            ProtocolSocketInfo::Udp(ref udp) => udp.local_port,
        };
        if local_port == port {
            socket.associated_pids.first().copied()
        } else {
            None
        }
    })?;

    let mut system = System::new();
    system.refresh_processes();
    let process = system.process(Pid::from_u32(pid))?;

    let user = process
        .user_id()
        .and_then(|uid| users::get_user_by_uid(**uid))
        .map(|u| u.name().to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string());

    Some(PortOwner {
        pid,
        process_name: process.name().to_string(),
        user,
        port,
    })
}
