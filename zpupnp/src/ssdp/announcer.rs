//! Annonces SSDP périodiques

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{MULTICAST_TTL, SSDP_MULTICAST_ADDR, SSDP_PORT, SsdpAnnouncement};

pub struct SsdpAnnouncer {
    announcement: SsdpAnnouncement,
    interval: Duration,
    socket: UdpSocket,
    target: SocketAddr,
}

impl SsdpAnnouncer {
    /// Ouvre le socket d'émission (TTL multicast 4).
    ///
    /// Doit être appelé depuis un runtime tokio.
    pub fn bind(announcement: SsdpAnnouncement, interval: Duration) -> io::Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_multicast_ttl_v4(MULTICAST_TTL)?;
        socket.set_nonblocking(true)?;

        let bind_addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0);
        socket.bind(&bind_addr.into())?;

        let socket = UdpSocket::from_std(socket.into())?;
        let group: Ipv4Addr = SSDP_MULTICAST_ADDR
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        Ok(Self {
            announcement,
            interval: interval.max(Duration::from_millis(100)),
            socket,
            target: SocketAddr::V4(SocketAddrV4::new(group, SSDP_PORT)),
        })
    }

    /// Redirige les annonces vers une autre adresse.
    pub fn with_target(mut self, target: SocketAddr) -> Self {
        self.target = target;
        self
    }

    pub fn announcement(&self) -> &SsdpAnnouncement {
        &self.announcement
    }

    pub async fn send_alive(&self) -> io::Result<usize> {
        self.socket
            .send_to(self.announcement.alive_message().as_bytes(), self.target)
            .await
    }

    pub async fn send_byebye(&self) -> io::Result<usize> {
        let sent = self
            .socket
            .send_to(self.announcement.byebye_message().as_bytes(), self.target)
            .await?;
        info!("👋 NOTIFY byebye: {}", self.announcement.usn());
        Ok(sent)
    }

    /// Lance la boucle d'annonces ; un envoi raté est journalisé et la
    /// boucle continue.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let announcer = Arc::clone(self);
        info!(
            "✅ SSDP announcements for {} every {:?}",
            announcer.announcement.usn(),
            announcer.interval
        );

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(announcer.interval);
            loop {
                ticker.tick().await;
                match announcer.send_alive().await {
                    Ok(_) => debug!("📡 NOTIFY alive: {}", announcer.announcement.usn()),
                    Err(e) => warn!("❌ Failed to send NOTIFY alive: {}", e),
                }
            }
        })
    }
}
