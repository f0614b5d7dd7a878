use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use zpconfig::get_config;
use zpplayer::ZonePlayer;
use zpserver::Server;
use zpupnp::UpnpServer;
use zpupnp::ssdp::SsdpAnnouncer;

#[tokio::main]
async fn main() -> Result<()> {
    // ========== PHASE 1 : Infrastructure ==========
    let config = get_config();

    let mut server = Server::new_configured();
    server.init_logging().await;
    server
        .add_route("/info", || async {
            serde_json::json!({
                "name": "ZonePlayer",
                "version": env!("CARGO_PKG_VERSION"),
                "os": zputils::get_os_string(),
            })
        })
        .await;

    // ========== PHASE 2 : Device UPnP ==========
    for (iface, addr) in zputils::list_ipv4_addresses() {
        debug!("🌐 Interface {} -> {}", iface, addr);
    }

    info!("📡 Building ZonePlayer device...");
    let player = ZonePlayer::from_config(&config)?;
    server
        .register_device(Arc::clone(player.device()))
        .await
        .context("Failed to register ZonePlayer")?;

    let sweep = Duration::from_secs(config.get_sweep_interval().max(1));
    let sweeper = player.device().spawn_sweeper(sweep);

    // ========== PHASE 3 : Démarrage ==========
    info!("🌐 Starting HTTP server...");
    server.start().await?;

    let announcer = if config.get_ssdp_enabled() {
        let announcer = SsdpAnnouncer::bind(
            player.ssdp_announcement(),
            Duration::from_secs(config.get_ssdp_interval()),
        )
        .context("cannot open SSDP socket")?;
        let announcer = Arc::new(announcer);
        Some((announcer.spawn(), announcer))
    } else {
        info!("SSDP announcements disabled");
        None
    };

    info!("✅ ZonePlayer {} is ready!", player.identity().zone_name);
    info!("Press Ctrl+C to stop...");
    server.wait().await;

    // ========== PHASE 4 : Arrêt ==========
    sweeper.abort();
    if let Some((task, announcer)) = announcer {
        task.abort();
        if let Err(e) = announcer.send_byebye().await {
            warn!("❌ Failed to send NOTIFY byebye: {}", e);
        }
    }
    if let Err(e) = player.transport().stop() {
        warn!("❌ {}", e);
    }

    Ok(())
}
