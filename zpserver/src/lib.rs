//! # zpserver - Serveur HTTP du ZonePlayer
//!
//! Petite surcouche Axum utilisée par l'émulateur :
//!
//! - [`server`] : [`Server`] (routes, démarrage, arrêt gracieux sur Ctrl+C)
//! - [`logs`] : initialisation de `tracing`, buffer circulaire des logs,
//!   routes `/log-sse`, `/log-dump` et `/api/log_setup`
//!
//! ```rust,no_run
//! use zpserver::ServerBuilder;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let mut server = ServerBuilder::new_configured().build();
//! server.init_logging().await;
//! server.start().await?;
//! server.wait().await;
//! # Ok(())
//! # }
//! ```

pub mod logs;
pub mod server;

pub use logs::{LogState, SseLayer, log_dump, log_sse};
pub use server::{Server, ServerBuilder, ServerInfo};
