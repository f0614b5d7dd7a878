//! # Module Server
//!
//! Enveloppe un `axum::Router` partagé : les crates du ZonePlayer y
//! ajoutent leurs routes, puis [`Server::start`] lance l'écoute et
//! [`Server::wait`] bloque jusqu'à Ctrl+C.

use crate::logs::{LogState, create_logs_router, init_logging, log_dump, log_sse};
use anyhow::{Context, Result, anyhow};
use axum::handler::Handler;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{signal, sync::RwLock, task::JoinHandle};
use tracing::{error, info};
use zpconfig::get_config;
use zputils::{TransportProtocol, find_port_owner};

/// Info serveur sérialisable
#[derive(Clone, Debug, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub base_url: String,
    pub http_port: u16,
}

/// Serveur principal
pub struct Server {
    name: String,
    base_url: String,
    http_port: u16,
    router: Arc<RwLock<Router>>,
    join_handle: Option<JoinHandle<()>>,
    log_state: Option<LogState>,
}

impl Server {
    /// Crée un serveur.
    ///
    /// * `name` - Nom du serveur (pour les logs)
    /// * `base_url` - Adresse annoncée (ex: "192.168.1.20")
    /// * `http_port` - Port HTTP à écouter
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            http_port,
            router: Arc::new(RwLock::new(Router::new())),
            join_handle: None,
            log_state: None,
        }
    }

    /// Crée un serveur à partir de la configuration globale.
    pub fn new_configured() -> Self {
        let config = get_config();
        Self::new("ZonePlayer", config.get_base_url(), config.get_http_port())
    }

    /// Ajoute une route GET retournant du JSON.
    pub async fn add_route<F, Fut, T>(&mut self, path: &str, f: F)
    where
        F: Fn() -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        let handler = move || {
            let f = f.clone();
            async move { Json(f().await) }
        };
        let route = Router::new().route(path, get(handler));
        self.merge(route).await;
    }

    /// Ajoute un handler GET avec état.
    pub async fn add_handler_with_state<H, T, S>(&mut self, path: &str, handler: H, state: S)
    where
        H: Handler<T, S> + Clone + 'static,
        T: 'static,
        S: Clone + Send + Sync + 'static,
    {
        let route = Router::new().route(path, get(handler)).with_state(state);
        self.merge(route).await;
    }

    /// Ajoute un sous-router.
    ///
    /// - `path == "/"` : merge à la racine
    /// - sinon : nest sous le chemin donné
    pub async fn add_router(&mut self, path: &str, sub_router: Router) {
        if path == "/" {
            self.merge(sub_router).await;
        } else {
            let normalized = format!("/{}", path.trim_matches('/'));
            let mut r = self.router.write().await;
            *r = std::mem::take(&mut *r).nest(&normalized, sub_router);
        }
    }

    async fn merge(&mut self, route: Router) {
        let mut r = self.router.write().await;
        *r = std::mem::take(&mut *r).merge(route);
    }

    /// Copie du router courant (routes enregistrées jusqu'ici).
    pub async fn router(&self) -> Router {
        self.router.read().await.clone()
    }

    /// Démarre le serveur HTTP.
    ///
    /// Le socket est lié avant de rendre la main : un port déjà occupé est
    /// une erreur immédiate, enrichie du nom du processus fautif quand il
    /// peut être identifié. Le service s'arrête proprement sur Ctrl+C.
    pub async fn start(&mut self) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.http_port));

        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) => {
                let owner = find_port_owner(self.http_port, TransportProtocol::Tcp)
                    .map(|o| format!(" (used by {} pid={} user={})", o.process_name, o.pid, o.user))
                    .unwrap_or_default();
                return Err(anyhow!("cannot bind {}{}: {}", addr, owner, e));
            }
        };

        info!(
            "🌐 Server {} running at http://{}:{}",
            self.name, self.base_url, self.http_port
        );

        let router = self.router.read().await.clone();
        let name = self.name.clone();
        self.join_handle = Some(tokio::spawn(async move {
            let result = axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("HTTP server failed");
            match result {
                Ok(()) => info!("🛑 Server {} stopped", name),
                Err(e) => error!("❌ {:#}", e),
            }
        }));

        Ok(())
    }

    /// Attend la fin du serveur (Ctrl+C).
    pub async fn wait(&mut self) {
        if let Some(h) = self.join_handle.take() {
            let _ = h.await;
        }
    }

    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            name: self.name.clone(),
            base_url: self.base_url.clone(),
            http_port: self.http_port,
        }
    }

    /// Initialise `tracing` et enregistre les routes de logs
    /// (`/log-sse`, `/log-dump`, `/api/log_setup`).
    pub async fn init_logging(&mut self) {
        let log_state = init_logging();

        self.add_handler_with_state("/log-sse", log_sse, log_state.clone())
            .await;
        self.add_handler_with_state("/log-dump", log_dump, log_state.clone())
            .await;
        self.add_router("/api", create_logs_router(log_state.clone()))
            .await;

        self.log_state = Some(log_state);
    }

    pub fn log_state(&self) -> Option<&LogState> {
        self.log_state.as_ref()
    }
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Ctrl+C reçu, arrêt gracieux"),
        Err(e) => {
            error!("❌ Unable to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

/// Builder pattern
pub struct ServerBuilder {
    name: String,
    base_url: String,
    http_port: u16,
}

impl ServerBuilder {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            http_port,
        }
    }

    pub fn new_configured() -> Self {
        let config = get_config();
        Self::new("ZonePlayer", config.get_base_url(), config.get_http_port())
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn build(self) -> Server {
        Server::new(self.name, self.base_url, self.http_port)
    }
}
