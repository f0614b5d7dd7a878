//! Logs du ZonePlayer : `tracing` vers la console et vers un buffer
//! circulaire consultable en HTTP (dump JSON ou flux SSE).
mod sselayer;

pub use sselayer::SseLayer;

use std::{collections::VecDeque, sync::Arc, time::SystemTime};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{Level, info, warn};
use tracing_subscriber::{
    Registry, filter::LevelFilter, layer::SubscriberExt, reload, util::SubscriberInitExt,
};
use zpconfig::get_config;

const LEVELS: [&str; 5] = ["ERROR", "WARN", "INFO", "DEBUG", "TRACE"];

/// Une entrée de log
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: SystemTime,
    pub level: String,
    pub target: String,
    pub message: String,
}

/// Buffer circulaire partagé + diffusion temps réel
#[derive(Clone)]
pub struct LogState {
    buffer: Arc<RwLock<VecDeque<LogEntry>>>,
    capacity: usize,
    tx: broadcast::Sender<LogEntry>,
    max_level: Arc<RwLock<Level>>,
    reload_handle: Option<reload::Handle<LevelFilter, Registry>>,
}

impl LogState {
    pub fn new(capacity: usize, reload_handle: Option<reload::Handle<LevelFilter, Registry>>) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
            tx: broadcast::channel(1000).0,
            max_level: Arc::new(RwLock::new(Level::TRACE)),
            reload_handle,
        }
    }

    /// Change le niveau minimum, y compris le filtre global de `tracing`.
    pub fn set_max_level(&self, level: Level) {
        *self.max_level.write() = level;

        if let Some(handle) = &self.reload_handle {
            if let Err(e) = handle.reload(LevelFilter::from_level(level)) {
                warn!("❌ Failed to reload log level filter: {}", e);
            }
        }
    }

    pub fn get_max_level(&self) -> Level {
        *self.max_level.read()
    }

    pub(crate) fn push(&self, entry: LogEntry) {
        {
            let mut buf = self.buffer.write();
            if buf.len() >= self.capacity {
                buf.pop_front();
            }
            buf.push_back(entry.clone());
        }
        let _ = self.tx.send(entry);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.tx.subscribe()
    }

    pub fn dump(&self) -> Vec<LogEntry> {
        self.buffer.read().iter().cloned().collect()
    }
}

/// Query params pour /log-sse
#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    #[serde(default)]
    pub error: Option<bool>,
    #[serde(default)]
    pub warn: Option<bool>,
    #[serde(default)]
    pub info: Option<bool>,
    #[serde(default)]
    pub debug: Option<bool>,
    #[serde(default)]
    pub trace: Option<bool>,
    #[serde(default)]
    pub search: Option<String>,
}

/// Handler SSE : l'historique filtré, puis les nouveaux logs.
pub async fn log_sse(
    State(state): State<LogState>,
    Query(params): Query<LogQuery>,
) -> impl IntoResponse {
    let mut rx = state.subscribe();
    let history = state.dump();

    let stream = async_stream::stream! {
        for entry in history {
            if is_level_allowed(&entry.level, state.get_max_level()) && filter_entry(&entry, &params) {
                if let Ok(json) = serde_json::to_string(&entry) {
                    yield Ok::<_, axum::Error>(Event::default().data(json));
                }
            }
        }

        loop {
            match rx.recv().await {
                Ok(entry) => {
                    if !is_level_allowed(&entry.level, state.get_max_level()) || !filter_entry(&entry, &params) {
                        continue;
                    }
                    if let Ok(json) = serde_json::to_string(&entry) {
                        yield Ok::<_, axum::Error>(Event::default().data(json));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Handler REST (dump JSON du buffer)
pub async fn log_dump(State(state): State<LogState>) -> impl IntoResponse {
    Json(state.dump())
}

fn is_level_allowed(log_level: &str, max_level: Level) -> bool {
    // Level: ERROR < WARN < INFO < DEBUG < TRACE (plus verbeux = plus grand)
    string_to_level(log_level).is_some_and(|level| level <= max_level)
}

fn filter_entry(entry: &LogEntry, q: &LogQuery) -> bool {
    let flags = [
        ("error", q.error),
        ("warn", q.warn),
        ("info", q.info),
        ("debug", q.debug),
        ("trace", q.trace),
    ];

    let level = entry.level.to_lowercase();
    let any_flag = flags.iter().any(|(_, f)| f.unwrap_or(false));
    let level_ok = !any_flag
        || flags
            .iter()
            .any(|(name, f)| f.unwrap_or(false) && *name == level);

    let search_ok = q
        .search
        .as_ref()
        .is_none_or(|s| entry.message.contains(s.as_str()) || entry.target.contains(s.as_str()));

    level_ok && search_ok
}

/// Initialise `tracing` d'après la section `host.logger` de la configuration.
///
/// Le filtre de niveau est rechargeable à chaud (voir [`LogState::set_max_level`]).
/// Un second appel (tests, réinitialisation) conserve le subscriber déjà
/// installé et retourne un nouvel état sans filtre global.
pub fn init_logging() -> LogState {
    let config = get_config();

    let level = string_to_level(&config.get_log_min_level()).unwrap_or(Level::INFO);
    let (filter, reload_handle) = reload::Layer::new(LevelFilter::from_level(level));

    let capacity = usize::try_from(config.get_log_cache_size()).unwrap_or(1000);
    let log_state = LogState::new(capacity, Some(reload_handle));
    *log_state.max_level.write() = level;

    // le filtre doit précéder le SseLayer
    let subscriber = Registry::default()
        .with(filter)
        .with(SseLayer::new(log_state.clone()));

    let console = config
        .get_log_enable_console()
        .then(|| tracing_subscriber::fmt::layer().with_target(true).with_ansi(true));

    if subscriber.with(console).try_init().is_err() {
        eprintln!("⚠️ tracing subscriber already installed");
        return LogState::new(capacity, None);
    }

    log_state
}

/// Corps de POST /api/log_setup
#[derive(Debug, Deserialize)]
pub struct LogSetupRequest {
    pub level: String,
}

/// Réponse de /api/log_setup
#[derive(Debug, Serialize)]
pub struct LogSetupResponse {
    pub current_level: String,
    pub available_levels: Vec<String>,
}

impl LogSetupResponse {
    fn new(level: Level) -> Self {
        Self {
            current_level: level.to_string(),
            available_levels: LEVELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// GET /api/log_setup
pub async fn log_setup_get(State(state): State<LogState>) -> impl IntoResponse {
    Json(LogSetupResponse::new(state.get_max_level()))
}

/// POST /api/log_setup
pub async fn log_setup_post(
    State(state): State<LogState>,
    Json(payload): Json<LogSetupRequest>,
) -> impl IntoResponse {
    let Some(level) = string_to_level(&payload.level) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": format!("Invalid log level. Must be one of: {}", LEVELS.join(", "))
            })),
        )
            .into_response();
    };

    state.set_max_level(level);
    info!("Log level changed to: {}", level);

    (StatusCode::OK, Json(LogSetupResponse::new(level))).into_response()
}

fn string_to_level(s: &str) -> Option<Level> {
    match s.trim().to_uppercase().as_str() {
        "ERROR" => Some(Level::ERROR),
        "WARN" => Some(Level::WARN),
        "INFO" => Some(Level::INFO),
        "DEBUG" => Some(Level::DEBUG),
        "TRACE" => Some(Level::TRACE),
        _ => None,
    }
}

/// Router de l'API de réglage des logs (`/log_setup`)
pub fn create_logs_router(log_state: LogState) -> Router {
    Router::new()
        .route("/log_setup", get(log_setup_get).post(log_setup_post))
        .with_state(log_state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(level: &str, message: &str) -> LogEntry {
        LogEntry {
            timestamp: SystemTime::now(),
            level: level.to_string(),
            target: "zpupnp::events".to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let state = LogState::new(2, None);
        state.push(entry("INFO", "one"));
        state.push(entry("INFO", "two"));
        state.push(entry("INFO", "three"));

        let messages: Vec<_> = state.dump().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["two", "three"]);
    }

    #[test]
    fn test_level_ordering() {
        assert!(is_level_allowed("ERROR", Level::WARN));
        assert!(is_level_allowed("WARN", Level::WARN));
        assert!(!is_level_allowed("DEBUG", Level::INFO));
        assert!(!is_level_allowed("bogus", Level::TRACE));
    }

    #[test]
    fn test_filter_entry_flags_and_search() {
        let q = LogQuery {
            warn: Some(true),
            search: Some("NOTIFY".to_string()),
            ..Default::default()
        };
        assert!(filter_entry(&entry("WARN", "NOTIFY failed"), &q));
        assert!(!filter_entry(&entry("INFO", "NOTIFY sent"), &q));
        assert!(!filter_entry(&entry("WARN", "SUBSCRIBE"), &q));

        let all = LogQuery::default();
        assert!(filter_entry(&entry("TRACE", "anything"), &all));
    }

    #[test]
    fn test_string_to_level() {
        assert_eq!(string_to_level(" debug "), Some(Level::DEBUG));
        assert_eq!(string_to_level("verbose"), None);
    }
}
