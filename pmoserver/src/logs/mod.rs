//! Logs applicatifs : buffer circulaire, flux SSE et niveau dynamique.
//!
//! [`init_logging`] installe le subscriber global `tracing` composé de :
//! 1. un filtre de niveau rechargeable à chaud,
//! 2. un [`SseLayer`] qui alimente le buffer et les abonnés SSE,
//! 3. optionnellement, une sortie console `fmt`.

mod sselayer;

pub use sselayer::SseLayer;

use std::{
    collections::VecDeque,
    sync::{Arc, PoisonError, RwLock},
    time::SystemTime,
};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use pmoconfig::Config;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::Level;
use tracing_subscriber::{
    Registry, filter::LevelFilter, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

const LEVELS: [&str; 5] = ["ERROR", "WARN", "INFO", "DEBUG", "TRACE"];

/// Représente une entrée de log
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: SystemTime,
    pub level: String,
    pub target: String,
    pub message: String,
}

/// Buffer circulaire partagé
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
        Self {
            buffer: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
            tx: broadcast::channel(256).0,
            max_level: Arc::new(RwLock::new(Level::TRACE)),
            reload_handle,
        }
    }

    pub fn set_max_level(&self, level: Level) {
        *self.max_level.write().unwrap_or_else(PoisonError::into_inner) = level;

        if let Some(handle) = &self.reload_handle {
            if let Err(e) = handle.reload(LevelFilter::from_level(level)) {
                eprintln!("Failed to reload log level filter: {}", e);
            }
        }
    }

    pub fn get_max_level(&self) -> Level {
        *self.max_level.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn push(&self, entry: LogEntry) {
        {
            let mut buf = self.buffer.write().unwrap_or_else(PoisonError::into_inner);
            while buf.len() >= self.capacity {
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
        self.buffer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

/// Query params pour /log-sse
#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    /// Niveau le plus verbeux à transmettre (ex: `warn`)
    #[serde(default)]
    pub level: Option<String>,
    /// Filtre sur le message ou la cible
    #[serde(default)]
    pub search: Option<String>,
}

impl LogQuery {
    fn accepts(&self, entry: &LogEntry) -> bool {
        if let Some(max) = self.level.as_deref().and_then(string_to_level) {
            match string_to_level(&entry.level) {
                Some(level) if level <= max => {}
                _ => return false,
            }
        }
        match &self.search {
            Some(search) => entry.message.contains(search) || entry.target.contains(search),
            None => true,
        }
    }
}

/// Handler SSE : historique du buffer puis logs en temps réel
pub async fn log_sse(
    State(state): State<LogState>,
    Query(params): Query<LogQuery>,
) -> impl IntoResponse {
    let mut rx = state.subscribe();
    let history = state.dump();

    let stream = async_stream::stream! {
        for entry in history.into_iter().filter(|e| params.accepts(e)) {
            if let Ok(json) = serde_json::to_string(&entry) {
                yield Ok::<_, axum::Error>(Event::default().data(json));
            }
        }

        loop {
            match rx.recv().await {
                Ok(entry) => {
                    if !params.accepts(&entry) {
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

/// Options d'initialisation du système de logging
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Capacité du buffer circulaire (nombre d'entrées conservées)
    pub buffer_capacity: usize,
    /// Activer la sortie vers stderr/stdout
    pub enable_console: bool,
    /// Niveau minimum au démarrage
    pub min_level: Level,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            buffer_capacity: 1000,
            enable_console: true,
            min_level: Level::INFO,
        }
    }
}

impl LoggingOptions {
    /// Lit `host.logger.*` dans la configuration
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::default();
        Self {
            buffer_capacity: config
                .get_log_cache_size()
                .unwrap_or(defaults.buffer_capacity),
            enable_console: config
                .get_log_enable_console()
                .unwrap_or(defaults.enable_console),
            min_level: config
                .get_log_min_level()
                .ok()
                .and_then(|l| string_to_level(&l))
                .unwrap_or(defaults.min_level),
        }
    }
}

/// Initialise le système de logging avec SSE et optionnellement la console
///
/// Si un subscriber global est déjà installé (tests, double appel), le
/// `LogState` retourné reste utilisable mais ne recevra pas d'évènements.
pub fn init_logging(options: LoggingOptions) -> LogState {
    // Le filtre rechargeable doit précéder le SseLayer
    let (filter, reload_handle) = reload::Layer::new(LevelFilter::from_level(options.min_level));
    let log_state = LogState::new(options.buffer_capacity, Some(reload_handle));
    *log_state
        .max_level
        .write()
        .unwrap_or_else(PoisonError::into_inner) = options.min_level;

    let subscriber = Registry::default()
        .with(filter)
        .with(SseLayer::new(log_state.clone()));

    let installed = if options.enable_console {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true),
            )
            .try_init()
    } else {
        subscriber.try_init()
    };

    if let Err(e) = installed {
        eprintln!("Logging already initialised: {}", e);
    }

    log_state
}

/// Request body pour la configuration du logging
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LogSetupRequest {
    pub level: String,
}

/// Response pour la configuration du logging
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LogSetupResponse {
    pub current_level: String,
    pub available_levels: Vec<String>,
}

impl LogSetupResponse {
    fn for_level(level: Level) -> Self {
        Self {
            current_level: level_to_string(level),
            available_levels: LEVELS.iter().map(|l| l.to_string()).collect(),
        }
    }
}

/// Handler pour GET /api/log_setup
#[utoipa::path(
    get,
    path = "/api/log_setup",
    responses(
        (status = 200, description = "Log configuration retrieved successfully", body = LogSetupResponse)
    ),
    tag = "logs"
)]
pub async fn log_setup_get(State(state): State<LogState>) -> Json<LogSetupResponse> {
    Json(LogSetupResponse::for_level(state.get_max_level()))
}

/// Handler pour POST /api/log_setup
#[utoipa::path(
    post,
    path = "/api/log_setup",
    request_body = LogSetupRequest,
    responses(
        (status = 200, description = "Log level updated successfully", body = LogSetupResponse),
        (status = 400, description = "Invalid log level")
    ),
    tag = "logs"
)]
pub async fn log_setup_post(
    State(state): State<LogState>,
    Json(payload): Json<LogSetupRequest>,
) -> Response {
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
    tracing::info!("Log level changed to: {}", payload.level);

    (StatusCode::OK, Json(LogSetupResponse::for_level(level))).into_response()
}

fn string_to_level(s: &str) -> Option<Level> {
    s.trim().parse::<Level>().ok()
}

fn level_to_string(level: Level) -> String {
    level.as_str().to_string()
}

/// Crée le router pour l'API de gestion des logs
pub fn create_logs_router(log_state: LogState) -> Router {
    Router::new()
        .route("/", get(log_setup_get).post(log_setup_post))
        .with_state(log_state)
}

/// API OpenAPI pour la gestion des logs
#[derive(utoipa::OpenApi)]
#[openapi(
    paths(log_setup_get, log_setup_post),
    components(schemas(LogSetupRequest, LogSetupResponse)),
    tags((name = "logs", description = "Log level configuration endpoints"))
)]
pub struct LogsApiDoc;
