//! # Module Server - API de haut niveau pour Axum
//!
//! Le serveur conserve un [`Router`] partagé que l'on enrichit route par
//! route avant l'appel à [`Server::start`]. Les routes ajoutées après le
//! démarrage ne sont pas prises en compte.

use crate::logs::{LogState, LoggingOptions, create_logs_router, init_logging, log_dump, log_sse};
use axum::handler::Handler;
use axum::response::Redirect;
use axum::routing::get;
use axum::{Json, Router};
use pmoconfig::get_config;
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{signal, sync::RwLock, task::JoinHandle};
use tracing::{error, info};
use utoipa_swagger_ui::SwaggerUi;

/// Info serveur sérialisable
#[derive(Clone, Debug, Serialize, utoipa::ToSchema)]
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
    /// Crée une nouvelle instance de serveur
    ///
    /// # Arguments
    ///
    /// * `name` - Nom du serveur (pour les logs)
    /// * `base_url` - Hôte annoncé (ex: "localhost")
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

    pub fn new_configured() -> Self {
        ServerBuilder::new_configured().build()
    }

    async fn mount(&self, path: &str, route: Router) {
        let mut r = self.router.write().await;
        *r = if path == "/" {
            std::mem::take(&mut *r).merge(route)
        } else {
            let normalized = format!("/{}", path.trim_start_matches('/'));
            std::mem::take(&mut *r).nest(&normalized, route)
        };
    }

    /// Ajoute une route JSON dynamique
    ///
    /// La closure est appelée à chaque requête GET sur `path`.
    ///
    /// ```rust,no_run
    /// # use pmoserver::Server;
    /// # #[tokio::main]
    /// # async fn main() {
    /// # let mut server = Server::new("Test", "localhost", 3000);
    /// server.add_route("/info", || async {
    ///     serde_json::json!({"version": "1.0.0"})
    /// }).await;
    /// # }
    /// ```
    pub async fn add_route<F, Fut, T>(&mut self, path: &str, f: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        let f = Arc::new(f);
        let handler = move || {
            let f = f.clone();
            async move { Json(f().await) }
        };

        self.mount(path, Router::new().route("/", get(handler))).await;
    }

    /// Ajoute un handler GET avec état
    pub async fn add_handler_with_state<H, T, S>(&mut self, path: &str, handler: H, state: S)
    where
        H: Handler<T, S> + Clone + 'static,
        T: 'static,
        S: Clone + Send + Sync + 'static,
    {
        let route = Router::new().route("/", get(handler)).with_state(state);
        self.mount(path, route).await;
    }

    /// Ajoute un sous-router au serveur
    ///
    /// - Si `path` est "/", merge directement au router principal
    /// - Sinon, nest le router sous le chemin donné
    pub async fn add_router(&mut self, path: &str, sub_router: Router) {
        self.mount(path, sub_router).await;
    }

    /// Ajoute une redirection HTTP permanente (308)
    pub async fn add_redirect(&mut self, from: &str, to: &str) {
        let target = to.to_string();
        let route = Router::new().route(
            "/",
            get(move || async move { Redirect::permanent(&target) }),
        );
        self.mount(from, route).await;
    }

    /// Ajoute une API documentée avec OpenAPI et Swagger UI
    ///
    /// L'API est montée sous `/api/{name}` ; la documentation est servie sur
    /// `/swagger-ui/{name}` et le JSON OpenAPI sur `/api-docs/{name}.json`.
    pub async fn add_openapi(
        &mut self,
        api_router: Router,
        openapi: utoipa::openapi::OpenApi,
        name: &str,
    ) {
        let swagger_path: &'static str = Box::leak(format!("/swagger-ui/{}", name).into_boxed_str());
        let json_path: &'static str = Box::leak(format!("/api-docs/{}.json", name).into_boxed_str());
        let swagger = SwaggerUi::new(swagger_path).url(json_path, openapi);

        let nested = Router::new().nest(&format!("/api/{}", name), api_router);

        let mut r = self.router.write().await;
        *r = std::mem::take(&mut *r).merge(nested).merge(swagger);
    }

    /// Retourne une copie du router assemblé (utile pour les tests)
    pub async fn router(&self) -> Router {
        self.router.read().await.clone()
    }

    /// Démarre le serveur HTTP
    ///
    /// Le listener est ouvert avant de rendre la main, de sorte qu'un port
    /// déjà occupé est signalé à l'appelant. Le service tourne ensuite en
    /// tâche de fond jusqu'à Ctrl+C.
    pub async fn start(&mut self) -> anyhow::Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(
            "Server {} running at http://{}:{}",
            self.name, self.base_url, self.http_port
        );

        let router = self.router.read().await.clone();
        let name = self.name.clone();
        self.join_handle = Some(tokio::spawn(async move {
            let shutdown = async {
                if let Err(e) = signal::ctrl_c().await {
                    error!("Failed to listen for Ctrl+C: {}", e);
                    std::future::pending::<()>().await;
                }
                info!("Ctrl+C reçu, arrêt gracieux");
            };

            if let Err(e) = axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!("Server {} stopped with error: {}", name, e);
            }
        }));

        Ok(())
    }

    /// Attend la fin du serveur
    pub async fn wait(&mut self) {
        if let Some(h) = self.join_handle.take() {
            let _ = h.await;
        }
    }

    /// Récupère les infos du serveur
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            name: self.name.clone(),
            base_url: self.base_url.clone(),
            http_port: self.http_port,
        }
    }

    /// État des logs, si [`Server::init_logging`] a été appelé
    pub fn log_state(&self) -> Option<LogState> {
        self.log_state.clone()
    }

    /// Initialise le système de logging et enregistre les routes de logs
    ///
    /// Routes enregistrées :
    /// - `GET /log-sse` : flux SSE des logs
    /// - `GET /log-dump` : contenu du buffer circulaire
    /// - `GET|POST /api/log_setup` : niveau de log courant
    pub async fn init_logging(&mut self, options: LoggingOptions) {
        let log_state = init_logging(options);

        self.add_handler_with_state("/log-sse", log_sse, log_state.clone())
            .await;
        self.add_handler_with_state("/log-dump", log_dump, log_state.clone())
            .await;
        self.add_router("/api/log_setup", create_logs_router(log_state.clone()))
            .await;

        self.log_state = Some(log_state);
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

    /// Builder initialisé depuis `pmoconfig` (`host.base_url`, `host.http_port`)
    pub fn new_configured() -> Self {
        let config = get_config();
        Self {
            name: "PMO-Radio-Server".to_string(),
            base_url: config.get_base_url(),
            http_port: config.get_http_port(),
        }
    }

    pub fn http_port(mut self, port: u16) -> Self {
        self.http_port = port;
        self
    }

    /// Construit le serveur
    pub fn build(self) -> Server {
        Server::new(self.name, self.base_url, self.http_port)
    }
}
