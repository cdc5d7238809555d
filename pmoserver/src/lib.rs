//! # pmoserver - Serveur web haut niveau basé sur Axum
//!
//! Cette crate fournit l'enveloppe HTTP commune de PMORadio : un [`Server`]
//! qui assemble les routers Axum fournis par les autres crates, sert la
//! documentation OpenAPI et gère l'arrêt gracieux.
//!
//! ## Fonctionnalités
//!
//! - 🚀 **Routes JSON simples** : `add_route()`
//! - 🧩 **Sous-routers** : `add_router()` et `add_handler_with_state()`
//! - 📚 **Documentation OpenAPI** : Swagger UI avec `add_openapi()`
//! - 📡 **Logs temps réel** : buffer circulaire + SSE via [`logs`]
//! - ⚡ **Arrêt gracieux** : Ctrl+C
//!
//! ## Exemple d'utilisation
//!
//! ```rust,no_run
//! use pmoserver::{ServerBuilder, logs::LoggingOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = ServerBuilder::new("MyServer", "localhost", 8080).build();
//!     server.init_logging(LoggingOptions::default()).await;
//!
//!     server.add_route("/api/status", || async {
//!         serde_json::json!({"status": "ok"})
//!     }).await;
//!
//!     server.start().await?;
//!     server.wait().await;
//!     Ok(())
//! }
//! ```
//!
//! Les crates métier (`pmostations`, `pmoplayer`) ajoutent leurs API via des
//! traits d'extension implémentés sur [`Server`], sans que `pmoserver` ne
//! dépende d'elles.

pub mod logs;
pub mod server;

pub use logs::{LogState, LoggingOptions, SseLayer, log_dump, log_sse};
pub use server::{Server, ServerBuilder, ServerInfo};
