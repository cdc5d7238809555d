//! Extension pmoserver pour le catalogue de stations
//!
//! Permet d'ajouter l'API stations à un `pmoserver::Server` sans que
//! pmoserver dépende de pmostations.

use std::sync::Arc;

use pmoserver::Server;
use tracing::info;
use utoipa::OpenApi;

use crate::api::stations_api_router;
use crate::catalog::StationCatalog;
use crate::openapi::ApiDoc;

pub trait StationsServerExt {
    /// Enregistre l'API REST sous `/api/stations` et sa documentation sous
    /// `/swagger-ui/stations`.
    async fn register_stations_api(&mut self, catalog: Arc<StationCatalog>);
}

impl StationsServerExt for Server {
    async fn register_stations_api(&mut self, catalog: Arc<StationCatalog>) {
        self.add_openapi(stations_api_router(catalog), ApiDoc::openapi(), "stations")
            .await;
        info!("✅ Stations API registered at /api/stations");
    }
}
