//! Extension pmoserver pour le lecteur

use pmoserver::Server;
use tracing::info;
use utoipa::OpenApi;

use crate::api::player_api_router;
use crate::openapi::ApiDoc;
use crate::service::PlayerHandle;

pub trait PlayerServerExt {
    /// Enregistre l'API du lecteur sous `/api/player` et sa documentation
    /// sous `/swagger-ui/player`.
    async fn register_player_api(&mut self, handle: PlayerHandle);
}

impl PlayerServerExt for Server {
    async fn register_player_api(&mut self, handle: PlayerHandle) {
        self.add_openapi(player_api_router(handle), ApiDoc::openapi(), "player")
            .await;
        info!("✅ Player API registered at /api/player");
    }
}
