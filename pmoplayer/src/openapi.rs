//! Documentation OpenAPI pour l'API du lecteur.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::get_session,
        crate::api::select_station,
        crate::api::play,
        crate::api::pause,
        crate::api::toggle,
        crate::api::next,
        crate::api::previous,
        crate::api::stop,
        crate::api::set_volume,
        crate::api::remote_action,
        crate::api::now_playing,
        crate::api::audio_stream,
        crate::api::add_station,
        crate::api::update_station,
        crate::api::delete_station,
        crate::sse::player_events_sse,
    ),
    components(
        schemas(
            crate::session::SessionView,
            crate::session::Notification,
            crate::session::NotificationLevel,
            crate::state::Snapshot,
            crate::state::PlaybackState,
            crate::state::NowPlaying,
            crate::state::MediaPlaybackState,
            crate::media_session::RemoteAction,
            crate::api::VolumeRequest,
            crate::api::RemoteResponse,
            crate::api::ErrorResponse,
            crate::sse::PlayerEventPayload,
            pmostations::Station,
            pmostations::NewStation,
            pmostations::StationPatch,
            pmostations::FieldError,
        )
    ),
    tags(
        (name = "player", description = "Contrôle de la lecture et de la session")
    ),
    info(
        title = "PMO Radio Player API",
        version = "0.1.0",
        description = r#"
# Lecteur de radio

Une seule station est lue à la fois. Chaque commande retourne la vue de
session (`snapshot`, station sélectionnée, liste, `can_navigate`).

- `next` / `previous` bouclent sur la liste et n'ont pas d'effet avec moins
  de deux stations ou sans sélection
- Supprimer la station sélectionnée arrête la lecture
- `GET /api/player/stream` relaie les octets de la station en cours
- `GET /api/player/events` diffuse les évènements `snapshot` et `notification`
        "#,
        license(
            name = "MIT",
        ),
    )
)]
pub struct ApiDoc;
