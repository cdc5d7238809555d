//! API REST du lecteur (`/api/player`).

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use pmostations::{FieldError, NewStation, Station, StationPatch};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, error};
use utoipa::ToSchema;

use crate::error::PlaybackError;
use crate::media_session::RemoteAction;
use crate::service::PlayerHandle;
use crate::session::SessionView;
use crate::sse::player_events_sse;
use crate::state::NowPlaying;

/// Router `/api/player`.
pub fn player_api_router(handle: PlayerHandle) -> Router {
    Router::new()
        .route("/", get(get_session))
        .route("/select/{id}", post(select_station))
        .route("/play", post(play))
        .route("/pause", post(pause))
        .route("/toggle", post(toggle))
        .route("/next", post(next))
        .route("/previous", post(previous))
        .route("/stop", post(stop))
        .route("/volume", put(set_volume))
        .route("/remote/{action}", post(remote_action))
        .route("/now-playing", get(now_playing))
        .route("/events", get(player_events_sse))
        .route("/stream", get(audio_stream))
        .route("/stations", post(add_station))
        .route(
            "/stations/{id}",
            axum::routing::patch(update_station).delete(delete_station),
        )
        .with_state(handle)
}

/// Réponse d'erreur REST.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VolumeRequest {
    /// Volume souhaité ; borné à 0–100
    #[schema(example = 70)]
    pub volume: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RemoteResponse {
    pub action: RemoteAction,
    /// `false` si aucune cible n'est enregistrée pour l'action
    pub handled: bool,
}

fn message(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            message: message.into(),
            errors: None,
        }),
    )
        .into_response()
}

fn invalid(errors: Vec<FieldError>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            message: "Invalid station data".to_string(),
            errors: Some(errors),
        }),
    )
        .into_response()
}

fn body_rejected(rejection: JsonRejection) -> Response {
    invalid(vec![FieldError {
        field: "body".to_string(),
        message: rejection.body_text(),
    }])
}

fn map_error(err: PlaybackError) -> Response {
    match err {
        PlaybackError::StationNotFound(_) => message(StatusCode::NOT_FOUND, "Station not found"),
        PlaybackError::UnknownAction(action) => message(
            StatusCode::NOT_FOUND,
            format!("Unknown remote action: {}", action),
        ),
        PlaybackError::Catalog(pmostations::Error::Validation(errors)) => invalid(errors),
        PlaybackError::Closed => message(
            StatusCode::SERVICE_UNAVAILABLE,
            "Player service is not running",
        ),
        other => {
            error!("Player API error: {}", other);
            message(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

fn view_response(result: crate::Result<SessionView>) -> Response {
    match result {
        Ok(view) => Json(view).into_response(),
        Err(err) => map_error(err),
    }
}

#[utoipa::path(
    get,
    path = "/api/player",
    tag = "player",
    responses((status = 200, description = "État de la session", body = SessionView))
)]
pub async fn get_session(State(handle): State<PlayerHandle>) -> Response {
    view_response(handle.view().await)
}

#[utoipa::path(
    post,
    path = "/api/player/select/{id}",
    tag = "player",
    params(("id" = String, Path, description = "Identifiant de la station")),
    responses(
        (status = 200, description = "Station sélectionnée (ou mise en pause si déjà en lecture)", body = SessionView),
        (status = 404, description = "Station inconnue", body = ErrorResponse)
    )
)]
pub async fn select_station(
    State(handle): State<PlayerHandle>,
    Path(id): Path<String>,
) -> Response {
    view_response(handle.select(&id).await)
}

#[utoipa::path(
    post,
    path = "/api/player/play",
    tag = "player",
    responses((status = 200, description = "Lecture demandée", body = SessionView))
)]
pub async fn play(State(handle): State<PlayerHandle>) -> Response {
    view_response(handle.play().await)
}

#[utoipa::path(
    post,
    path = "/api/player/pause",
    tag = "player",
    responses((status = 200, description = "Pause demandée", body = SessionView))
)]
pub async fn pause(State(handle): State<PlayerHandle>) -> Response {
    view_response(handle.pause().await)
}

#[utoipa::path(
    post,
    path = "/api/player/toggle",
    tag = "player",
    responses((status = 200, description = "Lecture/pause basculée", body = SessionView))
)]
pub async fn toggle(State(handle): State<PlayerHandle>) -> Response {
    view_response(handle.toggle().await)
}

#[utoipa::path(
    post,
    path = "/api/player/next",
    tag = "player",
    responses((status = 200, description = "Station suivante (avec bouclage)", body = SessionView))
)]
pub async fn next(State(handle): State<PlayerHandle>) -> Response {
    view_response(handle.next().await)
}

#[utoipa::path(
    post,
    path = "/api/player/previous",
    tag = "player",
    responses((status = 200, description = "Station précédente (avec bouclage)", body = SessionView))
)]
pub async fn previous(State(handle): State<PlayerHandle>) -> Response {
    view_response(handle.previous().await)
}

#[utoipa::path(
    post,
    path = "/api/player/stop",
    tag = "player",
    responses((status = 200, description = "Lecture arrêtée, sélection effacée", body = SessionView))
)]
pub async fn stop(State(handle): State<PlayerHandle>) -> Response {
    view_response(handle.stop().await)
}

#[utoipa::path(
    put,
    path = "/api/player/volume",
    tag = "player",
    request_body = VolumeRequest,
    responses(
        (status = 200, description = "Volume appliqué", body = SessionView),
        (status = 400, description = "Corps invalide", body = ErrorResponse)
    )
)]
pub async fn set_volume(
    State(handle): State<PlayerHandle>,
    payload: Result<Json<VolumeRequest>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(req)) => view_response(handle.set_volume(req.volume).await),
        Err(rejection) => message(StatusCode::BAD_REQUEST, rejection.body_text()),
    }
}

#[utoipa::path(
    post,
    path = "/api/player/remote/{action}",
    tag = "player",
    params(("action" = String, Path, description = "play, pause, nexttrack, previoustrack, seekforward, seekbackward")),
    responses(
        (status = 200, description = "Action transmise", body = RemoteResponse),
        (status = 404, description = "Action inconnue", body = ErrorResponse)
    )
)]
pub async fn remote_action(
    State(handle): State<PlayerHandle>,
    Path(action): Path<String>,
) -> Response {
    let action = match action.parse::<RemoteAction>() {
        Ok(action) => action,
        Err(err) => return map_error(err),
    };
    match handle.remote(action).await {
        Ok(handled) => Json(RemoteResponse { action, handled }).into_response(),
        Err(err) => map_error(err),
    }
}

#[utoipa::path(
    get,
    path = "/api/player/now-playing",
    tag = "player",
    responses((status = 200, description = "Métadonnées affichées", body = NowPlaying))
)]
pub async fn now_playing(State(handle): State<PlayerHandle>) -> Json<NowPlaying> {
    Json(handle.now_playing())
}

#[utoipa::path(
    get,
    path = "/api/player/stream",
    tag = "player",
    responses(
        (status = 200, description = "Flux audio de la station en cours", content_type = "audio/mpeg"),
        (status = 503, description = "Aucun flux en cours", body = ErrorResponse)
    )
)]
pub async fn audio_stream(State(handle): State<PlayerHandle>) -> Response {
    let Some(relay) = handle.relay().filter(|r| r.is_active()).cloned() else {
        return message(StatusCode::SERVICE_UNAVAILABLE, "No stream is playing");
    };

    let mut rx = relay.subscribe();
    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(chunk) => yield Ok::<_, std::io::Error>(chunk),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    debug!("Stream listener lagged by {} chunks", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    let content_type = relay
        .content_type()
        .and_then(|ct| HeaderValue::from_str(&ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static("audio/mpeg"));

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    if let Some(name) = handle
        .snapshot()
        .station
        .and_then(|s| HeaderValue::from_str(&s.name).ok())
    {
        headers.insert("icy-name", name);
    }

    (headers, Body::from_stream(stream)).into_response()
}

#[utoipa::path(
    post,
    path = "/api/player/stations",
    tag = "player",
    request_body = NewStation,
    responses(
        (status = 201, description = "Station ajoutée", body = Station),
        (status = 400, description = "Données invalides", body = ErrorResponse)
    )
)]
pub async fn add_station(
    State(handle): State<PlayerHandle>,
    payload: Result<Json<NewStation>, JsonRejection>,
) -> Response {
    let Json(data) = match payload {
        Ok(json) => json,
        Err(rejection) => return body_rejected(rejection),
    };
    match handle.add_station(data).await {
        Ok(station) => (StatusCode::CREATED, Json(station)).into_response(),
        Err(err) => map_error(err),
    }
}

#[utoipa::path(
    patch,
    path = "/api/player/stations/{id}",
    tag = "player",
    params(("id" = String, Path, description = "Identifiant de la station")),
    request_body = StationPatch,
    responses(
        (status = 200, description = "Station mise à jour", body = Station),
        (status = 400, description = "Données invalides", body = ErrorResponse),
        (status = 404, description = "Station inconnue", body = ErrorResponse)
    )
)]
pub async fn update_station(
    State(handle): State<PlayerHandle>,
    Path(id): Path<String>,
    payload: Result<Json<StationPatch>, JsonRejection>,
) -> Response {
    let Json(patch) = match payload {
        Ok(json) => json,
        Err(rejection) => return body_rejected(rejection),
    };
    match handle.update_station(&id, patch).await {
        Ok(Some(station)) => Json(station).into_response(),
        Ok(None) => message(StatusCode::NOT_FOUND, "Station not found"),
        Err(err) => map_error(err),
    }
}

#[utoipa::path(
    delete,
    path = "/api/player/stations/{id}",
    tag = "player",
    params(("id" = String, Path, description = "Identifiant de la station")),
    responses(
        (status = 204, description = "Station supprimée ; la lecture est arrêtée si elle était sélectionnée"),
        (status = 404, description = "Station inconnue", body = ErrorResponse)
    )
)]
pub async fn delete_station(
    State(handle): State<PlayerHandle>,
    Path(id): Path<String>,
) -> Response {
    match handle.delete_station(&id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => message(StatusCode::NOT_FOUND, "Station not found"),
        Err(err) => map_error(err),
    }
}
