//! API REST pour le catalogue de stations.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::catalog::StationCatalog;
use crate::error::Error;
use crate::model::{NewStation, Station, StationPatch};
use crate::validation::FieldError;

/// Router `/api/stations`.
pub fn stations_api_router(catalog: Arc<StationCatalog>) -> Router {
    Router::new()
        .route("/", get(list_stations).post(create_station))
        .route(
            "/{id}",
            get(get_station).patch(update_station).delete(delete_station),
        )
        .with_state(catalog)
}

/// Réponse d'erreur REST.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

fn message(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            message: message.to_string(),
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
    warn!("Rejected station payload: {}", rejection.body_text());
    invalid(vec![FieldError {
        field: "body".to_string(),
        message: rejection.body_text(),
    }])
}

/// Erreur du catalogue vers réponse HTTP ; `fallback` est le message 500.
fn map_error(err: Error, fallback: &str) -> Response {
    match err {
        Error::Validation(errors) => invalid(errors),
        other => {
            error!("{}: {}", fallback, other);
            message(StatusCode::INTERNAL_SERVER_ERROR, fallback)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/stations",
    tag = "stations",
    responses(
        (status = 200, description = "Toutes les stations", body = [Station]),
        (status = 500, description = "Erreur de stockage", body = ErrorResponse)
    )
)]
pub async fn list_stations(State(catalog): State<Arc<StationCatalog>>) -> Response {
    match catalog.list().await {
        Ok(stations) => Json(stations).into_response(),
        Err(err) => map_error(err, "Failed to fetch stations"),
    }
}

#[utoipa::path(
    get,
    path = "/api/stations/{id}",
    tag = "stations",
    params(("id" = String, Path, description = "Identifiant de la station")),
    responses(
        (status = 200, description = "Station trouvée", body = Station),
        (status = 404, description = "Station inconnue", body = ErrorResponse),
        (status = 500, description = "Erreur de stockage", body = ErrorResponse)
    )
)]
pub async fn get_station(
    State(catalog): State<Arc<StationCatalog>>,
    Path(id): Path<String>,
) -> Response {
    match catalog.get(&id).await {
        Ok(Some(station)) => Json(station).into_response(),
        Ok(None) => message(StatusCode::NOT_FOUND, "Station not found"),
        Err(err) => map_error(err, "Failed to fetch station"),
    }
}

#[utoipa::path(
    post,
    path = "/api/stations",
    tag = "stations",
    request_body = NewStation,
    responses(
        (status = 201, description = "Station créée", body = Station),
        (status = 400, description = "Données invalides", body = ErrorResponse),
        (status = 500, description = "Erreur de stockage", body = ErrorResponse)
    )
)]
pub async fn create_station(
    State(catalog): State<Arc<StationCatalog>>,
    payload: Result<Json<NewStation>, JsonRejection>,
) -> Response {
    let Json(data) = match payload {
        Ok(json) => json,
        Err(rejection) => return body_rejected(rejection),
    };

    match catalog.create(data).await {
        Ok(station) => (StatusCode::CREATED, Json(station)).into_response(),
        Err(err) => map_error(err, "Failed to create station"),
    }
}

#[utoipa::path(
    patch,
    path = "/api/stations/{id}",
    tag = "stations",
    params(("id" = String, Path, description = "Identifiant de la station")),
    request_body = StationPatch,
    responses(
        (status = 200, description = "Station mise à jour", body = Station),
        (status = 400, description = "Données invalides", body = ErrorResponse),
        (status = 404, description = "Station inconnue", body = ErrorResponse),
        (status = 500, description = "Erreur de stockage", body = ErrorResponse)
    )
)]
pub async fn update_station(
    State(catalog): State<Arc<StationCatalog>>,
    Path(id): Path<String>,
    payload: Result<Json<StationPatch>, JsonRejection>,
) -> Response {
    let Json(patch) = match payload {
        Ok(json) => json,
        Err(rejection) => return body_rejected(rejection),
    };

    match catalog.update(&id, patch).await {
        Ok(Some(station)) => Json(station).into_response(),
        Ok(None) => message(StatusCode::NOT_FOUND, "Station not found"),
        Err(err) => map_error(err, "Failed to update station"),
    }
}

#[utoipa::path(
    delete,
    path = "/api/stations/{id}",
    tag = "stations",
    params(("id" = String, Path, description = "Identifiant de la station")),
    responses(
        (status = 204, description = "Station supprimée"),
        (status = 404, description = "Station inconnue", body = ErrorResponse),
        (status = 500, description = "Erreur de stockage", body = ErrorResponse)
    )
)]
pub async fn delete_station(
    State(catalog): State<Arc<StationCatalog>>,
    Path(id): Path<String>,
) -> Response {
    match catalog.delete(&id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => message(StatusCode::NOT_FOUND, "Station not found"),
        Err(err) => map_error(err, "Failed to delete station"),
    }
}
