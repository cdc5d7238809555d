//! SSE pour suivre le lecteur : snapshots du coordinateur et notifications.
//!
//! Route : `GET /api/player/events`
//!
//! Le premier évènement est toujours le snapshot courant.

use axum::{
    extract::State,
    response::IntoResponse,
    response::sse::{Event, KeepAlive, Sse},
};
use serde::Serialize;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::{BroadcastStream, WatchStream};

use crate::service::PlayerHandle;
use crate::session::Notification;
use crate::state::Snapshot;

/// Payload JSON d'un évènement du lecteur
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerEventPayload {
    Snapshot {
        snapshot: Snapshot,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    Notification {
        notification: Notification,
    },
}

impl PlayerEventPayload {
    fn event_name(&self) -> &'static str {
        match self {
            PlayerEventPayload::Snapshot { .. } => "snapshot",
            PlayerEventPayload::Notification { .. } => "notification",
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/player/events",
    tag = "player",
    responses(
        (status = 200, description = "Flux SSE (snapshot, notification)", content_type = "text/event-stream")
    )
)]
pub async fn player_events_sse(State(handle): State<PlayerHandle>) -> impl IntoResponse {
    let snapshots = WatchStream::new(handle.subscribe_snapshots()).map(|snapshot| {
        PlayerEventPayload::Snapshot {
            snapshot,
            timestamp: chrono::Utc::now(),
        }
    });

    // Une notification perdue par retard n'est pas rejouée
    let notifications = BroadcastStream::new(handle.subscribe_notifications())
        .filter_map(|n| n.ok())
        .map(|notification| PlayerEventPayload::Notification { notification });

    let stream = snapshots.merge(notifications).filter_map(|payload| {
        serde_json::to_string(&payload)
            .ok()
            .map(|json| Ok::<_, axum::Error>(Event::default().event(payload.event_name()).data(json)))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
