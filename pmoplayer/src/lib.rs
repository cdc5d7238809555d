//! # pmoplayer - Lecteur de radio internet
//!
//! Cette crate fournit :
//! - le [`PlaybackCoordinator`], machine à états qui possède l'unique
//!   ressource audio et ignore les évènements des ressources remplacées
//! - le [`SessionHost`], qui tient la liste des stations, la sélection et la
//!   navigation circulaire
//! - le [`PlayerService`], tâche unique qui sérialise commandes, évènements
//!   audio et actions de télécommande
//! - un backend audio HTTP ([`HttpStreamBackend`]) qui relaie le flux aux
//!   auditeurs locaux
//! - l'API REST/SSE `/api/player` (feature `pmoserver`)
//!
//! # Exemple
//!
//! ```no_run
//! use std::sync::Arc;
//! use pmoplayer::{HttpStreamBackend, HttpStreamOptions, PlayerOptions, PlayerService};
//! use pmostations::{StationCatalog, default_stations};
//!
//! # #[tokio::main]
//! # async fn main() -> pmoplayer::Result<()> {
//! let catalog = Arc::new(StationCatalog::in_memory());
//! catalog.seed(default_stations()).await?;
//!
//! let backend = Arc::new(HttpStreamBackend::new(HttpStreamOptions::default())?);
//! let (player, _task) = PlayerService::spawn(catalog, backend, PlayerOptions::default()).await?;
//!
//! let view = player.view().await?;
//! player.select(&view.stations[0].id).await?;
//! player.next().await?;
//! player.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod coordinator;
mod error;
mod http_stream;
mod media_session;
mod resource;
mod service;
mod session;
mod state;

#[cfg(feature = "pmoconfig")]
mod config_ext;

#[cfg(feature = "pmoserver")]
pub mod api;
#[cfg(feature = "pmoserver")]
pub mod openapi;
#[cfg(feature = "pmoserver")]
mod pmoserver_ext;
#[cfg(feature = "pmoserver")]
pub mod sse;

pub use coordinator::{DEFAULT_VOLUME, PlaybackCoordinator};
pub use error::{PlaybackError, Result};
pub use http_stream::{HttpStreamBackend, HttpStreamOptions, StreamRelay};
pub use media_session::{
    MediaSession, NowPlayingSurface, RemoteAction, RemoteHandler, RemoteHandlers,
};
pub use resource::{
    AudioBackend, AudioResource, EventSink, Generation, ResourceEvent, TaggedEvent,
};
pub use service::{Intent, PlayerHandle, PlayerOptions, PlayerService};
pub use session::{Notification, NotificationLevel, SessionHost, SessionView, neighbour};
pub use state::{MediaMetadata, MediaPlaybackState, NowPlaying, PlaybackState, Snapshot};

#[cfg(feature = "pmoconfig")]
pub use config_ext::PlayerConfigExt;

#[cfg(feature = "pmoserver")]
pub use pmoserver_ext::PlayerServerExt;
