//! Hôte de session : liste des stations, sélection et navigation.
//!
//! L'hôte relaie les intentions de l'utilisateur vers le coordinateur,
//! rafraîchit la liste après chaque modification du catalogue et signale les
//! erreurs sous forme de [`Notification`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pmostations::{CatalogEvent, NewStation, Station, StationCatalog, StationPatch};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use crate::coordinator::PlaybackCoordinator;
use crate::error::{PlaybackError, Result};
use crate::media_session::RemoteAction;
use crate::resource::TaggedEvent;
use crate::state::{PlaybackState, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "pmoserver", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Message destiné à l'utilisateur
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "pmoserver", derive(utoipa::ToSchema))]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn success(title: &str, message: &str) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: title.to_string(),
            message: message.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn error(title: &str, message: &str) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: title.to_string(),
            message: message.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Vue de la session exposée par l'API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "pmoserver", derive(utoipa::ToSchema))]
pub struct SessionView {
    pub snapshot: Snapshot,
    pub selected: Option<Station>,
    pub stations: Vec<Station>,
    pub can_navigate: bool,
}

/// Station voisine de `selected`, avec bouclage.
///
/// `None` si la liste compte moins de deux stations ou si `selected` n'y
/// figure pas.
pub fn neighbour<'a>(stations: &'a [Station], selected: &str, step: isize) -> Option<&'a Station> {
    if stations.len() <= 1 {
        return None;
    }
    let index = stations.iter().position(|s| s.id == selected)?;
    let len = stations.len() as isize;
    let target = (index as isize + step).rem_euclid(len) as usize;
    stations.get(target)
}

pub struct SessionHost {
    catalog: Arc<StationCatalog>,
    coordinator: PlaybackCoordinator,
    stations: Vec<Station>,
    selected: Option<String>,
    notifications: broadcast::Sender<Notification>,
    last_state: PlaybackState,
}

impl SessionHost {
    pub fn new(
        catalog: Arc<StationCatalog>,
        coordinator: PlaybackCoordinator,
        notifications: broadcast::Sender<Notification>,
    ) -> Self {
        let last_state = coordinator.state();
        Self {
            catalog,
            coordinator,
            stations: Vec::new(),
            selected: None,
            notifications,
            last_state,
        }
    }

    pub fn coordinator(&self) -> &PlaybackCoordinator {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut PlaybackCoordinator {
        &mut self.coordinator
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected(&self) -> Option<&Station> {
        let id = self.selected.as_deref()?;
        self.stations.iter().find(|s| s.id == id)
    }

    pub fn can_navigate(&self) -> bool {
        self.stations.len() > 1
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            snapshot: self.coordinator.snapshot(),
            selected: self.selected().cloned(),
            stations: self.stations.clone(),
            can_navigate: self.can_navigate(),
        }
    }

    /// Recharge la liste depuis le catalogue.
    pub async fn refresh(&mut self) -> Result<()> {
        self.stations = self.catalog.list().await?;
        debug!("Station list refreshed ({} stations)", self.stations.len());
        Ok(())
    }

    /// Réagit à un changement du catalogue fait hors de l'hôte (API
    /// `/api/stations`, autre client).
    ///
    /// `None` signale des évènements perdus. Si la station sélectionnée a
    /// disparu, la lecture est arrêtée et la sélection effacée.
    pub async fn on_catalog_event(&mut self, event: Option<CatalogEvent>) -> Result<()> {
        if let Some(CatalogEvent::Deleted(id)) = &event {
            if self.selected.as_deref() == Some(id.as_str()) {
                info!("⏹️ Selected station {} was deleted, stopping", id);
                self.stop();
            }
        }

        self.refresh().await?;

        let orphaned = self
            .selected
            .as_deref()
            .is_some_and(|id| !self.stations.iter().any(|s| s.id == id));
        if orphaned {
            debug!("Selected station no longer listed, stopping");
            self.stop();
        }
        Ok(())
    }

    /// Sélectionne et lance une station par identifiant.
    pub async fn select_play_id(&mut self, id: &str) -> Result<()> {
        if !self.stations.iter().any(|s| s.id == id) {
            self.refresh().await?;
        }
        let station = self
            .stations
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| PlaybackError::StationNotFound(id.to_string()))?;

        self.select_play(station);
        Ok(())
    }

    /// Bascule la station courante en pause, ou sélectionne et lance
    /// `station`.
    pub fn select_play(&mut self, station: Station) {
        if self.selected.as_deref() == Some(station.id.as_str())
            && self.coordinator.state() == PlaybackState::Playing
        {
            self.coordinator.pause();
        } else {
            self.start(station);
        }
        self.observe();
    }

    pub fn next(&mut self) {
        self.navigate(1);
    }

    pub fn previous(&mut self) {
        self.navigate(-1);
    }

    pub fn toggle_play_pause(&mut self) {
        if self.coordinator.state() == PlaybackState::Playing {
            self.coordinator.pause();
        } else {
            self.coordinator.play();
        }
        self.observe();
    }

    pub fn play(&mut self) {
        self.coordinator.play();
        self.observe();
    }

    pub fn pause(&mut self) {
        self.coordinator.pause();
        self.observe();
    }

    /// Action de télécommande ; `false` si elle n'a pas de cible.
    pub fn remote(&mut self, action: RemoteAction) -> bool {
        let handled = self.coordinator.remote(action);
        self.observe();
        handled
    }

    pub fn set_volume(&mut self, volume: i64) -> u8 {
        self.coordinator.set_volume(volume)
    }

    /// Arrête la lecture et oublie la sélection.
    pub fn stop(&mut self) {
        self.coordinator.stop();
        self.selected = None;
        self.observe();
    }

    pub fn shutdown(&mut self) {
        self.coordinator.shutdown();
        self.selected = None;
    }

    /// Transmet un évènement de ressource au coordinateur.
    pub fn handle_event(&mut self, event: TaggedEvent) {
        if self.coordinator.handle_event(event) {
            self.observe();
        }
    }

    pub async fn add_station(&mut self, data: NewStation) -> Result<Station> {
        match self.catalog.create(data).await {
            Ok(station) => {
                self.notify(Notification::success(
                    "Success",
                    "Station added successfully",
                ));
                self.refresh().await?;
                Ok(station)
            }
            Err(e) => {
                self.notify(Notification::error("Error", "Failed to add station"));
                Err(e.into())
            }
        }
    }

    pub async fn update_station(
        &mut self,
        id: &str,
        patch: StationPatch,
    ) -> Result<Option<Station>> {
        match self.catalog.update(id, patch).await {
            Ok(updated) => {
                if updated.is_some() {
                    self.notify(Notification::success(
                        "Success",
                        "Station updated successfully",
                    ));
                }
                self.refresh().await?;
                Ok(updated)
            }
            Err(e) => {
                self.notify(Notification::error("Error", "Failed to update station"));
                Err(e.into())
            }
        }
    }

    /// Supprime une station ; si elle est sélectionnée, la lecture est
    /// arrêtée et la sélection effacée avant la suppression.
    pub async fn delete_station(&mut self, id: &str) -> Result<bool> {
        if self.selected.as_deref() == Some(id) {
            self.stop();
        }

        let result = self.catalog.delete(id).await;
        match &result {
            Ok(true) => self.notify(Notification::success(
                "Success",
                "Station deleted successfully",
            )),
            Ok(false) => debug!("Delete of unknown station {}", id),
            Err(e) => {
                error!("Failed to delete station {}: {}", id, e);
                self.notify(Notification::error("Error", "Failed to delete station"));
            }
        }

        self.refresh().await?;
        Ok(result?)
    }

    fn navigate(&mut self, step: isize) {
        let Some(selected) = self.selected.as_deref() else {
            debug!("Navigation without selection ignored");
            return;
        };
        let Some(target) = neighbour(&self.stations, selected, step).cloned() else {
            debug!("Navigation not possible from {}", selected);
            return;
        };

        info!("⏭️ Switching to {}", target.name);
        self.start(target);
        self.observe();
    }

    fn start(&mut self, station: Station) {
        self.selected = Some(station.id.clone());
        let url = station.url.clone();
        self.coordinator.load(&url, Some(station));
        self.coordinator.play();
    }

    /// Émet la notification d'erreur à l'entrée dans `Errored`.
    fn observe(&mut self) {
        let state = self.coordinator.state();
        if state == PlaybackState::Errored && self.last_state != PlaybackState::Errored {
            self.notify(Notification::error(
                "Connection Error",
                "Failed to connect to radio station. Please try another station.",
            ));
        }
        self.last_state = state;
    }

    fn notify(&self, notification: Notification) {
        // Personne n'écoute : pas une erreur
        let _ = self.notifications.send(notification);
    }
}
