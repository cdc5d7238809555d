//! Catalogue de stations : validation, attribution des identifiants et
//! notification des changements.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::{NewStation, Station, StationPatch};
use crate::store::{MemoryStore, StationStore};
use crate::validation::{validate_new, validate_patch};

/// Changement survenu dans le catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CatalogEvent {
    Created(String),
    Updated(String),
    Deleted(String),
}

/// Point d'entrée pour toutes les opérations sur les stations.
///
/// Clonable à bas coût ; toutes les copies partagent le même stockage.
#[derive(Clone)]
pub struct StationCatalog {
    store: Arc<dyn StationStore>,
    events: broadcast::Sender<CatalogEvent>,
}

impl StationCatalog {
    pub fn new(store: Arc<dyn StationStore>) -> Self {
        Self {
            store,
            events: broadcast::channel(64).0,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// S'abonne aux changements du catalogue.
    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events.subscribe()
    }

    pub async fn list(&self) -> Result<Vec<Station>> {
        self.store.list().await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Station>> {
        self.store.get(id).await
    }

    pub async fn create(&self, data: NewStation) -> Result<Station> {
        validate_new(&data).map_err(Error::Validation)?;

        let station = Station::from_new(Uuid::new_v4().to_string(), data);
        let station = self.store.insert(station).await?;

        info!("📻 Station created: {} ({})", station.name, station.id);
        let _ = self.events.send(CatalogEvent::Created(station.id.clone()));
        Ok(station)
    }

    pub async fn update(&self, id: &str, patch: StationPatch) -> Result<Option<Station>> {
        validate_patch(&patch).map_err(Error::Validation)?;

        let updated = self.store.update(id, patch).await?;
        match &updated {
            Some(station) => {
                debug!("Station updated: {}", station.id);
                let _ = self.events.send(CatalogEvent::Updated(station.id.clone()));
            }
            None => debug!("Update of unknown station {}", id),
        }
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let removed = self.store.delete(id).await?;
        if removed {
            info!("🗑️ Station deleted: {}", id);
            let _ = self.events.send(CatalogEvent::Deleted(id.to_string()));
        }
        Ok(removed)
    }

    /// Ajoute des stations initiales si le catalogue est vide.
    ///
    /// Retourne le nombre de stations créées.
    pub async fn seed(&self, stations: Vec<NewStation>) -> Result<usize> {
        if !self.store.list().await?.is_empty() {
            debug!("Catalog not empty, skipping seed");
            return Ok(0);
        }

        let mut count = 0;
        for data in stations {
            self.create(data).await?;
            count += 1;
        }
        info!("🌱 Seeded {} stations", count);
        Ok(count)
    }
}

impl Default for StationCatalog {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Stations proposées au premier démarrage
pub fn default_stations() -> Vec<NewStation> {
    vec![
        NewStation::new("Classic Rock 101.5", "https://streams.the80s.com/")
            .with_description("The best classic rock hits")
            .with_bitrate("128 kbps"),
        NewStation::new(
            "Jazz FM 88.3",
            "https://jazz-wr01.ice.infomaniak.ch/jazz-wr01-128.mp3",
        )
        .with_description("Smooth jazz and contemporary")
        .with_bitrate("128 kbps"),
        NewStation::new(
            "Electronic Beats",
            "https://streams.fluxfm.de/Fluxfm/mp3-320/radioplayer",
        )
        .with_description("Electronic and dance music")
        .with_bitrate("320 kbps"),
    ]
}
