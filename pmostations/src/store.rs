//! Stockage des stations.
//!
//! Le catalogue ne dépend que du trait [`StationStore`] ; [`MemoryStore`] est
//! l'implémentation fournie, non persistante.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::model::{Station, StationPatch};

/// Backend de stockage des stations.
///
/// Les données reçues sont déjà validées et normalisées par le catalogue.
#[async_trait]
pub trait StationStore: Send + Sync {
    /// Toutes les stations, dans l'ordre d'insertion.
    async fn list(&self) -> Result<Vec<Station>>;

    async fn get(&self, id: &str) -> Result<Option<Station>>;

    /// Insère une station dont l'`id` est déjà attribué.
    async fn insert(&self, station: Station) -> Result<Station>;

    /// `None` si aucune station ne porte cet identifiant.
    async fn update(&self, id: &str, patch: StationPatch) -> Result<Option<Station>>;

    /// `false` si aucune station ne porte cet identifiant.
    async fn delete(&self, id: &str) -> Result<bool>;
}

#[derive(Default)]
struct Entries {
    next_seq: u64,
    by_id: HashMap<String, (u64, Station)>,
}

/// Stockage en mémoire, perdu à l'arrêt du processus.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<Entries>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StationStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Station>> {
        let entries = self.entries.read().await;
        let mut all: Vec<&(u64, Station)> = entries.by_id.values().collect();
        all.sort_by_key(|(seq, _)| *seq);
        Ok(all.into_iter().map(|(_, s)| s.clone()).collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Station>> {
        let entries = self.entries.read().await;
        Ok(entries.by_id.get(id).map(|(_, s)| s.clone()))
    }

    async fn insert(&self, station: Station) -> Result<Station> {
        let mut entries = self.entries.write().await;
        let seq = entries.next_seq;
        entries.next_seq += 1;
        entries
            .by_id
            .insert(station.id.clone(), (seq, station.clone()));
        Ok(station)
    }

    async fn update(&self, id: &str, patch: StationPatch) -> Result<Option<Station>> {
        let mut entries = self.entries.write().await;
        Ok(entries.by_id.get_mut(id).map(|(_, station)| {
            station.apply(patch);
            station.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut entries = self.entries.write().await;
        Ok(entries.by_id.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewStation;

    fn station(id: &str, name: &str) -> Station {
        Station::from_new(id.into(), NewStation::new(name, "https://radio.example/"))
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let store = MemoryStore::new();
        for (id, name) in [("z", "Zulu"), ("a", "Alpha"), ("m", "Mike")] {
            store.insert(station(id, name)).await.unwrap();
        }

        let ids: Vec<String> = store.list().await.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown() {
        let store = MemoryStore::new();
        assert!(store.update("nope", StationPatch::default()).await.unwrap().is_none());
        assert!(!store.delete("nope").await.unwrap());
    }
}
