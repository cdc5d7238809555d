//! Extension pour intégrer le catalogue de stations dans pmoconfig
//!
//! Ajoute à `pmoconfig::Config` la lecture des stations initiales
//! (`stations.seed`) et de leur activation (`stations.seed_defaults`).

use anyhow::Result;
use pmoconfig::Config;
use serde_yaml::Value;

use crate::catalog::default_stations;
use crate::model::NewStation;

pub trait StationsConfigExt {
    /// Indique si le catalogue doit être pré-rempli au démarrage (défaut : `true`)
    fn get_stations_seed_defaults(&self) -> Result<bool>;

    fn set_stations_seed_defaults(&self, enabled: bool) -> Result<()>;

    /// Stations initiales
    ///
    /// Si la clé est absente, les stations par défaut sont persistées puis
    /// retournées.
    fn get_stations_seed(&self) -> Result<Vec<NewStation>>;

    fn set_stations_seed(&self, stations: &[NewStation]) -> Result<()>;
}

impl StationsConfigExt for Config {
    fn get_stations_seed_defaults(&self) -> Result<bool> {
        match self.get_value(&["stations", "seed_defaults"]) {
            Ok(Value::Bool(b)) => Ok(b),
            _ => {
                self.set_stations_seed_defaults(true)?;
                Ok(true)
            }
        }
    }

    fn set_stations_seed_defaults(&self, enabled: bool) -> Result<()> {
        self.set_value(&["stations", "seed_defaults"], Value::Bool(enabled))
    }

    fn get_stations_seed(&self) -> Result<Vec<NewStation>> {
        match self.get_value(&["stations", "seed"]) {
            Ok(value @ Value::Sequence(_)) => Ok(serde_yaml::from_value(value)?),
            _ => {
                let stations = default_stations();
                self.set_stations_seed(&stations)?;
                Ok(stations)
            }
        }
    }

    fn set_stations_seed(&self, stations: &[NewStation]) -> Result<()> {
        let value = serde_yaml::to_value(stations)?;
        self.set_value(&["stations", "seed"], value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_from_defaults_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();

        assert!(config.get_stations_seed_defaults().unwrap());
        let seed = config.get_stations_seed().unwrap();
        assert_eq!(seed.len(), 3);
        assert_eq!(seed[1].name, "Jazz FM 88.3");
        assert_eq!(seed[2].bitrate.as_deref(), Some("320 kbps"));
    }

    #[test]
    fn test_seed_roundtrip_through_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();

        config
            .set_stations_seed(&[NewStation::new("KEXP", "https://kexp.example/stream")])
            .unwrap();
        config.set_stations_seed_defaults(false).unwrap();

        let seed = config.get_stations_seed().unwrap();
        assert_eq!(seed.len(), 1);
        assert_eq!(seed[0].description, None);
        assert!(!config.get_stations_seed_defaults().unwrap());
    }
}
