//! Extension pour intégrer le lecteur dans pmoconfig
//!
//! Clés gérées (toutes sous `player`) :
//! - `default_volume` : volume initial (0–100, défaut 70)
//! - `connect_timeout_ms` : délai de connexion au flux (défaut 10 s)
//! - `stall_timeout_ms` : délai sans données avant `Loading` (défaut 8 s)
//! - `relay_capacity` : blocs conservés par le relais local (défaut 64)
//!
//! Comme pour les autres extensions, une valeur absente ou invalide est
//! remplacée par sa valeur par défaut, qui est persistée.

use std::time::Duration;

use anyhow::Result;
use pmoconfig::Config;
use serde_yaml::{Number, Value};

use crate::coordinator::DEFAULT_VOLUME;
use crate::http_stream::HttpStreamOptions;
use crate::service::PlayerOptions;

pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_STALL_TIMEOUT_MS: u64 = 8_000;
pub const DEFAULT_RELAY_CAPACITY: u64 = 64;

pub trait PlayerConfigExt {
    fn get_player_default_volume(&self) -> Result<u8>;
    fn set_player_default_volume(&self, volume: u8) -> Result<()>;

    fn get_player_connect_timeout(&self) -> Result<Duration>;
    fn get_player_stall_timeout(&self) -> Result<Duration>;
    fn get_player_relay_capacity(&self) -> Result<usize>;

    /// Options du backend HTTP lues dans la configuration
    fn http_stream_options(&self) -> Result<HttpStreamOptions> {
        Ok(HttpStreamOptions {
            connect_timeout: self.get_player_connect_timeout()?,
            stall_timeout: self.get_player_stall_timeout()?,
            relay_capacity: self.get_player_relay_capacity()?,
        })
    }

    /// Options du service lecteur lues dans la configuration
    fn player_options(&self) -> Result<PlayerOptions> {
        Ok(PlayerOptions {
            default_volume: self.get_player_default_volume()?,
            ..PlayerOptions::default()
        })
    }
}

/// Lit un entier strictement positif sous `player.<key>`.
fn player_u64(config: &Config, key: &str, default: u64) -> Result<u64> {
    match config.get_value(&["player", key]) {
        Ok(Value::Number(n)) => match n.as_u64() {
            Some(v) if v > 0 => Ok(v),
            _ => reset(config, key, default),
        },
        _ => reset(config, key, default),
    }
}

fn reset(config: &Config, key: &str, default: u64) -> Result<u64> {
    config.set_value(&["player", key], Value::Number(Number::from(default)))?;
    Ok(default)
}

impl PlayerConfigExt for Config {
    fn get_player_default_volume(&self) -> Result<u8> {
        match self.get_value(&["player", "default_volume"]) {
            Ok(Value::Number(n)) => match n.as_i64() {
                Some(v) => Ok(v.clamp(0, 100) as u8),
                None => {
                    self.set_player_default_volume(DEFAULT_VOLUME)?;
                    Ok(DEFAULT_VOLUME)
                }
            },
            _ => {
                self.set_player_default_volume(DEFAULT_VOLUME)?;
                Ok(DEFAULT_VOLUME)
            }
        }
    }

    fn set_player_default_volume(&self, volume: u8) -> Result<()> {
        self.set_value(
            &["player", "default_volume"],
            Value::Number(Number::from(volume.min(100))),
        )
    }

    fn get_player_connect_timeout(&self) -> Result<Duration> {
        player_u64(self, "connect_timeout_ms", DEFAULT_CONNECT_TIMEOUT_MS).map(Duration::from_millis)
    }

    fn get_player_stall_timeout(&self) -> Result<Duration> {
        player_u64(self, "stall_timeout_ms", DEFAULT_STALL_TIMEOUT_MS).map(Duration::from_millis)
    }

    fn get_player_relay_capacity(&self) -> Result<usize> {
        player_u64(self, "relay_capacity", DEFAULT_RELAY_CAPACITY).map(|v| v as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        (dir, config)
    }

    #[test]
    fn test_defaults_from_embedded_file() {
        let (_dir, config) = config();

        assert_eq!(config.get_player_default_volume().unwrap(), 70);
        let options = config.http_stream_options().unwrap();
        assert_eq!(options.connect_timeout, Duration::from_secs(10));
        assert_eq!(options.stall_timeout, Duration::from_secs(8));
        assert_eq!(options.relay_capacity, 64);
    }

    #[test]
    fn test_invalid_values_are_reset() {
        let (_dir, config) = config();
        config
            .set_value(&["player", "stall_timeout_ms"], Value::String("soon".into()))
            .unwrap();
        config
            .set_value(&["player", "default_volume"], Value::Number(Number::from(250)))
            .unwrap();

        assert_eq!(
            config.get_player_stall_timeout().unwrap(),
            Duration::from_millis(DEFAULT_STALL_TIMEOUT_MS)
        );
        assert_eq!(config.get_player_default_volume().unwrap(), 100);
        assert_eq!(config.player_options().unwrap().default_volume, 100);
    }
}
