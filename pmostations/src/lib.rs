//! # pmostations - Catalogue des stations de radio
//!
//! Cette crate fournit :
//! - le modèle [`Station`] et ses données d'entrée ([`NewStation`], [`StationPatch`])
//! - la validation par champ (nom obligatoire, URL absolue)
//! - un stockage abstrait ([`StationStore`]) avec une implémentation mémoire
//! - le [`StationCatalog`], seul point d'entrée pour lire ou modifier les stations
//! - l'API REST `/api/stations` (feature `pmoserver`)
//!
//! # Exemple
//!
//! ```no_run
//! use pmostations::{NewStation, StationCatalog};
//!
//! # #[tokio::main]
//! # async fn main() -> pmostations::Result<()> {
//! let catalog = StationCatalog::in_memory();
//! let station = catalog
//!     .create(NewStation::new("KEXP", "https://kexp.example/stream"))
//!     .await?;
//! assert!(catalog.get(&station.id).await?.is_some());
//! # Ok(())
//! # }
//! ```

mod catalog;
mod error;
mod model;
mod store;
mod validation;

#[cfg(feature = "pmoconfig")]
mod config_ext;

#[cfg(feature = "pmoserver")]
pub mod api;
#[cfg(feature = "pmoserver")]
pub mod openapi;
#[cfg(feature = "pmoserver")]
mod pmoserver_ext;

pub use catalog::{CatalogEvent, StationCatalog, default_stations};
pub use error::{Error, Result};
pub use model::{NewStation, Station, StationPatch, normalize_optional};
pub use store::{MemoryStore, StationStore};
pub use validation::{FieldError, validate_new, validate_patch};

#[cfg(feature = "pmoconfig")]
pub use config_ext::StationsConfigExt;

#[cfg(feature = "pmoserver")]
pub use pmoserver_ext::StationsServerExt;
