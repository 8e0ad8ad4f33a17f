//! Where the fallback table comes from.
//!
//! Precedence: explicit path → `NATAL_GEO_TABLE` → `~/.natal-geo/locations.json`
//! (if present) → built-in table. File tables must pass validation.

use crate::location::{FallbackTable, GeocodingError};
use std::path::{Path, PathBuf};
use tracing::info;

pub const TABLE_ENV_VAR: &str = "NATAL_GEO_TABLE";

/// The table source picked by `TableSource::discover`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    Builtin,
    File(PathBuf),
}

impl TableSource {
    /// Pick a source from the explicit path, the environment, and the home
    /// directory, in that order.
    pub fn discover(explicit: Option<&Path>) -> Self {
        let env = std::env::var_os(TABLE_ENV_VAR).map(PathBuf::from);
        Self::resolve(explicit, env, default_table_path())
    }

    fn resolve(explicit: Option<&Path>, env: Option<PathBuf>, home: Option<PathBuf>) -> Self {
        if let Some(path) = explicit {
            return Self::File(path.to_path_buf());
        }
        if let Some(path) = env.filter(|p| !p.as_os_str().is_empty()) {
            return Self::File(path);
        }
        match home {
            Some(path) if path.is_file() => Self::File(path),
            _ => Self::Builtin,
        }
    }

    pub fn load(&self) -> Result<FallbackTable, GeocodingError> {
        match self {
            Self::Builtin => Ok(FallbackTable::builtin()),
            Self::File(path) => {
                let table = FallbackTable::load_checked(path)?;
                info!(path = %path.display(), entries = table.len(), "loaded fallback table");
                Ok(table)
            }
        }
    }
}

/// `~/.natal-geo/locations.json`
pub fn default_table_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".natal-geo").join("locations.json"))
}

/// Discover and load the table in one step.
pub fn load_table(explicit: Option<&Path>) -> Result<FallbackTable, GeocodingError> {
    TableSource::discover(explicit).load()
}
