use super::traits::IndexFile;
use crate::core::digest::{DecoyFormat, Digestion, Enzyme};
use crate::core::mass::table::{MassError, MassTable, MassType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use thiserror::Error;

pub const MANIFEST_FILE: &str = "manifest.toml";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse manifest '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize manifest '{path}': {source}")]
    Serialize {
        path: String,
        #[source]
        source: toml::ser::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticMod {
    pub residue: char,
    pub delta: f64,
}

/// Build parameters recorded for later compatibility checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexHeader {
    pub min_mass: f64,
    pub max_mass: f64,
    pub min_length: u32,
    pub max_length: u32,
    pub enzyme: Enzyme,
    pub digestion: Digestion,
    pub missed_cleavages: bool,
    pub mass_type: MassType,
    pub is_unique: bool,
    pub peak_diffs: bool,
    pub decoys: DecoyFormat,
    pub bin_width: f64,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub static_mods: Vec<StaticMod>,
}

impl IndexHeader {
    /// The mass table the index was built with.
    pub fn mass_table(&self) -> Result<MassTable, MassError> {
        self.static_mods
            .iter()
            .try_fold(MassTable::new(self.mass_type), |table, m| {
                table.with_static_mod(m.residue, m.delta)
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinEntry {
    pub name: String,
    pub start_mass: f64,
    pub width: f64,
    pub records: u64,
}

impl BinEntry {
    pub fn end_mass(&self) -> f64 {
        self.start_mass + self.width
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub header: IndexHeader,
    #[serde(default)]
    pub bins: Vec<BinEntry>,
}

impl IndexFile for Manifest {
    type Error = ManifestError;

    fn read_from(reader: &mut impl BufRead, path: &str) -> Result<Self, Self::Error> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|e| Self::io_error(path, e))?;
        toml::from_str(&content).map_err(|source| ManifestError::Parse {
            path: path.to_string(),
            source,
        })
    }

    fn write_to(&self, writer: &mut impl Write, path: &str) -> Result<(), Self::Error> {
        let content = toml::to_string_pretty(self).map_err(|source| ManifestError::Serialize {
            path: path.to_string(),
            source,
        })?;
        writer
            .write_all(content.as_bytes())
            .map_err(|e| Self::io_error(path, e))
    }

    fn io_error(path: &str, source: io::Error) -> Self::Error {
        ManifestError::Io {
            path: path.to_string(),
            source,
        }
    }
}
