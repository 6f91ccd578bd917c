use super::constants::{H2O_AVERAGE, H2O_MONO};
use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

static MONO_RESIDUE_MASSES: phf::Map<char, f64> = phf_map! {
    'A' => 71.037_113_8,
    'R' => 156.101_111,
    'N' => 114.042_927,
    'D' => 115.026_943,
    'C' => 103.009_185,
    'E' => 129.042_593,
    'Q' => 128.058_578,
    'G' => 57.021_463_7,
    'H' => 137.058_912,
    'I' => 113.084_064,
    'L' => 113.084_064,
    'K' => 128.094_963,
    'M' => 131.040_485,
    'F' => 147.068_414,
    'P' => 97.052_763_9,
    'S' => 87.032_028_4,
    'T' => 101.047_679,
    'W' => 186.079_313,
    'Y' => 163.063_329,
    'V' => 99.068_413_9,
    'U' => 150.953_636,
    'O' => 237.147_727,
};

static AVERAGE_RESIDUE_MASSES: phf::Map<char, f64> = phf_map! {
    'A' => 71.0788,
    'R' => 156.1875,
    'N' => 114.1038,
    'D' => 115.0886,
    'C' => 103.1388,
    'E' => 129.1155,
    'Q' => 128.1307,
    'G' => 57.0519,
    'H' => 137.1411,
    'I' => 113.1594,
    'L' => 113.1594,
    'K' => 128.1741,
    'M' => 131.1926,
    'F' => 147.1766,
    'P' => 97.1167,
    'S' => 87.0782,
    'T' => 101.1051,
    'W' => 186.2132,
    'Y' => 163.1760,
    'V' => 99.1326,
    'U' => 150.0379,
    'O' => 237.2982,
};

const ALPHABET_SIZE: usize = 26;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MassType {
    #[default]
    Mono,
    Average,
}

impl MassType {
    pub fn water(self) -> f64 {
        match self {
            MassType::Mono => H2O_MONO,
            MassType::Average => H2O_AVERAGE,
        }
    }

    fn residue_map(self) -> &'static phf::Map<char, f64> {
        match self {
            MassType::Mono => &MONO_RESIDUE_MASSES,
            MassType::Average => &AVERAGE_RESIDUE_MASSES,
        }
    }
}

impl fmt::Display for MassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MassType::Mono => write!(f, "mono"),
            MassType::Average => write!(f, "average"),
        }
    }
}

impl FromStr for MassType {
    type Err = MassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mono" | "monoisotopic" => Ok(MassType::Mono),
            "average" | "avg" => Ok(MassType::Average),
            _ => Err(MassError::UnknownMassType(s.to_string())),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MassError {
    #[error("Unknown mass type '{0}' (expected 'mono' or 'average')")]
    UnknownMassType(String),
    #[error("Residue '{0}' has no defined mass and cannot carry a modification")]
    UnknownResidue(char),
}

/// Residue masses for one mass type, with any static modifications folded in.
///
/// Lookups are by ASCII residue byte so that the enumerator can walk protein
/// sequences without decoding. Residues without a defined mass (for example
/// `X`, `B`, `Z`) return `None`; callers treat them as uncleavable gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct MassTable {
    mass_type: MassType,
    base: [Option<f64>; ALPHABET_SIZE],
    static_mods: [f64; ALPHABET_SIZE],
}

impl MassTable {
    pub fn new(mass_type: MassType) -> Self {
        let mut base = [None; ALPHABET_SIZE];
        for (&residue, &mass) in mass_type.residue_map().entries() {
            base[(residue as u8 - b'A') as usize] = Some(mass);
        }
        Self {
            mass_type,
            base,
            static_mods: [0.0; ALPHABET_SIZE],
        }
    }

    /// Adds a fixed mass delta to every occurrence of `residue`.
    ///
    /// Repeated calls for the same residue accumulate.
    pub fn with_static_mod(mut self, residue: char, delta: f64) -> Result<Self, MassError> {
        let slot = Self::slot(residue as u8).ok_or(MassError::UnknownResidue(residue))?;
        if self.base[slot].is_none() {
            return Err(MassError::UnknownResidue(residue));
        }
        self.static_mods[slot] += delta;
        Ok(self)
    }

    /// Returns a table with the same static modifications but another mass type.
    pub fn with_mass_type(&self, mass_type: MassType) -> Self {
        let mut table = Self::new(mass_type);
        table.static_mods = self.static_mods;
        table
    }

    pub fn mass_type(&self) -> MassType {
        self.mass_type
    }

    pub fn water(&self) -> f64 {
        self.mass_type.water()
    }

    #[inline]
    pub fn residue_mass(&self, residue: u8) -> Option<f64> {
        let slot = Self::slot(residue)?;
        self.base[slot].map(|mass| mass + self.static_mods[slot])
    }

    /// Static modification delta applied to `residue`, if any.
    pub fn static_mod(&self, residue: u8) -> Option<f64> {
        let slot = Self::slot(residue)?;
        let delta = self.static_mods[slot];
        (delta != 0.0).then_some(delta)
    }

    /// Every non-zero static modification as `(residue, delta)`, in alphabetical order.
    pub fn static_mods(&self) -> impl Iterator<Item = (char, f64)> + '_ {
        self.static_mods
            .iter()
            .enumerate()
            .filter(|(_, delta)| **delta != 0.0)
            .map(|(slot, &delta)| ((b'A' + slot as u8) as char, delta))
    }

    /// Neutral peptide mass (residues plus one water), or `None` if any residue is unknown.
    pub fn peptide_mass(&self, sequence: &[u8]) -> Option<f64> {
        sequence
            .iter()
            .try_fold(self.water(), |total, &r| Some(total + self.residue_mass(r)?))
    }

    pub fn lightest_residue(&self) -> f64 {
        self.defined_masses().fold(f64::INFINITY, f64::min)
    }

    pub fn heaviest_residue(&self) -> f64 {
        self.defined_masses().fold(f64::NEG_INFINITY, f64::max)
    }

    fn defined_masses(&self) -> impl Iterator<Item = f64> + '_ {
        self.base
            .iter()
            .zip(self.static_mods.iter())
            .filter_map(|(mass, delta)| mass.map(|m| m + delta))
    }

    #[inline]
    fn slot(residue: u8) -> Option<usize> {
        let upper = residue.to_ascii_uppercase();
        upper
            .is_ascii_uppercase()
            .then(|| (upper - b'A') as usize)
    }
}

impl Default for MassTable {
    fn default() -> Self {
        Self::new(MassType::Mono)
    }
}
