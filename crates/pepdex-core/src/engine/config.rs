use crate::core::digest::{DecoyFormat, EnzymeConstraint};
use crate::core::mass::constants::MAX_OBSERVED_MZ;
use crate::core::mass::table::MassTable;
use crate::core::peaks::variant::PeakSetKind;
use thiserror::Error;

pub const DEFAULT_BIN_BUFFER_CAPACITY: usize = 2500;
/// Target mass span of one index bin, in Da.
pub const DEFAULT_INDEX_BIN_WIDTH: f64 = 100.0;
pub const DEFAULT_DECOY_SEED: u64 = 1;
pub const DEFAULT_TOP_N: usize = 5;
/// Half-width of the precursor mass window, in Da.
pub const DEFAULT_PRECURSOR_WINDOW: f64 = 3.0;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexConfig {
    pub constraint: EnzymeConstraint,
    pub masses: MassTable,
    pub bin_width: f64,
    pub bin_buffer_capacity: usize,
    pub is_unique: bool,
    pub store_peak_diffs: bool,
    pub decoys: DecoyFormat,
    pub seed: u64,
}

#[derive(Default)]
pub struct IndexConfigBuilder {
    constraint: Option<EnzymeConstraint>,
    masses: Option<MassTable>,
    bin_width: Option<f64>,
    bin_buffer_capacity: Option<usize>,
    is_unique: Option<bool>,
    store_peak_diffs: Option<bool>,
    decoys: Option<DecoyFormat>,
    seed: Option<u64>,
}

impl IndexConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constraint(mut self, constraint: EnzymeConstraint) -> Self {
        self.constraint = Some(constraint);
        self
    }
    pub fn masses(mut self, masses: MassTable) -> Self {
        self.masses = Some(masses);
        self
    }
    pub fn bin_width(mut self, width: f64) -> Self {
        self.bin_width = Some(width);
        self
    }
    pub fn bin_buffer_capacity(mut self, capacity: usize) -> Self {
        self.bin_buffer_capacity = Some(capacity);
        self
    }
    pub fn is_unique(mut self, unique: bool) -> Self {
        self.is_unique = Some(unique);
        self
    }
    pub fn store_peak_diffs(mut self, store: bool) -> Self {
        self.store_peak_diffs = Some(store);
        self
    }
    pub fn decoys(mut self, format: DecoyFormat) -> Self {
        self.decoys = Some(format);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<IndexConfig, ConfigError> {
        let constraint = self
            .constraint
            .ok_or(ConfigError::MissingParameter("constraint"))?;
        let bin_width = self.bin_width.unwrap_or(DEFAULT_INDEX_BIN_WIDTH);
        if !(bin_width > 0.0 && bin_width.is_finite()) {
            return Err(ConfigError::InvalidParameter {
                name: "bin_width",
                reason: format!("must be a positive number of daltons, got {bin_width}"),
            });
        }
        let bin_buffer_capacity = self
            .bin_buffer_capacity
            .unwrap_or(DEFAULT_BIN_BUFFER_CAPACITY);
        if bin_buffer_capacity == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "bin_buffer_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        let masses = self
            .masses
            .map(|m| m.with_mass_type(constraint.mass_type()))
            .unwrap_or_else(|| MassTable::new(constraint.mass_type()));

        Ok(IndexConfig {
            constraint,
            masses,
            bin_width,
            bin_buffer_capacity,
            is_unique: self.is_unique.unwrap_or(true),
            store_peak_diffs: self.store_peak_diffs.unwrap_or(false),
            decoys: self.decoys.unwrap_or_default(),
            seed: self.seed.unwrap_or(DEFAULT_DECOY_SEED),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub constraint: EnzymeConstraint,
    pub precursor_window: f64,
    pub top_n: usize,
    pub compute_sp: bool,
    /// Encoding candidates are scored with; sparse kinds are patched with exceptions.
    pub peak_set: PeakSetKind,
    /// Observed peaks above this m/z are ignored.
    pub max_mz: Option<f64>,
}

#[derive(Default)]
pub struct SearchConfigBuilder {
    constraint: Option<EnzymeConstraint>,
    precursor_window: Option<f64>,
    top_n: Option<usize>,
    compute_sp: Option<bool>,
    peak_set: Option<PeakSetKind>,
    max_mz: Option<f64>,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constraint(mut self, constraint: EnzymeConstraint) -> Self {
        self.constraint = Some(constraint);
        self
    }
    pub fn precursor_window(mut self, window: f64) -> Self {
        self.precursor_window = Some(window);
        self
    }
    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }
    pub fn compute_sp(mut self, enabled: bool) -> Self {
        self.compute_sp = Some(enabled);
        self
    }
    pub fn peak_set(mut self, kind: PeakSetKind) -> Self {
        self.peak_set = Some(kind);
        self
    }
    pub fn max_mz(mut self, mz: f64) -> Self {
        self.max_mz = Some(mz);
        self
    }

    pub fn build(self) -> Result<SearchConfig, ConfigError> {
        let constraint = self
            .constraint
            .ok_or(ConfigError::MissingParameter("constraint"))?;
        let precursor_window = self.precursor_window.unwrap_or(DEFAULT_PRECURSOR_WINDOW);
        if !(precursor_window >= 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "precursor_window",
                reason: format!("must be non-negative, got {precursor_window}"),
            });
        }
        let top_n = self.top_n.unwrap_or(DEFAULT_TOP_N);
        if top_n == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "top_n",
                reason: "must be at least 1".to_string(),
            });
        }
        let peak_set = self.peak_set.unwrap_or_default();
        if peak_set == PeakSetKind::Diff {
            return Err(ConfigError::InvalidParameter {
                name: "peak_set",
                reason: "diff is a correction and cannot score candidates on its own".to_string(),
            });
        }
        if let Some(mz) = self.max_mz {
            if !(mz > 0.0 && mz <= MAX_OBSERVED_MZ) {
                return Err(ConfigError::InvalidParameter {
                    name: "max_mz",
                    reason: format!("must be in (0, {MAX_OBSERVED_MZ}], got {mz}"),
                });
            }
        }
        Ok(SearchConfig {
            constraint,
            precursor_window,
            top_n,
            compute_sp: self.compute_sp.unwrap_or(false),
            peak_set,
            max_mz: self.max_mz,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::digest::{Digestion, Enzyme};
    use crate::core::mass::table::MassType;

    fn constraint(mass_type: MassType) -> EnzymeConstraint {
        EnzymeConstraint::builder()
            .enzyme(Enzyme::Trypsin)
            .digestion(Digestion::Full)
            .length_range(6, 50)
            .mass_range(200.0, 7200.0)
            .mass_type(mass_type)
            .build()
            .unwrap()
    }

    #[test]
    fn index_config_requires_a_constraint() {
        assert_eq!(
            IndexConfigBuilder::new().build(),
            Err(ConfigError::MissingParameter("constraint"))
        );
    }

    #[test]
    fn index_config_defaults() {
        let config = IndexConfigBuilder::new()
            .constraint(constraint(MassType::Mono))
            .build()
            .unwrap();
        assert_eq!(config.bin_buffer_capacity, DEFAULT_BIN_BUFFER_CAPACITY);
        assert_eq!(config.bin_width, DEFAULT_INDEX_BIN_WIDTH);
        assert!(config.is_unique);
        assert!(!config.store_peak_diffs);
        assert_eq!(config.decoys, DecoyFormat::None);
    }

    #[test]
    fn index_masses_follow_the_constraint_mass_type() {
        let masses = MassTable::default().with_static_mod('C', 57.02146).unwrap();
        let config = IndexConfigBuilder::new()
            .constraint(constraint(MassType::Average))
            .masses(masses)
            .build()
            .unwrap();
        assert_eq!(config.masses.mass_type(), MassType::Average);
        assert_eq!(config.masses.static_mod(b'C'), Some(57.02146));
    }

    #[test]
    fn zero_buffer_capacity_is_rejected() {
        let result = IndexConfigBuilder::new()
            .constraint(constraint(MassType::Mono))
            .bin_buffer_capacity(0)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter {
                name: "bin_buffer_capacity",
                ..
            })
        ));
    }

    #[test]
    fn search_config_validates_window_and_top_n() {
        let base = || SearchConfigBuilder::new().constraint(constraint(MassType::Mono));
        assert!(base().precursor_window(-1.0).build().is_err());
        assert!(base().top_n(0).build().is_err());
        let config = base().build().unwrap();
        assert_eq!(config.top_n, DEFAULT_TOP_N);
        assert_eq!(config.precursor_window, DEFAULT_PRECURSOR_WINDOW);
        assert!(!config.compute_sp);
        assert_eq!(config.peak_set, PeakSetKind::BySparse);
    }

    #[test]
    fn max_mz_must_be_finite_and_within_the_observed_range() {
        let base = || SearchConfigBuilder::new().constraint(constraint(MassType::Mono));
        for mz in [0.0, -1.0, f64::NAN, f64::INFINITY, 3.0e9] {
            assert!(
                matches!(
                    base().max_mz(mz).build(),
                    Err(ConfigError::InvalidParameter { name: "max_mz", .. })
                ),
                "{mz} accepted"
            );
        }
        assert_eq!(base().max_mz(2000.0).build().unwrap().max_mz, Some(2000.0));
    }

    #[test]
    fn diff_alone_cannot_score() {
        let result = SearchConfigBuilder::new()
            .constraint(constraint(MassType::Mono))
            .peak_set(PeakSetKind::Diff)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter {
                name: "peak_set",
                ..
            })
        ));
    }
}
