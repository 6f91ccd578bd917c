use super::enzyme::{CustomResidueRules, Digestion, Enzyme};
use crate::core::mass::table::MassType;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConstraintError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Unknown enzyme '{0}'")]
    UnknownEnzyme(String),
    #[error("Unknown digestion '{0}' (expected full-digest, partial-digest or non-specific-digest)")]
    UnknownDigestion(String),
    #[error("Unknown decoy format '{0}' (expected none, shuffle or reverse)")]
    UnknownDecoyFormat(String),
    #[error("Invalid custom enzyme rule '{0}' (expected e.g. '[KR]|{{P}}')")]
    InvalidCustomRule(String),
    #[error("The custom enzyme requires residue rules")]
    MissingCustomRules,
    #[error("Invalid length bounds: min {min}, max {max}")]
    InvalidLengthBounds { min: u32, max: u32 },
    #[error("Invalid mass bounds: min {min}, max {max}")]
    InvalidMassBounds { min: f64, max: f64 },
}

/// The rules a peptide must satisfy to be enumerated from a protein.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnzymeConstraint {
    enzyme: Enzyme,
    digestion: Digestion,
    min_length: u32,
    max_length: u32,
    min_mass: f64,
    max_mass: f64,
    mass_type: MassType,
    missed_cleavages_allowed: bool,
    custom_residue_sets: Option<CustomResidueRules>,
}

impl EnzymeConstraint {
    pub fn builder() -> EnzymeConstraintBuilder {
        EnzymeConstraintBuilder::new()
    }

    pub fn enzyme(&self) -> Enzyme {
        self.enzyme
    }
    pub fn digestion(&self) -> Digestion {
        self.digestion
    }
    pub fn min_length(&self) -> u32 {
        self.min_length
    }
    pub fn max_length(&self) -> u32 {
        self.max_length
    }
    pub fn min_mass(&self) -> f64 {
        self.min_mass
    }
    pub fn max_mass(&self) -> f64 {
        self.max_mass
    }
    pub fn mass_type(&self) -> MassType {
        self.mass_type
    }
    pub fn missed_cleavages_allowed(&self) -> bool {
        self.missed_cleavages_allowed
    }
    pub fn custom_residue_sets(&self) -> Option<&CustomResidueRules> {
        self.custom_residue_sets.as_ref()
    }

    /// Whether the bond between `pre` and `post` (absent at the protein end) is cleavable.
    #[inline]
    pub fn is_cleavage_site(&self, pre: u8, post: Option<u8>) -> bool {
        match self.enzyme.cleaves(pre, post) {
            Some(site) => site,
            None => self
                .custom_residue_sets
                .as_ref()
                .is_some_and(|rules| rules.permits(pre, post)),
        }
    }

    /// Report label, e.g. `trypsin-full-digest`.
    pub fn cleavage_label(&self) -> String {
        format!("{}-{}", self.enzyme, self.digestion)
    }

    pub fn length_in_range(&self, length: u32) -> bool {
        (self.min_length..=self.max_length).contains(&length)
    }

    pub fn mass_in_range(&self, mass: f64) -> bool {
        mass >= self.min_mass && mass <= self.max_mass
    }
}

#[derive(Default)]
pub struct EnzymeConstraintBuilder {
    enzyme: Option<Enzyme>,
    digestion: Option<Digestion>,
    min_length: Option<u32>,
    max_length: Option<u32>,
    min_mass: Option<f64>,
    max_mass: Option<f64>,
    mass_type: Option<MassType>,
    missed_cleavages_allowed: Option<bool>,
    custom_residue_sets: Option<CustomResidueRules>,
}

impl EnzymeConstraintBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enzyme(mut self, enzyme: Enzyme) -> Self {
        self.enzyme = Some(enzyme);
        self
    }
    pub fn digestion(mut self, digestion: Digestion) -> Self {
        self.digestion = Some(digestion);
        self
    }
    pub fn length_range(mut self, min: u32, max: u32) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }
    pub fn mass_range(mut self, min: f64, max: f64) -> Self {
        self.min_mass = Some(min);
        self.max_mass = Some(max);
        self
    }
    pub fn mass_type(mut self, mass_type: MassType) -> Self {
        self.mass_type = Some(mass_type);
        self
    }
    pub fn missed_cleavages(mut self, allowed: bool) -> Self {
        self.missed_cleavages_allowed = Some(allowed);
        self
    }
    pub fn custom_residue_sets(mut self, rules: CustomResidueRules) -> Self {
        self.custom_residue_sets = Some(rules);
        self
    }

    pub fn build(self) -> Result<EnzymeConstraint, ConstraintError> {
        let enzyme = self
            .enzyme
            .ok_or(ConstraintError::MissingParameter("enzyme"))?;
        let digestion = self
            .digestion
            .ok_or(ConstraintError::MissingParameter("digestion"))?;
        let min_length = self
            .min_length
            .ok_or(ConstraintError::MissingParameter("min_length"))?;
        let max_length = self
            .max_length
            .ok_or(ConstraintError::MissingParameter("max_length"))?;
        let min_mass = self
            .min_mass
            .ok_or(ConstraintError::MissingParameter("min_mass"))?;
        let max_mass = self
            .max_mass
            .ok_or(ConstraintError::MissingParameter("max_mass"))?;

        if min_length == 0 || min_length > max_length {
            return Err(ConstraintError::InvalidLengthBounds {
                min: min_length,
                max: max_length,
            });
        }
        if !(min_mass >= 0.0 && min_mass <= max_mass) {
            return Err(ConstraintError::InvalidMassBounds {
                min: min_mass,
                max: max_mass,
            });
        }
        if enzyme == Enzyme::Custom && self.custom_residue_sets.is_none() {
            return Err(ConstraintError::MissingCustomRules);
        }

        let missed_cleavages_allowed = self.missed_cleavages_allowed.unwrap_or(false);
        if digestion == Digestion::NonSpecific && !missed_cleavages_allowed {
            debug!("Non-specific digestion always allows missed cleavages; flag ignored");
        }

        Ok(EnzymeConstraint {
            enzyme,
            digestion,
            min_length,
            max_length,
            min_mass,
            max_mass,
            mass_type: self.mass_type.unwrap_or_default(),
            missed_cleavages_allowed,
            custom_residue_sets: self.custom_residue_sets,
        })
    }
}
