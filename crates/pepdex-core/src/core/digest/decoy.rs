use crate::core::models::peptide::PeptideCandidate;
use crate::core::models::protein::Protein;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

use super::constraint::ConstraintError;

const MAX_SHUFFLE_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoyFormat {
    #[default]
    None,
    Shuffle,
    Reverse,
}

impl fmt::Display for DecoyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DecoyFormat::None => "none",
            DecoyFormat::Shuffle => "shuffle",
            DecoyFormat::Reverse => "reverse",
        };
        f.write_str(name)
    }
}

impl FromStr for DecoyFormat {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(DecoyFormat::None),
            "shuffle" => Ok(DecoyFormat::Shuffle),
            "reverse" => Ok(DecoyFormat::Reverse),
            _ => Err(ConstraintError::UnknownDecoyFormat(s.to_string())),
        }
    }
}

/// A decoy candidate and the protein record it points into.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoyPeptide {
    pub protein: Protein,
    pub candidate: PeptideCandidate,
}

/// Produces one decoy per target peptide, keeping the C-terminal residue in place.
#[derive(Debug, Clone)]
pub struct DecoyGenerator {
    format: DecoyFormat,
    rng: StdRng,
}

impl DecoyGenerator {
    pub fn new(format: DecoyFormat, seed: u64) -> Self {
        Self {
            format,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn format(&self) -> DecoyFormat {
        self.format
    }

    pub fn is_enabled(&self) -> bool {
        self.format != DecoyFormat::None
    }

    /// Decoy residues for `target`, or `None` when no distinct decoy exists.
    pub fn decoy_sequence(&mut self, target: &str) -> Option<String> {
        let bytes = target.as_bytes();
        let (&last, body) = bytes.split_last()?;
        let mut residues = body.to_vec();
        match self.format {
            DecoyFormat::None => return None,
            DecoyFormat::Reverse => residues.reverse(),
            DecoyFormat::Shuffle => {
                for _ in 0..MAX_SHUFFLE_ATTEMPTS {
                    residues.shuffle(&mut self.rng);
                    if residues.as_slice() != body {
                        break;
                    }
                }
            }
        }
        if residues.as_slice() == body {
            return None;
        }
        residues.push(last);
        String::from_utf8(residues).ok()
    }

    /// Builds the decoy for `target`, whose record will be stored at `decoy_protein_index`.
    pub fn make_decoy(
        &mut self,
        target: &PeptideCandidate,
        protein: &Protein,
        decoy_protein_index: u32,
    ) -> Option<DecoyPeptide> {
        let peptide = target.sequence(protein)?;
        let Some(decoy) = self.decoy_sequence(peptide) else {
            trace!(peptide, "No distinct decoy; skipping");
            return None;
        };
        let start = target.start as usize;
        let n_flank = start
            .checked_sub(1)
            .and_then(|idx| protein.residues().get(idx..start))
            .unwrap_or("");
        let end = target.end();
        let c_flank = if end < protein.len() {
            protein.residues().get(end..end + 1).unwrap_or("")
        } else {
            ""
        };
        let record = Protein::decoy(
            target.protein_id,
            protein.id(),
            n_flank,
            &decoy,
            c_flank,
            peptide,
        );
        Some(DecoyPeptide {
            protein: record,
            candidate: PeptideCandidate {
                protein_id: decoy_protein_index,
                start: n_flank.len() as u32,
                is_decoy: true,
                ..*target
            },
        })
    }
}
