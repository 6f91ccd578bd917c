use super::protein::{Protein, ProteinTable};
use crate::core::peaks::exceptions::PeakExceptions;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which ends of a peptide coincide with enzyme cleavage sites (or protein termini).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CleavageType {
    Full,
    NTerm,
    CTerm,
    NonSpecific,
}

impl CleavageType {
    pub fn from_ends(n_enzymatic: bool, c_enzymatic: bool) -> Self {
        match (n_enzymatic, c_enzymatic) {
            (true, true) => CleavageType::Full,
            (true, false) => CleavageType::NTerm,
            (false, true) => CleavageType::CTerm,
            (false, false) => CleavageType::NonSpecific,
        }
    }
}

impl fmt::Display for CleavageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CleavageType::Full => "full",
            CleavageType::NTerm => "n-term",
            CleavageType::CTerm => "c-term",
            CleavageType::NonSpecific => "non-specific",
        };
        f.write_str(label)
    }
}

/// One enumerated peptide: a window into a protein plus its neutral mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeptideCandidate {
    pub protein_id: u32,
    pub start: u32,
    pub length: u32,
    pub mass: f64,
    pub is_decoy: bool,
    pub cleavage: CleavageType,
}

impl PeptideCandidate {
    pub fn end(&self) -> usize {
        (self.start + self.length) as usize
    }

    pub fn sequence<'a>(&self, protein: &'a Protein) -> Option<&'a str> {
        protein.subsequence(self.start as usize, self.length as usize)
    }
}

/// One occurrence of an indexed peptide in the protein table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeptideSource {
    pub protein_index: u32,
    pub cleavage: CleavageType,
    pub start: u32,
}

/// Persisted bin record: a peptide with every place it occurs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedPeptide {
    pub length: u32,
    pub mass: f64,
    pub is_decoy: bool,
    pub sources: Vec<PeptideSource>,
    pub exceptions: Option<PeakExceptions>,
}

impl IndexedPeptide {
    pub fn from_candidate(candidate: &PeptideCandidate) -> Self {
        Self {
            length: candidate.length,
            mass: candidate.mass,
            is_decoy: candidate.is_decoy,
            sources: vec![PeptideSource {
                protein_index: candidate.protein_id,
                cleavage: candidate.cleavage,
                start: candidate.start,
            }],
            exceptions: None,
        }
    }

    pub fn primary_source(&self) -> Option<&PeptideSource> {
        self.sources.first()
    }

    /// Sequence read through the first source, or `None` if it points outside the table.
    pub fn sequence<'a>(&self, proteins: &'a ProteinTable) -> Option<&'a str> {
        let source = self.primary_source()?;
        proteins
            .get(source.protein_index)?
            .subsequence(source.start as usize, self.length as usize)
    }
}
