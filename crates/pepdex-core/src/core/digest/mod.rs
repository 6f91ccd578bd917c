//! # Digest Module
//!
//! In-silico protein digestion: which windows of a protein are valid peptides
//! under an enzyme, a digestion policy and length/mass bounds.
//!
//! ## Key Components
//!
//! - [`EnzymeConstraint`]: immutable run-wide rules, validated at construction.
//! - [`CleavagePositionTable`]: per-protein cumulative masses and site lists.
//! - [`CleavageEnumerator`]: the finite sequence of candidates for one protein.
//! - [`DecoyGenerator`]: shuffled or reversed decoys with their own protein records.

pub mod constraint;
pub mod decoy;
pub mod enumerator;
pub mod enzyme;
pub mod positions;

pub use constraint::{ConstraintError, EnzymeConstraint, EnzymeConstraintBuilder};
pub use decoy::{DecoyFormat, DecoyGenerator, DecoyPeptide};
pub use enumerator::{CleavageEnumerator, count_max_peptides};
pub use enzyme::{CustomResidueRules, Digestion, Enzyme, ResidueRule};
pub use positions::CleavagePositionTable;
