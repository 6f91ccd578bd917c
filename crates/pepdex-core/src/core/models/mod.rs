//! # Core Models Module
//!
//! Plain data structures shared by every stage of the search pipeline.
//!
//! ## Overview
//!
//! The models are deliberately passive: they carry sequences, masses and provenance
//! but never perform digestion, binning or scoring themselves. They are designed to:
//!
//! - **Stay immutable after load** - proteins are read once and shared by reference
//! - **Serialize directly** - persisted types derive `serde` traits for the index formats
//! - **Stay cheap to copy** - per-peptide values are small `Copy` structs
//!
//! ## Key Components
//!
//! - [`protein`] - Proteins, the shared protein table and decoy naming conventions
//! - [`peptide`] - Candidate peptides, cleavage types and persisted index records
//! - [`spectrum`] - In-memory observed spectra handed to the search workflow
//!
//! ## Usage
//!
//! ```ignore
//! use pepdex::core::models::protein::{Protein, ProteinTable};
//!
//! let mut table = ProteinTable::new();
//! let idx = table.push(Protein::new("sp|P1|TEST", "MKAAPKR"));
//! assert_eq!(table.get(idx).map(|p| p.len()), Some(7));
//! ```

pub mod peptide;
pub mod protein;
pub mod spectrum;
