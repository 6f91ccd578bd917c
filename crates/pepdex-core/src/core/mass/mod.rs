//! # Mass Module
//!
//! Residue and small-molecule masses shared by every stage of the pipeline.
//!
//! ## Overview
//!
//! All mass arithmetic in pepdex flows through a [`table::MassTable`]: the
//! enumerator uses it to build cumulative peptide masses, the index builder uses
//! it to size its mass bins, and the peak-set workspaces use its monoisotopic
//! form to place fragment ions. The table is immutable once built and is shared
//! read-only across workers.
//!
//! - **Physical constants** ([`constants`]) - water, ammonia, proton and default bin width
//! - **Residue tables** ([`table`]) - monoisotopic/average residue masses with static modifications

pub mod constants;
pub mod table;
