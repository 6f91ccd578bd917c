//! # Core Module
//!
//! Stateless building blocks of the peptide search pipeline.
//!
//! ## Overview
//!
//! Everything in this layer is either plain data or a pure function of its
//! inputs plus a reusable scratch workspace. Nothing here owns files beyond the
//! duration of a single call, which is what lets the [`crate::engine`] layer fan
//! work out per protein or per spectrum.
//!
//! ## Architecture
//!
//! - **Mass Arithmetic** ([`mass`]) - Residue mass tables, static modifications and constants
//! - **Data Models** ([`models`]) - Proteins, peptide candidates, index records and spectra
//! - **Digestion** ([`digest`]) - Enzyme rules, cleavage enumeration and decoy generation
//! - **Peak Encodings** ([`peaks`]) - Exact, sparse and diff theoretical peak sets
//! - **Scoring** ([`scoring`]) - Observed-spectrum caches and the preliminary Sp score
//! - **Persistence** ([`io`]) - Record streams, the index manifest and report writing

pub mod digest;
pub mod io;
pub mod mass;
pub mod models;
pub mod peaks;
pub mod scoring;
