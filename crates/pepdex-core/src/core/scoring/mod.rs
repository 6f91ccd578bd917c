//! # Scoring Module
//!
//! Minimal scoring primitives that close the search loop: a binned observed
//! spectrum with its shifted cache for sparse peak codes, and the SEQUEST-style
//! preliminary score.

pub mod observed;
pub mod sp;

pub use observed::ObservedPeakSet;
pub use sp::{SpScoreData, SpScorer};
