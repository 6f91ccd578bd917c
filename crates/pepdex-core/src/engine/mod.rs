//! # Engine Module
//!
//! Stateful components that own resources for the length of one run: index
//! construction, index access and per-spectrum match ranking.
//!
//! ## Overview
//!
//! The engine sits between the stateless [`crate::core`] layer and the
//! [`crate::workflows`]. It turns streams of enumerated peptides into a sorted,
//! mass-binned index directory, reads such directories back with compatibility
//! and corruption checks, and selects the reported matches of a spectrum.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Validated index and search parameters built through builders
//! - **Bin Layout** ([`bins`]) - Partition of the reachable mass range into fixed-width bins
//! - **Index Builder** ([`builder`]) - Buffered, lazily opened bin writers and the per-bin sort
//! - **Index Reader** ([`reader`]) - Manifest validation and ascending-mass range streams
//! - **Match Ranker** ([`ranker`]) - Top-N target/decoy selection, delta-cn and Sp ranks
//! - **Progress Monitoring** ([`progress`]) - Phase and task events for front ends
//! - **Error Handling** ([`error`]) - The umbrella error type of every engine operation

pub mod bins;
pub mod builder;
pub mod config;
pub mod error;
pub mod progress;
pub mod ranker;
pub mod reader;
