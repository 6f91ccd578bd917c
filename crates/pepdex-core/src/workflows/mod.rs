//! # Workflows Module
//!
//! End-to-end procedures built on the engine: each one validates its inputs,
//! drives the engine components through named phases and reports progress.
//!
//! ## Overview
//!
//! - **Index Build** ([`build_index`]) - Digests a protein database, routes peptides
//!   into mass bins, sorts and deduplicates each bin and publishes the finished
//!   index directory atomically.
//! - **Index Listing** ([`read_index`]) - Streams every indexed peptide together
//!   with the proteins it occurs in.
//! - **Search** ([`search`]) - Scores observed spectra against the peptides inside
//!   each precursor window and writes ranked target and decoy reports.

pub mod build_index;
pub mod read_index;
pub mod search;
