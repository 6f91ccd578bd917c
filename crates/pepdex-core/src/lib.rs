//! # pepdex Core Library
//!
//! The search core of a peptide-spectrum matching engine: in-silico digestion,
//! mass-binned on-disk peptide indexes, compact theoretical peak encodings and
//! target/decoy match ranking.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless models (`Protein`, `PeptideCandidate`),
//!   mass arithmetic, the cleavage enumerator, the peak-set family and the record
//!   formats. Every type here can be unit tested without touching the file system.
//!
//! - **[`engine`]: The Logic Core.** Stateful components that own resources for the
//!   length of a run: the `IndexBuilder` with its lazily opened bin files, the
//!   `IndexReader`, the per-spectrum `MatchRanker`, configuration and progress.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures (`build_index`,
//!   `read_index`, `search`) that tie the engine and the core together and report
//!   progress to the caller.

pub mod core;
pub mod engine;
pub mod workflows;
