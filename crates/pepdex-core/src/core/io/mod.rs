//! Persistence formats of an index directory and the tab-delimited report.
//!
//! Bin files and the protein table are typed record streams ([`records`]), the
//! build parameters live in a TOML manifest ([`manifest`]) and matches are
//! written through a shared column table ([`report`]). Whole-file components
//! share the [`traits::IndexFile`] interface.

pub mod manifest;
pub mod proteins;
pub mod records;
pub mod report;
pub mod traits;
