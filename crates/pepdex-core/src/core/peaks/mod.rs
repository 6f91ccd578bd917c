//! # Peaks Module
//!
//! Theoretical peak-set encodings for candidate peptides.
//!
//! ## Overview
//!
//! Every encoding implements [`TheoreticalPeakSet`]: a reusable workspace that
//! receives b-ion and y-ion fragment masses and writes packed peak codes for
//! charge 1 and charge 2 into caller-owned arrays.
//!
//! - [`MakeAll`] is exact: every loss, flanking and primary peak, one per bin.
//! - [`BySparse`] / [`BySparseOrdered`] write one combined code per ion.
//! - [`ByAll`] expands combined codes back into explicit peaks.
//! - [`Diff`] is `MakeAll - ByAll`, small enough to store per peptide.
//!
//! Scoring a sparse encoding against a shifted spectrum cache and adding the
//! score of the stored diff reproduces the exact score without regenerating
//! [`MakeAll`] at search time.

pub mod by_all;
pub mod by_sparse;
pub mod code;
pub mod context;
pub mod diff;
pub mod exceptions;
pub mod fragments;
pub mod make_all;
mod series;
pub mod variant;
pub mod workspace;

pub use by_all::ByAll;
pub use by_sparse::{BySparse, BySparseOrdered};
pub use code::{IonCharge, PeakType, TheoreticalPeak, TheoreticalPeakArr};
pub use context::PeakContext;
pub use diff::{Diff, Sparse};
pub use exceptions::PeakExceptions;
pub use make_all::MakeAll;
pub use variant::{PeakSetKind, PeakSetVariant};
pub use workspace::{PeakOutput, TheoreticalPeakSet};
