use super::by_all::ByAll;
use super::by_sparse::{BySparse, BySparseOrdered};
use super::code::IonCharge;
use super::context::PeakContext;
use super::diff::Diff;
use super::exceptions::PeakExceptions;
use super::make_all::MakeAll;
use super::workspace::{PeakOutput, TheoreticalPeakSet};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PeakSetKind {
    MakeAll,
    #[default]
    BySparse,
    BySparseOrdered,
    ByAll,
    Diff,
}

/// Tagged union over the peak encodings, for callers that pick one at run time.
#[derive(Debug, Clone)]
pub enum PeakSetVariant {
    MakeAll(MakeAll),
    BySparse(BySparse),
    BySparseOrdered(BySparseOrdered),
    ByAll(ByAll),
    Diff(Diff),
}

impl PeakSetVariant {
    pub fn new(kind: PeakSetKind, ctx: PeakContext) -> Self {
        match kind {
            PeakSetKind::MakeAll => Self::MakeAll(MakeAll::new(ctx)),
            PeakSetKind::BySparse => Self::BySparse(BySparse::new(ctx)),
            PeakSetKind::BySparseOrdered => Self::BySparseOrdered(BySparseOrdered::new(ctx)),
            PeakSetKind::ByAll => Self::ByAll(ByAll::new(ctx)),
            PeakSetKind::Diff => Self::Diff(Diff::new(ctx)),
        }
    }

    pub fn kind(&self) -> PeakSetKind {
        match self {
            Self::MakeAll(_) => PeakSetKind::MakeAll,
            Self::BySparse(_) => PeakSetKind::BySparse,
            Self::BySparseOrdered(_) => PeakSetKind::BySparseOrdered,
            Self::ByAll(_) => PeakSetKind::ByAll,
            Self::Diff(_) => PeakSetKind::Diff,
        }
    }

    /// Whether stored exceptions are needed to reach an exact score.
    pub fn is_approximate(&self) -> bool {
        matches!(self, Self::BySparse(_) | Self::BySparseOrdered(_))
    }

    fn inner(&mut self) -> &mut dyn TheoreticalPeakSet {
        match self {
            Self::MakeAll(w) => w,
            Self::BySparse(w) => w,
            Self::BySparseOrdered(w) => w,
            Self::ByAll(w) => w,
            Self::Diff(w) => w,
        }
    }
}

impl TheoreticalPeakSet for PeakSetVariant {
    fn clear(&mut self) {
        self.inner().clear();
    }

    fn add_b_ion(&mut self, mass: f64, charge: IonCharge) {
        self.inner().add_b_ion(mass, charge);
    }

    fn add_y_ion(&mut self, mass: f64, charge: IonCharge) {
        self.inner().add_y_ion(mass, charge);
    }

    fn get_peaks(&mut self, out: &mut PeakOutput, exceptions: Option<&PeakExceptions>) {
        self.inner().get_peaks(out, exceptions);
    }
}
