use super::by_all::ByAll;
use super::by_sparse::BySparse;
use super::code::IonCharge;
use super::exceptions::PeakExceptions;
use super::make_all::MakeAll;
use super::context::PeakContext;
use super::series::symmetric_diff;
use super::workspace::{PeakOutput, TheoreticalPeakSet};

/// `MakeAll - ByAll`: the small signed correction stored per peptide.
#[derive(Debug, Clone, Default)]
pub struct Diff {
    make_all: MakeAll,
    by_all: ByAll,
    exact: PeakOutput,
    approx: PeakOutput,
}

impl Diff {
    pub fn new(ctx: PeakContext) -> Self {
        Self {
            make_all: MakeAll::new(ctx),
            by_all: ByAll::new(ctx),
            exact: PeakOutput::default(),
            approx: PeakOutput::default(),
        }
    }

    /// Runs the workspace to completion and delta-encodes the result.
    pub fn exceptions(&mut self) -> PeakExceptions {
        let mut out = PeakOutput::default();
        self.get_peaks(&mut out, None);
        PeakExceptions::from_peaks(&out.pos1, &out.neg1, &out.pos2, &out.neg2)
    }
}

impl TheoreticalPeakSet for Diff {
    fn clear(&mut self) {
        self.make_all.clear();
        self.by_all.clear();
        self.exact.clear();
        self.approx.clear();
    }

    fn add_b_ion(&mut self, mass: f64, charge: IonCharge) {
        self.make_all.add_b_ion(mass, charge);
        self.by_all.add_b_ion(mass, charge);
    }

    fn add_y_ion(&mut self, mass: f64, charge: IonCharge) {
        self.make_all.add_y_ion(mass, charge);
        self.by_all.add_y_ion(mass, charge);
    }

    fn get_peaks(&mut self, out: &mut PeakOutput, _exceptions: Option<&PeakExceptions>) {
        self.exact.clear();
        self.approx.clear();
        self.make_all.get_peaks(&mut self.exact, None);
        self.by_all.get_peaks(&mut self.approx, None);
        symmetric_diff(&self.exact.pos1, &self.approx.pos1, &mut out.pos1, &mut out.neg1);
        symmetric_diff(&self.exact.pos2, &self.approx.pos2, &mut out.pos2, &mut out.neg2);
    }
}

/// BySparse and Diff in one workspace, as a search would see them without an index.
#[derive(Debug, Clone, Default)]
pub struct Sparse {
    by_sparse: BySparse,
    diff: Diff,
}

impl Sparse {
    pub fn new(ctx: PeakContext) -> Self {
        Self {
            by_sparse: BySparse::new(ctx),
            diff: Diff::new(ctx),
        }
    }
}

impl TheoreticalPeakSet for Sparse {
    fn clear(&mut self) {
        self.by_sparse.clear();
        self.diff.clear();
    }

    fn add_b_ion(&mut self, mass: f64, charge: IonCharge) {
        self.by_sparse.add_b_ion(mass, charge);
        self.diff.add_b_ion(mass, charge);
    }

    fn add_y_ion(&mut self, mass: f64, charge: IonCharge) {
        self.by_sparse.add_y_ion(mass, charge);
        self.diff.add_y_ion(mass, charge);
    }

    fn get_peaks(&mut self, out: &mut PeakOutput, _exceptions: Option<&PeakExceptions>) {
        self.by_sparse.get_peaks(out, None);
        self.diff.get_peaks(out, None);
    }
}
