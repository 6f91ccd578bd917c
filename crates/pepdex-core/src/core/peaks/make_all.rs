use super::code::{IonCharge, IonSeries, PeakType, TheoreticalPeak};
use super::context::{IonOffset, PeakContext};
use super::exceptions::PeakExceptions;
use super::series::{OrderedPeakSets, remove_dups};
use super::workspace::{PeakOutput, TheoreticalPeakSet};

/// Exact encoding: every loss, flanking and primary peak, one peak per bin.
#[derive(Debug, Clone, Default)]
pub struct MakeAll {
    ctx: PeakContext,
    sets: OrderedPeakSets,
}

impl MakeAll {
    pub fn new(ctx: PeakContext) -> Self {
        Self {
            ctx,
            sets: OrderedPeakSets::default(),
        }
    }

    fn add_ion(&mut self, mass: f64, charge: IonCharge, series: IonSeries, losses: &[IonOffset]) {
        let ctx = self.ctx;
        let dest = self.sets.series_mut(series, charge);
        for &loss in losses {
            dest.push(TheoreticalPeak::new(
                ctx.ion_bin(mass, charge, loss),
                PeakType::Loss,
            ));
        }
        let bin = ctx.ion_bin(mass, charge, IonOffset::primary(series));
        if ctx.flanks {
            dest.push(TheoreticalPeak::new(bin - 1, PeakType::Flanking));
        }
        dest.push(TheoreticalPeak::new(bin, PeakType::Primary));
        if ctx.flanks {
            dest.push(TheoreticalPeak::new(bin + 1, PeakType::Flanking));
        }
    }
}

impl TheoreticalPeakSet for MakeAll {
    fn clear(&mut self) {
        self.sets.clear();
    }

    fn add_b_ion(&mut self, mass: f64, charge: IonCharge) {
        self.add_ion(
            mass,
            charge,
            IonSeries::B,
            &[IonOffset::A, IonOffset::BH2O, IonOffset::BNH3],
        );
    }

    fn add_y_ion(&mut self, mass: f64, charge: IonCharge) {
        self.add_ion(
            mass,
            charge,
            IonSeries::Y,
            &[IonOffset::YH2O, IonOffset::YNH3],
        );
    }

    fn get_peaks(&mut self, out: &mut PeakOutput, _exceptions: Option<&PeakExceptions>) {
        self.sets.merge(None, &self.ctx);
        remove_dups(self.sets.charge1(), &self.ctx, &mut out.pos1);
        remove_dups(self.sets.combined(), &self.ctx, &mut out.pos2);
    }
}
