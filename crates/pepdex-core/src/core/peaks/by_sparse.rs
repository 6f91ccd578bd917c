use super::code::{IonCharge, IonSeries, TheoreticalPeak, TheoreticalPeakArr};
use super::context::PeakContext;
use super::exceptions::{PeakExceptions, copy_exceptions};
use super::series::{OrderedPeakSets, copy_sorted, copy_unordered};
use super::workspace::{PeakOutput, TheoreticalPeakSet};

fn combined_peak(ctx: &PeakContext, mass: f64, charge: IonCharge, series: IonSeries) -> TheoreticalPeak {
    let (bin, case_a) = ctx.primary_bin(mass, charge, series);
    TheoreticalPeak::new(bin, series.combined_type(charge, case_a))
}

fn copy_negative_exceptions(exceptions: &PeakExceptions, ctx: &PeakContext, out: &mut PeakOutput) {
    copy_exceptions(&exceptions.neg_peak1, ctx, &mut out.neg1);
    copy_exceptions(&exceptions.neg_peak2, ctx, &mut out.neg2);
}

/// One combined code per ion, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct BySparse {
    ctx: PeakContext,
    peaks: [TheoreticalPeakArr; 2],
}

impl BySparse {
    pub fn new(ctx: PeakContext) -> Self {
        Self {
            ctx,
            peaks: Default::default(),
        }
    }

    /// Raw per-charge codes without any cutoff or exceptions applied.
    pub fn raw_peaks(&self, charge: IonCharge) -> &[TheoreticalPeak] {
        &self.peaks[charge.slot()]
    }
}

impl TheoreticalPeakSet for BySparse {
    fn clear(&mut self) {
        self.peaks[0].clear();
        self.peaks[1].clear();
    }

    fn add_b_ion(&mut self, mass: f64, charge: IonCharge) {
        let peak = combined_peak(&self.ctx, mass, charge, IonSeries::B);
        self.peaks[charge.slot()].push(peak);
    }

    fn add_y_ion(&mut self, mass: f64, charge: IonCharge) {
        let peak = combined_peak(&self.ctx, mass, charge, IonSeries::Y);
        self.peaks[charge.slot()].push(peak);
    }

    fn get_peaks(&mut self, out: &mut PeakOutput, exceptions: Option<&PeakExceptions>) {
        copy_unordered(&self.peaks[0], &self.ctx, &mut out.pos1);
        copy_unordered(&self.peaks[0], &self.ctx, &mut out.pos2);
        copy_unordered(&self.peaks[1], &self.ctx, &mut out.pos2);
        let Some(exceptions) = exceptions else {
            return;
        };
        copy_exceptions(&exceptions.peak1, &self.ctx, &mut out.pos1);
        copy_exceptions(&exceptions.peak2, &self.ctx, &mut out.pos2);
        copy_negative_exceptions(exceptions, &self.ctx, out);
    }
}

/// Same codes as [`BySparse`], emitted in ascending order.
#[derive(Debug, Clone, Default)]
pub struct BySparseOrdered {
    ctx: PeakContext,
    sets: OrderedPeakSets,
}

impl BySparseOrdered {
    pub fn new(ctx: PeakContext) -> Self {
        Self {
            ctx,
            sets: OrderedPeakSets::default(),
        }
    }
}

impl TheoreticalPeakSet for BySparseOrdered {
    fn clear(&mut self) {
        self.sets.clear();
    }

    fn add_b_ion(&mut self, mass: f64, charge: IonCharge) {
        let peak = combined_peak(&self.ctx, mass, charge, IonSeries::B);
        self.sets.series_mut(IonSeries::B, charge).push(peak);
    }

    fn add_y_ion(&mut self, mass: f64, charge: IonCharge) {
        let peak = combined_peak(&self.ctx, mass, charge, IonSeries::Y);
        self.sets.series_mut(IonSeries::Y, charge).push(peak);
    }

    fn get_peaks(&mut self, out: &mut PeakOutput, exceptions: Option<&PeakExceptions>) {
        self.sets.merge(exceptions, &self.ctx);
        copy_sorted(self.sets.charge1(), &self.ctx, &mut out.pos1);
        copy_sorted(self.sets.combined(), &self.ctx, &mut out.pos2);
        if let Some(exceptions) = exceptions {
            copy_negative_exceptions(exceptions, &self.ctx, out);
        }
    }
}
