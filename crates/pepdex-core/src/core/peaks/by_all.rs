use super::code::{IonCharge, IonSeries, PeakType, TheoreticalPeak};
use super::context::{
    BIN_SHIFT_A_ION, BIN_SHIFT_H2O, BIN_SHIFT_NH3_CHG_1, BIN_SHIFT_NH3_CHG_2_CASE_B, PeakContext,
};
use super::exceptions::PeakExceptions;
use super::series::{OrderedPeakSets, copy_sorted};
use super::workspace::{PeakOutput, TheoreticalPeakSet};

/// Expands every combined code into its explicit peaks, duplicates included.
///
/// Loss peaks sit at fixed bin shifts from the primary bin, which is what
/// makes this encoding approximate.
#[derive(Debug, Clone, Default)]
pub struct ByAll {
    ctx: PeakContext,
    sets: OrderedPeakSets,
}

impl ByAll {
    pub fn new(ctx: PeakContext) -> Self {
        Self {
            ctx,
            sets: OrderedPeakSets::default(),
        }
    }

    fn add_ion(&mut self, mass: f64, charge: IonCharge, series: IonSeries) {
        let ctx = self.ctx;
        let (bin, case_a) = ctx.primary_bin(mass, charge, series);
        let slot = charge.slot();
        let dest = self.sets.series_mut(series, charge);

        if series == IonSeries::B {
            dest.push(TheoreticalPeak::new(bin - BIN_SHIFT_A_ION[slot], PeakType::Loss));
        }
        dest.push(TheoreticalPeak::new(bin - BIN_SHIFT_H2O[slot], PeakType::Loss));
        match charge {
            IonCharge::One => {
                dest.push(TheoreticalPeak::new(bin - BIN_SHIFT_NH3_CHG_1, PeakType::Loss));
            }
            // Case A ammonia coincides with the water loss already pushed.
            IonCharge::Two if !case_a => {
                dest.push(TheoreticalPeak::new(
                    bin - BIN_SHIFT_NH3_CHG_2_CASE_B,
                    PeakType::Loss,
                ));
            }
            IonCharge::Two => {}
        }
        if ctx.flanks {
            dest.push(TheoreticalPeak::new(bin - 1, PeakType::Flanking));
        }
        dest.push(TheoreticalPeak::new(bin, PeakType::Primary));
        if ctx.flanks {
            dest.push(TheoreticalPeak::new(bin + 1, PeakType::Flanking));
        }
    }
}

impl TheoreticalPeakSet for ByAll {
    fn clear(&mut self) {
        self.sets.clear();
    }

    fn add_b_ion(&mut self, mass: f64, charge: IonCharge) {
        self.add_ion(mass, charge, IonSeries::B);
    }

    fn add_y_ion(&mut self, mass: f64, charge: IonCharge) {
        self.add_ion(mass, charge, IonSeries::Y);
    }

    fn get_peaks(&mut self, out: &mut PeakOutput, _exceptions: Option<&PeakExceptions>) {
        self.sets.merge(None, &self.ctx);
        copy_sorted(self.sets.charge1(), &self.ctx, &mut out.pos1);
        copy_sorted(self.sets.combined(), &self.ctx, &mut out.pos2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mass::table::MassTable;
    use crate::core::peaks::fragments::add_fragment_ions;

    #[test]
    fn charge_one_b_ion_expands_to_three_losses_two_flanks_and_primary() {
        let mut workspace = ByAll::new(PeakContext::default());
        workspace.add_b_ion(57.021_463_7, IonCharge::One);
        let mut out = PeakOutput::default();
        workspace.get_peaks(&mut out, None);
        let bins: Vec<i32> = out.pos1.iter().map(|p| p.bin()).collect();
        assert_eq!(bins, vec![30, 40, 41, 57, 58, 59]);
    }

    #[test]
    fn duplicates_are_kept() {
        let mut workspace = ByAll::new(PeakContext::default());
        // Same m/z at charge 1 and charge 2.
        workspace.add_b_ion(57.021_463_7, IonCharge::One);
        workspace.add_b_ion(2.0 * 57.021_463_7, IonCharge::Two);
        let mut out = PeakOutput::default();
        workspace.get_peaks(&mut out, None);
        let primary = TheoreticalPeak::new(58, PeakType::Primary);
        assert!(out.pos2.is_sorted());
        assert_eq!(out.pos2.iter().filter(|&&p| p == primary).count(), 2);
    }

    #[test]
    fn charge_two_output_extends_charge_one_output() {
        let ctx = PeakContext::default();
        let mut workspace = ByAll::new(ctx);
        add_fragment_ions(&mut workspace, &MassTable::default(), b"PEPTIDEK").unwrap();
        let mut out = PeakOutput::default();
        workspace.get_peaks(&mut out, None);
        assert!(out.pos2.len() > out.pos1.len());
        assert!(out.pos2.is_sorted());
    }
}
