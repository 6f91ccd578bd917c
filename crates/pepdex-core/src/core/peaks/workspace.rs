use super::code::{IonCharge, TheoreticalPeak, TheoreticalPeakArr};
use super::exceptions::PeakExceptions;

/// Caller-owned output arrays for one peptide.
///
/// `pos2`/`neg2` cover charge 1 and charge 2 together, since a charge-2
/// precursor can produce fragments of either charge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakOutput {
    pub pos1: TheoreticalPeakArr,
    pub neg1: TheoreticalPeakArr,
    pub pos2: TheoreticalPeakArr,
    pub neg2: TheoreticalPeakArr,
}

impl PeakOutput {
    pub fn clear(&mut self) {
        self.pos1.clear();
        self.neg1.clear();
        self.pos2.clear();
        self.neg2.clear();
    }

    /// Positive and negative peaks relevant to a precursor of `charge`.
    pub fn for_precursor_charge(&self, charge: u8) -> (&[TheoreticalPeak], &[TheoreticalPeak]) {
        if charge <= 1 {
            (&self.pos1, &self.neg1)
        } else {
            (&self.pos2, &self.neg2)
        }
    }
}

/// A reusable scratch workspace that turns fragment masses into peak codes.
///
/// Usage per peptide: `clear`, feed every b-ion prefix and y-ion suffix in
/// increasing mass order, then `get_peaks`. Results are appended to `out`;
/// the caller decides when to clear it.
pub trait TheoreticalPeakSet {
    fn clear(&mut self);

    fn add_b_ion(&mut self, mass: f64, charge: IonCharge);

    fn add_y_ion(&mut self, mass: f64, charge: IonCharge);

    /// Finalizes the peptide. `exceptions` are stored corrections and are only
    /// honored by the sparse encodings.
    fn get_peaks(&mut self, out: &mut PeakOutput, exceptions: Option<&PeakExceptions>);
}
