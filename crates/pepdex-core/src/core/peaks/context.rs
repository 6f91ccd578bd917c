use super::code::{IonCharge, IonSeries, NUM_PEAK_TYPES, TheoreticalPeak};
use crate::core::mass::constants::{DEFAULT_BIN_WIDTH, H2O_MONO, MAX_OBSERVED_MZ, PROTON};

/// Bin shift of the A ion below its B ion, per charge.
pub const BIN_SHIFT_A_ION: [i32; 2] = [28, 14];
/// Bin shift of a water loss below its primary ion, per charge.
pub const BIN_SHIFT_H2O: [i32; 2] = [18, 9];
pub const BIN_SHIFT_NH3_CHG_1: i32 = 17;
pub const BIN_SHIFT_NH3_CHG_2_CASE_A: i32 = 9;
pub const BIN_SHIFT_NH3_CHG_2_CASE_B: i32 = 8;

/// Mass offsets (Da) applied before binning each ion kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IonOffset {
    A,
    BH2O,
    BNH3,
    B,
    YH2O,
    YNH3,
    Y,
}

impl IonOffset {
    pub fn daltons(self) -> f64 {
        match self {
            IonOffset::A => -28.0,
            IonOffset::BH2O => -18.0,
            IonOffset::BNH3 => -17.0,
            IonOffset::B => 0.0,
            IonOffset::YH2O => H2O_MONO - 18.0,
            IonOffset::YNH3 => H2O_MONO - 17.0,
            IonOffset::Y => H2O_MONO,
        }
    }

    pub fn primary(series: IonSeries) -> Self {
        match series {
            IonSeries::B => IonOffset::B,
            IonSeries::Y => IonOffset::Y,
        }
    }

    pub fn ammonia_loss(series: IonSeries) -> Self {
        match series {
            IonSeries::B => IonOffset::BNH3,
            IonSeries::Y => IonOffset::YNH3,
        }
    }
}

/// Run-wide settings shared by every peak workspace.
///
/// `max_bin` replaces a process-wide cutoff: when set, codes at or beyond
/// `max_bin * NUM_PEAK_TYPES` are dropped from every output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakContext {
    pub bin_width: f64,
    pub flanks: bool,
    pub max_bin: Option<u32>,
}

impl Default for PeakContext {
    fn default() -> Self {
        Self {
            bin_width: DEFAULT_BIN_WIDTH,
            flanks: true,
            max_bin: None,
        }
    }
}

impl PeakContext {
    pub fn with_max_bin(mut self, max_bin: Option<u32>) -> Self {
        self.max_bin = max_bin;
        self
    }

    pub fn with_flanks(mut self, flanks: bool) -> Self {
        self.flanks = flanks;
        self
    }

    #[inline]
    pub fn ion_bin(&self, mass: f64, charge: IonCharge, offset: IonOffset) -> i32 {
        let z = charge.value();
        ((mass + z * PROTON + offset.daltons()) / (z * self.bin_width) + 0.5).floor() as i32
    }

    /// Bin of an observed m/z value, on the same grid as [`Self::ion_bin`].
    #[inline]
    pub fn mz_bin(&self, mz: f64) -> i32 {
        (mz / self.bin_width + 0.5).floor() as i32
    }

    /// Number of bins needed to hold a peak at `mz`, never fewer than one and
    /// never more than [`Self::max_observed_bins`].
    pub fn bin_count(&self, mz: f64) -> u32 {
        let bins = (mz / self.bin_width + 0.5).floor() + 1.0;
        if bins.is_nan() || bins < 1.0 {
            1
        } else {
            bins.min(f64::from(self.max_observed_bins())) as u32
        }
    }

    /// Bins covering m/z values up to [`MAX_OBSERVED_MZ`].
    pub fn max_observed_bins(&self) -> u32 {
        (MAX_OBSERVED_MZ / self.bin_width + 0.5).floor() as u32 + 1
    }

    /// Primary bin of an ion and whether its charge-2 ammonia loss sits in case A.
    pub fn primary_bin(&self, mass: f64, charge: IonCharge, series: IonSeries) -> (i32, bool) {
        let bin = self.ion_bin(mass, charge, IonOffset::primary(series));
        let nh3 = self.ion_bin(mass, charge, IonOffset::ammonia_loss(series));
        (bin, bin - nh3 == BIN_SHIFT_NH3_CHG_2_CASE_A)
    }

    pub(crate) fn code_end(&self) -> Option<i32> {
        self.max_bin
            .map(|bin| (bin as i32).saturating_mul(NUM_PEAK_TYPES))
    }

    #[inline]
    pub(crate) fn below_cutoff(&self, peak: TheoreticalPeak) -> bool {
        self.code_end().is_none_or(|end| peak.code() < end)
    }

    #[inline]
    pub(crate) fn below_bin_cutoff(&self, bin: i32) -> bool {
        self.max_bin.is_none_or(|max| bin < max as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ion_bin_rounds_mass_over_charge_to_nearest_bin() {
        let ctx = PeakContext::default();
        let mass = 500.0;
        let expected = ((mass + PROTON) / DEFAULT_BIN_WIDTH + 0.5).floor() as i32;
        assert_eq!(ctx.ion_bin(mass, IonCharge::One, IonOffset::B), expected);
        let expected_z2 = ((mass + 2.0 * PROTON) / (2.0 * DEFAULT_BIN_WIDTH) + 0.5).floor() as i32;
        assert_eq!(ctx.ion_bin(mass, IonCharge::Two, IonOffset::B), expected_z2);
    }

    #[test]
    fn charge_two_ammonia_loss_is_eight_or_nine_bins_away() {
        let ctx = PeakContext::default();
        for step in 0..200 {
            let mass = 300.0 + f64::from(step) * 0.37;
            for series in [IonSeries::B, IonSeries::Y] {
                let (bin, _) = ctx.primary_bin(mass, IonCharge::Two, series);
                let nh3 = ctx.ion_bin(mass, IonCharge::Two, IonOffset::ammonia_loss(series));
                let shift = bin - nh3;
                assert!(shift == BIN_SHIFT_NH3_CHG_2_CASE_A || shift == BIN_SHIFT_NH3_CHG_2_CASE_B);
            }
        }
    }

    #[test]
    fn cutoff_is_disabled_without_max_bin() {
        let ctx = PeakContext::default();
        assert!(ctx.below_cutoff(TheoreticalPeak::from_code(i32::MAX)));
        let ctx = ctx.with_max_bin(Some(10));
        assert!(ctx.below_cutoff(TheoreticalPeak::from_code(89)));
        assert!(!ctx.below_cutoff(TheoreticalPeak::from_code(90)));
        assert!(!ctx.below_bin_cutoff(10));
    }

    #[test]
    fn bin_count_is_clamped_to_the_observed_range() {
        let ctx = PeakContext::default();
        assert_eq!(ctx.bin_count(0.0), 1);
        assert_eq!(ctx.bin_count(-5.0), 1);
        assert_eq!(ctx.bin_count(f64::NAN), 1);
        assert_eq!(ctx.bin_count(200.0) as i32, ctx.mz_bin(200.0) + 1);
        let cap = ctx.max_observed_bins();
        assert_eq!(ctx.bin_count(MAX_OBSERVED_MZ), cap);
        assert_eq!(ctx.bin_count(3.0e9), cap);
        assert_eq!(ctx.bin_count(f64::INFINITY), cap);
        assert!((cap as i32).checked_mul(NUM_PEAK_TYPES).is_some());
    }
}
