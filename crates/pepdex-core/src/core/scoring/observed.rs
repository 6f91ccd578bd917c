use crate::core::models::spectrum::Spectrum;
use crate::core::peaks::code::{
    FLANKING_INTENSITY, LOSS_INTENSITY, NUM_PEAK_TYPES, PRIMARY_INTENSITY, PeakType,
    TheoreticalPeak,
};
use crate::core::peaks::context::{
    BIN_SHIFT_A_ION, BIN_SHIFT_H2O, BIN_SHIFT_NH3_CHG_1, BIN_SHIFT_NH3_CHG_2_CASE_B, PeakContext,
};

/// A binned observed spectrum plus the shifted cache that sparse codes score against.
///
/// For explicit peak types the cache holds the weighted intensity of the bin
/// itself; for combined types it holds the weighted sum over every bin the
/// type implies. Scoring a sparse encoding against the cache therefore equals
/// scoring its explicit expansion against the raw intensities.
#[derive(Debug, Clone)]
pub struct ObservedPeakSet {
    intensities: Vec<f64>,
    cache: Vec<f64>,
}

impl ObservedPeakSet {
    /// Bins `spectrum` by maximum intensity, normalized so the strongest bin is 1.
    ///
    /// Bins at or beyond `ctx.max_bin` are dropped; without a cutoff the vector
    /// ends at the spectrum's highest peak, capped at [`MAX_OBSERVED_MZ`](crate::core::mass::constants::MAX_OBSERVED_MZ).
    pub fn new(spectrum: &Spectrum, ctx: &PeakContext) -> Self {
        let num_bins = match ctx.max_bin {
            Some(max) => max.min(ctx.max_observed_bins()) as usize,
            None => ctx.bin_count(spectrum.max_mz()) as usize,
        };
        let mut intensities = vec![0.0; num_bins];
        for peak in &spectrum.peaks {
            let bin = ctx.mz_bin(peak.mz);
            if let Some(slot) = usize::try_from(bin).ok().and_then(|b| intensities.get_mut(b)) {
                *slot = f64::max(*slot, peak.intensity);
            }
        }
        let strongest = intensities.iter().copied().fold(0.0, f64::max);
        if strongest > 0.0 {
            intensities.iter_mut().for_each(|v| *v /= strongest);
        }
        Self::from_intensities(intensities, ctx)
    }

    /// Builds the cache over an already binned intensity vector.
    ///
    /// Bins past [`MAX_OBSERVED_MZ`](crate::core::mass::constants::MAX_OBSERVED_MZ) are discarded.
    pub fn from_intensities(mut intensities: Vec<f64>, ctx: &PeakContext) -> Self {
        intensities.truncate(ctx.max_observed_bins() as usize);
        let mut set = Self {
            cache: vec![0.0; intensities.len() * NUM_PEAK_TYPES as usize],
            intensities,
        };
        for bin in 0..set.intensities.len() as i32 {
            for kind in PeakType::ALL {
                let value = set.shifted_sum(bin, kind, ctx.flanks);
                set.cache[TheoreticalPeak::new(bin, kind).code() as usize] = value;
            }
        }
        set
    }

    pub fn num_bins(&self) -> usize {
        self.intensities.len()
    }

    #[inline]
    pub fn intensity(&self, bin: i32) -> f64 {
        usize::try_from(bin)
            .ok()
            .and_then(|b| self.intensities.get(b))
            .copied()
            .unwrap_or(0.0)
    }

    #[inline]
    pub fn cached(&self, peak: TheoreticalPeak) -> f64 {
        usize::try_from(peak.code())
            .ok()
            .and_then(|code| self.cache.get(code))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn score(&self, peaks: &[TheoreticalPeak]) -> f64 {
        peaks.iter().map(|&peak| self.cached(peak)).sum()
    }

    /// `Σ cache[pos] - Σ cache[neg]`.
    pub fn score_signed(&self, pos: &[TheoreticalPeak], neg: &[TheoreticalPeak]) -> f64 {
        self.score(pos) - self.score(neg)
    }

    fn shifted_sum(&self, bin: i32, kind: PeakType, flanks: bool) -> f64 {
        let u = |offset: i32| self.intensity(bin - offset);
        let primary = PRIMARY_INTENSITY * u(0);
        let flanking = if flanks {
            FLANKING_INTENSITY * (u(1) + u(-1))
        } else {
            0.0
        };
        let loss = |shifts: &[i32]| LOSS_INTENSITY * shifts.iter().map(|&s| u(s)).sum::<f64>();
        match kind {
            PeakType::Loss => LOSS_INTENSITY * u(0),
            PeakType::Flanking => FLANKING_INTENSITY * u(0),
            PeakType::Primary => primary,
            PeakType::CombinedB1 => {
                primary
                    + flanking
                    + loss(&[BIN_SHIFT_A_ION[0], BIN_SHIFT_H2O[0], BIN_SHIFT_NH3_CHG_1])
            }
            PeakType::CombinedY1 => primary + flanking + loss(&[BIN_SHIFT_H2O[0], BIN_SHIFT_NH3_CHG_1]),
            PeakType::CombinedB2a => primary + flanking + loss(&[BIN_SHIFT_A_ION[1], BIN_SHIFT_H2O[1]]),
            PeakType::CombinedB2b => {
                primary
                    + flanking
                    + loss(&[BIN_SHIFT_A_ION[1], BIN_SHIFT_H2O[1], BIN_SHIFT_NH3_CHG_2_CASE_B])
            }
            PeakType::CombinedY2a => primary + flanking + loss(&[BIN_SHIFT_H2O[1]]),
            PeakType::CombinedY2b => {
                primary + flanking + loss(&[BIN_SHIFT_H2O[1], BIN_SHIFT_NH3_CHG_2_CASE_B])
            }
        }
    }
}
