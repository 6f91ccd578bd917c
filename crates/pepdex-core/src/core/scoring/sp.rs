use super::observed::ObservedPeakSet;
use crate::core::mass::constants::{H2O_MONO, PROTON};
use crate::core::mass::table::{MassError, MassTable};
use crate::core::models::spectrum::Spectrum;
use crate::core::peaks::context::PeakContext;

/// Bonus applied per pair of consecutive matched ions within one series.
pub const CONSECUTIVE_BONUS: f64 = 0.075;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpScoreData {
    pub sp_score: f64,
    pub matched_ions: u32,
    pub total_ions: u32,
}

/// SEQUEST-style preliminary scorer over one spectrum at one precursor charge.
#[derive(Debug, Clone)]
pub struct SpScorer {
    observed: ObservedPeakSet,
    ctx: PeakContext,
    max_fragment_charge: u8,
}

impl SpScorer {
    pub fn new(spectrum: &Spectrum, charge: u8, ctx: PeakContext) -> Self {
        Self {
            observed: ObservedPeakSet::new(spectrum, &ctx),
            ctx,
            max_fragment_charge: charge.saturating_sub(1).max(1),
        }
    }

    pub fn score(&self, masses: &MassTable, sequence: &[u8]) -> Result<SpScoreData, MassError> {
        let residues = sequence
            .iter()
            .map(|&r| masses.residue_mass(r).ok_or(MassError::UnknownResidue(r as char)))
            .collect::<Result<Vec<f64>, _>>()?;
        let fragment_count = residues.len().saturating_sub(1);

        let mut prefixes = Vec::with_capacity(fragment_count);
        let mut total = 0.0;
        for &mass in &residues[..fragment_count] {
            total += mass;
            prefixes.push(total);
        }
        let mut suffixes = Vec::with_capacity(fragment_count);
        total = 0.0;
        for &mass in residues.iter().skip(1).rev() {
            total += mass;
            suffixes.push(total + H2O_MONO);
        }

        let mut intensity = 0.0;
        let mut matched = 0u32;
        let mut total_ions = 0u32;
        let mut consecutive = 0u32;
        for z in 1..=self.max_fragment_charge {
            for series in [&prefixes, &suffixes] {
                let mut previous_matched = false;
                for &mass in series.iter() {
                    total_ions += 1;
                    let charge = f64::from(z);
                    let observed = self
                        .observed
                        .intensity(self.ctx.mz_bin((mass + charge * PROTON) / charge));
                    if observed > 0.0 {
                        intensity += observed;
                        matched += 1;
                        if previous_matched {
                            consecutive += 1;
                        }
                        previous_matched = true;
                    } else {
                        previous_matched = false;
                    }
                }
            }
        }

        let sp_score = if total_ions == 0 {
            0.0
        } else {
            intensity
                * f64::from(matched)
                * (1.0 + CONSECUTIVE_BONUS * f64::from(consecutive))
                / f64::from(total_ions)
        };
        Ok(SpScoreData {
            sp_score,
            matched_ions: matched,
            total_ions,
        })
    }
}
