use super::code::TheoreticalPeak;
use super::context::PeakContext;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Per-peptide correction peaks, stored as running deltas between sorted codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakExceptions {
    pub peak1: Vec<i32>,
    pub peak2: Vec<i32>,
    pub neg_peak1: Vec<i32>,
    pub neg_peak2: Vec<i32>,
}

impl PeakExceptions {
    pub fn from_peaks(
        pos1: &[TheoreticalPeak],
        neg1: &[TheoreticalPeak],
        pos2: &[TheoreticalPeak],
        neg2: &[TheoreticalPeak],
    ) -> Self {
        Self {
            peak1: delta_encode(pos1),
            peak2: delta_encode(pos2),
            neg_peak1: delta_encode(neg1),
            neg_peak2: delta_encode(neg2),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.peak1.is_empty()
            && self.peak2.is_empty()
            && self.neg_peak1.is_empty()
            && self.neg_peak2.is_empty()
    }
}

/// Encodes sorted peaks as the first code followed by successive differences.
pub fn delta_encode(peaks: &[TheoreticalPeak]) -> Vec<i32> {
    let mut previous = 0;
    peaks
        .iter()
        .map(|peak| {
            let delta = peak.code() - previous;
            previous = peak.code();
            delta
        })
        .collect()
}

pub fn delta_decode(deltas: &[i32]) -> impl Iterator<Item = TheoreticalPeak> + '_ {
    deltas.iter().scan(0i32, |total, &delta| {
        *total += delta;
        Some(TheoreticalPeak::from_code(*total))
    })
}

/// Appends decoded exceptions to a possibly unordered `dest`, stopping at the cutoff.
pub(crate) fn copy_exceptions(
    deltas: &[i32],
    ctx: &PeakContext,
    dest: &mut Vec<TheoreticalPeak>,
) {
    dest.extend(delta_decode(deltas).take_while(|peak| ctx.below_cutoff(*peak)));
}

/// Merges decoded exceptions into sorted `src`, writing the sorted union to `dest`.
pub(crate) fn merge_exceptions(
    src: &[TheoreticalPeak],
    deltas: &[i32],
    ctx: &PeakContext,
    dest: &mut Vec<TheoreticalPeak>,
) {
    dest.clear();
    let kept = src.iter().copied().take_while(|peak| ctx.below_cutoff(*peak));
    let extra = delta_decode(deltas).take_while(|peak| ctx.below_cutoff(*peak));
    dest.extend(kept.merge(extra));
}
