use super::code::{IonCharge, IonSeries, TheoreticalPeak, TheoreticalPeakArr};
use super::context::PeakContext;
use super::exceptions::{PeakExceptions, merge_exceptions};
use itertools::Itertools;

/// Sorted per-series peak arrays plus the scratch space used to merge them.
///
/// After [`OrderedPeakSets::merge`], `charge1` holds the merged charge-1 peaks
/// and `combined` the merge of the charge-1 and charge-2 peaks.
#[derive(Debug, Clone, Default)]
pub(crate) struct OrderedPeakSets {
    b_series: [TheoreticalPeakArr; 2],
    y_series: [TheoreticalPeakArr; 2],
    charge1: TheoreticalPeakArr,
    charge2: TheoreticalPeakArr,
    combined: TheoreticalPeakArr,
    scratch: TheoreticalPeakArr,
}

impl OrderedPeakSets {
    pub fn clear(&mut self) {
        for series in self.b_series.iter_mut().chain(self.y_series.iter_mut()) {
            series.clear();
        }
    }

    /// Series that peaks for `series`/`charge` must be pushed to in nondecreasing order.
    pub fn series_mut(&mut self, series: IonSeries, charge: IonCharge) -> &mut TheoreticalPeakArr {
        match series {
            IonSeries::B => &mut self.b_series[charge.slot()],
            IonSeries::Y => &mut self.y_series[charge.slot()],
        }
    }

    pub fn merge(&mut self, exceptions: Option<&PeakExceptions>, ctx: &PeakContext) {
        let peak1 = exceptions.map(|e| e.peak1.as_slice()).unwrap_or_default();
        let peak2 = exceptions.map(|e| e.peak2.as_slice()).unwrap_or_default();

        if peak1.is_empty() {
            merge_into(&self.b_series[0], &self.y_series[0], &mut self.charge1);
        } else {
            merge_into(&self.b_series[0], &self.y_series[0], &mut self.scratch);
            merge_exceptions(&self.scratch, peak1, ctx, &mut self.charge1);
        }
        if peak2.is_empty() {
            merge_into(&self.b_series[1], &self.y_series[1], &mut self.charge2);
        } else {
            merge_into(&self.b_series[1], &self.y_series[1], &mut self.scratch);
            merge_exceptions(&self.scratch, peak2, ctx, &mut self.charge2);
        }
        merge_into(&self.charge1, &self.charge2, &mut self.combined);
    }

    pub fn charge1(&self) -> &[TheoreticalPeak] {
        &self.charge1
    }

    pub fn combined(&self) -> &[TheoreticalPeak] {
        &self.combined
    }
}

fn merge_into(a: &[TheoreticalPeak], b: &[TheoreticalPeak], dest: &mut TheoreticalPeakArr) {
    dest.clear();
    dest.extend(a.iter().copied().merge(b.iter().copied()));
}

/// Appends sorted `src` to `dest`, stopping at the cutoff.
pub(crate) fn copy_sorted(src: &[TheoreticalPeak], ctx: &PeakContext, dest: &mut TheoreticalPeakArr) {
    debug_assert!(src.is_sorted());
    dest.extend(src.iter().copied().take_while(|peak| ctx.below_cutoff(*peak)));
}

/// Appends every peak of `src` below the cutoff, in any order.
pub(crate) fn copy_unordered(
    src: &[TheoreticalPeak],
    ctx: &PeakContext,
    dest: &mut TheoreticalPeakArr,
) {
    dest.extend(src.iter().copied().filter(|peak| ctx.below_cutoff(*peak)));
}

/// Keeps the last (highest type) peak of each bin, stopping at `max_bin`.
pub(crate) fn remove_dups(src: &[TheoreticalPeak], ctx: &PeakContext, dest: &mut TheoreticalPeakArr) {
    for same_bin in src.chunk_by(|a, b| a.bin() == b.bin()) {
        let Some(&last) = same_bin.last() else {
            continue;
        };
        if !ctx.below_bin_cutoff(last.bin()) {
            break;
        }
        dest.push(last);
    }
}

/// Signed difference `x - y` of two sorted arrays; equal peaks cancel.
pub(crate) fn symmetric_diff(
    x: &[TheoreticalPeak],
    y: &[TheoreticalPeak],
    pos: &mut TheoreticalPeakArr,
    neg: &mut TheoreticalPeakArr,
) {
    use itertools::EitherOrBoth::{Both, Left, Right};
    for item in x.iter().merge_join_by(y.iter(), |a, b| a.cmp(b)) {
        match item {
            Left(&peak) => pos.push(peak),
            Right(&peak) => neg.push(peak),
            Both(_, _) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::peaks::code::PeakType;

    fn peaks(codes: &[i32]) -> Vec<TheoreticalPeak> {
        codes.iter().copied().map(TheoreticalPeak::from_code).collect()
    }

    #[test]
    fn merge_combines_charge_one_and_two_series() {
        let mut sets = OrderedPeakSets::default();
        sets.series_mut(IonSeries::B, IonCharge::One).extend(peaks(&[1, 9]));
        sets.series_mut(IonSeries::Y, IonCharge::One).extend(peaks(&[4]));
        sets.series_mut(IonSeries::B, IonCharge::Two).extend(peaks(&[2]));
        sets.series_mut(IonSeries::Y, IonCharge::Two).extend(peaks(&[7]));
        sets.merge(None, &PeakContext::default());
        assert_eq!(sets.charge1(), peaks(&[1, 4, 9]).as_slice());
        assert_eq!(sets.combined(), peaks(&[1, 2, 4, 7, 9]).as_slice());
    }

    #[test]
    fn remove_dups_keeps_highest_type_per_bin() {
        let src = vec![
            TheoreticalPeak::new(3, PeakType::Loss),
            TheoreticalPeak::new(3, PeakType::Primary),
            TheoreticalPeak::new(4, PeakType::Flanking),
            TheoreticalPeak::new(9, PeakType::Loss),
        ];
        let mut dest = Vec::new();
        remove_dups(&src, &PeakContext::default().with_max_bin(Some(9)), &mut dest);
        assert_eq!(
            dest,
            vec![
                TheoreticalPeak::new(3, PeakType::Primary),
                TheoreticalPeak::new(4, PeakType::Flanking),
            ]
        );
    }

    #[test]
    fn symmetric_diff_cancels_equal_codes_once() {
        let (mut pos, mut neg) = (Vec::new(), Vec::new());
        symmetric_diff(&peaks(&[1, 2, 2, 5]), &peaks(&[2, 3, 5, 5]), &mut pos, &mut neg);
        assert_eq!(pos, peaks(&[1, 2]));
        assert_eq!(neg, peaks(&[3, 5]));
    }
}
