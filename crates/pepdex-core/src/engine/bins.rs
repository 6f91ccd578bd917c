use crate::core::digest::EnzymeConstraint;
use crate::core::mass::table::MassTable;

/// Partition of the reachable peptide mass range into fixed-width bins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinLayout {
    low_mass: f64,
    width: f64,
    count: usize,
}

impl BinLayout {
    /// Layout for every mass a peptide under `constraint` can reach.
    ///
    /// The constraint's mass bounds are tightened by the lightest and heaviest
    /// residues times the length bounds, so unreachable ranges get no bins.
    pub fn for_constraint(constraint: &EnzymeConstraint, masses: &MassTable, width: f64) -> Self {
        let masses = masses.with_mass_type(constraint.mass_type());
        let water = masses.water();
        let min_limit = constraint
            .min_mass()
            .max(f64::from(constraint.min_length()) * masses.lightest_residue() + water);
        let max_limit = constraint
            .max_mass()
            .min(f64::from(constraint.max_length()) * masses.heaviest_residue() + water);
        Self::from_limits(min_limit, max_limit, width)
    }

    pub fn from_limits(min_limit: f64, max_limit: f64, width: f64) -> Self {
        let low_mass = min_limit.floor();
        let high_mass = max_limit.ceil().max(low_mass);
        let count = ((high_mass - low_mass) / width).floor() as usize + 1;
        Self {
            low_mass,
            width,
            count,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn low_mass(&self) -> f64 {
        self.low_mass
    }

    /// Bin holding `mass`, or `None` outside the layout.
    pub fn bin_of(&self, mass: f64) -> Option<usize> {
        let offset = (mass - self.low_mass) / self.width;
        if !(offset >= 0.0) {
            return None;
        }
        let index = offset.floor() as usize;
        (index < self.count).then_some(index)
    }

    pub fn start_mass(&self, index: usize) -> f64 {
        self.low_mass + index as f64 * self.width
    }

    pub fn file_name(index: usize) -> String {
        format!("bin_{:05}", index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::digest::{Digestion, Enzyme};

    #[test]
    fn limits_are_floored_and_ceiled_before_counting() {
        let layout = BinLayout::from_limits(200.4, 480.2, 100.0);
        assert_eq!(layout.low_mass(), 200.0);
        assert_eq!(layout.len(), 3);
        assert_eq!(layout.bin_of(200.4), Some(0));
        assert_eq!(layout.bin_of(480.2), Some(2));
        assert_eq!(layout.start_mass(2), 400.0);
    }

    #[test]
    fn exact_multiple_gets_one_more_bin_for_the_upper_limit() {
        let layout = BinLayout::from_limits(200.0, 500.0, 100.0);
        assert_eq!(layout.len(), 4);
        assert_eq!(layout.bin_of(500.0), Some(3));
    }

    #[test]
    fn masses_outside_the_layout_have_no_bin() {
        let layout = BinLayout::from_limits(200.0, 500.0, 100.0);
        assert_eq!(layout.bin_of(199.9), None);
        assert_eq!(layout.bin_of(600.0), None);
        assert_eq!(layout.bin_of(f64::NAN), None);
    }

    #[test]
    fn constraint_limits_are_tightened_by_residue_masses() {
        let constraint = EnzymeConstraint::builder()
            .enzyme(Enzyme::Trypsin)
            .digestion(Digestion::Full)
            .length_range(6, 10)
            .mass_range(0.0, 100_000.0)
            .build()
            .unwrap();
        let masses = MassTable::default();
        let layout = BinLayout::for_constraint(&constraint, &masses, 100.0);
        let min_limit = 6.0 * masses.lightest_residue() + masses.water();
        let max_limit = 10.0 * masses.heaviest_residue() + masses.water();
        assert_eq!(layout.low_mass(), min_limit.floor());
        assert_eq!(
            layout.len(),
            ((max_limit.ceil() - min_limit.floor()) / 100.0).floor() as usize + 1
        );
    }

    #[test]
    fn file_names_are_one_based_and_padded() {
        assert_eq!(BinLayout::file_name(0), "bin_00001");
        assert_eq!(BinLayout::file_name(41), "bin_00042");
    }
}
