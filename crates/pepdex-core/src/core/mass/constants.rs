/// Monoisotopic mass of water, added once per peptide.
pub const H2O_MONO: f64 = 18.010_564_7;
/// Average mass of water.
pub const H2O_AVERAGE: f64 = 18.015_28;
pub const PROTON: f64 = 1.007_276_466_8;

/// Width of one m/z bin used by theoretical and observed peak sets.
pub const DEFAULT_BIN_WIDTH: f64 = 1.000_507_9;

/// Largest m/z an observed spectrum is binned up to; peaks beyond it are ignored.
pub const MAX_OBSERVED_MZ: f64 = 100_000.0;
