use serde::{Deserialize, Serialize};
use std::fmt;

pub const NUM_PEAK_TYPES: i32 = 9;

pub const LOSS_INTENSITY: f64 = 10.0;
pub const FLANKING_INTENSITY: f64 = 25.0;
pub const PRIMARY_INTENSITY: f64 = 50.0;

/// Tag packed into the low part of a peak code.
///
/// The three explicit types carry a single intensity. The `Combined*` types
/// stand for a primary ion together with every loss and flanking peak it
/// implies, and are only meaningful against a shifted observed cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum PeakType {
    Loss = 0,
    Flanking = 1,
    Primary = 2,
    CombinedB1 = 3,
    CombinedY1 = 4,
    CombinedB2a = 5,
    CombinedY2a = 6,
    CombinedB2b = 7,
    CombinedY2b = 8,
}

impl PeakType {
    pub const ALL: [PeakType; NUM_PEAK_TYPES as usize] = [
        PeakType::Loss,
        PeakType::Flanking,
        PeakType::Primary,
        PeakType::CombinedB1,
        PeakType::CombinedY1,
        PeakType::CombinedB2a,
        PeakType::CombinedY2a,
        PeakType::CombinedB2b,
        PeakType::CombinedY2b,
    ];

    fn from_index(index: i32) -> Self {
        Self::ALL[index.rem_euclid(NUM_PEAK_TYPES) as usize]
    }

    /// Intensity of an explicit peak; `None` for combined types.
    pub fn intensity(self) -> Option<f64> {
        match self {
            PeakType::Loss => Some(LOSS_INTENSITY),
            PeakType::Flanking => Some(FLANKING_INTENSITY),
            PeakType::Primary => Some(PRIMARY_INTENSITY),
            _ => None,
        }
    }

    pub fn is_combined(self) -> bool {
        self.intensity().is_none()
    }
}

/// Fragment charge handled by the peak workspaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IonCharge {
    One,
    Two,
}

impl IonCharge {
    pub const BOTH: [IonCharge; 2] = [IonCharge::One, IonCharge::Two];

    pub fn value(self) -> f64 {
        match self {
            IonCharge::One => 1.0,
            IonCharge::Two => 2.0,
        }
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            IonCharge::One => 0,
            IonCharge::Two => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IonSeries {
    B,
    Y,
}

impl IonSeries {
    /// Combined tag for this series; `case_a` picks the charge-2 ammonia placement.
    pub fn combined_type(self, charge: IonCharge, case_a: bool) -> PeakType {
        match (self, charge, case_a) {
            (IonSeries::B, IonCharge::One, _) => PeakType::CombinedB1,
            (IonSeries::Y, IonCharge::One, _) => PeakType::CombinedY1,
            (IonSeries::B, IonCharge::Two, true) => PeakType::CombinedB2a,
            (IonSeries::Y, IonCharge::Two, true) => PeakType::CombinedY2a,
            (IonSeries::B, IonCharge::Two, false) => PeakType::CombinedB2b,
            (IonSeries::Y, IonCharge::Two, false) => PeakType::CombinedY2b,
        }
    }
}

/// A theoretical peak packed as `bin * NUM_PEAK_TYPES + type`.
///
/// Ordering by code orders peaks by bin first and type second, so merge and
/// de-duplication passes can work on plain sorted arrays.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TheoreticalPeak(i32);

impl TheoreticalPeak {
    #[inline]
    pub fn new(bin: i32, kind: PeakType) -> Self {
        Self(bin * NUM_PEAK_TYPES + kind as i32)
    }

    #[inline]
    pub fn from_code(code: i32) -> Self {
        Self(code)
    }

    #[inline]
    pub fn code(self) -> i32 {
        self.0
    }

    #[inline]
    pub fn bin(self) -> i32 {
        self.0.div_euclid(NUM_PEAK_TYPES)
    }

    #[inline]
    pub fn kind(self) -> PeakType {
        PeakType::from_index(self.0)
    }
}

impl fmt::Debug for TheoreticalPeak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}", self.bin(), self.kind())
    }
}

pub type TheoreticalPeakArr = Vec<TheoreticalPeak>;
