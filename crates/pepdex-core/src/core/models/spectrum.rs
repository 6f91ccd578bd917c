use crate::core::mass::constants::PROTON;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub mz: f64,
    pub intensity: f64,
}

/// An observed MS2 spectrum, already decoded by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub scan: u32,
    pub precursor_mz: f64,
    pub charges: Vec<u8>,
    pub peaks: Vec<Peak>,
}

impl Spectrum {
    pub fn new(scan: u32, precursor_mz: f64, charges: Vec<u8>, peaks: Vec<Peak>) -> Self {
        Self {
            scan,
            precursor_mz,
            charges,
            peaks,
        }
    }

    /// Neutral precursor mass assuming `charge` protons.
    pub fn neutral_mass(&self, charge: u8) -> f64 {
        (self.precursor_mz - PROTON) * f64::from(charge)
    }

    pub fn max_mz(&self) -> f64 {
        self.peaks.iter().map(|p| p.mz).fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_mass_subtracts_one_proton_per_charge() {
        let spectrum = Spectrum::new(1, 500.0, vec![2], Vec::new());
        assert!((spectrum.neutral_mass(2) - (500.0 - PROTON) * 2.0).abs() < 1e-9);
    }

    #[test]
    fn max_mz_of_empty_spectrum_is_zero() {
        let spectrum = Spectrum::new(1, 500.0, vec![2], Vec::new());
        assert_eq!(spectrum.max_mz(), 0.0);
    }
}
