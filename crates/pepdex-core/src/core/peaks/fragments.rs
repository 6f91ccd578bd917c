use super::code::IonCharge;
use super::workspace::TheoreticalPeakSet;
use crate::core::mass::table::{MassError, MassTable};

/// Feeds every b-ion prefix and y-ion suffix of `sequence`, at both charges, in
/// increasing mass order.
pub fn add_fragment_ions<W: TheoreticalPeakSet + ?Sized>(
    workspace: &mut W,
    masses: &MassTable,
    sequence: &[u8],
) -> Result<(), MassError> {
    let residues = sequence
        .iter()
        .map(|&r| masses.residue_mass(r).ok_or(MassError::UnknownResidue(r as char)))
        .collect::<Result<Vec<f64>, _>>()?;
    let Some(fragment_count) = residues.len().checked_sub(1) else {
        return Ok(());
    };

    let mut b_mass = 0.0;
    for &mass in &residues[..fragment_count] {
        b_mass += mass;
        for charge in IonCharge::BOTH {
            workspace.add_b_ion(b_mass, charge);
        }
    }
    let mut y_mass = 0.0;
    for &mass in residues[1..].iter().rev() {
        y_mass += mass;
        for charge in IonCharge::BOTH {
            workspace.add_y_ion(y_mass, charge);
        }
    }
    Ok(())
}
