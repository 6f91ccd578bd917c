use super::constraint::EnzymeConstraint;
use crate::core::mass::table::MassTable;

/// Per-protein cleavage bookkeeping, built in one pass and dropped after enumeration.
///
/// Positions are bond offsets in `0..=len`: position `p` sits between residue
/// `p - 1` and residue `p`. Both protein ends count as enzymatic.
#[derive(Debug, Clone)]
pub struct CleavagePositionTable {
    masses: Vec<f64>,
    unknown_before: Vec<u32>,
    cleavage_sites: Vec<u32>,
    non_cleavage_sites: Vec<u32>,
    sites_before: Vec<u32>,
    is_site: Vec<bool>,
}

impl CleavagePositionTable {
    pub fn build(sequence: &[u8], constraint: &EnzymeConstraint, masses: &MassTable) -> Self {
        let len = sequence.len();
        let mut table = Self {
            masses: Vec::with_capacity(len + 1),
            unknown_before: Vec::with_capacity(len + 1),
            cleavage_sites: vec![0],
            non_cleavage_sites: Vec::new(),
            sites_before: Vec::with_capacity(len),
            is_site: Vec::with_capacity(len + 1),
        };
        table.masses.push(0.0);
        table.unknown_before.push(0);
        table.is_site.push(true);

        for (idx, &residue) in sequence.iter().enumerate() {
            let mass = masses.residue_mass(residue);
            let previous_mass = table.masses[idx];
            let previous_unknown = table.unknown_before[idx];
            table.masses.push(previous_mass + mass.unwrap_or(0.0));
            table
                .unknown_before
                .push(previous_unknown + u32::from(mass.is_none()));

            table.sites_before.push(table.cleavage_sites.len() as u32);
            let position = idx as u32 + 1;
            let site = constraint.is_cleavage_site(residue, sequence.get(idx + 1).copied());
            if site {
                table.cleavage_sites.push(position);
            } else if (position as usize) < len {
                table.non_cleavage_sites.push(position);
            }
            table.is_site.push(site);
        }

        if len > 0 && table.cleavage_sites.last() != Some(&(len as u32)) {
            table.cleavage_sites.push(len as u32);
        }
        if let Some(end) = table.is_site.last_mut() {
            *end = true;
        }
        table
    }

    pub fn protein_len(&self) -> usize {
        self.masses.len() - 1
    }

    /// Enzymatic positions, starting at 0 and ending at the protein length.
    pub fn cleavage_sites(&self) -> &[u32] {
        &self.cleavage_sites
    }

    /// Internal positions that are not enzymatic. The protein end is never listed.
    pub fn non_cleavage_sites(&self) -> &[u32] {
        &self.non_cleavage_sites
    }

    pub fn all_positions(&self) -> Vec<u32> {
        (0..=self.protein_len() as u32).collect()
    }

    #[inline]
    pub fn is_site(&self, position: u32) -> bool {
        self.is_site[position as usize]
    }

    /// Residue mass sum of `[n, c)`, without water.
    #[inline]
    pub fn residue_mass(&self, n: u32, c: u32) -> f64 {
        self.masses[c as usize] - self.masses[n as usize]
    }

    /// Whether `[n, c)` contains a residue with no defined mass.
    #[inline]
    pub fn spans_unknown(&self, n: u32, c: u32) -> bool {
        self.unknown_before[c as usize] != self.unknown_before[n as usize]
    }

    /// Whether a peptide `[n, c)` contains an enzymatic site strictly inside it.
    #[inline]
    pub fn skips_site(&self, n: u32, c: u32) -> bool {
        self.sites_before[n as usize] < self.sites_before[c as usize - 1]
    }
}
