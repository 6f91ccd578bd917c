use super::constraint::EnzymeConstraint;
use super::enzyme::Digestion;
use super::positions::CleavagePositionTable;
use crate::core::mass::table::MassTable;
use crate::core::models::peptide::{CleavageType, PeptideCandidate};
use crate::core::models::protein::Protein;
use std::borrow::Cow;

/// Upper bound on the number of windows of length `min..=max` in a protein.
pub fn count_max_peptides(protein_length: usize, min_length: usize, max_length: usize) -> usize {
    let longest = max_length.min(protein_length);
    (min_length.max(1)..=longest)
        .map(|length| protein_length + 1 - length)
        .sum()
}

/// Finite, non-restartable sequence of the candidates one protein yields.
///
/// The position table is built once at construction; boundary pairs are then
/// produced one at a time, resuming the scan where the previous call stopped.
#[derive(Debug)]
pub struct CleavageEnumerator<'a> {
    table: CleavagePositionTable,
    positions: Vec<u32>,
    constraint: &'a EnzymeConstraint,
    water: f64,
    protein_id: u32,
    is_decoy: bool,
    passes: Vec<Pass>,
    scan: Scan,
}

/// Which boundary list of the table a pass reads, and from where.
#[derive(Debug, Clone, Copy)]
enum Boundaries {
    /// Cleavage sites, without the final protein end.
    InnerSites,
    /// Cleavage sites, without the protein start.
    SitesAfterStart,
    NonSites,
    /// Every position but the protein end.
    Starts,
    /// Every position but the protein start.
    Ends,
}

impl Boundaries {
    fn resolve<'t>(self, table: &'t CleavagePositionTable, positions: &'t [u32]) -> &'t [u32] {
        let sites = table.cleavage_sites();
        match self {
            Boundaries::InnerSites => &sites[..sites.len().saturating_sub(1)],
            Boundaries::SitesAfterStart => sites.get(1..).unwrap_or_default(),
            Boundaries::NonSites => table.non_cleavage_sites(),
            Boundaries::Starts => &positions[..table.protein_len().min(positions.len())],
            Boundaries::Ends => positions.get(1..).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Pass {
    nterms: Boundaries,
    cterms: Boundaries,
    skips_ok: bool,
}

/// Cursor into the current pass.
///
/// C-terminal positions too short for one N-terminus are too short for every
/// later one, so the scan for the next N-terminus starts at `resume_at`.
#[derive(Debug, Default, Clone, Copy)]
struct Scan {
    pass: usize,
    n: usize,
    c: usize,
    resume_at: usize,
    next_resume: usize,
    found_start: bool,
}

impl Scan {
    fn advance_nterm(&mut self) {
        self.n += 1;
        self.resume_at = self.next_resume;
        self.c = self.resume_at;
        self.found_start = false;
    }

    fn advance_pass(&mut self) {
        *self = Scan {
            pass: self.pass + 1,
            ..Scan::default()
        };
    }
}

impl<'a> CleavageEnumerator<'a> {
    pub fn new(
        protein_id: u32,
        protein: &Protein,
        constraint: &'a EnzymeConstraint,
        masses: &MassTable,
    ) -> Self {
        let masses = if masses.mass_type() == constraint.mass_type() {
            Cow::Borrowed(masses)
        } else {
            Cow::Owned(masses.with_mass_type(constraint.mass_type()))
        };
        let table = CleavagePositionTable::build(protein.sequence(), constraint, &masses);

        let skips_ok = constraint.missed_cleavages_allowed();
        let passes = if table.protein_len() < constraint.min_length() as usize {
            Vec::new()
        } else {
            match constraint.digestion() {
                Digestion::Full => vec![Pass {
                    nterms: Boundaries::InnerSites,
                    cterms: Boundaries::SitesAfterStart,
                    skips_ok,
                }],
                Digestion::Partial => vec![
                    Pass {
                        nterms: Boundaries::Starts,
                        cterms: Boundaries::SitesAfterStart,
                        skips_ok,
                    },
                    Pass {
                        nterms: Boundaries::InnerSites,
                        cterms: Boundaries::NonSites,
                        skips_ok,
                    },
                ],
                Digestion::NonSpecific => vec![Pass {
                    nterms: Boundaries::Starts,
                    cterms: Boundaries::Ends,
                    skips_ok: true,
                }],
            }
        };

        Self {
            positions: table.all_positions(),
            table,
            constraint,
            water: masses.water(),
            protein_id,
            is_decoy: protein.is_decoy(),
            passes,
            scan: Scan::default(),
        }
    }

    fn candidate(&self, n: u32, c: u32, mass: f64) -> PeptideCandidate {
        PeptideCandidate {
            protein_id: self.protein_id,
            start: n,
            length: c - n,
            mass,
            is_decoy: self.is_decoy,
            cleavage: CleavageType::from_ends(self.table.is_site(n), self.table.is_site(c)),
        }
    }
}

impl Iterator for CleavageEnumerator<'_> {
    type Item = PeptideCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        let min_length = self.constraint.min_length();
        let max_length = self.constraint.max_length();

        while let Some(&pass) = self.passes.get(self.scan.pass) {
            let nterms = pass.nterms.resolve(&self.table, &self.positions);
            let Some(&n) = nterms.get(self.scan.n) else {
                self.scan.advance_pass();
                continue;
            };

            let mut emitted = None;
            let cterms = pass.cterms.resolve(&self.table, &self.positions);
            while let Some(&c) = cterms.get(self.scan.c) {
                let idx = self.scan.c;
                self.scan.c += 1;
                if !pass.skips_ok && self.table.skips_site(n, c) {
                    break;
                }
                if c <= n {
                    continue;
                }
                let length = c - n;
                if length < min_length {
                    continue;
                }
                if length > max_length {
                    break;
                }
                if !self.scan.found_start {
                    self.scan.next_resume = idx;
                    self.scan.found_start = true;
                }
                if self.table.spans_unknown(n, c) {
                    continue;
                }
                let mass = self.table.residue_mass(n, c) + self.water;
                if self.constraint.mass_in_range(mass) {
                    emitted = Some(self.candidate(n, c, mass));
                    break;
                }
            }

            match emitted {
                Some(candidate) => return Some(candidate),
                None => self.scan.advance_nterm(),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::digest::enzyme::Enzyme;
    use std::collections::BTreeSet;

    fn constraint(digestion: Digestion, min: u32, max: u32, missed: bool) -> EnzymeConstraint {
        EnzymeConstraint::builder()
            .enzyme(Enzyme::Trypsin)
            .digestion(digestion)
            .length_range(min, max)
            .mass_range(0.0, 100_000.0)
            .missed_cleavages(missed)
            .build()
            .unwrap()
    }

    fn sequences(protein: &Protein, constraint: &EnzymeConstraint) -> BTreeSet<String> {
        CleavageEnumerator::new(0, protein, constraint, &MassTable::default())
            .map(|c| c.sequence(protein).unwrap().to_string())
            .collect()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn full_trypsin_digest_without_missed_cleavages() {
        let protein = Protein::new("P1", "MKAAPKR");
        let found = sequences(&protein, &constraint(Digestion::Full, 1, 7, false));
        assert_eq!(found, set(&["MK", "AAPK", "R"]));
    }

    #[test]
    fn full_trypsin_digest_with_missed_cleavages() {
        let protein = Protein::new("P1", "MKAAPKR");
        let found = sequences(&protein, &constraint(Digestion::Full, 1, 7, true));
        assert_eq!(
            found,
            set(&["MK", "AAPK", "R", "MKAAPK", "AAPKR", "MKAAPKR"])
        );
    }

    #[test]
    fn lysine_before_proline_does_not_cleave() {
        let protein = Protein::new("P1", "MKPAKR");
        let found = sequences(&protein, &constraint(Digestion::Full, 1, 10, false));
        assert_eq!(found, set(&["MKPAK", "R"]));
    }

    #[test]
    fn non_specific_digest_yields_every_window() {
        let protein = Protein::new("P1", "GASPV");
        let constraint = constraint(Digestion::NonSpecific, 2, 3, false);
        let masses = MassTable::default();
        let found = CleavageEnumerator::new(0, &protein, &constraint, &masses);
        assert_eq!(found.count(), count_max_peptides(5, 2, 3));
        assert_eq!(count_max_peptides(5, 2, 3), 4 + 3);
    }

    #[test]
    fn partial_digest_has_at_least_one_enzymatic_end_and_no_duplicates() {
        let protein = Protein::new("P1", "MKAAPKRGEK");
        let constraint = constraint(Digestion::Partial, 1, 10, false);
        let candidates: Vec<_> =
            CleavageEnumerator::new(0, &protein, &constraint, &MassTable::default()).collect();
        let windows: BTreeSet<(u32, u32)> =
            candidates.iter().map(|c| (c.start, c.length)).collect();
        assert_eq!(windows.len(), candidates.len());
        assert!(candidates
            .iter()
            .all(|c| c.cleavage != CleavageType::NonSpecific));
        // Semi-specific at the C-terminus and ending at the protein end.
        assert!(windows.contains(&(8, 2)));
        assert!(windows.contains(&(2, 2)));
    }

    #[test]
    fn partial_digest_matches_brute_force() {
        let protein = Protein::new("P1", "MKAAPKRGEKLLRPQK");
        let constraint = constraint(Digestion::Partial, 1, 30, true);
        let table = CleavagePositionTable::build(protein.sequence(), &constraint, &MassTable::default());
        let len = protein.len() as u32;
        let mut expected = BTreeSet::new();
        for n in 0..len {
            for c in n + 1..=len {
                if table.is_site(n) || table.is_site(c) {
                    expected.insert((n, c - n));
                }
            }
        }
        let found: BTreeSet<(u32, u32)> =
            CleavageEnumerator::new(0, &protein, &constraint, &MassTable::default())
                .map(|c| (c.start, c.length))
                .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn protein_shorter_than_min_length_yields_nothing() {
        let protein = Protein::new("P1", "MKR");
        let found = sequences(&protein, &constraint(Digestion::Full, 6, 50, true));
        assert!(found.is_empty());
    }

    #[test]
    fn windows_with_unknown_residues_are_skipped() {
        let protein = Protein::new("P1", "GAXSKR");
        let found = sequences(&protein, &constraint(Digestion::NonSpecific, 1, 6, true));
        assert!(found.iter().all(|s| !s.contains('X')));
        assert!(found.contains("GA") && found.contains("SKR"));
    }

    #[test]
    fn full_digest_boundaries_are_sites_and_skip_nothing() {
        let protein = Protein::new("P1", "MAKRGLVKPGDEKRWSTK");
        let constraint = constraint(Digestion::Full, 1, 30, false);
        let table = CleavagePositionTable::build(protein.sequence(), &constraint, &MassTable::default());
        for candidate in CleavageEnumerator::new(0, &protein, &constraint, &MassTable::default()) {
            let end = candidate.start + candidate.length;
            assert!(table.is_site(candidate.start) && table.is_site(end));
            assert!(!table.skips_site(candidate.start, end));
            assert_eq!(candidate.cleavage, CleavageType::Full);
        }
    }

    #[test]
    fn length_and_mass_filters_match_brute_force() {
        let masses = MassTable::default();
        let protein = Protein::new("P1", "MKWVTFISLLLLFSSAYSRGVFRRDTHK");
        let constraint = EnzymeConstraint::builder()
            .enzyme(Enzyme::NoEnzyme)
            .digestion(Digestion::NonSpecific)
            .length_range(3, 9)
            .mass_range(400.0, 900.0)
            .build()
            .unwrap();

        let mut expected = BTreeSet::new();
        let sequence = protein.sequence();
        for start in 0..sequence.len() {
            for end in start + 1..=sequence.len() {
                let length = (end - start) as u32;
                let mass = masses.peptide_mass(&sequence[start..end]).unwrap();
                if constraint.length_in_range(length) && constraint.mass_in_range(mass) {
                    expected.insert((start as u32, length));
                }
            }
        }
        let found: BTreeSet<(u32, u32)> =
            CleavageEnumerator::new(0, &protein, &constraint, &masses)
                .inspect(|c| {
                    assert!(constraint.mass_in_range(c.mass));
                    assert!(constraint.length_in_range(c.length));
                })
                .map(|c| (c.start, c.length))
                .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn candidate_mass_includes_water() {
        let masses = MassTable::default();
        let protein = Protein::new("P1", "MKAAPKR");
        let candidate = CleavageEnumerator::new(
            3,
            &protein,
            &constraint(Digestion::Full, 2, 2, false),
            &masses,
        )
        .next()
        .unwrap();
        assert_eq!(candidate.protein_id, 3);
        assert!((candidate.mass - masses.peptide_mass(b"MK").unwrap()).abs() < 1e-9);
    }

    #[test]
    fn candidates_are_produced_on_demand() {
        let protein = Protein::new("P1", &"ACDEFGHIKLMNPQRSTVWY".repeat(50));
        let constraint = constraint(Digestion::NonSpecific, 1, 1000, true);
        let mut enumerator =
            CleavageEnumerator::new(0, &protein, &constraint, &MassTable::default());
        let first: Vec<(u32, u32)> = enumerator.by_ref().take(3).map(|c| (c.start, c.length)).collect();
        assert_eq!(first, vec![(0, 1), (0, 2), (0, 3)]);
        assert_eq!(enumerator.scan.n, 0);
        assert_eq!(enumerator.next().map(|c| (c.start, c.length)), Some((0, 4)));
    }

    #[test]
    fn count_max_peptides_clamps_to_protein_length() {
        assert_eq!(count_max_peptides(3, 1, 10), 3 + 2 + 1);
        assert_eq!(count_max_peptides(3, 5, 10), 0);
    }
}
