use serde::{Deserialize, Serialize};

/// Reserved leading byte of every decoy protein name.
///
/// Decoy names have the form `MARKER + target_index + '.' + target_name`.
pub const DECOY_MARKER: char = '\u{1}';

/// Human-readable prefix used when a decoy protein name is listed outside a report.
pub const DECOY_LISTING_PREFIX: &str = "decoy_";

/// Placeholder reported for a flanking residue beyond a protein terminus.
pub const TERMINUS_PLACEHOLDER: char = '-';

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protein {
    id: String,
    residues: String,
    length: usize,
}

impl Protein {
    /// Creates a target protein. Residues are upper-cased; `length` covers the whole sequence.
    pub fn new(id: impl Into<String>, residues: impl AsRef<str>) -> Self {
        let residues = residues.as_ref().to_ascii_uppercase();
        let length = residues.len();
        Self {
            id: id.into(),
            residues,
            length,
        }
    }

    /// Creates the decoy record for one decoy peptide.
    ///
    /// The logical sequence is `n_flank + decoy + c_flank`; the target peptide is
    /// appended after the logical length so the unshuffled sequence can be recovered
    /// from the last residues of the record.
    pub fn decoy(
        target_index: u32,
        target_id: &str,
        n_flank: &str,
        decoy: &str,
        c_flank: &str,
        target_peptide: &str,
    ) -> Self {
        let logical = n_flank.len() + decoy.len() + c_flank.len();
        Self {
            id: format!("{DECOY_MARKER}{target_index}.{target_id}"),
            residues: format!("{n_flank}{decoy}{c_flank}{target_peptide}"),
            length: logical,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// All stored residues, including any trailing decoy payload.
    pub fn residues(&self) -> &str {
        &self.residues
    }

    /// Logical length of the protein.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Residues within the logical length, as bytes.
    pub fn sequence(&self) -> &[u8] {
        &self.residues.as_bytes()[..self.length]
    }

    pub fn is_decoy(&self) -> bool {
        is_decoy_name(&self.id)
    }

    /// Peptide substring starting at `start`, or `None` if out of bounds.
    pub fn subsequence(&self, start: usize, length: usize) -> Option<&str> {
        self.residues.get(start..start.checked_add(length)?)
    }

    /// Residues immediately before and after `[start, start + length)`.
    pub fn flanking_residues(&self, start: usize, length: usize) -> (char, char) {
        let bytes = self.residues.as_bytes();
        let n_term = start
            .checked_sub(1)
            .map(|idx| bytes[idx] as char)
            .unwrap_or(TERMINUS_PLACEHOLDER);
        let c_idx = start + length;
        let c_term = if c_idx < self.length {
            bytes[c_idx] as char
        } else {
            TERMINUS_PLACEHOLDER
        };
        (n_term, c_term)
    }

    /// Target index and name a decoy record was derived from.
    pub fn decoy_origin(&self) -> Option<(&str, &str)> {
        let rest = self.id.strip_prefix(DECOY_MARKER)?;
        rest.split_once('.')
    }

    /// Trailing target peptide stored in a decoy record.
    pub fn unshuffled(&self, length: usize) -> Option<&str> {
        let total = self.residues.len();
        self.residues.get(total.checked_sub(length)?..)
    }

    /// Protein identifier as written in a match report.
    ///
    /// Targets encode the 1-based residue offset of the peptide; decoys encode the
    /// index of the target protein they were derived from.
    pub fn report_name(&self, start: usize) -> String {
        match self.decoy_origin() {
            Some((index, name)) => format!("{name}({index})"),
            None => format!("{}({})", self.id, start + 1),
        }
    }

    /// Protein identifier as written in a peptide listing.
    pub fn listing_name(&self) -> String {
        match self.decoy_origin() {
            Some((_, name)) => format!("{DECOY_LISTING_PREFIX}{name}"),
            None => self.id.clone(),
        }
    }
}

pub fn is_decoy_name(name: &str) -> bool {
    name.starts_with(DECOY_MARKER)
}

/// Read-only table of proteins addressed by their load order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProteinTable {
    proteins: Vec<Protein>,
}

impl ProteinTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, protein: Protein) -> u32 {
        self.proteins.push(protein);
        (self.proteins.len() - 1) as u32
    }

    pub fn get(&self, index: u32) -> Option<&Protein> {
        self.proteins.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.proteins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proteins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Protein)> {
        self.proteins
            .iter()
            .enumerate()
            .map(|(idx, protein)| (idx as u32, protein))
    }
}

impl FromIterator<Protein> for ProteinTable {
    fn from_iter<I: IntoIterator<Item = Protein>>(iter: I) -> Self {
        Self {
            proteins: iter.into_iter().collect(),
        }
    }
}
