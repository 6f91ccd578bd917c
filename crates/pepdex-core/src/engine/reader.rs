use super::error::EngineError;
use crate::core::digest::EnzymeConstraint;
use crate::core::io::manifest::{BinEntry, IndexHeader, MANIFEST_FILE, Manifest};
use crate::core::io::proteins::PROTEINS_FILE;
use crate::core::io::records::{RecordKind, RecordReader, Records};
use crate::core::io::traits::IndexFile;
use crate::core::mass::table::MassTable;
use crate::core::models::peptide::IndexedPeptide;
use crate::core::models::protein::ProteinTable;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Slack applied when deciding whether a bin overlaps a mass range.
const BIN_OVERLAP_EPSILON: f64 = 1e-4;

/// Read access to a finished index directory.
#[derive(Debug)]
pub struct IndexReader {
    dir: PathBuf,
    manifest: Manifest,
    proteins: ProteinTable,
    masses: MassTable,
}

impl IndexReader {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, EngineError> {
        let dir = dir.as_ref().to_path_buf();
        let manifest = Manifest::read_from_path(dir.join(MANIFEST_FILE))?;
        let proteins = ProteinTable::read_from_path(dir.join(PROTEINS_FILE))?;
        let masses = manifest.header.mass_table()?;

        let label = dir.display().to_string();
        if manifest
            .bins
            .windows(2)
            .any(|w| w[0].start_mass >= w[1].start_mass)
        {
            return Err(EngineError::corrupted(
                label,
                "manifest bins are not in ascending mass order",
            ));
        }
        info!(
            index = %label,
            proteins = proteins.len(),
            bins = manifest.bins.len(),
            "Opened peptide index"
        );
        Ok(Self {
            dir,
            manifest,
            proteins,
            masses,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn header(&self) -> &IndexHeader {
        &self.manifest.header
    }

    pub fn proteins(&self) -> &ProteinTable {
        &self.proteins
    }

    /// Mass table the index was built with, static modifications included.
    pub fn masses(&self) -> &MassTable {
        &self.masses
    }

    /// Rejects queries the index cannot answer completely.
    pub fn check_compatibility(&self, constraint: &EnzymeConstraint) -> Result<(), EngineError> {
        let header = self.header();
        let incompatible = |reason: String| EngineError::Incompatible {
            path: self.dir.display().to_string(),
            reason,
        };

        if header.min_mass > constraint.min_mass() || header.max_mass < constraint.max_mass() {
            return Err(incompatible(format!(
                "index mass range [{}, {}] is narrower than the requested [{}, {}]",
                header.min_mass,
                header.max_mass,
                constraint.min_mass(),
                constraint.max_mass()
            )));
        }
        if header.min_length > constraint.min_length()
            || header.max_length < constraint.max_length()
        {
            return Err(incompatible(format!(
                "index length range [{}, {}] is narrower than the requested [{}, {}]",
                header.min_length,
                header.max_length,
                constraint.min_length(),
                constraint.max_length()
            )));
        }
        if header.digestion != constraint.digestion() {
            return Err(incompatible(format!(
                "index was built with {} digestion, requested {}",
                header.digestion,
                constraint.digestion()
            )));
        }
        if header.missed_cleavages != constraint.missed_cleavages_allowed() {
            return Err(incompatible(format!(
                "index was built with missed cleavages {}, requested {}",
                allowed(header.missed_cleavages),
                allowed(constraint.missed_cleavages_allowed())
            )));
        }
        if header.mass_type != constraint.mass_type() {
            return Err(incompatible(format!(
                "index was built with {} masses, requested {}",
                header.mass_type,
                constraint.mass_type()
            )));
        }
        if header.enzyme != constraint.enzyme() {
            warn!(
                index = header.enzyme.name(),
                requested = constraint.enzyme().name(),
                "Index enzyme differs from the requested one"
            );
        }
        Ok(())
    }

    /// Streams records with `min_mass <= mass <= max_mass`, in ascending mass.
    pub fn peptides_in_range(&self, min_mass: f64, max_mass: f64) -> PeptideStream<'_> {
        let bins: Vec<&BinEntry> = self
            .manifest
            .bins
            .iter()
            .filter(|bin| {
                bin.start_mass <= max_mass + BIN_OVERLAP_EPSILON
                    && bin.end_mass() >= min_mass - BIN_OVERLAP_EPSILON
            })
            .collect();
        debug!(min_mass, max_mass, bins = bins.len(), "Range query");
        PeptideStream::new(&self.dir, bins, min_mass, max_mass)
    }

    /// Streams every record of every bin, in manifest order.
    pub fn peptides(&self) -> PeptideStream<'_> {
        PeptideStream::new(
            &self.dir,
            self.manifest.bins.iter().collect(),
            f64::NEG_INFINITY,
            f64::INFINITY,
        )
    }
}

fn allowed(flag: bool) -> &'static str {
    if flag { "allowed" } else { "disallowed" }
}

struct OpenBin<'a> {
    entry: &'a BinEntry,
    label: String,
    records: Records<BufReader<File>, IndexedPeptide>,
    seen: u64,
}

/// Lazily opens bins one at a time; stops at the first error.
pub struct PeptideStream<'a> {
    dir: &'a Path,
    bins: std::vec::IntoIter<&'a BinEntry>,
    current: Option<OpenBin<'a>>,
    min_mass: f64,
    max_mass: f64,
    done: bool,
}

impl<'a> PeptideStream<'a> {
    fn new(dir: &'a Path, bins: Vec<&'a BinEntry>, min_mass: f64, max_mass: f64) -> Self {
        Self {
            dir,
            bins: bins.into_iter(),
            current: None,
            min_mass,
            max_mass,
            done: false,
        }
    }

    fn fail(&mut self, error: EngineError) -> Option<Result<IndexedPeptide, EngineError>> {
        self.done = true;
        self.current = None;
        Some(Err(error))
    }
}

impl Iterator for PeptideStream<'_> {
    type Item = Result<IndexedPeptide, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            if self.current.is_none() {
                let Some(entry) = self.bins.next() else {
                    self.done = true;
                    return None;
                };
                let path = self.dir.join(&entry.name);
                match RecordReader::open(&path, RecordKind::Peptides) {
                    Ok(reader) => {
                        self.current = Some(OpenBin {
                            entry,
                            label: path.display().to_string(),
                            records: reader.records(),
                            seen: 0,
                        });
                    }
                    Err(e) => return self.fail(e.into()),
                }
            }

            let Some(bin) = self.current.as_mut() else {
                continue;
            };
            match bin.records.next() {
                Some(Ok(record)) => {
                    bin.seen += 1;
                    if bin.seen > bin.entry.records {
                        let error = EngineError::corrupted(
                            bin.label.clone(),
                            format!("more records than the {} declared", bin.entry.records),
                        );
                        return self.fail(error);
                    }
                    if record.sources.is_empty() {
                        let error =
                            EngineError::corrupted(bin.label.clone(), "record has no sources");
                        return self.fail(error);
                    }
                    if record.mass < self.min_mass {
                        continue;
                    }
                    if record.mass > self.max_mass {
                        // Bins are disjoint and ascending, so nothing later can match.
                        self.done = true;
                        self.current = None;
                        return None;
                    }
                    return Some(Ok(record));
                }
                Some(Err(e)) => return self.fail(e.into()),
                None => {
                    if bin.seen != bin.entry.records {
                        let error = EngineError::corrupted(
                            bin.label.clone(),
                            format!(
                                "bin holds {} records, manifest declares {}",
                                bin.seen, bin.entry.records
                            ),
                        );
                        return self.fail(error);
                    }
                    self.current = None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::digest::{DecoyFormat, Digestion, Enzyme};
    use crate::core::io::records::{RecordError, RecordWriter};
    use crate::core::mass::table::MassType;
    use crate::core::models::peptide::{CleavageType, PeptideSource};
    use crate::core::models::protein::Protein;
    use chrono::Utc;
    use std::fs;

    fn header() -> IndexHeader {
        IndexHeader {
            min_mass: 200.0,
            max_mass: 7200.0,
            min_length: 6,
            max_length: 50,
            enzyme: Enzyme::Trypsin,
            digestion: Digestion::Full,
            missed_cleavages: false,
            mass_type: MassType::Mono,
            is_unique: true,
            peak_diffs: false,
            decoys: DecoyFormat::None,
            bin_width: 100.0,
            created: Utc::now(),
            static_mods: Vec::new(),
        }
    }

    fn record(mass: f64) -> IndexedPeptide {
        IndexedPeptide {
            length: 1,
            mass,
            is_decoy: false,
            sources: vec![PeptideSource {
                protein_index: 0,
                cleavage: CleavageType::Full,
                start: 0,
            }],
            exceptions: None,
        }
    }

    /// Writes an index whose bins hold the given masses, one bin per slice.
    fn write_index(dir: &Path, bins: &[(f64, &[f64])]) {
        let proteins: ProteinTable = [Protein::new("P1", "PEPTIDEK")].into_iter().collect();
        proteins.write_to_path(dir.join(PROTEINS_FILE)).unwrap();
        let mut entries = Vec::new();
        for (i, (start_mass, masses)) in bins.iter().enumerate() {
            let name = format!("bin_{:05}", i + 1);
            let mut writer =
                RecordWriter::create(&dir.join(&name), RecordKind::Peptides).unwrap();
            for &mass in masses.iter() {
                writer.write(&record(mass)).unwrap();
            }
            entries.push(BinEntry {
                name,
                start_mass: *start_mass,
                width: 100.0,
                records: writer.finish().unwrap(),
            });
        }
        Manifest {
            header: header(),
            bins: entries,
        }
        .write_to_path(dir.join(MANIFEST_FILE))
        .unwrap();
    }

    fn masses(stream: PeptideStream<'_>) -> Vec<f64> {
        stream.map(|r| r.unwrap().mass).collect()
    }

    fn constraint(min_mass: f64, max_mass: f64) -> EnzymeConstraint {
        EnzymeConstraint::builder()
            .enzyme(Enzyme::Trypsin)
            .digestion(Digestion::Full)
            .length_range(6, 50)
            .mass_range(min_mass, max_mass)
            .build()
            .unwrap()
    }

    #[test]
    fn range_query_spans_bins_in_ascending_mass() {
        let dir = tempfile::tempdir().unwrap();
        write_index(
            dir.path(),
            &[
                (200.0, &[210.0, 250.0, 299.0][..]),
                (300.0, &[300.5, 350.0][..]),
                (400.0, &[401.0][..]),
            ],
        );
        let reader = IndexReader::open(dir.path()).unwrap();
        assert_eq!(
            masses(reader.peptides_in_range(250.0, 350.0)),
            vec![250.0, 299.0, 300.5, 350.0]
        );
        assert_eq!(masses(reader.peptides()).len(), 6);
        assert!(masses(reader.peptides_in_range(500.0, 600.0)).is_empty());
    }

    #[test]
    fn query_wider_than_the_index_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_index(dir.path(), &[]);
        let reader = IndexReader::open(dir.path()).unwrap();
        assert!(reader.check_compatibility(&constraint(200.0, 7200.0)).is_ok());
        assert!(reader.check_compatibility(&constraint(300.0, 5000.0)).is_ok());
        assert!(matches!(
            reader.check_compatibility(&constraint(100.0, 7200.0)),
            Err(EngineError::Incompatible { .. })
        ));
    }

    #[test]
    fn mismatched_policies_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_index(dir.path(), &[]);
        let reader = IndexReader::open(dir.path()).unwrap();
        let partial = EnzymeConstraint::builder()
            .enzyme(Enzyme::Trypsin)
            .digestion(Digestion::Partial)
            .length_range(6, 50)
            .mass_range(200.0, 7200.0)
            .build()
            .unwrap();
        assert!(reader.check_compatibility(&partial).is_err());
        let average = EnzymeConstraint::builder()
            .enzyme(Enzyme::Trypsin)
            .digestion(Digestion::Full)
            .length_range(6, 50)
            .mass_range(200.0, 7200.0)
            .mass_type(MassType::Average)
            .build()
            .unwrap();
        assert!(reader.check_compatibility(&average).is_err());
    }

    #[test]
    fn truncated_bin_is_reported_as_corrupted() {
        let dir = tempfile::tempdir().unwrap();
        write_index(dir.path(), &[(200.0, &[210.0, 250.0, 299.0][..])]);
        let path = dir.path().join("bin_00001");
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

        let reader = IndexReader::open(dir.path()).unwrap();
        let results: Vec<_> = reader.peptides().collect();
        assert_eq!(results.len(), 3);
        assert!(matches!(
            results.last(),
            Some(Err(EngineError::Record(RecordError::Corrupted { .. })))
        ));
    }

    #[test]
    fn record_count_mismatch_is_reported_as_corrupted() {
        let dir = tempfile::tempdir().unwrap();
        write_index(dir.path(), &[(200.0, &[210.0, 250.0][..])]);
        let mut manifest = Manifest::read_from_path(dir.path().join(MANIFEST_FILE)).unwrap();
        manifest.bins[0].records = 3;
        manifest
            .write_to_path(dir.path().join(MANIFEST_FILE))
            .unwrap();

        let reader = IndexReader::open(dir.path()).unwrap();
        let last = reader.peptides().last();
        assert!(matches!(last, Some(Err(EngineError::CorruptedIndex { .. }))));
    }

    #[test]
    fn missing_manifest_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = IndexReader::open(dir.path()).unwrap_err();
        assert!(err.to_string().contains(MANIFEST_FILE));
    }
}
