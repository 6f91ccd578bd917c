use super::bins::BinLayout;
use super::config::IndexConfig;
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use crate::core::io::manifest::BinEntry;
use crate::core::io::records::{RecordKind, RecordReader, RecordWriter};
use crate::core::models::peptide::{IndexedPeptide, PeptideCandidate};
use crate::core::models::protein::ProteinTable;
use crate::core::peaks::context::PeakContext;
use crate::core::peaks::diff::Diff;
use crate::core::peaks::fragments::add_fragment_ions;
use crate::core::peaks::workspace::TheoreticalPeakSet;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// `EMFILE` on every platform the index is built on.
const TOO_MANY_OPEN_FILES: i32 = 24;

type BinWriter = RecordWriter<BufWriter<File>>;

/// Opens a bin file, creating it or appending to an earlier flush.
type BinOpener = Box<dyn FnMut(&Path, bool) -> io::Result<File> + Send + Sync>;

#[derive(Default)]
struct BinSlot {
    buffer: Vec<IndexedPeptide>,
    writer: Option<BinWriter>,
    created: bool,
    written: u64,
}

/// Routes enumerated candidates into mass bins under one directory.
///
/// Bin files are opened lazily, the first time a bin's buffer is flushed, and
/// may be closed and reopened in append mode when the process runs out of
/// file handles. [`IndexBuilder::finish`] sorts every populated bin in place.
pub struct IndexBuilder<'a> {
    config: &'a IndexConfig,
    layout: BinLayout,
    dir: PathBuf,
    slots: Vec<BinSlot>,
    received: u64,
    opener: BinOpener,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(config: &'a IndexConfig, dir: impl Into<PathBuf>) -> Self {
        let layout = BinLayout::for_constraint(&config.constraint, &config.masses, config.bin_width);
        let slots = (0..layout.len()).map(|_| BinSlot::default()).collect();
        debug!(bins = layout.len(), low_mass = layout.low_mass(), "Bin layout computed");
        Self {
            config,
            layout,
            dir: dir.into(),
            slots,
            received: 0,
            opener: Box::new(open_bin_file),
        }
    }

    #[cfg(test)]
    fn with_opener(mut self, opener: BinOpener) -> Self {
        self.opener = opener;
        self
    }

    pub fn layout(&self) -> &BinLayout {
        &self.layout
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn add(&mut self, candidate: &PeptideCandidate) -> Result<(), EngineError> {
        let index = self.layout.bin_of(candidate.mass).ok_or_else(|| {
            EngineError::Internal(format!(
                "peptide mass {} lies outside the bin layout starting at {}",
                candidate.mass,
                self.layout.low_mass()
            ))
        })?;
        self.received += 1;
        let slot = &mut self.slots[index];
        slot.buffer.push(IndexedPeptide::from_candidate(candidate));
        if slot.buffer.len() > self.config.bin_buffer_capacity {
            self.flush_bin(index)?;
        }
        Ok(())
    }

    fn bin_path(&self, index: usize) -> PathBuf {
        self.dir.join(BinLayout::file_name(index))
    }

    fn flush_bin(&mut self, index: usize) -> Result<(), EngineError> {
        if self.slots[index].buffer.is_empty() {
            return Ok(());
        }
        if self.slots[index].writer.is_none() {
            self.open_bin(index)?;
        }
        let slot = &mut self.slots[index];
        let Some(writer) = slot.writer.as_mut() else {
            return Err(EngineError::Internal(format!(
                "bin {index} has no open writer after opening"
            )));
        };
        for record in slot.buffer.drain(..) {
            writer.write(&record)?;
            slot.written += 1;
        }
        Ok(())
    }

    fn open_bin(&mut self, index: usize) -> Result<(), EngineError> {
        let path = self.bin_path(index);
        let append = self.slots[index].created;
        let file = match (self.opener)(&path, append) {
            Ok(file) => file,
            Err(e) if is_handle_exhaustion(&e) => {
                let closed = self.close_idle_writers(index)?;
                warn!(
                    closed,
                    path = %path.display(),
                    "Too many open files; closed idle bin handles and retrying once"
                );
                (self.opener)(&path, append).map_err(|source| {
                    if is_handle_exhaustion(&source) {
                        EngineError::HandleExhaustion {
                            path: path.display().to_string(),
                            source,
                        }
                    } else {
                        EngineError::io(path.display().to_string(), source)
                    }
                })?
            }
            Err(e) => return Err(EngineError::io(path.display().to_string(), e)),
        };

        let label = path.display().to_string();
        let slot = &mut self.slots[index];
        let writer = if append {
            RecordWriter::resume(BufWriter::new(file), label)
        } else {
            RecordWriter::new(BufWriter::new(file), label, RecordKind::Peptides)?
        };
        slot.writer = Some(writer);
        slot.created = true;
        Ok(())
    }

    /// Flushes and drops every open writer except `keep`.
    fn close_idle_writers(&mut self, keep: usize) -> Result<usize, EngineError> {
        let mut closed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if index == keep {
                continue;
            }
            if let Some(writer) = slot.writer.take() {
                writer.finish()?;
                closed += 1;
            }
        }
        Ok(closed)
    }

    /// Flushes every buffer, closes all handles and sorts each populated bin.
    ///
    /// Returns one manifest entry per non-empty bin, in mass order.
    pub fn finish(
        mut self,
        proteins: &ProteinTable,
        reporter: &ProgressReporter,
    ) -> Result<Vec<BinEntry>, EngineError> {
        for index in 0..self.slots.len() {
            self.flush_bin(index)?;
        }
        for slot in &mut self.slots {
            if let Some(writer) = slot.writer.take() {
                writer.finish()?;
            }
        }

        let populated: Vec<(usize, u64)> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.created)
            .map(|(index, slot)| (index, slot.written))
            .collect();
        info!(
            peptides = self.received,
            bins = populated.len(),
            "All candidates routed; sorting bins"
        );

        reporter.report(Progress::TaskStart {
            total_steps: populated.len() as u64,
        });

        #[cfg(not(feature = "parallel"))]
        let iterator = populated.iter();

        #[cfg(feature = "parallel")]
        let iterator = populated.par_iter();

        let entries = iterator
            .map(|&(index, expected)| {
                let entry = self.sort_bin(index, expected, proteins);
                reporter.report(Progress::TaskIncrement);
                entry
            })
            .collect::<Result<Vec<BinEntry>, EngineError>>();

        reporter.report(Progress::TaskFinish);
        entries
    }

    /// Re-reads one bin, sorts it by mass, merges duplicates and rewrites it.
    fn sort_bin(
        &self,
        index: usize,
        expected: u64,
        proteins: &ProteinTable,
    ) -> Result<BinEntry, EngineError> {
        let path = self.bin_path(index);
        let label = path.display().to_string();
        let mut records = RecordReader::open(&path, RecordKind::Peptides)?
            .records::<IndexedPeptide>()
            .collect::<Result<Vec<_>, _>>()?;
        if records.len() as u64 != expected {
            return Err(EngineError::corrupted(
                label,
                format!(
                    "bin holds {} records but {} were written",
                    records.len(),
                    expected
                ),
            ));
        }

        records.sort_by(|a, b| a.mass.total_cmp(&b.mass));
        if self.config.is_unique {
            records = merge_duplicates(records, proteins, &label)?;
        }
        if self.config.store_peak_diffs {
            attach_exceptions(&mut records, proteins, self.config, &label)?;
        }

        let mut writer = RecordWriter::create(&path, RecordKind::Peptides)?;
        for record in &records {
            writer.write(record)?;
        }
        let count = writer.finish()?;
        debug!(bin = %label, records = count, "Bin sorted");

        Ok(BinEntry {
            name: BinLayout::file_name(index),
            start_mass: self.layout.start_mass(index),
            width: self.layout.width(),
            records: count,
        })
    }
}

fn open_bin_file(path: &Path, append: bool) -> io::Result<File> {
    if append {
        OpenOptions::new().append(true).open(path)
    } else {
        File::create(path)
    }
}

fn is_handle_exhaustion(e: &io::Error) -> bool {
    e.raw_os_error() == Some(TOO_MANY_OPEN_FILES)
}

/// Collapses records sharing decoy status and sequence into the first one, in
/// mass order, concatenating their sources.
fn merge_duplicates(
    records: Vec<IndexedPeptide>,
    proteins: &ProteinTable,
    label: &str,
) -> Result<Vec<IndexedPeptide>, EngineError> {
    let mut merged: Vec<IndexedPeptide> = Vec::with_capacity(records.len());
    let mut seen: HashMap<(bool, &str), usize> = HashMap::with_capacity(records.len());
    for record in records {
        let sequence = record.sequence(proteins).ok_or_else(|| {
            EngineError::corrupted(label, "record points outside the protein table")
        })?;
        match seen.get(&(record.is_decoy, sequence)) {
            Some(&slot) => merged[slot].sources.extend(record.sources),
            None => {
                seen.insert((record.is_decoy, sequence), merged.len());
                merged.push(record);
            }
        }
    }
    Ok(merged)
}

fn attach_exceptions(
    records: &mut [IndexedPeptide],
    proteins: &ProteinTable,
    config: &IndexConfig,
    label: &str,
) -> Result<(), EngineError> {
    let mut diff = Diff::new(PeakContext::default());
    for record in records {
        let sequence = record.sequence(proteins).ok_or_else(|| {
            EngineError::corrupted(label, "record points outside the protein table")
        })?;
        diff.clear();
        add_fragment_ions(&mut diff, &config.masses, sequence.as_bytes())?;
        record.exceptions = Some(diff.exceptions());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::digest::{Digestion, Enzyme, EnzymeConstraint};
    use crate::core::models::peptide::CleavageType;
    use crate::core::models::protein::Protein;
    use crate::engine::config::IndexConfigBuilder;
    use tempfile::tempdir;

    fn config(capacity: usize, unique: bool, diffs: bool) -> IndexConfig {
        let constraint = EnzymeConstraint::builder()
            .enzyme(Enzyme::Trypsin)
            .digestion(Digestion::Full)
            .length_range(1, 10)
            .mass_range(0.0, 2000.0)
            .build()
            .unwrap();
        IndexConfigBuilder::new()
            .constraint(constraint)
            .bin_width(100.0)
            .bin_buffer_capacity(capacity)
            .is_unique(unique)
            .store_peak_diffs(diffs)
            .build()
            .unwrap()
    }

    fn candidate(
        proteins: &ProteinTable,
        config: &IndexConfig,
        protein_id: u32,
        start: u32,
        length: u32,
    ) -> PeptideCandidate {
        let protein = proteins.get(protein_id).unwrap();
        let sequence = protein.subsequence(start as usize, length as usize).unwrap();
        PeptideCandidate {
            protein_id,
            start,
            length,
            mass: config.masses.peptide_mass(sequence.as_bytes()).unwrap(),
            is_decoy: false,
            cleavage: CleavageType::Full,
        }
    }

    fn read_bin(path: &Path) -> Vec<IndexedPeptide> {
        RecordReader::open(path, RecordKind::Peptides)
            .unwrap()
            .records()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn bins_are_sorted_after_multiple_flushes() {
        let dir = tempdir().unwrap();
        let config = config(1, false, false);
        let proteins: ProteinTable = [Protein::new("P1", "GGGGWWWWGG")].into_iter().collect();
        let mut builder = IndexBuilder::new(&config, dir.path());
        for (start, length) in [(0, 4), (4, 4), (0, 2), (2, 3), (8, 2), (1, 1)] {
            builder
                .add(&candidate(&proteins, &config, 0, start, length))
                .unwrap();
        }
        let entries = builder.finish(&proteins, &ProgressReporter::new()).unwrap();
        let total: u64 = entries.iter().map(|e| e.records).sum();
        assert_eq!(total, 6);

        for entry in &entries {
            let records = read_bin(&dir.path().join(&entry.name));
            assert_eq!(records.len() as u64, entry.records);
            assert!(records.windows(2).all(|w| w[0].mass <= w[1].mass));
            assert!(
                records
                    .iter()
                    .all(|r| r.mass >= entry.start_mass && r.mass < entry.end_mass())
            );
        }
    }

    #[test]
    fn unique_merge_concatenates_sources() {
        let dir = tempdir().unwrap();
        let config = config(2500, true, false);
        let proteins: ProteinTable = [Protein::new("P1", "AAPKGG"), Protein::new("P2", "GAAPK")]
            .into_iter()
            .collect();
        let mut builder = IndexBuilder::new(&config, dir.path());
        builder.add(&candidate(&proteins, &config, 0, 0, 4)).unwrap();
        builder.add(&candidate(&proteins, &config, 1, 1, 4)).unwrap();
        let entries = builder.finish(&proteins, &ProgressReporter::new()).unwrap();
        assert_eq!(entries.len(), 1);
        let records = read_bin(&dir.path().join(&entries[0].name));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sources.len(), 2);
        assert_eq!(records[0].sources[0].protein_index, 0);
        assert_eq!(records[0].sources[1].protein_index, 1);
        assert_eq!(records[0].sources[1].start, 1);
    }

    #[test]
    fn duplicates_survive_without_unique_merge() {
        let dir = tempdir().unwrap();
        let config = config(2500, false, false);
        let proteins: ProteinTable = [Protein::new("P1", "AAPK"), Protein::new("P2", "AAPK")]
            .into_iter()
            .collect();
        let mut builder = IndexBuilder::new(&config, dir.path());
        builder.add(&candidate(&proteins, &config, 0, 0, 4)).unwrap();
        builder.add(&candidate(&proteins, &config, 1, 0, 4)).unwrap();
        let entries = builder.finish(&proteins, &ProgressReporter::new()).unwrap();
        assert_eq!(entries[0].records, 2);
    }

    #[test]
    fn stored_exceptions_match_a_fresh_diff() {
        let dir = tempdir().unwrap();
        let config = config(2500, true, true);
        let proteins: ProteinTable = [Protein::new("P1", "PEPTIDEK")].into_iter().collect();
        let mut builder = IndexBuilder::new(&config, dir.path());
        builder.add(&candidate(&proteins, &config, 0, 0, 8)).unwrap();
        let entries = builder.finish(&proteins, &ProgressReporter::new()).unwrap();
        let records = read_bin(&dir.path().join(&entries[0].name));

        let mut diff = Diff::new(PeakContext::default());
        add_fragment_ions(&mut diff, &config.masses, b"PEPTIDEK").unwrap();
        assert_eq!(records[0].exceptions, Some(diff.exceptions()));
    }

    #[test]
    fn empty_build_produces_no_entries() {
        let dir = tempdir().unwrap();
        let config = config(2500, true, false);
        let builder = IndexBuilder::new(&config, dir.path());
        let entries = builder
            .finish(&ProteinTable::new(), &ProgressReporter::new())
            .unwrap();
        assert!(entries.is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn reopened_bins_keep_their_earlier_records() {
        let dir = tempdir().unwrap();
        let config = config(1, false, false);
        let proteins: ProteinTable = [Protein::new("P1", "GGGGGGGG")].into_iter().collect();
        let mut builder = IndexBuilder::new(&config, dir.path());
        builder.add(&candidate(&proteins, &config, 0, 0, 3)).unwrap();
        builder.add(&candidate(&proteins, &config, 0, 1, 3)).unwrap();
        let bin = builder
            .layout()
            .bin_of(config.masses.peptide_mass(b"GGG").unwrap())
            .unwrap();
        assert_eq!(builder.close_idle_writers(usize::MAX).unwrap(), 1);
        builder.add(&candidate(&proteins, &config, 0, 2, 3)).unwrap();
        builder.add(&candidate(&proteins, &config, 0, 3, 3)).unwrap();
        assert_eq!(builder.slots[bin].written, 4);
        let entries = builder.finish(&proteins, &ProgressReporter::new()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].records, 4);
    }

    fn exhausted() -> io::Error {
        io::Error::from_raw_os_error(TOO_MANY_OPEN_FILES)
    }

    /// Two proteins whose three-residue peptides land in different bins.
    fn two_bin_setup(config: &IndexConfig) -> (ProteinTable, usize, usize) {
        let proteins: ProteinTable = [Protein::new("P1", "GGGGGGGG"), Protein::new("P2", "WWWWWWWW")]
            .into_iter()
            .collect();
        let layout = BinLayout::for_constraint(&config.constraint, &config.masses, config.bin_width);
        let light = layout
            .bin_of(config.masses.peptide_mass(b"GGG").unwrap())
            .unwrap();
        let heavy = layout
            .bin_of(config.masses.peptide_mass(b"WWW").unwrap())
            .unwrap();
        assert_ne!(light, heavy);
        (proteins, light, heavy)
    }

    #[test]
    fn exhausted_handles_are_released_and_the_open_retried() {
        let dir = tempdir().unwrap();
        let config = config(1, false, false);
        let (proteins, light, heavy) = two_bin_setup(&config);
        let mut calls = 0;
        let mut builder = IndexBuilder::new(&config, dir.path()).with_opener(Box::new(
            move |path: &Path, append: bool| {
                calls += 1;
                if calls == 2 {
                    Err(exhausted())
                } else {
                    open_bin_file(path, append)
                }
            },
        ));

        builder.add(&candidate(&proteins, &config, 0, 0, 3)).unwrap();
        builder.add(&candidate(&proteins, &config, 0, 1, 3)).unwrap();
        assert!(builder.slots[light].writer.is_some());

        builder.add(&candidate(&proteins, &config, 1, 0, 3)).unwrap();
        builder.add(&candidate(&proteins, &config, 1, 1, 3)).unwrap();
        assert!(builder.slots[light].writer.is_none());
        assert!(builder.slots[heavy].writer.is_some());

        builder.add(&candidate(&proteins, &config, 0, 2, 3)).unwrap();
        builder.add(&candidate(&proteins, &config, 0, 3, 3)).unwrap();
        let entries = builder.finish(&proteins, &ProgressReporter::new()).unwrap();
        let counts: Vec<u64> = entries.iter().map(|e| e.records).collect();
        assert_eq!(counts, vec![4, 2]);
    }

    #[test]
    fn persistent_exhaustion_fails_the_build() {
        let dir = tempdir().unwrap();
        let config = config(1, false, false);
        let (proteins, light, _) = two_bin_setup(&config);
        let mut calls = 0;
        let mut builder = IndexBuilder::new(&config, dir.path()).with_opener(Box::new(
            move |path: &Path, append: bool| {
                calls += 1;
                if calls >= 2 {
                    Err(exhausted())
                } else {
                    open_bin_file(path, append)
                }
            },
        ));

        builder.add(&candidate(&proteins, &config, 0, 0, 3)).unwrap();
        builder.add(&candidate(&proteins, &config, 0, 1, 3)).unwrap();
        builder.add(&candidate(&proteins, &config, 1, 0, 3)).unwrap();
        let result = builder.add(&candidate(&proteins, &config, 1, 1, 3));
        assert!(matches!(result, Err(EngineError::HandleExhaustion { .. })));
        assert!(builder.slots[light].writer.is_none());
    }

    #[test]
    fn other_open_failures_are_not_retried() {
        let dir = tempdir().unwrap();
        let config = config(1, false, false);
        let (proteins, _, _) = two_bin_setup(&config);
        let mut builder = IndexBuilder::new(&config, dir.path()).with_opener(Box::new(
            |_: &Path, _: bool| Err(io::Error::from(io::ErrorKind::PermissionDenied)),
        ));
        builder.add(&candidate(&proteins, &config, 0, 0, 3)).unwrap();
        let result = builder.add(&candidate(&proteins, &config, 0, 1, 3));
        assert!(matches!(result, Err(EngineError::Io { .. })));
    }

    #[test]
    fn exhaustion_is_recognised_by_os_error_code() {
        assert!(is_handle_exhaustion(&io::Error::from_raw_os_error(24)));
        assert!(!is_handle_exhaustion(&io::Error::from_raw_os_error(2)));
    }
}
