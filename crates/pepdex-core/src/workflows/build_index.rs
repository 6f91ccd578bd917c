use crate::core::digest::{CleavageEnumerator, DecoyFormat, DecoyGenerator};
use crate::core::io::manifest::{IndexHeader, MANIFEST_FILE, Manifest, StaticMod};
use crate::core::io::proteins::PROTEINS_FILE;
use crate::core::io::traits::IndexFile;
use crate::core::models::peptide::PeptideCandidate;
use crate::core::models::protein::{Protein, ProteinTable};
use crate::engine::builder::IndexBuilder;
use crate::engine::config::IndexConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use chrono::Utc;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub const README_FILE: &str = "README";

/// Proteins enumerated together before their candidates are routed to bins.
const ENUMERATION_CHUNK: usize = 512;

const README_TEXT: &str = "\
This directory is a pepdex peptide index.

  manifest.toml  build parameters and the list of bin files with their mass ranges
  proteins.idx   record stream of every target and decoy protein
  bin_NNNNN      record streams of peptides, sorted by ascending neutral mass

Bin files are only meaningful together with proteins.idx; do not mix files
from different builds.
";

#[derive(Debug, Clone, PartialEq)]
pub struct BuildSummary {
    pub output: PathBuf,
    /// `true` when the output already existed and nothing was written.
    pub skipped: bool,
    pub target_proteins: usize,
    pub decoy_proteins: usize,
    pub peptides: u64,
    pub bins: usize,
}

impl BuildSummary {
    fn skipped(output: &Path) -> Self {
        Self {
            output: output.to_path_buf(),
            skipped: true,
            target_proteins: 0,
            decoy_proteins: 0,
            peptides: 0,
            bins: 0,
        }
    }
}

#[instrument(skip_all, name = "build_index_workflow", fields(output = %output.display()))]
pub fn run(
    proteins: Vec<Protein>,
    output: &Path,
    config: &IndexConfig,
    reporter: &ProgressReporter,
) -> Result<BuildSummary, EngineError> {
    // === Phase 0: Preparation ===
    if output.exists() {
        warn!("Index directory already exists; leaving it untouched.");
        return Ok(BuildSummary::skipped(output));
    }
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let staging = tempfile::Builder::new()
        .prefix(".pepdex-build-")
        .tempdir_in(parent)
        .map_err(|e| EngineError::io(parent.display().to_string(), e))?;
    info!(
        staging = %staging.path().display(),
        proteins = proteins.len(),
        "Starting index build."
    );

    let targets: ProteinTable = proteins.into_iter().collect();
    let mut builder = IndexBuilder::new(config, staging.path());

    // === Phase 1: Digestion and bin routing ===
    let decoy_records = reporter.phase("Digesting proteins", || {
        digest_into_bins(&targets, config, &mut builder, reporter)
    })?;

    let decoy_count = decoy_records.len();
    let mut table = targets;
    let target_count = table.len();
    for record in decoy_records {
        table.push(record);
    }
    let peptides = builder.received();

    // === Phase 2: Sorting bins ===
    let bins = reporter.phase("Sorting bins", || builder.finish(&table, reporter))?;
    let bin_count = bins.len();

    // === Phase 3: Metadata ===
    reporter.phase("Writing metadata", || -> Result<(), EngineError> {
        table.write_to_path(staging.path().join(PROTEINS_FILE))?;
        let manifest = Manifest {
            header: index_header(config),
            bins,
        };
        manifest.write_to_path(staging.path().join(MANIFEST_FILE))?;
        let readme = staging.path().join(README_FILE);
        fs::write(&readme, README_TEXT)
            .map_err(|e| EngineError::io(readme.display().to_string(), e))?;
        Ok(())
    })?;

    // === Phase 4: Publish ===
    let staged = staging.keep();
    if let Err(e) = fs::rename(&staged, output) {
        if let Err(cleanup) = fs::remove_dir_all(&staged) {
            warn!(error = %cleanup, path = %staged.display(), "Failed to remove staging directory");
        }
        return Err(EngineError::io(output.display().to_string(), e));
    }

    info!(
        targets = target_count,
        decoys = decoy_count,
        peptides,
        bins = bin_count,
        "Index build complete."
    );
    Ok(BuildSummary {
        output: output.to_path_buf(),
        skipped: false,
        target_proteins: target_count,
        decoy_proteins: decoy_count,
        peptides,
        bins: bin_count,
    })
}

/// Enumerates every target, routes targets and their decoys to the builder and
/// returns the decoy protein records in the order their indices were assigned.
fn digest_into_bins(
    targets: &ProteinTable,
    config: &IndexConfig,
    builder: &mut IndexBuilder,
    reporter: &ProgressReporter,
) -> Result<Vec<Protein>, EngineError> {
    let mut decoys = DecoyGenerator::new(config.decoys, config.seed);
    let mut decoy_records = Vec::new();
    let mut decoyed: HashSet<String> = HashSet::new();
    let first_decoy_index = targets.len();

    reporter.report(Progress::TaskStart {
        total_steps: targets.len() as u64,
    });
    let ids: Vec<u32> = targets.iter().map(|(id, _)| id).collect();
    for chunk in ids.chunks(ENUMERATION_CHUNK) {
        #[cfg(not(feature = "parallel"))]
        let iterator = chunk.iter();

        #[cfg(feature = "parallel")]
        let iterator = chunk.par_iter();

        let enumerated: Vec<(u32, Vec<PeptideCandidate>)> = iterator
            .filter_map(|&id| targets.get(id).map(|protein| (id, protein)))
            .map(|(id, protein)| {
                let candidates: Vec<PeptideCandidate> =
                    CleavageEnumerator::new(id, protein, &config.constraint, &config.masses)
                        .collect();
                (id, candidates)
            })
            .collect();

        for (id, candidates) in enumerated {
            let Some(protein) = targets.get(id) else {
                continue;
            };
            debug!(protein = protein.id(), candidates = candidates.len(), "Protein digested");
            for candidate in &candidates {
                builder.add(candidate)?;
                if !decoys.is_enabled() {
                    continue;
                }
                if config.is_unique {
                    let Some(sequence) = candidate.sequence(protein) else {
                        continue;
                    };
                    if !decoyed.insert(sequence.to_string()) {
                        continue;
                    }
                }
                let index = (first_decoy_index + decoy_records.len()) as u32;
                if let Some(decoy) = decoys.make_decoy(candidate, protein, index) {
                    builder.add(&decoy.candidate)?;
                    decoy_records.push(decoy.protein);
                }
            }
            reporter.report(Progress::TaskIncrement);
        }
    }
    reporter.report(Progress::TaskFinish);

    if decoys.format() != DecoyFormat::None && decoy_records.is_empty() && builder.received() > 0 {
        warn!("Decoys were requested but no distinct decoy peptide could be generated.");
    }
    Ok(decoy_records)
}

fn index_header(config: &IndexConfig) -> IndexHeader {
    let constraint = &config.constraint;
    IndexHeader {
        min_mass: constraint.min_mass(),
        max_mass: constraint.max_mass(),
        min_length: constraint.min_length(),
        max_length: constraint.max_length(),
        enzyme: constraint.enzyme(),
        digestion: constraint.digestion(),
        missed_cleavages: constraint.missed_cleavages_allowed(),
        mass_type: constraint.mass_type(),
        is_unique: config.is_unique,
        peak_diffs: config.store_peak_diffs,
        decoys: config.decoys,
        bin_width: config.bin_width,
        created: Utc::now(),
        static_mods: config
            .masses
            .static_mods()
            .map(|(residue, delta)| StaticMod { residue, delta })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::digest::{Digestion, Enzyme, EnzymeConstraint};
    use crate::core::mass::table::MassTable;
    use crate::engine::config::IndexConfigBuilder;
    use crate::engine::reader::IndexReader;
    use std::collections::HashMap;

    fn constraint() -> EnzymeConstraint {
        EnzymeConstraint::builder()
            .enzyme(Enzyme::Trypsin)
            .digestion(Digestion::Full)
            .length_range(1, 30)
            .mass_range(0.0, 5000.0)
            .missed_cleavages(true)
            .build()
            .unwrap()
    }

    fn proteins() -> Vec<Protein> {
        vec![
            Protein::new("sp|P1", "MKAAPKRGLSEEKWTTPLR"),
            Protein::new("sp|P2", "AAPKRDDGHIKLLMQPNR"),
            Protein::new("sp|P3", "GGSWRPEPTIDEKVAK"),
        ]
    }

    fn config(unique: bool, decoys: DecoyFormat) -> IndexConfig {
        IndexConfigBuilder::new()
            .constraint(constraint())
            .bin_width(50.0)
            .bin_buffer_capacity(3)
            .is_unique(unique)
            .decoys(decoys)
            .build()
            .unwrap()
    }

    #[test]
    fn bins_partition_the_enumerated_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("index");
        let config = config(false, DecoyFormat::None);
        let summary = run(proteins(), &output, &config, &ProgressReporter::new()).unwrap();
        assert!(!summary.skipped);

        let mut expected: Vec<(String, u64)> = Vec::new();
        for (id, protein) in proteins().iter().enumerate() {
            for c in CleavageEnumerator::new(id as u32, protein, &constraint(), &MassTable::default()) {
                expected.push((c.sequence(protein).unwrap().to_string(), c.mass.to_bits()));
            }
        }
        expected.sort();

        let reader = IndexReader::open(&output).unwrap();
        let mut stored: Vec<(String, u64)> = reader
            .peptides()
            .map(|r| {
                let r = r.unwrap();
                (r.sequence(reader.proteins()).unwrap().to_string(), r.mass.to_bits())
            })
            .collect();
        stored.sort();
        assert_eq!(stored, expected);
        assert_eq!(summary.peptides, expected.len() as u64);
    }

    #[test]
    fn second_build_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("index");
        let config = config(true, DecoyFormat::None);
        run(proteins(), &output, &config, &ProgressReporter::new()).unwrap();
        let manifest_before = fs::read_to_string(output.join(MANIFEST_FILE)).unwrap();

        let summary = run(
            vec![Protein::new("other", "KKKK")],
            &output,
            &config,
            &ProgressReporter::new(),
        )
        .unwrap();
        assert!(summary.skipped);
        assert_eq!(
            fs::read_to_string(output.join(MANIFEST_FILE)).unwrap(),
            manifest_before
        );
    }

    #[test]
    fn staging_directory_is_not_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("index");
        run(proteins(), &output, &config(true, DecoyFormat::Shuffle), &ProgressReporter::new())
            .unwrap();
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name() != "index")
            .collect();
        assert!(leftovers.is_empty());
        assert!(output.join(README_FILE).exists());
        assert!(output.join(PROTEINS_FILE).exists());
    }

    #[test]
    fn shared_peptide_is_stored_once_with_both_sources() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("index");
        run(proteins(), &output, &config(true, DecoyFormat::None), &ProgressReporter::new())
            .unwrap();
        let reader = IndexReader::open(&output).unwrap();
        let by_sequence: HashMap<String, usize> = reader
            .peptides()
            .map(|r| {
                let r = r.unwrap();
                (r.sequence(reader.proteins()).unwrap().to_string(), r.sources.len())
            })
            .collect();
        // AAPK occurs in P1 and P2.
        assert_eq!(by_sequence.get("AAPK"), Some(&2));
        assert_eq!(by_sequence.get("GLSEEK"), Some(&1));
    }

    #[test]
    fn reversed_decoys_share_target_masses() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("index");
        let summary = run(
            proteins(),
            &output,
            &config(true, DecoyFormat::Reverse),
            &ProgressReporter::new(),
        )
        .unwrap();
        assert!(summary.decoy_proteins > 0);

        let reader = IndexReader::open(&output).unwrap();
        assert_eq!(reader.header().decoys, DecoyFormat::Reverse);
        let records: Vec<_> = reader.peptides().map(Result::unwrap).collect();
        let decoy = records
            .iter()
            .find(|r| r.is_decoy && r.length > 3)
            .unwrap();
        let source = decoy.primary_source().unwrap();
        let protein = reader.proteins().get(source.protein_index).unwrap();
        assert!(protein.is_decoy());
        let target = protein.unshuffled(decoy.length as usize).unwrap();
        let masses = MassTable::default();
        let target_mass = masses.peptide_mass(target.as_bytes()).unwrap();
        assert!((target_mass - decoy.mass).abs() < 1e-9);
    }

    #[test]
    fn static_mods_are_recorded_in_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("index");
        let config = IndexConfigBuilder::new()
            .constraint(constraint())
            .masses(MassTable::default().with_static_mod('C', 57.02146).unwrap())
            .build()
            .unwrap();
        run(proteins(), &output, &config, &ProgressReporter::new()).unwrap();
        let reader = IndexReader::open(&output).unwrap();
        assert_eq!(
            reader.header().static_mods,
            vec![StaticMod {
                residue: 'C',
                delta: 57.02146
            }]
        );
        assert_eq!(reader.masses().static_mod(b'C'), Some(57.02146));
    }

    #[test]
    fn empty_database_builds_an_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("index");
        let summary = run(
            Vec::new(),
            &output,
            &config(true, DecoyFormat::None),
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(summary.peptides, 0);
        assert_eq!(summary.bins, 0);
        let reader = IndexReader::open(&output).unwrap();
        assert_eq!(reader.peptides().count(), 0);
    }
}
