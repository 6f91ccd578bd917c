use crate::core::digest::DecoyFormat;
use crate::core::io::report::{ReportOptions, ReportRow, ReportWriter, SpColumns, annotated_sequence};
use crate::core::models::peptide::IndexedPeptide;
use crate::core::models::spectrum::Spectrum;
use crate::core::peaks::context::PeakContext;
use crate::core::peaks::diff::Diff;
use crate::core::peaks::fragments::add_fragment_ions;
use crate::core::peaks::variant::{PeakSetKind, PeakSetVariant};
use crate::core::peaks::workspace::{PeakOutput, TheoreticalPeakSet};
use crate::core::scoring::{ObservedPeakSet, SpScorer};
use crate::engine::config::SearchConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::ranker::{MatchRanker, RankedMatch, ScoredCandidate};
use crate::engine::reader::IndexReader;
use itertools::Itertools;
use std::io::Write;
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchSummary {
    pub spectra: usize,
    pub target_rows: u64,
    pub decoy_rows: u64,
}

/// Column options the report writers of a search must be created with.
pub fn report_options(config: &SearchConfig) -> ReportOptions {
    ReportOptions {
        compute_sp: config.compute_sp,
        exact_pvalue: false,
    }
}

#[derive(Debug, Default)]
struct SpectrumRows {
    targets: Vec<ReportRow>,
    decoys: Vec<ReportRow>,
}

#[instrument(skip_all, name = "search_workflow", fields(spectra = spectra.len()))]
pub fn run<T: Write, D: Write>(
    index: &IndexReader,
    spectra: &[Spectrum],
    config: &SearchConfig,
    targets: &mut ReportWriter<T>,
    mut decoys: Option<&mut ReportWriter<D>>,
    reporter: &ProgressReporter,
) -> Result<SearchSummary, EngineError> {
    // === Phase 0: Validation ===
    index.check_compatibility(&config.constraint)?;
    let with_decoys = index.header().decoys != DecoyFormat::None;
    if with_decoys && decoys.is_none() {
        warn!("Index holds decoys but no decoy report was given; decoy matches are ranked but not written.");
    }
    info!(
        peak_set = ?config.peak_set,
        window = config.precursor_window,
        top_n = config.top_n,
        "Starting search."
    );

    // === Phase 1: Scoring ===
    let per_spectrum = reporter.phase("Scoring spectra", || {
        reporter.report(Progress::TaskStart {
            total_steps: spectra.len() as u64,
        });

        #[cfg(not(feature = "parallel"))]
        let results = {
            let mut searcher = Searcher::new(index, config, with_decoys);
            spectra
                .iter()
                .map(|spectrum| {
                    let rows = searcher.search(spectrum);
                    reporter.report(Progress::TaskIncrement);
                    rows
                })
                .collect::<Result<Vec<SpectrumRows>, EngineError>>()
        };

        #[cfg(feature = "parallel")]
        let results = spectra
            .par_iter()
            .map_init(
                || Searcher::new(index, config, with_decoys),
                |searcher, spectrum| {
                    let rows = searcher.search(spectrum);
                    reporter.report(Progress::TaskIncrement);
                    rows
                },
            )
            .collect::<Result<Vec<SpectrumRows>, EngineError>>();

        reporter.report(Progress::TaskFinish);
        results
    })?;

    // === Phase 2: Reporting ===
    let mut summary = SearchSummary {
        spectra: spectra.len(),
        ..SearchSummary::default()
    };
    reporter.phase("Writing reports", || -> Result<(), EngineError> {
        for rows in &per_spectrum {
            for row in &rows.targets {
                targets.write_row(row)?;
                summary.target_rows += 1;
            }
            if let Some(decoys) = decoys.as_deref_mut() {
                for row in &rows.decoys {
                    decoys.write_row(row)?;
                    summary.decoy_rows += 1;
                }
            }
        }
        Ok(())
    })?;

    info!(
        target_rows = summary.target_rows,
        decoy_rows = summary.decoy_rows,
        "Search complete."
    );
    Ok(summary)
}

/// Per-worker scratch state: peak workspaces are reused across candidates.
struct Searcher<'a> {
    index: &'a IndexReader,
    config: &'a SearchConfig,
    ranker: MatchRanker,
    ctx: PeakContext,
    workspace: PeakSetVariant,
    correction: Diff,
    out: PeakOutput,
}

impl<'a> Searcher<'a> {
    fn new(index: &'a IndexReader, config: &'a SearchConfig, with_decoys: bool) -> Self {
        let ctx = PeakContext::default();
        Self {
            index,
            config,
            ranker: MatchRanker::new(config.top_n, with_decoys),
            ctx,
            workspace: PeakSetVariant::new(config.peak_set, ctx),
            correction: Diff::new(ctx),
            out: PeakOutput::default(),
        }
    }

    fn search(&mut self, spectrum: &Spectrum) -> Result<SpectrumRows, EngineError> {
        let observed_ctx = self
            .ctx
            .with_max_bin(self.config.max_mz.map(|mz| self.ctx.bin_count(mz)));
        let observed = ObservedPeakSet::new(spectrum, &observed_ctx);
        let window = self.config.precursor_window;
        let mut rows = SpectrumRows::default();

        for &charge in &spectrum.charges {
            if charge == 0 {
                warn!(scan = spectrum.scan, "Skipping charge state 0");
                continue;
            }
            let neutral_mass = spectrum.neutral_mass(charge);
            let index = self.index;
            let mut records = Vec::new();
            let mut pool = Vec::new();
            for record in index.peptides_in_range(neutral_mass - window, neutral_mass + window) {
                let record = record?;
                let score = self.score(&observed, &record, charge)?;
                pool.push(ScoredCandidate {
                    score,
                    secondary: 0.0,
                    is_decoy: record.is_decoy,
                    key: records.len(),
                });
                records.push(record);
            }

            let mut ranked = self.ranker.rank(pool);
            debug!(
                scan = spectrum.scan,
                charge,
                candidates = ranked.pool_size(),
                "Spectrum scored"
            );
            if ranked.is_empty() {
                continue;
            }
            if self.config.compute_sp {
                let scorer = SpScorer::new(spectrum, charge, self.ctx);
                ranked.assign_sp(|&key| {
                    let sequence = self.sequence(&records[key])?;
                    scorer
                        .score(index.masses(), sequence.as_bytes())
                        .map_err(EngineError::from)
                })?;
            }

            let pool_size = ranked.pool_size();
            for matched in ranked.targets() {
                let row = self.row(spectrum, charge, &records[matched.key], matched, pool_size)?;
                rows.targets.push(row);
            }
            for matched in ranked.decoys() {
                let row = self.row(spectrum, charge, &records[matched.key], matched, pool_size)?;
                rows.decoys.push(row);
            }
        }
        Ok(rows)
    }

    fn sequence(&self, record: &IndexedPeptide) -> Result<&'a str, EngineError> {
        let index = self.index;
        record.sequence(index.proteins()).ok_or_else(|| {
            EngineError::corrupted(
                index.dir().display().to_string(),
                "peptide source points outside the protein table",
            )
        })
    }

    /// Exact score of one candidate: the chosen encoding plus whatever
    /// correction it needs, against the shifted observed cache.
    fn score(
        &mut self,
        observed: &ObservedPeakSet,
        record: &IndexedPeptide,
        charge: u8,
    ) -> Result<f64, EngineError> {
        let sequence = self.sequence(record)?.as_bytes();
        let index = self.index;
        let masses = index.masses();
        self.workspace.clear();
        self.out.clear();
        add_fragment_ions(&mut self.workspace, masses, sequence)?;

        let stored = record
            .exceptions
            .as_ref()
            .filter(|_| self.workspace.is_approximate());
        self.workspace.get_peaks(&mut self.out, stored);
        if self.workspace.kind() != PeakSetKind::MakeAll && stored.is_none() {
            self.correction.clear();
            add_fragment_ions(&mut self.correction, masses, sequence)?;
            self.correction.get_peaks(&mut self.out, None);
        }

        let (pos, neg) = self.out.for_precursor_charge(charge);
        Ok(observed.score_signed(pos, neg))
    }

    fn row(
        &self,
        spectrum: &Spectrum,
        charge: u8,
        record: &IndexedPeptide,
        matched: &RankedMatch<usize>,
        pool_size: usize,
    ) -> Result<ReportRow, EngineError> {
        let proteins = self.index.proteins();
        let sequence = self.sequence(record)?;
        let corrupted = || {
            EngineError::corrupted(
                self.index.dir().display().to_string(),
                "peptide source points outside the protein table",
            )
        };
        let source = record.primary_source().ok_or_else(corrupted)?;
        let protein = proteins.get(source.protein_index).ok_or_else(corrupted)?;

        let protein_id = record
            .sources
            .iter()
            .map(|s| {
                proteins
                    .get(s.protein_index)
                    .map(|p| p.report_name(s.start as usize))
                    .ok_or_else(corrupted)
            })
            .process_results(|mut names| names.join(","))?;
        let (pre, post) = protein.flanking_residues(source.start as usize, record.length as usize);
        let unshuffled_sequence = if record.is_decoy {
            protein
                .unshuffled(record.length as usize)
                .map(str::to_string)
        } else {
            None
        };

        Ok(ReportRow {
            scan: spectrum.scan,
            charge,
            precursor_mz: spectrum.precursor_mz,
            neutral_mass: spectrum.neutral_mass(charge),
            peptide_mass: record.mass,
            delta_cn: matched.delta_cn,
            sp: matched.sp.map(|sp| SpColumns {
                score: sp.data.sp_score,
                rank: sp.rank,
                matched_ions: sp.data.matched_ions,
                total_ions: sp.data.total_ions,
            }),
            xcorr: matched.score,
            refactored_xcorr: None,
            rank: matched.rank,
            matches_spectrum: pool_size,
            sequence: annotated_sequence(sequence, self.index.masses()),
            cleavage_type: self.config.constraint.cleavage_label(),
            protein_id,
            flanking_aa: format!("{pre}{post}"),
            unshuffled_sequence,
        })
    }
}
