use crate::core::io::report::{ReportError, annotated_sequence, tab_writer};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::reader::IndexReader;
use itertools::Itertools;
use std::io::Write;
use std::path::Path;
use tracing::{info, instrument};

const LISTING_HEADER: [&str; 2] = ["sequence", "protein id"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadIndexOptions {
    pub skip_decoys: bool,
}

/// Writes every indexed peptide with the proteins it occurs in.
///
/// Returns the number of peptide rows written.
#[instrument(skip_all, name = "read_index_workflow", fields(index = %index_dir.display()))]
pub fn run<W: Write>(
    index_dir: &Path,
    options: &ReadIndexOptions,
    writer: W,
    label: &str,
    reporter: &ProgressReporter,
) -> Result<u64, EngineError> {
    let index = reporter.phase("Opening index", || IndexReader::open(index_dir))?;
    let total: u64 = index.manifest().bins.iter().map(|bin| bin.records).sum();

    let csv_error = |source| ReportError::Csv {
        path: label.to_string(),
        source,
    };
    let mut out = tab_writer(writer);
    out.write_record(LISTING_HEADER).map_err(csv_error)?;

    let rows = reporter.phase("Listing peptides", || -> Result<u64, EngineError> {
        reporter.report(Progress::TaskStart { total_steps: total });
        let mut rows = 0;
        for record in index.peptides() {
            let record = record?;
            reporter.report(Progress::TaskIncrement);
            if options.skip_decoys && record.is_decoy {
                continue;
            }
            let sequence = record.sequence(index.proteins()).ok_or_else(|| {
                EngineError::corrupted(
                    index_dir.display().to_string(),
                    "peptide source points outside the protein table",
                )
            })?;
            let proteins = record
                .sources
                .iter()
                .filter_map(|source| index.proteins().get(source.protein_index))
                .map(|protein| protein.listing_name())
                .join(";");
            out.write_record([annotated_sequence(sequence, index.masses()), proteins])
                .map_err(csv_error)?;
            rows += 1;
        }
        reporter.report(Progress::TaskFinish);
        Ok(rows)
    })?;

    out.flush().map_err(|source| ReportError::Io {
        path: label.to_string(),
        source,
    })?;
    info!(rows, skip_decoys = options.skip_decoys, "Peptide listing written.");
    Ok(rows)
}
