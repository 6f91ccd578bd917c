use crate::core::mass::table::MassTable;
use phf::{Map, phf_map};
use std::io::{self, Write};
use thiserror::Error;

static COLUMN_NAMES: Map<&'static str, &'static str> = phf_map! {
    "scan" => "scan",
    "charge" => "charge",
    "precursor_mz" => "spectrum precursor m/z",
    "neutral_mass" => "spectrum neutral mass",
    "peptide_mass" => "peptide mass",
    "delta_cn" => "delta_cn",
    "sp_score" => "sp score",
    "sp_rank" => "sp rank",
    "xcorr_score" => "xcorr score",
    "exact_pvalue" => "exact p-value",
    "refactored_score" => "refactored xcorr",
    "xcorr_rank" => "xcorr rank",
    "by_ions_matched" => "b/y ions matched",
    "by_ions_total" => "b/y ions total",
    "matches_spectrum" => "matches/spectrum",
    "sequence" => "sequence",
    "cleavage_type" => "cleavage type",
    "protein_id" => "protein id",
    "flanking_aa" => "flanking aa",
    "unshuffled_sequence" => "unshuffled sequence",
};

/// Report columns in output order.
const COLUMN_ORDER: [&str; 18] = [
    "scan",
    "charge",
    "precursor_mz",
    "neutral_mass",
    "peptide_mass",
    "delta_cn",
    "sp_score",
    "sp_rank",
    "xcorr_score",
    "xcorr_rank",
    "by_ions_matched",
    "by_ions_total",
    "matches_spectrum",
    "sequence",
    "cleavage_type",
    "protein_id",
    "flanking_aa",
    "unshuffled_sequence",
];

const SP_COLUMNS: [&str; 4] = ["sp_score", "sp_rank", "by_ions_matched", "by_ions_total"];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("I/O error on report '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportOptions {
    pub compute_sp: bool,
    pub exact_pvalue: bool,
}

/// Header names for one stream, after the Sp, decoy and exact-p-value filters.
pub fn header_columns(options: ReportOptions, decoy: bool) -> Vec<&'static str> {
    let mut headers = Vec::with_capacity(COLUMN_ORDER.len() + 1);
    for key in COLUMN_ORDER {
        if !options.compute_sp && SP_COLUMNS.contains(&key) {
            continue;
        }
        if !decoy && key == "unshuffled_sequence" {
            continue;
        }
        if options.exact_pvalue && key == "xcorr_score" {
            headers.push(column_name("exact_pvalue"));
            headers.push(column_name("refactored_score"));
        } else {
            headers.push(column_name(key));
        }
    }
    headers
}

fn column_name(key: &'static str) -> &'static str {
    COLUMN_NAMES.get(key).copied().unwrap_or(key)
}

/// Sp score, Sp rank and the b/y ion counts behind the score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpColumns {
    pub score: f64,
    pub rank: u32,
    pub matched_ions: u32,
    pub total_ions: u32,
}

/// One reported match, already resolved to display values.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub scan: u32,
    pub charge: u8,
    pub precursor_mz: f64,
    pub neutral_mass: f64,
    pub peptide_mass: f64,
    pub delta_cn: f64,
    pub sp: Option<SpColumns>,
    pub xcorr: f64,
    pub refactored_xcorr: Option<f64>,
    pub rank: u32,
    pub matches_spectrum: usize,
    pub sequence: String,
    pub cleavage_type: String,
    pub protein_id: String,
    pub flanking_aa: String,
    pub unshuffled_sequence: Option<String>,
}

impl ReportRow {
    fn fields(&self, options: ReportOptions, decoy: bool) -> Vec<String> {
        let mut fields = vec![
            self.scan.to_string(),
            self.charge.to_string(),
            self.precursor_mz.to_string(),
            self.neutral_mass.to_string(),
            self.peptide_mass.to_string(),
            self.delta_cn.to_string(),
        ];
        let sp = self.sp.filter(|_| options.compute_sp);
        if options.compute_sp {
            fields.push(sp.map(|s| s.score.to_string()).unwrap_or_default());
            fields.push(sp.map(|s| s.rank.to_string()).unwrap_or_default());
        }
        fields.push(self.xcorr.to_string());
        if options.exact_pvalue {
            fields.push(self.refactored_xcorr.map(|v| v.to_string()).unwrap_or_default());
        }
        fields.push(self.rank.to_string());
        if options.compute_sp {
            fields.push(sp.map(|s| s.matched_ions.to_string()).unwrap_or_default());
            fields.push(sp.map(|s| s.total_ions.to_string()).unwrap_or_default());
        }
        fields.push(self.matches_spectrum.to_string());
        fields.push(self.sequence.clone());
        fields.push(self.cleavage_type.clone());
        fields.push(self.protein_id.clone());
        fields.push(self.flanking_aa.clone());
        if decoy {
            fields.push(self.unshuffled_sequence.clone().unwrap_or_default());
        }
        fields
    }
}

/// Tab-delimited writer for one report stream; the header is written on creation.
pub struct ReportWriter<W: Write> {
    inner: csv::Writer<W>,
    path: String,
    options: ReportOptions,
    decoy: bool,
    rows: u64,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(
        writer: W,
        path: impl Into<String>,
        options: ReportOptions,
        decoy: bool,
    ) -> Result<Self, ReportError> {
        let mut report = Self {
            inner: tab_writer(writer),
            path: path.into(),
            options,
            decoy,
            rows: 0,
        };
        let headers = header_columns(options, decoy);
        report
            .inner
            .write_record(&headers)
            .map_err(|source| report.csv_error(source))?;
        Ok(report)
    }

    pub fn is_decoy(&self) -> bool {
        self.decoy
    }

    pub fn write_row(&mut self, row: &ReportRow) -> Result<(), ReportError> {
        let fields = row.fields(self.options, self.decoy);
        self.inner
            .write_record(&fields)
            .map_err(|source| self.csv_error(source))?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn finish(mut self) -> Result<u64, ReportError> {
        self.inner.flush().map_err(|source| ReportError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(self.rows)
    }

    fn csv_error(&self, source: csv::Error) -> ReportError {
        ReportError::Csv {
            path: self.path.clone(),
            source,
        }
    }
}

/// A tab-delimited `csv` writer that quotes only when a field demands it.
pub fn tab_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Necessary)
        .has_headers(false)
        .flexible(true)
        .from_writer(writer)
}

/// Inserts `[delta]` after every residue that carries a static modification.
pub fn annotated_sequence(sequence: &str, masses: &MassTable) -> String {
    let mut annotated = String::with_capacity(sequence.len());
    for residue in sequence.bytes() {
        annotated.push(residue as char);
        if let Some(delta) = masses.static_mod(residue) {
            annotated.push_str(&format!("[{delta}]"));
        }
    }
    annotated
}
