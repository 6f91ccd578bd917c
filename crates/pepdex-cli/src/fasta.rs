use crate::error::{CliError, Result};
use pepdex::core::models::protein::Protein;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

/// Loads every record of a FASTA file as a target protein.
///
/// The protein id is the first whitespace-delimited word of the header line;
/// sequence lines are concatenated with whitespace removed.
pub fn read_proteins(path: &Path) -> Result<Vec<Protein>> {
    let file = File::open(path).map_err(|e| parse_error(path, e))?;
    parse(BufReader::new(file), path)
}

fn parse<R: BufRead>(reader: R, path: &Path) -> Result<Vec<Protein>> {
    let mut proteins = Vec::new();
    let mut current: Option<(String, String)> = None;

    for (line_index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| parse_error(path, e))?;
        let line = line.trim_end();
        if let Some(header) = line.strip_prefix('>') {
            if let Some((id, residues)) = current.take() {
                push_protein(&mut proteins, id, residues);
            }
            let id = header.split_whitespace().next().unwrap_or_default();
            if id.is_empty() {
                return Err(parse_error(
                    path,
                    anyhow::anyhow!("empty protein header on line {}", line_index + 1),
                ));
            }
            current = Some((id.to_string(), String::new()));
        } else if line.is_empty() || line.starts_with(';') {
            continue;
        } else {
            let Some((_, residues)) = current.as_mut() else {
                return Err(parse_error(
                    path,
                    anyhow::anyhow!("sequence before the first header on line {}", line_index + 1),
                ));
            };
            residues.extend(line.chars().filter(|c| !c.is_whitespace()));
        }
    }
    if let Some((id, residues)) = current.take() {
        push_protein(&mut proteins, id, residues);
    }

    debug!(proteins = proteins.len(), path = ?path, "FASTA database loaded.");
    Ok(proteins)
}

fn push_protein(proteins: &mut Vec<Protein>, id: String, residues: String) {
    if residues.is_empty() {
        warn!(protein = %id, "Skipping protein with an empty sequence.");
        return;
    }
    proteins.push(Protein::new(id, residues));
}

fn parse_error(path: &Path, source: impl Into<anyhow::Error>) -> CliError {
    CliError::Fasta {
        path: path.to_path_buf(),
        source: source.into(),
    }
}
