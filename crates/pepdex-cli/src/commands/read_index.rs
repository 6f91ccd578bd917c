use crate::cli::ReadIndexArgs;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use pepdex::engine::progress::ProgressReporter;
use pepdex::workflows::read_index::{self, ReadIndexOptions};
use std::fs::File;
use std::io::{self, BufWriter};
use tracing::info;

pub fn run(args: ReadIndexArgs) -> Result<()> {
    let options = ReadIndexOptions {
        skip_decoys: args.skip_decoys,
    };

    let rows = match &args.output {
        Some(path) => {
            if path.exists() && !args.overwrite {
                return Err(CliError::ListingExists { path: path.clone() });
            }
            let file = File::create(path).map_err(|source| CliError::Listing {
                path: path.clone(),
                source,
            })?;
            let progress_handler = CliProgressHandler::new();
            let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
            let label = path.display().to_string();
            let rows = read_index::run(&args.index, &options, BufWriter::new(file), &label, &reporter)?;
            println!("✓ {} peptide(s) written to: {}", rows, path.display());
            rows
        }
        None => {
            // Progress output would interleave with the listing on a terminal.
            let stdout = io::stdout().lock();
            read_index::run(
                &args.index,
                &options,
                BufWriter::new(stdout),
                "<stdout>",
                &ProgressReporter::new(),
            )?
        }
    };

    info!(rows, "Peptide listing finished.");
    Ok(())
}
