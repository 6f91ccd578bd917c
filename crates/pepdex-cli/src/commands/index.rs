use crate::cli::IndexArgs;
use crate::config::PartialIndexConfig;
use crate::error::Result;
use crate::fasta;
use crate::utils::progress::CliProgressHandler;
use pepdex::engine::progress::ProgressReporter;
use pepdex::workflows;
use tracing::{info, warn};

pub fn run(args: IndexArgs) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => PartialIndexConfig::from_file(path)?,
        None => PartialIndexConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args)?;

    info!("Loading protein database from {:?}", &args.fasta);
    let proteins = fasta::read_proteins(&args.fasta)?;
    if proteins.is_empty() {
        warn!("The protein database holds no sequences; the index will be empty.");
    }

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Indexing {} protein(s) with {}...",
        proteins.len(),
        config.constraint.cleavage_label()
    );
    let summary = workflows::build_index::run(proteins, &args.output, &config, &reporter)?;

    if summary.skipped {
        println!(
            "Index '{}' already exists; nothing was written.",
            summary.output.display()
        );
    } else {
        println!(
            "✓ Indexed {} peptide(s) from {} target and {} decoy protein record(s) into {} bin(s) at: {}",
            summary.peptides,
            summary.target_proteins,
            summary.decoy_proteins,
            summary.bins,
            summary.output.display()
        );
    }
    Ok(())
}
