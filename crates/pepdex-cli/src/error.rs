use pepdex::engine::error::EngineError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] EngineError),

    #[error("Invalid index configuration: {0}")]
    Config(String),

    #[error("Failed to read configuration file '{path}': {source}", path = path.display())]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to read protein database '{path}': {source}", path = path.display())]
    Fasta {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Cannot open log file '{path}': {source}", path = path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write peptide listing to '{path}': {source}", path = path.display())]
    Listing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Peptide listing '{path}' already exists. Pass --overwrite to replace it.",
        path = path.display()
    )]
    ListingExists { path: PathBuf },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn file_errors_name_the_offending_path() {
        let fasta = CliError::Fasta {
            path: PathBuf::from("db/human.fasta"),
            source: anyhow::anyhow!("empty protein header on line 3"),
        };
        assert_eq!(
            fasta.to_string(),
            "Failed to read protein database 'db/human.fasta': empty protein header on line 3"
        );

        let listing = CliError::Listing {
            path: PathBuf::from("out/peptides.tsv"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(listing.to_string().starts_with("Cannot write peptide listing to 'out/peptides.tsv'"));

        let exists = CliError::ListingExists {
            path: PathBuf::from("peptides.tsv"),
        };
        assert!(exists.to_string().contains("--overwrite"));
    }

    #[test]
    fn engine_errors_pass_through_unchanged() {
        let engine = EngineError::Internal("bin 3 has no open writer".to_string());
        let message = engine.to_string();
        assert_eq!(CliError::from(engine).to_string(), message);
    }
}
