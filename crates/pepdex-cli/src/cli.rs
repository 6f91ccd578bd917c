use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "The pepdex developers",
    version,
    about = "pepdex - Build and inspect mass-binned peptide indexes for peptide-spectrum search.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel digestion and bin sorting.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Digest a FASTA protein database into an on-disk peptide index.
    Index(IndexArgs),
    /// List every peptide of an index with the proteins it occurs in.
    ReadIndex(ReadIndexArgs),
}

/// Arguments for the `index` subcommand.
#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Path to the protein database in FASTA format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub fasta: PathBuf,

    /// Directory the index is written to. Must not exist yet.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output: PathBuf,

    /// Path to an index configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Digestion Overrides ---
    /// Override the enzyme (e.g., 'trypsin', 'chymotrypsin', 'no-enzyme').
    #[arg(long, value_name = "NAME")]
    pub enzyme: Option<String>,

    /// Override the digestion policy ('full-digest', 'partial-digest', 'non-specific-digest').
    #[arg(long, value_name = "NAME")]
    pub digestion: Option<String>,

    /// Allow peptides that skip internal cleavage sites.
    #[arg(long)]
    pub missed_cleavages: bool,

    // --- Index Overrides ---
    /// Override the decoy generation mode.
    #[arg(long, value_name = "shuffle|reverse|none")]
    pub decoys: Option<String>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S digestion.max-length=40
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `read-index` subcommand.
#[derive(Args, Debug)]
pub struct ReadIndexArgs {
    /// Index directory produced by `pepdex index`.
    #[arg(required = true, value_name = "DIR")]
    pub index: PathBuf,

    /// Write the listing to this file instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Leave decoy peptides out of the listing.
    #[arg(long)]
    pub skip_decoys: bool,

    /// Replace the output file if it already exists.
    #[arg(long)]
    pub overwrite: bool,
}
