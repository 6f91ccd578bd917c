use crate::cli::IndexArgs;
use crate::error::{CliError, Result};
use pepdex::core::digest::{CustomResidueRules, DecoyFormat, Digestion, Enzyme, EnzymeConstraint};
use pepdex::core::mass::table::{MassTable, MassType};
use pepdex::engine::config::{IndexConfig, IndexConfigBuilder};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

const DEFAULT_ENZYME: Enzyme = Enzyme::Trypsin;
const DEFAULT_DIGESTION: Digestion = Digestion::Full;
const DEFAULT_MIN_LENGTH: u32 = 6;
const DEFAULT_MAX_LENGTH: u32 = 50;
const DEFAULT_MIN_MASS: f64 = 200.0;
const DEFAULT_MAX_MASS: f64 = 7200.0;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialDigestionConfig {
    enzyme: Option<String>,
    digestion: Option<String>,
    missed_cleavages: Option<bool>,
    custom_rules: Option<String>,
    min_length: Option<u32>,
    max_length: Option<u32>,
    min_mass: Option<f64>,
    max_mass: Option<f64>,
    mass_type: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialIndexSection {
    bin_width: Option<f64>,
    bin_buffer_capacity: Option<usize>,
    unique: Option<bool>,
    peak_diffs: Option<bool>,
    decoys: Option<String>,
    seed: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialModificationsConfig {
    #[serde(rename = "static")]
    static_mods: Option<BTreeMap<char, f64>>,
}

/// Index settings as read from a TOML file; every field is optional.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PartialIndexConfig {
    digestion: Option<PartialDigestionConfig>,
    index: Option<PartialIndexSection>,
    modifications: Option<PartialModificationsConfig>,
}

impl PartialIndexConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|e| CliError::ConfigFile {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        toml::from_str(&content).map_err(|e| CliError::ConfigFile {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Defaults, then this file, then `-S` pairs, then explicit flags.
    pub fn merge_with_cli(mut self, args: &IndexArgs) -> Result<IndexConfig> {
        self.apply_set_values(&args.set_values)?;

        let digestion = self.digestion.take().unwrap_or_default();
        let index = self.index.take().unwrap_or_default();
        let modifications = self.modifications.take().unwrap_or_default();

        let enzyme = match args.enzyme.as_ref().or(digestion.enzyme.as_ref()) {
            Some(name) => parse_named::<Enzyme>(name, "enzyme")?,
            None => DEFAULT_ENZYME,
        };
        let policy = match args.digestion.as_ref().or(digestion.digestion.as_ref()) {
            Some(name) => parse_named::<Digestion>(name, "digestion")?,
            None => DEFAULT_DIGESTION,
        };
        let mass_type = match digestion.mass_type.as_ref() {
            Some(name) => parse_named::<MassType>(name, "mass-type")?,
            None => MassType::default(),
        };
        let missed_cleavages = args.missed_cleavages || digestion.missed_cleavages.unwrap_or(false);

        let mut constraint = EnzymeConstraint::builder()
            .enzyme(enzyme)
            .digestion(policy)
            .missed_cleavages(missed_cleavages)
            .mass_type(mass_type)
            .length_range(
                digestion.min_length.unwrap_or(DEFAULT_MIN_LENGTH),
                digestion.max_length.unwrap_or(DEFAULT_MAX_LENGTH),
            )
            .mass_range(
                digestion.min_mass.unwrap_or(DEFAULT_MIN_MASS),
                digestion.max_mass.unwrap_or(DEFAULT_MAX_MASS),
            );
        if let Some(rules) = digestion.custom_rules.as_ref() {
            constraint = constraint.custom_residue_sets(parse_named::<CustomResidueRules>(
                rules,
                "custom-rules",
            )?);
        }
        let constraint = constraint
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let mut masses = MassTable::new(mass_type);
        for (residue, delta) in modifications.static_mods.unwrap_or_default() {
            masses = masses
                .with_static_mod(residue, delta)
                .map_err(|e| CliError::Config(e.to_string()))?;
        }

        let decoys = match args.decoys.as_ref().or(index.decoys.as_ref()) {
            Some(name) => parse_named::<DecoyFormat>(name, "decoys")?,
            None => DecoyFormat::default(),
        };

        let mut builder = IndexConfigBuilder::new()
            .constraint(constraint)
            .masses(masses)
            .decoys(decoys);
        if let Some(width) = index.bin_width {
            builder = builder.bin_width(width);
        }
        if let Some(capacity) = index.bin_buffer_capacity {
            builder = builder.bin_buffer_capacity(capacity);
        }
        if let Some(unique) = index.unique {
            builder = builder.is_unique(unique);
        }
        if let Some(diffs) = index.peak_diffs {
            builder = builder.store_peak_diffs(diffs);
        }
        if let Some(seed) = index.seed {
            builder = builder.seed(seed);
        }

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let key = key.trim();
            let value = value.trim();

            if let Some(residue) = key.strip_prefix("modifications.static.") {
                let mut chars = residue.chars();
                let (Some(residue), None) = (chars.next(), chars.next()) else {
                    return Err(CliError::Config(format!(
                        "Static modification keys name one residue, got '{}'",
                        key
                    )));
                };
                self.modifications
                    .get_or_insert_with(Default::default)
                    .static_mods
                    .get_or_insert_with(Default::default)
                    .insert(residue, parse_value(key, value)?);
                continue;
            }

            match key {
                "digestion.enzyme" => {
                    self.digestion.get_or_insert_with(Default::default).enzyme = Some(value.to_string())
                }
                "digestion.digestion" => {
                    self.digestion.get_or_insert_with(Default::default).digestion = Some(value.to_string())
                }
                "digestion.missed-cleavages" => {
                    self.digestion.get_or_insert_with(Default::default).missed_cleavages =
                        Some(parse_value(key, value)?)
                }
                "digestion.custom-rules" => {
                    self.digestion.get_or_insert_with(Default::default).custom_rules =
                        Some(value.to_string())
                }
                "digestion.min-length" => {
                    self.digestion.get_or_insert_with(Default::default).min_length =
                        Some(parse_value(key, value)?)
                }
                "digestion.max-length" => {
                    self.digestion.get_or_insert_with(Default::default).max_length =
                        Some(parse_value(key, value)?)
                }
                "digestion.min-mass" => {
                    self.digestion.get_or_insert_with(Default::default).min_mass =
                        Some(parse_value(key, value)?)
                }
                "digestion.max-mass" => {
                    self.digestion.get_or_insert_with(Default::default).max_mass =
                        Some(parse_value(key, value)?)
                }
                "digestion.mass-type" => {
                    self.digestion.get_or_insert_with(Default::default).mass_type = Some(value.to_string())
                }
                "index.bin-width" => {
                    self.index.get_or_insert_with(Default::default).bin_width = Some(parse_value(key, value)?)
                }
                "index.bin-buffer-capacity" => {
                    self.index.get_or_insert_with(Default::default).bin_buffer_capacity =
                        Some(parse_value(key, value)?)
                }
                "index.unique" => {
                    self.index.get_or_insert_with(Default::default).unique = Some(parse_value(key, value)?)
                }
                "index.peak-diffs" => {
                    self.index.get_or_insert_with(Default::default).peak_diffs = Some(parse_value(key, value)?)
                }
                "index.decoys" => {
                    self.index.get_or_insert_with(Default::default).decoys = Some(value.to_string())
                }
                "index.seed" => {
                    self.index.get_or_insert_with(Default::default).seed = Some(parse_value(key, value)?)
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value)))
}

fn parse_named<T>(value: &str, what: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| CliError::Config(format!("Invalid {}: {}", what, e)))
}
