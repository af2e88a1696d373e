//! Loader configuration.
//!
//! Layered, lowest precedence first: built-in defaults, an optional TOML file,
//! `NAVOPTIMA_*` environment variables, then command-line flags (applied by
//! the binary).

use std::path::{Path, PathBuf};

use navoptima_core::fact::DEFAULT_BUNKER_PRICE_PER_TON;
use serde::Deserialize;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
  /// CSV extract to load.
  pub extract_path:            PathBuf,
  /// SQLite file holding the `gold_navoptima` schema.
  pub warehouse_path:          PathBuf,
  /// Facts appended per transaction.
  pub batch_size:              usize,
  /// USD per metric ton of fuel.
  pub bunker_price_per_ton:    f64,
  /// Attach an idempotency key to each fact so reruns skip rows already
  /// loaded. When off, every run appends.
  pub fact_dedup:              bool,
  /// Type assigned to vessels until real classification data exists.
  pub vessel_type_placeholder: String,
  /// Category stored on new weather buckets.
  pub weather_category:        String,
}

impl Default for LoaderConfig {
  fn default() -> Self {
    Self {
      extract_path:            PathBuf::from("data/processed/df_final_enriched.csv"),
      warehouse_path:          PathBuf::from("navoptima_warehouse.db"),
      batch_size:              10_000,
      bunker_price_per_ton:    DEFAULT_BUNKER_PRICE_PER_TON,
      fact_dedup:              true,
      vessel_type_placeholder: "Unknown".to_owned(),
      weather_category:        "Measured".to_owned(),
    }
  }
}

impl LoaderConfig {
  /// Build from defaults, the optional file at `path`, and the environment.
  pub fn load(path: Option<&Path>) -> Result<Self> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
      builder = builder.add_source(config::File::from(path).required(false));
    }
    let cfg: Self = builder
      .add_source(config::Environment::with_prefix("NAVOPTIMA").try_parsing(true))
      .build()?
      .try_deserialize()?;
    cfg.validate()?;
    Ok(cfg)
  }

  pub fn validate(&self) -> Result<()> {
    if self.batch_size == 0 {
      return Err(Error::Config("batch_size must be positive".into()));
    }
    if !self.bunker_price_per_ton.is_finite() || self.bunker_price_per_ton <= 0.0 {
      return Err(Error::Config(format!(
        "bunker_price_per_ton must be a positive number, got {}",
        self.bunker_price_per_ton
      )));
    }
    if self.vessel_type_placeholder.trim().is_empty() {
      return Err(Error::Config("vessel_type_placeholder must not be empty".into()));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use super::*;

  #[test]
  fn defaults_are_valid() {
    let cfg = LoaderConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.batch_size, 10_000);
    assert_eq!(cfg.bunker_price_per_ton, 650.0);
    assert!(cfg.fact_dedup);
  }

  #[test]
  fn file_overrides_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "batch_size = 500\nfact_dedup = false\nweather_category = \"Forecast\"").unwrap();

    let cfg = LoaderConfig::load(Some(file.path())).unwrap();
    assert_eq!(cfg.batch_size, 500);
    assert!(!cfg.fact_dedup);
    assert_eq!(cfg.weather_category, "Forecast");
    assert_eq!(cfg.vessel_type_placeholder, "Unknown");
  }

  #[test]
  fn zero_batch_size_is_rejected() {
    let cfg = LoaderConfig { batch_size: 0, ..LoaderConfig::default() };
    assert!(matches!(cfg.validate(), Err(Error::Config(_))));
  }

  #[test]
  fn non_positive_price_is_rejected() {
    let cfg = LoaderConfig { bunker_price_per_ton: 0.0, ..LoaderConfig::default() };
    assert!(cfg.validate().is_err());
    let cfg = LoaderConfig { bunker_price_per_ton: f64::NAN, ..LoaderConfig::default() };
    assert!(cfg.validate().is_err());
  }
}
