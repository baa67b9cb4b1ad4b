//! Loading service configuration (PubMed access, lookup limits, category overrides) from TOML.
//!
//! See `ServiceConfig` for the expected schema. Every section is optional:
//!
//! ```toml
//! [pubmed]
//! base_url = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils"
//! api_key = "..."
//! request_timeout_secs = 10
//!
//! [generation]
//! lookup_timeout_secs = 15
//! condition_retmax = 5
//! explanation_retmax = 1
//!
//! [categories.cardiology]
//! title_prefix = "Cardiac Emergency"
//! labs_pool = ["Elevated troponin", "ECG: ST elevation"]
//! ```

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info, warn};

pub const DEFAULT_PUBMED_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
/// A zero timeout would expire every lookup before it starts.
const MIN_LOOKUP_TIMEOUT_SECS: u64 = 1;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct ServiceConfig {
  #[serde(default)]
  pub pubmed: PubMedSettings,
  #[serde(default)]
  pub generation: GenerationSettings,
  /// Per-field overrides keyed by the field key ("cardiology", ...).
  #[serde(default)]
  pub categories: HashMap<String, CategoryOverride>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PubMedSettings {
  pub base_url: String,
  pub api_key: Option<String>,
  pub request_timeout_secs: u64,
}

impl Default for PubMedSettings {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_PUBMED_BASE_URL.into(),
      api_key: None,
      request_timeout_secs: 10,
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
  /// Upper bound for one enrichment step (search + summary).
  pub lookup_timeout_secs: u64,
  pub condition_retmax: u32,
  pub explanation_retmax: u32,
}

impl Default for GenerationSettings {
  fn default() -> Self {
    Self { lookup_timeout_secs: 15, condition_retmax: 5, explanation_retmax: 1 }
  }
}

impl GenerationSettings {
  pub fn lookup_timeout(&self) -> Duration {
    Duration::from_secs(self.lookup_timeout_secs.max(MIN_LOOKUP_TIMEOUT_SECS))
  }
}

/// Partial category definition; only the provided fields replace the built-in ones.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct CategoryOverride {
  #[serde(default)] pub title_prefix: Option<String>,
  #[serde(default)] pub query_base: Option<String>,
  #[serde(default)] pub condition_examples: Option<Vec<String>>,
  #[serde(default)] pub symptoms_pool: Option<Vec<String>>,
  #[serde(default)] pub history_pool: Option<Vec<String>>,
  #[serde(default)] pub vitals_pool: Option<Vec<String>>,
  #[serde(default)] pub labs_pool: Option<Vec<String>>,
}

impl ServiceConfig {
  /// TOML file (if any) first, then PUBMED_* environment variables on top.
  pub fn from_env() -> Self {
    let mut cfg = load_service_config_from_env().unwrap_or_default();
    if let Ok(key) = std::env::var("PUBMED_API_KEY") {
      if !key.trim().is_empty() {
        cfg.pubmed.api_key = Some(key);
      }
    }
    if let Ok(url) = std::env::var("PUBMED_BASE_URL") {
      if !url.trim().is_empty() {
        cfg.pubmed.base_url = url;
      }
    }
    cfg
  }
}

pub fn parse_service_config(s: &str) -> Result<ServiceConfig, toml::de::Error> {
  let mut cfg = toml::from_str::<ServiceConfig>(s)?;
  if cfg.generation.lookup_timeout_secs < MIN_LOOKUP_TIMEOUT_SECS {
    warn!(
      target: "medsky_backend",
      configured = cfg.generation.lookup_timeout_secs,
      used = MIN_LOOKUP_TIMEOUT_SECS,
      "generation.lookup_timeout_secs too small; raising it"
    );
    cfg.generation.lookup_timeout_secs = MIN_LOOKUP_TIMEOUT_SECS;
  }
  Ok(cfg)
}

/// Attempt to load `ServiceConfig` from MEDSKY_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_service_config_from_env() -> Option<ServiceConfig> {
  let path = std::env::var("MEDSKY_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_service_config(&s) {
      Ok(cfg) => {
        info!(target: "medsky_backend", %path, overrides = cfg.categories.len(), "Loaded service config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "medsky_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "medsky_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
