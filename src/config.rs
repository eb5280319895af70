//! Loading service configuration (data path + extra authored quizzes) from TOML.
//!
//! Schema:
//! ```toml
//! data_path = "./data/topics.json"
//!
//! [[quizzes]]
//! key = "mitosis"
//! display_name = "Mitosis"
//!
//! [[quizzes.questions]]
//! id = "mi-1"
//! conceptId = "mi-phases"
//! type = "mcq"
//! question = "Which phase lines chromosomes up at the cell's equator?"
//! options = ["Metaphase", "Anaphase", "Telophase", "Prophase"]
//! correctAnswer = "Metaphase"
//! explanation = "The metaphase plate."
//! ```

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

use crate::quiz::AuthoredQuiz;

const DEFAULT_DATA_PATH: &str = "./data/topics.json";

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub data_path: Option<PathBuf>,
  #[serde(default)]
  pub quizzes: Vec<AuthoredQuiz>,
}

impl AppConfig {
  /// RETENTION_DATA_PATH wins over the file, then the built-in default.
  pub fn resolved_data_path(&self) -> PathBuf {
    std::env::var("RETENTION_DATA_PATH")
      .ok()
      .filter(|s| !s.trim().is_empty())
      .map(PathBuf::from)
      .or_else(|| self.data_path.clone())
      .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH))
  }
}

pub fn parse_app_config(raw: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str(raw)
}

/// Attempt to load `AppConfig` from RETENTION_CONFIG_PATH. On any IO/parsing error, returns None.
pub fn load_app_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("RETENTION_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_app_config(&s) {
      Ok(cfg) => {
        info!(target: "retention_backend", %path, quizzes = cfg.quizzes.len(), "Loaded config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "retention_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "retention_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
