//! Configuration management with layered loading
//!
//! Settings precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/orgctl/orgctl.toml`
//! 3. Environment variables: `ORGCTL_*` prefix
//!
//! The type rule table and the metric threshold table are separate JSON
//! files named by the settings. Both are loaded once at startup into typed,
//! schema-checked values; a missing or malformed file is a startup error,
//! never a silent fallback to compiled defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::TypeRules;

/// Unified settings for orgctl.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the organization document
    pub data_dir: PathBuf,
    /// Directory for timestamped backups
    pub backup_dir: PathBuf,
    /// Type rule table (JSON)
    pub type_rules_file: PathBuf,
    /// Metric threshold table (JSON)
    pub thresholds_file: PathBuf,
    /// Per-cost-center metrics map (JSON)
    pub metrics_file: PathBuf,
    /// Number of backups kept after each successful write
    pub backup_retention: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let base = default_data_dir();
        Self {
            data_dir: base.clone(),
            backup_dir: base.join("backups"),
            type_rules_file: base.join("type_rules.json"),
            thresholds_file: base.join("thresholds.json"),
            metrics_file: base.join("metrics.json"),
            backup_retention: 10,
        }
    }
}

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "orgctl")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".orgctl"))
}

/// XDG config directory for orgctl.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "orgctl").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("orgctl.toml"))
}

impl Settings {
    /// The organization document path.
    pub fn organization_file(&self) -> PathBuf {
        self.data_dir.join("organization.json")
    }

    /// Load settings with layered precedence: defaults, then the global
    /// TOML file, then `ORGCTL_*` environment variables.
    pub fn load() -> ApplicationResult<Self> {
        let mut builder = Config::builder();

        let defaults = Settings::default();
        builder = builder
            .set_default("data_dir", defaults.data_dir.to_string_lossy().to_string())
            .map_err(config_err)?
            .set_default(
                "backup_dir",
                defaults.backup_dir.to_string_lossy().to_string(),
            )
            .map_err(config_err)?
            .set_default(
                "type_rules_file",
                defaults.type_rules_file.to_string_lossy().to_string(),
            )
            .map_err(config_err)?
            .set_default(
                "thresholds_file",
                defaults.thresholds_file.to_string_lossy().to_string(),
            )
            .map_err(config_err)?
            .set_default(
                "metrics_file",
                defaults.metrics_file.to_string_lossy().to_string(),
            )
            .map_err(config_err)?
            .set_default("backup_retention", defaults.backup_retention as i64)
            .map_err(config_err)?;

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                builder = builder.add_source(File::from(global_path).required(false));
            }
        }

        builder = builder.add_source(Environment::with_prefix("ORGCTL").separator("__"));

        let config = builder.build().map_err(config_err)?;
        config.try_deserialize().map_err(config_err)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> ApplicationResult<String> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# orgctl configuration
#
# Location: ~/.config/orgctl/orgctl.toml
# Every value can also be set via ORGCTL_* environment variables,
# e.g. ORGCTL_DATA_DIR=/srv/org.

# Directory holding organization.json
# data_dir = "~/.local/share/orgctl"

# Directory for timestamped backups
# backup_dir = "~/.local/share/orgctl/backups"

# Type rule table: JSON map of unit type ->
#   { "label": ..., "allowedChildren": [...], "allowedAtDepth": [...] }
# type_rules_file = "~/.local/share/orgctl/type_rules.json"

# Metric threshold table: JSON map of metric key ->
#   { "good": ..., "warning": ..., "higherIsBetter": ... }
# thresholds_file = "~/.local/share/orgctl/thresholds.json"

# Per-cost-center metrics map for the report command
# metrics_file = "~/.local/share/orgctl/metrics.json"

# Backups kept after each successful write
# backup_retention = 10
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

/// Load and schema-check the type rule table. Fails fast on a missing file,
/// malformed JSON, or rule-table inconsistencies.
pub fn load_type_rules(path: &Path) -> ApplicationResult<TypeRules> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read type rules {}: {e}", path.display()),
    })?;
    let rules: TypeRules = serde_json::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse type rules {}: {e}", path.display()),
    })?;
    rules.check().map_err(|issues| ApplicationError::Config {
        message: format!(
            "invalid type rules {}: {}",
            path.display(),
            issues.join("; ")
        ),
    })?;
    Ok(rules)
}

/// Presentation band for a rolled-up metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricStatus {
    Good,
    Warning,
    Critical,
}

/// Good/warning boundaries for one metric key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBand {
    pub good: f64,
    pub warning: f64,
    #[serde(rename = "higherIsBetter")]
    pub higher_is_better: bool,
}

impl ThresholdBand {
    /// Classify a value against this band. Used purely for presentation
    /// coloring, never for structural invariants.
    pub fn classify(&self, value: f64) -> MetricStatus {
        if self.higher_is_better {
            if value >= self.good {
                MetricStatus::Good
            } else if value >= self.warning {
                MetricStatus::Warning
            } else {
                MetricStatus::Critical
            }
        } else if value <= self.good {
            MetricStatus::Good
        } else if value <= self.warning {
            MetricStatus::Warning
        } else {
            MetricStatus::Critical
        }
    }
}

/// Threshold table keyed by metric key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Thresholds(pub BTreeMap<String, ThresholdBand>);

impl Thresholds {
    pub fn classify(&self, metric: &str, value: f64) -> Option<MetricStatus> {
        self.0.get(metric).map(|band| band.classify(value))
    }
}

/// Load the threshold table. Same fail-fast policy as the type rules.
pub fn load_thresholds(path: &Path) -> ApplicationResult<Thresholds> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read thresholds {}: {e}", path.display()),
    })?;
    serde_json::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse thresholds {}: {e}", path.display()),
    })
}
