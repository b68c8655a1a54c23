use std::fs;
use std::path::PathBuf;

use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::aggregate::terabytes_to_bytes;
use crate::domain::{Category, ExtractOptions, RawReadsGate};
use crate::error::PortalError;

pub const CONFIG_FILE_NAME: &str = "jgi-fetch.json";
pub const DEFAULT_SEARCH_URL: &str = "https://files.jgi.doe.gov/search/";
pub const DEFAULT_RESTORE_URL: &str = "https://files.jgi.doe.gov/request_archived_files/";
pub const DEFAULT_MAX_TOTAL_GB: f64 = 10_000.0;
pub const DEFAULT_MAX_BATCH_TB: f64 = 10.0;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub search_url: Option<String>,
    #[serde(default)]
    pub restore_url: Option<String>,
    #[serde(default)]
    pub max_total_gb: Option<f64>,
    #[serde(default)]
    pub max_batch_tb: Option<f64>,
    #[serde(default)]
    pub send_mail: Option<bool>,
    #[serde(default)]
    pub raw_reads_gate: Option<RawReadsGate>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Endpoints {
    pub search_url: String,
    pub restore_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            restore_url: DEFAULT_RESTORE_URL.to_string(),
        }
    }
}

/// Size limits for a download request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Above this total (GB) the request is split into batches.
    pub max_total_gb: f64,
    pub max_batch_bytes: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_total_gb: DEFAULT_MAX_TOTAL_GB,
            max_batch_bytes: terabytes_to_bytes(DEFAULT_MAX_BATCH_TB),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub endpoints: Endpoints,
    pub thresholds: Thresholds,
    pub send_mail: bool,
    pub extract: ExtractOptions,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub max_total_gb: Option<f64>,
    pub max_batch_tb: Option<f64>,
    pub raw_reads_gate: Option<RawReadsGate>,
    pub exclude: Vec<Category>,
    pub no_mail: bool,
}

impl ResolvedConfig {
    pub fn apply(mut self, overrides: ConfigOverrides) -> Result<Self, PortalError> {
        if let Some(value) = overrides.max_total_gb {
            self.thresholds.max_total_gb = positive("max_total_gb", value)?;
        }
        if let Some(value) = overrides.max_batch_tb {
            self.thresholds.max_batch_bytes =
                terabytes_to_bytes(positive("max_batch_tb", value)?);
        }
        if let Some(gate) = overrides.raw_reads_gate {
            self.extract.raw_reads_gate = gate;
        }
        for category in overrides.exclude {
            self.extract = self.extract.without(category);
        }
        if overrides.no_mail {
            self.send_mail = false;
        }
        Ok(self)
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads an explicit config file, or the first of `./jgi-fetch.json` and
    /// the user config directory that exists, or the built-in defaults.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, PortalError> {
        let config_path = match path {
            Some(path) => Some(PathBuf::from(path)),
            None => Self::default_locations()
                .into_iter()
                .find(|candidate| candidate.exists()),
        };

        let Some(config_path) = config_path else {
            tracing::debug!("no config file found, using defaults");
            return Self::resolve_config(Config::default());
        };

        tracing::debug!(path = %config_path.display(), "loading config");
        let content = fs::read_to_string(&config_path)
            .map_err(|_| PortalError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| PortalError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, PortalError> {
        let defaults = Endpoints::default();

        let max_total_gb = positive(
            "max_total_gb",
            config.max_total_gb.unwrap_or(DEFAULT_MAX_TOTAL_GB),
        )?;
        let max_batch_tb = positive(
            "max_batch_tb",
            config.max_batch_tb.unwrap_or(DEFAULT_MAX_BATCH_TB),
        )?;

        let mut extract = ExtractOptions {
            raw_reads_gate: config.raw_reads_gate.unwrap_or_default(),
            ..ExtractOptions::default()
        };
        for entry in &config.exclude {
            extract = extract.without(entry.parse::<Category>()?);
        }

        Ok(ResolvedConfig {
            endpoints: Endpoints {
                search_url: config.search_url.unwrap_or(defaults.search_url),
                restore_url: config.restore_url.unwrap_or(defaults.restore_url),
            },
            thresholds: Thresholds {
                max_total_gb,
                max_batch_bytes: terabytes_to_bytes(max_batch_tb),
            },
            send_mail: config.send_mail.unwrap_or(true),
            extract,
        })
    }

    fn default_locations() -> Vec<PathBuf> {
        let mut locations = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dirs) = BaseDirs::new() {
            locations.push(dirs.config_dir().join("jgi-fetch").join("config.json"));
        }
        locations
    }
}

fn positive(name: &str, value: f64) -> Result<f64, PortalError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(PortalError::ConfigValue(format!(
            "{name} must be a positive number, got {value}"
        )));
    }
    Ok(value)
}
