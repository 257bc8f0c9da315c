// crates/lakeport-core/src/config.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;

/// Pipeline configuration, loaded from a TOML file.
///
/// ```toml
/// [paths]
/// source_root = "source_data"
/// dest_root = "output_tables"
///
/// [credentials]
/// access_key_id = "..."
/// secret_access_key = "..."
/// ```
///
/// The `[sources]` table can override any of the source file names; it
/// defaults to the canonical dataset layout.
#[derive(Debug, Clone, Deserialize)]
pub struct LakeConfig {
    pub paths: PathsConfig,
    #[serde(default)]
    pub sources: SourceFiles,
    #[serde(default)]
    pub credentials: Option<Credentials>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    pub source_root: PathBuf,
    pub dest_root: PathBuf,
}

/// Source file names, relative to `paths.source_root`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceFiles {
    pub city_demographics: String,
    pub city_state_codes: String,
    pub airport_codes: String,
    pub global_temperatures: String,
    pub country_codes: String,
    pub transport_modes: String,
    pub visa_types: String,
    /// Directory of parquet files, already typed upstream.
    pub immigration: String,
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self {
            city_demographics: "us-cities-demographics.csv".to_string(),
            city_state_codes: "us_cities_processed.csv".to_string(),
            airport_codes: "airport-codes_csv.csv".to_string(),
            global_temperatures: "GlobalLandTemperaturesByCity.csv".to_string(),
            country_codes: "country_code_processed.csv".to_string(),
            transport_modes: "transport_mode.csv".to_string(),
            visa_types: "visa_type.csv".to_string(),
            immigration: "sas_data".to_string(),
        }
    }
}

/// Object-store access keys. Exported to the conventional environment
/// variables before any storage access happens.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl LakeConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: LakeConfig = toml::from_str(&raw)?;
        Ok(config)
    }

    /// Populate `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` from the config
    /// file. A no-op when no credentials section is present (local runs).
    pub fn export_credentials(&self) {
        if let Some(credentials) = &self.credentials {
            std::env::set_var("AWS_ACCESS_KEY_ID", &credentials.access_key_id);
            std::env::set_var("AWS_SECRET_ACCESS_KEY", &credentials.secret_access_key);
        }
    }
}
