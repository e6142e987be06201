// src/config.rs
use crate::error::{HexError, Result};
use std::{env, path::PathBuf};

/// FCC BDC fixed-broadband exports for Maryland (June 2025 release), in load
/// order. The first file fixes the raw table's column set.
pub const DEFAULT_SOURCE_FILES: &[&str] = &[
    "bdc_24_Cable_fixed_broadband_J25_22nov2025.csv",
    "bdc_24_Copper_fixed_broadband_J25_22nov2025.csv",
    "bdc_24_FibertothePremises_fixed_broadband_J25_22nov2025.csv",
    "bdc_24_GSOSatellite_fixed_broadband_J25_22nov2025.csv",
    "bdc_24_NGSOSatellite_fixed_broadband_J25_22nov2025.csv",
    "bdc_24_LBRFixedWireless_fixed_broadband_J25_22nov2025.csv",
    "bdc_24_LicensedFixedWireless_fixed_broadband_J25_22nov2025.csv",
    "bdc_24_UnlicensedFixedWireless_fixed_broadband_J25_22nov2025.csv",
];

const DEFAULT_DB_PATH: &str = "./data/broadband.duckdb";
const DEFAULT_DATA_DIR: &str = "./data/maryland";
const DEFAULT_STATIC_DIR: &str = "./dist";
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Local database file, or an http(s) URL of a prebuilt artifact.
    pub db_path: String,
    /// Where a downloaded artifact is cached between restarts.
    pub local_db_path: PathBuf,
    /// Directory holding the raw CSV exports.
    pub data_dir: PathBuf,
    pub static_dir: PathBuf,
    pub port: u16,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| HexError::Config(format!("PORT must be a port number, got {raw:?}")))?,
            None => DEFAULT_PORT,
        };

        Ok(Config {
            db_path: lookup("DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            local_db_path: lookup("LOCAL_DB_PATH")
                .unwrap_or_else(|| DEFAULT_DB_PATH.to_string())
                .into(),
            data_dir: lookup("DATA_DIR")
                .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())
                .into(),
            static_dir: lookup("STATIC_DIR")
                .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string())
                .into(),
            port,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Full paths of the raw CSV exports, in load order.
    pub fn source_files(&self) -> Vec<PathBuf> {
        DEFAULT_SOURCE_FILES
            .iter()
            .map(|name| self.data_dir.join(name))
            .collect()
    }
}
