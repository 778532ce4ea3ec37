// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that points at an alternative config file
pub const CONFIG_ENV: &str = "DCF_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Equity reference table (symbol -> classification), `.xlsx` or `.csv`
    pub equity_file: PathBuf,
    /// Optional workbook template; synthesized in memory when missing
    pub template_file: PathBuf,
    /// Peer count the selector tries to reach before relaxing the filter
    pub min_peers: usize,
    /// Minimum weekly points for a price series to be accepted
    pub min_points: usize,
    /// Suffix appended to bare symbols for market data lookups
    pub exchange_suffix: String,
    pub benchmark_symbol: String,
    pub benchmark_label: String,
    /// Statement page URL, `{symbol}` is replaced by the bare symbol
    pub statements_url: String,
    pub scrape_timeout_secs: u64,
    pub output_dir: PathBuf,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            equity_file: PathBuf::from("EQUITY_Final.xlsx"),
            template_file: PathBuf::from("DCF_Template.xlsx"),
            min_peers: 10,
            min_points: 20,
            exchange_suffix: ".NS".to_string(),
            benchmark_symbol: "^NSEI".to_string(),
            benchmark_label: "NIFTY50".to_string(),
            statements_url: "https://www.screener.in/company/{symbol}/consolidated/".to_string(),
            scrape_timeout_secs: 20,
            output_dir: PathBuf::from("."),
            port: 3000,
        }
    }
}

impl Config {
    /// Market data ticker for a bare symbol, e.g. `TCS` -> `TCS.NS`
    pub fn market_symbol(&self, symbol: &str) -> String {
        format!("{}{}", symbol, self.exchange_suffix)
    }

    pub fn scrape_timeout(&self) -> Duration {
        Duration::from_secs(self.scrape_timeout_secs)
    }
}

/// Resolve the config path: explicit argument, then `DCF_CONFIG`, then `config.toml`
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"))
}

/// Load the config file, falling back to defaults when the file does not exist.
/// A file that exists but does not parse is an error.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    match fs::read_to_string(path) {
        Ok(config_str) => match toml::from_str(&config_str) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::error!("Failed to parse {}: {}", path.display(), e);
                Err(e.into())
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("No config at {}, using defaults", path.display());
            Ok(Config::default())
        }
        Err(e) => {
            tracing::error!("Failed to read config from {}: {}", path.display(), e);
            Err(e.into())
        }
    }
}
