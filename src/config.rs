use std::{env, net::SocketAddr, path::PathBuf};

use anyhow::{bail, Result};

use crate::{
    store::{is_valid_table_name, TableNames},
    time_format::DisplayZone,
};

pub const DEFAULT_APP_STORE_LINK: &str = "https://apps.apple.com/app/footballbin/id6757111871";
pub const DEFAULT_API_ENDPOINT: &str =
    "https://ru7m5svay1.execute-api.eu-central-1.amazonaws.com/prod/mcp";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub tables: TableNames,
    pub app_store_link: String,
    pub display_zone: DisplayZone,
    pub log_payloads: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            db_path: PathBuf::from("footballbin.db"),
            tables: TableNames::default(),
            app_store_link: DEFAULT_APP_STORE_LINK.to_string(),
            display_zone: DisplayZone::Local,
            log_payloads: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any variable source; `from_env` reads the process.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let var = |key: &str| cleaned(lookup(key));

        let bind_addr = var("FOOTBALLBIN_BIND_ADDR")
            .and_then(|raw| raw.parse::<SocketAddr>().ok())
            .unwrap_or(defaults.bind_addr);

        let db_path = var("FOOTBALLBIN_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let tables = TableNames {
            matches: var("FOOTBALLBIN_MATCHES_TABLE").unwrap_or(defaults.tables.matches),
            matchweeks: var("FOOTBALLBIN_MATCHWEEKS_TABLE")
                .unwrap_or(defaults.tables.matchweeks),
        };
        for name in [&tables.matches, &tables.matchweeks] {
            if !is_valid_table_name(name) {
                bail!("Invalid table name {name:?}: use letters, digits and underscores only");
            }
        }

        let app_store_link =
            var("FOOTBALLBIN_APP_STORE_LINK").unwrap_or(defaults.app_store_link);

        let display_zone = match var("FOOTBALLBIN_DISPLAY_UTC_OFFSET") {
            Some(raw) => match DisplayZone::parse_offset(&raw) {
                Some(zone) => zone,
                None => bail!("Invalid FOOTBALLBIN_DISPLAY_UTC_OFFSET {raw:?}: expected e.g. +01:00"),
            },
            None => defaults.display_zone,
        };

        let log_payloads = var("FOOTBALLBIN_LOG_PAYLOADS")
            .map(|v| is_truthy(&v))
            .unwrap_or(false);

        Ok(Self {
            bind_addr,
            db_path,
            tables,
            app_store_link,
            display_zone,
            log_payloads,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub api_endpoint: String,
}

impl BridgeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api_endpoint: cleaned(lookup("FOOTBALLBIN_API_ENDPOINT"))
                .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string()),
        }
    }
}

/// Unset and blank variables are treated alike; surrounding quotes are dropped.
fn cleaned(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().trim_matches('"').trim_matches('\'').to_string())
        .filter(|v| !v.is_empty())
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
