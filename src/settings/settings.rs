use anyhow::{Result, anyhow};
use config::{Config, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub api: Api,
    pub credentials: Credentials,
    pub http: Http,
    pub log: Log,
    pub socket: Socket,
}

#[derive(Debug, Deserialize)]
pub struct Api {
    pub base_url: String,
    pub refresh_path: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub backend: String, // "memory" or "file"
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    pub static_dir: String,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct Socket {
    pub url: String,
    pub user_id: Option<String>,
    pub reconnect_interval_ms: u64,
    pub settle_delay_ms: u64,
    pub reconnect: bool,
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
