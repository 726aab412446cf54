use anyhow::{anyhow, Context, Result};

use crate::layout::FontFamily;

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Base URL of the portfolio service (`{base}/portfolio/{id}`).
    pub source_url: String,
    pub source_timeout_secs: u64,
    /// Hosts profile images may be fetched from; empty allows any public host.
    pub asset_allowed_hosts: Vec<String>,
    pub max_asset_bytes: usize,
    /// Width a surface lays out at when it has no explicit width setting.
    pub viewport_width: u32,
    pub font: FontFamily,
    /// Captures taller than this many pixels are refused.
    pub max_capture_height_px: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            source_url: std::env::var("RESUME_SOURCE_URL")
                .unwrap_or_else(|_| "https://bio.vizhva.com".to_string()),
            source_timeout_secs: parse_env("SOURCE_TIMEOUT_SECS", 30)?,
            asset_allowed_hosts: std::env::var("ASSET_ALLOWED_HOSTS")
                .map(|raw| parse_host_list(&raw))
                .unwrap_or_default(),
            max_asset_bytes: parse_env("MAX_ASSET_BYTES", 5 * 1024 * 1024)?,
            viewport_width: parse_env("VIEWPORT_WIDTH", 1280)?,
            font: match std::env::var("RESUME_FONT") {
                Ok(raw) => raw
                    .parse::<FontFamily>()
                    .map_err(|e| anyhow!(e))
                    .context("RESUME_FONT must be 'inter' or 'garamond'")?,
                Err(_) => FontFamily::Inter,
            },
            max_capture_height_px: parse_env("MAX_CAPTURE_HEIGHT_PX", 32_768)?,
        })
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn parse_host_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|host| host.trim().to_ascii_lowercase())
        .filter(|host| !host.is_empty())
        .collect()
}
