use crate::domain::constants::{DEFAULT_CONFIG_FILE, WEBHOOK_ENV};
use crate::domain::models::Settings;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("webhook url is not configured (set {} or pass --webhook)", WEBHOOK_ENV)]
    MissingWebhook,
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Settings from `explicit`, or from `cninfo-watch.toml` in the working
/// directory when present, or the defaults.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, ConfigError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let p = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !p.exists() {
                return Ok(Settings::default());
            }
            p
        }
    };
    let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })
}

pub fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    let checks = [
        (settings.format.compact_cap, "format.compact_cap"),
        (settings.format.table_cap, "format.table_cap"),
        (settings.format.holder_max_chars, "format.holder_max_chars"),
        (settings.fetch.timeout_secs as usize, "fetch.timeout_secs"),
        (settings.notify.timeout_secs as usize, "notify.timeout_secs"),
    ];
    for (value, name) in checks {
        if value == 0 {
            return Err(ConfigError::Invalid(format!("{} must be at least 1", name)));
        }
    }
    if settings.fetch.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("fetch.base_url is empty".to_string()));
    }
    Ok(())
}

pub fn resolve_webhook(raw: Option<&str>) -> Result<String, ConfigError> {
    raw.map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::MissingWebhook)
}
