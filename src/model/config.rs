use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULTS: &str = include_str!("../../config/default.toml");

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub marketplace: MarketplaceConfig,
    pub http: HttpConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    pub manifest_file: String,
    pub credentials_file: String,
    #[serde(default)]
    pub scratch_dir: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MarketplaceConfig {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct LogConfig {
    pub filter: String,
    pub file: bool,
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    pub fn load() -> Result<Self> {
        let user = match project_dirs() {
            Some(dirs) => {
                let config_path = dirs.config_dir().join("config.toml");
                if config_path.exists() {
                    let text = fs::read_to_string(&config_path)
                        .with_context(|| format!("reading {}", config_path.display()))?;
                    Some(text)
                } else {
                    None
                }
            }
            None => None,
        };

        Self::from_layers(user.as_deref())
    }

    /// Overlay `user` (if any) onto the embedded defaults, table by table.
    pub fn from_layers(user: Option<&str>) -> Result<Self> {
        let mut merged: toml::Value = toml::from_str(DEFAULTS).context("parsing default settings")?;

        if let Some(user) = user {
            let overlay: toml::Value = toml::from_str(user).context("parsing user settings")?;
            merge(&mut merged, overlay);
        }

        merged.try_into().context("invalid settings")
    }

    pub fn manifest_path(&self) -> PathBuf {
        PathBuf::from(&self.general.manifest_file)
    }

    pub fn credentials_path(&self) -> PathBuf {
        PathBuf::from(&self.general.credentials_file)
    }

    pub fn scratch_root(&self) -> Option<PathBuf> {
        self.general.scratch_dir.as_ref().map(PathBuf::from)
    }
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "addon-sync")
}

fn merge(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
