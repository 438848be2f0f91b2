use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::{fs, net::SocketAddr, path::PathBuf, time::Duration};

pub const DEFAULT_UPSTREAM_URL: &str = "https://islamicapi.com/api/v1/ramadan/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const ENV_API_KEY: &str = "ISLAMIC_API_KEY";
pub const ENV_UPSTREAM_URL: &str = "RAMADAN_UPSTREAM_URL";
pub const ENV_BIND_ADDR: &str = "RAMADAN_BIND_ADDR";
pub const ENV_ALLOWED_ORIGINS: &str = "RAMADAN_ALLOWED_ORIGINS";
pub const ENV_TIMEOUT_SECS: &str = "RAMADAN_TIMEOUT_SECS";

/// Relay configuration, built once at startup and handed to the server.
///
/// Example TOML:
/// api_key = "..."
/// bind_addr = "127.0.0.1:8000"
/// allowed_origins = ["http://localhost:5173"]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub upstream_url: String,
    pub bind_addr: SocketAddr,
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Load from disk, then apply process environment overrides.
    pub fn load_with_env() -> Result<Self> {
        let mut cfg = Self::load()?;
        cfg.apply_env(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// Override fields from environment-style variables.
    ///
    /// `lookup` is the process environment in production; tests pass a map.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // A blank key is treated as unset and must not shadow the file value.
        if let Some(key) = lookup(ENV_API_KEY).filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }

        if let Some(url) = lookup(ENV_UPSTREAM_URL) {
            check_upstream_url(&url).with_context(|| format!("Invalid {ENV_UPSTREAM_URL}"))?;
            self.upstream_url = url;
        }

        if let Some(addr) = lookup(ENV_BIND_ADDR) {
            self.bind_addr = addr
                .trim()
                .parse()
                .with_context(|| format!("{ENV_BIND_ADDR} must be a socket address, got '{addr}'"))?;
        }

        if let Some(origins) = lookup(ENV_ALLOWED_ORIGINS) {
            self.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let parsed: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("{ENV_TIMEOUT_SECS} must be a number of seconds, got '{secs}'"))?;
            if parsed == 0 {
                bail!("{ENV_TIMEOUT_SECS} must be at least 1 second");
            }
            self.request_timeout_secs = parsed;
        }

        Ok(())
    }

    /// Reject values that would make every upstream request fail.
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be at least 1 second");
        }

        check_upstream_url(&self.upstream_url).context("Invalid upstream_url")?;

        Ok(())
    }

    /// API key, treating empty or whitespace-only values as unset.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "ramadan-relay", "ramadan")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

fn check_upstream_url(url: &str) -> Result<()> {
    let parsed = Url::parse(url).with_context(|| format!("'{url}' is not a valid URL"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(anyhow!("'{url}' must use http or https, not {other}")),
    }
}
