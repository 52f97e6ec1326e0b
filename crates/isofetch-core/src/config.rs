use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Environment variable that overrides `api_key` from the config file.
pub const API_KEY_ENV: &str = "ORS_API_KEY";

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per station (including the first).
    pub max_attempts: u32,
    /// Base delay in milliseconds; the wait before attempt n+1 is base * n.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

/// Global configuration loaded from `~/.config/isofetch/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsoConfig {
    /// Isochrone endpoint, including the routing profile.
    pub endpoint: String,
    /// API key sent as the `Authorization` header. `ORS_API_KEY` wins when set.
    pub api_key: Option<String>,
    /// Travel time budget per station, in seconds.
    pub range_seconds: u32,
    /// Pause before every station after the first.
    pub inter_request_delay_ms: u64,
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
    /// Optional retry policy; if missing, built-in defaults are used.
    pub retry: Option<RetryConfig>,
}

impl Default for IsoConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openrouteservice.org/v2/isochrones/foot-walking".to_string(),
            api_key: None,
            range_seconds: 600,
            inter_request_delay_ms: 1200,
            connect_timeout_secs: 15,
            timeout_secs: 30,
            retry: None,
        }
    }
}

impl IsoConfig {
    /// API key from the environment, else from the file. Blank keys count as absent.
    pub fn resolved_api_key(&self) -> Option<String> {
        let from_env = std::env::var(API_KEY_ENV).ok();
        pick_key(from_env, self.api_key.clone())
    }

    /// Reject values the batch cannot run with.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.endpoint)
            .with_context(|| format!("invalid endpoint {:?}", self.endpoint))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("endpoint must be http or https, got {}", url.scheme());
        }
        if self.range_seconds == 0 {
            bail!("range_seconds must be greater than 0");
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than 0");
        }
        self.retry_policy()?;
        Ok(())
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        let retry = self.retry.clone().unwrap_or_default();
        Ok(RetryPolicy::new(
            retry.max_attempts,
            Duration::from_millis(retry.base_delay_ms),
        )?)
    }

    pub fn range(&self) -> Result<NonZeroU32> {
        NonZeroU32::new(self.range_seconds).context("range_seconds must be greater than 0")
    }

    pub fn inter_request_delay(&self) -> Duration {
        Duration::from_millis(self.inter_request_delay_ms)
    }
}

fn pick_key(from_env: Option<String>, from_file: Option<String>) -> Option<String> {
    from_env
        .filter(|k| !k.trim().is_empty())
        .or(from_file.filter(|k| !k.trim().is_empty()))
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("isofetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<IsoConfig> {
    load_or_init_at(&config_path()?)
}

/// Same as `load_or_init` for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<IsoConfig> {
    if !path.exists() {
        let default_cfg = IsoConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: IsoConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
