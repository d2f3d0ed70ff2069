use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const PROVIDER_ENV: &str = "MARKET_DATA_PROVIDER";
pub const API_KEY_ENV: &str = "ALPHA_VANTAGE_API_KEY";
const DEMO_API_KEY: &str = "demo";

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

impl Default for YahooProviderConfig {
    fn default() -> Self {
        YahooProviderConfig {
            base_url: "https://query1.finance.yahoo.com".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AlphaVantageProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for AlphaVantageProviderConfig {
    fn default() -> Self {
        AlphaVantageProviderConfig {
            base_url: "https://www.alphavantage.co".to_string(),
            api_key: None,
        }
    }
}

impl AlphaVantageProviderConfig {
    pub fn api_key(&self) -> &str {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .unwrap_or(DEMO_API_KEY)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ProviderConfig {
    /// `yahoo` or `alphavantage`. Anything else selects the default.
    pub name: Option<String>,
    pub timeout_secs: u64,
    pub yahoo: YahooProviderConfig,
    pub alphavantage: AlphaVantageProviderConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            name: None,
            timeout_secs: 10,
            yahoo: YahooProviderConfig::default(),
            alphavantage: AlphaVantageProviderConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DurableBackend {
    #[default]
    Sqlite,
    Fjall,
    None,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub freshness_secs: u64,
    pub memory: bool,
    pub durable: DurableBackend,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            freshness_secs: 60 * 60,
            memory: true,
            durable: DurableBackend::Sqlite,
        }
    }
}

impl CacheConfig {
    pub fn freshness_window(&self) -> chrono::Duration {
        i64::try_from(self.freshness_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub data_path: Option<String>,
}

impl AppConfig {
    /// Loads the default config file, or built-in defaults when it does not exist.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        let mut config = if config_path.exists() {
            Self::read_file(&config_path)?
        } else {
            debug!("No config at {}, using defaults", config_path.display());
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = project_dirs()?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = project_dirs()?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn read_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var(PROVIDER_ENV).ok(),
            std::env::var(API_KEY_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, provider: Option<String>, api_key: Option<String>) {
        if let Some(name) = provider.filter(|v| !v.trim().is_empty()) {
            debug!(provider = %name, "Provider overridden from environment");
            self.provider.name = Some(name);
        }
        if let Some(key) = api_key.filter(|v| !v.trim().is_empty()) {
            self.provider.alphavantage.api_key = Some(key);
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "quotekeeper", "quotekeeper")
        .context("Could not determine project directories")
}
