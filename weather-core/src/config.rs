use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path, path::PathBuf};

pub const DEFAULT_API_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_PROXY_URL: &str = "http://localhost:5173";

pub const API_URL_ENV: &str = "OPEN_WEATHER_API_URL";
pub const API_KEY_ENV: &str = "OPEN_WEATHER_API_KEY";
pub const MODE_ENV: &str = "SIMPLE_WEATHER_MODE";

/// How requests reach OpenWeather.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
    /// Production: call the OpenWeather API directly.
    #[default]
    Direct,
    /// Development: go through a local proxy that forwards `/api/weather`
    /// and `/api/geo`.
    Proxied,
}

impl ApiMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiMode::Direct => "direct",
            ApiMode::Proxied => "proxied",
        }
    }

    pub const fn all() -> &'static [ApiMode] {
        &[ApiMode::Direct, ApiMode::Proxied]
    }
}

impl std::fmt::Display for ApiMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ApiMode {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "direct" | "production" | "prod" => Ok(ApiMode::Direct),
            "proxied" | "development" | "dev" => Ok(ApiMode::Proxied),
            _ => Err(anyhow!("Unknown API mode '{value}'. Supported modes: direct, proxied.")),
        }
    }
}

/// Resolved base URLs and credentials for both lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub weather_base: String,
    pub geo_base: String,
    pub api_key: String,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// mode = "direct"
/// api_url = "https://api.openweathermap.org"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub mode: ApiMode,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_proxy_url")]
    pub proxy_url: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_proxy_url() -> String {
    DEFAULT_PROXY_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            mode: ApiMode::default(),
            api_url: default_api_url(),
            proxy_url: default_proxy_url(),
        }
    }
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "simple-weather", "simple-weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay values from the process environment.
    pub fn with_env(self) -> Result<Self> {
        self.with_env_pairs(std::env::vars())
    }

    pub fn with_env_pairs<I, K, V>(mut self, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let env: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v)| !v.trim().is_empty())
            .collect();

        if let Some(url) = env.get(API_URL_ENV) {
            self.api_url = url.trim().to_string();
        }
        if let Some(key) = env.get(API_KEY_ENV) {
            self.api_key = Some(key.trim().to_string());
        }
        if let Some(mode) = env.get(MODE_ENV) {
            self.mode = ApiMode::try_from(mode.as_str())
                .with_context(|| format!("Invalid value for {MODE_ENV}"))?;
        }

        Ok(self)
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Resolve the base URLs for the current mode.
    pub fn endpoints(&self) -> Result<Endpoints> {
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No OpenWeather API key configured.\n\
                     Hint: run `simple-weather configure` or set {API_KEY_ENV}."
                )
            })?;

        let (weather_base, geo_base) = match self.mode {
            ApiMode::Direct => {
                let root = self.api_url.trim_end_matches('/');
                (format!("{root}/data/2.5"), format!("{root}/geo/1.0"))
            }
            ApiMode::Proxied => {
                let root = self.proxy_url.trim_end_matches('/');
                (format!("{root}/api/weather"), format!("{root}/api/geo"))
            }
        };

        Ok(Endpoints { weather_base, geo_base, api_key: api_key.to_string() })
    }
}
