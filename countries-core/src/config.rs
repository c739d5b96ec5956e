use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::error::Error;

/// How `add_favorite` treats a country that is already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoritePolicy {
    /// Always insert a new record; duplicates are possible.
    #[default]
    Append,
    /// Insert only if no record with the same name exists.
    Upsert,
}

impl FavoritePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FavoritePolicy::Append => "append",
            FavoritePolicy::Upsert => "upsert",
        }
    }
}

impl fmt::Display for FavoritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for FavoritePolicy {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "append" => Ok(FavoritePolicy::Append),
            "upsert" => Ok(FavoritePolicy::Upsert),
            _ => Err(anyhow!(
                "Unknown favourite policy '{value}'. Supported policies: append, upsert."
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "127.0.0.1:5000".to_string() }
    }
}

/// Settings shared by every outbound request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CountriesConfig {
    pub base_url: String,
}

impl Default for CountriesConfig {
    fn default() -> Self {
        Self { base_url: "https://restcountries.com/v3.1".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Largest `cnt` the forecast endpoint honours; larger values are truncated upstream.
    pub max_forecast_samples: u32,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            max_forecast_samples: 40,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub base_url: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self { base_url: "https://quickchart.io".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FavoritesConfig {
    pub api_key: Option<String>,
    /// Data API root; action names (`insertOne`, `find`, ...) are appended.
    pub base_url: String,
    pub data_source: String,
    pub database: String,
    pub collection: String,
    pub policy: FavoritePolicy,
}

const MONGO_DATA_API_URL: &str =
    "https://eu-central-1.aws.data.mongodb-api.com/app/data-gzlnt/endpoint/data/v1";

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: MONGO_DATA_API_URL.to_string(),
            data_source: "Cluster0".to_string(),
            database: "favourite_countries".to_string(),
            collection: "fav_list".to_string(),
            policy: FavoritePolicy::Append,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HottestConfig {
    /// Weather lookups in flight at once while scanning candidates.
    pub concurrency: usize,
}

impl Default for HottestConfig {
    fn default() -> Self {
        Self { concurrency: 8 }
    }
}

/// Top-level configuration.
///
/// Example TOML:
/// ```toml
/// [weather]
/// api_key = "..."
///
/// [favorites]
/// api_key = "..."
/// policy = "upsert"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub http: HttpConfig,
    pub countries: CountriesConfig,
    pub weather: WeatherConfig,
    pub chart: ChartConfig,
    pub favorites: FavoritesConfig,
    pub hottest: HottestConfig,
}

/// Values supplied on the command line; `None` leaves the file value alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind: Option<String>,
    pub weather_api_key: Option<String>,
    pub db_api_key: Option<String>,
    pub favorite_policy: Option<FavoritePolicy>,
}

impl Config {
    /// Load config from the platform config directory, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    /// Load config from an explicit path, or return defaults if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "countries", "countries-api")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(bind) = overrides.bind {
            self.server.bind = bind;
        }
        if let Some(key) = overrides.weather_api_key {
            self.weather.api_key = Some(key);
        }
        if let Some(key) = overrides.db_api_key {
            self.favorites.api_key = Some(key);
        }
        if let Some(policy) = overrides.favorite_policy {
            self.favorites.policy = policy;
        }
        self
    }

    /// Check that everything needed to serve requests is present.
    pub fn validate(&self) -> Result<(), Error> {
        if self.weather.api_key.as_deref().is_none_or(str::is_empty) {
            return Err(Error::Config(
                "No weather API key configured.\n\
                 Hint: pass --weather-api-key or set [weather].api_key in the config file."
                    .to_string(),
            ));
        }
        if self.favorites.api_key.as_deref().is_none_or(str::is_empty) {
            return Err(Error::Config(
                "No document-store API key configured.\n\
                 Hint: pass --db-api-key or set [favorites].api_key in the config file."
                    .to_string(),
            ));
        }
        if self.hottest.concurrency == 0 {
            return Err(Error::Config("[hottest].concurrency must be at least 1".to_string()));
        }
        if self.weather.max_forecast_samples == 0 {
            return Err(Error::Config(
                "[weather].max_forecast_samples must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
