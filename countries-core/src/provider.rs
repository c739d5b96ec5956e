use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

use crate::{
    Config,
    error::Result,
    http,
    model::{
        Candidate, ChartImage, Coordinates, CountryRecord, ForecastSeries, HottestScope,
        WeatherSample,
    },
    provider::{
        mongodata::MongoDataStore, openweather::OpenWeatherProvider,
        quickchart::QuickChartRenderer, restcountries::RestCountriesDirectory,
    },
};

pub mod mongodata;
pub mod openweather;
pub mod quickchart;
pub mod restcountries;

/// External services the aggregator talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    RestCountries,
    OpenWeather,
    QuickChart,
    MongoData,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::RestCountries => "restcountries",
            ProviderId::OpenWeather => "openweather",
            ProviderId::QuickChart => "quickchart",
            ProviderId::MongoData => "mongodata",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Country directory: names, regions and per-country details.
#[async_trait]
pub trait CountryDirectory: Send + Sync + Debug {
    /// Common names of every country, in the directory's order.
    async fn all_names(&self) -> Result<Vec<String>>;

    /// Common names in `region`; an unknown or empty region yields an empty list.
    async fn names_in_region(&self, region: &str) -> Result<Vec<String>>;

    /// Fuzzy lookup by name. Never returns an empty list: zero matches is `NotFound`.
    async fn lookup(&self, name: &str) -> Result<Vec<CountryRecord>>;

    /// Names and capital coordinates of every country in `scope`.
    async fn candidates(&self, scope: &HottestScope) -> Result<Vec<Candidate>>;
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, at: Coordinates) -> Result<WeatherSample>;

    /// `samples` consecutive three-hour forecast points starting now.
    async fn forecast(&self, at: Coordinates, samples: u32) -> Result<ForecastSeries>;
}

#[async_trait]
pub trait ChartRenderer: Send + Sync + Debug {
    async fn render_line(&self, title: &str, series: &ForecastSeries) -> Result<ChartImage>;
}

/// Durable favourites list, keyed by canonical country name.
#[async_trait]
pub trait FavoriteStore: Send + Sync + Debug {
    async fn insert(&self, name: &str) -> Result<()>;

    /// Insert unless a record with `name` already exists.
    async fn upsert(&self, name: &str) -> Result<()>;

    /// Delete the first record matching `name`; deleting nothing is not an error.
    async fn delete_one(&self, name: &str) -> Result<()>;

    async fn names(&self) -> Result<Vec<String>>;
}

/// One handle per external collaborator.
#[derive(Debug, Clone)]
pub struct Providers {
    pub countries: Arc<dyn CountryDirectory>,
    pub weather: Arc<dyn WeatherProvider>,
    pub charts: Arc<dyn ChartRenderer>,
    pub favorites: Arc<dyn FavoriteStore>,
}

impl Providers {
    /// Construct the HTTP-backed providers from config.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let client = http::client(config.http.timeout())?;

        // validate() guarantees both keys are present.
        let weather_key = config.weather.api_key.clone().unwrap_or_default();
        let db_key = config.favorites.api_key.clone().unwrap_or_default();

        Ok(Self {
            countries: Arc::new(RestCountriesDirectory::new(
                client.clone(),
                config.countries.base_url.clone(),
            )),
            weather: Arc::new(OpenWeatherProvider::new(
                client.clone(),
                config.weather.base_url.clone(),
                weather_key,
            )),
            charts: Arc::new(QuickChartRenderer::new(
                client.clone(),
                config.chart.base_url.clone(),
            )),
            favorites: Arc::new(MongoDataStore::new(client, &config.favorites, db_key)),
        })
    }
}
