//! Request aggregation over the country, weather, chart and favourites providers.
//!
//! Every operation is a single request/response cycle. Outbound calls are made
//! in sequence whenever a later call needs data from an earlier one; the only
//! fan-out is [`RequestAggregator::find_hottest`], which runs a bounded number
//! of weather lookups at once but reduces them in directory order.

use futures::{StreamExt, TryStreamExt, stream};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::{
    config::{Config, FavoritePolicy},
    error::{Error, Result},
    model::{
        ChartImage, Coordinates, CountryRecord, CurrentWeather, HottestCountry, HottestScope,
    },
    provider::{ProviderId, Providers},
};

/// Forecast samples per day at the provider's fixed three-hour resolution.
pub const SAMPLES_PER_DAY: u32 = 8;

/// Starting point for the running maximum; below any plausible temperature.
pub const HOTTEST_SENTINEL_C: f64 = -100.0;

#[derive(Debug, Clone)]
pub struct AggregatorOptions {
    pub max_forecast_samples: u32,
    pub hottest_concurrency: usize,
    pub favorite_policy: FavoritePolicy,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            max_forecast_samples: 40,
            hottest_concurrency: 8,
            favorite_policy: FavoritePolicy::Append,
        }
    }
}

impl From<&Config> for AggregatorOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_forecast_samples: config.weather.max_forecast_samples,
            hottest_concurrency: config.hottest.concurrency,
            favorite_policy: config.favorites.policy,
        }
    }
}

/// Samples needed to cover `days` days, counting both ends of the window.
pub fn forecast_sample_count(days: u32) -> Option<u32> {
    days.checked_mul(SAMPLES_PER_DAY)?.checked_add(1)
}

/// Pick the warmest sample. Ties keep the earlier entry.
pub fn hottest_of<I>(samples: I) -> Option<HottestCountry>
where
    I: IntoIterator<Item = (String, f64)>,
{
    let mut best: Option<HottestCountry> = None;
    let mut max = HOTTEST_SENTINEL_C;

    for (country, temperature_c) in samples {
        if temperature_c > max {
            max = temperature_c;
            best = Some(HottestCountry { country, temperature_c });
        }
    }

    best
}

#[derive(Debug, Clone)]
pub struct RequestAggregator {
    providers: Providers,
    options: AggregatorOptions,
}

impl RequestAggregator {
    pub fn new(providers: Providers, options: AggregatorOptions) -> Self {
        let options = AggregatorOptions {
            hottest_concurrency: options.hottest_concurrency.max(1),
            ..options
        };
        Self { providers, options }
    }

    /// Build the HTTP-backed aggregator described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let providers = Providers::from_config(config)?;
        Ok(Self::new(providers, AggregatorOptions::from(config)))
    }

    pub fn options(&self) -> &AggregatorOptions {
        &self.options
    }

    pub async fn list_all_countries(&self) -> Result<Vec<String>> {
        self.providers.countries.all_names().await
    }

    pub async fn list_countries_by_region(&self, region: &str) -> Result<Vec<String>> {
        self.providers.countries.names_in_region(region).await
    }

    /// Details of the first directory match for `country`.
    pub async fn country_details(&self, country: &str) -> Result<CountryRecord> {
        let mut matches = self.providers.countries.lookup(country).await?;
        if matches.is_empty() {
            return Err(Error::NotFound(format!("No country matches '{country}'")));
        }

        let record = matches.swap_remove(0);
        debug!(
            country,
            matches = matches.len() + 1,
            resolved = %record.common_name,
            capital = record.capital_name().unwrap_or("-"),
            "country resolved"
        );
        Ok(record)
    }

    /// The directory's common name for `country`; used as the favourites key.
    pub async fn canonical_name(&self, country: &str) -> Result<String> {
        Ok(self.country_details(country).await?.common_name)
    }

    #[instrument(skip(self))]
    pub async fn current_weather(&self, country: &str) -> Result<CurrentWeather> {
        let record = self.country_details(country).await?;
        let at = capital_coordinates(&record)?;
        let sample = self.providers.weather.current(at).await?;

        Ok(CurrentWeather {
            temperature_c: sample.temperature_c,
            condition: sample.condition,
            country: record.common_name,
        })
    }

    /// Line chart of the capital's temperature for the next `days` days.
    #[instrument(skip(self))]
    pub async fn forecast_chart(&self, country: &str, days: u32) -> Result<ChartImage> {
        if days == 0 {
            return Err(Error::validation(
                "days",
                "Number of days to be forecasted must be at least 1",
            ));
        }

        let samples = forecast_sample_count(days)
            .filter(|n| *n <= self.options.max_forecast_samples)
            .ok_or_else(|| {
                Error::upstream(
                    ProviderId::OpenWeather,
                    format!(
                        "a {days}-day forecast needs more than the {} samples the provider returns",
                        self.options.max_forecast_samples
                    ),
                )
            })?;

        let record = self.country_details(country).await?;
        let at = capital_coordinates(&record)?;
        let series = self.providers.weather.forecast(at, samples).await?;
        debug!(requested = samples, received = series.len(), "forecast series");

        let title = format!("Weather forecast in {} for the next {days} days", record.common_name);
        self.providers.charts.render_line(&title, &series).await
    }

    /// Warmest capital in `scope`, one weather lookup per candidate.
    #[instrument(skip(self))]
    pub async fn find_hottest(&self, scope: &HottestScope) -> Result<HottestCountry> {
        let candidates = self.providers.countries.candidates(scope).await?;
        let total = candidates.len();

        let located: Vec<(String, Coordinates)> = candidates
            .into_iter()
            .filter_map(|c| match c.capital_coordinates {
                Some(at) => Some((c.common_name, at)),
                None => {
                    debug!(country = %c.common_name, "no capital coordinates, skipping");
                    None
                }
            })
            .collect();

        info!(candidates = total, located = located.len(), "scanning capitals");

        let weather = Arc::clone(&self.providers.weather);
        let samples: Vec<(String, f64)> = stream::iter(located)
            .map(move |(name, at)| {
                let weather = Arc::clone(&weather);
                async move {
                    let sample = weather.current(at).await?;
                    Ok::<_, Error>((name, sample.temperature_c))
                }
            })
            .buffered(self.options.hottest_concurrency)
            .try_collect()
            .await?;

        hottest_of(samples).ok_or_else(|| match scope {
            HottestScope::World => Error::NotFound("No countries with known capitals".to_string()),
            HottestScope::Region(region) => {
                Error::NotFound(format!("No countries with known capitals in region '{region}'"))
            }
        })
    }

    /// Store `country` under its canonical name and return that name.
    #[instrument(skip(self))]
    pub async fn add_favorite(&self, country: &str) -> Result<String> {
        let name = self.canonical_name(country).await?;

        match self.options.favorite_policy {
            FavoritePolicy::Append => self.providers.favorites.insert(&name).await?,
            FavoritePolicy::Upsert => self.providers.favorites.upsert(&name).await?,
        }

        info!(country = %name, policy = %self.options.favorite_policy, "favourite added");
        Ok(name)
    }

    #[instrument(skip(self))]
    pub async fn remove_favorite(&self, country: &str) -> Result<String> {
        let name = self.canonical_name(country).await?;
        self.providers.favorites.delete_one(&name).await?;

        info!(country = %name, "favourite removed");
        Ok(name)
    }

    pub async fn list_favorites(&self) -> Result<Vec<String>> {
        self.providers.favorites.names().await
    }
}

fn capital_coordinates(record: &CountryRecord) -> Result<Coordinates> {
    record.capital_coordinates.ok_or_else(|| {
        Error::NotFound(format!("{} has no capital coordinates", record.common_name))
    })
}
