use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    http,
    model::{Coordinates, ForecastPoint, ForecastSeries, WeatherSample},
};

use super::{ProviderId, WeatherProvider};

const PROVIDER: ProviderId = ProviderId::OpenWeather;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    base_url: String,
    api_key: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(http: Client, base_url: String, api_key: String) -> Self {
        Self { base_url, api_key, http }
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{name}", self.base_url.trim_end_matches('/'))
    }

    fn location_query(&self, at: Coordinates) -> Vec<(&'static str, String)> {
        vec![
            ("lat", at.latitude.to_string()),
            ("lon", at.longitude.to_string()),
            ("appid", self.api_key.clone()),
            ("mode", "json".to_string()),
            ("units", "metric".to_string()),
        ]
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    dt: Option<i64>,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, at: Coordinates) -> Result<WeatherSample> {
        let request = self.http.get(self.endpoint("weather")).query(&self.location_query(at));
        let res = http::send(PROVIDER, "current weather", request).await?;
        let parsed: OwCurrentResponse = http::success_json(PROVIDER, "current weather", res).await?;

        let condition = parsed
            .weather
            .first()
            .map(|w| w.main.clone())
            .unwrap_or_else(|| "Unknown".to_string());

        Ok(WeatherSample {
            temperature_c: parsed.main.temp,
            condition,
            observed_at: parsed.dt.and_then(unix_to_utc),
        })
    }

    async fn forecast(&self, at: Coordinates, samples: u32) -> Result<ForecastSeries> {
        let mut query = self.location_query(at);
        query.push(("cnt", samples.to_string()));

        let request = self.http.get(self.endpoint("forecast")).query(&query);
        let res = http::send(PROVIDER, "forecast", request).await?;
        let parsed: OwForecastResponse = http::success_json(PROVIDER, "forecast", res).await?;

        let points = parsed
            .list
            .into_iter()
            .map(|entry| {
                let dt = entry.dt;
                let time = unix_to_utc(dt).ok_or_else(|| {
                    Error::upstream(PROVIDER, format!("forecast timestamp {dt} out of range"))
                })?;
                Ok(ForecastPoint { time, temperature_c: entry.main.temp })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ForecastSeries { points })
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}
