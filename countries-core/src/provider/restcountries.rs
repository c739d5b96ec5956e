use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    http,
    model::{Candidate, Coordinates, CountryRecord, HottestScope},
};

use super::{CountryDirectory, ProviderId};

const PROVIDER: ProviderId = ProviderId::RestCountries;

#[derive(Debug, Clone)]
pub struct RestCountriesDirectory {
    base_url: String,
    http: Client,
}

impl RestCountriesDirectory {
    pub fn new(http: Client, base_url: String) -> Self {
        Self { base_url, http }
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let base = &self.base_url;
        let mut url = Url::parse(base)
            .map_err(|e| Error::Config(format!("invalid country directory URL '{base}': {e}")))?;

        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("country directory URL '{base}' cannot be a base")))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    /// GET `segments` with a `fields` projection. `None` means the directory answered 404.
    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        what: &str,
        segments: &[&str],
        fields: &str,
    ) -> Result<Option<Vec<T>>> {
        let url = self.url(segments)?;
        let request = self.http.get(url).query(&[("fields", fields)]);
        let res = http::send(PROVIDER, what, request).await?;

        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        http::success_json(PROVIDER, what, res).await.map(Some)
    }

    fn scope_segments(scope: &HottestScope) -> Vec<&str> {
        match scope {
            HottestScope::World => vec!["all"],
            HottestScope::Region(region) => vec!["region", region.as_str()],
        }
    }
}

#[derive(Debug, Deserialize)]
struct RcName {
    common: String,
}

#[derive(Debug, Deserialize)]
struct RcNameOnly {
    name: RcName,
}

#[derive(Debug, Default, Deserialize)]
struct RcCapitalInfo {
    #[serde(default)]
    latlng: Option<Vec<f64>>,
}

impl RcCapitalInfo {
    fn coordinates(&self) -> Option<Coordinates> {
        match self.latlng.as_deref() {
            Some([latitude, longitude]) => {
                Some(Coordinates { latitude: *latitude, longitude: *longitude })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RcCandidate {
    name: RcName,
    #[serde(default, rename = "capitalInfo")]
    capital_info: RcCapitalInfo,
}

#[derive(Debug, Deserialize)]
struct RcCountry {
    name: RcName,
    #[serde(default)]
    capital: Vec<String>,
    #[serde(default, rename = "capitalInfo")]
    capital_info: RcCapitalInfo,
    area: f64,
    population: u64,
}

impl From<RcCountry> for CountryRecord {
    fn from(c: RcCountry) -> Self {
        let capital_coordinates = c.capital_info.coordinates();
        CountryRecord {
            common_name: c.name.common,
            capitals: c.capital,
            capital_coordinates,
            area_km2: c.area,
            population: c.population,
        }
    }
}

#[async_trait]
impl CountryDirectory for RestCountriesDirectory {
    async fn all_names(&self) -> Result<Vec<String>> {
        let countries: Vec<RcNameOnly> = self
            .fetch("country list", &["all"], "name")
            .await?
            .ok_or_else(|| Error::upstream(PROVIDER, "country list endpoint returned 404"))?;

        Ok(countries.into_iter().map(|c| c.name.common).collect())
    }

    async fn names_in_region(&self, region: &str) -> Result<Vec<String>> {
        let countries: Vec<RcNameOnly> =
            self.fetch("region", &["region", region], "name").await?.unwrap_or_default();

        Ok(countries.into_iter().map(|c| c.name.common).collect())
    }

    async fn lookup(&self, name: &str) -> Result<Vec<CountryRecord>> {
        let countries: Vec<RcCountry> = self
            .fetch("country lookup", &["name", name], "name,capital,capitalInfo,area,population")
            .await?
            .unwrap_or_default();

        if countries.is_empty() {
            return Err(Error::NotFound(format!("No country matches '{name}'")));
        }

        Ok(countries.into_iter().map(CountryRecord::from).collect())
    }

    async fn candidates(&self, scope: &HottestScope) -> Result<Vec<Candidate>> {
        let segments = Self::scope_segments(scope);
        let countries: Vec<RcCandidate> =
            self.fetch("candidate list", &segments, "name,capitalInfo").await?.unwrap_or_default();

        Ok(countries
            .into_iter()
            .map(|c| Candidate {
                capital_coordinates: c.capital_info.coordinates(),
                common_name: c.name.common,
            })
            .collect())
    }
}
