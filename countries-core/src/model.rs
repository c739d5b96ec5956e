use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latitude/longitude of a capital city.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    pub common_name: String,
    /// Capitals as listed by the directory; some countries have several.
    pub capitals: Vec<String>,
    pub capital_coordinates: Option<Coordinates>,
    pub area_km2: f64,
    pub population: u64,
}

impl CountryRecord {
    pub fn capital_name(&self) -> Option<&str> {
        self.capitals.first().map(String::as_str)
    }
}

/// A country under consideration for a hottest-country query.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub common_name: String,
    pub capital_coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub temperature_c: f64,
    pub condition: String,
    pub observed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentWeather {
    pub temperature_c: f64,
    pub condition: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub time: DateTime<Utc>,
    pub temperature_c: f64,
}

impl ForecastPoint {
    /// Label in the provider's `dt_txt` layout, used on chart axes.
    pub fn label(&self) -> String {
        self.time.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Chronological forecast samples, in the order the provider returned them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    pub fn labels(&self) -> Vec<String> {
        self.points.iter().map(ForecastPoint::label).collect()
    }

    pub fn temperatures(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.temperature_c).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Rendered chart image.
#[derive(Debug, Clone)]
pub struct ChartImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HottestScope {
    World,
    Region(String),
}

impl HottestScope {
    /// The literal `all` selects the whole world; anything else, `ALL` included, names a region.
    pub fn parse(value: &str) -> Self {
        if value == "all" {
            HottestScope::World
        } else {
            HottestScope::Region(value.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HottestCountry {
    pub country: String,
    pub temperature_c: f64,
}
