//! HTTP surface.
//!
//! - `GET /countries` - all country names
//! - `GET /countries/{region}` - country names in a region
//! - `GET /country/{country}` - details for one country
//! - `GET /weather/current/{country}` - current weather at the capital
//! - `GET /weather/forecast/{country}?days=N` - PNG forecast chart
//! - `GET /weather/hottest?region=R` - warmest capital in a region, or `all`
//! - `GET|POST|DELETE /favourites[?country=C]` - favourites list

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
};
use countries_core::{Error, HottestScope, RequestAggregator};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::{str::FromStr, sync::Arc};
use tower_http::trace::TraceLayer;

use crate::error::ApiResult;

pub type AppState = Arc<RequestAggregator>;

const DAYS_HELP: &str = "Number of days to be forecasted";
const REGION_HELP: &str = "Enter the region that you want to find the hottest country of, \
     to search for whole word use all";
const FAVOURITE_HELP: &str = "Name of the country to favourite";
const UNFAVOURITE_HELP: &str = "Name of the country to unfavourite";

pub fn create_router(aggregator: RequestAggregator) -> Router {
    Router::new()
        .route("/countries", get(list_countries))
        .route("/countries/{region}", get(list_region))
        .route("/country/{country}", get(country_details))
        .route("/weather/current/{country}", get(current_weather))
        .route("/weather/forecast/{country}", get(forecast))
        .route("/weather/hottest", get(hottest))
        .route("/favourites", get(list_favourites).post(add_favourite).delete(remove_favourite))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(aggregator))
}

/// Parse a required query parameter, reporting `help` when it is missing or malformed.
fn required<T: FromStr>(value: Option<&str>, param: &'static str, help: &str) -> Result<T, Error> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| Error::validation(param, help))
}

#[derive(Debug, Deserialize)]
struct ForecastQuery {
    days: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HottestQuery {
    region: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FavouriteQuery {
    country: Option<String>,
}

#[derive(Debug, Serialize)]
struct CountryDetailsResponse {
    country: String,
    capital: Vec<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    area: f64,
    population: u64,
}

#[derive(Debug, Serialize)]
struct CurrentWeatherResponse {
    current_temp: f64,
    current_weather: String,
    country: String,
}

async fn list_countries(State(app): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(app.list_all_countries().await?))
}

async fn list_region(
    State(app): State<AppState>,
    Path(region): Path<String>,
) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(app.list_countries_by_region(&region).await?))
}

async fn country_details(
    State(app): State<AppState>,
    Path(country): Path<String>,
) -> ApiResult<Json<CountryDetailsResponse>> {
    let record = app.country_details(&country).await?;
    let coords = record.capital_coordinates;

    Ok(Json(CountryDetailsResponse {
        country: record.common_name,
        capital: record.capitals,
        latitude: coords.map(|c| c.latitude),
        longitude: coords.map(|c| c.longitude),
        area: record.area_km2,
        population: record.population,
    }))
}

async fn current_weather(
    State(app): State<AppState>,
    Path(country): Path<String>,
) -> ApiResult<Json<CurrentWeatherResponse>> {
    let current = app.current_weather(&country).await?;

    Ok(Json(CurrentWeatherResponse {
        current_temp: current.temperature_c,
        current_weather: current.condition,
        country: current.country,
    }))
}

async fn forecast(
    State(app): State<AppState>,
    Path(country): Path<String>,
    Query(query): Query<ForecastQuery>,
) -> ApiResult<impl IntoResponse> {
    let days: u32 = required(query.days.as_deref(), "days", DAYS_HELP)?;
    let image = app.forecast_chart(&country, days).await?;

    Ok(([(header::CONTENT_TYPE, image.content_type)], image.bytes))
}

async fn hottest(
    State(app): State<AppState>,
    Query(query): Query<HottestQuery>,
) -> ApiResult<Json<Value>> {
    let region: String = required(query.region.as_deref(), "region", REGION_HELP)?;
    let scope = HottestScope::parse(&region);
    let hottest = app.find_hottest(&scope).await?;

    let body = match scope {
        HottestScope::World => json!({
            "Hottest country in the world is:": hottest.country,
            "Temperature is:": hottest.temperature_c,
        }),
        HottestScope::Region(_) => json!({
            "country": hottest.country,
            "temperature": hottest.temperature_c,
        }),
    };

    Ok(Json(body))
}

async fn list_favourites(State(app): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(app.list_favorites().await?))
}

async fn add_favourite(
    State(app): State<AppState>,
    Query(query): Query<FavouriteQuery>,
) -> ApiResult<Json<&'static str>> {
    let country: String = required(query.country.as_deref(), "country", FAVOURITE_HELP)?;
    app.add_favorite(&country).await?;
    Ok(Json("Added Successfully"))
}

async fn remove_favourite(
    State(app): State<AppState>,
    Query(query): Query<FavouriteQuery>,
) -> ApiResult<Json<&'static str>> {
    let country: String = required(query.country.as_deref(), "country", UNFAVOURITE_HELP)?;
    app.remove_favorite(&country).await?;
    Ok(Json("Deleted Successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use countries_core::{
        AggregatorOptions, ChartImage, ChartRenderer, Coordinates, CountryDirectory, CountryRecord,
        FavoriteStore, ForecastSeries, ProviderId, Providers, WeatherProvider,
        model::{Candidate, WeatherSample},
    };
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };
    use tower::ServiceExt;

    fn record(name: &str, latitude: f64) -> CountryRecord {
        CountryRecord {
            common_name: name.to_string(),
            capitals: vec![format!("{name} City")],
            capital_coordinates: Some(Coordinates { latitude, longitude: 10.0 }),
            area_km2: 500.0,
            population: 42,
        }
    }

    fn known() -> Vec<CountryRecord> {
        vec![record("France", 48.8), record("Brazil", -15.8), record("Peru", -12.0)]
    }

    #[derive(Debug, Default)]
    struct Directory {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CountryDirectory for Directory {
        async fn all_names(&self) -> countries_core::Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(known().into_iter().map(|r| r.common_name).collect())
        }

        async fn names_in_region(&self, region: &str) -> countries_core::Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(match region {
                "South America" => vec!["Brazil".into(), "Peru".into()],
                _ => Vec::new(),
            })
        }

        async fn lookup(&self, name: &str) -> countries_core::Result<Vec<CountryRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let found: Vec<_> = known()
                .into_iter()
                .filter(|r| r.common_name.eq_ignore_ascii_case(name))
                .collect();
            if found.is_empty() {
                return Err(Error::NotFound(format!("No country matches '{name}'")));
            }
            Ok(found)
        }

        async fn candidates(&self, scope: &HottestScope) -> countries_core::Result<Vec<Candidate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let records = match scope {
                HottestScope::World => known(),
                HottestScope::Region(_) => vec![record("Brazil", -15.8), record("Peru", -12.0)],
            };
            Ok(records
                .into_iter()
                .map(|r| Candidate {
                    common_name: r.common_name,
                    capital_coordinates: r.capital_coordinates,
                })
                .collect())
        }
    }

    /// Temperature is the capital's latitude; capitals north of `fail_above` are unreachable.
    #[derive(Debug, Default)]
    struct Weather {
        fail_above: Option<f64>,
        forecast_samples: Mutex<Vec<u32>>,
    }

    #[async_trait]
    impl WeatherProvider for Weather {
        async fn current(&self, at: Coordinates) -> countries_core::Result<WeatherSample> {
            if self.fail_above.is_some_and(|limit| at.latitude > limit) {
                return Err(Error::upstream(ProviderId::OpenWeather, "status 503"));
            }
            Ok(WeatherSample {
                temperature_c: at.latitude,
                condition: "Rain".into(),
                observed_at: None,
            })
        }

        async fn forecast(
            &self,
            _at: Coordinates,
            samples: u32,
        ) -> countries_core::Result<ForecastSeries> {
            self.forecast_samples.lock().unwrap().push(samples);
            Ok(ForecastSeries::default())
        }
    }

    #[derive(Debug, Default)]
    struct Charts {
        failing: bool,
    }

    #[async_trait]
    impl ChartRenderer for Charts {
        async fn render_line(
            &self,
            _title: &str,
            _series: &ForecastSeries,
        ) -> countries_core::Result<ChartImage> {
            if self.failing {
                return Err(Error::upstream(ProviderId::QuickChart, "status 400"));
            }
            Ok(ChartImage { content_type: "image/png".into(), bytes: b"\x89PNG".to_vec() })
        }
    }

    #[derive(Debug, Default)]
    struct Store {
        names: Mutex<Vec<String>>,
        failing: bool,
    }

    #[async_trait]
    impl FavoriteStore for Store {
        async fn insert(&self, name: &str) -> countries_core::Result<()> {
            if self.failing {
                return Err(Error::upstream(ProviderId::MongoData, "status 401"));
            }
            self.names.lock().unwrap().push(name.to_string());
            Ok(())
        }

        async fn upsert(&self, name: &str) -> countries_core::Result<()> {
            let mut names = self.names.lock().unwrap();
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
            Ok(())
        }

        async fn delete_one(&self, name: &str) -> countries_core::Result<()> {
            let mut names = self.names.lock().unwrap();
            if let Some(idx) = names.iter().position(|n| n == name) {
                names.remove(idx);
            }
            Ok(())
        }

        async fn names(&self) -> countries_core::Result<Vec<String>> {
            Ok(self.names.lock().unwrap().clone())
        }
    }

    struct TestApp {
        router: Router,
        directory: Arc<Directory>,
        weather: Arc<Weather>,
    }

    fn app() -> TestApp {
        app_with(Weather::default())
    }

    fn app_with(weather: Weather) -> TestApp {
        app_from(weather, Charts::default(), Store::default())
    }

    fn app_from(weather: Weather, charts: Charts, store: Store) -> TestApp {
        let directory = Arc::new(Directory::default());
        let weather = Arc::new(weather);
        let providers = Providers {
            countries: directory.clone(),
            weather: weather.clone(),
            charts: Arc::new(charts),
            favorites: Arc::new(store),
        };
        let aggregator = RequestAggregator::new(providers, AggregatorOptions::default());
        TestApp { router: create_router(aggregator), directory, weather }
    }

    async fn call(router: &Router, method: Method, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn call_json(router: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
        let (status, body) = call(router, method, uri).await;
        (status, serde_json::from_slice(&body).expect("json body"))
    }

    #[tokio::test]
    async fn lists_all_countries() {
        let app = app();
        let (status, body) = call_json(&app.router, Method::GET, "/countries").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(["France", "Brazil", "Peru"]));
    }

    #[tokio::test]
    async fn region_with_no_members_is_an_empty_array() {
        let app = app();
        let (status, body) = call_json(&app.router, Method::GET, "/countries/Atlantis").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (_, body) = call_json(&app.router, Method::GET, "/countries/South%20America").await;
        assert_eq!(body, json!(["Brazil", "Peru"]));
    }

    #[tokio::test]
    async fn country_details_shape() {
        let app = app();
        let (status, body) = call_json(&app.router, Method::GET, "/country/bRAZIL").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "country": "Brazil",
                "capital": ["Brazil City"],
                "latitude": -15.8,
                "longitude": 10.0,
                "area": 500.0,
                "population": 42
            })
        );
    }

    #[tokio::test]
    async fn unknown_country_collapses_to_500() {
        let app = app();
        let (status, body) = call_json(&app.router, Method::GET, "/country/Narnia").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "No country matches 'Narnia'"}));
    }

    #[tokio::test]
    async fn current_weather_shape() {
        let app = app();
        let (status, body) = call_json(&app.router, Method::GET, "/weather/current/peru").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"current_temp": -12.0, "current_weather": "Rain", "country": "Peru"})
        );
    }

    #[tokio::test]
    async fn upstream_failure_is_uniform_500() {
        let app = app_with(Weather { fail_above: Some(40.0), ..Weather::default() });
        let (status, body) = call_json(&app.router, Method::GET, "/weather/current/France").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "openweather request failed: status 503"}));
    }

    #[tokio::test]
    async fn forecast_returns_png_and_requests_25_samples_for_3_days() {
        let app = app();
        let (status, body) =
            call(&app.router, Method::GET, "/weather/forecast/Brazil?days=3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"\x89PNG".to_vec());
        assert_eq!(*app.weather.forecast_samples.lock().unwrap(), vec![25]);
    }

    #[tokio::test]
    async fn forecast_content_type_is_png() {
        let app = app();
        let request =
            Request::builder().uri("/weather/forecast/Brazil?days=1").body(Body::empty()).unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    }

    #[tokio::test]
    async fn forecast_without_days_is_rejected_before_any_lookup() {
        let app = app();
        let (status, body) = call_json(&app.router, Method::GET, "/weather/forecast/Brazil").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"message": {"days": DAYS_HELP}}));

        let (status, _) =
            call_json(&app.router, Method::GET, "/weather/forecast/Brazil?days=three").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(app.directory.calls.load(Ordering::SeqCst), 0);
        assert!(app.weather.forecast_samples.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn chart_failure_is_uniform_500() {
        let app = app_from(Weather::default(), Charts { failing: true }, Store::default());
        let (status, body) =
            call_json(&app.router, Method::GET, "/weather/forecast/Brazil?days=1").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "quickchart request failed: status 400"}));
        assert_eq!(*app.weather.forecast_samples.lock().unwrap(), vec![9]);
    }

    #[tokio::test]
    async fn hottest_in_region_uses_plain_keys() {
        let app = app();
        let (status, body) =
            call_json(&app.router, Method::GET, "/weather/hottest?region=South%20America").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"country": "Peru", "temperature": -12.0}));
    }

    #[tokio::test]
    async fn hottest_in_world_uses_world_keys() {
        let app = app();
        let (status, body) =
            call_json(&app.router, Method::GET, "/weather/hottest?region=all").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"Hottest country in the world is:": "France", "Temperature is:": 48.8})
        );
    }

    #[tokio::test]
    async fn hottest_fails_whole_when_one_lookup_fails() {
        let app = app_with(Weather { fail_above: Some(40.0), ..Weather::default() });
        let (status, body) =
            call_json(&app.router, Method::GET, "/weather/hottest?region=all").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.get("error").is_some());
    }

    #[tokio::test]
    async fn hottest_without_region_is_rejected() {
        let app = app();
        let (status, body) = call_json(&app.router, Method::GET, "/weather/hottest").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"message": {"region": REGION_HELP}}));
        assert_eq!(app.directory.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn favourites_round_trip() {
        let app = app();

        let (status, body) =
            call_json(&app.router, Method::POST, "/favourites?country=fRANCE").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("Added Successfully"));

        let (_, body) = call_json(&app.router, Method::GET, "/favourites").await;
        assert_eq!(body, json!(["France"]));

        let (status, _) =
            call_json(&app.router, Method::DELETE, "/favourites?country=france").await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = call_json(&app.router, Method::GET, "/favourites").await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn store_failure_is_uniform_500() {
        let store = Store { failing: true, ..Store::default() };
        let app = app_from(Weather::default(), Charts::default(), store);

        let (status, body) =
            call_json(&app.router, Method::POST, "/favourites?country=France").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "mongodata request failed: status 401"}));
    }

    #[tokio::test]
    async fn favourite_without_country_is_rejected() {
        let app = app();

        let (status, body) = call_json(&app.router, Method::POST, "/favourites").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"message": {"country": FAVOURITE_HELP}}));

        let (status, body) = call_json(&app.router, Method::DELETE, "/favourites?country=").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"message": {"country": UNFAVOURITE_HELP}}));

        assert_eq!(app.directory.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn required_parses_and_trims() {
        assert_eq!(required::<u32>(Some(" 4 "), "days", DAYS_HELP).unwrap(), 4);
        assert!(required::<u32>(Some("-1"), "days", DAYS_HELP).is_err());
        assert!(required::<String>(None, "region", REGION_HELP).is_err());
    }
}
