//! Core library for the `countries-api` service.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstractions over the country, weather, chart and favourites providers
//! - Shared domain models and the error taxonomy
//! - The [`RequestAggregator`] that composes provider calls into responses
//!
//! It is used by `countries-api`, but can also be reused by other binaries.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod provider;

pub use aggregator::{AggregatorOptions, RequestAggregator};
pub use config::{Config, FavoritePolicy, Overrides};
pub use error::{Error, Result};
pub use model::{
    ChartImage, Coordinates, CountryRecord, CurrentWeather, ForecastSeries, HottestCountry,
    HottestScope,
};
pub use provider::{
    ChartRenderer, CountryDirectory, FavoriteStore, ProviderId, Providers, WeatherProvider,
};
