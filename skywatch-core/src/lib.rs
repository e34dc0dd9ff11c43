//! Core library for SkyWatch.
//!
//! This crate defines:
//! - Shared domain models (queries, current weather, forecast samples)
//! - The OpenWeatherMap provider client used by `skywatch-server`
//! - The client pipeline used by `skywatch-cli`: location resolution,
//!   the fetch orchestrator, daily aggregation, UI state and persistence
//! - Client configuration
//!
//! Binaries own presentation and process setup; everything else lives here.

pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod forecast;
pub mod location;
pub mod model;
pub mod provider;
pub mod state;
pub mod store;

pub use app::{AppState, WeatherApp};
pub use backend::{HttpBackend, WeatherBackend};
pub use config::ClientConfig;
pub use error::{ClientError, GeolocationError, UpstreamKind};
pub use location::{FixedGeolocator, Geolocator, LocationResolver, NoGeolocation};
pub use model::{
    ConditionGroup, CurrentWeather, DailyForecastSummary, ForecastEntry, LocationQuery,
    WeatherSnapshot,
};
pub use provider::{Endpoint, OpenWeatherProvider, ProviderError, WeatherProvider};
pub use state::{UiState, UiStateKind};
pub use store::{FileStore, KeyValueStore, MemoryStore};
