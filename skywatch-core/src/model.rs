use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the user asked for: a typed city or a device position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LocationQuery {
    City(String),
    Coordinates { lat: f64, lon: f64 },
}

impl LocationQuery {
    /// Query pairs understood by the backend proxy (`city=` or `lat=&lon=`).
    pub fn backend_params(&self) -> Vec<(&'static str, String)> {
        match self {
            LocationQuery::City(city) => vec![("city", city.clone())],
            LocationQuery::Coordinates { lat, lon } => {
                vec![("lat", lat.to_string()), ("lon", lon.to_string())]
            }
        }
    }

    /// Query pairs understood by the provider (`q=` or `lat=&lon=`).
    pub fn provider_params(&self) -> Vec<(&'static str, String)> {
        match self {
            LocationQuery::City(city) => vec![("q", city.clone())],
            LocationQuery::Coordinates { lat, lon } => {
                vec![("lat", lat.to_string()), ("lon", lon.to_string())]
            }
        }
    }

    pub fn city(&self) -> Option<&str> {
        match self {
            LocationQuery::City(city) => Some(city),
            LocationQuery::Coordinates { .. } => None,
        }
    }
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationQuery::City(city) => f.write_str(city),
            LocationQuery::Coordinates { lat, lon } => write!(f, "{lat:.4}, {lon:.4}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub name: String,
    pub country: String,
    pub observed_at: DateTime<Utc>,
    pub timezone_offset_secs: i32,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    /// The provider leaves this out for some stations.
    pub visibility_m: Option<u32>,
    pub pressure_hpa: u32,
    pub condition_code: u16,
    pub description: String,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

/// One 3-hour forecast sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub timestamp: DateTime<Utc>,
    pub temperature_c: f64,
    pub condition_code: u16,
    pub description: String,
}

/// Per-day view derived from [`ForecastEntry`] samples. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecastSummary {
    pub date: NaiveDate,
    pub temperature_c: f64,
    pub condition_code: u16,
    pub description: String,
    pub samples: usize,
}

/// Current conditions and forecast, always fetched and replaced together.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub current: CurrentWeather,
    pub forecast: Vec<ForecastEntry>,
}

/// Provider condition codes grouped the way the display shows them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionGroup {
    Thunderstorm,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    Atmosphere,
    Clear,
    FewClouds,
    ScatteredClouds,
    Overcast,
    Unknown,
}

impl ConditionGroup {
    /// See https://openweathermap.org/weather-conditions
    pub fn from_code(code: u16) -> Self {
        match code {
            200..=299 => Self::Thunderstorm,
            300..=399 => Self::Drizzle,
            511..=531 => Self::HeavyRain,
            500..=599 => Self::Rain,
            600..=699 => Self::Snow,
            700..=799 => Self::Atmosphere,
            800 => Self::Clear,
            801 => Self::FewClouds,
            802 => Self::ScatteredClouds,
            803..=899 => Self::Overcast,
            _ => Self::Unknown,
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Thunderstorm => "⚡",
            Self::Drizzle | Self::Rain => "🌧",
            Self::HeavyRain => "⛈",
            Self::Snow => "❄",
            Self::Atmosphere => "🌫",
            Self::Clear => "☀",
            Self::FewClouds => "🌤",
            Self::ScatteredClouds | Self::Unknown => "☁",
            Self::Overcast => "🌥",
        }
    }
}
