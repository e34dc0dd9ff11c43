use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, header::RETRY_AFTER};
use serde::Deserialize;
use std::time::Duration;

use crate::model::{CurrentWeather, ForecastEntry, LocationQuery};

use super::{Endpoint, ProviderError, WeatherProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("skywatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build OpenWeather HTTP client")?;

        Ok(Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch(
        &self,
        endpoint: Endpoint,
        query: &LocationQuery,
    ) -> Result<serde_json::Value, ProviderError> {
        let url = format!("{}/{}", self.base_url, endpoint.as_str());

        let mut params = query.provider_params();
        params.push(("appid", self.api_key.clone()));
        params.push(("units", "metric".to_string()));

        let res = self.http.get(&url).query(&params).send().await?;

        let status = res.status();
        let retry_after = res
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = res.text().await?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                retry_after,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::Other(format!("OpenWeather {endpoint} returned invalid JSON: {e}"))
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    #[serde(default)]
    feels_like: f64,
    #[serde(default)]
    humidity: u8,
    #[serde(default)]
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: u16,
    description: String,
}

#[derive(Debug, Deserialize, Default)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize, Default)]
struct OwSys {
    #[serde(default)]
    country: String,
    #[serde(default)]
    sunrise: i64,
    #[serde(default)]
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    #[serde(default)]
    timezone: i32,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
    visibility: Option<u32>,
    #[serde(default)]
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

/// Parse a `/weather` payload.
pub fn parse_current(body: &str) -> serde_json::Result<CurrentWeather> {
    let parsed: OwCurrentResponse = serde_json::from_str(body)?;
    let (condition_code, description) = condition(&parsed.weather);

    Ok(CurrentWeather {
        name: parsed.name,
        country: parsed.sys.country,
        observed_at: unix_to_utc(parsed.dt),
        timezone_offset_secs: parsed.timezone,
        temperature_c: parsed.main.temp,
        feels_like_c: parsed.main.feels_like,
        humidity_pct: parsed.main.humidity,
        wind_speed_mps: parsed.wind.speed,
        visibility_m: parsed.visibility,
        pressure_hpa: parsed.main.pressure,
        condition_code,
        description,
        sunrise: unix_to_utc(parsed.sys.sunrise),
        sunset: unix_to_utc(parsed.sys.sunset),
    })
}

/// Parse a `/forecast` payload into its 3-hour samples, in provider order.
pub fn parse_forecast(body: &str) -> serde_json::Result<Vec<ForecastEntry>> {
    let parsed: OwForecastResponse = serde_json::from_str(body)?;

    Ok(parsed
        .list
        .into_iter()
        .map(|entry| {
            let (condition_code, description) = condition(&entry.weather);
            ForecastEntry {
                timestamp: unix_to_utc(entry.dt),
                temperature_c: entry.main.temp,
                condition_code,
                description,
            }
        })
        .collect())
}

fn condition(weather: &[OwWeather]) -> (u16, String) {
    weather
        .first()
        .map(|w| (w.id, w.description.clone()))
        .unwrap_or_else(|| (0, "Unknown".to_string()))
}

fn unix_to_utc(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_else(Utc::now)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
