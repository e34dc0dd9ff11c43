/// Server configuration, read from the environment (and `.env`)
use anyhow::{Context, Result};
use skywatch_core::provider::openweather::DEFAULT_BASE_URL;
use std::{env, time::Duration};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    /// Absent key is not fatal: weather endpoints answer 500 until it is set.
    pub api_key: Option<String>,
    pub provider_base_url: String,
    pub upstream_timeout: Duration,
    pub rate_limit: RateLimitConfig,
    pub environment: String,
}

#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u32,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = u16::try_from(lookup_u64(&lookup, "PORT", 3000))
            .context("PORT must fit in 16 bits")?;

        let api_key = lookup("OPENWEATHER_API_KEY").filter(|k| !k.trim().is_empty());

        let provider_base_url =
            lookup("OPENWEATHER_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let max_requests = u32::try_from(lookup_u64(&lookup, "RATE_LIMIT_MAX_REQUESTS", 100))
            .context("RATE_LIMIT_MAX_REQUESTS is too large")?;

        Ok(Self {
            port,
            api_key,
            provider_base_url,
            upstream_timeout: Duration::from_millis(lookup_u64(&lookup, "UPSTREAM_TIMEOUT_MS", 10_000)),
            rate_limit: RateLimitConfig {
                window: Duration::from_millis(lookup_u64(&lookup, "RATE_LIMIT_WINDOW_MS", 15 * 60 * 1000)),
                max_requests,
            },
            environment: lookup("APP_ENV").unwrap_or_else(|| "development".to_string()),
        })
    }
}

fn lookup_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    lookup(key)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
