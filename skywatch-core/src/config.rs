use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";
pub const DEFAULT_FORECAST_DAYS: usize = 5;

/// Timeouts for the client pipeline, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Timeouts {
    /// Bound on each backend call.
    pub request_secs: u64,
    /// Bound on a whole search or locate, device wait included.
    pub search_secs: u64,
    /// Bound on waiting for a device position.
    pub geolocation_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request_secs: 15,
            search_secs: 25,
            geolocation_secs: 10,
        }
    }
}

impl Timeouts {
    /// Every bound must be non-zero.
    fn validate(&self) -> Result<()> {
        for (name, secs) in [
            ("request_secs", self.request_secs),
            ("search_secs", self.search_secs),
            ("geolocation_secs", self.geolocation_secs),
        ] {
            if secs == 0 {
                return Err(anyhow!("timeouts.{name} must be at least 1"));
            }
        }
        Ok(())
    }
}

/// Device geolocation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeolocationConfig {
    /// A cached fix younger than this is reused.
    pub max_age_secs: u64,
    /// Fixed device position for hosts without a location service.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            max_age_secs: 600,
            latitude: None,
            longitude: None,
        }
    }
}

/// Client configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// backend_url = "http://localhost:3000"
/// forecast_days = 5
///
/// [timeouts]
/// request_secs = 15
///
/// [geolocation]
/// latitude = 51.5074
/// longitude = -0.1278
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub backend_url: String,
    pub forecast_days: usize,
    pub timeouts: Timeouts,
    pub geolocation: GeolocationConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            forecast_days: DEFAULT_FORECAST_DAYS,
            timeouts: Timeouts::default(),
            geolocation: GeolocationConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.request_secs)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.search_secs)
    }

    pub fn geolocation_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.geolocation_secs)
    }

    pub fn geolocation_max_age(&self) -> Duration {
        Duration::from_secs(self.geolocation.max_age_secs)
    }

    /// Configured device position, when both coordinates are set.
    pub fn device_position(&self) -> Option<(f64, f64)> {
        self.geolocation.latitude.zip(self.geolocation.longitude)
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: ClientConfig = toml::from_str(contents)?;
        if cfg.forecast_days == 0 {
            return Err(anyhow!("forecast_days must be at least 1"));
        }
        cfg.timeouts.validate()?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }
}

pub(crate) fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "skywatch", "skywatch")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}
