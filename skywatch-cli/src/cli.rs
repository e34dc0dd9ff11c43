use std::{fmt, process::ExitCode};

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{
    Confirm, CustomType, CustomUserError, InquireError, Select, Text, validator::Validation,
};
use skywatch_core::{
    AppState, ClientConfig, ClientError, FileStore, FixedGeolocator, Geolocator, HttpBackend,
    KeyValueStore, MemoryStore, NoGeolocation, UiState, WeatherApp,
};
use tracing::{debug, warn};

use crate::render;

type App = WeatherApp<HttpBackend, Box<dyn Geolocator>, Box<dyn KeyValueStore>>;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "skywatch",
    version,
    about = "Current weather and a 5-day forecast for any city"
)]
pub struct Cli {
    /// Backend URL, overriding the configured one.
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Without a subcommand an interactive session starts.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show weather for a city.
    Search {
        /// City name; several words are joined with spaces.
        #[arg(required = true)]
        city: Vec<String>,
    },

    /// Show weather for the device position.
    Locate,

    /// Repeat the last lookup.
    Retry,

    /// Edit the configuration file interactively.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let config = ClientConfig::load()?;

        match self.command {
            Some(Command::Configure) => {
                configure(config)?;
                Ok(ExitCode::SUCCESS)
            }
            None => interactive(&build_app(config, self.backend)).await,
            Some(Command::Search { city }) => {
                let app = build_app(config, self.backend);
                let mut state = app.start();
                let result = app.search(&mut state, &city.join(" ")).await;
                Ok(finish(&app, &state, result))
            }
            Some(Command::Locate) => {
                let app = build_app(config, self.backend);
                let mut state = app.start();
                let result = app.locate(&mut state).await;
                Ok(finish(&app, &state, result))
            }
            Some(Command::Retry) => {
                let app = build_app(config, self.backend);
                let mut state = app.start();
                let result = app.retry(&mut state).await;
                Ok(finish(&app, &state, result))
            }
        }
    }
}

fn build_app(mut config: ClientConfig, backend_override: Option<String>) -> App {
    if let Some(url) = backend_override {
        config.backend_url = url;
    }
    let backend = HttpBackend::new(config.backend_url.clone(), config.request_timeout());

    let geolocator: Box<dyn Geolocator> = match config.device_position() {
        Some((lat, lon)) => Box::new(FixedGeolocator::new(lat, lon)),
        None => Box::new(NoGeolocation),
    };

    let store: Box<dyn KeyValueStore> = match FileStore::open_default() {
        Ok(store) => {
            debug!(path = %store.path().display(), "using file storage");
            Box::new(store)
        }
        Err(e) => {
            warn!(error = %e, "persistent storage unavailable, keeping data in memory");
            Box::new(MemoryStore::new())
        }
    };

    WeatherApp::new(config, backend, geolocator, store).with_listener(render::on_change)
}

/// Print the final screen of a one-shot command.
fn finish(app: &App, state: &AppState, result: Result<(), ClientError>) -> ExitCode {
    log_outcome(&result);
    render::print_state(state, app.config().forecast_days);
    if is_failure(state) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn is_failure(state: &AppState) -> bool {
    matches!(state.ui(), UiState::Error { .. })
}

fn log_outcome(result: &Result<(), ClientError>) {
    if let Err(e) = result {
        debug!(error = %e, "lookup failed");
    }
}

#[derive(Debug, Clone, Copy)]
enum MenuItem {
    Search,
    Locate,
    Retry,
    Quit,
}

impl MenuItem {
    const ALL: [MenuItem; 4] = [Self::Search, Self::Locate, Self::Retry, Self::Quit];
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Search => "Search for a city",
            Self::Locate => "Use my location",
            Self::Retry => "Retry",
            Self::Quit => "Quit",
        })
    }
}

/// Esc and Ctrl+C end the prompt instead of failing.
fn skippable<T>(answer: Result<Option<T>, InquireError>) -> anyhow::Result<Option<T>> {
    match answer {
        Ok(value) => Ok(value),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn interactive(app: &App) -> anyhow::Result<ExitCode> {
    let mut state = app.start();
    render::print_state(&state, app.config().forecast_days);

    loop {
        let choice =
            skippable(Select::new("What next?", MenuItem::ALL.to_vec()).prompt_skippable())?;

        let result = match choice.unwrap_or(MenuItem::Quit) {
            MenuItem::Search => {
                let last_city = state.last_city().map(str::to_owned);
                let mut prompt = Text::new("City:");
                if let Some(city) = last_city.as_deref() {
                    prompt = prompt.with_default(city);
                }
                match skippable(prompt.prompt_skippable())? {
                    Some(city) => app.search(&mut state, &city).await,
                    None => continue,
                }
            }
            MenuItem::Locate => app.locate(&mut state).await,
            MenuItem::Retry => app.retry(&mut state).await,
            MenuItem::Quit => break,
        };

        log_outcome(&result);
        render::print_state(&state, app.config().forecast_days);
    }

    Ok(ExitCode::SUCCESS)
}

fn configure(mut config: ClientConfig) -> anyhow::Result<()> {
    config.backend_url = Text::new("Backend URL:")
        .with_default(&config.backend_url)
        .prompt()?;

    config.forecast_days = CustomType::<usize>::new("Days of forecast:")
        .with_default(config.forecast_days)
        .with_validator(|days: &usize| -> Result<Validation, CustomUserError> {
            Ok(if *days >= 1 {
                Validation::Valid
            } else {
                Validation::Invalid("At least one day".into())
            })
        })
        .prompt()?;

    let fixed = Confirm::new("Use a fixed device position for `locate`?")
        .with_default(config.device_position().is_some())
        .prompt()?;

    if fixed {
        let (lat, lon) = config.device_position().unwrap_or((0.0, 0.0));
        config.geolocation.latitude = Some(coordinate("Latitude:", lat, 90.0)?);
        config.geolocation.longitude = Some(coordinate("Longitude:", lon, 180.0)?);
    } else {
        config.geolocation.latitude = None;
        config.geolocation.longitude = None;
    }

    config.save()?;
    let path = ClientConfig::config_file_path().context("Failed to locate config file")?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

fn coordinate(message: &str, default: f64, bound: f64) -> anyhow::Result<f64> {
    Ok(CustomType::<f64>::new(message)
        .with_default(default)
        .with_validator(move |v: &f64| -> Result<Validation, CustomUserError> {
            Ok(if v.is_finite() && v.abs() <= bound {
                Validation::Valid
            } else {
                Validation::Invalid(format!("Must be between -{bound} and {bound}").into())
            })
        })
        .prompt()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_joins_words() {
        let cli = Cli::try_parse_from(["skywatch", "search", "New", "York"]).unwrap();
        match cli.command {
            Some(Command::Search { city }) => assert_eq!(city.join(" "), "New York"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn search_requires_a_city() {
        assert!(Cli::try_parse_from(["skywatch", "search"]).is_err());
    }

    #[test]
    fn no_subcommand_is_interactive() {
        let cli = Cli::try_parse_from(["skywatch", "--backend", "http://localhost:4000"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.backend.as_deref(), Some("http://localhost:4000"));
    }

    fn offline_app() -> App {
        WeatherApp::new(
            ClientConfig::default(),
            HttpBackend::new("http://127.0.0.1:9", std::time::Duration::from_secs(1)),
            Box::new(NoGeolocation) as Box<dyn Geolocator>,
            Box::new(MemoryStore::new()) as Box<dyn KeyValueStore>,
        )
    }

    #[tokio::test]
    async fn error_state_fails_the_process() {
        let app = offline_app();
        let mut state = app.start();
        assert!(!is_failure(&state));

        app.search(&mut state, "   ").await.unwrap_err();
        assert!(is_failure(&state));
    }

    #[test]
    fn backend_override_wins() {
        let app = build_app(ClientConfig::default(), Some("http://example.test:1".into()));
        assert_eq!(app.config().backend_url, "http://example.test:1");
    }
}
