//! Search, locate and retry: the client's request pipeline.
//!
//! All mutable client data lives in [`AppState`], passed by `&mut` into each
//! operation of [`WeatherApp`]. Weather data is replaced only after both the
//! current and the forecast calls have succeeded, so a failed or timed-out
//! search leaves the previous snapshot untouched.

use tokio::time::{Instant, timeout_at};
use tracing::{info, warn};

use crate::{
    backend::WeatherBackend,
    config::ClientConfig,
    error::ClientError,
    forecast::daily_summaries,
    location::{Geolocator, LocationResolver, resolve_city},
    model::{DailyForecastSummary, LocationQuery, WeatherSnapshot},
    state::UiState,
    store::{KeyValueStore, LAST_LOCATION_KEY},
};

const SEARCHING: &str = "Searching for weather data...";
const LOCATING: &str = "Getting your location...";
const FETCHING_LOCAL: &str = "Fetching weather for your location...";

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    ui: UiState,
    snapshot: Option<WeatherSnapshot>,
    last_city: Option<String>,
    last_query: Option<LocationQuery>,
}

impl AppState {
    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        self.snapshot.as_ref()
    }

    /// Last city that loaded successfully, from this session or storage.
    pub fn last_city(&self) -> Option<&str> {
        self.last_city.as_deref()
    }

    pub fn last_query(&self) -> Option<&LocationQuery> {
        self.last_query.as_ref()
    }

    /// Daily view of the current forecast, recomputed on every call.
    pub fn daily_forecast(&self, limit: usize) -> Vec<DailyForecastSummary> {
        self.snapshot
            .as_ref()
            .map(|s| daily_summaries(&s.forecast, limit))
            .unwrap_or_default()
    }
}

/// Called after every state change.
pub type StateListener = Box<dyn Fn(&AppState) + Send + Sync>;

pub struct WeatherApp<B, G, S> {
    config: ClientConfig,
    backend: B,
    resolver: LocationResolver<G>,
    store: S,
    listener: Option<StateListener>,
}

impl<B, G, S> WeatherApp<B, G, S>
where
    B: WeatherBackend,
    G: Geolocator,
    S: KeyValueStore,
{
    pub fn new(config: ClientConfig, backend: B, geolocator: G, store: S) -> Self {
        let resolver = LocationResolver::new(
            geolocator,
            config.geolocation_timeout(),
            config.geolocation_max_age(),
        );
        Self {
            config,
            backend,
            resolver,
            store,
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: impl Fn(&AppState) + Send + Sync + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Initial state: the welcome screen, pre-filled from storage.
    pub fn start(&self) -> AppState {
        let last_city = match self.store.get(LAST_LOCATION_KEY) {
            Ok(city) => city.filter(|c| !c.trim().is_empty()),
            Err(e) => {
                warn!(error = %e, "could not load last location");
                None
            }
        };

        let state = AppState {
            ui: UiState::welcome(last_city.clone()),
            snapshot: None,
            last_city,
            last_query: None,
        };
        self.notify(&state);
        state
    }

    /// Look up a typed city.
    pub async fn search(&self, state: &mut AppState, input: &str) -> Result<(), ClientError> {
        let query = match resolve_city(input) {
            Ok(query) => query,
            Err(e) => return Err(self.fail(state, e)),
        };

        let deadline = Instant::now() + self.config.search_timeout();
        self.fetch_into(state, query, SEARCHING, deadline).await
    }

    /// Look up the device position.
    pub async fn locate(&self, state: &mut AppState) -> Result<(), ClientError> {
        let previous = state.ui.clone();
        let deadline = Instant::now() + self.config.search_timeout();
        self.set_loading(state, LOCATING);

        let located = timeout_at(deadline, self.resolver.locate())
            .await
            .unwrap_or(Err(ClientError::Timeout));

        match located {
            Ok(query) => self.fetch_into(state, query, FETCHING_LOCAL, deadline).await,
            Err(ClientError::LocationInProgress) => {
                info!("location request already in progress, ignoring");
                state.ui = previous;
                self.notify(state);
                Err(ClientError::LocationInProgress)
            }
            Err(e) => Err(self.fail(state, e)),
        }
    }

    /// Re-issue the last attempted query, else the last successful city,
    /// else fall back to the device position.
    pub async fn retry(&self, state: &mut AppState) -> Result<(), ClientError> {
        let query = state
            .last_query
            .clone()
            .or_else(|| state.last_city.clone().map(LocationQuery::City));

        match query {
            Some(LocationQuery::City(city)) => self.search(state, &city).await,
            Some(query) => {
                let deadline = Instant::now() + self.config.search_timeout();
                self.fetch_into(state, query, FETCHING_LOCAL, deadline).await
            }
            None => self.locate(state).await,
        }
    }

    /// Daily view sized by configuration.
    pub fn daily_forecast(&self, state: &AppState) -> Vec<DailyForecastSummary> {
        state.daily_forecast(self.config.forecast_days)
    }

    async fn fetch_into(
        &self,
        state: &mut AppState,
        query: LocationQuery,
        message: &str,
        deadline: Instant,
    ) -> Result<(), ClientError> {
        state.last_query = Some(query.clone());
        self.set_loading(state, message);

        let fetched = timeout_at(deadline, self.fetch_pair(&query))
            .await
            .unwrap_or(Err(ClientError::Timeout));

        match fetched {
            Ok(snapshot) => {
                self.apply(state, query, snapshot);
                Ok(())
            }
            Err(e) => Err(self.fail(state, e)),
        }
    }

    /// Current conditions and forecast, concurrently. Both must succeed.
    async fn fetch_pair(&self, query: &LocationQuery) -> Result<WeatherSnapshot, ClientError> {
        let (current, forecast) =
            tokio::join!(self.backend.current(query), self.backend.forecast(query));

        Ok(WeatherSnapshot {
            current: current?,
            forecast: forecast?,
        })
    }

    fn apply(&self, state: &mut AppState, query: LocationQuery, snapshot: WeatherSnapshot) {
        info!(%query, location = %snapshot.current.name, "weather loaded");
        state.snapshot = Some(snapshot);

        if let LocationQuery::City(city) = query {
            if let Err(e) = self.store.set(LAST_LOCATION_KEY, &city) {
                warn!(error = %e, "could not save last location");
            }
            state.last_city = Some(city);
        }

        if let Err(e) = state.ui.show_weather() {
            warn!(error = %e, "weather loaded outside of a pending search");
            state.ui = UiState::WeatherDisplay;
        }
        self.notify(state);
    }

    fn fail(&self, state: &mut AppState, error: ClientError) -> ClientError {
        warn!(error = %error, "weather lookup failed");
        state.ui.show_error(error.user_message());
        self.notify(state);
        error
    }

    fn set_loading(&self, state: &mut AppState, message: &str) {
        state.ui.begin_loading(message);
        self.notify(state);
    }

    fn notify(&self, state: &AppState) {
        if let Some(listener) = &self.listener {
            listener(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{GeolocationError, UpstreamKind},
        location::{FixedGeolocator, NoGeolocation, Position, PositionOptions},
        model::{CurrentWeather, ForecastEntry},
        state::UiStateKind,
        store::{MemoryStore, StoreError},
    };
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use parking_lot::Mutex;
    use std::{sync::Arc, time::Duration};

    #[derive(Default)]
    struct FakeBackend {
        fail_current: Mutex<Option<ClientError>>,
        fail_forecast: Mutex<Option<ClientError>>,
        delay: Duration,
        queries: Mutex<Vec<LocationQuery>>,
    }

    fn at(ts: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(ts, 0).unwrap()
    }

    fn current_for(query: &LocationQuery) -> CurrentWeather {
        CurrentWeather {
            name: query.to_string(),
            country: "XX".into(),
            observed_at: at(1_717_236_000),
            timezone_offset_secs: 0,
            temperature_c: 20.0,
            feels_like_c: 19.0,
            humidity_pct: 50,
            wind_speed_mps: 2.0,
            visibility_m: Some(10_000),
            pressure_hpa: 1013,
            condition_code: 800,
            description: "clear sky".into(),
            sunrise: at(1_717_212_000),
            sunset: at(1_717_268_000),
        }
    }

    #[async_trait]
    impl WeatherBackend for FakeBackend {
        async fn current(&self, query: &LocationQuery) -> Result<CurrentWeather, ClientError> {
            self.queries.lock().push(query.clone());
            tokio::time::sleep(self.delay).await;
            match self.fail_current.lock().clone() {
                Some(e) => Err(e),
                None => Ok(current_for(query)),
            }
        }

        async fn forecast(
            &self,
            _query: &LocationQuery,
        ) -> Result<Vec<ForecastEntry>, ClientError> {
            tokio::time::sleep(self.delay).await;
            match self.fail_forecast.lock().clone() {
                Some(e) => Err(e),
                None => Ok(vec![ForecastEntry {
                    timestamp: at(1_717_243_200),
                    temperature_c: 21.0,
                    condition_code: 801,
                    description: "few clouds".into(),
                }]),
            }
        }
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("disabled".into()))
        }
        fn set(&self, _: &str, _: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("disabled".into()))
        }
    }

    fn app<G: Geolocator, S: KeyValueStore>(
        backend: FakeBackend,
        geo: G,
        store: S,
    ) -> WeatherApp<FakeBackend, G, S> {
        WeatherApp::new(ClientConfig::default(), backend, geo, store)
    }

    #[tokio::test]
    async fn successful_search_displays_and_persists() {
        let app = app(FakeBackend::default(), NoGeolocation, MemoryStore::new());
        let mut state = app.start();
        assert_eq!(state.ui().kind(), UiStateKind::Welcome);

        app.search(&mut state, "  Paris ").await.unwrap();

        assert_eq!(state.ui(), &UiState::WeatherDisplay);
        assert_eq!(state.snapshot().unwrap().current.name, "Paris");
        assert_eq!(state.last_city(), Some("Paris"));
        assert_eq!(
            app.store.get(LAST_LOCATION_KEY).unwrap().as_deref(),
            Some("Paris")
        );
        assert_eq!(app.daily_forecast(&state).len(), 1);
    }

    #[tokio::test]
    async fn blank_search_makes_no_request() {
        let app = app(FakeBackend::default(), NoGeolocation, MemoryStore::new());
        let mut state = app.start();

        let err = app.search(&mut state, "   ").await.unwrap_err();

        assert_eq!(err, ClientError::EmptyCity);
        assert_eq!(state.ui().kind(), UiStateKind::Error);
        assert!(app.backend.queries.lock().is_empty());
        assert!(state.snapshot().is_none());
    }

    #[tokio::test]
    async fn partial_failure_keeps_previous_snapshot() {
        let app = app(FakeBackend::default(), NoGeolocation, MemoryStore::new());
        let mut state = app.start();
        app.search(&mut state, "Paris").await.unwrap();
        let before = state.snapshot().cloned();

        *app.backend.fail_forecast.lock() = Some(ClientError::upstream(502, None, None));
        let err = app.search(&mut state, "Berlin").await.unwrap_err();

        assert!(matches!(
            err,
            ClientError::Upstream {
                kind: UpstreamKind::ServiceUnavailable,
                ..
            }
        ));
        assert_eq!(state.snapshot().cloned(), before);
        assert_eq!(state.last_city(), Some("Paris"));
        assert_eq!(
            state.ui(),
            &UiState::Error {
                message: "Weather service temporarily unavailable. Please try again later."
                    .into()
            }
        );
    }

    #[tokio::test]
    async fn current_failure_also_keeps_previous_snapshot() {
        let app = app(FakeBackend::default(), NoGeolocation, MemoryStore::new());
        let mut state = app.start();
        app.search(&mut state, "Paris").await.unwrap();
        let before = state.snapshot().cloned();

        *app.backend.fail_current.lock() = Some(ClientError::upstream(404, None, None));
        app.search(&mut state, "Atlantis").await.unwrap_err();

        assert_eq!(state.snapshot().cloned(), before);
    }

    #[tokio::test]
    async fn slow_pipeline_times_out_without_touching_state() {
        let backend = FakeBackend {
            delay: Duration::from_secs(3),
            ..FakeBackend::default()
        };
        let mut config = ClientConfig::default();
        config.timeouts.search_secs = 1;
        let app = WeatherApp::new(config, backend, NoGeolocation, MemoryStore::new());
        let mut state = app.start();

        let err = app.search(&mut state, "Paris").await.unwrap_err();

        assert_eq!(err, ClientError::Timeout);
        assert_eq!(state.ui().kind(), UiStateKind::Error);
        assert!(state.snapshot().is_none());
        assert_eq!(state.last_city(), None);
    }

    #[tokio::test]
    async fn retry_uses_stored_city_from_startup() {
        let app = app(
            FakeBackend::default(),
            NoGeolocation,
            MemoryStore::with_entry(LAST_LOCATION_KEY, "Paris"),
        );
        let mut state = app.start();
        assert_eq!(
            state.ui(),
            &UiState::Welcome {
                last_city: Some("Paris".into())
            }
        );

        app.retry(&mut state).await.unwrap();

        assert_eq!(
            app.backend.queries.lock().as_slice(),
            &[LocationQuery::City("Paris".into())]
        );
        assert_eq!(state.ui(), &UiState::WeatherDisplay);
    }

    #[tokio::test]
    async fn retry_without_history_falls_back_to_location() {
        let app = app(FakeBackend::default(), NoGeolocation, MemoryStore::new());
        let mut state = app.start();

        let err = app.retry(&mut state).await.unwrap_err();

        assert_eq!(err, ClientError::Geolocation(GeolocationError::Unsupported));
        assert!(app.backend.queries.lock().is_empty());
        assert_eq!(state.ui().kind(), UiStateKind::Error);
    }

    #[tokio::test]
    async fn retry_reissues_last_attempt() {
        let app = app(
            FakeBackend::default(),
            NoGeolocation,
            MemoryStore::with_entry(LAST_LOCATION_KEY, "Paris"),
        );
        let mut state = app.start();

        *app.backend.fail_current.lock() = Some(ClientError::Network("offline".into()));
        app.search(&mut state, "Madrid").await.unwrap_err();

        *app.backend.fail_current.lock() = None;
        app.retry(&mut state).await.unwrap();

        let queries = app.backend.queries.lock();
        assert_eq!(queries.last(), Some(&LocationQuery::City("Madrid".into())));
        assert_eq!(state.last_city(), Some("Madrid"));
    }

    #[tokio::test]
    async fn locate_fetches_by_coordinates_without_persisting() {
        let store = MemoryStore::new();
        let app = app(FakeBackend::default(), FixedGeolocator::new(35.68, 139.69), store);
        let mut state = app.start();

        app.locate(&mut state).await.unwrap();

        assert_eq!(
            app.backend.queries.lock().as_slice(),
            &[LocationQuery::Coordinates {
                lat: 35.68,
                lon: 139.69
            }]
        );
        assert_eq!(state.ui(), &UiState::WeatherDisplay);
        assert_eq!(app.store.get(LAST_LOCATION_KEY).unwrap(), None);
        assert_eq!(state.last_city(), None);
    }

    struct SlowGeolocator(Duration);

    #[async_trait]
    impl Geolocator for SlowGeolocator {
        async fn current_position(
            &self,
            _: &PositionOptions,
        ) -> Result<Position, GeolocationError> {
            tokio::time::sleep(self.0).await;
            Ok(Position {
                latitude: 52.52,
                longitude: 13.40,
            })
        }
    }

    #[tokio::test]
    async fn overlapping_locate_leaves_rejected_state_untouched() {
        let app = app(
            FakeBackend::default(),
            SlowGeolocator(Duration::from_millis(50)),
            MemoryStore::new(),
        );
        let mut first = app.start();
        let mut second = app.start();
        app.search(&mut second, "Paris").await.unwrap();
        let before = second.clone();

        let (first_result, second_result) =
            tokio::join!(app.locate(&mut first), app.locate(&mut second));

        first_result.unwrap();
        assert_eq!(first.ui(), &UiState::WeatherDisplay);
        assert_eq!(second_result, Err(ClientError::LocationInProgress));
        assert_eq!(second, before);
        assert_eq!(second.ui(), &UiState::WeatherDisplay);
    }

    #[tokio::test]
    async fn store_failures_are_not_surfaced() {
        let app = app(FakeBackend::default(), NoGeolocation, BrokenStore);
        let mut state = app.start();
        assert_eq!(state.ui(), &UiState::Welcome { last_city: None });

        app.search(&mut state, "Paris").await.unwrap();
        assert_eq!(state.ui(), &UiState::WeatherDisplay);
    }

    #[tokio::test]
    async fn listener_sees_every_transition() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let app = app(FakeBackend::default(), NoGeolocation, MemoryStore::new())
            .with_listener(move |state| sink.lock().push(state.ui().kind()));

        let mut state = app.start();
        app.search(&mut state, "Paris").await.unwrap();

        assert_eq!(
            seen.lock().as_slice(),
            &[
                UiStateKind::Welcome,
                UiStateKind::Loading,
                UiStateKind::WeatherDisplay
            ]
        );
    }
}
