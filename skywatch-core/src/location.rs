//! Turning user input or a device position into a [`LocationQuery`].

use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};
use tracing::{debug, info};

use crate::{
    error::{ClientError, GeolocationError},
    model::LocationQuery,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Position> for LocationQuery {
    fn from(p: Position) -> Self {
        LocationQuery::Coordinates {
            lat: p.latitude,
            lon: p.longitude,
        }
    }
}

/// Hints passed to the platform location service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    pub maximum_age: Duration,
}

/// Device location capability.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Position, GeolocationError>;
}

#[async_trait]
impl Geolocator for Box<dyn Geolocator> {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Position, GeolocationError> {
        (**self).current_position(options).await
    }
}

/// Hosts with no location service.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGeolocation;

#[async_trait]
impl Geolocator for NoGeolocation {
    async fn current_position(&self, _: &PositionOptions) -> Result<Position, GeolocationError> {
        Err(GeolocationError::Unsupported)
    }
}

/// A position fixed in configuration.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator {
    position: Position,
}

impl FixedGeolocator {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            position: Position {
                latitude,
                longitude,
            },
        }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_position(&self, _: &PositionOptions) -> Result<Position, GeolocationError> {
        Ok(self.position)
    }
}

/// Validate typed input. Whitespace-only input never reaches the network.
pub fn resolve_city(input: &str) -> Result<LocationQuery, ClientError> {
    let city = input.trim();
    if city.is_empty() {
        return Err(ClientError::EmptyCity);
    }
    Ok(LocationQuery::City(city.to_string()))
}

pub struct LocationResolver<G> {
    geolocator: G,
    options: PositionOptions,
    in_flight: AtomicBool,
    last_fix: Mutex<Option<(Position, Instant)>>,
}

impl<G: Geolocator> LocationResolver<G> {
    pub fn new(geolocator: G, timeout: Duration, maximum_age: Duration) -> Self {
        Self {
            geolocator,
            options: PositionOptions {
                high_accuracy: true,
                timeout,
                maximum_age,
            },
            in_flight: AtomicBool::new(false),
            last_fix: Mutex::new(None),
        }
    }

    /// Current device position as a query.
    ///
    /// Only one call runs at a time per resolver; a concurrent call fails with
    /// [`ClientError::LocationInProgress`].
    pub async fn locate(&self) -> Result<LocationQuery, ClientError> {
        let _flight = InFlight::acquire(&self.in_flight).ok_or(ClientError::LocationInProgress)?;

        if let Some(position) = self.fresh_fix() {
            debug!(?position, "reusing cached device position");
            return Ok(position.into());
        }

        let position = match tokio::time::timeout(
            self.options.timeout,
            self.geolocator.current_position(&self.options),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => return Err(GeolocationError::Timeout.into()),
        };

        info!(lat = position.latitude, lon = position.longitude, "device position acquired");
        *self.last_fix.lock() = Some((position, Instant::now()));
        Ok(position.into())
    }

    fn fresh_fix(&self) -> Option<Position> {
        let fix = *self.last_fix.lock();
        fix.filter(|(_, at)| at.elapsed() < self.options.maximum_age)
            .map(|(position, _)| position)
    }
}

/// Holds the single-flight flag; released on drop, cancellation included.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
