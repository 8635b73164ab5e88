//! Core domain types and the seams the engine is built around.
//!
//! Remote providers, the clock and cache storage are traits so that the
//! engine can run against in-memory doubles in tests.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, ProviderError};
use crate::matrix::DistanceMatrix;
use crate::polyline::Polyline;

/// A WGS84 position in degrees. Serialized as `[lon, lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Finite and within the valid longitude/latitude ranges.
    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(coord: Coordinate) -> Self {
        [coord.lon, coord.lat]
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lon, lat): (f64, f64)) -> Self {
        Self { lon, lat }
    }
}

/// A point in one cluster. `index` is stable for a single optimization call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub index: usize,
    pub coordinate: Coordinate,
}

impl Location {
    /// Index a list of coordinates in input order.
    pub fn index_all(coordinates: &[Coordinate]) -> Vec<Location> {
        coordinates
            .iter()
            .enumerate()
            .map(|(index, coordinate)| Location {
                index,
                coordinate: *coordinate,
            })
            .collect()
    }
}

/// Source of time for rate limiting.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    fn sleep(&self, duration: Duration);
}

/// Remote road-network matrix service.
///
/// Rows and columns follow the order of `locations`.
pub trait MatrixProvider {
    fn table(&self, locations: &[Coordinate]) -> Result<DistanceMatrix, ProviderError>;
}

/// Remote walking-directions service.
pub trait DirectionsProvider {
    fn directions(&self, from: Coordinate, to: Coordinate) -> Result<Polyline, ProviderError>;
}

/// Byte storage behind the segment cache, addressed by hex key.
pub trait CacheStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError>;
}

impl<P: MatrixProvider + ?Sized> MatrixProvider for Arc<P> {
    fn table(&self, locations: &[Coordinate]) -> Result<DistanceMatrix, ProviderError> {
        (**self).table(locations)
    }
}

impl<P: DirectionsProvider + ?Sized> DirectionsProvider for Arc<P> {
    fn directions(&self, from: Coordinate, to: Coordinate) -> Result<Polyline, ProviderError> {
        (**self).directions(from, to)
    }
}

impl<S: CacheStore + ?Sized> CacheStore for Arc<S> {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        (**self).load(key)
    }

    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError> {
        (**self).store(key, bytes)
    }
}
