//! Per-edge walking geometry for a solved route.
//!
//! Each consecutive pair is resolved from the cache (either direction), then
//! from the directions provider, and finally as a straight line.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::SegmentCache;
use crate::error::{PlannerError, ProviderError};
use crate::polyline::Polyline;
use crate::rate_gate::RateGate;
use crate::traits::{Coordinate, DirectionsProvider};

#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    NoProvider,
    Provider(ProviderError),
}

/// Where a segment's geometry came from.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentSource {
    Cached,
    /// Stored for the opposite direction and reversed.
    CachedReverse,
    Fetched,
    StraightLine(FallbackReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub from: usize,
    pub to: usize,
    pub geometry: Polyline,
    pub source: SegmentSource,
}

impl Segment {
    pub fn is_straight_line(&self) -> bool {
        matches!(self.source, SegmentSource::StraightLine(_))
    }
}

pub struct RouteAssembler {
    provider: Option<Box<dyn DirectionsProvider + Send + Sync>>,
    cache: Arc<SegmentCache>,
    gate: Arc<RateGate>,
}

impl std::fmt::Debug for RouteAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteAssembler")
            .field("has_provider", &self.provider.is_some())
            .field("cache", &self.cache)
            .field("gate", &self.gate)
            .finish()
    }
}

impl RouteAssembler {
    pub fn new(
        provider: impl DirectionsProvider + Send + Sync + 'static,
        cache: Arc<SegmentCache>,
        gate: Arc<RateGate>,
    ) -> Self {
        Self {
            provider: Some(Box::new(provider)),
            cache,
            gate,
        }
    }

    /// Assembler that only consults the cache and draws straight lines.
    pub fn offline(cache: Arc<SegmentCache>, gate: Arc<RateGate>) -> Self {
        Self {
            provider: None,
            cache,
            gate,
        }
    }

    /// One segment per consecutive pair of `route`.
    ///
    /// Fails only if `route` refers to an index outside `locations`.
    pub fn resolve_segments(
        &self,
        locations: &[Coordinate],
        route: &[usize],
    ) -> Result<Vec<Segment>, PlannerError> {
        if let Some(&index) = route.iter().find(|&&index| index >= locations.len()) {
            return Err(PlannerError::RouteIndexOutOfRange {
                index,
                len: locations.len(),
            });
        }

        let segments: Vec<Segment> = route
            .windows(2)
            .map(|pair| {
                let (geometry, source) = self.resolve_pair(locations[pair[0]], locations[pair[1]]);
                Segment {
                    from: pair[0],
                    to: pair[1],
                    geometry,
                    source,
                }
            })
            .collect();

        let fallbacks = segments.iter().filter(|s| s.is_straight_line()).count();
        if fallbacks > 0 {
            warn!(segments = segments.len(), fallbacks, "some segments use straight lines");
        }

        Ok(segments)
    }

    /// Geometry for a single directed edge. Never fails.
    pub fn resolve_pair(&self, from: Coordinate, to: Coordinate) -> (Polyline, SegmentSource) {
        if let Some(geometry) = self.cache.get(from, to) {
            debug!("segment cache hit");
            return (geometry, SegmentSource::Cached);
        }
        if let Some(geometry) = self.cache.get(to, from) {
            debug!("segment cache hit (reverse)");
            return (geometry.reversed(), SegmentSource::CachedReverse);
        }

        let Some(provider) = &self.provider else {
            return (
                Polyline::straight_line(from, to),
                SegmentSource::StraightLine(FallbackReason::NoProvider),
            );
        };

        match self.fetch(&**provider, from, to) {
            Ok(geometry) => {
                self.cache.put(from, to, &geometry);
                (geometry, SegmentSource::Fetched)
            }
            Err(err) => {
                warn!(error = %err, "directions request failed, using straight line");
                (
                    Polyline::straight_line(from, to),
                    SegmentSource::StraightLine(FallbackReason::Provider(err)),
                )
            }
        }
    }

    fn fetch(
        &self,
        provider: &(dyn DirectionsProvider + Send + Sync),
        from: Coordinate,
        to: Coordinate,
    ) -> Result<Polyline, ProviderError> {
        self.gate.acquire();
        let geometry = provider.directions(from, to)?;
        if geometry.len() < 2 {
            return Err(ProviderError::malformed(format!(
                "route geometry has {} vertices",
                geometry.len()
            )));
        }
        if let Some(index) = geometry.points().iter().position(|point| !point.is_valid()) {
            return Err(ProviderError::malformed(format!(
                "route geometry vertex {index} out of range"
            )));
        }
        Ok(geometry)
    }
}
