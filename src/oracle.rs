//! Distance/duration oracle: road network first, great-circle fallback.
//!
//! The oracle never fails. Which path produced the matrix is carried in
//! [`MatrixResult`] so callers can see a degraded run.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::ProviderError;
use crate::haversine::GeodesicMatrix;
use crate::matrix::DistanceMatrix;
use crate::rate_gate::RateGate;
use crate::traits::{Coordinate, MatrixProvider};

/// Why the geodesic estimate was used instead of the road network.
#[derive(Debug, Clone, PartialEq)]
pub enum GeodesicReason {
    RemoteNotRequested,
    NoProvider,
    /// Zero or one location: nothing to ask the provider.
    TooFewLocations,
    Provider(ProviderError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatrixResult {
    RoadNetwork(DistanceMatrix),
    Geodesic {
        matrix: DistanceMatrix,
        reason: GeodesicReason,
    },
}

impl MatrixResult {
    pub fn matrix(&self) -> &DistanceMatrix {
        match self {
            MatrixResult::RoadNetwork(matrix) => matrix,
            MatrixResult::Geodesic { matrix, .. } => matrix,
        }
    }

    pub fn into_matrix(self) -> DistanceMatrix {
        match self {
            MatrixResult::RoadNetwork(matrix) => matrix,
            MatrixResult::Geodesic { matrix, .. } => matrix,
        }
    }

    pub fn is_road_network(&self) -> bool {
        matches!(self, MatrixResult::RoadNetwork(_))
    }
}

pub struct DistanceOracle {
    provider: Option<Box<dyn MatrixProvider + Send + Sync>>,
    gate: Arc<RateGate>,
    geodesic: GeodesicMatrix,
}

impl std::fmt::Debug for DistanceOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistanceOracle")
            .field("has_provider", &self.provider.is_some())
            .field("gate", &self.gate)
            .field("geodesic", &self.geodesic)
            .finish()
    }
}

impl DistanceOracle {
    pub fn new(
        provider: impl MatrixProvider + Send + Sync + 'static,
        gate: Arc<RateGate>,
        geodesic: GeodesicMatrix,
    ) -> Self {
        Self {
            provider: Some(Box::new(provider)),
            gate,
            geodesic,
        }
    }

    /// Oracle that only ever estimates.
    pub fn geodesic_only(gate: Arc<RateGate>, geodesic: GeodesicMatrix) -> Self {
        Self {
            provider: None,
            gate,
            geodesic,
        }
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Full N×N matrices for `locations`, in input order.
    pub fn compute_matrix(&self, locations: &[Coordinate], prefer_remote: bool) -> MatrixResult {
        let reason = match (&self.provider, prefer_remote) {
            (_, false) => GeodesicReason::RemoteNotRequested,
            (None, true) => GeodesicReason::NoProvider,
            (Some(_), true) if locations.len() < 2 => GeodesicReason::TooFewLocations,
            (Some(provider), true) => match self.fetch_remote(&**provider, locations) {
                Ok(matrix) => {
                    info!(points = locations.len(), "road network matrix obtained");
                    return MatrixResult::RoadNetwork(matrix);
                }
                Err(err) => {
                    warn!(error = %err, "matrix request failed, using straight-line distances");
                    GeodesicReason::Provider(err)
                }
            },
        };

        MatrixResult::Geodesic {
            matrix: self.geodesic.matrix_for(locations),
            reason,
        }
    }

    fn fetch_remote(
        &self,
        provider: &(dyn MatrixProvider + Send + Sync),
        locations: &[Coordinate],
    ) -> Result<DistanceMatrix, ProviderError> {
        self.gate.acquire();
        let matrix = provider.table(locations)?;
        if matrix.len() != locations.len() {
            return Err(ProviderError::malformed(format!(
                "matrix is {0}x{0} for {1} locations",
                matrix.len(),
                locations.len()
            )));
        }
        Ok(matrix)
    }
}
