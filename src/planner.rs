//! Cluster planner: matrix, then solve, then geometry.
//!
//! A cluster is optimized end to end in one call. Only structurally invalid
//! input fails; provider outages degrade to geodesic distances and straight
//! segments.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::assembler::{RouteAssembler, Segment};
use crate::cache::SegmentCache;
use crate::config::{OptimizationConfig, PlannerConfig};
use crate::error::{PlannerError, ProviderError};
use crate::haversine::GeodesicMatrix;
use crate::oracle::{DistanceOracle, MatrixResult};
use crate::ors::OrsClient;
use crate::rate_gate::RateGate;
use crate::solver::{SolveOptions, TspSolver};
use crate::traits::{Coordinate, Location};

/// Visiting order for one cluster with its totals.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Permutation of location indices.
    pub order: Vec<usize>,
    pub start: usize,
    /// Metres.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
}

impl Route {
    pub fn coordinates(&self, locations: &[Coordinate]) -> Vec<Coordinate> {
        self.order.iter().map(|&index| locations[index]).collect()
    }

    /// Stops in visiting order, keeping their input indices.
    pub fn stops(&self, locations: &[Coordinate]) -> Vec<Location> {
        self.order
            .iter()
            .map(|&index| Location {
                index,
                coordinate: locations[index],
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterPlan {
    pub route: Route,
    pub matrix: MatrixResult,
    /// Empty when geometry resolution is disabled.
    pub segments: Vec<Segment>,
}

#[derive(Debug)]
pub struct RoutePlanner {
    oracle: DistanceOracle,
    solver: TspSolver,
    assembler: RouteAssembler,
    options: OptimizationConfig,
}

impl RoutePlanner {
    pub fn new(
        oracle: DistanceOracle,
        solver: TspSolver,
        assembler: RouteAssembler,
        options: OptimizationConfig,
    ) -> Self {
        Self {
            oracle,
            solver,
            assembler,
            options,
        }
    }

    /// Wires every component from configuration.
    ///
    /// The oracle and assembler share one rate gate. Without an API key both
    /// run offline.
    pub fn from_config(config: &PlannerConfig) -> Result<Self, ProviderError> {
        let gate = Arc::new(RateGate::new(config.provider.request_delay()));
        let cache = Arc::new(match &config.cache.directory {
            Some(directory) => SegmentCache::on_disk(directory),
            None => SegmentCache::in_memory(),
        });
        let geodesic = GeodesicMatrix::new(config.optimization.walking_speed_kmh);
        let geodesic_speed = geodesic.walking_speed_kmh();

        let (oracle, assembler) = if config.provider.is_configured() {
            let client = OrsClient::new(config.provider.clone())?;
            (
                DistanceOracle::new(client.clone(), gate.clone(), geodesic),
                RouteAssembler::new(client, cache, gate),
            )
        } else {
            warn!("no routing provider key configured, using straight-line distances");
            (
                DistanceOracle::geodesic_only(gate.clone(), geodesic),
                RouteAssembler::offline(cache, gate),
            )
        };

        let solver = TspSolver::new(SolveOptions {
            max_iterations: config.optimization.max_tsp_iterations,
            improvement_threshold: config.optimization.tsp_improvement_threshold,
        });

        let options = OptimizationConfig {
            walking_speed_kmh: geodesic_speed,
            ..config.optimization.clone()
        };

        Ok(Self::new(oracle, solver, assembler, options))
    }

    pub fn options(&self) -> &OptimizationConfig {
        &self.options
    }

    /// Optimizes one cluster of already deduplicated coordinates.
    pub fn optimize_cluster(&self, coordinates: &[Coordinate]) -> Result<ClusterPlan, PlannerError> {
        validate_cluster(coordinates)?;

        let matrix = self
            .oracle
            .compute_matrix(coordinates, self.options.prefer_remote);
        let tour = self.solver.solve(matrix.matrix().distances())?;
        let duration = matrix.matrix().path_duration(&tour.order);

        let segments = if self.options.resolve_geometry {
            self.assembler.resolve_segments(coordinates, &tour.order)?
        } else {
            Vec::new()
        };

        info!(
            points = coordinates.len(),
            start = tour.start,
            distance_km = tour.cost / 1000.0,
            duration_h = duration / 3600.0,
            road_network = matrix.is_road_network(),
            "cluster optimized"
        );

        Ok(ClusterPlan {
            route: Route {
                order: tour.order,
                start: tour.start,
                distance: tour.cost,
                duration,
            },
            matrix,
            segments,
        })
    }

    /// Optimizes named clusters in order. Invalid clusters are skipped and
    /// reported, the rest of the batch still runs.
    pub fn optimize_clusters<I, S>(&self, clusters: I) -> BatchReport
    where
        I: IntoIterator<Item = (S, Vec<Coordinate>)>,
        S: Into<String>,
    {
        let mut report = BatchReport::default();

        for (name, coordinates) in clusters {
            let name = name.into();
            info!(cluster = %name, points = coordinates.len(), "optimizing cluster");
            match self.optimize_cluster(&coordinates) {
                Ok(plan) => report.plans.push((name, plan)),
                Err(err) => {
                    warn!(cluster = %name, error = %err, "skipping cluster");
                    report.skipped.push((name, err));
                }
            }
        }

        report
    }
}

fn validate_cluster(coordinates: &[Coordinate]) -> Result<(), PlannerError> {
    if coordinates.is_empty() {
        return Err(PlannerError::EmptyCluster);
    }
    match Location::index_all(coordinates)
        .into_iter()
        .find(|location| !location.coordinate.is_valid())
    {
        Some(Location { index, coordinate }) => Err(PlannerError::InvalidCoordinate {
            index,
            lon: coordinate.lon,
            lat: coordinate.lat,
        }),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub plans: Vec<(String, ClusterPlan)>,
    pub skipped: Vec<(String, PlannerError)>,
}

impl BatchReport {
    pub fn summary(&self, walking_speed_kmh: f64) -> BatchSummary {
        let districts = self.plans.len();
        let locations = self.plans.iter().map(|(_, plan)| plan.route.order.len()).sum();
        let total_distance_km = self
            .plans
            .iter()
            .map(|(_, plan)| plan.route.distance)
            .sum::<f64>()
            / 1000.0;
        let total_duration_hours = self
            .plans
            .iter()
            .map(|(_, plan)| plan.route.duration)
            .sum::<f64>()
            / 3600.0;

        let (average_distance_km, average_duration_hours) = if districts > 0 {
            (
                total_distance_km / districts as f64,
                total_duration_hours / districts as f64,
            )
        } else {
            (0.0, 0.0)
        };

        BatchSummary {
            districts,
            locations,
            skipped: self.skipped.len(),
            total_distance_km,
            total_duration_hours,
            average_distance_km,
            average_duration_hours,
            walking_speed_kmh,
        }
    }
}

/// Totals across a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub districts: usize,
    pub locations: usize,
    pub skipped: usize,
    pub total_distance_km: f64,
    pub total_duration_hours: f64,
    pub average_distance_km: f64,
    pub average_duration_hours: f64,
    pub walking_speed_kmh: f64,
}
