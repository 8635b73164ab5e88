//! Poster-board style locations around Inzai, Chiba.
//!
//! Coordinates are street-level positions picked from OpenStreetMap around
//! residential blocks of each district. Names are board numbers only.

#![allow(dead_code)]

use std::sync::Mutex;

use board_route_planner::error::ProviderError;
use board_route_planner::matrix::DistanceMatrix;
use board_route_planner::polyline::Polyline;
use board_route_planner::traits::{DirectionsProvider, MatrixProvider};
use board_route_planner::Coordinate;

/// A numbered board with coordinates.
#[derive(Debug, Clone)]
pub struct Board {
    pub number: &'static str,
    pub lon: f64,
    pub lat: f64,
}

impl Board {
    pub const fn new(number: &'static str, lon: f64, lat: f64) -> Self {
        Self { number, lon, lat }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lon, self.lat)
    }
}

pub fn coordinates(boards: &[Board]) -> Vec<Coordinate> {
    boards.iter().map(Board::coordinate).collect()
}

// ============================================================================
// District 1 (around the city hall)
// ============================================================================

pub const DISTRICT_1: &[Board] = &[
    Board::new("1-1", 140.14530, 35.83262),
    Board::new("1-2", 140.14871, 35.83418),
    Board::new("1-3", 140.14215, 35.83057),
    Board::new("1-4", 140.15102, 35.83120),
    Board::new("1-5", 140.14690, 35.82895),
    Board::new("1-6", 140.14012, 35.83344),
    Board::new("1-7", 140.15340, 35.83491),
    Board::new("1-8", 140.14398, 35.83610),
];

// ============================================================================
// District 2 (new town, station side)
// ============================================================================

pub const DISTRICT_2: &[Board] = &[
    Board::new("2-1", 140.14605, 35.79943),
    Board::new("2-2", 140.14982, 35.80115),
    Board::new("2-3", 140.14311, 35.80201),
    Board::new("2-4", 140.15230, 35.79822),
    Board::new("2-5", 140.14790, 35.79650),
    Board::new("2-6", 140.14102, 35.79788),
];

// ============================================================================
// District 3 (single board hamlet)
// ============================================================================

pub const DISTRICT_3: &[Board] = &[Board::new("3-1", 140.18820, 35.81470)];

// ============================================================================
// Provider doubles
// ============================================================================

/// Directions provider that bends every path through an offset midpoint and
/// records each request.
#[derive(Debug, Default)]
pub struct RecordingDirections {
    pub requests: Mutex<Vec<(Coordinate, Coordinate)>>,
}

impl RecordingDirections {
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl DirectionsProvider for RecordingDirections {
    fn directions(&self, from: Coordinate, to: Coordinate) -> Result<Polyline, ProviderError> {
        self.requests.lock().unwrap().push((from, to));
        let corner = Coordinate::new(to.lon, from.lat);
        Ok(Polyline::new(vec![from, corner, to]))
    }
}

/// Matrix provider answering with Manhattan-style walking distances,
/// 20% longer in the eastbound direction.
#[derive(Debug, Default)]
pub struct SkewedMatrix {
    pub requests: Mutex<usize>,
}

impl MatrixProvider for SkewedMatrix {
    fn table(&self, locations: &[Coordinate]) -> Result<DistanceMatrix, ProviderError> {
        *self.requests.lock().unwrap() += 1;
        let metres_per_degree = 111_000.0;
        let distances: Vec<Vec<f64>> = locations
            .iter()
            .map(|a| {
                locations
                    .iter()
                    .map(|b| {
                        let base = ((a.lon - b.lon).abs() + (a.lat - b.lat).abs()) * metres_per_degree;
                        if b.lon > a.lon { base * 1.2 } else { base }
                    })
                    .collect()
            })
            .collect();
        let durations = distances
            .iter()
            .map(|row| row.iter().map(|metres| metres / 1.2).collect())
            .collect();
        DistanceMatrix::new(distances, durations).map_err(|err| ProviderError::malformed(err.to_string()))
    }
}
