//! Great-circle distance matrix (fallback when the road network is unavailable).
//!
//! Ignores the street network entirely, so it underestimates real walking
//! distance, but it is always available and fully deterministic.

use tracing::warn;

use crate::matrix::DistanceMatrix;
use crate::traits::Coordinate;

/// Average walking speed assumption for time estimation.
pub const DEFAULT_WALKING_SPEED_KMH: f64 = 4.0;

/// Mean Earth radius in metres.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Haversine-based distance matrix builder.
#[derive(Debug, Clone)]
pub struct GeodesicMatrix {
    /// Assumed walking speed in km/h. Always finite and positive.
    walking_speed_kmh: f64,
}

impl Default for GeodesicMatrix {
    fn default() -> Self {
        Self {
            walking_speed_kmh: DEFAULT_WALKING_SPEED_KMH,
        }
    }
}

impl GeodesicMatrix {
    /// Speeds that are not finite and positive fall back to
    /// [`DEFAULT_WALKING_SPEED_KMH`].
    pub fn new(walking_speed_kmh: f64) -> Self {
        if walking_speed_kmh.is_finite() && walking_speed_kmh > 0.0 {
            return Self { walking_speed_kmh };
        }

        warn!(
            walking_speed_kmh,
            default = DEFAULT_WALKING_SPEED_KMH,
            "invalid walking speed, using default"
        );
        Self::default()
    }

    pub fn walking_speed_kmh(&self) -> f64 {
        self.walking_speed_kmh
    }

    pub fn walking_speed_ms(&self) -> f64 {
        self.walking_speed_kmh * 1000.0 / 3600.0
    }

    /// Great-circle distance between two points in metres.
    pub fn haversine_m(from: Coordinate, to: Coordinate) -> f64 {
        let lat1_rad = from.lat.to_radians();
        let lat2_rad = to.lat.to_radians();
        let delta_lat = (to.lat - from.lat).to_radians();
        let delta_lon = (to.lon - from.lon).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().min(1.0).asin();

        EARTH_RADIUS_M * c
    }

    /// Seconds needed to walk `metres`.
    pub fn walking_seconds(&self, metres: f64) -> f64 {
        metres / self.walking_speed_ms()
    }

    /// Symmetric, zero-diagonal matrix for `locations`.
    pub fn matrix_for(&self, locations: &[Coordinate]) -> DistanceMatrix {
        let n = locations.len();
        let mut distances = vec![vec![0.0; n]; n];
        let mut durations = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in i + 1..n {
                let metres = Self::haversine_m(locations[i], locations[j]);
                let seconds = self.walking_seconds(metres);
                distances[i][j] = metres;
                distances[j][i] = metres;
                durations[i][j] = seconds;
                durations[j][i] = seconds;
            }
        }

        DistanceMatrix::from_parts(distances, durations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_same_point() {
        let point = Coordinate::new(140.1455, 35.8327);
        assert_eq!(GeodesicMatrix::haversine_m(point, point), 0.0);
    }

    #[test]
    fn test_haversine_known_distance() {
        // Tokyo Station to Chiba Station, roughly 32 km
        let tokyo = Coordinate::new(139.7671, 35.6812);
        let chiba = Coordinate::new(140.1233, 35.6131);
        let dist = GeodesicMatrix::haversine_m(tokyo, chiba);
        assert!(dist > 31_000.0 && dist < 34_000.0, "got {}", dist);
    }

    #[test]
    fn test_matrix_diagonal_is_zero_and_symmetric() {
        let provider = GeodesicMatrix::default();
        let locations = vec![
            Coordinate::new(140.145, 35.832),
            Coordinate::new(140.151, 35.829),
            Coordinate::new(140.139, 35.840),
        ];
        let matrix = provider.matrix_for(&locations);

        for i in 0..locations.len() {
            assert_eq!(matrix.distance(i, i), 0.0);
            assert_eq!(matrix.duration(i, i), 0.0);
            for j in 0..locations.len() {
                assert_eq!(matrix.distance(i, j), matrix.distance(j, i));
                assert_eq!(matrix.duration(i, j), matrix.duration(j, i));
            }
        }
    }

    #[test]
    fn test_walking_time() {
        let provider = GeodesicMatrix::new(4.0);
        // 1 km at 4 km/h = 15 minutes
        let seconds = provider.walking_seconds(1000.0);
        assert!((seconds - 900.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_speed_falls_back_to_default() {
        for speed in [0.0, -4.0, f64::NAN, f64::INFINITY] {
            let provider = GeodesicMatrix::new(speed);
            assert_eq!(provider.walking_speed_kmh(), DEFAULT_WALKING_SPEED_KMH);
            assert!((provider.walking_seconds(1000.0) - 900.0).abs() < 1e-9);
        }
        assert_eq!(GeodesicMatrix::new(5.0).walking_speed_kmh(), 5.0);
    }

    #[test]
    fn test_empty_and_single() {
        let provider = GeodesicMatrix::default();
        assert!(provider.matrix_for(&[]).is_empty());

        let single = provider.matrix_for(&[Coordinate::new(140.0, 35.0)]);
        assert_eq!(single.distances(), &[vec![0.0]]);
        assert_eq!(single.durations(), &[vec![0.0]]);
    }
}
