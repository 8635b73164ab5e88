//! OpenRouteService HTTP adapter for matrices and walking directions.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::matrix::DistanceMatrix;
use crate::polyline::{DEFAULT_PRECISION, Polyline};
use crate::traits::{Coordinate, DirectionsProvider, MatrixProvider};

#[derive(Debug, Clone)]
pub struct OrsClient {
    config: ProviderConfig,
    client: reqwest::blocking::Client,
}

impl OrsClient {
    pub fn new(config: ProviderConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn post<B, R>(&self, endpoint: &str, body: &B) -> Result<R, ProviderError>
    where
        B: Serialize,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint,
            self.config.profile
        );

        let mut request = self.client.post(url).header(ACCEPT, "application/json");
        if let Some(key) = &self.config.api_key {
            request = request.header(AUTHORIZATION, key);
        }

        let body = request
            .json(body)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<R>())?;

        Ok(body)
    }
}

impl MatrixProvider for OrsClient {
    fn table(&self, locations: &[Coordinate]) -> Result<DistanceMatrix, ProviderError> {
        let request = OrsMatrixRequest {
            locations: locations.iter().map(|c| [c.lon, c.lat]).collect(),
            metrics: &["distance", "duration"],
        };

        let response: OrsMatrixResponse = self.post("matrix", &request)?;
        response.into_matrix(locations.len())
    }
}

impl DirectionsProvider for OrsClient {
    fn directions(&self, from: Coordinate, to: Coordinate) -> Result<Polyline, ProviderError> {
        let request = OrsDirectionsRequest {
            coordinates: [[from.lon, from.lat], [to.lon, to.lat]],
        };

        let response: OrsDirectionsResponse = self.post("directions", &request)?;
        response.into_polyline()
    }
}

#[derive(Debug, Serialize)]
struct OrsMatrixRequest {
    locations: Vec<[f64; 2]>,
    metrics: &'static [&'static str],
}

#[derive(Debug, Serialize)]
struct OrsDirectionsRequest {
    coordinates: [[f64; 2]; 2],
}

/// Cells are `null` when the provider cannot route between two points.
#[derive(Debug, Deserialize)]
pub(crate) struct OrsMatrixResponse {
    distances: Option<Vec<Vec<Option<f64>>>>,
    durations: Option<Vec<Vec<Option<f64>>>>,
}

impl OrsMatrixResponse {
    pub(crate) fn into_matrix(self, n: usize) -> Result<DistanceMatrix, ProviderError> {
        let distances = complete_rows(self.distances, n, "distances")?;
        let durations = complete_rows(self.durations, n, "durations")?;
        DistanceMatrix::new(distances, durations)
            .map_err(|err| ProviderError::malformed(err.to_string()))
    }
}

fn complete_rows(
    rows: Option<Vec<Vec<Option<f64>>>>,
    n: usize,
    field: &str,
) -> Result<Vec<Vec<f64>>, ProviderError> {
    let rows = rows.ok_or_else(|| ProviderError::malformed(format!("missing {field}")))?;
    if rows.len() != n {
        return Err(ProviderError::malformed(format!(
            "{field} has {} rows, expected {n}",
            rows.len()
        )));
    }

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            row.into_iter()
                .enumerate()
                .map(|(j, cell)| {
                    cell.ok_or_else(|| {
                        ProviderError::malformed(format!("{field}[{i}][{j}] is unroutable"))
                    })
                })
                .collect()
        })
        .collect()
}

/// Accepts both the JSON (`routes`) and GeoJSON (`features`) response shapes.
#[derive(Debug, Deserialize)]
pub(crate) struct OrsDirectionsResponse {
    #[serde(default)]
    routes: Vec<OrsGeometryHolder>,
    #[serde(default)]
    features: Vec<OrsGeometryHolder>,
}

#[derive(Debug, Deserialize)]
struct OrsGeometryHolder {
    geometry: Option<OrsGeometry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OrsGeometry {
    Encoded(String),
    LineString { coordinates: Vec<Vec<f64>> },
}

impl OrsDirectionsResponse {
    pub(crate) fn into_polyline(self) -> Result<Polyline, ProviderError> {
        let geometry = self
            .routes
            .into_iter()
            .chain(self.features)
            .next()
            .and_then(|holder| holder.geometry)
            .ok_or_else(|| ProviderError::malformed("no route geometry in response"))?;

        let polyline = match geometry {
            OrsGeometry::Encoded(encoded) => Polyline::decode(&encoded, DEFAULT_PRECISION)?,
            OrsGeometry::LineString { coordinates } => Polyline::new(
                coordinates
                    .into_iter()
                    .map(|position| match position.as_slice() {
                        // Elevation, if present, is dropped.
                        [lon, lat, ..] => Ok(Coordinate::new(*lon, *lat)),
                        _ => Err(ProviderError::malformed("position with fewer than 2 values")),
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };

        if polyline.len() < 2 {
            return Err(ProviderError::malformed(format!(
                "route geometry has {} vertices",
                polyline.len()
            )));
        }

        Ok(polyline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_matrix_response() {
        let body = r#"{
            "distances": [[0.0, 120.5], [130.25, 0.0]],
            "durations": [[0.0, 90.0], [95.5, 0.0]],
            "metadata": {"service": "matrix"}
        }"#;
        let response: OrsMatrixResponse = serde_json::from_str(body).unwrap();
        let matrix = response.into_matrix(2).unwrap();

        assert_eq!(matrix.distance(0, 1), 120.5);
        assert_eq!(matrix.distance(1, 0), 130.25);
        assert_eq!(matrix.duration(1, 0), 95.5);
    }

    #[test]
    fn test_rejects_unroutable_cell() {
        let body = r#"{"distances": [[0.0, null], [1.0, 0.0]], "durations": [[0.0, 1.0], [1.0, 0.0]]}"#;
        let response: OrsMatrixResponse = serde_json::from_str(body).unwrap();
        let err = response.into_matrix(2).unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(message) if message.contains("unroutable")));
    }

    #[test]
    fn test_rejects_missing_durations() {
        let body = r#"{"distances": [[0.0]]}"#;
        let response: OrsMatrixResponse = serde_json::from_str(body).unwrap();
        assert!(response.into_matrix(1).is_err());
    }

    #[test]
    fn test_rejects_wrong_row_count() {
        let body = r#"{"distances": [[0.0]], "durations": [[0.0]]}"#;
        let response: OrsMatrixResponse = serde_json::from_str(body).unwrap();
        assert!(response.into_matrix(2).is_err());
    }

    #[test]
    fn test_parses_encoded_route_geometry() {
        let body = r#"{"routes": [{"summary": {"distance": 1.0}, "geometry": "_p~iF~ps|U_ulLnnqC"}]}"#;
        let response: OrsDirectionsResponse = serde_json::from_str(body).unwrap();
        let polyline = response.into_polyline().unwrap();

        assert_eq!(polyline.len(), 2);
        assert!((polyline.points()[0].lon + 120.2).abs() < 1e-9);
        assert!((polyline.points()[1].lat - 40.7).abs() < 1e-9);
    }

    #[test]
    fn test_parses_geojson_feature_geometry() {
        let body = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {"type": "LineString", "coordinates": [[140.1, 35.8, 12.0], [140.2, 35.9, 13.0]]}
            }]
        }"#;
        let response: OrsDirectionsResponse = serde_json::from_str(body).unwrap();
        let polyline = response.into_polyline().unwrap();

        assert_eq!(
            polyline.points(),
            &[Coordinate::new(140.1, 35.8), Coordinate::new(140.2, 35.9)]
        );
    }

    #[test]
    fn test_rejects_empty_routes() {
        let response: OrsDirectionsResponse = serde_json::from_str(r#"{"routes": []}"#).unwrap();
        assert!(response.into_polyline().is_err());
    }

    #[test]
    fn test_rejects_single_vertex_geometry() {
        let body = r#"{"routes": [{"geometry": {"type": "LineString", "coordinates": [[140.1, 35.8]]}}]}"#;
        let response: OrsDirectionsResponse = serde_json::from_str(body).unwrap();
        assert!(response.into_polyline().is_err());
    }

    #[test]
    fn test_rejects_overflowing_encoded_geometry() {
        let encoded = format!("}}{}F", "~".repeat(11)).repeat(6);
        let body = format!(r#"{{"routes": [{{"geometry": "{encoded}"}}]}}"#);
        let response: OrsDirectionsResponse = serde_json::from_str(&body).unwrap();
        assert!(matches!(
            response.into_polyline().unwrap_err(),
            ProviderError::Malformed(_)
        ));
    }
}
