//! Polyline representation for walking path geometries.
//!
//! Geometries are kept as decoded `(lon, lat)` coordinate sequences.
//! Encoded polylines are only decoded at the provider boundary.

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::traits::Coordinate;

/// Default precision of encoded polylines (5 decimal digits).
pub const DEFAULT_PRECISION: u32 = 5;

/// An ordered sequence of coordinates approximating a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polyline {
    points: Vec<Coordinate>,
}

impl Polyline {
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    /// Two-vertex path used when no real geometry is available.
    pub fn straight_line(from: Coordinate, to: Coordinate) -> Self {
        Self {
            points: vec![from, to],
        }
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Same vertices walked in the opposite direction.
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self { points }
    }

    /// Decodes a Google encoded polyline. Pairs are encoded latitude first.
    pub fn decode(encoded: &str, precision: u32) -> Result<Self, ProviderError> {
        let factor = 10f64.powi(precision as i32);
        let bytes = encoded.as_bytes();
        let mut points = Vec::new();
        let mut index = 0;
        let mut lat: i64 = 0;
        let mut lon: i64 = 0;

        while index < bytes.len() {
            lat = lat
                .checked_add(decode_value(bytes, &mut index)?)
                .ok_or_else(|| ProviderError::malformed("polyline latitude overflow"))?;
            lon = lon
                .checked_add(decode_value(bytes, &mut index)?)
                .ok_or_else(|| ProviderError::malformed("polyline longitude overflow"))?;

            let point = Coordinate::new(lon as f64 / factor, lat as f64 / factor);
            if !point.is_valid() {
                return Err(ProviderError::malformed(format!(
                    "polyline vertex {} out of range ({}, {})",
                    points.len(),
                    point.lon,
                    point.lat
                )));
            }
            points.push(point);
        }

        Ok(Self { points })
    }
}

fn decode_value(bytes: &[u8], index: &mut usize) -> Result<i64, ProviderError> {
    let mut result: i64 = 0;
    let mut shift = 0;

    loop {
        let byte = *bytes
            .get(*index)
            .ok_or_else(|| ProviderError::malformed("truncated encoded polyline"))?;
        *index += 1;

        if !(63..=126).contains(&byte) {
            return Err(ProviderError::malformed(format!(
                "invalid polyline character {:?}",
                byte as char
            )));
        }
        if shift > 60 {
            return Err(ProviderError::malformed("polyline value overflow"));
        }

        let chunk = (byte - 63) as i64;
        result |= (chunk & 0x1f) << shift;
        shift += 5;

        if chunk < 0x20 {
            break;
        }
    }

    Ok(if result & 1 == 1 {
        !(result >> 1)
    } else {
        result >> 1
    })
}
