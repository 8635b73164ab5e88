//! Distance and duration matrices.

use crate::error::PlannerError;

/// Parallel N×N matrices: metres and seconds.
///
/// Built once per cluster and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    distances: Vec<Vec<f64>>,
    durations: Vec<Vec<f64>>,
}

impl DistanceMatrix {
    /// Validates shape and values of both matrices.
    pub fn new(distances: Vec<Vec<f64>>, durations: Vec<Vec<f64>>) -> Result<Self, PlannerError> {
        validate_square(&distances)?;
        validate_square(&durations)?;
        if distances.len() != durations.len() {
            return Err(PlannerError::MismatchedMatrices {
                distances: distances.len(),
                durations: durations.len(),
            });
        }
        Ok(Self {
            distances,
            durations,
        })
    }

    /// For matrices the crate built itself and knows to be well formed.
    pub(crate) fn from_parts(distances: Vec<Vec<f64>>, durations: Vec<Vec<f64>>) -> Self {
        Self {
            distances,
            durations,
        }
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    pub fn distances(&self) -> &[Vec<f64>] {
        &self.distances
    }

    pub fn durations(&self) -> &[Vec<f64>] {
        &self.durations
    }

    pub fn distance(&self, from: usize, to: usize) -> f64 {
        self.distances[from][to]
    }

    pub fn duration(&self, from: usize, to: usize) -> f64 {
        self.durations[from][to]
    }

    /// Total metres along `order`, without a return leg.
    pub fn path_distance(&self, order: &[usize]) -> f64 {
        path_cost(&self.distances, order)
    }

    /// Total seconds along `order`, without a return leg.
    pub fn path_duration(&self, order: &[usize]) -> f64 {
        path_cost(&self.durations, order)
    }
}

/// One-directional path sum: `m[order[k]][order[k + 1]]` over consecutive pairs.
pub fn path_cost(matrix: &[Vec<f64>], order: &[usize]) -> f64 {
    order
        .windows(2)
        .map(|pair| matrix[pair[0]][pair[1]])
        .sum()
}

/// Checks the matrix is square with finite, non-negative entries.
pub fn validate_square(matrix: &[Vec<f64>]) -> Result<(), PlannerError> {
    let n = matrix.len();
    for (row, values) in matrix.iter().enumerate() {
        if values.len() != n {
            return Err(PlannerError::NonSquareMatrix {
                row,
                len: values.len(),
                expected: n,
            });
        }
        if let Some((col, value)) = values
            .iter()
            .enumerate()
            .find(|(_, value)| !value.is_finite() || **value < 0.0)
        {
            return Err(PlannerError::InvalidMatrixValue {
                row,
                col,
                value: *value,
            });
        }
    }
    Ok(())
}
