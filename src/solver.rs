//! Open-path TSP solver: multi-start nearest neighbour with bounded 2-opt.
//!
//! Every node is tried as the start. Each start builds a greedy path and then
//! improves it with first-improvement 2-opt. The cheapest path wins, and on
//! equal cost the lowest start index wins. Starts run in parallel, but the
//! result is reduced in start order, so the output is deterministic.

use rayon::prelude::*;
use tracing::debug;

use crate::error::PlannerError;
use crate::matrix::{path_cost, validate_square};

#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Maximum 2-opt passes per start (further capped at `2n`).
    pub max_iterations: usize,
    /// A move is applied only if it shortens the path by more than this.
    pub improvement_threshold: f64,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            improvement_threshold: 0.01,
        }
    }
}

/// A Hamiltonian path. There is no return leg to `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tour {
    pub order: Vec<usize>,
    pub start: usize,
    pub cost: f64,
}

/// Outcome of one 2-opt run.
#[derive(Debug, Clone, PartialEq)]
pub struct Improvement {
    pub order: Vec<usize>,
    pub cost: f64,
    /// Path cost after each applied move, in order.
    pub pass_costs: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct TspSolver {
    options: SolveOptions,
}

impl TspSolver {
    pub fn new(options: SolveOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SolveOptions {
        &self.options
    }

    /// Best path over all starting points.
    pub fn solve(&self, distances: &[Vec<f64>]) -> Result<Tour, PlannerError> {
        validate_square(distances)?;
        let n = distances.len();
        if n <= 1 {
            return Ok(trivial_tour(n));
        }

        let candidates: Vec<Tour> = (0..n)
            .into_par_iter()
            .map(|start| self.tour_from(start, distances))
            .collect();

        // A later start replaces the incumbent only when strictly cheaper.
        let best = candidates
            .into_iter()
            .reduce(|best, tour| if tour.cost < best.cost { tour } else { best })
            .unwrap_or_else(|| trivial_tour(n));

        debug!(points = n, start = best.start, cost = best.cost, "best start selected");
        Ok(best)
    }

    /// Nearest neighbour plus 2-opt from one fixed start.
    pub fn solve_from_start(&self, start: usize, distances: &[Vec<f64>]) -> Result<Tour, PlannerError> {
        validate_square(distances)?;
        let n = distances.len();
        if n <= 1 {
            return Ok(trivial_tour(n));
        }
        if start >= n {
            return Err(PlannerError::RouteIndexOutOfRange { index: start, len: n });
        }
        Ok(self.tour_from(start, distances))
    }

    fn tour_from(&self, start: usize, distances: &[Vec<f64>]) -> Tour {
        let initial = nearest_neighbor(start, distances);
        let improved = self.two_opt(initial, distances);
        Tour {
            order: improved.order,
            start,
            cost: improved.cost,
        }
    }

    /// First-improvement 2-opt on an open path.
    ///
    /// Scans `i` over `1..=n-2` and `j` over `i+1..=n-1`, skipping adjacent
    /// pairs. Reverses `order[i..j]` for the first pair that improves by more
    /// than the threshold, then rescans from `i = 1`. Stops after a pass with
    /// no move or after `min(max_iterations, 2n)` passes.
    pub fn two_opt(&self, mut order: Vec<usize>, distances: &[Vec<f64>]) -> Improvement {
        let n = order.len();
        let threshold = self.options.improvement_threshold.max(0.0);
        let max_passes = self.options.max_iterations.min(2 * n);

        let mut cost = path_cost(distances, &order);
        let mut pass_costs = Vec::new();
        let mut passes = 0;
        let mut improved = true;

        while improved && passes < max_passes {
            improved = false;
            passes += 1;

            'scan: for i in 1..n.saturating_sub(1) {
                for j in (i + 2)..n {
                    order[i..j].reverse();
                    let candidate = path_cost(distances, &order);
                    if cost - candidate > threshold {
                        cost = candidate;
                        improved = true;
                        break 'scan;
                    }
                    order[i..j].reverse();
                }
            }

            if improved {
                pass_costs.push(cost);
            }
        }

        Improvement {
            order,
            cost,
            pass_costs,
        }
    }
}

fn trivial_tour(n: usize) -> Tour {
    Tour {
        order: (0..n).collect(),
        start: 0,
        cost: 0.0,
    }
}

/// Greedy path from `start`. Ties go to the lowest index.
pub fn nearest_neighbor(start: usize, distances: &[Vec<f64>]) -> Vec<usize> {
    let n = distances.len();
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);

    let mut current = start;
    visited[current] = true;
    order.push(current);

    while order.len() < n {
        let mut nearest: Option<usize> = None;
        for candidate in 0..n {
            if visited[candidate] {
                continue;
            }
            match nearest {
                Some(best) if distances[current][candidate] >= distances[current][best] => {}
                _ => nearest = Some(candidate),
            }
        }

        let Some(next) = nearest else { break };
        visited[next] = true;
        order.push(next);
        current = next;
    }

    order
}
