//! board-route-planner core
//!
//! Walking visitation order and path geometry for clusters of
//! poster-board locations.

pub mod assembler;
pub mod cache;
pub mod config;
pub mod error;
pub mod haversine;
pub mod matrix;
pub mod oracle;
pub mod ors;
pub mod planner;
pub mod polyline;
pub mod rate_gate;
pub mod solver;
pub mod traits;

pub use error::{PlannerError, ProviderError};
pub use traits::{Coordinate, Location};
