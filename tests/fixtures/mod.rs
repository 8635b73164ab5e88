//! Test fixtures for board-route-planner.
//!
//! Provides poster-board style clusters around Inzai, Chiba and small
//! provider doubles for driving the engine without a network.

pub mod inzai_locations;

pub use inzai_locations::*;
