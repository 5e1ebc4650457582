//! Domain models for transitsync.
//!
//! This module contains the core data structures representing live vehicles,
//! the network entities they reference, filters and rate-limit state.
//!
//! ## Submodules
//!
//! - [`vehicle`] - Vehicle types (Vehicle, VehicleDetail, VehicleDetailWithRelations)
//! - [`network`] - Network entities (Route, Trip, Stop, Shape)
//! - [`filters`] - Filter value objects (VehicleFilters, TripFilters)
//! - [`rate_limit`] - Rate-limit countdown state

pub mod filters;
pub mod network;
pub mod rate_limit;
pub mod vehicle;

// Re-export everything at the models level
pub use filters::{TripFilters, VehicleFilters};
pub use network::{Route, Shape, Stop, Trip};
pub use rate_limit::{format_countdown, RateLimitState, MAX_COUNTDOWN_SECS};
pub use vehicle::{
    Vehicle, VehicleDetail, VehicleDetailWithRelations, VehicleStatus, DEFAULT_VEHICLE_LABEL,
};
