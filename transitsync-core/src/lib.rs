// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # transitsync Core
//!
//! Core types, models, and traits shared by every transitsync crate:
//!
//! - Domain models (vehicles, routes, trips, stops, shapes)
//! - Filter value objects
//! - Rate-limit countdown state
//! - Error types
//! - The [`Clock`] abstraction
//!
//! ## Key Types
//!
//! ### Vehicle Types
//! - [`Vehicle`] - List entry for a live vehicle
//! - [`VehicleDetail`] - Single vehicle with relation ids
//! - [`VehicleDetailWithRelations`] - Detail plus resolved relations
//! - [`VehicleStatus`] - Status relative to the next stop
//!
//! ### Network Types
//! - [`Route`], [`Trip`], [`Stop`], [`Shape`]
//!
//! ### Filters & Rate Limits
//! - [`VehicleFilters`] - Vehicle list filters
//! - [`TripFilters`] - Trip picker filters
//! - [`RateLimitState`] - Countdown shown while rate limited

pub mod error;
pub mod models;
pub mod traits;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Vehicle types
    Vehicle,
    VehicleDetail,
    VehicleDetailWithRelations,
    VehicleStatus,
    DEFAULT_VEHICLE_LABEL,
    // Network types
    Route,
    Shape,
    Stop,
    Trip,
    // Filters
    TripFilters,
    VehicleFilters,
    // Rate limits
    format_countdown,
    RateLimitState,
    MAX_COUNTDOWN_SECS,
};

// Re-export traits
pub use traits::{Clock, SystemClock};
