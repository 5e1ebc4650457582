// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # transitsync Store
//!
//! Repositories and live state for the transitsync clients.
//!
//! This crate provides:
//!
//! - **Repositories**: upstream access, with the route list cached in memory
//! - **RelationResolver**: concurrent vehicle + relations lookup
//! - **Pager**: incremental list loading with observable load states
//! - **RateLimitMonitor**: once-per-second cooldown countdown
//! - **FilterController**: filter selection and the debounced trip picker
//! - **VehicleListController** / **VehicleDetailController**: list and
//!   polling detail state
//! - **Config**: JSON configuration file
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use transitsync_fetch::ApiClient;
//! use transitsync_store::{
//!     Config, RelationResolver, RouteRepository, VehicleDetailController,
//! };
//!
//! let config = Config::load().await?;
//! let api = Arc::new(ApiClient::new(&config.client_settings())?);
//! let routes = Arc::new(RouteRepository::new(api.clone()));
//! let resolver = Arc::new(RelationResolver::new(api, routes));
//!
//! let detail = VehicleDetailController::new(resolver, "y1234", config.poll_interval());
//! detail.start();
//!
//! let mut rx = detail.subscribe();
//! while rx.changed().await.is_ok() {
//!     println!("{:?}", *rx.borrow());
//! }
//! ```

pub mod config;
pub mod detail;
pub mod error;
pub mod filter;
pub mod pager;
pub mod persistence;
pub mod rate_limit;
pub mod repository;
pub mod resolver;
pub mod vehicles;

pub use config::{ApiConfig, Config, SyncConfig, DEFAULT_API_KEY_ENV};
pub use detail::{DetailState, VehicleDetailController, DEFAULT_POLL_INTERVAL};
pub use error::{StoreError, NETWORK_ERROR_MESSAGE};
pub use filter::{
    drive_trip_pager, trip_filters, FilterController, FilterSelection, RoutePicker,
    DEFAULT_DEBOUNCE, NETWORK_ERROR_HINT, ROUTES_FALLBACK_ERROR,
};
pub use pager::{LoadState, Pager, PagerSnapshot};
pub use persistence::{
    default_config_dir, default_config_path, ensure_dir, load_json, load_json_or_default,
    save_json,
};
pub use rate_limit::{remaining_seconds, RateLimitMonitor};
pub use repository::{
    CachePolicy, RouteRepository, ShapeRepository, StopRepository, TripRepository,
    VehicleRepository, ROUTE_PAGE_SIZE,
};
pub use resolver::RelationResolver;
pub use vehicles::VehicleListController;

#[cfg(test)]
mod persistence_tests;
#[cfg(test)]
mod test_support;
