// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # transitsync Fetch
//!
//! Upstream access for transitsync.
//!
//! This crate talks to the JSON:API transit service and turns its
//! responses into core models. It includes:
//!
//! ## HTTP
//!
//! - [`client::ApiClient`] - reqwest client bound to a base URL, with
//!   status classification (429 and `x-ratelimit-reset`)
//! - [`context::ClientSettings`] - base URL, API key and timeouts
//! - [`response`] - JSON:API documents and their mapping onto models
//! - [`api::TransitApi`] - the seam repositories and page sources use
//!
//! ## Queries & Paging
//!
//! - [`query::QueryBuilder`] - filter values to query parameters
//! - [`paging::PagedFetcher`] - offset pagination with classified failures
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use transitsync_fetch::{ApiClient, ClientSettings, PagedFetcher, QueryBuilder};
//!
//! let api = Arc::new(ApiClient::new(&ClientSettings::default())?);
//! let query = QueryBuilder::vehicles(&filters);
//! let page = PagedFetcher::vehicles(api, query).load(None).await?;
//! ```

pub mod api;
pub mod client;
pub mod context;
pub mod error;
pub mod paging;
pub mod query;
pub mod response;

// Errors
pub use error::{rate_limit_message, FetchError, PageError};

// HTTP
pub use api::TransitApi;
pub use client::{ApiClient, RATE_LIMIT_RESET_HEADER};
pub use context::{ClientSettings, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};

// Queries & paging
pub use paging::{
    Page, PageSource, PagedFetcher, PagingState, TripPageSource, VehiclePageSource,
    TRIP_PAGE_SIZE, VEHICLE_PAGE_SIZE,
};
pub use query::{QueryBuilder, QueryParams, ToQuery};
