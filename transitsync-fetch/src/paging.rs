//! Offset pagination over list endpoints.
//!
//! A [`PagedFetcher`] turns a [`PageSource`] plus a fixed query into pages
//! keyed by offset. Keys are offsets; the first page has key `None`
//! (offset 0). There is no internal retry; failures are classified into
//! [`PageError`] and returned to the caller.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use transitsync_core::{Clock, SystemClock, Trip, Vehicle};

use crate::api::TransitApi;
use crate::error::{FetchError, PageError};
use crate::query::QueryParams;

/// Page size of the vehicle list.
pub const VEHICLE_PAGE_SIZE: u32 = 10;

/// Page size of the trip picker.
pub const TRIP_PAGE_SIZE: u32 = 20;

// ============================================================================
// Page Source
// ============================================================================

/// A list endpoint that can be read at an offset.
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    /// Fetches up to `limit` items starting at `offset`.
    async fn fetch_page(
        &self,
        query: &QueryParams,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<T>, FetchError>;
}

/// Vehicle list source.
#[derive(Clone)]
pub struct VehiclePageSource {
    api: Arc<dyn TransitApi>,
}

impl VehiclePageSource {
    /// Creates a source over the given API.
    pub fn new(api: Arc<dyn TransitApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PageSource<Vehicle> for VehiclePageSource {
    async fn fetch_page(
        &self,
        query: &QueryParams,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Vehicle>, FetchError> {
        self.api.vehicles(query, offset, limit).await
    }
}

/// Trip list source.
#[derive(Clone)]
pub struct TripPageSource {
    api: Arc<dyn TransitApi>,
}

impl TripPageSource {
    /// Creates a source over the given API.
    pub fn new(api: Arc<dyn TransitApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PageSource<Trip> for TripPageSource {
    async fn fetch_page(
        &self,
        query: &QueryParams,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Trip>, FetchError> {
        self.api.trips(query, offset, limit).await
    }
}

// ============================================================================
// Pages
// ============================================================================

/// One loaded page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items in upstream order.
    pub data: Vec<T>,
    /// Key of the preceding page, `None` at the start of the list.
    pub prev_key: Option<u32>,
    /// Key of the following page, `None` at the end of the list.
    pub next_key: Option<u32>,
}

/// Snapshot of the loaded pages used to pick a refresh key.
#[derive(Debug, Clone, PartialEq)]
pub struct PagingState<T> {
    /// Loaded pages in list order.
    pub pages: Vec<Page<T>>,
    /// Index of the item the consumer was last positioned at.
    pub anchor_position: Option<usize>,
}

impl<T> PagingState<T> {
    /// Returns the page containing `position`.
    ///
    /// Positions before the first item map to the first non-empty page and
    /// positions past the last item to the last non-empty page. Returns
    /// `None` when every page is empty.
    pub fn closest_page_to_position(&self, position: usize) -> Option<&Page<T>> {
        let first = self.pages.iter().find(|p| !p.data.is_empty())?;
        let last = self.pages.iter().rev().find(|p| !p.data.is_empty())?;

        let mut start = 0usize;
        for page in &self.pages {
            let end = start + page.data.len();
            if position < end {
                return Some(if page.data.is_empty() { first } else { page });
            }
            start = end;
        }
        Some(last)
    }
}

// ============================================================================
// Paged Fetcher
// ============================================================================

/// Offset paginator over a [`PageSource`] with a fixed query.
pub struct PagedFetcher<T> {
    source: Arc<dyn PageSource<T>>,
    query: QueryParams,
    page_size: u32,
    clock: Arc<dyn Clock>,
}

impl<T> Clone for PagedFetcher<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            query: self.query.clone(),
            page_size: self.page_size,
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<T> fmt::Debug for PagedFetcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagedFetcher")
            .field("query", &self.query)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl PagedFetcher<Vehicle> {
    /// Creates the vehicle list paginator.
    pub fn vehicles(api: Arc<dyn TransitApi>, query: QueryParams) -> Self {
        Self::new(
            Arc::new(VehiclePageSource::new(api)),
            query,
            VEHICLE_PAGE_SIZE,
        )
    }
}

impl PagedFetcher<Trip> {
    /// Creates the trip picker paginator.
    pub fn trips(api: Arc<dyn TransitApi>, query: QueryParams) -> Self {
        Self::new(Arc::new(TripPageSource::new(api)), query, TRIP_PAGE_SIZE)
    }
}

impl<T: Send + 'static> PagedFetcher<T> {
    /// Creates a paginator. A page size of zero is treated as one.
    pub fn new(source: Arc<dyn PageSource<T>>, query: QueryParams, page_size: u32) -> Self {
        Self {
            source,
            query,
            page_size: page_size.max(1),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock used to phrase rate-limit messages.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the page size.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Returns the fixed query.
    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    /// Loads the page at `key`; `None` loads the first page.
    pub async fn load(&self, key: Option<u32>) -> Result<Page<T>, PageError> {
        let offset = key.unwrap_or(0);
        let size = self.page_size;
        debug!(offset, limit = size, "Loading page");

        let data = self
            .source
            .fetch_page(&self.query, offset, size)
            .await
            .map_err(|e| {
                let err = PageError::from_fetch(e, self.clock.now_epoch_secs());
                debug!(offset, error = %err, "Page load failed");
                err
            })?;

        let prev_key = if offset == 0 {
            None
        } else {
            Some(offset.saturating_sub(size))
        };
        let next_key = if data.len() < size as usize {
            None
        } else {
            Some(offset.saturating_add(size))
        };

        debug!(offset, items = data.len(), ?next_key, "Page loaded");
        Ok(Page {
            data,
            prev_key,
            next_key,
        })
    }

    /// Returns the key to reload from so the anchor stays in view.
    pub fn refresh_key(&self, state: &PagingState<T>) -> Option<u32> {
        let anchor = state.anchor_position?;
        let page = state.closest_page_to_position(anchor)?;
        page.prev_key
            .map(|k| k.saturating_add(self.page_size))
            .or_else(|| page.next_key.and_then(|k| k.checked_sub(self.page_size)))
    }
}
