//! Repositories over the upstream API.
//!
//! Every single-entity lookup maps [`FetchError`] into [`StoreError`]
//! through the same conversion: transport failures become
//! [`StoreError::Network`], everything else [`StoreError::Fetch`].
//!
//! [`RouteRepository`] additionally keeps the full route list in memory.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use transitsync_core::{
    Clock, Route, Shape, Stop, SystemClock, Trip, TripFilters, Vehicle, VehicleDetail,
};
use transitsync_fetch::{FetchError, PagedFetcher, QueryBuilder, QueryParams, TransitApi};

use crate::error::StoreError;

/// Page size used when scanning the route list.
pub const ROUTE_PAGE_SIZE: u32 = 100;

// ============================================================================
// Cache Policy
// ============================================================================

/// Staleness policy of the route cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CachePolicy {
    /// Maximum age of the cached list; `None` keeps it for the lifetime of
    /// the repository.
    pub ttl: Option<Duration>,
}

impl CachePolicy {
    /// Never expires.
    pub fn forever() -> Self {
        Self { ttl: None }
    }

    /// Expires after `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl: Some(ttl) }
    }

    /// Returns true if an entry filled at `filled_at` is still usable at `now`.
    #[allow(clippy::cast_possible_wrap)]
    pub fn is_fresh(&self, filled_at: i64, now: i64) -> bool {
        match self.ttl {
            None => true,
            Some(ttl) => now.saturating_sub(filled_at) < ttl.as_secs() as i64,
        }
    }
}

// ============================================================================
// Route Repository
// ============================================================================

struct CachedRoutes {
    routes: Arc<[Route]>,
    filled_at: i64,
}

/// Route lookups backed by a single-flight in-memory cache.
pub struct RouteRepository {
    api: Arc<dyn TransitApi>,
    cache: RwLock<Option<CachedRoutes>>,
    fill: Mutex<()>,
    policy: CachePolicy,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for RouteRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRepository")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RouteRepository {
    /// Creates a repository whose cache never expires.
    pub fn new(api: Arc<dyn TransitApi>) -> Self {
        Self::with_policy(api, CachePolicy::forever(), Arc::new(SystemClock))
    }

    /// Creates a repository with an explicit staleness policy and clock.
    pub fn with_policy(api: Arc<dyn TransitApi>, policy: CachePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            cache: RwLock::new(None),
            fill: Mutex::new(()),
            policy,
            clock,
        }
    }

    /// Returns every route sorted by short name (long name when blank).
    ///
    /// Concurrent callers on a cold cache share one upstream scan.
    pub async fn get_all(&self) -> Result<Arc<[Route]>, StoreError> {
        if let Some(routes) = self.cached().await {
            return Ok(routes);
        }

        let _fill = self.fill.lock().await;
        if let Some(routes) = self.cached().await {
            return Ok(routes);
        }

        let routes: Arc<[Route]> = self.scan().await?.into();
        *self.cache.write().await = Some(CachedRoutes {
            routes: Arc::clone(&routes),
            filled_at: self.clock.now_epoch_secs(),
        });
        info!(count = routes.len(), "Route cache filled");
        Ok(routes)
    }

    /// Returns one route, from the cache when present.
    pub async fn get_by_id(&self, id: &str) -> Result<Route, StoreError> {
        if let Some(route) = self
            .cached()
            .await
            .and_then(|routes| routes.iter().find(|r| r.id == id).cloned())
        {
            return Ok(route);
        }
        Ok(self.api.route(id).await?)
    }

    /// Drops the cached list; the next [`Self::get_all`] scans again.
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
        debug!("Route cache invalidated");
    }

    async fn cached(&self) -> Option<Arc<[Route]>> {
        let cache = self.cache.read().await;
        let entry = cache.as_ref()?;
        if self
            .policy
            .is_fresh(entry.filled_at, self.clock.now_epoch_secs())
        {
            Some(Arc::clone(&entry.routes))
        } else {
            None
        }
    }

    async fn scan(&self) -> Result<Vec<Route>, FetchError> {
        let mut routes = Vec::new();
        let mut offset = 0;
        loop {
            let page = self.api.routes(offset, ROUTE_PAGE_SIZE).await?;
            let short = page.len() < ROUTE_PAGE_SIZE as usize;
            routes.extend(page);
            if short {
                break;
            }
            offset += ROUTE_PAGE_SIZE;
        }

        routes.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));
        debug!(count = routes.len(), pages = offset / ROUTE_PAGE_SIZE + 1, "Route scan complete");
        Ok(routes)
    }
}

// ============================================================================
// Passthrough Repositories
// ============================================================================

/// Vehicle list and detail access.
#[derive(Clone)]
pub struct VehicleRepository {
    api: Arc<dyn TransitApi>,
}

impl VehicleRepository {
    /// Creates the repository.
    pub fn new(api: Arc<dyn TransitApi>) -> Self {
        Self { api }
    }

    /// Returns a paginator over vehicles matching `query`.
    pub fn pages(&self, query: QueryParams) -> PagedFetcher<Vehicle> {
        PagedFetcher::vehicles(Arc::clone(&self.api), query)
    }

    /// Fetches one vehicle with its relation ids.
    pub async fn vehicle_detail(&self, id: &str) -> Result<VehicleDetail, StoreError> {
        Ok(self.api.vehicle(id).await?)
    }
}

/// Trip list and single-trip access.
#[derive(Clone)]
pub struct TripRepository {
    api: Arc<dyn TransitApi>,
}

impl TripRepository {
    /// Creates the repository.
    pub fn new(api: Arc<dyn TransitApi>) -> Self {
        Self { api }
    }

    /// Returns a paginator over trips matching `query`.
    pub fn pages(&self, query: QueryParams) -> PagedFetcher<Trip> {
        PagedFetcher::trips(Arc::clone(&self.api), query)
    }

    /// Returns the query for `filters`, or `None` when the filters are
    /// empty and the trip list should be empty without asking upstream.
    pub fn query_for(filters: &TripFilters) -> Option<QueryParams> {
        if filters.is_empty() {
            None
        } else {
            Some(QueryBuilder::trips(filters))
        }
    }

    /// Fetches one trip.
    pub async fn trip(&self, id: &str) -> Result<Trip, StoreError> {
        Ok(self.api.trip(id).await?)
    }
}

/// Single-stop access.
#[derive(Clone)]
pub struct StopRepository {
    api: Arc<dyn TransitApi>,
}

impl StopRepository {
    /// Creates the repository.
    pub fn new(api: Arc<dyn TransitApi>) -> Self {
        Self { api }
    }

    /// Fetches one stop.
    pub async fn stop(&self, id: &str) -> Result<Stop, StoreError> {
        Ok(self.api.stop(id).await?)
    }
}

/// Single-shape access.
#[derive(Clone)]
pub struct ShapeRepository {
    api: Arc<dyn TransitApi>,
}

impl ShapeRepository {
    /// Creates the repository.
    pub fn new(api: Arc<dyn TransitApi>) -> Self {
        Self { api }
    }

    /// Fetches one shape.
    pub async fn shape(&self, id: &str) -> Result<Shape, StoreError> {
        Ok(self.api.shape(id).await?)
    }
}
