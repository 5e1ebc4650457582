//! Vehicle list with rate-limit handling.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use transitsync_core::{RateLimitState, Vehicle, VehicleFilters};
use transitsync_fetch::QueryBuilder;

use crate::pager::{Pager, PagerSnapshot};
use crate::rate_limit::RateLimitMonitor;
use crate::repository::VehicleRepository;

/// The paged vehicle list and its rate-limit countdown.
///
/// Every load failure is reported to the controller's [`RateLimitMonitor`],
/// so a rate-limited page starts the countdown.
pub struct VehicleListController {
    pager: Pager<Vehicle>,
    monitor: Arc<RateLimitMonitor>,
    filters: watch::Sender<VehicleFilters>,
}

impl fmt::Debug for VehicleListController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VehicleListController")
            .field("filters", &*self.filters.borrow())
            .field("monitor", &self.monitor)
            .finish_non_exhaustive()
    }
}

impl VehicleListController {
    /// Creates the controller. Nothing is loaded until filters are applied.
    pub fn new(vehicles: VehicleRepository, monitor: Arc<RateLimitMonitor>) -> Self {
        let observer = Arc::clone(&monitor);
        let pager = Pager::with_error_hook(
            move |query| vehicles.pages(query),
            move |err| observer.observe(err),
        );
        let (filters, _) = watch::channel(VehicleFilters::default());
        Self {
            pager,
            monitor,
            filters,
        }
    }

    /// Subscribes to list snapshots.
    pub fn subscribe(&self) -> watch::Receiver<PagerSnapshot<Vehicle>> {
        self.pager.subscribe()
    }

    /// Returns the latest list snapshot.
    pub fn snapshot(&self) -> PagerSnapshot<Vehicle> {
        self.pager.snapshot()
    }

    /// Subscribes to the rate-limit countdown.
    pub fn rate_limit(&self) -> watch::Receiver<Option<RateLimitState>> {
        self.monitor.subscribe()
    }

    /// Returns the filters currently applied.
    pub fn filters(&self) -> VehicleFilters {
        self.filters.borrow().clone()
    }

    /// Restarts the list with `filters`. Empty filters list every vehicle.
    pub fn apply_filters(&self, filters: &VehicleFilters) {
        info!(
            routes = filters.route_ids.len(),
            trips = filters.trip_ids.len(),
            "Loading vehicles"
        );
        self.filters.send_replace(filters.clone());
        self.pager.submit(Some(QueryBuilder::vehicles(filters)));
    }

    /// Restarts the list without filters.
    pub fn clear_filters(&self) {
        self.apply_filters(&VehicleFilters::default());
    }

    /// Reloads near the given position.
    pub fn refresh(&self, anchor: Option<usize>) {
        if let Some(position) = anchor {
            self.pager.set_anchor(position);
        }
        self.pager.refresh();
    }

    /// Loads the next page.
    pub fn load_next(&self) {
        self.pager.load_next();
    }

    /// Retries the failed load. Ignored while the countdown is running.
    pub fn retry(&self) {
        if self.monitor.is_cooling_down() {
            debug!("Retry ignored while rate limited");
            return;
        }
        self.pager.retry();
    }
}
