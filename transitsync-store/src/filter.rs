//! Filter selection and the trip picker pipeline.
//!
//! [`FilterController`] holds the in-progress [`FilterSelection`], the
//! filters last applied to the vehicle list, and the route picker state.
//! Selection changes flow through [`trip_filters`] into a trip [`Pager`]:
//! route ids pass straight through, the trip query is debounced, and only
//! distinct [`TripFilters`] restart trip pagination.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use transitsync_core::{Route, Trip, TripFilters, VehicleFilters};

use crate::pager::Pager;
use crate::repository::{RouteRepository, TripRepository};

/// Quiet period before a trip query change is applied.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Route picker message for connectivity failures.
pub const NETWORK_ERROR_HINT: &str = "Network error. Check your connection and try again.";

/// Route picker message when a failure has no message of its own.
pub const ROUTES_FALLBACK_ERROR: &str = "Failed to load routes";

// ============================================================================
// Selection
// ============================================================================

/// The filter choices being edited, before they are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    /// Selected route ids.
    pub route_ids: BTreeSet<String>,
    /// Selected trip ids.
    pub trip_ids: BTreeSet<String>,
    /// Free-text trip name query.
    pub trip_query: String,
    /// Free-text route picker query.
    pub route_query: String,
}

impl FilterSelection {
    /// Returns the filters for the vehicle list.
    pub fn vehicle_filters(&self) -> VehicleFilters {
        VehicleFilters {
            route_ids: self.route_ids.clone(),
            trip_ids: self.trip_ids.clone(),
        }
    }
}

/// Route picker state.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePicker {
    /// Every route, sorted.
    pub routes: Arc<[Route]>,
    /// True while the route list is loading.
    pub is_loading: bool,
    /// Friendly message of the last failure.
    pub error: Option<String>,
}

impl RoutePicker {
    fn loading(routes: Arc<[Route]>) -> Self {
        Self {
            routes,
            is_loading: true,
            error: None,
        }
    }
}

// ============================================================================
// Trip Filters Pipeline
// ============================================================================

fn publish_distinct(tx: &watch::Sender<TripFilters>, routes: &BTreeSet<String>, query: &str) {
    let next = TripFilters {
        route_ids: routes.clone(),
        name_query: query.trim().to_string(),
    };
    tx.send_if_modified(|current| {
        if *current == next {
            false
        } else {
            debug!(routes = next.route_ids.len(), query = %next.name_query, "Trip filters changed");
            *current = next;
            true
        }
    });
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Derives [`TripFilters`] from a selection channel.
///
/// Route id changes are forwarded immediately. Trip query changes are
/// forwarded once the query has been stable for `debounce`. The output
/// only changes when the combined filters differ from the previous value.
/// The task ends when the selection sender is dropped.
pub fn trip_filters(
    mut selection: watch::Receiver<FilterSelection>,
    debounce: Duration,
) -> (watch::Receiver<TripFilters>, JoinHandle<()>) {
    let (mut routes, mut query) = {
        let current = selection.borrow_and_update();
        (current.route_ids.clone(), current.trip_query.clone())
    };
    let (tx, rx) = watch::channel(TripFilters {
        route_ids: routes.clone(),
        name_query: query.trim().to_string(),
    });

    let task = tokio::spawn(async move {
        let mut latest_query = query.clone();
        let mut deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                changed = selection.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let (next_routes, next_query) = {
                        let current = selection.borrow_and_update();
                        (current.route_ids.clone(), current.trip_query.clone())
                    };

                    if next_routes != routes {
                        routes = next_routes;
                        publish_distinct(&tx, &routes, &query);
                    }
                    if next_query != latest_query {
                        latest_query = next_query;
                        deadline = Some(Instant::now() + debounce);
                    }
                }
                () = sleep_until(deadline) => {
                    deadline = None;
                    query.clone_from(&latest_query);
                    publish_distinct(&tx, &routes, &query);
                }
            }
        }
    });

    (rx, task)
}

/// Feeds every distinct [`TripFilters`] into `pager`, restarting it.
///
/// Empty filters submit no query, which yields an empty list without
/// calling upstream.
pub fn drive_trip_pager(
    mut filters: watch::Receiver<TripFilters>,
    pager: Arc<Pager<Trip>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let current = filters.borrow_and_update().clone();
            pager.submit(TripRepository::query_for(&current));
            if filters.changed().await.is_err() {
                break;
            }
        }
    })
}

// ============================================================================
// Filter Controller
// ============================================================================

/// Owns the filter selection, the applied filters and the trip picker.
///
/// Construction spawns the pipeline tasks and starts loading routes, so it
/// must happen inside a tokio runtime. Dropping the controller stops them.
pub struct FilterController {
    selection: watch::Sender<FilterSelection>,
    applied: watch::Sender<VehicleFilters>,
    picker: Arc<watch::Sender<RoutePicker>>,
    trip_filters: watch::Receiver<TripFilters>,
    trips: Arc<Pager<Trip>>,
    routes: Arc<RouteRepository>,
    route_load: Mutex<Option<JoinHandle<()>>>,
    pipeline: Vec<JoinHandle<()>>,
}

impl fmt::Debug for FilterController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterController")
            .field("selection", &*self.selection.borrow())
            .field("applied", &*self.applied.borrow())
            .finish_non_exhaustive()
    }
}

impl FilterController {
    /// Creates the controller and starts loading routes.
    pub fn new(routes: Arc<RouteRepository>, trips: TripRepository, debounce: Duration) -> Self {
        let (selection, selection_rx) = watch::channel(FilterSelection::default());
        let (applied, _) = watch::channel(VehicleFilters::default());
        let (picker, _) = watch::channel(RoutePicker::loading(Arc::from(Vec::new())));

        let trip_pager = Arc::new(Pager::new(move |query| trips.pages(query)));
        let (trip_filters, combine) = trip_filters(selection_rx, debounce);
        let drive = drive_trip_pager(trip_filters.clone(), Arc::clone(&trip_pager));

        let controller = Self {
            selection,
            applied,
            picker: Arc::new(picker),
            trip_filters,
            trips: trip_pager,
            routes,
            route_load: Mutex::new(None),
            pipeline: vec![combine, drive],
        };
        controller.load_routes();
        controller
    }

    // ========================================================================
    // Observable
    // ========================================================================

    /// Subscribes to the in-progress selection.
    pub fn subscribe_selection(&self) -> watch::Receiver<FilterSelection> {
        self.selection.subscribe()
    }

    /// Subscribes to the filters applied to the vehicle list.
    pub fn subscribe_applied(&self) -> watch::Receiver<VehicleFilters> {
        self.applied.subscribe()
    }

    /// Subscribes to the route picker state.
    pub fn subscribe_routes(&self) -> watch::Receiver<RoutePicker> {
        self.picker.subscribe()
    }

    /// Subscribes to the debounced trip filters.
    pub fn subscribe_trip_filters(&self) -> watch::Receiver<TripFilters> {
        self.trip_filters.clone()
    }

    /// Returns the trip picker pager.
    pub fn trips(&self) -> &Pager<Trip> {
        &self.trips
    }

    /// Returns the current selection.
    pub fn selection(&self) -> FilterSelection {
        self.selection.borrow().clone()
    }

    /// Returns the applied filters.
    pub fn applied(&self) -> VehicleFilters {
        self.applied.borrow().clone()
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Toggles a route. Changing routes clears the selected trips.
    pub fn toggle_route(&self, route_id: &str) {
        self.selection.send_modify(|s| {
            if !s.route_ids.remove(route_id) {
                s.route_ids.insert(route_id.to_string());
            }
            s.trip_ids.clear();
        });
    }

    /// Toggles a trip.
    pub fn toggle_trip(&self, trip_id: &str) {
        self.selection.send_modify(|s| {
            if !s.trip_ids.remove(trip_id) {
                s.trip_ids.insert(trip_id.to_string());
            }
        });
    }

    /// Sets the trip name query.
    pub fn set_trip_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.selection.send_modify(|s| s.trip_query = query);
    }

    /// Sets the route picker query.
    pub fn set_route_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.selection.send_modify(|s| s.route_query = query);
    }

    /// Publishes the selected routes and trips as the applied filters.
    pub fn apply_filters(&self) {
        let filters = self.selection.borrow().vehicle_filters();
        debug!(
            routes = filters.route_ids.len(),
            trips = filters.trip_ids.len(),
            "Filters applied"
        );
        self.applied.send_replace(filters);
    }

    /// Clears the selection and the applied filters.
    pub fn clear_filters(&self) {
        self.selection.send_modify(|s| {
            s.route_ids.clear();
            s.trip_ids.clear();
        });
        self.applied.send_replace(VehicleFilters::default());
    }

    /// Clears the selected routes.
    pub fn clear_routes(&self) {
        self.selection.send_modify(|s| s.route_ids.clear());
    }

    /// Clears the selected trips.
    pub fn clear_trips(&self) {
        self.selection.send_modify(|s| s.trip_ids.clear());
    }

    // ========================================================================
    // Route Picker
    // ========================================================================

    /// Loads the route list into the picker, replacing a load in flight.
    pub fn load_routes(&self) {
        let mut slot = self.route_load.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = slot.take() {
            task.abort();
        }

        self.picker.send_modify(|p| {
            p.is_loading = true;
            p.error = None;
        });

        let picker = Arc::clone(&self.picker);
        let routes = Arc::clone(&self.routes);
        *slot = Some(tokio::spawn(async move {
            match routes.get_all().await {
                Ok(routes) => {
                    picker.send_replace(RoutePicker {
                        routes,
                        is_loading: false,
                        error: None,
                    });
                }
                Err(err) => {
                    warn!(error = %err, "Failed to load routes");
                    let message = if err.is_network_error() {
                        NETWORK_ERROR_HINT.to_string()
                    } else {
                        let message = err.to_string();
                        if message.trim().is_empty() {
                            ROUTES_FALLBACK_ERROR.to_string()
                        } else {
                            message
                        }
                    };
                    picker.send_modify(|p| {
                        p.is_loading = false;
                        p.error = Some(message);
                    });
                }
            }
        }));
    }

    /// Retries loading the route list.
    pub fn retry_routes(&self) {
        self.load_routes();
    }

    /// Returns the routes matching the route picker query.
    ///
    /// Matching is a case-insensitive substring search over short name,
    /// long name and id.
    pub fn visible_routes(&self) -> Vec<Route> {
        let query = self.selection.borrow().route_query.trim().to_lowercase();
        let picker = self.picker.borrow();
        picker
            .routes
            .iter()
            .filter(|r| {
                query.is_empty()
                    || [&r.short_name, &r.long_name, &r.id]
                        .iter()
                        .any(|field| field.to_lowercase().contains(&query))
            })
            .cloned()
            .collect()
    }
}

impl Drop for FilterController {
    fn drop(&mut self) {
        if let Some(task) = self
            .route_load
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
        for task in &self.pipeline {
            task.abort();
        }
    }
}
