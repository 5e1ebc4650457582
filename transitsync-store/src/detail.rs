//! Vehicle detail with live polling.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use transitsync_core::VehicleDetailWithRelations;

use crate::error::StoreError;
use crate::rate_limit::RateLimitMonitor;
use crate::resolver::RelationResolver;

/// Default time between refreshes of a loaded vehicle.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// What the detail view observes.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    /// The first resolution is in flight.
    Loading,
    /// The latest resolved aggregate.
    Loaded(Arc<VehicleDetailWithRelations>),
    /// The first resolution failed.
    Error {
        /// User-facing message.
        message: String,
        /// True for connectivity failures.
        is_network_error: bool,
    },
    /// No such vehicle.
    Empty,
}

impl DetailState {
    /// Returns the loaded aggregate, if any.
    pub fn loaded(&self) -> Option<&VehicleDetailWithRelations> {
        match self {
            Self::Loaded(detail) => Some(detail),
            _ => None,
        }
    }

    fn from_error(err: &StoreError) -> Self {
        if err.code() == Some(404) {
            return Self::Empty;
        }
        Self::Error {
            message: err.to_string(),
            is_network_error: err.is_network_error(),
        }
    }
}

/// Loads one vehicle and keeps it fresh.
///
/// [`Self::start`] resolves the vehicle once and then re-resolves it every
/// poll interval. Only the first resolution reports failures; later ones
/// keep the last good aggregate.
pub struct VehicleDetailController {
    resolver: Arc<RelationResolver>,
    vehicle_id: String,
    interval: Duration,
    gate: Option<Arc<RateLimitMonitor>>,
    state: Arc<watch::Sender<DetailState>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for VehicleDetailController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VehicleDetailController")
            .field("vehicle_id", &self.vehicle_id)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl VehicleDetailController {
    /// Creates an idle controller for `vehicle_id`.
    pub fn new(resolver: Arc<RelationResolver>, vehicle_id: impl Into<String>, interval: Duration) -> Self {
        let (state, _) = watch::channel(DetailState::Loading);
        Self {
            resolver,
            vehicle_id: vehicle_id.into(),
            interval,
            gate: None,
            state: Arc::new(state),
            task: Mutex::new(None),
        }
    }

    /// Skips poll ticks while `monitor` is counting down.
    #[must_use]
    pub fn with_rate_limit_gate(mut self, monitor: Arc<RateLimitMonitor>) -> Self {
        self.gate = Some(monitor);
        self
    }

    /// Returns the vehicle id.
    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    /// Subscribes to detail states.
    pub fn subscribe(&self) -> watch::Receiver<DetailState> {
        self.state.subscribe()
    }

    /// Returns the latest state.
    pub fn current(&self) -> DetailState {
        self.state.borrow().clone()
    }

    /// Loads the vehicle and starts polling.
    ///
    /// Any running poll loop is stopped first. A blank id publishes
    /// [`DetailState::Empty`] without a request.
    pub fn start(&self) {
        let mut slot = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = slot.take() {
            task.abort();
        }

        if self.vehicle_id.trim().is_empty() {
            self.state.send_replace(DetailState::Empty);
            return;
        }

        self.state.send_replace(DetailState::Loading);
        *slot = Some(tokio::spawn(run(
            Arc::clone(&self.resolver),
            self.vehicle_id.clone(),
            self.interval,
            self.gate.clone(),
            Arc::clone(&self.state),
        )));
    }

    /// Starts over from [`DetailState::Loading`].
    pub fn retry(&self) {
        self.start();
    }

    /// Stops polling. The current state is kept.
    pub fn stop(&self) {
        if let Some(task) = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
            debug!(vehicle_id = %self.vehicle_id, "Polling stopped");
        }
    }
}

impl Drop for VehicleDetailController {
    fn drop(&mut self) {
        if let Some(task) = self
            .task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}

async fn run(
    resolver: Arc<RelationResolver>,
    vehicle_id: String,
    interval: Duration,
    gate: Option<Arc<RateLimitMonitor>>,
    state: Arc<watch::Sender<DetailState>>,
) {
    match resolver.resolve(&vehicle_id).await {
        Ok(detail) => {
            state.send_replace(DetailState::Loaded(Arc::new(detail)));
            info!(%vehicle_id, interval_ms = interval.as_millis(), "Polling started");
        }
        Err(err) => {
            warn!(%vehicle_id, error = %err, "Failed to load vehicle");
            state.send_replace(DetailState::from_error(&err));
            return;
        }
    }

    loop {
        tokio::time::sleep(interval).await;

        if gate.as_ref().is_some_and(|m| m.is_cooling_down()) {
            debug!(%vehicle_id, "Poll skipped while rate limited");
            continue;
        }

        match resolver.resolve(&vehicle_id).await {
            Ok(detail) => {
                state.send_replace(DetailState::Loaded(Arc::new(detail)));
            }
            Err(err) => {
                debug!(%vehicle_id, error = %err, "Poll failed, keeping last result");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RouteRepository;
    use crate::test_support::{detail, route, TestClock, FakeApi};
    use transitsync_fetch::{FetchError, TransitApi};

    fn controller(api: &Arc<FakeApi>, id: &str) -> VehicleDetailController {
        let dyn_api: Arc<dyn TransitApi> = api.clone();
        let resolver = RelationResolver::new(
            Arc::clone(&dyn_api),
            Arc::new(RouteRepository::new(dyn_api)),
        );
        VehicleDetailController::new(Arc::new(resolver), id, DEFAULT_POLL_INTERVAL)
    }

    fn seed(api: &FakeApi) {
        api.details
            .lock()
            .unwrap()
            .insert("y1".to_string(), detail("y1", Some("39"), None, None));
        api.routes.lock().unwrap().push(route("39", "39", "Back Bay"));
    }

    async fn settled(controller: &VehicleDetailController) -> DetailState {
        let mut rx = controller.subscribe();
        rx.wait_for(|s| *s != DetailState::Loading).await.unwrap().clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_loads_then_polls_every_interval() {
        let api = FakeApi::new();
        seed(&api);
        let controller = controller(&api, "y1");
        controller.start();

        let state = settled(&controller).await;
        assert_eq!(state.loaded().unwrap().vehicle.id, "y1");
        assert_eq!(api.count("vehicle"), 1);

        tokio::time::sleep(Duration::from_millis(5_100)).await;
        assert_eq!(api.count("vehicle"), 2);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(api.count("vehicle"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_failure_keeps_last_result() {
        let api = FakeApi::new();
        seed(&api);
        let controller = controller(&api, "y1");
        controller.start();
        let first = settled(&controller).await;

        api.fail("vehicle", FetchError::Transport("offline".to_string()));
        tokio::time::sleep(Duration::from_millis(5_100)).await;

        assert_eq!(api.count("vehicle"), 2);
        assert_eq!(controller.current(), first);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_failure_publishes_error() {
        let api = FakeApi::new();
        api.fail("vehicle", FetchError::Transport("offline".to_string()));
        let controller = controller(&api, "y1");
        controller.start();

        let state = settled(&controller).await;
        assert_eq!(
            state,
            DetailState::Error {
                message: "Network error".to_string(),
                is_network_error: true,
            }
        );

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(api.count("vehicle"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_restarts_from_loading() {
        let api = FakeApi::new();
        api.fail("vehicle", FetchError::Http {
            status: 500,
            message: "Internal Server Error".to_string(),
        });
        let controller = controller(&api, "y1");
        controller.start();
        assert!(matches!(settled(&controller).await, DetailState::Error { is_network_error: false, .. }));

        seed(&api);
        api.succeed("vehicle");
        let mut rx = controller.subscribe();
        controller.retry();
        assert_eq!(*rx.borrow_and_update(), DetailState::Loading);

        let state = settled(&controller).await;
        assert!(state.loaded().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_vehicle_is_empty() {
        let api = FakeApi::new();
        let controller = controller(&api, "missing");
        controller.start();
        assert_eq!(settled(&controller).await, DetailState::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_id_is_empty_without_request() {
        let api = FakeApi::new();
        let controller = controller(&api, "  ");
        controller.start();
        assert_eq!(controller.current(), DetailState::Empty);
        assert!(api.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_polling() {
        let api = FakeApi::new();
        seed(&api);
        let controller = controller(&api, "y1");
        controller.start();
        settled(&controller).await;

        controller.stop();
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(api.count("vehicle"), 1);
        assert!(controller.current().loaded().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_skips_ticks_while_cooling_down() {
        let api = FakeApi::new();
        seed(&api);
        let monitor = Arc::new(RateLimitMonitor::with_clock(TestClock::at(0)));
        let controller = controller(&api, "y1").with_rate_limit_gate(Arc::clone(&monitor));
        controller.start();
        settled(&controller).await;

        monitor.on_rate_limit(Some(12), "Rate limit has been reset.");
        tokio::time::sleep(Duration::from_millis(10_100)).await;
        assert_eq!(api.count("vehicle"), 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(api.count("vehicle"), 2);
    }
}
