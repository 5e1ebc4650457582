//! In-memory upstream and clock used by the store tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use transitsync_core::{
    Clock, Route, Shape, Stop, Trip, Vehicle, VehicleDetail, VehicleStatus,
};
use transitsync_fetch::{FetchError, QueryParams, TransitApi};

// ============================================================================
// Clock
// ============================================================================

/// Clock that follows tokio time, so paused-time tests move it forward.
#[derive(Debug)]
pub(crate) struct TestClock {
    base: i64,
    start: Instant,
}

impl TestClock {
    pub(crate) fn at(base: i64) -> Arc<Self> {
        Arc::new(Self {
            base,
            start: Instant::now(),
        })
    }
}

impl Clock for TestClock {
    #[allow(clippy::cast_possible_wrap)]
    fn now_epoch_secs(&self) -> i64 {
        self.base + self.start.elapsed().as_secs() as i64
    }
}

// ============================================================================
// Fake API
// ============================================================================

/// One recorded upstream call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Call {
    pub op: &'static str,
    pub id: Option<String>,
    pub query: QueryParams,
    pub offset: u32,
}

#[derive(Default)]
pub(crate) struct FakeApi {
    pub vehicles: Mutex<Vec<Vehicle>>,
    pub details: Mutex<HashMap<String, VehicleDetail>>,
    pub routes: Mutex<Vec<Route>>,
    pub trips: Mutex<Vec<Trip>>,
    pub stops: Mutex<HashMap<String, Stop>>,
    pub shapes: Mutex<HashMap<String, Shape>>,
    failures: Mutex<HashMap<&'static str, FetchError>>,
    delays: Mutex<HashMap<&'static str, Duration>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeApi {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn fail(&self, op: &'static str, err: FetchError) {
        self.failures.lock().unwrap().insert(op, err);
    }

    pub(crate) fn succeed(&self, op: &'static str) {
        self.failures.lock().unwrap().remove(op);
    }

    pub(crate) fn delay(&self, op: &'static str, delay: Duration) {
        self.delays.lock().unwrap().insert(op, delay);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, op: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.op == op).count()
    }

    pub(crate) fn last(&self, op: &str) -> Option<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|c| c.op == op)
            .cloned()
    }

    async fn enter(
        &self,
        op: &'static str,
        id: Option<&str>,
        query: &QueryParams,
        offset: u32,
    ) -> Result<(), FetchError> {
        self.calls.lock().unwrap().push(Call {
            op,
            id: id.map(str::to_string),
            query: query.clone(),
            offset,
        });

        let delay = self.delays.lock().unwrap().get(op).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.failures.lock().unwrap().get(op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn window<T: Clone>(items: &[T], offset: u32, limit: u32) -> Vec<T> {
    items
        .iter()
        .skip(offset as usize)
        .take(limit as usize)
        .cloned()
        .collect()
}

fn not_found(kind: &str, id: &str) -> FetchError {
    FetchError::Http {
        status: 404,
        message: format!("{kind} {id} not found"),
    }
}

#[async_trait]
impl TransitApi for FakeApi {
    async fn vehicles(
        &self,
        filters: &QueryParams,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Vehicle>, FetchError> {
        self.enter("vehicles", None, filters, offset).await?;
        Ok(window(&self.vehicles.lock().unwrap(), offset, limit))
    }

    async fn vehicle(&self, id: &str) -> Result<VehicleDetail, FetchError> {
        self.enter("vehicle", Some(id), &QueryParams::new(), 0).await?;
        self.details
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("vehicle", id))
    }

    async fn routes(&self, offset: u32, limit: u32) -> Result<Vec<Route>, FetchError> {
        self.enter("routes", None, &QueryParams::new(), offset).await?;
        Ok(window(&self.routes.lock().unwrap(), offset, limit))
    }

    async fn route(&self, id: &str) -> Result<Route, FetchError> {
        self.enter("route", Some(id), &QueryParams::new(), 0).await?;
        self.routes
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| not_found("route", id))
    }

    async fn trips(
        &self,
        filters: &QueryParams,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Trip>, FetchError> {
        self.enter("trips", None, filters, offset).await?;
        Ok(window(&self.trips.lock().unwrap(), offset, limit))
    }

    async fn trip(&self, id: &str) -> Result<Trip, FetchError> {
        self.enter("trip", Some(id), &QueryParams::new(), 0).await?;
        self.trips
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| not_found("trip", id))
    }

    async fn stop(&self, id: &str) -> Result<Stop, FetchError> {
        self.enter("stop", Some(id), &QueryParams::new(), 0).await?;
        self.stops
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("stop", id))
    }

    async fn shape(&self, id: &str) -> Result<Shape, FetchError> {
        self.enter("shape", Some(id), &QueryParams::new(), 0).await?;
        self.shapes
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("shape", id))
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub(crate) fn vehicle(id: &str) -> Vehicle {
    Vehicle {
        id: id.to_string(),
        label: format!("Bus {id}"),
        status: VehicleStatus::InTransitTo,
        latitude: 42.35,
        longitude: -71.06,
        updated_at: "2024-01-15T14:30:00Z".to_string(),
    }
}

pub(crate) fn vehicles(count: usize) -> Vec<Vehicle> {
    (0..count).map(|i| vehicle(&format!("v{i}"))).collect()
}

pub(crate) fn detail(
    id: &str,
    route_id: Option<&str>,
    trip_id: Option<&str>,
    stop_id: Option<&str>,
) -> VehicleDetail {
    VehicleDetail {
        id: id.to_string(),
        label: format!("Bus {id}"),
        status: VehicleStatus::StoppedAt,
        latitude: 42.35,
        longitude: -71.06,
        updated_at: "2024-01-15T14:30:00Z".to_string(),
        route_id: route_id.map(str::to_string),
        trip_id: trip_id.map(str::to_string),
        stop_id: stop_id.map(str::to_string),
        bearing: Some(90),
        direction_id: Some(0),
    }
}

pub(crate) fn route(id: &str, short_name: &str, long_name: &str) -> Route {
    Route {
        id: id.to_string(),
        short_name: short_name.to_string(),
        long_name: long_name.to_string(),
        direction_destinations: vec!["Outbound".to_string(), "Inbound".to_string()],
    }
}

pub(crate) fn trip(id: &str, shape_id: Option<&str>) -> Trip {
    Trip {
        id: id.to_string(),
        name: String::new(),
        headsign: format!("Headsign {id}"),
        block_id: "B1".to_string(),
        shape_id: shape_id.map(str::to_string),
    }
}

pub(crate) fn stop(id: &str) -> Stop {
    Stop {
        id: id.to_string(),
        name: format!("Stop {id}"),
        latitude: Some(42.0),
        longitude: Some(-71.0),
        municipality: Some("Boston".to_string()),
        platform_code: None,
    }
}

pub(crate) fn shape(id: &str) -> Shape {
    Shape {
        id: id.to_string(),
        polyline: format!("poly-{id}"),
    }
}
