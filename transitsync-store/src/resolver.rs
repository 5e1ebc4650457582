//! Concurrent resolution of a vehicle and its related entities.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, instrument};

use transitsync_core::VehicleDetailWithRelations;
use transitsync_fetch::TransitApi;

use crate::error::StoreError;
use crate::repository::{
    RouteRepository, ShapeRepository, StopRepository, TripRepository, VehicleRepository,
};

/// Builds a [`VehicleDetailWithRelations`] from independent lookups.
///
/// Only the vehicle lookup can fail the whole resolution. Route, trip and
/// stop are fetched concurrently once the vehicle is known; the shape is
/// fetched as soon as the trip names one, while route and stop may still
/// be in flight. A relation whose id is absent is not requested, and a
/// relation whose lookup fails is left empty.
#[derive(Clone)]
pub struct RelationResolver {
    vehicles: VehicleRepository,
    routes: Arc<RouteRepository>,
    trips: TripRepository,
    stops: StopRepository,
    shapes: ShapeRepository,
}

impl fmt::Debug for RelationResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationResolver")
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

impl RelationResolver {
    /// Creates a resolver over `api`, sharing the given route cache.
    pub fn new(api: Arc<dyn TransitApi>, routes: Arc<RouteRepository>) -> Self {
        Self {
            vehicles: VehicleRepository::new(Arc::clone(&api)),
            routes,
            trips: TripRepository::new(Arc::clone(&api)),
            stops: StopRepository::new(Arc::clone(&api)),
            shapes: ShapeRepository::new(api),
        }
    }

    /// Resolves one vehicle with all of its relations.
    ///
    /// Dropping the returned future cancels every outstanding lookup.
    #[instrument(skip(self))]
    pub async fn resolve(&self, vehicle_id: &str) -> Result<VehicleDetailWithRelations, StoreError> {
        let vehicle = self.vehicles.vehicle_detail(vehicle_id).await?;

        let route = lookup("route", vehicle.route_id.as_deref(), |id| {
            self.routes.get_by_id(id)
        });
        let stop = lookup("stop", vehicle.stop_id.as_deref(), |id| self.stops.stop(id));
        let trip_and_shape = async {
            let trip = lookup("trip", vehicle.trip_id.as_deref(), |id| self.trips.trip(id)).await;
            let shape = lookup(
                "shape",
                trip.as_ref().and_then(|t| t.shape_id.as_deref()),
                |id| self.shapes.shape(id),
            )
            .await;
            (trip, shape)
        };

        let (route, stop, (trip, shape)) = tokio::join!(route, stop, trip_and_shape);

        debug!(
            route = route.is_some(),
            trip = trip.is_some(),
            stop = stop.is_some(),
            shape = shape.is_some(),
            "Vehicle resolved"
        );

        Ok(VehicleDetailWithRelations {
            vehicle,
            route,
            trip,
            stop,
            shape,
        })
    }
}

async fn lookup<'a, T, F, Fut>(kind: &'static str, id: Option<&'a str>, fetch: F) -> Option<T>
where
    F: FnOnce(&'a str) -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let id = id?;
    match fetch(id).await {
        Ok(value) => Some(value),
        Err(err) => {
            debug!(kind, id, error = %err, "Relation lookup failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{detail, route, shape, stop, trip, FakeApi};
    use std::time::Duration;
    use transitsync_fetch::FetchError;

    fn resolver(api: &Arc<FakeApi>) -> RelationResolver {
        let api: Arc<dyn TransitApi> = api.clone();
        RelationResolver::new(Arc::clone(&api), Arc::new(RouteRepository::new(api)))
    }

    fn seed_full(api: &FakeApi) {
        api.details.lock().unwrap().insert(
            "y1".to_string(),
            detail("y1", Some("39"), Some("t1"), Some("s1")),
        );
        api.routes
            .lock()
            .unwrap()
            .push(route("39", "39", "Forest Hills - Back Bay"));
        api.trips.lock().unwrap().push(trip("t1", Some("sh1")));
        api.stops.lock().unwrap().insert("s1".to_string(), stop("s1"));
        api.shapes.lock().unwrap().insert("sh1".to_string(), shape("sh1"));
    }

    #[tokio::test]
    async fn test_resolves_all_relations() {
        let api = FakeApi::new();
        seed_full(&api);

        let resolved = resolver(&api).resolve("y1").await.unwrap();

        assert_eq!(resolved.route.unwrap().id, "39");
        assert_eq!(resolved.trip.unwrap().id, "t1");
        assert_eq!(resolved.stop.unwrap().id, "s1");
        assert_eq!(resolved.shape.unwrap().polyline, "poly-sh1");
    }

    #[tokio::test]
    async fn test_vehicle_failure_fails_whole_call() {
        let api = FakeApi::new();
        seed_full(&api);
        api.fail("vehicle", FetchError::Transport("offline".to_string()));

        let err = resolver(&api).resolve("y1").await.unwrap_err();
        assert!(err.is_network_error());
        assert_eq!(api.count("route") + api.count("trip") + api.count("stop"), 0);
    }

    #[tokio::test]
    async fn test_stop_failure_still_succeeds() {
        let api = FakeApi::new();
        seed_full(&api);
        api.fail("stop", FetchError::Http {
            status: 500,
            message: "Internal Server Error".to_string(),
        });

        let resolved = resolver(&api).resolve("y1").await.unwrap();
        assert!(resolved.stop.is_none());
        assert!(resolved.route.is_some());
        assert!(resolved.trip.is_some());
        assert!(resolved.shape.is_some());
    }

    #[tokio::test]
    async fn test_absent_ids_are_not_requested() {
        let api = FakeApi::new();
        seed_full(&api);
        api.details
            .lock()
            .unwrap()
            .insert("y2".to_string(), detail("y2", None, Some("t1"), None));

        let resolved = resolver(&api).resolve("y2").await.unwrap();

        assert!(resolved.route.is_none());
        assert!(resolved.stop.is_none());
        assert_eq!(api.count("route"), 0);
        assert_eq!(api.count("stop"), 0);
        assert_eq!(api.count("trip"), 1);
    }

    #[tokio::test]
    async fn test_trip_without_shape_skips_shape_lookup() {
        let api = FakeApi::new();
        seed_full(&api);
        api.trips.lock().unwrap()[0].shape_id = None;

        let resolved = resolver(&api).resolve("y1").await.unwrap();
        assert!(resolved.trip.is_some());
        assert!(resolved.shape.is_none());
        assert_eq!(api.count("shape"), 0);
    }

    #[tokio::test]
    async fn test_trip_failure_skips_shape() {
        let api = FakeApi::new();
        seed_full(&api);
        api.fail("trip", FetchError::Decode("bad".to_string()));

        let resolved = resolver(&api).resolve("y1").await.unwrap();
        assert!(resolved.trip.is_none());
        assert!(resolved.shape.is_none());
        assert_eq!(api.count("shape"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shape_overlaps_slow_route() {
        let api = FakeApi::new();
        seed_full(&api);
        api.delay("route", Duration::from_millis(500));
        api.delay("stop", Duration::from_millis(500));
        api.delay("trip", Duration::from_millis(100));
        api.delay("shape", Duration::from_millis(100));

        let started = tokio::time::Instant::now();
        resolver(&api).resolve("y1").await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(600));
    }
}
