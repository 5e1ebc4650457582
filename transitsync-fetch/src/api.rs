//! The upstream transit API seam.
//!
//! [`TransitApi`] is the boundary every repository and page source talks
//! to. [`ApiClient`] implements it over HTTP; tests substitute in-memory
//! fakes.

use async_trait::async_trait;

use transitsync_core::{Route, Shape, Stop, Trip, Vehicle, VehicleDetail};

use crate::client::ApiClient;
use crate::error::FetchError;
use crate::query::QueryParams;
use crate::response::{
    Document, RouteResource, ShapeResource, StopResource, TripResource, VehicleResource,
};

// ============================================================================
// Constants
// ============================================================================

const VEHICLE_LIST_FIELDS: &str = "label,current_status,latitude,longitude,updated_at";
const VEHICLE_DETAIL_FIELDS: &str =
    "label,current_status,latitude,longitude,updated_at,bearing,direction_id,route,trip,stop";
const VEHICLE_DETAIL_INCLUDE: &str = "route,trip,stop";
const TRIP_LIST_FIELDS: &str = "name,headsign,block_id";
const TRIP_DETAIL_FIELDS: &str = "name,headsign,block_id,direction_id,shape";
const STOP_FIELDS: &str = "name,latitude,longitude,municipality,platform_code";
const ROUTE_FIELDS: &str = "short_name,long_name,direction_destinations";

// ============================================================================
// Trait
// ============================================================================

/// Operations offered by the upstream transit API.
#[async_trait]
pub trait TransitApi: Send + Sync {
    /// Lists vehicles matching `filters`.
    async fn vehicles(
        &self,
        filters: &QueryParams,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Vehicle>, FetchError>;

    /// Fetches one vehicle with its relation ids.
    async fn vehicle(&self, id: &str) -> Result<VehicleDetail, FetchError>;

    /// Lists routes.
    async fn routes(&self, offset: u32, limit: u32) -> Result<Vec<Route>, FetchError>;

    /// Fetches one route.
    async fn route(&self, id: &str) -> Result<Route, FetchError>;

    /// Lists trips matching `filters`.
    async fn trips(
        &self,
        filters: &QueryParams,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Trip>, FetchError>;

    /// Fetches one trip.
    async fn trip(&self, id: &str) -> Result<Trip, FetchError>;

    /// Fetches one stop.
    async fn stop(&self, id: &str) -> Result<Stop, FetchError>;

    /// Fetches one shape.
    async fn shape(&self, id: &str) -> Result<Shape, FetchError>;
}

// ============================================================================
// HTTP Implementation
// ============================================================================

fn page_query(filters: &QueryParams, offset: u32, limit: u32) -> QueryParams {
    let mut query = filters.clone();
    query.insert("page[offset]".to_string(), offset.to_string());
    query.insert("page[limit]".to_string(), limit.to_string());
    query
}

fn fields(resource: &str, value: &str) -> (String, String) {
    (format!("fields[{resource}]"), value.to_string())
}

#[async_trait]
impl TransitApi for ApiClient {
    async fn vehicles(
        &self,
        filters: &QueryParams,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Vehicle>, FetchError> {
        let mut query = page_query(filters, offset, limit);
        query.extend([fields("vehicle", VEHICLE_LIST_FIELDS)]);

        let doc: Document<Vec<VehicleResource>> = self.get_json(&["vehicles"], &query).await?;
        Ok(doc.data.iter().map(VehicleResource::to_vehicle).collect())
    }

    async fn vehicle(&self, id: &str) -> Result<VehicleDetail, FetchError> {
        let mut query = QueryParams::new();
        query.insert("include".to_string(), VEHICLE_DETAIL_INCLUDE.to_string());
        query.extend([fields("vehicle", VEHICLE_DETAIL_FIELDS)]);

        let doc: Document<VehicleResource> = self.get_json(&["vehicles", id], &query).await?;
        Ok(doc.data.to_vehicle_detail())
    }

    async fn routes(&self, offset: u32, limit: u32) -> Result<Vec<Route>, FetchError> {
        let mut query = page_query(&QueryParams::new(), offset, limit);
        query.extend([fields("route", ROUTE_FIELDS)]);

        let doc: Document<Vec<RouteResource>> = self.get_json(&["routes"], &query).await?;
        Ok(doc.data.iter().map(RouteResource::to_route).collect())
    }

    async fn route(&self, id: &str) -> Result<Route, FetchError> {
        let query = QueryParams::from([fields("route", ROUTE_FIELDS)]);

        let doc: Document<RouteResource> = self.get_json(&["routes", id], &query).await?;
        Ok(doc.data.to_route())
    }

    async fn trips(
        &self,
        filters: &QueryParams,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Trip>, FetchError> {
        let mut query = page_query(filters, offset, limit);
        query.extend([fields("trip", TRIP_LIST_FIELDS)]);

        let doc: Document<Vec<TripResource>> = self.get_json(&["trips"], &query).await?;
        Ok(doc.data.iter().map(TripResource::to_trip).collect())
    }

    async fn trip(&self, id: &str) -> Result<Trip, FetchError> {
        let query = QueryParams::from([fields("trip", TRIP_DETAIL_FIELDS)]);

        let doc: Document<TripResource> = self.get_json(&["trips", id], &query).await?;
        Ok(doc.data.to_trip())
    }

    async fn stop(&self, id: &str) -> Result<Stop, FetchError> {
        let query = QueryParams::from([fields("stop", STOP_FIELDS)]);

        let doc: Document<StopResource> = self.get_json(&["stops", id], &query).await?;
        Ok(doc.data.to_stop())
    }

    async fn shape(&self, id: &str) -> Result<Shape, FetchError> {
        let doc: Document<ShapeResource> =
            self.get_json(&["shapes", id], &QueryParams::new()).await?;
        Ok(doc.data.to_shape())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_keeps_filters() {
        let filters = QueryParams::from([("filter[route]".to_string(), "Red".to_string())]);
        let query = page_query(&filters, 20, 10);

        assert_eq!(query["filter[route]"], "Red");
        assert_eq!(query["page[offset]"], "20");
        assert_eq!(query["page[limit]"], "10");
    }

    #[test]
    fn test_fields_param_name() {
        let (key, value) = fields("stop", STOP_FIELDS);
        assert_eq!(key, "fields[stop]");
        assert!(value.contains("platform_code"));
    }
}
