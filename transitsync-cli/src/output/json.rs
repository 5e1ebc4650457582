//! JSON output formatting.

use anyhow::Result;
use serde::Serialize;

use transitsync_core::{Route, Shape, Stop, Trip, Vehicle, VehicleDetail, VehicleDetailWithRelations, VehicleFilters};

// ============================================================================
// Output Types
// ============================================================================

/// JSON output of the vehicles command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleListOutput {
    pub filters: VehicleFilters,
    pub vehicles: Vec<Vehicle>,
    pub has_more: bool,
}

impl VehicleListOutput {
    /// Creates the output for one listing.
    pub fn new(filters: &VehicleFilters, vehicles: &[Vehicle], has_more: bool) -> Self {
        Self {
            filters: filters.clone(),
            vehicles: vehicles.to_vec(),
            has_more,
        }
    }
}

/// JSON output of the vehicle command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailOutput {
    pub vehicle: VehicleDetail,
    pub route_label: String,
    pub trip_label: String,
    pub stop_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<Route>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip: Option<Trip>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Stop>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<Shape>,
}

impl From<&VehicleDetailWithRelations> for DetailOutput {
    fn from(detail: &VehicleDetailWithRelations) -> Self {
        Self {
            vehicle: detail.vehicle.clone(),
            route_label: detail.route_label(),
            trip_label: detail.trip_label(),
            stop_label: detail.stop_label(),
            direction: detail.direction_label(),
            route: detail.route.clone(),
            trip: detail.trip.clone(),
            stop: detail.stop.clone(),
            shape: detail.shape.clone(),
        }
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }
}
