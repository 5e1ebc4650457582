//! Vehicle-related types.
//!
//! This module contains the live vehicle types:
//! - [`VehicleStatus`] - Where the vehicle is relative to its stop
//! - [`Vehicle`] - List entry for a live vehicle
//! - [`VehicleDetail`] - Single-vehicle record with relation ids
//! - [`VehicleDetailWithRelations`] - Detail plus resolved relations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::network::{Route, Shape, Stop, Trip};
use crate::error::CoreError;

/// Label used when the upstream record has no label.
pub const DEFAULT_VEHICLE_LABEL: &str = "Vehicle";

// ============================================================================
// Vehicle Status
// ============================================================================

/// Current status of a vehicle relative to its next stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    /// About to arrive at the stop.
    IncomingAt,
    /// Standing at the stop.
    StoppedAt,
    /// Departed the previous stop, in transit.
    InTransitTo,
    /// Status missing or not recognised.
    #[default]
    Unknown,
}

impl VehicleStatus {
    /// Parses the wire value leniently, mapping anything unrecognised to
    /// [`VehicleStatus::Unknown`].
    pub fn from_wire(raw: &str) -> Self {
        raw.parse().unwrap_or(Self::Unknown)
    }

    /// Returns the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IncomingAt => "INCOMING_AT",
            Self::StoppedAt => "STOPPED_AT",
            Self::InTransitTo => "IN_TRANSIT_TO",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Returns a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::IncomingAt => "Incoming",
            Self::StoppedAt => "Stopped",
            Self::InTransitTo => "In Transit",
            Self::Unknown => "Unknown",
        }
    }
}

impl FromStr for VehicleStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INCOMING_AT" => Ok(Self::IncomingAt),
            "STOPPED_AT" => Ok(Self::StoppedAt),
            "IN_TRANSIT_TO" => Ok(Self::InTransitTo),
            "UNKNOWN" => Ok(Self::Unknown),
            other => Err(CoreError::InvalidData(format!(
                "unknown vehicle status: {other}"
            ))),
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Vehicle
// ============================================================================

/// A live vehicle as returned by the paginated vehicle list.
///
/// Replaced wholesale on every fetch; there is no diffing between fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Upstream vehicle id.
    pub id: String,
    /// Public label (usually the fleet number).
    pub label: String,
    /// Current status.
    pub status: VehicleStatus,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Last update time as an ISO-8601 string.
    pub updated_at: String,
}

impl Vehicle {
    /// Returns the coordinates formatted with six decimals.
    pub fn coordinates_label(&self) -> String {
        format_coordinates(self.latitude, self.longitude)
    }
}

// ============================================================================
// Vehicle Detail
// ============================================================================

/// Single-vehicle record including the ids of its relations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleDetail {
    /// Upstream vehicle id.
    pub id: String,
    /// Public label.
    pub label: String,
    /// Current status.
    pub status: VehicleStatus,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Last update time as an ISO-8601 string.
    pub updated_at: String,
    /// Route the vehicle is serving.
    pub route_id: Option<String>,
    /// Trip the vehicle is running.
    pub trip_id: Option<String>,
    /// Stop the status refers to.
    pub stop_id: Option<String>,
    /// Compass bearing in degrees.
    pub bearing: Option<i32>,
    /// Travel direction (0 or 1).
    pub direction_id: Option<i32>,
}

impl VehicleDetail {
    /// Returns the list-level view of this vehicle.
    pub fn summary(&self) -> Vehicle {
        Vehicle {
            id: self.id.clone(),
            label: self.label.clone(),
            status: self.status,
            latitude: self.latitude,
            longitude: self.longitude,
            updated_at: self.updated_at.clone(),
        }
    }

    /// Returns the coordinates formatted with six decimals.
    pub fn coordinates_label(&self) -> String {
        format_coordinates(self.latitude, self.longitude)
    }
}

// ============================================================================
// Vehicle Detail With Relations
// ============================================================================

/// A vehicle detail together with its independently resolved relations.
///
/// Each relation is optional on its own: a relation that was not referenced,
/// or whose lookup failed, is `None` without affecting the others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleDetailWithRelations {
    /// The vehicle record.
    pub vehicle: VehicleDetail,
    /// The route, if resolved.
    pub route: Option<Route>,
    /// The trip, if resolved.
    pub trip: Option<Trip>,
    /// The stop, if resolved.
    pub stop: Option<Stop>,
    /// The trip's shape, if resolved.
    pub shape: Option<Shape>,
}

impl VehicleDetailWithRelations {
    /// Creates an aggregate with no relations resolved.
    pub fn bare(vehicle: VehicleDetail) -> Self {
        Self {
            vehicle,
            route: None,
            trip: None,
            stop: None,
            shape: None,
        }
    }

    /// Returns "short - long" for the route, or the raw route id.
    pub fn route_label(&self) -> String {
        let Some(route) = &self.route else {
            return self.vehicle.route_id.clone().unwrap_or_default();
        };

        let mut parts: Vec<&str> = Vec::with_capacity(2);
        for name in [route.short_name.trim(), route.long_name.trim()] {
            if !name.is_empty() && !parts.contains(&name) {
                parts.push(name);
            }
        }
        parts.join(" - ")
    }

    /// Returns the trip headsign, then name, then "Unscheduled".
    pub fn trip_label(&self) -> String {
        match &self.trip {
            Some(trip) => first_non_blank(&[&trip.headsign, &trip.name])
                .unwrap_or("Unscheduled")
                .to_string(),
            None => self.vehicle.trip_id.clone().unwrap_or_default(),
        }
    }

    /// Returns the stop name, or the raw stop id.
    pub fn stop_label(&self) -> String {
        match &self.stop {
            Some(stop) => stop.name.clone(),
            None => self.vehicle.stop_id.clone().unwrap_or_default(),
        }
    }

    /// Returns the travel direction as "from -> to".
    ///
    /// Requires a resolved route with at least two destinations and a known
    /// direction id. Direction 0 travels towards the first destination.
    pub fn direction_label(&self) -> Option<String> {
        let route = self.route.as_ref()?;
        let direction = self.vehicle.direction_id?;
        let [first, second, ..] = route.direction_destinations.as_slice() else {
            return None;
        };

        Some(if direction == 0 {
            format!("{second} -> {first}")
        } else {
            format!("{first} -> {second}")
        })
    }

    /// Returns the encoded polyline of the shape, or an empty string.
    pub fn encoded_polyline(&self) -> &str {
        self.shape.as_ref().map_or("", |s| s.polyline.as_str())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn format_coordinates(latitude: f64, longitude: f64) -> String {
    format!("{latitude:.6}, {longitude:.6}")
}

fn first_non_blank<'a>(candidates: &[&'a String]) -> Option<&'a str> {
    candidates
        .iter()
        .copied()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
}
