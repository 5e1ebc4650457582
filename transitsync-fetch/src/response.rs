//! JSON:API response documents and their mapping onto domain models.
//!
//! Every attribute is optional on the wire; missing values fall back to
//! the model defaults (blank strings, `0.0` coordinates, `"Vehicle"` label).

use serde::Deserialize;

use transitsync_core::{
    Route, Shape, Stop, Trip, Vehicle, VehicleDetail, VehicleStatus, DEFAULT_VEHICLE_LABEL,
};

// ============================================================================
// Document Envelope
// ============================================================================

/// Top-level JSON:API document.
#[derive(Debug, Deserialize)]
pub struct Document<T> {
    /// Primary data.
    pub data: T,
}

/// A single JSON:API resource object.
#[derive(Debug, Deserialize)]
pub struct Resource<A, R> {
    /// Resource id.
    pub id: String,
    /// Resource attributes.
    #[serde(default)]
    pub attributes: Option<A>,
    /// Resource relationships.
    #[serde(default)]
    pub relationships: Option<R>,
}

/// A to-one relationship.
#[derive(Debug, Default, Deserialize)]
pub struct Relationship {
    /// Linkage, `null` when the relation is not set.
    #[serde(default)]
    pub data: Option<ResourceIdentifier>,
}

/// Resource linkage inside a relationship.
#[derive(Debug, Deserialize)]
pub struct ResourceIdentifier {
    /// Related resource id.
    #[serde(default)]
    pub id: Option<String>,
    /// Related resource type.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

fn related_id(relationship: Option<&Relationship>) -> Option<String> {
    relationship
        .and_then(|r| r.data.as_ref())
        .and_then(|d| d.id.clone())
        .filter(|id| !id.is_empty())
}

/// Resource without relationships of interest.
#[derive(Debug, Default, Deserialize)]
pub struct NoRelationships {}

// ============================================================================
// Vehicle
// ============================================================================

/// Vehicle attributes.
#[derive(Debug, Default, Deserialize)]
pub struct VehicleAttributes {
    /// Public label.
    #[serde(default)]
    pub label: Option<String>,
    /// Raw status string.
    #[serde(default)]
    pub current_status: Option<String>,
    /// Latitude.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Longitude.
    #[serde(default)]
    pub longitude: Option<f64>,
    /// ISO-8601 update timestamp.
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Compass bearing.
    #[serde(default)]
    pub bearing: Option<f64>,
    /// Direction id.
    #[serde(default)]
    pub direction_id: Option<i32>,
}

/// Vehicle relationships.
#[derive(Debug, Default, Deserialize)]
pub struct VehicleRelationships {
    /// Route served.
    #[serde(default)]
    pub route: Option<Relationship>,
    /// Trip run.
    #[serde(default)]
    pub trip: Option<Relationship>,
    /// Stop referred to by the status.
    #[serde(default)]
    pub stop: Option<Relationship>,
}

/// Vehicle resource.
pub type VehicleResource = Resource<VehicleAttributes, VehicleRelationships>;

impl VehicleResource {
    /// Maps the resource onto a list entry.
    pub fn to_vehicle(&self) -> Vehicle {
        let attrs = self.attributes.as_ref();
        Vehicle {
            id: self.id.clone(),
            label: attrs
                .and_then(|a| a.label.clone())
                .unwrap_or_else(|| DEFAULT_VEHICLE_LABEL.to_string()),
            status: attrs
                .and_then(|a| a.current_status.as_deref())
                .map_or(VehicleStatus::Unknown, VehicleStatus::from_wire),
            latitude: attrs.and_then(|a| a.latitude).unwrap_or(0.0),
            longitude: attrs.and_then(|a| a.longitude).unwrap_or(0.0),
            updated_at: attrs
                .and_then(|a| a.updated_at.clone())
                .unwrap_or_default(),
        }
    }

    /// Maps the resource onto a detail record including relation ids.
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_vehicle_detail(&self) -> VehicleDetail {
        let summary = self.to_vehicle();
        let attrs = self.attributes.as_ref();
        let rels = self.relationships.as_ref();

        VehicleDetail {
            id: summary.id,
            label: summary.label,
            status: summary.status,
            latitude: summary.latitude,
            longitude: summary.longitude,
            updated_at: summary.updated_at,
            route_id: related_id(rels.and_then(|r| r.route.as_ref())),
            trip_id: related_id(rels.and_then(|r| r.trip.as_ref())),
            stop_id: related_id(rels.and_then(|r| r.stop.as_ref())),
            bearing: attrs.and_then(|a| a.bearing).map(|b| b.round() as i32),
            direction_id: attrs.and_then(|a| a.direction_id),
        }
    }
}

// ============================================================================
// Route
// ============================================================================

/// Route attributes.
#[derive(Debug, Default, Deserialize)]
pub struct RouteAttributes {
    /// Short name.
    #[serde(default)]
    pub short_name: Option<String>,
    /// Long name.
    #[serde(default)]
    pub long_name: Option<String>,
    /// Per-direction destinations.
    #[serde(default)]
    pub direction_destinations: Option<Vec<Option<String>>>,
}

/// Route resource.
pub type RouteResource = Resource<RouteAttributes, NoRelationships>;

impl RouteResource {
    /// Maps the resource onto a [`Route`].
    pub fn to_route(&self) -> Route {
        let attrs = self.attributes.as_ref();
        Route {
            id: self.id.clone(),
            short_name: attrs.and_then(|a| a.short_name.clone()).unwrap_or_default(),
            long_name: attrs.and_then(|a| a.long_name.clone()).unwrap_or_default(),
            direction_destinations: attrs
                .and_then(|a| a.direction_destinations.as_ref())
                .map(|d| d.iter().map(|s| s.clone().unwrap_or_default()).collect())
                .unwrap_or_default(),
        }
    }
}

// ============================================================================
// Trip
// ============================================================================

/// Trip attributes.
#[derive(Debug, Default, Deserialize)]
pub struct TripAttributes {
    /// Trip name.
    #[serde(default)]
    pub name: Option<String>,
    /// Headsign.
    #[serde(default)]
    pub headsign: Option<String>,
    /// Block id.
    #[serde(default)]
    pub block_id: Option<String>,
}

/// Trip relationships.
#[derive(Debug, Default, Deserialize)]
pub struct TripRelationships {
    /// Shape followed.
    #[serde(default)]
    pub shape: Option<Relationship>,
}

/// Trip resource.
pub type TripResource = Resource<TripAttributes, TripRelationships>;

impl TripResource {
    /// Maps the resource onto a [`Trip`].
    pub fn to_trip(&self) -> Trip {
        let attrs = self.attributes.as_ref();
        Trip {
            id: self.id.clone(),
            name: attrs.and_then(|a| a.name.clone()).unwrap_or_default(),
            headsign: attrs.and_then(|a| a.headsign.clone()).unwrap_or_default(),
            block_id: attrs.and_then(|a| a.block_id.clone()).unwrap_or_default(),
            shape_id: related_id(
                self.relationships
                    .as_ref()
                    .and_then(|r| r.shape.as_ref()),
            ),
        }
    }
}

// ============================================================================
// Stop
// ============================================================================

/// Stop attributes.
#[derive(Debug, Default, Deserialize)]
pub struct StopAttributes {
    /// Stop name.
    #[serde(default)]
    pub name: Option<String>,
    /// Latitude.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Longitude.
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Municipality.
    #[serde(default)]
    pub municipality: Option<String>,
    /// Platform code.
    #[serde(default)]
    pub platform_code: Option<String>,
}

/// Stop resource.
pub type StopResource = Resource<StopAttributes, NoRelationships>;

impl StopResource {
    /// Maps the resource onto a [`Stop`].
    pub fn to_stop(&self) -> Stop {
        let attrs = self.attributes.as_ref();
        Stop {
            id: self.id.clone(),
            name: attrs.and_then(|a| a.name.clone()).unwrap_or_default(),
            latitude: attrs.and_then(|a| a.latitude),
            longitude: attrs.and_then(|a| a.longitude),
            municipality: attrs.and_then(|a| a.municipality.clone()),
            platform_code: attrs.and_then(|a| a.platform_code.clone()),
        }
    }
}

// ============================================================================
// Shape
// ============================================================================

/// Shape attributes.
#[derive(Debug, Default, Deserialize)]
pub struct ShapeAttributes {
    /// Encoded polyline.
    #[serde(default)]
    pub polyline: Option<String>,
}

/// Shape resource.
pub type ShapeResource = Resource<ShapeAttributes, NoRelationships>;

impl ShapeResource {
    /// Maps the resource onto a [`Shape`].
    pub fn to_shape(&self) -> Shape {
        Shape {
            id: self.id.clone(),
            polyline: self
                .attributes
                .as_ref()
                .and_then(|a| a.polyline.clone())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vehicle_detail_mapping() {
        let doc: Document<VehicleResource> = serde_json::from_value(json!({
            "data": {
                "id": "y1808",
                "type": "vehicle",
                "attributes": {
                    "label": "1808",
                    "current_status": "IN_TRANSIT_TO",
                    "latitude": 42.35,
                    "longitude": -71.06,
                    "updated_at": "2024-05-01T12:00:00-04:00",
                    "bearing": 90,
                    "direction_id": 1
                },
                "relationships": {
                    "route": {"data": {"id": "39", "type": "route"}},
                    "trip": {"data": {"id": "t1", "type": "trip"}},
                    "stop": {"data": null}
                }
            }
        }))
        .unwrap();

        let detail = doc.data.to_vehicle_detail();
        assert_eq!(detail.label, "1808");
        assert_eq!(detail.status, VehicleStatus::InTransitTo);
        assert_eq!(detail.route_id.as_deref(), Some("39"));
        assert_eq!(detail.trip_id.as_deref(), Some("t1"));
        assert_eq!(detail.stop_id, None);
        assert_eq!(detail.bearing, Some(90));
        assert_eq!(detail.direction_id, Some(1));
    }

    #[test]
    fn test_vehicle_defaults_when_attributes_missing() {
        let doc: Document<Vec<VehicleResource>> =
            serde_json::from_value(json!({"data": [{"id": "v1"}]})).unwrap();

        let vehicle = doc.data[0].to_vehicle();
        assert_eq!(vehicle.label, DEFAULT_VEHICLE_LABEL);
        assert_eq!(vehicle.status, VehicleStatus::Unknown);
        assert!(vehicle.latitude.abs() < f64::EPSILON);
        assert_eq!(vehicle.updated_at, "");
    }

    #[test]
    fn test_unknown_status_is_lenient() {
        let doc: Document<VehicleResource> = serde_json::from_value(json!({
            "data": {"id": "v1", "attributes": {"current_status": "TELEPORTING"}}
        }))
        .unwrap();
        assert_eq!(doc.data.to_vehicle().status, VehicleStatus::Unknown);
    }

    #[test]
    fn test_trip_shape_from_relationship() {
        let doc: Document<TripResource> = serde_json::from_value(json!({
            "data": {
                "id": "t1",
                "attributes": {"name": "", "headsign": "Forest Hills", "block_id": "B1"},
                "relationships": {"shape": {"data": {"id": "s9", "type": "shape"}}}
            }
        }))
        .unwrap();

        let trip = doc.data.to_trip();
        assert_eq!(trip.headsign, "Forest Hills");
        assert_eq!(trip.shape_id.as_deref(), Some("s9"));
    }

    #[test]
    fn test_route_destinations_with_nulls() {
        let doc: Document<RouteResource> = serde_json::from_value(json!({
            "data": {
                "id": "Red",
                "attributes": {
                    "short_name": "",
                    "long_name": "Red Line",
                    "direction_destinations": ["Ashmont/Braintree", null]
                }
            }
        }))
        .unwrap();

        let route = doc.data.to_route();
        assert_eq!(route.long_name, "Red Line");
        assert_eq!(route.direction_destinations, vec!["Ashmont/Braintree", ""]);
    }

    #[test]
    fn test_stop_and_shape_mapping() {
        let stop: Document<StopResource> = serde_json::from_value(json!({
            "data": {"id": "place-pktrm", "attributes": {"name": "Park Street", "platform_code": null}}
        }))
        .unwrap();
        let stop = stop.data.to_stop();
        assert_eq!(stop.name, "Park Street");
        assert_eq!(stop.platform_code, None);

        let shape: Document<ShapeResource> = serde_json::from_value(json!({
            "data": {"id": "s1", "attributes": {"polyline": "abc"}}
        }))
        .unwrap();
        assert_eq!(shape.data.to_shape().polyline, "abc");
    }
}
