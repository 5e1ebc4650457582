//! Integration tests for core model types.

use transitsync_core::{
    format_countdown, Route, Shape, Trip, VehicleDetail, VehicleDetailWithRelations,
    VehicleStatus,
};

fn detail(direction_id: Option<i32>) -> VehicleDetail {
    VehicleDetail {
        id: "y1".to_string(),
        label: "1801".to_string(),
        status: VehicleStatus::IncomingAt,
        latitude: 42.0,
        longitude: -71.0,
        updated_at: "2024-05-01T12:00:00Z".to_string(),
        route_id: Some("Red".to_string()),
        trip_id: Some("t1".to_string()),
        stop_id: None,
        bearing: Some(180),
        direction_id,
    }
}

#[test]
fn test_fully_resolved_aggregate_labels() {
    let aggregate = VehicleDetailWithRelations {
        vehicle: detail(Some(1)),
        route: Some(Route {
            id: "Red".to_string(),
            short_name: String::new(),
            long_name: "Red Line".to_string(),
            direction_destinations: vec!["Ashmont/Braintree".to_string(), "Alewife".to_string()],
        }),
        trip: Some(Trip {
            id: "t1".to_string(),
            name: String::new(),
            headsign: "Alewife".to_string(),
            block_id: "b1".to_string(),
            shape_id: Some("s1".to_string()),
        }),
        stop: None,
        shape: Some(Shape {
            id: "s1".to_string(),
            polyline: "_p~iF~ps|U".to_string(),
        }),
    };

    assert_eq!(aggregate.route_label(), "Red Line");
    assert_eq!(aggregate.trip_label(), "Alewife");
    assert_eq!(aggregate.stop_label(), "");
    assert_eq!(
        aggregate.direction_label().as_deref(),
        Some("Ashmont/Braintree -> Alewife")
    );
    assert_eq!(aggregate.encoded_polyline(), "_p~iF~ps|U");
}

#[test]
fn test_countdown_label_is_zero_padded() {
    assert_eq!(format_countdown(9), "00:09");
    assert_eq!(format_countdown(61), "01:01");
}
