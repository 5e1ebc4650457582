//! Filter value objects.
//!
//! Set members are kept in a [`BTreeSet`] so iteration order is always
//! sorted; identical selections therefore compare equal and produce the
//! same query regardless of insertion order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// Vehicle Filters
// ============================================================================

/// Filters applied to the vehicle list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VehicleFilters {
    /// Selected route ids.
    #[serde(default)]
    pub route_ids: BTreeSet<String>,
    /// Selected trip ids.
    #[serde(default)]
    pub trip_ids: BTreeSet<String>,
}

impl VehicleFilters {
    /// Creates filters from any iterables of ids.
    pub fn new<R, T>(route_ids: R, trip_ids: T) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            route_ids: route_ids.into_iter().map(Into::into).collect(),
            trip_ids: trip_ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true when nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.route_ids.is_empty() && self.trip_ids.is_empty()
    }
}

// ============================================================================
// Trip Filters
// ============================================================================

/// Filters driving the trip picker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TripFilters {
    /// Selected route ids.
    #[serde(default)]
    pub route_ids: BTreeSet<String>,
    /// Free-text trip name query.
    #[serde(default)]
    pub name_query: String,
}

impl TripFilters {
    /// Creates filters from route ids and a name query.
    pub fn new<R>(route_ids: R, name_query: impl Into<String>) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            route_ids: route_ids.into_iter().map(Into::into).collect(),
            name_query: name_query.into(),
        }
    }

    /// Returns true when no route is selected and the query is blank.
    pub fn is_empty(&self) -> bool {
        self.route_ids.is_empty() && self.name_query.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_filters_empty() {
        assert!(VehicleFilters::default().is_empty());
        assert!(!VehicleFilters::new(["route-1"], Vec::<String>::new()).is_empty());
        assert!(!VehicleFilters::new(Vec::<String>::new(), ["trip-1"]).is_empty());
    }

    #[test]
    fn test_trip_filters_blank_query_is_empty() {
        assert!(TripFilters::new(Vec::<String>::new(), "   ").is_empty());
        assert!(!TripFilters::new(Vec::<String>::new(), "red").is_empty());
        assert!(!TripFilters::new(["route-1"], "").is_empty());
    }

    #[test]
    fn test_filters_equal_under_permutation() {
        let a = VehicleFilters::new(["route-2", "route-1"], ["b", "a"]);
        let b = VehicleFilters::new(["route-1", "route-2"], ["a", "b"]);
        assert_eq!(a, b);
    }
}
