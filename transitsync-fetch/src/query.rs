//! Translation of filter values into upstream query parameters.
//!
//! Filters hold their ids in ordered sets, so the produced parameters are
//! identical for identical selections regardless of the order in which ids
//! were added.

use std::collections::BTreeMap;

use transitsync_core::{TripFilters, VehicleFilters};

/// Query parameters sent with a list request, ordered by key.
pub type QueryParams = BTreeMap<String, String>;

/// Route filter parameter.
pub const FILTER_ROUTE: &str = "filter[route]";
/// Trip filter parameter.
pub const FILTER_TRIP: &str = "filter[trip]";
/// Trip name filter parameter.
pub const FILTER_NAME: &str = "filter[name]";

/// Builds [`QueryParams`] from filter values.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryBuilder;

impl QueryBuilder {
    /// Builds the query for the vehicle list.
    ///
    /// Empty filters produce an empty map.
    pub fn vehicles(filters: &VehicleFilters) -> QueryParams {
        let mut params = QueryParams::new();
        insert_joined(&mut params, FILTER_ROUTE, &filters.route_ids);
        insert_joined(&mut params, FILTER_TRIP, &filters.trip_ids);
        params
    }

    /// Builds the query for the trip picker.
    ///
    /// The name query is trimmed and omitted when blank.
    pub fn trips(filters: &TripFilters) -> QueryParams {
        let mut params = QueryParams::new();
        insert_joined(&mut params, FILTER_ROUTE, &filters.route_ids);

        let name = filters.name_query.trim();
        if !name.is_empty() {
            params.insert(FILTER_NAME.to_string(), name.to_string());
        }
        params
    }
}

/// Conversion of a filter value into query parameters.
pub trait ToQuery {
    /// Returns the query parameters for this filter value.
    fn to_query(&self) -> QueryParams;
}

impl ToQuery for VehicleFilters {
    fn to_query(&self) -> QueryParams {
        QueryBuilder::vehicles(self)
    }
}

impl ToQuery for TripFilters {
    fn to_query(&self) -> QueryParams {
        QueryBuilder::trips(self)
    }
}

fn insert_joined<'a>(
    params: &mut QueryParams,
    key: &str,
    ids: impl IntoIterator<Item = &'a String>,
) {
    let joined = ids
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(",");
    if !joined.is_empty() {
        params.insert(key.to_string(), joined);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filters_produce_empty_query() {
        assert!(QueryBuilder::vehicles(&VehicleFilters::default()).is_empty());
        assert!(QueryBuilder::trips(&TripFilters::default()).is_empty());
    }

    #[test]
    fn test_vehicle_query_joins_sorted_ids() {
        let filters = VehicleFilters::new(["Red", "Blue"], ["t2", "t1"]);
        let query = QueryBuilder::vehicles(&filters);

        assert_eq!(query.len(), 2);
        assert_eq!(query[FILTER_ROUTE], "Blue,Red");
        assert_eq!(query[FILTER_TRIP], "t1,t2");
    }

    #[test]
    fn test_vehicle_query_is_order_independent() {
        let a = VehicleFilters::new(["1", "39", "Red"], Vec::<String>::new());
        let b = VehicleFilters::new(["Red", "1", "39"], Vec::<String>::new());
        assert_eq!(QueryBuilder::vehicles(&a), QueryBuilder::vehicles(&b));
    }

    #[test]
    fn test_vehicle_query_omits_empty_trip_set() {
        let filters = VehicleFilters::new(["Red"], Vec::<String>::new());
        let query = QueryBuilder::vehicles(&filters);
        assert_eq!(query.len(), 1);
        assert!(!query.contains_key(FILTER_TRIP));
    }

    #[test]
    fn test_trip_query_trims_name() {
        let filters = TripFilters::new(["B", "A"], "  Harvard  ");
        let query = QueryBuilder::trips(&filters);

        assert_eq!(query[FILTER_ROUTE], "A,B");
        assert_eq!(query[FILTER_NAME], "Harvard");
    }

    #[test]
    fn test_trip_query_omits_blank_name() {
        let filters = TripFilters::new(["A"], "   ");
        let query = QueryBuilder::trips(&filters);
        assert_eq!(query.len(), 1);
        assert!(!query.contains_key(FILTER_NAME));
    }
}
