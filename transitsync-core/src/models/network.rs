//! Transit network entities referenced by vehicles.
//!
//! - [`Route`] - A route with its direction destinations
//! - [`Trip`] - A scheduled trip, optionally linked to a [`Shape`]
//! - [`Stop`] - A stop or platform
//! - [`Shape`] - An encoded polyline

use serde::{Deserialize, Serialize};

// ============================================================================
// Route
// ============================================================================

/// A transit route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Upstream route id.
    pub id: String,
    /// Short public name (e.g. "39"), may be blank.
    pub short_name: String,
    /// Long descriptive name, may be blank.
    pub long_name: String,
    /// Endpoint names per direction, used to derive a travel-direction label.
    #[serde(default)]
    pub direction_destinations: Vec<String>,
}

impl Route {
    /// Returns the sort key: short name, or long name when short is blank.
    pub fn sort_key(&self) -> &str {
        if self.short_name.trim().is_empty() {
            &self.long_name
        } else {
            &self.short_name
        }
    }

    /// Returns the short name, then long name, then id.
    pub fn display_name(&self) -> &str {
        [self.short_name.as_str(), self.long_name.as_str()]
            .into_iter()
            .find(|s| !s.trim().is_empty())
            .unwrap_or(self.id.as_str())
    }
}

// ============================================================================
// Trip
// ============================================================================

/// A scheduled trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    /// Upstream trip id.
    pub id: String,
    /// Trip name, may be blank.
    pub name: String,
    /// Destination shown on the vehicle.
    pub headsign: String,
    /// Block the trip belongs to.
    pub block_id: String,
    /// Shape the trip follows.
    pub shape_id: Option<String>,
}

impl Trip {
    /// Returns a picker label of the form "primary • id".
    pub fn display_label(&self) -> String {
        let primary = [self.name.as_str(), self.headsign.as_str()]
            .into_iter()
            .find(|s| !s.trim().is_empty())
            .unwrap_or(self.id.as_str());

        if primary == self.id {
            self.id.clone()
        } else {
            format!("{primary} • {}", self.id)
        }
    }
}

// ============================================================================
// Stop
// ============================================================================

/// A stop or platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    /// Upstream stop id.
    pub id: String,
    /// Stop name.
    pub name: String,
    /// Latitude in degrees.
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    pub longitude: Option<f64>,
    /// Municipality.
    pub municipality: Option<String>,
    /// Platform code.
    pub platform_code: Option<String>,
}

// ============================================================================
// Shape
// ============================================================================

/// A route shape as an encoded polyline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    /// Upstream shape id.
    pub id: String,
    /// Google encoded polyline.
    pub polyline: String,
}
