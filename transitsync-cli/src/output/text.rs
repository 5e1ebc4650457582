//! Text output formatting with colors.

use transitsync_core::{RateLimitState, Route, Trip, Vehicle, VehicleDetailWithRelations, VehicleStatus};

use super::{format_timestamp, VehicleListOutput};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Formats the vehicle list.
    pub fn format_vehicles(&self, list: &VehicleListOutput) -> String {
        let mut lines = Vec::new();

        let mut header = format!("{} ({})", self.bold("Vehicles"), list.vehicles.len());
        if !list.filters.route_ids.is_empty() {
            let routes: Vec<&str> = list.filters.route_ids.iter().map(String::as_str).collect();
            header.push_str(&format!("  routes: {}", routes.join(", ")));
        }
        if !list.filters.trip_ids.is_empty() {
            let trips: Vec<&str> = list.filters.trip_ids.iter().map(String::as_str).collect();
            header.push_str(&format!("  trips: {}", trips.join(", ")));
        }
        lines.push(header);
        lines.push("─".repeat(60));

        if list.vehicles.is_empty() {
            lines.push(self.dim("No vehicles"));
        }
        for vehicle in &list.vehicles {
            lines.push(self.format_vehicle_line(vehicle));
        }

        if list.has_more {
            lines.push(String::new());
            lines.push(self.dim("More vehicles available (use --pages)"));
        }

        lines.join("\n")
    }

    /// Formats one vehicle row.
    pub fn format_vehicle_line(&self, vehicle: &Vehicle) -> String {
        format!(
            "{:<10} {} {:<24} {}",
            vehicle.label,
            self.status(vehicle.status, 11),
            vehicle.coordinates_label(),
            self.dim(&format_timestamp(&vehicle.updated_at)),
        )
    }

    /// Formats a vehicle with its relations.
    pub fn format_detail(&self, detail: &VehicleDetailWithRelations) -> String {
        let vehicle = &detail.vehicle;
        let mut lines = Vec::new();

        lines.push(format!(
            "{} {}",
            self.bold(&vehicle.label),
            self.dim(&format!("({})", vehicle.id))
        ));
        lines.push(format!("Status:    {}", self.status(vehicle.status, 0)));
        lines.push(format!("Position:  {}", vehicle.coordinates_label()));
        if let Some(bearing) = vehicle.bearing {
            lines.push(format!("Bearing:   {bearing}°"));
        }
        lines.push(format!("Updated:   {}", format_timestamp(&vehicle.updated_at)));

        let route = detail.route_label();
        if !route.is_empty() {
            lines.push(format!("Route:     {}", self.cyan(&route)));
        }
        if let Some(direction) = detail.direction_label() {
            lines.push(format!("Direction: {direction}"));
        }
        let trip = detail.trip_label();
        if !trip.is_empty() {
            lines.push(format!("Trip:      {trip}"));
        }
        let stop = detail.stop_label();
        if !stop.is_empty() {
            lines.push(format!("Stop:      {stop}"));
        }
        if let Some(shape) = &detail.shape {
            lines.push(format!(
                "Shape:     {} {}",
                shape.id,
                self.dim(&format!("({} chars)", shape.polyline.len()))
            ));
        }

        lines.join("\n")
    }

    /// Formats the route list.
    pub fn format_routes(&self, routes: &[Route]) -> String {
        if routes.is_empty() {
            return self.dim("No routes");
        }

        routes
            .iter()
            .map(|route| {
                let long = if route.long_name.trim().is_empty() || route.long_name == route.display_name() {
                    String::new()
                } else {
                    self.dim(&route.long_name)
                };
                format!("{:<12} {:<16} {}", route.id, route.display_name(), long)
                    .trim_end()
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Formats the trip list.
    pub fn format_trips(&self, trips: &[Trip]) -> String {
        if trips.is_empty() {
            return self.dim("No trips");
        }

        trips
            .iter()
            .map(|trip| {
                let headsign = if trip.headsign.trim().is_empty() {
                    String::new()
                } else {
                    format!("→ {}", trip.headsign)
                };
                format!("{:<36} {}", trip.display_label(), headsign)
                    .trim_end()
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Formats a rate-limit countdown.
    pub fn format_rate_limit(&self, state: &RateLimitState) -> String {
        if state.retry_enabled() {
            self.green(&state.message)
        } else {
            format!("{} {}", self.yellow(&state.message), self.bold(&state.countdown_label))
        }
    }

    /// Formats an error message.
    pub fn format_error(&self, error: &str) -> String {
        format!("{}: {error}", self.red("Error"))
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    fn status(&self, status: VehicleStatus, width: usize) -> String {
        let label = format!("{:<width$}", status.label());
        match status {
            VehicleStatus::StoppedAt => self.yellow(&label),
            VehicleStatus::InTransitTo | VehicleStatus::IncomingAt => self.green(&label),
            VehicleStatus::Unknown => self.dim(&label),
        }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }
}
