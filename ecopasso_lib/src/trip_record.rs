use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::transport_mode::TransportMode;

/// Fuel types the backend understands for car trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FuelType {
    #[default]
    #[serde(rename = "benzina")]
    Gasoline,
    #[serde(rename = "diesel")]
    Diesel,
    #[serde(rename = "elettrico")]
    Electric,
    #[serde(rename = "ibrido")]
    Hybrid,
}

/// Extra details the user supplies when the inferred mode is Car.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarDetails {
    pub fuel_type: FuelType,
    pub occupants: u32,
}

impl CarDetails {
    /// Occupant count is clamped rather than rejected; the entry field
    /// allows at most two digits.
    pub fn new(fuel_type: FuelType, occupants: u32) -> Self {
        Self {
            fuel_type,
            occupants: occupants.clamp(1, 99),
        }
    }
}

/// The finalized, immutable output of a trip session. Field names are
/// the backend's wire contract; car fields are present only for car
/// trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub distance: f64,
    pub transport: TransportMode,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "fuelType", skip_serializing_if = "Option::is_none", default)]
    pub fuel_type: Option<FuelType>,
    #[serde(rename = "peopleInCar", skip_serializing_if = "Option::is_none", default)]
    pub people_in_car: Option<u32>,
}

impl TripRecord {
    /// Snapshots a finished session. Distance is rounded to two decimals
    /// here, at the presentation boundary.
    pub fn new(distance_km: f64, transport: TransportMode, timestamp: DateTime<Utc>) -> Self {
        Self {
            distance: (distance_km * 100.0).round() / 100.0,
            transport,
            timestamp,
            fuel_type: None,
            people_in_car: None,
        }
    }

    /// Attaches user-supplied car details. Ignored unless the record's
    /// transport is actually Car.
    pub fn with_car_details(mut self, details: CarDetails) -> Self {
        if self.transport.is_car() {
            self.fuel_type = Some(details.fuel_type);
            self.people_in_car = Some(details.occupants);
        }
        self
    }
}
