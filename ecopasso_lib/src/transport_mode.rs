use std::fmt;

use serde::{Deserialize, Serialize};

/// Transport method inferred from the instantaneous speed between two
/// consecutive fixes. Wire names match what the backend expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransportMode {
    #[serde(rename = "Walk")]
    Walking,
    #[serde(rename = "Bike")]
    Bicycle,
    Car,
    #[default]
    Unknown,
}

impl TransportMode {
    /// Threshold lookup. Boundaries belong to the faster bucket, so
    /// exactly 5 km/h is a bicycle and exactly 15 km/h is a car.
    ///
    /// Returns `None` for non-finite or negative speeds (zero elapsed
    /// time between fixes, or clock skew); the caller keeps its previous
    /// mode in that case.
    pub fn from_speed(speed_kmh: f64) -> Option<Self> {
        if !speed_kmh.is_finite() || speed_kmh < 0.0 {
            return None;
        }

        Some(if speed_kmh < 5.0 {
            TransportMode::Walking
        } else if speed_kmh < 15.0 {
            TransportMode::Bicycle
        } else {
            TransportMode::Car
        })
    }

    pub fn is_car(self) -> bool {
        self == TransportMode::Car
    }

    pub fn label(self) -> &'static str {
        match self {
            TransportMode::Walking => "Walk",
            TransportMode::Bicycle => "Bike",
            TransportMode::Car => "Car",
            TransportMode::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
