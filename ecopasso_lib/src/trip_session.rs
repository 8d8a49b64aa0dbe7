use chrono::{DateTime, Utc};

use crate::{
    location_point::{distance_km, LocationPoint},
    transport_mode::TransportMode,
    trip_record::TripRecord,
};

/// Deltas at or below this are treated as GPS jitter and must not move
/// the distance counter or the movement timestamp.
pub const NOISE_FLOOR_KM: f64 = 0.01;

/// Mutable state for one trip in progress. Owned exclusively by the
/// session manager; distance only ever grows, and only when a delta
/// clears the noise floor.
#[derive(Debug, Clone)]
pub struct TripSession {
    accumulated_km: f64,
    last_point: LocationPoint,
    last_movement: DateTime<Utc>,
    mode: TransportMode,
}

impl TripSession {
    /// Opens a session from its first fix.
    pub fn start(first: LocationPoint) -> Self {
        Self {
            accumulated_km: 0.0,
            last_movement: first.timestamp,
            last_point: first,
            mode: TransportMode::Unknown,
        }
    }

    /// Folds one fix into the session. Fixes must arrive in order; the
    /// delta is always computed against the immediately preceding point.
    pub fn ingest(&mut self, fix: LocationPoint) {
        let delta = distance_km(&self.last_point, &fix);

        if delta > NOISE_FLOOR_KM {
            self.accumulated_km += delta;
            self.last_movement = fix.timestamp;

            let elapsed_hours = (fix.timestamp - self.last_point.timestamp).num_milliseconds()
                as f64
                / 3_600_000.0;
            // Sticky mode: an indeterminate speed keeps the previous value.
            if let Some(mode) = TransportMode::from_speed(delta / elapsed_hours) {
                self.mode = mode;
            }
        }

        self.last_point = fix;
    }

    pub fn distance_km(&self) -> f64 {
        self.accumulated_km
    }

    pub fn mode(&self) -> TransportMode {
        self.mode
    }

    pub fn last_movement(&self) -> DateTime<Utc> {
        self.last_movement
    }

    /// True once nothing has moved for longer than `timeout`.
    pub fn idle_since(&self, now: DateTime<Utc>, timeout: chrono::Duration) -> bool {
        now.signed_duration_since(self.last_movement) > timeout
    }

    /// Freezes the session into its immutable record.
    pub fn snapshot(&self, ended_at: DateTime<Utc>) -> TripRecord {
        TripRecord::new(self.accumulated_km, self.mode, ended_at)
    }
}
