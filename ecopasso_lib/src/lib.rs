pub mod location_point;
pub mod transport_mode;
pub mod trip_record;
pub mod trip_session;
