use ecopasso_lib::trip_record::TripRecord;

/// Delivery of the "trip detected" notice is platform glue; the session
/// manager only decides when one should fire (trip finalized while the
/// app is backgrounded).
pub trait Notifier: Send + Sync {
    fn trip_detected(&self, record: &TripRecord);
}

/// Default notifier for headless runs.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn trip_detected(&self, record: &TripRecord) {
        tracing::info!(
            "Trip Detected: You traveled {:.2} km by {}.",
            record.distance,
            record.transport
        );
    }
}
