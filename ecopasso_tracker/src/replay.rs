use std::path::Path;

use ecopasso_lib::location_point::{LocationPoint, distance_km};

use crate::{config::TrackerConfig, error::TrackerError, session::TrackerHandle};

/// Feeds a recorded fix file (a JSON array of fixes) through the tracker
/// in arrival order, standing in for the platform location provider.
/// Like the real provider it emits a fix only once both the minimum
/// displacement and the minimum time since the previous fix have
/// passed. The provider also guarantees monotonic timestamps and the
/// accumulator relies on that, so out-of-order fixes in a recording are
/// skipped rather than delivered.
pub async fn replay_fixes(
    path: &Path,
    handle: &TrackerHandle,
    config: &TrackerConfig,
) -> Result<usize, TrackerError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| TrackerError::Storage(format!("failed to read {path:?}: {err}")))?;

    let fixes: Vec<LocationPoint> = serde_json::from_slice(&bytes)
        .map_err(|err| TrackerError::Storage(format!("malformed fix file {path:?}: {err}")))?;

    let mut fed = 0;
    let mut last_delivered: Option<LocationPoint> = None;

    for fix in fixes {
        // Deserialization bypasses the range checks.
        let fix = LocationPoint::new(fix.latitude, fix.longitude, fix.timestamp)?;

        if let Some(last) = last_delivered {
            if fix.timestamp < last.timestamp {
                tracing::warn!("skipping out-of-order fix at {}", fix.timestamp);
                continue;
            }

            let elapsed = (fix.timestamp - last.timestamp)
                .to_std()
                .unwrap_or_default();
            let moved_m = distance_km(&last, &fix) * 1000.0;
            if elapsed < config.min_fix_interval || moved_m < config.min_fix_distance_m as f64 {
                tracing::debug!("coalescing fix at {} below provider thresholds", fix.timestamp);
                continue;
            }
        }
        last_delivered = Some(fix);

        handle.ingest_fix(fix).await?;
        fed += 1;
    }

    Ok(fed)
}
