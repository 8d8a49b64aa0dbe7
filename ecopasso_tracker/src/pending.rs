use std::{io::ErrorKind, path::PathBuf, sync::Arc};

use ecopasso_lib::trip_record::TripRecord;
use tokio::sync::Mutex;

use crate::{error::TrackerError, submit::TripSubmitter};

/// Durable queue of trips that failed remote submission. One JSON file
/// holds the whole list; every append reads it back in full and rewrites
/// it in full, so the file is always a valid snapshot.
#[derive(Clone)]
pub struct PendingQueue {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl PendingQueue {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, TrackerError> {
        let path = path.into();

        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir).await.map_err(|err| {
                    TrackerError::Storage(format!("failed to create data directory {dir:?}: {err}"))
                })?;
            }
        }

        Ok(Self {
            path,
            lock: Arc::new(Mutex::new(())),
        })
    }

    pub async fn records(&self) -> Result<Vec<TripRecord>, TrackerError> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    pub async fn append(&self, record: &TripRecord) -> Result<(), TrackerError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read().await?;
        records.push(record.clone());
        self.write(&records).await
    }

    /// Resubmits queued trips in FIFO order, stopping at the first
    /// failure. The file is rewritten after each success, so a crash
    /// mid-drain never loses a record; a trip whose submission
    /// succeeded just before a crash may be resubmitted on the next
    /// drain. Returns how many trips were submitted.
    pub async fn drain(&self, submitter: &dyn TripSubmitter) -> Result<usize, TrackerError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read().await?;

        let mut submitted = 0;
        while let Some(record) = records.first() {
            match submitter.submit(record).await {
                Ok(()) => {
                    records.remove(0);
                    submitted += 1;
                    self.write(&records).await?;
                }
                Err(err) => {
                    tracing::warn!("pending queue drain stopped: {err}");
                    break;
                }
            }
        }

        Ok(submitted)
    }

    async fn read(&self) -> Result<Vec<TripRecord>, TrackerError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|err| {
                TrackerError::Storage(format!("malformed pending file {:?}: {err}", self.path))
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(TrackerError::Storage(format!(
                "failed to read {:?}: {err}",
                self.path
            ))),
        }
    }

    async fn write(&self, records: &[TripRecord]) -> Result<(), TrackerError> {
        let bytes = serde_json::to_vec(records)
            .map_err(|err| TrackerError::Storage(format!("failed to encode pending trips: {err}")))?;

        tokio::fs::write(&self.path, bytes).await.map_err(|err| {
            TrackerError::Storage(format!("failed to write {:?}: {err}", self.path))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::DateTime;
    use ecopasso_lib::transport_mode::TransportMode;
    use std::{collections::VecDeque, sync::Mutex as StdMutex};

    /// Submitter that plays back a script of outcomes and records what
    /// it was asked to send.
    struct ScriptedSubmitter {
        outcomes: StdMutex<VecDeque<bool>>,
        submitted: StdMutex<Vec<TripRecord>>,
    }

    impl ScriptedSubmitter {
        fn new(outcomes: &[bool]) -> Self {
            Self {
                outcomes: StdMutex::new(outcomes.iter().copied().collect()),
                submitted: StdMutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TripSubmitter for ScriptedSubmitter {
        async fn submit(&self, record: &TripRecord) -> Result<(), TrackerError> {
            let ok = self.outcomes.lock().unwrap().pop_front().unwrap_or(false);
            if ok {
                self.submitted.lock().unwrap().push(record.clone());
                Ok(())
            } else {
                Err(TrackerError::Submission("scripted network error".into()))
            }
        }
    }

    fn record(distance: f64) -> TripRecord {
        TripRecord::new(
            distance,
            TransportMode::Bicycle,
            DateTime::from_timestamp_millis(1700000000000).unwrap(),
        )
    }

    async fn queue(dir: &tempfile::TempDir) -> PendingQueue {
        PendingQueue::open(dir.path().join("unsent_trips.json"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn starts_empty_when_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let queue = queue(&dir).await;
        assert!(queue.records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn repeated_failures_append_exactly_one_entry_each() {
        let dir = tempfile::tempdir().unwrap();
        let queue = queue(&dir).await;

        queue.append(&record(1.0)).await.unwrap();
        queue.append(&record(2.0)).await.unwrap();
        queue.append(&record(3.0)).await.unwrap();

        let records = queue.records().await.unwrap();
        assert_eq!(records.len(), 3);
        // Order preserved.
        assert_eq!(records[0].distance, 1.0);
        assert_eq!(records[2].distance, 3.0);
    }

    #[tokio::test]
    async fn queue_survives_a_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unsent_trips.json");

        let queue = PendingQueue::open(&path).await.unwrap();
        queue.append(&record(4.2)).await.unwrap();
        drop(queue);

        let reopened = PendingQueue::open(&path).await.unwrap();
        let records = reopened.records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].distance, 4.2);
    }

    #[tokio::test]
    async fn drain_removes_only_the_submitted_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let queue = queue(&dir).await;

        for d in [1.0, 2.0, 3.0] {
            queue.append(&record(d)).await.unwrap();
        }

        // Two successes, then the network goes away.
        let submitter = ScriptedSubmitter::new(&[true, true, false]);
        let submitted = queue.drain(&submitter).await.unwrap();

        assert_eq!(submitted, 2);
        let sent = submitter.submitted.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].distance, 1.0);
        assert_eq!(sent[1].distance, 2.0);

        let remaining = queue.records().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].distance, 3.0);
    }

    #[tokio::test]
    async fn drain_of_empty_queue_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let queue = queue(&dir).await;

        let submitter = ScriptedSubmitter::new(&[true]);
        assert_eq!(queue.drain(&submitter).await.unwrap(), 0);
        assert!(submitter.submitted.lock().unwrap().is_empty());
    }
}
