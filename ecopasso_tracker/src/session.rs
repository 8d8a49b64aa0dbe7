use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use ecopasso_lib::{
    location_point::LocationPoint,
    transport_mode::TransportMode,
    trip_record::{CarDetails, TripRecord},
    trip_session::TripSession,
};
use tokio::{
    sync::mpsc,
    time::{self, MissedTickBehavior},
};

use crate::{
    config::TrackerConfig, error::TrackerError, notify::Notifier, pending::PendingQueue,
    submit::TripSubmitter,
};

/// Whether the app is currently on screen. Gates the local notification
/// and triggers the pending-queue drain on return to foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Foreground,
    Background,
}

/// Everything that can happen to the active session. Fixes, timer ticks
/// and user decisions all funnel through the one actor task, so the
/// session state never sees two triggers at once.
enum TrackerEvent {
    Fix(LocationPoint),
    Confirm(Option<CarDetails>),
    Cancel,
    App(AppState),
}

/// Surfaced when a trip finalizes and awaits the user's decision.
#[derive(Debug, Clone, PartialEq)]
pub struct TripPrompt {
    pub distance_km: f64,
    pub transport: TransportMode,
    pub needs_car_details: bool,
}

enum SessionState {
    Idle,
    Active(TripSession),
    Finalizing {
        draft: TripRecord,
        /// A fix that arrived while waiting for confirmation. Replayed
        /// as the first fix of the next session once this one resolves.
        held_fix: Option<LocationPoint>,
    },
}

/// Cloneable front door to the session actor.
#[derive(Clone)]
pub struct TrackerHandle {
    tx: mpsc::Sender<TrackerEvent>,
}

impl TrackerHandle {
    pub async fn ingest_fix(&self, fix: LocationPoint) -> Result<(), TrackerError> {
        self.send(TrackerEvent::Fix(fix)).await
    }

    pub async fn confirm(&self, details: Option<CarDetails>) -> Result<(), TrackerError> {
        self.send(TrackerEvent::Confirm(details)).await
    }

    pub async fn cancel(&self) -> Result<(), TrackerError> {
        self.send(TrackerEvent::Cancel).await
    }

    pub async fn set_app_state(&self, state: AppState) -> Result<(), TrackerError> {
        self.send(TrackerEvent::App(state)).await
    }

    async fn send(&self, event: TrackerEvent) -> Result<(), TrackerError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| TrackerError::Session("tracker task has shut down".into()))
    }
}

pub struct SessionManager {
    state: SessionState,
    app_state: AppState,
    idle_timeout: TimeDelta,
    tick_interval: std::time::Duration,
    submitter: Arc<dyn TripSubmitter>,
    pending: PendingQueue,
    notifier: Arc<dyn Notifier>,
    prompt_tx: mpsc::Sender<TripPrompt>,
}

impl SessionManager {
    /// Spawns the actor task that owns all session state. Returns the
    /// handle for feeding it events and the channel on which finalized
    /// trips surface for confirmation.
    pub fn spawn(
        config: &TrackerConfig,
        submitter: Arc<dyn TripSubmitter>,
        pending: PendingQueue,
        notifier: Arc<dyn Notifier>,
    ) -> (TrackerHandle, mpsc::Receiver<TripPrompt>) {
        let (tx, rx) = mpsc::channel(64);
        let (prompt_tx, prompt_rx) = mpsc::channel(8);

        let manager = SessionManager {
            state: SessionState::Idle,
            app_state: AppState::Foreground,
            idle_timeout: TimeDelta::from_std(config.idle_timeout)
                .unwrap_or_else(|_| TimeDelta::minutes(5)),
            tick_interval: config.tick_interval,
            submitter,
            pending,
            notifier,
            prompt_tx,
        };

        tokio::spawn(manager.run(rx));

        (TrackerHandle { tx }, prompt_rx)
    }

    async fn run(mut self, mut rx: mpsc::Receiver<TrackerEvent>) {
        // Trips queued by a previous run get a resubmission attempt
        // before any new tracking happens.
        self.spawn_drain();

        // The inactivity check is a wall-clock poll: fix arrival can
        // itself stop (device stationary), so only a timer can notice
        // "no movement for N minutes". First check one full period in.
        let mut ticker = time::interval_at(
            time::Instant::now() + self.tick_interval,
            self.tick_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                event = rx.recv() => {
                    let Some(event) = event else {
                        tracing::debug!("all tracker handles dropped, stopping session task");
                        break;
                    };
                    self.handle_event(event).await;
                }
                _ = ticker.tick() => self.check_inactivity().await,
            }
        }
    }

    async fn handle_event(&mut self, event: TrackerEvent) {
        match event {
            TrackerEvent::Fix(fix) => match &mut self.state {
                SessionState::Idle => {
                    tracing::debug!("first fix received, trip started");
                    self.state = SessionState::Active(TripSession::start(fix));
                }
                SessionState::Active(session) => session.ingest(fix),
                SessionState::Finalizing { held_fix, .. } => {
                    // Keep the latest; it seeds the next session.
                    *held_fix = Some(fix);
                }
            },
            TrackerEvent::Confirm(details) => {
                match std::mem::replace(&mut self.state, SessionState::Idle) {
                    SessionState::Finalizing { draft, held_fix } => {
                        let record = match details {
                            Some(details) => draft.with_car_details(details),
                            None => draft,
                        };

                        tracing::info!(
                            "trip confirmed: {:.2} km by {}",
                            record.distance,
                            record.transport
                        );
                        self.dispatch(record);
                        self.resume(held_fix);
                    }
                    other => {
                        tracing::debug!("confirm received outside finalization, ignoring");
                        self.state = other;
                    }
                }
            }
            TrackerEvent::Cancel => {
                match std::mem::replace(&mut self.state, SessionState::Idle) {
                    SessionState::Finalizing { held_fix, .. } => {
                        tracing::info!("trip discarded by user");
                        self.resume(held_fix);
                    }
                    other => {
                        tracing::debug!("cancel received outside finalization, ignoring");
                        self.state = other;
                    }
                }
            }
            TrackerEvent::App(state) => {
                let was_background = self.app_state == AppState::Background;
                self.app_state = state;
                if was_background && state == AppState::Foreground {
                    self.spawn_drain();
                }
            }
        }
    }

    async fn check_inactivity(&mut self) {
        let SessionState::Active(session) = &self.state else {
            return;
        };

        if !session.idle_since(Utc::now(), self.idle_timeout) {
            return;
        }

        let draft = session.snapshot(Utc::now());
        tracing::info!(
            "trip ended after inactivity: {:.2} km by {}",
            draft.distance,
            draft.transport
        );

        if self.app_state == AppState::Background {
            self.notifier.trip_detected(&draft);
        }

        let prompt = TripPrompt {
            distance_km: draft.distance,
            transport: draft.transport,
            needs_car_details: draft.transport.is_car(),
        };

        self.state = SessionState::Finalizing {
            draft,
            held_fix: None,
        };

        if self.prompt_tx.send(prompt).await.is_err() {
            tracing::warn!("nobody is listening for trip confirmations");
        }
    }

    /// Hands a confirmed record to the submitter on its own task; a slow
    /// or failing backend never blocks fix intake. Failures land in the
    /// durable pending queue.
    fn dispatch(&self, record: TripRecord) {
        let submitter = self.submitter.clone();
        let pending = self.pending.clone();

        tokio::spawn(async move {
            if let Err(err) = submitter.submit(&record).await {
                tracing::warn!("submission failed, queueing trip: {err}");
                if let Err(err) = pending.append(&record).await {
                    tracing::error!("failed to queue unsent trip: {err}");
                }
            }
        });
    }

    fn spawn_drain(&self) {
        let submitter = self.submitter.clone();
        let pending = self.pending.clone();

        tokio::spawn(async move {
            match pending.drain(submitter.as_ref()).await {
                Ok(0) => {}
                Ok(count) => tracing::info!("resubmitted {count} queued trips"),
                Err(err) => tracing::warn!("pending queue drain failed: {err}"),
            }
        });
    }

    fn resume(&mut self, held_fix: Option<LocationPoint>) {
        if let Some(fix) = held_fix {
            tracing::debug!("fix received during finalization, starting next trip");
            self.state = SessionState::Active(TripSession::start(fix));
        }
    }
}
