//! Refresh orchestration: fetch, aggregate, geofilter and publish.
//!
//! A [`Coordinator`] owns the current [`Snapshot`] and the polling schedule.
//! Only one fetch runs at a time; triggers that arrive while a fetch is in
//! flight wait for it and share its outcome. A failed refresh never replaces
//! a published snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use qldfuel_client::{FuelApiError, FuelPriceClient, PricePayload};
use qldfuel_core::{Coordinate, IntegrationSettings};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use uuid::Uuid;

use crate::shutdown::ShutdownFlag;
use crate::snapshot::Snapshot;

const EVENT_CAPACITY: usize = 16;

/// Where price data comes from.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Whether the source has the credentials it needs to fetch.
    fn has_credentials(&self) -> bool;

    async fn fetch(&self) -> Result<PricePayload, FuelApiError>;
}

#[async_trait]
impl PriceSource for FuelPriceClient {
    fn has_credentials(&self) -> bool {
        self.has_token()
    }

    async fn fetch(&self) -> Result<PricePayload, FuelApiError> {
        self.fetch_all().await
    }
}

/// Why a refresh did not publish a snapshot. The `Display` output is the
/// human-readable cause carried by [`CoordinatorEvent::UpdateFailed`].
#[derive(Debug, Clone, Error)]
pub enum RefreshError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("QLD Fuel API error: {0}")]
    Remote(#[source] Arc<FuelApiError>),
}

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),
}

#[derive(Debug, Clone)]
pub enum CoordinatorEvent {
    Updated(Arc<Snapshot>),
    UpdateFailed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct CoordinatorStatus {
    pub has_snapshot: bool,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub refreshing: bool,
    pub scheduled: bool,
    pub settings: IntegrationSettings,
}

/// A finished refresh and the settings it ran with.
struct Outcome {
    settings: IntegrationSettings,
    result: Result<Arc<Snapshot>, RefreshError>,
}

struct Schedule {
    scheduler: JobScheduler,
    job_id: Uuid,
}

pub struct Coordinator<S> {
    source: S,
    home: Option<Coordinate>,
    settings: RwLock<IntegrationSettings>,
    current: RwLock<Option<Arc<Snapshot>>>,
    last_outcome: RwLock<Option<Outcome>>,
    in_flight: Mutex<()>,
    completed: AtomicU64,
    events: broadcast::Sender<CoordinatorEvent>,
    schedule: Mutex<Option<Schedule>>,
    shutdown: ShutdownFlag,
}

impl<S: PriceSource + 'static> Coordinator<S> {
    #[must_use]
    pub fn new(source: S, home: Option<Coordinate>, settings: IntegrationSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            source,
            home,
            settings: RwLock::new(settings),
            current: RwLock::new(None),
            last_outcome: RwLock::new(None),
            in_flight: Mutex::new(()),
            completed: AtomicU64::new(0),
            events,
            schedule: Mutex::new(None),
            shutdown: ShutdownFlag::new(),
        }
    }

    /// The most recently published snapshot, if any refresh has succeeded.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        read(&self.current).clone()
    }

    #[must_use]
    pub fn settings(&self) -> IntegrationSettings {
        read(&self.settings).clone()
    }

    #[must_use]
    pub fn home(&self) -> Option<Coordinate> {
        self.home
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.events.subscribe()
    }

    #[must_use]
    pub fn shutdown_flag(&self) -> ShutdownFlag {
        self.shutdown.clone()
    }

    pub async fn status(&self) -> CoordinatorStatus {
        let snapshot = self.snapshot();
        let last_error = self.last_error();
        let refreshing = self.in_flight.try_lock().is_err();
        let scheduled = self.schedule.lock().await.is_some();
        CoordinatorStatus {
            has_snapshot: snapshot.is_some(),
            last_success_at: snapshot.map(|s| s.fetched_at),
            last_error,
            refreshing,
            scheduled,
            settings: self.settings(),
        }
    }

    /// Cause of the most recent refresh failure, cleared by the next success.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        read(&self.last_outcome)
            .as_ref()
            .and_then(|outcome| outcome.result.as_ref().err())
            .map(ToString::to_string)
    }

    /// Fetches and publishes a new snapshot.
    ///
    /// If another refresh is in flight this waits for it and returns its
    /// outcome instead of fetching again, unless the settings changed while
    /// it ran.
    ///
    /// # Errors
    ///
    /// - [`RefreshError::Config`] if the token or home coordinate is
    ///   missing. Nothing is fetched.
    /// - [`RefreshError::Remote`] if the API fetch failed.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, RefreshError> {
        let generation = self.completed.load(Ordering::SeqCst);
        let _flight = self.in_flight.lock().await;

        let settings = self.settings();

        if self.completed.load(Ordering::SeqCst) != generation {
            let shared = read(&self.last_outcome)
                .as_ref()
                .filter(|outcome| outcome.settings == settings)
                .map(|outcome| outcome.result.clone());
            if let Some(result) = shared {
                tracing::debug!("refresh: joined in-flight refresh");
                return result;
            }
            tracing::debug!("refresh: settings changed during in-flight refresh, fetching again");
        }

        let result = self.run_refresh(settings.clone()).await;
        *write(&self.last_outcome) = Some(Outcome {
            settings,
            result: result.clone(),
        });
        self.completed.fetch_add(1, Ordering::SeqCst);
        result
    }

    async fn run_refresh(
        &self,
        settings: IntegrationSettings,
    ) -> Result<Arc<Snapshot>, RefreshError> {
        let started = Instant::now();
        tracing::info!("refresh: starting");

        match self.build_snapshot(settings).await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                *write(&self.current) = Some(Arc::clone(&snapshot));
                tracing::info!(
                    sites = snapshot.sites.len(),
                    fuels = snapshot.global_cheapest.len(),
                    elapsed = ?started.elapsed(),
                    "refresh: snapshot published"
                );
                // No subscribers is fine.
                let _ = self
                    .events
                    .send(CoordinatorEvent::Updated(Arc::clone(&snapshot)));
                Ok(snapshot)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    elapsed = ?started.elapsed(),
                    "refresh: update failed, keeping previous snapshot"
                );
                let _ = self.events.send(CoordinatorEvent::UpdateFailed {
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn build_snapshot(&self, settings: IntegrationSettings) -> Result<Snapshot, RefreshError> {
        if !self.source.has_credentials() {
            return Err(RefreshError::Config(
                "subscriber token is missing".to_string(),
            ));
        }
        let home = self.home.ok_or_else(|| {
            RefreshError::Config("home latitude and longitude are not set".to_string())
        })?;

        let payload = self
            .source
            .fetch()
            .await
            .map_err(|e| RefreshError::Remote(Arc::new(e)))?;

        Ok(Snapshot::build(&payload, home, settings, Utc::now()))
    }

    /// Schedules periodic refreshes at the configured interval and runs the
    /// first refresh. A failed first refresh is logged; the schedule keeps
    /// retrying.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Scheduler`] if the job scheduler cannot be
    /// created or started.
    pub async fn start(self: &Arc<Self>) -> Result<(), CoordinatorError> {
        self.shutdown.reset();
        let every = self.settings().scan_interval();
        self.schedule_refresh(every).await?;
        tracing::info!(every = ?every, "coordinator: started");

        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "coordinator: first refresh failed");
        }
        Ok(())
    }

    /// Stops scheduled refreshes and raises the shutdown flag.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Scheduler`] if the scheduler fails to
    /// shut down.
    pub async fn stop(&self) -> Result<(), CoordinatorError> {
        self.shutdown.raise();
        let scheduled = self.schedule.lock().await.take();
        if let Some(mut schedule) = scheduled {
            schedule.scheduler.shutdown().await?;
        }
        tracing::info!("coordinator: stopped");
        Ok(())
    }

    /// Reschedules when the interval changed and the coordinator is
    /// running, swaps in the new settings, then refreshes with them.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Scheduler`] if rescheduling fails; the
    /// previous settings stay active. A failed refresh is logged and
    /// broadcast, not returned.
    pub async fn reconfigure(
        self: &Arc<Self>,
        settings: IntegrationSettings,
    ) -> Result<(), CoordinatorError> {
        let previous = self.settings();
        let running = self.schedule.lock().await.is_some();

        if running && previous.scan_interval() != settings.scan_interval() {
            self.schedule_refresh(settings.scan_interval()).await?;
        }
        *write(&self.settings) = settings.clone();
        tracing::info!(
            radius_km = settings.radius_km(),
            fuels = settings.fuel_types().len(),
            scan_interval_hours = settings.scan_interval_hours(),
            "coordinator: reconfigured"
        );

        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "coordinator: refresh after reconfigure failed");
        }
        Ok(())
    }

    /// Registers the repeated refresh job, replacing any existing one.
    async fn schedule_refresh(self: &Arc<Self>, every: Duration) -> Result<(), CoordinatorError> {
        let mut slot = self.schedule.lock().await;
        let scheduler = if let Some(previous) = slot.take() {
            previous.scheduler.remove(&previous.job_id).await?;
            previous.scheduler
        } else {
            let scheduler = JobScheduler::new().await?;
            scheduler.start().await?;
            scheduler
        };

        let job_id = scheduler.add(self.refresh_job(every)?).await?;
        *slot = Some(Schedule { scheduler, job_id });
        Ok(())
    }

    fn refresh_job(self: &Arc<Self>, every: Duration) -> Result<Job, JobSchedulerError> {
        let coordinator = Arc::downgrade(self);

        Job::new_repeated_async(every, move |_uuid, _lock| {
            let coordinator = coordinator.clone();

            Box::pin(async move {
                let Some(coordinator) = coordinator.upgrade() else {
                    return;
                };
                if coordinator.shutdown.is_raised() {
                    return;
                }
                tracing::info!("scheduler: scheduled refresh");
                // Outcome is already logged and broadcast.
                let _ = coordinator.refresh().await;
            })
        })
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "coordinator_test.rs"]
mod tests;
