//! Client-side reconciliation loop for one country's profile page.
//!
//! Two kinds of polling run side by side:
//! - a coarse loop that reconciles (commits every COMPLETED job), fetches the
//!   content of newly saved sections and refreshes the in-flight set, and keeps
//!   ticking only while something is in flight;
//! - one fine-grained watcher per job started through [`PollerHandle::generate`],
//!   polling that job's status until SAVED or ERROR.
//!
//! Stopping never cancels server-side work: it only stops scheduling polls.

pub mod api;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::generation::dto::PendingResponse;
use crate::models::country::SectionKey;
use crate::models::generation::GenerationStatus;

pub use api::{HttpProfileApi, ProfileApi};

#[derive(Debug, Error)]
pub enum PollerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollerEvent {
    /// The set of sections believed to be generating changed.
    InFlight(BTreeSet<SectionKey>),
    SectionSaved { section: SectionKey, content: String },
    SectionFailed { section: SectionKey, error: String },
}

#[derive(Default)]
struct PollState {
    in_flight: BTreeSet<SectionKey>,
    /// Jobs already seen SAVED or ERROR; later reads of them are stale.
    settled: HashSet<Uuid>,
    /// Jobs with a live watcher, by section.
    watching: HashMap<Uuid, SectionKey>,
    coarse_running: bool,
}

struct Shared {
    api: Arc<dyn ProfileApi>,
    interval: Duration,
    state: Mutex<PollState>,
    events: mpsc::UnboundedSender<PollerEvent>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, PollState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: PollerEvent) {
        let _ = self.events.send(event);
    }

    fn is_settled(&self, job_id: Uuid) -> bool {
        self.state().settled.contains(&job_id)
    }

    /// Records a terminal observation. Returns false if the job was already settled.
    fn settle(&self, job_id: Uuid, section: SectionKey) -> bool {
        let mut state = self.state();
        if !state.settled.insert(job_id) {
            return false;
        }
        if state.in_flight.remove(&section) {
            let snapshot = state.in_flight.clone();
            drop(state);
            self.emit(PollerEvent::InFlight(snapshot));
        }
        true
    }

    /// Replaces the in-flight set from a pending listing, ignoring settled jobs.
    /// Sections with an unsettled watcher stay in flight even if the listing
    /// lags behind.
    fn refresh_in_flight(&self, pending: &PendingResponse) {
        let mut state = self.state();
        let listed = pending.jobs.iter().map(|job| (job.id, job.section));
        let watched = state.watching.iter().map(|(id, section)| (*id, *section));
        let fresh: BTreeSet<SectionKey> = listed
            .chain(watched)
            .filter(|(id, _)| !state.settled.contains(id))
            .map(|(_, section)| section)
            .collect();
        if fresh != state.in_flight {
            state.in_flight = fresh.clone();
            drop(state);
            self.emit(PollerEvent::InFlight(fresh));
        }
    }

    /// Clears the running flag when nothing is in flight, under the same lock
    /// `generate` uses to restart the loop.
    fn stop_if_idle(&self) -> bool {
        let mut state = self.state();
        if state.in_flight.is_empty() {
            state.coarse_running = false;
            true
        } else {
            false
        }
    }

    async fn coarse_tick(&self) -> Result<(), PollerError> {
        let saved = self.api.reconcile().await?;
        for generation in saved.generations {
            if self.is_settled(generation.id) {
                continue;
            }
            let content = self.api.section_content(generation.section).await?;
            if self.settle(generation.id, generation.section) {
                self.emit(PollerEvent::SectionSaved {
                    section: generation.section,
                    content: content.unwrap_or_default(),
                });
            }
        }

        let pending = self.api.pending().await?;
        self.refresh_in_flight(&pending);
        Ok(())
    }

    async fn run_coarse(self: Arc<Self>) {
        loop {
            tokio::time::sleep(self.interval).await;
            if let Err(e) = self.coarse_tick().await {
                warn!("profile reconcile tick failed: {e}");
            }
            if self.stop_if_idle() {
                debug!("nothing in flight, coarse polling stopped");
                return;
            }
        }
    }

    async fn watch_job(self: Arc<Self>, job_id: Uuid, section: SectionKey) {
        self.poll_job(job_id, section).await;
        self.state().watching.remove(&job_id);
    }

    async fn poll_job(&self, job_id: Uuid, section: SectionKey) {
        loop {
            tokio::time::sleep(self.interval).await;
            if self.is_settled(job_id) {
                return;
            }

            let view = match self.api.job_status(job_id).await {
                Ok(view) => view,
                Err(e) => {
                    self.emit(PollerEvent::SectionFailed {
                        section,
                        error: e.to_string(),
                    });
                    return;
                }
            };

            if !view.status.is_terminal() {
                continue;
            }

            match view.status {
                GenerationStatus::Saved => {
                    let content = match view.content {
                        Some(content) => content,
                        None => match self.api.section_content(section).await {
                            Ok(content) => content.unwrap_or_default(),
                            Err(e) => {
                                warn!(%job_id, "could not fetch saved content: {e}");
                                continue;
                            }
                        },
                    };
                    if self.settle(job_id, section) {
                        self.emit(PollerEvent::SectionSaved { section, content });
                    }
                    return;
                }
                _ => {
                    if self.settle(job_id, section) {
                        self.emit(PollerEvent::SectionFailed {
                            section,
                            error: view.error.unwrap_or_default(),
                        });
                    }
                    return;
                }
            }
        }
    }
}

pub struct ProfilePoller;

impl ProfilePoller {
    /// Seeds the in-flight set from the pending listing and starts the coarse
    /// loop if anything is already generating.
    pub async fn attach(
        api: Arc<dyn ProfileApi>,
        interval: Duration,
    ) -> Result<(PollerHandle, mpsc::UnboundedReceiver<PollerEvent>), PollerError> {
        let pending = api.pending().await?;
        let (events, receiver) = mpsc::unbounded_channel();

        let shared = Arc::new(Shared {
            api,
            interval,
            state: Mutex::new(PollState::default()),
            events,
        });
        shared.refresh_in_flight(&pending);

        let handle = PollerHandle {
            shared,
            tasks: Mutex::new(JoinSet::new()),
        };
        handle.ensure_coarse_loop();
        Ok((handle, receiver))
    }
}

/// Owns every polling task. Dropping it aborts them all.
pub struct PollerHandle {
    shared: Arc<Shared>,
    tasks: Mutex<JoinSet<()>>,
}

impl PollerHandle {
    /// Starts a generation and watches it until it settles.
    pub async fn generate(&self, section: SectionKey) -> Result<Uuid, PollerError> {
        let job_id = self.shared.api.start_generation(section).await?;

        let changed = {
            let mut state = self.shared.state();
            state.watching.insert(job_id, section);
            state.in_flight.insert(section).then(|| state.in_flight.clone())
        };
        if let Some(snapshot) = changed {
            self.shared.emit(PollerEvent::InFlight(snapshot));
        }

        self.spawn(self.shared.clone().watch_job(job_id, section));
        self.ensure_coarse_loop();
        Ok(job_id)
    }

    /// Sections currently believed to be generating.
    pub fn snapshot(&self) -> BTreeSet<SectionKey> {
        self.shared.state().in_flight.clone()
    }

    /// Stops all polling. Server-side workers are unaffected.
    pub fn cancel(&self) {
        self.tasks().abort_all();
        let mut state = self.shared.state();
        state.coarse_running = false;
        state.watching.clear();
    }

    fn ensure_coarse_loop(&self) {
        {
            let mut state = self.shared.state();
            if state.coarse_running || state.in_flight.is_empty() {
                return;
            }
            state.coarse_running = true;
        }
        self.spawn(self.shared.clone().run_coarse());
    }

    fn spawn(&self, task: impl std::future::Future<Output = ()> + Send + 'static) {
        let mut tasks = self.tasks();
        while tasks.try_join_next().is_some() {}
        tasks.spawn(task);
    }

    /// Number of polling tasks not yet reaped.
    pub fn task_count(&self) -> usize {
        self.tasks().len()
    }

    fn tasks(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }
}
