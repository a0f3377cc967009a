//! Generation Job Tracker: create / execute / observe / commit for
//! AI-generated profile sections.
//!
//! Flow: `start` inserts a PENDING row and spawns a detached worker →
//! the worker calls the completion service and records COMPLETED or ERROR →
//! callers poll `status` → `commit` (or `reconcile`) copies the content into
//! the country and marks the job SAVED.
//!
//! Workers are tracked in a process-wide registry keyed by job id so that
//! shutdown can drain them. Jobs left PENDING by a previous process are
//! failed by `fail_orphaned` at startup.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::countries::repository::CountryRepository;
use crate::errors::AppError;
use crate::generation::dto::JobStatusView;
use crate::generation::prompts::section_prompt;
use crate::generation::repository::GenerationRepository;
use crate::llm_client::prompts::ANALYST_SYSTEM;
use crate::llm_client::{strip_code_fences, CompletionService, LlmError};
use crate::models::country::SectionKey;
use crate::models::generation::{GenerationJob, GenerationStatus};

pub const ORPHANED_MESSAGE: &str = "orphaned: process restarted before generation finished";

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedSection {
    pub id: Uuid,
    pub country_name: String,
    pub section: SectionKey,
    pub content: String,
}

impl From<GenerationJob> for CommittedSection {
    fn from(job: GenerationJob) -> Self {
        CommittedSection {
            id: job.id,
            country_name: job.country_name,
            section: job.section,
            content: job.content.unwrap_or_default(),
        }
    }
}

#[derive(Default)]
struct RegistryInner {
    handles: Mutex<HashMap<Uuid, JoinHandle<()>>>,
    leaked: AtomicU64,
}

/// Running workers by job id, plus a count of jobs whose failure could not be recorded.
#[derive(Clone, Default)]
pub struct WorkerRegistry {
    inner: Arc<RegistryInner>,
}

impl WorkerRegistry {
    pub async fn in_flight(&self) -> usize {
        self.inner.handles.lock().await.len()
    }

    pub fn leaked(&self) -> u64 {
        self.inner.leaked.load(Ordering::Relaxed)
    }

    async fn finished(&self, job_id: Uuid) {
        self.inner.handles.lock().await.remove(&job_id);
    }

    /// Awaits every worker, including ones spawned while draining.
    pub async fn drain(&self) {
        loop {
            let batch: Vec<(Uuid, JoinHandle<()>)> =
                self.inner.handles.lock().await.drain().collect();
            if batch.is_empty() {
                return;
            }
            for (job_id, handle) in batch {
                if let Err(e) = handle.await {
                    warn!(%job_id, "generation worker did not finish cleanly: {e}");
                }
            }
        }
    }
}

#[derive(Clone)]
pub struct GenerationTracker {
    jobs: Arc<dyn GenerationRepository>,
    countries: Arc<dyn CountryRepository>,
    completion: Arc<dyn CompletionService>,
    registry: WorkerRegistry,
}

impl GenerationTracker {
    pub fn new(
        jobs: Arc<dyn GenerationRepository>,
        countries: Arc<dyn CountryRepository>,
        completion: Arc<dyn CompletionService>,
    ) -> Self {
        Self {
            jobs,
            countries,
            completion,
            registry: WorkerRegistry::default(),
        }
    }

    pub fn registry(&self) -> &WorkerRegistry {
        &self.registry
    }

    /// Inserts a PENDING job and launches its worker without waiting for it.
    ///
    /// The caller is responsible for having resolved `country_name` to a real country.
    pub async fn start(&self, country_name: &str, section: SectionKey) -> Result<Uuid, AppError> {
        let job = GenerationJob::pending(country_name, section);
        let job_id = job.id;
        self.jobs.insert(&job).await?;

        let worker = Worker {
            jobs: Arc::clone(&self.jobs),
            completion: Arc::clone(&self.completion),
            registry: self.registry.clone(),
            job_id,
            country_name: country_name.to_string(),
            section,
        };

        // Hold the registry lock across spawn + insert so a fast worker cannot
        // deregister itself before it has been registered.
        let mut handles = self.registry.inner.handles.lock().await;
        handles.insert(job_id, tokio::spawn(worker.run()));
        drop(handles);

        info!(%job_id, country = %country_name, %section, "generation queued");
        Ok(job_id)
    }

    /// Pure read of a job's state.
    pub async fn status(&self, job_id: Uuid) -> Result<JobStatusView, AppError> {
        let job = self.find(job_id).await?;
        Ok(JobStatusView {
            status: job.status,
            content: job.content,
            error: job.error,
        })
    }

    /// Copies a COMPLETED job's content into its country and marks it SAVED.
    ///
    /// Not guarded against a concurrent commit of another job for the same
    /// country/section: the later commit overwrites the earlier one.
    pub async fn commit(&self, job_id: Uuid) -> Result<CommittedSection, AppError> {
        let job = self.find(job_id).await?;
        if job.status != GenerationStatus::Completed {
            return Err(AppError::Conflict(format!(
                "Generation {job_id} is {}, not COMPLETED",
                job.status
            )));
        }

        let country = self
            .countries
            .find_by_name(&job.country_name)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Country '{}' no longer exists", job.country_name))
            })?;

        let saved = self.jobs.commit(job_id, country.id).await?;
        info!(%job_id, country = %saved.country_name, section = %saved.section, "generation saved");
        Ok(saved.into())
    }

    /// Jobs still in flight (PENDING or COMPLETED-but-unsaved) for a country.
    pub async fn list_in_flight(&self, country_name: &str) -> Result<Vec<GenerationJob>, AppError> {
        self.jobs
            .list_for_country(
                country_name,
                &[GenerationStatus::Pending, GenerationStatus::Completed],
            )
            .await
    }

    /// Commits every COMPLETED job for a country, oldest first.
    ///
    /// Jobs committed concurrently by another caller are skipped, so a second
    /// call with no new completions returns an empty list.
    pub async fn reconcile(&self, country_name: &str) -> Result<Vec<CommittedSection>, AppError> {
        let completed = self
            .jobs
            .list_for_country(country_name, &[GenerationStatus::Completed])
            .await?;

        let mut saved = Vec::with_capacity(completed.len());
        for job in completed {
            match self.commit(job.id).await {
                Ok(section) => saved.push(section),
                Err(AppError::Conflict(msg)) => debug!(job_id = %job.id, "skipping: {msg}"),
                Err(e) => return Err(e),
            }
        }
        Ok(saved)
    }

    /// Fails every job left PENDING by an earlier process. Call once at startup,
    /// before any new job is started.
    pub async fn fail_orphaned(&self) -> Result<u64, AppError> {
        let count = self.jobs.fail_pending(ORPHANED_MESSAGE).await?;
        if count > 0 {
            warn!("Marked {count} orphaned generation job(s) as ERROR");
        }
        Ok(count)
    }

    async fn find(&self, job_id: Uuid) -> Result<GenerationJob, AppError> {
        self.jobs
            .find(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Generation {job_id} not found")))
    }
}

/// Generates one section's HTML: prompt → completion → fence cleanup.
pub async fn generate_section(
    completion: &dyn CompletionService,
    country_name: &str,
    section: SectionKey,
) -> Result<String, LlmError> {
    let prompt = section_prompt(section, country_name);
    let raw = completion.complete(ANALYST_SYSTEM, &prompt).await?;
    let cleaned = strip_code_fences(&raw);
    if cleaned.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    Ok(cleaned.to_string())
}

struct Worker {
    jobs: Arc<dyn GenerationRepository>,
    completion: Arc<dyn CompletionService>,
    registry: WorkerRegistry,
    job_id: Uuid,
    country_name: String,
    section: SectionKey,
}

impl Worker {
    async fn run(self) {
        let job_id = self.job_id;

        match self.execute().await {
            Ok(()) => info!(%job_id, section = %self.section, "generation completed"),
            Err(message) => {
                warn!(%job_id, section = %self.section, "generation failed: {message}");
                match self.jobs.mark_error(job_id, &message).await {
                    Ok(true) => {}
                    Ok(false) => warn!(%job_id, "job left PENDING before its failure was recorded"),
                    Err(e) => {
                        // The job stays PENDING until the next startup reconciliation.
                        self.registry.inner.leaked.fetch_add(1, Ordering::Relaxed);
                        error!(%job_id, "failed to record generation failure, job leaked: {e}");
                    }
                }
            }
        }

        self.registry.finished(job_id).await;
    }

    async fn execute(&self) -> Result<(), String> {
        let content = generate_section(self.completion.as_ref(), &self.country_name, self.section)
            .await
            .map_err(|e| e.to_string())?;

        let updated = self
            .jobs
            .mark_completed(self.job_id, &content)
            .await
            .map_err(|e| e.to_string())?;
        if !updated {
            warn!(job_id = %self.job_id, "job left PENDING before its content was recorded");
        }
        Ok(())
    }
}
