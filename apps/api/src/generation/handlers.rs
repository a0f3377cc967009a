//! Axum route handlers for the Generation API.
//!
//! Commit has no endpoint of its own: it happens inside the status check
//! (a COMPLETED job is saved and reported as SAVED) and inside reconcile.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::countries::handlers::load_country;
use crate::errors::AppError;
use crate::generation::dto::{
    JobStatusView, PendingJob, PendingResponse, ReconcileResponse, SavedGeneration,
    StartGenerationRequest, StartGenerationResponse,
};
use crate::models::country::SectionKey;
use crate::models::generation::GenerationStatus;
use crate::state::AppState;

/// POST /api/v1/countries/:id/generations
pub async fn handle_start_generation(
    State(state): State<AppState>,
    Path(country_id): Path<Uuid>,
    Json(request): Json<StartGenerationRequest>,
) -> Result<Json<StartGenerationResponse>, AppError> {
    let section = parse_section(request.section)?;

    let country = load_country(&state, country_id).await?;
    let job_id = state.tracker.start(&country.name, section).await?;

    Ok(Json(StartGenerationResponse { job_id }))
}

fn parse_section(raw: Option<Value>) -> Result<SectionKey, AppError> {
    let section = match raw {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(_) => return Err(AppError::Validation("Section must be a string".to_string())),
    };
    section
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Section is required".to_string()))?
        .parse()
}

/// GET /api/v1/generations/:job_id
pub async fn handle_generation_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobStatusView>, AppError> {
    let view = state.tracker.status(job_id).await?;
    if view.status != GenerationStatus::Completed {
        return Ok(Json(view));
    }

    match state.tracker.commit(job_id).await {
        Ok(saved) => Ok(Json(JobStatusView {
            status: GenerationStatus::Saved,
            content: Some(saved.content),
            error: None,
        })),
        // Another poller committed it first; report whatever it is now.
        Err(AppError::Conflict(_)) => Ok(Json(state.tracker.status(job_id).await?)),
        // The country was deleted after the job finished; the job stays COMPLETED.
        Err(AppError::NotFound(msg)) => {
            warn!(%job_id, "cannot commit generation: {msg}");
            Ok(Json(view))
        }
        Err(e) => Err(e),
    }
}

/// GET /api/v1/countries/:id/generations/pending
pub async fn handle_pending_generations(
    State(state): State<AppState>,
    Path(country_id): Path<Uuid>,
) -> Result<Json<PendingResponse>, AppError> {
    let country = load_country(&state, country_id).await?;
    let jobs = state.tracker.list_in_flight(&country.name).await?;

    Ok(Json(PendingResponse {
        in_progress_count: jobs.len(),
        sections: jobs.iter().map(|j| j.section).collect(),
        jobs: jobs
            .into_iter()
            .map(|j| PendingJob {
                id: j.id,
                section: j.section,
                status: j.status,
            })
            .collect(),
    }))
}

/// GET /api/v1/countries/:id/generations/reconcile
pub async fn handle_reconcile_generations(
    State(state): State<AppState>,
    Path(country_id): Path<Uuid>,
) -> Result<Json<ReconcileResponse>, AppError> {
    let country = load_country(&state, country_id).await?;
    let saved = state.tracker.reconcile(&country.name).await?;

    Ok(Json(ReconcileResponse {
        saved_count: saved.len(),
        saved_sections: saved.iter().map(|s| s.section).collect(),
        generations: saved
            .into_iter()
            .map(|s| SavedGeneration {
                id: s.id,
                country_name: s.country_name,
                section: s.section,
            })
            .collect(),
    }))
}
