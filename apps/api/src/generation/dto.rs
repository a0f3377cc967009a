//! Wire types shared by the HTTP handlers and the client poller.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::country::SectionKey;
use crate::models::generation::GenerationStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartGenerationRequest {
    /// Kept as raw JSON so a missing, mistyped or unknown value maps to a 400, not a 422.
    pub section: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartGenerationResponse {
    pub job_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusView {
    pub status: GenerationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedGeneration {
    pub id: Uuid,
    pub country_name: String,
    pub section: SectionKey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResponse {
    pub saved_count: usize,
    pub saved_sections: Vec<SectionKey>,
    pub generations: Vec<SavedGeneration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingJob {
    pub id: Uuid,
    pub section: SectionKey,
    pub status: GenerationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingResponse {
    pub in_progress_count: usize,
    pub sections: Vec<SectionKey>,
    pub jobs: Vec<PendingJob>,
}
