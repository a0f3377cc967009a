use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::country::SectionKey;

/// Lifecycle: `PENDING → COMPLETED → SAVED` or `PENDING → ERROR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationStatus {
    Pending,
    Completed,
    Saved,
    Error,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::Pending => "PENDING",
            GenerationStatus::Completed => "COMPLETED",
            GenerationStatus::Saved => "SAVED",
            GenerationStatus::Error => "ERROR",
        }
    }

    /// `SAVED` and `ERROR` records are never mutated again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationStatus::Saved | GenerationStatus::Error)
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One asynchronous section-generation request.
///
/// `country_name` is a human-readable key, not a foreign key; it is resolved
/// back to a country only at commit time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GenerationJob {
    pub id: Uuid,
    pub country_name: String,
    pub section: SectionKey,
    pub status: GenerationStatus,
    pub content: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GenerationJob {
    pub fn pending(country_name: impl Into<String>, section: SectionKey) -> Self {
        let now = Utc::now();
        GenerationJob {
            id: Uuid::new_v4(),
            country_name: country_name.into(),
            section,
            status: GenerationStatus::Pending,
            content: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!GenerationStatus::Pending.is_terminal());
        assert!(!GenerationStatus::Completed.is_terminal());
        assert!(GenerationStatus::Saved.is_terminal());
        assert!(GenerationStatus::Error.is_terminal());
    }

    #[test]
    fn test_status_wire_form() {
        assert_eq!(
            serde_json::to_string(&GenerationStatus::Completed).unwrap(),
            "\"COMPLETED\""
        );
        let parsed: GenerationStatus = serde_json::from_str("\"SAVED\"").unwrap();
        assert_eq!(parsed, GenerationStatus::Saved);
    }
}
