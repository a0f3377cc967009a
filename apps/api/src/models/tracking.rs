use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;

/// Per-country lists of monitored items. Each list owns one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedList {
    Keywords,
    UsMentionKeywords,
    NewsSources,
    Influencers,
    GovernmentMessaging,
    LeadershipMessaging,
    EmergencyNumbers,
}

impl TrackedList {
    /// Backing table. Static strings only, so the value is safe to splice into SQL.
    pub fn table(&self) -> &'static str {
        match self {
            TrackedList::Keywords => "keywords",
            TrackedList::UsMentionKeywords => "us_mention_keywords",
            TrackedList::NewsSources => "news_sources",
            TrackedList::Influencers => "influencers",
            TrackedList::GovernmentMessaging => "government_messaging",
            TrackedList::LeadershipMessaging => "leadership_messaging",
            TrackedList::EmergencyNumbers => "emergency_numbers",
        }
    }

    /// Singular noun for error messages.
    pub fn noun(&self) -> &'static str {
        match self {
            TrackedList::Keywords | TrackedList::UsMentionKeywords => "Keyword",
            TrackedList::NewsSources => "News source",
            TrackedList::Influencers => "Influencer",
            TrackedList::GovernmentMessaging => "Government entity",
            TrackedList::LeadershipMessaging => "Leader",
            TrackedList::EmergencyNumbers => "Emergency number",
        }
    }
}

/// Which keyword list: general monitoring, or mentions of the US.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeywordList {
    #[default]
    General,
    UsMentions,
}

impl KeywordList {
    pub fn tracked(&self) -> TrackedList {
        match self {
            KeywordList::General => TrackedList::Keywords,
            KeywordList::UsMentions => TrackedList::UsMentionKeywords,
        }
    }
}

/// Identity used to skip entries that are already tracked. Case-insensitive.
pub trait DedupeKey {
    fn dedupe_key(&self) -> String;
}

/// Drops drafts already present in `existing`, and repeats within `drafts`.
pub fn new_only<D: DedupeKey, E: DedupeKey>(drafts: Vec<D>, existing: &[E]) -> Vec<D> {
    let mut seen: std::collections::HashSet<String> =
        existing.iter().map(DedupeKey::dedupe_key).collect();
    drafts
        .into_iter()
        .filter(|d| seen.insert(d.dedupe_key()))
        .collect()
}

fn key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Handles compare without the leading `@`.
fn handle_key(value: &str) -> String {
    key(value).trim_start_matches('@').to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Keyword {
    pub id: Uuid,
    pub country_id: Uuid,
    pub keyword: String,
    pub created_at: DateTime<Utc>,
}

impl DedupeKey for Keyword {
    fn dedupe_key(&self) -> String {
        key(&self.keyword)
    }
}

impl DedupeKey for String {
    fn dedupe_key(&self) -> String {
        key(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NewsSource {
    pub id: Uuid,
    pub country_id: Uuid,
    pub name: String,
    pub url: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsSourceDraft {
    pub name: String,
    pub url: String,
    pub notes: Option<String>,
}

impl DedupeKey for NewsSource {
    fn dedupe_key(&self) -> String {
        key(&self.url)
    }
}

impl DedupeKey for NewsSourceDraft {
    fn dedupe_key(&self) -> String {
        key(&self.url)
    }
}

/// Political leaning is a score from -3 (left) to 3 (right).
pub const LEANING_RANGE: std::ops::RangeInclusive<f64> = -3.0..=3.0;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Influencer {
    pub id: Uuid,
    pub country_id: Uuid,
    pub name: String,
    pub handle: String,
    pub role: String,
    pub political_leaning: f64,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfluencerDraft {
    pub name: String,
    pub handle: String,
    pub role: String,
    pub political_leaning: f64,
    pub url: String,
}

impl InfluencerDraft {
    pub fn check_leaning(leaning: f64) -> Result<f64, AppError> {
        if LEANING_RANGE.contains(&leaning) {
            Ok(leaning)
        } else {
            Err(AppError::Validation(
                "Political leaning must be between -3 and 3".to_string(),
            ))
        }
    }
}

impl DedupeKey for Influencer {
    fn dedupe_key(&self) -> String {
        handle_key(&self.handle)
    }
}

impl DedupeKey for InfluencerDraft {
    fn dedupe_key(&self) -> String {
        handle_key(&self.handle)
    }
}

/// A ministry or agency account followed for official messaging.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GovernmentEntity {
    pub id: Uuid,
    pub country_id: Uuid,
    pub name: String,
    pub handle: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GovernmentEntityDraft {
    pub name: String,
    pub handle: String,
    pub notes: Option<String>,
}

impl DedupeKey for GovernmentEntity {
    fn dedupe_key(&self) -> String {
        handle_key(&self.handle)
    }
}

impl DedupeKey for GovernmentEntityDraft {
    fn dedupe_key(&self) -> String {
        handle_key(&self.handle)
    }
}

/// An individual leader's account followed for messaging.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Leader {
    pub id: Uuid,
    pub country_id: Uuid,
    pub name: String,
    pub title: String,
    pub handle: String,
    /// Free text, e.g. "Center-right, pro-Western".
    pub political_leaning: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderDraft {
    pub name: String,
    pub title: String,
    pub handle: String,
    pub political_leaning: Option<String>,
}

impl DedupeKey for Leader {
    fn dedupe_key(&self) -> String {
        handle_key(&self.handle)
    }
}

impl DedupeKey for LeaderDraft {
    fn dedupe_key(&self) -> String {
        handle_key(&self.handle)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyNumber {
    pub id: Uuid,
    pub country_id: Uuid,
    pub name: String,
    pub number: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmergencyNumberDraft {
    pub name: String,
    pub number: String,
}

impl DedupeKey for EmergencyNumber {
    fn dedupe_key(&self) -> String {
        format!("{}={}", key(&self.name), key(&self.number))
    }
}

impl DedupeKey for EmergencyNumberDraft {
    fn dedupe_key(&self) -> String {
        format!("{}={}", key(&self.name), key(&self.number))
    }
}

/// Single-handle accounts: the US embassy in the country, and the US ambassador.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PresenceKind {
    Embassy,
    Ambassador,
}

impl PresenceKind {
    /// Path form: `embassy` or `ambassador`.
    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "embassy" => Ok(PresenceKind::Embassy),
            "ambassador" => Ok(PresenceKind::Ambassador),
            other => Err(AppError::Validation(format!(
                "Unknown presence kind '{other}'"
            ))),
        }
    }

    /// Who the handle belongs to, for messages.
    pub fn subject(&self) -> &'static str {
        match self {
            PresenceKind::Embassy => "the U.S. Embassy",
            PresenceKind::Ambassador => "the Ambassador",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Presence {
    pub country_id: Uuid,
    pub kind: PresenceKind,
    pub handle: String,
    pub updated_at: DateTime<Utc>,
}
