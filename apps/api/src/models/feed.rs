use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;

/// Kind of feed the scraper is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedType {
    MainFeed,
    EmbassyMention,
    AmbassadorMention,
    DailySummary,
    UsMentions,
    GovernmentMessaging,
    LeadershipMessaging,
    BreakingNews,
}

impl FeedType {
    pub const ALL: [FeedType; 8] = [
        FeedType::MainFeed,
        FeedType::EmbassyMention,
        FeedType::AmbassadorMention,
        FeedType::DailySummary,
        FeedType::UsMentions,
        FeedType::GovernmentMessaging,
        FeedType::LeadershipMessaging,
        FeedType::BreakingNews,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            FeedType::MainFeed => "MAIN_FEED",
            FeedType::EmbassyMention => "EMBASSY_MENTION",
            FeedType::AmbassadorMention => "AMBASSADOR_MENTION",
            FeedType::DailySummary => "DAILY_SUMMARY",
            FeedType::UsMentions => "US_MENTIONS",
            FeedType::GovernmentMessaging => "GOVERNMENT_MESSAGING",
            FeedType::LeadershipMessaging => "LEADERSHIP_MESSAGING",
            FeedType::BreakingNews => "BREAKING_NEWS",
        }
    }

    /// Human label; this is what the scraper script expects as its second argument.
    pub fn label(&self) -> &'static str {
        match self {
            FeedType::MainFeed => "Main Feed",
            FeedType::EmbassyMention => "Embassy Mention",
            FeedType::AmbassadorMention => "Ambassador Mention",
            FeedType::DailySummary => "Daily Summary",
            FeedType::UsMentions => "US Mentions",
            FeedType::GovernmentMessaging => "Government Messaging",
            FeedType::LeadershipMessaging => "Leadership Messaging",
            FeedType::BreakingNews => "Breaking News",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        FeedType::ALL
            .into_iter()
            .find(|t| t.id() == s)
            .ok_or_else(|| AppError::Validation(format!("Unknown feed type '{s}'")))
    }
}

/// Scraper output stored verbatim as a JSON string.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedFeed {
    pub id: i64,
    pub country_id: Uuid,
    pub url: String,
    pub feed_type: FeedType,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
