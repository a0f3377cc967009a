//! Axum route handlers for scraped feeds.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::countries::handlers::load_country;
use crate::errors::AppError;
use crate::feeds::repository::FeedRecord;
use crate::feeds::rss::feed_to_rss;
use crate::models::feed::{FeedType, ScrapedFeed};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedForm {
    pub country_id: Option<Uuid>,
    pub url: Option<String>,
    pub feed_type: Option<String>,
}

struct ValidFeedForm {
    country_id: Uuid,
    url: String,
    feed_type: FeedType,
}

impl FeedForm {
    fn validate(self) -> Result<ValidFeedForm, AppError> {
        let url = self.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
        let feed_type = self.feed_type.filter(|t| !t.trim().is_empty());
        let (Some(country_id), Some(url), Some(feed_type)) = (self.country_id, url, feed_type)
        else {
            return Err(AppError::Validation("All fields are required".to_string()));
        };
        Ok(ValidFeedForm {
            country_id,
            url,
            feed_type: FeedType::parse(&feed_type)?,
        })
    }
}

/// Validates the form, checks the country, runs the scraper.
async fn scrape_form(state: &AppState, form: FeedForm) -> Result<FeedRecord, AppError> {
    let form = form.validate()?;
    load_country(state, form.country_id).await?;
    let content = state.scraper.scrape(&form.url, form.feed_type).await?;

    Ok(FeedRecord {
        country_id: form.country_id,
        url: form.url,
        feed_type: form.feed_type,
        content,
    })
}

async fn load_feed(state: &AppState, feed_id: i64) -> Result<ScrapedFeed, AppError> {
    state
        .feeds
        .find(feed_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Feed not found".to_string()))
}

/// GET /api/v1/scraper/feeds
pub async fn handle_list_feeds(
    State(state): State<AppState>,
) -> Result<Json<Vec<ScrapedFeed>>, AppError> {
    Ok(Json(state.feeds.list().await?))
}

/// POST /api/v1/scraper/feeds
pub async fn handle_create_feed(
    State(state): State<AppState>,
    Json(form): Json<FeedForm>,
) -> Result<(StatusCode, Json<ScrapedFeed>), AppError> {
    let record = scrape_form(&state, form).await?;
    let feed = state.feeds.create(record).await?;
    Ok((StatusCode::CREATED, Json(feed)))
}

/// GET /api/v1/scraper/feeds/:feed_id
pub async fn handle_get_feed(
    State(state): State<AppState>,
    Path(feed_id): Path<i64>,
) -> Result<Json<ScrapedFeed>, AppError> {
    Ok(Json(load_feed(&state, feed_id).await?))
}

/// PUT /api/v1/scraper/feeds/:feed_id
///
/// Re-runs the scraper with the submitted URL and type and replaces the stored content.
pub async fn handle_update_feed(
    State(state): State<AppState>,
    Path(feed_id): Path<i64>,
    Json(form): Json<FeedForm>,
) -> Result<Json<ScrapedFeed>, AppError> {
    load_feed(&state, feed_id).await?;
    let record = scrape_form(&state, form).await?;
    let feed = state
        .feeds
        .update(feed_id, record)
        .await?
        .ok_or_else(|| AppError::NotFound("Feed not found".to_string()))?;
    Ok(Json(feed))
}

/// DELETE /api/v1/scraper/feeds/:feed_id
pub async fn handle_delete_feed(
    State(state): State<AppState>,
    Path(feed_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !state.feeds.delete(feed_id).await? {
        return Err(AppError::NotFound("Feed not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/scraper/feeds/:feed_id/rss
pub async fn handle_feed_rss(
    State(state): State<AppState>,
    Path(feed_id): Path<i64>,
) -> Result<Response, AppError> {
    let feed = load_feed(&state, feed_id).await?;
    let content = feed
        .content
        .ok_or_else(|| AppError::Serialization(format!("Feed {feed_id} has no content")))?;
    Ok(rss_response(feed_to_rss(&content)?))
}

pub(crate) fn rss_response(xml: String) -> Response {
    ([(header::CONTENT_TYPE, "application/xml")], xml).into_response()
}

/// GET /api/v1/countries/:id/daily-summary
///
/// Runs the summary script for the country and returns its output as RSS.
/// Nothing is stored.
pub async fn handle_daily_summary(
    State(state): State<AppState>,
    Path(country_id): Path<Uuid>,
) -> Result<Response, AppError> {
    load_country(&state, country_id).await?;
    let content = state.scraper.daily_summary(country_id).await?;
    Ok(rss_response(feed_to_rss(&content)?))
}
