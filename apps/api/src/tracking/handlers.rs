//! Axum route handlers for the per-country monitoring lists.
//!
//! Every list has the same surface: GET lists, POST adds manually (201),
//! POST `/generate` asks the model for new entries (200 with what was added),
//! DELETE `/:item_id` removes one. Entries already tracked are never added twice.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::countries::handlers::{load_country, non_blank};
use crate::errors::AppError;
use crate::models::tracking::{
    new_only, EmergencyNumber, EmergencyNumberDraft, GovernmentEntity, GovernmentEntityDraft,
    Influencer, InfluencerDraft, Keyword, KeywordList, Leader, LeaderDraft, NewsSource,
    NewsSourceDraft, Presence, PresenceKind, TrackedList,
};
use crate::state::AppState;
use crate::tracking::generator;

type Created<T> = (StatusCode, Json<Vec<T>>);

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    non_blank(value).ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

/// Fails with `Conflict` when every submitted entry is already tracked.
fn nothing_new<T>(list: TrackedList, fresh: &[T]) -> Result<(), AppError> {
    if fresh.is_empty() {
        return Err(AppError::Conflict(format!("{} already tracked", list.noun())));
    }
    Ok(())
}

async fn delete_item(
    state: &AppState,
    list: TrackedList,
    country_id: Uuid,
    item_id: Uuid,
) -> Result<StatusCode, AppError> {
    if !state.tracking.delete_item(list, country_id, item_id).await? {
        return Err(AppError::NotFound(format!("{} not found", list.noun())));
    }
    Ok(StatusCode::NO_CONTENT)
}

// Keywords

#[derive(Debug, Default, Deserialize)]
pub struct KeywordQuery {
    #[serde(default)]
    pub list: KeywordList,
}

#[derive(Debug, Deserialize)]
pub struct KeywordForm {
    /// One keyword, or several separated by commas.
    pub keyword: Option<String>,
}

/// GET /api/v1/countries/:id/keywords[?list=usMentions]
pub async fn handle_list_keywords(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<KeywordQuery>,
) -> Result<Json<Vec<Keyword>>, AppError> {
    load_country(&state, id).await?;
    Ok(Json(state.tracking.list_keywords(id, query.list).await?))
}

/// POST /api/v1/countries/:id/keywords[?list=usMentions]
pub async fn handle_add_keywords(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<KeywordQuery>,
    Json(form): Json<KeywordForm>,
) -> Result<Created<Keyword>, AppError> {
    let submitted: Vec<String> = required(form.keyword, "Keyword")?
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect();
    if submitted.is_empty() {
        return Err(AppError::Validation("Keyword is required".to_string()));
    }

    load_country(&state, id).await?;
    let existing = state.tracking.list_keywords(id, query.list).await?;
    let fresh = new_only(submitted, &existing);
    nothing_new(query.list.tracked(), &fresh)?;

    let created = state.tracking.add_keywords(id, query.list, &fresh).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/v1/countries/:id/keywords/generate[?list=usMentions]
pub async fn handle_generate_keywords(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<KeywordQuery>,
) -> Result<Json<Vec<Keyword>>, AppError> {
    let country = load_country(&state, id).await?;
    let existing = state.tracking.list_keywords(id, query.list).await?;
    let fresh = generator::keywords(state.completion.as_ref(), &country.name, &existing).await?;
    Ok(Json(state.tracking.add_keywords(id, query.list, &fresh).await?))
}

/// DELETE /api/v1/countries/:id/keywords/:item_id[?list=usMentions]
pub async fn handle_delete_keyword(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<KeywordQuery>,
) -> Result<StatusCode, AppError> {
    delete_item(&state, query.list.tracked(), id, item_id).await
}

// News sources

#[derive(Debug, Deserialize)]
pub struct NewsSourceForm {
    pub name: Option<String>,
    pub url: Option<String>,
    pub notes: Option<String>,
}

/// GET /api/v1/countries/:id/news-sources
pub async fn handle_list_news_sources(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<NewsSource>>, AppError> {
    load_country(&state, id).await?;
    Ok(Json(state.tracking.list_news_sources(id).await?))
}

/// POST /api/v1/countries/:id/news-sources
pub async fn handle_add_news_source(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<NewsSourceForm>,
) -> Result<Created<NewsSource>, AppError> {
    let draft = NewsSourceDraft {
        name: required(form.name, "Name")?,
        url: required(form.url, "URL")?,
        notes: non_blank(form.notes),
    };

    load_country(&state, id).await?;
    let existing = state.tracking.list_news_sources(id).await?;
    let fresh = new_only(vec![draft], &existing);
    nothing_new(TrackedList::NewsSources, &fresh)?;

    let created = state.tracking.add_news_sources(id, &fresh).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/v1/countries/:id/news-sources/generate
pub async fn handle_generate_news_sources(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<NewsSource>>, AppError> {
    let country = load_country(&state, id).await?;
    let existing = state.tracking.list_news_sources(id).await?;
    let fresh =
        generator::news_sources(state.completion.as_ref(), &country.name, &existing).await?;
    Ok(Json(state.tracking.add_news_sources(id, &fresh).await?))
}

/// DELETE /api/v1/countries/:id/news-sources/:item_id
pub async fn handle_delete_news_source(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    delete_item(&state, TrackedList::NewsSources, id, item_id).await
}

// Influencers

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfluencerForm {
    pub name: Option<String>,
    pub handle: Option<String>,
    pub role: Option<String>,
    pub political_leaning: Option<f64>,
    pub url: Option<String>,
}

/// GET /api/v1/countries/:id/influencers
pub async fn handle_list_influencers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Influencer>>, AppError> {
    load_country(&state, id).await?;
    Ok(Json(state.tracking.list_influencers(id).await?))
}

/// POST /api/v1/countries/:id/influencers
pub async fn handle_add_influencer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<InfluencerForm>,
) -> Result<Created<Influencer>, AppError> {
    let leaning = form
        .political_leaning
        .ok_or_else(|| AppError::Validation("Political leaning is required".to_string()))?;
    let draft = InfluencerDraft {
        name: required(form.name, "Name")?,
        handle: required(form.handle, "Handle")?,
        role: required(form.role, "Role")?,
        political_leaning: InfluencerDraft::check_leaning(leaning)?,
        url: required(form.url, "URL")?,
    };

    load_country(&state, id).await?;
    let existing = state.tracking.list_influencers(id).await?;
    let fresh = new_only(vec![draft], &existing);
    nothing_new(TrackedList::Influencers, &fresh)?;

    let created = state.tracking.add_influencers(id, &fresh).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/v1/countries/:id/influencers/generate
pub async fn handle_generate_influencers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Influencer>>, AppError> {
    let country = load_country(&state, id).await?;
    let existing = state.tracking.list_influencers(id).await?;
    let fresh =
        generator::influencers(state.completion.as_ref(), &country.name, &existing).await?;
    Ok(Json(state.tracking.add_influencers(id, &fresh).await?))
}

/// DELETE /api/v1/countries/:id/influencers/:item_id
pub async fn handle_delete_influencer(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    delete_item(&state, TrackedList::Influencers, id, item_id).await
}

// Government messaging

#[derive(Debug, Deserialize)]
pub struct GovernmentEntityForm {
    pub name: Option<String>,
    pub handle: Option<String>,
    pub notes: Option<String>,
}

/// GET /api/v1/countries/:id/government-messaging
pub async fn handle_list_government_entities(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<GovernmentEntity>>, AppError> {
    load_country(&state, id).await?;
    Ok(Json(state.tracking.list_government_entities(id).await?))
}

/// POST /api/v1/countries/:id/government-messaging
pub async fn handle_add_government_entity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<GovernmentEntityForm>,
) -> Result<Created<GovernmentEntity>, AppError> {
    let draft = GovernmentEntityDraft {
        name: required(form.name, "Name")?,
        handle: required(form.handle, "Handle")?,
        notes: non_blank(form.notes),
    };

    load_country(&state, id).await?;
    let existing = state.tracking.list_government_entities(id).await?;
    let fresh = new_only(vec![draft], &existing);
    nothing_new(TrackedList::GovernmentMessaging, &fresh)?;

    let created = state.tracking.add_government_entities(id, &fresh).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/v1/countries/:id/government-messaging/generate
pub async fn handle_generate_government_entities(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<GovernmentEntity>>, AppError> {
    let country = load_country(&state, id).await?;
    let existing = state.tracking.list_government_entities(id).await?;
    let fresh =
        generator::government_entities(state.completion.as_ref(), &country.name, &existing)
            .await?;
    Ok(Json(state.tracking.add_government_entities(id, &fresh).await?))
}

/// DELETE /api/v1/countries/:id/government-messaging/:item_id
pub async fn handle_delete_government_entity(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    delete_item(&state, TrackedList::GovernmentMessaging, id, item_id).await
}

// Leadership messaging

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderForm {
    pub name: Option<String>,
    pub title: Option<String>,
    pub handle: Option<String>,
    pub political_leaning: Option<String>,
}

/// GET /api/v1/countries/:id/leadership-messaging
pub async fn handle_list_leaders(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Leader>>, AppError> {
    load_country(&state, id).await?;
    Ok(Json(state.tracking.list_leaders(id).await?))
}

/// POST /api/v1/countries/:id/leadership-messaging
pub async fn handle_add_leader(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<LeaderForm>,
) -> Result<Created<Leader>, AppError> {
    let draft = LeaderDraft {
        name: required(form.name, "Name")?,
        title: required(form.title, "Title")?,
        handle: required(form.handle, "Handle")?,
        political_leaning: non_blank(form.political_leaning),
    };

    load_country(&state, id).await?;
    let existing = state.tracking.list_leaders(id).await?;
    let fresh = new_only(vec![draft], &existing);
    nothing_new(TrackedList::LeadershipMessaging, &fresh)?;

    let created = state.tracking.add_leaders(id, &fresh).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/v1/countries/:id/leadership-messaging/generate
pub async fn handle_generate_leaders(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Leader>>, AppError> {
    let country = load_country(&state, id).await?;
    let existing = state.tracking.list_leaders(id).await?;
    let fresh = generator::leaders(state.completion.as_ref(), &country.name, &existing).await?;
    Ok(Json(state.tracking.add_leaders(id, &fresh).await?))
}

/// DELETE /api/v1/countries/:id/leadership-messaging/:item_id
pub async fn handle_delete_leader(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    delete_item(&state, TrackedList::LeadershipMessaging, id, item_id).await
}

// Emergency numbers

#[derive(Debug, Deserialize)]
pub struct EmergencyNumberForm {
    pub name: Option<String>,
    pub number: Option<String>,
}

/// GET /api/v1/countries/:id/emergency-numbers
///
/// `{"numbers": [...]}`, oldest first.
pub async fn handle_list_emergency_numbers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    load_country(&state, id).await?;
    let numbers = state.tracking.list_emergency_numbers(id).await?;
    Ok(Json(json!({ "numbers": numbers })))
}

/// POST /api/v1/countries/:id/emergency-numbers
pub async fn handle_add_emergency_number(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<EmergencyNumberForm>,
) -> Result<Created<EmergencyNumber>, AppError> {
    let draft = EmergencyNumberDraft {
        name: required(form.name, "Name")?,
        number: required(form.number, "Number")?,
    };

    load_country(&state, id).await?;
    let existing = state.tracking.list_emergency_numbers(id).await?;
    let fresh = new_only(vec![draft], &existing);
    nothing_new(TrackedList::EmergencyNumbers, &fresh)?;

    let created = state.tracking.add_emergency_numbers(id, &fresh).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /api/v1/countries/:id/emergency-numbers/:item_id
pub async fn handle_delete_emergency_number(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    delete_item(&state, TrackedList::EmergencyNumbers, id, item_id).await
}

// Embassy and ambassador presence

#[derive(Debug, Deserialize)]
pub struct PresenceForm {
    pub handle: Option<String>,
}

async fn presence_or_404(
    state: &AppState,
    id: Uuid,
    kind: PresenceKind,
) -> Result<Presence, AppError> {
    state
        .tracking
        .get_presence(id, kind)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No handle tracked for {}", kind.subject())))
}

/// GET /api/v1/countries/:id/presence/:kind
pub async fn handle_get_presence(
    State(state): State<AppState>,
    Path((id, kind)): Path<(Uuid, String)>,
) -> Result<Json<Presence>, AppError> {
    let kind = PresenceKind::parse(&kind)?;
    load_country(&state, id).await?;
    Ok(Json(presence_or_404(&state, id, kind).await?))
}

/// PUT /api/v1/countries/:id/presence/:kind
pub async fn handle_set_presence(
    State(state): State<AppState>,
    Path((id, kind)): Path<(Uuid, String)>,
    Json(form): Json<PresenceForm>,
) -> Result<Json<Presence>, AppError> {
    let kind = PresenceKind::parse(&kind)?;
    let handle = required(form.handle, "Handle")?;
    load_country(&state, id).await?;
    Ok(Json(state.tracking.set_presence(id, kind, &handle).await?))
}

/// DELETE /api/v1/countries/:id/presence/:kind
pub async fn handle_delete_presence(
    State(state): State<AppState>,
    Path((id, kind)): Path<(Uuid, String)>,
) -> Result<StatusCode, AppError> {
    let kind = PresenceKind::parse(&kind)?;
    if !state.tracking.delete_presence(id, kind).await? {
        return Err(AppError::NotFound(format!(
            "No handle tracked for {}",
            kind.subject()
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/countries/:id/presence/:kind/generate
///
/// Replaces the stored handle. A model answer of `N/A` is a 404 and leaves the
/// stored handle alone.
pub async fn handle_generate_presence(
    State(state): State<AppState>,
    Path((id, kind)): Path<(Uuid, String)>,
) -> Result<Json<Presence>, AppError> {
    let kind = PresenceKind::parse(&kind)?;
    let country = load_country(&state, id).await?;
    let existing = state.tracking.get_presence(id, kind).await?;

    let handle = generator::presence_handle(
        state.completion.as_ref(),
        &country.name,
        kind,
        existing.as_ref(),
    )
    .await?
    .ok_or_else(|| {
        AppError::NotFound(format!("No Twitter handle found for {}", kind.subject()))
    })?;

    Ok(Json(state.tracking.set_presence(id, kind, &handle).await?))
}
