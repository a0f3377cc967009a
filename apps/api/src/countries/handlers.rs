//! Axum route handlers for country profiles.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::country::{Country, CountryDetails, SectionKey};
use crate::state::AppState;

/// Body of country create and edit.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryForm {
    pub name: Option<String>,
    pub code: Option<String>,
    pub embassy_in_us_url: Option<String>,
    pub us_embassy_url: Option<String>,
}

impl CountryForm {
    fn validate(self) -> Result<CountryDetails, AppError> {
        let name = non_blank(self.name)
            .ok_or_else(|| AppError::Validation("Name is required".to_string()))?;
        let code = non_blank(self.code)
            .ok_or_else(|| AppError::Validation("Code is required".to_string()))?
            .to_ascii_uppercase();
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(AppError::Validation(
                "Code must be a two-letter ISO country code".to_string(),
            ));
        }

        Ok(CountryDetails {
            name,
            code,
            embassy_in_us_url: non_blank(self.embassy_in_us_url),
            us_embassy_url: non_blank(self.us_embassy_url),
        })
    }
}

/// Trimmed value, or `None` when absent or blank.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub section: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSectionRequest {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionContent {
    pub section: SectionKey,
    pub content: Option<String>,
}

/// Resolves a country id or fails with 404.
pub async fn load_country(state: &AppState, id: Uuid) -> Result<Country, AppError> {
    state
        .countries
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Country not found".to_string()))
}

/// GET /api/v1/countries
pub async fn handle_list_countries(
    State(state): State<AppState>,
) -> Result<Json<Vec<Country>>, AppError> {
    Ok(Json(state.countries.list().await?))
}

/// POST /api/v1/countries
pub async fn handle_create_country(
    State(state): State<AppState>,
    Json(form): Json<CountryForm>,
) -> Result<(StatusCode, Json<Country>), AppError> {
    let details = form.validate()?;
    let country = state.countries.create(&details).await?;
    Ok((StatusCode::CREATED, Json(country)))
}

/// PUT /api/v1/countries/:id
///
/// Edits name, code and embassy URLs. Sections are left alone.
pub async fn handle_update_country(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<CountryForm>,
) -> Result<Json<Country>, AppError> {
    let details = form.validate()?;
    let country = state
        .countries
        .update_details(id, &details)
        .await?
        .ok_or_else(|| AppError::NotFound("Country not found".to_string()))?;
    Ok(Json(country))
}

/// GET /api/v1/countries/:id/embassies
pub async fn handle_get_embassies(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let country = load_country(&state, id).await?;
    Ok(Json(json!({
        "embassies": {
            "embassyInUs": country.embassy_in_us_url,
            "usEmbassy": country.us_embassy_url,
        }
    })))
}

/// GET /api/v1/countries/:id/profile[?section=]
///
/// Whole profile, or `{section, content}` when a section is named.
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ProfileQuery>,
) -> Result<Response, AppError> {
    let section = query
        .section
        .as_deref()
        .map(str::parse::<SectionKey>)
        .transpose()?;
    let country = load_country(&state, id).await?;

    Ok(match section {
        Some(section) => Json(SectionContent {
            section,
            content: country.section(section).map(String::from),
        })
        .into_response(),
        None => Json(country).into_response(),
    })
}

/// PUT /api/v1/countries/:id/sections/:section
pub async fn handle_update_section(
    State(state): State<AppState>,
    Path((id, section)): Path<(Uuid, String)>,
    Json(request): Json<UpdateSectionRequest>,
) -> Result<Json<SectionContent>, AppError> {
    let section: SectionKey = section.parse()?;

    if !state
        .countries
        .update_section(id, section, &request.content)
        .await?
    {
        return Err(AppError::NotFound("Country not found".to_string()));
    }

    Ok(Json(SectionContent {
        section,
        content: Some(request.content),
    }))
}
