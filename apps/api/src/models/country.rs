use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;

/// The closed set of profile sections a generation job can populate.
///
/// Wire and database form is camelCase (`humanRights`); each variant owns
/// exactly one `countries` column and one `Country` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "camelCase")]
#[sqlx(type_name = "text", rename_all = "camelCase")]
pub enum SectionKey {
    Overview,
    Demographics,
    Politics,
    Religion,
    Economy,
    Culture,
    Media,
    HumanRights,
    History,
    HumanDevelopment,
    Diplomacy,
    PoliticalLeadership,
    MilitaryLeadership,
}

impl SectionKey {
    pub const ALL: [SectionKey; 13] = [
        SectionKey::Overview,
        SectionKey::Demographics,
        SectionKey::Politics,
        SectionKey::Religion,
        SectionKey::Economy,
        SectionKey::Culture,
        SectionKey::Media,
        SectionKey::HumanRights,
        SectionKey::History,
        SectionKey::HumanDevelopment,
        SectionKey::Diplomacy,
        SectionKey::PoliticalLeadership,
        SectionKey::MilitaryLeadership,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKey::Overview => "overview",
            SectionKey::Demographics => "demographics",
            SectionKey::Politics => "politics",
            SectionKey::Religion => "religion",
            SectionKey::Economy => "economy",
            SectionKey::Culture => "culture",
            SectionKey::Media => "media",
            SectionKey::HumanRights => "humanRights",
            SectionKey::History => "history",
            SectionKey::HumanDevelopment => "humanDevelopment",
            SectionKey::Diplomacy => "diplomacy",
            SectionKey::PoliticalLeadership => "politicalLeadership",
            SectionKey::MilitaryLeadership => "militaryLeadership",
        }
    }

    /// The `countries` column backing this section. Static strings only, so the
    /// value is safe to splice into SQL.
    pub fn column(&self) -> &'static str {
        match self {
            SectionKey::Overview => "overview",
            SectionKey::Demographics => "demographics",
            SectionKey::Politics => "politics",
            SectionKey::Religion => "religion",
            SectionKey::Economy => "economy",
            SectionKey::Culture => "culture",
            SectionKey::Media => "media",
            SectionKey::HumanRights => "human_rights",
            SectionKey::History => "history",
            SectionKey::HumanDevelopment => "human_development",
            SectionKey::Diplomacy => "diplomacy",
            SectionKey::PoliticalLeadership => "political_leadership",
            SectionKey::MilitaryLeadership => "military_leadership",
        }
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("Unknown section '{s}'")))
    }
}

/// Identity fields of a country, as submitted on create and edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryDetails {
    pub name: String,
    /// Two-letter ISO code, upper case.
    pub code: String,
    pub embassy_in_us_url: Option<String>,
    pub us_embassy_url: Option<String>,
}

impl CountryDetails {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        CountryDetails {
            name: name.into(),
            code: code.into(),
            embassy_in_us_url: None,
            us_embassy_url: None,
        }
    }
}

/// A country briefing profile. Section fields are plain optional text,
/// overwritten wholesale on commit or manual edit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub embassy_in_us_url: Option<String>,
    pub us_embassy_url: Option<String>,
    pub overview: Option<String>,
    pub demographics: Option<String>,
    pub politics: Option<String>,
    pub religion: Option<String>,
    pub economy: Option<String>,
    pub culture: Option<String>,
    pub media: Option<String>,
    pub human_rights: Option<String>,
    pub history: Option<String>,
    pub human_development: Option<String>,
    pub diplomacy: Option<String>,
    pub political_leadership: Option<String>,
    pub military_leadership: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Country {
    pub fn new(details: CountryDetails) -> Self {
        let now = Utc::now();
        Country {
            id: Uuid::new_v4(),
            name: details.name,
            code: details.code,
            embassy_in_us_url: details.embassy_in_us_url,
            us_embassy_url: details.us_embassy_url,
            overview: None,
            demographics: None,
            politics: None,
            religion: None,
            economy: None,
            culture: None,
            media: None,
            human_rights: None,
            history: None,
            human_development: None,
            diplomacy: None,
            political_leadership: None,
            military_leadership: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn slot(&mut self, key: SectionKey) -> &mut Option<String> {
        match key {
            SectionKey::Overview => &mut self.overview,
            SectionKey::Demographics => &mut self.demographics,
            SectionKey::Politics => &mut self.politics,
            SectionKey::Religion => &mut self.religion,
            SectionKey::Economy => &mut self.economy,
            SectionKey::Culture => &mut self.culture,
            SectionKey::Media => &mut self.media,
            SectionKey::HumanRights => &mut self.human_rights,
            SectionKey::History => &mut self.history,
            SectionKey::HumanDevelopment => &mut self.human_development,
            SectionKey::Diplomacy => &mut self.diplomacy,
            SectionKey::PoliticalLeadership => &mut self.political_leadership,
            SectionKey::MilitaryLeadership => &mut self.military_leadership,
        }
    }

    pub fn section(&self, key: SectionKey) -> Option<&str> {
        let value = match key {
            SectionKey::Overview => &self.overview,
            SectionKey::Demographics => &self.demographics,
            SectionKey::Politics => &self.politics,
            SectionKey::Religion => &self.religion,
            SectionKey::Economy => &self.economy,
            SectionKey::Culture => &self.culture,
            SectionKey::Media => &self.media,
            SectionKey::HumanRights => &self.human_rights,
            SectionKey::History => &self.history,
            SectionKey::HumanDevelopment => &self.human_development,
            SectionKey::Diplomacy => &self.diplomacy,
            SectionKey::PoliticalLeadership => &self.political_leadership,
            SectionKey::MilitaryLeadership => &self.military_leadership,
        };
        value.as_deref()
    }

    pub fn set_section(&mut self, key: SectionKey, content: String) {
        *self.slot(key) = Some(content);
        self.updated_at = Utc::now();
    }

    /// Replaces the identity fields, leaving every section untouched.
    pub fn set_details(&mut self, details: CountryDetails) {
        self.name = details.name;
        self.code = details.code;
        self.embassy_in_us_url = details.embassy_in_us_url;
        self.us_embassy_url = details.us_embassy_url;
        self.updated_at = Utc::now();
    }
}
