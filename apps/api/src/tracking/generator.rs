//! Turns completion replies into monitoring-list drafts.
//!
//! List replies are one entry per line. Record replies are `key: value` blocks
//! separated by blank lines; keys are matched case-insensitively with spaces and
//! underscores treated alike. Entries missing a required field are dropped, as are
//! entries already tracked.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::llm_client::{strip_code_fences, CompletionService, LlmError};
use crate::models::tracking::{
    new_only, GovernmentEntity, GovernmentEntityDraft, Influencer, InfluencerDraft, Keyword,
    Leader, LeaderDraft, NewsSource, NewsSourceDraft, Presence, PresenceKind, LEANING_RANGE,
};
use crate::tracking::prompts;

/// One `key: value` block.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Record(HashMap<String, String>);

impl Record {
    /// Non-empty value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Option<String> {
        self.get(key).map(String::from)
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Non-empty lines with list markers (`-`, `*`, `•`, `1.`) removed.
pub fn parse_lines(reply: &str) -> Vec<String> {
    strip_code_fences(reply)
        .lines()
        .map(|line| {
            let line = line.trim().trim_start_matches(['-', '*', '•']).trim_start();
            let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            match line[digits..].strip_prefix(['.', ')']) {
                Some(rest) if digits > 0 => rest.trim(),
                _ => line,
            }
        })
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Splits a reply into records. A blank line ends a record; so does a key that
/// repeats within the current one.
pub fn parse_records(reply: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut current = Record::default();

    for line in strip_code_fences(reply).lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.0.is_empty() {
                records.push(std::mem::take(&mut current));
            }
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = normalize_key(key);
        if current.0.contains_key(&key) {
            records.push(std::mem::take(&mut current));
        }
        current.0.insert(key, value.trim().to_string());
    }
    if !current.0.is_empty() {
        records.push(current);
    }
    records
}

impl NewsSourceDraft {
    pub fn from_record(record: &Record) -> Option<Self> {
        Some(NewsSourceDraft {
            name: record.required("name")?,
            url: record.required("url")?,
            notes: record.get("notes").map(String::from),
        })
    }
}

impl InfluencerDraft {
    /// A missing leaning reads as 0; an unparseable or out-of-range one drops the entry.
    pub fn from_record(record: &Record) -> Option<Self> {
        let political_leaning = match record.get("political_leaning") {
            Some(raw) => raw.parse::<f64>().ok().filter(|l| LEANING_RANGE.contains(l))?,
            None => 0.0,
        };
        Some(InfluencerDraft {
            name: record.required("name")?,
            handle: record.required("handle")?,
            role: record.required("role")?,
            political_leaning,
            url: record.required("url")?,
        })
    }
}

impl GovernmentEntityDraft {
    pub fn from_record(record: &Record) -> Option<Self> {
        Some(GovernmentEntityDraft {
            name: record.required("name")?,
            handle: record.required("handle")?,
            notes: record.get("notes").map(String::from),
        })
    }
}

impl LeaderDraft {
    pub fn from_record(record: &Record) -> Option<Self> {
        Some(LeaderDraft {
            name: record.required("name")?,
            title: record.required("title")?,
            handle: record.required("handle")?,
            political_leaning: record.get("political_leaning").map(String::from),
        })
    }
}

/// The handle in a presence reply, or `None` for an empty or `N/A` answer.
pub fn parse_handle(reply: &str) -> Option<String> {
    let handle = strip_code_fences(reply).trim();
    if handle.is_empty() || handle.eq_ignore_ascii_case("n/a") {
        None
    } else {
        Some(handle.to_string())
    }
}

fn drafts<T>(reply: &str, from_record: impl Fn(&Record) -> Option<T>) -> Vec<T> {
    let records = parse_records(reply);
    let total = records.len();
    let drafts: Vec<T> = records.iter().filter_map(from_record).collect();
    if drafts.len() < total {
        debug!("dropped {} incomplete record(s)", total - drafts.len());
    }
    drafts
}

pub async fn keywords(
    llm: &dyn CompletionService,
    country: &str,
    existing: &[Keyword],
) -> Result<Vec<String>, LlmError> {
    let names: Vec<String> = existing.iter().map(|k| k.keyword.clone()).collect();
    let reply = llm
        .complete(prompts::KEYWORDS_SYSTEM, &prompts::keywords_prompt(country, &names))
        .await?;
    let fresh = new_only(parse_lines(&reply), existing);
    info!(country, count = fresh.len(), "keywords generated");
    Ok(fresh)
}

pub async fn news_sources(
    llm: &dyn CompletionService,
    country: &str,
    existing: &[NewsSource],
) -> Result<Vec<NewsSourceDraft>, LlmError> {
    let names: Vec<String> = existing
        .iter()
        .map(|s| format!("{} ({})", s.name, s.url))
        .collect();
    let reply = llm
        .complete(prompts::NEWS_SOURCES_SYSTEM, &prompts::news_sources_prompt(country, &names))
        .await?;
    let fresh = new_only(drafts(&reply, NewsSourceDraft::from_record), existing);
    info!(country, count = fresh.len(), "news sources generated");
    Ok(fresh)
}

pub async fn influencers(
    llm: &dyn CompletionService,
    country: &str,
    existing: &[Influencer],
) -> Result<Vec<InfluencerDraft>, LlmError> {
    let names: Vec<String> = existing
        .iter()
        .map(|i| format!("{} ({})", i.name, i.handle))
        .collect();
    let reply = llm
        .complete(prompts::INFLUENCERS_SYSTEM, &prompts::influencers_prompt(country, &names))
        .await?;
    let fresh = new_only(drafts(&reply, InfluencerDraft::from_record), existing);
    info!(country, count = fresh.len(), "influencers generated");
    Ok(fresh)
}

pub async fn government_entities(
    llm: &dyn CompletionService,
    country: &str,
    existing: &[GovernmentEntity],
) -> Result<Vec<GovernmentEntityDraft>, LlmError> {
    let names: Vec<String> = existing
        .iter()
        .map(|e| format!("{} ({})", e.name, e.handle))
        .collect();
    let reply = llm
        .complete(prompts::GOVERNMENT_SYSTEM, &prompts::government_prompt(country, &names))
        .await?;
    let fresh = new_only(drafts(&reply, GovernmentEntityDraft::from_record), existing);
    info!(country, count = fresh.len(), "government entities generated");
    Ok(fresh)
}

pub async fn leaders(
    llm: &dyn CompletionService,
    country: &str,
    existing: &[Leader],
) -> Result<Vec<LeaderDraft>, LlmError> {
    let names: Vec<String> = existing
        .iter()
        .map(|l| format!("{}, {} ({})", l.name, l.title, l.handle))
        .collect();
    let reply = llm
        .complete(prompts::LEADERSHIP_SYSTEM, &prompts::leadership_prompt(country, &names))
        .await?;
    let fresh = new_only(drafts(&reply, LeaderDraft::from_record), existing);
    info!(country, count = fresh.len(), "leaders generated");
    Ok(fresh)
}

/// `Ok(None)` when the model reports no such account.
pub async fn presence_handle(
    llm: &dyn CompletionService,
    country: &str,
    kind: PresenceKind,
    existing: Option<&Presence>,
) -> Result<Option<String>, LlmError> {
    let prompt = prompts::presence_prompt(country, kind, existing.map(|p| p.handle.as_str()));
    let reply = llm.complete(prompts::PRESENCE_SYSTEM, &prompt).await?;
    Ok(parse_handle(&reply))
}
