//! In-memory test doubles for the repository traits and the completion service.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::countries::repository::CountryRepository;
use crate::errors::AppError;
use crate::feeds::repository::{FeedRecord, ScrapedFeedRepository};
use crate::generation::repository::GenerationRepository;
use crate::llm_client::{CompletionService, LlmError};
use crate::models::country::{Country, CountryDetails, SectionKey};
use crate::models::feed::ScrapedFeed;
use crate::models::generation::{GenerationJob, GenerationStatus};
use crate::models::tracking::{
    EmergencyNumber, EmergencyNumberDraft, GovernmentEntity, GovernmentEntityDraft, Influencer,
    InfluencerDraft, Keyword, KeywordList, Leader, LeaderDraft, NewsSource, NewsSourceDraft,
    Presence, PresenceKind, TrackedList,
};
use crate::tracking::repository::TrackingRepository;

/// One store implementing every repository trait, so commit can touch both
/// jobs and countries under one lock order (jobs, then countries).
#[derive(Default)]
pub struct MemoryStore {
    countries: Mutex<Vec<Country>>,
    jobs: Mutex<HashMap<Uuid, GenerationJob>>,
    feeds: Mutex<Vec<ScrapedFeed>>,
    next_feed_id: AtomicI64,
    fail_status_writes: AtomicBool,
    keywords: Mutex<Vec<(KeywordList, Keyword)>>,
    news_sources: Mutex<Vec<NewsSource>>,
    influencers: Mutex<Vec<Influencer>>,
    government: Mutex<Vec<GovernmentEntity>>,
    leaders: Mutex<Vec<Leader>>,
    emergency_numbers: Mutex<Vec<EmergencyNumber>>,
    presences: Mutex<HashMap<(Uuid, PresenceKind), Presence>>,
}

impl MemoryStore {
    /// Each country gets the first two letters of its name as its code.
    pub fn with_countries(names: &[&str]) -> Self {
        let store = MemoryStore::default();
        store.countries.lock().unwrap().extend(names.iter().map(|n| {
            let code: String = n.chars().take(2).collect();
            Country::new(CountryDetails::new(*n, code.to_uppercase()))
        }));
        store
    }

    pub fn country(&self, name: &str) -> Country {
        self.countries
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .unwrap_or_else(|| panic!("no country named {name}"))
    }

    pub fn remove_country(&self, name: &str) {
        self.countries.lock().unwrap().retain(|c| c.name != name);
    }

    /// Drops a feed's stored content, as left by an interrupted scrape.
    pub fn clear_feed_content(&self, id: i64) {
        if let Some(feed) = self.feeds.lock().unwrap().iter_mut().find(|f| f.id == id) {
            feed.content = None;
        }
    }

    /// Makes `mark_completed` / `mark_error` fail, as if the database went away.
    pub fn fail_status_writes(&self, fail: bool) {
        self.fail_status_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), AppError> {
        if self.fail_status_writes.load(Ordering::SeqCst) {
            return Err(AppError::Internal(anyhow!("database unavailable")));
        }
        Ok(())
    }

    fn transition(
        &self,
        id: Uuid,
        from: GenerationStatus,
        apply: impl FnOnce(&mut GenerationJob),
    ) -> bool {
        let mut jobs = self.jobs.lock().unwrap();
        match jobs.get_mut(&id) {
            Some(job) if job.status == from => {
                apply(job);
                job.updated_at = Utc::now();
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl CountryRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Country>, AppError> {
        let mut countries = self.countries.lock().unwrap().clone();
        countries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(countries)
    }

    async fn create(&self, details: &CountryDetails) -> Result<Country, AppError> {
        let mut countries = self.countries.lock().unwrap();
        if countries
            .iter()
            .any(|c| c.name == details.name || c.code == details.code)
        {
            return Err(AppError::Conflict("Country already exists".to_string()));
        }
        let country = Country::new(details.clone());
        countries.push(country.clone());
        Ok(country)
    }

    async fn update_details(
        &self,
        id: Uuid,
        details: &CountryDetails,
    ) -> Result<Option<Country>, AppError> {
        let mut countries = self.countries.lock().unwrap();
        if countries
            .iter()
            .any(|c| c.id != id && (c.name == details.name || c.code == details.code))
        {
            return Err(AppError::Conflict("Country already exists".to_string()));
        }
        Ok(countries.iter_mut().find(|c| c.id == id).map(|country| {
            country.set_details(details.clone());
            country.clone()
        }))
    }

    async fn find(&self, id: Uuid) -> Result<Option<Country>, AppError> {
        Ok(self
            .countries
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Country>, AppError> {
        Ok(self
            .countries
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn update_section(
        &self,
        id: Uuid,
        section: SectionKey,
        content: &str,
    ) -> Result<bool, AppError> {
        let mut countries = self.countries.lock().unwrap();
        match countries.iter_mut().find(|c| c.id == id) {
            Some(country) => {
                country.set_section(section, content.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl GenerationRepository for MemoryStore {
    async fn insert(&self, job: &GenerationJob) -> Result<(), AppError> {
        self.jobs.lock().unwrap().insert(job.id, job.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<GenerationJob>, AppError> {
        Ok(self.jobs.lock().unwrap().get(&id).cloned())
    }

    async fn mark_completed(&self, id: Uuid, content: &str) -> Result<bool, AppError> {
        self.check_writable()?;
        Ok(self.transition(id, GenerationStatus::Pending, |job| {
            job.status = GenerationStatus::Completed;
            job.content = Some(content.to_string());
        }))
    }

    async fn mark_error(&self, id: Uuid, error: &str) -> Result<bool, AppError> {
        self.check_writable()?;
        Ok(self.transition(id, GenerationStatus::Pending, |job| {
            job.status = GenerationStatus::Error;
            job.error = Some(error.to_string());
        }))
    }

    async fn list_for_country(
        &self,
        country_name: &str,
        statuses: &[GenerationStatus],
    ) -> Result<Vec<GenerationJob>, AppError> {
        let mut jobs: Vec<GenerationJob> = self
            .jobs
            .lock()
            .unwrap()
            .values()
            .filter(|j| j.country_name == country_name && statuses.contains(&j.status))
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.created_at);
        Ok(jobs)
    }

    async fn commit(&self, id: Uuid, country_id: Uuid) -> Result<GenerationJob, AppError> {
        let mut jobs = self.jobs.lock().unwrap();
        let mut countries = self.countries.lock().unwrap();

        let job = jobs
            .get_mut(&id)
            .filter(|j| j.status == GenerationStatus::Completed)
            .ok_or_else(|| AppError::Conflict(format!("Generation {id} is not COMPLETED")))?;
        let country = countries
            .iter_mut()
            .find(|c| c.id == country_id)
            .ok_or_else(|| AppError::NotFound(format!("Country {country_id} not found")))?;

        country.set_section(job.section, job.content.clone().unwrap_or_default());
        job.status = GenerationStatus::Saved;
        job.updated_at = Utc::now();
        Ok(job.clone())
    }

    async fn fail_pending(&self, error: &str) -> Result<u64, AppError> {
        let mut count = 0;
        for job in self.jobs.lock().unwrap().values_mut() {
            if job.status == GenerationStatus::Pending {
                job.status = GenerationStatus::Error;
                job.error = Some(error.to_string());
                count += 1;
            }
        }
        Ok(count)
    }
}

#[async_trait]
impl ScrapedFeedRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<ScrapedFeed>, AppError> {
        let mut feeds = self.feeds.lock().unwrap().clone();
        feeds.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(feeds)
    }

    async fn find(&self, id: i64) -> Result<Option<ScrapedFeed>, AppError> {
        Ok(self.feeds.lock().unwrap().iter().find(|f| f.id == id).cloned())
    }

    async fn create(&self, record: FeedRecord) -> Result<ScrapedFeed, AppError> {
        let now = Utc::now();
        let feed = ScrapedFeed {
            id: self.next_feed_id.fetch_add(1, Ordering::SeqCst) + 1,
            country_id: record.country_id,
            url: record.url,
            feed_type: record.feed_type,
            content: Some(record.content),
            created_at: now,
            updated_at: now,
        };
        self.feeds.lock().unwrap().push(feed.clone());
        Ok(feed)
    }

    async fn update(&self, id: i64, record: FeedRecord) -> Result<Option<ScrapedFeed>, AppError> {
        let mut feeds = self.feeds.lock().unwrap();
        Ok(feeds.iter_mut().find(|f| f.id == id).map(|feed| {
            feed.country_id = record.country_id;
            feed.url = record.url;
            feed.feed_type = record.feed_type;
            feed.content = Some(record.content);
            feed.updated_at = Utc::now();
            feed.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut feeds = self.feeds.lock().unwrap();
        let before = feeds.len();
        feeds.retain(|f| f.id != id);
        Ok(feeds.len() != before)
    }
}

fn remove_by_id<T>(items: &Mutex<Vec<T>>, matches: impl Fn(&T) -> bool) -> bool {
    let mut items = items.lock().unwrap();
    let before = items.len();
    items.retain(|item| !matches(item));
    items.len() != before
}

#[async_trait]
impl TrackingRepository for MemoryStore {
    async fn list_keywords(
        &self,
        country_id: Uuid,
        list: KeywordList,
    ) -> Result<Vec<Keyword>, AppError> {
        Ok(self
            .keywords
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, k)| *l == list && k.country_id == country_id)
            .map(|(_, k)| k.clone())
            .collect())
    }

    async fn add_keywords(
        &self,
        country_id: Uuid,
        list: KeywordList,
        keywords: &[String],
    ) -> Result<Vec<Keyword>, AppError> {
        let created: Vec<Keyword> = keywords
            .iter()
            .map(|keyword| Keyword {
                id: Uuid::new_v4(),
                country_id,
                keyword: keyword.clone(),
                created_at: Utc::now(),
            })
            .collect();
        self.keywords
            .lock()
            .unwrap()
            .extend(created.iter().map(|k| (list, k.clone())));
        Ok(created)
    }

    async fn list_news_sources(&self, country_id: Uuid) -> Result<Vec<NewsSource>, AppError> {
        Ok(of_country(&self.news_sources, |s| s.country_id == country_id))
    }

    async fn add_news_sources(
        &self,
        country_id: Uuid,
        drafts: &[NewsSourceDraft],
    ) -> Result<Vec<NewsSource>, AppError> {
        let created: Vec<NewsSource> = drafts
            .iter()
            .map(|d| NewsSource {
                id: Uuid::new_v4(),
                country_id,
                name: d.name.clone(),
                url: d.url.clone(),
                notes: d.notes.clone(),
                created_at: Utc::now(),
            })
            .collect();
        self.news_sources.lock().unwrap().extend(created.clone());
        Ok(created)
    }

    async fn list_influencers(&self, country_id: Uuid) -> Result<Vec<Influencer>, AppError> {
        Ok(of_country(&self.influencers, |i| i.country_id == country_id))
    }

    async fn add_influencers(
        &self,
        country_id: Uuid,
        drafts: &[InfluencerDraft],
    ) -> Result<Vec<Influencer>, AppError> {
        let created: Vec<Influencer> = drafts
            .iter()
            .map(|d| Influencer {
                id: Uuid::new_v4(),
                country_id,
                name: d.name.clone(),
                handle: d.handle.clone(),
                role: d.role.clone(),
                political_leaning: d.political_leaning,
                url: d.url.clone(),
                created_at: Utc::now(),
            })
            .collect();
        self.influencers.lock().unwrap().extend(created.clone());
        Ok(created)
    }

    async fn list_government_entities(
        &self,
        country_id: Uuid,
    ) -> Result<Vec<GovernmentEntity>, AppError> {
        Ok(of_country(&self.government, |e| e.country_id == country_id))
    }

    async fn add_government_entities(
        &self,
        country_id: Uuid,
        drafts: &[GovernmentEntityDraft],
    ) -> Result<Vec<GovernmentEntity>, AppError> {
        let created: Vec<GovernmentEntity> = drafts
            .iter()
            .map(|d| GovernmentEntity {
                id: Uuid::new_v4(),
                country_id,
                name: d.name.clone(),
                handle: d.handle.clone(),
                notes: d.notes.clone(),
                created_at: Utc::now(),
            })
            .collect();
        self.government.lock().unwrap().extend(created.clone());
        Ok(created)
    }

    async fn list_leaders(&self, country_id: Uuid) -> Result<Vec<Leader>, AppError> {
        Ok(of_country(&self.leaders, |l| l.country_id == country_id))
    }

    async fn add_leaders(
        &self,
        country_id: Uuid,
        drafts: &[LeaderDraft],
    ) -> Result<Vec<Leader>, AppError> {
        let created: Vec<Leader> = drafts
            .iter()
            .map(|d| Leader {
                id: Uuid::new_v4(),
                country_id,
                name: d.name.clone(),
                title: d.title.clone(),
                handle: d.handle.clone(),
                political_leaning: d.political_leaning.clone(),
                created_at: Utc::now(),
            })
            .collect();
        self.leaders.lock().unwrap().extend(created.clone());
        Ok(created)
    }

    async fn list_emergency_numbers(
        &self,
        country_id: Uuid,
    ) -> Result<Vec<EmergencyNumber>, AppError> {
        Ok(of_country(&self.emergency_numbers, |n| n.country_id == country_id))
    }

    async fn add_emergency_numbers(
        &self,
        country_id: Uuid,
        drafts: &[EmergencyNumberDraft],
    ) -> Result<Vec<EmergencyNumber>, AppError> {
        let created: Vec<EmergencyNumber> = drafts
            .iter()
            .map(|d| EmergencyNumber {
                id: Uuid::new_v4(),
                country_id,
                name: d.name.clone(),
                number: d.number.clone(),
                created_at: Utc::now(),
            })
            .collect();
        self.emergency_numbers.lock().unwrap().extend(created.clone());
        Ok(created)
    }

    async fn delete_item(
        &self,
        list: TrackedList,
        country_id: Uuid,
        item_id: Uuid,
    ) -> Result<bool, AppError> {
        Ok(match list {
            TrackedList::Keywords | TrackedList::UsMentionKeywords => {
                let mut keywords = self.keywords.lock().unwrap();
                let before = keywords.len();
                keywords.retain(|(l, k)| {
                    !(l.tracked() == list && k.country_id == country_id && k.id == item_id)
                });
                keywords.len() != before
            }
            TrackedList::NewsSources => remove_by_id(&self.news_sources, |s| {
                s.country_id == country_id && s.id == item_id
            }),
            TrackedList::Influencers => remove_by_id(&self.influencers, |i| {
                i.country_id == country_id && i.id == item_id
            }),
            TrackedList::GovernmentMessaging => remove_by_id(&self.government, |e| {
                e.country_id == country_id && e.id == item_id
            }),
            TrackedList::LeadershipMessaging => remove_by_id(&self.leaders, |l| {
                l.country_id == country_id && l.id == item_id
            }),
            TrackedList::EmergencyNumbers => remove_by_id(&self.emergency_numbers, |n| {
                n.country_id == country_id && n.id == item_id
            }),
        })
    }

    async fn get_presence(
        &self,
        country_id: Uuid,
        kind: PresenceKind,
    ) -> Result<Option<Presence>, AppError> {
        Ok(self.presences.lock().unwrap().get(&(country_id, kind)).cloned())
    }

    async fn set_presence(
        &self,
        country_id: Uuid,
        kind: PresenceKind,
        handle: &str,
    ) -> Result<Presence, AppError> {
        let presence = Presence {
            country_id,
            kind,
            handle: handle.to_string(),
            updated_at: Utc::now(),
        };
        self.presences
            .lock()
            .unwrap()
            .insert((country_id, kind), presence.clone());
        Ok(presence)
    }

    async fn delete_presence(
        &self,
        country_id: Uuid,
        kind: PresenceKind,
    ) -> Result<bool, AppError> {
        Ok(self
            .presences
            .lock()
            .unwrap()
            .remove(&(country_id, kind))
            .is_some())
    }
}

fn of_country<T: Clone>(items: &Mutex<Vec<T>>, matches: impl Fn(&T) -> bool) -> Vec<T> {
    items.lock().unwrap().iter().filter(|i| matches(i)).cloned().collect()
}

/// Completion service that replays canned replies in call order.
///
/// `Err(msg)` replies surface as provider API errors. When gated, each call
/// waits for one semaphore permit before replying.
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String, String>>>,
    gate: Option<Arc<Semaphore>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedCompletion {
    pub fn replying(replies: Vec<Result<String, String>>) -> Self {
        ScriptedCompletion {
            replies: Mutex::new(replies.into()),
            gate: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn gated(replies: Vec<Result<String, String>>) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let mut completion = Self::replying(replies);
        completion.gate = Some(gate.clone());
        (completion, gate)
    }

    /// `(system, prompt)` pairs received so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), prompt.to_string()));

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(LlmError::Api {
                status: 429,
                message,
            }),
            None => Err(LlmError::EmptyContent),
        }
    }
}
