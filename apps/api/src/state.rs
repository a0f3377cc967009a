use std::sync::Arc;

use crate::countries::repository::CountryRepository;
use crate::feeds::repository::ScrapedFeedRepository;
use crate::feeds::scraper::ScraperRunner;
use crate::generation::tracker::GenerationTracker;
use crate::llm_client::CompletionService;
use crate::tracking::repository::TrackingRepository;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub countries: Arc<dyn CountryRepository>,
    pub feeds: Arc<dyn ScrapedFeedRepository>,
    pub tracking: Arc<dyn TrackingRepository>,
    /// Used directly by the monitoring-list generators; section jobs go through the tracker.
    pub completion: Arc<dyn CompletionService>,
    /// Owns the background generation workers.
    pub tracker: GenerationTracker,
    pub scraper: ScraperRunner,
}
