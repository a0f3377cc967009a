// Scraped feeds: external scraper invocation, storage, and RSS rendering.

pub mod handlers;
pub mod repository;
pub mod rss;
pub mod scraper;
