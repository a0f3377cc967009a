// Per-country monitoring lists: keywords, news sources, influencers, government
// and leadership accounts, emergency numbers, and embassy/ambassador handles.
// Generation goes through llm_client::CompletionService.

pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod repository;
