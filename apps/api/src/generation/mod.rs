// AI section generation: background jobs tracked in content_generations.
// All completion calls go through llm_client::CompletionService.

pub mod dto;
pub mod handlers;
pub mod prompts;
pub mod repository;
pub mod tracker;
