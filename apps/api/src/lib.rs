pub mod config;
pub mod countries;
pub mod db;
pub mod errors;
pub mod feeds;
pub mod generation;
pub mod llm_client;
pub mod models;
pub mod poller;
pub mod routes;
pub mod state;
pub mod tracking;

#[cfg(test)]
pub(crate) mod testing;
