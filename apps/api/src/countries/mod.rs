// Country profiles: the target entities of generation jobs.

pub mod handlers;
pub mod repository;
