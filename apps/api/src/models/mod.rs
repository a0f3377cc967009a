pub mod country;
pub mod feed;
pub mod generation;
pub mod tracking;
