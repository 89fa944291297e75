pub mod agents;
pub mod api;
pub mod cache;
pub mod composer;
pub mod config;
pub mod models;
pub mod profile;
pub mod retrieval;
