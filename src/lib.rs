pub mod api;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod geo;
pub mod ids;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod scrapers;
pub mod store;
pub mod text;
