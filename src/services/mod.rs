pub mod aggregator;
pub mod cache_services;
pub mod dashboard_service;
pub mod filter_engine;
pub mod normalizer;
pub mod render_services;
pub mod sources;
