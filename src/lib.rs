pub mod config;
pub mod constants;
pub mod document;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod normalize;
pub mod oss;
pub mod types;

// Application use cases and the adapters behind their ports
pub mod app;
pub mod infra;
