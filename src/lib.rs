pub mod aggregator;
pub mod apis;
pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod observability;
pub mod pipeline;
pub mod server;
pub mod storage;
pub mod types;

// Layered boundaries: ports the core depends on, and their adapters
pub mod app;
pub mod infra;

pub use aggregator::Aggregator;
pub use error::{AggregatorError, Result};
pub use types::{AggregationSnapshot, OutageStatus, RegionKey, RegionState};
