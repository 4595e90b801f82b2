pub mod config;
pub mod dispatcher;
pub mod market;
pub mod metrics;
pub mod notify;
pub mod orchestrator;
pub mod scheduler;

pub mod error;
pub mod logger;
