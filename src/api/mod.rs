//! API layer
//!
//! HTTP handlers for:
//! - Simulator REST API (drives the load test)
//! - Page endpoints (timeline view models for the front end)
//! - Metrics (Prometheus)

mod metrics;
mod pages;
mod simulator;

pub use metrics::metrics_router;
pub use pages::pages_router;
pub use simulator::simulator_router;
