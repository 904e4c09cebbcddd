//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every node role produces:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → optional Prometheus scrape endpoint
//! ```

pub mod logging;
pub mod metrics;
