//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty for development, JSON for log aggregation)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID is attached to the request span and flows into every event
//! - Metric updates are no-ops until a recorder is installed, so library
//!   users and tests pay nothing
//! - `RUST_LOG` overrides the configured level

pub mod logging;
pub mod metrics;
