//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! routing (match, dispatch) and query (execute) produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms via the metrics facade)
//!
//! Consumers:
//!     → stdout log output
//!     → Prometheus exposition text (CLI `--metrics`)
//! ```
//!
//! # Design Decisions
//! - Structured fields rather than formatted messages
//! - Metrics are cheap and no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
