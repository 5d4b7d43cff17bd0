//! # Middleware Stack
//!
//! Tower middleware for the image route:
//! - [`tracing_layer`]: request/response tracing with `TraceLayer`.
//! - [`metrics`]: Prometheus request metrics.

pub mod metrics;
pub mod tracing_layer;
