//! # hunt-observability
//!
//! Logging and metrics infrastructure for Hunt HQ.
//!
//! This crate provides structured logging with tracing and the metric names,
//! descriptions and recording helpers exported through Prometheus.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, init_logging_with_config, LoggingConfig};
pub use metrics::{install_prometheus_recorder, register_metrics};
