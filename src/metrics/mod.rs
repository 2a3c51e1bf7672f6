//! Metrics for connection lifecycle and traffic
//!
//! Recorded through the `metrics` facade; install any exporter to collect them.
//! Without an installed recorder every call is a no-op.

pub mod counters;
pub mod histograms;
pub mod labels;
