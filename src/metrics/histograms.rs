//! Histogram helpers

use super::labels;
use crate::connection::Environment;
use std::time::Duration;

pub fn handshake_duration(environment: Environment, elapsed: Duration) {
    metrics::histogram!(labels::HANDSHAKE_DURATION, labels::ENVIRONMENT => environment.as_str())
        .record(elapsed.as_secs_f64());
}
