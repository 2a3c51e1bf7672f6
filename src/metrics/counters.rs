//! Counter helpers

use super::labels;
use crate::connection::Environment;

pub fn connect_attempted(environment: Environment) {
    metrics::counter!(labels::CONNECT_ATTEMPTS, labels::ENVIRONMENT => environment.as_str())
        .increment(1);
}

pub fn connect_succeeded(environment: Environment) {
    metrics::counter!(labels::CONNECT_SUCCESS, labels::ENVIRONMENT => environment.as_str())
        .increment(1);
}

pub fn connect_failed(environment: Environment, reason: &'static str) {
    metrics::counter!(
        labels::CONNECT_FAILURES,
        labels::ENVIRONMENT => environment.as_str(),
        labels::REASON => reason
    )
    .increment(1);
}

pub fn bytes_written(count: usize) {
    metrics::counter!(labels::BYTES_WRITTEN).increment(count as u64);
}

pub fn bytes_read(count: usize) {
    metrics::counter!(labels::BYTES_READ).increment(count as u64);
}

pub fn connection_closed() {
    metrics::counter!(labels::CONNECTIONS_CLOSED).increment(1);
}
