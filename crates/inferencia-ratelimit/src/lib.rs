#![allow(clippy::missing_errors_doc, clippy::must_use_candidate)]

mod bucket;
mod controller;
mod error;

pub use controller::{Admission, AdmissionController};
pub use error::RateLimitError;

use inferencia_config::RateLimitConfig;

/// Create an admission controller from configuration
///
/// Must be called inside a tokio runtime for idle buckets to be reclaimed.
pub fn create_admission_controller(config: &RateLimitConfig) -> Result<AdmissionController, RateLimitError> {
    AdmissionController::builder(config.requests_per_second, config.burst)
        .sweep_interval(config.sweep_interval)
        .idle_timeout(config.idle_timeout)
        .build()
}
