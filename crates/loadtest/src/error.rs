//! Top-level error type for a load test run.

use goose::GooseError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::profile::ProfileError;

/// Errors that stop a run from starting or finishing.
///
/// Failed requests are not errors; goose counts them in the metrics.
#[derive(Debug, Error)]
pub enum LoadTestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    #[error("Load test engine error: {0}")]
    Goose(#[from] GooseError),
}
