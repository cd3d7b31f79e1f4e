//! Think time between the transactions of a simulated user.

use std::fmt;
use std::time::Duration;

use goose::prelude::*;
use thiserror::Error;

/// Invalid wait time bounds.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WaitTimeError {
    #[error("wait time bounds must be finite and non-negative (got {min}..{max})")]
    OutOfRange { min: f64, max: f64 },
    #[error("wait time minimum {min}s exceeds maximum {max}s")]
    Inverted { min: f64, max: f64 },
}

/// Uniformly random pause between `min` and `max`, drawn by goose after
/// every transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitTime {
    min: Duration,
    max: Duration,
}

impl WaitTime {
    /// A pause drawn uniformly from `[min_secs, max_secs]`.
    ///
    /// # Errors
    ///
    /// Returns an error if a bound is negative or not finite, or if
    /// `min_secs > max_secs`.
    pub fn between(min_secs: f64, max_secs: f64) -> Result<Self, WaitTimeError> {
        let out_of_range = WaitTimeError::OutOfRange {
            min: min_secs,
            max: max_secs,
        };
        let min = Duration::try_from_secs_f64(min_secs).map_err(|_| out_of_range.clone())?;
        let max = Duration::try_from_secs_f64(max_secs).map_err(|_| out_of_range)?;
        if min > max {
            return Err(WaitTimeError::Inverted {
                min: min_secs,
                max: max_secs,
            });
        }
        Ok(Self { min, max })
    }

    /// Always pause for exactly `duration`.
    #[must_use]
    pub const fn constant(duration: Duration) -> Self {
        Self {
            min: duration,
            max: duration,
        }
    }

    /// Never pause.
    #[must_use]
    pub const fn none() -> Self {
        Self::constant(Duration::ZERO)
    }

    #[must_use]
    pub const fn min(&self) -> Duration {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> Duration {
        self.max
    }

    /// Whether users run back to back.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.max.is_zero()
    }

    /// Configure `scenario` to pause this long after each transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if goose rejects the bounds.
    pub fn apply(self, scenario: Scenario) -> Result<Scenario, GooseError> {
        if self.is_none() {
            return Ok(scenario);
        }
        scenario.set_wait_time(self.min, self.max)
    }
}

impl fmt::Display for WaitTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{}s", self.min.as_secs_f64())
        } else {
            write!(
                f,
                "{}-{}s",
                self.min.as_secs_f64(),
                self.max.as_secs_f64()
            )
        }
    }
}
