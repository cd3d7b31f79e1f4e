//! Cartstorm load generation engine.
//!
//! Simulates users against the shop REST API on top of goose. Each
//! [`Profile`] becomes a goose scenario: its users log in once, then run the
//! profile's weighted [`Task`]s (or the purchase steps in order) with a
//! random think time after each one. Goose times and counts every request;
//! [`RunStats`] condenses its metrics for threshold checks.
//!
//! # Example
//!
//! ```no_run
//! use cartstorm_loadtest::{LoadTest, LoadTestConfig, profile, thresholds};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LoadTestConfig::from_env()?;
//! let test = LoadTest::new(config, profile::all()?)?;
//! let summary = test.run().await?;
//! for breach in summary.breaches(&thresholds::default_thresholds()) {
//!     tracing::warn!(%breach, "Response time target missed");
//! }
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod config;
pub mod error;
pub mod flow;
pub mod profile;
pub mod runner;
pub mod session;
pub mod stats;
pub mod task;
pub mod thresholds;
pub mod user;
pub mod wait;

pub use config::{ConfigError, LoadTestConfig};
pub use error::LoadTestError;
pub use flow::{FlowStep, PurchaseFlow};
pub use profile::{Profile, ProfileError, Routine};
pub use runner::{LoadTest, RunSummary};
pub use session::{Access, Check, Reply};
pub use stats::{EntryStats, FailureStats, HttpMethod, RunStats};
pub use task::{Task, TaskMix, TaskMixError};
pub use thresholds::{Threshold, ThresholdBreach};
pub use user::{UserSettings, UserState};
pub use wait::{WaitTime, WaitTimeError};
