//! Hands the profiles to goose, runs the attack and collects the statistics.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use goose::config::GooseConfiguration;
use goose::prelude::*;
use tracing::{info, instrument};

use crate::config::LoadTestConfig;
use crate::error::LoadTestError;
use crate::profile::{Profile, ProfileError};
use crate::stats::RunStats;
use crate::thresholds::{Threshold, ThresholdBreach, evaluate_thresholds};
use crate::user::UserSettings;

/// Outcome of a finished run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub host: String,
    pub profiles: Vec<String>,
    pub users: usize,
    pub stats: RunStats,
}

impl RunSummary {
    /// Requests whose p95 exceeded the given targets.
    #[must_use]
    pub fn breaches(&self, thresholds: &[Threshold]) -> Vec<ThresholdBreach> {
        evaluate_thresholds(&self.stats, thresholds)
    }
}

/// A configured load test.
#[derive(Debug)]
pub struct LoadTest {
    config: LoadTestConfig,
    profiles: Vec<Profile>,
}

impl LoadTest {
    /// Create a load test running `profiles` with `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or no profile is given.
    pub fn new(config: LoadTestConfig, profiles: Vec<Profile>) -> Result<Self, LoadTestError> {
        config.validate()?;
        if profiles.is_empty() {
            return Err(ProfileError::NoneSelected.into());
        }
        Ok(Self { config, profiles })
    }

    #[must_use]
    pub const fn config(&self) -> &LoadTestConfig {
        &self.config
    }

    /// Run until the run time elapses, every user finishes its iterations,
    /// or Ctrl+C.
    ///
    /// Goose prints its own request, transaction and error tables when the
    /// attack ends.
    ///
    /// # Errors
    ///
    /// Returns an error if goose rejects the setup or the attack fails.
    #[instrument(skip_all, fields(host = %self.config.host, users = self.config.users))]
    pub async fn run(&self) -> Result<RunSummary, LoadTestError> {
        let settings = Arc::new(UserSettings::from(&self.config));
        let mut attack = GooseAttack::initialize_with_config(GooseConfiguration::default())?;
        for profile in &self.profiles {
            info!(
                profile = %profile.name(),
                weight = profile.weight(),
                wait = %profile.wait(),
                "Registering profile"
            );
            attack = attack.register_scenario(profile.scenario(&settings)?);
        }

        let hatch_rate = self.config.spawn_rate.to_string();
        let timeout = self.config.request_timeout.as_secs_f64().to_string();
        let mut attack = attack
            .set_default(GooseDefault::Host, self.config.host.as_str())?
            .set_default(GooseDefault::Users, self.config.users)?
            .set_default(GooseDefault::HatchRate, hatch_rate.as_str())?
            .set_default(GooseDefault::Timeout, timeout.as_str())?
            .set_default(GooseDefault::NoResetMetrics, true)?
            .set_default(GooseDefault::NoTelnet, true)?
            .set_default(GooseDefault::NoWebSocket, true)?;
        if let Some(run_time) = self.config.run_time {
            attack = attack.set_default(GooseDefault::RunTime, run_time_secs(run_time))?;
        }
        if let Some(iterations) = self.config.iterations {
            attack = attack.set_default(GooseDefault::Iterations, iterations)?;
        }
        if let Some(report_file) = &self.config.report_file {
            let report_file = report_file.to_string_lossy();
            attack = attack.set_default(GooseDefault::ReportFile, report_file.as_ref())?;
        }

        info!(
            spawn_rate = self.config.spawn_rate,
            run_time = ?self.config.run_time,
            iterations = ?self.config.iterations,
            "Starting load test"
        );
        let started_at = Utc::now();
        let started = Instant::now();
        let metrics = attack.execute().await?;
        let elapsed = started.elapsed();

        let stats = RunStats::from_metrics(&metrics);
        info!(
            elapsed_secs = elapsed.as_secs_f64(),
            requests = stats.total_requests(),
            failures = stats.total_failures(),
            "Load test finished"
        );

        Ok(RunSummary {
            started_at,
            elapsed,
            host: self.config.host.to_string(),
            profiles: self.profiles.iter().map(|p| p.name().to_string()).collect(),
            users: self.config.users,
            stats,
        })
    }
}

/// Goose counts run time in whole seconds; round up so a short run still
/// runs.
fn run_time_secs(run_time: Duration) -> usize {
    let secs = run_time.as_secs() + u64::from(run_time.subsec_nanos() > 0);
    usize::try_from(secs.max(1)).unwrap_or(usize::MAX)
}
