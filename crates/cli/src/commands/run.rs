//! `cartstorm run`: configure and run a load test, then check the outcome.
//!
//! Goose prints the request, transaction and error tables. Exits non-zero if
//! any request failed, or if `--check-thresholds` is set and a request
//! missed its p95 target.

use cartstorm_loadtest::config::{parse_duration, parse_host};
use cartstorm_loadtest::thresholds::default_thresholds;
use cartstorm_loadtest::{ConfigError, LoadTest, LoadTestConfig, LoadTestError, profile};
use thiserror::Error;
use tracing::{info, warn};

use crate::RunArgs;

/// Errors that make `cartstorm run` exit non-zero.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    LoadTest(#[from] LoadTestError),

    #[error("{failures} of {requests} requests failed")]
    RequestsFailed { failures: usize, requests: usize },

    #[error("{0} response time threshold(s) exceeded")]
    ThresholdsExceeded(usize),
}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        Self::LoadTest(e.into())
    }
}

/// Run a load test and judge its outcome.
pub async fn execute(args: RunArgs) -> Result<(), RunError> {
    let config = apply_overrides(LoadTestConfig::from_env()?, &args)?;
    let profiles = profile::select(&args.profiles).map_err(LoadTestError::from)?;

    let test = LoadTest::new(config, profiles)?;
    let summary = test.run().await?;
    info!(
        started_at = %summary.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        elapsed_secs = summary.elapsed.as_secs_f64(),
        users = summary.users,
        profiles = %summary.profiles.join(", "),
        "Run complete"
    );
    if let Some(path) = &test.config().report_file {
        info!(path = %path.display(), "Report written");
    }

    for failure in &summary.stats.failures {
        warn!(
            method = %failure.method,
            name = %failure.name,
            occurrences = failure.occurrences,
            "{}",
            failure.message
        );
    }

    if args.check_thresholds {
        let breaches = summary.breaches(&default_thresholds());
        for breach in &breaches {
            warn!(%breach, "Response time target missed");
        }
        if !breaches.is_empty() {
            return Err(RunError::ThresholdsExceeded(breaches.len()));
        }
    }

    let failures = summary.stats.total_failures();
    if failures > 0 {
        return Err(RunError::RequestsFailed {
            failures,
            requests: summary.stats.total_requests(),
        });
    }
    Ok(())
}

/// Apply command-line flags on top of the environment configuration.
fn apply_overrides(
    mut config: LoadTestConfig,
    args: &RunArgs,
) -> Result<LoadTestConfig, ConfigError> {
    if let Some(host) = &args.host {
        config.host = parse_host(host)?;
    }
    if let Some(users) = args.users {
        config.users = users;
    }
    if let Some(spawn_rate) = args.spawn_rate {
        config.spawn_rate = spawn_rate;
    }
    if let Some(run_time) = &args.run_time {
        config.run_time = Some(parse_duration(run_time)?);
    }
    if let Some(iterations) = args.iterations {
        config.iterations = Some(iterations);
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(username) = &args.username {
        config.username.clone_from(username);
    }
    if let Some(report_file) = &args.report_file {
        config.report_file = Some(report_file.clone());
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use clap::Parser;

    use super::*;
    use crate::{Cli, Commands};

    fn parse(argv: &[&str]) -> RunArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Run(args) => args,
            Commands::Profiles => panic!("expected run"),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let args = parse(&[
            "cartstorm",
            "run",
            "order-stress",
            "user-auth",
            "--host",
            "http://shop.local:9000",
            "-u",
            "25",
            "-r",
            "5",
            "-t",
            "2m",
            "--seed",
            "99",
            "--username",
            "loadbot",
        ]);
        assert_eq!(args.profiles, vec!["order-stress", "user-auth"]);

        let config = apply_overrides(LoadTestConfig::default(), &args).unwrap();
        assert_eq!(config.host.as_str(), "http://shop.local:9000/");
        assert_eq!(config.users, 25);
        assert!((config.spawn_rate - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.run_time, Some(Duration::from_secs(120)));
        assert_eq!(config.iterations, None);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.username, "loadbot");
    }

    #[test]
    fn test_iterations_and_report_file() {
        let args = parse(&[
            "cartstorm",
            "run",
            "purchase-flow",
            "-i",
            "3",
            "--report-file",
            "report.html",
        ]);
        let config = apply_overrides(LoadTestConfig::default(), &args).unwrap();
        assert_eq!(config.iterations, Some(3));
        assert_eq!(
            config.report_file.as_deref(),
            Some(std::path::Path::new("report.html"))
        );

        assert!(Cli::try_parse_from(["cartstorm", "run", "-i", "3", "-t", "1m"]).is_err());
    }

    #[test]
    fn test_unset_flags_keep_config() {
        let args = parse(&["cartstorm", "run"]);
        assert!(args.profiles.is_empty());
        assert!(!args.check_thresholds);

        let config = apply_overrides(LoadTestConfig::default(), &args).unwrap();
        assert_eq!(config.users, 1);
        assert_eq!(config.username, "testuser");
        assert_eq!(config.run_time, None);
    }

    #[test]
    fn test_invalid_flags_rejected() {
        let args = parse(&["cartstorm", "run", "-u", "0"]);
        assert_eq!(
            apply_overrides(LoadTestConfig::default(), &args).unwrap_err(),
            ConfigError::NoUsers
        );

        let args = parse(&["cartstorm", "run", "-t", "soon"]);
        assert!(matches!(
            apply_overrides(LoadTestConfig::default(), &args).unwrap_err(),
            ConfigError::InvalidDuration(_)
        ));
    }

    #[test]
    fn test_global_json_logs_flag() {
        let cli = Cli::try_parse_from(["cartstorm", "profiles", "--json-logs"]).unwrap();
        assert!(cli.json_logs);
    }
}
