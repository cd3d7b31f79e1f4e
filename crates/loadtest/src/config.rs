//! Load test configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `CARTSTORM_HOST` - Base URL of the shop API (default: `http://localhost:8080`)
//! - `CARTSTORM_USERNAME` - Test account username (default: `testuser`)
//! - `CARTSTORM_PASSWORD` - Test account password (default: `password123`)
//! - `CARTSTORM_USERS` - Number of simulated users (default: 1)
//! - `CARTSTORM_SPAWN_RATE` - Users started per second (default: 1.0)
//! - `CARTSTORM_RUN_TIME` - Stop after this long, e.g. `90s`, `5m`, `1h30m`
//! - `CARTSTORM_ITERATIONS` - Stop each user after this many passes through
//!   its profile (not together with `CARTSTORM_RUN_TIME`)
//! - `CARTSTORM_REQUEST_TIMEOUT` - Per-request timeout (default: `30s`)
//! - `CARTSTORM_SEED` - Seed for reproducible random choices
//! - `CARTSTORM_REPORT_FILE` - Write goose's HTML report to this path

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

pub const DEFAULT_HOST: &str = "http://localhost:8080";
pub const DEFAULT_USERNAME: &str = "testuser";
pub const DEFAULT_PASSWORD: &str = "password123";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration errors that can occur during loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Invalid host URL {0}: {1}")]
    InvalidHost(String, String),
    #[error("At least one user is required")]
    NoUsers,
    #[error("Spawn rate must be a positive number (got {0})")]
    InvalidSpawnRate(String),
    #[error("Request timeout must be greater than zero")]
    ZeroTimeout,
    #[error("Invalid duration '{0}': use a number of seconds or units like 90s, 5m, 1h30m")]
    InvalidDuration(String),
    #[error("Set either a run time or an iteration count, not both")]
    IterationsWithRunTime,
}

/// Settings for one load test run.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct LoadTestConfig {
    /// Base URL requests are sent to
    pub host: Url,
    /// Username of the shared test account
    pub username: String,
    /// Password of the shared test account
    pub password: SecretString,
    /// Total simulated users
    pub users: usize,
    /// Users started per second
    pub spawn_rate: f64,
    /// Stop the run after this long
    pub run_time: Option<Duration>,
    /// Stop each user after this many passes through its profile
    pub iterations: Option<usize>,
    /// Timeout for each request, including reading the body
    pub request_timeout: Duration,
    /// Seed for per-user random sources; `None` seeds from the OS
    pub seed: Option<u64>,
    /// Where goose writes its HTML report
    pub report_file: Option<PathBuf>,
}

impl std::fmt::Debug for LoadTestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadTestConfig")
            .field("host", &self.host.as_str())
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("users", &self.users)
            .field("spawn_rate", &self.spawn_rate)
            .field("run_time", &self.run_time)
            .field("iterations", &self.iterations)
            .field("request_timeout", &self.request_timeout)
            .field("seed", &self.seed)
            .field("report_file", &self.report_file)
            .finish()
    }
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            username: DEFAULT_USERNAME.to_string(),
            password: SecretString::from(DEFAULT_PASSWORD),
            users: 1,
            spawn_rate: 1.0,
            run_time: None,
            iterations: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            seed: None,
            report_file: None,
        }
    }
}

impl LoadTestConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value
    /// if it is set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = match lookup("CARTSTORM_HOST") {
            Some(host) => parse_host(&host)?,
            None => defaults.host,
        };
        let username = lookup("CARTSTORM_USERNAME").unwrap_or(defaults.username);
        let password = lookup("CARTSTORM_PASSWORD").map_or(defaults.password, SecretString::from);
        let users = parse_var(&lookup, "CARTSTORM_USERS", str::parse::<usize>)?
            .unwrap_or(defaults.users);
        let spawn_rate = parse_var(&lookup, "CARTSTORM_SPAWN_RATE", str::parse::<f64>)?
            .unwrap_or(defaults.spawn_rate);
        let run_time = parse_var(&lookup, "CARTSTORM_RUN_TIME", parse_duration)?;
        let iterations = parse_var(&lookup, "CARTSTORM_ITERATIONS", str::parse::<usize>)?;
        let request_timeout =
            parse_var(&lookup, "CARTSTORM_REQUEST_TIMEOUT", parse_duration)?
                .unwrap_or(defaults.request_timeout);
        let seed = parse_var(&lookup, "CARTSTORM_SEED", str::parse::<u64>)?;
        let report_file = lookup("CARTSTORM_REPORT_FILE").map(PathBuf::from);

        let config = Self {
            host,
            username,
            password,
            users,
            spawn_rate,
            run_time,
            iterations,
            request_timeout,
            seed,
            report_file,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the settings that flags and variables can get wrong.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for zero users, a non-positive spawn rate, a
    /// zero request timeout, or both a run time and an iteration count.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.users == 0 {
            return Err(ConfigError::NoUsers);
        }
        if !self.spawn_rate.is_finite() || self.spawn_rate <= 0.0 {
            return Err(ConfigError::InvalidSpawnRate(self.spawn_rate.to_string()));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.run_time.is_some() && self.iterations.is_some() {
            return Err(ConfigError::IterationsWithRunTime);
        }
        Ok(())
    }
}

/// Parse a host URL. Only `http` and `https` are accepted.
///
/// # Errors
///
/// Returns `ConfigError::InvalidHost` if the URL is malformed or uses another scheme.
pub fn parse_host(host: &str) -> Result<Url, ConfigError> {
    let url =
        Url::parse(host).map_err(|e| ConfigError::InvalidHost(host.to_string(), e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidHost(
            host.to_string(),
            format!("unsupported scheme '{other}'"),
        )),
    }
}

/// Parse a duration such as `45`, `90s`, `5m`, `1h` or `1h30m`.
///
/// A bare number is seconds.
///
/// # Errors
///
/// Returns `ConfigError::InvalidDuration` for empty input, unknown units or a
/// unit without a number.
pub fn parse_duration(input: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration(input.to_string());
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }
    if let Ok(secs) = trimmed.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total: u64 = 0;
    let mut digits = String::new();
    for c in trimmed.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let unit = match c {
            's' => 1,
            'm' => 60,
            'h' => 3600,
            _ => return Err(invalid()),
        };
        let value: u64 = digits.parse().map_err(|_| invalid())?;
        total = value
            .checked_mul(unit)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(invalid)?;
        digits.clear();
    }
    if !digits.is_empty() {
        return Err(invalid());
    }
    Ok(Duration::from_secs(total))
}

// =============================================================================
// Helper Functions
// =============================================================================

fn default_host() -> Url {
    Url::parse(DEFAULT_HOST).unwrap_or_else(|_| unreachable!("default host is a valid URL"))
}

/// Parse an optional variable, naming it in the error.
fn parse_var<T, E: std::fmt::Display>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    parse: impl Fn(&str) -> Result<T, E>,
) -> Result<Option<T>, ConfigError> {
    lookup(key)
        .map(|value| {
            parse(value.trim()).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
        .transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<LoadTestConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        LoadTestConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.host.as_str(), "http://localhost:8080/");
        assert_eq!(config.username, "testuser");
        assert_eq!(config.password.expose_secret(), "password123");
        assert_eq!(config.users, 1);
        assert!((config.spawn_rate - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.run_time, None);
        assert_eq!(config.iterations, None);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("CARTSTORM_HOST", "https://shop.staging.internal"),
            ("CARTSTORM_USERNAME", "loadbot"),
            ("CARTSTORM_PASSWORD", "hunter2"),
            ("CARTSTORM_USERS", "50"),
            ("CARTSTORM_SPAWN_RATE", "2.5"),
            ("CARTSTORM_RUN_TIME", "5m"),
            ("CARTSTORM_REQUEST_TIMEOUT", "5s"),
            ("CARTSTORM_SEED", "7"),
            ("CARTSTORM_REPORT_FILE", "reports/flash-sale.html"),
        ])
        .unwrap();
        assert_eq!(config.host.as_str(), "https://shop.staging.internal/");
        assert_eq!(config.username, "loadbot");
        assert_eq!(config.password.expose_secret(), "hunter2");
        assert_eq!(config.users, 50);
        assert!((config.spawn_rate - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.run_time, Some(Duration::from_secs(300)));
        assert_eq!(config.iterations, None);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.seed, Some(7));
        assert_eq!(
            config.report_file,
            Some(PathBuf::from("reports/flash-sale.html"))
        );

        let config = load(&[("CARTSTORM_ITERATIONS", "10")]).unwrap();
        assert_eq!(config.iterations, Some(10));
        assert_eq!(config.run_time, None);
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let err = load(&[("CARTSTORM_USERS", "many")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "CARTSTORM_USERS"));

        let err = load(&[("CARTSTORM_RUN_TIME", "forever")]).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "CARTSTORM_RUN_TIME")
        );
    }

    #[test]
    fn test_validation() {
        assert_eq!(load(&[("CARTSTORM_USERS", "0")]).unwrap_err(), ConfigError::NoUsers);
        assert!(matches!(
            load(&[("CARTSTORM_SPAWN_RATE", "0")]).unwrap_err(),
            ConfigError::InvalidSpawnRate(_)
        ));
        assert!(matches!(
            load(&[("CARTSTORM_SPAWN_RATE", "NaN")]).unwrap_err(),
            ConfigError::InvalidSpawnRate(_)
        ));
        assert_eq!(
            load(&[("CARTSTORM_REQUEST_TIMEOUT", "0")]).unwrap_err(),
            ConfigError::ZeroTimeout
        );
        assert_eq!(
            load(&[("CARTSTORM_RUN_TIME", "1m"), ("CARTSTORM_ITERATIONS", "3")]).unwrap_err(),
            ConfigError::IterationsWithRunTime
        );
    }

    #[test]
    fn test_parse_host() {
        assert!(parse_host("http://localhost:8080").is_ok());
        assert!(parse_host("https://shop.example.com/gateway").is_ok());
        assert!(matches!(
            parse_host("localhost:8080"),
            Err(ConfigError::InvalidHost(_, _))
        ));
        assert!(matches!(
            parse_host("ftp://files.local"),
            Err(ConfigError::InvalidHost(_, _))
        ));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("45").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_duration("90s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration(" 2m10s ").unwrap(), Duration::from_secs(130));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        for input in ["", "m", "10x", "1h30", "1.5m", "-5s"] {
            assert!(parse_duration(input).is_err(), "{input}");
        }
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = load(&[("CARTSTORM_PASSWORD", "s3cr3t-value")]).unwrap();
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("s3cr3t-value"));
    }
}
