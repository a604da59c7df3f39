use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub const TICK_INTERVAL_VAR: &str = "VIDCTL_TICK_INTERVAL_MS";
pub const RESTART_DELAY_VAR: &str = "VIDCTL_RESTART_DELAY_MS";
pub const SEEK_STEP_VAR: &str = "VIDCTL_SEEK_STEP_SECS";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: expected a number, got {value:?}")]
    NotANumber { key: &'static str, value: String },
    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
}

/// Playback configuration
/// Loaded from the environment, after an optional .env file
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// How often position ticks are reported while playing
    pub tick_interval: Duration,
    /// Delay between reaching the end of the media and restarting it
    pub restart_delay: Duration,
    /// Default amount for forward/backward seek buttons, in seconds
    pub seek_step: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(500),
            restart_delay: Duration::from_secs(3),
            seek_step: 5.0,
        }
    }
}

impl Config {
    /// Load configuration from `.env` (if present) and the process environment.
    /// Invalid values are logged and replaced by their defaults.
    pub fn load() -> Self {
        if dotenvy::dotenv().is_ok() {
            info!("Config: loaded .env file");
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from a specific env file, ignoring the process environment
    pub fn from_env_file(path: &Path) -> Result<Self, dotenvy::Error> {
        let vars: Vec<(String, String)> =
            dotenvy::from_path_iter(path)?.collect::<Result<_, _>>()?;

        Ok(Self::from_lookup(|key| {
            vars.iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.clone())
        }))
    }

    /// Build configuration from a variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            tick_interval: parse_millis(TICK_INTERVAL_VAR, lookup(TICK_INTERVAL_VAR), false)
                .unwrap_or_else(log_invalid)
                .unwrap_or(defaults.tick_interval),
            restart_delay: parse_millis(RESTART_DELAY_VAR, lookup(RESTART_DELAY_VAR), true)
                .unwrap_or_else(log_invalid)
                .unwrap_or(defaults.restart_delay),
            seek_step: parse_seconds(SEEK_STEP_VAR, lookup(SEEK_STEP_VAR))
                .unwrap_or_else(log_invalid)
                .unwrap_or(defaults.seek_step),
        }
    }
}

fn log_invalid<T>(error: ConfigError) -> Option<T> {
    warn!("Config: {}, using default", error);
    None
}

fn parse_millis(
    key: &'static str,
    raw: Option<String>,
    allow_zero: bool,
) -> Result<Option<Duration>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let millis: u64 = raw.trim().parse().map_err(|_| ConfigError::NotANumber {
        key,
        value: raw.clone(),
    })?;
    if millis == 0 && !allow_zero {
        return Err(ConfigError::Zero { key });
    }
    Ok(Some(Duration::from_millis(millis)))
}

fn parse_seconds(key: &'static str, raw: Option<String>) -> Result<Option<f64>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let secs: f64 = raw.trim().parse().map_err(|_| ConfigError::NotANumber {
        key,
        value: raw.clone(),
    })?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ConfigError::Zero { key });
    }
    Ok(Some(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config, Config::default());
        assert_eq!(config.restart_delay, Duration::from_secs(3));
        assert_eq!(config.tick_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            (TICK_INTERVAL_VAR, "250"),
            (RESTART_DELAY_VAR, "0"),
            (SEEK_STEP_VAR, "10"),
        ]));

        assert_eq!(config.tick_interval, Duration::from_millis(250));
        assert_eq!(config.restart_delay, Duration::ZERO);
        assert_eq!(config.seek_step, 10.0);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = Config::from_lookup(lookup_from(&[
            (TICK_INTERVAL_VAR, "0"),
            (RESTART_DELAY_VAR, "soon"),
            (SEEK_STEP_VAR, "-2"),
        ]));

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse_millis(RESTART_DELAY_VAR, Some("3s".to_string()), true),
            Err(ConfigError::NotANumber {
                key: RESTART_DELAY_VAR,
                value: "3s".to_string(),
            })
        );
        assert_eq!(
            parse_millis(TICK_INTERVAL_VAR, Some("0".to_string()), false),
            Err(ConfigError::Zero {
                key: TICK_INTERVAL_VAR
            })
        );
        assert_eq!(
            parse_millis(RESTART_DELAY_VAR, Some("0".to_string()), true),
            Ok(Some(Duration::ZERO))
        );
    }

    #[test]
    fn test_from_env_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(".env");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}=1500", RESTART_DELAY_VAR).unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "{}=2.5", SEEK_STEP_VAR).unwrap();

        let config = Config::from_env_file(&path).unwrap();

        assert_eq!(config.restart_delay, Duration::from_millis(1500));
        assert_eq!(config.seek_step, 2.5);
        assert_eq!(config.tick_interval, Duration::from_millis(500));
    }
}
