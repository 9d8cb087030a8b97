//! CLI configuration management.
//!
//! Defaults come from environment variables (optionally loaded from a `.env`
//! file); command-line flags override them.

use bracket_engine::{FormatOptions, StandingsConfig, config::DEFAULT_WIN_POINTS};
use std::str::FromStr;

/// Generation and scoring settings for one CLI invocation
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Options handed to the pairing strategy
    pub options: FormatOptions,
    /// Points used for standings
    pub standings: StandingsConfig,
}

/// Values given on the command line, taking precedence over the environment
#[derive(Debug, Default)]
pub struct Overrides {
    pub seeding: Option<bool>,
    pub bracket_reset: Option<bool>,
    pub swiss_rounds: Option<u32>,
    pub shuffle_seed: Option<u64>,
    pub win_points: Option<i64>,
    pub bye_points: Option<i64>,
}

impl CliConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but cannot be parsed, or the
    /// resulting configuration is invalid
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), overrides)
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        overrides: Overrides,
    ) -> Result<Self, ConfigError> {
        let seeding = match overrides.seeding {
            Some(seeding) => seeding,
            None => parse_flag(&lookup, "BRACKET_SEEDING")?.unwrap_or(false),
        };
        let bracket_reset = match overrides.bracket_reset {
            Some(reset) => reset,
            None => parse_flag(&lookup, "BRACKET_RESET")?.unwrap_or(true),
        };
        let swiss_rounds = match overrides.swiss_rounds {
            Some(rounds) => Some(rounds),
            None => parse_var(&lookup, "BRACKET_SWISS_ROUNDS")?,
        };

        let win_points = match overrides.win_points {
            Some(points) => points,
            None => parse_var(&lookup, "BRACKET_WIN_POINTS")?.unwrap_or(DEFAULT_WIN_POINTS),
        };
        // A bye is worth a win unless configured otherwise
        let bye_points = match overrides.bye_points {
            Some(points) => points,
            None => parse_var(&lookup, "BRACKET_BYE_POINTS")?.unwrap_or(win_points),
        };

        let config = CliConfig {
            options: FormatOptions {
                seeding,
                swiss_rounds,
                bracket_reset,
                shuffle_seed: overrides.shuffle_seed,
            },
            standings: StandingsConfig::new(win_points, bye_points),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.standings.win_points <= 0 {
            return Err(ConfigError::Invalid {
                var: "BRACKET_WIN_POINTS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.standings.bye_points < 0 {
            return Err(ConfigError::Invalid {
                var: "BRACKET_BYE_POINTS".to_string(),
                reason: "Must not be negative".to_string(),
            });
        }

        if self.options.swiss_rounds == Some(0) {
            return Err(ConfigError::Invalid {
                var: "BRACKET_SWISS_ROUNDS".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {var}")]
    Unparsable { var: String, value: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse a variable if set, failing on garbage instead of ignoring it
fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Unparsable {
                var: key.to_string(),
                value,
            }),
    }
}

fn parse_flag(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<bool>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::Unparsable {
                var: key.to_string(),
                value,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)], overrides: Overrides) -> Result<CliConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CliConfig::from_lookup(|key| vars.get(key).cloned(), overrides)
    }

    #[test]
    fn test_defaults() {
        let config = load(&[], Overrides::default()).unwrap();
        assert_eq!(config.options, FormatOptions::default());
        assert_eq!(config.standings, StandingsConfig::default());
    }

    #[test]
    fn test_environment_values() {
        let config = load(
            &[
                ("BRACKET_WIN_POINTS", "3"),
                ("BRACKET_SEEDING", "yes"),
                ("BRACKET_RESET", "off"),
                ("BRACKET_SWISS_ROUNDS", "5"),
            ],
            Overrides::default(),
        )
        .unwrap();
        assert!(config.options.seeding);
        assert!(!config.options.bracket_reset);
        assert_eq!(config.options.swiss_rounds, Some(5));
        // Bye points follow win points when unset
        assert_eq!(config.standings, StandingsConfig::new(3, 3));
    }

    #[test]
    fn test_flags_override_environment() {
        let overrides = Overrides {
            seeding: Some(false),
            bye_points: Some(0),
            ..Overrides::default()
        };
        let config = load(&[("BRACKET_SEEDING", "true"), ("BRACKET_BYE_POINTS", "2")], overrides)
            .unwrap();
        assert!(!config.options.seeding);
        assert_eq!(config.standings.bye_points, 0);
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = load(&[("BRACKET_WIN_POINTS", "lots")], Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Unparsable { .. }));
        assert!(err.to_string().contains("BRACKET_WIN_POINTS"));

        let err = load(&[("BRACKET_RESET", "maybe")], Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Unparsable { .. }));
    }

    #[test]
    fn test_validation() {
        let err = load(&[("BRACKET_WIN_POINTS", "0")], Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = load(&[("BRACKET_SWISS_ROUNDS", "0")], Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
