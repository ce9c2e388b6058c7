use std::{fmt, num::ParseIntError, time::Duration};

use tracing::debug;

use crate::countdown::DEFAULT_TICK_INTERVAL;

pub const TOKEN_VAR: &str = "TELEGRAM_TOKEN";
pub const GATE_CHANNEL_VAR: &str = "GATE_CHANNEL";
pub const TICK_INTERVAL_VAR: &str = "TICK_INTERVAL_SECS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TELEGRAM_TOKEN not found in environment variables")]
    MissingToken,
    #[error("Could not parse {1} as a whole number of seconds")]
    InvalidNumber(#[source] ParseIntError, &'static str),
    #[error("TICK_INTERVAL_SECS must be at least one second")]
    ZeroInterval,
}

/// Process-wide settings, read once at startup and handed to whoever needs them.
#[derive(Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub token: String,
    /// Channel users must have joined, always with a leading `@`.
    pub gate_channel: Option<String>,
    pub tick_interval: Duration,
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &mask_token(&self.token))
            .field("gate_channel", &self.gate_channel)
            .field("tick_interval", &self.tick_interval)
            .finish()
    }
}

impl BotConfig {
    /// Reads the configuration from the process environment, loading a `.env`
    /// file first when one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let token = value(TOKEN_VAR).ok_or(ConfigError::MissingToken)?;

        let gate_channel = value(GATE_CHANNEL_VAR).map(|channel| {
            if channel.starts_with('@') {
                channel
            } else {
                format!("@{channel}")
            }
        });

        let tick_interval = match value(TICK_INTERVAL_VAR) {
            Some(raw) => {
                let secs: u64 = raw
                    .parse()
                    .map_err(|e| ConfigError::InvalidNumber(e, TICK_INTERVAL_VAR))?;
                if secs == 0 {
                    return Err(ConfigError::ZeroInterval);
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_TICK_INTERVAL,
        };

        let config = Self {
            token,
            gate_channel,
            tick_interval,
        };
        debug!(?config, "configuration loaded");

        Ok(config)
    }
}

fn mask_token(token: &str) -> String {
    match token.get(..10) {
        Some(preview) if token.len() > 10 => format!("{preview}..."),
        _ => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_with_only_a_token() {
        let config = BotConfig::from_vars(vars(&[(TOKEN_VAR, "123456:ABC")])).unwrap();

        assert_eq!(
            BotConfig {
                token: "123456:ABC".to_string(),
                gate_channel: None,
                tick_interval: Duration::from_secs(3),
            },
            config
        );
    }

    #[rstest]
    #[case("my_channel", "@my_channel")]
    #[case("@my_channel", "@my_channel")]
    #[case("  @my_channel ", "@my_channel")]
    fn gate_channel_gets_an_at_sign(#[case] raw: &str, #[case] expected: &str) {
        let config =
            BotConfig::from_vars(vars(&[(TOKEN_VAR, "t"), (GATE_CHANNEL_VAR, raw)])).unwrap();

        assert_eq!(Some(expected.to_string()), config.gate_channel);
    }

    #[rstest]
    #[case::absent(&[])]
    #[case::blank(&[(TOKEN_VAR, "   ")])]
    fn token_is_required(#[case] pairs: &[(&str, &str)]) {
        assert!(matches!(
            BotConfig::from_vars(vars(pairs)),
            Err(ConfigError::MissingToken)
        ));
    }

    #[test]
    fn interval_is_validated() {
        let zero = BotConfig::from_vars(vars(&[(TOKEN_VAR, "t"), (TICK_INTERVAL_VAR, "0")]));
        assert!(matches!(zero, Err(ConfigError::ZeroInterval)));

        let junk = BotConfig::from_vars(vars(&[(TOKEN_VAR, "t"), (TICK_INTERVAL_VAR, "3s")]));
        assert!(matches!(junk, Err(ConfigError::InvalidNumber(_, TICK_INTERVAL_VAR))));

        let five = BotConfig::from_vars(vars(&[(TOKEN_VAR, "t"), (TICK_INTERVAL_VAR, "5")]));
        assert_eq!(Duration::from_secs(5), five.unwrap().tick_interval);
    }

    #[test]
    fn debug_masks_token() {
        let config =
            BotConfig::from_vars(vars(&[(TOKEN_VAR, "123456789:AAHsecretsecret")])).unwrap();
        let printed = format!("{config:?}");

        assert!(printed.contains("123456789:..."));
        assert!(!printed.contains("secretsecret"));
    }
}
