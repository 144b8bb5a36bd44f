//! Environment-backed runtime configuration for `notify-smoke`.

use std::env;

use notify_core::{Connectivity, PresentationHints};
use thiserror::Error;

const DEFAULT_EVENT_BUFFER: usize = 64;

/// Runtime configuration used by the smoke runner.
#[derive(Debug, Clone, PartialEq)]
pub struct SmokeConfig {
    /// Presentation constants forwarded to the dispatcher.
    pub hints: PresentationHints,
    /// Per-subscriber capacity of the notification channel.
    pub event_buffer: usize,
    /// Simulated client connectivity for network-failure descriptions.
    pub connectivity: Connectivity,
}

impl SmokeConfig {
    /// Parse configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(mut lookup: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut hints = PresentationHints::default();
        if let Some(icon) = optional_trimmed_env("NOTIFY_INFO_ICON", &mut lookup) {
            hints.info_icon = icon;
        }
        if let Some(icon) = optional_trimmed_env("NOTIFY_WARNING_ICON", &mut lookup) {
            hints.warning_icon = icon;
        }
        if let Some(colour) = parse_optional_colour("NOTIFY_WARNING_BACKGROUND", &mut lookup)? {
            hints.warning_style.background = colour;
        }
        if let Some(colour) = parse_optional_colour("NOTIFY_WARNING_FOREGROUND", &mut lookup)? {
            hints.warning_style.foreground = colour;
        }

        let event_buffer = parse_optional_usize("NOTIFY_EVENT_BUFFER", &mut lookup)?
            .unwrap_or(DEFAULT_EVENT_BUFFER);
        if event_buffer == 0 {
            return Err(ConfigError::InvalidValue {
                key: "NOTIFY_EVENT_BUFFER",
                value: "0".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }

        let connectivity = if parse_optional_bool("NOTIFY_OFFLINE", &mut lookup)?.unwrap_or(false) {
            Connectivity::Offline
        } else {
            Connectivity::Online
        };

        Ok(Self {
            hints,
            event_buffer,
            connectivity,
        })
    }
}

/// Errors produced while parsing runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("invalid {key}='{value}': {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

fn optional_trimmed_env<F>(key: &'static str, lookup: &mut F) -> Option<String>
where
    F: FnMut(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_optional_usize<F>(key: &'static str, lookup: &mut F) -> Result<Option<usize>, ConfigError>
where
    F: FnMut(&str) -> Option<String>,
{
    let Some(value) = optional_trimmed_env(key, lookup) else {
        return Ok(None);
    };
    value
        .parse::<usize>()
        .map(Some)
        .map_err(|err| ConfigError::InvalidValue {
            key,
            value,
            reason: err.to_string(),
        })
}

fn parse_optional_bool<F>(key: &'static str, lookup: &mut F) -> Result<Option<bool>, ConfigError>
where
    F: FnMut(&str) -> Option<String>,
{
    let Some(value) = optional_trimmed_env(key, lookup) else {
        return Ok(None);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidValue {
            key,
            value,
            reason: "expected a boolean".to_owned(),
        }),
    }
}

fn parse_optional_colour<F>(
    key: &'static str,
    lookup: &mut F,
) -> Result<Option<String>, ConfigError>
where
    F: FnMut(&str) -> Option<String>,
{
    let Some(value) = optional_trimmed_env(key, lookup) else {
        return Ok(None);
    };
    if is_hex_colour(&value) {
        Ok(Some(value.to_ascii_lowercase()))
    } else {
        Err(ConfigError::InvalidValue {
            key,
            value,
            reason: "expected #rgb or #rrggbb".to_owned(),
        })
    }
}

fn is_hex_colour(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    matches!(digits.len(), 3 | 6) && digits.chars().all(|ch| ch.is_ascii_hexdigit())
}
