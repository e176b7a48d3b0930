// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! TOML + environment-variable configuration loading.
//!
//! Same two-stage pattern as the teacher's `config_loader.rs`: parse a TOML
//! file into [`Config`] with `toml`, then let `GOVERNOR_`-prefixed
//! environment variables override individual fields. Env vars always win
//! over the file, and the file always wins over [`Config::default`].

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::config::Config;

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    InvalidEnvValue { var: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "io error reading config: {msg}"),
            ConfigError::Parse(msg) => write!(f, "failed to parse config: {msg}"),
            ConfigError::InvalidEnvValue { var, value } => {
                write!(f, "invalid value {value:?} for environment variable {var}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load config from `path` (if it exists) merged over [`Config::default`],
/// then apply `GOVERNOR_*` environment variable overrides.
pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let mut config = if path.as_ref().exists() {
        let raw = fs::read_to_string(&path).map_err(|e| ConfigError::Io(e.to_string()))?;
        toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?
    } else {
        Config::default()
    };
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Build config purely from `GOVERNOR_*` environment variables over the
/// default, with no file involved — useful for container deployments that
/// inject config entirely through the environment.
pub fn load_from_env() -> Result<Config, ConfigError> {
    let mut config = Config::default();
    apply_env_overrides(&mut config)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
    if let Ok(value) = env::var("GOVERNOR_OBSERVER_HMAC_SECRET") {
        config.observer_hmac_secret = value;
    }
    if let Some(value) = parse_env_u32("GOVERNOR_DEFAULT_RATE_LIMIT_PER_MINUTE")? {
        config.default_rate_limit_per_minute = value;
    }
    if let Some(value) = parse_env_u32("GOVERNOR_DEFAULT_RATE_LIMIT_PER_HOUR")? {
        config.default_rate_limit_per_hour = value;
    }
    if let Some(value) = parse_env_u32("GOVERNOR_DEFAULT_RATE_LIMIT_PER_DAY")? {
        config.default_rate_limit_per_day = value;
    }
    if let Some(value) = parse_env_u32("GOVERNOR_TRUST_CAS_MAX_RETRIES")? {
        config.trust_cas_max_retries = value;
    }
    if let Some(value) = parse_env_u64("GOVERNOR_DEFAULT_INTENT_TTL_MS")? {
        config.default_intent_ttl_ms = value;
    }
    if let Some(value) = parse_env_u32("GOVERNOR_COUNCIL_QUORUM")? {
        config.council_quorum = value;
    }
    if let Some(value) = parse_env_u32("GOVERNOR_WEBHOOK_MAX_ATTEMPTS")? {
        config.webhook_max_attempts = value;
    }
    if let Some(value) = parse_env_u64("GOVERNOR_WEBHOOK_BASE_BACKOFF_MS")? {
        config.webhook_base_backoff_ms = value;
    }
    if let Ok(value) = env::var("GOVERNOR_KILLSWITCH_ENGAGED_AT_BOOT") {
        config.killswitch_engaged_at_boot = parse_env_bool("GOVERNOR_KILLSWITCH_ENGAGED_AT_BOOT", &value)?;
    }
    Ok(())
}

fn parse_env_u32(var: &str) -> Result<Option<u32>, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .parse::<u32>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnvValue { var: var.to_string(), value }),
        Err(_) => Ok(None),
    }
}

fn parse_env_u64(var: &str) -> Result<Option<u64>, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnvValue { var: var.to_string(), value }),
        Err(_) => Ok(None),
    }
}

fn parse_env_bool(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "1" | "true" | "TRUE" | "yes" => Ok(true),
        "0" | "false" | "FALSE" | "no" => Ok(false),
        other => Err(ConfigError::InvalidEnvValue { var: var.to_string(), value: other.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize tests that touch
    // them so they don't race each other under the default test harness.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn missing_file_falls_back_to_default() {
        let _guard = ENV_LOCK.lock().unwrap();
        let config = load("/nonexistent/path/governor.toml").unwrap();
        assert_eq!(config.trust_cas_max_retries, Config::default().trust_cas_max_retries);
    }

    #[test]
    fn env_override_wins_over_default() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("GOVERNOR_COUNCIL_QUORUM", "7");
        let config = load_from_env().unwrap();
        assert_eq!(config.council_quorum, 7);
        env::remove_var("GOVERNOR_COUNCIL_QUORUM");
    }

    #[test]
    fn invalid_env_value_is_reported() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("GOVERNOR_COUNCIL_QUORUM", "not-a-number");
        let err = load_from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvValue { .. }));
        env::remove_var("GOVERNOR_COUNCIL_QUORUM");
    }
}
