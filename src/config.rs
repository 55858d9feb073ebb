//! Runtime configuration sourced from the environment (and `.env`).

use crate::infrastructure::suggestions::{DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_TIMEOUT};
use secrecy::SecretString;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const API_KEY_VARS: [&str; 2] = ["OPENAI_API_KEY", "VITE_OPENAI_API_KEY"];
pub const ENDPOINT_VAR: &str = "SOCIAL_SUPPORT_AI_ENDPOINT";
pub const MODEL_VAR: &str = "SOCIAL_SUPPORT_AI_MODEL";
pub const TIMEOUT_VAR: &str = "SOCIAL_SUPPORT_AI_TIMEOUT_SECS";
pub const STATE_DIR_VAR: &str = "SOCIAL_SUPPORT_STATE_DIR";
pub const LOG_VAR: &str = "SOCIAL_SUPPORT_LOG";
pub const SUBMIT_LATENCY_VAR: &str = "SOCIAL_SUPPORT_SUBMIT_LATENCY_MS";
pub const SUBMIT_FAILURE_RATE_VAR: &str = "SOCIAL_SUPPORT_SUBMIT_FAILURE_RATE";

const APP_DIR_NAME: &str = "social-support";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },

    #[error("could not determine a state directory; set SOCIAL_SUPPORT_STATE_DIR")]
    NoStateDir,
}

#[derive(Debug)]
pub struct AppConfig {
    pub state_dir: PathBuf,
    pub log_level: String,
    pub ai: AiConfig,
    pub submission: SubmissionConfig,
}

/// Settings for the completion service. A missing key is not an error here;
/// it only surfaces when a suggestion is requested.
#[derive(Debug)]
pub struct AiConfig {
    pub api_key: Option<SecretString>,
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionConfig {
    pub latency: Duration,
    pub failure_rate: f64,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(1200),
            failure_rate: 0.05,
        }
    }
}

impl AppConfig {
    /// Reads `.env` if present, then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = API_KEY_VARS
            .iter()
            .find_map(|key| get(*key))
            .map(SecretString::from);

        let timeout = match get(TIMEOUT_VAR) {
            Some(raw) => Duration::from_secs(parse_number::<u64>(TIMEOUT_VAR, &raw)?),
            None => DEFAULT_TIMEOUT,
        };

        let state_dir = match get(STATE_DIR_VAR) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_local_dir()
                .map(|dir| dir.join(APP_DIR_NAME))
                .ok_or(ConfigError::NoStateDir)?,
        };

        let mut submission = SubmissionConfig::default();
        if let Some(raw) = get(SUBMIT_LATENCY_VAR) {
            submission.latency = Duration::from_millis(parse_number::<u64>(SUBMIT_LATENCY_VAR, &raw)?);
        }
        if let Some(raw) = get(SUBMIT_FAILURE_RATE_VAR) {
            let rate = parse_number::<f64>(SUBMIT_FAILURE_RATE_VAR, &raw)?;
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::InvalidValue {
                    key: SUBMIT_FAILURE_RATE_VAR,
                    message: format!("{rate} is outside 0..=1"),
                });
            }
            submission.failure_rate = rate;
        }

        Ok(Self {
            state_dir,
            log_level: get(LOG_VAR).unwrap_or_else(|| "info".to_string()),
            ai: AiConfig {
                api_key,
                endpoint: get(ENDPOINT_VAR).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
                model: get(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                timeout,
            },
            submission,
        })
    }

    pub fn logs_path(&self) -> PathBuf {
        self.state_dir.join("logs")
    }
}

fn parse_number<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key,
        message: format!("{raw:?}: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[(STATE_DIR_VAR, "/tmp/social-support-test")]).unwrap();
        assert!(config.ai.api_key.is_none());
        assert_eq!(config.ai.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.ai.model, DEFAULT_MODEL);
        assert_eq!(config.ai.timeout, Duration::from_secs(15));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.submission, SubmissionConfig::default());
        assert_eq!(config.logs_path(), PathBuf::from("/tmp/social-support-test/logs"));
    }

    #[test]
    fn test_api_key_fallback_and_blank() {
        let config = config_from(&[
            (STATE_DIR_VAR, "/tmp/x"),
            ("VITE_OPENAI_API_KEY", "sk-vite"),
        ])
        .unwrap();
        assert_eq!(config.ai.api_key.unwrap().expose_secret(), "sk-vite");

        let config = config_from(&[(STATE_DIR_VAR, "/tmp/x"), ("OPENAI_API_KEY", "   ")]).unwrap();
        assert!(config.ai.api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            (STATE_DIR_VAR, "/tmp/x"),
            (TIMEOUT_VAR, "30"),
            (MODEL_VAR, "gpt-4o-mini"),
            (SUBMIT_LATENCY_VAR, "0"),
            (SUBMIT_FAILURE_RATE_VAR, "1"),
        ])
        .unwrap();
        assert_eq!(config.ai.timeout, Duration::from_secs(30));
        assert_eq!(config.ai.model, "gpt-4o-mini");
        assert_eq!(config.submission.latency, Duration::ZERO);
        assert_eq!(config.submission.failure_rate, 1.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = config_from(&[(STATE_DIR_VAR, "/tmp/x"), (TIMEOUT_VAR, "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: TIMEOUT_VAR, .. }));

        let err =
            config_from(&[(STATE_DIR_VAR, "/tmp/x"), (SUBMIT_FAILURE_RATE_VAR, "1.5")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: SUBMIT_FAILURE_RATE_VAR, .. }));
    }
}
