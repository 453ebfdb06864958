use std::fmt;
use std::path::PathBuf;

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// A required environment variable is unset or empty.
    Missing { name: &'static str },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { name } => {
                write!(f, "required environment variable '{}' is not set", name)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

pub struct Config {
    /// Matrix homeserver base URL.
    pub homeserver: String,
    /// Bot account identifier.
    pub user_id: String,
    /// Bot account password.
    pub password: String,
    /// Completion-service base URL.
    pub base_url: String,
    /// Completion-service API key.
    pub api_key: String,
    /// Completion-service model identifier.
    pub model_id: String,
    /// Bearer token for the completion service.
    pub bearer_token: String,
    /// Text appended to the structured-card prompt.
    pub info_prompt_suffix: String,
    /// Directory for the rolling log file. Stdout-only logging when unset.
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let homeserver = require(&lookup, "MATRIX_HOMESERVER")?;
        let user_id = require(&lookup, "MATRIX_USER_ID")?;
        let password = require(&lookup, "MATRIX_PASSWORD")?;
        let base_url = require(&lookup, "BASE_URL")?;
        let api_key = require(&lookup, "LLM_API_KEY")?;
        let model_id = require(&lookup, "LLM_MODEL_ID")?;
        let bearer_token = require(&lookup, "BEARER_TOKEN")?;
        let info_prompt_suffix = require(&lookup, "INFO_PROMPT_SUFFIX")?;

        validate_url("MATRIX_HOMESERVER", &homeserver)?;
        validate_url("BASE_URL", &base_url)?;

        Ok(Self {
            homeserver: homeserver.trim_end_matches('/').to_string(),
            user_id,
            password,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model_id,
            bearer_token,
            info_prompt_suffix,
            log_dir: lookup("PSYAI_LOG_DIR").map(PathBuf::from),
        })
    }
}

fn require(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing { name }),
    }
}

fn validate_url(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{name} must be an http(s) URL, got '{value}'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("MATRIX_HOMESERVER", "https://matrix.example.org"),
            ("MATRIX_USER_ID", "@psyai:example.org"),
            ("MATRIX_PASSWORD", "hunter2"),
            ("BASE_URL", "https://psygpt.example.org/api"),
            ("LLM_API_KEY", "sk-test"),
            ("LLM_MODEL_ID", "gpt-4"),
            ("BEARER_TOKEN", "token"),
            ("INFO_PROMPT_SUFFIX", "Cite your sources."),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<Config, ConfigError> {
        Config::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
    }

    fn assert_err(result: Result<Config, ConfigError>) -> ConfigError {
        match result {
            Ok(_) => panic!("expected error, got Ok"),
            Err(e) => e,
        }
    }

    #[test]
    fn test_valid_config() {
        let config = load(&vars()).expect("should load valid config");
        assert_eq!(config.homeserver, "https://matrix.example.org");
        assert_eq!(config.user_id, "@psyai:example.org");
        assert_eq!(config.model_id, "gpt-4");
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_missing_variable_names_it() {
        let mut vars = vars();
        vars.remove("BEARER_TOKEN");
        let err = assert_err(load(&vars));
        assert!(matches!(err, ConfigError::Missing { name: "BEARER_TOKEN" }));
        assert!(err.to_string().contains("BEARER_TOKEN"));
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut vars = vars();
        vars.insert("MATRIX_PASSWORD", "  ");
        let err = assert_err(load(&vars));
        assert!(matches!(err, ConfigError::Missing { name: "MATRIX_PASSWORD" }));
    }

    #[test]
    fn test_rejects_schemeless_homeserver() {
        let mut vars = vars();
        vars.insert("MATRIX_HOMESERVER", "matrix.example.org");
        let err = assert_err(load(&vars));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("MATRIX_HOMESERVER"));
    }

    #[test]
    fn test_trailing_slashes_normalized() {
        let mut vars = vars();
        vars.insert("BASE_URL", "https://psygpt.example.org/api/");
        vars.insert("MATRIX_HOMESERVER", "https://matrix.example.org/");
        let config = load(&vars).unwrap();
        assert_eq!(config.base_url, "https://psygpt.example.org/api");
        assert_eq!(config.homeserver, "https://matrix.example.org");
    }

    #[test]
    fn test_log_dir_optional() {
        let mut vars = vars();
        vars.insert("PSYAI_LOG_DIR", "/var/log/psyai");
        let config = load(&vars).unwrap();
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/psyai")));
    }
}
