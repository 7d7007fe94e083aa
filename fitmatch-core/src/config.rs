use crate::error::ConfigError;
use std::env;

pub const DEFAULT_EMBEDDING_BASE_URL: &str = "https://api.deepinfra.com/v1/openai";
pub const DEFAULT_EMBEDDING_MODEL: &str = "Qwen/Qwen3-Embedding-4B";
pub const DEFAULT_PLAN_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_PLAN_MODEL: &str = "gpt-4o-mini-2024-07-18";

/// Runtime configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub postgres_url: String,
    pub deepinfra_token: String,
    pub openai_api_key: String,
    pub embedding_base_url: String,
    pub embedding_model: String,
    pub plan_base_url: String,
    pub plan_model: String,
}

impl AppConfig {
    /// Load configuration from environment variables. Optional overrides
    /// (`EMBEDDING_BASE_URL`, `EMBEDDING_MODEL`, `PLAN_BASE_URL`,
    /// `PLAN_MODEL`) fall back to service defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            postgres_url: require_env("POSTGRES_URL")?,
            deepinfra_token: require_env("DEEPINFRA_TOKEN")?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            embedding_base_url: env_or("EMBEDDING_BASE_URL", DEFAULT_EMBEDDING_BASE_URL),
            embedding_model: env_or("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            plan_base_url: env_or("PLAN_BASE_URL", DEFAULT_PLAN_BASE_URL),
            plan_model: env_or("PLAN_MODEL", DEFAULT_PLAN_MODEL),
        })
    }
}

fn require_env(var_name: &str) -> Result<String, ConfigError> {
    match env::var(var_name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnvironmentVariable {
            var_name: var_name.to_string(),
        }),
    }
}

fn env_or(var_name: &str, default: &str) -> String {
    env::var(var_name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
