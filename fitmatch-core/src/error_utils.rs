use crate::error::*;
use std::time::Duration;
use tracing::{error, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn is_retryable(&self) -> bool;
    fn retry_after(&self) -> Option<Duration>;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::Embedding(e) => {
                error!("Embedding error details: {:?}", e);
            }
            CoreError::Database(e) => {
                error!("Database error details: {:?}", e);
            }
            CoreError::Plan(e) => {
                error!("Plan generation error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            CoreError::Embedding(e) => e.is_retryable(),
            CoreError::Plan(e) => e.is_retryable(),
            CoreError::Database(DatabaseError::ConnectionFailed { .. }) => true,
            CoreError::Network(_) => true,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            CoreError::Embedding(e) => e.retry_after(),
            CoreError::Plan(e) => e.retry_after(),
            _ if self.is_retryable() => Some(Duration::from_secs(5)),
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::Embedding(e) => e.user_friendly_message(),
            CoreError::Plan(e) => e.user_friendly_message(),
            CoreError::Database(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::InvalidInput { message } => {
                format!("Invalid input: {}", message)
            }
            _ => "An unexpected error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::Embedding(_) => "EMBEDDING".to_string(),
            CoreError::Database(_) => "DATABASE".to_string(),
            CoreError::Plan(_) => "PLAN".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::InvalidInput { .. } => "INVALID_INPUT".to_string(),
            CoreError::Internal { .. } => "INTERNAL".to_string(),
        }
    }
}

impl ErrorExt for EmbeddingError {
    fn log_error(&self) -> &Self {
        error!("EmbeddingError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("EmbeddingError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            EmbeddingError::Unavailable { .. } => true,
            EmbeddingError::RateLimitExceeded { .. } => true,
            EmbeddingError::RequestTimeout => true,
            EmbeddingError::ServerError { status_code } => *status_code >= 500,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            EmbeddingError::RateLimitExceeded { retry_after } => {
                Some(Duration::from_secs(*retry_after))
            }
            _ if self.is_retryable() => Some(Duration::from_secs(5)),
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            EmbeddingError::Unavailable { .. } => {
                "The embedding service is unreachable. Please try again later.".to_string()
            }
            EmbeddingError::InvalidProfile { reason } => {
                format!("Profile is incomplete: {}", reason)
            }
            EmbeddingError::RateLimitExceeded { retry_after } => format!(
                "Too many requests. Please wait {} seconds before trying again.",
                retry_after
            ),
            EmbeddingError::RequestTimeout => {
                "Embedding request timed out. Please try again.".to_string()
            }
            EmbeddingError::InvalidResponse { .. } => {
                "The embedding service returned an unexpected response.".to_string()
            }
            EmbeddingError::ServerError { status_code } => {
                format!("Embedding service error (status {}).", status_code)
            }
            EmbeddingError::DimensionMismatch { expected, actual } => format!(
                "Embedding dimension mismatch: expected {}, got {}.",
                expected, actual
            ),
        }
    }

    fn error_code(&self) -> String {
        "EMBEDDING".to_string()
    }
}

impl ErrorExt for PlanError {
    fn log_error(&self) -> &Self {
        error!("PlanError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("PlanError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            PlanError::RateLimitExceeded { .. } => true,
            PlanError::RequestTimeout => true,
            PlanError::ServerError { status_code } => *status_code >= 500,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            PlanError::RateLimitExceeded { retry_after } => {
                Some(Duration::from_secs(*retry_after))
            }
            _ if self.is_retryable() => Some(Duration::from_secs(10)),
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            PlanError::GenerationFailed { .. } => {
                "Could not generate a workout plan. The match succeeded; please retry plan generation.".to_string()
            }
            PlanError::RateLimitExceeded { retry_after } => format!(
                "Too many requests. Please wait {} seconds before trying again.",
                retry_after
            ),
            PlanError::RequestTimeout => {
                "Plan generation timed out. Please try again.".to_string()
            }
            PlanError::InvalidResponseFormat { .. } => {
                "The plan service returned malformed output.".to_string()
            }
            PlanError::ServerError { status_code } => {
                format!("Plan service error (status {}).", status_code)
            }
        }
    }

    fn error_code(&self) -> String {
        "PLAN".to_string()
    }
}

impl ErrorExt for DatabaseError {
    fn log_error(&self) -> &Self {
        error!("DatabaseError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("DatabaseError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        matches!(self, DatabaseError::ConnectionFailed { .. })
    }

    fn retry_after(&self) -> Option<Duration> {
        if self.is_retryable() {
            Some(Duration::from_secs(5))
        } else {
            None
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            DatabaseError::ConnectionFailed { .. } => {
                "Could not connect to the database. Please check POSTGRES_URL.".to_string()
            }
            DatabaseError::CorruptRecord { username, .. } => {
                format!("Stored record for '{}' is corrupt. Run the repair tool.", username)
            }
            DatabaseError::ConstraintViolation { constraint } => {
                format!("Database constraint violated: {}", constraint)
            }
            _ => "A database error occurred.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        "DATABASE".to_string()
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::MissingEnvironmentVariable { var_name } => {
                format!("Environment variable {} is not set.", var_name)
            }
            ConfigError::InvalidValue { field, value } => {
                format!("Invalid configuration value for {}: {}", field, value)
            }
            ConfigError::ValidationFailed { reason } => {
                format!("Configuration validation failed: {}", reason)
            }
        }
    }

    fn error_code(&self) -> String {
        "CONFIG".to_string()
    }
}
