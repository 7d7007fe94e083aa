use fitmatch_core::{
    ConfigError, CoreError, DatabaseError, EmbeddingError, ErrorExt, PlanError,
};
use std::time::Duration;

#[test]
fn test_error_codes() {
    let embedding_error = CoreError::Embedding(EmbeddingError::RequestTimeout);
    assert_eq!(embedding_error.error_code(), "EMBEDDING");

    let db_error = CoreError::Database(DatabaseError::CorruptRecord {
        username: "alice_runner".to_string(),
        reason: "empty embedding".to_string(),
    });
    assert_eq!(db_error.error_code(), "DATABASE");

    let plan_error = CoreError::Plan(PlanError::GenerationFailed {
        reason: "model refused".to_string(),
    });
    assert_eq!(plan_error.error_code(), "PLAN");

    let config_error = CoreError::Config(ConfigError::MissingEnvironmentVariable {
        var_name: "POSTGRES_URL".to_string(),
    });
    assert_eq!(config_error.error_code(), "CONFIG");
}

#[test]
fn test_retryable_errors() {
    let retryable = CoreError::Embedding(EmbeddingError::RateLimitExceeded { retry_after: 60 });
    assert!(retryable.is_retryable());

    let retryable = CoreError::Plan(PlanError::ServerError { status_code: 503 });
    assert!(retryable.is_retryable());

    let non_retryable = CoreError::Embedding(EmbeddingError::InvalidProfile {
        reason: "empty goals".to_string(),
    });
    assert!(!non_retryable.is_retryable());

    let non_retryable = CoreError::Config(ConfigError::MissingEnvironmentVariable {
        var_name: "OPENAI_API_KEY".to_string(),
    });
    assert!(!non_retryable.is_retryable());
}

#[test]
fn test_retry_after() {
    let rate_limit = CoreError::Embedding(EmbeddingError::RateLimitExceeded { retry_after: 60 });
    assert_eq!(rate_limit.retry_after(), Some(Duration::from_secs(60)));

    let plan_rate_limit = CoreError::Plan(PlanError::RateLimitExceeded { retry_after: 30 });
    assert_eq!(plan_rate_limit.retry_after(), Some(Duration::from_secs(30)));

    let invalid = CoreError::Embedding(EmbeddingError::InvalidProfile {
        reason: "missing username".to_string(),
    });
    assert_eq!(invalid.retry_after(), None);
}

#[test]
fn test_user_friendly_messages() {
    let config_error = CoreError::Config(ConfigError::MissingEnvironmentVariable {
        var_name: "DEEPINFRA_TOKEN".to_string(),
    });
    let message = config_error.user_friendly_message();
    assert!(message.contains("DEEPINFRA_TOKEN"));

    let corrupt = CoreError::Database(DatabaseError::CorruptRecord {
        username: "dan_beginner".to_string(),
        reason: "embedding is not a JSON array".to_string(),
    });
    let message = corrupt.user_friendly_message();
    assert!(message.contains("dan_beginner"));
    assert!(message.contains("repair"));

    let plan_error = CoreError::Plan(PlanError::GenerationFailed {
        reason: "upstream 500".to_string(),
    });
    let message = plan_error.user_friendly_message();
    assert!(!message.is_empty());
}

#[test]
fn test_error_cause_chain() {
    // Sub-errors convert into CoreError and keep their display content.
    let core: CoreError = EmbeddingError::Unavailable {
        reason: "connection refused".to_string(),
    }
    .into();
    assert!(core.to_string().contains("connection refused"));

    let core: CoreError = DatabaseError::ConnectionFailed {
        reason: "pool timed out".to_string(),
    }
    .into();
    assert!(core.to_string().contains("pool timed out"));
}
