//! Client for an OpenAI-compatible embeddings endpoint (DeepInfra by
//! default). Renders a profile into text, calls the model, and returns the
//! embedding vector.

pub mod retry;

use fitmatch_core::{
    AppConfig, CoreError, EmbeddingError, EmbeddingProvider, ErrorExt, UserProfile,
};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use retry::RetryConfig;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    encoding_format: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
    pub usage: Option<EmbeddingUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingData {
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingUsage {
    pub prompt_tokens: u32,
}

#[derive(Debug)]
pub struct EmbeddingClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
    retry_config: RetryConfig,
}

impl EmbeddingClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            api_key,
            base_url,
            model,
            retry_config: RetryConfig::default(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.deepinfra_token.clone(),
            config.embedding_base_url.clone(),
            config.embedding_model.clone(),
        )
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// Render the profile into the text the embedding model sees.
    pub fn profile_to_text(profile: &UserProfile) -> String {
        let mut text = format!(
            "Fitness Goals: {}\n\
             Body Data: Weight {}kg, Height {}cm, Age {} years\n\
             Training Experience: {} years\n\
             Gender: {}\n\
             Location: {}\n\
             Diet Preference: {}\n\
             Lifestyle: eats out {} times/week, cooks {} times/week, \
             {} daily snacks ({}), {} fruit/veg servings, drinks {}",
            profile.fitness_goals.join(", "),
            profile.weight,
            profile.height,
            profile.age,
            profile.experience,
            profile.gender,
            profile.location,
            profile.diet_preference,
            profile.eat_out_freq,
            profile.cook_freq,
            profile.daily_snacks,
            profile.snack_type,
            profile.fruit_veg_servings,
            profile.beverage_choice,
        );

        if let Some(body_fat) = profile.body_fat {
            text.push_str(&format!("\nBody Fat: {}%", body_fat));
        }
        if let Some(frequency) = profile.frequency {
            text.push_str(&format!("\nWorkout Frequency: {}x per week", frequency));
        }
        if !profile.struggling_with.is_empty() {
            text.push_str(&format!("\nStruggling With: {}", profile.struggling_with));
        }

        text
    }

    /// Generate an embedding for arbitrary text, retrying transient
    /// failures per the configured policy.
    pub async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, CoreError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.request_embedding(text).await {
                Ok(vector) => return Ok(vector),
                Err(e) => {
                    let core: CoreError = e.into();
                    if attempt >= self.retry_config.max_attempts || !core.is_retryable() {
                        core.log_error();
                        return Err(core);
                    }
                    let delay = core
                        .retry_after()
                        .unwrap_or_else(|| self.retry_config.delay_for_attempt(attempt));
                    warn!(
                        "Embedding attempt {}/{} failed ({}), retrying in {:?}",
                        attempt, self.retry_config.max_attempts, core, delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Generate the embedding for a user profile.
    pub async fn generate_profile_embedding(
        &self,
        profile: &UserProfile,
    ) -> Result<Vec<f32>, CoreError> {
        profile
            .validate()
            .map_err(|reason| EmbeddingError::InvalidProfile { reason })?;

        info!("Generating profile embedding for user {}", profile.username);
        let text = Self::profile_to_text(profile);
        self.generate_embedding(&text).await
    }

    async fn request_embedding(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/embeddings", self.base_url);
        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
            encoding_format: "float",
        };

        debug!("Requesting embedding from {} (model {})", url, self.model);
        let response = match self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Embedding request transport error: {}", e);
                if e.is_timeout() {
                    return Err(EmbeddingError::RequestTimeout);
                }
                return Err(EmbeddingError::Unavailable {
                    reason: e.to_string(),
                });
            }
        };

        let status = response.status();
        if !status.is_success() {
            error!("Embedding request failed with status {}", status);
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => {
                    let retry_after = response
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .unwrap_or(60);
                    EmbeddingError::RateLimitExceeded { retry_after }
                }
                s if s.is_server_error() => EmbeddingError::ServerError {
                    status_code: s.as_u16(),
                },
                s => EmbeddingError::Unavailable {
                    reason: format!("unexpected status {}", s),
                },
            });
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            error!("Failed to parse embedding response: {}", e);
            EmbeddingError::InvalidResponse {
                details: e.to_string(),
            }
        })?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::InvalidResponse {
                details: "response contained no embedding data".to_string(),
            })?;

        if vector.is_empty() {
            return Err(EmbeddingError::InvalidResponse {
                details: "empty embedding vector".to_string(),
            });
        }

        if let Some(usage) = parsed.usage {
            debug!(
                "Embedding generated ({} dims, {} prompt tokens)",
                vector.len(),
                usage.prompt_tokens
            );
        }
        Ok(vector)
    }
}

impl EmbeddingProvider for EmbeddingClient {
    async fn embed(&self, profile: &UserProfile) -> Result<Vec<f32>, CoreError> {
        self.generate_profile_embedding(profile).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitmatch_core::sample_data::sample_profile;

    #[test]
    fn profile_text_includes_key_attributes() {
        let alice = sample_profile("alice_runner").unwrap();
        let text = EmbeddingClient::profile_to_text(&alice);
        assert!(text.contains("Weight Loss, Cardio Fitness"));
        assert!(text.contains("Weight 65kg, Height 170cm, Age 28 years"));
        assert!(text.contains("Body Fat: 20%"));
        assert!(text.contains("Workout Frequency: 4x per week"));
        assert!(text.contains("Struggling With: Finding time"));
    }

    #[test]
    fn profile_text_omits_absent_optionals() {
        let mut alice = sample_profile("alice_runner").unwrap();
        alice.body_fat = None;
        alice.frequency = None;
        alice.struggling_with = String::new();
        let text = EmbeddingClient::profile_to_text(&alice);
        assert!(!text.contains("Body Fat"));
        assert!(!text.contains("Workout Frequency"));
        assert!(!text.contains("Struggling With"));
    }

    #[test]
    fn response_parsing() {
        let raw = r#"{
            "data": [{"embedding": [0.125, -0.5, 0.75], "index": 0, "object": "embedding"}],
            "usage": {"prompt_tokens": 42, "total_tokens": 42}
        }"#;
        let parsed: EmbeddingResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.data[0].embedding, vec![0.125, -0.5, 0.75]);
        assert_eq!(parsed.usage.unwrap().prompt_tokens, 42);
    }

    #[tokio::test]
    async fn invalid_profile_rejected_before_any_request() {
        let client = EmbeddingClient::new(
            "test-key".to_string(),
            "http://localhost:1".to_string(),
            "test-model".to_string(),
        )
        .with_retry_config(RetryConfig::no_retry());

        let mut profile = sample_profile("alice_runner").unwrap();
        profile.fitness_goals.clear();

        let err = client
            .generate_profile_embedding(&profile)
            .await
            .expect_err("empty goals must be rejected");
        assert!(matches!(
            err,
            CoreError::Embedding(EmbeddingError::InvalidProfile { .. })
        ));
    }
}
