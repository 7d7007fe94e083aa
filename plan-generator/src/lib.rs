//! Generates a shared fitness group plan for two matched users through an
//! OpenAI chat-completions endpoint, prompting for strict JSON and parsing
//! the reply into [`GroupPlan`].

use fitmatch_core::{
    AppConfig, CoreError, ErrorExt, GroupPlan, PlanError, PlanProvider, UserProfile,
};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

const SYSTEM_PROMPT: &str = "You are a professional fitness coach. Return only valid JSON \
     objects for fitness group plans. Do not include any markdown formatting or additional text.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

#[derive(Debug)]
pub struct PlanGenerator {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl PlanGenerator {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            api_key,
            base_url,
            model,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.openai_api_key.clone(),
            config.plan_base_url.clone(),
            config.plan_model.clone(),
        )
    }

    fn user_summary(profile: &UserProfile, role: &str) -> String {
        format!(
            "{}: {}\n\
             - Age: {}, Gender: {}, Location: {}\n\
             - Physical: {}cm, {}kg, Experience: {} years\n\
             - Goals: {}\n\
             - Diet: {}\n\
             - Frequency: {}\n\
             - Struggles: {}",
            role,
            profile.username,
            profile.age,
            profile.gender,
            profile.location,
            profile.height,
            profile.weight,
            profile.experience,
            profile.fitness_goals.join(", "),
            profile.diet_preference,
            profile
                .frequency
                .map(|f| format!("{}x/week", f))
                .unwrap_or_else(|| "unspecified".to_string()),
            profile.struggling_with,
        )
    }

    /// Shared city for the group name, or "Mixed Location" when the users
    /// live apart.
    fn shared_location(primary: &UserProfile, matched: &UserProfile) -> String {
        if primary.location == matched.location {
            primary
                .location
                .split(',')
                .next()
                .unwrap_or(&primary.location)
                .to_string()
        } else {
            "Mixed Location".to_string()
        }
    }

    /// First goal the users share, falling back to the primary user's first
    /// goal.
    fn common_goal(primary: &UserProfile, matched: &UserProfile) -> String {
        primary
            .fitness_goals
            .iter()
            .find(|g| matched.fitness_goals.contains(g))
            .or_else(|| primary.fitness_goals.first())
            .cloned()
            .unwrap_or_default()
    }

    /// Assemble the full prompt sent to the model.
    pub fn build_prompt(primary: &UserProfile, matched: &UserProfile) -> String {
        let shared_location = Self::shared_location(primary, matched);
        let primary_goal = Self::common_goal(primary, matched);

        format!(
            r#"You are a professional fitness coach creating a structured fitness group for two matched users. Based on their profiles, create a comprehensive fitness group plan.

USER PROFILES:
{primary_summary}

{matched_summary}

REQUIREMENTS:
You must return a valid JSON object with the following exact structure. Each field must be filled with specific, actionable content:

{{
    "groupName": "[Create catchy name based on their location, time preference, or main activity]",
    "description": "[2-3 sentences describing the group's focus and what makes it special]",
    "goal": "[Primary shared fitness goal from their profiles]",
    "weeklyPlan": {{
        "howManyWeeks": "[Number of weeks for the plan, typically 4-8]",
        "oddDayWorkoutPlan": {{
            "title": "[Name for odd day workouts (Mon/Wed/Fri)]",
            "duration": "[Total workout time]",
            "exercises": ["[Exercise 1]", "[Exercise 2]", "[Exercise 3]", "[Exercise 4]", "[Exercise 5]"],
            "diet": "[Specific dietary recommendations for odd day workouts]"
        }},
        "evenDayWorkoutPlan": {{
            "title": "[Name for even day workouts (Tue/Thu/Sat)]",
            "duration": "[Total workout time]",
            "exercises": ["[Exercise 1]", "[Exercise 2]", "[Exercise 3]", "[Exercise 4]", "[Exercise 5]"],
            "diet": "[Specific dietary recommendations for even day workouts]"
        }}
    }},
    "memberFullNames": ["{primary_user}", "{matched_user}"],
    "memberUsernames": ["{primary_user}", "{matched_user}"]
}}

IMPORTANT GUIDELINES:
1. Consider both users' experience levels ({primary_exp} vs {matched_exp} years)
2. Account for their shared location: {shared_location}
3. Focus on their common goal: {primary_goal}
4. Make exercises appropriate for both fitness levels
5. Consider their diet preferences: {primary_diet} and {matched_diet}
6. Address their struggles: "{primary_struggles}" and "{matched_struggles}"
7. Odd days should focus on one aspect (e.g., strength, cardio)
8. Even days should complement odd days (e.g., if odd=strength, even=cardio)
9. Return ONLY the JSON object, no additional text or formatting
10. Ensure all JSON syntax is correct with proper quotes and commas

Generate a creative group name and comprehensive workout plans that both users can follow together effectively."#,
            primary_summary = Self::user_summary(primary, "Primary User"),
            matched_summary = Self::user_summary(matched, "Matched User"),
            primary_user = primary.username,
            matched_user = matched.username,
            primary_exp = primary.experience,
            matched_exp = matched.experience,
            primary_diet = primary.diet_preference,
            matched_diet = matched.diet_preference,
            primary_struggles = primary.struggling_with,
            matched_struggles = matched.struggling_with,
        )
    }

    /// Strip Markdown code fences some models wrap around the JSON body.
    fn strip_code_fences(content: &str) -> &str {
        let mut trimmed = content.trim();
        if let Some(rest) = trimmed.strip_prefix("```json") {
            trimmed = rest;
        } else if let Some(rest) = trimmed.strip_prefix("```") {
            trimmed = rest;
        }
        if let Some(rest) = trimmed.strip_suffix("```") {
            trimmed = rest;
        }
        trimmed.trim()
    }

    /// Parse a model reply into a plan, rejecting malformed output.
    pub fn parse_plan(content: &str) -> Result<GroupPlan, PlanError> {
        let body = Self::strip_code_fences(content);
        serde_json::from_str(body).map_err(|e| {
            error!("Failed to parse plan JSON: {}", e);
            PlanError::InvalidResponseFormat {
                details: e.to_string(),
            }
        })
    }

    /// Generate a shared plan for two matched users.
    pub async fn generate_group_plan(
        &self,
        primary: &UserProfile,
        matched: &UserProfile,
    ) -> Result<GroupPlan, CoreError> {
        info!(
            "Generating fitness group plan for {} and {}",
            primary.username, matched.username
        );

        let prompt = Self::build_prompt(primary, matched);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: 0.7,
            max_tokens: 2000,
        };

        let url = format!("{}/chat/completions", self.base_url);
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
                error!("Plan request transport error: {}", e);
                let plan_error = if e.is_timeout() {
                    PlanError::RequestTimeout
                } else {
                    PlanError::GenerationFailed {
                        reason: e.to_string(),
                    }
                };
                plan_error.log_error();
                return Err(plan_error.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            error!("Plan request failed with status {}", status);
            let plan_error = match status {
                StatusCode::TOO_MANY_REQUESTS => {
                    let retry_after = response
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .unwrap_or(60);
                    PlanError::RateLimitExceeded { retry_after }
                }
                s if s.is_server_error() => PlanError::ServerError {
                    status_code: s.as_u16(),
                },
                s => PlanError::GenerationFailed {
                    reason: format!("unexpected status {}", s),
                },
            };
            return Err(plan_error.into());
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            error!("Failed to parse chat response: {}", e);
            PlanError::InvalidResponseFormat {
                details: e.to_string(),
            }
        })?;

        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| PlanError::InvalidResponseFormat {
                details: "response contained no choices".to_string(),
            })?;

        let plan = Self::parse_plan(content)?;
        if let Some(usage) = parsed.usage {
            debug!("Plan generated using {} tokens", usage.total_tokens);
        }
        info!("Successfully generated plan '{}'", plan.group_name);
        Ok(plan)
    }
}

impl PlanProvider for PlanGenerator {
    async fn generate_plan(
        &self,
        primary: &UserProfile,
        matched: &UserProfile,
    ) -> Result<GroupPlan, CoreError> {
        self.generate_group_plan(primary, matched).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitmatch_core::sample_data::sample_profile;

    const PLAN_JSON: &str = r#"{
        "groupName": "SF Morning Runners",
        "description": "Early morning running group for weight loss and cardio fitness.",
        "goal": "Cardio Fitness",
        "weeklyPlan": {
            "howManyWeeks": "6",
            "oddDayWorkoutPlan": {
                "title": "Trail Running Session",
                "duration": "45 minutes",
                "exercises": ["Warm-up walk", "Trail run", "Cool-down", "Stretching"],
                "diet": "Pre-workout: banana and water"
            },
            "evenDayWorkoutPlan": {
                "title": "Strength & Cross Training",
                "duration": "60 minutes",
                "exercises": ["Dynamic warm-up", "Strength circuit", "Cross-training"],
                "diet": "Post-workout: balanced meal"
            }
        },
        "memberFullNames": ["alice_runner", "bob_lifter"],
        "memberUsernames": ["alice_runner", "bob_lifter"]
    }"#;

    #[test]
    fn parses_bare_json() {
        let plan = PlanGenerator::parse_plan(PLAN_JSON).unwrap();
        assert_eq!(plan.group_name, "SF Morning Runners");
        assert_eq!(plan.weekly_plan.odd_day_workout_plan.exercises.len(), 4);
    }

    #[test]
    fn parses_fenced_json() {
        let fenced = format!("```json\n{}\n```", PLAN_JSON);
        let plan = PlanGenerator::parse_plan(&fenced).unwrap();
        assert_eq!(plan.member_usernames, vec!["alice_runner", "bob_lifter"]);

        let plain_fence = format!("```\n{}\n```", PLAN_JSON);
        assert!(PlanGenerator::parse_plan(&plain_fence).is_ok());
    }

    #[test]
    fn rejects_malformed_json() {
        let err = PlanGenerator::parse_plan("not json at all").unwrap_err();
        assert!(matches!(err, PlanError::InvalidResponseFormat { .. }));

        let err = PlanGenerator::parse_plan(r#"{"groupName": "incomplete"}"#).unwrap_err();
        assert!(matches!(err, PlanError::InvalidResponseFormat { .. }));
    }

    #[test]
    fn prompt_contains_both_users_and_shared_context() {
        let alice = sample_profile("alice_runner").unwrap();
        let bob = sample_profile("bob_lifter").unwrap();
        let prompt = PlanGenerator::build_prompt(&alice, &bob);

        assert!(prompt.contains("Primary User: alice_runner"));
        assert!(prompt.contains("Matched User: bob_lifter"));
        // Both live in San Francisco, CA; the shared location is the city.
        assert!(prompt.contains("shared location: San Francisco"));
        // Cardio Fitness is the goal they share.
        assert!(prompt.contains("common goal: Cardio Fitness"));
    }

    #[test]
    fn mixed_location_when_users_live_apart() {
        let alice = sample_profile("alice_runner").unwrap();
        let carla = sample_profile("carla_yogi").unwrap();
        let prompt = PlanGenerator::build_prompt(&alice, &carla);
        assert!(prompt.contains("Mixed Location"));
    }

    #[test]
    fn common_goal_falls_back_to_primary_first_goal() {
        let alice = sample_profile("alice_runner").unwrap();
        let carla = sample_profile("carla_yogi").unwrap();
        // No overlap between alice and carla.
        let prompt = PlanGenerator::build_prompt(&alice, &carla);
        assert!(prompt.contains("common goal: Weight Loss"));
    }
}
