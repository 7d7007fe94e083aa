use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured user fitness/lifestyle record used as matching input.
///
/// `username` is the identity key: non-empty and unique within the pool.
/// Lifestyle fields (`eat_out_freq` through `diet_preference`) come from
/// small closed vocabularies collected by the intake form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub age: i32,
    pub gender: String,
    pub location: String,
    /// Height in centimeters.
    pub height: f64,
    /// Weight in kilograms.
    pub weight: f64,
    /// Training experience in years.
    pub experience: i32,
    pub body_fat: Option<f64>,
    /// Workout sessions per week, if known.
    pub frequency: Option<i32>,
    pub eat_out_freq: String,
    pub cook_freq: String,
    pub daily_snacks: String,
    pub snack_type: String,
    pub fruit_veg_servings: String,
    pub beverage_choice: String,
    pub diet_preference: String,
    /// Non-empty; order carries no meaning.
    pub fitness_goals: Vec<String>,
    /// Free text, may be empty.
    pub struggling_with: String,
}

impl UserProfile {
    /// Required-field check used before handing the profile to collaborators.
    pub fn validate(&self) -> Result<(), String> {
        if self.username.trim().is_empty() {
            return Err("username must be non-empty".to_string());
        }
        if self.fitness_goals.is_empty() {
            return Err("fitness_goals must contain at least one goal".to_string());
        }
        Ok(())
    }
}

/// One of the two alternating day-type workouts inside a generated plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDay {
    pub title: String,
    pub duration: String,
    pub exercises: Vec<String>,
    pub diet: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPlan {
    pub how_many_weeks: String,
    pub odd_day_workout_plan: WorkoutDay,
    pub even_day_workout_plan: WorkoutDay,
}

/// Plan document produced by the plan-generation collaborator.
///
/// Field names mirror the JSON contract the model is prompted to emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPlan {
    pub group_name: String,
    pub description: String,
    pub goal: String,
    pub weekly_plan: WeeklyPlan,
    pub member_full_names: Vec<String>,
    pub member_usernames: Vec<String>,
}

/// Persisted group record pairing two matched users with their plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessGroup {
    pub group_id: String,
    pub group_name: String,
    pub description: String,
    pub goal: String,
    pub how_many_weeks: String,
    pub odd_day: WorkoutDay,
    pub even_day: WorkoutDay,
    pub member_full_names: Vec<String>,
    pub member_usernames: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl FitnessGroup {
    /// Flatten a generated plan into a persistable record under `group_id`.
    pub fn from_plan(group_id: String, plan: &GroupPlan) -> Self {
        Self {
            group_id,
            group_name: plan.group_name.clone(),
            description: plan.description.clone(),
            goal: plan.goal.clone(),
            how_many_weeks: plan.weekly_plan.how_many_weeks.clone(),
            odd_day: plan.weekly_plan.odd_day_workout_plan.clone(),
            even_day: plan.weekly_plan.even_day_workout_plan.clone(),
            member_full_names: plan.member_full_names.clone(),
            member_usernames: plan.member_usernames.clone(),
            created_at: None,
        }
    }
}

/// A ranked candidate from the matching pool.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub profile: UserProfile,
    /// Cosine similarity against the query vector, in [-1, 1].
    pub score: f32,
    /// 1-based position after the descending sort. Equal scores keep pool
    /// iteration order (stable sort, no secondary key).
    pub rank: usize,
}

/// Everything a successful matching operation reports back.
#[derive(Debug, Clone)]
pub struct MatchReport {
    pub group_id: String,
    pub group_name: String,
    pub primary_user: String,
    pub matched_user: String,
    pub similarity: f32,
    pub rank: usize,
    pub plan: GroupPlan,
    /// Runners-up beyond the selected partner, for reporting only.
    pub runners_up: Vec<MatchCandidate>,
}

/// Terminal outcome of one matching operation. Hard failures travel on the
/// `Err` side of the surrounding `Result`.
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    Matched(Box<MatchReport>),
    NoMatch { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(username: &str, goals: &[&str]) -> UserProfile {
        UserProfile {
            username: username.to_string(),
            age: 28,
            gender: "Female".to_string(),
            location: "San Francisco, CA".to_string(),
            height: 170.0,
            weight: 65.0,
            experience: 2,
            body_fat: Some(20.0),
            frequency: Some(4),
            eat_out_freq: "2–3".to_string(),
            cook_freq: "4–5".to_string(),
            daily_snacks: "1".to_string(),
            snack_type: "Healthy (fruit/nuts)".to_string(),
            fruit_veg_servings: "4–5".to_string(),
            beverage_choice: "Mostly water".to_string(),
            diet_preference: "Omnivore".to_string(),
            fitness_goals: goals.iter().map(|g| g.to_string()).collect(),
            struggling_with: String::new(),
        }
    }

    #[test]
    fn validate_accepts_complete_profile() {
        assert!(profile("alice", &["Weight Loss"]).validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_username() {
        assert!(profile("  ", &["Weight Loss"]).validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_goals() {
        assert!(profile("alice", &[]).validate().is_err());
    }

    #[test]
    fn group_plan_parses_camel_case_json() {
        let raw = r#"{
            "groupName": "SF Morning Runners",
            "description": "Early morning running group",
            "goal": "Cardio Fitness",
            "weeklyPlan": {
                "howManyWeeks": "6",
                "oddDayWorkoutPlan": {
                    "title": "Trail Running Session",
                    "duration": "45 minutes",
                    "exercises": ["5-minute warm-up walk", "30-minute trail run"],
                    "diet": "Pre-workout: banana and water"
                },
                "evenDayWorkoutPlan": {
                    "title": "Strength & Cross Training",
                    "duration": "60 minutes",
                    "exercises": ["10-minute dynamic warm-up"],
                    "diet": "Post-workout: balanced meal"
                }
            },
            "memberFullNames": ["Alice Johnson", "Bob Smith"],
            "memberUsernames": ["alice_runner", "bob_lifter"]
        }"#;

        let plan: GroupPlan = serde_json::from_str(raw).expect("plan should parse");
        assert_eq!(plan.group_name, "SF Morning Runners");
        assert_eq!(plan.weekly_plan.how_many_weeks, "6");
        assert_eq!(plan.member_usernames, vec!["alice_runner", "bob_lifter"]);
    }

    #[test]
    fn fitness_group_flattens_plan() {
        let raw = r#"{
            "groupName": "Lifters",
            "description": "d",
            "goal": "Strength Training",
            "weeklyPlan": {
                "howManyWeeks": "4",
                "oddDayWorkoutPlan": {"title": "A", "duration": "45m", "exercises": ["x"], "diet": "p"},
                "evenDayWorkoutPlan": {"title": "B", "duration": "60m", "exercises": ["y"], "diet": "q"}
            },
            "memberFullNames": ["A", "B"],
            "memberUsernames": ["a", "b"]
        }"#;
        let plan: GroupPlan = serde_json::from_str(raw).unwrap();
        let group = FitnessGroup::from_plan("group_test".to_string(), &plan);
        assert_eq!(group.group_id, "group_test");
        assert_eq!(group.odd_day.title, "A");
        assert_eq!(group.even_day.title, "B");
        assert_eq!(group.how_many_weeks, "4");
    }
}
