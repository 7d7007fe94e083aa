//! Fixed sample profiles used to seed an empty pool and to exercise the
//! matching pipeline in tests and demos.

use crate::types::UserProfile;

struct SampleSpec {
    username: &'static str,
    age: i32,
    gender: &'static str,
    location: &'static str,
    height: f64,
    weight: f64,
    experience: i32,
    body_fat: Option<f64>,
    frequency: Option<i32>,
    eat_out_freq: &'static str,
    cook_freq: &'static str,
    daily_snacks: &'static str,
    snack_type: &'static str,
    fruit_veg_servings: &'static str,
    beverage_choice: &'static str,
    diet_preference: &'static str,
    fitness_goals: &'static [&'static str],
    struggling_with: &'static str,
}

const SAMPLES: &[SampleSpec] = &[
    SampleSpec {
        username: "alice_runner",
        age: 28,
        gender: "Female",
        location: "San Francisco, CA",
        height: 170.0,
        weight: 65.0,
        experience: 2,
        body_fat: Some(20.0),
        frequency: Some(4),
        eat_out_freq: "2–3",
        cook_freq: "4–5",
        daily_snacks: "1",
        snack_type: "Healthy (fruit/nuts)",
        fruit_veg_servings: "4–5",
        beverage_choice: "Mostly water",
        diet_preference: "Omnivore",
        fitness_goals: &["Weight Loss", "Cardio Fitness"],
        struggling_with: "Finding time for consistent workouts",
    },
    SampleSpec {
        username: "bob_lifter",
        age: 32,
        gender: "Male",
        location: "San Francisco, CA",
        height: 180.0,
        weight: 75.0,
        experience: 3,
        body_fat: Some(15.0),
        frequency: Some(5),
        eat_out_freq: "1–2",
        cook_freq: "5–6",
        daily_snacks: "0",
        snack_type: "Healthy (fruit/nuts)",
        fruit_veg_servings: "4–5",
        beverage_choice: "Mostly water",
        diet_preference: "Omnivore",
        fitness_goals: &["Cardio Fitness", "Strength Training"],
        struggling_with: "Balancing cardio and strength training",
    },
    SampleSpec {
        username: "carla_yogi",
        age: 35,
        gender: "Female",
        location: "Oakland, CA",
        height: 165.0,
        weight: 58.0,
        experience: 6,
        body_fat: Some(22.0),
        frequency: Some(6),
        eat_out_freq: "0–1",
        cook_freq: "6–7",
        daily_snacks: "2",
        snack_type: "Healthy (fruit/nuts)",
        fruit_veg_servings: "6+",
        beverage_choice: "Tea",
        diet_preference: "Vegetarian",
        fitness_goals: &["Flexibility", "Stress Relief"],
        struggling_with: "Plateau in flexibility progress",
    },
    SampleSpec {
        username: "dan_beginner",
        age: 24,
        gender: "Male",
        location: "San Jose, CA",
        height: 175.0,
        weight: 88.0,
        experience: 0,
        body_fat: Some(26.0),
        frequency: Some(2),
        eat_out_freq: "4–5",
        cook_freq: "1–2",
        daily_snacks: "3+",
        snack_type: "Processed (chips/candy)",
        fruit_veg_servings: "0–1",
        beverage_choice: "Soda or juice",
        diet_preference: "Omnivore",
        fitness_goals: &["Weight Loss"],
        struggling_with: "Staying motivated without a partner",
    },
    SampleSpec {
        username: "erin_climber",
        age: 29,
        gender: "Female",
        location: "Berkeley, CA",
        height: 168.0,
        weight: 60.0,
        experience: 4,
        body_fat: Some(18.0),
        frequency: Some(4),
        eat_out_freq: "2–3",
        cook_freq: "4–5",
        daily_snacks: "1",
        snack_type: "Protein bars",
        fruit_veg_servings: "2–3",
        beverage_choice: "Mostly water",
        diet_preference: "Pescatarian",
        fitness_goals: &["Strength Training", "Endurance"],
        struggling_with: "Grip strength limiting harder routes",
    },
    SampleSpec {
        username: "frank_cyclist",
        age: 41,
        gender: "Male",
        location: "San Francisco, CA",
        height: 182.0,
        weight: 79.0,
        experience: 10,
        body_fat: Some(14.0),
        frequency: Some(5),
        eat_out_freq: "1–2",
        cook_freq: "5–6",
        daily_snacks: "2",
        snack_type: "Healthy (fruit/nuts)",
        fruit_veg_servings: "4–5",
        beverage_choice: "Mostly water",
        diet_preference: "Vegan",
        fitness_goals: &["Endurance", "Cardio Fitness"],
        struggling_with: "Recovery time after long rides",
    },
    SampleSpec {
        username: "grace_newmom",
        age: 33,
        gender: "Female",
        location: "Daly City, CA",
        height: 162.0,
        weight: 70.0,
        experience: 1,
        body_fat: None,
        frequency: Some(3),
        eat_out_freq: "2–3",
        cook_freq: "3–4",
        daily_snacks: "2",
        snack_type: "Mixed",
        fruit_veg_servings: "2–3",
        beverage_choice: "Coffee",
        diet_preference: "Omnivore",
        fitness_goals: &["Weight Loss", "Core Strength"],
        struggling_with: "Short workout windows around childcare",
    },
    SampleSpec {
        username: "hiro_powerlifter",
        age: 27,
        gender: "Male",
        location: "San Francisco, CA",
        height: 172.0,
        weight: 92.0,
        experience: 7,
        body_fat: Some(17.0),
        frequency: Some(4),
        eat_out_freq: "2–3",
        cook_freq: "4–5",
        daily_snacks: "1",
        snack_type: "Protein bars",
        fruit_veg_servings: "2–3",
        beverage_choice: "Mostly water",
        diet_preference: "Omnivore",
        fitness_goals: &["Strength Training", "Muscle Gain"],
        struggling_with: "Stalled bench press for three months",
    },
];

/// The fixed seed pool.
pub fn sample_profiles() -> Vec<UserProfile> {
    SAMPLES.iter().map(to_profile).collect()
}

/// Look up one sample profile by username.
pub fn sample_profile(username: &str) -> Option<UserProfile> {
    SAMPLES
        .iter()
        .find(|s| s.username == username)
        .map(to_profile)
}

fn to_profile(spec: &SampleSpec) -> UserProfile {
    UserProfile {
        username: spec.username.to_string(),
        age: spec.age,
        gender: spec.gender.to_string(),
        location: spec.location.to_string(),
        height: spec.height,
        weight: spec.weight,
        experience: spec.experience,
        body_fat: spec.body_fat,
        frequency: spec.frequency,
        eat_out_freq: spec.eat_out_freq.to_string(),
        cook_freq: spec.cook_freq.to_string(),
        daily_snacks: spec.daily_snacks.to_string(),
        snack_type: spec.snack_type.to_string(),
        fruit_veg_servings: spec.fruit_veg_servings.to_string(),
        beverage_choice: spec.beverage_choice.to_string(),
        diet_preference: spec.diet_preference.to_string(),
        fitness_goals: spec.fitness_goals.iter().map(|g| g.to_string()).collect(),
        struggling_with: spec.struggling_with.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn sample_usernames_are_unique() {
        let profiles = sample_profiles();
        let names: HashSet<_> = profiles.iter().map(|p| p.username.as_str()).collect();
        assert_eq!(names.len(), profiles.len());
    }

    #[test]
    fn all_samples_validate() {
        for profile in sample_profiles() {
            assert!(profile.validate().is_ok(), "{} failed", profile.username);
        }
    }

    #[test]
    fn lookup_by_username() {
        let alice = sample_profile("alice_runner").expect("alice should exist");
        assert_eq!(alice.location, "San Francisco, CA");
        assert!(sample_profile("nobody").is_none());
    }
}
