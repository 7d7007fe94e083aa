//! PostgreSQL storage for user profiles, embeddings, and fitness groups.
//!
//! The pool handle is constructed once and passed wherever storage is
//! needed; nothing in this crate keeps global connection state. Upserts are
//! keyed by username (users) or group id (groups) and are last-write-wins.

pub mod decode;

use chrono::{DateTime, Utc};
use fitmatch_core::{
    CoreError, DatabaseError, ErrorExt, FitnessGroup, ProfileStore, UserProfile, WorkoutDay,
};
use serde_json::json;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{info, warn};

use decode::{canonicalize_array, decode_string_array, decode_user_row, RawUserRow};

const CREATE_USERS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS fitness_users (
        username VARCHAR(255) PRIMARY KEY,
        age INTEGER NOT NULL,
        gender VARCHAR(50) NOT NULL,
        location VARCHAR(255) NOT NULL,
        height FLOAT8 NOT NULL,
        weight FLOAT8 NOT NULL,
        experience INTEGER NOT NULL,
        body_fat FLOAT8,
        frequency INTEGER,
        eat_out_freq VARCHAR(10) NOT NULL,
        cook_freq VARCHAR(10) NOT NULL,
        daily_snacks VARCHAR(10) NOT NULL,
        snack_type VARCHAR(100) NOT NULL,
        fruit_veg_servings VARCHAR(10) NOT NULL,
        beverage_choice VARCHAR(100) NOT NULL,
        diet_preference VARCHAR(50) NOT NULL,
        fitness_goals JSONB NOT NULL,
        struggling_with TEXT DEFAULT '',
        embedding JSONB NOT NULL,
        created_at TIMESTAMPTZ DEFAULT NOW()
    )";

const CREATE_GROUPS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS fitness_groups (
        group_id VARCHAR(255) PRIMARY KEY,
        group_name VARCHAR(255) NOT NULL,
        description TEXT NOT NULL,
        goal VARCHAR(100) NOT NULL,
        how_many_weeks VARCHAR(50) NOT NULL,
        odd_day_title VARCHAR(255) NOT NULL,
        odd_day_duration VARCHAR(100) NOT NULL,
        odd_day_exercises JSONB NOT NULL,
        odd_day_diet TEXT NOT NULL,
        even_day_title VARCHAR(255) NOT NULL,
        even_day_duration VARCHAR(100) NOT NULL,
        even_day_exercises JSONB NOT NULL,
        even_day_diet TEXT NOT NULL,
        member_full_names JSONB NOT NULL,
        member_usernames JSONB NOT NULL,
        created_at TIMESTAMPTZ DEFAULT NOW()
    )";

/// Outcome of one offline repair run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RepairSummary {
    pub examined: usize,
    pub repaired: usize,
    pub unfixable: usize,
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect and make sure the schema exists.
    pub async fn connect(connection_string: &str) -> Result<Self, CoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await
            .map_err(|e| DatabaseError::ConnectionFailed {
                reason: e.to_string(),
            })?;

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    async fn init_schema(&self) -> Result<(), CoreError> {
        sqlx::query(CREATE_USERS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        sqlx::query(CREATE_GROUPS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        info!("Database schema initialized");
        Ok(())
    }

    /// Idempotent upsert keyed by username; re-adding an existing username
    /// overwrites all fields.
    pub async fn upsert_user(
        &self,
        profile: &UserProfile,
        embedding: &[f32],
    ) -> Result<(), CoreError> {
        sqlx::query(
            "INSERT INTO fitness_users
             (username, age, gender, location, height, weight, experience, body_fat, frequency,
              eat_out_freq, cook_freq, daily_snacks, snack_type,
              fruit_veg_servings, beverage_choice, diet_preference,
              fitness_goals, struggling_with, embedding)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
             ON CONFLICT (username) DO UPDATE SET
                 age = EXCLUDED.age,
                 gender = EXCLUDED.gender,
                 location = EXCLUDED.location,
                 height = EXCLUDED.height,
                 weight = EXCLUDED.weight,
                 experience = EXCLUDED.experience,
                 body_fat = EXCLUDED.body_fat,
                 frequency = EXCLUDED.frequency,
                 eat_out_freq = EXCLUDED.eat_out_freq,
                 cook_freq = EXCLUDED.cook_freq,
                 daily_snacks = EXCLUDED.daily_snacks,
                 snack_type = EXCLUDED.snack_type,
                 fruit_veg_servings = EXCLUDED.fruit_veg_servings,
                 beverage_choice = EXCLUDED.beverage_choice,
                 diet_preference = EXCLUDED.diet_preference,
                 fitness_goals = EXCLUDED.fitness_goals,
                 struggling_with = EXCLUDED.struggling_with,
                 embedding = EXCLUDED.embedding",
        )
        .bind(&profile.username)
        .bind(profile.age)
        .bind(&profile.gender)
        .bind(&profile.location)
        .bind(profile.height)
        .bind(profile.weight)
        .bind(profile.experience)
        .bind(profile.body_fat)
        .bind(profile.frequency)
        .bind(&profile.eat_out_freq)
        .bind(&profile.cook_freq)
        .bind(&profile.daily_snacks)
        .bind(&profile.snack_type)
        .bind(&profile.fruit_veg_servings)
        .bind(&profile.beverage_choice)
        .bind(&profile.diet_preference)
        .bind(json!(profile.fitness_goals))
        .bind(&profile.struggling_with)
        .bind(json!(embedding))
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        info!("User {} stored", profile.username);
        Ok(())
    }

    /// Snapshot of all decodable (profile, embedding) pairs in insertion
    /// order. Corrupt rows are logged and skipped; the read path never
    /// repairs them.
    pub async fn all_users_with_embeddings(
        &self,
    ) -> Result<Vec<(UserProfile, Vec<f32>)>, CoreError> {
        let rows = sqlx::query("SELECT * FROM fitness_users ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from)?;

        let mut users = Vec::with_capacity(rows.len());
        for row in &rows {
            match raw_user_from_row(row).and_then(decode_user_row) {
                Ok(pair) => users.push(pair),
                Err(e) => {
                    e.log_warn();
                }
            }
        }

        info!("Loaded {} user(s) from {} stored row(s)", users.len(), rows.len());
        Ok(users)
    }

    pub async fn user_count(&self) -> Result<i64, CoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM fitness_users")
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        Ok(row.try_get::<i64, _>("count").map_err(DatabaseError::from)?)
    }

    pub async fn clear_users(&self) -> Result<(), CoreError> {
        sqlx::query("DELETE FROM fitness_users")
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        info!("All user records cleared");
        Ok(())
    }

    /// Upsert a group record keyed by `group_id`.
    pub async fn add_group(&self, group: &FitnessGroup) -> Result<(), CoreError> {
        sqlx::query(
            "INSERT INTO fitness_groups
             (group_id, group_name, description, goal, how_many_weeks,
              odd_day_title, odd_day_duration, odd_day_exercises, odd_day_diet,
              even_day_title, even_day_duration, even_day_exercises, even_day_diet,
              member_full_names, member_usernames)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             ON CONFLICT (group_id) DO UPDATE SET
                 group_name = EXCLUDED.group_name,
                 description = EXCLUDED.description,
                 goal = EXCLUDED.goal,
                 how_many_weeks = EXCLUDED.how_many_weeks,
                 odd_day_title = EXCLUDED.odd_day_title,
                 odd_day_duration = EXCLUDED.odd_day_duration,
                 odd_day_exercises = EXCLUDED.odd_day_exercises,
                 odd_day_diet = EXCLUDED.odd_day_diet,
                 even_day_title = EXCLUDED.even_day_title,
                 even_day_duration = EXCLUDED.even_day_duration,
                 even_day_exercises = EXCLUDED.even_day_exercises,
                 even_day_diet = EXCLUDED.even_day_diet,
                 member_full_names = EXCLUDED.member_full_names,
                 member_usernames = EXCLUDED.member_usernames",
        )
        .bind(&group.group_id)
        .bind(&group.group_name)
        .bind(&group.description)
        .bind(&group.goal)
        .bind(&group.how_many_weeks)
        .bind(&group.odd_day.title)
        .bind(&group.odd_day.duration)
        .bind(json!(group.odd_day.exercises))
        .bind(&group.odd_day.diet)
        .bind(&group.even_day.title)
        .bind(&group.even_day.duration)
        .bind(json!(group.even_day.exercises))
        .bind(&group.even_day.diet)
        .bind(json!(group.member_full_names))
        .bind(json!(group.member_usernames))
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        info!("Group {} stored", group.group_id);
        Ok(())
    }

    /// All groups, newest first. Undecodable rows are logged and skipped.
    pub async fn all_groups(&self) -> Result<Vec<FitnessGroup>, CoreError> {
        let rows = sqlx::query("SELECT * FROM fitness_groups ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from)?;

        let mut groups = Vec::with_capacity(rows.len());
        for row in &rows {
            match group_from_row(row) {
                Ok(group) => groups.push(group),
                Err(e) => {
                    e.log_warn();
                }
            }
        }

        info!("Loaded {} group(s)", groups.len());
        Ok(groups)
    }

    pub async fn groups_for_user(&self, username: &str) -> Result<Vec<FitnessGroup>, CoreError> {
        let groups = self
            .all_groups()
            .await?
            .into_iter()
            .filter(|g| g.member_usernames.iter().any(|m| m == username))
            .collect::<Vec<_>>();
        info!("Found {} group(s) for user {}", groups.len(), username);
        Ok(groups)
    }

    pub async fn group_count(&self) -> Result<i64, CoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM fitness_groups")
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        Ok(row.try_get::<i64, _>("count").map_err(DatabaseError::from)?)
    }

    /// Offline repair tool: rewrite double-encoded goal/embedding payloads
    /// into canonical JSONB arrays. Unfixable rows are left in place and
    /// reported so an operator can decide what to do with them.
    pub async fn repair_users(&self) -> Result<RepairSummary, CoreError> {
        let rows = sqlx::query("SELECT username, fitness_goals, embedding FROM fitness_users")
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from)?;

        let mut summary = RepairSummary::default();
        for row in &rows {
            summary.examined += 1;
            let username: String = row.try_get("username").map_err(DatabaseError::from)?;
            let goals: serde_json::Value =
                row.try_get("fitness_goals").map_err(DatabaseError::from)?;
            let embedding: serde_json::Value =
                row.try_get("embedding").map_err(DatabaseError::from)?;

            let fixed_goals = canonicalize_array(&goals);
            let fixed_embedding = canonicalize_array(&embedding);

            match (fixed_goals, fixed_embedding) {
                (Ok(None), Ok(None)) => {}
                (Ok(goals_fix), Ok(embedding_fix)) => {
                    sqlx::query(
                        "UPDATE fitness_users
                         SET fitness_goals = $1, embedding = $2
                         WHERE username = $3",
                    )
                    .bind(goals_fix.unwrap_or(goals))
                    .bind(embedding_fix.unwrap_or(embedding))
                    .bind(&username)
                    .execute(&self.pool)
                    .await
                    .map_err(DatabaseError::from)?;
                    info!("Repaired stored payloads for {}", username);
                    summary.repaired += 1;
                }
                (goals_result, embedding_result) => {
                    if let Err(reason) = goals_result {
                        warn!("Cannot repair fitness_goals for {}: {}", username, reason);
                    }
                    if let Err(reason) = embedding_result {
                        warn!("Cannot repair embedding for {}: {}", username, reason);
                    }
                    summary.unfixable += 1;
                }
            }
        }

        info!(
            "Repair finished: {} examined, {} repaired, {} unfixable",
            summary.examined, summary.repaired, summary.unfixable
        );
        Ok(summary)
    }
}

fn raw_user_from_row(row: &PgRow) -> Result<RawUserRow, DatabaseError> {
    let username: String = row.try_get("username")?;
    let extract = || -> Result<RawUserRow, sqlx::Error> {
        Ok(RawUserRow {
            username: username.clone(),
            age: row.try_get("age")?,
            gender: row.try_get("gender")?,
            location: row.try_get("location")?,
            height: row.try_get("height")?,
            weight: row.try_get("weight")?,
            experience: row.try_get("experience")?,
            body_fat: row.try_get("body_fat")?,
            frequency: row.try_get("frequency")?,
            eat_out_freq: row.try_get("eat_out_freq")?,
            cook_freq: row.try_get("cook_freq")?,
            daily_snacks: row.try_get("daily_snacks")?,
            snack_type: row.try_get("snack_type")?,
            fruit_veg_servings: row.try_get("fruit_veg_servings")?,
            beverage_choice: row.try_get("beverage_choice")?,
            diet_preference: row.try_get("diet_preference")?,
            fitness_goals: row.try_get("fitness_goals")?,
            struggling_with: row.try_get("struggling_with")?,
            embedding: row.try_get("embedding")?,
        })
    };
    extract().map_err(|e| DatabaseError::CorruptRecord {
        username,
        reason: format!("column extraction failed: {}", e),
    })
}

fn group_from_row(row: &PgRow) -> Result<FitnessGroup, DatabaseError> {
    let group_id: String = row.try_get("group_id")?;
    let corrupt = |reason: String| DatabaseError::CorruptRecord {
        username: group_id.clone(),
        reason,
    };

    let odd_exercises: serde_json::Value = row.try_get("odd_day_exercises")?;
    let even_exercises: serde_json::Value = row.try_get("even_day_exercises")?;
    let member_full_names: serde_json::Value = row.try_get("member_full_names")?;
    let member_usernames: serde_json::Value = row.try_get("member_usernames")?;
    let created_at: Option<DateTime<Utc>> = row.try_get("created_at")?;

    Ok(FitnessGroup {
        group_id: group_id.clone(),
        group_name: row.try_get("group_name")?,
        description: row.try_get("description")?,
        goal: row.try_get("goal")?,
        how_many_weeks: row.try_get("how_many_weeks")?,
        odd_day: WorkoutDay {
            title: row.try_get("odd_day_title")?,
            duration: row.try_get("odd_day_duration")?,
            exercises: decode_string_array(&odd_exercises)
                .map_err(|r| corrupt(format!("odd_day_exercises: {}", r)))?,
            diet: row.try_get("odd_day_diet")?,
        },
        even_day: WorkoutDay {
            title: row.try_get("even_day_title")?,
            duration: row.try_get("even_day_duration")?,
            exercises: decode_string_array(&even_exercises)
                .map_err(|r| corrupt(format!("even_day_exercises: {}", r)))?,
            diet: row.try_get("even_day_diet")?,
        },
        member_full_names: decode_string_array(&member_full_names)
            .map_err(|r| corrupt(format!("member_full_names: {}", r)))?,
        member_usernames: decode_string_array(&member_usernames)
            .map_err(|r| corrupt(format!("member_usernames: {}", r)))?,
        created_at,
    })
}

impl ProfileStore for Database {
    async fn all_users_with_embeddings(
        &self,
    ) -> Result<Vec<(UserProfile, Vec<f32>)>, CoreError> {
        Database::all_users_with_embeddings(self).await
    }

    async fn upsert_user(
        &self,
        profile: &UserProfile,
        embedding: &[f32],
    ) -> Result<(), CoreError> {
        Database::upsert_user(self, profile, embedding).await
    }

    async fn user_count(&self) -> Result<i64, CoreError> {
        Database::user_count(self).await
    }

    async fn add_group(&self, group: &FitnessGroup) -> Result<(), CoreError> {
        Database::add_group(self, group).await
    }
}
