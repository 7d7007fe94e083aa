//! Parse-or-reject decoding of persisted rows.
//!
//! Goal lists and embedding vectors live in JSONB columns. Some legacy rows
//! carry them double-encoded (a JSON string containing a JSON array); the
//! decode step accepts that one legacy shape and rejects everything else
//! with `DatabaseError::CorruptRecord`. Repairing rows is the job of the
//! offline repair tool, never of the read path.

use fitmatch_core::{DatabaseError, UserProfile};
use serde_json::Value;

/// Column values of one `fitness_users` row before validation.
#[derive(Debug, Clone)]
pub struct RawUserRow {
    pub username: String,
    pub age: i32,
    pub gender: String,
    pub location: String,
    pub height: f64,
    pub weight: f64,
    pub experience: i32,
    pub body_fat: Option<f64>,
    pub frequency: Option<i32>,
    pub eat_out_freq: String,
    pub cook_freq: String,
    pub daily_snacks: String,
    pub snack_type: String,
    pub fruit_veg_servings: String,
    pub beverage_choice: String,
    pub diet_preference: String,
    pub fitness_goals: Value,
    pub struggling_with: Option<String>,
    pub embedding: Value,
}

/// Decode one raw row into a profile and its embedding, or reject it.
pub fn decode_user_row(raw: RawUserRow) -> Result<(UserProfile, Vec<f32>), DatabaseError> {
    let goals = decode_string_array(&raw.fitness_goals).map_err(|reason| {
        DatabaseError::CorruptRecord {
            username: raw.username.clone(),
            reason: format!("fitness_goals: {}", reason),
        }
    })?;

    let embedding = decode_vector(&raw.embedding).map_err(|reason| {
        DatabaseError::CorruptRecord {
            username: raw.username.clone(),
            reason: format!("embedding: {}", reason),
        }
    })?;

    if embedding.is_empty() {
        return Err(DatabaseError::CorruptRecord {
            username: raw.username,
            reason: "embedding: empty vector".to_string(),
        });
    }

    let profile = UserProfile {
        username: raw.username,
        age: raw.age,
        gender: raw.gender,
        location: raw.location,
        height: raw.height,
        weight: raw.weight,
        experience: raw.experience,
        body_fat: raw.body_fat,
        frequency: raw.frequency,
        eat_out_freq: raw.eat_out_freq,
        cook_freq: raw.cook_freq,
        daily_snacks: raw.daily_snacks,
        snack_type: raw.snack_type,
        fruit_veg_servings: raw.fruit_veg_servings,
        beverage_choice: raw.beverage_choice,
        diet_preference: raw.diet_preference,
        fitness_goals: goals,
        struggling_with: raw.struggling_with.unwrap_or_default(),
    };

    Ok((profile, embedding))
}

/// Decode a JSONB string array, accepting the double-encoded legacy shape.
pub fn decode_string_array(value: &Value) -> Result<Vec<String>, String> {
    match unwrap_legacy_string(value)? {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(|s| s.to_string())
                    .ok_or_else(|| format!("non-string element: {}", item))
            })
            .collect(),
        other => Err(format!("expected JSON array, got {}", type_name(&other))),
    }
}

/// Decode a JSONB number array into `Vec<f32>`, accepting the double-encoded
/// legacy shape.
pub fn decode_vector(value: &Value) -> Result<Vec<f32>, String> {
    match unwrap_legacy_string(value)? {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| format!("non-numeric element: {}", item))
            })
            .collect(),
        other => Err(format!("expected JSON array, got {}", type_name(&other))),
    }
}

/// Legacy rows stored arrays as JSON text inside the JSONB column. Unwrap
/// exactly that one level; anything else passes through untouched.
fn unwrap_legacy_string(value: &Value) -> Result<Value, String> {
    match value {
        Value::String(text) => {
            if text.trim().is_empty() {
                return Err("empty JSON text".to_string());
            }
            serde_json::from_str(text).map_err(|e| format!("invalid nested JSON: {}", e))
        }
        other => Ok(other.clone()),
    }
}

/// Re-serialize a payload into its canonical (non-double-encoded) array
/// form, used by the offline repair tool. Returns `None` when the payload
/// is already canonical, `Err` when it cannot be fixed.
pub fn canonicalize_array(value: &Value) -> Result<Option<Value>, String> {
    match value {
        Value::Array(_) => Ok(None),
        Value::String(_) => {
            let unwrapped = unwrap_legacy_string(value)?;
            match unwrapped {
                Value::Array(_) => Ok(Some(unwrapped)),
                other => Err(format!("nested JSON is not an array: {}", type_name(&other))),
            }
        }
        other => Err(format!("expected array or JSON text, got {}", type_name(other))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
