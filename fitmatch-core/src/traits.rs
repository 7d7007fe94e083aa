use crate::error::CoreError;
use crate::types::{FitnessGroup, GroupPlan, UserProfile};

/// Embedding collaborator: turns a profile into a fixed-length vector.
/// Dimensionality is fixed by the backing model and must match across the
/// whole pool.
pub trait EmbeddingProvider {
    async fn embed(&self, profile: &UserProfile) -> Result<Vec<f32>, CoreError>;
}

/// Plan-generation collaborator: produces a shared workout plan for two
/// matched users.
pub trait PlanProvider {
    async fn generate_plan(
        &self,
        primary: &UserProfile,
        matched: &UserProfile,
    ) -> Result<GroupPlan, CoreError>;
}

/// Storage collaborator. Upserts are keyed by username, atomic and
/// last-write-wins. `all_users_with_embeddings` is a snapshot read; corrupt
/// rows are skipped by the implementation, never repaired inline.
pub trait ProfileStore {
    async fn all_users_with_embeddings(
        &self,
    ) -> Result<Vec<(UserProfile, Vec<f32>)>, CoreError>;

    async fn upsert_user(
        &self,
        profile: &UserProfile,
        embedding: &[f32],
    ) -> Result<(), CoreError>;

    async fn user_count(&self) -> Result<i64, CoreError>;

    async fn add_group(&self, group: &FitnessGroup) -> Result<(), CoreError>;
}
