//! Drives a single matching request end to end:
//! embed -> rank -> select -> generate plan -> persist.

use crate::ranker::{self, DEFAULT_TOP_K};
use fitmatch_core::{
    CoreError, EmbeddingProvider, FitnessGroup, MatchOutcome, MatchReport, PlanProvider,
    ProfileStore, UserProfile,
};
use tracing::{info, warn};
use uuid::Uuid;

/// Orchestrates one matching operation over injected collaborators.
///
/// The coordinator owns no mutable state; all mutation happens in the
/// storage collaborator. The candidate pool is read wholesale before
/// ranking (snapshot semantics), so a concurrent writer may not be visible
/// to an in-flight request.
pub struct GroupCoordinator<E, P, S> {
    embedder: E,
    planner: P,
    store: S,
    top_k: usize,
}

impl<E, P, S> GroupCoordinator<E, P, S>
where
    E: EmbeddingProvider,
    P: PlanProvider,
    S: ProfileStore,
{
    pub fn new(embedder: E, planner: P, store: S) -> Self {
        Self {
            embedder,
            planner,
            store,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// How many ranked candidates to report. Selection always takes rank 1;
    /// anything beyond it is reported as runners-up.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Embed and store a profile without matching it. Used for seeding the
    /// pool.
    pub async fn add_user(&self, profile: &UserProfile) -> Result<(), CoreError> {
        let embedding = self.embedder.embed(profile).await?;
        self.store.upsert_user(profile, &embedding).await?;
        info!("User {} added to the pool", profile.username);
        Ok(())
    }

    /// Run one matching operation to completion.
    ///
    /// `Ok(MatchOutcome::NoMatch)` means the pool held no eligible
    /// candidate; collaborator failures surface as `Err` with the cause.
    /// Plan generation runs before any write, so a failed plan leaves
    /// storage untouched.
    pub async fn match_user(&self, profile: &UserProfile) -> Result<MatchOutcome, CoreError> {
        info!("Generating embedding for {}", profile.username);
        let query_vector = self.embedder.embed(profile).await?;

        let pool = self.store.all_users_with_embeddings().await?;
        if pool.is_empty() {
            warn!("Candidate pool is empty");
        } else {
            info!("Matching {} against {} stored user(s)", profile.username, pool.len());
        }

        let ranked = ranker::rank(&profile.username, &query_vector, &pool, self.top_k);
        let Some(best) = ranked.first().cloned() else {
            return Ok(MatchOutcome::NoMatch {
                message: format!("No eligible partners found for {}", profile.username),
            });
        };

        info!(
            "Selected {} (rank {}, similarity {:.4}) for {}",
            best.profile.username, best.rank, best.score, profile.username
        );

        let plan = self.planner.generate_plan(profile, &best.profile).await?;

        // IDs from the model output are neither unique nor auditable;
        // generate our own.
        let group_id = format!("group_{}", Uuid::new_v4().simple());
        let group = FitnessGroup::from_plan(group_id.clone(), &plan);

        self.store.upsert_user(profile, &query_vector).await?;
        self.store.add_group(&group).await?;
        info!("Group {} ({}) persisted", group_id, plan.group_name);

        Ok(MatchOutcome::Matched(Box::new(MatchReport {
            group_id,
            group_name: plan.group_name.clone(),
            primary_user: profile.username.clone(),
            matched_user: best.profile.username.clone(),
            similarity: best.score,
            rank: best.rank,
            plan,
            runners_up: ranked.into_iter().skip(1).collect(),
        })))
    }
}
