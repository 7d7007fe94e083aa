use std::path::PathBuf;

use clap::{Parser, Subcommand};
use database::Database;
use embedding_client::EmbeddingClient;
use fitmatch_core::{
    sample_data, AppConfig, CoreError, ErrorExt, MatchOutcome, MatchReport, UserProfile,
};
use matcher::GroupCoordinator;
use plan_generator::PlanGenerator;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "fitmatch", version, about = "Match fitness partners by embedding similarity")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Populate the pool with the built-in sample users
    Seed {
        /// Clear existing users first
        #[arg(long)]
        force: bool,
    },
    /// Match a user against the stored pool and create a fitness group
    Match {
        /// Username of a built-in sample profile to match
        #[arg(long, conflicts_with = "profile")]
        username: Option<String>,
        /// Path to a JSON file containing a full user profile
        #[arg(long)]
        profile: Option<PathBuf>,
        /// How many ranked candidates to report (selection always takes rank 1)
        #[arg(long, default_value_t = 1)]
        top_k: usize,
    },
    /// List persisted fitness groups
    Groups {
        /// Only show groups containing this username
        #[arg(long)]
        user: Option<String>,
    },
    /// Rewrite legacy double-encoded stored payloads into canonical form
    Repair,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            "fitmatch=info,fitmatch_core=info,matcher=info,database=info,\
             embedding_client=info,plan_generator=info",
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        e.log_error();
        eprintln!("Error: {}", e.user_friendly_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CoreError> {
    let config = AppConfig::from_env()?;
    let db = Database::connect(&config.postgres_url).await?;

    match cli.command {
        Command::Seed { force } => seed(&config, db, force).await,
        Command::Match {
            username,
            profile,
            top_k,
        } => run_match(&config, db, username, profile, top_k).await,
        Command::Groups { user } => list_groups(db, user).await,
        Command::Repair => {
            let summary = db.repair_users().await?;
            println!(
                "Repair finished: {} examined, {} repaired, {} unfixable",
                summary.examined, summary.repaired, summary.unfixable
            );
            Ok(())
        }
    }
}

async fn seed(config: &AppConfig, db: Database, force: bool) -> Result<(), CoreError> {
    if force {
        info!("Force refresh requested, clearing user pool");
        db.clear_users().await?;
    }

    let existing = db.user_count().await?;
    if existing > 0 {
        println!("Pool already contains {} user(s); nothing to seed.", existing);
        return Ok(());
    }

    let coordinator = GroupCoordinator::new(
        EmbeddingClient::from_config(config),
        PlanGenerator::from_config(config),
        db.clone(),
    );

    let profiles = sample_data::sample_profiles();
    let mut added = 0usize;
    for profile in &profiles {
        match coordinator.add_user(profile).await {
            Ok(()) => added += 1,
            Err(e) => {
                error!("Failed to add sample user {}: {}", profile.username, e);
            }
        }
    }

    println!("Seeded {} of {} sample user(s).", added, profiles.len());
    Ok(())
}

async fn run_match(
    config: &AppConfig,
    db: Database,
    username: Option<String>,
    profile_path: Option<PathBuf>,
    top_k: usize,
) -> Result<(), CoreError> {
    let query = load_query_profile(username, profile_path).await?;

    let coordinator = GroupCoordinator::new(
        EmbeddingClient::from_config(config),
        PlanGenerator::from_config(config),
        db,
    )
    .with_top_k(top_k);

    match coordinator.match_user(&query).await? {
        MatchOutcome::Matched(report) => print_report(&report),
        MatchOutcome::NoMatch { message } => {
            println!("No match: {}", message);
        }
    }
    Ok(())
}

async fn load_query_profile(
    username: Option<String>,
    profile_path: Option<PathBuf>,
) -> Result<UserProfile, CoreError> {
    let profile = match (username, profile_path) {
        (Some(name), None) => {
            sample_data::sample_profile(&name).ok_or_else(|| CoreError::InvalidInput {
                message: format!("no sample profile named '{}'", name),
            })?
        }
        (None, Some(path)) => {
            let raw = tokio::fs::read_to_string(&path).await?;
            serde_json::from_str(&raw)?
        }
        _ => {
            return Err(CoreError::InvalidInput {
                message: "provide exactly one of --username or --profile".to_string(),
            })
        }
    };

    profile
        .validate()
        .map_err(|message| CoreError::InvalidInput { message })?;
    Ok(profile)
}

async fn list_groups(db: Database, user: Option<String>) -> Result<(), CoreError> {
    let groups = match user {
        Some(username) => db.groups_for_user(&username).await?,
        None => db.all_groups().await?,
    };

    if groups.is_empty() {
        println!("No fitness groups found.");
        return Ok(());
    }

    for group in &groups {
        let created = group
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "{}  {}  goal: {}  weeks: {}  members: {}  created: {}",
            group.group_id,
            group.group_name,
            group.goal,
            group.how_many_weeks,
            group.member_full_names.join(", "),
            created
        );
    }
    println!("Total groups: {}", groups.len());
    Ok(())
}

fn print_report(report: &MatchReport) {
    println!("{}", "=".repeat(72));
    println!("FITNESS MATCHING RESULT");
    println!("{}", "=".repeat(72));
    println!("Primary user:  {}", report.primary_user);
    println!("Matched user:  {}", report.matched_user);
    println!(
        "Similarity:    {:.4} (rank {})",
        report.similarity, report.rank
    );
    println!("Group:         {} ({})", report.group_name, report.group_id);
    println!("Goal:          {}", report.plan.goal);
    println!("Duration:      {} weeks", report.plan.weekly_plan.how_many_weeks);

    let odd = &report.plan.weekly_plan.odd_day_workout_plan;
    println!("\nOdd days (Mon/Wed/Fri): {}: {}", odd.title, odd.duration);
    for (i, exercise) in odd.exercises.iter().enumerate() {
        println!("  {}. {}", i + 1, exercise);
    }
    println!("  Diet: {}", odd.diet);

    let even = &report.plan.weekly_plan.even_day_workout_plan;
    println!("\nEven days (Tue/Thu/Sat): {}: {}", even.title, even.duration);
    for (i, exercise) in even.exercises.iter().enumerate() {
        println!("  {}. {}", i + 1, exercise);
    }
    println!("  Diet: {}", even.diet);

    if !report.runners_up.is_empty() {
        println!("\nRunners-up:");
        for candidate in &report.runners_up {
            println!(
                "  #{} {} (similarity {:.4})",
                candidate.rank, candidate.profile.username, candidate.score
            );
        }
    }
    println!("{}", "=".repeat(72));
}
