//! QuizRush — leaderboard and Gemini prompt relay for the quiz game
//!
//! Usage:
//!   quizrush serve --port 3001        — Launch the HTTP API
//!   quizrush top --limit 10           — Print the leaderboard
//!   quizrush achievements <player>    — List a player's achievements

mod routes;

use clap::{Parser, Subcommand};
use persistence::Database;
use routes::{build_router, AppState};
use service::{AppConfig, LeaderboardService, PromptRelay, ScoreEntry, SqliteLeaderboardStore};
use std::sync::Arc;
use tracing::{error, info, warn};

pub(crate) const APP_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GIT_HASH"));

#[derive(Parser)]
#[command(name = "quizrush")]
#[command(about = "Leaderboard and prompt relay API for QuizRush", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value_t = 3001)]
        port: u16,
    },
    /// Print the top of the leaderboard
    Top {
        /// Number of entries (default 10, max 50)
        #[arg(long)]
        limit: Option<String>,
    },
    /// List the achievements recorded for a player
    Achievements {
        /// Player name as shown on the leaderboard
        player: String,
    },
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug,service=debug,persistence=debug,quizrush=debug")
    } else {
        EnvFilter::new("info,service=info,quizrush=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();

    match cli.command {
        Commands::Serve { host, port } => {
            cmd_serve(&config, &host, port).await?;
        }
        Commands::Top { limit } => {
            cmd_top(&config, limit.as_deref()).await?;
        }
        Commands::Achievements { player } => {
            cmd_achievements(&config, &player).await?;
        }
    }

    Ok(())
}

async fn open_database(config: &AppConfig) -> anyhow::Result<Database> {
    let db = Database::new(&config.db_path).await.map_err(|e| {
        error!("Failed to initialize database: {}", e);
        anyhow::anyhow!("Database initialization failed: {}", e)
    })?;
    info!("Database initialized: {}", config.db_path.display());
    Ok(db)
}

fn leaderboard_service(db: &Database) -> LeaderboardService {
    LeaderboardService::new(Arc::new(SqliteLeaderboardStore::new(db.pool_clone())))
}

// ============================================================================
// Serve command — Axum web server
// ============================================================================

async fn cmd_serve(config: &AppConfig, host: &str, port: u16) -> anyhow::Result<()> {
    info!("QuizRush v{} starting...", APP_VERSION);

    let db = open_database(config).await?;
    let relay = PromptRelay::from_config(&config.relay);
    if !relay.is_configured() {
        warn!("GEMINI_API_KEY is not set; POST /generate will answer 500");
    }

    let state = AppState {
        leaderboard: leaderboard_service(&db),
        relay,
    };
    let app = build_router(state);

    let addr: std::net::SocketAddr = format!("{}:{}", host, port).parse()?;
    println!("\n=== QuizRush v{} ===", APP_VERSION);
    println!("Listening on http://{}", addr);
    println!("\nEndpoints:");
    println!("  GET  /health                  - Health check");
    println!("  GET  /leaderboard?limit=N     - Top scores (default 10, max 50)");
    println!("  POST /leaderboard             - Submit a score");
    println!("  POST /generate                - Relay a prompt to Gemini");
    println!("\n  Database: {}", config.db_path.display());
    println!("\nPress Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Ctrl+C received, shutting down");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Top command — print the leaderboard
// ============================================================================

async fn cmd_top(config: &AppConfig, limit: Option<&str>) -> anyhow::Result<()> {
    let db = open_database(config).await?;
    let scores = leaderboard_service(&db)
        .top_scores(limit)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    if scores.is_empty() {
        println!("\nNo scores yet.");
        return Ok(());
    }
    print_scores(&scores);
    Ok(())
}

fn print_scores(scores: &[ScoreEntry]) {
    println!("\nTop {} Scores:", scores.len());
    println!(
        "  {:>3}  {:<30} {:>10} {:>6} {:>8}  {:<19}",
        "#", "Player", "Score", "Stage", "Correct", "Submitted"
    );
    println!("  {}", "-".repeat(84));
    for (i, s) in scores.iter().enumerate() {
        println!(
            "  {:>3}  {:<30} {:>10} {:>6} {:>8}  {:<19}",
            i + 1,
            s.player_name,
            s.score,
            s.stage,
            s.total_correct,
            s.created_at.format("%Y-%m-%d %H:%M:%S"),
        );
    }
}

// ============================================================================
// Achievements command
// ============================================================================

async fn cmd_achievements(config: &AppConfig, player: &str) -> anyhow::Result<()> {
    let db = open_database(config).await?;
    let records = leaderboard_service(&db)
        .player_achievements(player)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    if records.is_empty() {
        println!("\nNo achievements recorded for {}.", player);
        return Ok(());
    }

    println!("\nAchievements for {} ({}):", player, records.len());
    for r in &records {
        println!(
            "  {:<30} {}",
            r.achievement_id,
            r.unlocked_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}
