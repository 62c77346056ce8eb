//! QuizRush service layer — leaderboard and prompt relay
//!
//! Provides:
//! - Score submission sanitization and the two-phase leaderboard write
//! - Ranked leaderboard reads
//! - A pass-through relay to the Gemini generation API
//! - Environment-derived configuration

pub mod api;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod relay;
pub mod sanitize;

// Re-exports for convenience
pub use api::{GeminiClient, GenerateContentRequest, GenerationBackend};
pub use config::{AppConfig, RelayConfig};
pub use error::{ServiceError, ServiceResult};
pub use leaderboard::{
    AchievementOutcome, LeaderboardService, LeaderboardStore, SqliteLeaderboardStore, Submission,
};
pub use persistence::repository::{PlayerAchievementRecord, ScoreEntry};
pub use relay::PromptRelay;
