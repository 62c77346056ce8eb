//! Leaderboard Service — ranked reads and two-phase score submission
//!
//! A submission first inserts the score row (fatal on failure), then
//! best-effort records the player's achievements (logged on failure, never
//! fails the submission).

use crate::error::{ServiceError, ServiceResult};
use crate::sanitize::{resolve_limit, sanitize_submission};
use async_trait::async_trait;
use persistence::repository::{LeaderboardRepository, NewScore, PlayerAchievementRecord, ScoreEntry};
use persistence::{DbResult, SqlitePool};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const LOAD_FAILED: &str = "Failed to load leaderboard";
pub const SAVE_FAILED: &str = "Failed to save score";

// ---------------------------------------------------------------------------
// Storage seam
// ---------------------------------------------------------------------------

/// Persistence operations the service needs. The two write phases are
/// separate methods so either can fail independently.
#[async_trait]
pub trait LeaderboardStore: Send + Sync {
    async fn top_scores(&self, limit: i64) -> DbResult<Vec<ScoreEntry>>;

    /// Phase 1: insert the score row and return it as persisted
    async fn insert_score(&self, score: &NewScore) -> DbResult<ScoreEntry>;

    /// Phase 2: record (player, achievement) pairs, ignoring existing ones.
    /// Returns how many pairs were new.
    async fn record_achievements(&self, player_name: &str, achievement_ids: &[String])
        -> DbResult<u64>;

    async fn achievements_for(&self, player_name: &str) -> DbResult<Vec<PlayerAchievementRecord>>;
}

/// SQLite-backed store
#[derive(Clone)]
pub struct SqliteLeaderboardStore {
    pool: SqlitePool,
}

impl SqliteLeaderboardStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaderboardStore for SqliteLeaderboardStore {
    async fn top_scores(&self, limit: i64) -> DbResult<Vec<ScoreEntry>> {
        LeaderboardRepository::new(&self.pool).top_scores(limit).await
    }

    async fn insert_score(&self, score: &NewScore) -> DbResult<ScoreEntry> {
        LeaderboardRepository::new(&self.pool).insert_score(score).await
    }

    async fn record_achievements(
        &self,
        player_name: &str,
        achievement_ids: &[String],
    ) -> DbResult<u64> {
        LeaderboardRepository::new(&self.pool)
            .record_achievements(player_name, achievement_ids)
            .await
    }

    async fn achievements_for(&self, player_name: &str) -> DbResult<Vec<PlayerAchievementRecord>> {
        LeaderboardRepository::new(&self.pool)
            .achievements_for(player_name)
            .await
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// What happened in the achievement phase of a submission
#[derive(Debug, Clone, PartialEq)]
pub enum AchievementOutcome {
    /// Nothing to record
    Skipped,
    Recorded { newly_recorded: u64 },
    /// Phase 2 failed; the score itself was still saved
    Failed { reason: String },
}

/// Result of a successful submission
#[derive(Debug, Clone)]
pub struct Submission {
    pub score: ScoreEntry,
    pub achievements: AchievementOutcome,
}

#[derive(Clone)]
pub struct LeaderboardService {
    store: Arc<dyn LeaderboardStore>,
}

impl LeaderboardService {
    pub fn new(store: Arc<dyn LeaderboardStore>) -> Self {
        Self { store }
    }

    /// Top scores for a raw `limit` query value
    pub async fn top_scores(&self, raw_limit: Option<&str>) -> ServiceResult<Vec<ScoreEntry>> {
        let limit = resolve_limit(raw_limit);
        self.store.top_scores(limit).await.map_err(|e| {
            error!("Leaderboard select failed: {}", e);
            ServiceError::storage(LOAD_FAILED, e)
        })
    }

    /// Validate, insert, then best-effort record achievements
    pub async fn submit(&self, body: &Value) -> ServiceResult<Submission> {
        let new_score = sanitize_submission(body)?;

        let score = self.store.insert_score(&new_score).await.map_err(|e| {
            error!("Score insert failed (leaderboard_scores): {}", e);
            ServiceError::storage(SAVE_FAILED, e)
        })?;

        let achievements = self
            .record_achievements(&score.player_name, &new_score.achievements)
            .await;

        info!(
            id = score.id,
            player = %score.player_name,
            score = score.score,
            stage = score.stage,
            "Score submitted"
        );

        Ok(Submission {
            score,
            achievements,
        })
    }

    async fn record_achievements(&self, player_name: &str, ids: &[String]) -> AchievementOutcome {
        if ids.is_empty() {
            return AchievementOutcome::Skipped;
        }

        match self.store.record_achievements(player_name, ids).await {
            Ok(newly_recorded) => AchievementOutcome::Recorded { newly_recorded },
            Err(e) => {
                warn!(
                    player = %player_name,
                    "Achievement upsert failed (player_achievements): {}", e
                );
                AchievementOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Achievements recorded for one player across all submissions
    pub async fn player_achievements(
        &self,
        player_name: &str,
    ) -> ServiceResult<Vec<PlayerAchievementRecord>> {
        self.store.achievements_for(player_name).await.map_err(|e| {
            error!("Achievement select failed: {}", e);
            ServiceError::storage("Failed to load achievements", e)
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use persistence::{Database, DbError};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn score_entry(id: i64, score: &NewScore) -> ScoreEntry {
        ScoreEntry {
            id,
            player_name: score.player_name.clone(),
            score: score.score,
            stage: score.stage,
            total_correct: score.total_correct,
            achievements: score.achievements.clone(),
            created_at: Default::default(),
        }
    }

    /// In-process store whose phases can be made to fail
    #[derive(Default)]
    struct FakeStore {
        fail_insert: bool,
        fail_achievements: bool,
        fail_select: bool,
        inserts: AtomicUsize,
        achievement_calls: Mutex<Vec<(String, Vec<String>)>>,
        last_limit: Mutex<Option<i64>>,
    }

    #[async_trait]
    impl LeaderboardStore for FakeStore {
        async fn top_scores(&self, limit: i64) -> DbResult<Vec<ScoreEntry>> {
            *self.last_limit.lock().unwrap() = Some(limit);
            if self.fail_select {
                return Err(DbError::Query("connection reset".into()));
            }
            Ok(vec![])
        }

        async fn insert_score(&self, score: &NewScore) -> DbResult<ScoreEntry> {
            if self.fail_insert {
                return Err(DbError::Query("disk I/O error".into()));
            }
            let id = self.inserts.fetch_add(1, Ordering::SeqCst) as i64 + 1;
            Ok(score_entry(id, score))
        }

        async fn record_achievements(
            &self,
            player_name: &str,
            achievement_ids: &[String],
        ) -> DbResult<u64> {
            self.achievement_calls
                .lock()
                .unwrap()
                .push((player_name.to_string(), achievement_ids.to_vec()));
            if self.fail_achievements {
                return Err(DbError::Query("unique index corrupted".into()));
            }
            Ok(achievement_ids.len() as u64)
        }

        async fn achievements_for(&self, _player_name: &str) -> DbResult<Vec<PlayerAchievementRecord>> {
            Ok(vec![])
        }
    }

    fn service_with(store: Arc<FakeStore>) -> LeaderboardService {
        LeaderboardService::new(store)
    }

    #[tokio::test]
    async fn test_read_uses_resolved_limit() {
        let store = Arc::new(FakeStore::default());
        let service = service_with(store.clone());

        service.top_scores(Some("-5")).await.unwrap();
        assert_eq!(*store.last_limit.lock().unwrap(), Some(10));

        service.top_scores(Some("1000")).await.unwrap();
        assert_eq!(*store.last_limit.lock().unwrap(), Some(50));
    }

    #[tokio::test]
    async fn test_read_failure_is_generic() {
        let store = Arc::new(FakeStore {
            fail_select: true,
            ..Default::default()
        });
        let err = service_with(store).top_scores(None).await.unwrap_err();
        assert_eq!(err.public_message(), LOAD_FAILED);
    }

    #[tokio::test]
    async fn test_invalid_score_performs_no_write() {
        let store = Arc::new(FakeStore::default());
        let err = service_with(store.clone())
            .submit(&json!({"score": -1, "achievements": ["a"]}))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
        assert!(store.achievement_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_failure_stops_before_achievements() {
        let store = Arc::new(FakeStore {
            fail_insert: true,
            ..Default::default()
        });
        let err = service_with(store.clone())
            .submit(&json!({"score": 5, "achievements": ["a"]}))
            .await
            .unwrap_err();

        assert_eq!(err.public_message(), SAVE_FAILED);
        assert!(store.achievement_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_achievement_failure_is_non_fatal() {
        let store = Arc::new(FakeStore {
            fail_achievements: true,
            ..Default::default()
        });
        let submission = service_with(store.clone())
            .submit(&json!({"playerName": "Nir", "score": 5, "achievements": ["a", "b"]}))
            .await
            .unwrap();

        assert_eq!(submission.score.player_name, "Nir");
        assert!(matches!(
            submission.achievements,
            AchievementOutcome::Failed { .. }
        ));
        assert_eq!(store.inserts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_achievements_skips_phase_two() {
        let store = Arc::new(FakeStore::default());
        let submission = service_with(store.clone())
            .submit(&json!({"score": 5, "achievements": ["", "  "]}))
            .await
            .unwrap();

        assert_eq!(submission.achievements, AchievementOutcome::Skipped);
        assert!(store.achievement_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_achievements_recorded_under_sanitized_name() {
        let store = Arc::new(FakeStore::default());
        service_with(store.clone())
            .submit(&json!({"playerName": "  Dana ", "score": 5, "achievements": ["a", "a"]}))
            .await
            .unwrap();

        let calls = store.achievement_calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[("Dana".to_string(), vec!["a".to_string()])]);
    }

    #[tokio::test]
    async fn test_sqlite_store_repeated_achievements() {
        let db = Database::in_memory().await.unwrap();
        let service = LeaderboardService::new(Arc::new(SqliteLeaderboardStore::new(db.pool_clone())));
        let body = json!({"playerName": "player", "score": 10, "achievements": ["a", "a", "a"]});

        let first = service.submit(&body).await.unwrap();
        assert_eq!(first.achievements, AchievementOutcome::Recorded { newly_recorded: 1 });

        let second = service.submit(&body).await.unwrap();
        assert_eq!(second.achievements, AchievementOutcome::Recorded { newly_recorded: 0 });

        let recorded = service.player_achievements("player").await.unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].achievement_id, "a");
    }

    #[tokio::test]
    async fn test_sqlite_store_ranking() {
        let db = Database::in_memory().await.unwrap();
        let service = LeaderboardService::new(Arc::new(SqliteLeaderboardStore::new(db.pool_clone())));

        for (name, score) in [("a", 30), ("b", 10), ("c", 30), ("d", 20)] {
            service
                .submit(&json!({"playerName": name, "score": score}))
                .await
                .unwrap();
        }

        let top = service.top_scores(Some("3")).await.unwrap();
        let names: Vec<&str> = top.iter().map(|e| e.player_name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "d"]);
    }
}
