//! Leaderboard repository — score submissions and per-player achievements

use crate::{DbError, DbResult};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

/// A persisted leaderboard submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub id: i64,
    pub player_name: String,
    pub score: f64,
    pub stage: i64,
    pub total_correct: i64,
    pub achievements: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A sanitized submission, ready to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewScore {
    pub player_name: String,
    pub score: f64,
    pub stage: i64,
    pub total_correct: i64,
    pub achievements: Vec<String>,
}

/// One (player, achievement) association
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlayerAchievementRecord {
    pub id: i64,
    pub player_name: String,
    pub achievement_id: String,
    pub unlocked_at: DateTime<Utc>,
}

/// Raw row; `achievements` is the JSON text column
#[derive(FromRow)]
struct ScoreRow {
    id: i64,
    player_name: String,
    score: f64,
    stage: i64,
    total_correct: i64,
    achievements: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ScoreRow> for ScoreEntry {
    type Error = DbError;

    fn try_from(row: ScoreRow) -> DbResult<Self> {
        let achievements: Vec<String> = serde_json::from_str(&row.achievements).map_err(|e| {
            DbError::Query(format!("corrupt achievements on score {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            player_name: row.player_name,
            score: row.score,
            stage: row.stage,
            total_correct: row.total_correct,
            achievements,
            created_at: row.created_at,
        })
    }
}

const SCORE_COLUMNS: &str = "id, player_name, score, stage, total_correct, achievements, created_at";

/// Fixed-width UTC timestamps so TEXT ordering matches time ordering
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Repository for leaderboard scores and player achievements
pub struct LeaderboardRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> LeaderboardRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert one score row and return it as persisted (id and timestamp assigned here)
    pub async fn insert_score(&self, record: &NewScore) -> DbResult<ScoreEntry> {
        self.insert_score_at(record, Utc::now()).await
    }

    async fn insert_score_at(&self, record: &NewScore, at: DateTime<Utc>) -> DbResult<ScoreEntry> {
        let achievements = serde_json::to_string(&record.achievements)
            .map_err(|e| DbError::Query(format!("achievements encode failed: {e}")))?;

        let sql = format!(
            r#"INSERT INTO leaderboard_scores
                (player_name, score, stage, total_correct, achievements, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)
               RETURNING {SCORE_COLUMNS}"#
        );
        let row = sqlx::query_as::<_, ScoreRow>(&sql)
            .bind(&record.player_name)
            .bind(record.score)
            .bind(record.stage)
            .bind(record.total_correct)
            .bind(achievements)
            .bind(timestamp(at))
            .fetch_one(self.pool)
            .await?;

        debug!(id = row.id, player = %row.player_name, "Score inserted");
        row.try_into()
    }

    /// Top `limit` scores: score DESC, then most recent first
    pub async fn top_scores(&self, limit: i64) -> DbResult<Vec<ScoreEntry>> {
        let sql = format!(
            r#"SELECT {SCORE_COLUMNS} FROM leaderboard_scores
               ORDER BY score DESC, created_at DESC, id DESC
               LIMIT ?1"#
        );
        let rows = sqlx::query_as::<_, ScoreRow>(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(ScoreEntry::try_from).collect()
    }

    /// Total number of score rows
    pub async fn count_scores(&self) -> DbResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM leaderboard_scores")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Record achievements for a player (INSERT OR IGNORE on the unique pair).
    /// Runs in one transaction; returns the number of newly recorded pairs.
    pub async fn record_achievements(
        &self,
        player_name: &str,
        achievement_ids: &[String],
    ) -> DbResult<u64> {
        let unlocked_at = timestamp(Utc::now());
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for achievement_id in achievement_ids {
            let result = sqlx::query(
                r#"INSERT OR IGNORE INTO player_achievements
                    (player_name, achievement_id, unlocked_at)
                   VALUES (?1, ?2, ?3)"#,
            )
            .bind(player_name)
            .bind(achievement_id)
            .bind(&unlocked_at)
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// All achievements recorded for a player, in unlock order
    pub async fn achievements_for(&self, player_name: &str) -> DbResult<Vec<PlayerAchievementRecord>> {
        let records = sqlx::query_as::<_, PlayerAchievementRecord>(
            r#"SELECT id, player_name, achievement_id, unlocked_at
               FROM player_achievements
               WHERE player_name = ?1
               ORDER BY unlocked_at ASC, id ASC"#,
        )
        .bind(player_name)
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }
}
