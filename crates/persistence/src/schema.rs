//! Database schema definitions

/// SQL to create all tables
/// NOTE: achievements on a score row are stored as a JSON array in TEXT
pub const CREATE_TABLES: &str = r#"
-- One row per accepted score submission (never updated or deleted)
CREATE TABLE IF NOT EXISTS leaderboard_scores (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    player_name TEXT NOT NULL CHECK (length(player_name) > 0),
    score REAL NOT NULL CHECK (score >= 0),
    stage INTEGER NOT NULL DEFAULT 1 CHECK (stage >= 1),
    total_correct INTEGER NOT NULL DEFAULT 0 CHECK (total_correct >= 0),
    achievements TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL
);

-- Achievements unlocked by a player across all submissions
CREATE TABLE IF NOT EXISTS player_achievements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    player_name TEXT NOT NULL,
    achievement_id TEXT NOT NULL,
    unlocked_at TEXT NOT NULL,
    UNIQUE (player_name, achievement_id)
);

-- ========== INDEXES ==========

CREATE INDEX IF NOT EXISTS idx_scores_rank ON leaderboard_scores(score DESC, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_achievements_player ON player_achievements(player_name)
"#;
