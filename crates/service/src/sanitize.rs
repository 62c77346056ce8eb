//! Input sanitization for leaderboard reads and score submissions
//!
//! Everything here is permissive except `score`: out-of-range or mistyped
//! optional fields fall back to defaults instead of rejecting the request.

use crate::error::{ServiceError, ServiceResult};
use persistence::repository::NewScore;
use serde_json::Value;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 50;
pub const MAX_PLAYER_NAME_CHARS: usize = 30;
pub const GUEST_NAME: &str = "Guest";

pub const INVALID_SCORE_MESSAGE: &str = "Invalid \"score\". Must be a non-negative number.";

/// Resolve the `limit` query parameter.
///
/// Leading base-10 integer of the raw value (so `"12abc"` reads as 12);
/// missing, non-numeric, or non-positive values give the default, and
/// anything above the cap is clamped.
pub fn resolve_limit(raw: Option<&str>) -> i64 {
    let Some(raw) = raw else {
        return DEFAULT_LIMIT;
    };

    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits: &str = {
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        &rest[..end]
    };
    if digits.is_empty() || negative {
        return DEFAULT_LIMIT;
    }

    match digits.parse::<i64>() {
        Ok(0) => DEFAULT_LIMIT,
        Ok(n) => n.min(MAX_LIMIT),
        // Overflow: certainly above the cap
        Err(_) => MAX_LIMIT,
    }
}

/// Turn a raw JSON request body into an insertable score.
///
/// Fails only when `score` is missing, not a number, or negative.
pub fn sanitize_submission(body: &Value) -> ServiceResult<NewScore> {
    let field = |name: &str| body.as_object().and_then(|obj| obj.get(name));

    let player_name = sanitize_player_name(field("playerName"));

    let score = field("score")
        .and_then(Value::as_f64)
        .filter(|s| s.is_finite() && *s >= 0.0)
        .ok_or_else(|| ServiceError::InvalidInput(INVALID_SCORE_MESSAGE.to_string()))?;

    let stage = field("stage").and_then(as_integer).filter(|s| *s > 0).unwrap_or(1);
    let total_correct = field("totalCorrect")
        .and_then(as_integer)
        .filter(|t| *t >= 0)
        .unwrap_or(0);

    Ok(NewScore {
        player_name,
        score,
        stage,
        total_correct,
        achievements: sanitize_achievements(field("achievements")),
    })
}

fn sanitize_player_name(raw: Option<&Value>) -> String {
    let name = match raw {
        Some(Value::String(s)) => s.clone(),
        // 0 is falsy, so it falls back to Guest like null and false
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => String::new(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(true)) => "true".to_string(),
        _ => String::new(),
    };

    let trimmed: String = name.trim().chars().take(MAX_PLAYER_NAME_CHARS).collect();
    if trimmed.is_empty() {
        GUEST_NAME.to_string()
    } else {
        trimmed
    }
}

/// Integer-valued JSON numbers, including floats like `7.0`
fn as_integer(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

fn sanitize_achievements(raw: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = raw else {
        return Vec::new();
    };

    let mut ids: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let text = match item {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string().trim().to_string(),
        };
        if !text.is_empty() && !ids.contains(&text) {
            ids.push(text);
        }
    }
    ids
}
