//! Wire types for the leaderboard service.
//!
//! Field names follow the service's JSON exactly: the submit body uses
//! PascalCase keys, leaderboard rows use camelCase.

use serde::{Deserialize, Serialize};

use crate::sim::progress::TotalStats;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

/// Aggregate result of one full playthrough.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GameResult {
    pub total_stars: u32,
    pub total_moves: u64,
    /// Whole seconds, truncated.
    pub total_time: u64,
}

impl From<TotalStats> for GameResult {
    fn from(t: TotalStats) -> Self {
        GameResult {
            total_stars: t.stars,
            total_moves: t.moves,
            total_time: t.time.max(0.0) as u64,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub username: String,
    pub total_stars: u32,
    pub total_moves: u64,
    pub total_time: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_body_uses_service_field_names() {
        let result = GameResult::from(TotalStats { moves: 42, time: 99.9, stars: 11 });
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "TotalStars": 11, "TotalMoves": 42, "TotalTime": 99 })
        );
    }

    #[test]
    fn leaderboard_is_a_bare_array() {
        let body = r#"[
            {"username":"ann","totalStars":15,"totalMoves":80,"totalTime":120},
            {"username":"bob","totalStars":12,"totalMoves":95,"totalTime":300}
        ]"#;
        let entries: Vec<LeaderboardEntry> = serde_json::from_str(body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].username, "ann");
        assert_eq!(entries[1].total_time, 300);
    }

    #[test]
    fn login_response_carries_a_token() {
        let r: AuthResponse = serde_json::from_str(r#"{"token":"abc"}"#).unwrap();
        assert_eq!(r.token, "abc");
    }
}
