//! Result submission gateway boundary.
//!
//! The core never talks HTTP itself. Front ends hold an
//! `Arc<dyn ResultGateway>` (usually [`HttpGateway`](super::http::HttpGateway))
//! and drive it through the [`Dispatcher`](super::dispatch::Dispatcher), so
//! no game state ever waits on the network.

use async_trait::async_trait;
use thiserror::Error;

use super::auth::{AuthState, AuthToken};
use super::types::{Credentials, GameResult, LeaderboardEntry};
use crate::sim::progress::TotalStats;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("a user with that name already exists")]
    UserExists,

    #[error("wrong username or password")]
    InvalidCredentials,

    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait ResultGateway: Send + Sync {
    async fn register(&self, credentials: &Credentials) -> Result<(), GatewayError>;

    async fn login(&self, credentials: &Credentials) -> Result<AuthToken, GatewayError>;

    async fn submit_result(
        &self,
        token: &AuthToken,
        result: &GameResult,
    ) -> Result<(), GatewayError>;

    /// Rows in the order the service ranks them.
    async fn fetch_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, GatewayError>;
}

/// What to submit for a finished playthrough, if anything.
/// Guests and signed-out sessions submit nothing.
pub fn submission_for(auth: &AuthState, totals: TotalStats) -> Option<(AuthToken, GameResult)> {
    auth.token().map(|token| (token.clone(), GameResult::from(totals)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guests_never_submit() {
        let totals = TotalStats { moves: 10, time: 12.7, stars: 6 };
        assert!(submission_for(&AuthState::Guest, totals).is_none());
        assert!(submission_for(&AuthState::SignedOut, totals).is_none());

        let auth = AuthState::SignedIn { username: "ann".into(), token: AuthToken::new("t") };
        let (token, result) = submission_for(&auth, totals).unwrap();
        assert_eq!(token.as_str(), "t");
        assert_eq!(result, GameResult { total_stars: 6, total_moves: 10, total_time: 12 });
    }
}
