//! HTTP implementation of the leaderboard gateway.

use std::time::Duration;

use async_trait::async_trait;

use super::auth::AuthToken;
use super::gateway::{GatewayError, ResultGateway};
use super::types::{AuthResponse, Credentials, GameResult, LeaderboardEntry};

/// Leaderboard service client.
///
/// Endpoints (relative to `base_url`):
///   - `POST /register`
///   - `POST /login`
///   - `POST /leaderboard/submit` (bearer token)
///   - `GET  /leaderboard`
pub struct HttpGateway {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Turn a non-success response into `GatewayError::Status`.
async fn error_for(response: reqwest::Response) -> GatewayError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    GatewayError::Status { status, body }
}

#[async_trait]
impl ResultGateway for HttpGateway {
    async fn register(&self, credentials: &Credentials) -> Result<(), GatewayError> {
        tracing::debug!(username = %credentials.username, "registering");

        let response = self
            .http_client
            .post(self.url("/register"))
            .json(credentials)
            .send()
            .await?;

        if response.status().is_success() {
            tracing::info!(username = %credentials.username, "registration succeeded");
            return Ok(());
        }

        match error_for(response).await {
            GatewayError::Status { body, .. } if body.contains("already exists") => {
                Err(GatewayError::UserExists)
            }
            other => {
                tracing::warn!(error = %other, "registration failed");
                Err(other)
            }
        }
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthToken, GatewayError> {
        let response = self
            .http_client
            .post(self.url("/login"))
            .json(credentials)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = error_for(response).await;
            tracing::warn!(username = %credentials.username, error = %err, "login failed");
            return Err(GatewayError::InvalidCredentials);
        }

        let text = response.text().await?;
        let auth: AuthResponse = serde_json::from_str(&text)?;
        tracing::info!(username = %credentials.username, "login succeeded");
        Ok(AuthToken::new(auth.token))
    }

    async fn submit_result(
        &self,
        token: &AuthToken,
        result: &GameResult,
    ) -> Result<(), GatewayError> {
        let response = self
            .http_client
            .post(self.url("/leaderboard/submit"))
            .header("Authorization", token.bearer())
            .json(result)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = error_for(response).await;
            tracing::warn!(error = %err, "result submission failed");
            return Err(err);
        }

        tracing::info!(
            stars = result.total_stars,
            moves = result.total_moves,
            time = result.total_time,
            "result submitted"
        );
        Ok(())
    }

    async fn fetch_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, GatewayError> {
        let response = self.http_client.get(self.url("/leaderboard")).send().await?;

        if !response.status().is_success() {
            let err = error_for(response).await;
            tracing::warn!(error = %err, "leaderboard fetch failed");
            return Err(err);
        }

        let text = response.text().await?;
        let entries: Vec<LeaderboardEntry> = serde_json::from_str(&text)?;
        tracing::debug!(count = entries.len(), "leaderboard loaded");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_drops_trailing_slash() {
        let gw = HttpGateway::new("http://localhost:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(gw.base_url(), "http://localhost:8080");
        assert_eq!(gw.url("/leaderboard"), "http://localhost:8080/leaderboard");
    }
}
