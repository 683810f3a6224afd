//! Who the player is, as far as the leaderboard service is concerned.

use std::fmt;

/// Bearer token returned by a successful login.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        AuthToken(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for an `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

// Tokens end up in log lines via `AuthState`; never print them.
impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(..)")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum AuthState {
    /// Not chosen yet.
    #[default]
    SignedOut,
    /// Playing without an account. Results stay local.
    Guest,
    SignedIn { username: String, token: AuthToken },
}

impl AuthState {
    /// Token for authenticated requests; `None` for guests and signed-out
    /// sessions, which skip submission entirely.
    pub fn token(&self) -> Option<&AuthToken> {
        match self {
            AuthState::SignedIn { token, .. } => Some(token),
            AuthState::SignedOut | AuthState::Guest => None,
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            AuthState::SignedIn { username, .. } => Some(username),
            _ => None,
        }
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::SignedOut => f.write_str("signed out"),
            AuthState::Guest => f.write_str("guest"),
            AuthState::SignedIn { username, .. } => write!(f, "signed in as {username}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_signed_in_sessions_have_tokens() {
        assert!(AuthState::SignedOut.token().is_none());
        assert!(AuthState::Guest.token().is_none());
        let auth = AuthState::SignedIn { username: "ann".into(), token: AuthToken::new("t0k") };
        assert_eq!(auth.token().map(|t| t.bearer()), Some("Bearer t0k".to_string()));
        assert_eq!(auth.username(), Some("ann"));
    }

    #[test]
    fn tokens_are_not_printed() {
        let auth = AuthState::SignedIn { username: "ann".into(), token: AuthToken::new("secret") };
        assert!(!format!("{auth:?}").contains("secret"));
        assert_eq!(auth.to_string(), "signed in as ann");
    }
}
