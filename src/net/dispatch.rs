//! Fire-and-forget request dispatch.
//!
//! Each request runs as a task on a small private tokio runtime; its result
//! comes back later as a [`NetEvent`] that the front end polls once per
//! frame. Nothing blocks the game loop, and dropping the dispatcher abandons
//! whatever is still in flight.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Runtime;

use super::auth::{AuthState, AuthToken};
use super::gateway::{submission_for, GatewayError, ResultGateway};
use super::types::{Credentials, LeaderboardEntry};
use crate::sim::progress::TotalStats;

/// Completion of one dispatched request.
#[derive(Debug)]
pub enum NetEvent {
    Registered { username: String, result: Result<(), GatewayError> },
    LoggedIn { username: String, result: Result<AuthToken, GatewayError> },
    Submitted(Result<(), GatewayError>),
    Leaderboard(Result<Vec<LeaderboardEntry>, GatewayError>),
}

impl NetEvent {
    /// One-line status for the UI.
    pub fn status_text(&self) -> String {
        match self {
            NetEvent::Registered { result: Ok(()), .. } => {
                "Registered. You can sign in now.".to_string()
            }
            NetEvent::Registered { result: Err(GatewayError::UserExists), .. } => {
                "That username is taken.".to_string()
            }
            NetEvent::Registered { result: Err(_), .. } => {
                "Registration failed. Try again later.".to_string()
            }
            NetEvent::LoggedIn { username, result: Ok(_) } => format!("Signed in as {username}."),
            NetEvent::LoggedIn { result: Err(GatewayError::InvalidCredentials), .. } => {
                "Wrong username or password.".to_string()
            }
            NetEvent::LoggedIn { result: Err(_), .. } => "Sign-in failed.".to_string(),
            NetEvent::Submitted(Ok(())) => "Result submitted.".to_string(),
            NetEvent::Submitted(Err(_)) => "Could not submit result.".to_string(),
            NetEvent::Leaderboard(Ok(_)) => String::new(),
            NetEvent::Leaderboard(Err(_)) => "Could not load leaderboard.".to_string(),
        }
    }

    /// The auth state a successful login produces.
    pub fn into_auth(self) -> Option<AuthState> {
        match self {
            NetEvent::LoggedIn { username, result: Ok(token) } => {
                Some(AuthState::SignedIn { username, token })
            }
            _ => None,
        }
    }
}

pub struct Dispatcher {
    runtime: Runtime,
    gateway: Arc<dyn ResultGateway>,
    tx: Sender<NetEvent>,
    rx: Receiver<NetEvent>,
}

impl Dispatcher {
    pub fn new(gateway: Arc<dyn ResultGateway>) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("pushbox-net")
            .enable_all()
            .build()?;
        let (tx, rx) = mpsc::channel();
        Ok(Dispatcher { runtime, gateway, tx, rx })
    }

    pub fn register(&self, credentials: Credentials) {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = gateway.register(&credentials).await;
            let _ = tx.send(NetEvent::Registered { username: credentials.username, result });
        });
    }

    pub fn login(&self, credentials: Credentials) {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = gateway.login(&credentials).await;
            let _ = tx.send(NetEvent::LoggedIn { username: credentials.username, result });
        });
    }

    /// Submit playthrough totals. Returns `false` (and sends nothing) for
    /// guest and signed-out sessions.
    pub fn submit(&self, auth: &AuthState, totals: TotalStats) -> bool {
        let Some((token, result)) = submission_for(auth, totals) else {
            tracing::info!(auth = %auth, "result not submitted");
            return false;
        };
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let outcome = gateway.submit_result(&token, &result).await;
            let _ = tx.send(NetEvent::Submitted(outcome));
        });
        true
    }

    pub fn fetch_leaderboard(&self) {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = gateway.fetch_leaderboard().await;
            let _ = tx.send(NetEvent::Leaderboard(result));
        });
    }

    /// Everything that completed since the last poll. Never blocks.
    pub fn poll(&self) -> Vec<NetEvent> {
        self.rx.try_iter().collect()
    }

    /// Block up to `timeout` for the next completion.
    pub fn wait_next(&self, timeout: Duration) -> Option<NetEvent> {
        self.rx.recv_timeout(timeout).ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::net::types::GameResult;

    #[derive(Default)]
    struct FakeGateway {
        submitted: Mutex<Vec<GameResult>>,
    }

    #[async_trait]
    impl ResultGateway for FakeGateway {
        async fn register(&self, credentials: &Credentials) -> Result<(), GatewayError> {
            if credentials.username == "taken" {
                Err(GatewayError::UserExists)
            } else {
                Ok(())
            }
        }

        async fn login(&self, credentials: &Credentials) -> Result<AuthToken, GatewayError> {
            if credentials.password == "pw" {
                Ok(AuthToken::new(format!("tok-{}", credentials.username)))
            } else {
                Err(GatewayError::InvalidCredentials)
            }
        }

        async fn submit_result(
            &self,
            _token: &AuthToken,
            result: &GameResult,
        ) -> Result<(), GatewayError> {
            self.submitted.lock().unwrap().push(*result);
            Ok(())
        }

        async fn fetch_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, GatewayError> {
            Ok(vec![LeaderboardEntry {
                username: "ann".into(),
                total_stars: 15,
                total_moves: 80,
                total_time: 120,
            }])
        }
    }

    fn creds(username: &str, password: &str) -> Credentials {
        Credentials { username: username.into(), password: password.into() }
    }

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn login_produces_signed_in_state() {
        let d = Dispatcher::new(Arc::new(FakeGateway::default())).unwrap();
        d.login(creds("ann", "pw"));
        let event = d.wait_next(WAIT).unwrap();
        assert_eq!(event.status_text(), "Signed in as ann.");
        let auth = event.into_auth().unwrap();
        assert_eq!(auth.token().map(|t| t.as_str()), Some("tok-ann"));
    }

    #[test]
    fn bad_password_is_reported() {
        let d = Dispatcher::new(Arc::new(FakeGateway::default())).unwrap();
        d.login(creds("ann", "nope"));
        let event = d.wait_next(WAIT).unwrap();
        assert_eq!(event.status_text(), "Wrong username or password.");
        assert!(event.into_auth().is_none());
    }

    #[test]
    fn duplicate_registration_is_reported() {
        let d = Dispatcher::new(Arc::new(FakeGateway::default())).unwrap();
        d.register(creds("taken", "pw"));
        let event = d.wait_next(WAIT).unwrap();
        assert!(matches!(
            event,
            NetEvent::Registered { result: Err(GatewayError::UserExists), .. }
        ));
    }

    #[test]
    fn guests_do_not_submit() {
        let gateway = Arc::new(FakeGateway::default());
        let d = Dispatcher::new(gateway.clone()).unwrap();
        let totals = TotalStats { moves: 10, time: 3.5, stars: 6 };
        assert!(!d.submit(&AuthState::Guest, totals));
        assert!(d.wait_next(Duration::from_millis(50)).is_none());
        assert!(gateway.submitted.lock().unwrap().is_empty());
    }

    #[test]
    fn signed_in_results_reach_the_gateway() {
        let gateway = Arc::new(FakeGateway::default());
        let d = Dispatcher::new(gateway.clone()).unwrap();
        let auth = AuthState::SignedIn { username: "ann".into(), token: AuthToken::new("t") };
        assert!(d.submit(&auth, TotalStats { moves: 10, time: 3.5, stars: 6 }));
        let event = d.wait_next(WAIT).unwrap();
        assert!(matches!(event, NetEvent::Submitted(Ok(()))));
        assert_eq!(
            gateway.submitted.lock().unwrap().as_slice(),
            &[GameResult { total_stars: 6, total_moves: 10, total_time: 3 }]
        );
    }

    #[test]
    fn leaderboard_arrives_via_poll() {
        let d = Dispatcher::new(Arc::new(FakeGateway::default())).unwrap();
        d.fetch_leaderboard();
        let event = d.wait_next(WAIT).unwrap();
        match event {
            NetEvent::Leaderboard(Ok(rows)) => assert_eq!(rows[0].username, "ann"),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(d.poll().is_empty());
    }
}
