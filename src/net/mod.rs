//! Leaderboard service integration.
//!
//! ## Modules
//!
//! - [`auth`]: who is playing (guest, signed in, signed out)
//! - [`types`]: JSON wire types
//! - [`gateway`]: the `ResultGateway` trait and its error type
//! - [`http`]: reqwest-backed gateway
//! - [`dispatch`]: fire-and-forget request dispatch for the game loop

pub mod auth;
pub mod dispatch;
pub mod gateway;
pub mod http;
pub mod types;

pub use auth::{AuthState, AuthToken};
pub use dispatch::{Dispatcher, NetEvent};
pub use gateway::{submission_for, GatewayError, ResultGateway};
pub use http::HttpGateway;
pub use types::{Credentials, GameResult, LeaderboardEntry};
